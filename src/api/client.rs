use super::constants::{self, headers};
use super::error::{ApiError, SdkError};
use super::identity::{CallerIdentity, NoCallerIdentity};
use super::request::{RawResponse, RequestDescriptor, Verb};
use super::version::{ApiVersion, VersionManager};
use log::{debug, info, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Connection settings for a [`RequestClient`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Organization URL, e.g. `https://contoso.crm4.dynamics.com`
    pub base_url: String,
    /// Token of the ambient session, sent as a bearer token when present
    pub access_token: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub initial_version: ApiVersion,
    pub user_agent: String,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            initial_version: ApiVersion::default(),
            user_agent: format!("dynamics-webapi/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn initial_version(mut self, version: ApiVersion) -> Self {
        self.initial_version = version;
        self
    }
}

/// A fully resolved request, ready to go on the wire
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub verb: Verb,
    pub url: reqwest::Url,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Deserialize)]
struct RetrieveVersionResponse {
    #[serde(rename = "Version")]
    version: String,
}

/// Versioned Dynamics 365 Web API client performing one round-trip per call
#[derive(Clone)]
pub struct RequestClient {
    base_url: String,
    http_client: reqwest::Client,
    access_token: Option<String>,
    versions: Arc<VersionManager>, // Shared between clones so discovery is seen by all of them
    identity: Arc<dyn CallerIdentity>,
}

impl RequestClient {
    pub fn new(settings: ClientSettings) -> Result<Self, SdkError> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| SdkError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_custom_client(settings, http_client))
    }

    /// Create a new client with custom HTTP client configuration
    pub fn with_custom_client(settings: ClientSettings, http_client: reqwest::Client) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            http_client,
            access_token: settings.access_token,
            versions: Arc::new(VersionManager::new(settings.initial_version)),
            identity: Arc::new(NoCallerIdentity),
        }
    }

    /// Use `identity` to resolve the caller id of elevated requests
    pub fn with_identity(mut self, identity: Arc<dyn CallerIdentity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn versions(&self) -> &VersionManager {
        &self.versions
    }

    pub fn version(&self) -> ApiVersion {
        self.versions.version()
    }

    /// Turn a root-relative uri into an absolute URL under the versioned API path
    pub fn resolve_url(&self, uri: &str) -> Result<reqwest::Url, SdkError> {
        let absolute = if uri.starts_with('/') {
            format!("{}{}{}", self.base_url, self.versions.path_prefix(), uri)
        } else {
            uri.to_string()
        };

        reqwest::Url::parse(&absolute)
            .map_err(|e| SdkError::invalid_argument(format!("'{}' is not a valid URL: {}", absolute, e)))
    }

    /// Protocol headers sent with every request
    fn fixed_headers() -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(headers::ODATA_MAX_VERSION, HeaderValue::from_static(headers::ODATA_PROTOCOL_VERSION));
        map.insert(headers::ODATA_VERSION, HeaderValue::from_static(headers::ODATA_PROTOCOL_VERSION));
        map.insert(ACCEPT, HeaderValue::from_static(headers::ACCEPT_JSON));
        map.insert(CONTENT_TYPE, HeaderValue::from_static(headers::CONTENT_TYPE_JSON));
        map.insert(headers::PREFER, HeaderValue::from_static(headers::PREFER_FORMATTED_VALUES));
        map
    }

    /// Validate a descriptor and resolve its URL, headers and body without sending anything
    pub async fn prepare(&self, descriptor: &RequestDescriptor) -> Result<PreparedRequest, SdkError> {
        descriptor.validate()?;

        let url = self.resolve_url(&descriptor.uri)?;
        let body = descriptor.body()?;
        let mut header_map = Self::fixed_headers();

        if let Some(token) = &self.access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| SdkError::invalid_argument("access token contains invalid characters"))?;
            value.set_sensitive(true);
            header_map.insert(AUTHORIZATION, value);
        }

        if descriptor.use_elevated_identity {
            let caller_id = self.identity.caller_id().await?;
            let value = HeaderValue::from_str(&caller_id)
                .map_err(|_| SdkError::invalid_argument("caller id contains invalid characters"))?;
            header_map.insert(headers::CALLER_ID, value);
        }

        // Inserted last so it replaces a fixed header of the same name
        if let Some(extra) = &descriptor.extra_header {
            let (name, value) = extra.to_header_pair()?;
            header_map.insert(name, value);
        }

        Ok(PreparedRequest {
            verb: descriptor.verb,
            url,
            headers: header_map,
            body,
        })
    }

    /// Send one request and classify the response by status code
    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, SdkError> {
        let prepared = self.prepare(descriptor).await?;
        self.execute(prepared).await
    }

    /// Send an already prepared request
    pub async fn execute(&self, prepared: PreparedRequest) -> Result<RawResponse, SdkError> {
        let correlation_id = uuid::Uuid::new_v4();
        debug!("[{}] {} {}", correlation_id, prepared.verb, prepared.url);

        let mut request = self
            .http_client
            .request(prepared.verb.to_method(), prepared.url.clone())
            .headers(prepared.headers);
        if !prepared.body.is_empty() {
            request = request.body(prepared.body);
        }

        let request_start = Instant::now();
        let response = request.send().await.map_err(|e| {
            warn!("[{}] {} {} failed: {}", correlation_id, prepared.verb, prepared.url, e);
            SdkError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let mut response_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                response_headers.insert(name.as_str().to_string(), value_str.to_string());
            }
        }
        let body = response.text().await.map_err(SdkError::from)?;

        debug!(
            "[{}] {} {} -> {} in {}ms",
            correlation_id,
            prepared.verb,
            prepared.url,
            status,
            request_start.elapsed().as_millis()
        );

        if constants::is_success_status(status) {
            Ok(RawResponse {
                status,
                headers: response_headers,
                body,
            })
        } else {
            let error = ApiError::from_response_body(status, &body);
            warn!("[{}] {} {} returned {}: {}", correlation_id, prepared.verb, prepared.url, status, error.message);
            Err(SdkError::Api(error))
        }
    }

    /// Ask the server for its version and use it for all later relative URIs
    pub async fn discover_version(&self) -> Result<ApiVersion, SdkError> {
        let _guard = self.versions.lock_discovery().await;

        let response = self
            .send(&RequestDescriptor::get(constants::RETRIEVE_VERSION_ENDPOINT))
            .await
            .map_err(|e| SdkError::VersionParseFailure(format!("Error retrieving version: {}", e)))?;

        let parsed: RetrieveVersionResponse = serde_json::from_str(&response.body)
            .map_err(|e| SdkError::VersionParseFailure(format!("Error processing version: {}", e)))?;

        let version = self.versions.apply_version_string(&parsed.version)?;
        info!("Using Web API version {} (server reports {})", version, parsed.version);
        Ok(version)
    }
}
