//! Request descriptors and raw responses

use super::error::SdkError;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// HTTP verbs accepted by the Web API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Verbs that create or modify data and therefore need a payload
    pub fn requires_payload(&self) -> bool {
        matches!(self, Self::Post | Self::Patch | Self::Put)
    }

    pub fn to_method(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Patch => reqwest::Method::PATCH,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl FromStr for Verb {
    type Err = SdkError;

    // Case-sensitive on purpose: "get" is not a verb the API accepts
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PATCH" => Ok(Self::Patch),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(SdkError::invalid_argument(format!(
                "verb must be one of POST, PATCH, PUT, GET or DELETE, got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One additional header for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraHeader {
    pub name: String,
    pub value: String,
}

impl ExtraHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub(crate) fn to_header_pair(&self) -> Result<(HeaderName, HeaderValue), SdkError> {
        let name = HeaderName::from_bytes(self.name.as_bytes()).map_err(|_| {
            SdkError::invalid_argument(format!("'{}' is not a valid header name", self.name))
        })?;
        let value = HeaderValue::from_str(&self.value).map_err(|_| {
            SdkError::invalid_argument(format!("header '{}' has an invalid value", self.name))
        })?;
        Ok((name, value))
    }
}

/// Everything needed to issue one Web API request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub verb: Verb,
    /// Absolute URL, or a path starting with `/` relative to the versioned API root
    pub uri: String,
    pub payload: Option<Value>,
    pub extra_header: Option<ExtraHeader>,
    pub use_elevated_identity: bool,
}

impl RequestDescriptor {
    pub fn new(verb: Verb, uri: impl Into<String>) -> Self {
        Self {
            verb,
            uri: uri.into(),
            payload: None,
            extra_header: None,
            use_elevated_identity: false,
        }
    }

    /// Build from a verb string, rejecting anything outside the five known verbs
    pub fn parse(verb: &str, uri: impl Into<String>) -> Result<Self, SdkError> {
        Ok(Self::new(verb.parse()?, uri))
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Verb::Get, uri)
    }

    pub fn post(uri: impl Into<String>, payload: Value) -> Self {
        Self::new(Verb::Post, uri).payload(payload)
    }

    pub fn patch(uri: impl Into<String>, payload: Value) -> Self {
        Self::new(Verb::Patch, uri).payload(payload)
    }

    pub fn put(uri: impl Into<String>, payload: Value) -> Self {
        Self::new(Verb::Put, uri).payload(payload)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Verb::Delete, uri)
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_header = Some(ExtraHeader::new(name, value));
        self
    }

    pub fn elevated(mut self, use_elevated_identity: bool) -> Self {
        self.use_elevated_identity = use_elevated_identity;
        self
    }

    pub fn is_relative(&self) -> bool {
        self.uri.starts_with('/')
    }

    /// Input checks that must pass before anything goes on the wire
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.uri.is_empty() {
            return Err(SdkError::invalid_argument("uri must not be empty"));
        }

        if self.verb.requires_payload() && matches!(self.payload, None | Some(Value::Null)) {
            return Err(SdkError::invalid_argument(format!(
                "{} requires a payload because it creates or modifies data",
                self.verb
            )));
        }

        if let Some(header) = &self.extra_header {
            header.to_header_pair()?;
        }

        Ok(())
    }

    /// Serialized request body; empty when there is no payload
    pub fn body(&self) -> Result<String, SdkError> {
        match &self.payload {
            Some(payload) => serde_json::to_string(payload)
                .map_err(|e| SdkError::invalid_argument(format!("payload is not serializable: {}", e))),
            None => Ok(String::new()),
        }
    }
}

/// A response whose status was classified as success
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Parse the body as JSON; an empty body parses as `None`
    pub fn json(&self) -> Result<Option<Value>, serde_json::Error> {
        if self.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&self.body).map(Some)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}
