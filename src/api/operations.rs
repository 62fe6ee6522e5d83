//! Convenience operations over the request client
//!
//! Each operation builds a root-relative URI, sends it through the single
//! [`RequestClient`] and folds the outcome into an [`ExecutionResult`]. API and
//! transport failures never come back as `Err`: they are reported to the
//! notification sink (unless hidden) and returned with `execution_succeeded`
//! set to false. Invalid arguments are still returned as `Err` before any
//! request is made.

use super::client::RequestClient;
use super::constants::{self, headers, ACTION_NAMESPACE};
use super::error::{ApiError, SdkError};
use super::notify::{NotificationSink, SilentSink};
use super::request::{RawResponse, RequestDescriptor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Per-call switches for convenience operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Do not report a failure to the notification sink
    pub hide_error: bool,
    /// Impersonate the configured caller id
    pub elevated: bool,
}

impl CallOptions {
    pub fn quiet() -> Self {
        Self {
            hide_error: true,
            ..Self::default()
        }
    }

    pub fn elevated() -> Self {
        Self {
            elevated: true,
            ..Self::default()
        }
    }

    pub fn hide_error(mut self, hide_error: bool) -> Self {
        self.hide_error = hide_error;
        self
    }
}

/// Outcome of a convenience operation
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Record, record list or action output; an empty object when nothing came back
    pub data: Value,
    pub execution_succeeded: bool,
    pub error: Option<ApiError>,
    /// Id of a created record, taken from the `OData-EntityId` header
    pub entity_id: Option<String>,
    /// `@odata.nextLink` of a collection response; never followed
    pub next_link: Option<String>,
    /// FetchXML paging cookie for requesting the next page
    pub paging_cookie: Option<String>,
    /// FetchXML `morerecords` flag
    pub more_records: Option<bool>,
}

impl ExecutionResult {
    pub fn success(data: Value) -> Self {
        Self {
            data,
            execution_succeeded: true,
            error: None,
            entity_id: None,
            next_link: None,
            paging_cookie: None,
            more_records: None,
        }
    }

    pub fn failure(error: ApiError) -> Self {
        Self {
            data: Value::Object(Map::new()),
            execution_succeeded: false,
            error: Some(error),
            entity_id: None,
            next_link: None,
            paging_cookie: None,
            more_records: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.execution_succeeded
    }

    /// Records of a list result; empty for anything that is not an array
    pub fn records(&self) -> &[Value] {
        self.data.as_array().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

/// Collection annotations kept next to the `value` array
pub const NEXT_LINK_ANNOTATION: &str = "@odata.nextLink";
pub const PAGING_COOKIE_ANNOTATION: &str = "@Microsoft.Dynamics.CRM.fetchxmlpagingcookie";
pub const MORE_RECORDS_ANNOTATION: &str = "@Microsoft.Dynamics.CRM.morerecords";

// Object data is flattened next to `executionSucceeded`; anything else goes under `value`
impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        if let Some(error) = &self.error {
            map.serialize_entry("code", &error.code)?;
            map.serialize_entry("message", &error.message)?;
            if let Some(status) = error.status {
                map.serialize_entry("status", &status)?;
            }
            for (key, value) in &error.details {
                map.serialize_entry(key, value)?;
            }
        } else {
            match &self.data {
                Value::Object(fields) => {
                    for (key, value) in fields {
                        map.serialize_entry(key, value)?;
                    }
                }
                other => map.serialize_entry("value", other)?,
            }
        }

        if let Some(link) = &self.next_link {
            map.serialize_entry(NEXT_LINK_ANNOTATION, link)?;
        }
        if let Some(cookie) = &self.paging_cookie {
            map.serialize_entry(PAGING_COOKIE_ANNOTATION, cookie)?;
        }
        if let Some(more) = self.more_records {
            map.serialize_entry(MORE_RECORDS_ANNOTATION, &more)?;
        }
        if let Some(id) = &self.entity_id {
            map.serialize_entry("entityId", id)?;
        }
        map.serialize_entry("executionSucceeded", &self.execution_succeeded)?;
        map.end()
    }
}

/// What to keep from a successful response body
#[derive(Debug, Clone, Copy)]
enum Extract {
    /// The whole body, or an empty object when there is none
    Body,
    /// The `value` array of a collection response
    ValueArray,
}

/// Helper operations for Dynamics 365 Web API calls
#[derive(Clone)]
pub struct WebApi {
    client: RequestClient,
    sink: Arc<dyn NotificationSink>,
}

impl WebApi {
    pub fn new(client: RequestClient, sink: Arc<dyn NotificationSink>) -> Self {
        Self { client, sink }
    }

    /// A WebApi that never shows notifications
    pub fn silent(client: RequestClient) -> Self {
        Self::new(client, Arc::new(SilentSink))
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn client_url(&self) -> &str {
        self.client.base_url()
    }

    /// Remove any notification previously shown
    pub fn clear_notification(&self) {
        self.sink.clear();
    }

    /// Retrieve one record; `options` is a raw query string such as `?$select=name`
    pub async fn retrieve(
        &self,
        entity: &str,
        id: &str,
        options: &str,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let uri = format!("{}{}", constants::entity_record_path(entity, id), options);
        self.run(RequestDescriptor::get(uri), Extract::Body, call).await
    }

    /// Retrieve records matching an OData query string
    pub async fn retrieve_multiple(
        &self,
        entity: &str,
        options: &str,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let uri = format!("{}{}", constants::entity_path(entity), options);
        self.run(RequestDescriptor::get(uri), Extract::ValueArray, call).await
    }

    /// Run a FetchXML query against an entity set
    pub async fn fetch(
        &self,
        entity: &str,
        fetch_xml: &str,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let uri = format!(
            "{}?fetchXml={}",
            constants::entity_path(entity),
            urlencoding::encode(fetch_xml.trim())
        );
        self.run(RequestDescriptor::get(uri), Extract::ValueArray, call).await
    }

    pub async fn create(
        &self,
        entity: &str,
        data: Value,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let descriptor = RequestDescriptor::post(constants::entity_path(entity), data);
        self.run(descriptor, Extract::Body, call).await
    }

    pub async fn update(
        &self,
        entity: &str,
        id: &str,
        data: Value,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let descriptor = RequestDescriptor::patch(constants::entity_record_path(entity, id), data);
        self.run(descriptor, Extract::Body, call).await
    }

    pub async fn delete(
        &self,
        entity: &str,
        id: &str,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let descriptor = RequestDescriptor::delete(constants::entity_record_path(entity, id));
        self.run(descriptor, Extract::Body, call).await
    }

    /// Link `target_entity(target_id)` to `entity(id)` through a collection-valued navigation property
    pub async fn associate(
        &self,
        entity: &str,
        id: &str,
        relationship: &str,
        target_entity: &str,
        target_id: &str,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let uri = format!("{}/{}/$ref", constants::entity_record_path(entity, id), relationship);
        let target = format!(
            "{}{}{}",
            self.client.base_url(),
            self.client.versions().path_prefix(),
            constants::entity_record_path(target_entity, target_id)
        );
        let descriptor = RequestDescriptor::post(uri, json!({ "@odata.id": target }));
        self.run(descriptor, Extract::Body, call).await
    }

    /// Remove the link between `entity(id)` and `target_id` on a navigation property
    pub async fn disassociate(
        &self,
        entity: &str,
        id: &str,
        relationship: &str,
        target_id: &str,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let uri = format!(
            "{}/{}({})/$ref",
            constants::entity_record_path(entity, id),
            relationship,
            constants::normalize_id(target_id)
        );
        self.run(RequestDescriptor::delete(uri), Extract::Body, call).await
    }

    /// Invoke an action bound to one record
    pub async fn bound_action(
        &self,
        entity: &str,
        id: &str,
        action: &str,
        data: Option<Value>,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let uri = format!(
            "{}/{}.{}",
            constants::entity_record_path(entity, id),
            ACTION_NAMESPACE,
            action
        );
        let descriptor = RequestDescriptor::post(uri, data.unwrap_or_else(|| json!({})));
        self.run(descriptor, Extract::Body, call).await
    }

    /// Invoke a global action
    pub async fn unbound_action(
        &self,
        action: &str,
        data: Option<Value>,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let descriptor = RequestDescriptor::post(format!("/{}", action), data.unwrap_or_else(|| json!({})));
        self.run(descriptor, Extract::Body, call).await
    }

    async fn run(
        &self,
        descriptor: RequestDescriptor,
        extract: Extract,
        call: CallOptions,
    ) -> Result<ExecutionResult, SdkError> {
        let descriptor = descriptor.elevated(call.elevated);

        match self.client.send(&descriptor).await {
            Ok(response) => Ok(Self::fold_success(&response, extract)),
            Err(error) if error.is_invalid_argument() => Err(error),
            Err(error) => {
                let api_error = error.to_api_error();
                if !call.hide_error {
                    self.sink.show(&api_error.message);
                }
                Ok(ExecutionResult::failure(api_error))
            }
        }
    }

    fn fold_success(response: &RawResponse, extract: Extract) -> ExecutionResult {
        let body = match response.json() {
            Ok(body) => body,
            Err(e) => {
                // The status said success, so keep the flag and hand back the raw text
                log::warn!("Successful response had a non-JSON body: {}", e);
                Some(Value::String(response.body.clone()))
            }
        };

        let mut annotations = Map::new();
        let data = match (extract, body) {
            (Extract::ValueArray, Some(mut json)) => match json.get_mut("value").map(Value::take) {
                Some(records) => {
                    if let Value::Object(fields) = json {
                        annotations = fields;
                    }
                    records
                }
                None => json,
            },
            (Extract::ValueArray, None) => Value::Array(Vec::new()),
            (Extract::Body, Some(json)) => json,
            (Extract::Body, None) => Value::Object(Map::new()),
        };

        let mut result = ExecutionResult::success(data);
        result.next_link = annotations
            .get(NEXT_LINK_ANNOTATION)
            .and_then(Value::as_str)
            .map(str::to_string);
        result.paging_cookie = annotations
            .get(PAGING_COOKIE_ANNOTATION)
            .and_then(Value::as_str)
            .map(str::to_string);
        result.more_records = annotations.get(MORE_RECORDS_ANNOTATION).and_then(Value::as_bool);
        result.entity_id = response
            .header(headers::ODATA_ENTITY_ID)
            .and_then(entity_id_from_url);
        result
    }
}

/// Pull the record id out of an `OData-EntityId` URL such as `.../accounts(00000000-...)`
pub fn entity_id_from_url(url: &str) -> Option<String> {
    let open = url.rfind('(')?;
    let close = url[open..].find(')')? + open;
    let id = &url[open + 1..close];
    (!id.is_empty()).then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: HashMap::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_entity_id_from_url() {
        assert_eq!(
            entity_id_from_url("https://x.crm.dynamics.com/api/data/v9.2/accounts(7d6e8f90-1a2b-3c4d-5e6f-7a8b9c0d1e2f)"),
            Some("7d6e8f90-1a2b-3c4d-5e6f-7a8b9c0d1e2f".to_string())
        );
        assert_eq!(entity_id_from_url("https://x/api/data/v9.2/accounts"), None);
        assert_eq!(entity_id_from_url("https://x/accounts()"), None);
    }

    #[test]
    fn test_value_array_extracted() {
        let result = WebApi::fold_success(
            &response(200, r#"{"@odata.context":"ctx","value":[{"name":"a"},{"name":"b"}]}"#),
            Extract::ValueArray,
        );
        assert!(result.is_success());
        assert_eq!(result.records().len(), 2);
    }

    #[test]
    fn test_empty_body_becomes_empty_object() {
        let result = WebApi::fold_success(&response(204, ""), Extract::Body);
        assert_eq!(result.data, json!({}));
        assert!(result.is_success());
    }

    #[test]
    fn test_serializes_with_execution_flag() {
        let result = ExecutionResult::success(json!({"name": "Contoso"}));
        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(serialized, json!({"name": "Contoso", "executionSucceeded": true}));

        let list = ExecutionResult::success(json!([1, 2]));
        let serialized = serde_json::to_value(&list).unwrap();
        assert_eq!(serialized, json!({"value": [1, 2], "executionSucceeded": true}));
    }

    #[test]
    fn test_failure_serializes_error_fields() {
        let error = ApiError::from_response_body(404, r#"{"error":{"code":"0x1","message":"not found"}}"#);
        let serialized = serde_json::to_value(ExecutionResult::failure(error)).unwrap();
        assert_eq!(
            serialized,
            json!({"code": "0x1", "message": "not found", "status": 404, "executionSucceeded": false})
        );
    }

    #[test]
    fn test_collection_annotations_kept() {
        let body = json!({
            "value": [{"name": "a"}],
            "@Microsoft.Dynamics.CRM.fetchxmlpagingcookie": "<cookie page=\"1\"/>",
            "@Microsoft.Dynamics.CRM.morerecords": true
        });
        let result = WebApi::fold_success(&response(200, &body.to_string()), Extract::ValueArray);

        assert_eq!(result.records().len(), 1);
        assert_eq!(result.next_link, None);
        assert_eq!(result.paging_cookie.as_deref(), Some("<cookie page=\"1\"/>"));
        assert_eq!(result.more_records, Some(true));

        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(serialized["@Microsoft.Dynamics.CRM.morerecords"], true);
        assert_eq!(serialized["value"], json!([{"name": "a"}]));
    }

    #[test]
    fn test_failure_keeps_error_details() {
        let error = ApiError::from_response_body(
            500,
            r#"{"error":{"code":"0x0","message":"boom","innererror":{"type":"System.Exception"}}}"#,
        );
        let serialized = serde_json::to_value(ExecutionResult::failure(error)).unwrap();
        assert_eq!(serialized["innererror"], json!({"type": "System.Exception"}));
        assert_eq!(serialized["message"], "boom");
        assert_eq!(serialized["executionSucceeded"], false);
    }

    #[test]
    fn test_call_options() {
        assert!(CallOptions::quiet().hide_error);
        assert!(!CallOptions::quiet().elevated);
        assert!(CallOptions::elevated().elevated);
        assert!(CallOptions::elevated().hide_error(true).hide_error);
    }
}
