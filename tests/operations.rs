//! Convenience operations folding outcomes into ExecutionResult

mod common;

use anyhow::Result;
use common::{RecordingSink, api_path, client_for};
use dynamics_webapi::api::{CallOptions, StaticCallerId, WebApi};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_with_sink(server: &MockServer) -> (WebApi, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let api = WebApi::new(client_for(server), sink.clone());
    (api, sink)
}

#[tokio::test]
async fn test_retrieve_by_braced_id() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("/accounts(6d4f4e2a-0000-0000-0000-000000000001)")))
        .and(query_param("$select", "name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Contoso"})))
        .expect(1)
        .mount(&server)
        .await;

    let (api, sink) = api_with_sink(&server);
    let result = api
        .retrieve(
            "accounts",
            "{6d4f4e2a-0000-0000-0000-000000000001}",
            "?$select=name",
            CallOptions::default(),
        )
        .await?;

    assert!(result.execution_succeeded);
    assert_eq!(result.data["name"], "Contoso");
    assert!(sink.messages().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_retrieve_multiple_returns_value_array() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("/contacts")))
        .and(query_param("$top", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.context": "ctx",
            "value": [{"fullname": "Ann"}, {"fullname": "Bob"}]
        })))
        .mount(&server)
        .await;

    let (api, _) = api_with_sink(&server);
    let result = api
        .retrieve_multiple("contacts", "?$select=fullname&$top=2", CallOptions::default())
        .await?;

    assert!(result.is_success());
    assert_eq!(result.records().len(), 2);
    assert_eq!(result.records()[1]["fullname"], "Bob");
    Ok(())
}

#[tokio::test]
async fn test_retrieve_multiple_surfaces_next_link() -> Result<()> {
    let server = MockServer::start().await;
    let next_link = format!("{}/api/data/v9.0/accounts?$skiptoken=abc", server.uri());
    Mock::given(method("GET"))
        .and(path(api_path("/accounts")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"name": "A"}],
            "@odata.nextLink": next_link
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = api_with_sink(&server);
    let result = api
        .retrieve_multiple("accounts", "?$select=name", CallOptions::default())
        .await?;

    assert_eq!(result.records().len(), 1);
    assert_eq!(result.next_link.as_deref(), Some(next_link.as_str()));

    let serialized = serde_json::to_value(&result)?;
    assert_eq!(serialized["@odata.nextLink"], next_link);
    assert_eq!(serialized["value"], json!([{"name": "A"}]));
    assert_eq!(serialized["executionSucceeded"], true);
    Ok(())
}

#[tokio::test]
async fn test_fetch_encodes_fetch_xml() -> Result<()> {
    let fetch_xml = r#"<fetch top="5"><entity name="account"><attribute name="name"/></entity></fetch>"#;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("/accounts")))
        .and(query_param("fetchXml", fetch_xml))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"name": "A"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = api_with_sink(&server);
    let result = api.fetch("accounts", fetch_xml, CallOptions::default()).await?;

    assert_eq!(result.records().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_create_reports_new_id() -> Result<()> {
    let server = MockServer::start().await;
    let entity_url = format!("{}/api/data/v9.0/accounts(11111111-2222-3333-4444-555555555555)", server.uri());
    Mock::given(method("POST"))
        .and(path(api_path("/accounts")))
        .and(body_json(json!({"name": "Contoso"})))
        .respond_with(ResponseTemplate::new(204).insert_header("OData-EntityId", entity_url.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = api_with_sink(&server);
    let result = api.create("accounts", json!({"name": "Contoso"}), CallOptions::default()).await?;

    assert!(result.execution_succeeded);
    assert_eq!(result.entity_id.as_deref(), Some("11111111-2222-3333-4444-555555555555"));
    assert_eq!(result.data, json!({}));
    Ok(())
}

#[tokio::test]
async fn test_create_without_payload_is_rejected_up_front() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let (api, sink) = api_with_sink(&server);
    let err = api
        .create("accounts", serde_json::Value::Null, CallOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument());
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn test_failed_update_notifies_and_flags() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(api_path("/accounts(9)")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "0x80048d19", "message": "Invalid property 'nmae'"}
        })))
        .mount(&server)
        .await;

    let (api, sink) = api_with_sink(&server);
    let result = api
        .update("accounts", "9", json!({"nmae": "typo"}), CallOptions::default())
        .await?;

    assert!(!result.execution_succeeded);
    assert_eq!(result.error_message(), Some("Invalid property 'nmae'"));
    assert_eq!(sink.messages(), vec!["Invalid property 'nmae'".to_string()]);

    let serialized = serde_json::to_value(&result)?;
    assert_eq!(serialized["executionSucceeded"], false);
    assert_eq!(serialized["code"], "0x80048d19");
    Ok(())
}

#[tokio::test]
async fn test_hidden_errors_are_not_notified() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": {"message": "gone"}})))
        .mount(&server)
        .await;

    let (api, sink) = api_with_sink(&server);
    let result = api.delete("accounts", "1", CallOptions::quiet()).await?;

    assert!(!result.execution_succeeded);
    assert_eq!(result.error_message(), Some("gone"));
    assert!(sink.messages().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_becomes_failed_result() -> Result<()> {
    let client = dynamics_webapi::api::RequestClient::new(
        dynamics_webapi::api::ClientSettings::new("http://127.0.0.1:1"),
    )?;
    let sink = Arc::new(RecordingSink::default());
    let api = WebApi::new(client, sink.clone());

    let result = api.retrieve_multiple("accounts", "", CallOptions::default()).await?;

    assert!(!result.execution_succeeded);
    assert_eq!(sink.messages().len(), 1);
    assert!(sink.messages()[0].starts_with("transport failure"));
    Ok(())
}

#[tokio::test]
async fn test_delete_success_has_empty_data() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(api_path("/accounts(abc)")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = api_with_sink(&server);
    let result = api.delete("accounts", "{abc}", CallOptions::default()).await?;

    assert!(result.execution_succeeded);
    assert_eq!(serde_json::to_value(&result)?, json!({"executionSucceeded": true}));
    Ok(())
}

#[tokio::test]
async fn test_associate_posts_reference() -> Result<()> {
    let server = MockServer::start().await;
    let target = format!("{}/api/data/v9.0/contacts(c1)", server.uri());
    Mock::given(method("POST"))
        .and(path(api_path("/accounts(a1)/contact_customer_accounts/$ref")))
        .and(body_json(json!({"@odata.id": target})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = api_with_sink(&server);
    let result = api
        .associate("accounts", "a1", "contact_customer_accounts", "contacts", "{c1}", CallOptions::default())
        .await?;

    assert!(result.execution_succeeded);
    Ok(())
}

#[tokio::test]
async fn test_disassociate_deletes_reference_without_body() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(api_path("/accounts(a1)/contact_customer_accounts(c1)/$ref")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = api_with_sink(&server);
    let result = api
        .disassociate("accounts", "a1", "contact_customer_accounts", "c1", CallOptions::default())
        .await?;

    assert!(result.execution_succeeded);
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests[0].body.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_bound_action_uses_namespace_and_elevation() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("/leads(l1)/Microsoft.Dynamics.CRM.QualifyLead")))
        .and(header("MSCRMCallerID", "admin-id"))
        .and(body_json(json!({"CreateAccount": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"accountid": "a9"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_identity(Arc::new(StaticCallerId::new("admin-id")));
    let api = WebApi::silent(client);
    let result = api
        .bound_action("leads", "{l1}", "QualifyLead", Some(json!({"CreateAccount": true})), CallOptions::elevated())
        .await?;

    assert!(result.execution_succeeded);
    assert_eq!(result.data["value"][0]["accountid"], "a9");
    Ok(())
}

#[tokio::test]
async fn test_unbound_action_with_empty_response() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("/my_RecalculateTotals")))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _) = api_with_sink(&server);
    let result = api.unbound_action("my_RecalculateTotals", None, CallOptions::default()).await?;

    assert!(result.execution_succeeded);
    assert_eq!(result.data, json!({}));
    Ok(())
}

#[tokio::test]
async fn test_clear_notification_reaches_sink() {
    let server = MockServer::start().await;
    let (api, sink) = api_with_sink(&server);

    api.clear_notification();
    api.clear_notification();

    assert_eq!(sink.clear_count(), 2);
    assert_eq!(api.client_url(), server.uri());
}
