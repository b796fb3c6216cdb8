//! Wire-level tests for the admin data service client.

use chat_relay::admin::{AdminClient, AdminError, ClientUpdate, NewClient};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AdminClient {
    AdminClient::new(reqwest::Client::new(), server.uri().parse().unwrap(), None)
}

#[tokio::test]
async fn test_list_clients() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_json(json!({ "action": "listClients" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "clients": [
                { "id": "c-1", "name": "Acme", "username": "acme" },
                { "id": "c-2", "name": "Globex", "username": "globex" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clients = client_for(&server).list_clients().await.unwrap();
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[1].name, "Globex");
    assert!(clients[0].webhook_url.is_none());
}

#[tokio::test]
async fn test_create_client_sends_provisioning_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "action": "createClient",
            "clientData": {
                "name": "Acme",
                "username": "acme",
                "password": "hunter2",
                "webhook_url": "https://hooks.example.com/chat",
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "client": {
                "id": "c-1",
                "name": "Acme",
                "username": "acme",
                "webhook_url": "https://hooks.example.com/chat",
                "created_at": "2025-01-01T00:00:00Z",
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client_for(&server)
        .create_client(&NewClient {
            name: "Acme".to_string(),
            username: "acme".to_string(),
            password: "hunter2".to_string(),
            webhook_url: "https://hooks.example.com/chat".parse().unwrap(),
        })
        .await
        .unwrap();

    assert_eq!(record.id, "c-1");
    assert_eq!(record.created_at.as_deref(), Some("2025-01-01T00:00:00Z"));
}

#[tokio::test]
async fn test_update_client_targets_record_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "action": "updateClient",
            "clientData": {
                "id": "c-1",
                "name": "Acme Rebranded",
                "webhook_url": "https://hooks.example.com/v2",
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "client": {
                "id": "c-1",
                "name": "Acme Rebranded",
                "username": "acme",
                "webhook_url": "https://hooks.example.com/v2",
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client_for(&server)
        .update_client(
            "c-1",
            &ClientUpdate {
                name: "Acme Rebranded".to_string(),
                webhook_url: "https://hooks.example.com/v2".parse().unwrap(),
            },
        )
        .await
        .unwrap();

    assert_eq!(record.name, "Acme Rebranded");
}

#[tokio::test]
async fn test_delete_client_carries_username_for_credential_cleanup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "action": "deleteClient",
            "clientData": { "id": "c-1", "username": "acme" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete_client("c-1", "acme").await.unwrap();
}

#[tokio::test]
async fn test_rejection_surfaces_status_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "duplicate username" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).list_clients().await.unwrap_err();
    match err {
        AdminError::Rejected { status, detail } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(detail, "duplicate username");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unsuccessful_envelope_on_2xx_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "backing store offline",
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).list_clients().await.unwrap_err();
    assert!(matches!(err, AdminError::Rejected { .. }));
}

#[tokio::test]
async fn test_missing_payload_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let err = client_for(&server).list_clients().await.unwrap_err();
    assert!(matches!(err, AdminError::MalformedReply("clients")));
}
