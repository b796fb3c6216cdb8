//! Client for the remote admin data service.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

/// Tenant record as stored by the admin data service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub webhook_url: Option<Url>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Fields for provisioning a new tenant and its credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub username: String,
    /// Initial credential for the tenant's login; consumed by the service,
    /// never stored here.
    pub password: String,
    pub webhook_url: Url,
}

/// Fields accepted by an update. Username and credential are immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub name: String,
    pub webhook_url: Url,
}

/// Response envelope used by every admin service action.
#[derive(Debug, Deserialize)]
struct AdminEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    clients: Option<Vec<ClientRecord>>,
    #[serde(default)]
    client: Option<ClientRecord>,
    #[serde(default)]
    error: Option<String>,
}

/// Errors from the admin data service boundary.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Network-level failure or undecodable body.
    #[error("admin service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service reported failure, via status or envelope.
    #[error("admin service rejected the request ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },
    /// A 2xx reply that was missing the expected payload field.
    #[error("admin service reply was missing the `{0}` field")]
    MalformedReply(&'static str),
}

/// HTTP client for the remote admin data service.
#[derive(Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    endpoint: Url,
    service_token: Option<String>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl AdminClient {
    /// Create a client for the service at `endpoint`.
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: Url, service_token: Option<String>) -> Self {
        Self {
            http,
            endpoint,
            service_token,
        }
    }

    /// List all tenant records.
    pub async fn list_clients(&self) -> Result<Vec<ClientRecord>, AdminError> {
        let envelope = self.invoke(json!({ "action": "listClients" })).await?;
        envelope.clients.ok_or(AdminError::MalformedReply("clients"))
    }

    /// Provision a tenant record and its login credential.
    pub async fn create_client(&self, client: &NewClient) -> Result<ClientRecord, AdminError> {
        let envelope = self
            .invoke(json!({ "action": "createClient", "clientData": client }))
            .await?;
        envelope.client.ok_or(AdminError::MalformedReply("client"))
    }

    /// Update a tenant's display name and webhook endpoint.
    pub async fn update_client(
        &self,
        id: &str,
        update: &ClientUpdate,
    ) -> Result<ClientRecord, AdminError> {
        let envelope = self
            .invoke(json!({
                "action": "updateClient",
                "clientData": {
                    "id": id,
                    "name": update.name,
                    "webhook_url": update.webhook_url,
                },
            }))
            .await?;
        envelope.client.ok_or(AdminError::MalformedReply("client"))
    }

    /// Remove a tenant record and its login credential.
    pub async fn delete_client(&self, id: &str, username: &str) -> Result<(), AdminError> {
        self.invoke(json!({
            "action": "deleteClient",
            "clientData": { "id": id, "username": username },
        }))
        .await
        .map(|_| ())
    }

    async fn invoke(&self, body: serde_json::Value) -> Result<AdminEnvelope, AdminError> {
        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.service_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let detail = resp
                .json::<AdminEnvelope>()
                .await
                .ok()
                .and_then(|envelope| envelope.error)
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(AdminError::Rejected { status, detail });
        }

        let envelope = resp.json::<AdminEnvelope>().await?;
        if !envelope.success {
            return Err(AdminError::Rejected {
                status,
                detail: envelope
                    .error
                    .unwrap_or_else(|| "service reported failure".to_string()),
            });
        }
        Ok(envelope)
    }
}
