//! Tenant profiles.

use serde::{Deserialize, Serialize};
use url::Url;

/// Per-tenant profile resolved by the identity provider.
///
/// `webhook_url` is the destination for this tenant's chat turns; a tenant
/// without one cannot send messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProfile {
    /// Tenant record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login name, also the key for credential management.
    pub username: String,
    /// Destination endpoint for outbound chat turns.
    #[serde(default)]
    pub webhook_url: Option<Url>,
}
