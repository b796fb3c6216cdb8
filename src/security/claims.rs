use serde::{Deserialize, Serialize};
use url::Url;

use crate::tenant::TenantProfile;

/// Role granting access to the admin console routes.
pub const ROLE_ADMIN: &str = "admin";

/// Claims carried by a verified bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    /// User ID (subject).
    pub sub: String,
    /// Display name.
    pub name: Option<String>,
    /// Explicit roles assigned by the identity provider.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Tenant profile for the signed-in user, if any.
    #[serde(default)]
    pub tenant: Option<TenantProfile>,
    /// Expiration time (UNIX timestamp).
    pub exp: usize,
}

impl UserClaims {
    /// Whether these claims carry the admin role. Exact match only.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ROLE_ADMIN)
    }
}

/// Verified caller identity, injected into request extensions.
#[derive(Clone, Debug)]
pub struct UserContext {
    pub user_id: String,
    pub claims: UserClaims,
}

impl UserContext {
    /// Webhook endpoint for the acting tenant, if one is configured.
    #[must_use]
    pub fn webhook_endpoint(&self) -> Option<&Url> {
        self.claims
            .tenant
            .as_ref()
            .and_then(|tenant| tenant.webhook_url.as_ref())
    }
}
