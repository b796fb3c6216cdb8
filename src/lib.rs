//! Multi-tenant chat relay gateway.
//!
//! A single-binary web service fronting per-tenant chat webhooks: it owns
//! conversation sessions in memory, relays each user turn to the acting
//! tenant's webhook endpoint, and proxies tenant administration to a remote
//! admin data service.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP API for sessions, chat, and administration
//! - **Session**: In-memory transcripts with a single-in-flight send gate
//! - **Relay**: Outbound webhook client speaking the `sendMessage` envelope
//! - **Security**: Bearer JWT validation with explicit role claims
//!
//! # Modules
//!
//! - [`session`]: Conversation and session management
//! - [`relay`]: Webhook relay client
//! - [`admin`]: Remote admin data service client
//! - [`security`]: Claims, auth middleware, rate limiting

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod admin;
pub mod config;
pub mod relay;
pub mod security;
pub mod server;
pub mod session;
pub mod tenant;

use std::sync::Arc;

use crate::admin::AdminClient;
use crate::config::AppConfig;
use crate::relay::WebhookRelay;
use crate::security::rate_limit::RateLimiter;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Session store for conversation management.
    pub sessions: SessionStore,
    /// Outbound webhook relay client.
    pub relay: Arc<WebhookRelay>,
    /// Remote admin data service client, when configured.
    pub admin: Option<Arc<AdminClient>>,
    /// Global rate limiter.
    pub rate_limiter: Arc<RateLimiter>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}
