//! Outbound webhook relay.
//!
//! Each tenant configures a webhook endpoint (an external workflow backend);
//! this module owns the wire format of one chat turn and the client that
//! delivers it. The endpoint is opaque: we POST a `sendMessage` envelope and
//! read a reply field back, nothing more.

mod webhook;

pub use webhook::{OutboundTurn, RelayError, WebhookRelay, WebhookReply, REPLY_FALLBACK};
