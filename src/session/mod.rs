//! Session and conversation state management.
//!
//! This module provides in-memory session storage for managing conversation
//! state across multiple requests. Sessions are identified by UUID, hold the
//! ordered transcript of one conversation, and enforce a single in-flight
//! send per session.
//!
//! # Architecture
//!
//! - [`ChatSession`]: One conversation with its transcript and send gate
//! - [`SessionStore`]: Thread-safe store for all active sessions
//!
//! # Example
//!
//! ```rust
//! use chat_relay::session::SessionStore;
//!
//! let store = SessionStore::new();
//! let session = store.start();
//!
//! assert_eq!(session.message_count(), 0);
//! assert!(!session.is_pending());
//! ```

mod chat;

pub use chat::{ChatError, ChatSession, Message, MessageRole, SendOutcome, SessionStore};
