//! Conversation sessions and their in-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::relay::{RelayError, WebhookRelay};

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User turn.
    User,
    /// Webhook reply.
    Assistant,
}

/// A single turn in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: Uuid,
    /// Author of this turn.
    pub role: MessageRole,
    /// Text payload.
    pub content: String,
    /// Creation time, used only for display.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Errors surfaced by [`ChatSession::send`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The acting tenant has no webhook endpoint configured. Raised before
    /// any network I/O and before any transcript mutation.
    #[error("no webhook endpoint configured for this tenant")]
    Configuration,
    /// The outbound request failed. The optimistic user turn is retained.
    #[error("webhook delivery failed: {0}")]
    Delivery(#[from] RelayError),
    /// A send is already in flight for this session.
    #[error("a message is already in flight for this session")]
    Busy,
    /// The session was closed while the request was in flight.
    #[error("session was closed while a message was in flight")]
    Closed,
}

/// Result of a [`ChatSession::send`] call that did not error.
#[derive(Debug)]
pub enum SendOutcome {
    /// Input was empty after trimming; nothing was appended or sent.
    Ignored,
    /// The webhook replied; carries the assistant turn that was appended.
    Replied(Message),
}

/// A single conversation session.
///
/// The transcript is append-only: a send appends the user turn before the
/// request is issued, and the assistant turn only once the webhook has
/// confirmed a reply. Failed deliveries leave the user turn in place so the
/// caller can see what was attempted and resend.
#[derive(Debug)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Unique session identifier.
    id: String,
    /// Ordered conversation transcript.
    transcript: RwLock<Vec<Message>>,
    /// True while exactly one send is in flight.
    pending: AtomicBool,
    /// Session creation time.
    created_at: DateTime<Utc>,
    /// Cancelled when the session is removed or reset; aborts in-flight sends.
    cancel: CancellationToken,
}

impl Clone for ChatSession {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ChatSession {
    fn new(id: String) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                transcript: RwLock::new(Vec::new()),
                pending: AtomicBool::new(false),
                created_at: Utc::now(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Get the session creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Snapshot of the full transcript in chronological order.
    #[must_use]
    pub fn transcript(&self) -> Vec<Message> {
        self.inner.transcript.read().unwrap().clone()
    }

    /// Number of messages in the transcript.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner.transcript.read().unwrap().len()
    }

    /// Whether a send is currently in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Whether the session has been closed (removed or reset).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Cancel any in-flight send and mark the session closed.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    /// Relay one user turn to the tenant's webhook endpoint.
    ///
    /// Empty-after-trim input is ignored without any state change. A missing
    /// `endpoint` fails with [`ChatError::Configuration`] before any network
    /// I/O or transcript mutation. Otherwise the user turn is appended first
    /// (optimistic echo), exactly one request goes out, and the assistant turn
    /// is appended only on a confirmed reply. The pending gate is released on
    /// every exit path, as the final step.
    pub async fn send(
        &self,
        input: &str,
        endpoint: Option<&Url>,
        relay: &WebhookRelay,
    ) -> Result<SendOutcome, ChatError> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        let endpoint = endpoint.ok_or(ChatError::Configuration)?;

        let _pending = PendingGuard::claim(&self.inner.pending).ok_or(ChatError::Busy)?;

        // Phase 1: local echo. The user turn is in the transcript before the
        // request is issued, whatever the outcome.
        self.append(Message::user(text));

        let reply = tokio::select! {
            () = self.inner.cancel.cancelled() => return Err(ChatError::Closed),
            res = relay.send_turn(endpoint, &self.inner.id, text) => res?,
        };

        // Phase 2: commit the assistant turn only on confirmed success.
        let assistant = Message::assistant(reply.into_text());
        self.append(assistant.clone());
        Ok(SendOutcome::Replied(assistant))
    }

    fn append(&self, message: Message) {
        self.inner.transcript.write().unwrap().push(message);
    }
}

/// Holds a session's single in-flight slot; released exactly once, on drop.
struct PendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PendingGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self { flag })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Thread-safe store for sessions.
///
/// Session identifiers are never reused: a reset closes the old session and
/// hands out a brand-new one.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, ChatSession>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Start a new session with a freshly generated ID.
    #[must_use]
    pub fn start(&self) -> ChatSession {
        self.start_with_id(Uuid::new_v4().to_string())
    }

    /// Start a new session under a specific ID.
    #[must_use]
    pub fn start_with_id(&self, id: impl Into<String>) -> ChatSession {
        let id = id.into();
        let session = ChatSession::new(id.clone());
        self.inner
            .sessions
            .write()
            .unwrap()
            .insert(id, session.clone());
        session
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ChatSession> {
        self.inner.sessions.read().unwrap().get(id).cloned()
    }

    /// Get a session by ID, starting it if it doesn't exist.
    #[must_use]
    pub fn get_or_start(&self, id: &str) -> ChatSession {
        {
            let guard = self.inner.sessions.read().unwrap();
            if let Some(session) = guard.get(id) {
                return session.clone();
            }
        }
        self.start_with_id(id)
    }

    /// Remove a session by ID, cancelling any in-flight send.
    pub fn remove(&self, id: &str) -> Option<ChatSession> {
        let removed = self.inner.sessions.write().unwrap().remove(id);
        if let Some(session) = &removed {
            session.close();
        }
        removed
    }

    /// Discard a session and hand out a replacement with a fresh ID and an
    /// empty transcript. The prior transcript is dropped unconditionally.
    #[must_use]
    pub fn reset(&self, id: &str) -> ChatSession {
        let _ = self.remove(id);
        self.start()
    }

    /// Number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sessions.read().unwrap().len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.inner
            .sessions
            .read()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }
}
