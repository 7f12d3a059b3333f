//! WebhookEventRepository port - ledger of processor webhooks already handled.
//!
//! The processor delivers at least once: timeouts and non-2xx answers cause
//! redelivery of the same event id. Handlers consult this ledger so an event
//! changes an order at most once.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};

/// How a webhook was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event changed an order.
    Applied,
    /// Valid event with nothing to do (unknown type, stale, unmatched order).
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Applied => "applied",
            WebhookOutcome::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "applied" => Some(WebhookOutcome::Applied),
            "ignored" => Some(WebhookOutcome::Ignored),
            _ => None,
        }
    }
}

/// Ledger entry for one processor event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    /// Processor event id (evt_...).
    pub event_id: String,

    pub event_type: String,

    pub outcome: WebhookOutcome,

    /// Why an event was ignored.
    pub note: Option<String>,

    pub processed_at: Timestamp,

    /// Event body as received.
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn applied(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            outcome: WebhookOutcome::Applied,
            note: None,
            processed_at: Timestamp::now(),
            payload,
        }
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        note: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            outcome: WebhookOutcome::Ignored,
            note: Some(note.into()),
            processed_at: Timestamp::now(),
            payload,
        }
    }
}

/// Result of attempting to save a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    Inserted,
    /// Another delivery of the same event got there first.
    AlreadyExists,
}

/// Port for the processed-webhook ledger.
///
/// Implementations key entries by `event_id` and must not overwrite an
/// existing entry.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;

    /// Drop entries processed before `cutoff`. Returns how many were removed.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}
