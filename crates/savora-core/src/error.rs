// ── Engine error types ──
//
// Caller-facing errors. Every variant is typed so callers can tell
// "try again" (ConcurrentModification) from "permanently invalid"
// (InvalidStateTransition, MalformedRecurrencePattern) from "wrong id"
// (NotFound). Store-level errors are translated at the crate seam; the
// only one that leaks through untouched is the backend catch-all.

use thiserror::Error;

use crate::model::{OfferId, OfferStatus};
use crate::store::StoreError;

/// Unified error type for the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("invalid state transition {from} -> {to}: {reason}")]
    InvalidStateTransition {
        from: OfferStatus,
        to: OfferStatus,
        reason: String,
    },

    // ── Concurrency errors ───────────────────────────────────────────
    /// Optimistic-concurrency retries exhausted. Retryable: the caller
    /// may resubmit the operation.
    #[error("offer {id} was concurrently modified; gave up after {attempts} attempts")]
    ConcurrentModification { id: OfferId, attempts: u32 },

    // ── Recurrence errors ────────────────────────────────────────────
    #[error("malformed recurrence pattern {pattern:?}: {reason}")]
    MalformedRecurrencePattern { pattern: String, reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("offer not found: {id}")]
    NotFound { id: OfferId },

    #[error("validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Store errors (wrapped, not exposed raw) ──────────────────────
    #[error("offer store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    /// Whether resubmitting the same operation can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

// ── Conversion from store-layer errors ───────────────────────────────

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => Self::NotFound { id },
            other => Self::Store(other),
        }
    }
}
