// ── Usage ledger ──
//
// The one correctness-critical path: at most `max_uses` redemptions
// per offer, no matter how many workers race. Enforced with optimistic
// concurrency — read a versioned record, re-check the precondition on
// the fresh copy, write conditionally on the version, retry on
// conflict. No lock is held across the store round-trip, so unrelated
// offers never serialize behind each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::model::OfferId;
use crate::store::{OfferStore, StoreError, Versioned};
use crate::validity::{UsageRejection, can_be_used};

/// Outcome of a redemption attempt. Transient — returned, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum UsageLedgerResult {
    /// The redemption was recorded; `uses` is the new counter value.
    Recorded { uses: u32 },
    /// The offer failed the usability check; nothing was mutated.
    Rejected { reason: UsageRejection },
}

impl UsageLedgerResult {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Attempt to redeem the offer once.
///
/// Each attempt re-reads the record: there is no cached offer state,
/// so a writer that lost a race always re-checks against what actually
/// got stored. Exhausting `max_attempts` surfaces
/// [`EngineError::ConcurrentModification`], which is retryable.
pub(crate) async fn try_record_usage<S: OfferStore>(
    store: &S,
    id: OfferId,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> Result<UsageLedgerResult, EngineError> {
    for attempt in 1..=max_attempts {
        let Versioned {
            value: offer,
            version,
        } = store.get(id).await?;

        if let Err(reason) = can_be_used(&offer, now) {
            return Ok(UsageLedgerResult::Rejected { reason });
        }

        let mut updated = offer;
        updated.current_uses = updated.current_uses.saturating_add(1);
        updated.last_used = Some(now);
        let uses = updated.current_uses;

        match store.conditional_update(id, updated, version).await {
            Ok(_) => {
                debug!(offer_id = %id, uses, "usage recorded");
                return Ok(UsageLedgerResult::Recorded { uses });
            }
            Err(StoreError::VersionConflict { found, .. }) => {
                debug!(
                    offer_id = %id,
                    attempt,
                    expected = version,
                    found,
                    "usage write lost the race, refetching"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(EngineError::ConcurrentModification {
        id,
        attempts: max_attempts,
    })
}
