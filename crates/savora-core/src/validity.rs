// ── Validity evaluator ──
//
// Pure predicates over (offer, timestamp). Expiry is always derived
// from the stored timestamps here; the persisted `Expired` status is a
// reporting annotation and is never consulted. Checks run cheapest
// first and short-circuit.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Offer, OfferStatus};

/// Whether the offer is usable at `at`.
///
/// Callable with an arbitrary timestamp — past, present, or future —
/// so both live selection and test assertions go through the same
/// predicate. Never mutates the offer.
pub fn is_valid_at(offer: &Offer, at: DateTime<Utc>) -> bool {
    if !offer.enabled || offer.status != OfferStatus::Active {
        return false;
    }
    if !offer.window_contains(at) {
        return false;
    }
    if let Some(window) = &offer.daily_window {
        if !window.contains(at.time()) {
            return false;
        }
    }
    if !offer.applies_on(at.weekday()) {
        return false;
    }
    !offer.usage_exhausted()
}

// ── Redemption precondition ─────────────────────────────────────────

/// Why a redemption attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum UsageRejection {
    /// The secondary enabled flag is off.
    Disabled,
    /// Stored status is not Active.
    NotActive { status: OfferStatus },
    /// `now` is outside the offer's date window.
    OutsideWindow,
    /// The redemption cap has been reached.
    UsageCapReached,
}

impl fmt::Display for UsageRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "offer is disabled"),
            Self::NotActive { status } => write!(f, "offer status is {status}, not active"),
            Self::OutsideWindow => write!(f, "outside the offer's validity window"),
            Self::UsageCapReached => write!(f, "usage cap reached"),
        }
    }
}

/// The usage-ledger precondition, re-checked against a freshly fetched
/// record before every increment.
///
/// Deliberately narrower than [`is_valid_at`]: the daily window and
/// weekday restrictions gate discovery, not settlement — an order
/// placed at 16:59 may finish checkout after the window closes.
pub fn can_be_used(offer: &Offer, now: DateTime<Utc>) -> Result<(), UsageRejection> {
    if !offer.enabled {
        return Err(UsageRejection::Disabled);
    }
    if offer.status != OfferStatus::Active {
        return Err(UsageRejection::NotActive {
            status: offer.status,
        });
    }
    if !offer.window_contains(now) {
        return Err(UsageRejection::OutsideWindow);
    }
    if offer.usage_exhausted() {
        return Err(UsageRejection::UsageCapReached);
    }
    Ok(())
}
