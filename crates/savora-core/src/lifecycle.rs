// ── Lifecycle controller ──
//
// Status state machine. Every transition is a pure function
// `(&Offer, ...) -> Result<Offer, EngineError>`: preconditions are
// validated before anything is built, and a failed transition returns
// the error with the input untouched — there is no partial mutation to
// roll back.
//
//   Draft ────activate───▶ Active ──deactivate──▶ Inactive
//                          │  ▲ │
//                     pause│  │ └───(derived)───▶ Expired
//                          ▼  │resume
//                         Paused
//   any ────schedule────▶ Scheduled

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::EngineError;
use crate::model::{Offer, OfferStatus};

fn invalid(from: OfferStatus, to: OfferStatus, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidStateTransition {
        from,
        to,
        reason: reason.into(),
    }
}

/// Draft/Scheduled/Inactive → Active. Sets the enabled flag.
///
/// Paused offers must `resume` (window re-check) and Expired offers
/// must `schedule` a new window first.
pub fn activate(offer: &Offer) -> Result<Offer, EngineError> {
    match offer.status {
        OfferStatus::Draft | OfferStatus::Scheduled | OfferStatus::Inactive => {
            let mut next = offer.clone();
            next.status = OfferStatus::Active;
            next.enabled = true;
            Ok(next)
        }
        OfferStatus::Paused => Err(invalid(
            offer.status,
            OfferStatus::Active,
            "paused offers are resumed, not activated",
        )),
        OfferStatus::Expired => Err(invalid(
            offer.status,
            OfferStatus::Active,
            "expired offers need a new window; schedule one first",
        )),
        OfferStatus::Active => Err(invalid(
            offer.status,
            OfferStatus::Active,
            "offer is already active",
        )),
    }
}

/// Active → Inactive. Clears the enabled flag.
pub fn deactivate(offer: &Offer) -> Result<Offer, EngineError> {
    if offer.status != OfferStatus::Active {
        return Err(invalid(
            offer.status,
            OfferStatus::Inactive,
            "only active offers can be deactivated",
        ));
    }
    let mut next = offer.clone();
    next.status = OfferStatus::Inactive;
    next.enabled = false;
    Ok(next)
}

/// Active → Paused. A deliberate pause, distinct from expiry: the
/// offer is retained but not selectable.
pub fn pause(offer: &Offer) -> Result<Offer, EngineError> {
    if offer.status != OfferStatus::Active {
        return Err(invalid(
            offer.status,
            OfferStatus::Paused,
            "only active offers can be paused",
        ));
    }
    let mut next = offer.clone();
    next.status = OfferStatus::Paused;
    Ok(next)
}

/// Paused → Active, only while `now` is still inside the offer's date
/// window. Outside the window the resume is rejected and the offer
/// stays Paused; the window must be rescheduled first.
pub fn resume(offer: &Offer, now: DateTime<Utc>) -> Result<Offer, EngineError> {
    if offer.status != OfferStatus::Paused {
        return Err(invalid(
            offer.status,
            OfferStatus::Active,
            "only paused offers can be resumed",
        ));
    }
    if !offer.window_contains(now) {
        return Err(invalid(
            offer.status,
            OfferStatus::Active,
            format!(
                "cannot resume at {now}: outside window {} .. {}",
                offer.starts_at, offer.ends_at
            ),
        ));
    }
    let mut next = offer.clone();
    next.status = OfferStatus::Active;
    Ok(next)
}

/// Any state → Scheduled with a new validity window.
///
/// Requires `starts_at <= ends_at` and a window that has not already
/// closed.
pub fn schedule(
    offer: &Offer,
    now: DateTime<Utc>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Result<Offer, EngineError> {
    if starts_at > ends_at {
        return Err(invalid(
            offer.status,
            OfferStatus::Scheduled,
            format!("window starts at {starts_at}, after it ends at {ends_at}"),
        ));
    }
    if ends_at <= now {
        return Err(invalid(
            offer.status,
            OfferStatus::Scheduled,
            format!("window already closed at {ends_at}"),
        ));
    }
    let mut next = offer.clone();
    next.status = OfferStatus::Scheduled;
    next.starts_at = starts_at;
    next.ends_at = ends_at;
    Ok(next)
}

/// Best-effort expiry annotation, written by the periodic sweep for
/// reporting. Idempotent; never touches usage or recurrence counters.
/// The validity evaluator does not consult this status for dates — it
/// recomputes from timestamps.
pub fn mark_expired(offer: &Offer, now: DateTime<Utc>) -> Result<Offer, EngineError> {
    if offer.status == OfferStatus::Expired {
        return Ok(offer.clone());
    }
    if offer.ends_at.date_naive() >= now.date_naive() {
        return Err(invalid(
            offer.status,
            OfferStatus::Expired,
            format!("offer does not end until {}", offer.ends_at),
        ));
    }
    debug!(offer_id = %offer.id, ends_at = %offer.ends_at, "annotating offer as expired");
    let mut next = offer.clone();
    next.status = OfferStatus::Expired;
    Ok(next)
}
