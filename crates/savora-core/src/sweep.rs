// ── Recurrence sweep ──
//
// Invoked by an external periodic trigger, never self-scheduled. Each
// due offer is advanced independently with the same conditional-write
// discipline as the usage ledger, so a sweep racing a redemption on
// the same offer can never silently overwrite it. Per-offer failures
// are collected into the report; one bad offer never aborts the batch.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::model::{Offer, OfferId, OfferStatus, RecurrenceRule};
use crate::store::{OfferStore, StoreError, Versioned};

/// How a single due offer was handled by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// A new `next_occurrence` was written.
    Rescheduled { next_occurrence: DateTime<Utc> },
    /// The occurrence cap was reached; the offer is now Expired.
    Expired,
    /// The fresh record was no longer due (a concurrent sweep or a
    /// lifecycle change got there first). Nothing written.
    NotDue,
}

/// Per-offer results of one `run_recurrence_sweep` call.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub advanced: Vec<(OfferId, SweepAction)>,
    /// Offers skipped with their failure. Malformed patterns land here,
    /// as do retry-exhausted writes.
    pub failed: Vec<(OfferId, EngineError)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Offers for which anything was actually written.
    pub fn written(&self) -> usize {
        self.advanced
            .iter()
            .filter(|(_, action)| !matches!(action, SweepAction::NotDue))
            .count()
    }
}

/// Advance every recurring Active offer whose `next_occurrence` has
/// passed. Re-running with the same `now` writes nothing the second
/// time: rescheduled offers are strictly in the future and expired
/// offers are no longer Active.
pub(crate) async fn run_recurrence_sweep<S: OfferStore>(
    store: &S,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> Result<SweepReport, EngineError> {
    let due = store.query_due_for_recurrence(now).await?;
    debug!(count = due.len(), %now, "recurrence sweep starting");

    let mut report = SweepReport::default();
    for offer in due {
        let id = offer.id;
        match advance_offer(store, id, now, max_attempts).await {
            Ok(action) => report.advanced.push((id, action)),
            Err(err) => {
                warn!(offer_id = %id, error = %err, "recurrence sweep skipped offer");
                report.failed.push((id, err));
            }
        }
    }

    info!(
        written = report.written(),
        failed = report.failed.len(),
        "recurrence sweep finished"
    );
    Ok(report)
}

/// Advance one offer: parse its rule, bump the occurrence counter, and
/// either expire it (cap reached) or write the next occurrence.
async fn advance_offer<S: OfferStore>(
    store: &S,
    id: OfferId,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> Result<SweepAction, EngineError> {
    for _attempt in 1..=max_attempts {
        let Versioned {
            value: offer,
            version,
        } = store.get(id).await?;

        // The due query ran earlier; the record may have moved on since.
        if !offer.due_for_recurrence(now) {
            return Ok(SweepAction::NotDue);
        }

        let (updated, action) = advanced_copy(&offer, now)?;
        match store.conditional_update(id, updated, version).await {
            Ok(_) => return Ok(action),
            Err(StoreError::VersionConflict { .. }) => {
                debug!(offer_id = %id, "sweep write lost the race, refetching");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(EngineError::ConcurrentModification {
        id,
        attempts: max_attempts,
    })
}

/// Pure step: the advanced offer plus what the advance did.
fn advanced_copy(offer: &Offer, now: DateTime<Utc>) -> Result<(Offer, SweepAction), EngineError> {
    let Some(spec) = &offer.recurrence else {
        // due_for_recurrence already requires a spec; defend the seam.
        return Err(EngineError::ValidationFailed {
            message: format!("offer {} has no recurrence spec", offer.id),
        });
    };

    let rule: RecurrenceRule = spec.rule.parse()?;
    let occurrences = spec.current_occurrences.saturating_add(1);

    let mut next = offer.clone();
    if spec.max_occurrences.is_some_and(|max| occurrences >= max) {
        // Terminal for recurrence purposes: no new occurrence computed.
        next.status = OfferStatus::Expired;
        if let Some(s) = next.recurrence.as_mut() {
            s.current_occurrences = occurrences;
        }
        return Ok((next, SweepAction::Expired));
    }

    let next_occurrence = rule.next_after(spec.next_occurrence, now).ok_or_else(|| {
        EngineError::MalformedRecurrencePattern {
            pattern: spec.rule.clone(),
            reason: "next occurrence overflows the calendar range".into(),
        }
    })?;
    if let Some(s) = next.recurrence.as_mut() {
        s.current_occurrences = occurrences;
        s.next_occurrence = next_occurrence;
    }
    Ok((next, SweepAction::Rescheduled { next_occurrence }))
}
