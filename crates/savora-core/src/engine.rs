// ── Engine facade ──
//
// Single entry point for consumers (API layer, periodic triggers).
// Holds the store, the injected clock, and the retry policy; every
// operation re-reads before it writes and writes conditionally on the
// version token it read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ledger::{self, UsageLedgerResult};
use crate::lifecycle;
use crate::model::{Offer, OfferId, RestaurantId};
use crate::selector;
use crate::store::{OfferFilters, OfferStore, StoreError, Versioned};
use crate::sweep::{self, SweepReport};

/// The promotional-offer engine.
///
/// Generic over the store (persistence is external) and the clock
/// (injectable for deterministic tests). Cheap to clone.
pub struct OfferEngine<S, C = SystemClock> {
    store: Arc<S>,
    clock: C,
    config: EngineConfig,
}

// Manual impl: the store is behind an `Arc`, so `S: Clone` is not
// required the way a derive would insist.
impl<S, C: Clock + Clone> Clone for OfferEngine<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: OfferStore> OfferEngine<S, SystemClock> {
    /// Engine on wall-clock time with default retry policy.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, SystemClock, EngineConfig::default())
    }
}

impl<S: OfferStore, C: Clock> OfferEngine<S, C> {
    pub fn with_clock(store: Arc<S>, clock: C, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current engine time, from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Offer creation ───────────────────────────────────────────────

    /// Persist a freshly built offer (Draft). Returns its initial
    /// version token.
    pub async fn create_offer(&self, offer: Offer) -> Result<u64, EngineError> {
        let id = offer.id;
        let version = self.store.insert(offer).await?;
        info!(offer_id = %id, "offer created");
        Ok(version)
    }

    // ── Lifecycle transitions ────────────────────────────────────────

    /// Activate a Draft, Scheduled, or Inactive offer.
    pub async fn activate(&self, id: OfferId) -> Result<Offer, EngineError> {
        self.apply_transition(id, "activate", |offer, _| lifecycle::activate(offer))
            .await
    }

    /// Deactivate an Active offer.
    pub async fn deactivate(&self, id: OfferId) -> Result<Offer, EngineError> {
        self.apply_transition(id, "deactivate", |offer, _| lifecycle::deactivate(offer))
            .await
    }

    /// Pause an Active offer.
    pub async fn pause(&self, id: OfferId) -> Result<Offer, EngineError> {
        self.apply_transition(id, "pause", |offer, _| lifecycle::pause(offer))
            .await
    }

    /// Resume a Paused offer; fails if the validity window has passed.
    pub async fn resume(&self, id: OfferId) -> Result<Offer, EngineError> {
        self.apply_transition(id, "resume", lifecycle::resume).await
    }

    /// Move an offer to Scheduled with a new validity window.
    pub async fn schedule(
        &self,
        id: OfferId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Offer, EngineError> {
        self.apply_transition(id, "schedule", |offer, now| {
            lifecycle::schedule(offer, now, starts_at, ends_at)
        })
        .await
    }

    /// Annotate an offer whose window has passed as Expired.
    /// Idempotent; usage counters are untouched.
    pub async fn mark_expired(&self, id: OfferId) -> Result<Offer, EngineError> {
        self.apply_transition(id, "mark_expired", lifecycle::mark_expired)
            .await
    }

    /// Read-transition-write with the shared conditional-update retry
    /// loop. Transition failures propagate immediately (the stored
    /// offer was not touched); only version conflicts retry.
    async fn apply_transition<F>(
        &self,
        id: OfferId,
        name: &'static str,
        transition: F,
    ) -> Result<Offer, EngineError>
    where
        F: Fn(&Offer, DateTime<Utc>) -> Result<Offer, EngineError>,
    {
        let now = self.clock.now();
        for attempt in 1..=self.config.max_write_attempts {
            let Versioned {
                value: offer,
                version,
            } = self.store.get(id).await?;

            let next = transition(&offer, now)?;

            match self.store.conditional_update(id, next.clone(), version).await {
                Ok(_) => {
                    info!(offer_id = %id, transition = name, status = %next.status, "transition applied");
                    return Ok(next);
                }
                Err(StoreError::VersionConflict { .. }) => {
                    debug!(offer_id = %id, transition = name, attempt, "transition lost the race, refetching");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(EngineError::ConcurrentModification {
            id,
            attempts: self.config.max_write_attempts,
        })
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Offers valid for the restaurant at `at`, ranked for
    /// presentation.
    pub async fn select_valid_offers(
        &self,
        restaurant_id: RestaurantId,
        at: DateTime<Utc>,
    ) -> Result<Vec<Offer>, EngineError> {
        selector::select_valid_offers(self.store.as_ref(), restaurant_id, &OfferFilters::default(), at)
            .await
    }

    /// Like [`select_valid_offers`](Self::select_valid_offers), with a
    /// category search filter applied at the store.
    pub async fn select_valid_offers_in_category(
        &self,
        restaurant_id: RestaurantId,
        category: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<Offer>, EngineError> {
        let filters = OfferFilters {
            category: Some(category.to_owned()),
            ..OfferFilters::default()
        };
        selector::select_valid_offers(self.store.as_ref(), restaurant_id, &filters, at).await
    }

    // ── Redemption ───────────────────────────────────────────────────

    /// Atomically record one redemption, enforcing the usage cap under
    /// concurrent attempts.
    pub async fn try_record_usage(&self, id: OfferId) -> Result<UsageLedgerResult, EngineError> {
        ledger::try_record_usage(
            self.store.as_ref(),
            id,
            self.clock.now(),
            self.config.max_write_attempts,
        )
        .await
    }

    // ── Recurrence ───────────────────────────────────────────────────

    /// One recurrence sweep tick, driven by the external trigger's
    /// `now`. Partial-failure semantics: see [`SweepReport`].
    pub async fn run_recurrence_sweep(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, EngineError> {
        sweep::run_recurrence_sweep(self.store.as_ref(), now, self.config.max_write_attempts).await
    }
}
