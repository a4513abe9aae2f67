// ── Offer store interface ──
//
// The engine never owns persistence. It consumes this trait: point
// reads with a version token, conditional writes against that token,
// and the two query shapes the selector and the recurrence sweep need.
// The store owns the physical representation.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Offer, OfferId, OfferStatus, RestaurantId};

// ── Versioned reads ─────────────────────────────────────────────────

/// A value paired with the optimistic-concurrency token it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

// ── Query filters ───────────────────────────────────────────────────

/// Filters for `query_by_restaurant`. All fields are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferFilters {
    pub status: Option<OfferStatus>,
    /// Matches offers whose discount applies to this menu category.
    /// Offers with an empty category list apply to every category.
    pub category: Option<String>,
}

impl OfferFilters {
    pub fn matches(&self, offer: &Offer) -> bool {
        if self.status.is_some_and(|s| offer.status != s) {
            return false;
        }
        if let Some(category) = &self.category {
            if !offer.discount.categories.is_empty()
                && !offer.discount.categories.iter().any(|c| c == category)
            {
                return false;
            }
        }
        true
    }
}

// ── Errors ──────────────────────────────────────────────────────────

/// Errors surfaced by an offer store implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("offer not found: {id}")]
    NotFound { id: OfferId },

    #[error("offer already exists: {id}")]
    AlreadyExists { id: OfferId },

    /// The record changed since it was read at `expected`.
    #[error("version conflict on offer {id}: expected {expected}, found {found}")]
    VersionConflict {
        id: OfferId,
        expected: u64,
        found: u64,
    },

    #[error("storage backend error: {message}")]
    Backend { message: String },
}

// ── Store trait ─────────────────────────────────────────────────────

/// Persistence contract consumed by the engine.
///
/// Futures are required to be `Send` so engine operations can run on a
/// multi-threaded worker pool.
pub trait OfferStore: Send + Sync {
    /// Fetch an offer together with its current version token.
    fn get(
        &self,
        id: OfferId,
    ) -> impl Future<Output = Result<Versioned<Offer>, StoreError>> + Send;

    /// Insert a new offer; returns its initial version token.
    fn insert(&self, offer: Offer) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Replace the offer iff its stored version still equals
    /// `expected_version`; returns the new version on success and
    /// `VersionConflict` if another writer got there first.
    fn conditional_update(
        &self,
        id: OfferId,
        offer: Offer,
        expected_version: u64,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// All offers owned by a restaurant that pass `filters`, in no
    /// particular order.
    fn query_by_restaurant(
        &self,
        restaurant_id: RestaurantId,
        filters: &OfferFilters,
    ) -> impl Future<Output = Result<Vec<Offer>, StoreError>> + Send;

    /// Active recurring offers whose `next_occurrence` is at or before
    /// `now`.
    fn query_due_for_recurrence(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Offer>, StoreError>> + Send;
}
