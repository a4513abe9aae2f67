//! In-memory versioned offer store.
//!
//! Backs the engine in tests and single-process embeddings. Each entry
//! carries the version token the engine's optimistic writes compare
//! against; `conditional_update` is an atomic compare-and-swap under
//! the entry's shard lock, which is exactly the contract a persistent
//! implementation must honor with its own mechanism (`WHERE version =`,
//! ETags, and so on).

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use savora_core::model::{Offer, OfferId, RestaurantId};
use savora_core::store::{OfferFilters, OfferStore, StoreError, Versioned};

/// Lock-free (per shard) offer storage with version tokens.
#[derive(Debug, Default)]
pub struct MemoryOfferStore {
    offers: DashMap<OfferId, Versioned<Offer>>,
}

impl MemoryOfferStore {
    pub fn new() -> Self {
        Self {
            offers: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl OfferStore for MemoryOfferStore {
    async fn get(&self, id: OfferId) -> Result<Versioned<Offer>, StoreError> {
        self.offers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound { id })
    }

    async fn insert(&self, offer: Offer) -> Result<u64, StoreError> {
        let id = offer.id;
        match self.offers.entry(id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists { id }),
            Entry::Vacant(slot) => {
                slot.insert(Versioned {
                    value: offer,
                    version: 1,
                });
                trace!(offer_id = %id, "offer inserted");
                Ok(1)
            }
        }
    }

    async fn conditional_update(
        &self,
        id: OfferId,
        offer: Offer,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        // `get_mut` holds the shard write lock for the whole
        // compare-and-swap; no await happens while it is held.
        let mut entry = self
            .offers
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;

        if entry.version != expected_version {
            return Err(StoreError::VersionConflict {
                id,
                expected: expected_version,
                found: entry.version,
            });
        }

        entry.value = offer;
        entry.version += 1;
        trace!(offer_id = %id, version = entry.version, "offer updated");
        Ok(entry.version)
    }

    async fn query_by_restaurant(
        &self,
        restaurant_id: RestaurantId,
        filters: &OfferFilters,
    ) -> Result<Vec<Offer>, StoreError> {
        Ok(self
            .offers
            .iter()
            .filter(|entry| {
                entry.value.restaurant_id == restaurant_id && filters.matches(&entry.value)
            })
            .map(|entry| entry.value.clone())
            .collect())
    }

    async fn query_due_for_recurrence(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Offer>, StoreError> {
        Ok(self
            .offers
            .iter()
            .filter(|entry| entry.value.due_for_recurrence(now))
            .map(|entry| entry.value.clone())
            .collect())
    }
}
