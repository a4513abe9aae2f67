// ── Selector / ranker ──
//
// Fetches a restaurant's candidates, keeps the ones valid at the given
// instant, and orders them for presentation or auto-application.
// Ordering is total: priority descending, then earliest start, then
// creation stamp, then id — never arbitrary.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::EngineError;
use crate::model::{Offer, RestaurantId};
use crate::store::{OfferFilters, OfferStore};
use crate::validity::is_valid_at;

/// Deterministic presentation order for valid offers.
pub fn rank(a: &Offer, b: &Offer) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.starts_at.cmp(&b.starts_at))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Offers valid for `restaurant_id` at `at`, ranked.
pub(crate) async fn select_valid_offers<S: OfferStore>(
    store: &S,
    restaurant_id: RestaurantId,
    filters: &OfferFilters,
    at: DateTime<Utc>,
) -> Result<Vec<Offer>, EngineError> {
    let mut candidates = store.query_by_restaurant(restaurant_id, filters).await?;
    let fetched = candidates.len();
    candidates.retain(|offer| is_valid_at(offer, at));
    candidates.sort_by(rank);

    debug!(
        restaurant_id = %restaurant_id,
        fetched,
        valid = candidates.len(),
        "selected valid offers"
    );
    Ok(candidates)
}
