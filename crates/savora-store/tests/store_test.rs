#![allow(clippy::unwrap_used)]
// Compare-and-swap semantics of the in-memory store.

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;

use savora_core::model::{Offer, OfferStatus, RecurrenceSpec, RestaurantId};
use savora_core::store::{OfferFilters, OfferStore, StoreError};
use savora_store::MemoryOfferStore;

// ── Helpers ─────────────────────────────────────────────────────────

fn ts(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, 0, 0, 0).unwrap()
}

fn offer(restaurant_id: RestaurantId, title: &str) -> Offer {
    Offer::new(
        restaurant_id,
        title,
        ts(2026, 3, 1),
        ts(2026, 3, 31),
        ts(2026, 2, 1),
    )
    .unwrap()
}

// ── Insert / get ────────────────────────────────────────────────────

#[tokio::test]
async fn insert_assigns_version_one() {
    let store = MemoryOfferStore::new();
    let o = offer(RestaurantId::new(), "First");
    let id = o.id;

    assert_eq!(store.insert(o).await.unwrap(), 1);

    let fetched = store.get(id).await.unwrap();
    assert_eq!(fetched.version, 1);
    assert_eq!(fetched.value.title, "First");
}

#[tokio::test]
async fn double_insert_is_rejected() {
    let store = MemoryOfferStore::new();
    let o = offer(RestaurantId::new(), "Dup");
    store.insert(o.clone()).await.unwrap();

    let err = store.insert(o).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
    let store = MemoryOfferStore::new();
    let missing = offer(RestaurantId::new(), "ghost").id;
    assert!(matches!(
        store.get(missing).await,
        Err(StoreError::NotFound { id }) if id == missing
    ));
}

// ── Conditional update ──────────────────────────────────────────────

#[tokio::test]
async fn conditional_update_bumps_version() {
    let store = MemoryOfferStore::new();
    let mut o = offer(RestaurantId::new(), "Versioned");
    let id = o.id;
    store.insert(o.clone()).await.unwrap();

    o.title = "Versioned v2".into();
    assert_eq!(store.conditional_update(id, o, 1).await.unwrap(), 2);

    let fetched = store.get(id).await.unwrap();
    assert_eq!(fetched.version, 2);
    assert_eq!(fetched.value.title, "Versioned v2");
}

#[tokio::test]
async fn stale_version_conflicts_and_writes_nothing() {
    let store = MemoryOfferStore::new();
    let mut o = offer(RestaurantId::new(), "Raced");
    let id = o.id;
    store.insert(o.clone()).await.unwrap();

    // A first writer wins.
    o.current_uses = 1;
    store.conditional_update(id, o.clone(), 1).await.unwrap();

    // A second writer holding the stale token loses.
    o.current_uses = 99;
    let err = store.conditional_update(id, o, 1).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::VersionConflict {
            expected: 1,
            found: 2,
            ..
        }
    ));

    let fetched = store.get(id).await.unwrap();
    assert_eq!(fetched.value.current_uses, 1);
}

// ── Queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn query_by_restaurant_scopes_and_filters() {
    let store = MemoryOfferStore::new();
    let mine = RestaurantId::new();
    let theirs = RestaurantId::new();

    let mut active = offer(mine, "Active one");
    active.status = OfferStatus::Active;
    store.insert(active).await.unwrap();
    store.insert(offer(mine, "Draft one")).await.unwrap();
    store.insert(offer(theirs, "Other shop")).await.unwrap();

    let all_mine = store
        .query_by_restaurant(mine, &OfferFilters::default())
        .await
        .unwrap();
    assert_eq!(all_mine.len(), 2);

    let active_mine = store
        .query_by_restaurant(
            mine,
            &OfferFilters {
                status: Some(OfferStatus::Active),
                ..OfferFilters::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(active_mine.len(), 1);
    assert_eq!(active_mine[0].title, "Active one");
}

#[tokio::test]
async fn query_due_for_recurrence_requires_active_and_past_due() {
    let store = MemoryOfferStore::new();
    let restaurant = RestaurantId::new();
    let now = ts(2026, 3, 10);

    let spec = |next| RecurrenceSpec {
        rule: "daily".into(),
        next_occurrence: next,
        max_occurrences: None,
        current_occurrences: 0,
    };

    let mut due = offer(restaurant, "due");
    due.status = OfferStatus::Active;
    due.recurrence = Some(spec(ts(2026, 3, 9)));
    let due_id = due.id;
    store.insert(due).await.unwrap();

    let mut future = offer(restaurant, "future");
    future.status = OfferStatus::Active;
    future.recurrence = Some(spec(ts(2026, 3, 11)));
    store.insert(future).await.unwrap();

    let mut paused = offer(restaurant, "paused");
    paused.status = OfferStatus::Paused;
    paused.recurrence = Some(spec(ts(2026, 3, 9)));
    store.insert(paused).await.unwrap();

    let mut plain = offer(restaurant, "no recurrence");
    plain.status = OfferStatus::Active;
    store.insert(plain).await.unwrap();

    let found = store.query_due_for_recurrence(now).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, due_id);
}
