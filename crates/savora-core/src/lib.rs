//! Promotional-offer lifecycle and redemption engine.
//!
//! This crate owns the one correctness-sensitive subsystem of the
//! savora back end: deciding which discount offers are usable at any
//! instant, walking them through their status state machine, computing
//! recurring re-activation schedules, and guaranteeing that redemption
//! counters never exceed their caps under concurrent access.
//!
//! - **[`OfferEngine`]** — Facade over the store and clock. Lifecycle
//!   transitions, [`select_valid_offers`](OfferEngine::select_valid_offers),
//!   [`try_record_usage`](OfferEngine::try_record_usage), and
//!   [`run_recurrence_sweep`](OfferEngine::run_recurrence_sweep).
//!
//! - **[`validity`]** — Pure predicates: `is_valid_at(offer, t)` works
//!   for any instant, past or future; expiry is always recomputed from
//!   timestamps, never read from the stored status.
//!
//! - **[`lifecycle`]** — Pure transition functions over
//!   [`OfferStatus`]; preconditions checked before any state is built.
//!
//! - **[`OfferStore`]** — The persistence seam. Reads return a version
//!   token; writes are conditional on it. The usage ledger and the
//!   recurrence sweep both ride this optimistic-concurrency discipline,
//!   so racing writers re-read instead of silently overwriting.
//!
//! - **Domain model** ([`model`]) — [`Offer`] and its supporting value
//!   types, including the parsed [`RecurrenceRule`] variant set.
//!
//! Storage engines, HTTP surfaces, authentication, payments, and the
//! periodic trigger that invokes sweeps all live outside this crate.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod selector;
pub mod store;
pub mod sweep;
pub mod validity;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use engine::OfferEngine;
pub use error::EngineError;
pub use ledger::UsageLedgerResult;
pub use store::{OfferFilters, OfferStore, StoreError, Versioned};
pub use sweep::{SweepAction, SweepReport};
pub use validity::{UsageRejection, can_be_used, is_valid_at};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DailyWindow,
    DiscountTerms,
    Offer,
    OfferId,
    OfferStatus,
    RecurrenceRule,
    RecurrenceSpec,
    RestaurantId,
};
