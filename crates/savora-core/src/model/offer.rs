// ── Offer domain types ──
//
// The central entity of the engine. Offers are plain data: every
// mutation flows through the lifecycle controller, the recurrence
// sweep, or the usage ledger — never through ad-hoc field pokes.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::EngineError;

// ── Identifiers ─────────────────────────────────────────────────────

/// Unique offer identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OfferId(Uuid);

impl OfferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OfferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OfferId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

/// Identifier of the restaurant that owns an offer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RestaurantId(Uuid);

impl RestaurantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RestaurantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RestaurantId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

// ── Status ──────────────────────────────────────────────────────────

/// Persisted lifecycle tag.
///
/// `Expired` is a best-effort annotation written by the expiry sweep
/// for reporting; the validity evaluator always recomputes expiry from
/// timestamps and never consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Draft,
    Scheduled,
    Active,
    Paused,
    Inactive,
    Expired,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

// ── Supporting value types ──────────────────────────────────────────

/// Time-of-day window the offer is usable within, on each valid day.
/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DailyWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, EngineError> {
        if start > end {
            return Err(EngineError::ValidationFailed {
                message: format!("daily window start {start} is after end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Discount parameters. Opaque to the engine except `categories`,
/// which feeds the store-level search filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DiscountTerms {
    /// Percentage off the order subtotal, 0–100.
    pub percent_off: u8,
    /// Minimum order amount (cents) for the offer to apply.
    pub min_order_cents: Option<u64>,
    pub free_delivery: bool,
    pub buy_one_get_one: bool,
    /// Menu categories the discount applies to. Empty = all.
    pub categories: Vec<String>,
}

/// Recurring re-activation state.
///
/// `rule` is the serialized recurrence rule text (see
/// [`RecurrenceRule`](crate::model::RecurrenceRule)); it is parsed by
/// the sweep, not here, so a malformed rule surfaces as a per-offer
/// sweep failure rather than a deserialization error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub rule: String,
    pub next_occurrence: DateTime<Utc>,
    pub max_occurrences: Option<u32>,
    pub current_occurrences: u32,
}

// ── Offer ───────────────────────────────────────────────────────────

/// A time-bounded promotional discount rule owned by a restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub restaurant_id: RestaurantId,

    // Display only — no invariants.
    pub title: String,
    pub description: String,

    /// Overall validity window, `starts_at <= ends_at`.
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,

    /// Optional time-of-day restriction on each valid day.
    pub daily_window: Option<DailyWindow>,

    /// Applicable weekdays. Empty means every day.
    pub weekdays: Vec<Weekday>,

    pub discount: DiscountTerms,

    pub recurrence: Option<RecurrenceSpec>,

    /// Redemption cap. `None` = unlimited.
    pub max_uses: Option<u32>,
    pub current_uses: u32,
    pub last_used: Option<DateTime<Utc>>,

    /// Higher wins ties during selection.
    pub priority: i32,

    pub status: OfferStatus,

    /// Secondary gate, independent of `status`. Both must allow use.
    pub enabled: bool,

    /// Creation stamp; final deterministic tie-break in selection.
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// Create a new Draft offer with the given validity window.
    ///
    /// The window invariant (`starts_at <= ends_at`) is checked here and
    /// again by `schedule()`; those are the only two places a window is
    /// ever written.
    pub fn new(
        restaurant_id: RestaurantId,
        title: impl Into<String>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        if starts_at > ends_at {
            return Err(EngineError::ValidationFailed {
                message: format!("offer window starts at {starts_at}, after it ends at {ends_at}"),
            });
        }
        Ok(Self {
            id: OfferId::new(),
            restaurant_id,
            title: title.into(),
            description: String::new(),
            starts_at,
            ends_at,
            daily_window: None,
            weekdays: Vec::new(),
            discount: DiscountTerms::default(),
            recurrence: None,
            max_uses: None,
            current_uses: 0,
            last_used: None,
            priority: 0,
            status: OfferStatus::Draft,
            enabled: false,
            created_at,
        })
    }

    /// Whether `at` falls within the offer's date window.
    ///
    /// Date-granular and inclusive on both ends: an offer with
    /// `starts_at = ends_at = today` is valid the whole of today and
    /// invalid one instant into tomorrow.
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        let date = at.date_naive();
        self.starts_at.date_naive() <= date && date <= self.ends_at.date_naive()
    }

    /// Whether the redemption cap has been reached.
    pub fn usage_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.current_uses >= max)
    }

    /// Whether the day-of-week restriction (if any) admits `at`.
    pub fn applies_on(&self, weekday: Weekday) -> bool {
        self.weekdays.is_empty() || self.weekdays.contains(&weekday)
    }

    /// Whether the recurrence sweep should process this offer at `now`.
    pub fn due_for_recurrence(&self, now: DateTime<Utc>) -> bool {
        self.status == OfferStatus::Active
            && self
                .recurrence
                .as_ref()
                .is_some_and(|r| r.next_occurrence <= now)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn new_offer_starts_in_draft() {
        let offer = Offer::new(
            RestaurantId::new(),
            "Lunch deal",
            ts(2026, 3, 1, 0, 0, 0),
            ts(2026, 3, 31, 23, 59, 59),
            ts(2026, 2, 20, 9, 0, 0),
        )
        .unwrap();
        assert_eq!(offer.status, OfferStatus::Draft);
        assert!(!offer.enabled);
        assert_eq!(offer.current_uses, 0);
    }

    #[test]
    fn new_offer_rejects_inverted_window() {
        let result = Offer::new(
            RestaurantId::new(),
            "Backwards",
            ts(2026, 3, 31, 0, 0, 0),
            ts(2026, 3, 1, 0, 0, 0),
            ts(2026, 2, 20, 9, 0, 0),
        );
        assert!(matches!(
            result,
            Err(EngineError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn window_contains_is_date_granular() {
        let mut offer = Offer::new(
            RestaurantId::new(),
            "One day only",
            ts(2026, 3, 15, 12, 0, 0),
            ts(2026, 3, 15, 12, 0, 0),
            ts(2026, 2, 20, 9, 0, 0),
        )
        .unwrap();
        offer.status = OfferStatus::Active;

        // Any instant on the day counts, even outside the stamp's time.
        assert!(offer.window_contains(ts(2026, 3, 15, 0, 0, 0)));
        assert!(offer.window_contains(ts(2026, 3, 15, 23, 59, 59)));
        // One day either side does not.
        assert!(!offer.window_contains(ts(2026, 3, 14, 23, 59, 59)));
        assert!(!offer.window_contains(ts(2026, 3, 16, 0, 0, 0)));
    }

    #[test]
    fn daily_window_is_inclusive() {
        let w = DailyWindow::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .unwrap();
        assert!(w.contains(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert!(w.contains(NaiveTime::from_hms_opt(17, 0, 0).unwrap()));
        assert!(!w.contains(NaiveTime::from_hms_opt(8, 59, 59).unwrap()));
        assert!(!w.contains(NaiveTime::from_hms_opt(17, 0, 1).unwrap()));
    }

    #[test]
    fn daily_window_rejects_inverted_bounds() {
        let result = DailyWindow::new(
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn usage_exhausted_only_when_capped() {
        let mut offer = Offer::new(
            RestaurantId::new(),
            "Capped",
            ts(2026, 3, 1, 0, 0, 0),
            ts(2026, 3, 31, 0, 0, 0),
            ts(2026, 2, 20, 9, 0, 0),
        )
        .unwrap();
        offer.current_uses = 1_000;
        assert!(!offer.usage_exhausted());

        offer.max_uses = Some(1_000);
        assert!(offer.usage_exhausted());
        offer.max_uses = Some(1_001);
        assert!(!offer.usage_exhausted());
    }

    #[test]
    fn empty_weekday_set_means_every_day() {
        let offer = Offer::new(
            RestaurantId::new(),
            "Any day",
            ts(2026, 3, 1, 0, 0, 0),
            ts(2026, 3, 31, 0, 0, 0),
            ts(2026, 2, 20, 9, 0, 0),
        )
        .unwrap();
        assert!(offer.applies_on(Weekday::Mon));
        assert!(offer.applies_on(Weekday::Sun));
    }

    #[test]
    fn offer_round_trips_through_json() {
        let mut offer = Offer::new(
            RestaurantId::new(),
            "Serde",
            ts(2026, 3, 1, 0, 0, 0),
            ts(2026, 3, 31, 0, 0, 0),
            ts(2026, 2, 20, 9, 0, 0),
        )
        .unwrap();
        offer.recurrence = Some(RecurrenceSpec {
            rule: "every 3 days".into(),
            next_occurrence: ts(2026, 3, 4, 0, 0, 0),
            max_occurrences: Some(5),
            current_occurrences: 1,
        });

        let json = serde_json::to_string(&offer).unwrap();
        let back: Offer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, offer);
    }
}
