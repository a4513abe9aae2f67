// ── Domain model ──

mod offer;
mod recurrence;

pub use offer::{
    DailyWindow, DiscountTerms, Offer, OfferId, OfferStatus, RecurrenceSpec, RestaurantId,
};
pub use recurrence::RecurrenceRule;
