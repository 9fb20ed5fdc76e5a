//! Price computation: the parameterized quote pipeline, booking-time
//! adjustment policies, and the advisory policy conflict detector.

pub mod adjustment;
pub mod conflicts;
pub mod engine;
pub mod money;
pub mod policy;
pub mod quote;

pub use adjustment::{
    AdjustedPrice, AdjustmentContext, AdjustmentKind, AdjustmentPolicy, EffectiveRange,
    PolicyStatus,
};
pub use conflicts::{detect_conflicts, ConflictKind, ConflictSeverity, PolicyConflict};
pub use engine::{compute_quote, DurationClass, PricingError};
pub use policy::{
    DayOfWeek, DurationDiscount, FeeSchedule, PriceUnit, PricingPolicy, RateRules, SeasonalRate,
};
pub use quote::{PriceQuote, QuoteDuration, QuoteLine};
