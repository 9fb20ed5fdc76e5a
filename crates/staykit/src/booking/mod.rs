//! Booking core: availability resolution under three allocation
//! disciplines, the reservation lifecycle, and dynamic pricing.

pub mod availability;
pub mod domain;
pub mod pricing;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use availability::{
    AvailabilityError, AvailabilityOutcome, AvailabilityResolver, ExclusiveSlots, SlotPolicy,
    MAX_SUGGESTION_PROBES, SUGGESTION_TARGET,
};
pub use domain::{
    AllocationDiscipline, GuestContact, GuestCount, PolicyId, RentableUnit, ReservationId,
    ReservationInterval, ReservationStatus, StayWindow, UnitId, WindowError,
};
pub use pricing::{
    AdjustmentKind, AdjustmentPolicy, DurationClass, PolicyConflict, PolicyStatus, PriceQuote,
    PriceUnit, PricingError, PricingPolicy,
};
pub use repository::{PolicyDirectory, ReservationStore, StoreError, UnitDirectory};
pub use router::booking_router;
pub use service::{
    AvailabilityReport, BookingError, BookingService, LeaseTerm, ReservationRequest,
};
