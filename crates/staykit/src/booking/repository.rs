use super::domain::{
    PolicyId, RentableUnit, ReservationId, ReservationInterval, ReservationStatus, StayWindow,
    UnitId,
};
use super::pricing::adjustment::AdjustmentPolicy;
use super::pricing::policy::PricingPolicy;

/// Read access to the unit catalog. The catalog is owned elsewhere; the
/// booking core only ever looks units up.
pub trait UnitDirectory: Send + Sync {
    fn find_unit(&self, id: &UnitId) -> Result<Option<RentableUnit>, StoreError>;
}

/// Read access to pricing and adjustment policies. Policies are
/// snapshot-versioned upstream; a lookup always returns the current version.
pub trait PolicyDirectory: Send + Sync {
    fn find_active_policy(&self, id: &PolicyId) -> Result<Option<PricingPolicy>, StoreError>;
    fn find_adjustment(&self, id: &PolicyId) -> Result<Option<AdjustmentPolicy>, StoreError>;
    /// Active adjustment policy carrying the given voucher code, if any.
    fn find_by_voucher(&self, code: &str) -> Result<Option<AdjustmentPolicy>, StoreError>;
    /// Every other adjustment policy, for conflict detection.
    fn siblings_of(&self, id: &PolicyId) -> Result<Vec<AdjustmentPolicy>, StoreError>;
    /// Units the given adjustment policy is currently assigned to.
    fn units_assigned(&self, id: &PolicyId) -> Result<Vec<UnitId>, StoreError>;
}

/// Storage abstraction for reservation intervals so the service module can be
/// exercised in isolation.
pub trait ReservationStore: Send + Sync {
    /// Intervals on the unit whose window overlaps the given one and whose
    /// status is in `statuses`.
    fn find_overlapping(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<ReservationInterval>, StoreError>;
    fn insert(&self, interval: ReservationInterval)
        -> Result<ReservationInterval, StoreError>;
    fn update(&self, interval: ReservationInterval) -> Result<(), StoreError>;
    fn fetch(&self, id: &ReservationId) -> Result<Option<ReservationInterval>, StoreError>;
    /// Calendar view: every interval touching the window, any status.
    fn in_window(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
    ) -> Result<Vec<ReservationInterval>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    /// Retryable transaction conflict. `reserve` retries these a bounded
    /// number of times before surfacing a booking conflict.
    #[error("transient transaction conflict")]
    TransientConflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
