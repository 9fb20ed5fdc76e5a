use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::booking::booking_router;
use crate::booking::domain::{
    AllocationDiscipline, GuestCount, PolicyId, RentableUnit, ReservationId, ReservationInterval,
    ReservationStatus, StayWindow, UnitId,
};
use crate::booking::pricing::adjustment::{
    AdjustmentKind, AdjustmentPolicy, EffectiveRange, PolicyStatus,
};
use crate::booking::pricing::policy::{PriceUnit, PricingPolicy, RateRules};
use crate::booking::repository::{PolicyDirectory, ReservationStore, StoreError, UnitDirectory};
use crate::booking::service::{BookingService, ReservationRequest};

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn stay(start: NaiveDate, end: NaiveDate) -> StayWindow {
    StayWindow::closed(start, end).expect("valid window")
}

pub(super) fn villa() -> RentableUnit {
    RentableUnit {
        id: UnitId("unit-villa".to_string()),
        name: "Seaview Villa".to_string(),
        discipline: AllocationDiscipline::Exclusive,
        capacity: None,
        slot_configuration: None,
        max_occupancy: Some(4),
        instant_booking: false,
        pricing_policy: Some(PolicyId("pol-villa".to_string())),
    }
}

pub(super) fn beach_house() -> RentableUnit {
    RentableUnit {
        id: UnitId("unit-beach".to_string()),
        name: "Driftwood Beach House".to_string(),
        discipline: AllocationDiscipline::Exclusive,
        capacity: None,
        slot_configuration: None,
        max_occupancy: Some(6),
        instant_booking: true,
        pricing_policy: None,
    }
}

pub(super) fn dorm() -> RentableUnit {
    RentableUnit {
        id: UnitId("unit-dorm".to_string()),
        name: "Garden Dormitory".to_string(),
        discipline: AllocationDiscipline::Capacity,
        capacity: Some(8),
        slot_configuration: None,
        max_occupancy: None,
        instant_booking: false,
        pricing_policy: None,
    }
}

pub(super) fn studio() -> RentableUnit {
    RentableUnit {
        id: UnitId("unit-studio".to_string()),
        name: "Shared Atelier".to_string(),
        discipline: AllocationDiscipline::Slotted,
        capacity: None,
        slot_configuration: Some(json!({ "slots": 2 })),
        max_occupancy: None,
        instant_booking: false,
        pricing_policy: None,
    }
}

pub(super) fn nightly_policy() -> PricingPolicy {
    PricingPolicy {
        id: PolicyId("pol-villa".to_string()),
        name: "Villa nightly rate".to_string(),
        base_amount: 1_000_000,
        currency: "IDR".to_string(),
        price_unit: PriceUnit::PerNight,
        rules: RateRules::default(),
        version: 1,
    }
}

pub(super) fn nightly_policy_with_fees() -> PricingPolicy {
    let mut policy = nightly_policy();
    policy.rules.fees.cleaning_fee = 200_000;
    policy.rules.fees.service_fee_percent = 5;
    policy
}

pub(super) fn monthly_policy() -> PricingPolicy {
    PricingPolicy {
        id: PolicyId("pol-monthly".to_string()),
        name: "Villa monthly lease".to_string(),
        base_amount: 15_000_000,
        currency: "IDR".to_string(),
        price_unit: PriceUnit::PerMonth,
        rules: RateRules::default(),
        version: 1,
    }
}

pub(super) fn yearly_policy() -> PricingPolicy {
    let mut rules = RateRules::default();
    rules.annual_increase_percent = 5;
    PricingPolicy {
        id: PolicyId("pol-yearly".to_string()),
        name: "Villa yearly lease".to_string(),
        base_amount: 10_000_000,
        currency: "IDR".to_string(),
        price_unit: PriceUnit::PerYear,
        rules,
        version: 1,
    }
}

pub(super) fn summer_voucher() -> AdjustmentPolicy {
    AdjustmentPolicy {
        id: PolicyId("adj-summer".to_string()),
        name: "Summer promo".to_string(),
        status: PolicyStatus::Active,
        effective: Some(EffectiveRange {
            from: date(2026, 6, 1),
            to: date(2026, 8, 31),
        }),
        kind: AdjustmentKind::Promotional {
            percent_off: Some(10),
            amount_off: None,
        },
        voucher_code: Some("SUMMER10".to_string()),
    }
}

pub(super) fn seasonal_adjustment(id: &str, high: &[u32], low: &[u32]) -> AdjustmentPolicy {
    AdjustmentPolicy {
        id: PolicyId(id.to_string()),
        name: format!("{id} seasons"),
        status: PolicyStatus::Active,
        effective: None,
        kind: AdjustmentKind::Seasonal {
            high_season_months: high.iter().copied().collect(),
            high_multiplier_percent: 150,
            low_season_months: low.iter().copied().collect(),
            low_multiplier_percent: 80,
            weekend_multiplier_percent: 120,
        },
        voucher_code: None,
    }
}

pub(super) fn reservation(
    id: &str,
    unit_id: &UnitId,
    window: StayWindow,
    quantity: u32,
    status: ReservationStatus,
) -> ReservationInterval {
    ReservationInterval {
        id: ReservationId(format!("rsv-{id}")),
        unit_id: unit_id.clone(),
        window,
        quantity,
        status,
        code: format!("BK-TEST-{id}"),
        contact: None,
        quote_total: None,
        adjustment_policy: None,
    }
}

pub(super) fn reservation_request(unit_id: &UnitId, window: StayWindow) -> ReservationRequest {
    ReservationRequest {
        unit_id: unit_id.clone(),
        window,
        quantity: 1,
        guests: GuestCount::adults(2),
        contact: None,
        voucher_code: None,
        adjustment_policy: None,
    }
}

pub(super) fn build_service() -> (
    BookingService<MemoryUnits, MemoryPolicies, MemoryReservations>,
    Arc<MemoryUnits>,
    Arc<MemoryPolicies>,
    Arc<MemoryReservations>,
) {
    let units = Arc::new(MemoryUnits::default());
    let policies = Arc::new(MemoryPolicies::default());
    let reservations = Arc::new(MemoryReservations::default());
    let service = BookingService::new(units.clone(), policies.clone(), reservations.clone());
    (service, units, policies, reservations)
}

#[derive(Default, Clone)]
pub(super) struct MemoryUnits {
    units: Arc<Mutex<HashMap<UnitId, RentableUnit>>>,
}

impl MemoryUnits {
    pub(super) fn add(&self, unit: RentableUnit) {
        self.units
            .lock()
            .expect("unit mutex poisoned")
            .insert(unit.id.clone(), unit);
    }
}

impl UnitDirectory for MemoryUnits {
    fn find_unit(&self, id: &UnitId) -> Result<Option<RentableUnit>, StoreError> {
        Ok(self
            .units
            .lock()
            .expect("unit mutex poisoned")
            .get(id)
            .cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPolicies {
    pricing: Arc<Mutex<HashMap<PolicyId, PricingPolicy>>>,
    adjustments: Arc<Mutex<HashMap<PolicyId, AdjustmentPolicy>>>,
    assignments: Arc<Mutex<HashMap<PolicyId, Vec<UnitId>>>>,
}

impl MemoryPolicies {
    pub(super) fn add_pricing(&self, policy: PricingPolicy) {
        self.pricing
            .lock()
            .expect("policy mutex poisoned")
            .insert(policy.id.clone(), policy);
    }

    pub(super) fn add_adjustment(&self, policy: AdjustmentPolicy) {
        self.adjustments
            .lock()
            .expect("policy mutex poisoned")
            .insert(policy.id.clone(), policy);
    }

    pub(super) fn assign(&self, policy: &PolicyId, units: &[UnitId]) {
        self.assignments
            .lock()
            .expect("policy mutex poisoned")
            .insert(policy.clone(), units.to_vec());
    }
}

impl PolicyDirectory for MemoryPolicies {
    fn find_active_policy(&self, id: &PolicyId) -> Result<Option<PricingPolicy>, StoreError> {
        Ok(self
            .pricing
            .lock()
            .expect("policy mutex poisoned")
            .get(id)
            .cloned())
    }

    fn find_adjustment(&self, id: &PolicyId) -> Result<Option<AdjustmentPolicy>, StoreError> {
        Ok(self
            .adjustments
            .lock()
            .expect("policy mutex poisoned")
            .get(id)
            .cloned())
    }

    fn find_by_voucher(&self, code: &str) -> Result<Option<AdjustmentPolicy>, StoreError> {
        Ok(self
            .adjustments
            .lock()
            .expect("policy mutex poisoned")
            .values()
            .find(|policy| policy.voucher_code.as_deref() == Some(code))
            .cloned())
    }

    fn siblings_of(&self, id: &PolicyId) -> Result<Vec<AdjustmentPolicy>, StoreError> {
        Ok(self
            .adjustments
            .lock()
            .expect("policy mutex poisoned")
            .values()
            .filter(|policy| &policy.id != id)
            .cloned()
            .collect())
    }

    fn units_assigned(&self, id: &PolicyId) -> Result<Vec<UnitId>, StoreError> {
        Ok(self
            .assignments
            .lock()
            .expect("policy mutex poisoned")
            .get(id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryReservations {
    records: Arc<Mutex<HashMap<ReservationId, ReservationInterval>>>,
}

impl ReservationStore for MemoryReservations {
    fn find_overlapping(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<ReservationInterval>, StoreError> {
        let guard = self.records.lock().expect("reservation mutex poisoned");
        Ok(guard
            .values()
            .filter(|interval| &interval.unit_id == unit_id)
            .filter(|interval| statuses.contains(&interval.status))
            .filter(|interval| interval.window.overlaps(window))
            .cloned()
            .collect())
    }

    fn insert(&self, interval: ReservationInterval) -> Result<ReservationInterval, StoreError> {
        let mut guard = self.records.lock().expect("reservation mutex poisoned");
        if guard.contains_key(&interval.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(interval.id.clone(), interval.clone());
        Ok(interval)
    }

    fn update(&self, interval: ReservationInterval) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("reservation mutex poisoned");
        if !guard.contains_key(&interval.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(interval.id.clone(), interval);
        Ok(())
    }

    fn fetch(&self, id: &ReservationId) -> Result<Option<ReservationInterval>, StoreError> {
        let guard = self.records.lock().expect("reservation mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn in_window(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
    ) -> Result<Vec<ReservationInterval>, StoreError> {
        let guard = self.records.lock().expect("reservation mutex poisoned");
        Ok(guard
            .values()
            .filter(|interval| &interval.unit_id == unit_id)
            .filter(|interval| interval.window.overlaps(window))
            .cloned()
            .collect())
    }
}

/// Fails inserts with a transient conflict `times` times, then behaves like
/// the in-memory store.
pub(super) struct TransientReservations {
    inner: MemoryReservations,
    failures: Mutex<u32>,
}

impl TransientReservations {
    pub(super) fn failing(times: u32) -> Self {
        Self {
            inner: MemoryReservations::default(),
            failures: Mutex::new(times),
        }
    }

    pub(super) fn stored(&self, id: &ReservationId) -> bool {
        self.inner
            .records
            .lock()
            .expect("reservation mutex poisoned")
            .contains_key(id)
    }
}

impl ReservationStore for TransientReservations {
    fn find_overlapping(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<ReservationInterval>, StoreError> {
        self.inner.find_overlapping(unit_id, window, statuses)
    }

    fn insert(&self, interval: ReservationInterval) -> Result<ReservationInterval, StoreError> {
        {
            let mut remaining = self.failures.lock().expect("failure counter poisoned");
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::TransientConflict);
            }
        }
        self.inner.insert(interval)
    }

    fn update(&self, interval: ReservationInterval) -> Result<(), StoreError> {
        self.inner.update(interval)
    }

    fn fetch(&self, id: &ReservationId) -> Result<Option<ReservationInterval>, StoreError> {
        self.inner.fetch(id)
    }

    fn in_window(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
    ) -> Result<Vec<ReservationInterval>, StoreError> {
        self.inner.in_window(unit_id, window)
    }
}

pub(super) struct UnavailableReservations;

impl ReservationStore for UnavailableReservations {
    fn find_overlapping(
        &self,
        _unit_id: &UnitId,
        _window: &StayWindow,
        _statuses: &[ReservationStatus],
    ) -> Result<Vec<ReservationInterval>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _interval: ReservationInterval) -> Result<ReservationInterval, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _interval: ReservationInterval) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ReservationId) -> Result<Option<ReservationInterval>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn in_window(
        &self,
        _unit_id: &UnitId,
        _window: &StayWindow,
    ) -> Result<Vec<ReservationInterval>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn booking_router_with_service(
    service: BookingService<MemoryUnits, MemoryPolicies, MemoryReservations>,
) -> axum::Router {
    booking_router(Arc::new(service))
}

pub(super) fn post_json(uri: &str, body: Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_post(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .body(axum::body::Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
