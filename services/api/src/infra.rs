use chrono::{Duration, Local, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use staykit::booking::domain::{
    AllocationDiscipline, PolicyId, RentableUnit, ReservationId, ReservationInterval,
    ReservationStatus, StayWindow, UnitId,
};
use staykit::booking::pricing::adjustment::{
    AdjustmentKind, AdjustmentPolicy, EffectiveRange, PolicyStatus,
};
use staykit::booking::pricing::policy::{
    DayOfWeek, DurationDiscount, PriceUnit, PricingPolicy, RateRules, SeasonalRate,
};
use staykit::booking::repository::{PolicyDirectory, ReservationStore, StoreError, UnitDirectory};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUnitDirectory {
    units: Arc<Mutex<HashMap<UnitId, RentableUnit>>>,
}

impl InMemoryUnitDirectory {
    pub(crate) fn add(&self, unit: RentableUnit) {
        let mut guard = self.units.lock().expect("unit mutex poisoned");
        guard.insert(unit.id.clone(), unit);
    }
}

impl UnitDirectory for InMemoryUnitDirectory {
    fn find_unit(&self, id: &UnitId) -> Result<Option<RentableUnit>, StoreError> {
        let guard = self.units.lock().expect("unit mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPolicyDirectory {
    pricing: Arc<Mutex<HashMap<PolicyId, PricingPolicy>>>,
    adjustments: Arc<Mutex<HashMap<PolicyId, AdjustmentPolicy>>>,
    assignments: Arc<Mutex<HashMap<PolicyId, Vec<UnitId>>>>,
}

impl InMemoryPolicyDirectory {
    pub(crate) fn add_pricing(&self, policy: PricingPolicy) {
        let mut guard = self.pricing.lock().expect("policy mutex poisoned");
        guard.insert(policy.id.clone(), policy);
    }

    pub(crate) fn add_adjustment(&self, policy: AdjustmentPolicy) {
        let mut guard = self.adjustments.lock().expect("policy mutex poisoned");
        guard.insert(policy.id.clone(), policy);
    }
}

impl PolicyDirectory for InMemoryPolicyDirectory {
    fn find_active_policy(&self, id: &PolicyId) -> Result<Option<PricingPolicy>, StoreError> {
        let guard = self.pricing.lock().expect("policy mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_adjustment(&self, id: &PolicyId) -> Result<Option<AdjustmentPolicy>, StoreError> {
        let guard = self.adjustments.lock().expect("policy mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_voucher(&self, code: &str) -> Result<Option<AdjustmentPolicy>, StoreError> {
        let guard = self.adjustments.lock().expect("policy mutex poisoned");
        Ok(guard
            .values()
            .find(|policy| policy.voucher_code.as_deref() == Some(code))
            .cloned())
    }

    fn siblings_of(&self, id: &PolicyId) -> Result<Vec<AdjustmentPolicy>, StoreError> {
        let guard = self.adjustments.lock().expect("policy mutex poisoned");
        Ok(guard
            .values()
            .filter(|policy| &policy.id != id)
            .cloned()
            .collect())
    }

    fn units_assigned(&self, id: &PolicyId) -> Result<Vec<UnitId>, StoreError> {
        let guard = self.assignments.lock().expect("policy mutex poisoned");
        Ok(guard.get(id).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryReservationStore {
    records: Arc<Mutex<HashMap<ReservationId, ReservationInterval>>>,
}

impl ReservationStore for InMemoryReservationStore {
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
        if guard.contains_key(&interval.id) {
            guard.insert(interval.id.clone(), interval);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
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

/// Demo catalog the served instance and the quote subcommand both boot with.
/// Voucher and promo windows are pinned around the current date so the
/// worked examples stay reproducible whenever they run.
pub(crate) fn seed_catalog(units: &InMemoryUnitDirectory, policies: &InMemoryPolicyDirectory) {
    let today = Local::now().date_naive();

    units.add(RentableUnit {
        id: UnitId("villa-seaview".to_string()),
        name: "Seaview Villa".to_string(),
        discipline: AllocationDiscipline::Exclusive,
        capacity: None,
        slot_configuration: None,
        max_occupancy: Some(4),
        instant_booking: false,
        pricing_policy: Some(PolicyId("rate-villa-nightly".to_string())),
    });
    units.add(RentableUnit {
        id: UnitId("dorm-garden".to_string()),
        name: "Garden Dormitory".to_string(),
        discipline: AllocationDiscipline::Capacity,
        capacity: Some(8),
        slot_configuration: None,
        max_occupancy: None,
        instant_booking: true,
        pricing_policy: Some(PolicyId("rate-dorm-nightly".to_string())),
    });
    units.add(RentableUnit {
        id: UnitId("loft-harbor".to_string()),
        name: "Harbor Loft".to_string(),
        discipline: AllocationDiscipline::Exclusive,
        capacity: None,
        slot_configuration: None,
        max_occupancy: Some(2),
        instant_booking: false,
        pricing_policy: Some(PolicyId("rate-loft-monthly".to_string())),
    });

    let mut villa_rules = RateRules::default();
    villa_rules.weekday_rates.insert(DayOfWeek::Friday, 1_350_000);
    villa_rules
        .weekday_rates
        .insert(DayOfWeek::Saturday, 1_350_000);
    villa_rules.seasonal_rates.push(SeasonalRate {
        name: "dry season".to_string(),
        from_month: 6,
        from_day: 1,
        to_month: 9,
        to_day: 30,
        multiplier_percent: 130,
    });
    villa_rules.duration_discounts.push(DurationDiscount {
        min_days: 7,
        percent: 10,
    });
    villa_rules.fees.cleaning_fee = 150_000;
    villa_rules.fees.service_fee_percent = 5;
    villa_rules.fees.extra_guest_fee = 100_000;
    policies.add_pricing(PricingPolicy {
        id: PolicyId("rate-villa-nightly".to_string()),
        name: "Villa nightly rate".to_string(),
        base_amount: 1_100_000,
        currency: "IDR".to_string(),
        price_unit: PriceUnit::PerNight,
        rules: villa_rules,
        version: 1,
    });

    let mut dorm_rules = RateRules::default();
    dorm_rules.fees.internet_fee = 50_000;
    policies.add_pricing(PricingPolicy {
        id: PolicyId("rate-dorm-nightly".to_string()),
        name: "Dormitory bed rate".to_string(),
        base_amount: 250_000,
        currency: "IDR".to_string(),
        price_unit: PriceUnit::PerNight,
        rules: dorm_rules,
        version: 1,
    });

    let mut loft_rules = RateRules::default();
    loft_rules.annual_increase_percent = 5;
    policies.add_pricing(PricingPolicy {
        id: PolicyId("rate-loft-monthly".to_string()),
        name: "Harbor Loft monthly lease".to_string(),
        base_amount: 18_000_000,
        currency: "IDR".to_string(),
        price_unit: PriceUnit::PerMonth,
        rules: loft_rules,
        version: 1,
    });

    policies.add_adjustment(AdjustmentPolicy {
        id: PolicyId("promo-welcome".to_string()),
        name: "Welcome promotion".to_string(),
        status: PolicyStatus::Active,
        effective: Some(EffectiveRange {
            from: today - Duration::days(30),
            to: today + Duration::days(365),
        }),
        kind: AdjustmentKind::Promotional {
            percent_off: Some(10),
            amount_off: None,
        },
        voucher_code: Some("WELCOME10".to_string()),
    });
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
