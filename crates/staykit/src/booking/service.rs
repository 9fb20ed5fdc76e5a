use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::availability::{
    AvailabilityError, AvailabilityOutcome, AvailabilityResolver, ExclusiveSlots, SlotPolicy,
};
use super::domain::{
    AllocationDiscipline, GuestContact, GuestCount, PolicyId, RentableUnit, ReservationId,
    ReservationInterval, ReservationStatus, StayWindow, UnitId, WindowError,
};
use super::pricing::adjustment::{self, AdjustmentContext, AdjustmentKind, PolicyStatus};
use super::pricing::conflicts::{detect_conflicts, PolicyConflict};
use super::pricing::engine::{compute_quote, DurationClass, PricingError};
use super::pricing::policy::{PriceUnit, PricingPolicy};
use super::pricing::quote::PriceQuote;
use super::repository::{PolicyDirectory, ReservationStore, StoreError, UnitDirectory};

/// Bounded retries for transient transaction conflicts inside `reserve`.
const RESERVE_RETRY_LIMIT: u32 = 3;

/// Orchestrator composing the availability resolver, the pricing pipeline,
/// and the reservation store behind per-unit serialization.
pub struct BookingService<U, P, R> {
    units: Arc<U>,
    policies: Arc<P>,
    reservations: Arc<R>,
    resolver: AvailabilityResolver,
    locks: UnitLocks,
}

static RESERVATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_reservation_identity(start: NaiveDate) -> (ReservationId, String) {
    let seq = RESERVATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let id = ReservationId(format!("rsv-{seq:06}"));
    let code = format!("BK-{}-{seq:04}", start.format("%y%m"));
    (id, code)
}

impl<U, P, R> BookingService<U, P, R>
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    pub fn new(units: Arc<U>, policies: Arc<P>, reservations: Arc<R>) -> Self {
        Self::with_slot_policy(units, policies, reservations, Arc::new(ExclusiveSlots))
    }

    pub fn with_slot_policy(
        units: Arc<U>,
        policies: Arc<P>,
        reservations: Arc<R>,
        slot_policy: Arc<dyn SlotPolicy>,
    ) -> Self {
        Self {
            units,
            policies,
            reservations,
            resolver: AvailabilityResolver::new(slot_policy),
            locks: UnitLocks::new(),
        }
    }

    /// Pure availability query: outcome plus alternative windows when the
    /// requested one is taken.
    pub fn check_availability(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
        quantity: u32,
    ) -> Result<AvailabilityReport, BookingError> {
        window.validate()?;
        require_positive_quantity(quantity)?;
        let unit = self.unit(unit_id)?;
        self.availability_report(&unit, window, quantity)
    }

    /// Nightly quote against the unit's pricing policy. A voucher code
    /// resolves to an active promotional adjustment applied on top of the
    /// finished quote.
    pub fn quote(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
        guests: GuestCount,
        voucher_code: Option<&str>,
    ) -> Result<PriceQuote, BookingError> {
        window.validate()?;
        let unit = self.unit(unit_id)?;
        let policy = self.nightly_policy(&unit)?;

        let mut quote = compute_quote(
            &unit,
            &policy,
            DurationClass::Nightly {
                window: *window,
                guests,
            },
        )?;
        if let Some(code) = voucher_code {
            self.apply_voucher(&mut quote, window, code)?;
        }
        Ok(quote)
    }

    /// Medium- or long-term quote for the unit's lease policy.
    pub fn lease_quote(
        &self,
        unit_id: &UnitId,
        term: LeaseTerm,
    ) -> Result<PriceQuote, BookingError> {
        let unit = self.unit(unit_id)?;
        let policy_id = unit
            .pricing_policy
            .clone()
            .ok_or_else(|| BookingError::UnpricedUnit(unit.id.0.clone()))?;
        let policy = self
            .policies
            .find_active_policy(&policy_id)?
            .ok_or_else(|| BookingError::PolicyNotFound(policy_id.0.clone()))?;
        let class = match term {
            LeaseTerm::Months(months) => DurationClass::Monthly { months },
            LeaseTerm::Years(years) => DurationClass::Yearly { years },
        };
        Ok(compute_quote(&unit, &policy, class)?)
    }

    /// Check-then-insert under the unit's lock. The reservation starts
    /// pending unless the unit is flagged for instant booking.
    pub fn reserve(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationInterval, BookingError> {
        request.window.validate()?;
        require_positive_quantity(request.quantity)?;
        let unit = self.unit(&request.unit_id)?;

        let lock = self.locks.lock_for(&unit.id);
        let _guard = lock.lock().expect("unit lock poisoned");

        let report = self.availability_report(&unit, &request.window, request.quantity)?;
        if !report.outcome.available {
            return Err(unavailable_error(&unit, report));
        }

        let quote_total = self.reservation_price(&unit, &request)?;
        let (id, code) = next_reservation_identity(request.window.start);
        let status = if unit.instant_booking {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        };
        let interval = ReservationInterval {
            id,
            unit_id: unit.id.clone(),
            window: request.window,
            quantity: request.quantity,
            status,
            code,
            contact: request.contact,
            quote_total,
            adjustment_policy: request.adjustment_policy,
        };
        self.insert_with_retry(interval)
    }

    pub fn confirm(&self, id: &ReservationId) -> Result<ReservationInterval, BookingError> {
        let mut interval = self.reservation(id)?;
        if interval.status != ReservationStatus::Pending {
            return Err(BookingError::Validation(format!(
                "cannot confirm a {} reservation",
                interval.status.label()
            )));
        }
        interval.status = ReservationStatus::Confirmed;
        self.reservations.update(interval.clone())?;
        Ok(interval)
    }

    pub fn cancel(&self, id: &ReservationId) -> Result<ReservationInterval, BookingError> {
        let mut interval = self.reservation(id)?;
        if !matches!(
            interval.status,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        ) {
            return Err(BookingError::Validation(format!(
                "cannot cancel a {} reservation",
                interval.status.label()
            )));
        }
        interval.status = ReservationStatus::Cancelled;
        self.reservations.update(interval.clone())?;
        Ok(interval)
    }

    /// Transition a confirmed reservation to checked-in. The clock arrives
    /// as an argument; the stay must cover it.
    pub fn check_in(
        &self,
        id: &ReservationId,
        today: NaiveDate,
    ) -> Result<ReservationInterval, BookingError> {
        let mut interval = self.reservation(id)?;
        if interval.status != ReservationStatus::Confirmed {
            return Err(BookingError::Validation(format!(
                "cannot check in a {} reservation",
                interval.status.label()
            )));
        }
        if today < interval.window.start {
            return Err(BookingError::Validation(format!(
                "stay does not start until {}",
                interval.window.start
            )));
        }
        if let Some(end) = interval.window.end {
            if today > end {
                return Err(BookingError::Validation(format!("stay ended {end}")));
            }
        }
        interval.status = ReservationStatus::CheckedIn;
        self.reservations.update(interval.clone())?;
        Ok(interval)
    }

    /// Transition a checked-in reservation to checked-out. Open-ended stays
    /// are closed at today's date so the actual duration is on record.
    pub fn check_out(
        &self,
        id: &ReservationId,
        today: NaiveDate,
    ) -> Result<ReservationInterval, BookingError> {
        let mut interval = self.reservation(id)?;
        if interval.status != ReservationStatus::CheckedIn {
            return Err(BookingError::Validation(format!(
                "cannot check out a {} reservation",
                interval.status.label()
            )));
        }
        if interval.window.end.is_none() {
            interval.window.end = Some(today.max(interval.window.start));
        }
        interval.status = ReservationStatus::CheckedOut;
        self.reservations.update(interval.clone())?;
        Ok(interval)
    }

    /// Walk-in: claim the unit starting today and check in immediately. The
    /// occupancy check counts checked-in guests, not just upcoming
    /// reservations.
    pub fn walk_in(
        &self,
        unit_id: &UnitId,
        today: NaiveDate,
        end: Option<NaiveDate>,
        quantity: u32,
        contact: Option<GuestContact>,
    ) -> Result<ReservationInterval, BookingError> {
        require_positive_quantity(quantity)?;
        let window = match end {
            Some(end) => StayWindow::closed(today, end)?,
            None => StayWindow::open_ended(today),
        };
        let unit = self.unit(unit_id)?;

        let lock = self.locks.lock_for(&unit.id);
        let _guard = lock.lock().expect("unit lock poisoned");

        let overlapping = self.reservations.find_overlapping(
            &unit.id,
            &window,
            &ReservationStatus::occupying(),
        )?;
        let outcome = self.resolver.check(&unit, &window, quantity, overlapping)?;
        if !outcome.available {
            return Err(unavailable_error(
                &unit,
                AvailabilityReport {
                    outcome,
                    suggestions: Vec::new(),
                },
            ));
        }

        let (id, code) = next_reservation_identity(window.start);
        let interval = ReservationInterval {
            id,
            unit_id: unit.id.clone(),
            window,
            quantity,
            status: ReservationStatus::CheckedIn,
            code,
            contact,
            quote_total: None,
            adjustment_policy: None,
        };
        self.insert_with_retry(interval)
    }

    /// Calendar query: every reservation touching the window, any status.
    /// Unlike a stay, a single-day range is fine here.
    pub fn timeline(
        &self,
        unit_id: &UnitId,
        window: &StayWindow,
    ) -> Result<Vec<ReservationInterval>, BookingError> {
        if window.end.map_or(false, |end| end < window.start) {
            return Err(BookingError::Validation(
                "timeline range must not end before it starts".to_string(),
            ));
        }
        let unit = self.unit(unit_id)?;
        Ok(self.reservations.in_window(&unit.id, window)?)
    }

    /// Advisory conflict report for one adjustment policy against its
    /// active and draft siblings.
    pub fn policy_conflicts(
        &self,
        policy_id: &PolicyId,
    ) -> Result<Vec<PolicyConflict>, BookingError> {
        let policy = self
            .policies
            .find_adjustment(policy_id)?
            .ok_or_else(|| BookingError::PolicyNotFound(policy_id.0.clone()))?;
        let policy_units = self.policies.units_assigned(policy_id)?;
        let siblings = self.policies.siblings_of(policy_id)?;
        let mut paired = Vec::with_capacity(siblings.len());
        for sibling in siblings {
            let units = self.policies.units_assigned(&sibling.id)?;
            paired.push((sibling, units));
        }
        Ok(detect_conflicts(&policy, &policy_units, &paired))
    }

    fn unit(&self, id: &UnitId) -> Result<RentableUnit, BookingError> {
        self.units
            .find_unit(id)?
            .ok_or_else(|| BookingError::UnitNotFound(id.0.clone()))
    }

    fn reservation(&self, id: &ReservationId) -> Result<ReservationInterval, BookingError> {
        self.reservations
            .fetch(id)?
            .ok_or_else(|| BookingError::ReservationNotFound(id.0.clone()))
    }

    fn nightly_policy(&self, unit: &RentableUnit) -> Result<PricingPolicy, BookingError> {
        let policy_id = unit
            .pricing_policy
            .clone()
            .ok_or_else(|| BookingError::UnpricedUnit(unit.id.0.clone()))?;
        self.policies
            .find_active_policy(&policy_id)?
            .ok_or_else(|| BookingError::PolicyNotFound(policy_id.0.clone()))
    }

    fn availability_report(
        &self,
        unit: &RentableUnit,
        window: &StayWindow,
        quantity: u32,
    ) -> Result<AvailabilityReport, BookingError> {
        let overlapping = self.reservations.find_overlapping(
            &unit.id,
            window,
            &ReservationStatus::blocking(),
        )?;
        let outcome = self.resolver.check(unit, window, quantity, overlapping)?;
        let suggestions = if outcome.available {
            Vec::new()
        } else {
            self.resolver.suggest_alternatives(
                unit,
                window,
                quantity,
                &outcome.conflicts,
                self.reservations.as_ref(),
            )?
        };
        Ok(AvailabilityReport {
            outcome,
            suggestions,
        })
    }

    /// Quoted total attached to a reservation when the unit carries a
    /// nightly policy and the stay is closed. A dangling policy reference
    /// leaves the reservation unpriced rather than failing it.
    fn reservation_price(
        &self,
        unit: &RentableUnit,
        request: &ReservationRequest,
    ) -> Result<Option<i64>, BookingError> {
        let Some(policy_id) = &unit.pricing_policy else {
            return Ok(None);
        };
        if request.window.end.is_none() {
            return Ok(None);
        }
        let Some(policy) = self.policies.find_active_policy(policy_id)? else {
            return Ok(None);
        };
        if policy.price_unit != PriceUnit::PerNight {
            return Ok(None);
        }
        let mut quote = compute_quote(
            unit,
            &policy,
            DurationClass::Nightly {
                window: request.window,
                guests: request.guests,
            },
        )?;
        if let Some(code) = &request.voucher_code {
            self.apply_voucher(&mut quote, &request.window, code)?;
        }
        Ok(Some(quote.total))
    }

    fn apply_voucher(
        &self,
        quote: &mut PriceQuote,
        window: &StayWindow,
        code: &str,
    ) -> Result<(), BookingError> {
        let policy = self
            .policies
            .find_by_voucher(code)?
            .filter(|policy| policy.status == PolicyStatus::Active)
            .filter(|policy| matches!(policy.kind, AdjustmentKind::Promotional { .. }))
            .filter(|policy| {
                policy
                    .effective
                    .map_or(true, |range| range.contains(window.start))
            })
            .ok_or_else(|| BookingError::UnknownVoucher(code.to_string()))?;

        let ctx = AdjustmentContext {
            start: window.start,
            duration_days: window.duration_days().unwrap_or(0),
        };
        let adjusted = adjustment::apply(quote.total, &policy, &ctx);
        if adjusted.amount < quote.total {
            let reduction = quote.total - adjusted.amount;
            quote.push_discount("voucher", &format!("voucher {code}"), reduction);
            quote.total = adjusted.amount;
        }
        Ok(())
    }

    fn insert_with_retry(
        &self,
        interval: ReservationInterval,
    ) -> Result<ReservationInterval, BookingError> {
        let mut attempts = 0;
        loop {
            match self.reservations.insert(interval.clone()) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::TransientConflict) if attempts < RESERVE_RETRY_LIMIT => {
                    attempts += 1;
                }
                Err(StoreError::TransientConflict) => {
                    return Err(BookingError::Conflict {
                        message: "reservation could not be committed after repeated transaction conflicts".to_string(),
                        conflicts: Vec::new(),
                        suggestions: Vec::new(),
                    });
                }
                Err(other) => return Err(other.into()),
            }
        }
    }
}

/// Per-unit lock registry serializing check-then-insert. Two units never
/// contend; entries are created on first use and kept for the service's
/// lifetime.
struct UnitLocks {
    locks: Mutex<HashMap<UnitId, Arc<Mutex<()>>>>,
}

impl UnitLocks {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, unit: &UnitId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("unit lock registry poisoned");
        locks
            .entry(unit.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Availability outcome plus the alternative windows offered on failure.
#[derive(Debug, Clone)]
pub struct AvailabilityReport {
    pub outcome: AvailabilityOutcome,
    pub suggestions: Vec<StayWindow>,
}

/// Inputs for creating a reservation.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub unit_id: UnitId,
    pub window: StayWindow,
    pub quantity: u32,
    pub guests: GuestCount,
    pub contact: Option<GuestContact>,
    pub voucher_code: Option<String>,
    pub adjustment_policy: Option<PolicyId>,
}

/// Lease length for medium- and long-term quotes.
#[derive(Debug, Clone, Copy)]
pub enum LeaseTerm {
    Months(u32),
    Years(u32),
}

fn require_positive_quantity(quantity: u32) -> Result<(), BookingError> {
    if quantity < 1 {
        return Err(BookingError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn unavailable_error(unit: &RentableUnit, report: AvailabilityReport) -> BookingError {
    let AvailabilityReport {
        outcome,
        suggestions,
    } = report;
    match (unit.discipline, outcome.headroom) {
        (AllocationDiscipline::Capacity, Some(headroom)) => BookingError::CapacityExceeded {
            message: outcome.message,
            headroom,
            conflicts: outcome.conflicts,
            suggestions,
        },
        _ => BookingError::Conflict {
            message: outcome.message,
            conflicts: outcome.conflicts,
            suggestions,
        },
    }
}

/// Error raised by the booking service. `code` is the machine-readable
/// taxonomy collaborators switch on.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("rentable unit {0} not found")]
    UnitNotFound(String),
    #[error("reservation {0} not found")]
    ReservationNotFound(String),
    #[error("pricing policy {0} not found")]
    PolicyNotFound(String),
    #[error("unit {0} has no pricing policy assigned")]
    UnpricedUnit(String),
    #[error("voucher code {0} does not match an active promotion")]
    UnknownVoucher(String),
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Conflict {
        message: String,
        conflicts: Vec<ReservationInterval>,
        suggestions: Vec<StayWindow>,
    },
    #[error("{message}")]
    CapacityExceeded {
        message: String,
        headroom: u32,
        conflicts: Vec<ReservationInterval>,
        suggestions: Vec<StayWindow>,
    },
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnitNotFound(_)
            | Self::ReservationNotFound(_)
            | Self::PolicyNotFound(_)
            | Self::UnpricedUnit(_)
            | Self::UnknownVoucher(_) => "NOT_FOUND",
            Self::Validation(_) | Self::Pricing(_) => "VALIDATION_ERROR",
            Self::Conflict { .. } => "CONFLICT",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::Store(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl From<WindowError> for BookingError {
    fn from(err: WindowError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AvailabilityError> for BookingError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Store(store) => Self::Store(store),
            other => Self::Validation(other.to_string()),
        }
    }
}
