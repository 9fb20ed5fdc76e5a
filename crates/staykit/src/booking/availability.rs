use std::sync::Arc;

use chrono::Duration;

use super::domain::{
    AllocationDiscipline, RentableUnit, ReservationInterval, ReservationStatus, StayWindow,
    UnitId,
};
use super::repository::{ReservationStore, StoreError};

/// Upper bound on candidate start dates probed while hunting alternatives.
pub const MAX_SUGGESTION_PROBES: u32 = 365;

/// Alternative windows returned per failed availability check.
pub const SUGGESTION_TARGET: usize = 3;

/// Admission rule for slotted units. The resolver hands over the unit's
/// opaque slot configuration together with the overlap set and lets the
/// policy decide.
pub trait SlotPolicy: Send + Sync {
    fn admits(
        &self,
        configuration: Option<&serde_json::Value>,
        window: &StayWindow,
        overlapping: &[ReservationInterval],
    ) -> bool;
}

/// Default slot policy: a slotted unit admits a claim only while no other
/// claim overlaps, regardless of configuration.
#[derive(Debug, Default)]
pub struct ExclusiveSlots;

impl SlotPolicy for ExclusiveSlots {
    fn admits(
        &self,
        _configuration: Option<&serde_json::Value>,
        _window: &StayWindow,
        overlapping: &[ReservationInterval],
    ) -> bool {
        overlapping.is_empty()
    }
}

/// Result of a single availability check.
#[derive(Debug, Clone)]
pub struct AvailabilityOutcome {
    pub available: bool,
    pub message: String,
    pub conflicts: Vec<ReservationInterval>,
    /// Remaining capacity for capacity-disciplined units: after the claim on
    /// success, before it on failure.
    pub headroom: Option<u32>,
}

/// Error enumeration for availability checks.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("unit {0} declares capacity discipline without a capacity")]
    MissingCapacity(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Answers "can this window be claimed" for every allocation discipline.
/// Pure with respect to storage: the caller supplies the overlap set.
pub struct AvailabilityResolver {
    slot_policy: Arc<dyn SlotPolicy>,
}

impl Default for AvailabilityResolver {
    fn default() -> Self {
        Self::new(Arc::new(ExclusiveSlots))
    }
}

impl AvailabilityResolver {
    pub fn new(slot_policy: Arc<dyn SlotPolicy>) -> Self {
        Self { slot_policy }
    }

    /// Dispatch on the unit's discipline. `overlapping` must already be
    /// filtered to blocking statuses; an empty set is always available.
    pub fn check(
        &self,
        unit: &RentableUnit,
        window: &StayWindow,
        quantity: u32,
        overlapping: Vec<ReservationInterval>,
    ) -> Result<AvailabilityOutcome, AvailabilityError> {
        match unit.discipline {
            AllocationDiscipline::Exclusive => Ok(Self::check_exclusive(window, overlapping)),
            AllocationDiscipline::Capacity => {
                let capacity = unit
                    .capacity
                    .ok_or_else(|| AvailabilityError::MissingCapacity(unit.id.0.clone()))?;
                Ok(Self::check_capacity(window, quantity, capacity, overlapping))
            }
            AllocationDiscipline::Slotted => {
                let admitted = self.slot_policy.admits(
                    unit.slot_configuration.as_ref(),
                    window,
                    &overlapping,
                );
                Ok(if admitted {
                    AvailabilityOutcome {
                        available: true,
                        message: format!("slot available {window}"),
                        conflicts: Vec::new(),
                        headroom: None,
                    }
                } else {
                    AvailabilityOutcome {
                        available: false,
                        message: format!("no slot admits the stay {window}"),
                        conflicts: overlapping,
                        headroom: None,
                    }
                })
            }
        }
    }

    fn check_exclusive(
        window: &StayWindow,
        overlapping: Vec<ReservationInterval>,
    ) -> AvailabilityOutcome {
        if overlapping.is_empty() {
            AvailabilityOutcome {
                available: true,
                message: format!("available {window}"),
                conflicts: Vec::new(),
                headroom: None,
            }
        } else {
            AvailabilityOutcome {
                available: false,
                message: format!(
                    "{} existing reservation(s) overlap the stay {window}",
                    overlapping.len()
                ),
                conflicts: overlapping,
                headroom: None,
            }
        }
    }

    fn check_capacity(
        window: &StayWindow,
        quantity: u32,
        capacity: u32,
        overlapping: Vec<ReservationInterval>,
    ) -> AvailabilityOutcome {
        // Sums run in u64 so a pathological pile of claims cannot wrap.
        let committed: u64 = overlapping
            .iter()
            .map(|interval| u64::from(interval.quantity))
            .sum();
        let remaining = u64::from(capacity).saturating_sub(committed);
        if u64::from(quantity) <= remaining {
            AvailabilityOutcome {
                available: true,
                message: format!("capacity available {window}"),
                conflicts: Vec::new(),
                headroom: Some((remaining - u64::from(quantity)) as u32),
            }
        } else {
            AvailabilityOutcome {
                available: false,
                message: format!(
                    "capacity exceeded for the stay {window}: {remaining} of {capacity} remaining"
                ),
                conflicts: overlapping,
                headroom: Some(remaining as u32),
            }
        }
    }

    /// Probe alternative start dates after the latest conflicting end,
    /// keeping the stay duration, until [`SUGGESTION_TARGET`] windows are
    /// found or [`MAX_SUGGESTION_PROBES`] candidates have been tried. An
    /// open-ended conflict never clears, so it yields no suggestions.
    pub fn suggest_alternatives(
        &self,
        unit: &RentableUnit,
        window: &StayWindow,
        quantity: u32,
        conflicts: &[ReservationInterval],
        store: &dyn ReservationStore,
    ) -> Result<Vec<StayWindow>, AvailabilityError> {
        let mut latest_end = None;
        for conflict in conflicts {
            match conflict.window.end {
                None => return Ok(Vec::new()),
                Some(end) => {
                    latest_end = Some(latest_end.map_or(end, |current: chrono::NaiveDate| {
                        current.max(end)
                    }));
                }
            }
        }
        let Some(latest_end) = latest_end else {
            return Ok(Vec::new());
        };

        let mut suggestions = Vec::new();
        let mut candidate = latest_end + Duration::days(1);
        for _ in 0..MAX_SUGGESTION_PROBES {
            let shifted = window.shifted_to(candidate);
            let overlapping = self.blocking_overlaps(store, &unit.id, &shifted)?;
            let outcome = self.check(unit, &shifted, quantity, overlapping)?;
            if outcome.available {
                suggestions.push(shifted);
                if suggestions.len() == SUGGESTION_TARGET {
                    break;
                }
            }
            candidate += Duration::days(1);
        }
        Ok(suggestions)
    }

    fn blocking_overlaps(
        &self,
        store: &dyn ReservationStore,
        unit_id: &UnitId,
        window: &StayWindow,
    ) -> Result<Vec<ReservationInterval>, AvailabilityError> {
        Ok(store.find_overlapping(unit_id, window, &ReservationStatus::blocking())?)
    }
}
