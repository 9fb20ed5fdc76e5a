use chrono::{Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for rentable units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub String);

/// Identifier wrapper for reservation intervals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub String);

/// Identifier wrapper for pricing and adjustment policies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub String);

/// Conflict rule governing how many simultaneous reservations a unit
/// tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationDiscipline {
    /// One non-cancelled claim at a time.
    Exclusive,
    /// Overlapping claims allowed while quantities stay within `capacity`.
    Capacity,
    /// Claims must fit an open slot defined by the unit's slot configuration.
    Slotted,
}

impl AllocationDiscipline {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exclusive => "exclusive",
            Self::Capacity => "capacity",
            Self::Slotted => "slotted",
        }
    }
}

/// A leasable/bookable entity. Owned by the catalog subsystem; the booking
/// core treats it as read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentableUnit {
    pub id: UnitId,
    pub name: String,
    pub discipline: AllocationDiscipline,
    /// Required when `discipline` is [`AllocationDiscipline::Capacity`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// Opaque slot layout consumed by the injected slot policy. Required when
    /// `discipline` is [`AllocationDiscipline::Slotted`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_configuration: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occupancy: Option<u32>,
    /// Reservations on instant-booking units are confirmed on creation
    /// instead of awaiting manual confirmation.
    #[serde(default)]
    pub instant_booking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_policy: Option<PolicyId>,
}

/// A span of calendar days. `end = None` is open-ended and extends to
/// positive infinity for overlap purposes.
///
/// Windows are closed on both ends: two windows overlap when
/// `a.start <= b.end && a.end >= b.start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayWindow {
    pub start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl StayWindow {
    /// Build a closed window, rejecting inverted or empty spans.
    pub fn closed(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self {
            start,
            end: Some(end),
        })
    }

    pub fn open_ended(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        match self.end {
            Some(end) if self.start >= end => Err(WindowError::Inverted {
                start: self.start,
                end,
            }),
            _ => Ok(()),
        }
    }

    /// Closed-interval overlap; open ends count as positive infinity.
    pub fn overlaps(&self, other: &StayWindow) -> bool {
        let starts_in_time = match other.end {
            Some(end) => self.start <= end,
            None => true,
        };
        let ends_in_time = match self.end {
            Some(end) => end >= other.start,
            None => true,
        };
        starts_in_time && ends_in_time
    }

    /// Whole days between start and end, when the window is closed.
    pub fn duration_days(&self) -> Option<i64> {
        self.end.map(|end| (end - self.start).num_days())
    }

    /// Same duration, new start date. Used by alternative-date probing.
    pub fn shifted_to(&self, new_start: NaiveDate) -> Self {
        let end = self.end.map(|end| new_start + (end - self.start));
        Self {
            start: new_start,
            end,
        }
    }

    /// Whether any night of the stay (start inclusive, end exclusive) falls
    /// on a Saturday or Sunday. Open-ended windows only look at the start.
    pub fn touches_weekend(&self) -> bool {
        let Some(nights) = self.duration_days() else {
            return is_weekend(self.start);
        };
        (0..nights).any(|offset| is_weekend(self.start + Duration::days(offset)))
    }
}

impl fmt::Display for StayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{} to {}", self.start, end),
            None => write!(f, "{} onwards", self.start),
        }
    }
}

pub(crate) fn is_weekend(date: NaiveDate) -> bool {
    use chrono::Datelike;
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Raised when a requested window fails basic shape checks.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("stay must start before it ends ({start} is not before {end})")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Lifecycle state of a reservation. Reservations are never physically
/// deleted; they only transition between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    CheckedIn,
    CheckedOut,
}

impl ReservationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::CheckedIn => "checked_in",
            Self::CheckedOut => "checked_out",
        }
    }

    /// Statuses that block a new overlapping reservation.
    pub const fn blocking() -> [Self; 2] {
        [Self::Pending, Self::Confirmed]
    }

    /// Statuses that occupy the unit right now. Walk-in checks use this set
    /// so a checked-in guest keeps blocking the door.
    pub const fn occupying() -> [Self; 3] {
        [Self::Pending, Self::Confirmed, Self::CheckedIn]
    }
}

/// Head-count for a stay. Infants never count toward extra-guest fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCount {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl GuestCount {
    pub fn adults(count: u32) -> Self {
        Self {
            adults: count,
            ..Self::default()
        }
    }

    /// Guests counted against the unit's baseline occupancy.
    pub fn fee_relevant(&self) -> u32 {
        self.adults + self.children
    }
}

/// Contact details persisted with a reservation. Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A committed or pending claim on a unit for a window of time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationInterval {
    pub id: ReservationId,
    pub unit_id: UnitId,
    pub window: StayWindow,
    pub quantity: u32,
    pub status: ReservationStatus,
    /// Derived human-readable booking code, e.g. `BK-2603-0042`.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<GuestContact>,
    /// Quoted total in minor units, attached when the unit carries a
    /// nightly pricing policy at reservation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_policy: Option<PolicyId>,
}
