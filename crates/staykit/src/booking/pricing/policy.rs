use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::money;
use crate::booking::domain::PolicyId;

/// Billing cadence of a pricing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    PerNight,
    PerMonth,
    PerYear,
}

impl PriceUnit {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PerNight => "per_night",
            Self::PerMonth => "per_month",
            Self::PerYear => "per_year",
        }
    }
}

/// Day-of-week key for weekday rate overrides and multipliers. Unit variants
/// serialize as strings, so the type works as a JSON map key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// Rate card snapshot consumed by the quote pipeline. Policies are versioned
/// upstream; the engine treats a policy as read-only for the lifetime of a
/// quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub id: PolicyId,
    pub name: String,
    /// Amount per price unit in minor currency units.
    pub base_amount: i64,
    pub currency: String,
    pub price_unit: PriceUnit,
    #[serde(default)]
    pub rules: RateRules,
    pub version: u32,
}

/// Rule set hanging off a pricing policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateRules {
    /// Flat per-night override keyed by weekday; beats `base_amount`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub weekday_rates: BTreeMap<DayOfWeek, i64>,
    /// Ordered; the first matching season wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seasonal_rates: Vec<SeasonalRate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duration_discounts: Vec<DurationDiscount>,
    #[serde(default)]
    pub fees: FeeSchedule,
    /// Long-term compounding, integer percent per elapsed year.
    #[serde(default)]
    pub annual_increase_percent: u32,
}

impl RateRules {
    /// Per-night rate for one calendar date: weekday override if present,
    /// otherwise the base amount, then the first matching seasonal
    /// multiplier.
    pub fn rate_for(&self, date: NaiveDate, base_amount: i64) -> i64 {
        let day = DayOfWeek::from_date(date);
        let rate = self.weekday_rates.get(&day).copied().unwrap_or(base_amount);
        match self.seasonal_rates.iter().find(|season| season.matches(date)) {
            Some(season) => money::percent_of(rate, season.multiplier_percent),
            None => rate,
        }
    }

    /// Highest qualifying discount tier for a stay of `days`, if any.
    pub fn best_duration_discount(&self, days: i64) -> Option<&DurationDiscount> {
        best_tier(&self.duration_discounts, days)
    }
}

/// Highest tier whose `min_days` the stay reaches.
pub(crate) fn best_tier(tiers: &[DurationDiscount], days: i64) -> Option<&DurationDiscount> {
    tiers
        .iter()
        .filter(|tier| i64::from(tier.min_days) <= days)
        .max_by_key(|tier| tier.min_days)
}

/// A recurring month/day range with a percent-encoded multiplier. The range
/// wraps the year boundary when `from_month > to_month` (e.g. December
/// through February).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalRate {
    pub name: String,
    pub from_month: u32,
    pub from_day: u32,
    pub to_month: u32,
    pub to_day: u32,
    /// 150 means 1.5x.
    pub multiplier_percent: u32,
}

impl SeasonalRate {
    pub fn matches(&self, date: NaiveDate) -> bool {
        let month = date.month();
        let day = date.day();
        let after_start =
            month > self.from_month || (month == self.from_month && day >= self.from_day);
        let before_end = month < self.to_month || (month == self.to_month && day <= self.to_day);
        if self.from_month > self.to_month {
            after_start || before_end
        } else {
            after_start && before_end
        }
    }
}

/// Percentage off the stay subtotal once the stay reaches `min_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationDiscount {
    pub min_days: u32,
    pub percent: u32,
}

/// Flat and percentage fees layered onto a quote. Zeroed fields are simply
/// skipped by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    #[serde(default)]
    pub cleaning_fee: i64,
    #[serde(default)]
    pub service_fee_percent: u32,
    /// Months of rent held as deposit on lease quotes. Defaults per duration
    /// class: one month for monthly stays, three for yearly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_months: Option<u32>,
    /// Per extra guest per night, beyond the unit's baseline occupancy.
    #[serde(default)]
    pub extra_guest_fee: i64,
    #[serde(default)]
    pub internet_fee: i64,
    /// Flat, applied once when any night falls on a weekend.
    #[serde(default)]
    pub weekend_surcharge: i64,
    /// Reported alongside nightly quotes, never added into the total.
    #[serde(default)]
    pub booking_hold_deposit: i64,
}
