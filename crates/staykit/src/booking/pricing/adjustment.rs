//! Booking-time price adjustments. This is the second pricing path: where
//! the quote pipeline computes from a unit's fixed rate card, an adjustment
//! policy reshapes an already-computed price. The two paths have different
//! rule precedence and are selected by caller context, never merged.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::money;
use super::policy::{best_tier, DayOfWeek, DurationDiscount};
use crate::booking::domain::{is_weekend, PolicyId};

/// Lifecycle state of an adjustment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Active,
    Draft,
    Archived,
}

impl PolicyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Archived => "archived",
        }
    }
}

/// Closed calendar range an adjustment policy applies within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl EffectiveRange {
    /// Closed-interval intersection: `from1 <= to2 && to1 >= from2`.
    pub fn intersects(&self, other: &EffectiveRange) -> bool {
        self.from <= other.to && self.to >= other.from
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// A configurable price-adjustment policy referenced by bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentPolicy {
    pub id: PolicyId,
    pub name: String,
    pub status: PolicyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective: Option<EffectiveRange>,
    pub kind: AdjustmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
}

/// Dispatchable adjustment rule sets. Multipliers are percent-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdjustmentKind {
    Seasonal {
        high_season_months: BTreeSet<u32>,
        high_multiplier_percent: u32,
        low_season_months: BTreeSet<u32>,
        low_multiplier_percent: u32,
        weekend_multiplier_percent: u32,
    },
    Promotional {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent_off: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount_off: Option<i64>,
    },
    Custom {
        #[serde(default)]
        duration_tiers: Vec<DurationDiscount>,
        #[serde(default)]
        weekday_multipliers: BTreeMap<DayOfWeek, u32>,
    },
}

impl AdjustmentKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Seasonal { .. } => "seasonal",
            Self::Promotional { .. } => "promotional",
            Self::Custom { .. } => "custom",
        }
    }

    /// Every month a seasonal policy touches; empty for other kinds.
    pub(crate) fn season_months(&self) -> BTreeSet<u32> {
        match self {
            Self::Seasonal {
                high_season_months,
                low_season_months,
                ..
            } => high_season_months
                .union(low_season_months)
                .copied()
                .collect(),
            _ => BTreeSet::new(),
        }
    }
}

/// Booking facts the dispatch reads.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentContext {
    pub start: NaiveDate,
    pub duration_days: i64,
}

/// One adjustment application, with the rule(s) that fired for audit trails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedPrice {
    pub amount: i64,
    pub applied_rule: Option<String>,
}

impl AdjustedPrice {
    fn unchanged(amount: i64) -> Self {
        Self {
            amount,
            applied_rule: None,
        }
    }

    fn adjusted(amount: i64, rule: &str) -> Self {
        Self {
            amount,
            applied_rule: Some(rule.to_string()),
        }
    }
}

/// Apply one adjustment policy to an already-computed price. Seasonal rules
/// are evaluated high, then low, then weekend, first match winning.
/// Promotional reductions floor at zero, percent taking precedence over a
/// fixed amount. Custom applies the weekday multiplier first, then the
/// highest qualifying duration tier.
pub fn apply(base_price: i64, policy: &AdjustmentPolicy, ctx: &AdjustmentContext) -> AdjustedPrice {
    match &policy.kind {
        AdjustmentKind::Seasonal {
            high_season_months,
            high_multiplier_percent,
            low_season_months,
            low_multiplier_percent,
            weekend_multiplier_percent,
        } => {
            let month = ctx.start.month();
            if high_season_months.contains(&month) {
                AdjustedPrice::adjusted(
                    money::percent_of(base_price, *high_multiplier_percent),
                    "high_season",
                )
            } else if low_season_months.contains(&month) {
                AdjustedPrice::adjusted(
                    money::percent_of(base_price, *low_multiplier_percent),
                    "low_season",
                )
            } else if is_weekend(ctx.start) {
                AdjustedPrice::adjusted(
                    money::percent_of(base_price, *weekend_multiplier_percent),
                    "weekend",
                )
            } else {
                AdjustedPrice::unchanged(base_price)
            }
        }
        AdjustmentKind::Promotional {
            percent_off,
            amount_off,
        } => {
            if let Some(percent) = percent_off {
                let reduced = base_price - money::percent_of(base_price, *percent);
                AdjustedPrice::adjusted(reduced.max(0), "percent_off")
            } else if let Some(amount) = amount_off {
                AdjustedPrice::adjusted((base_price - amount).max(0), "amount_off")
            } else {
                AdjustedPrice::unchanged(base_price)
            }
        }
        AdjustmentKind::Custom {
            duration_tiers,
            weekday_multipliers,
        } => {
            let mut amount = base_price;
            let mut fired = Vec::new();
            if let Some(multiplier) = weekday_multipliers.get(&DayOfWeek::from_date(ctx.start)) {
                amount = money::percent_of(amount, *multiplier);
                fired.push("weekday_multiplier");
            }
            if let Some(tier) = best_tier(duration_tiers, ctx.duration_days) {
                amount -= money::percent_of(amount, tier.percent);
                fired.push("duration_tier");
            }
            if fired.is_empty() {
                AdjustedPrice::unchanged(base_price)
            } else {
                AdjustedPrice {
                    amount,
                    applied_rule: Some(fired.join("+")),
                }
            }
        }
    }
}
