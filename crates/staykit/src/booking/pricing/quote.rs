use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stay length in the unit the quote was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteDuration {
    Nights(u32),
    Months(u32),
    Years(u32),
}

impl QuoteDuration {
    pub const fn count(self) -> u32 {
        match self {
            Self::Nights(n) | Self::Months(n) | Self::Years(n) => n,
        }
    }
}

/// One line of the itemized breakdown, in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub label: String,
    pub amount: i64,
}

/// The computed, itemized price for one (unit, policy, stay) combination.
/// Transient; callers persist whatever subset they need.
///
/// `subtotal` is the pre-discount base, `base_price` the post-discount base,
/// `total` the base plus every fee. Discount map values are negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub currency: String,
    pub duration: QuoteDuration,
    pub subtotal: i64,
    pub base_price: i64,
    pub fees: BTreeMap<String, i64>,
    pub discounts: BTreeMap<String, i64>,
    pub total: i64,
    /// Held amount reported next to the quote, never part of `total`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<i64>,
    /// Lease move-in amount: `total + deposit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment: Option<i64>,
    /// Per-year amounts for long-term quotes, exposed for amortization
    /// display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly_prices: Option<Vec<i64>>,
    pub breakdown: Vec<QuoteLine>,
}

impl PriceQuote {
    pub(crate) fn new(currency: &str, duration: QuoteDuration) -> Self {
        Self {
            currency: currency.to_string(),
            duration,
            subtotal: 0,
            base_price: 0,
            fees: BTreeMap::new(),
            discounts: BTreeMap::new(),
            total: 0,
            deposit: None,
            first_payment: None,
            yearly_prices: None,
            breakdown: Vec::new(),
        }
    }

    /// Record a fee under its machine key and display label, folding it into
    /// the running total. Zero amounts are dropped.
    pub(crate) fn push_fee(&mut self, key: &str, label: &str, amount: i64) {
        if amount == 0 {
            return;
        }
        self.fees.insert(key.to_string(), amount);
        self.total += amount;
        self.push_line(label, amount);
    }

    /// Record a reduction (given as a positive amount) under its machine key
    /// and display label. The caller folds the reduction into
    /// `base_price`/`total` itself.
    pub(crate) fn push_discount(&mut self, key: &str, label: &str, reduction: i64) {
        if reduction == 0 {
            return;
        }
        self.discounts.insert(key.to_string(), -reduction);
        self.push_line(label, -reduction);
    }

    pub(crate) fn push_line(&mut self, label: &str, amount: i64) {
        self.breakdown.push(QuoteLine {
            label: label.to_string(),
            amount,
        });
    }

    pub fn fee_total(&self) -> i64 {
        self.fees.values().sum()
    }
}
