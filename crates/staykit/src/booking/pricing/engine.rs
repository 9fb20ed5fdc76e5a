use chrono::Duration;

use super::money;
use super::policy::{PriceUnit, PricingPolicy};
use super::quote::{PriceQuote, QuoteDuration};
use crate::booking::domain::{GuestCount, RentableUnit, StayWindow};

/// Baseline occupancy when the unit declares none, or half of the declared
/// maximum rounds down to zero.
const DEFAULT_BASELINE_OCCUPANCY: u32 = 2;

/// Duration-class strategy: selects the rate rule and the discount-duration
/// conversion of the one pricing pipeline.
#[derive(Debug, Clone, Copy)]
pub enum DurationClass {
    /// Calendar-iterated nightly rates with the full fee schedule.
    Nightly {
        window: StayWindow,
        guests: GuestCount,
    },
    /// Flat monthly rent; discount tiers qualify on day-equivalents.
    Monthly { months: u32 },
    /// Monthly rent compounding once per elapsed year; no duration discount.
    Yearly { years: u32 },
}

impl DurationClass {
    const fn price_unit(&self) -> PriceUnit {
        match self {
            Self::Nightly { .. } => PriceUnit::PerNight,
            Self::Monthly { .. } => PriceUnit::PerMonth,
            Self::Yearly { .. } => PriceUnit::PerYear,
        }
    }
}

/// Error enumeration for quote computation.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("stay must cover at least one {0}")]
    EmptyDuration(&'static str),
    #[error("nightly quotes need a closed stay window")]
    OpenEndedStay,
    #[error("policy bills {policy} but the quote asked for {requested}")]
    PriceUnitMismatch {
        policy: &'static str,
        requested: &'static str,
    },
}

/// Compute a quote for one (unit, policy, stay) combination. Pure: the same
/// inputs always produce the same quote, with no ambient clock involved.
pub fn compute_quote(
    unit: &RentableUnit,
    policy: &PricingPolicy,
    class: DurationClass,
) -> Result<PriceQuote, PricingError> {
    if policy.price_unit != class.price_unit() {
        return Err(PricingError::PriceUnitMismatch {
            policy: policy.price_unit.label(),
            requested: class.price_unit().label(),
        });
    }
    match class {
        DurationClass::Nightly { window, guests } => nightly_quote(unit, policy, &window, guests),
        DurationClass::Monthly { months } => monthly_quote(policy, months),
        DurationClass::Yearly { years } => yearly_quote(policy, years),
    }
}

fn nightly_quote(
    unit: &RentableUnit,
    policy: &PricingPolicy,
    window: &StayWindow,
    guests: GuestCount,
) -> Result<PriceQuote, PricingError> {
    let nights = window.duration_days().ok_or(PricingError::OpenEndedStay)?;
    if nights < 1 {
        return Err(PricingError::EmptyDuration("night"));
    }

    let mut quote = PriceQuote::new(&policy.currency, QuoteDuration::Nights(nights as u32));

    let mut subtotal = 0i64;
    for offset in 0..nights {
        let date = window.start + Duration::days(offset);
        subtotal += policy.rules.rate_for(date, policy.base_amount);
    }
    quote.subtotal = subtotal;
    quote.push_line(&stay_label(nights as u32, "night"), subtotal);

    let mut base_price = subtotal;
    if let Some(tier) = policy.rules.best_duration_discount(nights) {
        let reduction = money::percent_of(subtotal, tier.percent);
        base_price -= reduction;
        quote.push_discount(
            "duration_discount",
            &format!("duration discount ({}%)", tier.percent),
            reduction,
        );
    }
    quote.base_price = base_price;
    quote.total = base_price;

    let fees = &policy.rules.fees;
    quote.push_fee("cleaning_fee", "cleaning fee", fees.cleaning_fee);

    let extra_guests = guests.fee_relevant().saturating_sub(baseline_occupancy(unit));
    quote.push_fee(
        "extra_guest_fee",
        "extra guest fee",
        fees.extra_guest_fee * nights * i64::from(extra_guests),
    );

    // Percent of the post-discount base, round-half-up.
    quote.push_fee(
        "service_fee",
        "service fee",
        money::percent_of(base_price, fees.service_fee_percent),
    );

    quote.push_fee("internet_fee", "internet fee", fees.internet_fee);

    if window.touches_weekend() {
        quote.push_fee(
            "weekend_surcharge",
            "weekend surcharge",
            fees.weekend_surcharge,
        );
    }

    if fees.booking_hold_deposit > 0 {
        quote.deposit = Some(fees.booking_hold_deposit);
    }

    Ok(quote)
}

fn monthly_quote(policy: &PricingPolicy, months: u32) -> Result<PriceQuote, PricingError> {
    if months < 1 {
        return Err(PricingError::EmptyDuration("month"));
    }

    let mut quote = PriceQuote::new(&policy.currency, QuoteDuration::Months(months));
    let subtotal = policy.base_amount * i64::from(months);
    quote.subtotal = subtotal;
    quote.push_line(&stay_label(months, "month"), subtotal);

    let mut base_price = subtotal;
    // Tiers qualify on day-equivalents, thirty per month.
    if let Some(tier) = policy.rules.best_duration_discount(i64::from(months) * 30) {
        let reduction = money::percent_of(subtotal, tier.percent);
        base_price -= reduction;
        quote.push_discount(
            "duration_discount",
            &format!("duration discount ({}%)", tier.percent),
            reduction,
        );
    }
    quote.base_price = base_price;
    quote.total = base_price;

    attach_lease_deposit(&mut quote, policy, 1);
    Ok(quote)
}

fn yearly_quote(policy: &PricingPolicy, years: u32) -> Result<PriceQuote, PricingError> {
    if years < 1 {
        return Err(PricingError::EmptyDuration("year"));
    }

    let mut quote = PriceQuote::new(&policy.currency, QuoteDuration::Years(years));

    let mut monthly = policy.base_amount;
    let mut yearly_prices = Vec::with_capacity(years as usize);
    let mut subtotal = 0i64;
    for year in 0..years {
        if year > 0 {
            monthly = money::percent_of(monthly, 100 + policy.rules.annual_increase_percent);
        }
        let yearly = monthly * 12;
        subtotal += yearly;
        yearly_prices.push(yearly);
        quote.push_line(&format!("year {}", year + 1), yearly);
    }
    quote.subtotal = subtotal;
    quote.base_price = subtotal;
    quote.total = subtotal;
    quote.yearly_prices = Some(yearly_prices);

    attach_lease_deposit(&mut quote, policy, 3);
    Ok(quote)
}

/// Deposit is months of rent held up front; `first_payment` is the move-in
/// amount.
fn attach_lease_deposit(quote: &mut PriceQuote, policy: &PricingPolicy, default_months: u32) {
    let months = policy.rules.fees.deposit_months.unwrap_or(default_months);
    let deposit = policy.base_amount * i64::from(months);
    quote.deposit = Some(deposit);
    quote.first_payment = Some(quote.total + deposit);
}

fn baseline_occupancy(unit: &RentableUnit) -> u32 {
    match unit.max_occupancy.map(|max| max / 2) {
        Some(half) if half > 0 => half,
        _ => DEFAULT_BASELINE_OCCUPANCY,
    }
}

fn stay_label(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
