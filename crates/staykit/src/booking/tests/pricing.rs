use super::common::*;

use crate::booking::domain::{GuestCount, StayWindow};
use crate::booking::pricing::engine::{compute_quote, DurationClass, PricingError};
use crate::booking::pricing::policy::{DayOfWeek, DurationDiscount, SeasonalRate};

#[test]
fn plain_nightly_stay_multiplies_the_base_rate() {
    let window = stay(date(2026, 3, 2), date(2026, 3, 7));
    let quote = compute_quote(
        &villa(),
        &nightly_policy(),
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");

    assert_eq!(quote.duration.count(), 5);
    assert_eq!(quote.subtotal, 5_000_000);
    assert_eq!(quote.base_price, 5_000_000);
    assert_eq!(quote.total, 5_000_000);
    assert!(quote.fees.is_empty());
    assert!(quote.discounts.is_empty());
    assert_eq!(quote.breakdown.len(), 1);
    assert_eq!(quote.breakdown[0].label, "5 nights");
}

#[test]
fn cleaning_and_service_fees_stack_onto_the_base() {
    let window = stay(date(2026, 3, 2), date(2026, 3, 7));
    let quote = compute_quote(
        &villa(),
        &nightly_policy_with_fees(),
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");

    assert_eq!(quote.subtotal, 5_000_000);
    assert_eq!(quote.fees.get("cleaning_fee"), Some(&200_000));
    // Five percent of the base, round half up.
    assert_eq!(quote.fees.get("service_fee"), Some(&250_000));
    assert_eq!(quote.total, 5_450_000);
}

#[test]
fn duration_discount_takes_the_highest_qualifying_tier() {
    let mut policy = nightly_policy();
    policy.rules.duration_discounts = vec![
        DurationDiscount {
            min_days: 7,
            percent: 10,
        },
        DurationDiscount {
            min_days: 30,
            percent: 20,
        },
    ];

    let window = stay(date(2026, 3, 2), date(2026, 3, 9));
    let quote = compute_quote(
        &villa(),
        &policy,
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");

    assert_eq!(quote.subtotal, 7_000_000);
    assert_eq!(quote.discounts.get("duration_discount"), Some(&-700_000));
    assert_eq!(quote.base_price, 6_300_000);
    assert_eq!(quote.total, 6_300_000);
}

#[test]
fn weekday_and_seasonal_rates_layer_per_night() {
    let mut policy = nightly_policy();
    policy
        .rules
        .weekday_rates
        .insert(DayOfWeek::Friday, 1_400_000);
    policy.rules.seasonal_rates.push(SeasonalRate {
        name: "peak".to_string(),
        from_month: 7,
        from_day: 1,
        to_month: 8,
        to_day: 31,
        multiplier_percent: 150,
    });

    // Thursday through Sunday in July: every night carries the season, the
    // Friday night also carries its weekday override.
    let window = stay(date(2026, 7, 2), date(2026, 7, 5));
    let quote = compute_quote(
        &villa(),
        &policy,
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");

    assert_eq!(quote.subtotal, 1_500_000 + 2_100_000 + 1_500_000);
}

#[test]
fn weekend_surcharge_applies_once_when_any_night_is_weekend() {
    let mut policy = nightly_policy();
    policy.rules.fees.weekend_surcharge = 150_000;

    let midweek = stay(date(2026, 3, 2), date(2026, 3, 6));
    let quote = compute_quote(
        &villa(),
        &policy,
        DurationClass::Nightly {
            window: midweek,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");
    assert!(quote.fees.get("weekend_surcharge").is_none());
    assert_eq!(quote.total, 4_000_000);

    // Friday to Monday sleeps two weekend nights but pays the flat fee once.
    let weekend = stay(date(2026, 3, 6), date(2026, 3, 9));
    let quote = compute_quote(
        &villa(),
        &policy,
        DurationClass::Nightly {
            window: weekend,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");
    assert_eq!(quote.fees.get("weekend_surcharge"), Some(&150_000));
    assert_eq!(quote.total, 3_150_000);
}

#[test]
fn extra_guest_fee_counts_heads_past_the_baseline() {
    let mut policy = nightly_policy();
    policy.rules.fees.extra_guest_fee = 100_000;
    let window = stay(date(2026, 3, 2), date(2026, 3, 6));

    // Villa baseline is half of four; the infant never counts.
    let quote = compute_quote(
        &villa(),
        &policy,
        DurationClass::Nightly {
            window,
            guests: GuestCount {
                adults: 3,
                children: 1,
                infants: 1,
            },
        },
    )
    .expect("quote computes");
    assert_eq!(quote.fees.get("extra_guest_fee"), Some(&800_000));

    let quote = compute_quote(
        &villa(),
        &policy,
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");
    assert!(quote.fees.get("extra_guest_fee").is_none());

    // Half of one rounds down to zero, so the default baseline of two holds.
    let mut cabin = villa();
    cabin.max_occupancy = Some(1);
    let quote = compute_quote(
        &cabin,
        &policy,
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(3),
        },
    )
    .expect("quote computes");
    assert_eq!(quote.fees.get("extra_guest_fee"), Some(&400_000));
}

#[test]
fn breakdown_preserves_application_order() {
    let mut policy = nightly_policy();
    policy.rules.duration_discounts = vec![DurationDiscount {
        min_days: 7,
        percent: 10,
    }];
    policy.rules.fees.cleaning_fee = 200_000;
    policy.rules.fees.service_fee_percent = 5;
    policy.rules.fees.internet_fee = 50_000;
    policy.rules.fees.weekend_surcharge = 150_000;

    let window = stay(date(2026, 3, 2), date(2026, 3, 9));
    let quote = compute_quote(
        &villa(),
        &policy,
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");

    let labels: Vec<&str> = quote
        .breakdown
        .iter()
        .map(|line| line.label.as_str())
        .collect();
    assert_eq!(
        labels,
        [
            "7 nights",
            "duration discount (10%)",
            "cleaning fee",
            "service fee",
            "internet fee",
            "weekend surcharge",
        ]
    );
    // Service fee runs on the discounted base.
    assert_eq!(quote.fees.get("service_fee"), Some(&315_000));
    assert_eq!(quote.total, 6_300_000 + 200_000 + 315_000 + 50_000 + 150_000);
}

#[test]
fn booking_hold_deposit_is_reported_not_charged() {
    let mut policy = nightly_policy();
    policy.rules.fees.booking_hold_deposit = 500_000;

    let window = stay(date(2026, 3, 2), date(2026, 3, 6));
    let quote = compute_quote(
        &villa(),
        &policy,
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(2),
        },
    )
    .expect("quote computes");

    assert_eq!(quote.deposit, Some(500_000));
    assert_eq!(quote.total, 4_000_000);
    assert!(quote.first_payment.is_none());
}

#[test]
fn monthly_quote_attaches_deposit_and_first_payment() {
    let quote = compute_quote(&villa(), &monthly_policy(), DurationClass::Monthly { months: 6 })
        .expect("quote computes");
    assert_eq!(quote.subtotal, 90_000_000);
    assert_eq!(quote.total, 90_000_000);
    assert_eq!(quote.deposit, Some(15_000_000));
    assert_eq!(quote.first_payment, Some(105_000_000));
    assert_eq!(quote.breakdown[0].label, "6 months");

    // Discount tiers qualify on day-equivalents; deposit months can be
    // overridden per policy.
    let mut policy = monthly_policy();
    policy.rules.duration_discounts = vec![DurationDiscount {
        min_days: 180,
        percent: 5,
    }];
    policy.rules.fees.deposit_months = Some(2);
    let quote = compute_quote(&villa(), &policy, DurationClass::Monthly { months: 6 })
        .expect("quote computes");
    assert_eq!(quote.base_price, 85_500_000);
    assert_eq!(quote.total, 85_500_000);
    assert_eq!(quote.deposit, Some(30_000_000));
    assert_eq!(quote.first_payment, Some(115_500_000));
}

#[test]
fn yearly_quote_compounds_the_rent_once_per_elapsed_year() {
    let quote = compute_quote(&villa(), &yearly_policy(), DurationClass::Yearly { years: 3 })
        .expect("quote computes");

    assert_eq!(
        quote.yearly_prices,
        Some(vec![120_000_000, 126_000_000, 132_300_000])
    );
    assert_eq!(quote.subtotal, 378_300_000);
    assert_eq!(quote.total, 378_300_000);
    // Three months of rent held by default on yearly leases.
    assert_eq!(quote.deposit, Some(30_000_000));
    assert_eq!(quote.first_payment, Some(408_300_000));
    assert_eq!(quote.breakdown.len(), 3);
    assert_eq!(quote.breakdown[2].label, "year 3");
    assert!(quote.discounts.is_empty());
}

#[test]
fn price_unit_mismatch_is_rejected() {
    let window = stay(date(2026, 3, 2), date(2026, 3, 7));
    let err = compute_quote(
        &villa(),
        &monthly_policy(),
        DurationClass::Nightly {
            window,
            guests: GuestCount::adults(2),
        },
    )
    .expect_err("monthly policy cannot price a nightly stay");
    assert!(matches!(err, PricingError::PriceUnitMismatch { .. }));
}

#[test]
fn open_ended_and_empty_durations_are_rejected() {
    let open = StayWindow::open_ended(date(2026, 3, 2));
    let err = compute_quote(
        &villa(),
        &nightly_policy(),
        DurationClass::Nightly {
            window: open,
            guests: GuestCount::adults(1),
        },
    )
    .expect_err("open-ended stay");
    assert!(matches!(err, PricingError::OpenEndedStay));

    let err = compute_quote(&villa(), &monthly_policy(), DurationClass::Monthly { months: 0 })
        .expect_err("zero months");
    assert!(matches!(err, PricingError::EmptyDuration("month")));

    let err = compute_quote(&villa(), &yearly_policy(), DurationClass::Yearly { years: 0 })
        .expect_err("zero years");
    assert!(matches!(err, PricingError::EmptyDuration("year")));
}

#[test]
fn identical_inputs_always_produce_identical_quotes() {
    let mut policy = nightly_policy_with_fees();
    policy.rules.duration_discounts = vec![DurationDiscount {
        min_days: 7,
        percent: 10,
    }];
    policy.rules.seasonal_rates.push(SeasonalRate {
        name: "peak".to_string(),
        from_month: 7,
        from_day: 1,
        to_month: 8,
        to_day: 31,
        multiplier_percent: 150,
    });

    let window = stay(date(2026, 6, 29), date(2026, 7, 6));
    let class = DurationClass::Nightly {
        window,
        guests: GuestCount::adults(3),
    };
    let first = compute_quote(&villa(), &policy, class).expect("quote computes");
    let second = compute_quote(&villa(), &policy, class).expect("quote computes");

    assert_eq!(first.total, second.total);
    assert_eq!(first.fees, second.fees);
    assert_eq!(first.discounts, second.discounts);
    assert_eq!(first.breakdown, second.breakdown);
}
