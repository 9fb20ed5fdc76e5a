use crate::infra::{
    parse_date, seed_catalog, InMemoryPolicyDirectory, InMemoryReservationStore,
    InMemoryUnitDirectory,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use staykit::booking::domain::{GuestContact, GuestCount, StayWindow, UnitId};
use staykit::booking::pricing::PriceQuote;
use staykit::booking::service::{BookingError, BookingService, LeaseTerm, ReservationRequest};
use staykit::error::AppError;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct QuoteArgs {
    /// Catalog unit to price. The demo catalog ships villa-seaview,
    /// dorm-garden, and loft-harbor.
    #[arg(long, default_value = "villa-seaview")]
    pub(crate) unit: String,
    /// First night of the stay (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Checkout date (YYYY-MM-DD). Defaults to four nights after the start.
    #[arg(long, value_parser = parse_date)]
    pub(crate) end_date: Option<NaiveDate>,
    /// Adults in the party
    #[arg(long, default_value_t = 2)]
    pub(crate) adults: u32,
    /// Children in the party
    #[arg(long, default_value_t = 0)]
    pub(crate) children: u32,
    /// Voucher code to apply (the demo catalog ships WELCOME10)
    #[arg(long)]
    pub(crate) voucher: Option<String>,
    /// Quote a lease of this many months instead of a nightly stay
    #[arg(long, conflicts_with = "years")]
    pub(crate) months: Option<u32>,
    /// Quote a lease of this many years instead of a nightly stay
    #[arg(long)]
    pub(crate) years: Option<u32>,
    /// Reserve the stay after quoting and walk it through confirmation
    #[arg(long)]
    pub(crate) reserve: bool,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let QuoteArgs {
        unit,
        start_date,
        end_date,
        adults,
        children,
        voucher,
        months,
        years,
        reserve,
    } = args;

    let units = Arc::new(InMemoryUnitDirectory::default());
    let policies = Arc::new(InMemoryPolicyDirectory::default());
    let reservations = Arc::new(InMemoryReservationStore::default());
    seed_catalog(&units, &policies);
    let service = BookingService::new(units, policies, reservations);

    let unit_id = UnitId(unit);

    println!("StayKit pricing demo");

    let term = months
        .map(LeaseTerm::Months)
        .or_else(|| years.map(LeaseTerm::Years));
    if let Some(term) = term {
        let quote = service.lease_quote(&unit_id, term)?;
        println!("Unit {} | lease pricing", unit_id.0);
        render_quote(&quote);
        print_wire_payload(&quote);
        return Ok(());
    }

    let start = start_date.unwrap_or_else(|| Local::now().date_naive());
    let end = end_date.unwrap_or(start + chrono::Duration::days(4));
    let window = StayWindow::closed(start, end).map_err(BookingError::from)?;
    let guests = GuestCount {
        adults,
        children,
        infants: 0,
    };

    println!(
        "Unit {} | stay {} to {} | {} adults, {} children",
        unit_id.0, start, end, adults, children
    );

    let report = service.check_availability(&unit_id, &window, 1)?;
    if report.outcome.available {
        println!("\nAvailability: open ({})", report.outcome.message);
    } else {
        println!("\nAvailability: blocked ({})", report.outcome.message);
        for alternative in &report.suggestions {
            println!("  - alternative window {}", alternative);
        }
    }

    let quote = service.quote(&unit_id, &window, guests, voucher.as_deref())?;
    println!("\nQuote breakdown");
    render_quote(&quote);
    print_wire_payload(&quote);

    if !reserve {
        return Ok(());
    }

    println!("\nReservation walkthrough");
    let record = service.reserve(ReservationRequest {
        unit_id: unit_id.clone(),
        window,
        quantity: 1,
        guests,
        contact: Some(GuestContact {
            name: "Demo Guest".to_string(),
            email: None,
            phone: None,
        }),
        voucher_code: voucher,
        adjustment_policy: None,
    })?;
    println!(
        "- Created {} ({}) -> status {}",
        record.id.0,
        record.code,
        record.status.label()
    );

    let confirmed = service.confirm(&record.id)?;
    println!("- Confirmed -> status {}", confirmed.status.label());

    let busy = service.check_availability(&unit_id, &window, 1)?;
    println!(
        "- Window {} is now {}",
        window,
        if busy.outcome.available {
            "still open"
        } else {
            "blocked for further bookings"
        }
    );

    Ok(())
}

fn render_quote(quote: &PriceQuote) {
    for line in &quote.breakdown {
        println!("  - {}: {} {}", line.label, line.amount, quote.currency);
    }
    println!("  Total: {} {}", quote.total, quote.currency);
    if let Some(deposit) = quote.deposit {
        println!("  Deposit: {} {}", deposit, quote.currency);
    }
    if let Some(first_payment) = quote.first_payment {
        println!("  First payment: {} {}", first_payment, quote.currency);
    }
}

fn print_wire_payload(quote: &PriceQuote) {
    match serde_json::to_string_pretty(quote) {
        Ok(json) => println!("\nWire payload:\n{json}"),
        Err(err) => println!("\nWire payload unavailable: {err}"),
    }
}
