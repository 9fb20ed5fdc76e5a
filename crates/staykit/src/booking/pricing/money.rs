//! Integer money arithmetic. Every amount in the crate is an `i64` count of
//! minor currency units; fractions never appear.

/// Round-half-up integer percentage. `percent` doubles as a multiplier when
/// encoded as percent of the original (`150` means 1.5x).
///
/// Callers only pass non-negative amounts; discounts are derived first and
/// negated afterwards.
pub fn percent_of(amount: i64, percent: u32) -> i64 {
    debug_assert!(amount >= 0, "percent_of expects a non-negative amount");
    (amount * i64::from(percent) + 50) / 100
}
