//! Booking availability and dynamic pricing core for property rental
//! platforms.
//!
//! The crate is organised around three collaborating pieces: the
//! [`booking::availability`] resolver decides whether a rentable unit can be
//! claimed for a window under its allocation discipline, the
//! [`booking::pricing`] engine turns a policy snapshot and a window into an
//! itemised quote, and [`booking::service::BookingService`] composes the two
//! behind the HTTP router in [`booking::router`]. Persistence is abstracted
//! behind the traits in [`booking::repository`] so the same core runs against
//! the in-memory stores used by the API service and the test suites.

pub mod booking;
pub mod config;
pub mod error;
pub mod telemetry;
