use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    GuestContact, GuestCount, PolicyId, ReservationId, ReservationInterval, StayWindow, UnitId,
};
use super::pricing::quote::{PriceQuote, QuoteLine};
use super::repository::{PolicyDirectory, ReservationStore, UnitDirectory};
use super::service::{AvailabilityReport, BookingError, BookingService, ReservationRequest};

/// Router builder exposing the booking endpoints. Field names on the wire
/// are contracts other collaborators depend on; do not rename them.
pub fn booking_router<U, P, R>(service: Arc<BookingService<U, P, R>>) -> Router
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/bookings/availability",
            post(availability_handler::<U, P, R>),
        )
        .route("/api/v1/bookings/price", post(price_handler::<U, P, R>))
        .route("/api/v1/bookings", post(create_handler::<U, P, R>))
        .route(
            "/api/v1/bookings/:reservation_id/confirm",
            post(confirm_handler::<U, P, R>),
        )
        .route(
            "/api/v1/bookings/:reservation_id/cancel",
            post(cancel_handler::<U, P, R>),
        )
        .route(
            "/api/v1/bookings/:reservation_id/check-in",
            post(check_in_handler::<U, P, R>),
        )
        .route(
            "/api/v1/bookings/:reservation_id/check-out",
            post(check_out_handler::<U, P, R>),
        )
        .route(
            "/api/v1/units/:unit_id/timeline",
            get(timeline_handler::<U, P, R>),
        )
        .route(
            "/api/v1/policies/:policy_id/conflicts",
            get(conflicts_handler::<U, P, R>),
        )
        .with_state(service)
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub rentable_item_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicting_bookings: Vec<ConflictingBooking>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggested_dates: Vec<SuggestedDates>,
}

#[derive(Debug, Serialize)]
pub struct ConflictingBooking {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SuggestedDates {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<&ReservationInterval> for ConflictingBooking {
    fn from(interval: &ReservationInterval) -> Self {
        Self {
            id: interval.id.0.clone(),
            start_date: interval.window.start,
            end_date: interval.window.end,
            status: interval.status.label(),
        }
    }
}

impl From<&StayWindow> for SuggestedDates {
    fn from(window: &StayWindow) -> Self {
        Self {
            start_date: window.start,
            end_date: window.end,
        }
    }
}

impl From<&AvailabilityReport> for AvailabilityResponse {
    fn from(report: &AvailabilityReport) -> Self {
        Self {
            available: report.outcome.available,
            message: report.outcome.message.clone(),
            conflicting_bookings: report
                .outcome
                .conflicts
                .iter()
                .map(ConflictingBooking::from)
                .collect(),
            suggested_dates: report.suggestions.iter().map(SuggestedDates::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub rentable_item_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guests: GuestCount,
    #[serde(default)]
    pub voucher_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub base_price: i64,
    pub nights: u32,
    pub subtotal: i64,
    pub fees: BTreeMap<String, i64>,
    pub discounts: BTreeMap<String, i64>,
    pub total: i64,
    pub breakdown: Vec<QuoteLine>,
}

impl From<PriceQuote> for PriceResponse {
    fn from(quote: PriceQuote) -> Self {
        Self {
            base_price: quote.base_price,
            nights: quote.duration.count(),
            subtotal: quote.subtotal,
            fees: quote.fees,
            discounts: quote.discounts,
            total: quote.total,
            breakdown: quote.breakdown,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub rentable_item_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub guests: GuestCount,
    #[serde(default)]
    pub voucher_code: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub contact: Option<GuestContact>,
    #[serde(default)]
    pub adjustment_policy: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReservationView {
    pub id: String,
    pub code: String,
    pub rentable_item_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub quantity: u32,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<GuestContact>,
}

impl From<ReservationInterval> for ReservationView {
    fn from(interval: ReservationInterval) -> Self {
        Self {
            id: interval.id.0,
            code: interval.code,
            rentable_item_id: interval.unit_id.0,
            start_date: interval.window.start,
            end_date: interval.window.end,
            quantity: interval.quantity,
            status: interval.status.label(),
            total: interval.quote_total,
            contact: interval.contact,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClockQuery {
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub(crate) async fn availability_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    axum::Json(request): axum::Json<AvailabilityRequest>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let window = match StayWindow::closed(request.start_date, request.end_date) {
        Ok(window) => window,
        Err(err) => return BookingError::from(err).into_response(),
    };
    let unit_id = UnitId(request.rentable_item_id);
    match service.check_availability(&unit_id, &window, request.quantity) {
        Ok(report) => {
            (StatusCode::OK, axum::Json(AvailabilityResponse::from(&report))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn price_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    axum::Json(request): axum::Json<PriceRequest>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let window = match StayWindow::closed(request.start_date, request.end_date) {
        Ok(window) => window,
        Err(err) => return BookingError::from(err).into_response(),
    };
    let unit_id = UnitId(request.rentable_item_id);
    match service.quote(
        &unit_id,
        &window,
        request.guests,
        request.voucher_code.as_deref(),
    ) {
        Ok(quote) => (StatusCode::OK, axum::Json(PriceResponse::from(quote))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    axum::Json(request): axum::Json<CreateBookingRequest>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let window = match StayWindow::closed(request.start_date, request.end_date) {
        Ok(window) => window,
        Err(err) => return BookingError::from(err).into_response(),
    };
    let reservation = ReservationRequest {
        unit_id: UnitId(request.rentable_item_id),
        window,
        quantity: request.quantity,
        guests: request.guests,
        contact: request.contact,
        voucher_code: request.voucher_code,
        adjustment_policy: request.adjustment_policy.map(PolicyId),
    };
    match service.reserve(reservation) {
        Ok(interval) => {
            (StatusCode::CREATED, axum::Json(ReservationView::from(interval))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn confirm_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    Path(reservation_id): Path<String>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let id = ReservationId(reservation_id);
    match service.confirm(&id) {
        Ok(interval) => (StatusCode::OK, axum::Json(ReservationView::from(interval))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn cancel_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    Path(reservation_id): Path<String>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let id = ReservationId(reservation_id);
    match service.cancel(&id) {
        Ok(interval) => (StatusCode::OK, axum::Json(ReservationView::from(interval))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn check_in_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    Path(reservation_id): Path<String>,
    Query(clock): Query<ClockQuery>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let id = ReservationId(reservation_id);
    let today = clock.today.unwrap_or_else(|| Local::now().date_naive());
    match service.check_in(&id, today) {
        Ok(interval) => (StatusCode::OK, axum::Json(ReservationView::from(interval))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn check_out_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    Path(reservation_id): Path<String>,
    Query(clock): Query<ClockQuery>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let id = ReservationId(reservation_id);
    let today = clock.today.unwrap_or_else(|| Local::now().date_naive());
    match service.check_out(&id, today) {
        Ok(interval) => (StatusCode::OK, axum::Json(ReservationView::from(interval))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn timeline_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    Path(unit_id): Path<String>,
    Query(range): Query<TimelineQuery>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let unit_id = UnitId(unit_id);
    let window = StayWindow {
        start: range.from,
        end: Some(range.to),
    };
    match service.timeline(&unit_id, &window) {
        Ok(intervals) => {
            let views: Vec<ReservationView> =
                intervals.into_iter().map(ReservationView::from).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn conflicts_handler<U, P, R>(
    State(service): State<Arc<BookingService<U, P, R>>>,
    Path(policy_id): Path<String>,
) -> Response
where
    U: UnitDirectory + 'static,
    P: PolicyDirectory + 'static,
    R: ReservationStore + 'static,
{
    let id = PolicyId(policy_id);
    match service.policy_conflicts(&id) {
        Ok(conflicts) => {
            let payload = json!({
                "policy_id": id.0,
                "conflicts": conflicts,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BookingError::UnitNotFound(_)
            | BookingError::ReservationNotFound(_)
            | BookingError::PolicyNotFound(_)
            | BookingError::UnpricedUnit(_)
            | BookingError::UnknownVoucher(_) => StatusCode::NOT_FOUND,
            BookingError::Validation(_) | BookingError::Pricing(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BookingError::Conflict { .. } | BookingError::CapacityExceeded { .. } => {
                StatusCode::CONFLICT
            }
            BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut payload = json!({
            "code": self.code(),
            "error": self.to_string(),
        });
        match &self {
            BookingError::Conflict {
                conflicts,
                suggestions,
                ..
            }
            | BookingError::CapacityExceeded {
                conflicts,
                suggestions,
                ..
            } => {
                if !conflicts.is_empty() {
                    let views: Vec<ConflictingBooking> =
                        conflicts.iter().map(ConflictingBooking::from).collect();
                    payload["conflicting_bookings"] = json!(views);
                }
                if !suggestions.is_empty() {
                    let views: Vec<SuggestedDates> =
                        suggestions.iter().map(SuggestedDates::from).collect();
                    payload["suggested_dates"] = json!(views);
                }
            }
            _ => {}
        }
        if let BookingError::CapacityExceeded { headroom, .. } = &self {
            payload["headroom"] = json!(headroom);
        }

        (status, axum::Json(payload)).into_response()
    }
}
