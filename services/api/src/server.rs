use crate::cli::ServeArgs;
use crate::infra::{
    seed_catalog, AppState, InMemoryPolicyDirectory, InMemoryReservationStore,
    InMemoryUnitDirectory,
};
use crate::routes::with_booking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use staykit::booking::service::BookingService;
use staykit::config::AppConfig;
use staykit::error::AppError;
use staykit::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let units = Arc::new(InMemoryUnitDirectory::default());
    let policies = Arc::new(InMemoryPolicyDirectory::default());
    let reservations = Arc::new(InMemoryReservationStore::default());
    seed_catalog(&units, &policies);
    let booking_service = Arc::new(BookingService::new(units, policies, reservations));

    let app = with_booking_routes(booking_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "booking engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
