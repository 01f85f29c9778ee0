use crate::cli::ServeArgs;
use crate::infra::{seed_fleet, AppState};
use crate::routes::with_booking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crew_booking::booking::{BookingApi, InMemoryScheduleStore};
use crew_booking::clock::SystemClock;
use crew_booking::config::AppConfig;
use crew_booking::error::AppError;
use crew_booking::telemetry;
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

    let store = Arc::new(InMemoryScheduleStore::new());
    if config.seed_enabled {
        seed_fleet(&store)?;
    }
    let api = Arc::new(BookingApi::new(
        store,
        Arc::new(SystemClock),
        config.scheduling,
    ));

    let app = with_booking_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        timezone = %config.scheduling.timezone,
        "crew booking service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
