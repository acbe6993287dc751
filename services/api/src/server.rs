use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_scheduling_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use volunsched::config::AppConfig;
use volunsched::error::AppError;
use volunsched::telemetry;

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

    let scheduling = config.scheduling.clone();
    info!(
        max_kakad = scheduling.quota.max_kakad_per_volunteer,
        max_total = scheduling.quota.max_total_per_volunteer,
        max_thursday = scheduling.quota.max_thursday_per_volunteer,
        signup_reuse = ?scheduling.signup_reuse,
        lock_timeout_ms = scheduling.lock_timeout.as_millis() as u64,
        "scheduling policy loaded"
    );

    let service = Arc::new(build_service(
        scheduling,
        args.volunteers.as_deref(),
        args.shifts.as_deref(),
    )?);

    let app = with_scheduling_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "volunteer scheduling service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
