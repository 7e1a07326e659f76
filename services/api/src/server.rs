use crate::cli::ServeArgs;
use crate::infra::{seed_actors, AppState, Backends};
use crate::routes::with_service_routes;
use alumni_hub::clock::SystemClock;
use alumni_hub::config::AppConfig;
use alumni_hub::error::AppError;
use alumni_hub::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let backends = Backends::in_memory(seed_actors());
    let (moderation, admissions) = backends.services(&config.moderation, Arc::new(SystemClock));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        outbox: backends.outbox.clone(),
    };

    let app = with_service_routes(moderation, admissions)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        reopenable = ?config.moderation.reopenable,
        "alumni hub ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
