use std::sync::atomic::Ordering;
use std::sync::Arc;

use arbor_ops::config::AppConfig;
use arbor_ops::error::AppError;
use arbor_ops::telemetry;
use arbor_ops::workflows::estimating::EstimatingService;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{cost_parameters, AppState, InMemoryAlertPublisher, InMemoryJobRepository};
use crate::routes::with_estimating_routes;

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

    let repository = Arc::new(InMemoryJobRepository::default());
    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let estimating_service = Arc::new(EstimatingService::new(
        repository,
        alerts,
        cost_parameters(&config),
    ));

    let app = with_estimating_routes(estimating_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "estimating service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
