use crate::cli::ServeArgs;
use crate::infra::{AppState, Backend};
use crate::routes::service_routes;
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use card_intake::config::AppConfig;
use card_intake::error::AppError;
use card_intake::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let backend = Backend::from_config(&config.store);
    let backend_label = backend.label();
    let batch_size = config.store.batch_size;
    let routes: Router = match backend {
        Backend::Hosted(store) => service_routes(store.clone(), store, batch_size),
        Backend::Memory { store, identity } => service_routes(store, identity, batch_size),
    };

    let app = routes
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, backend = backend_label, "card intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
