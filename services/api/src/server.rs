use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use grant_insights::config::AppConfig;
use grant_insights::error::AppError;
use grant_insights::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

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
    let app_state = AppState::new(readiness_flag.clone(), prometheus_handle, &config.grants);

    warm_cache(&app_state);

    let app = router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        threshold = config.grants.match_threshold,
        "grant insights service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Cleans the configured export once so the first report is served from
/// cache. Failures are logged; the service still starts.
fn warm_cache(state: &AppState) {
    if state.source.is_none() {
        return;
    }

    match state
        .fetch_configured()
        .and_then(|bytes| state.cache.get_or_clean(&bytes).map_err(AppError::from))
    {
        Ok((fingerprint, dataset)) => info!(
            %fingerprint,
            rows = dataset.summary.rows,
            capacity = state.cache.capacity(),
            "warmed grant cache from configured source"
        ),
        Err(err) => warn!(error = %err, "configured grant source could not be cleaned"),
    }
}
