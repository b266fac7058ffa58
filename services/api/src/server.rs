use crate::cli::ServeArgs;
use crate::infra::{
    build_service, seed_jobs, AppState, InMemoryApplicationRepository, InMemoryJobRepository,
};
use crate::routes::with_swipe_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use jobswipe::config::AppConfig;
use jobswipe::error::AppError;
use jobswipe::telemetry;
use jobswipe::workflows::swipe::JobCsvImporter;
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

    let jobs = InMemoryJobRepository::default();
    if let Some(path) = args.jobs_csv.take() {
        let imported = JobCsvImporter::from_path(&path)?;
        let loaded = seed_jobs(&jobs, imported);
        info!(path = %path.display(), loaded, "job postings preloaded");
    }

    let service = Arc::new(build_service(
        &config,
        jobs,
        InMemoryApplicationRepository::default(),
    ));

    let app = with_swipe_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job swipe service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
