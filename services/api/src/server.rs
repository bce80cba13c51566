use crate::cli::ServeArgs;
use crate::infra::{
    sample_case, AppState, InMemorySimulationStore, InProcessScoringJobs, ScriptedModelClient,
};
use crate::routes::with_simulation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use casesim::config::AppConfig;
use casesim::debrief::{DebriefGenerator, JobPoller};
use casesim::error::AppError;
use casesim::simulation::SimulationService;
use casesim::telemetry;
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

    let case = Arc::new(sample_case());
    let store = Arc::new(InMemorySimulationStore::default());
    let model = Arc::new(ScriptedModelClient::default());
    let generator = DebriefGenerator::new(Arc::clone(&store), model);
    let jobs = Arc::new(InProcessScoringJobs::new(generator, Arc::clone(&case)));
    let poller = JobPoller::new(config.engine.poll_interval, config.engine.poll_max_attempts);
    let service = Arc::new(SimulationService::new(
        case,
        store,
        jobs,
        poller,
        config.engine.autosave_quiet,
    ));

    let app = with_simulation_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "case simulation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
