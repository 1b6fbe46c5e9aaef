mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use config::WorkerConfig;
use intel_clients::ExternalClients;
use intel_domain_health::DomainHealth;
use intel_jobs::{
    ArchiveRetryJob, CongressAnalysisJob, CongressScrapeJob, CongressScrapeParams,
    CongressSessionsRescoreJob, CongressTradesFetchJob, JobDeps, MarketNewsJob,
    ProcessResearchReportsJob, RssIngestJob, SocialPostExtractionJob, SocialRetentionJob,
    SocialSentimentAnalysisJob, SocialSentimentCollectJob, SocialSessioningJob, TickerResearchJob,
};
use intel_pipeline::ArticlePipeline;
use intel_scheduler::Scheduler;
use intel_store::{MetaStore, ResearchStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("starting intel-worker");
    let config = WorkerConfig::from_env()?;

    let research_store = Arc::new(
        ResearchStore::connect(&config.research_database_url, config.max_connections).await?,
    );
    let meta_store = Arc::new(MetaStore::connect(&config.meta_database_url, config.max_connections).await?);
    tracing::info!("connected to research and meta databases");

    let clients = ExternalClients::new(config.clients);
    let health = clients.health_snapshot().await;
    tracing::info!(?health, "external clients health snapshot");

    let domain_health = Arc::new(DomainHealth::new(Arc::clone(&research_store)));
    let pipeline = Arc::new(ArticlePipeline::new(
        Arc::clone(&research_store),
        clients.clone(),
        Arc::clone(&domain_health),
    ));

    let deps = JobDeps {
        pipeline,
        clients,
        research_store,
        meta_store: Arc::clone(&meta_store),
        domain_health,
    };

    let scheduler = Arc::new(Scheduler::new(Arc::clone(&meta_store), config.worker_count));
    register_jobs(&scheduler, deps, &config.research_reports_dir).await;

    scheduler.start().await?;
    tracing::info!("scheduler started, serving control API");

    let app = intel_control_api::router(intel_control_api::AppState {
        scheduler: Arc::clone(&scheduler),
    });
    let addr = std::env::var("CONTROL_API_ADDR").unwrap_or_else(|_| "0.0.0.0:9100".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr, "control API listening");

    let shutdown = shutdown_signal();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    scheduler.shutdown().await;
    Ok(())
}

async fn register_jobs(scheduler: &Scheduler, deps: JobDeps, research_reports_dir: &str) {
    scheduler.register(Arc::new(RssIngestJob::new(deps.clone()))).await;
    scheduler.register(Arc::new(MarketNewsJob::new(deps.clone()))).await;
    scheduler.register(Arc::new(TickerResearchJob::new(deps.clone()))).await;
    scheduler.register(Arc::new(ArchiveRetryJob::new(deps.clone()))).await;
    scheduler
        .register(Arc::new(ProcessResearchReportsJob::new(
            deps.clone(),
            PathBuf::from(research_reports_dir),
        )))
        .await;

    scheduler.register(Arc::new(CongressTradesFetchJob::new(deps.clone()))).await;
    scheduler.register(Arc::new(CongressAnalysisJob::new(deps.clone()))).await;
    scheduler
        .register(Arc::new(CongressAnalysisJob::rescore_mode(deps.clone())))
        .await;
    scheduler
        .register(Arc::new(CongressSessionsRescoreJob::new(deps.clone())))
        .await;
    scheduler
        .register(Arc::new(CongressScrapeJob::new(deps.clone(), CongressScrapeParams::default())))
        .await;

    scheduler
        .register(Arc::new(SocialSentimentCollectJob::new(deps.clone())))
        .await;
    scheduler
        .register(Arc::new(SocialPostExtractionJob::new(deps.clone())))
        .await;
    scheduler.register(Arc::new(SocialSessioningJob::new(deps.clone()))).await;
    scheduler
        .register(Arc::new(SocialSentimentAnalysisJob::new(deps.clone())))
        .await;
    scheduler.register(Arc::new(SocialRetentionJob::new(deps))).await;
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
