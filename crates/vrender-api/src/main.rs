//! Render server binary: HTTP API plus the in-process worker.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vrender_api::{create_router, metrics, ApiConfig, AppState};
use vrender_media::{FfmpegTranscoder, HttpFetcher, TitleStyle};
use vrender_queue::JobStore;
use vrender_storage::{build_store, StorageConfig};
use vrender_worker::{spawn_reaper, RenderPipeline, RenderWorker, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "vrender=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> anyhow::Result<()> {
    // Required for rustls 0.23+
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting vrender");

    let config = ApiConfig::from_env();
    let worker_config = WorkerConfig::from_env();
    let storage_config = StorageConfig::from_env().context("invalid storage configuration")?;
    info!(
        "API config: host={}, port={}, environment={}",
        config.host, config.port, config.environment
    );

    let storage = build_store(&storage_config).context("failed to initialize storage")?;
    match storage.check().await {
        Ok(()) => info!("Storage backend '{}' reachable", storage.name()),
        Err(e) => warn!("Storage backend '{}' not reachable yet: {}", storage.name(), e),
    }

    let transcoder = FfmpegTranscoder::new(
        worker_config.ffmpeg_path.clone(),
        worker_config.ffprobe_path.clone(),
        worker_config.ffmpeg_timeout.as_secs(),
    )
    .with_encoding(worker_config.encoding.clone())
    .with_title_style(TitleStyle {
        font_file: worker_config.title_font.clone(),
        ..TitleStyle::default()
    });
    info!(
        "Encoding: codec={}, preset={}, crf={}",
        worker_config.encoding.codec, worker_config.encoding.preset, worker_config.encoding.crf
    );
    match transcoder.check_available() {
        Ok(path) => info!("Using ffmpeg at {}", path.display()),
        Err(e) => warn!("{}; render jobs will fail until it is installed", e),
    }

    let fetcher = HttpFetcher::new(worker_config.fetch_timeout.as_secs())
        .context("failed to build HTTP fetcher")?;

    let jobs = Arc::new(JobStore::new());
    let pipeline = Arc::new(RenderPipeline::new(
        Arc::new(transcoder),
        fetcher,
        Arc::clone(&storage),
        worker_config.scratch_dir.clone(),
        storage_config.key_prefix.clone(),
    ));

    let worker = RenderWorker::new(Arc::clone(&jobs), pipeline);
    let worker_handle = worker.handle();
    let mut worker_task = tokio::spawn(worker.run());

    let reaper_task = spawn_reaper(
        Arc::clone(&jobs),
        worker_config.job_retention,
        worker_config.reaper_interval,
        worker_handle.shutdown_receiver(),
    );

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("failed to install Prometheus recorder")?)
    } else {
        None
    };

    let state = AppState::new(
        config.clone(),
        jobs,
        worker_handle.clone(),
        storage,
        worker_config.scratch_dir.clone(),
        worker_config.ffmpeg_path.clone(),
    );
    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    // Let the in-flight job finish, bounded by the shutdown timeout
    worker_handle.shutdown();
    match tokio::time::timeout(worker_config.shutdown_timeout, &mut worker_task).await {
        Ok(_) => info!("Worker stopped"),
        Err(_) => {
            warn!(
                "Worker did not stop within {}s, abandoning in-flight job",
                worker_config.shutdown_timeout.as_secs()
            );
            worker_task.abort();
        }
    }
    if let Err(e) = reaper_task.await {
        warn!("Reaper task ended abnormally: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
