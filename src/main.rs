// src/main.rs
use anyhow::Result;
use hyper::{header, Body, Method, Response, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use uptime_monitor::{
    alert::{AlertDispatcher, LogNotifier, Notifier, TwilioNotifier},
    config::{self, Config},
    logs::{CheckLogger, LogFiles, LogRotator},
    metrics::MetricsRegistry,
    probe::HttpProber,
    scheduler::{CheckPipeline, Scheduler},
    server::{router::status_response, RequestHandler, Router, ServerBuilder},
    store::FileStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("uptime_monitor=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;

    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let metrics = metrics_registry.collector();

    let notifier: Arc<dyn Notifier> = match &config.notifier.twilio {
        Some(twilio) => Arc::new(TwilioNotifier::new(twilio.clone())),
        None => {
            info!("No SMS provider configured, alerts go to the log only");
            Arc::new(LogNotifier)
        }
    };

    let logs = LogFiles::new(&config.logs_dir);
    let pipeline = CheckPipeline::new(
        Arc::new(FileStore::new(&config.data_dir)),
        Arc::new(HttpProber::new()?),
        CheckLogger::new(logs.clone()),
        AlertDispatcher::new(notifier),
    )
    .with_metrics(metrics);

    let scheduler = Arc::new(Scheduler::new(
        config.scheduler.clone(),
        pipeline,
        LogRotator::new(logs),
    ));

    if config.metrics.enabled {
        start_operator_server(&config, metrics_registry)?;
    }

    info!("Background workers are running");
    let workers = tokio::spawn(scheduler.clone().start());

    shutdown_signal().await;
    scheduler.shutdown();
    if let Err(e) = workers.await {
        error!("Scheduler task failed: {}", e);
    }

    Ok(())
}

fn start_operator_server(config: &Config, registry: Arc<MetricsRegistry>) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();

    let router = Router::new()
        .route(Method::GET, &config.metrics.path, move |_| {
            let registry = registry.clone();
            async move {
                let mut response = Response::new(Body::from(registry.gather()));
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    header::HeaderValue::from_static("text/plain; version=0.0.4"),
                );
                response
            }
        })
        .route(Method::GET, "/health", |_| async {
            status_response(StatusCode::OK, "OK")
        });

    info!("Metrics available at http://{}{}", addr, config.metrics.path);

    let server = ServerBuilder::new(addr).with_handler(RequestHandler::new(router));
    tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            error!("Operator server error: {}", e);
        }
    });

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
