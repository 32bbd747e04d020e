use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use esglens::analysis::Analyzer;
use esglens::config::{Cli, Config, default_config_path};
use esglens::handler::{AppState, router};
use esglens::standards::ReferenceTable;
use esglens::upload::{DeleteUploads, KeepUploads, RetentionPolicy, UploadStore};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("esglens.svc starting");

    // An explicit --config must exist; the default location is optional.
    let cfg = match args.config_path {
        Some(path) => Config::new(&path).unwrap_or_else(|e| {
            tracing::error!(error = %e, path = %path, "failed to load config file");
            std::process::exit(1);
        }),
        None => {
            let path = default_config_path();
            if path.exists() {
                Config::new(&path.to_string_lossy()).unwrap_or_else(|e| {
                    tracing::error!(error = %e, path = ?path, "failed to load config file");
                    std::process::exit(1);
                })
            } else {
                tracing::info!(path = ?path, "no config file found, using defaults");
                Config::default()
            }
        }
    };

    let table = Arc::new(ReferenceTable::load(cfg.app.get_standards_path()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to load reference table");
        std::process::exit(1);
    }));

    let retention: Box<dyn RetentionPolicy> = if cfg.app.retain_uploads {
        Box::new(KeepUploads)
    } else {
        Box::new(DeleteUploads)
    };
    let uploads = Arc::new(UploadStore::new(cfg.app.get_upload_dir(), retention).unwrap_or_else(|e| {
        tracing::error!(error = %e, dir = ?cfg.app.get_upload_dir(), "failed to create upload directory");
        std::process::exit(1);
    }));

    let state = AppState {
        analyzer: Arc::new(Analyzer::new(table, &cfg.analysis)),
        uploads,
        timeout: Duration::from_secs(cfg.analysis.timeout_seconds),
    };
    let app = router(state, cfg.app.max_upload_bytes);

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let cancellation_token = CancellationToken::new();
    let shutdown = cancellation_token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
        }
        shutdown.cancel();
    });

    tracing::info!("esglens.svc running on {}", &address);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await;
    if let Err(err) = result {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }

    tracing::info!("esglens.svc going off, graceful shutdown complete");
}
