//! VaultHub server — secret storage and resolution engine.
//!
//! Entry point that loads configuration, connects the database, and
//! wires the repositories and services together.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use vaulthub_core::config::AppConfig;
use vaulthub_core::error::AppError;
use vaulthub_crypto::Aes256GcmCipher;
use vaulthub_database::connection::DatabasePool;
use vaulthub_database::repositories::blind_index::BlindIndexConfigRepository;
use vaulthub_database::repositories::environment::EnvironmentRepository;
use vaulthub_database::repositories::folder::FolderRepository;
use vaulthub_database::repositories::folder_version::FolderVersionRepository;
use vaulthub_database::repositories::secret::SecretRepository;
use vaulthub_database::repositories::secret_import::SecretImportRepository;
use vaulthub_database::repositories::secret_tag::SecretTagRepository;
use vaulthub_database::repositories::secret_version::SecretVersionRepository;
use vaulthub_service::folder::FolderService;
use vaulthub_service::import::ImportService;
use vaulthub_service::notify::{LoggingSnapshotNotifier, LoggingSyncNotifier};
use vaulthub_service::secret::SecretService;

#[tokio::main]
async fn main() {
    let env = std::env::var("VAULTHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting VaultHub v{}", env!("CARGO_PKG_VERSION"));

    let pool = DatabasePool::connect(&config.database).await?;
    pool.health_check().await?;
    vaulthub_database::migration::run_migrations(pool.pool()).await?;

    let env_repo = Arc::new(EnvironmentRepository::new(pool.pool().clone()));
    let folder_repo = Arc::new(FolderRepository::new(pool.pool().clone()));
    let folder_version_repo = Arc::new(FolderVersionRepository::new(pool.pool().clone()));
    let secret_repo = Arc::new(SecretRepository::new(pool.pool().clone()));
    let secret_version_repo = Arc::new(SecretVersionRepository::new(pool.pool().clone()));
    let tag_repo = Arc::new(SecretTagRepository::new(pool.pool().clone()));
    let import_repo = Arc::new(SecretImportRepository::new(pool.pool().clone()));
    let blind_index_repo = Arc::new(BlindIndexConfigRepository::new(pool.pool().clone()));

    let cipher = Arc::new(Aes256GcmCipher);
    let snapshots = Arc::new(LoggingSnapshotNotifier);
    let sync = Arc::new(LoggingSyncNotifier);

    let _folder_service = FolderService::new(
        pool.clone(),
        Arc::clone(&env_repo),
        Arc::clone(&folder_repo),
        Arc::clone(&folder_version_repo),
        snapshots.clone(),
    );
    let import_service = Arc::new(ImportService::new(
        pool.clone(),
        Arc::clone(&env_repo),
        Arc::clone(&folder_repo),
        Arc::clone(&secret_repo),
        Arc::clone(&import_repo),
        snapshots.clone(),
    ));
    let _secret_service = SecretService::new(
        pool.clone(),
        env_repo,
        folder_repo,
        secret_repo,
        secret_version_repo,
        tag_repo,
        blind_index_repo,
        import_service,
        cipher,
        config.crypto.active_key().to_string(),
        snapshots,
        sync,
    );

    tracing::info!("VaultHub services ready");

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    pool.close().await;
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
}
