//! TaskHub Notification Server
//!
//! Main entry point that wires all crates together and starts the
//! real-time delivery engine.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, fmt};

use taskhub_core::config::AppConfig;
use taskhub_core::error::AppError;
use taskhub_delivery::ports::{
    DeviceRegistry, LiveBroadcaster, NotificationStore, PushGateway, TaskSource, TenantDirectory,
};
use taskhub_delivery::{DeliveryDispatcher, DueDateScanner};

#[tokio::main]
async fn main() {
    let env = std::env::var("TASKHUB_ENV").unwrap_or_else(|_| "development".to_string());
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

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting TaskHub notification server v{}", env!("CARGO_PKG_VERSION"));

    // Database connection + migrations
    let db = taskhub_database::DatabasePool::connect(&config.database).await?;
    taskhub_database::migration::run_migrations(db.pool()).await?;

    // Repositories behind the delivery ports
    let store: Arc<dyn NotificationStore> = Arc::new(
        taskhub_database::repositories::NotificationRepository::new(db.pool().clone()),
    );
    let devices: Arc<dyn DeviceRegistry> = Arc::new(
        taskhub_database::repositories::DeviceTokenRepository::new(db.pool().clone()),
    );
    let tasks: Arc<dyn TaskSource> = Arc::new(
        taskhub_database::repositories::TaskRepository::new(db.pool().clone()),
    );
    let tenants: Arc<dyn TenantDirectory> = Arc::new(
        taskhub_database::repositories::TenantRepository::new(db.pool().clone()),
    );

    // Push gateway
    let push: Arc<dyn PushGateway> = Arc::new(taskhub_push::FcmClient::new(&config.push)?);
    if config.push.server_key.is_empty() {
        tracing::warn!("Push server key not configured; push delivery will be skipped");
    }

    // Real-time engine
    let manager = Arc::new(taskhub_realtime::ConnectionManager::new(
        config.realtime.clone(),
        Arc::clone(&store),
    ));
    let live: Arc<dyn LiveBroadcaster> = Arc::clone(&manager) as Arc<dyn LiveBroadcaster>;
    let authenticator = taskhub_realtime::WsAuthenticator::new(&config.auth);

    // Delivery engine
    let dispatcher = Arc::new(DeliveryDispatcher::new(
        Arc::clone(&store),
        devices,
        push,
        live,
        tenants,
    ));
    let scanner = Arc::new(DueDateScanner::new(
        tasks,
        Arc::clone(&store),
        Arc::clone(&dispatcher),
        config.scanner.calendar_timezone,
    ));

    // Background scheduler
    let mut scheduler = if config.worker.enabled {
        let scheduler = taskhub_worker::CronScheduler::new(
            config.scanner.clone(),
            config.worker.clone(),
            Arc::clone(&scanner),
            Arc::clone(&store),
        )
        .await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // WebSocket server with graceful shutdown
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(());
    });

    let server = taskhub_realtime::RealtimeServer::new(
        config.realtime.clone(),
        Arc::clone(&manager),
        authenticator,
    );
    server.serve(shutdown_rx).await?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    db.close().await;

    tracing::info!("TaskHub notification server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
