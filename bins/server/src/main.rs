//! G Coin ledger server
//!
//! Main entry point for the wallet service.

use std::sync::Arc;
use std::time::Duration;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gcoin_api::{AppState, create_router};
use gcoin_core::LedgerServices;
use gcoin_core::events::{
    EmailNotifier, EventPublisher, LogNotifier, NotificationDispatcher, StaticDirectory,
};
use gcoin_core::ledger::LedgerPolicy;
use gcoin_db::{PgLedgerStore, connect, migration::Migrator};
use gcoin_shared::{AppConfig, EmailService};

/// Grace period for the dispatcher to drain the outbox on shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gcoin=debug,tower_http=debug".into());
    if config.log.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Connect to database
    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    if config.database.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    // Outbox and notification delivery
    let identity = Arc::new(match &config.notifications.directory_path {
        Some(path) => {
            let directory = StaticDirectory::load(path)?;
            info!(path = %path, users = directory.len(), "User directory loaded");
            directory
        }
        None => StaticDirectory::new(),
    });
    if config.notifications.enabled && config.notifications.email && identity.is_empty() {
        anyhow::bail!(
            "notifications.email is enabled but no user directory supplies addresses; \
             set notifications.directory_path"
        );
    }
    let (events, outbox) = EventPublisher::from_config(&config.notifications);
    let dispatcher = outbox.map(|rx| {
        let mut dispatcher = NotificationDispatcher::new(
            identity.clone(),
            Duration::from_millis(config.notifications.timeout_ms),
        )
        .with_notifier(Arc::new(LogNotifier));
        if config.notifications.email {
            dispatcher = dispatcher.with_notifier(Arc::new(EmailNotifier::new(
                EmailService::new(config.email.clone()),
            )));
            info!(
                smtp_host = %config.email.smtp_host,
                smtp_port = %config.email.smtp_port,
                "Email notifications enabled"
            );
        }
        dispatcher.spawn(rx)
    });

    // Ledger services
    let policy = LedgerPolicy::from(&config.ledger);
    let store = Arc::new(PgLedgerStore::new(db.clone(), policy.lock_timeout));
    let ledger = LedgerServices::new(store, policy, events, identity);

    // Create router
    let app = create_router(AppState::new(ledger));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Router and publishers are gone; the dispatcher exits once the outbox drains.
    if let Some(handle) = dispatcher {
        if tokio::time::timeout(DRAIN_TIMEOUT, handle).await.is_err() {
            warn!("Notification dispatcher did not drain in time");
        }
    }

    db.close().await?;
    info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
