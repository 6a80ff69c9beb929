//! Claimgate Broker
//!
//! HTTP front for claimed-email login reconciliation: identities arrive
//! from an external OpenID relying party, prove address ownership with
//! mailed codes, and resolve to durable accounts.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use claimgate_broker::{
    routes, AppState, AssertedCaseSource, Config, ConsoleMailer, MemorySessions, SessionStore,
    SmtpMailer, SqliteRegistry,
};
use claimgate_core::{CodeMailer, MemoryRegistry, RegistryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claimgate_broker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(port = config.port, domain = %config.domain, "Loaded configuration");

    // Pick the mailer: SMTP when configured, console otherwise
    let mailer: Box<dyn CodeMailer> = match config.smtp.clone() {
        Some(smtp) => match SmtpMailer::new(smtp) {
            Ok(mailer) => Box::new(mailer),
            Err(err) => {
                tracing::warn!(error = %err, "SMTP unavailable, falling back to console mailer");
                Box::new(ConsoleMailer::new())
            }
        },
        None => Box::new(ConsoleMailer::new()),
    };

    // Pick the stores: SQLite when a database path is configured
    match &config.database {
        Some(path) => {
            let store = Arc::new(SqliteRegistry::open(path)?);
            tracing::info!(path = %path, "Using SQLite store");
            serve(&config, store.clone(), store, mailer).await
        }
        None => {
            tracing::info!("Using in-memory stores");
            serve(
                &config,
                Arc::new(MemoryRegistry::new()),
                Arc::new(MemorySessions::new()),
                mailer,
            )
            .await
        }
    }
}

async fn serve<R, T>(
    config: &Config,
    store: Arc<R>,
    sessions: Arc<T>,
    mailer: Box<dyn CodeMailer>,
) -> Result<()>
where
    R: RegistryStore + 'static,
    T: SessionStore + 'static,
{
    let state = Arc::new(AppState::new(
        config.domain.clone(),
        store,
        sessions,
        Arc::new(mailer),
        Arc::new(AssertedCaseSource),
    ));

    let app = routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Broker listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
