// ============================
// authgate-server/src/main.rs
// ============================
//! Tokio / Axum entry-point for the authgate server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use authgate::{
    config::Settings,
    create_router,
    security::LocalShield,
    storage::{MemoryUserStore, PgUserStore, UserStore},
    AppState,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "authgate-server", version, about = "Signup and signin HTTP server")]
struct Args {
    /// TOML config file, `authgate.toml` when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Keep users in memory instead of PostgreSQL
    #[arg(long)]
    memory: bool,

    /// Do not run database migrations on startup
    #[arg(long)]
    skip_migrations: bool,
}

fn init_tracing(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.environment.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_store(settings: &Settings, args: &Args) -> anyhow::Result<Arc<dyn UserStore>> {
    if args.memory {
        tracing::warn!("using in-memory user store, accounts are lost on restart");
        return Ok(Arc::new(MemoryUserStore::new()));
    }

    let store = PgUserStore::connect(&settings.database)
        .await
        .context("connecting to database")?;
    if !args.skip_migrations {
        store.migrate().await.context("running migrations")?;
    }
    tracing::info!("database connected");
    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load_from(args.config.as_deref()).context("loading settings")?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }
    init_tracing(&settings);

    let store = open_store(&settings, &args).await?;

    let shield = LocalShield::from_settings(&settings.security);
    let sweep_every = Duration::from_secs(settings.security.sweep_interval_secs.max(1));
    {
        let shield = shield.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = shield.sweep();
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        tracked = shield.tracked(),
                        "swept idle rate limit windows"
                    );
                }
            }
        });
    }

    let addr = settings.bind_addr;
    let environment = settings.environment;
    let state = Arc::new(AppState::with_policy(settings, store, Arc::new(shield))?);
    let app = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, ?environment, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
