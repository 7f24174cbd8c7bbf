use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpServer;
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snippetbox::application::{Application, SessionOptions, build_app};
use snippetbox::config::Settings;
use snippetbox::repository::{PgSessionStore, PgSnippetRepository, PgUserRepository};
use snippetbox::service::{SnippetService, UserService};

#[actix_web::main]
async fn main() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            init_tracing("info");
            tracing::error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };
    init_tracing(&settings.logging.level);

    if let Err(err) = run(settings).await {
        tracing::error!(error = %format!("{err:#}"), "server exited with an error");
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("snippetbox={level},actix_web=info").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database.uri)
        .await
        .context("failed to open database pool")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("database connectivity check failed")?;

    if settings.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;
    }

    let store = PgSessionStore::new(pool.clone());
    spawn_session_cleanup(
        store.clone(),
        Duration::from_secs(settings.session.cleanup_interval_secs.max(1)),
    );

    let users = UserService::new(Arc::new(PgUserRepository::new(pool.clone())));
    let snippets = SnippetService::new(Arc::new(PgSnippetRepository::new(pool)));
    let state = Application::new(users, snippets);
    let session = SessionOptions::new(
        settings.session.secret.as_deref(),
        settings.session.secure_cookie,
        settings.session.lifetime_hours,
    );

    let address = settings.application.address();
    tracing::info!(%address, "starting server");

    HttpServer::new(move || build_app(state.clone(), session.clone(), store.clone()))
        .client_request_timeout(Duration::from_secs(3))
        .keep_alive(Duration::from_secs(60))
        .shutdown_timeout(10)
        .bind(&address)
        .with_context(|| format!("failed to bind {address}"))?
        .run()
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

/// Periodically drops expired rows from the `sessions` table.
fn spawn_session_cleanup(store: PgSessionStore, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.delete_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "deleted expired sessions"),
                Err(err) => tracing::warn!(error = %err, "failed to delete expired sessions"),
            }
        }
    });
}
