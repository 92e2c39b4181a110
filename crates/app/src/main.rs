use std::{sync::Arc, time::Duration};

use migration::{Migrator, MigratorTrait};
use server::{
    Frankfurter, IdentityProvider, RateCache, RateProvider, ServerState, StaticIdentity,
    SupabaseIdentity,
};
use settings::{Database, Identity};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "utility_tracker={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let types = engine::TypeSet::new(&settings.entries.types)?;
    tracing::info!("accepted utility types: {types}");

    let mut builder = engine::Engine::builder();
    match &settings.server.database {
        Some(config) => match open_database(config).await {
            Ok(db) => builder = builder.database(db),
            Err(err) => tracing::error!(
                "failed to initialize database, store routes will answer 503: {err}"
            ),
        },
        None => tracing::warn!("no database configured, store routes will answer 503"),
    }
    let engine = Arc::new(builder.build().await?);

    let identity: Option<Arc<dyn IdentityProvider>> = match settings.identity {
        Some(Identity::Supabase {
            supabase_url,
            service_role_key,
        }) => {
            tracing::info!("Found supabase identity settings...");
            Some(Arc::new(SupabaseIdentity::new(&supabase_url, &service_role_key)?))
        }
        Some(Identity::Static) => {
            tracing::warn!("using in-memory identity provider, accounts are lost on restart");
            Some(Arc::new(StaticIdentity::new()))
        }
        None => {
            tracing::warn!("no identity provider configured, authenticated routes will answer 503");
            None
        }
    };

    let frankfurter = Frankfurter::new(&settings.rates.base_url)?;
    let rates: Arc<dyn RateProvider> = Arc::new(RateCache::new(
        Arc::new(frankfurter),
        Duration::from_secs(settings.rates.max_age_secs),
    ));

    let state = ServerState {
        engine: engine.clone(),
        identity,
        rates,
        types: Arc::new(types),
    };

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    server::run_with_listener(state, listener, shutdown_signal()).await?;

    engine.close().await?;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested, draining connections");
}

async fn open_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
