use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wingman_api::{app, AppState, SearchSettings};
use wingman_core::search::SearchDefaults;
use wingman_providers::{AmadeusClient, TravelImpactClient};
use wingman_store::{app_config::Config, DbClient, PostgresFlightRepository, PostgresUserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wingman_api=debug,wingman_providers=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Wingman API on port {}", config.server.port);

    // Database
    let db = DbClient::new(config.database.url.expose(), config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    // Providers
    let amadeus = Arc::new(
        AmadeusClient::new(
            &config.amadeus.base_url,
            &config.amadeus.client_id,
            config.amadeus.client_secret.clone(),
            Duration::from_secs(config.amadeus.timeout_seconds),
        )
        .context("Failed to build Amadeus client")?,
    );
    let travel_impact = Arc::new(
        TravelImpactClient::new(
            &config.travel_impact.base_url,
            config.travel_impact.api_key.clone(),
            Duration::from_secs(config.travel_impact.timeout_seconds),
        )
        .context("Failed to build Travel Impact Model client")?,
    );

    let app_state = AppState {
        flight_repo: Arc::new(PostgresFlightRepository::new(db.pool.clone())),
        user_repo: Arc::new(PostgresUserRepository::new(db.pool.clone())),
        offers: amadeus.clone(),
        schedules: amadeus,
        emissions: travel_impact,
        search: SearchSettings {
            defaults: SearchDefaults {
                currency: config.search.default_currency.clone(),
                max_results: config.search.max_results,
            },
            enrich_emissions: config.search.enrich_emissions,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
