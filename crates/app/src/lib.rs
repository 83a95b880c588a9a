//! Wiring for the orders data layer.
//!
//! Chooses a store from configuration, prepares its schema and seeds sample
//! data into an empty store. [`OrderService`] offers the day-to-day operations
//! on top of any [`OrdersStore`].

pub mod config;
pub mod error;
pub mod seed;
pub mod service;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use seed::{SeedOutcome, SeedPlan};
pub use service::OrderService;

use sqlx::postgres::PgPoolOptions;
use store::{InMemoryOrdersStore, OrdersStore, PostgresOrdersStore, StoreCounts, StoreError};

/// Opens the store named by the configuration.
///
/// With a `database_url` this connects to PostgreSQL and applies pending
/// migrations; otherwise it returns an empty in-memory store.
pub async fn connect(config: &Config) -> Result<Box<dyn OrdersStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set, using in-memory store");
        return Ok(Box::new(InMemoryOrdersStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .map_err(StoreError::from)?;

    let store = PostgresOrdersStore::new(pool);
    store.run_migrations().await?;
    tracing::info!(
        max_connections = config.max_connections,
        "connected to PostgreSQL"
    );

    Ok(Box::new(store))
}

/// Seeds the store when enabled and returns the resulting row counts.
#[tracing::instrument(skip_all, fields(seed = config.seed_on_startup))]
pub async fn bootstrap<S: OrdersStore + ?Sized>(store: &S, config: &Config) -> Result<StoreCounts> {
    if config.seed_on_startup {
        seed::initialize(store, &SeedPlan::default()).await?;
    }
    Ok(store.counts().await?)
}
