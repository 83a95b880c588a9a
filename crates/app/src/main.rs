//! Bootstrap entry point: prepares the store and seeds sample data.

use app::Config;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> app::Result<()> {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Open the store
    let store = app::connect(&config).await?;

    // 3. Seed and report
    let counts = app::bootstrap(store.as_ref(), &config).await?;
    tracing::info!(
        users = counts.users,
        orders = counts.orders,
        products = counts.products,
        "store ready"
    );

    Ok(())
}
