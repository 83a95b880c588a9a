//! Application configuration loaded from environment variables.

/// Bootstrap configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL` — PostgreSQL connection string (default: unset, use the in-memory store)
/// - `DATABASE_MAX_CONNECTIONS` — pool size (default: `5`)
/// - `SEED_ON_STARTUP` — seed an empty store (default: `true`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub seed_on_startup: bool,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.max_connections),
            seed_on_startup: lookup("SEED_ON_STARTUP")
                .and_then(|flag| parse_flag(&flag))
                .unwrap_or(defaults.seed_on_startup),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            seed_on_startup: true,
            log_level: "info".to_string(),
        }
    }
}
