//! `AppConfig::from_env()` — every environment variable this service reads,
//! with its documented default. Grounded on
//! `database::DatabaseConnectionInfo::from_env()`'s `env::var(..).ok()?`
//! chaining style; unlike that constructor this one never fails outright
//! since every field but the database DSN and the Google Maps key has a
//! usable default.

use std::time::Duration;

use database::DatabaseConnectionInfo;
use scheduling::executor::ExecutorConfig;
use scheduling::DefaultTimings;

pub struct AppConfig {
    pub database: DatabaseConnectionInfo,
    pub direction_cache_ttl: Duration,
    pub google_maps_api_key: String,
    pub port: u16,
    pub defaults: DefaultTimings,
    pub executor: ExecutorConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConnectionInfo::from_env()
                .expect("DATABASE_USER/PASSWORD/HOST/PORT/NAME must be set"),
            direction_cache_ttl: Duration::from_secs(read_env("DIRECTION_CACHE_TTL_SECONDS", 3600)),
            google_maps_api_key: std::env::var("GOOGLE_MAPS_API_KEY")
                .expect("GOOGLE_MAPS_API_KEY must be set"),
            port: read_env("PORT", 8000),
            defaults: DefaultTimings::from_env(),
            executor: ExecutorConfig::from_env(),
        }
    }
}

fn read_env<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(fallback)
}
