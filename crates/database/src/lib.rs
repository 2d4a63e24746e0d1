use std::env;
use std::error::Error;
use std::time::Duration;

pub mod directions;
pub mod error;
pub mod programs;
pub mod tasks;

pub use directions::DirectionCache;
pub use error::DatabaseError;
pub use programs::ProgramRepository;
pub use tasks::TaskStore;

/// Postgres connection parameters, read from the environment one var per DSN
/// component rather than a single `DATABASE_URL` (`DATABASE_USER`/
/// `DATABASE_PASSWORD`/`DATABASE_HOST`/`DATABASE_PORT`/`DATABASE_NAME`).
pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

/// The one Postgres connection pool, shared by the direction cache, program
/// repository, and task store. Connects and migrates on startup.
#[derive(Clone)]
pub struct PgDatabase {
    pool: sqlx::PgPool,
}

impl PgDatabase {
    pub async fn connect(info: DatabaseConnectionInfo) -> Result<Self, Box<dyn Error>> {
        let url = info.postgres_url();
        let pool = sqlx::postgres::PgPool::connect(&url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn directions(&self, ttl: Duration) -> DirectionCache {
        DirectionCache::new(self.pool.clone(), ttl)
    }

    pub fn programs(&self) -> ProgramRepository {
        ProgramRepository::new(self.pool.clone())
    }

    pub fn tasks(&self) -> TaskStore {
        TaskStore::new(self.pool.clone())
    }

    /// Best-effort reaper for expired direction-cache entries: a periodic
    /// delete, since this store has no native TTL index feature.
    pub async fn reap_expired_directions(&self, ttl: Duration) -> Result<u64, sqlx::Error> {
        let cutoff = chrono::Utc::now() - chrono::Duration::from_std(ttl).unwrap_or_default();
        let result = sqlx::query("DELETE FROM directions WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
