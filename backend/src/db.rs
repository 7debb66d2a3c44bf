use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError};
use diesel::sqlite::SqliteConnection;
use log::{error, info};
use thiserror::Error;

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

pub const CREATE_PROPERTIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    bedrooms INTEGER NOT NULL,
    kitchens INTEGER NOT NULL,
    living_rooms INTEGER NOT NULL,
    toilets INTEGER NOT NULL,
    price REAL NOT NULL,
    address TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('available', 'under_construction', 'occupied')),
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Pool(#[from] PoolError),
    #[error("{0}")]
    Query(#[from] diesel::result::Error),
    #[error("database worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        diesel::sql_query("PRAGMA busy_timeout = 5000")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;
        diesel::sql_query("PRAGMA foreign_keys = ON")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;
        Ok(())
    }
}

/// Owns the connection pool. Every unit of work runs on the blocking thread
/// pool so only the calling request waits on SQLite.
#[derive(Clone)]
pub struct StoreGateway {
    pool: SqlitePool,
}

impl StoreGateway {
    pub fn connect(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        info!("Opening database: {}", database_url);
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let builder = Pool::builder().connection_customizer(Box::new(SqlitePragmas));

        // Each connection to `:memory:` is its own database, so keep exactly one alive.
        let builder = if database_url == ":memory:" {
            builder.max_size(1).idle_timeout(None).max_lifetime(None)
        } else {
            builder.max_size(pool_size.max(1))
        };

        let pool = builder.build(manager).map_err(|e| {
            error!("Failed to build connection pool: {}", e);
            e
        })?;

        let gateway = Self { pool };
        gateway.init_schema()?;
        Ok(gateway)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::connect(":memory:", 1)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.get()?;
        diesel::sql_query(CREATE_PROPERTIES_TABLE).execute(&mut conn)?;
        info!("Properties table ready");
        Ok(())
    }

    /// Runs `work` with a pooled connection on a blocking worker thread.
    pub async fn run<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, diesel::result::Error> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            work(&mut conn).map_err(StoreError::from)
        })
        .await?
    }

    pub async fn ping(&self) -> Result<i32, StoreError> {
        self.run(|conn| {
            diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("1")).get_result(conn)
        })
        .await
    }
}
