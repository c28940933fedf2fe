use std::sync::Arc;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tokio::sync::OnceCell;

mod error;

pub use error::StoreError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Shared handle to the relational store.
///
/// The pool is created lazily by the first request that needs it. Concurrent
/// early callers all wait on the same initialization; a failed attempt is not
/// remembered, so the next request tries again.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    pool_size: u32,
    pool: OnceCell<PgPool>,
}

impl Database {
    pub fn new(url: impl Into<String>, pool_size: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                pool_size,
                pool: OnceCell::new(),
            }),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.pool.initialized()
    }

    pub async fn pool(&self) -> Result<&PgPool, StoreError> {
        self.inner
            .pool
            .get_or_try_init(|| async {
                let url = self.inner.url.clone();
                let pool_size = self.inner.pool_size;
                tokio::task::spawn_blocking(move || connect(&url, pool_size)).await?
            })
            .await
    }

    /// Runs blocking diesel work on a pooled connection.
    pub async fn run<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let pool = self.pool().await?.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(StoreError::from)?;
            f(&mut conn)
        })
        .await
        .map_err(StoreError::from)?
    }
}

fn connect(url: &str, pool_size: u32) -> Result<PgPool, StoreError> {
    log::info!("Initializing database pool (max {} connections)", pool_size);
    let pool = Pool::builder()
        .max_size(pool_size)
        .build(ConnectionManager::<PgConnection>::new(url))?;
    let mut conn = pool.get()?;
    let conn: &mut PgConnection = &mut conn;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| StoreError::Migration(err.to_string()))?;
    for migration in &applied {
        log::info!("Applied migration {}", migration);
    }
    log::info!("Database connection established successfully");
    Ok(pool)
}
