//! Connection opening.
//!
//! The registry core never opens connections itself; it delegates to a
//! [`Connector`], the injectable strategy for "open a handle given an
//! engine configuration". The bundled [`SqlxConnector`] covers MySQL,
//! PostgreSQL and SQLite through sqlx driver-specific pools. Hosts with
//! other engines (notably SQL Server, for which sqlx ships no driver)
//! supply their own implementation.

use crate::config::{ChannelOptions, ChannelSpec, EngineConfig};
use crate::driver::Driver;
use crate::error::{ChannelError, ChannelResult};
use crate::trace::{QueryEvent, QueryTracer, ROWS_UNKNOWN};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{MySqlPool, PgPool, SqlitePool};
use std::future::Future;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const STATEMENT_CACHE_CAPACITY: usize = 100;

/// Strategy for opening a channel's connection handle.
///
/// Invoked at most once per channel, from inside the channel's
/// single-flight initialization. The tracer passed in is the channel's
/// statement observer; implementations attach it to the handle they
/// produce.
pub trait Connector: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    fn connect(
        &self,
        spec: &ChannelSpec,
        tracer: QueryTracer,
    ) -> impl Future<Output = ChannelResult<Self::Handle>> + Send;
}

/// Driver-specific connection pool (avoids AnyPool limitations).
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    pub fn driver(&self) -> Driver {
        match self {
            Self::MySql(_) => Driver::MySql,
            Self::Postgres(_) => Driver::Postgres,
            Self::Sqlite(_) => Driver::Sqlite,
        }
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        match self {
            Self::MySql(pool) => pool.close().await,
            Self::Postgres(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
    }

    async fn execute(&self, sql: &str) -> Result<u64, sqlx::Error> {
        match self {
            Self::MySql(pool) => sqlx::query(sql)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Self::Postgres(pool) => sqlx::query(sql)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Self::Sqlite(pool) => sqlx::query(sql)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
    }
}

/// The ready-to-use connection object handed to callers: a pool with the
/// channel's tracer and behavioral flags attached.
///
/// Flags without an sqlx counterpart (`skip_default_transaction`,
/// `disable_nested_transaction`, `allow_global_update`,
/// `ignore_relationships_when_migrating`, `translate_error`) are carried
/// verbatim for the host's data layer to honor.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pool: DbPool,
    tracer: QueryTracer,
    options: ChannelOptions,
}

impl ConnectionHandle {
    pub fn new(pool: DbPool, tracer: QueryTracer, options: ChannelOptions) -> Self {
        Self {
            pool,
            tracer,
            options,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// The statement observer attached to this handle. Callers running
    /// queries directly against [`ConnectionHandle::pool`] report their
    /// events here.
    pub fn tracer(&self) -> &QueryTracer {
        &self.tracer
    }

    pub fn options(&self) -> ChannelOptions {
        self.options
    }

    pub fn driver(&self) -> Driver {
        self.pool.driver()
    }

    /// Execute a statement, timing it and routing the outcome through the
    /// tracer.
    pub async fn execute(&self, sql: &str) -> ChannelResult<u64> {
        let start = Instant::now();
        let result = self.pool.execute(sql).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(rows) => self
                .tracer
                .trace(QueryEvent::new(elapsed, *rows as i64, sql, None)),
            Err(err) => self
                .tracer
                .trace(QueryEvent::new(elapsed, ROWS_UNKNOWN, sql, Some(err))),
        }

        result.map_err(ChannelError::from)
    }
}

/// The bundled sqlx-backed connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

impl SqlxConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for SqlxConnector {
    type Handle = ConnectionHandle;

    async fn connect(
        &self,
        spec: &ChannelSpec,
        tracer: QueryTracer,
    ) -> ChannelResult<ConnectionHandle> {
        debug!(
            channel = %spec.name,
            driver = %spec.driver(),
            dsn = %spec.engine.masked_dsn(),
            "opening connection pool"
        );
        let pool = open_pool(spec).await?;
        Ok(ConnectionHandle::new(pool, tracer, spec.options))
    }
}

fn statement_cache(prepare_stmt: bool) -> usize {
    if prepare_stmt { STATEMENT_CACHE_CAPACITY } else { 0 }
}

async fn open_pool(spec: &ChannelSpec) -> ChannelResult<DbPool> {
    let options = &spec.options;

    match &spec.engine {
        EngineConfig::MySql(cfg) => {
            let connect = MySqlConnectOptions::from_str(&cfg.dsn)
                .map_err(|e| {
                    ChannelError::connection(&spec.name, format!("invalid MySQL DSN: {e}"))
                })?
                .charset("utf8mb4")
                .statement_cache_capacity(statement_cache(options.prepare_stmt));

            let pool = MySqlPoolOptions::new()
                .max_connections(DEFAULT_MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .test_before_acquire(!options.disable_automatic_ping)
                .connect_with(connect)
                .await
                .map_err(|e| ChannelError::connection(&spec.name, e.to_string()))?;
            Ok(DbPool::MySql(pool))
        }
        EngineConfig::Postgres(cfg) => {
            // Capacity zero keeps sqlx on unnamed statements, the closest
            // sqlx gets to the simple query protocol.
            let cache = if cfg.prefer_simple_protocol {
                0
            } else {
                statement_cache(options.prepare_stmt)
            };
            let connect = PgConnectOptions::from_str(&cfg.dsn)
                .map_err(|e| {
                    ChannelError::connection(&spec.name, format!("invalid PostgreSQL DSN: {e}"))
                })?
                .statement_cache_capacity(cache);

            let pool = PgPoolOptions::new()
                .max_connections(DEFAULT_MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .test_before_acquire(!options.disable_automatic_ping)
                .connect_with(connect)
                .await
                .map_err(|e| ChannelError::connection(&spec.name, e.to_string()))?;
            Ok(DbPool::Postgres(pool))
        }
        EngineConfig::Sqlite(cfg) => {
            let connect = SqliteConnectOptions::from_str(&cfg.dsn)
                .map_err(|e| {
                    ChannelError::connection(&spec.name, format!("invalid SQLite DSN: {e}"))
                })?
                .create_if_missing(true)
                .foreign_keys(!options.disable_foreign_key_constraint_when_migrating)
                .statement_cache_capacity(statement_cache(options.prepare_stmt));

            let pool = SqlitePoolOptions::new()
                .max_connections(DEFAULT_MAX_CONNECTIONS_SQLITE)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .test_before_acquire(!options.disable_automatic_ping)
                .connect_with(connect)
                .await
                .map_err(|e| ChannelError::connection(&spec.name, e.to_string()))?;
            Ok(DbPool::Sqlite(pool))
        }
        EngineConfig::SqlServer(_) => Err(ChannelError::connection(
            &spec.name,
            "no SQL Server driver is bundled; supply a custom Connector for sqlserver channels",
        )),
    }
}
