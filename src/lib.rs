//! Named database channel registry.
//!
//! A *channel* is a named, independently configured database connection
//! slot. The registry is built once from configuration, resolves each
//! channel to a driver (MySQL, PostgreSQL, SQL Server, SQLite) by fixed
//! precedence, and opens each channel's connection handle lazily, exactly
//! once, however many callers race for it. Every executed statement is
//! classified into a leveled, structured log record.
//!
//! ```no_run
//! use db_channels::ChannelRegistry;
//!
//! # async fn run() -> Result<(), db_channels::ChannelError> {
//! let config = serde_json::from_str(
//!     r#"{ "default": { "sqlite": { "dsn": "sqlite:app.db" } } }"#,
//! )
//! .expect("valid config");
//!
//! let registry = ChannelRegistry::from_config(config)?;
//! let handle = registry.get("default").await?;
//! handle.execute("CREATE TABLE IF NOT EXISTS t (id INTEGER)").await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod connect;
pub mod driver;
pub mod error;
pub mod registry;
pub mod resolve;
pub mod trace;

pub use channel::Channel;
pub use config::{
    ChannelOptions, ChannelSection, ChannelSpec, EngineConfig, MySqlConfig, PostgresConfig,
    RegistryConfig, SqlServerConfig, SqliteConfig,
};
pub use connect::{ConnectionHandle, Connector, DbPool, SqlxConnector};
pub use driver::{DRIVER_ORDER, Driver};
pub use error::{ChannelError, ChannelResult};
pub use registry::ChannelRegistry;
pub use trace::{QueryEvent, QueryTracer, ROWS_UNKNOWN, SLOW_QUERY_THRESHOLD, Severity, severity};
