//! Query trace classification.
//!
//! Every executed statement produces one [`QueryEvent`]; the tracer turns
//! it into at most one leveled, structured log record. Severity follows a
//! first-match precedence: a real error wins, then a slow statement, then
//! plain info. `RowNotFound` is a benign outcome and never reaches the
//! error branch. When a level is disabled the event falls through to the
//! next rule rather than being dropped outright.

use crate::driver::Driver;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};

/// Statements slower than this (strictly greater) are classified as slow.
pub const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(200);

/// Row count value meaning "unknown / not applicable".
pub const ROWS_UNKNOWN: i64 = -1;

/// One statement execution observation.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvent<'a> {
    pub elapsed: Duration,
    /// Affected or returned row count; [`ROWS_UNKNOWN`] when the driver
    /// cannot tell.
    pub rows: i64,
    pub sql: &'a str,
    pub error: Option<&'a sqlx::Error>,
    /// Call site that issued the statement.
    pub caller: &'static Location<'static>,
}

impl<'a> QueryEvent<'a> {
    /// Build an event, capturing the caller's location.
    #[track_caller]
    pub fn new(elapsed: Duration, rows: i64, sql: &'a str, error: Option<&'a sqlx::Error>) -> Self {
        Self {
            elapsed,
            rows,
            sql,
            error,
            caller: Location::caller(),
        }
    }
}

/// Log level an event classifies to, before level-enablement gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warn,
    Info,
}

/// Classify an event. First matching rule wins:
/// a real (non-`RowNotFound`) error, then elapsed strictly above
/// [`SLOW_QUERY_THRESHOLD`], then info.
pub fn severity(event: &QueryEvent<'_>) -> Severity {
    match event.error {
        Some(err) if !is_record_not_found(err) => Severity::Error,
        _ if event.elapsed > SLOW_QUERY_THRESHOLD => Severity::Warn,
        _ => Severity::Info,
    }
}

/// Whether the error is the benign "no matching record" outcome.
pub fn is_record_not_found(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::RowNotFound)
}

fn rows_display(rows: i64) -> String {
    if rows == ROWS_UNKNOWN {
        "-".to_string()
    } else {
        rows.to_string()
    }
}

/// Per-channel statement observer. Every record it emits carries the
/// (channel, driver) scope as structured fields.
#[derive(Debug, Clone)]
pub struct QueryTracer {
    channel: Arc<str>,
    driver: Driver,
}

impl QueryTracer {
    pub fn new(channel: &str, driver: Driver) -> Self {
        Self {
            channel: Arc::from(channel),
            driver,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Emit at most one record for the event.
    ///
    /// An error event whose level is disabled still gets a chance at the
    /// slow-query and info rules, matching the classification precedence.
    pub fn trace(&self, event: QueryEvent<'_>) {
        let elapsed_ms = event.elapsed.as_secs_f64() * 1e3;

        let real_error = event.error.filter(|e| !is_record_not_found(e));
        if let Some(err) = real_error.filter(|_| tracing::enabled!(Level::ERROR)) {
            error!(
                channel = %self.channel,
                driver = %self.driver,
                elapsed_ms,
                rows = %rows_display(event.rows),
                sql = %event.sql,
                error = %err,
                caller = %event.caller,
                "query failed"
            );
            return;
        }

        if event.elapsed > SLOW_QUERY_THRESHOLD && tracing::enabled!(Level::WARN) {
            warn!(
                channel = %self.channel,
                driver = %self.driver,
                slow_threshold_ms = SLOW_QUERY_THRESHOLD.as_millis() as u64,
                elapsed_ms,
                rows = %rows_display(event.rows),
                sql = %event.sql,
                caller = %event.caller,
                "slow query"
            );
            return;
        }

        if tracing::enabled!(Level::INFO) {
            info!(
                channel = %self.channel,
                driver = %self.driver,
                elapsed_ms,
                rows = %rows_display(event.rows),
                sql = %event.sql,
                caller = %event.caller,
                "query executed"
            );
        }
    }
}
