//! SQL logging sinks.
//!
//! Every statement a [`Db`](crate::Db) sends is handed to its [`SqlLogger`] right before
//! execution, including transaction control statements.

use crate::value::Value;
use tracing::Level;

/// Receives the SQL text and arguments of each statement before it runs.
pub trait SqlLogger: Send + Sync {
    fn log(&self, sql: &str, params: &[Value]);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl SqlLogger for NoopLogger {
    fn log(&self, _sql: &str, _params: &[Value]) {}
}

/// The default sink: one `tracing` event per statement on target `rowmap.sql`, carrying the
/// SQL text, the argument count and the arguments.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    pub level: Level,
    /// Byte budget for the SQL field; longer statements are cut and end in `...`.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingLogger {
    /// `DEBUG` events, SQL cut after 200 bytes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Cut logged SQL after `len` bytes.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log statements in full.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

impl SqlLogger for TracingLogger {
    fn log(&self, sql: &str, params: &[Value]) {
        // `tracing` macros take the level as a constant.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.level,
            target: "rowmap.sql",
            param_count = params.len(),
            params = ?params,
            sql = %sql,
        );
    }
}

/// Cut `sql` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
        assert_eq!(truncate_sql_bytes("éé", 3), "é");
    }

    #[test]
    fn long_sql_gets_ellipsis() {
        let logger = TracingLogger::new().max_sql_length(6);
        assert_eq!(logger.truncate_sql("SELECT 1"), "SELECT...");
        let logger = TracingLogger::new().no_truncate();
        assert_eq!(logger.truncate_sql("SELECT 1"), "SELECT 1");
    }
}
