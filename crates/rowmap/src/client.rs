//! Generic client trait for unified database access.

use crate::error::OrmResult;
use crate::row::SqlRow;
use crate::value::Value;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    /// Attach the id the driver reported for the last inserted row.
    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Id of the last inserted row, if the driver reports one.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}

/// A trait over database connections.
///
/// Statements arrive fully rendered for the handle's dialect together with their positional
/// arguments. Implementations decode result columns into [`Value`]s.
pub trait GenericClient: Send + Sync {
    /// Execute a statement and report affected rows (and the inserted id, when known).
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send;

    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<SqlRow>>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// Semantics:
    /// - 0 rows: returns `Ok(None)`
    /// - 1 row: returns `Ok(Some(row))`
    /// - multiple rows: returns `Ok(Some(first_row))` (does **not** error)
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Option<SqlRow>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Best-effort cancellation of the statement currently running on this connection.
    ///
    /// Called when a deadline or cancellation token fires. The default does nothing.
    fn cancel_in_flight(&self) {}
}

impl<C: GenericClient> GenericClient for &C {
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send {
        (**self).execute(sql, params)
    }

    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<SqlRow>>> + Send {
        (**self).query(sql, params)
    }

    fn cancel_in_flight(&self) {
        (**self).cancel_in_flight()
    }
}
