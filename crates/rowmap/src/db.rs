//! The [`Db`] handle: record operations over a [`GenericClient`].
//!
//! ```ignore
//! use rowmap::{Db, SqliteClient, named};
//!
//! let db = Db::new(SqliteClient::open_in_memory()?);
//! db.create_table(&Company::default()).await?;
//!
//! let mut ibm = Company { name: "IBM".into(), ticker: "IBM".into(), ..Default::default() };
//! if let Some(key) = db.insert(&ibm).await? {
//!     ibm.id = key.value.as_i64().unwrap_or_default();
//! }
//!
//! let others: Vec<Company> = db
//!     .select("WHERE ticker != @ticker", &[named("ticker", "IBM")])
//!     .await?;
//! ```

use crate::client::{ExecResult, GenericClient};
use crate::column::Col;
use crate::config::{DbConfig, StmtOptions};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::log::{SqlLogger, TracingLogger};
use crate::named::{self, NamedArg};
use crate::pk;
use crate::row::{Record, RowConfig, SqlRow};
use crate::stmt::{self, Statement};
use crate::value::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A database handle carrying the dialect, the parameter prefix and an SQL logger.
///
/// Every operation has a `*_with` variant taking [`StmtOptions`] for a deadline or a
/// cancellation token.
pub struct Db<C> {
    client: C,
    config: DbConfig,
    logger: Arc<dyn SqlLogger>,
}

impl<C: std::fmt::Debug> std::fmt::Debug for Db<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: GenericClient> Db<C> {
    /// Wrap a client with the default configuration (SQLite, `@`, [`TracingLogger`]).
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: DbConfig::default(),
            logger: Arc::new(TracingLogger::new()),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: DbConfig) -> OrmResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = dialect;
        self
    }

    /// Change the character introducing symbolic parameters.
    pub fn with_param_prefix(self, prefix: char) -> OrmResult<Self> {
        let config = self.config.param_prefix(prefix);
        self.with_config(config)
    }

    /// Replace the SQL logger.
    pub fn with_logger(mut self, logger: impl SqlLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Settings records receive when they build their rows.
    pub fn row_config(&self) -> RowConfig {
        RowConfig::new(self.config.dialect)
    }

    // ==================== Execution ====================

    /// Await `fut` under the deadline and cancellation token of `opts`.
    async fn guarded<T, F>(&self, opts: &StmtOptions, fut: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>>,
    {
        if opts.timeout.is_none() && opts.cancel.is_none() {
            return fut.await;
        }
        if opts.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(OrmError::Cancelled);
        }

        let cancelled = async {
            match &opts.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let deadline = async {
            match opts.timeout {
                Some(timeout) => {
                    tokio::time::sleep(timeout).await;
                    timeout
                }
                None => std::future::pending::<Duration>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => {
                self.client.cancel_in_flight();
                Err(OrmError::Cancelled)
            }
            timeout = deadline => {
                self.client.cancel_in_flight();
                Err(OrmError::Timeout(timeout))
            }
            result = fut => result,
        }
    }

    pub(crate) async fn exec(
        &self,
        sql: &str,
        args: &[Value],
        opts: &StmtOptions,
    ) -> OrmResult<ExecResult> {
        self.logger.log(sql, args);
        self.guarded(opts, self.client.execute(sql, args)).await
    }

    pub(crate) async fn fetch(
        &self,
        sql: &str,
        args: &[Value],
        opts: &StmtOptions,
    ) -> OrmResult<Vec<SqlRow>> {
        self.logger.log(sql, args);
        self.guarded(opts, self.client.query(sql, args)).await
    }

    pub(crate) async fn fetch_opt(
        &self,
        sql: &str,
        args: &[Value],
        opts: &StmtOptions,
    ) -> OrmResult<Option<SqlRow>> {
        self.logger.log(sql, args);
        self.guarded(opts, self.client.query_opt(sql, args)).await
    }

    async fn exec_statement(&self, st: &Statement, opts: &StmtOptions) -> OrmResult<ExecResult> {
        self.exec(&st.sql, &st.args, opts).await
    }

    /// Rewrite symbolic parameters of `sql` and bind them from `args`.
    fn compile_named(&self, sql: &str, args: &[NamedArg]) -> OrmResult<Statement> {
        let mut placeholders = self.config.dialect.placeholders();
        let compiled = named::compile(sql, self.config.param_prefix, &mut placeholders);
        let args = named::bind(&compiled.params, args)?;
        Ok(Statement {
            sql: compiled.sql,
            args,
        })
    }

    // ==================== Schema ====================

    /// Create the table of `rec` from its row.
    pub async fn create_table<R: Record>(&self, rec: &R) -> OrmResult<()> {
        self.create_table_with(rec, &StmtOptions::NONE).await
    }

    pub async fn create_table_with<R: Record>(&self, rec: &R, opts: &StmtOptions) -> OrmResult<()> {
        let sql = stmt::create_table(rec.table_name(), &rec.row(&self.row_config()))?;
        self.exec(&sql, &[], opts).await?;
        Ok(())
    }

    /// Drop the table of `rec`.
    pub async fn drop_table<R: Record>(&self, rec: &R) -> OrmResult<()> {
        self.drop_table_with(rec, &StmtOptions::NONE).await
    }

    pub async fn drop_table_with<R: Record>(&self, rec: &R, opts: &StmtOptions) -> OrmResult<()> {
        let sql = stmt::drop_table(rec.table_name())?;
        self.exec(&sql, &[], opts).await?;
        Ok(())
    }

    // ==================== Records ====================

    /// Insert `rec` and return its primary key column, with the value narrowed to the kind of
    /// the record's key.
    ///
    /// Returns `None` when the record has no primary key. A generated key is read back through
    /// `RETURNING`, the driver's last-insert-id or, failing both, a lookup on the inserted
    /// values.
    pub async fn insert<R: Record>(&self, rec: &R) -> OrmResult<Option<Col>> {
        self.insert_with(rec, &StmtOptions::NONE).await
    }

    pub async fn insert_with<R: Record>(
        &self,
        rec: &R,
        opts: &StmtOptions,
    ) -> OrmResult<Option<Col>> {
        let table = rec.table_name();
        let row = rec.row(&self.row_config());
        let st = stmt::insert(self.config.dialect, table, &row)?;

        if let Some(pk) = stmt::returning_key(self.config.dialect, &row) {
            let returned = self.fetch_opt(&st.sql, &st.args, opts).await?;
            if pk.skip_on_insert() {
                return pk::from_returned(pk, returned).map(Some);
            }
            return Ok(Some(pk.clone()));
        }

        let result = self.exec_statement(&st, opts).await?;
        pk::resolve(self, table, &row, &result, opts).await
    }

    /// Load the record addressed by the primary key of `rec` into `rec`.
    pub async fn get<R: Record>(&self, rec: &mut R) -> OrmResult<()> {
        self.get_with(rec, &StmtOptions::NONE).await
    }

    pub async fn get_with<R: Record>(&self, rec: &mut R, opts: &StmtOptions) -> OrmResult<()> {
        let st = stmt::get(
            self.config.dialect,
            rec.table_name(),
            &rec.row(&self.row_config()),
        )?;
        match self.fetch_opt(&st.sql, &st.args, opts).await? {
            Some(found) => rec.scan(&mut found.reader()),
            None => Err(missing(rec.table_name(), &st)),
        }
    }

    /// Overwrite every non-key column of the row addressed by the primary key of `rec`.
    ///
    /// Fails with `NotFound` when no row was changed.
    pub async fn update<R: Record>(&self, rec: &R) -> OrmResult<()> {
        self.update_with(rec, &StmtOptions::NONE).await
    }

    pub async fn update_with<R: Record>(&self, rec: &R, opts: &StmtOptions) -> OrmResult<()> {
        let st = stmt::update(
            self.config.dialect,
            rec.table_name(),
            &rec.row(&self.row_config()),
        )?;
        let result = self.exec_statement(&st, opts).await?;
        if result.rows_affected() == 0 {
            return Err(missing(rec.table_name(), &st));
        }
        Ok(())
    }

    /// Delete the row addressed by the primary key of `rec` and return the number of rows
    /// removed.
    pub async fn delete<R: Record>(&self, rec: &R) -> OrmResult<u64> {
        self.delete_with(rec, &StmtOptions::NONE).await
    }

    pub async fn delete_with<R: Record>(&self, rec: &R, opts: &StmtOptions) -> OrmResult<u64> {
        let st = stmt::delete(
            self.config.dialect,
            rec.table_name(),
            &rec.row(&self.row_config()),
        )?;
        Ok(self.exec_statement(&st, opts).await?.rows_affected())
    }

    /// Select all records matching `clause` (e.g. `WHERE ticker = @ticker ORDER BY id`).
    ///
    /// Symbolic parameters in the clause are bound from `args`; an argument list with names the
    /// clause never uses is fine.
    pub async fn select<T>(&self, clause: &str, args: &[NamedArg]) -> OrmResult<Vec<T>>
    where
        T: Record + Default,
    {
        self.select_with(T::default, clause, args, &StmtOptions::NONE)
            .await
    }

    /// Like [`Db::select`], building each record with `factory`.
    pub async fn select_with<T, F>(
        &self,
        factory: F,
        clause: &str,
        args: &[NamedArg],
        opts: &StmtOptions,
    ) -> OrmResult<Vec<T>>
    where
        T: Record,
        F: Fn() -> T,
    {
        let st = {
            let probe = factory();
            let row = probe.row(&self.row_config());
            if row.is_empty() {
                return Err(OrmError::NoUnmarshalTarget(format!(
                    "records of table '{}' expose no columns to scan into",
                    probe.table_name()
                )));
            }
            let sql = stmt::select(probe.table_name(), &row, clause)?;
            self.compile_named(&sql, args)?
        };

        let rows = self.fetch(&st.sql, &st.args, opts).await?;
        let mut out = Vec::with_capacity(rows.len());
        for found in &rows {
            let mut rec = factory();
            rec.scan(&mut found.reader())?;
            out.push(rec);
        }
        Ok(out)
    }

    // ==================== Raw SQL ====================

    /// Run a statement with symbolic parameters and return the number of rows affected.
    pub async fn execute_named(&self, sql: &str, args: &[NamedArg]) -> OrmResult<u64> {
        self.execute_named_with(sql, args, &StmtOptions::NONE)
            .await
    }

    pub async fn execute_named_with(
        &self,
        sql: &str,
        args: &[NamedArg],
        opts: &StmtOptions,
    ) -> OrmResult<u64> {
        let st = self.compile_named(sql, args)?;
        Ok(self.exec_statement(&st, opts).await?.rows_affected())
    }

    /// Run a query with symbolic parameters and return the raw rows.
    pub async fn query_named(&self, sql: &str, args: &[NamedArg]) -> OrmResult<Vec<SqlRow>> {
        self.query_named_with(sql, args, &StmtOptions::NONE).await
    }

    pub async fn query_named_with(
        &self,
        sql: &str,
        args: &[NamedArg],
        opts: &StmtOptions,
    ) -> OrmResult<Vec<SqlRow>> {
        let st = self.compile_named(sql, args)?;
        self.fetch(&st.sql, &st.args, opts).await
    }
}

fn missing(table: &str, st: &Statement) -> OrmError {
    let key = st.args.last().cloned().unwrap_or(Value::Null);
    OrmError::not_found(format!("{table}: no row with primary key {key:?}"))
}

#[cfg(test)]
mod tests;
