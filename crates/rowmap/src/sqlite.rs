//! SQLite driver backed by `rusqlite`.
//!
//! Statements run on tokio's blocking pool, one at a time per connection. Each call owns a
//! guard: when the caller stops waiting (deadline, cancellation token, or a dropped future), a
//! call that has not reached the connection yet is skipped, and a call whose statement is
//! running is interrupted. Statements of other calls keep running.

use crate::client::{ExecResult, GenericClient};
use crate::error::{OrmError, OrmResult};
use crate::row::SqlRow;
use crate::value::Value;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, InterruptHandle, params_from_iter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A single SQLite connection usable as a [`GenericClient`].
pub struct SqliteClient {
    conn: Arc<Mutex<Connection>>,
    running: Arc<Running>,
    next_call: AtomicU64,
    report_last_insert_id: bool,
}

impl std::fmt::Debug for SqliteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteClient")
            .field("report_last_insert_id", &self.report_last_insert_id)
            .finish_non_exhaustive()
    }
}

/// The call whose statement currently holds the connection.
struct Running {
    call: Mutex<Option<u64>>,
    interrupt: InterruptHandle,
}

impl Running {
    fn lock(&self) -> MutexGuard<'_, Option<u64>> {
        self.call.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Worker side of one call.
struct Slot {
    id: u64,
    abandoned: Arc<AtomicBool>,
    running: Arc<Running>,
}

impl Slot {
    /// Claim the connection for this call. `false` once the caller has gone away.
    fn start(&self) -> bool {
        let mut current = self.running.lock();
        if self.abandoned.load(Ordering::Acquire) {
            return false;
        }
        *current = Some(self.id);
        true
    }

    fn finish(&self) {
        *self.running.lock() = None;
    }
}

/// Caller side of one call; dropping it abandons the call.
struct CallGuard {
    id: u64,
    abandoned: Arc<AtomicBool>,
    running: Arc<Running>,
}

impl CallGuard {
    fn slot(&self) -> Slot {
        Slot {
            id: self.id,
            abandoned: Arc::clone(&self.abandoned),
            running: Arc::clone(&self.running),
        }
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        let current = self.running.lock();
        self.abandoned.store(true, Ordering::Release);
        if *current == Some(self.id) {
            self.running.interrupt.interrupt();
        }
    }
}

impl SqliteClient {
    pub fn new(conn: Connection) -> Self {
        Self {
            running: Arc::new(Running {
                call: Mutex::new(None),
                interrupt: conn.get_interrupt_handle(),
            }),
            conn: Arc::new(Mutex::new(conn)),
            next_call: AtomicU64::new(1),
            report_last_insert_id: true,
        }
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Ok(Self::new(Connection::open(path)?))
    }

    /// Stop reporting the rowid of inserted rows, so generated keys are recovered by lookup.
    pub fn without_last_insert_id(mut self) -> Self {
        self.report_last_insert_id = false;
        self
    }

    async fn blocking<T, F>(&self, work: F) -> OrmResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> OrmResult<T> + Send + 'static,
    {
        let guard = CallGuard {
            id: self.next_call.fetch_add(1, Ordering::Relaxed),
            abandoned: Arc::new(AtomicBool::new(false)),
            running: Arc::clone(&self.running),
        };
        let slot = guard.slot();
        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| OrmError::Other("sqlite connection lock poisoned".into()))?;
            if !slot.start() {
                return Err(OrmError::Cancelled);
            }
            let result = work(&conn);
            slot.finish();
            result
        })
        .await
        .map_err(|e| OrmError::Other(format!("sqlite worker failed: {e}")))?;
        drop(guard);
        result
    }
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("insert"))
}

impl GenericClient for SqliteClient {
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send {
        let sql = sql.to_owned();
        let params = params.to_vec();
        let report = self.report_last_insert_id;
        self.blocking(move |conn| {
            let changed = conn.execute(&sql, params_from_iter(params.iter()))?;
            let result = ExecResult::new(changed as u64);
            if report && changed > 0 && is_insert(&sql) {
                return Ok(result.with_last_insert_id(conn.last_insert_rowid()));
            }
            Ok(result)
        })
    }

    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<SqlRow>>> + Send {
        let sql = sql.to_owned();
        let params = params.to_vec();
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(params_from_iter(params.iter()))?;

            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for idx in 0..columns.len() {
                    values.push(Value::from(row.get_ref(idx)?));
                }
                out.push(SqlRow::new(columns.clone(), values));
            }
            Ok(out)
        })
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;

        let out = match self {
            Value::Null => ToSqlOutput::Owned(Sql::Null),
            Value::Bool(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::I8(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::I16(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::I32(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::I64(v) => ToSqlOutput::Owned(Sql::Integer(*v)),
            Value::U8(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::U16(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::U32(v) => ToSqlOutput::Owned(Sql::Integer(i64::from(*v))),
            Value::U64(v) => {
                let v = i64::try_from(*v)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(Sql::Integer(v))
            }
            // Wider than SQLite's integers; stored in its decimal text form.
            Value::BigInt(v) => ToSqlOutput::Owned(Sql::Text(v.to_string())),
            Value::F64(v) => ToSqlOutput::Owned(Sql::Real(*v)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        };
        Ok(out)
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::I64(i),
            ValueRef::Real(r) => Value::F64(r),
            ValueRef::Text(items) => Value::Text(String::from_utf8_lossy(items).into_owned()),
            ValueRef::Blob(items) => Value::Bytes(items.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_insert_statements() {
        assert!(is_insert("INSERT INTO t DEFAULT VALUES"));
        assert!(is_insert("  insert into t (a) VALUES (?)"));
        assert!(!is_insert("UPDATE t SET a=?"));
        assert!(!is_insert("INS"));
    }

    #[tokio::test]
    async fn round_trips_values() {
        let client = SqliteClient::open_in_memory().unwrap();
        client
            .execute("CREATE TABLE t (a int, b varchar(255), c BLOB, d varchar(255))", &[])
            .await
            .unwrap();
        let res = client
            .execute(
                "INSERT INTO t (a,b,c,d) VALUES (?,?,?,?)",
                &[
                    Value::U16(7),
                    Value::from("x"),
                    Value::Bytes(vec![0, 1]),
                    Value::BigInt(100_000_000_000_000_000_000),
                ],
            )
            .await
            .unwrap();
        assert_eq!(res.rows_affected(), 1);
        assert_eq!(res.last_insert_id(), Some(1));

        let rows = client.query("SELECT a,b,c,d FROM t", &[]).await.unwrap();
        assert_eq!(rows[0].columns(), ["a", "b", "c", "d"]);
        assert_eq!(
            rows[0].values(),
            [
                Value::I64(7),
                Value::from("x"),
                Value::Bytes(vec![0, 1]),
                Value::from("100000000000000000000"),
            ]
        );
        assert_eq!(rows[0].get::<i128>(3).unwrap(), 100_000_000_000_000_000_000);
    }

    #[tokio::test]
    async fn last_insert_id_can_be_suppressed() {
        let client = SqliteClient::open_in_memory()
            .unwrap()
            .without_last_insert_id();
        client.execute("CREATE TABLE t (a int)", &[]).await.unwrap();
        let res = client
            .execute("INSERT INTO t (a) VALUES (?)", &[Value::I32(1)])
            .await
            .unwrap();
        assert_eq!(res.last_insert_id(), None);
    }

    #[tokio::test]
    async fn oversized_u64_is_rejected() {
        let client = SqliteClient::open_in_memory().unwrap();
        client.execute("CREATE TABLE t (a int)", &[]).await.unwrap();
        let err = client
            .execute("INSERT INTO t (a) VALUES (?)", &[Value::U64(u64::MAX)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Sqlite(_)));
    }
}
