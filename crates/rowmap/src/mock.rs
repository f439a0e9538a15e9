use crate::client::{ExecResult, GenericClient};
use crate::error::OrmResult;
use crate::row::SqlRow;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Records statements and replays canned results.
#[derive(Default)]
pub(crate) struct MockClient {
    pub statements: Mutex<Vec<(String, Vec<Value>)>>,
    pub exec_result: ExecResult,
    pub results: Mutex<VecDeque<Vec<SqlRow>>>,
    pub delay: Option<Duration>,
    pub cancelled: AtomicBool,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exec(mut self, result: ExecResult) -> Self {
        self.exec_result = result;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue the rows returned by the next query.
    pub fn push_rows(&self, rows: Vec<SqlRow>) {
        self.results.lock().unwrap().push_back(rows);
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub fn last_args(&self) -> Vec<Value> {
        self.statements
            .lock()
            .unwrap()
            .last()
            .map(|(_, args)| args.clone())
            .unwrap_or_default()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl GenericClient for MockClient {
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send {
        self.record(sql, params);
        async move {
            self.pause().await;
            Ok(self.exec_result)
        }
    }

    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<SqlRow>>> + Send {
        self.record(sql, params);
        async move {
            self.pause().await;
            Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn cancel_in_flight(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// A single-column row.
pub(crate) fn key_row(name: &str, value: impl Into<Value>) -> SqlRow {
    SqlRow::new(vec![name.to_string()], vec![value.into()])
}
