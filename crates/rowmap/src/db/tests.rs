use super::*;
use crate::column::Row;
use crate::log::NoopLogger;
use crate::mock::{MockClient, key_row};
use crate::named::named;
use crate::row::RowReader;
use std::sync::Mutex;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Clone, PartialEq)]
struct Company {
    id: i64,
    name: String,
    ticker: String,
}

impl Record for Company {
    fn table_name(&self) -> &str {
        "company"
    }

    fn row(&self, cfg: &RowConfig) -> Row {
        vec![
            Col::new("id", self.id).with_opt(cfg.auto_key()),
            Col::new("name", self.name.clone()),
            Col::new("ticker", self.ticker.clone()),
        ]
    }

    fn scan(&mut self, row: &mut RowReader<'_>) -> OrmResult<()> {
        self.id = row.next()?;
        self.name = row.next()?;
        self.ticker = row.next()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Nothing;

impl Record for Nothing {
    fn table_name(&self) -> &str {
        "nothing"
    }

    fn row(&self, _cfg: &RowConfig) -> Row {
        Vec::new()
    }

    fn scan(&mut self, _row: &mut RowReader<'_>) -> OrmResult<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<String>>>);

impl Capture {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl SqlLogger for Capture {
    fn log(&self, sql: &str, _params: &[Value]) {
        self.0.lock().unwrap().push(sql.to_string());
    }
}

fn ibm() -> Company {
    Company {
        id: 0,
        name: "IBM".into(),
        ticker: "IBM".into(),
    }
}

fn company_row(id: i64, name: &str, ticker: &str) -> SqlRow {
    SqlRow::new(
        vec!["id".into(), "name".into(), "ticker".into()],
        vec![Value::I64(id), name.into(), ticker.into()],
    )
}

#[tokio::test]
async fn create_table_uses_dialect_key_type() {
    let db = Db::new(MockClient::new()).with_dialect(Dialect::Postgres);
    db.create_table(&Company::default()).await.unwrap();
    db.drop_table(&Company::default()).await.unwrap();
    assert_eq!(
        db.client().sql(),
        [
            "CREATE TABLE company (id SERIAL PRIMARY KEY,name varchar(255),ticker varchar(255))",
            "DROP TABLE company",
        ]
    );
}

#[tokio::test]
async fn insert_uses_driver_id() {
    let client = MockClient::new().with_exec(ExecResult::new(1).with_last_insert_id(5));
    let db = Db::new(client);
    let key = db.insert(&ibm()).await.unwrap().unwrap();
    assert_eq!(key.value, Value::I64(5));
    assert_eq!(
        db.client().sql(),
        ["INSERT INTO company (name,ticker) VALUES (?,?)"]
    );
}

#[tokio::test]
async fn insert_reads_returning_on_postgres() {
    let db = Db::new(MockClient::new()).with_dialect(Dialect::Postgres);
    db.client().push_rows(vec![key_row("id", 11_i32)]);
    let key = db.insert(&ibm()).await.unwrap().unwrap();
    assert_eq!(key.value, Value::I64(11));
    assert_eq!(
        db.client().sql(),
        ["INSERT INTO company (name,ticker) VALUES ($1,$2) RETURNING id"]
    );
}

#[tokio::test]
async fn get_scans_into_record() {
    let db = Db::new(MockClient::new());
    db.client().push_rows(vec![company_row(3, "Apple", "AAPL")]);
    let mut c = Company {
        id: 3,
        ..Default::default()
    };
    db.get(&mut c).await.unwrap();
    assert_eq!(c.name, "Apple");
    assert_eq!(c.ticker, "AAPL");
    assert_eq!(db.client().sql(), ["SELECT id,name,ticker FROM company WHERE id=?"]);
    assert_eq!(db.client().last_args(), [Value::I64(3)]);
}

#[tokio::test]
async fn get_missing_row_is_not_found() {
    let db = Db::new(MockClient::new());
    let mut c = Company {
        id: 99,
        ..Default::default()
    };
    assert!(db.get(&mut c).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let db = Db::new(MockClient::new().with_exec(ExecResult::new(0)));
    let err = db.update(&ibm()).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        db.client().sql(),
        ["UPDATE company SET name=?,ticker=? WHERE id=?"]
    );
}

#[tokio::test]
async fn delete_reports_rows_affected() {
    let db = Db::new(MockClient::new().with_exec(ExecResult::new(0)));
    assert_eq!(db.delete(&ibm()).await.unwrap(), 0);
}

#[tokio::test]
async fn select_binds_named_parameters() {
    let db = Db::new(MockClient::new()).with_dialect(Dialect::Postgres);
    db.client().push_rows(vec![
        company_row(1, "Apple", "AAPL"),
        company_row(2, "Microsoft", "MSFT"),
    ]);
    let found: Vec<Company> = db
        .select(
            "WHERE ticker != @ticker AND name != @name",
            &[named("name", "IBM"), named("ticker", "IBM"), named("unused", 1)],
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[1].ticker, "MSFT");
    assert_eq!(
        db.client().sql(),
        ["SELECT id,name,ticker FROM company WHERE ticker != $1 AND name != $2"]
    );
    assert_eq!(db.client().last_args(), [Value::from("IBM"), Value::from("IBM")]);
}

#[tokio::test]
async fn select_with_custom_prefix() {
    let db = Db::new(MockClient::new()).with_param_prefix(':').unwrap();
    let found: Vec<Company> = db
        .select("WHERE ticker = :ticker", &[named("ticker", "IBM")])
        .await
        .unwrap();
    assert!(found.is_empty());
    assert_eq!(
        db.client().sql(),
        ["SELECT id,name,ticker FROM company WHERE ticker = ?"]
    );
    assert!(Db::new(MockClient::new()).with_param_prefix('x').is_err());
}

#[tokio::test]
async fn select_reports_unknown_parameter() {
    let db = Db::new(MockClient::new());
    let err = db
        .select::<Company>("WHERE ticker = @ticker", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::UnknownParameter(ref name) if name == "ticker"));
    assert!(db.client().sql().is_empty());
}

#[tokio::test]
async fn select_needs_columns_to_scan() {
    let db = Db::new(MockClient::new());
    let err = db.select::<Nothing>("", &[]).await.unwrap_err();
    assert!(matches!(err, OrmError::NoUnmarshalTarget(_)));
}

#[tokio::test]
async fn every_statement_is_logged() {
    let capture = Capture::default();
    let db = Db::new(MockClient::new().with_exec(ExecResult::new(1)))
        .with_logger(capture.clone());
    db.client().push_rows(vec![key_row("id", 1_i64)]);
    db.insert(&ibm()).await.unwrap();
    db.execute_named("DELETE FROM company WHERE id = @id", &[named("id", 1)])
        .await
        .unwrap();
    assert_eq!(
        capture.lines(),
        [
            "INSERT INTO company (name,ticker) VALUES (?,?)",
            "SELECT id FROM company WHERE name=? AND ticker=? ORDER BY id DESC",
            "DELETE FROM company WHERE id = ?",
        ]
    );
}

#[tokio::test]
async fn noop_logger_replaces_previous_sink() {
    let capture = Capture::default();
    let db = Db::new(MockClient::new().with_exec(ExecResult::new(1)))
        .with_logger(capture.clone())
        .with_logger(NoopLogger);
    let n = db
        .execute_named("DELETE FROM company WHERE id = @id", &[named("id", 1)])
        .await
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(db.client().sql(), ["DELETE FROM company WHERE id = ?"]);
    assert!(capture.lines().is_empty());
}

#[tokio::test]
async fn deadline_aborts_statement() {
    let db = Db::new(MockClient::new().with_delay(Duration::from_secs(5)));
    let opts = StmtOptions::new().timeout(Duration::from_millis(20));
    let err = db.delete_with(&ibm(), &opts).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(db.client().cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn cancelled_token_aborts_statement() {
    let db = Db::new(MockClient::new().with_delay(Duration::from_secs(5)));
    let token = CancellationToken::new();
    let opts = StmtOptions::new().cancel_on(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });
    let err = db.update_with(&ibm(), &opts).await.unwrap_err();
    canceller.await.unwrap();
    assert!(err.is_cancelled());
    assert!(db.client().cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn pre_cancelled_token_skips_statement() {
    let db = Db::new(MockClient::new());
    let token = CancellationToken::new();
    token.cancel();
    let opts = StmtOptions::new().cancel_on(token);
    let err = db.query_named_with("SELECT 1", &[], &opts).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!db.client().cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn query_named_returns_raw_rows() {
    let db = Db::new(MockClient::new());
    db.client().push_rows(vec![key_row("n", 7_i64)]);
    let rows = db
        .query_named("SELECT count(*) AS n FROM company WHERE ticker = @t", &[named("t", "IBM")])
        .await
        .unwrap();
    assert_eq!(rows[0].get::<i64>(0).unwrap(), 7);
}
