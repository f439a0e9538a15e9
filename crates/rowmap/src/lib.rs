//! # rowmap
//!
//! A minimal record-to-SQL mapping layer.
//!
//! ## Features
//!
//! - **Records, not reflection**: a type describes itself as a [`Row`] of named columns through
//!   the [`Record`] trait (usually derived with `#[derive(Record)]`)
//! - **CRUD from the row**: `CREATE TABLE`, `INSERT`, `UPDATE`, `SELECT` by key and `DELETE` are
//!   synthesized from the columns and their [`ColFlags`]
//! - **Generated keys**: inserted keys come back narrowed to the width of the record's key field
//!   and overflow is reported, not truncated
//! - **Symbolic parameters**: `@name` in query clauses is rewritten to the dialect's placeholders
//! - **Dialects**: SQLite (`?`), MySQL (`?`) and PostgreSQL (`$N`, `RETURNING`)
//! - **Logging**: every statement goes through an [`SqlLogger`] (`tracing` by default)
//!
//! ## Example
//!
//! ```ignore
//! use rowmap::{Db, Record, SqliteClient, named};
//!
//! #[derive(Debug, Default, Record)]
//! struct Company {
//!     #[rowmap(auto_key)]
//!     id: i64,
//!     name: String,
//!     ticker: String,
//! }
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
//!     .select("WHERE ticker != @ticker ORDER BY id", &[named("ticker", "IBM")])
//!     .await?;
//! ```

pub mod client;
pub mod column;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod log;
pub mod named;
pub mod pk;
pub mod row;
pub mod stmt;
pub mod transaction;
pub mod value;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{ExecResult, GenericClient};
pub use column::{Col, ColFlags, ColOpt, Row, primary_key};
pub use config::{DbConfig, StmtOptions};
pub use db::Db;
pub use dialect::{Dialect, Placeholders};
pub use error::{OrmError, OrmResult};
pub use log::{NoopLogger, SqlLogger, TracingLogger};
pub use named::{CompiledQuery, NamedArg, named};
pub use row::{Record, RowConfig, RowReader, SqlRow};
pub use transaction::Tx;
pub use value::{FromValue, Value, ValueKind};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteClient;

#[cfg(feature = "derive")]
pub use rowmap_derive::Record;
