//! Record mapping traits and utilities

use crate::column::{ColOpt, Row};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};

/// Settings a record receives when it builds its [`Row`].
///
/// Column metadata that depends on the database (generated key DDL, blob type) is derived from
/// here rather than hard-coded in the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowConfig {
    pub dialect: Dialect,
}

impl RowConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Options for a database-generated integer primary key.
    pub fn auto_key(&self) -> ColOpt {
        ColOpt::auto_key().sql_type(self.dialect.auto_key_type())
    }

    /// Options for a binary column.
    pub fn blob(&self) -> ColOpt {
        ColOpt::new().sql_type(self.dialect.blob_type())
    }
}

/// A type that can be stored as one row of a table.
///
/// Usually derived with `#[derive(Record)]`; implement it by hand when fields need custom
/// encoding.
///
/// ```ignore
/// impl Record for Person {
///     fn table_name(&self) -> &str {
///         "person"
///     }
///
///     fn row(&self, cfg: &RowConfig) -> Row {
///         vec![
///             Col::new("id", self.id).with_opt(cfg.auto_key()),
///             Col::new("first", self.first.clone()),
///         ]
///     }
///
///     fn scan(&mut self, row: &mut RowReader<'_>) -> OrmResult<()> {
///         self.id = row.next()?;
///         self.first = row.next()?;
///         Ok(())
///     }
/// }
/// ```
pub trait Record {
    fn table_name(&self) -> &str;

    /// Columns reflecting the current field values, in a stable order.
    fn row(&self, cfg: &RowConfig) -> Row;

    /// Populate fields from a fetched row, one value per column of [`Record::row`], in order.
    fn scan(&mut self, row: &mut RowReader<'_>) -> OrmResult<()>;
}

/// One fetched row, as decoded by the driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl SqlRow {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Decode the value at `idx`.
    pub fn get<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let value = self
            .values
            .get(idx)
            .cloned()
            .ok_or_else(|| OrmError::decode(idx.to_string(), "column index out of range"))?;
        T::from_value(value).map_err(|msg| OrmError::decode(self.column_name(idx), msg))
    }

    /// Sequential reader over the row's values.
    pub fn reader(&self) -> RowReader<'_> {
        RowReader { row: self, pos: 0 }
    }

    fn column_name(&self, idx: usize) -> String {
        self.columns
            .get(idx)
            .cloned()
            .unwrap_or_else(|| idx.to_string())
    }
}

/// Reads the values of a [`SqlRow`] front to back.
#[derive(Debug)]
pub struct RowReader<'a> {
    row: &'a SqlRow,
    pos: usize,
}

impl RowReader<'_> {
    /// Decode the next value into `T`.
    #[allow(clippy::should_implement_trait)]
    pub fn next<T: FromValue>(&mut self) -> OrmResult<T> {
        if self.pos >= self.row.len() {
            return Err(OrmError::decode(
                self.pos.to_string(),
                format!("row has only {} values", self.row.len()),
            ));
        }
        let v = self.row.get(self.pos);
        self.pos += 1;
        v
    }

    /// Values not yet read.
    pub fn remaining(&self) -> usize {
        self.row.len().saturating_sub(self.pos)
    }
}
