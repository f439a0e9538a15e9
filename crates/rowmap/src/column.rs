//! Column model: one named, typed, optionally flagged value of a record.

use crate::value::Value;
use std::borrow::Cow;

bitflags::bitflags! {
    /// Meta information about a column.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColFlags: u16 {
        /// Leave the column out of INSERT (the database generates it).
        const NO_INSERT = 1 << 15;
        /// The column addresses the record for get/update/delete.
        const PRIMARY_KEY = 1 << 14;
    }
}

/// Optional column metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColOpt {
    /// Type used by `CREATE TABLE`, e.g. `TEXT`, `BLOB`, `SERIAL PRIMARY KEY`.
    pub sql_type: Option<String>,
    pub flags: ColFlags,
}

impl ColOpt {
    pub fn new() -> Self {
        Self::default()
    }

    /// A caller-supplied primary key.
    pub fn primary_key() -> Self {
        Self {
            sql_type: None,
            flags: ColFlags::PRIMARY_KEY,
        }
    }

    /// A primary key generated by the database on insert.
    pub fn auto_key() -> Self {
        Self {
            sql_type: None,
            flags: ColFlags::PRIMARY_KEY | ColFlags::NO_INSERT,
        }
    }

    pub fn sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    pub fn flags(mut self, flags: ColFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// A named column value with optional metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Col {
    /// Column name in the database.
    pub name: Cow<'static, str>,
    pub value: Value,
    pub opt: Option<ColOpt>,
}

impl Col {
    pub fn new(name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            opt: None,
        }
    }

    pub fn with_opt(mut self, opt: ColOpt) -> Self {
        self.opt = Some(opt);
        self
    }

    fn has_flag(&self, flag: ColFlags) -> bool {
        self.opt.as_ref().is_some_and(|o| o.flags.contains(flag))
    }

    pub fn skip_on_insert(&self) -> bool {
        self.has_flag(ColFlags::NO_INSERT)
    }

    pub fn is_primary_key(&self) -> bool {
        self.has_flag(ColFlags::PRIMARY_KEY)
    }

    pub fn is_binary_blob(&self) -> bool {
        self.value.is_bytes()
    }

    /// Declared SQL type, falling back to one inferred from the value.
    pub fn sql_type(&self) -> &str {
        match self.opt.as_ref().and_then(|o| o.sql_type.as_deref()) {
            Some(t) if !t.is_empty() => t,
            _ => self.value.inferred_sql_type(),
        }
    }
}

/// The persisted shape of one record: its columns in order.
pub type Row = Vec<Col>;

/// The column addressing the record.
///
/// When more than one column carries `PRIMARY_KEY`, the first one wins.
pub fn primary_key(row: &[Col]) -> Option<&Col> {
    row.iter().find(|c| c.is_primary_key())
}
