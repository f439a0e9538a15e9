//! Database dialects and positional placeholder generation.

use serde::Deserialize;
use std::fmt::Write as _;

/// Database family the handle talks to.
///
/// Only placeholder syntax, insert-key retrieval and a couple of DDL spellings differ between
/// dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `?` placeholders, key reported by the driver.
    #[default]
    Sqlite,
    /// `?` placeholders, key reported by the driver.
    MySql,
    /// `$1, $2, ...` placeholders, key read back with `INSERT ... RETURNING`.
    #[serde(alias = "postgresql")]
    Postgres,
}

impl Dialect {
    /// Start a fresh placeholder sequence for one statement.
    pub fn placeholders(self) -> Placeholders {
        let style = match self {
            Self::Sqlite | Self::MySql => Style::Question,
            Self::Postgres => Style::Numbered,
        };
        Placeholders { style, count: 0 }
    }

    /// Whether INSERT reads the primary key back through a `RETURNING` clause.
    pub fn returns_inserted_key(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Column type for a database-generated integer primary key.
    pub fn auto_key_type(self) -> &'static str {
        match self {
            Self::Sqlite => "INTEGER PRIMARY KEY",
            Self::MySql => "INTEGER PRIMARY KEY AUTO_INCREMENT",
            Self::Postgres => "SERIAL PRIMARY KEY",
        }
    }

    /// Column type for binary data.
    pub fn blob_type(self) -> &'static str {
        match self {
            Self::Sqlite | Self::MySql => "BLOB",
            Self::Postgres => "BYTEA",
        }
    }

    /// INSERT tail used when every column is generated by the database.
    pub(crate) fn empty_insert_tail(self) -> &'static str {
        match self {
            Self::MySql => " () VALUES ()",
            Self::Sqlite | Self::Postgres => " DEFAULT VALUES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Question,
    Numbered,
}

/// Positional placeholder sequence for a single statement.
///
/// Numbered markers count from 1 and never reset, so one instance must not be shared by two
/// statements.
#[derive(Debug)]
pub struct Placeholders {
    style: Style,
    count: usize,
}

impl Placeholders {
    /// Append the next marker to `out`.
    pub fn push_next(&mut self, out: &mut String) {
        self.count += 1;
        match self.style {
            Style::Question => out.push('?'),
            Style::Numbered => {
                let _ = write!(out, "${}", self.count);
            }
        }
    }

    /// Return the next marker.
    pub fn next_marker(&mut self) -> String {
        let mut s = String::with_capacity(4);
        self.push_next(&mut s);
        s
    }

    /// Number of markers emitted so far.
    pub fn count(&self) -> usize {
        self.count
    }
}
