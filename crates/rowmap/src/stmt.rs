//! SQL statement synthesis from a record's [`Row`](crate::Row).
//!
//! Every builder takes a fresh placeholder sequence from the dialect, so the markers of one
//! statement always start at the beginning of the sequence.

use crate::column::{Col, primary_key};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// SQL text with its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

fn check_row(table: &str, row: &[Col]) -> OrmResult<()> {
    if table.is_empty() {
        return Err(OrmError::validation("record has an empty table name"));
    }
    if row.is_empty() {
        return Err(OrmError::EmptyRow(table.to_string()));
    }
    Ok(())
}

fn require_pk<'r>(table: &str, row: &'r [Col]) -> OrmResult<&'r Col> {
    check_row(table, row)?;
    primary_key(row).ok_or_else(|| OrmError::NoPrimaryKey(table.to_string()))
}

fn push_column_list<'a>(out: &mut String, cols: impl Iterator<Item = &'a Col>) {
    for (i, c) in cols.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&c.name);
    }
}

/// `CREATE TABLE` with declared or inferred column types.
pub fn create_table(table: &str, row: &[Col]) -> OrmResult<String> {
    check_row(table, row)?;
    let mut sql = format!("CREATE TABLE {table} (");
    for (i, c) in row.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push_str(&c.name);
        sql.push(' ');
        sql.push_str(c.sql_type());
    }
    sql.push(')');
    Ok(sql)
}

pub fn drop_table(table: &str) -> OrmResult<String> {
    if table.is_empty() {
        return Err(OrmError::validation("record has an empty table name"));
    }
    Ok(format!("DROP TABLE {table}"))
}

/// The key column an INSERT reads back through `RETURNING`, if the dialect does that.
pub(crate) fn returning_key(dialect: Dialect, row: &[Col]) -> Option<&Col> {
    if dialect.returns_inserted_key() {
        primary_key(row)
    } else {
        None
    }
}

/// `INSERT` of every column not flagged `NO_INSERT`.
///
/// On dialects that return the inserted key, a `RETURNING <pk>` clause is appended when the row
/// has a primary key.
pub fn insert(dialect: Dialect, table: &str, row: &[Col]) -> OrmResult<Statement> {
    check_row(table, row)?;
    let mut ph = dialect.placeholders();
    let cols: Vec<&Col> = row.iter().filter(|c| !c.skip_on_insert()).collect();

    let mut sql = format!("INSERT INTO {table}");
    if cols.is_empty() {
        sql.push_str(dialect.empty_insert_tail());
    } else {
        sql.push_str(" (");
        push_column_list(&mut sql, cols.iter().copied());
        sql.push_str(") VALUES (");
        for i in 0..cols.len() {
            if i > 0 {
                sql.push(',');
            }
            ph.push_next(&mut sql);
        }
        sql.push(')');
    }

    if let Some(pk) = returning_key(dialect, row) {
        sql.push_str(" RETURNING ");
        sql.push_str(&pk.name);
    }

    Ok(Statement {
        sql,
        args: cols.into_iter().map(|c| c.value.clone()).collect(),
    })
}

/// `UPDATE` of every non-key column, addressed by the primary key.
pub fn update(dialect: Dialect, table: &str, row: &[Col]) -> OrmResult<Statement> {
    let pk = require_pk(table, row)?;
    let mut ph = dialect.placeholders();
    let mut args = Vec::with_capacity(row.len());

    let mut sql = format!("UPDATE {table} SET ");
    for c in row.iter().filter(|c| !c.is_primary_key()) {
        if !args.is_empty() {
            sql.push(',');
        }
        sql.push_str(&c.name);
        sql.push('=');
        ph.push_next(&mut sql);
        args.push(c.value.clone());
    }
    if args.is_empty() {
        return Err(OrmError::validation(format!(
            "table '{table}' has no non-key columns to update"
        )));
    }

    sql.push_str(" WHERE ");
    sql.push_str(&pk.name);
    sql.push('=');
    ph.push_next(&mut sql);
    args.push(pk.value.clone());

    Ok(Statement { sql, args })
}

/// `SELECT` of all columns addressed by the primary key.
pub fn get(dialect: Dialect, table: &str, row: &[Col]) -> OrmResult<Statement> {
    let pk = require_pk(table, row)?;
    let mut ph = dialect.placeholders();
    let mut sql = String::from("SELECT ");
    push_column_list(&mut sql, row.iter());
    sql.push_str(" FROM ");
    sql.push_str(table);
    sql.push_str(" WHERE ");
    sql.push_str(&pk.name);
    sql.push('=');
    ph.push_next(&mut sql);
    Ok(Statement {
        sql,
        args: vec![pk.value.clone()],
    })
}

/// `SELECT` of all columns followed by a caller clause.
///
/// The clause is appended as-is; symbolic parameters in it are rewritten afterwards.
pub fn select(table: &str, row: &[Col], clause: &str) -> OrmResult<String> {
    check_row(table, row)?;
    let mut sql = String::from("SELECT ");
    push_column_list(&mut sql, row.iter());
    sql.push_str(" FROM ");
    sql.push_str(table);
    if !clause.is_empty() {
        sql.push(' ');
        sql.push_str(clause);
    }
    Ok(sql)
}

/// `DELETE` addressed by the primary key.
pub fn delete(dialect: Dialect, table: &str, row: &[Col]) -> OrmResult<Statement> {
    let pk = require_pk(table, row)?;
    let mut ph = dialect.placeholders();
    let mut sql = format!("DELETE FROM {table} WHERE {}=", pk.name);
    ph.push_next(&mut sql);
    Ok(Statement {
        sql,
        args: vec![pk.value.clone()],
    })
}

/// Query recovering a generated key from the values just inserted.
///
/// Matches on every inserted column except the key itself, `NO_INSERT` columns and binary values,
/// newest key first. Rows sharing all of those values are indistinguishable, so the newest of them
/// is returned.
pub fn key_lookup(dialect: Dialect, table: &str, row: &[Col], pk: &Col) -> Statement {
    let mut ph = dialect.placeholders();
    let mut args = Vec::new();
    let mut sql = format!("SELECT {} FROM {table}", pk.name);

    let filters = row
        .iter()
        .filter(|c| !c.is_primary_key() && !c.skip_on_insert() && !c.is_binary_blob());
    for (i, c) in filters.enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&c.name);
        if c.value.is_null() {
            sql.push_str(" IS NULL");
        } else {
            sql.push('=');
            ph.push_next(&mut sql);
            args.push(c.value.clone());
        }
    }

    sql.push_str(" ORDER BY ");
    sql.push_str(&pk.name);
    sql.push_str(" DESC");
    Statement { sql, args }
}
