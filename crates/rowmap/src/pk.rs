//! Primary key resolution after INSERT.
//!
//! The key of a freshly inserted record is determined in tiers:
//!
//! 1. no primary key column: nothing to resolve;
//! 2. a key the caller supplied (not `NO_INSERT`): returned unchanged;
//! 3. a generated key: taken from the driver's last-insert-id when it reports one, otherwise
//!    recovered with [`stmt::key_lookup`](crate::stmt::key_lookup).
//!
//! Generated keys arrive as `i64` and are narrowed to the kind of the record's key value. A key
//! that does not survive the narrowing is an [`OrmError::KeyOverflow`].
//!
//! The lookup fallback is a heuristic: when several rows share every non-key, non-binary value it
//! returns the newest of them, which is not necessarily the row this call inserted. Run the
//! insert inside a transaction on a connection nobody else writes to when that matters.

use crate::client::{ExecResult, GenericClient};
use crate::column::{Col, primary_key};
use crate::config::StmtOptions;
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use crate::row::SqlRow;
use crate::stmt;
use crate::value::{Value, ValueKind};

/// Narrow a wide generated key to the kind of `pk`'s value.
pub fn coerce_key(pk: &Col, raw: i64) -> OrmResult<Value> {
    let kind = pk.value.kind();
    if !(kind.is_integer() || matches!(kind, ValueKind::BigInt | ValueKind::Null)) {
        return Err(OrmError::decode(
            pk.name.as_ref(),
            format!("expected integer type for primary key, got {}", kind.name()),
        ));
    }
    kind.narrow(raw).ok_or_else(|| OrmError::KeyOverflow {
        column: pk.name.to_string(),
        value: raw,
        kind: kind.name(),
    })
}

/// Convert a key read back from the database to the kind of `pk`'s value.
pub fn coerce_fetched(pk: &Col, fetched: Value) -> OrmResult<Value> {
    let kind = pk.value.kind();
    match fetched {
        Value::Text(_) | Value::Bytes(_) if !kind.is_integer() => Ok(fetched),
        Value::Null => Err(OrmError::decode(pk.name.as_ref(), "generated key is NULL")),
        other => match other.as_i64() {
            Some(raw) => coerce_key(pk, raw),
            None => Err(OrmError::decode(
                pk.name.as_ref(),
                format!("cannot use {} as primary key", other.kind().name()),
            )),
        },
    }
}

fn key_col(pk: &Col, value: Value) -> Col {
    Col {
        name: pk.name.clone(),
        value,
        opt: pk.opt.clone(),
    }
}

/// Key read back by `INSERT ... RETURNING`.
pub(crate) fn from_returned(pk: &Col, row: Option<SqlRow>) -> OrmResult<Col> {
    let row = row.ok_or_else(|| {
        OrmError::Other(format!("INSERT ... RETURNING {} produced no row", pk.name))
    })?;
    let value = row.into_values().into_iter().next().unwrap_or(Value::Null);
    coerce_fetched(pk, value).map(|v| key_col(pk, v))
}

/// Determine the key of the record `row` just inserted into `table`.
pub(crate) async fn resolve<C: GenericClient>(
    db: &Db<C>,
    table: &str,
    row: &[Col],
    result: &ExecResult,
    opts: &StmtOptions,
) -> OrmResult<Option<Col>> {
    let Some(pk) = primary_key(row) else {
        return Ok(None);
    };
    if !pk.skip_on_insert() {
        return Ok(Some(pk.clone()));
    }

    if let Some(raw) = result.last_insert_id() {
        return coerce_key(pk, raw).map(|v| Some(key_col(pk, v)));
    }

    let lookup = stmt::key_lookup(db.dialect(), table, row, pk);
    let found = db.fetch_opt(&lookup.sql, &lookup.args, opts).await?;
    let row = found.ok_or_else(|| {
        OrmError::not_found(format!(
            "{table}: inserted row not found while resolving {}",
            pk.name
        ))
    })?;
    let value = row.into_values().into_iter().next().unwrap_or(Value::Null);
    coerce_fetched(pk, value).map(|v| Some(key_col(pk, v)))
}
