//! PostgreSQL driver for `tokio_postgres::Client`.
//!
//! Use together with [`Dialect::Postgres`](crate::Dialect::Postgres): `$N` placeholders, and
//! generated keys read back through `INSERT ... RETURNING`.

use crate::client::{ExecResult, GenericClient};
use crate::error::{OrmError, OrmResult};
use crate::row::SqlRow;
use crate::value::Value;
use bytes::BytesMut;
use tokio_postgres::types::{IsNull, ToSql, Type};
use tokio_postgres::{NoTls, Row};

type BoxError = Box<dyn std::error::Error + Sync + Send>;

fn params_ref(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl GenericClient for tokio_postgres::Client {
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send {
        async move {
            let refs = params_ref(params);
            let n = tokio_postgres::Client::execute(self, sql, &refs).await?;
            Ok(ExecResult::new(n))
        }
    }

    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<SqlRow>>> + Send {
        async move {
            let refs = params_ref(params);
            let rows = tokio_postgres::Client::query(self, sql, &refs).await?;
            rows.iter().map(decode_row).collect()
        }
    }

    fn cancel_in_flight(&self) {
        let token = self.cancel_token();
        tokio::spawn(async move {
            let _ = token.cancel_query(NoTls).await;
        });
    }
}

fn decode_row(row: &Row) -> OrmResult<SqlRow> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (idx, col) in row.columns().iter().enumerate() {
        columns.push(col.name().to_string());
        values.push(decode_column(row, idx, col.type_()).map_err(|e| match e {
            OrmError::Postgres(e) => OrmError::decode(col.name(), e.to_string()),
            other => other,
        })?);
    }
    Ok(SqlRow::new(columns, values))
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> OrmResult<Value> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        Type::CHAR => row.try_get::<_, Option<i8>>(idx)?.map(Value::I8),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(Value::I16),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(Value::I32),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::I64),
        Type::OID => row.try_get::<_, Option<u32>>(idx)?.map(Value::U32),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| Value::F64(f64::from(v))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::F64),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::Text)
        }
        _ => {
            return Err(OrmError::decode(
                row.columns()[idx].name(),
                format!("unsupported column type {ty}"),
            ));
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

fn wide_int(value: &Value) -> Option<i128> {
    match *value {
        Value::BigInt(v) => Some(v),
        Value::U64(v) => Some(i128::from(v)),
        _ => value.as_i64().map(i128::from),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if let Some(wide) = wide_int(self) {
            // Integers adapt to the width of the target column.
            return match *ty {
                Type::CHAR => i8::try_from(wide)?.to_sql(ty, out),
                Type::INT2 => i16::try_from(wide)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(wide)?.to_sql(ty, out),
                Type::OID => u32::try_from(wide)?.to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    wide.to_string().as_str().to_sql(ty, out)
                }
                Type::FLOAT8 => (wide as f64).to_sql(ty, out),
                _ => i64::try_from(wide)?.to_sql(ty, out),
            };
        }

        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::F64(v) if *ty == Type::FLOAT4 => (*v as f32).to_sql(ty, out),
            Value::F64(v) => v.to_sql(ty, out),
            Value::Text(s) => s.as_str().to_sql(ty, out),
            Value::Bytes(b) => b.as_slice().to_sql(ty, out),
            other => Err(format!("cannot encode {} for {ty}", other.kind().name()).into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}
