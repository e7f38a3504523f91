//! Postgres warehouse adapter.
//!
//! Implements [`WarehouseGateway`] over a `sqlx` connection pool. The
//! warehouse schema belongs to the ingestion pipeline, not to this
//! service, so the adapter runs raw parameterized SQL and decodes columns
//! dynamically by their reported Postgres type instead of mapping tables
//! to structs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use crate::domain::ports::{BindValue, Row, Scalar, SelectStatement, WarehouseError, WarehouseGateway};

/// [`WarehouseGateway`] backed by a Postgres pool.
pub struct SqlxWarehouse {
    pool: PgPool,
}

impl SqlxWarehouse {
    /// Wrap an existing pool. The pool is created lazily at startup, so
    /// construction never touches the network.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WarehouseGateway for SqlxWarehouse {
    async fn select(&self, statement: &SelectStatement) -> Result<Vec<Row>, WarehouseError> {
        let mut query = sqlx::query(statement.sql());
        for bind in statement.binds() {
            query = match bind {
                BindValue::Int(value) => query.bind(*value),
                BindValue::Float(value) => query.bind(*value),
                BindValue::Text(value) => query.bind(value.clone()),
                BindValue::Timestamp(value) => query.bind(*value),
                BindValue::TextArray(values) => query.bind(values.clone()),
            };
        }

        let rows = query.fetch_all(&self.pool).await.map_err(map_error)?;
        rows.iter().map(decode_row).collect()
    }
}

fn map_error(err: sqlx::Error) -> WarehouseError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => WarehouseError::connection(err.to_string()),
        other => WarehouseError::query(other.to_string()),
    }
}

fn decode_row(row: &PgRow) -> Result<Row, WarehouseError> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| decode_column(row, index, column.name(), column.type_info().name()))
        .collect()
}

fn decode_column(
    row: &PgRow,
    index: usize,
    name: &str,
    type_name: &str,
) -> Result<Scalar, WarehouseError> {
    let raw = row
        .try_get_raw(index)
        .map_err(|err| WarehouseError::decode(format!("column {name}: {err}")))?;
    if raw.is_null() {
        return Ok(Scalar::Null);
    }

    let decode_err =
        |err: sqlx::Error| WarehouseError::decode(format!("column {name} ({type_name}): {err}"));

    match type_name {
        "INT2" => Ok(Scalar::Int(i64::from(
            row.try_get::<i16, _>(index).map_err(decode_err)?,
        ))),
        "INT4" => Ok(Scalar::Int(i64::from(
            row.try_get::<i32, _>(index).map_err(decode_err)?,
        ))),
        "INT8" => Ok(Scalar::Int(row.try_get::<i64, _>(index).map_err(decode_err)?)),
        "FLOAT4" => Ok(Scalar::Float(f64::from(
            row.try_get::<f32, _>(index).map_err(decode_err)?,
        ))),
        "FLOAT8" => Ok(Scalar::Float(
            row.try_get::<f64, _>(index).map_err(decode_err)?,
        )),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Ok(Scalar::Text(
            row.try_get::<String, _>(index).map_err(decode_err)?,
        )),
        "TIMESTAMPTZ" => Ok(Scalar::Timestamp(
            row.try_get::<DateTime<Utc>, _>(index).map_err(decode_err)?,
        )),
        // The warehouse stores naive timestamps; they are UTC by the
        // ingestion pipeline's convention.
        "TIMESTAMP" => Ok(Scalar::Timestamp(Utc.from_utc_datetime(
            &row.try_get::<NaiveDateTime, _>(index).map_err(decode_err)?,
        ))),
        "DATE" => {
            let date = row.try_get::<NaiveDate, _>(index).map_err(decode_err)?;
            let midnight = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| WarehouseError::decode(format!("column {name}: invalid date")))?;
            Ok(Scalar::Timestamp(Utc.from_utc_datetime(&midnight)))
        }
        other => Err(WarehouseError::decode(format!(
            "column {name}: unsupported type {other}"
        ))),
    }
}
