//! Domain ports defining the edges of the hexagon.
//!
//! The aggregation layer interacts with exactly one driven adapter: the
//! warehouse gateway. The port speaks in parameterized read statements and
//! loosely typed rows so the domain stays free of any driver types, and so
//! tests can stand in an in-memory warehouse without SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One column value returned by the warehouse.
///
/// Aggregation queries project a handful of column shapes (identifiers,
/// counts, codes, timestamps); anything the adapter cannot decode into one
/// of these is a decode failure at the adapter boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    /// Integer view; `None` for non-integer columns.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Floating-point view, widening integer columns.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Text view; `None` for non-text columns.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Timestamp view; `None` for non-timestamp columns.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether this column was SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// One warehouse row: an ordered tuple of columns matching the statement's
/// projection.
pub type Row = Vec<Scalar>;

/// A typed bind parameter for a read statement.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    TextArray(Vec<String>),
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Vec<String>> for BindValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextArray(value)
    }
}

/// A parameterized, read-only statement against the warehouse.
///
/// The label identifies the statement in logs and lets test doubles
/// dispatch without parsing SQL. Binds are positional (`$1`, `$2`, ...)
/// in the order they were added.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    label: &'static str,
    sql: String,
    binds: Vec<BindValue>,
}

impl SelectStatement {
    /// Create a statement with no bind parameters.
    pub fn new(label: &'static str, sql: impl Into<String>) -> Self {
        Self {
            label,
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// Append a positional bind parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<BindValue>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// Short statement identifier used for logging and test dispatch.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The SQL text with positional placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bind parameters in positional order.
    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }
}

/// Failures a warehouse adapter can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarehouseError {
    /// The warehouse could not be reached or the connection dropped.
    #[error("warehouse connection failed: {message}")]
    Connection { message: String },

    /// The statement was rejected or failed during execution.
    #[error("warehouse query failed: {message}")]
    Query { message: String },

    /// A returned column could not be decoded into a [`Scalar`].
    #[error("warehouse row decode failed: {message}")]
    Decode { message: String },
}

impl WarehouseError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a decode error with the given message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Driven port for executing read statements against the warehouse.
///
/// Implementations never manage schema or transactions; they only run
/// read statements and decode rows. Retry policy, if any, belongs to the
/// connection layer behind the adapter.
#[async_trait]
pub trait WarehouseGateway: Send + Sync {
    /// Execute one read statement, returning decoded rows in result order.
    async fn select(&self, statement: &SelectStatement) -> Result<Vec<Row>, WarehouseError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn statement_accumulates_binds_in_order() {
        let statement = SelectStatement::new("example", "SELECT 1 WHERE a = $1 AND b = $2")
            .bind(7i64)
            .bind("LAB");

        assert_eq!(statement.label(), "example");
        assert_eq!(
            statement.binds(),
            &[BindValue::Int(7), BindValue::Text("LAB".to_owned())]
        );
    }

    #[rstest]
    fn scalar_views_reject_mismatched_types() {
        assert_eq!(Scalar::Text("x".to_owned()).as_i64(), None);
        assert_eq!(Scalar::Int(3).as_f64(), Some(3.0));
        assert!(Scalar::Null.is_null());
        assert_eq!(Scalar::Int(3).as_text(), None);
    }
}
