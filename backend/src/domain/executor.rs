//! Fail-empty query execution.
//!
//! Every aggregation reads the warehouse through this executor. Its
//! contract is deliberate: any execution failure is logged with the
//! statement label and converted into an empty row set, never an error the
//! caller must handle. Downstream aggregations therefore treat "no rows"
//! as "zero results" and compose their typed empty defaults safely, and a
//! single failing metric can never abort a consolidated snapshot.

use std::sync::Arc;

use tracing::error;

use crate::domain::ports::{Row, SelectStatement, WarehouseGateway};

/// Executes read statements, absorbing failures into empty row sets.
#[derive(Clone)]
pub struct QueryExecutor {
    gateway: Arc<dyn WarehouseGateway>,
}

impl QueryExecutor {
    /// Wrap a warehouse gateway.
    pub fn new(gateway: Arc<dyn WarehouseGateway>) -> Self {
        Self { gateway }
    }

    /// Run one statement and return its rows, or an empty sequence if the
    /// warehouse fails. The failure is logged with full context; it does
    /// not propagate.
    pub async fn rows(&self, statement: &SelectStatement) -> Vec<Row> {
        match self.gateway.select(statement).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(
                    statement = statement.label(),
                    error = %err,
                    "warehouse query failed; returning empty result"
                );
                Vec::new()
            }
        }
    }

    /// Run a statement expected to produce a single row.
    pub async fn single_row(&self, statement: &SelectStatement) -> Option<Row> {
        self.rows(statement).await.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::domain::ports::{Scalar, WarehouseError};
    use rstest::rstest;

    struct OfflineGateway;

    #[async_trait]
    impl WarehouseGateway for OfflineGateway {
        async fn select(&self, _statement: &SelectStatement) -> Result<Vec<Row>, WarehouseError> {
            Err(WarehouseError::connection("warehouse unreachable"))
        }
    }

    struct OneRowGateway;

    #[async_trait]
    impl WarehouseGateway for OneRowGateway {
        async fn select(&self, _statement: &SelectStatement) -> Result<Vec<Row>, WarehouseError> {
            Ok(vec![vec![Scalar::Int(42)]])
        }
    }

    #[rstest]
    #[tokio::test]
    async fn failures_become_empty_row_sets() {
        let executor = QueryExecutor::new(Arc::new(OfflineGateway));
        let statement = SelectStatement::new("anything", "SELECT 1");

        assert!(executor.rows(&statement).await.is_empty());
        assert!(executor.single_row(&statement).await.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn successful_rows_pass_through() {
        let executor = QueryExecutor::new(Arc::new(OneRowGateway));
        let statement = SelectStatement::new("anything", "SELECT 42");

        let row = executor.single_row(&statement).await.expect("one row");
        assert_eq!(row, vec![Scalar::Int(42)]);
    }
}
