//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data`, so they depend on the
//! aggregation service alone and stay testable with an in-memory gateway.

use std::sync::Arc;

use crate::domain::StatsService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub stats: Arc<StatsService>,
}

impl HttpState {
    /// Bundle the aggregation service for handler injection.
    pub fn new(stats: Arc<StatsService>) -> Self {
        Self { stats }
    }
}
