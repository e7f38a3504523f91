//! OpenAPI documentation configuration.
//!
//! Defines [`ApiDoc`], the generated OpenAPI specification for the REST
//! API: every statistics endpoint, the health probes, and the payload
//! schemas. Swagger UI serves the document in debug builds.

use utoipa::OpenApi;

use crate::domain::error::{Error, ErrorCode};
use crate::domain::stats::{
    ArchiveStatus, DocumentCount, DocumentMetrics, MonthlyDocumentCount, OriginSuppressCount,
    PatientCounts, StatsSnapshot, TopUser, YearlyDocumentCount,
};
use crate::inbound::http::stats::Summary;

/// OpenAPI document for the monitoring API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DWH monitoring backend API",
        description = "Read-only statistics over the clinical data warehouse."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::stats::document_counts,
        crate::inbound::http::stats::recent_document_counts,
        crate::inbound::http::stats::top_users,
        crate::inbound::http::stats::top_users_current_year,
        crate::inbound::http::stats::document_metrics,
        crate::inbound::http::stats::archive_status,
        crate::inbound::http::stats::document_counts_by_year,
        crate::inbound::http::stats::recent_document_counts_by_month,
        crate::inbound::http::stats::document_origins,
        crate::inbound::http::stats::summary,
        crate::inbound::http::stats::all_statistics,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        PatientCounts,
        DocumentCount,
        TopUser,
        DocumentMetrics,
        ArchiveStatus,
        OriginSuppressCount,
        YearlyDocumentCount,
        MonthlyDocumentCount,
        StatsSnapshot,
        Summary,
    )),
    tags(
        (name = "statistics", description = "Warehouse aggregation endpoints"),
        (name = "health", description = "Orchestration probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn document_lists_every_statistics_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/document_counts",
            "/api/v1/recent_document_counts",
            "/api/v1/top_users",
            "/api/v1/top_users_current_year",
            "/api/v1/document_metrics",
            "/api/v1/archive_status",
            "/api/v1/document_counts_by_year",
            "/api/v1/recent_document_counts_by_month",
            "/api/v1/document_origins",
            "/api/v1/summary",
            "/api/v1/all_statistics",
            "/health/live",
            "/health/ready",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }
}
