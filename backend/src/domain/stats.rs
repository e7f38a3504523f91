//! Statistics payload types.
//!
//! Read-only projections of warehouse rows. Field names are part of the
//! API contract consumed by the dashboard and the spreadsheet report, so
//! they are fixed (`document_origin_code`, `unique_document_count`, ...).
//! Every type derives `Deserialize` as well: aggregation results round-trip
//! through the TTL cache as JSON values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Distinct patient counts, split into the special cohorts used to gauge
/// data quality (test, research, and celebrity records are recognised by
/// exact last-name match and should stay marginal).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientCounts {
    /// Distinct patients in the warehouse.
    pub patient_count: i64,
    /// Patients whose last name marks them as test records.
    pub test_patient_count: i64,
    /// Patients whose last name marks them as research records.
    pub research_patient_count: i64,
    /// Patients whose last name marks them as celebrity records.
    pub celebrity_patient_count: i64,
}

/// Distinct document count for one normalised origin category.
///
/// The origin key is `None` for documents ingested without an origin code;
/// normalisation passes null keys through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DocumentCount {
    /// Normalised origin category, or `None` for untagged documents.
    pub document_origin_code: Option<String>,
    /// Count of distinct document identifiers in the category.
    pub unique_document_count: i64,
}

/// One entry of the top-users ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TopUser {
    pub firstname: String,
    pub lastname: String,
    pub query_count: i64,
}

/// Distribution of document ingestion delays in days.
///
/// Delays are `update − creation` and may legitimately be negative; such
/// anomalies are reportable data, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentMetrics {
    pub min_delay: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max_delay: f64,
    pub avg_delay: f64,
}

/// Documents eligible for suppression, grouped by raw origin code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OriginSuppressCount {
    /// Raw origin code; `None` for untagged documents.
    pub document_origin_code: Option<String>,
    pub documents_to_suppress: i64,
}

/// Archive-eligibility summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArchiveStatus {
    /// Age of the oldest document update, in fractional years
    /// (`days / 365.25`); `0.0` when the warehouse is empty.
    pub archive_period: f64,
    /// Documents last updated more than the retention threshold ago.
    pub total_documents_to_suppress: i64,
    /// Per-origin breakdown of suppression candidates, largest first.
    pub documents_to_suppress: Vec<OriginSuppressCount>,
}

/// Distinct documents per origin and year of last update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct YearlyDocumentCount {
    pub document_origin_code: String,
    pub year: i32,
    pub count: i64,
}

/// Distinct documents per origin and month of creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyDocumentCount {
    pub document_origin_code: String,
    /// First day of the month the documents were created in.
    pub month: NaiveDate,
    pub count: i64,
}

/// Consolidated output of one orchestrator run.
///
/// Valid only at the instant of computation: metrics are read concurrently
/// and may reflect slightly different warehouse instants. A failing metric
/// appears as its empty/zero value; the snapshot itself always assembles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsSnapshot {
    pub patient_count: i64,
    pub test_patient_count: i64,
    pub research_patient_count: i64,
    pub celebrity_patient_count: i64,
    pub document_counts: Vec<DocumentCount>,
    pub recent_document_counts: Vec<DocumentCount>,
    pub top_users: Vec<TopUser>,
    pub top_users_current_year: Vec<TopUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_metrics: Option<DocumentMetrics>,
    pub archive_status: ArchiveStatus,
    pub document_origins: Vec<String>,
    pub document_counts_by_year: Vec<YearlyDocumentCount>,
    pub recent_document_counts_by_month: Vec<MonthlyDocumentCount>,
}
