//! Statistics API handlers.
//!
//! ```text
//! GET /api/v1/document_counts                  distinct documents per origin
//! GET /api/v1/recent_document_counts           same, trailing seven days
//! GET /api/v1/top_users                        top ten users, all time
//! GET /api/v1/top_users_current_year           top ten users, current year
//! GET /api/v1/document_metrics                 ingestion delay distribution
//! GET /api/v1/archive_status                   retention eligibility summary
//! GET /api/v1/document_counts_by_year          per-origin yearly series
//! GET /api/v1/recent_document_counts_by_month  per-origin monthly series
//! GET /api/v1/document_origins                 raw origin catalogue
//! GET /api/v1/summary                          headline figures
//! GET /api/v1/all_statistics                   consolidated snapshot
//! ```
//!
//! List endpoints return `200` with an empty list when the warehouse has
//! nothing to report; the per-origin series return `404` instead because an
//! empty series for explicitly requested origins means the origins do not
//! exist.

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, stats};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Query string carrying the comma-separated origin selection.
#[derive(Debug, Deserialize)]
pub struct OriginCodesQuery {
    #[serde(default)]
    origin_codes: Option<String>,
}

impl OriginCodesQuery {
    /// Split the selection into raw origin codes.
    ///
    /// # Errors
    /// `invalid_request` when the parameter is missing, empty, or contains
    /// a blank entry; a blank code would silently match nothing and mask a
    /// caller bug.
    fn codes(&self) -> Result<Vec<String>, Error> {
        let raw = self
            .origin_codes
            .as_deref()
            .ok_or_else(|| Error::invalid_request("origin_codes query parameter is required"))?;
        let codes: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .map(ToOwned::to_owned)
            .collect();
        if codes.iter().any(String::is_empty) {
            return Err(Error::invalid_request(
                "origin_codes must be a comma-separated list of non-blank codes",
            ));
        }
        Ok(codes)
    }
}

/// Headline figures for the landing dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Summary {
    pub patient_count: i64,
    pub test_patient_count: i64,
    pub research_patient_count: i64,
    pub celebrity_patient_count: i64,
    /// Sum of distinct document counts across origin categories.
    pub total_document_count: i64,
    /// Same sum restricted to the trailing seven days.
    pub recent_document_count: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/document_counts",
    tags = ["statistics"],
    responses((status = 200, description = "Distinct documents per origin category", body = [stats::DocumentCount]))
)]
#[get("/document_counts")]
pub async fn document_counts(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.stats.document_counts().await))
}

#[utoipa::path(
    get,
    path = "/api/v1/recent_document_counts",
    tags = ["statistics"],
    responses((status = 200, description = "Distinct documents per origin, trailing seven days", body = [stats::DocumentCount]))
)]
#[get("/recent_document_counts")]
pub async fn recent_document_counts(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.stats.recent_document_counts().await))
}

#[utoipa::path(
    get,
    path = "/api/v1/top_users",
    tags = ["statistics"],
    responses((status = 200, description = "Top ten users by query activity", body = [stats::TopUser]))
)]
#[get("/top_users")]
pub async fn top_users(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.stats.top_users(false).await))
}

#[utoipa::path(
    get,
    path = "/api/v1/top_users_current_year",
    tags = ["statistics"],
    responses((status = 200, description = "Top ten users this calendar year", body = [stats::TopUser]))
)]
#[get("/top_users_current_year")]
pub async fn top_users_current_year(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.stats.top_users(true).await))
}

#[utoipa::path(
    get,
    path = "/api/v1/document_metrics",
    tags = ["statistics"],
    responses(
        (status = 200, description = "Ingestion delay distribution in days", body = stats::DocumentMetrics),
        (status = 404, description = "No measurable delays in the window", body = Error)
    )
)]
#[get("/document_metrics")]
pub async fn document_metrics(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let metrics = state
        .stats
        .document_metrics()
        .await
        .ok_or_else(|| Error::not_found("No document metrics available for the current window"))?;
    Ok(HttpResponse::Ok().json(metrics))
}

#[utoipa::path(
    get,
    path = "/api/v1/archive_status",
    tags = ["statistics"],
    responses((status = 200, description = "Retention eligibility summary", body = stats::ArchiveStatus))
)]
#[get("/archive_status")]
pub async fn archive_status(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.stats.archive_status().await))
}

#[utoipa::path(
    get,
    path = "/api/v1/document_counts_by_year",
    tags = ["statistics"],
    params(("origin_codes" = String, Query, description = "Comma-separated raw origin codes")),
    responses(
        (status = 200, description = "Distinct documents per origin and year", body = [stats::YearlyDocumentCount]),
        (status = 400, description = "Missing or blank origin codes", body = Error),
        (status = 404, description = "No documents for the requested origins", body = Error)
    )
)]
#[get("/document_counts_by_year")]
pub async fn document_counts_by_year(
    state: web::Data<HttpState>,
    query: web::Query<OriginCodesQuery>,
) -> ApiResult<HttpResponse> {
    let codes = query.codes()?;
    let counts = state.stats.document_counts_by_year(&codes).await;
    if counts.is_empty() {
        return Err(Error::not_found("No documents for the requested origins"));
    }
    Ok(HttpResponse::Ok().json(counts))
}

#[utoipa::path(
    get,
    path = "/api/v1/recent_document_counts_by_month",
    tags = ["statistics"],
    params(("origin_codes" = String, Query, description = "Comma-separated raw origin codes")),
    responses(
        (status = 200, description = "Distinct documents per origin and month, trailing twelve months", body = [stats::MonthlyDocumentCount]),
        (status = 400, description = "Missing or blank origin codes", body = Error),
        (status = 404, description = "No documents for the requested origins", body = Error)
    )
)]
#[get("/recent_document_counts_by_month")]
pub async fn recent_document_counts_by_month(
    state: web::Data<HttpState>,
    query: web::Query<OriginCodesQuery>,
) -> ApiResult<HttpResponse> {
    let codes = query.codes()?;
    let counts = state.stats.recent_document_counts_by_month(&codes).await;
    if counts.is_empty() {
        return Err(Error::not_found("No documents for the requested origins"));
    }
    Ok(HttpResponse::Ok().json(counts))
}

#[utoipa::path(
    get,
    path = "/api/v1/document_origins",
    tags = ["statistics"],
    responses((status = 200, description = "Distinct raw origin codes, sorted", body = [String]))
)]
#[get("/document_origins")]
pub async fn document_origins(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.stats.document_origins().await))
}

#[utoipa::path(
    get,
    path = "/api/v1/summary",
    tags = ["statistics"],
    responses((status = 200, description = "Headline patient and document figures", body = Summary))
)]
#[get("/summary")]
pub async fn summary(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let (patients, documents, recent) = tokio::join!(
        state.stats.patient_counts(),
        state.stats.document_counts(),
        state.stats.recent_document_counts(),
    );
    let total = |counts: &[stats::DocumentCount]| {
        counts.iter().map(|c| c.unique_document_count).sum::<i64>()
    };
    Ok(HttpResponse::Ok().json(Summary {
        patient_count: patients.patient_count,
        test_patient_count: patients.test_patient_count,
        research_patient_count: patients.research_patient_count,
        celebrity_patient_count: patients.celebrity_patient_count,
        total_document_count: total(&documents),
        recent_document_count: total(&recent),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/all_statistics",
    tags = ["statistics"],
    responses((status = 200, description = "Consolidated statistics snapshot", body = stats::StatsSnapshot))
)]
#[get("/all_statistics")]
pub async fn all_statistics(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.stats.all_statistics().await))
}

/// Register every statistics route under the caller's scope.
pub fn configure(config: &mut web::ServiceConfig) {
    config
        .service(document_counts)
        .service(recent_document_counts)
        .service(top_users)
        .service(top_users_current_year)
        .service(document_metrics)
        .service(archive_status)
        .service(document_counts_by_year)
        .service(recent_document_counts_by_month)
        .service(document_origins)
        .service(summary)
        .service(all_statistics);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use mockable::MockClock;
    use rstest::rstest;

    use super::*;
    use crate::domain::cache::TtlCache;
    use crate::domain::ports::{Row, Scalar, SelectStatement, WarehouseError, WarehouseGateway};
    use crate::domain::{ArchiveScan, StatsService};

    /// Gateway answering every statement with canned rows per label.
    struct CannedGateway;

    #[async_trait]
    impl WarehouseGateway for CannedGateway {
        async fn select(&self, statement: &SelectStatement) -> Result<Vec<Row>, WarehouseError> {
            Ok(match statement.label() {
                "patient_cohorts" => vec![
                    vec![Scalar::Int(1), Scalar::Text("TEST".to_owned())],
                    vec![Scalar::Int(2), Scalar::Text("DURAND".to_owned())],
                ],
                "document_origin_pairs" => vec![
                    vec![Scalar::Text("LAB".to_owned()), Scalar::Int(1)],
                    vec![Scalar::Text("LAB".to_owned()), Scalar::Int(2)],
                ],
                "recent_document_origin_pairs" => {
                    vec![vec![Scalar::Text("LAB".to_owned()), Scalar::Int(1)]]
                }
                "yearly_document_counts" => vec![vec![
                    Scalar::Text("LAB".to_owned()),
                    Scalar::Int(1),
                    Scalar::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
                ]],
                _ => Vec::new(),
            })
        }
    }

    struct EmptyGateway;

    #[async_trait]
    impl WarehouseGateway for EmptyGateway {
        async fn select(&self, _statement: &SelectStatement) -> Result<Vec<Row>, WarehouseError> {
            Ok(Vec::new())
        }
    }

    fn state_with(gateway: impl WarehouseGateway + 'static) -> web::Data<HttpState> {
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .returning(|| Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap());
        let clock = Arc::new(clock);
        let cache = Arc::new(TtlCache::new(3600, 64, clock.clone()));
        let service = StatsService::new(Arc::new(gateway), cache, clock, ArchiveScan::Full);
        web::Data::new(HttpState::new(Arc::new(service)))
    }

    macro_rules! app {
        ($gateway:expr) => {
            test::init_service(
                App::new()
                    .app_data(state_with($gateway))
                    .service(web::scope("/api/v1").configure(configure)),
            )
            .await
        };
    }

    #[rstest]
    #[tokio::test]
    async fn document_counts_returns_grouped_list() {
        let app = app!(CannedGateway);
        let request = test::TestRequest::get()
            .uri("/api/v1/document_counts")
            .to_request();
        let body: Vec<stats::DocumentCount> = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].unique_document_count, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_list_endpoints_stay_200() {
        let app = app!(EmptyGateway);
        let request = test::TestRequest::get()
            .uri("/api/v1/document_counts")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), actix_web::http::StatusCode::OK);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_metrics_yield_404() {
        let app = app!(EmptyGateway);
        let request = test::TestRequest::get()
            .uri("/api/v1/document_metrics")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case("/api/v1/document_counts_by_year")]
    #[case("/api/v1/recent_document_counts_by_month")]
    #[tokio::test]
    async fn missing_origin_codes_yield_400(#[case] path: &str) {
        let app = app!(CannedGateway);
        let request = test::TestRequest::get().uri(path).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_origin_code_yields_400() {
        let app = app!(CannedGateway);
        let request = test::TestRequest::get()
            .uri("/api/v1/document_counts_by_year?origin_codes=LAB,,SCAN")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_origins_yield_404() {
        let app = app!(EmptyGateway);
        let request = test::TestRequest::get()
            .uri("/api/v1/document_counts_by_year?origin_codes=NOPE")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn known_origins_return_the_series() {
        let app = app!(CannedGateway);
        let request = test::TestRequest::get()
            .uri("/api/v1/document_counts_by_year?origin_codes=LAB")
            .to_request();
        let body: Vec<stats::YearlyDocumentCount> =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].year, 2024);
    }

    #[rstest]
    #[tokio::test]
    async fn summary_derives_totals_from_grouped_counts() {
        let app = app!(CannedGateway);
        let request = test::TestRequest::get().uri("/api/v1/summary").to_request();
        let body: Summary = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body.patient_count, 2);
        assert_eq!(body.test_patient_count, 1);
        assert_eq!(body.total_document_count, 2);
        assert_eq!(body.recent_document_count, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn snapshot_endpoint_always_assembles() {
        let app = app!(EmptyGateway);
        let request = test::TestRequest::get()
            .uri("/api/v1/all_statistics")
            .to_request();
        let body: stats::StatsSnapshot = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body.patient_count, 0);
        assert!(body.document_counts.is_empty());
    }
}
