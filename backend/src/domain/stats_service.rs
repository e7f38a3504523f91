//! Warehouse statistics aggregation and orchestration.
//!
//! Each aggregation is a read-only projection over the warehouse: fetch
//! rows through the fail-empty [`QueryExecutor`], then normalise, window,
//! and count in process. Every function degrades to its typed zero value
//! when the warehouse yields nothing, so callers compose results without
//! error handling and a consolidated snapshot never aborts on a single
//! failing metric.
//!
//! Time windows are computed from the injected clock and passed to the
//! warehouse as bind parameters; no statement references the database's
//! own notion of "now".

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::cache::{CacheKey, TtlCache};
use crate::domain::executor::QueryExecutor;
use crate::domain::origin::normalize_origin_key;
use crate::domain::percentile::{percentile, round2};
use crate::domain::ports::{Scalar, SelectStatement, WarehouseGateway};
use crate::domain::stats::{
    ArchiveStatus, DocumentCount, DocumentMetrics, MonthlyDocumentCount, OriginSuppressCount,
    PatientCounts, StatsSnapshot, TopUser, YearlyDocumentCount,
};

/// Last name marking test patient records.
const TEST_LASTNAME: &str = "TEST";
/// Last name marking research patient records.
const RESEARCH_LASTNAME: &str = "FLEUR";
/// Last name marking celebrity patient records.
const CELEBRITY_LASTNAME: &str = "INSECTE";

/// Origin excluded from delay metrics: appointment notices are rewritten
/// on every sync and would drown the distribution in noise.
const EXCLUDED_DELAY_ORIGIN: &str = "RDV_DOCTOLIB";

/// Window for "recent" document counts.
const RECENT_WINDOW_DAYS: i64 = 7;

/// Retention threshold: documents untouched for longer are suppression
/// candidates.
const RETENTION_MONTHS: u32 = 240;

/// How far below the retention cutoff the chunked archive scan starts
/// using one-year windows; everything older is covered by one leading
/// unbounded window.
const CHUNK_LOOKBACK_MONTHS: u32 = 120;

/// Entries kept in the top-users ranking.
const TOP_USER_LIMIT: usize = 10;

/// Synthetic user name the internal accounts collapse into.
const CODOC_LABEL: &str = "CODOC";

const DAYS_PER_YEAR: f64 = 365.25;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Full names (`firstname lastname`) of internal and support accounts.
/// Their query-log activity is reported as the single synthetic user
/// [`CODOC_LABEL`] so the ranking reflects actual warehouse users.
const CODOC_ACCOUNTS: [&str; 20] = [
    "admin admin",
    "admin2 admin2",
    "Demo Nicolas",
    "ADMIN_ANONYM",
    "Fannie Lothaire",
    "Nicolas Garcelon",
    "codon admin",
    "codoc support",
    "Virgin Bitton",
    "Gabriel Silva",
    "Margaux Peschiera",
    "Antoine Motte",
    "Paul Montecot",
    "Julien Terver",
    "Thomas Pagoet",
    "Sofia Houriez--Gombaud-Saintonge",
    "Roxanne Schmidt",
    "Phillipe Fernandez",
    "Tanguy De Poix",
    "Charlotte Monthéan",
];

const PATIENT_COHORTS_SQL: &str = "\
SELECT DISTINCT patient_num, lastname FROM dwh.dwh_patient";

const DOCUMENT_PAIRS_SQL: &str = "\
SELECT document_origin_code, document_num FROM dwh.dwh_document";

const RECENT_DOCUMENT_PAIRS_SQL: &str = "\
SELECT document_origin_code, document_num FROM dwh.dwh_document
WHERE update_date >= $1";

const TOP_USERS_SQL: &str = "\
SELECT u.firstname, u.lastname, COUNT(*) AS query_count
FROM dwh.dwh_log_query l
JOIN dwh.dwh_user u ON l.user_num = u.user_num
GROUP BY u.firstname, u.lastname
ORDER BY query_count DESC";

const TOP_USERS_CURRENT_YEAR_SQL: &str = "\
SELECT u.firstname, u.lastname, COUNT(*) AS query_count
FROM dwh.dwh_log_query l
JOIN dwh.dwh_user u ON l.user_num = u.user_num
WHERE l.log_date >= $1 AND l.log_date < $2
GROUP BY u.firstname, u.lastname
ORDER BY query_count DESC";

const DOCUMENT_DELAYS_SQL: &str = "\
SELECT document_date, update_date
FROM dwh.dwh_document
WHERE update_date >= $1
  AND document_date IS NOT NULL
  AND update_date IS NOT NULL
  AND document_origin_code IS DISTINCT FROM $2";

const ARCHIVE_OLDEST_SQL: &str = "\
SELECT MIN(update_date) FROM dwh.dwh_document";

const ARCHIVE_SUPPRESS_TOTAL_SQL: &str = "\
SELECT COUNT(*) FROM dwh.dwh_document WHERE update_date < $1";

const ARCHIVE_SUPPRESS_BY_ORIGIN_SQL: &str = "\
SELECT document_origin_code, COUNT(*) AS documents_to_suppress
FROM dwh.dwh_document
WHERE update_date < $1
GROUP BY document_origin_code
ORDER BY documents_to_suppress DESC";

const ARCHIVE_CHUNK_BEFORE_SQL: &str = "\
SELECT document_origin_code, COUNT(*), MIN(update_date)
FROM dwh.dwh_document
WHERE update_date < $1
GROUP BY document_origin_code";

const ARCHIVE_CHUNK_WINDOW_SQL: &str = "\
SELECT document_origin_code, COUNT(*), MIN(update_date)
FROM dwh.dwh_document
WHERE update_date >= $1 AND update_date < $2
GROUP BY document_origin_code";

const ARCHIVE_CHUNK_TAIL_SQL: &str = "\
SELECT document_origin_code, COUNT(*), MIN(update_date)
FROM dwh.dwh_document
WHERE update_date >= $1
GROUP BY document_origin_code";

const YEARLY_DOCUMENT_COUNTS_SQL: &str = "\
SELECT document_origin_code, document_num, update_date
FROM dwh.dwh_document
WHERE document_origin_code = ANY($1) AND update_date IS NOT NULL";

const MONTHLY_DOCUMENT_COUNTS_SQL: &str = "\
SELECT document_origin_code, document_num, document_date
FROM dwh.dwh_document
WHERE document_origin_code = ANY($1)
  AND document_date >= $2 AND document_date < $3";

const DOCUMENT_ORIGINS_SQL: &str = "\
SELECT DISTINCT document_origin_code FROM dwh.dwh_document
WHERE document_origin_code IS NOT NULL";

/// Strategy for the archive-eligibility scan.
///
/// Both strategies produce identical results; chunking bounds the size of
/// each warehouse read on very large document tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveScan {
    /// Three whole-table aggregate statements.
    #[default]
    Full,
    /// Sequential windows accumulating the same aggregates.
    Chunked,
}

/// Aggregation functions and the snapshot orchestrator.
///
/// One instance per process, shared behind `Arc`; all state (cache, clock,
/// gateway) is constructor-injected.
pub struct StatsService {
    executor: QueryExecutor,
    cache: Arc<TtlCache>,
    clock: Arc<dyn Clock>,
    archive_scan: ArchiveScan,
}

impl StatsService {
    /// Assemble the service from its collaborators.
    pub fn new(
        gateway: Arc<dyn WarehouseGateway>,
        cache: Arc<TtlCache>,
        clock: Arc<dyn Clock>,
        archive_scan: ArchiveScan,
    ) -> Self {
        Self {
            executor: QueryExecutor::new(gateway),
            cache,
            clock,
            archive_scan,
        }
    }

    /// Distinct patient counts split into quality cohorts.
    pub async fn patient_counts(&self) -> PatientCounts {
        let key = CacheKey::new("patient_counts", &());
        self.cache
            .get_or_compute(key, || self.load_patient_counts())
            .await
    }

    /// Distinct document counts per normalised origin, largest first.
    pub async fn document_counts(&self) -> Vec<DocumentCount> {
        let key = CacheKey::new("document_counts", &(false,));
        self.cache
            .get_or_compute(key, || self.load_document_counts(false))
            .await
    }

    /// Like [`Self::document_counts`], restricted to documents updated in
    /// the trailing seven days.
    pub async fn recent_document_counts(&self) -> Vec<DocumentCount> {
        let key = CacheKey::new("document_counts", &(true,));
        self.cache
            .get_or_compute(key, || self.load_document_counts(true))
            .await
    }

    /// Top ten warehouse users by query-log activity, internal accounts
    /// collapsed into the synthetic `CODOC` user. With `current_year` the
    /// ranking only considers log entries from the clock's current
    /// calendar year.
    pub async fn top_users(&self, current_year: bool) -> Vec<TopUser> {
        let key = CacheKey::new("top_users", &(current_year,));
        self.cache
            .get_or_compute(key, || self.load_top_users(current_year))
            .await
    }

    /// Ingestion delay distribution for documents updated since the start
    /// of the previous calendar month.
    ///
    /// Returns `None` when the window holds no measurable delays (or the
    /// warehouse is unreachable). Negative delays are valid data points:
    /// a document updated before its nominal creation date is exactly the
    /// kind of anomaly this metric exists to surface.
    pub async fn document_metrics(&self) -> Option<DocumentMetrics> {
        let key = CacheKey::new("document_metrics", &());
        self.cache
            .get_or_compute(key, || self.load_document_metrics())
            .await
    }

    /// Age of the oldest document and the volume eligible for archival
    /// suppression, grouped by raw origin code. The scan reads the whole
    /// document table, so results are cached like the other aggregations.
    pub async fn archive_status(&self) -> ArchiveStatus {
        let key = CacheKey::new("archive_status", &());
        self.cache
            .get_or_compute(key, || self.load_archive_status())
            .await
    }

    async fn load_document_metrics(&self) -> Option<DocumentMetrics> {
        let now = self.clock.utc();
        let window_start = sub_months(month_start(now), 1);
        let statement = SelectStatement::new("document_delays", DOCUMENT_DELAYS_SQL)
            .bind(window_start)
            .bind(EXCLUDED_DELAY_ORIGIN);
        let rows = self.executor.rows(&statement).await;

        let mut delays: Vec<f64> = rows
            .iter()
            .filter_map(|row| {
                let created = row.first().and_then(Scalar::as_timestamp)?;
                let updated = row.get(1).and_then(Scalar::as_timestamp)?;
                let days = (updated - created).num_seconds() as f64 / SECONDS_PER_DAY;
                Some(round2(days))
            })
            .collect();
        if delays.is_empty() {
            return None;
        }
        delays.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let sum: f64 = delays.iter().sum();
        let mean = sum / delays.len() as f64;
        Some(DocumentMetrics {
            min_delay: *delays.first()?,
            q1: percentile(&delays, 0.25)?,
            median: percentile(&delays, 0.5)?,
            q3: percentile(&delays, 0.75)?,
            max_delay: *delays.last()?,
            avg_delay: round2(mean),
        })
    }

    async fn load_archive_status(&self) -> ArchiveStatus {
        let now = self.clock.utc();
        let cutoff = sub_months(now, RETENTION_MONTHS);
        let scan = match self.archive_scan {
            ArchiveScan::Full => self.full_archive_scan(cutoff).await,
            ArchiveScan::Chunked => self.chunked_archive_scan(now, cutoff).await,
        };

        let archive_period = scan
            .oldest
            .map_or(0.0, |oldest| (now - oldest).num_days() as f64 / DAYS_PER_YEAR);

        let mut breakdown: Vec<OriginSuppressCount> = scan
            .per_origin
            .into_iter()
            .map(|(origin, count)| OriginSuppressCount {
                document_origin_code: origin,
                documents_to_suppress: count,
            })
            .collect();
        breakdown.sort_by(|a, b| {
            b.documents_to_suppress
                .cmp(&a.documents_to_suppress)
                .then_with(|| a.document_origin_code.cmp(&b.document_origin_code))
        });

        ArchiveStatus {
            archive_period,
            total_documents_to_suppress: scan.total,
            documents_to_suppress: breakdown,
        }
    }

    /// Distinct raw origin codes present in the warehouse, sorted.
    ///
    /// The origin list changes rarely and feeds every per-origin series,
    /// so it is cached like the other aggregations.
    pub async fn document_origins(&self) -> Vec<String> {
        let key = CacheKey::new("document_origins", &());
        self.cache
            .get_or_compute(key, || self.load_document_origins())
            .await
    }

    /// Distinct documents per (origin, year of last update), ascending.
    pub async fn document_counts_by_year(
        &self,
        origin_codes: &[String],
    ) -> Vec<YearlyDocumentCount> {
        if origin_codes.is_empty() {
            return Vec::new();
        }
        let statement = SelectStatement::new("yearly_document_counts", YEARLY_DOCUMENT_COUNTS_SQL)
            .bind(origin_codes.to_vec());
        let rows = self.executor.rows(&statement).await;

        let mut groups: HashMap<(String, i32), HashSet<i64>> = HashMap::new();
        for row in &rows {
            let (Some(origin), Some(document), Some(updated)) = (
                row.first().and_then(Scalar::as_text),
                row.get(1).and_then(Scalar::as_i64),
                row.get(2).and_then(Scalar::as_timestamp),
            ) else {
                continue;
            };
            groups
                .entry((origin.to_owned(), updated.year()))
                .or_default()
                .insert(document);
        }

        let mut counts: Vec<YearlyDocumentCount> = groups
            .into_iter()
            .map(|((origin, year), documents)| YearlyDocumentCount {
                document_origin_code: origin,
                year,
                count: documents.len() as i64,
            })
            .collect();
        counts.sort_by(|a, b| {
            a.document_origin_code
                .cmp(&b.document_origin_code)
                .then_with(|| a.year.cmp(&b.year))
        });
        counts
    }

    /// Distinct documents per (origin, month of creation) over the
    /// trailing twelve months, ascending.
    ///
    /// The window runs from the start of the month eleven months ago up
    /// to the end of the current (partial) month.
    pub async fn recent_document_counts_by_month(
        &self,
        origin_codes: &[String],
    ) -> Vec<MonthlyDocumentCount> {
        if origin_codes.is_empty() {
            return Vec::new();
        }
        let current_month = month_start(self.clock.utc());
        let statement =
            SelectStatement::new("monthly_document_counts", MONTHLY_DOCUMENT_COUNTS_SQL)
                .bind(origin_codes.to_vec())
                .bind(sub_months(current_month, 11))
                .bind(add_months(current_month, 1));
        let rows = self.executor.rows(&statement).await;

        let mut groups: HashMap<(String, NaiveDate), HashSet<i64>> = HashMap::new();
        for row in &rows {
            let (Some(origin), Some(document), Some(created)) = (
                row.first().and_then(Scalar::as_text),
                row.get(1).and_then(Scalar::as_i64),
                row.get(2).and_then(Scalar::as_timestamp),
            ) else {
                continue;
            };
            let Some(month) = NaiveDate::from_ymd_opt(created.year(), created.month(), 1) else {
                continue;
            };
            groups
                .entry((origin.to_owned(), month))
                .or_default()
                .insert(document);
        }

        let mut counts: Vec<MonthlyDocumentCount> = groups
            .into_iter()
            .map(|((origin, month), documents)| MonthlyDocumentCount {
                document_origin_code: origin,
                month,
                count: documents.len() as i64,
            })
            .collect();
        counts.sort_by(|a, b| {
            a.document_origin_code
                .cmp(&b.document_origin_code)
                .then_with(|| a.month.cmp(&b.month))
        });
        counts
    }

    /// Assemble one consolidated snapshot.
    ///
    /// The origin list is resolved first because the per-origin series
    /// need it as input; everything else then runs concurrently and joins
    /// before returning. A failing metric contributes its empty default,
    /// never an error.
    pub async fn all_statistics(&self) -> StatsSnapshot {
        let document_origins = self.document_origins().await;

        let (
            patients,
            document_counts,
            recent_document_counts,
            top_users,
            top_users_current_year,
            document_metrics,
            archive_status,
            document_counts_by_year,
            recent_document_counts_by_month,
        ) = tokio::join!(
            self.patient_counts(),
            self.document_counts(),
            self.recent_document_counts(),
            self.top_users(false),
            self.top_users(true),
            self.document_metrics(),
            self.archive_status(),
            self.document_counts_by_year(&document_origins),
            self.recent_document_counts_by_month(&document_origins),
        );

        StatsSnapshot {
            patient_count: patients.patient_count,
            test_patient_count: patients.test_patient_count,
            research_patient_count: patients.research_patient_count,
            celebrity_patient_count: patients.celebrity_patient_count,
            document_counts,
            recent_document_counts,
            top_users,
            top_users_current_year,
            document_metrics,
            archive_status,
            document_origins,
            document_counts_by_year,
            recent_document_counts_by_month,
        }
    }

    async fn load_patient_counts(&self) -> PatientCounts {
        let statement = SelectStatement::new("patient_cohorts", PATIENT_COHORTS_SQL);
        let rows = self.executor.rows(&statement).await;

        let mut all = HashSet::new();
        let mut test = HashSet::new();
        let mut research = HashSet::new();
        let mut celebrity = HashSet::new();
        for row in &rows {
            let Some(patient) = row.first().and_then(Scalar::as_i64) else {
                continue;
            };
            all.insert(patient);
            match row.get(1).and_then(Scalar::as_text) {
                Some(name) if name == TEST_LASTNAME => {
                    test.insert(patient);
                }
                Some(name) if name == RESEARCH_LASTNAME => {
                    research.insert(patient);
                }
                Some(name) if name == CELEBRITY_LASTNAME => {
                    celebrity.insert(patient);
                }
                _ => {}
            }
        }

        PatientCounts {
            patient_count: all.len() as i64,
            test_patient_count: test.len() as i64,
            research_patient_count: research.len() as i64,
            celebrity_patient_count: celebrity.len() as i64,
        }
    }

    async fn load_document_counts(&self, recent: bool) -> Vec<DocumentCount> {
        let statement = if recent {
            let window_start = self.clock.utc() - TimeDelta::days(RECENT_WINDOW_DAYS);
            SelectStatement::new("recent_document_origin_pairs", RECENT_DOCUMENT_PAIRS_SQL)
                .bind(window_start)
        } else {
            SelectStatement::new("document_origin_pairs", DOCUMENT_PAIRS_SQL)
        };
        let rows = self.executor.rows(&statement).await;

        // Distinct document ids per normalised origin. A document carrying
        // two raw codes from the same family counts once in the category.
        let mut groups: HashMap<Option<String>, HashSet<i64>> = HashMap::new();
        for row in &rows {
            let Some(document) = row.get(1).and_then(Scalar::as_i64) else {
                continue;
            };
            let origin = normalize_origin_key(row.first().and_then(Scalar::as_text));
            groups.entry(origin).or_default().insert(document);
        }

        let mut counts: Vec<DocumentCount> = groups
            .into_iter()
            .map(|(origin, documents)| DocumentCount {
                document_origin_code: origin,
                unique_document_count: documents.len() as i64,
            })
            .collect();
        counts.sort_by(|a, b| {
            b.unique_document_count
                .cmp(&a.unique_document_count)
                .then_with(|| a.document_origin_code.cmp(&b.document_origin_code))
        });
        counts
    }

    async fn load_top_users(&self, current_year: bool) -> Vec<TopUser> {
        let statement = if current_year {
            let year = self.clock.utc().year();
            SelectStatement::new("top_user_counts_current_year", TOP_USERS_CURRENT_YEAR_SQL)
                .bind(utc_date(year, 1, 1))
                .bind(utc_date(year + 1, 1, 1))
        } else {
            SelectStatement::new("top_user_counts", TOP_USERS_SQL)
        };
        let rows = self.executor.rows(&statement).await;

        let mut ranking: Vec<TopUser> = Vec::new();
        let mut codoc_index: Option<usize> = None;
        for row in &rows {
            let (Some(firstname), Some(lastname), Some(count)) = (
                row.first().and_then(Scalar::as_text),
                row.get(1).and_then(Scalar::as_text),
                row.get(2).and_then(Scalar::as_i64),
            ) else {
                continue;
            };
            let full_name = format!("{firstname} {lastname}");
            if CODOC_ACCOUNTS.contains(&full_name.as_str()) {
                match codoc_index {
                    Some(index) => {
                        if let Some(entry) = ranking.get_mut(index) {
                            entry.query_count += count;
                        }
                    }
                    None => {
                        codoc_index = Some(ranking.len());
                        ranking.push(TopUser {
                            firstname: CODOC_LABEL.to_owned(),
                            lastname: CODOC_LABEL.to_owned(),
                            query_count: count,
                        });
                    }
                }
            } else {
                ranking.push(TopUser {
                    firstname: firstname.to_owned(),
                    lastname: lastname.to_owned(),
                    query_count: count,
                });
            }
        }

        // Stable sort keeps encounter order for equal counts.
        ranking.sort_by(|a, b| b.query_count.cmp(&a.query_count));
        ranking.truncate(TOP_USER_LIMIT);
        ranking
    }

    async fn load_document_origins(&self) -> Vec<String> {
        let statement = SelectStatement::new("document_origins", DOCUMENT_ORIGINS_SQL);
        let rows = self.executor.rows(&statement).await;
        let mut origins: Vec<String> = rows
            .iter()
            .filter_map(|row| row.first().and_then(Scalar::as_text))
            .map(ToOwned::to_owned)
            .collect();
        origins.sort();
        origins
    }

    async fn full_archive_scan(&self, cutoff: DateTime<Utc>) -> ArchiveScanAccumulator {
        let oldest = self
            .executor
            .single_row(&SelectStatement::new("archive_oldest", ARCHIVE_OLDEST_SQL))
            .await
            .and_then(|row| row.first().and_then(Scalar::as_timestamp));

        let total = self
            .executor
            .single_row(
                &SelectStatement::new("archive_suppress_total", ARCHIVE_SUPPRESS_TOTAL_SQL)
                    .bind(cutoff),
            )
            .await
            .and_then(|row| row.first().and_then(Scalar::as_i64))
            .unwrap_or(0);

        let rows = self
            .executor
            .rows(
                &SelectStatement::new(
                    "archive_suppress_by_origin",
                    ARCHIVE_SUPPRESS_BY_ORIGIN_SQL,
                )
                .bind(cutoff),
            )
            .await;
        let mut per_origin: HashMap<Option<String>, i64> = HashMap::new();
        for row in &rows {
            let Some(count) = row.get(1).and_then(Scalar::as_i64) else {
                continue;
            };
            let origin = row.first().and_then(Scalar::as_text).map(ToOwned::to_owned);
            *per_origin.entry(origin).or_default() += count;
        }

        ArchiveScanAccumulator {
            oldest,
            total,
            per_origin,
        }
    }

    /// Chunked equivalent of [`Self::full_archive_scan`].
    ///
    /// Windows: one unbounded leading window below `cutoff − 10 years`,
    /// then one-year windows up to the cutoff, the cutoff boundary itself,
    /// one-year windows up to `now`, and an unbounded tail. The cutoff is
    /// always a window boundary, so no window straddles the suppression
    /// threshold and the accumulated result matches the unchunked scan
    /// exactly.
    async fn chunked_archive_scan(
        &self,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> ArchiveScanAccumulator {
        let mut accumulator = ArchiveScanAccumulator::default();
        let scan_start = sub_months(cutoff, CHUNK_LOOKBACK_MONTHS);

        let before = SelectStatement::new("archive_chunk_before", ARCHIVE_CHUNK_BEFORE_SQL)
            .bind(scan_start);
        accumulator.absorb(&self.executor.rows(&before).await, true);

        let mut lower = scan_start;
        while lower < cutoff {
            let upper = add_months(lower, 12).min(cutoff);
            let window = SelectStatement::new("archive_chunk_window", ARCHIVE_CHUNK_WINDOW_SQL)
                .bind(lower)
                .bind(upper);
            accumulator.absorb(&self.executor.rows(&window).await, true);
            lower = upper;
        }
        while lower < now {
            let upper = add_months(lower, 12);
            let window = SelectStatement::new("archive_chunk_window", ARCHIVE_CHUNK_WINDOW_SQL)
                .bind(lower)
                .bind(upper);
            accumulator.absorb(&self.executor.rows(&window).await, false);
            lower = upper;
        }

        let tail =
            SelectStatement::new("archive_chunk_tail", ARCHIVE_CHUNK_TAIL_SQL).bind(lower);
        accumulator.absorb(&self.executor.rows(&tail).await, false);

        accumulator
    }
}

/// Running state of an archive scan, shared by both strategies.
#[derive(Debug, Default)]
struct ArchiveScanAccumulator {
    oldest: Option<DateTime<Utc>>,
    total: i64,
    per_origin: HashMap<Option<String>, i64>,
}

impl ArchiveScanAccumulator {
    /// Fold one window's `(origin, count, oldest update)` rows into the
    /// running totals. Counts only contribute to the suppression figures
    /// when the window lies entirely below the retention cutoff.
    fn absorb(&mut self, rows: &[Vec<Scalar>], counts_toward_suppression: bool) {
        for row in rows {
            if let Some(window_oldest) = row.get(2).and_then(Scalar::as_timestamp) {
                self.oldest = Some(match self.oldest {
                    Some(current) => current.min(window_oldest),
                    None => window_oldest,
                });
            }
            if counts_toward_suppression {
                let Some(count) = row.get(1).and_then(Scalar::as_i64) else {
                    continue;
                };
                let origin = row.first().and_then(Scalar::as_text).map(ToOwned::to_owned);
                self.total += count;
                *self.per_origin.entry(origin).or_default() += count;
            }
        }
    }
}

/// Midnight UTC for a calendar date.
///
/// Callers only pass month boundaries, which always exist; an impossible
/// date degrades to the epoch minimum rather than panicking.
fn utc_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(DateTime::<Utc>::MIN_UTC, |naive| Utc.from_utc_datetime(&naive))
}

/// First instant of the month containing `now`.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    utc_date(now.year(), now.month(), 1)
}

fn sub_months(timestamp: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    timestamp
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn add_months(timestamp: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    timestamp
        .checked_add_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
