//! Service configuration loaded via OrthoConfig.
//!
//! Values layer CLI arguments over `DWH_`-prefixed environment variables
//! over an optional configuration file. Every knob except the warehouse
//! URL has a production default.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;

use crate::domain::ArchiveScan;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime settings for the monitoring backend.
///
/// The numeric knobs carry derive-level defaults so an empty
/// configuration (no CLI arguments, no environment, no file) still
/// deserialises; the remaining fields default through their accessors.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DWH")]
pub struct Settings {
    /// Postgres connection URL for the warehouse (read-only role).
    pub database_url: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Upper bound on pooled warehouse connections.
    #[ortho_config(default = 10)]
    pub max_connections: u32,
    /// Seconds an aggregation result stays cached.
    #[ortho_config(default = 3600)]
    pub cache_ttl_seconds: i64,
    /// Maximum number of cached aggregation results.
    #[ortho_config(default = 128)]
    pub cache_max_size: usize,
    /// Archive scan strategy: `full` (default) or `chunked`.
    pub archive_scan: Option<String>,
}

impl Settings {
    /// Warehouse URL; startup fails without one.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn cache_ttl_seconds(&self) -> i64 {
        self.cache_ttl_seconds
    }

    pub fn cache_max_size(&self) -> usize {
        self.cache_max_size
    }

    /// Parse the archive scan strategy, warning on unrecognised values.
    pub fn archive_scan(&self) -> ArchiveScan {
        match self.archive_scan.as_deref() {
            None => ArchiveScan::Full,
            Some(value) if value.eq_ignore_ascii_case("full") => ArchiveScan::Full,
            Some(value) if value.eq_ignore_ascii_case("chunked") => ArchiveScan::Chunked,
            Some(other) => {
                warn!(value = other, "unknown archive_scan value; using full scan");
                ArchiveScan::Full
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> Settings {
        Settings::load_from_iter([OsString::from("backend")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env([
            ("DWH_DATABASE_URL", None::<String>),
            ("DWH_BIND_ADDR", None::<String>),
            ("DWH_MAX_CONNECTIONS", None::<String>),
            ("DWH_CACHE_TTL_SECONDS", None::<String>),
            ("DWH_CACHE_MAX_SIZE", None::<String>),
            ("DWH_ARCHIVE_SCAN", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert!(settings.database_url().is_none());
        assert_eq!(settings.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.max_connections(), 10);
        assert_eq!(settings.cache_ttl_seconds(), 3600);
        assert_eq!(settings.cache_max_size(), 128);
        assert_eq!(settings.archive_scan(), ArchiveScan::Full);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "DWH_DATABASE_URL",
                Some("postgres://stats_ro@dwh/warehouse".to_owned()),
            ),
            ("DWH_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            ("DWH_MAX_CONNECTIONS", Some("4".to_owned())),
            ("DWH_CACHE_TTL_SECONDS", Some("60".to_owned())),
            ("DWH_CACHE_MAX_SIZE", Some("8".to_owned())),
            ("DWH_ARCHIVE_SCAN", Some("chunked".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.database_url(),
            Some("postgres://stats_ro@dwh/warehouse")
        );
        assert_eq!(settings.bind_addr(), "127.0.0.1:9090");
        assert_eq!(settings.max_connections(), 4);
        assert_eq!(settings.cache_ttl_seconds(), 60);
        assert_eq!(settings.cache_max_size(), 8);
        assert_eq!(settings.archive_scan(), ArchiveScan::Chunked);
    }

    #[rstest]
    #[case(Some("FULL"), ArchiveScan::Full)]
    #[case(Some("Chunked"), ArchiveScan::Chunked)]
    #[case(Some("bogus"), ArchiveScan::Full)]
    #[case(None, ArchiveScan::Full)]
    fn archive_scan_parsing(#[case] value: Option<&str>, #[case] expected: ArchiveScan) {
        let settings = Settings {
            database_url: None,
            bind_addr: None,
            max_connections: 10,
            cache_ttl_seconds: 3600,
            cache_max_size: 128,
            archive_scan: value.map(ToOwned::to_owned),
        };
        assert_eq!(settings.archive_scan(), expected);
    }
}
