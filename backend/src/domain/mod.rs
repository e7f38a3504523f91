//! Domain layer: aggregation logic and its ports.
//!
//! Purpose: everything the statistics service computes lives here, free of
//! HTTP and database driver types. The warehouse is reached through the
//! [`ports::WarehouseGateway`] port; adapters sit in `outbound`, handlers
//! in `inbound`.
//!
//! Public surface:
//! - Error / ErrorCode — API error payload and stable identifiers.
//! - StatsService / ArchiveScan — aggregation functions and orchestrator.
//! - TtlCache / CacheKey — bounded in-process memoisation.
//! - QueryExecutor — fail-empty statement execution.
//! - The payload types in [`stats`].

pub mod cache;
pub mod error;
pub mod executor;
pub mod origin;
pub mod percentile;
pub mod ports;
pub mod stats;
pub mod stats_service;


pub use self::cache::{CacheKey, TtlCache};
pub use self::error::{Error, ErrorCode};
pub use self::executor::QueryExecutor;
pub use self::stats_service::{ArchiveScan, StatsService};
