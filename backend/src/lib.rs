//! Monitoring backend for the clinical data warehouse.
//!
//! Hexagonal layout: the aggregation logic lives in [`domain`], reached
//! over HTTP through [`inbound::http`], with the Postgres warehouse behind
//! the gateway port in [`outbound::warehouse`]. [`server`] holds the
//! runtime configuration and [`doc`] the OpenAPI surface.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod server;
