//! HTTP inbound adapter exposing the statistics REST endpoints.

pub mod error;
pub mod health;
pub mod state;
pub mod stats;

pub use error::ApiResult;
