//! Server assembly: configuration loaded via OrthoConfig.

pub mod config;
