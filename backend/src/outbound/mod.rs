//! Outbound adapters implementing the domain's driven ports against real
//! infrastructure. Only the warehouse gateway exists today; it keeps every
//! `sqlx` type on this side of the boundary.

pub mod warehouse;
