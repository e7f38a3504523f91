//! Inbound adapters translating external requests into domain calls while
//! keeping framework details at the edge. HTTP is the only transport.

pub mod http;
