//! Inbound surfaces: the CSV facility table and the HTTP API.

pub mod csv;
pub mod http;
