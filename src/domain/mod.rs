//! Domain types and the ports the application layer depends on.

pub mod facility;
pub mod geo;
pub mod location;
pub mod payment;
pub mod ports;
pub mod webhook;
