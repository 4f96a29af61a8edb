//! Middleware modules.

pub mod client_ip;
pub mod cors;
pub mod error;
pub mod throttle;
