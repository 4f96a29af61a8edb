//! # Authgate Shared
//!
//! Wire types for the gateway's HTTP API, shared by the server and any
//! Rust client.

pub mod dto;
pub mod response;

pub use dto::{AuthRequestBody, AuthSuccessBody, PasswordChangeRequest, SessionBody, UserBody};
pub use response::{AcceptedResponse, ErrorBody, HealthResponse};
