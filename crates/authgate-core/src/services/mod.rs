//! Gateway services - window counting, admission and orchestration.

mod gateway;
mod rate_limiter;
pub mod window_counter;

pub use gateway::{AuthGateway, AuthRequest, GatewayConfig, Phase, UNKNOWN_ADDRESS};
pub use rate_limiter::LedgerRateLimiter;
