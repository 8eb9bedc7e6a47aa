//! Per-client token bucket rate limiter with full-window refill and an
//! idle-bucket pruner (component D).

mod bucket;
mod config;
mod error;
mod events;
mod limiter;
pub mod pruner;

pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::RateLimiterError;
pub use events::RateLimiterEvent;
pub use limiter::RateLimiter;
