//! Time-windowed circuit breaker with stale-cache and synthetic fallback
//! (component B), with optional cross-restart persistence.

mod breaker;
pub mod classify;
mod config;
mod error;
mod events;
#[cfg(feature = "persistence")]
pub mod persistence;
mod state;
mod window;

pub use breaker::{CircuitBreaker, DetailedStatus, StaleSource};
pub use classify::is_upstream_failure;
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
pub use state::CircuitState;
