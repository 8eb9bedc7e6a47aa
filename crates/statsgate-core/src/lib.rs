//! Shared machinery used by every `statsgate` resilience component:
//! the panic-safe event bus, the unified error taxonomy, request-id
//! generation, and environment-config parsing helpers.

mod env;
mod error;
mod ids;
pub mod events;

pub use env::{clamp_with_warning, parse_env, parse_env_duration_secs};
pub use error::GatewayError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use ids::generate_request_id;
