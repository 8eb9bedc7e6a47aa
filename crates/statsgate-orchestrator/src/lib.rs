//! Fan-out fetch orchestration and safe achievement merging (components
//! D and E): two independent upstream fetches joined under a shared
//! deadline, plus an additive merge policy for reconciling achievement
//! data across fetches.

mod cache_bridge;
mod config;
mod error;
mod events;
mod fanout;
pub mod merger;
pub mod types;
pub mod upstream;

pub use cache_bridge::CacheStaleSource;
pub use config::{OrchestratorConfig, OrchestratorConfigBuilder};
pub use error::{flatten_retry_error, OrchestratorError};
pub use events::OrchestratorEvent;
pub use fanout::Orchestrator;
