use statsgate_core::ResilienceEvent;
use std::time::Instant;

use crate::types::DataSource;

/// Observability events for the fan-out orchestrator and safe merger
///, following the `ResilienceEvent` shape every other
/// component in this workspace uses.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    FetchCompleted {
        name: String,
        timestamp: Instant,
        player_id: String,
        stats_source: DataSource,
        ach_source: DataSource,
    },
    FetchFailed {
        name: String,
        timestamp: Instant,
        player_id: String,
        error: String,
    },
    MergeApplied {
        name: String,
        timestamp: Instant,
        player_id: String,
        changes: usize,
    },
    MergeRejected {
        name: String,
        timestamp: Instant,
        player_id: String,
        reason: String,
    },
}

impl ResilienceEvent for OrchestratorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrchestratorEvent::FetchCompleted { .. } => "orchestrator.fetch_completed",
            OrchestratorEvent::FetchFailed { .. } => "orchestrator.fetch_failed",
            OrchestratorEvent::MergeApplied { .. } => "orchestrator.merge_applied",
            OrchestratorEvent::MergeRejected { .. } => "orchestrator.merge_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            OrchestratorEvent::FetchCompleted { timestamp, .. }
            | OrchestratorEvent::FetchFailed { timestamp, .. }
            | OrchestratorEvent::MergeApplied { timestamp, .. }
            | OrchestratorEvent::MergeRejected { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            OrchestratorEvent::FetchCompleted { name, .. }
            | OrchestratorEvent::FetchFailed { name, .. }
            | OrchestratorEvent::MergeApplied { name, .. }
            | OrchestratorEvent::MergeRejected { name, .. } => name,
        }
    }
}
