//! Reconcile a dropped event stream with persisted version status.
//!
//! Generation can outlive the connection that started it. When the stream
//! drops before a terminal event, the client polls the stored status with a
//! bounded number of attempts; a version that reaches `complete` counts as a
//! recovery, not a failure.

use crate::events::PipelineEvent;
use sitegen_core::config::ReconcileConfig;
use sitegen_core::storage::ProjectStore;
use sitegen_core::version::{GenerationVersion, VersionStatus};
use std::time::Duration;

/// Where a version's status comes from.
pub trait StatusSource {
    fn version_status(&self, project_id: &str, version: u32) -> anyhow::Result<GenerationVersion>;
}

impl StatusSource for ProjectStore {
    fn version_status(&self, project_id: &str, version: u32) -> anyhow::Result<GenerationVersion> {
        self.load_version(project_id, version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileState {
    /// Events are still arriving.
    Streaming,
    /// The stream ended without a terminal event.
    DisconnectedPending,
    /// The run completed, seen live or after polling.
    Recovered,
    Failed(String),
}

impl ReconcileState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Recovered | Self::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    state: ReconcileState,
    poll_interval: Duration,
    max_polls: u32,
}

impl Reconciler {
    pub fn new(poll_interval: Duration, max_polls: u32) -> Self {
        Self {
            state: ReconcileState::Streaming,
            poll_interval,
            max_polls,
        }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(Duration::from_millis(config.poll_interval_ms), config.max_polls)
    }

    /// Start directly in the pending state, for clients that attach after
    /// the stream is gone.
    #[must_use]
    pub fn pending(mut self) -> Self {
        self.state = ReconcileState::DisconnectedPending;
        self
    }

    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    /// Feed a live event. Terminal events resolve a streaming run.
    pub fn observe(&mut self, event: &PipelineEvent) {
        if self.state != ReconcileState::Streaming {
            return;
        }
        match event {
            PipelineEvent::GenerationComplete { .. } => self.state = ReconcileState::Recovered,
            PipelineEvent::Error { error, .. } => {
                self.state = ReconcileState::Failed(error.clone());
            }
            _ => {}
        }
    }

    /// The stream ended. Without a terminal event the outcome is pending.
    pub fn disconnect(&mut self) {
        if self.state == ReconcileState::Streaming {
            tracing::warn!("event stream closed before a terminal event");
            self.state = ReconcileState::DisconnectedPending;
        }
    }

    /// Poll `source` until the version reaches a terminal status or the poll
    /// budget runs out. Read failures count as a poll and are retried.
    pub async fn poll<S: StatusSource>(
        &mut self,
        source: &S,
        project_id: &str,
        version: u32,
    ) -> &ReconcileState {
        if self.state != ReconcileState::DisconnectedPending {
            return &self.state;
        }
        for attempt in 1..=self.max_polls {
            match source.version_status(project_id, version) {
                Ok(record) => match record.status {
                    VersionStatus::Complete => {
                        tracing::info!(project = project_id, version, attempt, "generation recovered");
                        self.state = ReconcileState::Recovered;
                        return &self.state;
                    }
                    VersionStatus::Error => {
                        self.state = ReconcileState::Failed(
                            record
                                .error
                                .unwrap_or_else(|| "generation failed".to_string()),
                        );
                        return &self.state;
                    }
                    VersionStatus::Generating => {
                        tracing::debug!(project = project_id, version, attempt, "still generating");
                    }
                },
                Err(err) => {
                    tracing::warn!(project = project_id, version, attempt, error = %err, "status poll failed");
                }
            }
            if attempt < self.max_polls {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        self.state = ReconcileState::Failed(format!(
            "version {} still generating after {} status checks",
            version, self.max_polls
        ));
        &self.state
    }
}
