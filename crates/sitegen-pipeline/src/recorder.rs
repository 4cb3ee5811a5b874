//! Persist pipeline progress into the version store.
//!
//! The pipelines only emit events. The recorder is the caller-side
//! collaborator that writes each completed file as it arrives, stores the
//! final file set, and rolls the version's status forward to `complete` or
//! `error`.

use crate::context::PipelineOutcome;
use crate::events::PipelineEvent;
use anyhow::Result;
use sitegen_core::storage::ProjectStore;
use sitegen_core::version::{GenerationVersion, Trigger, VersionStatus};
use tokio::sync::mpsc;

/// Writes one version's events and outcome to a [`ProjectStore`].
#[derive(Debug, Clone)]
pub struct VersionRecorder {
    store: ProjectStore,
    project_id: String,
    version: u32,
}

impl VersionRecorder {
    /// Create the next version for `project_id` and record into it.
    pub fn begin(
        store: ProjectStore,
        project_id: &str,
        trigger: Trigger,
        parent_version: Option<u32>,
    ) -> Result<Self> {
        let version = store.create_version(project_id, trigger, parent_version)?;
        tracing::info!(
            project = project_id,
            version = version.version_number,
            %trigger,
            "recording new version"
        );
        Ok(Self {
            store,
            project_id: project_id.to_string(),
            version: version.version_number,
        })
    }

    pub fn version_number(&self) -> u32 {
        self.version
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Apply one event. Completed files are written immediately so a reader
    /// polling the store sees progress.
    pub fn apply(&self, event: &PipelineEvent) -> Result<()> {
        match event {
            PipelineEvent::ComponentComplete { file, .. } => {
                self.store
                    .upsert_file(&self.project_id, self.version, file.clone())
            }
            PipelineEvent::Error { error, .. } => self
                .store
                .update_status(
                    &self.project_id,
                    self.version,
                    VersionStatus::Error,
                    Some(error.clone()),
                )
                .map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Record how the run ended and return the final version metadata.
    pub fn finish(&self, outcome: &PipelineOutcome) -> Result<GenerationVersion> {
        let current = self.store.load_version(&self.project_id, self.version)?;
        if current.status.is_terminal() {
            return Ok(current);
        }
        match outcome {
            PipelineOutcome::Completed { files } => {
                self.store.replace_files(&self.project_id, self.version, files)?;
                self.store
                    .update_status(&self.project_id, self.version, VersionStatus::Complete, None)
            }
            PipelineOutcome::Failed { message, .. } => self.store.update_status(
                &self.project_id,
                self.version,
                VersionStatus::Error,
                Some(message.clone()),
            ),
            PipelineOutcome::Abandoned { stage } => self.store.update_status(
                &self.project_id,
                self.version,
                VersionStatus::Error,
                Some(format!("generation abandoned during {}", stage)),
            ),
        }
    }

    /// Apply every event from `rx` until the channel closes, handing each to
    /// `on_event` after it is stored. Storage failures are logged and do not
    /// stop the drain.
    pub async fn drain(
        &self,
        mut rx: mpsc::UnboundedReceiver<PipelineEvent>,
        mut on_event: impl FnMut(&PipelineEvent),
    ) {
        while let Some(event) = rx.recv().await {
            if let Err(err) = self.apply(&event) {
                tracing::warn!(
                    project = %self.project_id,
                    version = self.version,
                    event = event.kind(),
                    error = %err,
                    "failed to persist event"
                );
            }
            on_event(&event);
        }
    }
}
