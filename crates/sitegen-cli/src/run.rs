//! Pipeline runs wired to the version store, shared by the CLI and server.

use anyhow::{Context, Result};
use sitegen_core::files::VirtualFile;
use sitegen_core::storage::ProjectStore;
use sitegen_core::version::{GenerationVersion, Trigger};
use sitegen_pipeline::{
    EditError, EditRequest, EventSink, PipelineEvent, PipelineOutcome, PreparedEdit,
    VersionRecorder, prepare_edit,
};
use std::future::Future;

/// Why an edit could not start.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// Missing prerequisite state; the caller's request is at fault.
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Run a pipeline against a fresh sink while the recorder persists every
/// event, then record the outcome.
///
/// `run` receives the sink by value; the run is over once the future it
/// returns completes and drops the sink.
pub async fn record<F>(
    recorder: &VersionRecorder,
    on_event: impl FnMut(&PipelineEvent),
    run: impl FnOnce(EventSink) -> F,
) -> Result<GenerationVersion>
where
    F: Future<Output = PipelineOutcome>,
{
    let (sink, rx) = EventSink::channel();
    let (outcome, ()) = tokio::join!(run(sink), recorder.drain(rx, on_event));
    if let PipelineOutcome::Failed { stage, message } = &outcome {
        tracing::warn!(
            project = recorder.project_id(),
            version = recorder.version_number(),
            %stage,
            error = %message,
            "generation failed"
        );
    }
    recorder.finish(&outcome)
}

/// Validate an edit against the latest complete version and open the
/// version it will write into.
pub fn start_edit(
    store: &ProjectStore,
    project_id: &str,
    request: &EditRequest,
) -> Result<(PreparedEdit, VersionRecorder), StartError> {
    let previous = store
        .latest_complete_version(project_id)?
        .ok_or(EditError::NoPreviousVersion)?;
    let files = store.load_files(project_id, previous.version_number)?;
    let prepared = prepare_edit(request, files)?;
    let recorder = VersionRecorder::begin(
        store.clone(),
        project_id,
        Trigger::Edit,
        Some(previous.version_number),
    )?;
    Ok((prepared, recorder))
}

/// Files to preview: an explicit version, or the latest complete one.
pub fn load_preview_files(
    store: &ProjectStore,
    project_id: &str,
    version: Option<u32>,
) -> Result<Vec<VirtualFile>> {
    let version = match version {
        Some(v) => v,
        None => {
            store
                .latest_complete_version(project_id)?
                .with_context(|| format!("project '{}' has no completed version", project_id))?
                .version_number
        }
    };
    store
        .load_files(project_id, version)
        .with_context(|| format!("failed to load files for version {}", version))
}
