//! Per-run state shared by the generation and edit pipelines.

use crate::events::{EventSink, PipelineEvent, SinkClosed, Stage};
use crate::extract::BlockStream;
use futures_util::StreamExt;
use sitegen_core::files::{SectionKind, VirtualFile, component_name_for_path};
use sitegen_llm::{CompletionRequest, ModelClient};
use std::collections::HashSet;

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Final file set of the new version, one file per path.
    Completed { files: Vec<VirtualFile> },
    /// A stage failed; an `error` event was emitted.
    Failed { stage: Stage, message: String },
    /// The event receiver went away mid-run.
    Abandoned { stage: Stage },
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Why a run stopped before completing.
#[derive(Debug)]
pub(crate) enum Interrupt {
    Failed { stage: Stage, message: String },
    Abandoned { stage: Stage },
}

impl Interrupt {
    pub(crate) fn failed(stage: Stage, err: impl std::fmt::Display) -> Self {
        Self::Failed {
            stage,
            message: err.to_string(),
        }
    }

    /// Turn an interruption into the run's outcome, emitting the `error`
    /// event for failures.
    pub(crate) fn into_outcome(self, sink: &EventSink) -> PipelineOutcome {
        match self {
            Self::Failed { stage, message } => {
                tracing::error!(%stage, error = %message, "pipeline stage failed");
                let _ = sink.emit(PipelineEvent::Error {
                    stage,
                    error: message.clone(),
                });
                PipelineOutcome::Failed { stage, message }
            }
            Self::Abandoned { stage } => {
                tracing::warn!(%stage, "event receiver dropped, abandoning run");
                PipelineOutcome::Abandoned { stage }
            }
        }
    }
}

/// Emit one event, mapping a closed sink to abandonment of `stage`.
pub(crate) fn emit(sink: &EventSink, stage: Stage, event: PipelineEvent) -> Result<(), Interrupt> {
    sink.emit(event)
        .map_err(|SinkClosed| Interrupt::Abandoned { stage })
}

pub(crate) fn stage_start(
    sink: &EventSink,
    stage: Stage,
    message: impl Into<String>,
) -> Result<(), Interrupt> {
    tracing::info!(%stage, "stage started");
    emit(
        sink,
        stage,
        PipelineEvent::StageStart {
            stage,
            message: Some(message.into()),
        },
    )
}

pub(crate) fn stage_complete(
    sink: &EventSink,
    stage: Stage,
    data: Option<serde_json::Value>,
) -> Result<(), Interrupt> {
    emit(sink, stage, PipelineEvent::StageComplete { stage, data })
}

/// Running state of one pipeline run: block extraction, progress counters,
/// and the files produced so far in arrival order.
#[derive(Debug)]
pub struct RunContext {
    blocks: BlockStream,
    announced: HashSet<String>,
    files: Vec<VirtualFile>,
    completed: usize,
    expected: usize,
}

impl RunContext {
    /// `expected` is the file count the run is planned to produce.
    pub fn new(expected: usize) -> Self {
        Self {
            blocks: BlockStream::new(),
            announced: HashSet::new(),
            files: Vec::new(),
            completed: 0,
            expected,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Progress denominator; never below the completed count.
    pub fn total(&self) -> usize {
        self.expected.max(self.completed)
    }

    pub fn set_expected(&mut self, expected: usize) {
        self.expected = expected;
    }

    /// Files produced so far, in completion order.
    pub fn files(&self) -> &[VirtualFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<VirtualFile> {
        self.files
    }

    /// Record a finished file and emit its `component-complete` event.
    ///
    /// A file at a path already produced replaces the earlier one and does
    /// not advance the completed count.
    pub(crate) fn complete_file(
        &mut self,
        sink: &EventSink,
        stage: Stage,
        file: VirtualFile,
    ) -> Result<(), Interrupt> {
        match self.files.iter().position(|f| f.path == file.path) {
            Some(index) => {
                tracing::debug!(path = %file.path, "file replaced");
                self.files.remove(index);
            }
            None => self.completed += 1,
        }
        let event = PipelineEvent::ComponentComplete {
            stage,
            component_name: file.component_name(),
            file: file.clone(),
            completed_files: self.completed,
            total_files: self.total(),
        };
        tracing::debug!(path = %file.path, completed = self.completed, total = self.total(), "file complete");
        self.files.push(file);
        emit(sink, stage, event)
    }

    /// Run the streaming component stage: feed every delta through block
    /// extraction and emit progress for each new file.
    ///
    /// `section_of` classifies each finished file.
    pub(crate) async fn stream_components<M: ModelClient>(
        &mut self,
        model: &M,
        request: &CompletionRequest,
        sink: &EventSink,
        section_of: impl Fn(&VirtualFile) -> Option<SectionKind>,
    ) -> Result<(), Interrupt> {
        let stage = Stage::Components;
        let mut stream = model
            .stream_completion(request)
            .await
            .map_err(|e| Interrupt::failed(stage, e))?;

        while let Some(delta) = stream.next().await {
            let chunk = delta.map_err(|e| Interrupt::failed(stage, e))?;
            let finished = self.blocks.push(&chunk);
            for block in finished {
                let file = block.into_file();
                let section = section_of(&file);
                self.complete_file(sink, stage, file.with_section(section))?;
            }
            self.announce_open_block(sink, &chunk)?;
        }

        for block in self.blocks.finish() {
            let file = block.into_file();
            let section = section_of(&file);
            self.complete_file(sink, stage, file.with_section(section))?;
        }
        Ok(())
    }

    /// Best-effort live feedback for the block still streaming.
    fn announce_open_block(&mut self, sink: &EventSink, chunk: &str) -> Result<(), Interrupt> {
        let stage = Stage::Components;
        let Some(path) = self.blocks.open_path() else {
            return Ok(());
        };
        if self.blocks.has_seen(&path) {
            return Ok(());
        }
        let component_name = component_name_for_path(&path);
        if self.announced.insert(path.clone()) {
            emit(
                sink,
                stage,
                PipelineEvent::ComponentStart {
                    stage,
                    component_name: component_name.clone(),
                    file_path: path.clone(),
                },
            )?;
        }
        emit(
            sink,
            stage,
            PipelineEvent::ComponentChunk {
                stage,
                component_name,
                file_path: path,
                chunk: chunk.to_string(),
            },
        )
    }
}
