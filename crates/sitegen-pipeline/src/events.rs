//! Typed progress events emitted by the pipelines.
//!
//! Events serialize to the JSON objects the browser consumes, one per
//! server-sent-event frame. A stream is append-only and ends with exactly one
//! terminal event: `generation-complete` or `error`.

use serde::{Deserialize, Serialize};
use sitegen_core::files::VirtualFile;
use std::fmt;
use tokio::sync::mpsc;

/// Pipeline phase an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    ConfigAssembly,
    DesignSystem,
    Blueprint,
    Components,
    Assembly,
    Complete,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigAssembly => "config-assembly",
            Self::DesignSystem => "design-system",
            Self::Blueprint => "blueprint",
            Self::Components => "components",
            Self::Assembly => "assembly",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum PipelineEvent {
    StageStart {
        stage: Stage,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    StageComplete {
        stage: Stage,
        /// The validated document for `design-system` and `blueprint`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    /// First sight of a file path in a still-streaming chunk. UI feedback only.
    ComponentStart {
        stage: Stage,
        component_name: String,
        file_path: String,
    },
    /// Raw text for the file currently streaming. UI feedback only.
    ComponentChunk {
        stage: Stage,
        component_name: String,
        file_path: String,
        chunk: String,
    },
    ComponentComplete {
        stage: Stage,
        component_name: String,
        file: VirtualFile,
        completed_files: usize,
        total_files: usize,
    },
    Error {
        stage: Stage,
        error: String,
    },
    GenerationComplete {
        stage: Stage,
        total_files: usize,
    },
}

impl PipelineEvent {
    pub fn stage(&self) -> Stage {
        match self {
            Self::StageStart { stage, .. }
            | Self::StageComplete { stage, .. }
            | Self::ComponentStart { stage, .. }
            | Self::ComponentChunk { stage, .. }
            | Self::ComponentComplete { stage, .. }
            | Self::Error { stage, .. }
            | Self::GenerationComplete { stage, .. } => *stage,
        }
    }

    /// `generation-complete` and `error` end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::GenerationComplete { .. })
    }

    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StageStart { .. } => "stage-start",
            Self::StageComplete { .. } => "stage-complete",
            Self::ComponentStart { .. } => "component-start",
            Self::ComponentChunk { .. } => "component-chunk",
            Self::ComponentComplete { .. } => "component-complete",
            Self::Error { .. } => "error",
            Self::GenerationComplete { .. } => "generation-complete",
        }
    }

    /// One server-sent-event frame: `data: <json>\n\n`.
    pub fn to_sse(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

/// The receiving side went away; the run should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event receiver dropped")]
pub struct SinkClosed;

/// Ordered, single-consumer event channel for one pipeline run.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        Self { tx }
    }

    /// A sink and the receiver that observes its events in emission order.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: PipelineEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).map_err(|_| SinkClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
