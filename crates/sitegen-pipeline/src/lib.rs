//! Streaming website generation.
//!
//! [`GenerationPipeline`] turns a [`GenerationConfig`](sitegen_core::site::GenerationConfig)
//! into a complete Next.js file set in five stages, emitting a
//! [`PipelineEvent`] for every step. [`EditPipeline`] regenerates a subset of
//! an existing version. Both stream model output through [`BlockStream`],
//! which recovers fenced file blocks from arbitrarily split deltas.
//!
//! The pipelines never touch storage. Callers drain events into a
//! [`VersionRecorder`] and use a [`Reconciler`] when a client loses the stream.

pub mod context;
pub mod edit;
pub mod events;
pub mod extract;
pub mod generate;
pub mod prompts;
pub mod reconcile;
pub mod recorder;
pub mod scaffold;

pub use context::{PipelineOutcome, RunContext};
pub use edit::{EditError, EditPipeline, EditRequest, PreparedEdit, prepare_edit};
pub use events::{EventSink, PipelineEvent, Stage};
pub use extract::{BlockStream, Extraction, extract_blocks, finish_blocks};
pub use generate::GenerationPipeline;
pub use reconcile::{ReconcileState, Reconciler, StatusSource};
pub use recorder::VersionRecorder;
