//! Model client for sitegen's generation pipeline.
//!
//! # Architecture
//!
//! - **provider**: `LlmProvider` selection and per-provider request/response shapes
//! - **client**: `LlmClient`, the reqwest-backed [`ModelClient`] implementation
//! - **sse**: incremental server-sent-event decoding into text deltas
//! - **retry**: exponential backoff with jitter for transient failures
//! - **error**: `ModelError` and its retryability classification

pub mod client;
pub mod error;
pub mod provider;
pub mod retry;
pub mod sse;

pub use client::LlmClient;
pub use error::ModelError;
pub use provider::{LlmProvider, available_providers};
pub use retry::RetryPolicy;

use futures_util::stream::BoxStream;
use std::future::Future;

/// One prompt pair sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens,
        }
    }
}

/// Text deltas in arrival order.
pub type TextStream = BoxStream<'static, Result<String, ModelError>>;

/// The seam between the pipeline and a generative model.
///
/// Implementations apply their own retry policy; callers treat any error
/// they receive as final.
pub trait ModelClient: Send + Sync {
    /// Run a prompt to completion and return the full text.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<String, ModelError>> + Send;

    /// Open a token stream for a prompt.
    fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<TextStream, ModelError>> + Send;
}

impl<T: ModelClient> ModelClient for std::sync::Arc<T> {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<String, ModelError>> + Send {
        (**self).complete(request)
    }

    fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<TextStream, ModelError>> + Send {
        (**self).stream_completion(request)
    }
}
