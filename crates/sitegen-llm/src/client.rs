//! reqwest-backed [`ModelClient`] with retry on transient failures.

use crate::error::ModelError;
use crate::provider::{LlmProvider, error_message};
use crate::retry::RetryPolicy;
use crate::sse::{SseDecoder, SseFlavor};
use crate::{CompletionRequest, ModelClient, TextStream};
use futures_util::stream::{self, Stream, StreamExt};
use sitegen_core::config::SitegenConfig;
use std::collections::VecDeque;
use std::time::Duration;

/// A model client for one provider.
pub struct LlmClient {
    provider: LlmProvider,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(
        provider: LlmProvider,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            provider,
            http,
            retry,
        })
    }

    /// Resolve the provider from settings and the environment.
    pub fn from_config(config: &SitegenConfig) -> Result<Self, ModelError> {
        let provider = LlmProvider::from_config(&config.model)?;
        Self::new(
            provider,
            Duration::from_secs(config.model.request_timeout_secs),
            RetryPolicy::from(&config.retry),
        )
    }

    /// Human-readable provider name.
    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// Model name in use.
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    async fn send(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, ModelError> {
        let resp = self
            .provider
            .build_request(
                &self.http,
                &request.system,
                &request.user,
                request.max_tokens,
                stream,
            )
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(resp)
    }

    async fn complete_once(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let body = self.send(request, false).await?.text().await?;
        self.provider.parse_completion(&body)
    }

    async fn open_stream(&self, request: &CompletionRequest) -> Result<TextStream, ModelError> {
        let resp = self.send(request, true).await?;
        let flavor = if self.provider.is_anthropic() {
            SseFlavor::Anthropic
        } else {
            SseFlavor::OpenAI
        };
        Ok(decode_body(resp.bytes_stream().boxed(), flavor))
    }
}

impl ModelClient for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        tracing::debug!(
            provider = self.provider_name(),
            model = self.model_name(),
            max_tokens = request.max_tokens,
            "completion request"
        );
        self.retry
            .run("complete", || self.complete_once(request))
            .await
    }

    async fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<TextStream, ModelError> {
        tracing::debug!(
            provider = self.provider_name(),
            model = self.model_name(),
            max_tokens = request.max_tokens,
            "streaming request"
        );
        // Only opening the stream is retried. A failure after text has been
        // delivered surfaces to the caller as a stream item.
        self.retry
            .run("stream", || self.open_stream(request))
            .await
    }
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw SSE body into a stream of text deltas.
///
/// Decoding stops at the provider's terminal event. Errors end the stream
/// after being yielded once.
pub(crate) fn decode_body<S, B, E>(body: S, flavor: SseFlavor) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ModelError> + Send + 'static,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(flavor),
        pending: VecDeque::new(),
        finished: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(text) = state.pending.pop_front() {
                return Some((Ok(text), state));
            }
            if state.finished {
                return None;
            }
            if state.decoder.is_done() {
                state.finished = true;
                continue;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => match state.decoder.push(bytes.as_ref()) {
                    Ok(texts) => state.pending.extend(texts),
                    Err(err) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                },
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err.into()), state));
                }
                None => {
                    state.finished = true;
                    match state.decoder.finish() {
                        Ok(texts) => state.pending.extend(texts),
                        Err(err) => return Some((Err(err), state)),
                    }
                }
            }
        }
    })
    .boxed()
}
