//! HTTP surface: SSE generation and edit streams, previews, and status.
//!
//! A run is spawned onto its own task with the recorder draining its
//! events, so it keeps going and keeps persisting when the SSE client
//! disconnects. The client only sees a forwarded copy of each event.

use crate::run::{self, StartError};
use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use sitegen_core::config::GenerationSettings;
use sitegen_core::site::GenerationConfig;
use sitegen_core::storage::{ProjectStore, validate_project_id};
use sitegen_core::version::{GenerationVersion, Trigger};
use sitegen_llm::ModelClient;
use sitegen_pipeline::{
    EditError, EditPipeline, EditRequest, EventSink, GenerationPipeline, PipelineEvent,
    PipelineOutcome, VersionRecorder,
};
use sitegen_preview::document::diagnostic_document;
use sitegen_preview::render_preview;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub struct AppState<M> {
    pub store: ProjectStore,
    /// `None` when no provider is configured; previews still work.
    pub model: Option<Arc<M>>,
    pub settings: GenerationSettings,
}

impl<M> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            model: self.model.clone(),
            settings: self.settings.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal_error(err: &anyhow::Error) -> ApiError {
    tracing::error!(error = %err, "request failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
}

fn edit_status(err: &EditError) -> StatusCode {
    match err {
        EditError::EmptyInstruction | EditError::UnknownTarget(_) => StatusCode::BAD_REQUEST,
        EditError::NoPreviousVersion
        | EditError::NoPreviousFiles
        | EditError::NoEditableFiles
        | EditError::MissingDesignSystem(_) => StatusCode::CONFLICT,
    }
}

impl<M: ModelClient> AppState<M> {
    fn model(&self) -> Result<Arc<M>, ApiError> {
        self.model.clone().ok_or_else(|| {
            api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "no model provider configured",
            )
        })
    }
}

pub fn router<M: ModelClient + 'static>(state: AppState<M>) -> Router {
    Router::new()
        .route("/projects/{project}/generate", post(generate_handler::<M>))
        .route("/projects/{project}/edit", post(edit_handler::<M>))
        .route("/projects/{project}/preview", get(preview_handler::<M>))
        .route("/projects/{project}/status", get(status_handler::<M>))
        .with_state(state)
}

pub async fn serve<M: ModelClient + 'static>(state: AppState<M>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(addr = %listener.local_addr()?, "sitegen server listening");
    axum::serve(listener, router(state))
        .await
        .context("server error")
}

/// Spawn `job` with a recorder and stream its events to the client.
fn stream_run<J, F>(
    recorder: VersionRecorder,
    job: J,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>>
where
    J: FnOnce(EventSink) -> F + Send + 'static,
    F: Future<Output = PipelineOutcome> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<PipelineEvent>();
    tokio::spawn(async move {
        let forward = move |event: &PipelineEvent| {
            // The client may be gone; the run continues regardless.
            let _ = tx.send(event.clone());
        };
        if let Err(err) = run::record(&recorder, forward, job).await {
            tracing::error!(
                project = recorder.project_id(),
                version = recorder.version_number(),
                error = %err,
                "failed to record run outcome"
            );
        }
    });
    let events = UnboundedReceiverStream::new(rx).map(|event| Event::default().json_data(&event));
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn generate_handler<M: ModelClient + 'static>(
    State(state): State<AppState<M>>,
    Path(project): Path<String>,
    Json(config): Json<GenerationConfig>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    validate_project_id(&project).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let model = state.model()?;
    state
        .store
        .save_config(&project, &config)
        .map_err(|e| internal_error(&e))?;
    let recorder = VersionRecorder::begin(state.store.clone(), &project, Trigger::Create, None)
        .map_err(|e| internal_error(&e))?;
    let pipeline = GenerationPipeline::new(model, state.settings.clone());
    Ok(stream_run(recorder, move |sink| async move {
        pipeline.run(&config, &sink).await
    }))
}

async fn edit_handler<M: ModelClient + 'static>(
    State(state): State<AppState<M>>,
    Path(project): Path<String>,
    Json(request): Json<EditRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    validate_project_id(&project).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let model = state.model()?;
    let (prepared, recorder) =
        run::start_edit(&state.store, &project, &request).map_err(|err| match err {
            StartError::Edit(err) => api_error(edit_status(&err), err.to_string()),
            StartError::Store(err) => internal_error(&err),
        })?;
    let pipeline = EditPipeline::new(model, state.settings.clone());
    Ok(stream_run(recorder, move |sink| async move {
        pipeline.run(&prepared, &sink).await
    }))
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    page: Option<String>,
    /// Kept as text so a malformed value degrades instead of failing the
    /// request.
    version: Option<String>,
}

async fn preview_handler<M: ModelClient + 'static>(
    State(state): State<AppState<M>>,
    Path(project): Path<String>,
    Query(params): Query<PreviewParams>,
) -> Html<String> {
    let page = params.page.as_deref().unwrap_or("/");
    let version = params.version.as_deref().and_then(|v| v.trim().parse().ok());
    let html = match run::load_preview_files(&state.store, &project, version) {
        Ok(files) => render_preview(&files, page),
        Err(err) => {
            tracing::debug!(project = %project, error = %err, "nothing to preview");
            diagnostic_document("Preview unavailable", &format!("{:#}", err)).into_string()
        }
    };
    Html(html)
}

async fn status_handler<M: ModelClient + 'static>(
    State(state): State<AppState<M>>,
    Path(project): Path<String>,
) -> Result<Json<GenerationVersion>, ApiError> {
    validate_project_id(&project).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    match state.store.latest_version(&project) {
        Ok(Some(version)) => Ok(Json(version)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("project '{}' has no versions", project),
        )),
        Err(err) => Err(internal_error(&err)),
    }
}
