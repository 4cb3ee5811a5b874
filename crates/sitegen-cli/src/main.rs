//! CLI binary for sitegen: generate, edit, preview, and serve websites.

mod progress;
mod run;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use progress::GenerationProgress;
use sitegen_core::config::SitegenConfig;
use sitegen_core::site::GenerationConfig;
use sitegen_core::storage::{ProjectStore, validate_project_id};
use sitegen_core::version::{GenerationVersion, Trigger, VersionStatus};
use sitegen_llm::LlmClient;
use sitegen_pipeline::{
    EditPipeline, EditRequest, EventSink, GenerationPipeline, PipelineEvent, PipelineOutcome,
    ReconcileState, Reconciler, VersionRecorder,
};
use sitegen_preview::document::diagnostic_document;
use sitegen_preview::render_preview;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sitegen", about = "Generate, edit, and preview websites with an LLM")]
struct Cli {
    /// Directory holding the `.sitegen/` store (defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new version of a site from a JSON site description
    Generate {
        /// Project identifier
        project: String,

        /// Path to the site description (businessName, description, pages, ...)
        #[arg(short, long)]
        input: PathBuf,

        /// Print raw SSE frames to stdout instead of progress bars
        #[arg(long)]
        sse: bool,
    },

    /// Apply a natural-language edit to the latest complete version
    Edit {
        /// Project identifier
        project: String,

        /// What to change
        instruction: String,

        /// Restrict the edit to these paths or globs (repeatable)
        #[arg(short, long = "file")]
        files: Vec<String>,

        /// Print raw SSE frames to stdout instead of progress bars
        #[arg(long)]
        sse: bool,
    },

    /// Render a version as a standalone HTML preview
    Preview {
        /// Project identifier
        project: String,

        /// Route to render (e.g. "/", "/about")
        #[arg(short, long, default_value = "/")]
        page: String,

        /// Version number (defaults to the latest complete version)
        #[arg(long)]
        version: Option<u32>,

        /// Write HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the latest version of a project
    Status {
        /// Project identifier
        project: String,

        /// Poll until a running generation reaches a final status
        #[arg(long)]
        wait: bool,
    },

    /// List all versions of a project
    Versions {
        /// Project identifier
        project: String,
    },

    /// Start the HTTP server
    Serve {
        /// Listen address (defaults to server.addr in config)
        #[arg(long)]
        addr: Option<String>,
    },
}

fn get_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.root {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = get_root(&cli)?;
    let config = SitegenConfig::load(&root)
        .with_context(|| format!("failed to load config under {}", root.display()))?;
    let store = ProjectStore::new(&root);

    match cli.command {
        Commands::Generate {
            project,
            input,
            sse,
        } => cmd_generate(&store, &config, &project, &input, sse).await,
        Commands::Edit {
            project,
            instruction,
            files,
            sse,
        } => cmd_edit(&store, &config, &project, instruction, files, sse).await,
        Commands::Preview {
            project,
            page,
            version,
            output,
        } => cmd_preview(&store, &project, &page, version, output.as_deref()),
        Commands::Status { project, wait } => cmd_status(&store, &config, &project, wait).await,
        Commands::Versions { project } => cmd_versions(&store, &project),
        Commands::Serve { addr } => cmd_serve(store, &config, addr).await,
    }
}

fn model_client(config: &SitegenConfig) -> Result<Arc<LlmClient>> {
    let client = LlmClient::from_config(config).context("no usable model provider")?;
    tracing::info!(
        provider = client.provider_name(),
        model = client.model_name(),
        "using model"
    );
    Ok(Arc::new(client))
}

/// Run `job` under `recorder`, showing progress or streaming SSE frames.
async fn drive<F>(
    recorder: &VersionRecorder,
    sse: bool,
    job: impl FnOnce(EventSink) -> F,
) -> Result<GenerationVersion>
where
    F: Future<Output = PipelineOutcome>,
{
    if sse {
        let print_frame = |event: &PipelineEvent| match event.to_sse() {
            Ok(frame) => {
                let mut stdout = std::io::stdout();
                let _ = stdout.write_all(frame.as_bytes());
                let _ = stdout.flush();
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode event"),
        };
        return run::record(recorder, print_frame, job).await;
    }

    let progress = GenerationProgress::new();
    let version = run::record(recorder, |event| progress.observe(event), job).await;
    progress.finish();
    version
}

fn report(version: &GenerationVersion) -> Result<()> {
    match version.status {
        VersionStatus::Complete => {
            eprintln!(
                "Version {} of '{}' complete: {} files",
                version.version_number, version.project_id, version.file_count
            );
            Ok(())
        }
        _ => anyhow::bail!(
            "version {} of '{}' failed: {}",
            version.version_number,
            version.project_id,
            version.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

async fn cmd_generate(
    store: &ProjectStore,
    config: &SitegenConfig,
    project: &str,
    input: &Path,
    sse: bool,
) -> Result<()> {
    validate_project_id(project)?;
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let site: GenerationConfig = serde_json::from_str(&content)
        .with_context(|| format!("invalid site description in {}", input.display()))?;

    let model = model_client(config)?;
    store.save_config(project, &site)?;
    let recorder = VersionRecorder::begin(store.clone(), project, Trigger::Create, None)?;
    let pipeline = GenerationPipeline::new(model, config.generation.clone());

    let version = drive(&recorder, sse, |sink| async move {
        pipeline.run(&site, &sink).await
    })
    .await?;
    report(&version)
}

async fn cmd_edit(
    store: &ProjectStore,
    config: &SitegenConfig,
    project: &str,
    instruction: String,
    files: Vec<String>,
    sse: bool,
) -> Result<()> {
    let request = EditRequest { instruction, files };
    let model = model_client(config)?;
    let (prepared, recorder) = run::start_edit(store, project, &request)?;
    let pipeline = EditPipeline::new(model, config.generation.clone());

    let version = drive(&recorder, sse, |sink| async move {
        pipeline.run(&prepared, &sink).await
    })
    .await?;
    report(&version)
}

fn cmd_preview(
    store: &ProjectStore,
    project: &str,
    page: &str,
    version: Option<u32>,
    output: Option<&Path>,
) -> Result<()> {
    let html = match run::load_preview_files(store, project, version) {
        Ok(files) => render_preview(&files, page),
        Err(err) => {
            tracing::warn!(project, error = %err, "nothing to preview");
            diagnostic_document("Preview unavailable", &format!("{:#}", err)).into_string()
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, &html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote preview to {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

fn print_version(version: &GenerationVersion) {
    println!("Version {} ({})", version.version_number, version.trigger);
    println!("Status: {}", version.status);
    println!("Started: {}", version.started_at);
    if let Some(done) = &version.completed_at {
        println!("Completed: {}", done);
    }
    if let Some(parent) = version.parent_version {
        println!("Parent: {}", parent);
    }
    println!("Files: {}", version.file_count);
    if let Some(error) = &version.error {
        println!("Error: {}", error);
    }
}

async fn cmd_status(
    store: &ProjectStore,
    config: &SitegenConfig,
    project: &str,
    wait: bool,
) -> Result<()> {
    let Some(latest) = store.latest_version(project)? else {
        eprintln!("No versions for '{}'. Run `sitegen generate` first.", project);
        return Ok(());
    };

    let latest = if wait && latest.status == VersionStatus::Generating {
        let mut reconciler = Reconciler::from_config(&config.reconcile).pending();
        if let ReconcileState::Failed(reason) = reconciler
            .poll(store, project, latest.version_number)
            .await
        {
            eprintln!("{}", reason);
        }
        store.load_version(project, latest.version_number)?
    } else {
        latest
    };

    print_version(&latest);
    Ok(())
}

fn cmd_versions(store: &ProjectStore, project: &str) -> Result<()> {
    let versions = store.list_versions(project)?;
    if versions.is_empty() {
        eprintln!("No versions for '{}'.", project);
        return Ok(());
    }
    for v in &versions {
        let parent = v
            .parent_version
            .map(|p| format!(" from v{}", p))
            .unwrap_or_default();
        println!(
            "v{:<4} {:<10} {:<6}{} {} files  {}",
            v.version_number, v.status, v.trigger, parent, v.file_count, v.started_at
        );
    }
    Ok(())
}

async fn cmd_serve(store: ProjectStore, config: &SitegenConfig, addr: Option<String>) -> Result<()> {
    let model = match LlmClient::from_config(config) {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            tracing::warn!(error = %err, "no model provider; generation endpoints will return 503");
            None
        }
    };
    let state = server::AppState {
        store,
        model,
        settings: config.generation.clone(),
    };
    let addr = addr.unwrap_or_else(|| config.server.addr.clone());
    server::serve(state, &addr).await
}
