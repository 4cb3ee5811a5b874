//! The edit variant: regenerate a subset of an existing version's files.
//!
//! Reuses the design system stored with the previous version, skips the
//! design and blueprint stages, streams only the changed files, and builds the
//! next version as (previous files not edited) ∪ (edited files).

use crate::context::{Interrupt, PipelineOutcome, RunContext, emit, stage_complete, stage_start};
use crate::events::{EventSink, PipelineEvent, Stage};
use crate::prompts;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use sitegen_core::config::GenerationSettings;
use sitegen_core::design::DesignSystem;
use sitegen_core::files::{DESIGN_SYSTEM_PATH, SectionKind, VirtualFile, normalize_path};
use sitegen_core::schema::parse_document;
use sitegen_llm::{CompletionRequest, ModelClient};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Source and style files the edit stage may rewrite when no explicit
/// targets are given.
const EDITABLE_PATTERNS: &[&str] = &["src/**/*.{tsx,ts,jsx,js}", "**/*.css"];

static EDITABLE: LazyLock<GlobSet> = LazyLock::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in EDITABLE_PATTERNS {
        builder.add(Glob::new(pattern).expect("editable pattern is a valid glob"));
    }
    builder.build().expect("editable patterns compile")
});

pub fn is_editable(path: &str) -> bool {
    EDITABLE.is_match(path)
}

/// A user's change request against the latest complete version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub instruction: String,
    /// Paths or globs to edit. Empty means every source and style file.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Missing prerequisite state for an edit. Reported before any streaming.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditError {
    #[error("edit instruction is empty")]
    EmptyInstruction,
    #[error("project has no completed version to edit")]
    NoPreviousVersion,
    #[error("previous version has no files")]
    NoPreviousFiles,
    #[error("`{0}` does not match any file in the previous version")]
    UnknownTarget(String),
    #[error("previous version has no editable source or style files")]
    NoEditableFiles,
    #[error("design system unavailable: {0}")]
    MissingDesignSystem(String),
}

/// Everything the edit stage needs, validated up front.
#[derive(Debug, Clone)]
pub struct PreparedEdit {
    pub instruction: String,
    pub previous: Vec<VirtualFile>,
    pub design: DesignSystem,
    pub targets: Vec<VirtualFile>,
}

/// Check prerequisites and resolve the target set.
pub fn prepare_edit(
    request: &EditRequest,
    previous: Vec<VirtualFile>,
) -> Result<PreparedEdit, EditError> {
    let instruction = request.instruction.trim();
    if instruction.is_empty() {
        return Err(EditError::EmptyInstruction);
    }
    if previous.is_empty() {
        return Err(EditError::NoPreviousFiles);
    }
    let design = load_design_system(&previous)?;
    let targets = select_targets(&previous, &request.files)?;
    Ok(PreparedEdit {
        instruction: instruction.to_string(),
        previous,
        design,
        targets,
    })
}

/// Parse the design system saved by the previous version's scaffold.
pub fn load_design_system(files: &[VirtualFile]) -> Result<DesignSystem, EditError> {
    let file = files
        .iter()
        .find(|f| f.path == DESIGN_SYSTEM_PATH)
        .ok_or_else(|| EditError::MissingDesignSystem(format!("{} not found", DESIGN_SYSTEM_PATH)))?;
    parse_document(&file.content).map_err(|e| EditError::MissingDesignSystem(e.to_string()))
}

/// Resolve edit targets.
///
/// With no request, every editable file. Otherwise each entry is an exact
/// path (a leading `./` is ignored) or a glob; every entry must match.
pub fn select_targets(
    previous: &[VirtualFile],
    requested: &[String],
) -> Result<Vec<VirtualFile>, EditError> {
    if requested.is_empty() {
        let targets: Vec<VirtualFile> = previous
            .iter()
            .filter(|f| is_editable(&f.path))
            .cloned()
            .collect();
        if targets.is_empty() {
            return Err(EditError::NoEditableFiles);
        }
        return Ok(targets);
    }

    let mut wanted: HashSet<&str> = HashSet::new();
    for entry in requested {
        let normalized = normalize_path(entry);
        let matches: Vec<&str> = if is_glob(&normalized) {
            let matcher = Glob::new(&normalized)
                .map_err(|_| EditError::UnknownTarget(entry.clone()))?
                .compile_matcher();
            previous
                .iter()
                .filter(|f| matcher.is_match(&f.path))
                .map(|f| f.path.as_str())
                .collect()
        } else {
            previous
                .iter()
                .filter(|f| f.path == normalized)
                .map(|f| f.path.as_str())
                .collect()
        };
        if matches.is_empty() {
            return Err(EditError::UnknownTarget(entry.clone()));
        }
        wanted.extend(matches);
    }
    Ok(previous
        .iter()
        .filter(|f| wanted.contains(f.path.as_str()))
        .cloned()
        .collect())
}

fn is_glob(path: &str) -> bool {
    path.contains(['*', '?', '[', '{'])
}

/// Next version's file set: previous files whose path was not edited, in
/// their original order, followed by edited files in arrival order.
pub fn merge_file_sets(previous: &[VirtualFile], edited: &[VirtualFile]) -> Vec<VirtualFile> {
    let mut seen: HashSet<&str> = HashSet::new();
    let edited: Vec<&VirtualFile> = edited
        .iter()
        .filter(|f| seen.insert(f.path.as_str()))
        .collect();
    previous
        .iter()
        .filter(|f| !seen.contains(f.path.as_str()))
        .chain(edited)
        .cloned()
        .collect()
}

/// Drives a [`ModelClient`] through one edit.
pub struct EditPipeline<M> {
    model: M,
    settings: GenerationSettings,
}

impl<M: ModelClient> EditPipeline<M> {
    pub fn new(model: M, settings: GenerationSettings) -> Self {
        Self { model, settings }
    }

    pub async fn run(&self, edit: &PreparedEdit, sink: &EventSink) -> PipelineOutcome {
        match self.execute(edit, sink).await {
            Ok(files) => PipelineOutcome::Completed { files },
            Err(interrupt) => interrupt.into_outcome(sink),
        }
    }

    async fn execute(
        &self,
        edit: &PreparedEdit,
        sink: &EventSink,
    ) -> Result<Vec<VirtualFile>, Interrupt> {
        let stage = Stage::Components;
        stage_start(
            sink,
            stage,
            format!("Editing {} file(s)", edit.targets.len()),
        )?;
        let mut ctx = RunContext::new(edit.targets.len());
        let request = CompletionRequest::new(
            prompts::EDIT_SYSTEM,
            prompts::edit_user(&edit.instruction, &edit.design, &edit.targets),
            self.settings.edit_max_tokens,
        );
        // The model does not restate sections; derive them from the path.
        ctx.stream_components(&self.model, &request, sink, |file| {
            SectionKind::from_path(&file.path)
        })
        .await?;
        tracing::info!(edited = ctx.completed(), targets = edit.targets.len(), "edit streamed");
        stage_complete(sink, stage, None)?;

        let stage = Stage::Assembly;
        stage_start(sink, stage, "Merging changes")?;
        let files = merge_file_sets(&edit.previous, ctx.files());
        stage_complete(sink, stage, None)?;

        emit(
            sink,
            Stage::Complete,
            PipelineEvent::GenerationComplete {
                stage: Stage::Complete,
                total_files: files.len(),
            },
        )?;
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> Vec<VirtualFile> {
        vec![
            VirtualFile::new("package.json", "{}"),
            VirtualFile::new("tailwind.config.ts", "export default {};"),
            VirtualFile::new("src/lib/design-system.json", "{}"),
            VirtualFile::new("src/components/Navbar.tsx", "nav"),
            VirtualFile::new("src/components/Hero.tsx", "hero"),
            VirtualFile::new("src/components/Features.tsx", "features"),
            VirtualFile::new("src/components/Pricing.tsx", "pricing"),
            VirtualFile::new("src/components/Footer.tsx", "footer"),
            VirtualFile::new("src/app/globals.css", "body{}"),
            VirtualFile::new("src/styles/extra.css", ".x{}"),
        ]
    }

    #[test]
    fn test_default_targets_are_source_and_style() {
        let targets = select_targets(&version(), &[]).unwrap();
        let paths: Vec<&str> = targets.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(targets.len(), 7);
        assert!(paths.contains(&"src/app/globals.css"));
        assert!(!paths.contains(&"tailwind.config.ts"));
        assert!(!paths.contains(&"src/lib/design-system.json"));
    }

    #[test]
    fn test_explicit_and_glob_targets() {
        let targets =
            select_targets(&version(), &["./src/components/Hero.tsx".to_string()]).unwrap();
        assert_eq!(targets.len(), 1);

        let targets = select_targets(&version(), &["src/components/F*.tsx".to_string()]).unwrap();
        let paths: Vec<&str> = targets.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/components/Features.tsx", "src/components/Footer.tsx"]);

        assert_eq!(
            select_targets(&version(), &["src/components/Blog.tsx".to_string()]),
            Err(EditError::UnknownTarget("src/components/Blog.tsx".to_string()))
        );
    }

    #[test]
    fn test_no_editable_files() {
        let files = vec![VirtualFile::new("package.json", "{}")];
        assert_eq!(select_targets(&files, &[]), Err(EditError::NoEditableFiles));
    }

    #[test]
    fn test_merge_replaces_edited_paths() {
        let previous = version();
        let edited = vec![
            VirtualFile::new("src/components/Hero.tsx", "hero v2"),
            VirtualFile::new("src/components/Testimonials.tsx", "new"),
        ];
        let merged = merge_file_sets(&previous, &edited);
        assert_eq!(merged.len(), previous.len() + 1);

        let mut paths: Vec<&str> = merged.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths[paths.len() - 2..], ["src/components/Hero.tsx", "src/components/Testimonials.tsx"]);
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), merged.len());

        let hero = merged.iter().find(|f| f.path.ends_with("Hero.tsx")).unwrap();
        assert_eq!(hero.content, "hero v2");
    }

    #[test]
    fn test_prepare_requires_design_system() {
        let request = EditRequest {
            instruction: "Make the hero bolder".into(),
            files: vec![],
        };
        let err = prepare_edit(&request, version()).unwrap_err();
        assert!(matches!(err, EditError::MissingDesignSystem(_)));

        let blank = EditRequest::default();
        assert_eq!(prepare_edit(&blank, version()).unwrap_err(), EditError::EmptyInstruction);
        assert_eq!(prepare_edit(&request, Vec::new()).unwrap_err(), EditError::NoPreviousFiles);
    }
}
