//! The five-stage generation pipeline.
//!
//! config assembly → design system → blueprint → streaming components →
//! assembly. Stages run strictly in sequence; each is bracketed by
//! `stage-start`/`stage-complete`, and the first failure becomes a single
//! `error` event that ends the run. The pipeline persists nothing itself.

use crate::context::{Interrupt, PipelineOutcome, RunContext, emit, stage_complete, stage_start};
use crate::events::{EventSink, PipelineEvent, Stage};
use crate::prompts;
use crate::scaffold::scaffold_files;
use sitegen_core::blueprint::PageBlueprint;
use sitegen_core::config::GenerationSettings;
use sitegen_core::design::DesignSystem;
use sitegen_core::files::VirtualFile;
use sitegen_core::schema::parse_document;
use sitegen_core::site::GenerationConfig;
use sitegen_llm::{CompletionRequest, ModelClient};
use std::collections::HashSet;

/// Drives a [`ModelClient`] through one full site build.
pub struct GenerationPipeline<M> {
    model: M,
    settings: GenerationSettings,
}

impl<M: ModelClient> GenerationPipeline<M> {
    pub fn new(model: M, settings: GenerationSettings) -> Self {
        Self { model, settings }
    }

    /// Run every stage, emitting events to `sink` in order.
    pub async fn run(&self, config: &GenerationConfig, sink: &EventSink) -> PipelineOutcome {
        match self.execute(config, sink).await {
            Ok(files) => PipelineOutcome::Completed { files },
            Err(interrupt) => interrupt.into_outcome(sink),
        }
    }

    async fn execute(
        &self,
        config: &GenerationConfig,
        sink: &EventSink,
    ) -> Result<Vec<VirtualFile>, Interrupt> {
        // 1. Config assembly
        let stage = Stage::ConfigAssembly;
        stage_start(sink, stage, "Preparing site configuration")?;
        let config = config
            .normalize()
            .map_err(|e| Interrupt::failed(stage, e))?;
        stage_complete(sink, stage, None)?;

        // 2. Design system
        let design = self.design_system(&config, sink).await?;

        // 3. Blueprint
        let blueprint = self.blueprint(&config, &design, sink).await?;

        // 4. Streaming components
        let stage = Stage::Components;
        stage_start(sink, stage, "Writing pages and components")?;
        let mut ctx = RunContext::new(blueprint.expected_file_count());
        let request = CompletionRequest::new(
            prompts::COMPONENTS_SYSTEM,
            prompts::components_user(&config, &design, &blueprint),
            self.settings.component_max_tokens,
        );
        ctx.stream_components(&self.model, &request, sink, |file| {
            blueprint.section_for(&file.component_name())
        })
        .await?;
        if ctx.files().is_empty() {
            return Err(Interrupt::failed(stage, "model produced no files"));
        }
        tracing::info!(files = ctx.completed(), "components generated");
        stage_complete(sink, stage, None)?;

        // 5. Assembly
        let stage = Stage::Assembly;
        stage_start(sink, stage, "Adding project scaffold")?;
        let scaffold =
            scaffold_files(&config, &design).map_err(|e| Interrupt::failed(stage, e))?;
        let files = assemble(ctx.files(), &scaffold);
        ctx.set_expected(files.len());
        for file in scaffold {
            ctx.complete_file(sink, stage, file)?;
        }
        stage_complete(sink, stage, None)?;

        emit(
            sink,
            Stage::Complete,
            PipelineEvent::GenerationComplete {
                stage: Stage::Complete,
                total_files: files.len(),
            },
        )?;
        tracing::info!(total_files = files.len(), "generation complete");
        Ok(files)
    }

    async fn design_system(
        &self,
        config: &GenerationConfig,
        sink: &EventSink,
    ) -> Result<DesignSystem, Interrupt> {
        let stage = Stage::DesignSystem;
        stage_start(sink, stage, "Designing colors and typography")?;
        let request = CompletionRequest::new(
            prompts::DESIGN_SYSTEM_SYSTEM,
            prompts::design_system_user(config),
            self.settings.design_max_tokens,
        );
        let text = self
            .model
            .complete(&request)
            .await
            .map_err(|e| Interrupt::failed(stage, e))?;
        let design: DesignSystem =
            parse_document(&text).map_err(|e| Interrupt::failed(stage, e))?;
        let data = serde_json::to_value(&design).map_err(|e| Interrupt::failed(stage, e))?;
        stage_complete(sink, stage, Some(data))?;
        Ok(design)
    }

    async fn blueprint(
        &self,
        config: &GenerationConfig,
        design: &DesignSystem,
        sink: &EventSink,
    ) -> Result<PageBlueprint, Interrupt> {
        let stage = Stage::Blueprint;
        stage_start(sink, stage, "Planning pages and sections")?;
        let request = CompletionRequest::new(
            prompts::BLUEPRINT_SYSTEM,
            prompts::blueprint_user(config, design),
            self.settings.blueprint_max_tokens,
        );
        let text = self
            .model
            .complete(&request)
            .await
            .map_err(|e| Interrupt::failed(stage, e))?;
        let blueprint: PageBlueprint =
            parse_document(&text).map_err(|e| Interrupt::failed(stage, e))?;
        tracing::info!(
            pages = blueprint.pages.len(),
            expected_files = blueprint.expected_file_count(),
            "blueprint ready"
        );
        let data = serde_json::to_value(&blueprint).map_err(|e| Interrupt::failed(stage, e))?;
        stage_complete(sink, stage, Some(data))?;
        Ok(blueprint)
    }
}

/// Union of generated and scaffold files, one per path. Scaffold files
/// replace generated files at the same path; generated files keep their
/// arrival order and scaffold files follow.
pub fn assemble(generated: &[VirtualFile], scaffold: &[VirtualFile]) -> Vec<VirtualFile> {
    let scaffold_paths: HashSet<&str> = scaffold.iter().map(|f| f.path.as_str()).collect();
    generated
        .iter()
        .filter(|f| {
            let replaced = scaffold_paths.contains(f.path.as_str());
            if replaced {
                tracing::debug!(path = %f.path, "scaffold replaces generated file");
            }
            !replaced
        })
        .chain(scaffold)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold_wins_on_collision() {
        let generated = vec![
            VirtualFile::new("src/components/Hero.tsx", "hero"),
            VirtualFile::new("package.json", "{\"name\":\"model\"}"),
            VirtualFile::new("src/app/page.tsx", "page"),
        ];
        let scaffold = vec![VirtualFile::new("package.json", "{\"name\":\"scaffold\"}")];
        let files = assemble(&generated, &scaffold);
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["src/components/Hero.tsx", "src/app/page.tsx", "package.json"]
        );
        assert!(files[2].content.contains("scaffold"));
    }
}
