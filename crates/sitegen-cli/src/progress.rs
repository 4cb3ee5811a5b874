//! Terminal progress display for generation and edit runs.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sitegen_pipeline::{PipelineEvent, Stage};

/// Progress bars driven by pipeline events.
pub struct GenerationProgress {
    multi: MultiProgress,
    stage_bar: ProgressBar,
    file_bar: ProgressBar,
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let stage_bar = multi.add(ProgressBar::new_spinner());
        stage_bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {prefix:.bold} {msg}")
                .expect("valid template"),
        );

        let file_bar = multi.add(ProgressBar::new(0));
        file_bar.set_style(
            ProgressStyle::default_bar()
                .template("  {prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("##-"),
        );
        file_bar.set_prefix("files");

        Self {
            multi,
            stage_bar,
            file_bar,
        }
    }

    pub fn observe(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStart { stage, message } => {
                self.stage_bar.set_prefix(stage.to_string());
                self.stage_bar
                    .set_message(message.clone().unwrap_or_default());
                self.stage_bar.tick();
            }
            PipelineEvent::StageComplete { stage, .. } => {
                self.suspend(|| eprintln!("  done: {}", stage));
            }
            PipelineEvent::ComponentStart { file_path, .. } => {
                self.file_bar.set_message(file_path.clone());
            }
            PipelineEvent::ComponentChunk { .. } => self.stage_bar.tick(),
            PipelineEvent::ComponentComplete {
                completed_files,
                total_files,
                file,
                ..
            } => {
                self.file_bar.set_length(*total_files as u64);
                self.file_bar.set_position(*completed_files as u64);
                self.file_bar.set_message(file.path.clone());
            }
            PipelineEvent::Error { stage, error } => {
                self.suspend(|| eprintln!("  failed during {}: {}", stage, error));
            }
            PipelineEvent::GenerationComplete { total_files, .. } => {
                self.stage_bar.set_prefix(Stage::Complete.to_string());
                self.file_bar.set_position(*total_files as u64);
            }
        }
    }

    /// Finish all bars.
    pub fn finish(&self) {
        self.stage_bar.finish_and_clear();
        self.file_bar.finish_and_clear();
    }

    /// Suspend progress bars for clean eprintln output, then resume.
    pub fn suspend<F: FnOnce()>(&self, f: F) {
        self.multi.suspend(f);
    }
}
