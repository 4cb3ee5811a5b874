//! Runtime settings for model access, retries, generation budgets, and serving.
//!
//! Load order: `.sitegen/config.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level sitegen settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SitegenConfig {
    pub model: ModelConfig,
    pub retry: RetryConfig,
    pub generation: GenerationSettings,
    pub reconcile: ReconcileConfig,
    pub server: ServerConfig,
}

/// Which model provider to call and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Force a provider: "anthropic", "openai", or "openai-compatible".
    /// When unset the first API key found in the environment decides.
    pub provider: Option<String>,
    /// Model name override. Falls back to the provider default.
    pub model: Option<String>,
    /// Base URL for OpenAI-compatible servers.
    pub base_url: Option<String>,
    /// Whole-request timeout. Streaming component generation can take minutes.
    pub request_timeout_secs: u64,
}

/// Retry policy for transient model failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Token budgets per pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub design_max_tokens: u32,
    pub blueprint_max_tokens: u32,
    pub component_max_tokens: u32,
    pub edit_max_tokens: u32,
}

/// Status polling after a dropped stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            base_url: None,
            request_timeout_secs: 600,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            design_max_tokens: 4096,
            blueprint_max_tokens: 4096,
            component_max_tokens: 32_000,
            edit_max_tokens: 16_000,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            max_polls: 40,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8787".to_string(),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

/// Like [`env_override`] for optional string fields. Empty values are ignored.
fn env_override_opt(var: &str, target: &mut Option<String>) {
    if let Ok(v) = std::env::var(var)
        && !v.trim().is_empty()
    {
        *target = Some(v.trim().to_string());
    }
}

impl SitegenConfig {
    /// Load settings from `.sitegen/config.toml` under `root`, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(".sitegen").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        env_override_opt("SITEGEN_PROVIDER", &mut self.model.provider);
        env_override_opt("SITEGEN_MODEL", &mut self.model.model);
        env_override_opt("SITEGEN_BASE_URL", &mut self.model.base_url);
        env_override(
            "SITEGEN_REQUEST_TIMEOUT_SECS",
            &mut self.model.request_timeout_secs,
        );
        env_override("SITEGEN_MAX_RETRIES", &mut self.retry.max_retries);
        env_override("SITEGEN_RETRY_BASE_DELAY_MS", &mut self.retry.base_delay_ms);
        env_override("SITEGEN_RETRY_MAX_DELAY_MS", &mut self.retry.max_delay_ms);
        env_override(
            "SITEGEN_COMPONENT_MAX_TOKENS",
            &mut self.generation.component_max_tokens,
        );
        env_override("SITEGEN_EDIT_MAX_TOKENS", &mut self.generation.edit_max_tokens);
        env_override(
            "SITEGEN_POLL_INTERVAL_MS",
            &mut self.reconcile.poll_interval_ms,
        );
        env_override("SITEGEN_MAX_POLLS", &mut self.reconcile.max_polls);
        env_override("SITEGEN_ADDR", &mut self.server.addr);
    }

    /// Reject combinations that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            anyhow::bail!(
                "retry.base_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
                self.retry.base_delay_ms,
                self.retry.max_delay_ms,
            );
        }
        let budgets = [
            ("design_max_tokens", self.generation.design_max_tokens),
            ("blueprint_max_tokens", self.generation.blueprint_max_tokens),
            ("component_max_tokens", self.generation.component_max_tokens),
            ("edit_max_tokens", self.generation.edit_max_tokens),
        ];
        if let Some((name, _)) = budgets.iter().find(|(_, v)| *v == 0) {
            anyhow::bail!("generation.{} must be greater than zero", name);
        }
        if let Some(provider) = &self.model.provider
            && !matches!(
                provider.as_str(),
                "anthropic" | "openai" | "openai-compatible"
            )
        {
            anyhow::bail!(
                "unknown model.provider '{}'. Valid: anthropic, openai, openai-compatible",
                provider
            );
        }
        Ok(())
    }
}
