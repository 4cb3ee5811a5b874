//! LLM provider selection and API request/response shapes.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use sitegen_core::config::ModelConfig;

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// LLM provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic {
        api_key: String,
        model: String,
    },
    OpenAI {
        api_key: String,
        model: String,
    },
    /// Any OpenAI-compatible chat completions server with Bearer auth.
    OpenAICompatible {
        api_key: String,
        base_url: String,
        model: String,
    },
}

/// Provider names accepted by `model.provider` / `SITEGEN_PROVIDER`.
pub fn available_providers() -> &'static [&'static str] {
    &["anthropic", "openai", "openai-compatible"]
}

impl LlmProvider {
    /// Resolve a provider from config and the process environment.
    ///
    /// Priority chain:
    /// 1. `config.provider` forced -> that provider
    /// 2. `ANTHROPIC_API_KEY` -> Anthropic
    /// 3. `OPENAI_API_KEY` -> OpenAI
    /// 4. `SITEGEN_API_KEY` with a base URL -> OpenAI-compatible
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::resolve(config, |key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_config`] with an explicit environment lookup.
    pub fn resolve(
        config: &ModelConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ModelError> {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let model_or = |default: &str| {
            config
                .model
                .clone()
                .or_else(|| lookup("SITEGEN_MODEL"))
                .unwrap_or_else(|| default.to_string())
        };

        let anthropic = |key: String| Self::Anthropic {
            api_key: key,
            model: model_or(DEFAULT_ANTHROPIC_MODEL),
        };
        let openai = |key: String| Self::OpenAI {
            api_key: key,
            model: model_or(DEFAULT_OPENAI_MODEL),
        };
        let compatible = |key: String| -> Result<Self, ModelError> {
            let base_url = config
                .base_url
                .clone()
                .or_else(|| lookup("SITEGEN_BASE_URL"))
                .ok_or_else(|| {
                    ModelError::Config(
                        "openai-compatible provider needs model.base_url or SITEGEN_BASE_URL"
                            .to_string(),
                    )
                })?;
            let model = config
                .model
                .clone()
                .or_else(|| lookup("SITEGEN_MODEL"))
                .ok_or_else(|| {
                    ModelError::Config(
                        "openai-compatible provider needs model.model or SITEGEN_MODEL".to_string(),
                    )
                })?;
            Ok(Self::OpenAICompatible {
                api_key: key,
                base_url,
                model,
            })
        };
        let require = |var: &str, provider: &str| {
            lookup(var).ok_or_else(|| {
                ModelError::Config(format!("provider '{}' selected but {} not set", provider, var))
            })
        };

        if let Some(forced) = config.provider.as_deref() {
            return match forced {
                "anthropic" => Ok(anthropic(require("ANTHROPIC_API_KEY", forced)?)),
                "openai" => Ok(openai(require("OPENAI_API_KEY", forced)?)),
                "openai-compatible" => compatible(require("SITEGEN_API_KEY", forced)?),
                other => Err(ModelError::Config(format!(
                    "unknown provider '{}'. Valid: {}",
                    other,
                    available_providers().join(", ")
                ))),
            };
        }

        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            return Ok(anthropic(key));
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            return Ok(openai(key));
        }
        if let Some(key) = lookup("SITEGEN_API_KEY") {
            return compatible(key);
        }
        Err(ModelError::Config(
            "no LLM API key found. Set ANTHROPIC_API_KEY, OPENAI_API_KEY, \
             or SITEGEN_API_KEY with SITEGEN_BASE_URL"
                .to_string(),
        ))
    }

    /// Human-readable provider name.
    pub fn provider_name(&self) -> &str {
        match self {
            Self::Anthropic { .. } => "Anthropic",
            Self::OpenAI { .. } => "OpenAI",
            Self::OpenAICompatible { .. } => "OpenAI-Compatible",
        }
    }

    /// Model name in use.
    pub fn model_name(&self) -> &str {
        match self {
            Self::Anthropic { model, .. }
            | Self::OpenAI { model, .. }
            | Self::OpenAICompatible { model, .. } => model,
        }
    }

    pub(crate) fn is_anthropic(&self) -> bool {
        matches!(self, Self::Anthropic { .. })
    }

    pub(crate) fn endpoint(&self) -> String {
        match self {
            Self::Anthropic { .. } => ANTHROPIC_URL.to_string(),
            Self::OpenAI { .. } => OPENAI_URL.to_string(),
            Self::OpenAICompatible { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
        }
    }

    /// Attach auth headers and the JSON body for one request.
    pub(crate) fn build_request(
        &self,
        http: &reqwest::Client,
        system: &str,
        user: &str,
        max_tokens: u32,
        stream: bool,
    ) -> reqwest::RequestBuilder {
        let builder = http
            .post(self.endpoint())
            .header("content-type", "application/json");
        match self {
            Self::Anthropic { api_key, model } => builder
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&AnthropicRequest {
                    model: model.clone(),
                    max_tokens,
                    system: system.to_string(),
                    messages: vec![Message::new("user", user)],
                    stream,
                }),
            Self::OpenAI { api_key, model } | Self::OpenAICompatible { api_key, model, .. } => {
                builder.bearer_auth(api_key).json(&OpenAIRequest {
                    model: model.clone(),
                    max_tokens,
                    messages: vec![Message::new("system", system), Message::new("user", user)],
                    stream,
                })
            }
        }
    }

    /// Pull the text out of a non-streaming response body.
    pub(crate) fn parse_completion(&self, body: &str) -> Result<String, ModelError> {
        let text = match self {
            Self::Anthropic { .. } => {
                let resp: AnthropicResponse = serde_json::from_str(body)
                    .map_err(|e| ModelError::Parse(format!("Anthropic response: {}", e)))?;
                resp.content
                    .into_iter()
                    .filter_map(|block| block.text)
                    .collect::<String>()
            }
            Self::OpenAI { .. } | Self::OpenAICompatible { .. } => {
                let resp: OpenAIResponse = serde_json::from_str(body)
                    .map_err(|e| ModelError::Parse(format!("{} response: {}", self.provider_name(), e)))?;
                resp.choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default()
            }
        };
        if text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Best-effort message from an API error body; falls back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

// ---------------------------------------------------------------------------
// API Request / Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub(crate) struct AnthropicRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Serialize)]
pub(crate) struct OpenAIRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Serialize)]
pub(crate) struct Message {
    pub role: &'static str,
    pub content: String,
}

impl Message {
    fn new(role: &'static str, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct AnthropicResponse {
    pub content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
pub(crate) struct AnthropicContent {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
pub(crate) struct OpenAIChoice {
    pub message: OpenAIChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct OpenAIChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_anthropic_preferred() {
        let provider = LlmProvider::resolve(
            &ModelConfig::default(),
            env(&[("ANTHROPIC_API_KEY", "a"), ("OPENAI_API_KEY", "o")]),
        )
        .unwrap();
        assert_eq!(provider.provider_name(), "Anthropic");
        assert_eq!(provider.model_name(), DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn test_forced_provider_and_model() {
        let config = ModelConfig {
            provider: Some("openai".into()),
            model: Some("gpt-4.1".into()),
            ..ModelConfig::default()
        };
        let provider = LlmProvider::resolve(
            &config,
            env(&[("ANTHROPIC_API_KEY", "a"), ("OPENAI_API_KEY", "o")]),
        )
        .unwrap();
        assert_eq!(
            provider,
            LlmProvider::OpenAI {
                api_key: "o".into(),
                model: "gpt-4.1".into()
            }
        );
    }

    #[test]
    fn test_compatible_needs_base_url() {
        let err = LlmProvider::resolve(
            &ModelConfig::default(),
            env(&[("SITEGEN_API_KEY", "k"), ("SITEGEN_MODEL", "llama")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("base_url"));

        let provider = LlmProvider::resolve(
            &ModelConfig::default(),
            env(&[
                ("SITEGEN_API_KEY", "k"),
                ("SITEGEN_MODEL", "llama"),
                ("SITEGEN_BASE_URL", "http://localhost:8000/v1/"),
            ]),
        )
        .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_no_key_is_config_error() {
        let err = LlmProvider::resolve(&ModelConfig::default(), env(&[])).unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
        let forced = ModelConfig {
            provider: Some("anthropic".into()),
            ..ModelConfig::default()
        };
        let err = LlmProvider::resolve(&forced, env(&[("OPENAI_API_KEY", "o")])).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_parse_completion() {
        let anthropic = LlmProvider::Anthropic {
            api_key: "k".into(),
            model: "m".into(),
        };
        let body = r#"{"content":[{"type":"text","text":"Hello"},{"type":"text","text":" world"}]}"#;
        assert_eq!(anthropic.parse_completion(body).unwrap(), "Hello world");
        assert!(matches!(
            anthropic.parse_completion(r#"{"content":[]}"#),
            Err(ModelError::EmptyResponse)
        ));

        let openai = LlmProvider::OpenAI {
            api_key: "k".into(),
            model: "m".into(),
        };
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi"}}]}"#;
        assert_eq!(openai.parse_completion(body).unwrap(), "Hi");
        assert!(matches!(
            openai.parse_completion("not json"),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
            "Overloaded"
        );
        assert_eq!(error_message(r#"{"error":"quota"}"#), "quota");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }
}
