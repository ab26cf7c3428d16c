//! Connectivity probe endpoints.

use serde::{Deserialize, Serialize};

use crate::models::Platform;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProbeConfig {
    pub claude_base_url: String,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub antigravity_base_url: String,
    /// Model used for the one-token Claude probe
    pub claude_model: String,
    /// Value of the `anthropic-version` header
    pub anthropic_version: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            claude_base_url: "https://api.anthropic.com".to_string(),
            openai_base_url: "https://api.openai.com".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            antigravity_base_url: "https://cloudcode-pa.googleapis.com".to_string(),
            claude_model: "claude-sonnet-4-5".to_string(),
            anthropic_version: "2023-06-01".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn base_url(&self, platform: Platform) -> &str {
        match platform {
            Platform::Claude => &self.claude_base_url,
            Platform::OpenAi => &self.openai_base_url,
            Platform::Gemini => &self.gemini_base_url,
            Platform::Antigravity => &self.antigravity_base_url,
        }
    }

    /// Point every platform at one base URL (mock servers, local relays).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            claude_base_url: base_url.to_string(),
            openai_base_url: base_url.to_string(),
            gemini_base_url: base_url.to_string(),
            antigravity_base_url: base_url.to_string(),
            ..Self::default()
        }
    }
}
