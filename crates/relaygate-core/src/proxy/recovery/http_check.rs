//! Per-platform HTTP upstream check.
//!
//! One cheap request per vendor, authenticated with the account credential:
//!
//! | Platform    | Request                              |
//! |-------------|--------------------------------------|
//! | Claude      | `POST /v1/messages` (`max_tokens: 1`)|
//! | OpenAI      | `GET /v1/models`                     |
//! | Gemini      | `GET /v1beta/models`                 |
//! | Antigravity | `POST /v1internal:loadCodeAssist`    |

use async_trait::async_trait;
use relaygate_types::{Account, Platform, ProbeConfig};
use reqwest::{header, Client, RequestBuilder};
use serde_json::json;
use std::time::Duration;

use super::probe::{ProbeError, UpstreamCheck};

const MAX_ERROR_BODY_CHARS: usize = 256;

#[derive(Debug, Clone)]
pub struct HttpUpstreamCheck {
    client: Client,
    config: ProbeConfig,
}

impl HttpUpstreamCheck {
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .tcp_nodelay(true)
            .user_agent(concat!("relaygate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Request(format!("HTTP client builder failed: {e}")))?;
        Ok(Self { client, config })
    }

    fn base_url<'a>(&'a self, account: &'a Account) -> &'a str {
        account
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.config.base_url(account.platform))
            .trim_end_matches('/')
    }

    fn endpoint(&self, account: &Account, path: &str) -> Result<url::Url, ProbeError> {
        let raw = format!("{}{}", self.base_url(account), path);
        url::Url::parse(&raw).map_err(|e| ProbeError::InvalidUrl(format!("{raw}: {e}")))
    }

    fn build_request(&self, account: &Account, credential: &str) -> Result<RequestBuilder, ProbeError> {
        let request = match account.platform {
            Platform::Claude => self
                .client
                .post(self.endpoint(account, "/v1/messages")?)
                .header("x-api-key", credential)
                .header("anthropic-version", &self.config.anthropic_version)
                .json(&json!({
                    "model": self.config.claude_model,
                    "max_tokens": 1,
                    "messages": [{"role": "user", "content": "hi"}],
                })),
            Platform::OpenAi => self
                .client
                .get(self.endpoint(account, "/v1/models")?)
                .bearer_auth(credential),
            Platform::Gemini => self
                .client
                .get(self.endpoint(account, "/v1beta/models")?)
                .header("x-goog-api-key", credential),
            Platform::Antigravity => self
                .client
                .post(self.endpoint(account, "/v1internal:loadCodeAssist")?)
                .bearer_auth(credential)
                .header(header::CONTENT_TYPE, "application/json")
                .json(&json!({"metadata": {"ideType": "ANTIGRAVITY"}})),
        };
        Ok(request)
    }
}

#[async_trait]
impl UpstreamCheck for HttpUpstreamCheck {
    async fn check(&self, account: &Account, timeout: Duration) -> Result<(), ProbeError> {
        let credential = account
            .credential
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProbeError::MissingCredential(account.id.clone()))?;

        let response = self.build_request(account, credential)?.timeout(timeout).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProbeError::Upstream { status: status.as_u16(), body: truncate(&body) })
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
