//! Upstream account model and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream vendor an account authenticates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Claude,
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
    Antigravity,
}

impl Platform {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Antigravity => "antigravity",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "antigravity" => Ok(Self::Antigravity),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Lifecycle status of an upstream account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Eligible for scheduling (subject to time-windowed holds)
    #[default]
    Active,
    /// Faulted; stays here until a recovery path clears it
    Error,
    /// Turned off by an operator
    Disabled,
}

impl AccountStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Error => "error",
            Self::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentialed upstream account as seen by the admission core.
///
/// Only the fault-signal fields are interpreted here; everything else is
/// carried for the probe and for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Unique identifier for the account
    pub id: String,
    /// Optional display name
    #[serde(default)]
    pub name: Option<String>,
    /// Upstream vendor
    pub platform: Platform,
    /// Current lifecycle status
    #[serde(default)]
    pub status: AccountStatus,
    /// Last error recorded when the account entered `Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the vendor rate-limited this account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limited_at: Option<DateTime<Utc>>,
    /// When the vendor rate-limit window ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_reset_at: Option<DateTime<Utc>>,
    /// Account is overloaded until this instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overload_until: Option<DateTime<Utc>>,
    /// Temporary scheduling hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_unschedulable_until: Option<DateTime<Utc>>,
    /// Free-text reason for the temporary hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_unschedulable_reason: Option<String>,
    /// API key or access token used by the connectivity probe
    #[serde(default, skip_serializing)]
    pub credential: Option<String>,
    /// Upstream base URL override (defaults to the platform endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Account {
    /// Create an active account with no holds.
    pub fn new(id: impl Into<String>, platform: Platform) -> Self {
        Self {
            id: id.into(),
            name: None,
            platform,
            status: AccountStatus::Active,
            error_message: None,
            rate_limited_at: None,
            rate_limit_reset_at: None,
            overload_until: None,
            temp_unschedulable_until: None,
            temp_unschedulable_reason: None,
            credential: None,
            base_url: None,
        }
    }

    pub const fn is_active(&self) -> bool {
        matches!(self.status, AccountStatus::Active)
    }

    pub const fn is_error(&self) -> bool {
        matches!(self.status, AccountStatus::Error)
    }

    /// Move the account into `Error` with a message.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = AccountStatus::Error;
        self.error_message = Some(message.into());
    }

    /// Transition `Error -> Active`. Returns whether a transition happened.
    pub fn clear_error(&mut self) -> bool {
        if !self.is_error() {
            return false;
        }
        self.status = AccountStatus::Active;
        self.error_message = None;
        true
    }
}
