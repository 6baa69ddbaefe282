// Wire types for the dashboard backend.
//
// These mirror the JSON the backend speaks. `dashboard-core` converts
// them into its own domain model and never exposes them to consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Session ──────────────────────────────────────────────────────────

/// Body of `POST /v1/init`.
#[derive(Debug, Clone, Serialize)]
pub struct InitRequest {
    pub project_id: String,
    /// Client target, e.g. `"linux-x86_64"`.
    pub target: String,
    pub client_version: String,
}

/// Successful `POST /v1/init` response.
#[derive(Debug, Clone, Deserialize)]
pub struct InitResponse {
    pub session_id: String,
    #[serde(default)]
    pub server_time: Option<DateTime<Utc>>,
}

/// Successful `POST /v1/auth/anonymous` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub uid: String,
    pub token: String,
    #[serde(default = "default_true")]
    pub anonymous: bool,
}

fn default_true() -> bool {
    true
}

/// Error envelope: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ── Domains ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
}

/// Body of `POST /v1/users/{uid}/todos`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherDto {
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub conditions: String,
    #[serde(default)]
    pub icon_code: Option<String>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsDto {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub source: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedDto {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDto {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub viewer_count: u32,
}
