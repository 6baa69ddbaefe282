// ── Domain model ──
//
// Canonical per-domain types served by both live and local repositories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A todo item owned by the signed-in identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created: DateTime<Utc>,
    pub due: Option<DateTime<Utc>>,
}

/// Input for creating a todo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
}

impl NewTodo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    pub conditions: String,
    pub icon_code: Option<String>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub content: String,
    pub source: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

/// A subscribed mail/RSS feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: String,
    pub url: String,
    pub title: String,
    pub is_active: bool,
    pub viewer_count: u32,
}
