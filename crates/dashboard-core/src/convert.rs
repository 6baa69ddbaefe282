// ── API-to-domain type conversions ──
//
// Bridges raw `dashboard_api` wire types into `dashboard_core::model`
// domain types, and domain inputs back into request bodies.

use dashboard_api::models::{CreateTodoRequest, FeedDto, NewsDto, StreamDto, TodoDto, WeatherDto};

use crate::model::{Feed, NewTodo, NewsItem, StreamInfo, TodoItem, WeatherReport};

impl From<TodoDto> for TodoItem {
    fn from(dto: TodoDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            description: dto.description,
            completed: dto.completed,
            created: dto.created,
            due: dto.due,
        }
    }
}

impl From<NewTodo> for CreateTodoRequest {
    fn from(draft: NewTodo) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            due: draft.due,
        }
    }
}

impl From<WeatherDto> for WeatherReport {
    fn from(dto: WeatherDto) -> Self {
        Self {
            location: dto.location,
            temperature: dto.temperature,
            humidity: dto.humidity.clamp(0.0, 100.0),
            conditions: dto.conditions,
            icon_code: dto.icon_code.filter(|c| !c.is_empty()),
            updated: dto.updated,
        }
    }
}

impl From<NewsDto> for NewsItem {
    fn from(dto: NewsDto) -> Self {
        Self {
            title: dto.title,
            content: dto.content,
            source: dto.source,
            url: dto.url,
            timestamp: dto.timestamp,
        }
    }
}

impl From<FeedDto> for Feed {
    fn from(dto: FeedDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            url: dto.url,
        }
    }
}

impl From<StreamDto> for StreamInfo {
    fn from(dto: StreamDto) -> Self {
        Self {
            id: dto.id,
            url: dto.url,
            title: dto.title,
            is_active: dto.is_active,
            viewer_count: dto.viewer_count,
        }
    }
}
