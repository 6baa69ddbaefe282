// Live repositories: thin adapters from `RemoteClient` to the domain traits.

use std::sync::Arc;

use async_trait::async_trait;

use dashboard_api::RemoteClient;

use super::{FeedRepository, Mode, NewsRepository, StreamRepository, TodoRepository, WeatherRepository};
use crate::error::CoreError;
use crate::model::{Feed, NewTodo, NewsItem, StreamInfo, TodoItem, WeatherReport};

macro_rules! live_repository {
    ($name:ident) => {
        pub struct $name {
            client: Arc<RemoteClient>,
        }

        impl $name {
            pub fn new(client: Arc<RemoteClient>) -> Self {
                Self { client }
            }
        }
    };
}

live_repository!(LiveTodos);
live_repository!(LiveWeather);
live_repository!(LiveNews);
live_repository!(LiveFeeds);
live_repository!(LiveStreams);

#[async_trait]
impl TodoRepository for LiveTodos {
    fn mode(&self) -> Mode {
        Mode::Live
    }

    async fn list(&self) -> Result<Vec<TodoItem>, CoreError> {
        let todos = self.client.list_todos().await?;
        Ok(todos.into_iter().map(TodoItem::from).collect())
    }

    async fn create(&self, draft: NewTodo) -> Result<TodoItem, CoreError> {
        let created = self.client.create_todo(&draft.into()).await?;
        Ok(created.into())
    }

    async fn complete(&self, id: &str) -> Result<TodoItem, CoreError> {
        match self.client.complete_todo(id).await {
            Ok(dto) => Ok(dto.into()),
            Err(e) if e.is_not_found() => Err(not_found("todo", id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        match self.client.delete_todo(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(not_found("todo", id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl WeatherRepository for LiveWeather {
    fn mode(&self) -> Mode {
        Mode::Live
    }

    async fn current(&self, location: &str) -> Result<WeatherReport, CoreError> {
        match self.client.weather(location).await {
            Ok(dto) => Ok(dto.into()),
            Err(e) if e.is_not_found() => Err(not_found("weather", location)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl NewsRepository for LiveNews {
    fn mode(&self) -> Mode {
        Mode::Live
    }

    async fn headlines(&self, limit: usize) -> Result<Vec<NewsItem>, CoreError> {
        let news = self.client.news(limit).await?;
        Ok(news.into_iter().map(NewsItem::from).take(limit).collect())
    }
}

#[async_trait]
impl FeedRepository for LiveFeeds {
    fn mode(&self) -> Mode {
        Mode::Live
    }

    async fn feeds(&self) -> Result<Vec<Feed>, CoreError> {
        let feeds = self.client.feeds().await?;
        Ok(feeds.into_iter().map(Feed::from).collect())
    }
}

#[async_trait]
impl StreamRepository for LiveStreams {
    fn mode(&self) -> Mode {
        Mode::Live
    }

    async fn streams(&self) -> Result<Vec<StreamInfo>, CoreError> {
        let streams = self.client.streams().await?;
        Ok(streams.into_iter().map(StreamInfo::from).collect())
    }
}

fn not_found(entity_type: &str, identifier: &str) -> CoreError {
    CoreError::NotFound {
        entity_type: entity_type.into(),
        identifier: identifier.into(),
    }
}
