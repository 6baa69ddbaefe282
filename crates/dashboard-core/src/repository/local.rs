// Local repositories: read and write the shared `LocalStore`.

use std::sync::Arc;

use async_trait::async_trait;

use super::{FeedRepository, Mode, NewsRepository, StreamRepository, TodoRepository, WeatherRepository};
use crate::error::CoreError;
use crate::model::{Feed, NewTodo, NewsItem, StreamInfo, TodoItem, WeatherReport};
use crate::store::LocalStore;

macro_rules! local_repository {
    ($name:ident) => {
        pub struct $name {
            store: Arc<LocalStore>,
        }

        impl $name {
            pub fn new(store: Arc<LocalStore>) -> Self {
                Self { store }
            }
        }
    };
}

local_repository!(LocalTodos);
local_repository!(LocalWeather);
local_repository!(LocalNews);
local_repository!(LocalFeeds);
local_repository!(LocalStreams);

#[async_trait]
impl TodoRepository for LocalTodos {
    fn mode(&self) -> Mode {
        Mode::Local
    }

    async fn list(&self) -> Result<Vec<TodoItem>, CoreError> {
        Ok(self.store.todos())
    }

    async fn create(&self, draft: NewTodo) -> Result<TodoItem, CoreError> {
        Ok(self.store.create_todo(draft))
    }

    async fn complete(&self, id: &str) -> Result<TodoItem, CoreError> {
        self.store.complete_todo(id).ok_or_else(|| CoreError::NotFound {
            entity_type: "todo".into(),
            identifier: id.into(),
        })
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        if self.store.delete_todo(id) {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity_type: "todo".into(),
                identifier: id.into(),
            })
        }
    }
}

#[async_trait]
impl WeatherRepository for LocalWeather {
    fn mode(&self) -> Mode {
        Mode::Local
    }

    async fn current(&self, location: &str) -> Result<WeatherReport, CoreError> {
        self.store.weather(location).ok_or_else(|| CoreError::NotFound {
            entity_type: "weather".into(),
            identifier: location.into(),
        })
    }
}

#[async_trait]
impl NewsRepository for LocalNews {
    fn mode(&self) -> Mode {
        Mode::Local
    }

    async fn headlines(&self, limit: usize) -> Result<Vec<NewsItem>, CoreError> {
        Ok(self.store.headlines(limit))
    }
}

#[async_trait]
impl FeedRepository for LocalFeeds {
    fn mode(&self) -> Mode {
        Mode::Local
    }

    async fn feeds(&self) -> Result<Vec<Feed>, CoreError> {
        Ok(self.store.feeds())
    }
}

#[async_trait]
impl StreamRepository for LocalStreams {
    fn mode(&self) -> Mode {
        Mode::Local
    }

    async fn streams(&self) -> Result<Vec<StreamInfo>, CoreError> {
        Ok(self.store.streams())
    }
}
