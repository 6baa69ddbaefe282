// ── Local data store ──
//
// Process-lifetime storage behind the local repositories. Repository
// objects are rebuilt on every mode flip; the store is not, so edits made
// while offline survive a round trip through live mode.

mod collection;

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;

use crate::model::{Feed, NewTodo, NewsItem, StreamInfo, TodoItem, WeatherReport};

use collection::EntityCollection;

/// Offline data for every domain.
pub struct LocalStore {
    todos: EntityCollection<TodoItem>,
    weather: EntityCollection<WeatherReport>,
    news: EntityCollection<NewsItem>,
    feeds: EntityCollection<Feed>,
    streams: EntityCollection<StreamInfo>,
}

impl LocalStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            todos: EntityCollection::new(),
            weather: EntityCollection::new(),
            news: EntityCollection::new(),
            feeds: EntityCollection::new(),
            streams: EntityCollection::new(),
        }
    }

    /// A store seeded with demo content for every domain.
    pub fn with_fixtures() -> Self {
        let store = Self::new();
        let now = Utc::now();

        for (title, description, due_days) in [
            ("Water the plants", "Balcony and kitchen", Some(1)),
            ("Renew library books", "", Some(7)),
            ("Back up photos", "Copy the phone export to the NAS", None),
        ] {
            store.create_todo(NewTodo {
                title: title.into(),
                description: description.into(),
                due: due_days.map(|d| now + ChronoDuration::days(d)),
            });
        }

        for (location, temperature, humidity, conditions, icon) in [
            ("London", 11.5, 82.0, "Light rain", "10d"),
            ("New York", 17.0, 55.0, "Partly cloudy", "02d"),
            ("Tokyo", 22.3, 64.0, "Clear", "01d"),
        ] {
            store.put_weather(WeatherReport {
                location: location.into(),
                temperature,
                humidity,
                conditions: conditions.into(),
                icon_code: Some(icon.into()),
                updated: now,
            });
        }

        for (i, (title, source)) in [
            ("Local library extends weekend hours", "City Desk"),
            ("Rail upgrades finish ahead of schedule", "Transit Weekly"),
            ("Farmers market returns to the square", "Neighbourhood News"),
        ]
        .into_iter()
        .enumerate()
        {
            let age = ChronoDuration::hours(i64::try_from(i).unwrap_or(0) * 3);
            store.put_news(NewsItem {
                title: title.into(),
                content: String::new(),
                source: source.into(),
                url: format!("https://news.example.com/story/{}", i + 1),
                timestamp: now - age,
            });
        }

        for (id, title, url) in [
            ("inbox", "Inbox", "https://mail.example.com/feeds/inbox"),
            ("updates", "Project updates", "https://mail.example.com/feeds/updates"),
        ] {
            store.feeds.upsert(
                id.into(),
                Feed {
                    id: id.into(),
                    title: title.into(),
                    url: url.into(),
                },
            );
        }

        for (id, title, active, viewers) in [
            ("harbour-cam", "Harbour webcam", true, 42),
            ("council-live", "Council meeting", false, 0),
        ] {
            store.streams.upsert(
                id.into(),
                StreamInfo {
                    id: id.into(),
                    url: format!("https://streams.example.com/{id}.m3u8"),
                    title: title.into(),
                    is_active: active,
                    viewer_count: viewers,
                },
            );
        }

        store
    }

    // ── Todos ────────────────────────────────────────────────────────

    /// All todos, oldest first.
    pub fn todos(&self) -> Vec<TodoItem> {
        let mut todos: Vec<TodoItem> = self.todos.snapshot().iter().map(|t| TodoItem::clone(t)).collect();
        todos.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        todos
    }

    pub fn create_todo(&self, draft: NewTodo) -> TodoItem {
        let item = TodoItem {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            completed: false,
            created: Utc::now(),
            due: draft.due,
        };
        self.todos.upsert(item.id.clone(), item.clone());
        item
    }

    pub fn complete_todo(&self, id: &str) -> Option<TodoItem> {
        self.todos
            .update(id, |t| t.completed = true)
            .map(|t| TodoItem::clone(&t))
    }

    pub fn delete_todo(&self, id: &str) -> bool {
        self.todos.remove(id).is_some()
    }

    /// Watch the todo list; a new snapshot is published on every edit.
    pub fn subscribe_todos(&self) -> watch::Receiver<Arc<Vec<Arc<TodoItem>>>> {
        self.todos.subscribe()
    }

    // ── Read-mostly domains ──────────────────────────────────────────

    /// Cached report for `location` (case-insensitive).
    pub fn weather(&self, location: &str) -> Option<WeatherReport> {
        self.weather
            .get(&location.trim().to_lowercase())
            .map(|w| WeatherReport::clone(&w))
    }

    pub fn put_weather(&self, report: WeatherReport) {
        self.weather.upsert(report.location.trim().to_lowercase(), report);
    }

    /// Most recent `limit` headlines, newest first.
    pub fn headlines(&self, limit: usize) -> Vec<NewsItem> {
        let mut items: Vec<NewsItem> = self.news.snapshot().iter().map(|n| NewsItem::clone(n)).collect();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(limit);
        items
    }

    pub fn put_news(&self, item: NewsItem) {
        self.news.upsert(item.url.clone(), item);
    }

    pub fn feeds(&self) -> Vec<Feed> {
        self.feeds.snapshot().iter().map(|f| Feed::clone(f)).collect()
    }

    pub fn streams(&self) -> Vec<StreamInfo> {
        self.streams.snapshot().iter().map(|s| StreamInfo::clone(s)).collect()
    }

    pub fn todo_count(&self) -> usize {
        self.todos.len()
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}
