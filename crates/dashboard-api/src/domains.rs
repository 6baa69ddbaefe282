// Domain endpoints: todos (per user), weather, news, feeds, streams.

use crate::client::RemoteClient;
use crate::error::Error;
use crate::models::{CreateTodoRequest, FeedDto, NewsDto, StreamDto, TodoDto, WeatherDto};

impl RemoteClient {
    // ── Todos (identity-scoped) ──────────────────────────────────────

    /// `GET /v1/users/{uid}/todos`
    pub async fn list_todos(&self) -> Result<Vec<TodoDto>, Error> {
        let identity = self.require_identity()?;
        let url = self.url(&format!("users/{}/todos", identity.uid))?;
        self.get(url, Some(&identity.token)).await
    }

    /// `POST /v1/users/{uid}/todos`
    pub async fn create_todo(&self, request: &CreateTodoRequest) -> Result<TodoDto, Error> {
        let identity = self.require_identity()?;
        let url = self.url(&format!("users/{}/todos", identity.uid))?;
        self.post(url, request, Some(&identity.token)).await
    }

    /// `PATCH /v1/users/{uid}/todos/{id}` with `{"completed": true}`.
    pub async fn complete_todo(&self, id: &str) -> Result<TodoDto, Error> {
        let identity = self.require_identity()?;
        let url = self.url(&format!("users/{}/todos/{id}", identity.uid))?;
        self.patch(
            url,
            &serde_json::json!({ "completed": true }),
            Some(&identity.token),
        )
        .await
    }

    /// `DELETE /v1/users/{uid}/todos/{id}`
    pub async fn delete_todo(&self, id: &str) -> Result<(), Error> {
        let identity = self.require_identity()?;
        let url = self.url(&format!("users/{}/todos/{id}", identity.uid))?;
        self.delete(url, Some(&identity.token)).await
    }

    // ── Public domains ───────────────────────────────────────────────

    /// `GET /v1/weather?location=...`
    pub async fn weather(&self, location: &str) -> Result<WeatherDto, Error> {
        let mut url = self.url("weather")?;
        url.query_pairs_mut().append_pair("location", location);
        self.get(url, None).await
    }

    /// `GET /v1/news?limit=...`
    pub async fn news(&self, limit: usize) -> Result<Vec<NewsDto>, Error> {
        let mut url = self.url("news")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get(url, None).await
    }

    /// `GET /v1/feeds`
    pub async fn feeds(&self) -> Result<Vec<FeedDto>, Error> {
        let url = self.url("feeds")?;
        self.get(url, None).await
    }

    /// `GET /v1/streams`
    pub async fn streams(&self) -> Result<Vec<StreamDto>, Error> {
        let url = self.url("streams")?;
        self.get(url, None).await
    }
}
