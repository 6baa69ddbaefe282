// ── Per-domain repositories ──
//
// One abstract interface per data domain, each with a live (remote-backed)
// and a local (store-backed) implementation. A `RepositorySet` binds all
// five to the same mode at once.

mod live;
mod local;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use dashboard_api::RemoteClient;

use crate::error::CoreError;
use crate::model::{Feed, NewTodo, NewsItem, StreamInfo, TodoItem, WeatherReport};
use crate::store::LocalStore;

pub use live::{LiveFeeds, LiveNews, LiveStreams, LiveTodos, LiveWeather};
pub use local::{LocalFeeds, LocalNews, LocalStreams, LocalTodos, LocalWeather};

// ── Mode & domain ────────────────────────────────────────────────

/// Which implementation family the repositories are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// Backed by the remote service.
    Live,
    /// Backed by the on-device store.
    Local,
}

/// A data domain served through the switchboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Domain {
    Todo,
    Weather,
    News,
    Feeds,
    Streams,
}

impl Domain {
    /// Domains whose live implementation needs a signed-in identity.
    pub fn requires_identity(self) -> bool {
        matches!(self, Self::Todo)
    }
}

// ── Repository interfaces ────────────────────────────────────────

#[async_trait]
pub trait TodoRepository: Send + Sync {
    fn mode(&self) -> Mode;
    async fn list(&self) -> Result<Vec<TodoItem>, CoreError>;
    async fn create(&self, draft: NewTodo) -> Result<TodoItem, CoreError>;
    async fn complete(&self, id: &str) -> Result<TodoItem, CoreError>;
    async fn delete(&self, id: &str) -> Result<(), CoreError>;
}

#[async_trait]
pub trait WeatherRepository: Send + Sync {
    fn mode(&self) -> Mode;
    async fn current(&self, location: &str) -> Result<WeatherReport, CoreError>;
}

#[async_trait]
pub trait NewsRepository: Send + Sync {
    fn mode(&self) -> Mode;
    async fn headlines(&self, limit: usize) -> Result<Vec<NewsItem>, CoreError>;
}

#[async_trait]
pub trait FeedRepository: Send + Sync {
    fn mode(&self) -> Mode;
    async fn feeds(&self) -> Result<Vec<Feed>, CoreError>;
}

#[async_trait]
pub trait StreamRepository: Send + Sync {
    fn mode(&self) -> Mode;
    async fn streams(&self) -> Result<Vec<StreamInfo>, CoreError>;
}

// ── Factories ────────────────────────────────────────────────────

/// Builds the live and local implementation of one domain interface.
pub trait DomainFactory<R: ?Sized>: Send + Sync {
    fn live(&self) -> Result<Arc<R>, CoreError>;
    fn local(&self) -> Result<Arc<R>, CoreError>;
}

/// One factory per domain.
#[derive(Clone)]
pub struct RepositoryFactories {
    pub todo: Arc<dyn DomainFactory<dyn TodoRepository>>,
    pub weather: Arc<dyn DomainFactory<dyn WeatherRepository>>,
    pub news: Arc<dyn DomainFactory<dyn NewsRepository>>,
    pub feeds: Arc<dyn DomainFactory<dyn FeedRepository>>,
    pub streams: Arc<dyn DomainFactory<dyn StreamRepository>>,
}

impl RepositoryFactories {
    /// Live repositories over `client`, local ones over `store`.
    pub fn standard(client: Arc<RemoteClient>, store: Arc<LocalStore>) -> Self {
        let factory = Arc::new(StandardFactory { client, store });
        Self {
            todo: factory.clone(),
            weather: factory.clone(),
            news: factory.clone(),
            feeds: factory.clone(),
            streams: factory,
        }
    }
}

struct StandardFactory {
    client: Arc<RemoteClient>,
    store: Arc<LocalStore>,
}

macro_rules! standard_factory {
    ($trait:ident, $live:ident, $local:ident) => {
        impl DomainFactory<dyn $trait> for StandardFactory {
            fn live(&self) -> Result<Arc<dyn $trait>, CoreError> {
                Ok(Arc::new($live::new(Arc::clone(&self.client))))
            }

            fn local(&self) -> Result<Arc<dyn $trait>, CoreError> {
                Ok(Arc::new($local::new(Arc::clone(&self.store))))
            }
        }
    };
}

standard_factory!(TodoRepository, LiveTodos, LocalTodos);
standard_factory!(WeatherRepository, LiveWeather, LocalWeather);
standard_factory!(NewsRepository, LiveNews, LocalNews);
standard_factory!(FeedRepository, LiveFeeds, LocalFeeds);
standard_factory!(StreamRepository, LiveStreams, LocalStreams);

// ── RepositorySet ────────────────────────────────────────────────

/// A bound implementation, or the reason a domain is unavailable.
pub(crate) enum Binding<R: ?Sized> {
    Ready(Arc<R>),
    RequiresAuthentication,
}

impl<R: ?Sized> Binding<R> {
    fn get(&self, domain: Domain) -> Result<Arc<R>, CoreError> {
        match self {
            Self::Ready(repo) => Ok(Arc::clone(repo)),
            Self::RequiresAuthentication => Err(CoreError::AuthenticationRequired { domain }),
        }
    }

    fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// All five domains bound to one mode. Built whole, swapped whole.
pub(crate) struct RepositorySet {
    pub(crate) mode: Mode,
    todo: Binding<dyn TodoRepository>,
    weather: Binding<dyn WeatherRepository>,
    news: Binding<dyn NewsRepository>,
    feeds: Binding<dyn FeedRepository>,
    streams: Binding<dyn StreamRepository>,
}

fn bind<R: ?Sized>(
    domain: Domain,
    mode: Mode,
    authenticated: bool,
    factory: &dyn DomainFactory<R>,
) -> Result<Binding<R>, CoreError> {
    match mode {
        Mode::Local => Ok(Binding::Ready(factory.local()?)),
        Mode::Live if domain.requires_identity() && !authenticated => {
            Ok(Binding::RequiresAuthentication)
        }
        Mode::Live => Ok(Binding::Ready(factory.live()?)),
    }
}

impl RepositorySet {
    /// Construct every domain for `mode`. Any factory failure fails the
    /// whole set; no partial sets exist.
    pub(crate) fn build(
        mode: Mode,
        factories: &RepositoryFactories,
        authenticated: bool,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            mode,
            todo: bind(Domain::Todo, mode, authenticated, factories.todo.as_ref())?,
            weather: bind(Domain::Weather, mode, authenticated, factories.weather.as_ref())?,
            news: bind(Domain::News, mode, authenticated, factories.news.as_ref())?,
            feeds: bind(Domain::Feeds, mode, authenticated, factories.feeds.as_ref())?,
            streams: bind(Domain::Streams, mode, authenticated, factories.streams.as_ref())?,
        })
    }

    pub(crate) fn todo(&self) -> Result<Arc<dyn TodoRepository>, CoreError> {
        self.todo.get(Domain::Todo)
    }

    pub(crate) fn weather(&self) -> Result<Arc<dyn WeatherRepository>, CoreError> {
        self.weather.get(Domain::Weather)
    }

    pub(crate) fn news(&self) -> Result<Arc<dyn NewsRepository>, CoreError> {
        self.news.get(Domain::News)
    }

    pub(crate) fn feeds(&self) -> Result<Arc<dyn FeedRepository>, CoreError> {
        self.feeds.get(Domain::Feeds)
    }

    pub(crate) fn streams(&self) -> Result<Arc<dyn StreamRepository>, CoreError> {
        self.streams.get(Domain::Streams)
    }

    pub(crate) fn is_available(&self, domain: Domain) -> bool {
        match domain {
            Domain::Todo => self.todo.is_ready(),
            Domain::Weather => self.weather.is_ready(),
            Domain::News => self.news.is_ready(),
            Domain::Feeds => self.feeds.is_ready(),
            Domain::Streams => self.streams.is_ready(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;

    fn factories() -> RepositoryFactories {
        let client = RemoteClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9").unwrap(),
        );
        RepositoryFactories::standard(Arc::new(client), Arc::new(LocalStore::with_fixtures()))
    }

    #[test]
    fn only_todo_requires_identity() {
        use strum::IntoEnumIterator;
        let gated: Vec<Domain> = Domain::iter().filter(|d| d.requires_identity()).collect();
        assert_eq!(gated, vec![Domain::Todo]);
    }

    #[test]
    fn local_set_binds_every_domain() {
        let set = RepositorySet::build(Mode::Local, &factories(), false).unwrap();
        assert_eq!(set.todo().unwrap().mode(), Mode::Local);
        assert_eq!(set.weather().unwrap().mode(), Mode::Local);
        assert_eq!(set.streams().unwrap().mode(), Mode::Local);
    }

    #[test]
    fn live_set_without_identity_gates_todo() {
        let set = RepositorySet::build(Mode::Live, &factories(), false).unwrap();
        assert!(matches!(
            set.todo(),
            Err(CoreError::AuthenticationRequired {
                domain: Domain::Todo
            })
        ));
        assert!(!set.is_available(Domain::Todo));
        assert_eq!(set.news().unwrap().mode(), Mode::Live);
        assert_eq!(set.feeds().unwrap().mode(), Mode::Live);
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!("live".parse::<Mode>().unwrap(), Mode::Live);
        assert_eq!(Mode::Local.to_string(), "local");
        assert_eq!(Domain::Streams.to_string(), "streams");
    }
}
