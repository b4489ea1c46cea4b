//! Cookie-identified, per-client session state
//!
//! Each client gets an opaque UUID cookie. The session id keys an [`EntryStore`]
//! held by a pluggable [`SessionStore`].

use crate::{config::SessionConfig, error::AppError, models::EntryStore};
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Session identifier attached to every `/api` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Key-value storage for session entry stores.
///
/// `load` followed by `save` is not atomic: concurrent writers on the same session
/// resolve as last-write-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Entry store for `id`, empty if the session is unknown
    async fn load(&self, id: &SessionId) -> Result<EntryStore, AppError>;

    async fn save(&self, id: &SessionId, store: EntryStore) -> Result<(), AppError>;

    /// Drop idle sessions, returning how many were removed
    async fn purge_expired(&self) -> usize;

    /// Number of live sessions
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct SessionRecord {
    results: EntryStore,
    last_access: Instant,
}

/// Process-local session store
pub struct InMemorySessionStore {
    // DashMap for low lock contention across clients
    sessions: DashMap<SessionId, SessionRecord>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self::new(Duration::from_secs(cfg.ttl_seconds))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<EntryStore, AppError> {
        let now = Instant::now();
        match self.sessions.get_mut(id) {
            Some(mut record) if now.duration_since(record.last_access) < self.ttl => {
                record.last_access = now;
                Ok(record.results.clone())
            }
            _ => Ok(EntryStore::new()),
        }
    }

    async fn save(&self, id: &SessionId, store: EntryStore) -> Result<(), AppError> {
        self.sessions.insert(
            *id,
            SessionRecord {
                results: store,
                last_access: Instant::now(),
            },
        );
        Ok(())
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_id, record| now.duration_since(record.last_access) < self.ttl);
        before.saturating_sub(self.sessions.len())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Periodically purge idle sessions
pub async fn session_cleanup_loop(store: Arc<dyn SessionStore>, interval: Duration) {
    let mut interval = tokio::time::interval(interval);

    loop {
        interval.tick().await;

        let removed = store.purge_expired().await;
        let session_count = store.len();

        crate::metrics::update_session_count(session_count);

        tracing::debug!(
            removed,
            active_sessions = session_count,
            "Session cleanup completed"
        );
    }
}

/// Session middleware state
#[derive(Clone)]
pub struct SessionLayerConfig {
    pub cookie_name: Arc<str>,
    pub secure: bool,
}

impl From<&SessionConfig> for SessionLayerConfig {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            cookie_name: Arc::from(cfg.cookie_name.as_str()),
            secure: cfg.secure_cookie,
        }
    }
}

/// Resolve the session cookie, issuing a fresh id when absent or malformed
pub async fn session_middleware(
    State(cfg): State<SessionLayerConfig>,
    mut req: Request,
    next: Next,
) -> Response {
    let existing = find_cookie(req.headers(), &cfg.cookie_name).and_then(SessionId::parse);

    let (session_id, issued) = match existing {
        Some(id) => (id, false),
        None => (SessionId::new(), true),
    };

    req.extensions_mut().insert(session_id);

    let mut response = next.run(req).await;

    if issued {
        tracing::debug!(session = %session_id, "Issued new session");
        let cookie = session_cookie(&cfg.cookie_name, &session_id, cfg.secure);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode session cookie"),
        }
    }

    response
}

/// Value of cookie `name` across all `Cookie` headers
fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

fn session_cookie(name: &str, id: &SessionId, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, id);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UsageEntry;
    use serde_json::{Map, Value};

    fn store_with(env: &str) -> EntryStore {
        let mut payload = Map::new();
        payload.insert("env".to_string(), Value::String(env.to_string()));
        let mut store = EntryStore::new();
        store.append(UsageEntry::from_payload(payload).unwrap());
        store
    }

    #[tokio::test]
    async fn test_unknown_session_loads_empty() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let loaded = store.load(&SessionId::new()).await.unwrap();
        assert!(loaded.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let id = SessionId::new();
        store.save(&id, store_with("prod")).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded, store_with("prod"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let a = SessionId::new();
        let b = SessionId::new();
        store.save(&a, store_with("dev")).await.unwrap();

        assert!(store.load(&b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_purged() {
        let store = InMemorySessionStore::new(Duration::from_millis(20));
        let id = SessionId::new();
        store.save(&id, store_with("dev")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(store.load(&id).await.unwrap().is_empty());
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        assert_eq!(SessionId::parse(&id.to_string()), Some(id));
        assert_eq!(SessionId::parse("not-a-uuid"), None);
        assert_eq!(SessionId::parse(""), None);
    }

    #[test]
    fn test_find_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; sid=abc"));
        headers.append(header::COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(find_cookie(&headers, "sid"), Some("abc"));
        assert_eq!(find_cookie(&headers, "other"), Some("1"));
        assert_eq!(find_cookie(&headers, "missing"), None);
        assert_eq!(find_cookie(&headers, "si"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = SessionId::parse("17cf0fd3-d51b-4b59-977d-b899dafb3022").unwrap();
        assert_eq!(
            session_cookie("sid", &id, false),
            "sid=17cf0fd3-d51b-4b59-977d-b899dafb3022; Path=/; HttpOnly; SameSite=Lax"
        );
        assert!(session_cookie("sid", &id, true).ends_with("; Secure"));
    }
}
