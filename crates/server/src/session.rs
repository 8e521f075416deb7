//! Cookie-keyed session registry and per-request store construction.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use datalayer::{DataLayerError, DataLayerStore, Entries, SessionStore, SESSION_KEY};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::routes::AppState;

/// Values of one end-user session plus its last access time.
struct SessionBag {
    values: Map<String, Value>,
    touched: Instant,
}

impl SessionBag {
    fn new() -> Self {
        Self { values: Map::new(), touched: Instant::now() }
    }
}

/// Session bags of every live end-user session, keyed by session id.
///
/// Empty bags are dropped on write; idle ones are dropped by [`evict_idle`](Self::evict_idle).
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<String, SessionBag>>,
}

impl SessionRegistry {
    pub fn new() -> Self { Self::default() }

    /// Drop every session not read or written within `max_idle`; returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, bag| bag.touched.elapsed() < max_idle);
        let evicted = before.saturating_sub(self.inner.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.inner.len(), "idle sessions evicted");
        }
        evicted
    }

    /// Run `evict_idle` periodically on the current tokio runtime.
    pub fn spawn_eviction(&self, max_idle: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        let period = max_idle.min(Duration::from_secs(60)).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                registry.evict_idle(max_idle);
            }
        })
    }

    /// Handle scoped to one session id.
    pub fn handle(&self, session_id: impl Into<String>) -> RegistrySession {
        RegistrySession { registry: self.clone(), session_id: session_id.into() }
    }

    pub fn len(&self) -> usize { self.inner.len() }

    pub fn is_empty(&self) -> bool { self.inner.is_empty() }
}

/// [`SessionStore`] view of one session inside a [`SessionRegistry`].
#[derive(Clone)]
pub struct RegistrySession {
    registry: SessionRegistry,
    session_id: String,
}

impl RegistrySession {
    pub fn session_id(&self) -> &str { &self.session_id }
}

impl SessionStore for RegistrySession {
    fn get(&self, default: Entries) -> Result<Entries, DataLayerError> {
        let Some(mut bag) = self.registry.inner.get_mut(&self.session_id) else {
            return Ok(default);
        };
        bag.touched = Instant::now();
        match bag.values.get(SESSION_KEY) {
            None => Ok(default),
            Some(Value::Object(entries)) => Ok(entries.clone()),
            Some(_) => Err(DataLayerError::session(format!(
                "session {} holds a non-object under {SESSION_KEY}",
                self.session_id
            ))),
        }
    }

    fn put(&self, entries: Entries) -> Result<(), DataLayerError> {
        let inner = &self.registry.inner;
        if entries.is_empty() {
            // an empty mapping reads back the same as an absent one
            if let Some(mut bag) = inner.get_mut(&self.session_id) {
                bag.values.remove(SESSION_KEY);
                bag.touched = Instant::now();
            }
            inner.remove_if(&self.session_id, |_, bag| bag.values.is_empty());
            return Ok(());
        }
        let mut bag = inner.entry(self.session_id.clone()).or_insert_with(SessionBag::new);
        bag.values.insert(SESSION_KEY.to_string(), Value::Object(entries));
        bag.touched = Instant::now();
        Ok(())
    }
}

/// Read the session id cookie, issuing a fresh one when missing or malformed.
pub fn resolve_session(jar: CookieJar, cookie_name: &str) -> (CookieJar, String) {
    if let Some(id) = jar.get(cookie_name).map(|c| c.value().to_string()) {
        if Uuid::parse_str(&id).is_ok() {
            return (jar, id);
        }
    }
    let id = Uuid::new_v4().to_string();
    let mut cookie = Cookie::new(cookie_name.to_string(), id.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    debug!(session_id = %id, "issued session cookie");
    (jar.add(cookie), id)
}

/// One store per request, hydrated from the caller's session.
pub fn request_store(state: &AppState, session_id: &str) -> Result<DataLayerStore<RegistrySession>, DataLayerError> {
    let store = DataLayerStore::new(state.sessions.handle(session_id), state.datalayer.tag_id.clone())?;
    Ok(store.with_clear_policy(state.datalayer.clear_policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handles_are_isolated_per_session() {
        let registry = SessionRegistry::new();
        let a = registry.handle("a");
        let b = registry.handle("b");
        let mut e = Entries::new();
        e.insert("k".into(), json!(1));
        a.put(e.clone()).unwrap();
        assert_eq!(a.get(Entries::new()).unwrap(), e);
        assert!(b.get(Entries::new()).unwrap().is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_put_removes_the_bag() {
        let registry = SessionRegistry::new();
        let a = registry.handle("a");
        a.put(Entries::new()).unwrap();
        assert!(registry.is_empty());

        let mut e = Entries::new();
        e.insert("k".into(), json!(1));
        a.put(e).unwrap();
        assert_eq!(registry.len(), 1);
        a.put(Entries::new()).unwrap();
        assert!(registry.is_empty());
        assert!(a.get(Entries::new()).unwrap().is_empty());
    }

    #[test]
    fn evict_idle_drops_stale_sessions() {
        let registry = SessionRegistry::new();
        let mut e = Entries::new();
        e.insert("k".into(), json!(1));
        registry.handle("a").put(e.clone()).unwrap();
        registry.handle("b").put(e).unwrap();

        assert_eq!(registry.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.evict_idle(Duration::ZERO), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn resolve_session_reuses_valid_cookie() {
        let id = Uuid::new_v4().to_string();
        let jar = CookieJar::new().add(Cookie::new("dl_session", id.clone()));
        let (_, got) = resolve_session(jar, "dl_session");
        assert_eq!(got, id);

        let jar = CookieJar::new().add(Cookie::new("dl_session", "not-a-uuid"));
        let (jar, got) = resolve_session(jar, "dl_session");
        assert_ne!(got, "not-a-uuid");
        assert_eq!(jar.get("dl_session").map(|c| c.value().to_string()), Some(got));
    }
}
