// Router: observable location container, pattern matching and page selection
// The location is an injectable shared value, not a process-global singleton

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const ROOT_PATH: &str = "/";

type Listener = Box<dyn Fn(&str) + Send + Sync>;

// Handle returned by Location::subscribe, used to unsubscribe later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// Single shared "current path" value with change notification.
// Writes are last-write-wins; reads are idempotent. In a browser target this
// would sit on top of the URL fragment, here it is a plain observable string.
pub struct Location {
    path: parking_lot::RwLock<String>,
    listeners: DashMap<u64, Listener>,
    next_listener_id: AtomicU64,
}

impl Location {
    pub fn new() -> Self {
        Self::with_path(ROOT_PATH)
    }

    // An empty initial path falls back to the root path
    pub fn with_path(path: &str) -> Self {
        let path = if path.is_empty() { ROOT_PATH } else { path };
        Self {
            path: parking_lot::RwLock::new(path.to_string()),
            listeners: DashMap::new(),
            next_listener_id: AtomicU64::new(0),
        }
    }

    pub fn get(&self) -> String {
        self.path.read().clone()
    }

    // Store the new path and notify every subscriber with the stored value
    pub fn set(&self, path: &str) {
        let path = if path.is_empty() { ROOT_PATH } else { path };
        *self.path.write() = path.to_string();

        for listener in self.listeners.iter() {
            listener.value()(path);
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.insert(id, Box::new(listener));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id.0).is_some()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new()
    }
}

// Result of matching a pattern against the current path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub is_match: bool,
    pub params: Option<HashMap<String, String>>,
}

impl RouteMatch {
    fn miss() -> Self {
        Self {
            is_match: false,
            params: None,
        }
    }
}

// Pages the application can select; unrecognized paths fall back to Home
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    Tours,
    Destinations,
    About,
    Login,
    Dashboard,
    CompanyDetail { id: String },
}

#[derive(Clone)]
pub struct Router {
    location: Arc<Location>,
}

impl Router {
    pub fn new(location: Arc<Location>) -> Self {
        Self { location }
    }

    pub fn current_path(&self) -> String {
        self.location.get()
    }

    // Update the shared location. The environment is expected to follow this
    // with a scroll-reset to the top of the viewport; that side effect is the
    // caller's responsibility, the router only publishes the change.
    pub fn navigate(&self, path: &str) {
        tracing::debug!(path, "navigating");
        self.location.set(path);
    }

    // Match a pattern against the current path. Patterns without ':' markers
    // require exact string equality (no trailing-slash normalization).
    // Parameterized patterns match segment by segment and capture ':name'
    // segments into the params map.
    pub fn match_route(&self, pattern: &str) -> RouteMatch {
        let current = self.current_path();

        if pattern.contains(':') {
            let pattern_parts: Vec<&str> = pattern.split('/').collect();
            let path_parts: Vec<&str> = current.split('/').collect();

            if pattern_parts.len() != path_parts.len() {
                return RouteMatch::miss();
            }

            let mut params = HashMap::new();
            for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
                if let Some(name) = pattern_part.strip_prefix(':') {
                    params.insert(name.to_string(), path_part.to_string());
                } else if pattern_part != path_part {
                    return RouteMatch::miss();
                }
            }

            return RouteMatch {
                is_match: true,
                params: Some(params),
            };
        }

        RouteMatch {
            is_match: current == pattern,
            params: None,
        }
    }

    // Page selection for the current path; anything unrecognized renders Home
    pub fn current_page(&self) -> Page {
        let company = self.match_route("/company/:id");
        if company.is_match {
            let id = company
                .params
                .and_then(|mut params| params.remove("id"))
                .unwrap_or_default();
            return Page::CompanyDetail { id };
        }

        match self.current_path().as_str() {
            "/tours" => Page::Tours,
            "/destinations" => Page::Destinations,
            "/about" => Page::About,
            "/login" => Page::Login,
            "/dashboard" => Page::Dashboard,
            _ => Page::Home,
        }
    }
}
