// Key-value persistence abstraction (localStorage analog)
// Auth tokens and the currency preference live here; nothing else is persisted

use dashmap::DashMap;

// Well-known keys shared by the auth and currency components
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const CURRENCY_KEY: &str = "currency";

// Storage trait so components can be tested without a real browser storage object
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

// In-memory store used in tests and non-browser targets
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
