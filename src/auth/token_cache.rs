use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::models::CachedToken;

/// Bearer token storage keyed by OAuth2 application id, owned by the
/// `Authenticator` it is injected into.
///
/// Implementations must tolerate concurrent access; the dispatcher may run
/// several requests at once for the same credentials.
pub trait TokenCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedToken>;
    fn put(&self, key: &str, token: CachedToken);
    fn evict(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    entries: Mutex<HashMap<String, CachedToken>>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedToken>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenCache for MemoryTokenCache {
    fn get(&self, key: &str) -> Option<CachedToken> {
        self.lock().get(key).cloned()
    }

    fn put(&self, key: &str, token: CachedToken) {
        self.lock().insert(key.to_string(), token);
    }

    fn evict(&self, key: &str) {
        self.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{MemoryTokenCache, TokenCache};
    use crate::models::CachedToken;

    #[test]
    fn put_get_evict() {
        let cache = MemoryTokenCache::new();
        assert!(cache.is_empty());

        let token = CachedToken::new("abc", Utc::now());
        cache.put("app-1", token.clone());
        cache.put("app-2", CachedToken::new("def", Utc::now()));

        assert_eq!(cache.get("app-1"), Some(token));
        assert_eq!(cache.len(), 2);

        cache.evict("app-1");
        assert_eq!(cache.get("app-1"), None);
        assert!(cache.get("app-2").is_some());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let cache = MemoryTokenCache::new();
        cache.put("app-1", CachedToken::new("old", Utc::now()));
        cache.put("app-1", CachedToken::new("new", Utc::now()));

        assert_eq!(
            cache.get("app-1").map(|token| token.access_token),
            Some("new".to_string())
        );
    }
}
