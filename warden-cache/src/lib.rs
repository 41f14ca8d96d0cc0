use bytes::Bytes;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Errors raised while encoding or decoding cached values.
#[derive(Debug)]
pub enum CacheError {
    Serialize(String),
    Deserialize(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Serialize(msg) => write!(f, "cache serialization failed: {msg}"),
            CacheError::Deserialize(msg) => write!(f, "cache deserialization failed: {msg}"),
        }
    }
}

impl std::error::Error for CacheError {}

/// Pluggable cache backend trait.
///
/// Entries never expire on their own; they live until removed or cleared.
/// Implement this to swap the default in-memory store for Redis, Memcached, etc.
pub trait CacheStore: Send + Sync + 'static {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<Bytes>> + Send + 'a>>;
    fn set<'a>(&'a self, key: &'a str, value: Bytes) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
    fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Default in-memory cache store backed by `DashMap`.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    inner: Arc<DashMap<String, Bytes>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

impl CacheStore for InMemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<Bytes>> + Send + 'a>> {
        Box::pin(async move { self.inner.get(key).map(|entry| entry.value().clone()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: Bytes) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.inner.insert(key.to_string(), value);
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.inner.remove(key);
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.inner.clear();
        })
    }
}

/// Read a JSON-encoded value. `Ok(None)` on a miss.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match store.get(key).await {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Deserialize(e.to_string())),
        None => Ok(None),
    }
}

/// Store a value JSON-encoded under `key`.
pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn CacheStore,
    key: &str,
    value: &T,
) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialize(e.to_string()))?;
    store.set(key, Bytes::from(bytes)).await;
    Ok(())
}
