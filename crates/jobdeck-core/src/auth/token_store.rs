use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// File name for the persisted bearer token inside the cache directory.
/// The file holds the raw token string and nothing else; an absent file
/// means no session.
const TOKEN_FILE: &str = "token";

/// Durable backing store for the bearer token.
///
/// Implementations hold at most one token. The `TokenStore` is the only
/// writer; nothing else may touch the durable copy.
pub trait TokenBackend: Send + Sync {
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, token: Option<&str>) -> Result<()>;
}

/// Token persistence as a single file under the app cache directory, so a
/// restart picks up a still-live session.
pub struct SessionFileBackend {
    path: PathBuf,
}

impl SessionFileBackend {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            path: cache_dir.join(TOKEN_FILE),
        }
    }
}

impl TokenBackend for SessionFileBackend {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read token file")?;
        let token = contents.trim();
        Ok(if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        })
    }

    fn write(&self, token: Option<&str>) -> Result<()> {
        match token {
            Some(token) => {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, token).context("Failed to write token file")?;
            }
            None => {
                if self.path.exists() {
                    std::fs::remove_file(&self.path).context("Failed to remove token file")?;
                }
            }
        }
        Ok(())
    }
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryBackend(Mutex<Option<String>>);

impl TokenBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.0.lock().unwrap().clone())
    }

    fn write(&self, token: Option<&str>) -> Result<()> {
        *self.0.lock().unwrap() = token.map(str::to_owned);
        Ok(())
    }
}

/// Single source of truth for the current bearer credential.
///
/// The in-memory copy and the durable backend are kept in lockstep by the
/// one write path (`set`); reads hydrate lazily from the backend exactly
/// once, so a fresh process still sees a live session. A session exists if
/// and only if a non-empty token is held here.
pub struct TokenStore {
    backend: Box<dyn TokenBackend>,
    /// `None` = not hydrated yet; `Some(inner)` = authoritative in-memory copy.
    cached: Mutex<Option<Option<String>>>,
}

impl TokenStore {
    pub fn new(backend: impl TokenBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            cached: Mutex::new(None),
        }
    }

    /// Install or clear the credential, writing through to the durable
    /// backend. Empty tokens are treated as "no session".
    pub fn set(&self, token: Option<&str>) {
        let token = token.filter(|t| !t.is_empty());
        if let Err(e) = self.backend.write(token) {
            // Keep the in-memory session usable even when persistence fails;
            // the next process start simply will not find it.
            warn!(error = %e, "Failed to persist bearer token");
        }
        *self.cached.lock().unwrap() = Some(token.map(str::to_owned));
    }

    /// Current credential, hydrating from the durable backend on first read.
    /// Repeated reads never touch the backend again.
    pub fn get(&self) -> Option<String> {
        let mut cached = self.cached.lock().unwrap();
        if cached.is_none() {
            let hydrated = match self.backend.read() {
                Ok(token) => token,
                Err(e) => {
                    warn!(error = %e, "Failed to read persisted bearer token");
                    None
                }
            };
            debug!(found = hydrated.is_some(), "Hydrated bearer token from durable store");
            *cached = Some(hydrated);
        }
        cached.clone().flatten()
    }

    /// Drop the credential everywhere; used by logout and by the dispatcher
    /// when the server rejects the session outright.
    pub fn clear(&self) {
        self.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend that counts reads and shares its slot, so hydration behavior
    /// is observable.
    #[derive(Default, Clone)]
    struct CountingBackend {
        slot: Arc<Mutex<Option<String>>>,
        reads: Arc<AtomicUsize>,
    }

    impl TokenBackend for CountingBackend {
        fn read(&self) -> Result<Option<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.slot.lock().unwrap().clone())
        }

        fn write(&self, token: Option<&str>) -> Result<()> {
            *self.slot.lock().unwrap() = token.map(str::to_owned);
            Ok(())
        }
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let store = TokenStore::new(MemoryBackend::default());
        assert_eq!(store.get(), None);

        store.set(Some("tok-123"));
        assert_eq!(store.get().as_deref(), Some("tok-123"));
        assert!(store.is_authenticated());

        store.set(None);
        assert_eq!(store.get(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_empty_token_means_no_session() {
        let store = TokenStore::new(MemoryBackend::default());
        store.set(Some(""));
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_get_hydrates_from_backend_exactly_once() {
        let backend = CountingBackend::default();
        backend.write(Some("persisted")).unwrap();

        let store = TokenStore::new(backend.clone());
        assert_eq!(store.get().as_deref(), Some("persisted"));
        assert_eq!(store.get().as_deref(), Some("persisted"));
        assert_eq!(store.get().as_deref(), Some("persisted"));
        assert_eq!(backend.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_writes_through_to_backend() {
        let backend = CountingBackend::default();
        let store = TokenStore::new(backend.clone());

        store.set(Some("fresh"));
        assert_eq!(backend.slot.lock().unwrap().as_deref(), Some("fresh"));

        store.clear();
        assert_eq!(*backend.slot.lock().unwrap(), None);
    }

    #[test]
    fn test_set_supersedes_stale_durable_copy() {
        let backend = CountingBackend::default();
        backend.write(Some("stale")).unwrap();

        let store = TokenStore::new(backend.clone());
        store.set(Some("current"));
        // No hydration read happens after a write established the value.
        assert_eq!(store.get().as_deref(), Some("current"));
        assert_eq!(backend.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_file_backend_round_trip() {
        let dir = std::env::temp_dir().join(format!("jobdeck-test-{}", std::process::id()));
        let backend = SessionFileBackend::new(dir.clone());

        assert_eq!(backend.read().unwrap(), None);
        backend.write(Some("file-token")).unwrap();
        assert_eq!(backend.read().unwrap().as_deref(), Some("file-token"));
        backend.write(None).unwrap();
        assert_eq!(backend.read().unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }
}
