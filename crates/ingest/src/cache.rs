//! Process-wide store of processed documents.
//!
//! A build in progress owns a `OnceCell` in the pending map, so concurrent
//! requests for the same document wait on a single build while unrelated keys
//! build in parallel. Only finished documents enter the LRU, so eviction never
//! touches a build in flight. A failed build leaves nothing behind and the
//! next request retries.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::document::normalize_input_path;
use crate::index::DocumentIndex;

type Slot = Arc<OnceCell<Arc<DocumentIndex>>>;

/// Stable cache key for a document URL: `pdf_` + hex SHA-256 of the URL as
/// the extractor will fetch it.
pub fn cache_key(pdf_url: &str) -> String {
    let digest = Sha256::digest(normalize_input_path(pdf_url).as_bytes());
    format!("pdf_{}", hex::encode(digest))
}

/// A cache lookup result, with whether the entry already existed.
pub struct CacheLookup {
    pub index: Arc<DocumentIndex>,
    pub hit: bool,
}

struct Entries {
    ready: LruCache<String, Arc<DocumentIndex>>,
    pending: HashMap<String, Slot>,
}

pub struct DocumentCache {
    entries: Mutex<Entries>,
}

impl DocumentCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(Entries {
                ready: LruCache::new(capacity),
                pending: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Poisoning cannot leave the maps half-updated; keep serving.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ready entry for `key`, if one has been built.
    pub fn get(&self, key: &str) -> Option<Arc<DocumentIndex>> {
        self.lock().ready.get(key).cloned()
    }

    /// Return the entry for `key`, running `build` if it is not cached yet.
    /// Concurrent callers for the same key share one build.
    pub async fn get_or_build<F, Fut, E>(&self, key: &str, build: F) -> Result<CacheLookup, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DocumentIndex, E>>,
    {
        let slot = {
            let mut entries = self.lock();
            if let Some(index) = entries.ready.get(key) {
                debug!(key = %key, "document cache hit");
                return Ok(CacheLookup {
                    index: index.clone(),
                    hit: true,
                });
            }
            entries
                .pending
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let built = AtomicBool::new(false);
        let built_ref = &built;
        let result = slot
            .get_or_try_init(|| async move {
                built_ref.store(true, Ordering::SeqCst);
                build().await.map(Arc::new)
            })
            .await
            .cloned();

        let mut entries = self.lock();
        let owns_pending = entries
            .pending
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &slot));
        match result {
            Ok(index) => {
                if owns_pending {
                    entries.pending.remove(key);
                    entries.ready.put(key.to_string(), index.clone());
                }
                Ok(CacheLookup {
                    index,
                    hit: !built.load(Ordering::SeqCst),
                })
            }
            Err(e) => {
                if owns_pending && !slot.initialized() {
                    entries.pending.remove(key);
                }
                Err(e)
            }
        }
    }

    /// Number of ready entries.
    pub fn len(&self) -> usize {
        self.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
