//! In-memory image collection with refresh supersession.
//!
//! The collection is the one view-state holder: an ordered set of records in
//! server page order, a loading flag, and the last refresh error. Refreshes
//! follow cancel-and-replace semantics: every refresh takes a new epoch, and
//! page results or completions stamped with a stale epoch are discarded on
//! arrival. A failed refresh never disturbs the previously committed items.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use lumina_api_models::ImageRecord;

use crate::client::{ApiClient, ListScope};
use crate::error::ApiError;
use crate::pages;

/// Point-in-time view of the collection for rendering.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    /// Records in server page order. While `loading` is set these are the
    /// partial results of the refresh in flight; otherwise the last
    /// committed set.
    pub items: Vec<ImageRecord>,
    /// Whether a refresh is in flight.
    pub loading: bool,
    /// Normalized message from the last failed refresh, cleared when a new
    /// refresh begins.
    pub error: Option<String>,
}

/// How a refresh attempt concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched records were committed; carries the item count.
    Committed(usize),
    /// A newer refresh superseded this one; its results were discarded.
    Superseded,
}

/// Shared handle over the collection. Clones observe the same state.
#[derive(Clone)]
pub struct CollectionState {
    inner: Arc<Mutex<Inner>>,
    tx: Arc<watch::Sender<CollectionSnapshot>>,
}

struct Inner {
    committed: Vec<ImageRecord>,
    staged: Vec<ImageRecord>,
    epoch: u64,
    loading: bool,
    error: Option<String>,
}

impl CollectionState {
    /// An empty, idle collection.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CollectionSnapshot::default());
        Self {
            inner: Arc::new(Mutex::new(Inner {
                committed: Vec::new(),
                staged: Vec::new(),
                epoch: 0,
                loading: false,
                error: None,
            })),
            tx: Arc::new(tx),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CollectionSnapshot {
        self.tx.borrow().clone()
    }

    /// Observe snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CollectionSnapshot> {
        self.tx.subscribe()
    }

    /// Look up a committed record by id.
    #[must_use]
    pub fn find(&self, id: i64) -> Option<ImageRecord> {
        let inner = self.lock();
        inner.committed.iter().find(|record| record.id == id).cloned()
    }

    /// Re-fetch every page of `scope` and commit the authoritative set.
    ///
    /// Starting a new refresh supersedes any refresh still in flight;
    /// superseded results are discarded when they arrive.
    ///
    /// # Errors
    ///
    /// Returns the normalized fetch error. The previously committed items
    /// are left intact.
    pub async fn refresh(
        &self,
        client: &ApiClient,
        scope: ListScope,
        page_size: u32,
    ) -> Result<RefreshOutcome, ApiError> {
        let epoch = self.begin();
        let result = pages::fetch_all(
            |page| {
                let client = client.clone();
                async move { client.list_page(scope, page, page_size).await }
            },
            page_size,
            pages::DEFAULT_MAX_PAGES,
            |records| self.stage(epoch, records),
        )
        .await;

        match result {
            Ok(records) => {
                if self.commit(epoch, records) {
                    Ok(RefreshOutcome::Committed(self.snapshot().items.len()))
                } else {
                    Ok(RefreshOutcome::Superseded)
                }
            }
            Err(err) => {
                self.fail(epoch, &err);
                Err(err)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("collection state mutex poisoned")
    }

    /// Open a new refresh generation, superseding any in flight.
    pub(crate) fn begin(&self) -> u64 {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.staged.clear();
        inner.loading = true;
        inner.error = None;
        let epoch = inner.epoch;
        let snapshot = CollectionSnapshot {
            items: inner.committed.clone(),
            loading: true,
            error: None,
        };
        drop(inner);
        self.tx.send_replace(snapshot);
        epoch
    }

    /// Append a page of results for generation `epoch`; ignored when stale.
    pub(crate) fn stage(&self, epoch: u64, records: &[ImageRecord]) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return;
        }
        inner.staged.extend_from_slice(records);
        let snapshot = CollectionSnapshot {
            items: inner.staged.clone(),
            loading: true,
            error: None,
        };
        drop(inner);
        self.tx.send_replace(snapshot);
    }

    /// Commit the full result set for generation `epoch`. Returns whether
    /// the commit was applied (false when superseded).
    pub(crate) fn commit(&self, epoch: u64, records: Vec<ImageRecord>) -> bool {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return false;
        }
        inner.committed = dedupe_by_id(records);
        inner.staged.clear();
        inner.loading = false;
        inner.error = None;
        let snapshot = CollectionSnapshot {
            items: inner.committed.clone(),
            loading: false,
            error: None,
        };
        drop(inner);
        self.tx.send_replace(snapshot);
        true
    }

    /// Record a refresh failure for generation `epoch`; the committed items
    /// are restored to view. Ignored when stale.
    pub(crate) fn fail(&self, epoch: u64, error: &ApiError) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return;
        }
        inner.staged.clear();
        inner.loading = false;
        inner.error = Some(error.to_string());
        let snapshot = CollectionSnapshot {
            items: inner.committed.clone(),
            loading: false,
            error: inner.error.clone(),
        };
        drop(inner);
        self.tx.send_replace(snapshot);
    }
}

impl Default for CollectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop records whose `id` was already seen, keeping first occurrences in
/// order. The id is the sole identity key.
fn dedupe_by_id(records: Vec<ImageRecord>) -> Vec<ImageRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.id))
        .collect()
}
