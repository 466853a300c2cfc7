//! Client-side search: a pure filter projection plus a debounced scheduler.

use std::time::Duration;

use tokio::task::JoinHandle;

use lumina_api_models::ImageRecord;

/// Delay applied between input changes and filter recomputation.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Case-insensitive substring filter over `originalFilename`.
///
/// A pure view projection: the empty query returns every record, relative
/// order is preserved, and the input is never mutated.
#[must_use]
pub fn filter_images<'a>(items: &'a [ImageRecord], query: &str) -> Vec<&'a ImageRecord> {
    if query.is_empty() {
        return items.iter().collect();
    }
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|record| record.original_filename.to_lowercase().contains(&needle))
        .collect()
}

/// Cancellable delayed scheduler for filter recomputation.
///
/// Each call to [`Debouncer::schedule`] replaces any previously scheduled
/// run, so only the last schedule before the delay elapses executes.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// A debouncer with the given delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `run` after the delay, cancelling any pending schedule.
    pub fn schedule<F>(&mut self, run: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            run();
        }));
    }

    /// Cancel any pending schedule.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
