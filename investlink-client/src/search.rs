//! Search-as-you-type with cancel-and-restart semantics
//!
//! Every call to [`SearchClient::search`] starts a new generation. A response
//! is only applied if no newer call has started by the time it arrives, so a
//! slow reply to an old keystroke can never overwrite the results of a newer
//! one.

use investlink_common::{Candidate, Role};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::api::MatchApi;
use crate::error::Result;

/// Result of one keystroke's search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Still the newest query; display these results
    Applied(Vec<Candidate>),
    /// A newer query started; discard
    Superseded,
}

pub struct SearchClient {
    api: Arc<dyn MatchApi>,
    limit: u32,
    debounce: Duration,
    generation: AtomicU64,
}

impl SearchClient {
    pub fn new(api: Arc<dyn MatchApi>, limit: u32, debounce: Duration) -> Self {
        Self {
            api,
            limit: limit.max(1),
            debounce,
            generation: AtomicU64::new(0),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Invalidate any in-flight search without starting a new one
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Search entities of `kind` for `query`
    ///
    /// Waits out the debounce interval first and skips the request entirely if
    /// a newer keystroke arrived meanwhile. A blank query clears results
    /// without a request. Failures of superseded requests are swallowed.
    pub async fn search(&self, kind: Role, query: &str) -> Result<SearchOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim();

        if query.is_empty() {
            return Ok(SearchOutcome::Applied(Vec::new()));
        }

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
            if !self.is_current(generation) {
                debug!(query, "Search superseded before request");
                return Ok(SearchOutcome::Superseded);
            }
        }

        let result = self.api.search(kind, query, self.limit).await;

        if !self.is_current(generation) {
            debug!(query, "Search superseded by newer query");
            return Ok(SearchOutcome::Superseded);
        }

        let results = result?;
        debug!(query, kind = %kind, count = results.len(), "Search results applied");
        Ok(SearchOutcome::Applied(results))
    }
}
