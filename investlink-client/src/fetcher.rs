//! Recommendation batch fetcher
//!
//! Read-only: fetching a batch never marks candidates as seen.

use investlink_common::{SwipeBatch, Viewer};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::MatchApi;
use crate::error::{ClientError, Result};

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Non-empty batch in presentation order
    Batch(SwipeBatch),
    /// The ranking service has no untouched candidates left for this viewer
    Exhausted,
}

/// Requests bounded batches of ranked candidates
#[derive(Clone)]
pub struct BatchFetcher {
    api: Arc<dyn MatchApi>,
    batch_size: u32,
}

impl BatchFetcher {
    pub fn new(api: Arc<dyn MatchApi>, batch_size: u32) -> Self {
        Self {
            api,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Fetch the next batch for `viewer`
    ///
    /// `batch_size` is a hint; the server may return fewer. An empty result is
    /// [`FetchOutcome::Exhausted`], while transport and status failures are
    /// `FetchFailed` and must never be read as exhaustion.
    pub async fn fetch_batch(&self, viewer: Viewer) -> Result<FetchOutcome> {
        let candidates = self.api.recommendations(viewer, self.batch_size).await?;
        let received = candidates.len();

        let batch = SwipeBatch::from_candidates(candidates)
            .map_err(|e| ClientError::fetch("recommendations", e.to_string()))?;

        if batch.is_empty() {
            info!(%viewer, "No further recommendations");
            return Ok(FetchOutcome::Exhausted);
        }

        debug!(
            %viewer,
            requested = self.batch_size,
            received,
            batch_len = batch.len(),
            "Fetched recommendation batch"
        );
        Ok(FetchOutcome::Batch(batch))
    }
}
