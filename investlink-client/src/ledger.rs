//! Interaction ledger client
//!
//! Reads back a viewer's like/dislike history and changes individual
//! interaction statuses. The server owns the records; after every successful
//! change the full lists are re-read rather than patched locally, so the view
//! only ever shows server truth. A failed change leaves the previous view in
//! place.
//!
//! Reads are stamped with a generation when issued. When reads overlap, a
//! response from an older read never replaces one from a newer read.

use chrono::Utc;
use investlink_common::events::{EventBus, SessionEvent};
use investlink_common::{EntityId, InteractionLists, InteractionStatus, Viewer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::MatchApi;
use crate::error::Result;

/// Viewer-scoped history view
pub struct InteractionLedger {
    api: Arc<dyn MatchApi>,
    viewer: Viewer,
    view: RwLock<View>,
    generation: AtomicU64,
    events: Option<EventBus>,
}

#[derive(Default)]
struct View {
    /// Generation of the read that produced `lists`
    generation: u64,
    lists: Option<InteractionLists>,
}

impl InteractionLedger {
    pub fn new(api: Arc<dyn MatchApi>, viewer: Viewer) -> Self {
        Self {
            api,
            viewer,
            view: RwLock::new(View::default()),
            generation: AtomicU64::new(0),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    /// Re-read the full liked/disliked lists
    pub async fn refresh(&self) -> Result<InteractionLists> {
        self.reload(None).await
    }

    async fn reload(&self, changed: Option<(EntityId, InteractionStatus)>) -> Result<InteractionLists> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let lists = self.api.interactions(self.viewer).await?;

        let overlap = lists.overlapping_ids();
        if !overlap.is_empty() {
            warn!(viewer = %self.viewer, ?overlap, "Server returned ids in both liked and disliked");
        }

        let mut view = self.view.write().await;
        if generation < view.generation {
            debug!(viewer = %self.viewer, generation, "Discarding interaction read superseded by a newer one");
            return Ok(lists);
        }
        view.generation = generation;
        view.lists = Some(lists.clone());

        if let Some(bus) = &self.events {
            bus.emit_lossy(SessionEvent::InteractionsRefreshed {
                viewer: self.viewer.id,
                role: self.viewer.role,
                liked: lists.liked.len(),
                disliked: lists.disliked.len(),
                changed,
                timestamp: Utc::now(),
            });
        }
        Ok(lists)
    }

    /// Change the interaction with `target`, then re-read the lists
    ///
    /// Setting the status a record already has is a server-side no-op but
    /// still succeeds and refreshes. Fails with `UpdateFailed` if the write
    /// fails and `FetchFailed` if the follow-up read fails; in both cases the
    /// previous view is kept.
    pub async fn set_status(
        &self,
        target: EntityId,
        status: InteractionStatus,
    ) -> Result<InteractionLists> {
        if let Err(error) = self.api.set_status(self.viewer, target, status).await {
            warn!(viewer = %self.viewer, %target, %status, %error, "Interaction update failed");
            return Err(error);
        }
        info!(viewer = %self.viewer, %target, %status, "Interaction updated");

        self.reload(Some((target, status))).await
    }

    /// Last lists read from the server, if any
    pub async fn view(&self) -> Option<InteractionLists> {
        self.view.read().await.lists.clone()
    }

    /// Status of `target` in the current view; `None` is neutral or not loaded
    pub async fn status_of(&self, target: EntityId) -> Option<InteractionStatus> {
        self.view.read().await.lists.as_ref()?.status_of(target)
    }
}
