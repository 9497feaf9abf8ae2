//! Swipe session state machine
//!
//! ```text
//! Loading ──ok, non-empty──▶ Ready(batch, cursor) ──decide──▶ Deciding(batch, cursor)
//!    │  └──ok, empty──▶ Exhausted ◀──ack, cursor+1 == len──┘   │
//!    └──fail──▶ Error                   Ready(cursor+1) ◀──ack──┤
//!                                       Ready(cursor)   ◀──fail─┘
//! ```
//!
//! Invariants:
//! - `0 <= cursor <= len(batch)`; the cursor only moves forward, by exactly
//!   one per acknowledged swipe, and never before the write is acknowledged.
//! - At most one decision is in flight. A second decision, a "load more" or a
//!   second load while one is pending is ignored.
//! - A failed swipe write is dropped: the cursor stays put and the same
//!   candidate is shown again. The failure is logged and published as
//!   [`SessionEvent::DecisionDropped`] but never blocks the viewer.
//! - After [`SwipeSession::close`] nothing completes into the session. A
//!   write already sent still reaches the server.
//! - A `decide` or `load` whose future is dropped still completes into the
//!   session; the write or fetch runs detached.
//!
//! The session is internally synchronized and every operation takes `&self`,
//! so a view can share it behind an `Arc` and fire decisions from input
//! handlers without coordinating them.

use chrono::Utc;
use investlink_common::events::{EventBus, SessionEvent, SessionPhase};
use investlink_common::{Candidate, EntityId, SwipeBatch, Viewer};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::MatchApi;
use crate::error::{ClientError, Result};
use crate::fetcher::{BatchFetcher, FetchOutcome};

/// A decision between `Ready → Deciding` and its acknowledgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDecision {
    target: EntityId,
    like: bool,
    cursor: usize,
    epoch: u64,
}

impl PendingDecision {
    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn like(&self) -> bool {
        self.like
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[derive(Debug, Clone)]
enum SessionState {
    Loading,
    Ready {
        batch: Arc<SwipeBatch>,
        cursor: usize,
    },
    Deciding {
        batch: Arc<SwipeBatch>,
        pending: PendingDecision,
    },
    Exhausted {
        batch_len: usize,
    },
    Error(ClientError),
    Closed,
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Loading => SessionPhase::Loading,
            SessionState::Ready { .. } => SessionPhase::Ready,
            SessionState::Deciding { .. } => SessionPhase::Deciding,
            SessionState::Exhausted { .. } => SessionPhase::Exhausted,
            SessionState::Error(_) => SessionPhase::Error,
            SessionState::Closed => SessionPhase::Closed,
        }
    }

    fn cursor(&self) -> usize {
        match self {
            SessionState::Ready { cursor, .. } => *cursor,
            SessionState::Deciding { pending, .. } => pending.cursor,
            SessionState::Exhausted { batch_len } => *batch_len,
            _ => 0,
        }
    }

    fn batch_len(&self) -> usize {
        match self {
            SessionState::Ready { batch, .. } | SessionState::Deciding { batch, .. } => batch.len(),
            SessionState::Exhausted { batch_len } => *batch_len,
            _ => 0,
        }
    }

    fn current(&self) -> Option<&Candidate> {
        match self {
            SessionState::Ready { batch, cursor } => batch.get(*cursor),
            SessionState::Deciding { batch, pending } => batch.get(pending.cursor),
            _ => None,
        }
    }
}

struct Inner {
    state: SessionState,
    /// Bumped on every load; completions from an older epoch are discarded
    epoch: u64,
    load_in_flight: bool,
}

/// Why an operation was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A swipe write is outstanding
    DecisionInFlight,
    /// A batch fetch is outstanding
    LoadInFlight,
    /// No candidate is on screen (loading, exhausted or errored)
    NoCandidate,
    /// `retry` outside the error state
    NotInError,
    /// The session was closed
    Closed,
}

/// Result of [`SwipeSession::load`]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready { batch_len: usize },
    Exhausted,
    Failed(ClientError),
    Ignored(IgnoreReason),
    /// The session was closed while the fetch was outstanding
    Stale,
}

/// Result of a swipe decision
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// Write acknowledged; `cursor` is the new position
    Acknowledged {
        target: EntityId,
        like: bool,
        cursor: usize,
        exhausted: bool,
    },
    /// Write failed; the decision was discarded and the cursor did not move
    Dropped {
        target: EntityId,
        like: bool,
        error: ClientError,
    },
    Ignored(IgnoreReason),
    /// Write completed after the session was discarded; nothing was applied
    Stale { target: EntityId },
}

/// Point-in-time view of a session for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub cursor: usize,
    pub batch_len: usize,
    pub current: Option<Candidate>,
    pub error: Option<ClientError>,
}

/// Viewer-scoped swipe session
///
/// Cheap handles share one core; the swipe write and the batch fetch run in
/// detached tasks holding that core, so dropping a `decide` or `load` future
/// never strands the session in `Deciding` or `Loading`.
pub struct SwipeSession {
    shared: Arc<Shared>,
}

struct Shared {
    id: Uuid,
    viewer: Viewer,
    api: Arc<dyn MatchApi>,
    fetcher: BatchFetcher,
    inner: Mutex<Inner>,
    cancel: CancellationToken,
    events: Option<EventBus>,
}

impl SwipeSession {
    /// Create a session in `Loading`; call [`SwipeSession::load`] to fetch the first batch
    pub fn new(api: Arc<dyn MatchApi>, viewer: Viewer, batch_size: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                viewer,
                fetcher: BatchFetcher::new(api.clone(), batch_size),
                api,
                inner: Mutex::new(Inner {
                    state: SessionState::Loading,
                    epoch: 0,
                    load_in_flight: false,
                }),
                cancel: CancellationToken::new(),
                events: None,
            }),
        }
    }

    /// Publish transitions on `events`; call before the session is first used
    pub fn with_events(mut self, events: EventBus) -> Self {
        match Arc::get_mut(&mut self.shared) {
            Some(shared) => shared.events = Some(events),
            None => warn!(session = %self.shared.id, "Session already in use, events not attached"),
        }
        self
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn viewer(&self) -> Viewer {
        self.shared.viewer
    }

    /// Token cancelled when the session is closed or dropped
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shared.cancel.child_token()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Fetch a fresh batch, replacing the current one wholesale
    ///
    /// Used on mount and for "load more". Ignored while a decision or another
    /// load is outstanding.
    pub async fn load(&self) -> LoadOutcome {
        let epoch = match self.shared.begin_load().await {
            Ok(epoch) => epoch,
            Err(outcome) => return outcome,
        };

        let shared = self.shared.clone();
        let task = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = shared.cancel.cancelled() => return LoadOutcome::Stale,
                result = shared.fetcher.fetch_batch(shared.viewer) => result,
            };
            shared.complete_load(epoch, result).await
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(error) => {
                let error = ClientError::fetch("recommendations", error.to_string());
                self.shared.complete_load(epoch, Err(error)).await
            }
        }
    }

    /// "Load more" from the exhausted state; a fresh fetch, not a replay
    pub async fn load_more(&self) -> LoadOutcome {
        self.load().await
    }

    /// Re-fetch after a failed load
    pub async fn retry(&self) -> LoadOutcome {
        {
            let inner = self.shared.inner.lock().await;
            if !matches!(inner.state, SessionState::Error(_)) {
                return LoadOutcome::Ignored(IgnoreReason::NotInError);
            }
        }
        self.load().await
    }

    /// Like (`true`) or dislike (`false`) the candidate at the cursor
    ///
    /// Sends the swipe write and advances only once it is acknowledged. If
    /// this future is dropped the write still completes into the session.
    pub async fn decide(&self, like: bool) -> DecisionOutcome {
        let pending = match self.begin_decision(like).await {
            Ok(pending) => pending,
            Err(reason) => {
                debug!(session = %self.shared.id, ?reason, like, "Ignoring decision");
                return DecisionOutcome::Ignored(reason);
            }
        };

        let shared = self.shared.clone();
        let task = tokio::spawn({
            let pending = pending.clone();
            async move {
                let result = shared.api.swipe(shared.viewer, pending.target, pending.like).await;
                shared.complete_decision(pending, result).await
            }
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(error) => {
                let error = ClientError::update("swipe", error.to_string());
                self.shared.complete_decision(pending, Err(error)).await
            }
        }
    }

    /// `Ready → Deciding` for callers that issue the write themselves
    ///
    /// The caller owns the write and must hand its result to
    /// [`SwipeSession::complete_decision`].
    pub async fn begin_decision(&self, like: bool) -> std::result::Result<PendingDecision, IgnoreReason> {
        self.shared.begin_decision(like).await
    }

    /// Apply the swipe write's result to a decision from [`SwipeSession::begin_decision`]
    pub async fn complete_decision(
        &self,
        pending: PendingDecision,
        result: Result<()>,
    ) -> DecisionOutcome {
        self.shared.complete_decision(pending, result).await
    }

    /// Discard the session (navigation away)
    pub async fn close(&self) {
        self.shared.cancel.cancel();
        let mut inner = self.shared.inner.lock().await;
        inner.load_in_flight = false;
        if !matches!(inner.state, SessionState::Closed) {
            self.shared.transition(&mut inner, SessionState::Closed);
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.shared.inner.lock().await;
        SessionSnapshot {
            phase: inner.state.phase(),
            cursor: inner.state.cursor(),
            batch_len: inner.state.batch_len(),
            current: inner.state.current().cloned(),
            error: match &inner.state {
                SessionState::Error(error) => Some(error.clone()),
                _ => None,
            },
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        self.shared.inner.lock().await.state.phase()
    }

    pub async fn cursor(&self) -> usize {
        self.shared.inner.lock().await.state.cursor()
    }

    /// Candidate on screen, if any
    pub async fn current(&self) -> Option<Candidate> {
        self.shared.inner.lock().await.state.current().cloned()
    }
}

impl Drop for SwipeSession {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl Shared {
    fn emit(&self, event: SessionEvent) {
        if let Some(bus) = &self.events {
            bus.emit_lossy(event);
        }
    }

    fn transition(&self, inner: &mut Inner, next: SessionState) {
        let old_phase = inner.state.phase();
        inner.state = next;
        let new_phase = inner.state.phase();
        let cursor = inner.state.cursor();

        debug!(
            session = %self.id,
            viewer = %self.viewer,
            ?old_phase,
            ?new_phase,
            cursor,
            "Session transition"
        );
        self.emit(SessionEvent::StateChanged {
            session_id: self.id,
            old_phase,
            new_phase,
            cursor,
            timestamp: Utc::now(),
        });
    }

    /// Enter `Loading` and return the new epoch
    async fn begin_load(&self) -> std::result::Result<u64, LoadOutcome> {
        let mut inner = self.inner.lock().await;
        if self.cancel.is_cancelled() {
            return Err(LoadOutcome::Ignored(IgnoreReason::Closed));
        }
        if inner.load_in_flight {
            return Err(LoadOutcome::Ignored(IgnoreReason::LoadInFlight));
        }
        if matches!(inner.state, SessionState::Deciding { .. }) {
            debug!(session = %self.id, "Ignoring load while a decision is pending");
            return Err(LoadOutcome::Ignored(IgnoreReason::DecisionInFlight));
        }
        inner.epoch += 1;
        inner.load_in_flight = true;
        self.transition(&mut inner, SessionState::Loading);
        Ok(inner.epoch)
    }

    async fn complete_load(&self, epoch: u64, result: Result<FetchOutcome>) -> LoadOutcome {
        let mut inner = self.inner.lock().await;
        if self.cancel.is_cancelled() || inner.epoch != epoch || !inner.load_in_flight {
            return LoadOutcome::Stale;
        }
        inner.load_in_flight = false;

        match result {
            Ok(FetchOutcome::Batch(batch)) => {
                let batch_len = batch.len();
                self.emit(SessionEvent::BatchLoaded {
                    session_id: self.id,
                    viewer: self.viewer.id,
                    role: self.viewer.role,
                    batch_len,
                    timestamp: Utc::now(),
                });
                self.transition(
                    &mut inner,
                    SessionState::Ready {
                        batch: Arc::new(batch),
                        cursor: 0,
                    },
                );
                LoadOutcome::Ready { batch_len }
            }
            Ok(FetchOutcome::Exhausted) => {
                self.emit(SessionEvent::BatchLoaded {
                    session_id: self.id,
                    viewer: self.viewer.id,
                    role: self.viewer.role,
                    batch_len: 0,
                    timestamp: Utc::now(),
                });
                self.transition(&mut inner, SessionState::Exhausted { batch_len: 0 });
                LoadOutcome::Exhausted
            }
            Err(error) => {
                warn!(session = %self.id, viewer = %self.viewer, %error, "Batch fetch failed");
                self.transition(&mut inner, SessionState::Error(error.clone()));
                LoadOutcome::Failed(error)
            }
        }
    }

    async fn begin_decision(&self, like: bool) -> std::result::Result<PendingDecision, IgnoreReason> {
        let mut inner = self.inner.lock().await;
        if self.cancel.is_cancelled() {
            return Err(IgnoreReason::Closed);
        }

        let (batch, cursor) = match &inner.state {
            SessionState::Ready { batch, cursor } => (batch.clone(), *cursor),
            SessionState::Deciding { .. } => return Err(IgnoreReason::DecisionInFlight),
            SessionState::Closed => return Err(IgnoreReason::Closed),
            _ => return Err(IgnoreReason::NoCandidate),
        };
        let target = match batch.get(cursor) {
            Some(candidate) => candidate.id,
            None => return Err(IgnoreReason::NoCandidate),
        };

        let pending = PendingDecision {
            target,
            like,
            cursor,
            epoch: inner.epoch,
        };
        self.transition(
            &mut inner,
            SessionState::Deciding {
                batch,
                pending: pending.clone(),
            },
        );
        Ok(pending)
    }

    async fn complete_decision(
        &self,
        pending: PendingDecision,
        result: Result<()>,
    ) -> DecisionOutcome {
        let mut inner = self.inner.lock().await;
        let target = pending.target;

        let batch = match &inner.state {
            SessionState::Deciding {
                batch,
                pending: current,
            } if *current == pending && !self.cancel.is_cancelled() => batch.clone(),
            _ => {
                match &result {
                    Ok(()) => debug!(session = %self.id, %target, "Swipe acknowledged after session was discarded"),
                    Err(error) => warn!(session = %self.id, %target, %error, "Swipe failed after session was discarded"),
                }
                return DecisionOutcome::Stale { target };
            }
        };

        match result {
            Ok(()) => {
                let cursor = pending.cursor + 1;
                let exhausted = cursor >= batch.len();
                let next = if exhausted {
                    SessionState::Exhausted {
                        batch_len: batch.len(),
                    }
                } else {
                    SessionState::Ready { batch, cursor }
                };

                info!(session = %self.id, viewer = %self.viewer, %target, like = pending.like, cursor, "Swipe recorded");
                self.emit(SessionEvent::DecisionAcknowledged {
                    session_id: self.id,
                    target,
                    like: pending.like,
                    cursor,
                    timestamp: Utc::now(),
                });
                self.transition(&mut inner, next);

                DecisionOutcome::Acknowledged {
                    target,
                    like: pending.like,
                    cursor,
                    exhausted,
                }
            }
            Err(error) => {
                warn!(
                    session = %self.id,
                    viewer = %self.viewer,
                    %target,
                    like = pending.like,
                    %error,
                    "Swipe write failed, decision dropped"
                );
                self.emit(SessionEvent::DecisionDropped {
                    session_id: self.id,
                    target,
                    like: pending.like,
                    reason: error.to_string(),
                    timestamp: Utc::now(),
                });
                self.transition(
                    &mut inner,
                    SessionState::Ready {
                        batch,
                        cursor: pending.cursor,
                    },
                );

                DecisionOutcome::Dropped {
                    target,
                    like: pending.like,
                    error,
                }
            }
        }
    }
}
