//! Scripted in-memory [`MatchApi`] for state-machine tests

use async_trait::async_trait;
use investlink_common::models::{HealthStatus, Profile};
use investlink_common::{Candidate, EntityId, InteractionLists, InteractionStatus, Role, Viewer};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::MatchApi;
use crate::error::{ClientError, Result};

/// Holds a call open until the test releases it
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct ScriptedApi {
    batches: Mutex<VecDeque<Result<Vec<Candidate>>>>,
    swipe_results: Mutex<VecDeque<Result<()>>>,
    status_results: Mutex<VecDeque<Result<()>>>,
    interaction_failures: Mutex<usize>,
    search_results: Mutex<HashMap<String, Vec<Candidate>>>,
    pub swipes: Mutex<Vec<(Viewer, EntityId, bool)>>,
    pub searches: Mutex<Vec<String>>,
    pub status_writes: Mutex<Vec<(Viewer, EntityId, InteractionStatus)>>,
    store: Mutex<HashMap<(Viewer, EntityId), bool>>,
    fetch_gate: Mutex<Option<Arc<Gate>>>,
    swipe_gate: Mutex<Option<Arc<Gate>>>,
    interactions_gate: Mutex<Option<Arc<Gate>>>,
}

pub fn candidates(ids: &[i64]) -> Vec<Candidate> {
    ids.iter()
        .map(|&id| Candidate::new(id).with_probability(90.0 - id as f64))
        .collect()
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_batch(&self, result: Result<Vec<Candidate>>) {
        self.batches.lock().unwrap().push_back(result);
    }

    pub fn push_swipe_result(&self, result: Result<()>) {
        self.swipe_results.lock().unwrap().push_back(result);
    }

    pub fn push_status_result(&self, result: Result<()>) {
        self.status_results.lock().unwrap().push_back(result);
    }

    pub fn fail_next_interactions(&self, times: usize) {
        *self.interaction_failures.lock().unwrap() = times;
    }

    pub fn set_search_results(&self, query: &str, results: Vec<Candidate>) {
        self.search_results
            .lock()
            .unwrap()
            .insert(query.to_string(), results);
    }

    pub fn gate_fetches(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_swipes(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.swipe_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold the next interactions read after it has snapshotted the store
    pub fn gate_next_interactions(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.interactions_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn swipe_count(&self) -> usize {
        self.swipes.lock().unwrap().len()
    }

    async fn pass(gate: Option<Arc<Gate>>) {
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }
}

#[async_trait]
impl MatchApi for ScriptedApi {
    async fn recommendations(&self, _viewer: Viewer, _num: u32) -> Result<Vec<Candidate>> {
        let gate = self.fetch_gate.lock().unwrap().clone();
        Self::pass(gate).await;
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn swipe(&self, viewer: Viewer, target: EntityId, like: bool) -> Result<()> {
        let gate = self.swipe_gate.lock().unwrap().clone();
        Self::pass(gate).await;
        self.swipes.lock().unwrap().push((viewer, target, like));
        let result = self
            .swipe_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        if result.is_ok() {
            self.store.lock().unwrap().insert((viewer, target), like);
        }
        result
    }

    async fn interactions(&self, viewer: Viewer) -> Result<InteractionLists> {
        {
            let mut failures = self.interaction_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ClientError::fetch("interactions", "HTTP 500: scripted"));
            }
        }
        let mut entries: Vec<_> = self
            .store
            .lock()
            .unwrap()
            .iter()
            .filter(|((v, _), _)| *v == viewer)
            .map(|((_, target), like)| (*target, *like))
            .collect();
        entries.sort();

        let mut lists = InteractionLists::default();
        for (target, like) in entries {
            if like {
                lists.liked.push(Candidate::new(target));
            } else {
                lists.disliked.push(Candidate::new(target));
            }
        }

        let gate = self.interactions_gate.lock().unwrap().take();
        Self::pass(gate).await;
        Ok(lists)
    }

    async fn set_status(
        &self,
        viewer: Viewer,
        target: EntityId,
        status: InteractionStatus,
    ) -> Result<()> {
        self.status_writes
            .lock()
            .unwrap()
            .push((viewer, target, status));
        let result = self
            .status_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        if result.is_ok() {
            let mut store = self.store.lock().unwrap();
            match status {
                InteractionStatus::Like => {
                    store.insert((viewer, target), true);
                }
                InteractionStatus::Dislike => {
                    store.insert((viewer, target), false);
                }
                InteractionStatus::Remove => {
                    store.remove(&(viewer, target));
                }
            }
        }
        result
    }

    async fn search(&self, _kind: Role, query: &str, limit: u32) -> Result<Vec<Candidate>> {
        self.searches.lock().unwrap().push(query.to_string());
        let mut results = self
            .search_results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        results.truncate(limit as usize);
        Ok(results)
    }

    async fn profile(&self, role: Role, id: EntityId) -> Result<Profile> {
        Err(ClientError::NotFound(format!("{} {}", role, id)))
    }

    async fn health(&self) -> Result<HealthStatus> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            database: Some("connected".to_string()),
            error: None,
        })
    }

    async fn count(&self, _role: Role) -> Result<u64> {
        Ok(0)
    }
}
