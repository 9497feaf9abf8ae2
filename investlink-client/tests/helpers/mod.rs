//! In-process mock of the InvestLink REST API
//!
//! Binds an axum router to 127.0.0.1:0 and keeps interactions in memory with
//! upsert semantics keyed by (viewer, target). Failure and delay knobs let
//! tests exercise the error paths of the real reqwest client.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use investlink_client::InvestLink;
use investlink_common::config::ClientConfig;
use investlink_common::models::{StatusUpdateRequest, SwipeRequest};
use investlink_common::{InteractionStatus, Role};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

type ViewerKey = (Role, i64);

#[derive(Default)]
pub struct ServerState {
    /// Queued recommendation bodies per viewer; an empty queue answers `{"recommendations": []}`
    pub recommendations: HashMap<ViewerKey, VecDeque<Value>>,
    /// viewer -> target -> like
    pub interactions: HashMap<ViewerKey, BTreeMap<i64, bool>>,
    pub profiles: HashMap<(Role, i64), Value>,
    pub directory: Vec<(Role, i64, String)>,
    pub fail_recommendations: usize,
    pub fail_swipes: usize,
    pub fail_status_updates: usize,
    pub recommendation_delay: Option<Duration>,
    pub requested_nums: Vec<u32>,
    pub swipe_log: Vec<(ViewerKey, Role, i64, bool)>,
    pub search_log: Vec<(String, String, u32)>,
}

pub type Shared = Arc<Mutex<ServerState>>;

pub struct MockServer {
    pub base_url: String,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServerState::default()));

        let app = Router::new()
            .route("/health", get(health))
            .route("/api/recommendations/:role/:viewer", get(recommendations))
            .route(
                "/api/swipe/:role/:viewer/:target_role/:target",
                post(swipe),
            )
            .route("/api/interactions/:role/:viewer", get(interactions))
            .route(
                "/api/interactions/:role/:viewer/:target_role/:target",
                axum::routing::put(set_status),
            )
            .route("/api/search/:kind", get(search))
            .route("/api/investor/:id", get(investor_profile))
            .route("/api/company/:id", get(company_profile))
            .route("/api/users/count", get(investor_count))
            .route("/api/companies/count", get(company_count))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout_ms: 2_000,
            ..Default::default()
        }
    }

    pub fn link(&self) -> InvestLink {
        InvestLink::connect(self.config()).unwrap()
    }

    pub fn queue_batch(&self, role: Role, viewer: i64, body: Value) {
        self.state
            .lock()
            .unwrap()
            .recommendations
            .entry((role, viewer))
            .or_default()
            .push_back(body);
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut ServerState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Recommendation entry shaped like the server's: id under the role's id key
pub fn candidate_json(role: Role, id: i64, probability: f64) -> Value {
    let mut body = json!({
        "name": format!("{} {}", role, id),
        "match_probability": probability,
    });
    body[role.display_keys().id] = json!(id);
    body
}

pub fn batch_json(role: Role, ids: &[i64]) -> Value {
    let recommendations: Vec<Value> = ids
        .iter()
        .map(|&id| candidate_json(role, id, 95.0 - id as f64))
        .collect();
    json!({ "recommendations": recommendations })
}

fn parse_role(raw: &str) -> Result<Role, Response> {
    raw.parse::<Role>()
        .map_err(|_| (StatusCode::BAD_REQUEST, "unknown role").into_response())
}

fn check_pair(role: Role, target_role: &str) -> Result<Role, Response> {
    let target_role = parse_role(target_role)?;
    if target_role != role.counterpart() {
        return Err((StatusCode::BAD_REQUEST, "role pairing violated").into_response());
    }
    Ok(target_role)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "database": "connected"}))
}

async fn recommendations(
    State(state): State<Shared>,
    Path((role, viewer)): Path<(String, i64)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let role = match parse_role(&role) {
        Ok(role) => role,
        Err(response) => return response,
    };
    let delay = state.lock().unwrap().recommendation_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut state = state.lock().unwrap();
    if let Some(num) = params.get("num").and_then(|n| n.parse().ok()) {
        state.requested_nums.push(num);
    }
    if state.fail_recommendations > 0 {
        state.fail_recommendations -= 1;
        return (StatusCode::INTERNAL_SERVER_ERROR, "ranking unavailable").into_response();
    }
    let body = state
        .recommendations
        .get_mut(&(role, viewer))
        .and_then(|queue| queue.pop_front())
        .unwrap_or_else(|| json!({"recommendations": []}));
    Json(body).into_response()
}

async fn swipe(
    State(state): State<Shared>,
    Path((role, viewer, target_role, target)): Path<(String, i64, String, i64)>,
    Json(body): Json<SwipeRequest>,
) -> Response {
    let role = match parse_role(&role) {
        Ok(role) => role,
        Err(response) => return response,
    };
    let target_role = match check_pair(role, &target_role) {
        Ok(target_role) => target_role,
        Err(response) => return response,
    };

    let mut state = state.lock().unwrap();
    state.swipe_log.push(((role, viewer), target_role, target, body.like));
    if state.fail_swipes > 0 {
        state.fail_swipes -= 1;
        return (StatusCode::INTERNAL_SERVER_ERROR, "write failed").into_response();
    }
    state
        .interactions
        .entry((role, viewer))
        .or_default()
        .insert(target, body.like);
    Json(json!({"success": true})).into_response()
}

async fn interactions(
    State(state): State<Shared>,
    Path((role, viewer)): Path<(String, i64)>,
) -> Response {
    let role = match parse_role(&role) {
        Ok(role) => role,
        Err(response) => return response,
    };
    let target_role = role.counterpart();

    let state = state.lock().unwrap();
    let mut liked = Vec::new();
    let mut disliked = Vec::new();
    if let Some(records) = state.interactions.get(&(role, viewer)) {
        for (&target, &like) in records {
            let mut entry = json!({"name": format!("{} {}", target_role, target)});
            entry[target_role.display_keys().id] = json!(target);
            if like {
                liked.push(entry);
            } else {
                disliked.push(entry);
            }
        }
    }
    Json(json!({"liked": liked, "disliked": disliked})).into_response()
}

async fn set_status(
    State(state): State<Shared>,
    Path((role, viewer, target_role, target)): Path<(String, i64, String, i64)>,
    Json(body): Json<StatusUpdateRequest>,
) -> Response {
    let role = match parse_role(&role) {
        Ok(role) => role,
        Err(response) => return response,
    };
    if let Err(response) = check_pair(role, &target_role) {
        return response;
    }

    let mut state = state.lock().unwrap();
    if state.fail_status_updates > 0 {
        state.fail_status_updates -= 1;
        return (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response();
    }
    let records = state.interactions.entry((role, viewer)).or_default();
    match body.new_status {
        InteractionStatus::Like => {
            records.insert(target, true);
        }
        InteractionStatus::Dislike => {
            records.insert(target, false);
        }
        InteractionStatus::Remove => {
            records.remove(&target);
        }
    }
    Json(json!({"success": true})).into_response()
}

async fn search(
    State(state): State<Shared>,
    Path(kind): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let role = match kind.as_str() {
        "investors" => Role::Investor,
        "companies" => Role::Company,
        _ => return (StatusCode::NOT_FOUND, "unknown kind").into_response(),
    };
    let query = params.get("q").cloned().unwrap_or_default();
    let limit: u32 = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);

    let mut state = state.lock().unwrap();
    state.search_log.push((kind.clone(), query.clone(), limit));
    let needle = query.to_lowercase();
    let results: Vec<Value> = state
        .directory
        .iter()
        .filter(|(r, _, name)| *r == role && name.to_lowercase().contains(&needle))
        .take(limit as usize)
        .map(|(r, id, name)| {
            let mut entry = json!({"name": name});
            entry[r.display_keys().id] = json!(id);
            entry
        })
        .collect();
    Json(json!({"results": results})).into_response()
}

fn profile_response(state: &Shared, role: Role, id: i64) -> Response {
    match state.lock().unwrap().profiles.get(&(role, id)) {
        Some(profile) => Json(profile.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": format!("{} not found", role)})),
        )
            .into_response(),
    }
}

async fn investor_profile(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    profile_response(&state, Role::Investor, id)
}

async fn company_profile(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    profile_response(&state, Role::Company, id)
}

fn count_of(state: &Shared, role: Role) -> Json<Value> {
    let count = state
        .lock()
        .unwrap()
        .directory
        .iter()
        .filter(|(r, _, _)| *r == role)
        .count();
    Json(json!({"count": count}))
}

async fn investor_count(State(state): State<Shared>) -> Json<Value> {
    count_of(&state, Role::Investor)
}

async fn company_count(State(state): State<Shared>) -> Json<Value> {
    count_of(&state, Role::Company)
}
