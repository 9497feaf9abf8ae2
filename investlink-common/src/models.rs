//! Wire and data model types
//!
//! These mirror the JSON shapes exchanged with the InvestLink REST API.
//! Candidates carry an opaque display payload; only the id and the match
//! probability are interpreted client-side.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::role::{DisplayKeys, Role};
use crate::{Error, Result};

/// Upper bound of the ranking service's match score
pub const MAX_MATCH_PROBABILITY: f64 = 100.0;

/// Identifier of an investor (user_id) or company (company_id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(EntityId)
            .map_err(|_| Error::InvalidInput(format!("invalid entity id '{}'", s)))
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId(id)
    }
}

/// The account driving a swipe session or history view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewer {
    pub id: EntityId,
    pub role: Role,
}

impl Viewer {
    pub fn new(role: Role, id: impl Into<EntityId>) -> Self {
        Self { id: id.into(), role }
    }

    pub fn investor(id: impl Into<EntityId>) -> Self {
        Self::new(Role::Investor, id)
    }

    pub fn company(id: impl Into<EntityId>) -> Self {
        Self::new(Role::Company, id)
    }

    /// Role of the entities this viewer swipes on
    pub fn target_role(&self) -> Role {
        self.role.counterpart()
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.role, self.id)
    }
}

// ========================================
// Candidate
// ========================================

/// Keys under which the server may place the counterpart's id
const ID_KEYS: [&str; 3] = ["id", "company_id", "user_id"];
/// Keys under which the server may place the match score
const PROBABILITY_KEYS: [&str; 2] = ["match_probability", "matchProbability"];

/// One potential match surfaced to a viewer
///
/// Immutable once decoded. Everything other than the id and the score is kept
/// verbatim in `display` and only read through [`Candidate::view`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Candidate {
    pub id: EntityId,
    /// Score in [0, 100] from the ranking service. Absent on history entries.
    pub match_probability: Option<f64>,
    pub display: Map<String, Value>,
}

impl Candidate {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            match_probability: None,
            display: Map::new(),
        }
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.match_probability = Some(probability);
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.display.insert(key.to_string(), value.into());
        self
    }

    /// Role-aware accessor over the display payload
    ///
    /// `role` is the role of the candidate itself, i.e. the viewer's counterpart.
    pub fn view(&self, role: Role) -> CandidateView<'_> {
        CandidateView {
            candidate: self,
            keys: role.display_keys(),
        }
    }
}

fn value_as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl TryFrom<Map<String, Value>> for Candidate {
    type Error = Error;

    fn try_from(mut map: Map<String, Value>) -> Result<Self> {
        let mut id = None;
        for key in ID_KEYS {
            if let Some(value) = map.remove(key) {
                if id.is_none() {
                    id = Some(value_as_id(&value).ok_or_else(|| {
                        Error::Contract(format!("candidate {} is not an integer: {}", key, value))
                    })?);
                }
            }
        }
        let id = id.ok_or_else(|| Error::Contract("candidate has no id".to_string()))?;

        let mut match_probability = None;
        for key in PROBABILITY_KEYS {
            if let Some(value) = map.remove(key) {
                if match_probability.is_none() && !value.is_null() {
                    let p = value.as_f64().ok_or_else(|| {
                        Error::Contract(format!("match probability is not a number: {}", value))
                    })?;
                    match_probability = Some(p);
                }
            }
        }

        Ok(Self {
            id: EntityId(id),
            match_probability,
            display: map,
        })
    }
}

impl From<Candidate> for Map<String, Value> {
    fn from(candidate: Candidate) -> Self {
        let mut map = candidate.display;
        map.insert("id".to_string(), Value::from(candidate.id.0));
        if let Some(p) = candidate.match_probability {
            map.insert("match_probability".to_string(), Value::from(p));
        }
        map
    }
}

/// Financial range shown on a candidate card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialRange {
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Borrowed, role-aware view of a candidate's display payload
#[derive(Debug, Clone, Copy)]
pub struct CandidateView<'a> {
    candidate: &'a Candidate,
    keys: &'static DisplayKeys,
}

impl<'a> CandidateView<'a> {
    fn text(&self, key: &str) -> Option<String> {
        match self.candidate.display.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                (!joined.is_empty()).then_some(joined)
            }
            _ => None,
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        match self.candidate.display.get(key) {
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.text(self.keys.name)
    }

    pub fn location(&self) -> Vec<String> {
        self.list(self.keys.location)
    }

    pub fn stage(&self) -> Vec<String> {
        self.list(self.keys.stage)
    }

    pub fn industries(&self) -> Vec<String> {
        self.list(self.keys.industries)
    }

    pub fn description(&self) -> Option<String> {
        self.text(self.keys.description)
    }

    pub fn website(&self) -> Option<String> {
        self.text(self.keys.website)
    }

    pub fn image(&self) -> Option<String> {
        self.text(self.keys.image)
    }

    /// `None` when neither bound is present, so the card can skip the row
    pub fn financial_range(&self) -> Option<FinancialRange> {
        let min = self.text(self.keys.amount_min);
        let max = self.keys.amount_max.and_then(|key| self.text(key));
        if min.is_none() && max.is_none() {
            return None;
        }
        Some(FinancialRange { min, max })
    }
}

// ========================================
// Swipe batch
// ========================================

/// Ordered candidates returned by one recommendation fetch
///
/// Ids are distinct and order is presentation order; it is never re-sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwipeBatch {
    candidates: Vec<Candidate>,
}

impl SwipeBatch {
    /// Build a batch from a server response, enforcing the batch contract
    ///
    /// Later duplicates of an id are dropped. Scores outside [0, 100] are
    /// clamped; a non-finite score is rejected.
    pub fn from_candidates(candidates: Vec<Candidate>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut kept = Vec::with_capacity(candidates.len());

        for mut candidate in candidates {
            if !seen.insert(candidate.id) {
                warn!(id = %candidate.id, "Dropping duplicate candidate in batch");
                continue;
            }
            if let Some(p) = candidate.match_probability {
                if !p.is_finite() {
                    return Err(Error::Contract(format!(
                        "candidate {} has non-finite match probability",
                        candidate.id
                    )));
                }
                let clamped = p.clamp(0.0, MAX_MATCH_PROBABILITY);
                if clamped != p {
                    warn!(id = %candidate.id, probability = p, "Clamping out-of-range match probability");
                    candidate.match_probability = Some(clamped);
                }
            }
            kept.push(candidate);
        }

        Ok(Self { candidates: kept })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.candidates.iter().map(|c| c.id).collect()
    }
}

// ========================================
// Interactions
// ========================================

/// Requested interaction status
///
/// The numeric encoding is the wire contract: `1` like, `0` dislike,
/// `-1` remove the record entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum InteractionStatus {
    Like,
    Dislike,
    Remove,
}

impl InteractionStatus {
    pub fn as_wire(self) -> i64 {
        match self {
            InteractionStatus::Like => 1,
            InteractionStatus::Dislike => 0,
            InteractionStatus::Remove => -1,
        }
    }

    pub fn from_wire(value: i64) -> Result<Self> {
        match value {
            1 => Ok(InteractionStatus::Like),
            0 => Ok(InteractionStatus::Dislike),
            -1 => Ok(InteractionStatus::Remove),
            other => Err(Error::InvalidInput(format!("invalid interaction status {}", other))),
        }
    }
}

impl TryFrom<i64> for InteractionStatus {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::from_wire(value)
    }
}

impl From<InteractionStatus> for i64 {
    fn from(status: InteractionStatus) -> Self {
        status.as_wire()
    }
}

impl From<bool> for InteractionStatus {
    fn from(like: bool) -> Self {
        if like {
            InteractionStatus::Like
        } else {
            InteractionStatus::Dislike
        }
    }
}

impl FromStr for InteractionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" | "liked" | "1" => Ok(InteractionStatus::Like),
            "dislike" | "disliked" | "0" => Ok(InteractionStatus::Dislike),
            "remove" | "neutral" | "-1" => Ok(InteractionStatus::Remove),
            other => Err(Error::InvalidInput(format!("unknown interaction status '{}'", other))),
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InteractionStatus::Like => "like",
            InteractionStatus::Dislike => "dislike",
            InteractionStatus::Remove => "remove",
        })
    }
}

/// A viewer's like/dislike history as returned by the server
///
/// The server keeps the two lists disjoint; the client does not deduplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionLists {
    #[serde(default)]
    pub liked: Vec<Candidate>,
    #[serde(default)]
    pub disliked: Vec<Candidate>,
}

impl InteractionLists {
    /// Current status of `target`; `None` means neutral (no record)
    pub fn status_of(&self, target: EntityId) -> Option<InteractionStatus> {
        if self.liked.iter().any(|c| c.id == target) {
            Some(InteractionStatus::Like)
        } else if self.disliked.iter().any(|c| c.id == target) {
            Some(InteractionStatus::Dislike)
        } else {
            None
        }
    }

    /// Ids present in both lists; empty whenever the server honours the partition
    pub fn overlapping_ids(&self) -> Vec<EntityId> {
        let liked: HashSet<EntityId> = self.liked.iter().map(|c| c.id).collect();
        self.disliked
            .iter()
            .map(|c| c.id)
            .filter(|id| liked.contains(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.liked.len() + self.disliked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty() && self.disliked.is_empty()
    }
}

// ========================================
// Request / response bodies
// ========================================

/// `GET /recommendations/{role}/{viewer}` response
///
/// A missing or null list is exhaustion, not an error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub recommendations: Option<Vec<Candidate>>,
}

/// `POST /swipe/...` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SwipeRequest {
    pub like: bool,
}

/// `PUT /interactions/...` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusUpdateRequest {
    pub new_status: InteractionStatus,
}

/// `GET /search/{kind}` response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Candidate>,
}

/// `GET /investor/{id}` response
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InvestorProfile {
    pub user_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub invest_requirements: Option<String>,
    #[serde(default)]
    pub places: Option<String>,
    #[serde(default)]
    pub fund_stage: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub check_size_max: Option<String>,
    #[serde(default)]
    pub check_size_min: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub pic_link: Option<String>,
}

/// `GET /company/{id}` response
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompanyProfile {
    pub company_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub funding_stage: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub fund_size: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
}

/// Profile of either role
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Investor(InvestorProfile),
    Company(CompanyProfile),
}

impl Profile {
    pub fn id(&self) -> EntityId {
        match self {
            Profile::Investor(p) => p.user_id,
            Profile::Company(p) => p.company_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Profile::Investor(p) => &p.name,
            Profile::Company(p) => &p.name,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Profile::Investor(_) => Role::Investor,
            Profile::Company(_) => Role::Company,
        }
    }
}

/// `GET /health` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// `GET /users/count` and `GET /companies/count` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CountResponse {
    pub count: u64,
}
