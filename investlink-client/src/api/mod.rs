//! REST API seam
//!
//! [`MatchApi`] is the boundary between the swipe core and the server. The
//! production implementation is [`HttpMatchApi`]; tests substitute scripted
//! implementations.

use async_trait::async_trait;
use investlink_common::models::{HealthStatus, Profile};
use investlink_common::{Candidate, EntityId, InteractionLists, InteractionStatus, Role, Viewer};

use crate::error::Result;

pub mod http;
pub mod routes;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpMatchApi;

/// Operations the InvestLink server must expose
///
/// Implementations convert every failure into the client error taxonomy:
/// reads return `FetchFailed` (or `NotFound` for profiles), writes return
/// `UpdateFailed`.
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Ranked batch of at most `num` candidates. Empty means exhaustion.
    async fn recommendations(&self, viewer: Viewer, num: u32) -> Result<Vec<Candidate>>;

    /// Record a one-time like/dislike on `target`
    async fn swipe(&self, viewer: Viewer, target: EntityId, like: bool) -> Result<()>;

    /// Full like/dislike history of `viewer`
    async fn interactions(&self, viewer: Viewer) -> Result<InteractionLists>;

    /// Idempotent upsert/delete of the (viewer, target) interaction
    async fn set_status(
        &self,
        viewer: Viewer,
        target: EntityId,
        status: InteractionStatus,
    ) -> Result<()>;

    /// Free-text search over entities of `kind`
    async fn search(&self, kind: Role, query: &str, limit: u32) -> Result<Vec<Candidate>>;

    /// Profile of one investor or company
    async fn profile(&self, role: Role, id: EntityId) -> Result<Profile>;

    /// Server and database liveness
    async fn health(&self) -> Result<HealthStatus>;

    /// Number of registered accounts of `role`
    async fn count(&self, role: Role) -> Result<u64>;
}
