//! reqwest implementation of [`MatchApi`]
//!
//! All requests share one `reqwest::Client` whose timeout comes from
//! [`ClientConfig::timeout_ms`]. A timeout is reported like any other
//! transport failure.

use async_trait::async_trait;
use investlink_common::config::ClientConfig;
use investlink_common::models::{
    CompanyProfile, CountResponse, HealthStatus, InvestorProfile, Profile, RecommendationsResponse,
    SearchResponse, StatusUpdateRequest, SwipeRequest,
};
use investlink_common::{Candidate, EntityId, InteractionLists, InteractionStatus, Role, Viewer};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use super::{routes, MatchApi};
use crate::error::{ClientError, Result};

const USER_AGENT: &str = concat!("investlink-client/", env!("CARGO_PKG_VERSION"));

/// Longest server error body kept in an error message
const MAX_ERROR_BODY: usize = 200;

/// InvestLink REST API client
pub struct HttpMatchApi {
    http_client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl HttpMatchApi {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn describe(&self, err: reqwest::Error) -> String {
        if err.is_timeout() {
            format!("timed out after {}ms", self.config.timeout_ms)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        }
    }

    async fn status_error(response: Response) -> String {
        let status = response.status();
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }
        format!("HTTP {}: {}", status.as_u16(), body)
    }

    /// Send a read request; `Ok(None)` on 404
    async fn read_optional<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Option<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::fetch(operation, self.describe(e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ClientError::fetch(operation, Self::status_error(response).await));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| ClientError::fetch(operation, format!("invalid response body: {}", e)))
    }

    async fn read<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        self.read_optional(operation, request)
            .await?
            .ok_or_else(|| ClientError::fetch(operation, "HTTP 404: endpoint not found"))
    }

    /// Send a write request; any 2xx is an acknowledgment
    async fn write(&self, operation: &'static str, request: RequestBuilder) -> Result<()> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::update(operation, self.describe(e)))?;

        if !response.status().is_success() {
            return Err(ClientError::update(operation, Self::status_error(response).await));
        }
        Ok(())
    }
}

#[async_trait]
impl MatchApi for HttpMatchApi {
    async fn recommendations(&self, viewer: Viewer, num: u32) -> Result<Vec<Candidate>> {
        let url = self.config.api_url(&routes::recommendations(viewer));
        debug!(%viewer, num, "Fetching recommendations");

        let body: RecommendationsResponse = self
            .read(
                "recommendations",
                self.http_client.get(&url).query(&[("num", num)]),
            )
            .await?;
        Ok(body.recommendations.unwrap_or_default())
    }

    async fn swipe(&self, viewer: Viewer, target: EntityId, like: bool) -> Result<()> {
        let url = self.config.api_url(&routes::swipe(viewer, target));
        debug!(%viewer, %target, like, "Posting swipe");

        self.write(
            "swipe",
            self.http_client.post(&url).json(&SwipeRequest { like }),
        )
        .await
    }

    async fn interactions(&self, viewer: Viewer) -> Result<InteractionLists> {
        let url = self.config.api_url(&routes::interactions(viewer));
        self.read("interactions", self.http_client.get(&url)).await
    }

    async fn set_status(
        &self,
        viewer: Viewer,
        target: EntityId,
        status: InteractionStatus,
    ) -> Result<()> {
        let url = self.config.api_url(&routes::interaction(viewer, target));
        debug!(%viewer, %target, status = status.as_wire(), "Updating interaction status");

        self.write(
            "set_status",
            self.http_client
                .put(&url)
                .json(&StatusUpdateRequest { new_status: status }),
        )
        .await
    }

    async fn search(&self, kind: Role, query: &str, limit: u32) -> Result<Vec<Candidate>> {
        let url = self.config.api_url(&routes::search(kind));
        let limit = limit.to_string();

        let body: SearchResponse = self
            .read(
                "search",
                self.http_client
                    .get(&url)
                    .query(&[("q", query), ("limit", limit.as_str())]),
            )
            .await?;
        Ok(body.results)
    }

    async fn profile(&self, role: Role, id: EntityId) -> Result<Profile> {
        let url = self.config.api_url(&routes::profile(role, id));
        let request = self.http_client.get(&url);

        let profile = match role {
            Role::Investor => self
                .read_optional::<InvestorProfile>("profile", request)
                .await?
                .map(Profile::Investor),
            Role::Company => self
                .read_optional::<CompanyProfile>("profile", request)
                .await?
                .map(Profile::Company),
        };
        profile.ok_or_else(|| ClientError::NotFound(format!("{} {}", role, id)))
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.config.health_url();
        self.read("health", self.http_client.get(&url)).await
    }

    async fn count(&self, role: Role) -> Result<u64> {
        let url = self.config.api_url(routes::count(role));
        let body: CountResponse = self.read("count", self.http_client.get(&url)).await?;
        Ok(body.count)
    }
}
