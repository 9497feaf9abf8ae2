//! Profile lookup and directory statistics
//!
//! An unknown id is [`ClientError::NotFound`], surfaced to the page as-is and
//! never retried automatically.

use investlink_common::models::{HealthStatus, Profile};
use investlink_common::{EntityId, Role};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::MatchApi;
use crate::error::{ClientError, Result};

#[derive(Clone)]
pub struct Directory {
    api: Arc<dyn MatchApi>,
}

/// Registered account totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryCounts {
    pub investors: u64,
    pub companies: u64,
}

impl Directory {
    pub fn new(api: Arc<dyn MatchApi>) -> Self {
        Self { api }
    }

    /// Profile of the investor or company `id`
    pub async fn profile(&self, role: Role, id: EntityId) -> Result<Profile> {
        match self.api.profile(role, id).await {
            Ok(profile) if profile.role() != role || profile.id() != id => {
                Err(ClientError::fetch(
                    "profile",
                    format!("asked for {} {}, got {} {}", role, id, profile.role(), profile.id()),
                ))
            }
            Ok(profile) => {
                debug!(%role, %id, name = profile.name(), "Loaded profile");
                Ok(profile)
            }
            Err(error) => {
                if let ClientError::NotFound(_) = error {
                    debug!(%role, %id, "Profile not found");
                } else {
                    warn!(%role, %id, %error, "Profile lookup failed");
                }
                Err(error)
            }
        }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.api.health().await
    }

    pub async fn counts(&self) -> Result<DirectoryCounts> {
        let (investors, companies) = tokio::try_join!(
            self.api.count(Role::Investor),
            self.api.count(Role::Company)
        )?;
        Ok(DirectoryCounts {
            investors,
            companies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::ScriptedApi;

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let directory = Directory::new(ScriptedApi::new());
        let result = directory.profile(Role::Company, EntityId(404)).await;
        assert!(matches!(result, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_health_and_counts() {
        let directory = Directory::new(ScriptedApi::new());
        assert!(directory.health().await.unwrap().is_healthy());
        assert_eq!(
            directory.counts().await.unwrap(),
            DirectoryCounts {
                investors: 0,
                companies: 0
            }
        );
    }
}
