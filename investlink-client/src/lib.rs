//! InvestLink swipe client
//!
//! Client-side protocol for the investor/startup matchmaking API:
//! - [`fetcher`]: bounded batches of ranked candidates, exhaustion vs. failure
//! - [`session`]: the swipe state machine (one decision in flight, cursor
//!   advances only on acknowledgment)
//! - [`ledger`]: like/dislike history and status changes
//! - [`search`] and [`directory`]: supporting read paths

pub mod api;
pub mod directory;
pub mod error;
pub mod fetcher;
pub mod ledger;
pub mod search;
pub mod session;

pub use crate::error::{ClientError, Result};

use investlink_common::config::ClientConfig;
use investlink_common::events::EventBus;
use investlink_common::Viewer;
use std::sync::Arc;

use crate::api::{HttpMatchApi, MatchApi};
use crate::directory::Directory;
use crate::ledger::InteractionLedger;
use crate::search::SearchClient;
use crate::session::SwipeSession;

/// Entry point wiring one configuration and one API client into every component
#[derive(Clone)]
pub struct InvestLink {
    config: Arc<ClientConfig>,
    api: Arc<dyn MatchApi>,
    events: EventBus,
}

impl InvestLink {
    /// Connect to the server described by `config` over HTTP
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let config = Arc::new(config);
        let api = Arc::new(HttpMatchApi::new(config.clone())?);
        Ok(Self::with_api(config, api))
    }

    /// Use a caller-supplied API implementation
    pub fn with_api(config: Arc<ClientConfig>, api: Arc<dyn MatchApi>) -> Self {
        Self {
            config,
            api,
            events: EventBus::new(256),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> Arc<dyn MatchApi> {
        self.api.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// New swipe session for `viewer`, still in `Loading`
    pub fn session(&self, viewer: Viewer) -> SwipeSession {
        SwipeSession::new(self.api.clone(), viewer, self.config.batch_size)
            .with_events(self.events.clone())
    }

    pub fn ledger(&self, viewer: Viewer) -> InteractionLedger {
        InteractionLedger::new(self.api.clone(), viewer).with_events(self.events.clone())
    }

    pub fn search(&self) -> SearchClient {
        SearchClient::new(
            self.api.clone(),
            self.config.search_limit,
            self.config.search_debounce(),
        )
    }

    pub fn directory(&self) -> Directory {
        Directory::new(self.api.clone())
    }
}
