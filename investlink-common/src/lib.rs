//! # InvestLink Common Library
//!
//! Shared code for every InvestLink client component including:
//! - Viewer role model (investor / company) and endpoint path segments
//! - Wire types (candidates, batches, interaction lists, profiles)
//! - Configuration loading
//! - Session event bus

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod role;

pub use error::{Error, Result};
pub use models::{Candidate, EntityId, InteractionLists, InteractionStatus, SwipeBatch, Viewer};
pub use role::Role;
