//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use litmaster_core::ports::{StoreService, TextAnalysisService, TutorChatService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// All mutable data lives behind the store port; the state itself only holds
/// the wired-up ports and configuration.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreService>,
    pub config: Arc<Config>,
    pub analyzer: Arc<dyn TextAnalysisService>,
    pub tutor: Arc<dyn TutorChatService>,
}
