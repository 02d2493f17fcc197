// src/state.rs

use axum::extract::FromRef;

use crate::{activity::DynActivityTracker, config::Config, store::DynStore};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub activity: DynActivityTracker,
    pub config: Config,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for DynActivityTracker {
    fn from_ref(state: &AppState) -> Self {
        state.activity.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
