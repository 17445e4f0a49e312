use std::sync::Arc;

use crate::auth::{CurrentSession, SessionStore};
use crate::client::{BackendClient, MetricFetcher};

#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(backend: BackendClient, sessions: SessionStore) -> Self {
        AppState { backend, sessions }
    }

    /// Fetcher bound to the session's bearer token.
    pub fn fetcher(&self, session: &CurrentSession) -> MetricFetcher {
        self.backend
            .with_credentials(Arc::new(self.sessions.credentials(&session.key)))
    }
}
