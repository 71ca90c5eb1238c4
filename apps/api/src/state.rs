use crate::screening::conversation::Screener;
use crate::screening::registry::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub screener: Screener,
    /// Live conversations. Each session is isolated behind its own lock.
    pub sessions: SessionRegistry,
}
