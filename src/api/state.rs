//! Application state for the proxy server

use crate::config::Config;
use crate::provider::StreamingProvider;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// Upstream completion provider; `None` when the server has no API key
    pub upstream: Option<Arc<dyn StreamingProvider>>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(upstream: Option<Arc<dyn StreamingProvider>>, config: Arc<Config>) -> Self {
        Self { upstream, config }
    }
}
