use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::Oracle;
use crate::source::ReviewSource;
use crate::store::ReviewStore;
use crate::themes::references::ReferenceStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReviewStore>,
    /// `None` when no oracle credential is configured.
    pub oracle: Option<Arc<dyn Oracle>>,
    /// `None` when no review feed is configured; process then triages stored reviews only.
    pub source: Option<Arc<dyn ReviewSource>>,
    pub references: Arc<dyn ReferenceStore>,
    pub config: Config,
}
