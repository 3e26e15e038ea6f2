use std::sync::Arc;

use crate::services::analysis_service::AnalysisService;
use crate::services::rate_limiter::ClientRateLimiter;

#[derive(Clone)]
pub struct AppState {
    /// `None` when the verdict generator could not be built (no API key).
    pub analysis: Option<Arc<AnalysisService>>,
    pub rate_limiter: Arc<ClientRateLimiter>,
}
