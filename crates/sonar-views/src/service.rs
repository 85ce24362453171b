//! Request orchestration shared by the five analytic views.
//!
//! All work is request-scoped and stateless between requests. The service
//! owns the engine client and the tunables; each view module adds its
//! entry point as an `impl` block on [`Analytics`].

use std::time::Duration;

use sonar_core::config::AnalyticsConfig;
use sonar_core::error::{Error, Result};
use sonar_core::traits::{SearchClient, SearchRequest, SearchResponse};

pub struct Analytics<C> {
    client: C,
    cfg: AnalyticsConfig,
}

impl<C: SearchClient> Analytics<C> {
    pub fn new(client: C, cfg: AnalyticsConfig) -> Self {
        Self { client, cfg }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.cfg
    }

    /// Primary search call. Failures and timeouts surface as upstream
    /// errors with context logged here, detail stripped from the response.
    pub(crate) async fn run(&self, req: &SearchRequest) -> Result<SearchResponse> {
        let limit = Duration::from_secs(self.cfg.search_timeout_secs);
        match tokio::time::timeout(limit, self.client.search(&self.cfg.index, req)).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(err)) => {
                tracing::error!(error = %err, "search call failed");
                Err(Error::upstream(err))
            }
            Err(_) => {
                tracing::error!(timeout_secs = self.cfg.search_timeout_secs, "search call timed out");
                Err(Error::upstream(anyhow::anyhow!("search timed out")))
            }
        }
    }

    /// Degradable variant for per-bucket and per-category fetches: a
    /// failure is logged and returns `None` so only that entry falls back.
    pub(crate) async fn try_run(&self, req: &SearchRequest) -> Option<SearchResponse> {
        match self.run(req).await {
            Ok(resp) => Some(resp),
            Err(err) => {
                tracing::warn!(error = %err, "degrading one entry after fetch failure");
                None
            }
        }
    }
}
