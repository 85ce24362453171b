//! Sector distribution view.

use chrono::Utc;
use serde::Serialize;

use sonar_core::error::Result;
use sonar_core::request::AnalyticsRequest;
use sonar_core::traits::{SearchClient, SearchRequest};
use sonar_core::types::{AnalyticDocument, CategorySet};
use sonar_query::compiler::{self, QueryScope};
use sonar_query::{aggspec, category};

use crate::service::Analytics;
use crate::{buckets, document};

#[derive(Debug, Serialize)]
pub struct SectorShare {
    pub sector: String,
    pub count: u64,
    /// Share of the total, to two decimals.
    pub percentage: f64,
    pub documents: Vec<AnalyticDocument>,
}

#[derive(Debug, Serialize)]
pub struct SectorDistributionResponse {
    pub total: u64,
    pub sectors: Vec<SectorShare>,
}

impl<C: SearchClient> Analytics<C> {
    pub async fn sector_distribution(
        &self,
        request: &AnalyticsRequest,
        categories: &CategorySet,
    ) -> Result<SectorDistributionResponse> {
        let norm = request.normalize()?;
        let matched = category::resolve(&norm.category, categories);
        let scope = QueryScope::from_request(&norm, Utc::now());
        let compiled = compiler::compile(&matched, categories, &scope);
        let terms = document::active_terms(&matched, categories);

        let search = SearchRequest::new(compiled.into_value())
            .with_aggs(aggspec::sectors(self.config().bucket_doc_limit));
        let resp = self.run(&search).await?;

        let sector_buckets = buckets::terms_buckets(&resp.aggregations, "sectors");
        let total: u64 = sector_buckets.iter().map(|b| b.doc_count).sum();
        let mut sectors: Vec<SectorShare> = sector_buckets
            .iter()
            .map(|b| SectorShare {
                sector: b.key.clone(),
                count: b.doc_count,
                percentage: if total == 0 {
                    0.0
                } else {
                    (b.doc_count as f64 / total as f64 * 10000.0).round() / 100.0
                },
                documents: b
                    .top_hits("docs")
                    .iter()
                    .map(|(_, source)| document::normalize(source, &terms))
                    .collect(),
            })
            .collect();
        sectors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sector.cmp(&b.sector)));
        Ok(SectorDistributionResponse { total, sectors })
    }
}
