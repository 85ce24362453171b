//! Bounded concurrent per-bucket document fetches.
//!
//! One search call per `(bucket, top-level key)` pair, fanned out through
//! a bounded stream so the engine's connection pool is never overwhelmed.
//! Completion order is arbitrary; callers re-sort into chronological
//! bucket order before returning.

use futures::StreamExt;

use sonar_core::traits::{SearchClient, SearchRequest};
use sonar_core::types::AnalyticDocument;

use crate::document;
use crate::service::Analytics;

/// One pending `(top-level key, histogram bucket)` fetch.
#[derive(Debug)]
pub struct BucketFetch {
    pub key: String,
    pub date: String,
    pub agg_count: u64,
    pub request: SearchRequest,
}

/// The outcome of one fetch. `docs == None` means the fetch failed and the
/// caller must fall back to the aggregation count.
#[derive(Debug)]
pub struct FetchedBucket {
    pub key: String,
    pub date: String,
    pub agg_count: u64,
    pub docs: Option<Vec<AnalyticDocument>>,
}

pub(crate) async fn fetch_all<C: SearchClient>(
    svc: &Analytics<C>,
    jobs: Vec<BucketFetch>,
    terms: &[String],
) -> Vec<FetchedBucket> {
    let concurrency = svc.config().fetch_concurrency.max(1);
    futures::stream::iter(jobs.into_iter().map(|job| fetch_one(svc, job, terms)))
        .buffer_unordered(concurrency)
        .collect()
        .await
}

async fn fetch_one<C: SearchClient>(
    svc: &Analytics<C>,
    job: BucketFetch,
    terms: &[String],
) -> FetchedBucket {
    let docs = svc.try_run(&job.request).await.map(|resp| {
        resp.hits
            .iter()
            .map(|hit| document::normalize(&hit.source, terms))
            .collect::<Vec<_>>()
    });
    FetchedBucket { key: job.key, date: job.date, agg_count: job.agg_count, docs }
}
