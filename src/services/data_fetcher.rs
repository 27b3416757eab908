//! Index-aware metric fetching
//!
//! Small id sets are served with one point query per id, issued
//! concurrently. Larger sets (or no id filter at all) use a single range
//! query over the company partition and filter in memory. Both paths
//! return records sorted by `(date, identifier)`.

use std::collections::HashSet;
use std::sync::OnceLock;

use futures::future::try_join_all;
use regex::Regex;
use tracing::debug;

use crate::services::store::MetricStore;
use crate::types::{DateRange, FetchDimension, MetricRecord, PenguinError, Result};

/// Id sets at or below this size use point queries
pub const DEFAULT_POINT_QUERY_THRESHOLD: usize = 5;

const MAX_COMPANY_ID_LEN: usize = 128;

/// Retrieval strategy chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// One point query per requested id
    PointLookups(usize),
    /// One range query plus in-memory filtering
    RangeScan,
}

/// What to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub company_id: String,
    pub dimension: FetchDimension,
    /// `None` fetches every entity of the company
    pub ids: Option<Vec<String>>,
    pub date_range: Option<DateRange>,
}

impl FetchRequest {
    pub fn new(company_id: impl Into<String>, dimension: FetchDimension) -> Self {
        Self {
            company_id: company_id.into(),
            dimension,
            ids: None,
            date_range: None,
        }
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }
}

/// Fetcher choosing between point lookups and a range scan
pub struct DataFetcher<S> {
    store: S,
    point_query_threshold: usize,
}

impl<S: MetricStore> DataFetcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            point_query_threshold: DEFAULT_POINT_QUERY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, point_query_threshold: usize) -> Self {
        self.point_query_threshold = point_query_threshold;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Strategy for a de-duplicated id set
    pub fn plan(&self, ids: Option<&[String]>) -> FetchStrategy {
        match ids {
            Some(ids) if ids.len() <= self.point_query_threshold => {
                FetchStrategy::PointLookups(ids.len())
            }
            _ => FetchStrategy::RangeScan,
        }
    }

    /// Validate, pick a strategy, query, filter and sort.
    ///
    /// Any failing point query fails the whole fetch.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<MetricRecord>> {
        validate_company_id(&request.company_id)?;
        if let Some(range) = &request.date_range {
            validate_date_range(range)?;
        }

        let ids = request.ids.as_deref().map(dedup_ids);
        let strategy = self.plan(ids.as_deref());
        debug!(
            company_id = %request.company_id,
            dimension = ?request.dimension,
            ?strategy,
            "fetching metrics"
        );

        let mut records: Vec<MetricRecord> = match (strategy, ids) {
            (FetchStrategy::PointLookups(_), Some(ids)) => {
                let queries = ids.iter().map(|id| {
                    self.store
                        .point_query(&request.company_id, request.dimension, id)
                });
                let batches = try_join_all(queries).await?;
                batches
                    .into_iter()
                    .flatten()
                    .filter(|r| in_range(r, request.date_range.as_ref()))
                    .collect()
            }
            (_, ids) => {
                let wanted: Option<HashSet<&str>> = ids
                    .as_ref()
                    .map(|ids| ids.iter().map(String::as_str).collect());
                self.store
                    .range_query(&request.company_id, request.date_range.as_ref())
                    .await?
                    .into_iter()
                    .filter(|r| match &wanted {
                        Some(set) => r
                            .entity_id(request.dimension)
                            .is_some_and(|id| set.contains(id)),
                        None => true,
                    })
                    .filter(|r| in_range(r, request.date_range.as_ref()))
                    .collect()
            }
        };

        sort_records(&mut records, request.dimension);
        debug!(count = records.len(), "fetched metrics");
        Ok(records)
    }
}

/// Sort by `(date, identifier)` ascending
pub fn sort_records(records: &mut [MetricRecord], dimension: FetchDimension) {
    records.sort_by(|a, b| {
        (a.date.as_str(), a.entity_id(dimension)).cmp(&(b.date.as_str(), b.entity_id(dimension)))
    });
}

pub fn validate_company_id(company_id: &str) -> Result<()> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

    if company_id.is_empty() {
        return Err(PenguinError::InvalidCompanyId("company id is empty".into()));
    }
    if company_id.len() > MAX_COMPANY_ID_LEN {
        return Err(PenguinError::InvalidCompanyId(format!(
            "company id exceeds {} characters",
            MAX_COMPANY_ID_LEN
        )));
    }
    if !re.is_match(company_id) {
        return Err(PenguinError::InvalidCompanyId(format!(
            "'{}' contains characters outside [A-Za-z0-9_-]",
            company_id
        )));
    }
    Ok(())
}

fn validate_date_range(range: &DateRange) -> Result<()> {
    if range.start() > range.end() {
        return Err(PenguinError::InvalidDateRange(format!(
            "start {} is after end {}",
            range.start(),
            range.end()
        )));
    }
    Ok(())
}

fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn in_range(record: &MetricRecord, range: Option<&DateRange>) -> bool {
    range.map_or(true, |r| r.contains_record(record))
}
