//! Keyed metric store access patterns

use async_trait::async_trait;

use crate::types::{DateRange, FetchDimension, MetricRecord, Result};

/// A keyed, indexed metric store.
///
/// Two access patterns are exposed: a point query on the composite
/// `(company, entity)` key and a range query over a company partition,
/// optionally narrowed by date.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// All records for one entity of a company
    async fn point_query(
        &self,
        company_id: &str,
        dimension: FetchDimension,
        entity_id: &str,
    ) -> Result<Vec<MetricRecord>>;

    /// All records of a company, inside `date_range` when given
    async fn range_query(
        &self,
        company_id: &str,
        date_range: Option<&DateRange>,
    ) -> Result<Vec<MetricRecord>>;
}

/// Store backed by an in-memory record list
#[derive(Debug, Default, Clone)]
pub struct InMemoryMetricStore {
    records: Vec<MetricRecord>,
}

impl InMemoryMetricStore {
    pub fn new(records: Vec<MetricRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn point_query(
        &self,
        company_id: &str,
        dimension: FetchDimension,
        entity_id: &str,
    ) -> Result<Vec<MetricRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.company_id == company_id && r.entity_id(dimension) == Some(entity_id))
            .cloned()
            .collect())
    }

    async fn range_query(
        &self,
        company_id: &str,
        date_range: Option<&DateRange>,
    ) -> Result<Vec<MetricRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.company_id == company_id)
            .filter(|r| date_range.map_or(true, |range| range.contains_record(r)))
            .cloned()
            .collect())
    }
}
