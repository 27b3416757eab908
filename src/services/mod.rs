//! Services for metric aggregation, statistics and retrieval

pub mod aggregator;
pub mod config;
pub mod data_fetcher;
pub mod grouping;
pub mod loader;
pub mod statistics;
pub mod store;

pub use aggregator::Aggregator;
pub use config::MetricsConfig;
pub use data_fetcher::{DataFetcher, FetchRequest, FetchStrategy};
pub use loader::RecordLoader;
pub use store::{InMemoryMetricStore, MetricStore};
