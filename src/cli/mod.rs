mod render;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::services::statistics::{
    calculate_correlation, calculate_moving_average, calculate_percentiles, calculate_statistics,
    detect_outliers,
};
use crate::services::{
    Aggregator, DataFetcher, FetchRequest, InMemoryMetricStore, MetricsConfig, RecordLoader,
};
use crate::types::{
    DateRange, FetchDimension, Granularity, MetricField, MetricRecord, OutlierReport,
    PerformanceRates, StatisticsSummary, TimeSeriesPoint,
};

/// Outreach analytics over exported mailbox metrics
#[derive(Parser)]
#[command(name = "penguin-metrics")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary statistics, percentiles and outliers of one counter
    Stats {
        /// Metric file or glob (JSON Lines or JSON array)
        #[arg(long, short)]
        input: String,
        #[arg(long, value_enum)]
        field: MetricField,
        /// Percentile to report (repeatable, defaults from config)
        #[arg(long = "percentile")]
        percentiles: Vec<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delivery, engagement and complaint rates
    Rates {
        #[arg(long, short)]
        input: String,
        #[arg(long, value_enum, default_value_t = RateGrouping::Total)]
        by: RateGrouping,
        /// Bucket size for `--by time`
        #[arg(long, value_enum)]
        granularity: Option<Granularity>,
        #[arg(long)]
        json: bool,
    },

    /// Bucketed time series of one counter with its moving average
    Trend {
        #[arg(long, short)]
        input: String,
        #[arg(long, value_enum)]
        field: MetricField,
        #[arg(long, value_enum)]
        granularity: Option<Granularity>,
        /// Moving average window
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        json: bool,
    },

    /// Pearson correlation between two counters
    Correlate {
        #[arg(long, short)]
        input: String,
        #[arg(long, value_enum)]
        x: MetricField,
        #[arg(long, value_enum)]
        y: MetricField,
        #[arg(long)]
        json: bool,
    },

    /// Fetch records for a company through the index-aware fetcher
    Fetch {
        #[arg(long, short)]
        input: String,
        #[arg(long)]
        company: String,
        #[arg(long, value_enum, default_value_t = FetchDimension::Mailbox)]
        dimension: FetchDimension,
        /// Comma-separated entity ids
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<String>>,
        /// Range start (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Range end (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RateGrouping {
    Total,
    Domain,
    Provider,
    Time,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    field: MetricField,
    summary: StatisticsSummary,
    percentiles: BTreeMap<u32, f64>,
    outliers: OutlierReport,
}

#[derive(Debug, Serialize)]
struct TrendReport {
    field: MetricField,
    granularity: Granularity,
    window: usize,
    series: Vec<TimeSeriesPoint>,
    moving_average: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct CorrelationReport {
    x: MetricField,
    y: MetricField,
    samples: usize,
    correlation: f64,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = MetricsConfig::load().context("failed to load config")?;

        match self.command {
            Commands::Stats {
                input,
                field,
                percentiles,
                json,
            } => {
                let records = load(&input)?;
                let percentiles = if percentiles.is_empty() {
                    config.percentiles.clone()
                } else {
                    percentiles
                };
                let report = build_stats_report(&records, field, &percentiles);
                if json {
                    print_json(&report)?;
                } else {
                    print!("{}", render::stats(&report));
                }
            }
            Commands::Rates {
                input,
                by,
                granularity,
                json,
            } => {
                let records = load(&input)?;
                let granularity = granularity.unwrap_or(config.default_granularity);
                let rates = build_rates(&records, by, granularity);
                if json {
                    print_json(&rates)?;
                } else {
                    print!("{}", render::rates(&rates));
                }
            }
            Commands::Trend {
                input,
                field,
                granularity,
                window,
                json,
            } => {
                let records = load(&input)?;
                let report = build_trend_report(
                    &records,
                    field,
                    granularity.unwrap_or(config.default_granularity),
                    window.unwrap_or(config.moving_average_window),
                );
                if json {
                    print_json(&report)?;
                } else {
                    print!("{}", render::trend(&report));
                }
            }
            Commands::Correlate { input, x, y, json } => {
                let records = load(&input)?;
                let report = build_correlation_report(&records, x, y);
                if json {
                    print_json(&report)?;
                } else {
                    print!("{}", render::correlation(&report));
                }
            }
            Commands::Fetch {
                input,
                company,
                dimension,
                ids,
                from,
                to,
                json,
            } => {
                let mut request = FetchRequest::new(company, dimension);
                if let Some(ids) = ids {
                    request = request.with_ids(ids);
                }
                if let (Some(from), Some(to)) = (from, to) {
                    request = request.with_date_range(DateRange::parse(&from, &to)?);
                }

                let records = load(&input)?;
                let fetcher = DataFetcher::new(InMemoryMetricStore::new(records))
                    .with_threshold(config.point_query_threshold);

                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                    .context("failed to start async runtime")?;
                let fetched = runtime.block_on(fetcher.fetch(&request))?;

                if json {
                    print_json(&fetched)?;
                } else {
                    print!("{}", render::records(&fetched, dimension));
                }
            }
        }

        Ok(())
    }
}

fn load(input: &str) -> anyhow::Result<Vec<MetricRecord>> {
    RecordLoader::load(input).with_context(|| format!("failed to load metrics from {}", input))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_stats_report(
    records: &[MetricRecord],
    field: MetricField,
    percentiles: &[u32],
) -> StatsReport {
    let values = Aggregator::field_values(records, field);
    StatsReport {
        field,
        summary: calculate_statistics(&values),
        percentiles: calculate_percentiles(&values, percentiles),
        outliers: detect_outliers(&values),
    }
}

fn build_rates(
    records: &[MetricRecord],
    by: RateGrouping,
    granularity: Granularity,
) -> BTreeMap<String, PerformanceRates> {
    match by {
        RateGrouping::Total => BTreeMap::from([("total".to_string(), Aggregator::total(records))]),
        RateGrouping::Domain => Aggregator::rates_by_domain(records),
        RateGrouping::Provider => Aggregator::rates_by_provider(records),
        RateGrouping::Time => Aggregator::rates_by_time(records, granularity),
    }
}

fn build_trend_report(
    records: &[MetricRecord],
    field: MetricField,
    granularity: Granularity,
    window: usize,
) -> TrendReport {
    let series = Aggregator::time_series(records, granularity, field);
    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    TrendReport {
        field,
        granularity,
        window,
        moving_average: calculate_moving_average(&values, window),
        series,
    }
}

fn build_correlation_report(
    records: &[MetricRecord],
    x: MetricField,
    y: MetricField,
) -> CorrelationReport {
    let xs = Aggregator::field_values(records, x);
    let ys = Aggregator::field_values(records, y);
    CorrelationReport {
        x,
        y,
        samples: xs.len(),
        correlation: calculate_correlation(&xs, &ys),
    }
}
