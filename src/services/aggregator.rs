//! Aggregator service for summing counters and deriving performance rates

use crate::services::grouping::{group_by_domain, group_by_provider, group_by_time, time_key};
use crate::types::{
    Granularity, MetricCounters, MetricField, MetricRecord, PerformanceRates, TimeSeriesPoint,
};
use std::collections::BTreeMap;

/// Aggregator for computing outreach performance
pub struct Aggregator;

impl Aggregator {
    /// Single-pass sum of every counter
    pub fn sum_counters<'a, I>(counters: I) -> MetricCounters
    where
        I: IntoIterator<Item = &'a MetricCounters>,
    {
        let mut totals = MetricCounters::default();
        for c in counters {
            totals.add(c);
        }
        totals
    }

    /// Sum counters, then derive rates from the totals.
    ///
    /// Delivery and bounce divide by `sent`; open, click, reply,
    /// unsubscribe and spam divide by `delivered`. A zero denominator
    /// yields a rate of 0.
    pub fn aggregate_performance_rates<'a, I>(counters: I) -> PerformanceRates
    where
        I: IntoIterator<Item = &'a MetricCounters>,
    {
        let totals = Self::sum_counters(counters);

        PerformanceRates {
            delivery_rate: ratio(totals.delivered, totals.sent),
            bounce_rate: ratio(totals.bounced, totals.sent),
            open_rate: ratio(totals.opened, totals.delivered),
            click_rate: ratio(totals.clicked, totals.delivered),
            reply_rate: ratio(totals.replied, totals.delivered),
            unsubscribe_rate: ratio(totals.unsubscribed, totals.delivered),
            spam_rate: ratio(totals.spam_complaints, totals.delivered),
            totals,
        }
    }

    /// Rates across a record slice
    pub fn total(records: &[MetricRecord]) -> PerformanceRates {
        Self::aggregate_performance_rates(records.iter().map(|r| &r.counters))
    }

    pub fn rates_by_domain(records: &[MetricRecord]) -> BTreeMap<String, PerformanceRates> {
        rates_per_group(group_by_domain(records))
    }

    pub fn rates_by_provider(records: &[MetricRecord]) -> BTreeMap<String, PerformanceRates> {
        rates_per_group(group_by_provider(records))
    }

    pub fn rates_by_time(
        records: &[MetricRecord],
        granularity: Granularity,
    ) -> BTreeMap<String, PerformanceRates> {
        rates_per_group(group_by_time(records, granularity))
    }

    /// Per-bucket sum of one counter, ascending by bucket key
    pub fn time_series(
        records: &[MetricRecord],
        granularity: Granularity,
        field: MetricField,
    ) -> Vec<TimeSeriesPoint> {
        let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
        for record in records {
            let total = buckets.entry(time_key(&record.date, granularity)).or_insert(0);
            *total = total.saturating_add(record.counters.get(field));
        }

        buckets
            .into_iter()
            .map(|(key, value)| TimeSeriesPoint {
                key,
                value: value as f64,
            })
            .collect()
    }

    /// One counter as a float column, in record order
    pub fn field_values(records: &[MetricRecord], field: MetricField) -> Vec<f64> {
        records
            .iter()
            .map(|r| r.counters.get(field) as f64)
            .collect()
    }
}

fn rates_per_group(
    groups: BTreeMap<String, Vec<&MetricRecord>>,
) -> BTreeMap<String, PerformanceRates> {
    groups
        .into_iter()
        .map(|(key, records)| {
            let rates =
                Aggregator::aggregate_performance_rates(records.iter().map(|r| &r.counters));
            (key, rates)
        })
        .collect()
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}
