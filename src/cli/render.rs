//! Plain-text rendering of CLI reports

use std::collections::BTreeMap;
use std::fmt::Write;

use super::{CorrelationReport, StatsReport, TrendReport};
use crate::types::{FetchDimension, MetricRecord, PerformanceRates};

fn pct(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

pub(super) fn stats(report: &StatsReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({} records)", report.field.as_str(), s.count);
    let _ = writeln!(out, "  sum      {:>12.2}", s.sum);
    let _ = writeln!(out, "  min      {:>12.2}", s.min);
    let _ = writeln!(out, "  max      {:>12.2}", s.max);
    let _ = writeln!(out, "  avg      {:>12.2}", s.avg);
    let _ = writeln!(out, "  std dev  {:>12.2}", s.std_dev);
    for (p, value) in &report.percentiles {
        let _ = writeln!(out, "  p{:<7} {:>12.2}", p, value);
    }

    let o = &report.outliers;
    let _ = writeln!(
        out,
        "  outliers {} (bounds {:.2}..{:.2}, q1 {:.2}, q3 {:.2})",
        o.outliers.len(),
        o.lower_bound,
        o.upper_bound,
        o.q1,
        o.q3
    );
    for v in &o.outliers {
        let _ = writeln!(out, "    {:.2}", v);
    }
    out
}

pub(super) fn rates(rates: &BTreeMap<String, PerformanceRates>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "key", "sent", "delivery", "open", "click", "reply", "bounce", "unsub", "spam"
    );
    for (key, r) in rates {
        let _ = writeln!(
            out,
            "{:<24} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            key,
            r.totals.sent,
            pct(r.delivery_rate),
            pct(r.open_rate),
            pct(r.click_rate),
            pct(r.reply_rate),
            pct(r.bounce_rate),
            pct(r.unsubscribe_rate),
            pct(r.spam_rate)
        );
    }
    out
}

pub(super) fn trend(report: &TrendReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} by {:?} (moving average window {})",
        report.field.as_str(),
        report.granularity,
        report.window
    );

    // The moving average is aligned to the end of its window
    let offset = report.series.len().saturating_sub(report.moving_average.len());
    for (i, point) in report.series.iter().enumerate() {
        let avg = i
            .checked_sub(offset)
            .and_then(|j| report.moving_average.get(j))
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".into());
        let _ = writeln!(out, "  {:<12} {:>10.0} {:>12}", point.key, point.value, avg);
    }
    out
}

pub(super) fn correlation(report: &CorrelationReport) -> String {
    format!(
        "corr({}, {}) = {:.4} over {} records\n",
        report.x.as_str(),
        report.y.as_str(),
        report.correlation,
        report.samples
    )
}

pub(super) fn records(records: &[MetricRecord], dimension: FetchDimension) -> String {
    let mut out = String::new();
    for r in records {
        let _ = writeln!(
            out,
            "{} {:<16} {:<20} sent={} delivered={} opened={} replied={} bounced={}",
            r.date,
            r.entity_id(dimension).unwrap_or("-"),
            r.domain,
            r.counters.sent,
            r.counters.delivered,
            r.counters.opened,
            r.counters.replied,
            r.counters.bounced
        );
    }
    let _ = writeln!(out, "{} records", records.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Granularity, MetricField, TimeSeriesPoint};

    #[test]
    fn test_pct_formatting() {
        assert_eq!(pct(0.5), "50.00%");
        assert_eq!(pct(0.0), "0.00%");
    }

    #[test]
    fn test_trend_aligns_moving_average_to_window_end() {
        let report = TrendReport {
            field: MetricField::Sent,
            granularity: Granularity::Day,
            window: 2,
            series: vec![
                TimeSeriesPoint {
                    key: "2024-01-01".into(),
                    value: 2.0,
                },
                TimeSeriesPoint {
                    key: "2024-01-02".into(),
                    value: 4.0,
                },
            ],
            moving_average: vec![3.0],
        };

        let text = trend(&report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_end().ends_with('-'));
        assert!(lines[2].trim_end().ends_with("3.00"));
    }

    #[test]
    fn test_trend_short_series_passthrough() {
        // Shorter than the window: moving average equals the series
        let report = TrendReport {
            field: MetricField::Sent,
            granularity: Granularity::Week,
            window: 7,
            series: vec![TimeSeriesPoint {
                key: "2024-01-01".into(),
                value: 5.0,
            }],
            moving_average: vec![5.0],
        };

        let text = trend(&report);
        assert!(text.lines().nth(1).unwrap().trim_end().ends_with("5.00"));
    }

    #[test]
    fn test_records_footer_count() {
        assert_eq!(records(&[], FetchDimension::Mailbox), "0 records\n");
    }
}
