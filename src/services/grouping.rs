//! Group-by helpers for metric records
//!
//! Groups are keyed maps ordered by key. Records inside a group keep the
//! order in which they were first seen.

use crate::types::{week_start, Granularity, MetricRecord, DATE_FORMAT};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Key used when a grouping dimension is missing on a record
pub const UNKNOWN_KEY: &str = "unknown";

/// Generic single-key grouping
pub fn group_by<'a, T, K, F>(items: &'a [T], mut key_fn: F) -> BTreeMap<K, Vec<&'a T>>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<&'a T>> = BTreeMap::new();
    for item in items {
        groups.entry(key_fn(item)).or_default().push(item);
    }
    groups
}

pub fn group_by_domain(records: &[MetricRecord]) -> BTreeMap<String, Vec<&MetricRecord>> {
    group_by(records, |r| r.domain.clone())
}

pub fn group_by_domain_id(records: &[MetricRecord]) -> BTreeMap<String, Vec<&MetricRecord>> {
    group_by(records, |r| {
        r.domain_id.as_deref().unwrap_or(UNKNOWN_KEY).to_string()
    })
}

/// Bucket key for a date string.
///
/// - `Day` returns the input unchanged
/// - `Week` returns the bucket Monday as `YYYY-MM-DD`
/// - `Month` returns `YYYY-MM`
///
/// Dates that don't parse as `YYYY-MM-DD` pass through unchanged.
pub fn time_key(date: &str, granularity: Granularity) -> String {
    if granularity == Granularity::Day {
        return date.to_string();
    }

    let Ok(parsed) = NaiveDate::parse_from_str(date, DATE_FORMAT) else {
        return date.to_string();
    };

    match granularity {
        Granularity::Day => date.to_string(),
        Granularity::Week => week_start(parsed).format(DATE_FORMAT).to_string(),
        Granularity::Month => parsed.format("%Y-%m").to_string(),
    }
}

pub fn group_by_time(
    records: &[MetricRecord],
    granularity: Granularity,
) -> BTreeMap<String, Vec<&MetricRecord>> {
    group_by(records, |r| time_key(&r.date, granularity))
}

/// Composite `domain:timeKey` grouping
pub fn group_by_domain_and_time(
    records: &[MetricRecord],
    granularity: Granularity,
) -> BTreeMap<String, Vec<&MetricRecord>> {
    group_by(records, |r| {
        format!("{}:{}", r.domain, time_key(&r.date, granularity))
    })
}

pub fn group_by_provider(records: &[MetricRecord]) -> BTreeMap<String, Vec<&MetricRecord>> {
    group_by(records, |r| match r.provider.as_deref() {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => UNKNOWN_KEY.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricCounters;

    fn make_record(domain: &str, date: &str, provider: Option<&str>, sent: u64) -> MetricRecord {
        MetricRecord {
            company_id: "acme".into(),
            domain_id: None,
            domain: domain.into(),
            mailbox_id: None,
            provider: provider.map(String::from),
            date: date.into(),
            counters: MetricCounters {
                sent,
                ..Default::default()
            },
        }
    }

    // ========== group_by ==========

    #[test]
    fn test_group_by_empty() {
        let groups = group_by_domain(&[]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_group_by_domain_preserves_insertion_order() {
        let records = vec![
            make_record("a.io", "2024-01-01", None, 1),
            make_record("b.io", "2024-01-01", None, 2),
            make_record("a.io", "2024-01-02", None, 3),
            make_record("a.io", "2024-01-01", None, 4),
        ];

        let groups = group_by_domain(&records);

        assert_eq!(groups.len(), 2);
        let sent: Vec<u64> = groups["a.io"].iter().map(|r| r.counters.sent).collect();
        assert_eq!(sent, vec![1, 3, 4]);
        assert_eq!(groups["b.io"].len(), 1);
    }

    #[test]
    fn test_group_by_domain_id_missing_is_unknown() {
        let mut with_id = make_record("a.io", "2024-01-01", None, 1);
        with_id.domain_id = Some("d1".into());
        let records = vec![with_id, make_record("b.io", "2024-01-01", None, 2)];

        let groups = group_by_domain_id(&records);

        assert_eq!(groups["d1"].len(), 1);
        assert_eq!(groups[UNKNOWN_KEY].len(), 1);
    }

    #[test]
    fn test_group_by_generic_numbers() {
        let values = [1, 2, 3, 4, 5, 6];
        let groups = group_by(&values, |v| v % 2 == 0);
        assert_eq!(groups[&true], vec![&2, &4, &6]);
        assert_eq!(groups[&false], vec![&1, &3, &5]);
    }

    // ========== time_key ==========

    #[test]
    fn test_time_key_day_passthrough() {
        assert_eq!(time_key("2024-03-06", Granularity::Day), "2024-03-06");
        // Not reformatted, even when it isn't ISO
        assert_eq!(time_key("03/06/2024", Granularity::Day), "03/06/2024");
    }

    #[test]
    fn test_time_key_week_monday() {
        assert_eq!(time_key("2024-03-06", Granularity::Week), "2024-03-04");
        assert_eq!(time_key("2024-03-04", Granularity::Week), "2024-03-04");
    }

    #[test]
    fn test_time_key_week_sunday_next_monday() {
        assert_eq!(time_key("2024-03-10", Granularity::Week), "2024-03-11");
    }

    #[test]
    fn test_time_key_month_zero_padded() {
        assert_eq!(time_key("2024-03-06", Granularity::Month), "2024-03");
        assert_eq!(time_key("2024-11-30", Granularity::Month), "2024-11");
    }

    #[test]
    fn test_time_key_unparseable_passthrough() {
        assert_eq!(time_key("not-a-date", Granularity::Week), "not-a-date");
        assert_eq!(time_key("", Granularity::Month), "");
    }

    // ========== time / composite / provider ==========

    #[test]
    fn test_group_by_time_week() {
        let records = vec![
            make_record("a.io", "2024-03-04", None, 1),
            make_record("a.io", "2024-03-08", None, 2),
            make_record("a.io", "2024-03-12", None, 3),
        ];

        let groups = group_by_time(&records, Granularity::Week);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["2024-03-04"].len(), 2);
        assert_eq!(groups["2024-03-11"].len(), 1);
    }

    #[test]
    fn test_group_by_domain_and_time_month() {
        let records = vec![
            make_record("a.io", "2024-03-04", None, 1),
            make_record("a.io", "2024-04-08", None, 2),
            make_record("b.io", "2024-03-12", None, 3),
            make_record("a.io", "2024-03-30", None, 4),
        ];

        let groups = group_by_domain_and_time(&records, Granularity::Month);

        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, vec!["a.io:2024-03", "a.io:2024-04", "b.io:2024-03"]);
        assert_eq!(groups["a.io:2024-03"].len(), 2);
    }

    #[test]
    fn test_group_by_provider_defaults_unknown() {
        let records = vec![
            make_record("a.io", "2024-03-04", Some("gmail"), 1),
            make_record("a.io", "2024-03-04", None, 2),
            make_record("a.io", "2024-03-04", Some(""), 3),
            make_record("a.io", "2024-03-04", Some("outlook"), 4),
        ];

        let groups = group_by_provider(&records);

        assert_eq!(groups.len(), 3);
        let unknown: Vec<u64> = groups[UNKNOWN_KEY].iter().map(|r| r.counters.sent).collect();
        assert_eq!(unknown, vec![2, 3]);
        assert_eq!(groups["gmail"].len(), 1);
    }
}
