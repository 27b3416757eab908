//! Metric types for outreach analytics

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::{PenguinError, Result};

/// Date format shared by records, range bounds and day keys
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One named counter of a [`MetricCounters`] set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    Sent,
    Delivered,
    Opened,
    Clicked,
    Replied,
    Bounced,
    Unsubscribed,
    SpamComplaints,
}

impl MetricField {
    pub const ALL: [MetricField; 8] = [
        MetricField::Sent,
        MetricField::Delivered,
        MetricField::Opened,
        MetricField::Clicked,
        MetricField::Replied,
        MetricField::Bounced,
        MetricField::Unsubscribed,
        MetricField::SpamComplaints,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Sent => "sent",
            MetricField::Delivered => "delivered",
            MetricField::Opened => "opened",
            MetricField::Clicked => "clicked",
            MetricField::Replied => "replied",
            MetricField::Bounced => "bounced",
            MetricField::Unsubscribed => "unsubscribed",
            MetricField::SpamComplaints => "spam-complaints",
        }
    }
}

/// Counters attached to a single observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricCounters {
    pub sent: u64,
    pub delivered: u64,
    #[serde(alias = "opened_tracked", alias = "openedTracked")]
    pub opened: u64,
    #[serde(alias = "clicked_tracked", alias = "clickedTracked")]
    pub clicked: u64,
    pub replied: u64,
    pub bounced: u64,
    pub unsubscribed: u64,
    #[serde(alias = "spam_complaints")]
    pub spam_complaints: u64,
}

impl MetricCounters {
    pub fn get(&self, field: MetricField) -> u64 {
        match field {
            MetricField::Sent => self.sent,
            MetricField::Delivered => self.delivered,
            MetricField::Opened => self.opened,
            MetricField::Clicked => self.clicked,
            MetricField::Replied => self.replied,
            MetricField::Bounced => self.bounced,
            MetricField::Unsubscribed => self.unsubscribed,
            MetricField::SpamComplaints => self.spam_complaints,
        }
    }

    pub fn add(&mut self, other: &MetricCounters) {
        self.sent = self.sent.saturating_add(other.sent);
        self.delivered = self.delivered.saturating_add(other.delivered);
        self.opened = self.opened.saturating_add(other.opened);
        self.clicked = self.clicked.saturating_add(other.clicked);
        self.replied = self.replied.saturating_add(other.replied);
        self.bounced = self.bounced.saturating_add(other.bounced);
        self.unsubscribed = self.unsubscribed.saturating_add(other.unsubscribed);
        self.spam_complaints = self.spam_complaints.saturating_add(other.spam_complaints);
    }
}

/// A dated, keyed observation for one mailbox or domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub company_id: String,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub mailbox_id: Option<String>,
    /// Mailbox provider (e.g., "gmail", "outlook")
    #[serde(default)]
    pub provider: Option<String>,
    /// ISO `YYYY-MM-DD`, kept as fetched
    pub date: String,
    #[serde(flatten)]
    pub counters: MetricCounters,
}

impl MetricRecord {
    /// Identifier used by the data fetcher for the given dimension
    pub fn entity_id(&self, dimension: FetchDimension) -> Option<&str> {
        match dimension {
            FetchDimension::Mailbox => self.mailbox_id.as_deref(),
            FetchDimension::Domain => self.domain_id.as_deref(),
        }
    }

    /// Parsed calendar date, `None` if the stored string is not ISO
    pub fn naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }
}

/// Numeric summary of a list of values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
    pub count: usize,
    pub std_dev: f64,
}

/// IQR outlier detection result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OutlierReport {
    pub outliers: Vec<f64>,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub q1: f64,
    pub q3: f64,
}

/// Summed counters and the ratios derived from them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRates {
    pub totals: MetricCounters,
    pub delivery_rate: f64,
    pub open_rate: f64,
    pub click_rate: f64,
    pub reply_rate: f64,
    pub bounce_rate: f64,
    pub unsubscribe_rate: f64,
    pub spam_rate: f64,
}

/// One point of a bucketed time series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub key: String,
    pub value: f64,
}

/// Time bucket size for grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

/// Record identifier the data fetcher filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetchDimension {
    #[default]
    Mailbox,
    Domain,
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PenguinError::InvalidDateRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds as `YYYY-MM-DD`
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_bound("start", start)?;
        let end = parse_bound("end", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Records with an unparseable date are never inside a range
    pub fn contains_record(&self, record: &MetricRecord) -> bool {
        record.naive_date().is_some_and(|d| self.contains(d))
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

fn parse_bound(name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        PenguinError::InvalidDateRange(format!("{} '{}' is not a YYYY-MM-DD date", name, value))
    })
}

/// Monday of the week used for week bucketing.
///
/// Counts days from Sunday = 0 and subtracts `day - 1`, so a Sunday
/// rolls forward to the next Monday.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let day_of_week = date.weekday().num_days_from_sunday() as i64;
    date - chrono::Duration::days(day_of_week - 1)
}
