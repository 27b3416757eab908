//! Metric record loading from JSON Lines or JSON array files

use crate::types::{MetricCounters, MetricRecord, PenguinError, Result};
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One exported metric row (camelCase, as written by the dashboard backend)
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordLine<'a> {
    company_id: &'a str,
    domain_id: Option<&'a str>,
    #[serde(default)]
    domain: Option<&'a str>,
    mailbox_id: Option<&'a str>,
    provider: Option<&'a str>,
    date: &'a str,
    #[serde(default)]
    sent: u64,
    #[serde(default)]
    delivered: u64,
    #[serde(default, alias = "opened_tracked", alias = "openedTracked")]
    opened: u64,
    #[serde(default, alias = "clicked_tracked", alias = "clickedTracked")]
    clicked: u64,
    #[serde(default)]
    replied: u64,
    #[serde(default)]
    bounced: u64,
    #[serde(default)]
    unsubscribed: u64,
    #[serde(default, alias = "spam_complaints")]
    spam_complaints: u64,
}

impl From<RecordLine<'_>> for MetricRecord {
    fn from(line: RecordLine<'_>) -> Self {
        MetricRecord {
            company_id: line.company_id.to_string(),
            domain_id: line.domain_id.map(String::from),
            domain: line.domain.unwrap_or_default().to_string(),
            mailbox_id: line.mailbox_id.map(String::from),
            provider: line.provider.map(String::from),
            date: line.date.to_string(),
            counters: MetricCounters {
                sent: line.sent,
                delivered: line.delivered,
                opened: line.opened,
                clicked: line.clicked,
                replied: line.replied,
                bounced: line.bounced,
                unsubscribed: line.unsubscribed,
                spam_complaints: line.spam_complaints,
            },
        }
    }
}

/// Loader for exported metric files
pub struct RecordLoader;

impl RecordLoader {
    /// Load every file matching `pattern` (a path or a glob), in path order.
    ///
    /// A literal path that doesn't exist is an error; a glob with no
    /// matches yields no records.
    pub fn load(pattern: &str) -> Result<Vec<MetricRecord>> {
        let files = Self::collect_files(pattern)?;
        debug!(files = files.len(), pattern, "loading metric files");

        let per_file: Vec<Vec<MetricRecord>> = files
            .par_iter()
            .map(|f| Self::parse_file(f))
            .collect::<Result<_>>()?;

        Ok(per_file.into_iter().flatten().collect())
    }

    /// Parse a single file, either JSON Lines or one JSON array
    pub fn parse_file(path: &Path) -> Result<Vec<MetricRecord>> {
        let bytes = fs::read(path)?;

        let is_array = bytes
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'[');

        if is_array {
            Self::parse_array(path, bytes)
        } else {
            Ok(Self::parse_lines(path, &bytes))
        }
    }

    fn parse_array(path: &Path, mut bytes: Vec<u8>) -> Result<Vec<MetricRecord>> {
        let lines: Vec<RecordLine> = simd_json::from_slice(&mut bytes)
            .map_err(|e| PenguinError::Parse(format!("{}: {}", path.display(), e)))?;
        Ok(lines.into_iter().map(MetricRecord::from).collect())
    }

    fn parse_lines(path: &Path, bytes: &[u8]) -> Vec<MetricRecord> {
        let mut records = Vec::new();

        for (index, line) in bytes.split(|&b| b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            // simd-json parses in place
            let mut line_bytes = line.to_vec();
            match Self::parse_line(&mut line_bytes) {
                Some(record) => records.push(record),
                None => warn!(
                    path = %path.display(),
                    line = index + 1,
                    "skipping malformed metric record"
                ),
            }
        }

        records
    }

    fn parse_line(line: &mut [u8]) -> Option<MetricRecord> {
        let data: RecordLine = simd_json::from_slice(line).ok()?;
        Some(data.into())
    }

    fn collect_files(pattern: &str) -> Result<Vec<PathBuf>> {
        let has_wildcard = pattern.contains(['*', '?', '[']);
        if !has_wildcard {
            let path = PathBuf::from(pattern);
            if !path.is_file() {
                return Err(PenguinError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no such file: {}", pattern),
                )));
            }
            return Ok(vec![path]);
        }

        let mut files: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|e| PenguinError::Config(format!("invalid input pattern: {}", e)))?
            .filter_map(|e| e.ok())
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        if files.is_empty() {
            warn!(pattern, "input pattern matched no files");
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_jsonl_fixture() {
        let records = RecordLoader::parse_file(&fixture_path("metrics-sample.jsonl")).unwrap();

        assert_eq!(records.len(), 6);
        let first = &records[0];
        assert_eq!(first.company_id, "acme");
        assert_eq!(first.domain, "acme-outreach.io");
        assert_eq!(first.mailbox_id.as_deref(), Some("mb-alice"));
        assert_eq!(first.provider.as_deref(), Some("gmail"));
        assert_eq!(first.date, "2024-03-04");
        assert_eq!(first.counters.sent, 120);
        assert_eq!(first.counters.opened, 60);
    }

    #[test]
    fn test_parse_json_array_fixture() {
        let records = RecordLoader::parse_file(&fixture_path("metrics-array.json")).unwrap();

        assert_eq!(records.len(), 2);
        // opened_tracked / clicked_tracked aliases
        assert_eq!(records[0].counters.opened, 25);
        assert_eq!(records[0].counters.clicked, 5);
        assert_eq!(records[1].counters.spam_complaints, 1);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "mixed.jsonl",
            concat!(
                r#"{"companyId":"acme","domain":"a.io","date":"2024-01-01","sent":5}"#,
                "\n",
                "not json\n",
                "\n",
                r#"{"domain":"a.io","date":"2024-01-01"}"#,
                "\n",
                r#"{"companyId":"acme","domain":"a.io","date":"2024-01-02","sent":7}"#,
                "\n",
            ),
        );

        let records = RecordLoader::parse_file(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].counters.sent, 7);
    }

    #[test]
    fn test_parse_malformed_array_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "broken.json", "[{\"companyId\": \"acme\",");

        let err = RecordLoader::parse_file(&path).unwrap_err();
        assert!(matches!(err, PenguinError::Parse(_)));
    }

    #[test]
    fn test_parse_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.jsonl", "");
        assert!(RecordLoader::parse_file(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_glob_multiple_files_in_path_order() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "b.jsonl",
            r#"{"companyId":"acme","domain":"b.io","date":"2024-01-01","sent":2}"#,
        );
        write_file(
            &dir,
            "a.jsonl",
            r#"{"companyId":"acme","domain":"a.io","date":"2024-01-01","sent":1}"#,
        );
        write_file(&dir, "ignored.txt", "nope");

        let pattern = dir.path().join("*.jsonl");
        let records = RecordLoader::load(&pattern.to_string_lossy()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].domain, "a.io");
        assert_eq!(records[1].domain, "b.io");
    }

    #[test]
    fn test_load_glob_no_matches() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("*.jsonl");
        let records = RecordLoader::load(&pattern.to_string_lossy()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_missing_literal_path_is_io_error() {
        let err = RecordLoader::load("tests/fixtures/does-not-exist.jsonl").unwrap_err();
        assert!(matches!(err, PenguinError::Io(_)));
    }
}
