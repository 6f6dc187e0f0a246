//! Merge-and-persist writer for per-market funding archives
//!
//! Each archive is a headerless CSV of `<timestamp>,<rate>` lines sorted
//! ascending by timestamp. Persisting merges the freshly accumulated series
//! with the pre-existing archive — new values win ties, archived values fill
//! gaps — and atomically replaces the destination file, so the destination is
//! never observed partially written.

use crate::output::path::archive_path;
use crate::output::{OutputError, OutputResult};
use crate::FundingSeries;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Timestamp pattern used in archive lines (`20260110 08:00:00`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d %H:%M:%S";

/// Writes merged per-market archives under a destination root
pub struct ArchiveWriter {
    dest_root: PathBuf,
    baseline_root: Option<PathBuf>,
}

impl ArchiveWriter {
    /// Create a writer
    ///
    /// # Arguments
    /// * `dest_root` - Data root the archives are written under
    /// * `baseline_root` - Optional separate data root read as the merge
    ///   baseline; when absent the destination file itself is the baseline
    pub fn new(dest_root: impl Into<PathBuf>, baseline_root: Option<PathBuf>) -> Self {
        Self {
            dest_root: dest_root.into(),
            baseline_root,
        }
    }

    /// Merge `series` with the pre-existing archive for `ticker` and replace
    /// the destination file atomically
    ///
    /// Returns the number of lines written. The destination directory is
    /// created if missing. A crash mid-write can only orphan the temporary
    /// file; the destination holds either the old or the new contents,
    /// never a mix.
    pub fn persist(&self, ticker: &str, series: &FundingSeries) -> OutputResult<usize> {
        let dest = archive_path(&self.dest_root, ticker);
        let baseline = match &self.baseline_root {
            Some(root) => archive_path(root, ticker),
            None => dest.clone(),
        };

        let mut merged = series.clone();
        if baseline.exists() {
            let filled = merge_baseline(&baseline, &mut merged)?;
            debug!(
                ticker = %ticker,
                baseline = %baseline.display(),
                filled,
                "merged archived entries"
            );
        }

        let parent = dest.parent().ok_or_else(|| {
            OutputError::IoError(format!("archive path has no parent: {}", dest.display()))
        })?;
        std::fs::create_dir_all(parent).map_err(|e| {
            OutputError::IoError(format!("failed to create {}: {e}", parent.display()))
        })?;

        let temp = NamedTempFile::new_in(parent).map_err(|e| {
            OutputError::IoError(format!("failed to create temporary file: {e}"))
        })?;

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(temp.as_file());
            for (timestamp, rate) in &merged {
                writer
                    .write_record([
                        timestamp.format(TIMESTAMP_FORMAT).to_string(),
                        rate.to_string(),
                    ])
                    .map_err(|e| OutputError::CsvError(format!("failed to write line: {e}")))?;
            }
            writer
                .flush()
                .map_err(|e| OutputError::IoError(format!("failed to flush: {e}")))?;
        }

        temp.as_file()
            .sync_all()
            .map_err(|e| OutputError::IoError(format!("failed to sync file: {e}")))?;

        temp.persist(&dest).map_err(|e| {
            OutputError::IoError(format!("failed to replace {}: {e}", dest.display()))
        })?;

        info!(ticker = %ticker, lines = merged.len(), path = %dest.display(), "archive written");
        Ok(merged.len())
    }
}

/// Insert archived entries into `merged` wherever the timestamp is absent
///
/// Freshly fetched values already in the map are never overwritten. Records
/// with fewer than two fields, or with an unparseable timestamp or rate, are
/// skipped. Returns the number of gap-filled entries.
fn merge_baseline(path: &Path, merged: &mut FundingSeries) -> OutputResult<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| OutputError::CsvError(format!("failed to open {}: {e}", path.display())))?;

    let mut filled = 0usize;
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(_) => continue,
        };
        if record.len() < 2 {
            continue;
        }

        let Some(timestamp_field) = record.get(0) else {
            continue;
        };
        let Some(rate_field) = record.get(1) else {
            continue;
        };
        let Ok(timestamp) = NaiveDateTime::parse_from_str(timestamp_field.trim(), TIMESTAMP_FORMAT)
        else {
            continue;
        };
        let Ok(rate) = Decimal::from_str(rate_field.trim()) else {
            continue;
        };

        if let std::collections::btree_map::Entry::Vacant(entry) =
            merged.entry(timestamp.and_utc())
        {
            entry.insert(rate);
            filled += 1;
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn entry(ts: &str, rate: &str) -> (chrono::DateTime<Utc>, Decimal) {
        let ts = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
            .unwrap()
            .and_utc();
        (ts, Decimal::from_str(rate).unwrap())
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_persist_writes_sorted_lines() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ArchiveWriter::new(temp_dir.path(), None);

        let series: FundingSeries = BTreeMap::from([
            entry("20260110 16:00:00", "0.0003"),
            entry("20260110 08:00:00", "0.0001"),
            entry("20260110 12:00:00", "0.0002"),
        ]);

        let lines_written = writer.persist("BTC-USD", &series).unwrap();
        assert_eq!(lines_written, 3);

        let path = archive_path(temp_dir.path(), "BTC-USD");
        assert_eq!(
            read_lines(&path),
            vec![
                "20260110 08:00:00,0.0001",
                "20260110 12:00:00,0.0002",
                "20260110 16:00:00,0.0003",
            ]
        );
    }

    #[test]
    fn test_persist_new_value_wins_over_archived() {
        let temp_dir = TempDir::new().unwrap();
        let path = archive_path(temp_dir.path(), "BTC-USD");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "20260110 08:00:00,0.0009\n").unwrap();

        let writer = ArchiveWriter::new(temp_dir.path(), None);
        let series: FundingSeries = BTreeMap::from([entry("20260110 08:00:00", "0.0001")]);
        writer.persist("BTC-USD", &series).unwrap();

        assert_eq!(read_lines(&path), vec!["20260110 08:00:00,0.0001"]);
    }

    #[test]
    fn test_persist_archived_entries_fill_gaps() {
        let temp_dir = TempDir::new().unwrap();
        let path = archive_path(temp_dir.path(), "BTC-USD");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "20260109 08:00:00,0.0005\n").unwrap();

        let writer = ArchiveWriter::new(temp_dir.path(), None);
        let series: FundingSeries = BTreeMap::from([entry("20260110 08:00:00", "0.0001")]);
        let lines_written = writer.persist("BTC-USD", &series).unwrap();

        assert_eq!(lines_written, 2);
        assert_eq!(
            read_lines(&path),
            vec!["20260109 08:00:00,0.0005", "20260110 08:00:00,0.0001"]
        );
    }

    #[test]
    fn test_persist_skips_malformed_baseline_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = archive_path(temp_dir.path(), "BTC-USD");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "garbage\n20260109 08:00:00,0.0005\nnot-a-date,0.1\n20260109 09:00:00,not-a-rate\n",
        )
        .unwrap();

        let writer = ArchiveWriter::new(temp_dir.path(), None);
        let series: FundingSeries = BTreeMap::from([entry("20260110 08:00:00", "0.0001")]);
        writer.persist("BTC-USD", &series).unwrap();

        assert_eq!(
            read_lines(&path),
            vec!["20260109 08:00:00,0.0005", "20260110 08:00:00,0.0001"]
        );
    }

    #[test]
    fn test_persist_reads_baseline_from_separate_root() {
        let baseline_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();

        let baseline_path = archive_path(baseline_dir.path(), "BTC-USD");
        std::fs::create_dir_all(baseline_path.parent().unwrap()).unwrap();
        std::fs::write(&baseline_path, "20260109 08:00:00,0.0005\n").unwrap();

        let writer = ArchiveWriter::new(dest_dir.path(), Some(baseline_dir.path().into()));
        let series: FundingSeries = BTreeMap::from([entry("20260110 08:00:00", "0.0001")]);
        writer.persist("BTC-USD", &series).unwrap();

        let dest_path = archive_path(dest_dir.path(), "BTC-USD");
        assert_eq!(
            read_lines(&dest_path),
            vec!["20260109 08:00:00,0.0005", "20260110 08:00:00,0.0001"]
        );
        // Baseline root is read-only input.
        assert_eq!(read_lines(&baseline_path), vec!["20260109 08:00:00,0.0005"]);
    }

    #[test]
    fn test_timestamp_format_round_trip() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
        let rendered = ts.format(TIMESTAMP_FORMAT).to_string();
        assert_eq!(rendered, "20260110 08:00:00");
        assert_eq!(rendered.len(), 17);

        let parsed = NaiveDateTime::parse_from_str(&rendered, TIMESTAMP_FORMAT)
            .unwrap()
            .and_utc();
        assert_eq!(parsed, ts);
    }
}
