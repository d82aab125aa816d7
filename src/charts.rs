//! Daily chart snapshots on disk.
//!
//! Snapshots live in one directory as `YYYY-MM-DD.csv`. A date whose file
//! exists counts as downloaded and is never fetched again; the merge step
//! stitches the present snapshots, in date order, into the single input table
//! the lyrics stage reads.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::{info, warn};

use crate::table::Table;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_COLUMN: &str = "date";

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Every date from `start` to `end`, both inclusive.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start > end {
        bail!("Start date {} is after end date {}", start, end);
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

pub fn snapshot_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.csv", date.format(DATE_FORMAT)))
}

/// Dates split by whether their snapshot file already exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotPlan {
    pub present: Vec<NaiveDate>,
    pub missing: Vec<NaiveDate>,
}

pub fn plan_snapshots(dir: &Path, dates: &[NaiveDate]) -> SnapshotPlan {
    let mut plan = SnapshotPlan::default();
    for &date in dates {
        if snapshot_path(dir, date).exists() {
            plan.present.push(date);
        } else {
            plan.missing.push(date);
        }
    }
    plan
}

/// Concatenate the snapshots for `dates` (in the given order) into one table
/// with a leading `date` column. All snapshots must share a header row.
pub fn merge_snapshots(dir: &Path, dates: &[NaiveDate]) -> Result<Table> {
    let mut merged: Option<Table> = None;

    for &date in dates {
        let path = snapshot_path(dir, date);
        let snapshot = Table::read_csv(&path)?;
        let date_cell = date.format(DATE_FORMAT).to_string();

        let table = merged.get_or_insert_with(|| {
            let mut headers = vec![DATE_COLUMN.to_string()];
            headers.extend(snapshot.headers.iter().cloned());
            Table::new(headers)
        });

        if table.headers[1..] != snapshot.headers[..] {
            bail!(
                "Snapshot {} has columns {:?}, expected {:?}",
                path.display(),
                snapshot.headers,
                &table.headers[1..]
            );
        }

        if snapshot.is_empty() {
            warn!("Snapshot {} has no rows", path.display());
        }
        for row in snapshot.rows {
            let mut merged_row = Vec::with_capacity(row.len() + 1);
            merged_row.push(date_cell.clone());
            merged_row.extend(row);
            table.rows.push(merged_row);
        }
    }

    let table = merged.unwrap_or_else(|| Table::new(vec![DATE_COLUMN.to_string()]));
    info!("Merged {} snapshots into {} rows", dates.len(), table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn d(value: &str) -> NaiveDate {
        parse_date(value).unwrap()
    }

    #[test]
    fn test_date_range_inclusive() {
        let dates = date_range(d("2025-02-27"), d("2025-03-02")).unwrap();
        let formatted: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            formatted,
            vec!["2025-02-27", "2025-02-28", "2025-03-01", "2025-03-02"]
        );
        assert_eq!(date_range(d("2025-01-01"), d("2025-01-01")).unwrap().len(), 1);
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        assert!(date_range(d("2025-01-02"), d("2025-01-01")).is_err());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2025/01/01").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_plan_splits_present_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2025-01-02.csv"), "rank\n1\n").unwrap();
        let dates = date_range(d("2025-01-01"), d("2025-01-03")).unwrap();

        let plan = plan_snapshots(dir.path(), &dates);

        assert_eq!(plan.present, vec![d("2025-01-02")]);
        assert_eq!(plan.missing, vec![d("2025-01-01"), d("2025-01-03")]);
    }

    #[test]
    fn test_merge_in_date_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("2025-01-01.csv"),
            "rank,track_name,artist_names\n1,Song A,X\n2,Song B,Y\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("2025-01-02.csv"),
            "rank,track_name,artist_names\n1,Song B,Y\n",
        )
        .unwrap();

        let table = merge_snapshots(dir.path(), &[d("2025-01-01"), d("2025-01-02")]).unwrap();

        assert_eq!(table.headers, vec!["date", "rank", "track_name", "artist_names"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0], vec!["2025-01-01", "1", "Song A", "X"]);
        assert_eq!(table.rows[2], vec!["2025-01-02", "1", "Song B", "Y"]);
    }

    #[test]
    fn test_merge_rejects_header_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2025-01-01.csv"), "rank,track_name\n1,A\n").unwrap();
        fs::write(dir.path().join("2025-01-02.csv"), "track_name,rank\nA,1\n").unwrap();

        let result = merge_snapshots(dir.path(), &[d("2025-01-01"), d("2025-01-02")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let table = merge_snapshots(dir.path(), &[]).unwrap();
        assert_eq!(table.headers, vec!["date"]);
        assert!(table.is_empty());
    }
}
