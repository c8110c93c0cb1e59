//! Date-based filters and small table repairs.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::{BooleanChunked, IdxCa, NamedFrom, NewChunkedArray, Series};

use crate::io::csv::{read_csv, str_column, write_csv};
use crate::types::columns;

/// Keeps rows whose date column contains `date` (textual match, like the
/// source export's `dd/mm/yyyy` values). Returns the number of rows kept.
pub fn daily_filter(input: &Path, date: &str, output: &Path) -> Result<usize> {
    let df = read_csv(input)?;
    let mask = {
        let dates = str_column(&df, columns::DATE)?;
        let keep: Vec<bool> =
            dates.into_iter().map(|d| d.is_some_and(|d| d.contains(date))).collect();
        BooleanChunked::from_slice("keep".into(), &keep)
    };
    let mut filtered = df.filter(&mask)?;
    let kept = filtered.height();
    write_csv(&mut filtered, output)?;
    Ok(kept)
}

/// Keeps rows within `[start, end]`. Bounds arrive as `mm/dd/yyyy`, the data's
/// date column as `dd/mm/yyyy`. Returns the number of rows kept.
pub fn filter_date_range(input: &Path, start: &str, end: &str, output: &Path) -> Result<usize> {
    let start = NaiveDate::parse_from_str(start, "%m/%d/%Y")
        .with_context(|| format!("[pipeline::filters] Invalid start date {start:?}"))?;
    let end = NaiveDate::parse_from_str(end, "%m/%d/%Y")
        .with_context(|| format!("[pipeline::filters] Invalid end date {end:?}"))?;

    let df = read_csv(input)?;
    let mask = {
        let dates = str_column(&df, columns::DATE)?;
        let mut keep = Vec::with_capacity(df.height());
        for value in dates {
            let value = value.context("[pipeline::filters] Row without a date")?;
            let date = NaiveDate::parse_from_str(value, "%d/%m/%Y")
                .with_context(|| format!("[pipeline::filters] Invalid date {value:?}"))?;
            keep.push(start <= date && date <= end);
        }
        BooleanChunked::from_slice("keep".into(), &keep)
    };
    let mut filtered = df.filter(&mask)?;
    let kept = filtered.height();
    write_csv(&mut filtered, output)?;
    Ok(kept)
}

/// Rewrites the dataset in chronological order of its `yyyy-mm-dd` date column.
pub fn reorder_by_date(input: &Path, output: &Path) -> Result<()> {
    let df = read_csv(input)?;
    let order = {
        let dates = str_column(&df, columns::DATE)?;
        let mut parsed = Vec::with_capacity(df.height());
        for (row, value) in dates.into_iter().enumerate() {
            let value = value.context("[pipeline::filters] Row without a date")?;
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .with_context(|| format!("[pipeline::filters] Invalid date {value:?}"))?;
            parsed.push((date, row as u32));
        }
        parsed.sort_by_key(|(date, _)| *date);
        parsed.into_iter().map(|(_, row)| row).collect::<Vec<u32>>()
    };
    let mut sorted = df.take(&IdxCa::from_vec("idx".into(), order))?;
    write_csv(&mut sorted, output)
}

/// Replaces missing values in the direction column with `default`, updating
/// the file in place. Returns the number of rows repaired.
pub fn fill_missing_directions(input: &Path, direction_column: &str, default: &str) -> Result<usize> {
    let mut df = read_csv(input)?;
    let mut filled = 0;
    let directions: Vec<&str> = {
        let column = str_column(&df, direction_column)?;
        column
            .into_iter()
            .map(|d| match d {
                Some(d) if !d.is_empty() => d,
                _ => {
                    filled += 1;
                    default
                }
            })
            .collect()
    };
    let series = Series::new(direction_column.into(), directions);
    df.with_column(series)?;
    write_csv(&mut df, input)?;
    Ok(filled)
}
