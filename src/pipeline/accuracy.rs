//! Filtering measurements through the accuracy report.

use std::path::Path;

use ahash::AHashSet;
use anyhow::{Context, Result, ensure};
use polars::prelude::{BooleanChunked, NewChunkedArray};

use crate::io::csv::{read_csv, str_column, write_csv};

/// Keeps only measurement rows whose (date, sensor id) pair appears in the
/// accuracy report with every reading at or above `accepted_percentage`.
///
/// The report's first two columns are the date and sensor id; every later
/// column holds `"NN%"` strings. Returns the number of rows kept.
pub fn filter_with_accuracy(
    input: &Path,
    accuracy: &Path,
    date_column: &str,
    sensor_column: &str,
    output: &Path,
    accepted_percentage: i64,
    verbose: u8,
) -> Result<usize> {
    let df = read_csv(input)?;
    let report = read_csv(accuracy)?;
    ensure!(
        report.width() > 2,
        "[pipeline::accuracy] Accuracy report has no percentage columns"
    );

    let percentage_columns: Vec<String> = report
        .get_column_names()
        .iter()
        .skip(2)
        .map(|name| name.to_string())
        .collect();

    let mut accurate = vec![true; report.height()];
    for name in &percentage_columns {
        let column = str_column(&report, name)?;
        for (row, value) in column.into_iter().enumerate() {
            let Some(value) = value else {
                accurate[row] = false;
                continue;
            };
            let percentage: i64 =
                value.trim().trim_end_matches('%').parse().with_context(|| {
                    format!("[pipeline::accuracy] Invalid percentage {value:?} in {name:?}")
                })?;
            if percentage < accepted_percentage {
                accurate[row] = false;
            }
        }
    }

    let keys: AHashSet<(String, String)> = {
        let dates = str_column(&report, date_column)?;
        let sensors = str_column(&report, sensor_column)?;
        dates
            .into_iter()
            .zip(sensors)
            .zip(&accurate)
            .filter_map(|((date, sensor), keep)| {
                (*keep).then(|| date.zip(sensor))?.map(|(d, s)| (d.to_string(), s.to_string()))
            })
            .collect()
    };
    if verbose > 0 {
        eprintln!(
            "[pipeline::accuracy] {} of {} report rows meet {}%",
            keys.len(),
            report.height(),
            accepted_percentage
        );
    }

    let mask = {
        let dates = str_column(&df, date_column)?;
        let sensors = str_column(&df, sensor_column)?;
        let keep: Vec<bool> = dates
            .into_iter()
            .zip(sensors)
            .map(|(date, sensor)| {
                date.zip(sensor)
                    .is_some_and(|(d, s)| keys.contains(&(d.to_string(), s.to_string())))
            })
            .collect();
        BooleanChunked::from_slice("keep".into(), &keep)
    };

    let mut filtered = df.filter(&mask)?;
    let kept = filtered.height();
    write_csv(&mut filtered, output)?;
    Ok(kept)
}
