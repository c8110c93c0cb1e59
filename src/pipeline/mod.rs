//! The tabular pipeline stages around the matching core: accuracy and date
//! filters, detector exports, flow and edge-data generation.

use anyhow::{Context, Result, ensure};
use polars::frame::DataFrame;

use crate::io::csv::str_column;

pub mod accuracy;
pub mod detectors;
pub mod edge_data;
pub mod filters;
pub mod flow;

/// Parses an `hh:mm-hh:mm` slot into its start and end hours.
pub(crate) fn parse_time_slot(slot: &str) -> Result<(u32, u32)> {
    let (start, end) = slot
        .split_once('-')
        .with_context(|| format!("[pipeline] Time slot {slot:?} is not \"hh:mm-hh:mm\""))?;
    let hour = |part: &str| -> Result<u32> {
        let hh = part
            .split(':')
            .next()
            .unwrap_or(part)
            .parse::<u32>()
            .with_context(|| format!("[pipeline] Invalid hour in time slot {slot:?}"))?;
        ensure!(hh <= 24, "[pipeline] Hour {hh} out of range in time slot {slot:?}");
        Ok(hh)
    };
    let (first, last) = (hour(start)?, hour(end)?);
    ensure!(first < last, "[pipeline] Time slot {slot:?} is empty or reversed");
    Ok((first, last))
}

/// Header of the hourly count column starting at `hour`. The dataset's last
/// column is `"23:00-24:00"`, not a wrapped `"23:00-00:00"`.
pub(crate) fn hour_column(hour: u32) -> String {
    format!("{:02}:00-{:02}:00", hour, hour + 1)
}

/// Vehicle count for one row over `[first, last)`, summing hourly columns.
pub(crate) fn slot_vehicle_count(
    df: &DataFrame,
    row: usize,
    first: u32,
    last: u32,
) -> Result<i64> {
    let mut total = 0.0;
    for hour in first..last {
        let column = hour_column(hour);
        let value = str_column(df, &column)?
            .get(row)
            .with_context(|| format!("[pipeline] Row {row} has no count for {column}"))?;
        total += value
            .parse::<f64>()
            .with_context(|| format!("[pipeline] Invalid count {value:?} in {column}"))?;
    }
    Ok(total as i64)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{NamedFrom, Series};

    use super::*;

    #[test]
    fn parses_single_hour_slot() {
        assert_eq!(parse_time_slot("07:00-08:00").unwrap(), (7, 8));
    }

    #[test]
    fn parses_spanning_slot() {
        assert_eq!(parse_time_slot("09:00-12:00").unwrap(), (9, 12));
    }

    #[test]
    fn rejects_reversed_or_malformed_slots() {
        assert!(parse_time_slot("12:00-09:00").is_err());
        assert!(parse_time_slot("12:00").is_err());
        assert!(parse_time_slot("ab:00-cd:00").is_err());
    }

    #[test]
    fn last_hour_column_ends_at_24() {
        assert_eq!(hour_column(23), "23:00-24:00");
        assert_eq!(hour_column(7), "07:00-08:00");
    }

    #[test]
    fn slot_ending_at_24_reads_the_last_column() {
        let df = DataFrame::new(vec![
            Series::new("22:00-23:00".into(), vec!["4"]).into(),
            Series::new("23:00-24:00".into(), vec!["6"]).into(),
        ])
        .unwrap();
        assert_eq!(slot_vehicle_count(&df, 0, 22, 24).unwrap(), 10);
    }

    #[test]
    fn spanning_slot_sums_hourly_columns() {
        let df = DataFrame::new(vec![
            Series::new("07:00-08:00".into(), vec!["10"]).into(),
            Series::new("08:00-09:00".into(), vec!["20"]).into(),
            Series::new("09:00-10:00".into(), vec!["5"]).into(),
        ])
        .unwrap();
        assert_eq!(slot_vehicle_count(&df, 0, 7, 10).unwrap(), 35);
        assert_eq!(slot_vehicle_count(&df, 0, 8, 9).unwrap(), 20);
    }
}
