// src/services/report.rs
use csv::{Terminator, WriterBuilder};
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::registrations::ComparisonTable;

pub const REPORT_FILE_NAME: &str = "data.tsv";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to encode report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
    #[error("report is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Totals are money; round to cents so float noise never reaches the file.
pub fn format_amount(value: f64) -> String {
    let cents = (value * 100.0).round() / 100.0;
    format!("{}", cents)
}

pub fn write_tsv<W: io::Write>(table: &ComparisonTable, writer: W) -> Result<(), ReportError> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(table.years.iter().map(|year| format!("{:04}", year)));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.days_before.to_string()];
        record.extend(row.totals.iter().map(|total| format_amount(*total)));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn render_tsv(table: &ComparisonTable) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    write_tsv(table, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// Renders fully before touching the file, so a failed run never leaves a
/// half-written report behind.
pub fn save_report(table: &ComparisonTable, dir: &Path) -> Result<PathBuf, ReportError> {
    let contents = render_tsv(table)?;
    let path = dir.join(REPORT_FILE_NAME);
    fs::write(&path, contents)?;
    info!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventId;
    use crate::services::registrations::ComparisonRow;

    fn table(years: Vec<i32>, rows: Vec<(i64, Vec<f64>)>) -> ComparisonTable {
        ComparisonTable {
            event_ids: years.iter().enumerate().map(|(i, _)| EventId(i.to_string())).collect(),
            years,
            rows: rows
                .into_iter()
                .map(|(days_before, totals)| ComparisonRow { days_before, totals })
                .collect(),
        }
    }

    #[test]
    fn header_only_when_no_rows() {
        let out = render_tsv(&table(vec![2020, 2020], vec![])).unwrap();
        assert_eq!(out, "date\t2020\t2020\n");
    }

    #[test]
    fn rows_are_tab_separated_without_trailing_tab() {
        let out = render_tsv(&table(vec![2019], vec![(3, vec![10.0]), (1, vec![15.0])])).unwrap();
        assert_eq!(out, "date\t2019\n3\t10\n1\t15\n");
    }

    #[test]
    fn amounts_print_as_plain_decimals() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(12.5), "12.5");
        assert_eq!(format_amount(0.1 + 0.2), "0.3");
        assert_eq!(format_amount(1234.567), "1234.57");
    }

    #[test]
    fn save_writes_data_tsv_into_directory() {
        let dir = std::env::temp_dir().join(format!("registration_compare_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let path = save_report(&table(vec![2021, 2022], vec![(4, vec![30.0, 7.0])]), &dir).unwrap();
        assert_eq!(path.file_name().unwrap(), REPORT_FILE_NAME);
        assert_eq!(fs::read_to_string(&path).unwrap(), "date\t2021\t2022\n4\t30\t7\n");

        fs::remove_dir_all(&dir).unwrap();
    }
}
