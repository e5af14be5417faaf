use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::config::{DataReadingMethod, UnitType};
use crate::error::Result;
use crate::io::results::{PeriodKey, ResultTable};

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// Validation report: no header, one `unit,id,column,R2` line per comparison
pub fn create_validation_writer(path: &Path) -> Result<Writer<File>> {
    create_parent(path)?;
    let wtr = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    Ok(wtr)
}

// Header row comes from the serialized row type
pub fn create_report_writer(path: &Path) -> Result<Writer<File>> {
    create_parent(path)?;
    let wtr = WriterBuilder::new().has_headers(true).from_path(path)?;
    Ok(wtr)
}

// Mean extraction time of one column
#[derive(Debug, Serialize)]
pub struct TimingRow<'a> {
    #[serde(rename = "Column")]
    pub column: &'a str,
    #[serde(rename = "Time")]
    pub time: String,
}

impl<'a> TimingRow<'a> {
    pub fn new(column: &'a str, ms: f64) -> Self {
        TimingRow {
            column,
            time: format_ms(ms),
        }
    }
}

// One line of the harness summary
#[derive(Debug, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "SWAT Unit")]
    pub unit: String,
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "Prepare Time(ms)")]
    pub prepare: String,
    #[serde(rename = "Average Extraction Time(ms)")]
    pub extract: String,
}

impl SummaryRow {
    pub fn new(unit: UnitType, method: DataReadingMethod, prepare_ms: f64, extract_ms: f64) -> Self {
        SummaryRow {
            unit: unit.to_string(),
            method: method.to_string(),
            prepare: format_ms(prepare_ms),
            extract: format_ms(extract_ms),
        }
    }
}

pub fn format_ms(ms: f64) -> String {
    format!("{ms:.4}")
}

/// Write an extracted table with its date parts, optional id and calendar columns.
pub fn write_table<W: Write>(table: &ResultTable, out: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(out);

    let with_ids = table.has_ids();
    let mut header: Vec<String> = table.period_headers().iter().map(|h| h.to_string()).collect();
    if with_ids {
        header.push(table.unit.to_string());
    }
    header.push(table.column.clone());
    if table.has_calendar {
        header.push("TIME".to_string());
    }
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = match row.period {
            PeriodKey::Mon(period) => vec![period.to_string()],
            PeriodKey::Ymd { year, month, day } => {
                let mut parts = vec![year.to_string()];
                parts.extend(month.map(|m| m.to_string()));
                parts.extend(day.map(|d| d.to_string()));
                parts
            }
        };
        if with_ids {
            record.push(row.id.map(|id| id.to_string()).unwrap_or_default());
        }
        record.push(row.value.to_string());
        if table.has_calendar {
            record.push(
                row.date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputInterval;
    use chrono::NaiveDate;

    #[test]
    fn table_with_ids_and_calendar() {
        let mut table = ResultTable::new(UnitType::Subbasin, OutputInterval::Monthly, "ETmm");
        table.push(Some(1), PeriodKey::Ymd { year: 2000, month: Some(1), day: None }, 1.5);
        table.push(Some(2), PeriodKey::Ymd { year: 2000, month: Some(1), day: None }, 2.0);
        for row in &mut table.rows {
            row.date = NaiveDate::from_ymd_opt(2000, 1, 1);
        }
        table.has_calendar = true;

        let mut out = Vec::new();
        write_table(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "YR,MO,SUB,ETmm,TIME\n2000,1,1,1.5,2000-01-01\n2000,1,2,2,2000-01-01\n"
        );
    }

    #[test]
    fn text_table_keeps_mon() {
        let mut table = ResultTable::new(UnitType::Hru, OutputInterval::Daily, "ETmm");
        table.push(None, PeriodKey::Mon(32), 0.25);
        let mut out = Vec::new();
        write_table(&table, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "MON,ETmm\n32,0.25\n");
    }

    #[test]
    fn report_headers_come_from_row_types() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("HRU_SQLite_all_year_monthly.csv");
        let mut wtr = create_report_writer(&path).unwrap();
        wtr.serialize(TimingRow::new("ETmm", 1.23456)).unwrap();
        wtr.flush().unwrap();
        drop(wtr);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Column,Time\nETmm,1.2346\n"
        );

        let path = dir.path().join("monthly_final_all_year.csv");
        let mut wtr = create_report_writer(&path).unwrap();
        wtr.serialize(SummaryRow::new(UnitType::Hru, DataReadingMethod::TextRecord, 12.5, 0.25))
            .unwrap();
        wtr.flush().unwrap();
        drop(wtr);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "SWAT Unit,Method,Prepare Time(ms),Average Extraction Time(ms)\nHRU,TextRecord,12.5000,0.2500\n"
        );
    }
}
