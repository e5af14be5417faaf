//! Simulation settings shared by every extractor: year range, output interval
//! and the number of simulated units.
//!
//! The text backends read them from `file.cio` and the output file headers, the
//! SQLite backend from the metadata tables of the result database.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{ColumnConfig, OutputInterval, UnitType};
use crate::error::{ExtractError, Result};
use crate::io::fixed_width::{self, HEADER_LINES};

pub const CONTROL_FILE: &str = "file.cio";

// 1-based line numbers in file.cio
const LINE_NBYR: usize = 8;
const LINE_IYR: usize = 9;
const LINE_IPRINT: usize = 59;
const LINE_NYSKIP: usize = 60;
const VALUE_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSettings {
    pub start_year: i32,
    pub end_year: i32,
    pub interval: OutputInterval,
    pub hru_count: u32,
    pub subbasin_count: u32,
    pub reservoir_count: u32,
}

impl ModelSettings {
    /// Read `file.cio` and count units from the output files in `txtinout`.
    pub fn read(txtinout: &Path) -> Result<Self> {
        let path = txtinout.join(CONTROL_FILE);
        let file = File::open(&path).map_err(|e| ExtractError::Config {
            path: path.clone(),
            line: 0,
            reason: e.to_string(),
        })?;

        let config_error = |line: usize, reason: String| ExtractError::Config {
            path: path.clone(),
            line,
            reason,
        };

        let mut lines = Vec::with_capacity(LINE_NYSKIP);
        for (i, line) in BufReader::new(file).lines().take(LINE_NYSKIP).enumerate() {
            lines.push(line.map_err(|e| config_error(i + 1, e.to_string()))?);
        }

        let field = |line_no: usize| -> Result<i32> {
            let line = lines
                .get(line_no - 1)
                .ok_or_else(|| config_error(line_no, "file ends early".to_string()))?;
            let raw = fixed_width::slice(line, 0, VALUE_WIDTH).trim();
            raw.parse::<i32>()
                .map_err(|_| config_error(line_no, format!("expected an integer, found '{raw}'")))
        };

        let years = field(LINE_NBYR)?;
        let first_year = field(LINE_IYR)?;
        let code = field(LINE_IPRINT)?;
        let skip = field(LINE_NYSKIP)?;

        let interval = OutputInterval::from_code(code.into())
            .ok_or_else(|| config_error(LINE_IPRINT, format!("unknown output interval code {code}")))?;

        let start_year = first_year
            .checked_add(skip)
            .ok_or_else(|| config_error(LINE_NYSKIP, format!("NYSKIP {skip} overflows the start year")))?;
        let end_year = first_year
            .checked_add(years)
            .and_then(|y| y.checked_sub(1))
            .ok_or_else(|| config_error(LINE_NBYR, format!("NBYR {years} overflows the end year")))?;

        let settings = ModelSettings {
            start_year,
            end_year,
            interval,
            hru_count: count_units(&txtinout.join(UnitType::Hru.output_file_name()), UnitType::Hru)?,
            subbasin_count: count_units(
                &txtinout.join(UnitType::Subbasin.output_file_name()),
                UnitType::Subbasin,
            )?,
            reservoir_count: count_units(
                &txtinout.join(UnitType::Reservoir.output_file_name()),
                UnitType::Reservoir,
            )?,
        };
        debug!(?settings, "Read model settings from {}", path.display());
        Ok(settings)
    }

    /// Read the same settings from the metadata tables of a result database.
    pub fn from_database(conn: &Connection, config: &ColumnConfig) -> Result<Self> {
        let year = |key: &str| -> Result<i32> {
            let value = metadata_value(conn, config, key)?;
            i32::try_from(value).map_err(|_| ExtractError::Config {
                path: config.basin_table.clone().into(),
                line: 0,
                reason: format!("{key} {value} is not a valid year"),
            })
        };
        let start_year = year(&config.start_year_key)?;
        let end_year = year(&config.end_year_key)?;
        let code = metadata_value(conn, config, &config.interval_key)?;
        let interval = OutputInterval::from_code(code).ok_or_else(|| ExtractError::Config {
            path: config.basin_table.clone().into(),
            line: 0,
            reason: format!("unknown output interval code {code}"),
        })?;

        let hru_count = count_rows(conn, &config.hru_info)?;
        let subbasin_count = count_rows(conn, &config.sub_info)?;
        let reservoir_count = if table_exists(conn, &config.rsv_info)? {
            count_rows(conn, &config.rsv_info)?
        } else {
            0
        };

        Ok(ModelSettings {
            start_year,
            end_year,
            interval,
            hru_count,
            subbasin_count,
            reservoir_count,
        })
    }

    pub fn years(&self) -> i32 {
        self.end_year - self.start_year + 1
    }

    /// Reaches are numbered like subbasins, water rows like HRUs.
    pub fn unit_count(&self, unit: UnitType) -> u32 {
        match unit {
            UnitType::Hru | UnitType::Water => self.hru_count,
            UnitType::Subbasin | UnitType::Reach => self.subbasin_count,
            UnitType::Reservoir => self.reservoir_count,
        }
    }

    /// Number of average-annual rows at the end of the text output file.
    pub fn summary_rows(&self, unit: UnitType) -> usize {
        if self.interval == OutputInterval::Daily {
            return 0;
        }
        match unit {
            UnitType::Hru => self.hru_count as usize,
            UnitType::Subbasin | UnitType::Reach => self.subbasin_count as usize,
            UnitType::Reservoir | UnitType::Water => 0,
        }
    }

    pub fn records_per_unit(&self) -> usize {
        self.records_in_range(self.start_year, self.end_year)
    }

    /// Time steps per unit between two years (inclusive).
    pub fn records_in_range(&self, start: i32, end: i32) -> usize {
        if start > end {
            return 0;
        }
        let years = (end - start + 1) as usize;
        match self.interval {
            OutputInterval::Yearly => years,
            OutputInterval::Monthly => years * 12,
            OutputInterval::Daily => (start..=end).map(days_in_year).sum(),
        }
    }

    /// Restrict a requested range to the simulated years. `None` when nothing overlaps.
    pub fn clamp(&self, start: i32, end: i32) -> Option<(i32, i32)> {
        let start = start.max(self.start_year);
        let end = end.min(self.end_year);
        (start <= end).then_some((start, end))
    }

    pub fn is_full_range(&self, start: i32, end: i32) -> bool {
        start == self.start_year && end == self.end_year
    }
}

fn days_in_year(year: i32) -> usize {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Number of units in a text output file.
///
/// Ids increase along the first time step; the first id that does not
/// increase starts the next time step or the average-annual block. A missing
/// file counts as zero units.
pub fn count_units(path: &Path, unit: UnitType) -> Result<u32> {
    if !path.exists() {
        warn!("{} not found, assuming no {} units", path.display(), unit);
        return Ok(0);
    }

    let (offset, width) = unit.id_field();
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;

    for line in reader.lines().skip(HEADER_LINES) {
        let line = line?;
        let Ok(id) = fixed_width::slice(&line, offset, width).trim().parse::<u32>() else {
            break;
        };
        if id <= count {
            break;
        }
        count = id;
    }

    debug!("{} has {} {} units", path.display(), count, unit);
    Ok(count)
}

fn metadata_value(conn: &Connection, config: &ColumnConfig, key: &str) -> Result<i64> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1",
        config.basin_value, config.basin_table, config.basin_name
    );
    let value = conn
        .query_row(&sql, [key], |row| row.get::<_, Value>(0))
        .optional()
        .map_err(|source| ExtractError::Query {
            sql: sql.clone(),
            source,
        })?;

    let parsed = match value {
        Some(Value::Integer(v)) => Some(v),
        Some(Value::Real(v)) => Some(v as i64),
        Some(Value::Text(text)) => text
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| text.trim().parse::<f64>().ok().map(|v| v as i64)),
        _ => None,
    };
    parsed.ok_or_else(|| ExtractError::Config {
        path: config.basin_table.clone().into(),
        line: 0,
        reason: format!("missing or invalid {key}"),
    })
}

fn count_rows(conn: &Connection, table: &str) -> Result<u32> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    conn.query_row(&sql, [], |row| row.get::<_, u32>(0))
        .map_err(|source| ExtractError::Query { sql, source })
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let sql = "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1";
    let count = conn
        .query_row(sql, [table], |row| row.get::<_, i64>(0))
        .map_err(|source| ExtractError::Query {
            sql: sql.to_string(),
            source,
        })?;
    Ok(count > 0)
}
