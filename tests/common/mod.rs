//! Small SWAT runs written into temporary TxtInOut folders, each with text
//! output and the same values at full precision in the result database.
//!
//! - monthly: five HRUs over 2000..2009, with yearly summary rows and the
//!   average-annual block in `output.hru`
//! - daily: two HRUs over 2000..2001, one row per Julian day
//! - yearly: 1001 subbasins over 2000..2001, so four-digit ids touch the
//!   `BIGSUB` label

#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, params_from_iter};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use swat_extract::accuracy::AccuracyNormalizer;
use swat_extract::catalog;
use swat_extract::config::{ColumnConfig, OutputInterval, UnitType};

pub const START_YEAR: i32 = 2000;
pub const YEARS: i32 = 10;
pub const HRUS: u32 = 5;

pub const DAILY_HRUS: u32 = 2;
pub const DAILY_YEARS: i32 = 2;

pub const SUBS: u32 = 1001;
pub const YEARLY_YEARS: i32 = 2;

/// Full-precision value of HRU `id`, catalog column `column`.
pub fn hru_value(id: u32, year: i32, month: u32, column: usize) -> f64 {
    id as f64 * 10.0 + (year - START_YEAR) as f64 + month as f64 * 0.1234567 + column as f64 * 0.01
}

/// Daily HRU value on simulation day `day` (1-based).
pub fn daily_value(id: u32, day: u32, column: usize) -> f64 {
    id as f64 * 10.0 + day as f64 * 0.0123457 + column as f64 * 0.01
}

pub fn sub_value(id: u32, year: i32, column: usize) -> f64 {
    id as f64 + (year - START_YEAR) as f64 * 0.25 + column as f64 * 0.001 + 0.0004
}

/// Every simulated day of the daily run.
pub fn daily_dates() -> Vec<NaiveDate> {
    NaiveDate::from_ymd_opt(START_YEAR, 1, 1)
        .unwrap()
        .iter_days()
        .take_while(|d| d.year() < START_YEAR + DAILY_YEARS)
        .collect()
}

pub fn write_cio(dir: &Path, years: i32, first_year: i32, code: i64, skip: i32) {
    let mut lines: Vec<String> = (1..=64).map(|_| format!("{:>16}    |", 0)).collect();
    lines[7] = format!("{years:>16}    | NBYR : Number of years simulated");
    lines[8] = format!("{first_year:>16}    | IYR : Beginning year of simulation");
    lines[58] = format!("{code:>16}    | IPRINT: print code (month, day, year)");
    lines[59] = format!("{skip:>16}    | NYSKIP: number of years to skip output printing/summarization");
    fs::write(dir.join("file.cio"), lines.join("\n")).unwrap();
}

fn header() -> String {
    (0..9).map(|i| format!("SWAT output header line {i}\n")).collect()
}

fn hru_line(id: u32, mon: &str, value: impl Fn(usize) -> f64) -> String {
    let normalizer = AccuracyNormalizer::new(OutputInterval::Monthly);
    let columns = catalog::sqlite_columns(UnitType::Hru).unwrap();
    let mut line = format!(
        "AGRL{id:>5}{:>10}{:>5}{:>5}{mon:>5}{:>10.5}",
        format!("{:09}", 10000 + id),
        1,
        1,
        0.12345
    );
    for (i, name) in columns.iter().enumerate() {
        let width = if i == 66 || i == 67 { 11 } else { 10 };
        let text = normalizer
            .notation(UnitType::Hru, name)
            .unwrap()
            .format(value(i));
        line.push_str(&format!("{text:>width$}"));
    }
    line
}

fn sub_line(id: u32, mon: &str, value: impl Fn(usize) -> f64) -> String {
    let normalizer = AccuracyNormalizer::new(OutputInterval::Yearly);
    let columns = catalog::sqlite_columns(UnitType::Subbasin).unwrap();
    let mut line = format!(
        "BIGSUB{id:>4}{:>10}{mon:>4}{:>10.3}",
        format!("{:09}", id * 10000),
        1.5
    );
    for (i, name) in columns.iter().enumerate() {
        let width = if i == 18 { 11 } else { 10 };
        let text = normalizer
            .notation(UnitType::Subbasin, name)
            .unwrap()
            .format(value(i));
        line.push_str(&format!("{text:>width$}"));
    }
    line.push_str(&format!("{id:>6}"));
    line
}

pub fn write_output_hru(dir: &Path) {
    let mut text = header();
    for year in START_YEAR..START_YEAR + YEARS {
        for month in 1..=12 {
            for id in 1..=HRUS {
                text.push_str(&hru_line(id, &month.to_string(), |c| hru_value(id, year, month, c)));
                text.push('\n');
            }
        }
        for id in 1..=HRUS {
            text.push_str(&hru_line(id, &year.to_string(), |_| 999.0));
            text.push('\n');
        }
    }
    for id in 1..=HRUS {
        text.push_str(&hru_line(id, &format!("{:.1}", YEARS as f64), |_| 555.0));
        text.push('\n');
    }
    fs::write(dir.join("output.hru"), text).unwrap();
}

/// Result database with the metadata and unit info tables filled in.
fn create_result_db(dir: &Path, interval: OutputInterval, code: i64, last_year: i32, hrus: u32, subs: u32) -> Connection {
    let conn = Connection::open(dir.join(ColumnConfig::database_name(interval))).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE ave_annual_basin (NAME TEXT, VALUE TEXT);
         INSERT INTO ave_annual_basin VALUES ('START_YEAR_OUTPUT', '{START_YEAR}');
         INSERT INTO ave_annual_basin VALUES ('END_YEAR', '{last_year}');
         INSERT INTO ave_annual_basin VALUES ('OUTPUT_INTERVAL', '{code}');
         CREATE TABLE hru_info (HRU INTEGER);
         CREATE TABLE sub_info (SUB INTEGER);"
    ))
    .unwrap();
    conn.execute_batch("BEGIN;").unwrap();
    for id in 1..=hrus {
        conn.execute("INSERT INTO hru_info VALUES (?1)", [id]).unwrap();
    }
    for id in 1..=subs {
        conn.execute("INSERT INTO sub_info VALUES (?1)", [id]).unwrap();
    }
    conn.execute_batch("COMMIT;").unwrap();
    conn
}

/// Create `table` with date columns, the id column and every catalog column,
/// then insert `rows` in order.
fn fill_table(conn: &Connection, unit: UnitType, dates: &[&str], rows: impl IntoIterator<Item = Vec<f64>>) {
    let columns = catalog::sqlite_columns(unit).unwrap();
    let table = ColumnConfig::table_name(unit);
    let id = ColumnConfig::id_column(unit);
    let mut definitions: Vec<String> = dates.iter().map(|d| format!("{d} INTEGER")).collect();
    definitions.push(format!("{id} INTEGER"));
    definitions.extend(columns.iter().map(|c| format!("{c} REAL")));
    conn.execute_batch(&format!("CREATE TABLE {table} ({});", definitions.join(", ")))
        .unwrap();

    let placeholders = (1..=definitions.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute_batch("BEGIN;").unwrap();
    {
        let mut stmt = conn
            .prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))
            .unwrap();
        for row in rows {
            stmt.execute(params_from_iter(row)).unwrap();
        }
    }
    conn.execute_batch("COMMIT;").unwrap();
}

pub fn write_result_db(dir: &Path) {
    let conn = create_result_db(dir, OutputInterval::Monthly, 1, START_YEAR + YEARS - 1, HRUS, 1);
    let count = catalog::column_count(UnitType::Hru);
    let rows = (START_YEAR..START_YEAR + YEARS).flat_map(|year| {
        (1..=12u32).flat_map(move |month| {
            (1..=HRUS).map(move |id| {
                let mut row = vec![year as f64, month as f64, id as f64];
                row.extend((0..count).map(|c| hru_value(id, year, month, c)));
                row
            })
        })
    });
    fill_table(&conn, UnitType::Hru, &["YR", "MO"], rows);
}

/// Monthly run with both text output and result database.
pub fn monthly_run() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_cio(dir.path(), YEARS, START_YEAR, 1, 0);
    write_output_hru(dir.path());
    write_result_db(dir.path());
    dir
}

/// Daily HRU run over a leap year and a common year.
pub fn daily_run() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_cio(dir.path(), DAILY_YEARS, START_YEAR, 0, 0);
    let dates = daily_dates();

    let mut text = header();
    for (i, date) in dates.iter().enumerate() {
        let day = i as u32 + 1;
        for id in 1..=DAILY_HRUS {
            text.push_str(&hru_line(id, &date.ordinal().to_string(), |c| daily_value(id, day, c)));
            text.push('\n');
        }
    }
    fs::write(dir.path().join("output.hru"), text).unwrap();

    let conn = create_result_db(
        dir.path(),
        OutputInterval::Daily,
        0,
        START_YEAR + DAILY_YEARS - 1,
        DAILY_HRUS,
        1,
    );
    let count = catalog::column_count(UnitType::Hru);
    let rows = dates.iter().enumerate().flat_map(|(i, date)| {
        (1..=DAILY_HRUS).map(move |id| {
            let mut row = vec![date.year() as f64, date.month() as f64, date.day() as f64, id as f64];
            row.extend((0..count).map(|c| daily_value(id, i as u32 + 1, c)));
            row
        })
    });
    fill_table(&conn, UnitType::Hru, &["YR", "MO", "DA"], rows);
    dir
}

/// Yearly subbasin run whose ids reach four digits.
pub fn yearly_run() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_cio(dir.path(), YEARLY_YEARS, START_YEAR, 2, 0);

    let mut text = header();
    for year in START_YEAR..START_YEAR + YEARLY_YEARS {
        for id in 1..=SUBS {
            text.push_str(&sub_line(id, &year.to_string(), |c| sub_value(id, year, c)));
            text.push('\n');
        }
    }
    for id in 1..=SUBS {
        text.push_str(&sub_line(id, &format!("{:.1}", YEARLY_YEARS as f64), |_| 555.0));
        text.push('\n');
    }
    fs::write(dir.path().join("output.sub"), text).unwrap();

    let conn = create_result_db(
        dir.path(),
        OutputInterval::Yearly,
        2,
        START_YEAR + YEARLY_YEARS - 1,
        0,
        SUBS,
    );
    let count = catalog::column_count(UnitType::Subbasin);
    let rows = (START_YEAR..START_YEAR + YEARLY_YEARS).flat_map(|year| {
        (1..=SUBS).map(move |id| {
            let mut row = vec![year as f64, id as f64];
            row.extend((0..count).map(|c| sub_value(id, year, c)));
            row
        })
    });
    fill_table(&conn, UnitType::Subbasin, &["YR"], rows);
    dir
}
