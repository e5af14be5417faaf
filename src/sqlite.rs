use rusqlite::{Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::config::{ColumnConfig, OutputInterval, UnitType};
use crate::error::{ExtractError, Result};
use crate::extract::{ExtractRequest, ExtractTiming, elapsed_ms};
use crate::io::results::{PeriodKey, ResultTable};
use crate::settings::ModelSettings;

// Queries the SWAT-SQLite result database, one SQL statement per request
pub struct SqliteExtractor {
    db_path: PathBuf,
    config: ColumnConfig,
    settings: ModelSettings,
    conn: Option<Connection>,
}

impl SqliteExtractor {
    /// The output interval in `file.cio` selects which result database to use.
    pub fn new(txtinout: &Path) -> Result<Self> {
        let settings = ModelSettings::read(txtinout)?;
        let db_path = txtinout.join(ColumnConfig::database_name(settings.interval));
        Ok(Self::with_database(db_path, settings))
    }

    pub fn with_database(db_path: PathBuf, settings: ModelSettings) -> Self {
        SqliteExtractor {
            db_path,
            config: ColumnConfig::new(),
            settings,
            conn: None,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the database and reload settings from its metadata tables.
    /// Returns the time spent, or 0 when already open.
    pub fn open(&mut self) -> Result<f64> {
        if self.conn.is_some() {
            return Ok(0.0);
        }
        if !self.db_path.exists() {
            return Err(ExtractError::MissingDatabase {
                path: self.db_path.clone(),
            });
        }

        let started = Instant::now();
        let conn = Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        self.settings = ModelSettings::from_database(&conn, &self.config)?;
        self.conn = Some(conn);
        let prepare_ms = elapsed_ms(started);

        info!(
            "Opened {} ({} to {}, {})",
            self.db_path.display(),
            self.settings.start_year,
            self.settings.end_year,
            self.settings.interval
        );
        Ok(prepare_ms)
    }

    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!("Failed to close {}: {}", self.db_path.display(), e);
            }
        }
    }

    /// SQL for one request over the clamped years `start..=end`.
    pub fn build_query(
        &self,
        unit: UnitType,
        column: &str,
        id: Option<u32>,
        start: i32,
        end: i32,
    ) -> Result<String> {
        let column = catalog::resolve(unit, column)?.sqlite;
        let id_column = ColumnConfig::id_column(unit);

        let mut select = self.config.date_columns(self.settings.interval);
        if id.is_none() {
            select.push(id_column);
        }
        select.push(column);

        let mut filters = Vec::new();
        if let Some(id) = id {
            filters.push(format!("{id_column} = {id}"));
        }
        if !self.settings.is_full_range(start, end) {
            if start == end {
                filters.push(format!("{} = {start}", self.config.year));
            } else {
                filters.push(format!(
                    "{year} >= {start} AND {year} <= {end}",
                    year = self.config.year
                ));
            }
        }

        let mut sql = format!(
            "SELECT {} FROM {}",
            select.join(", "),
            ColumnConfig::table_name(unit)
        );
        if !filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }
        Ok(sql)
    }

    /// Raw table for `request`, plus the first year it covers.
    pub fn extract(
        &mut self,
        request: &ExtractRequest,
    ) -> Result<(ResultTable, ExtractTiming, Option<i32>)> {
        let mut timing = ExtractTiming::unset();
        let started = Instant::now();

        let conn = self.conn.as_ref().ok_or(ExtractError::NotConnected)?;
        let interval = self.settings.interval;
        let mut table = ResultTable::new(request.unit, interval, &request.column);

        let Some((start, end)) = request.years.clamp(&self.settings) else {
            timing.prepare_ms = 0.0;
            timing.extract_ms = elapsed_ms(started);
            return Ok((table, timing, None));
        };

        let sql = self.build_query(request.unit, &request.column, request.id, start, end)?;
        debug!("{}", sql);

        let query_error = |source| ExtractError::Query {
            sql: sql.clone(),
            source,
        };
        let mut stmt = conn.prepare(&sql).map_err(query_error)?;
        let with_id = request.id.is_none();
        let rows = stmt
            .query_map([], |row| read_row(row, interval, with_id))
            .map_err(query_error)?;
        for row in rows {
            let (id, period, value) = row.map_err(query_error)?;
            table.push(id, period, value);
        }

        timing.prepare_ms = 0.0;
        timing.extract_ms = elapsed_ms(started);
        Ok((table, timing, Some(start)))
    }
}

impl Drop for SqliteExtractor {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_row(
    row: &Row,
    interval: OutputInterval,
    with_id: bool,
) -> rusqlite::Result<(Option<u32>, PeriodKey, f64)> {
    let year = row.get::<_, i32>(0)?;
    let (month, day, next) = match interval {
        OutputInterval::Yearly => (None, None, 1),
        OutputInterval::Monthly => (Some(row.get::<_, u32>(1)?), None, 2),
        OutputInterval::Daily => (Some(row.get::<_, u32>(1)?), Some(row.get::<_, u32>(2)?), 3),
    };
    let (id, value_index) = if with_id {
        (Some(row.get::<_, u32>(next)?), next + 1)
    } else {
        (None, next)
    };
    let value = row.get::<_, Option<f64>>(value_index)?.unwrap_or(0.0);
    Ok((id, PeriodKey::Ymd { year, month, day }, value))
}
