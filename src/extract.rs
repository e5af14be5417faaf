//! Extraction requests and the closed set of extractor backends.

use std::path::Path;
use std::time::Instant;

use crate::accuracy::AccuracyNormalizer;
use crate::cached::CachedExtractor;
use crate::config::{DataReadingMethod, UnitType};
use crate::dates::DateReconstructor;
use crate::error::{ExtractError, Result};
use crate::io::results::ResultTable;
use crate::settings::ModelSettings;
use crate::sqlite::SqliteExtractor;

/// Years covered by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearRange {
    All,
    Single(i32),
    Span { start: i32, end: i32 },
}

impl YearRange {
    /// Requested bounds clamped to the simulated years, `None` when they don't overlap.
    pub fn clamp(self, settings: &ModelSettings) -> Option<(i32, i32)> {
        let (start, end) = match self {
            YearRange::All => (settings.start_year, settings.end_year),
            YearRange::Single(year) => (year, year),
            YearRange::Span { start, end } => (start, end),
        };
        settings.clamp(start, end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractRequest {
    pub unit: UnitType,
    pub column: String,
    /// `None` extracts every unit and adds the id to each row.
    pub id: Option<u32>,
    pub years: YearRange,
    pub add_calendar: bool,
    pub adjust_accuracy: bool,
}

impl ExtractRequest {
    pub fn new(unit: UnitType, column: &str) -> Self {
        ExtractRequest {
            unit,
            column: column.to_string(),
            id: None,
            years: YearRange::All,
            add_calendar: false,
            adjust_accuracy: false,
        }
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn with_calendar(mut self) -> Self {
        self.add_calendar = true;
        self
    }

    pub fn with_adjusted_accuracy(mut self) -> Self {
        self.adjust_accuracy = true;
        self
    }

    /// Id as reported in errors and CSV output, -1 for all units.
    pub fn id_code(&self) -> i64 {
        self.id.map_or(-1, i64::from)
    }
}

/// Milliseconds spent on one extraction call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractTiming {
    /// Opening a connection or loading a whole output file. Zero when nothing was prepared.
    pub prepare_ms: f64,
    pub extract_ms: f64,
}

impl ExtractTiming {
    pub const UNSET: f64 = -99.0;

    pub fn unset() -> Self {
        ExtractTiming {
            prepare_ms: Self::UNSET,
            extract_ms: Self::UNSET,
        }
    }

    pub fn check(&self, operation: &str) -> Result<()> {
        if self.prepare_ms == Self::UNSET || self.extract_ms == Self::UNSET {
            return Err(ExtractError::TimingUnset {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

pub fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

pub enum Extractor {
    Sqlite(SqliteExtractor),
    Cached(CachedExtractor),
}

impl Extractor {
    /// Build the extractor for `method` over a TxtInOut folder. Nothing is
    /// opened or loaded yet.
    pub fn from_method(method: DataReadingMethod, txtinout: &Path) -> Result<Self> {
        match method {
            DataReadingMethod::Sqlite => Ok(Extractor::Sqlite(SqliteExtractor::new(txtinout)?)),
            DataReadingMethod::TextTable | DataReadingMethod::TextRecord => {
                Ok(Extractor::Cached(CachedExtractor::new(txtinout, method)?))
            }
        }
    }

    pub fn method(&self) -> DataReadingMethod {
        match self {
            Extractor::Sqlite(_) => DataReadingMethod::Sqlite,
            Extractor::Cached(e) => e.method(),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        match self {
            Extractor::Sqlite(e) => e.settings(),
            Extractor::Cached(e) => e.settings(),
        }
    }

    /// Acquire backend resources. Returns the time spent in milliseconds.
    pub fn open(&mut self) -> Result<f64> {
        match self {
            Extractor::Sqlite(e) => e.open(),
            Extractor::Cached(_) => Ok(0.0),
        }
    }

    pub fn extract(&mut self, request: &ExtractRequest) -> Result<(ResultTable, ExtractTiming)> {
        if request.unit == UnitType::Water {
            return Err(ExtractError::UnsupportedUnit {
                backend: match self {
                    Extractor::Sqlite(_) => "SQLite extractor",
                    Extractor::Cached(_) => "Whole-table extractor",
                },
                unit: request.unit,
            });
        }

        let (mut table, mut timing, start_year) = match self {
            Extractor::Sqlite(e) => e.extract(request)?,
            Extractor::Cached(e) => e.extract(request)?,
        };

        let started = Instant::now();
        if request.adjust_accuracy {
            AccuracyNormalizer::new(table.interval).apply(&mut table)?;
        }
        if request.add_calendar {
            if let Some(start_year) = start_year {
                DateReconstructor::new(table.interval, start_year).apply(&mut table)?;
            }
        }
        if timing.extract_ms != ExtractTiming::UNSET {
            timing.extract_ms += elapsed_ms(started);
        }

        timing.check(&format!("{} {} {}", self.method(), request.unit, request.column))?;
        Ok((table, timing))
    }

    /// Release held resources. The extractor can be opened again afterwards.
    pub fn close(&mut self) {
        match self {
            Extractor::Sqlite(e) => e.close(),
            Extractor::Cached(e) => e.clear(),
        }
    }
}
