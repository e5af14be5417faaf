//! Extraction timings for every backend over a capped grid of
//! (unit, column, id, year) requests.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::config::{DataReadingMethod, HarnessLimits, QueryMode, UnitType};
use crate::error::{ExtractError, Result};
use crate::extract::{ExtractRequest, ExtractTiming, Extractor, YearRange};
use crate::io::csv::{SummaryRow, TimingRow, create_report_writer};
use crate::settings::ModelSettings;

pub const UNITS: [UnitType; 3] = [UnitType::Subbasin, UnitType::Reach, UnitType::Hru];

/// Timings of one backend on one unit type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodTiming {
    pub unit: UnitType,
    pub method: DataReadingMethod,
    pub prepare_ms: f64,
    /// Mean extraction time of one (column, id, year) request.
    pub average_extract_ms: f64,
}

pub struct PerformanceHarness {
    txtinout: PathBuf,
    output_root: PathBuf,
    settings: ModelSettings,
    mode: QueryMode,
    limits: HarnessLimits,
}

impl PerformanceHarness {
    pub fn new(txtinout: &Path, output_root: &Path, mode: QueryMode) -> Result<Self> {
        Ok(PerformanceHarness {
            txtinout: txtinout.to_path_buf(),
            output_root: output_root.to_path_buf(),
            settings: ModelSettings::read(txtinout)?,
            mode,
            limits: HarnessLimits::default(),
        })
    }

    pub fn with_limits(mut self, limits: HarnessLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// `<output>/extract_test/<all_year|each_year>/<interval>/`
    pub fn output_folder(&self) -> PathBuf {
        self.output_root
            .join("extract_test")
            .join(self.mode.to_string())
            .join(self.settings.interval.to_string())
    }

    fn id_count(&self, unit: UnitType) -> u32 {
        self.settings.unit_count(unit).min(self.limits.max_ids)
    }

    fn column_count(&self, unit: UnitType) -> usize {
        catalog::column_count(unit).min(self.limits.max_columns)
    }

    fn year_count(&self) -> i32 {
        match self.mode {
            QueryMode::AllYears => 1,
            QueryMode::EachYear => self.settings.years().min(self.limits.max_years).max(0),
        }
    }

    fn request_count(&self) -> u64 {
        let per_method: u64 = UNITS
            .iter()
            .map(|&u| self.id_count(u) as u64 * self.column_count(u) as u64)
            .sum();
        per_method * self.year_count() as u64 * DataReadingMethod::ALL.len() as u64
    }

    /// Time every method on every unit type and write the summary CSV.
    pub fn run(&self) -> Result<Vec<MethodTiming>> {
        let pb = ProgressBar::new(self.request_count());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} requests ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        let results = self.run_with_progress(&pb);
        pb.finish_and_clear();
        let results = results?;

        let path = self
            .output_folder()
            .join(format!("{}_final_{}.csv", self.settings.interval, self.mode));
        let mut wtr = create_report_writer(&path)?;
        for timing in &results {
            wtr.serialize(SummaryRow::new(
                timing.unit,
                timing.method,
                timing.prepare_ms,
                timing.average_extract_ms,
            ))?;
        }
        wtr.flush()?;
        info!("Performance summary saved to {}", path.display());
        Ok(results)
    }

    pub fn run_with_progress(&self, pb: &ProgressBar) -> Result<Vec<MethodTiming>> {
        let mut results = Vec::new();
        for unit in UNITS {
            for method in DataReadingMethod::ALL {
                pb.set_message(format!("{unit} {method}"));
                if let Some(timing) = self.run_method(unit, method, pb)? {
                    info!(
                        "{} {}: prepare {:.4} ms, extract {:.4} ms",
                        unit, method, timing.prepare_ms, timing.average_extract_ms
                    );
                    results.push(timing);
                }
            }
        }
        Ok(results)
    }

    /// Run the grid for one unit type and method, writing `Column,Time` lines.
    /// `None` when the run has no unit of this type.
    pub fn run_method(
        &self,
        unit: UnitType,
        method: DataReadingMethod,
        pb: &ProgressBar,
    ) -> Result<Option<MethodTiming>> {
        let ids = self.id_count(unit);
        let years = self.year_count();
        if ids == 0 || years == 0 {
            warn!("No {} units to time with {}", unit, method);
            return Ok(None);
        }
        let columns = catalog::sqlite_columns(unit).ok_or(ExtractError::UnsupportedUnit {
            backend: "Performance harness",
            unit,
        })?;
        let columns = &columns[..self.column_count(unit)];

        let mut extractor = Extractor::from_method(method, &self.txtinout)?;
        let mut prepare_ms = extractor.open()?;

        let path = self.output_folder().join(format!(
            "{unit}_{method}_{}_{}.csv",
            self.mode, self.settings.interval
        ));
        let mut wtr = create_report_writer(&path)?;

        let mut total_ms = 0.0;
        for column in columns {
            let mut column_ms = 0.0;
            for id in 1..=ids {
                for year_index in 0..years {
                    let (range, expected) = match self.mode {
                        QueryMode::AllYears => (YearRange::All, self.settings.records_per_unit()),
                        QueryMode::EachYear => {
                            let year = self.settings.start_year + year_index;
                            (YearRange::Single(year), self.settings.records_in_range(year, year))
                        }
                    };
                    let request = ExtractRequest::new(unit, column).id(id).years(range).with_calendar();
                    let (table, timing) = extractor.extract(&request)?;
                    if table.len() != expected {
                        return Err(ExtractError::RecordCount {
                            unit,
                            method,
                            column: column.to_string(),
                            id: request.id_code(),
                            expected,
                            found: table.len(),
                        });
                    }
                    prepare_ms += timing.prepare_ms;
                    column_ms += timing.extract_ms;
                    pb.inc(1);
                }
            }

            column_ms /= (ids as i64 * years as i64) as f64;
            debug!("{} {} {}: {:.4} ms", unit, method, column, column_ms);
            wtr.serialize(TimingRow::new(column, column_ms))?;
            total_ms += column_ms;
        }
        wtr.flush()?;
        extractor.close();

        let timing = ExtractTiming {
            prepare_ms,
            extract_ms: total_ms / columns.len() as f64,
        };
        timing.check(&format!("{unit} {method}"))?;
        Ok(Some(MethodTiming {
            unit,
            method,
            prepare_ms: timing.prepare_ms,
            average_extract_ms: timing.extract_ms,
        }))
    }
}
