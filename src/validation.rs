//! Agreement between two extraction backends.
//!
//! The reference side is always the result database, with its values trimmed to
//! text precision. Two comparisons are available: a per-id correlation R² over
//! rows joined on calendar date, and a whole-column residual R² that pairs rows
//! by position.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog;
use crate::config::{DataReadingMethod, UnitType};
use crate::error::{ExtractError, Result};
use crate::extract::{ExtractRequest, Extractor};
use crate::io::csv::create_validation_writer;

/// Variance below this is treated as a constant series.
const MIN_VARIANCE: f64 = 0.000001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Agreement {
    R2(f64),
    /// Nothing to compare, or the statistic is undefined.
    NoRecord,
}

impl Agreement {
    pub fn value(self) -> Option<f64> {
        match self {
            Agreement::R2(r2) => Some(r2),
            Agreement::NoRecord => None,
        }
    }
}

impl fmt::Display for Agreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agreement::R2(r2) => write!(f, "{r2:.4}"),
            Agreement::NoRecord => f.write_str("NoRecord"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Per-id R² over rows joined on date, candidate read as a whitespace table.
    Correlation,
    /// All ids at once, residual R² over positional pairs, candidate read with
    /// the fixed-record schema.
    Reconcile,
}

impl ValidationMode {
    pub fn candidate_method(self) -> DataReadingMethod {
        match self {
            ValidationMode::Correlation => DataReadingMethod::TextTable,
            ValidationMode::Reconcile => DataReadingMethod::TextRecord,
        }
    }

    pub fn units(self) -> [UnitType; 4] {
        match self {
            ValidationMode::Correlation => [
                UnitType::Reach,
                UnitType::Reservoir,
                UnitType::Subbasin,
                UnitType::Hru,
            ],
            ValidationMode::Reconcile => [
                UnitType::Reach,
                UnitType::Subbasin,
                UnitType::Reservoir,
                UnitType::Hru,
            ],
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Squared Pearson correlation of `(reference, candidate)` pairs.
pub fn correlation_r2(pairs: &[(f64, f64)]) -> Agreement {
    if pairs.is_empty() {
        return Agreement::NoRecord;
    }
    let (x, y): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    let (x_mean, y_mean) = (mean(&x), mean(&y));
    // all-zero series are identical
    if x_mean == 0.0 || y_mean == 0.0 {
        return Agreement::R2(1.0);
    }

    let top: f64 = pairs
        .iter()
        .map(|(a, b)| (a - x_mean) * (b - y_mean))
        .sum();
    let x_ss: f64 = x.iter().map(|a| (a - x_mean).powi(2)).sum();
    let y_ss: f64 = y.iter().map(|b| (b - y_mean).powi(2)).sum();

    if x_ss < MIN_VARIANCE || y_ss < MIN_VARIANCE {
        return Agreement::NoRecord;
    }
    Agreement::R2(top * top / x_ss / y_ss)
}

/// `1 - SSres/SStot`, with `reference` as the modelled series and `candidate`
/// as the observed one. Both series must have the same length.
pub fn residual_r2(reference: &[f64], candidate: &[f64]) -> Result<Agreement> {
    if reference.is_empty() || candidate.is_empty() {
        return Ok(Agreement::NoRecord);
    }
    if reference.len() != candidate.len() {
        return Err(ExtractError::RowCountMismatch {
            reference: reference.len(),
            candidate: candidate.len(),
        });
    }

    let y_mean = mean(candidate);
    if y_mean == 0.0 || mean(reference) == 0.0 {
        return Ok(Agreement::R2(1.0));
    }

    let ss_tot: f64 = candidate.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = candidate
        .iter()
        .zip(reference)
        .map(|(y, f)| (y - f).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 {
            Agreement::R2(1.0)
        } else {
            Agreement::NoRecord
        });
    }
    Ok(Agreement::R2(1.0 - ss_res / ss_tot))
}

fn average(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub struct Validator {
    reference: Extractor,
    candidate: Extractor,
    mode: ValidationMode,
    output_dir: PathBuf,
}

impl Validator {
    /// `reference` must already be open.
    pub fn new(reference: Extractor, candidate: Extractor, mode: ValidationMode, output_dir: &Path) -> Self {
        Validator {
            reference,
            candidate,
            mode,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Result database against the text output of the same TxtInOut folder.
    pub fn from_folder(txtinout: &Path, mode: ValidationMode, output_dir: &Path) -> Result<Self> {
        let mut reference = Extractor::from_method(DataReadingMethod::Sqlite, txtinout)?;
        reference.open()?;
        let candidate = Extractor::from_method(mode.candidate_method(), txtinout)?;
        Ok(Self::new(reference, candidate, mode, output_dir))
    }

    fn output_path(&self, unit: UnitType) -> PathBuf {
        let name = match self.mode {
            ValidationMode::Correlation => format!("{unit}_validation.csv"),
            ValidationMode::Reconcile => {
                format!("{unit}_{}_validation.csv", self.candidate.settings().interval)
            }
        };
        self.output_dir.join(name)
    }

    /// Compare every supported unit type. Returns the mean R² per unit.
    pub fn compare_all(&mut self) -> Result<Vec<(UnitType, Option<f64>)>> {
        let mut results = Vec::new();
        for unit in self.mode.units() {
            if self.candidate.settings().unit_count(unit) == 0 {
                warn!("No {} units in this run, skipping", unit);
                continue;
            }
            let r2 = self.compare_unit(unit)?;
            match r2 {
                Some(r2) => info!("{} mean R2 {:.4}", unit, r2),
                None => info!("{} mean R2 NoRecord", unit),
            }
            results.push((unit, r2));
        }
        Ok(results)
    }

    /// Compare every column of `unit` and write one CSV line per comparison.
    pub fn compare_unit(&mut self, unit: UnitType) -> Result<Option<f64>> {
        let columns = catalog::sqlite_columns(unit).ok_or(ExtractError::UnsupportedUnit {
            backend: "Validator",
            unit,
        })?;
        let path = self.output_path(unit);
        let mut writer = create_validation_writer(&path)?;

        let mut column_means = Vec::new();
        for column in columns {
            let lines = match self.mode {
                ValidationMode::Correlation => {
                    let count = self.candidate.settings().unit_count(unit);
                    let mut lines = Vec::with_capacity(count as usize);
                    for id in 1..=count {
                        lines.push((id.to_string(), self.compare_series(unit, id, column)?));
                    }
                    lines
                }
                ValidationMode::Reconcile => {
                    vec![("all".to_string(), self.reconcile_column(unit, column)?)]
                }
            };

            for (id, agreement) in &lines {
                info!("{},{},{},{}", unit, id, column, agreement);
                writer.write_record([unit.to_string(), id.clone(), column.to_string(), agreement.to_string()])?;
            }
            if let Some(r2) = average(lines.iter().filter_map(|(_, a)| a.value())) {
                column_means.push(r2);
            }
        }

        writer.flush()?;
        info!("Validation results for {} saved to {}", unit, path.display());
        Ok(average(column_means))
    }

    /// R² of one id and column, rows joined on date.
    pub fn compare_series(&mut self, unit: UnitType, id: u32, column: &str) -> Result<Agreement> {
        let request = ExtractRequest::new(unit, column).id(id).with_calendar();
        let (reference, _) = self
            .reference
            .extract(&request.clone().with_adjusted_accuracy())?;
        let (candidate, _) = self.candidate.extract(&request)?;

        let by_date: HashMap<NaiveDate, f64> = candidate
            .rows
            .iter()
            .filter_map(|r| r.date.map(|d| (d, r.value)))
            .collect();
        let pairs: Vec<(f64, f64)> = reference
            .rows
            .iter()
            .filter_map(|r| {
                let date = r.date?;
                by_date.get(&date).map(|c| (r.value, *c))
            })
            .collect();
        Ok(correlation_r2(&pairs))
    }

    /// Residual R² of one column over all ids.
    pub fn reconcile_column(&mut self, unit: UnitType, column: &str) -> Result<Agreement> {
        let request = ExtractRequest::new(unit, column);
        let (reference, _) = self
            .reference
            .extract(&request.clone().with_adjusted_accuracy())?;
        let (candidate, _) = self.candidate.extract(&request)?;
        residual_r2(&reference.values(), &candidate.values())
    }

    pub fn close(&mut self) {
        self.reference.close();
        self.candidate.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_series_have_r2_one() {
        let pairs: Vec<(f64, f64)> = (1..=10).map(|i| (i as f64, i as f64)).collect();
        let Agreement::R2(r2) = correlation_r2(&pairs) else {
            panic!("expected R2");
        };
        assert!((r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_zero_series_are_identical() {
        let pairs = vec![(0.0, 0.0); 12];
        assert_eq!(correlation_r2(&pairs), Agreement::R2(1.0));
        assert_eq!(residual_r2(&[0.0; 12], &[0.0; 12]).unwrap(), Agreement::R2(1.0));
    }

    #[test]
    fn empty_join_is_no_record() {
        assert_eq!(correlation_r2(&[]), Agreement::NoRecord);
        assert_eq!(residual_r2(&[], &[1.0]).unwrap(), Agreement::NoRecord);
    }

    #[test]
    fn constant_non_zero_series_is_no_record() {
        let pairs = vec![(2.0, 2.0); 5];
        assert_eq!(correlation_r2(&pairs), Agreement::NoRecord);
    }

    #[test]
    fn anti_correlated_series_still_square_to_one() {
        let pairs: Vec<(f64, f64)> = (1..=5).map(|i| (i as f64, 10.0 - i as f64)).collect();
        let r2 = correlation_r2(&pairs).value().unwrap();
        assert!((r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn residual_r2_uses_candidate_mean() {
        let candidate = [1.0, 2.0, 3.0, 4.0];
        let reference = [1.0, 2.0, 3.0, 5.0];
        // SStot = 5, SSres = 1
        let r2 = residual_r2(&reference, &candidate).unwrap().value().unwrap();
        assert!((r2 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn residual_r2_constant_candidate() {
        assert_eq!(residual_r2(&[3.0, 3.0], &[3.0, 3.0]).unwrap(), Agreement::R2(1.0));
        assert_eq!(residual_r2(&[3.0, 4.0], &[3.0, 3.0]).unwrap(), Agreement::NoRecord);
    }

    #[test]
    fn different_lengths_are_fatal() {
        let err = residual_r2(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::RowCountMismatch {
                reference: 2,
                candidate: 1
            }
        ));
    }

    #[test]
    fn agreement_formats_like_the_report() {
        assert_eq!(Agreement::R2(0.987654).to_string(), "0.9877");
        assert_eq!(Agreement::NoRecord.to_string(), "NoRecord");
    }
}
