//! Whole-table extraction from the text output files.
//!
//! The first request for a unit type parses the complete output file into
//! memory; later requests only filter the cached rows. Nothing is ever evicted,
//! so a daily HRU run needs the whole file in memory.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::catalog;
use crate::config::{DataReadingMethod, UnitType};
use crate::dates::PeriodTracker;
use crate::error::{ExtractError, Result};
use crate::extract::{ExtractRequest, ExtractTiming, elapsed_ms};
use crate::io::fixed_width::{HEADER_LINES, LineParser, RecordSchema, TabularLayout};
use crate::io::results::{PeriodKey, ResultTable};
use crate::settings::ModelSettings;

// One parsed time step of one unit
#[derive(Debug, Clone, PartialEq)]
struct CachedRecord {
    id: u32,
    period: i32,
    year: i32,
    values: Vec<f64>,
}

pub struct CachedExtractor {
    txtinout: PathBuf,
    method: DataReadingMethod,
    settings: ModelSettings,
    tables: HashMap<UnitType, Vec<CachedRecord>>,
}

impl CachedExtractor {
    pub fn new(txtinout: &Path, method: DataReadingMethod) -> Result<Self> {
        let settings = ModelSettings::read(txtinout)?;
        Ok(CachedExtractor {
            txtinout: txtinout.to_path_buf(),
            method,
            settings,
            tables: HashMap::new(),
        })
    }

    pub fn method(&self) -> DataReadingMethod {
        self.method
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn is_loaded(&self, unit: UnitType) -> bool {
        self.tables.contains_key(&unit)
    }

    /// Drop every cached table.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    fn parser(&self, unit: UnitType) -> Result<LineParser> {
        match self.method {
            DataReadingMethod::TextTable => Ok(LineParser::Tabular(TabularLayout::for_unit(unit)?)),
            DataReadingMethod::TextRecord => Ok(LineParser::Record(RecordSchema::for_unit(unit)?)),
            DataReadingMethod::Sqlite => Err(ExtractError::UnsupportedUnit {
                backend: "Whole-table extractor over SQLite",
                unit,
            }),
        }
    }

    /// Parse the whole output file of `unit`. Returns the time spent, or 0 if
    /// it was already cached.
    pub fn load(&mut self, unit: UnitType) -> Result<f64> {
        if self.tables.contains_key(&unit) {
            return Ok(0.0);
        }

        let started = Instant::now();
        let parser = self.parser(unit)?;
        let path = self.txtinout.join(unit.output_file_name());
        if !path.exists() {
            return Err(ExtractError::MissingOutputFile { path });
        }

        let mut lines = Vec::new();
        for line in BufReader::new(File::open(&path)?).lines().skip(HEADER_LINES) {
            let line = line?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        // average-annual block
        let keep = lines.len().saturating_sub(self.settings.summary_rows(unit));
        lines.truncate(keep);

        let mut tracker = PeriodTracker::new(self.settings.interval, self.settings.start_year);
        let mut records = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let parsed = parser.parse_line(line, &path, HEADER_LINES + i + 1)?;
            // yearly summaries inside daily/monthly files
            let Some(year) = tracker.advance(parsed.period) else {
                continue;
            };
            records.push(CachedRecord {
                id: parsed.id,
                period: parsed.period,
                year,
                values: parsed.values,
            });
        }

        let prepare_ms = elapsed_ms(started);
        info!(
            "Loaded {} {} records from {} in {:.1} ms",
            records.len(),
            self.method,
            path.display(),
            prepare_ms
        );
        self.tables.insert(unit, records);
        Ok(prepare_ms)
    }

    /// Raw table for `request`, plus the first year it covers.
    pub fn extract(
        &mut self,
        request: &ExtractRequest,
    ) -> Result<(ResultTable, ExtractTiming, Option<i32>)> {
        let mut timing = ExtractTiming::unset();
        let column = catalog::resolve(request.unit, &request.column)?;
        timing.prepare_ms = self.load(request.unit)?;

        let started = Instant::now();
        let mut table = ResultTable::new(request.unit, self.settings.interval, &request.column);
        let Some((start, end)) = request.years.clamp(&self.settings) else {
            timing.extract_ms = elapsed_ms(started);
            return Ok((table, timing, None));
        };

        let records = self.tables.get(&request.unit).map(Vec::as_slice).unwrap_or(&[]);
        for record in records {
            if record.year < start || record.year > end {
                continue;
            }
            match request.id {
                Some(id) if id != record.id => continue,
                Some(_) => table.push(None, PeriodKey::Mon(record.period), record.values[column.index]),
                None => table.push(
                    Some(record.id),
                    PeriodKey::Mon(record.period),
                    record.values[column.index],
                ),
            }
        }

        timing.extract_ms = elapsed_ms(started);
        Ok((table, timing, Some(start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::YearRange;
    use std::fs;
    use tempfile::TempDir;

    // Two reaches, yearly output 2000..2002 plus the average-annual block.
    fn yearly_reach_run() -> TempDir {
        let dir = TempDir::new().unwrap();
        let mut cio: Vec<String> = (1..=60).map(|_| format!("{:>16}", 0)).collect();
        cio[7] = format!("{:>16}", 3);
        cio[8] = format!("{:>16}", 2000);
        cio[58] = format!("{:>16}", 2);
        fs::write(dir.path().join("file.cio"), cio.join("\n")).unwrap();

        let mut rch: String = (0..HEADER_LINES).map(|i| format!("header {i}\n")).collect();
        let mut write = |id: u32, mon: i32, flow: f64| {
            rch.push_str(&format!("REACH{id:>5}{:>9}{mon:>6}{:>12.4e}", 0, 1.5));
            for i in 0..46 {
                let v = if i == 1 { flow } else { 0.0 };
                rch.push_str(&format!("{v:>12.4e}"));
            }
            rch.push_str(&format!("{id:>6}\n"));
        };
        for year in 2000..=2002 {
            write(1, year, 10.0 + (year - 2000) as f64);
            write(2, year, 20.0 + (year - 2000) as f64);
        }
        write(1, 3, 99.0);
        write(2, 3, 99.0);
        fs::write(dir.path().join("output.rch"), rch).unwrap();

        let mut sub: String = (0..HEADER_LINES).map(|i| format!("header {i}\n")).collect();
        for id in [1, 2, 1, 2] {
            sub.push_str(&format!("BIGSUB{id:>4}\n"));
        }
        fs::write(dir.path().join("output.sub"), sub).unwrap();
        dir
    }

    #[test]
    fn both_parsers_skip_the_average_annual_block() {
        let dir = yearly_reach_run();
        for method in [DataReadingMethod::TextTable, DataReadingMethod::TextRecord] {
            let mut extractor = CachedExtractor::new(dir.path(), method).unwrap();
            let request = ExtractRequest::new(UnitType::Reach, "FLOW_OUTcms").id(2);
            let (table, _, start) = extractor.extract(&request).unwrap();
            assert_eq!(start, Some(2000));
            assert_eq!(table.values(), vec![20.0, 21.0, 22.0], "{method}");
        }
    }

    #[test]
    fn second_request_reuses_the_cache() {
        let dir = yearly_reach_run();
        let mut extractor = CachedExtractor::new(dir.path(), DataReadingMethod::TextRecord).unwrap();
        let request = ExtractRequest::new(UnitType::Reach, "FLOW_OUTcms").years(YearRange::Single(2001));
        let (first, _, _) = extractor.extract(&request).unwrap();
        assert!(extractor.is_loaded(UnitType::Reach));
        let (second, timing, _) = extractor.extract(&request).unwrap();
        assert_eq!(first, second);
        assert_eq!(timing.prepare_ms, 0.0);
        assert_eq!(first.rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
    }

    #[test]
    fn out_of_range_years_give_an_empty_table() {
        let dir = yearly_reach_run();
        let mut extractor = CachedExtractor::new(dir.path(), DataReadingMethod::TextTable).unwrap();
        let request = ExtractRequest::new(UnitType::Reach, "FLOW_OUTcms")
            .years(YearRange::Span { start: 2010, end: 2012 });
        let (table, _, start) = extractor.extract(&request).unwrap();
        assert!(table.is_empty());
        assert_eq!(start, None);
    }

    #[test]
    fn missing_output_file_is_reported_on_use() {
        let dir = yearly_reach_run();
        let mut extractor = CachedExtractor::new(dir.path(), DataReadingMethod::TextTable).unwrap();
        let err = extractor
            .extract(&ExtractRequest::new(UnitType::Hru, "ETmm"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingOutputFile { .. }));
    }
}
