//! Calendar dates from interval-native date parts.
//!
//! Text output only carries a `MON` field: the Julian day for daily output, the
//! month for monthly output and the year for yearly output. The year has to be
//! recovered by walking the rows in file order and counting resets of that field.

use chrono::{Days, NaiveDate};

use crate::config::OutputInterval;
use crate::error::{ExtractError, Result};
use crate::io::results::{PeriodKey, ResultTable};

/// Tracks the simulation year while walking `MON` values in file order.
#[derive(Debug, Clone)]
pub struct PeriodTracker {
    interval: OutputInterval,
    start_year: i32,
    year: i32,
    previous: Option<i32>,
}

impl PeriodTracker {
    pub fn new(interval: OutputInterval, start_year: i32) -> Self {
        PeriodTracker {
            interval,
            start_year,
            year: start_year - 1,
            previous: None,
        }
    }

    /// Year of the row carrying `period`, or `None` for summary rows
    /// (Julian day > 366, month > 12) which are skipped without touching
    /// the rollover state.
    pub fn advance(&mut self, period: i32) -> Option<i32> {
        if self.interval == OutputInterval::Yearly {
            return Some(period);
        }
        if let Some(max) = self.interval.max_period() {
            if period > max {
                return None;
            }
        }
        match self.previous {
            None => self.year = self.start_year,
            Some(prev) if period == 1 && prev > period => self.year += 1,
            _ => {}
        }
        self.previous = Some(period);
        Some(self.year)
    }
}

/// Date of one time step, given its year and `MON` value.
pub fn period_date(interval: OutputInterval, year: i32, period: i32) -> Result<NaiveDate> {
    let date = match interval {
        OutputInterval::Yearly => NaiveDate::from_ymd_opt(period, 1, 1),
        OutputInterval::Monthly => NaiveDate::from_ymd_opt(year, period as u32, 1),
        OutputInterval::Daily => NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|jan1| jan1.checked_add_days(Days::new((period - 1).max(0) as u64))),
    };
    date.ok_or_else(|| ExtractError::InvalidDate(format!("year {year}, period {period}")))
}

/// Adds the calendar column to an extracted table.
#[derive(Debug, Clone, Copy)]
pub struct DateReconstructor {
    interval: OutputInterval,
    start_year: i32,
}

impl DateReconstructor {
    /// `start_year` is the year of the first row of the tables this will be applied to.
    pub fn new(interval: OutputInterval, start_year: i32) -> Self {
        DateReconstructor {
            interval,
            start_year,
        }
    }

    pub fn apply(&self, table: &mut ResultTable) -> Result<()> {
        let mut tracker = PeriodTracker::new(self.interval, self.start_year);
        for row in &mut table.rows {
            row.date = match row.period {
                PeriodKey::Mon(period) => match tracker.advance(period) {
                    Some(year) => Some(period_date(self.interval, year, period)?),
                    None => None,
                },
                PeriodKey::Ymd { year, month, day } => {
                    let date = NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1));
                    Some(date.ok_or_else(|| {
                        ExtractError::InvalidDate(format!("{year}-{month:?}-{day:?}"))
                    })?)
                }
            };
        }
        table.has_calendar = true;
        Ok(())
    }

    /// Dates for a bare sequence of `MON` values.
    pub fn dates_for_periods(&self, periods: &[i32]) -> Result<Vec<Option<NaiveDate>>> {
        let mut tracker = PeriodTracker::new(self.interval, self.start_year);
        periods
            .iter()
            .map(|&period| match tracker.advance(period) {
                Some(year) => period_date(self.interval, year, period).map(Some),
                None => Ok(None),
            })
            .collect()
    }
}
