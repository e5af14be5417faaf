use chrono::NaiveDate;

use crate::config::{OutputInterval, UnitType};

// Interval-native date parts of a row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeriodKey {
    /// `MON` field of text output: Julian day, month or year depending on interval.
    Mon(i32),
    /// `YR`/`MO`/`DA` columns of the result database.
    Ymd {
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
    },
}

// One extracted time step
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Only filled when all ids were requested.
    pub id: Option<u32>,
    pub period: PeriodKey,
    pub value: f64,
    pub date: Option<NaiveDate>,
}

// Structure returned by every extractor
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub unit: UnitType,
    pub interval: OutputInterval,
    pub column: String,
    pub has_calendar: bool,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(unit: UnitType, interval: OutputInterval, column: &str) -> Self {
        ResultTable {
            unit,
            interval,
            column: column.to_string(),
            has_calendar: false,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, id: Option<u32>, period: PeriodKey, value: f64) {
        self.rows.push(ResultRow {
            id,
            period,
            value,
            date: None,
        });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_ids(&self) -> bool {
        self.rows.iter().any(|r| r.id.is_some())
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.value).collect()
    }

    /// Header of the date-part columns, matching the backend the rows came from.
    pub fn period_headers(&self) -> Vec<&'static str> {
        match self.rows.first().map(|r| r.period) {
            Some(PeriodKey::Ymd { .. }) => match self.interval {
                OutputInterval::Yearly => vec!["YR"],
                OutputInterval::Monthly => vec!["YR", "MO"],
                OutputInterval::Daily => vec!["YR", "MO", "DA"],
            },
            _ => vec!["MON"],
        }
    }
}
