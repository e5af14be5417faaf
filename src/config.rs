use clap::ValueEnum;
use std::fmt;

// Spatial unit of a SWAT output file / result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum UnitType {
    Subbasin,
    Reach,
    Hru,
    Reservoir,
    Water,
}

impl UnitType {
    pub const ALL: [UnitType; 5] = [
        UnitType::Subbasin,
        UnitType::Reach,
        UnitType::Hru,
        UnitType::Reservoir,
        UnitType::Water,
    ];

    /// Extension of the text output file, e.g. `output.hru`.
    pub fn file_extension(self) -> &'static str {
        match self {
            UnitType::Subbasin => "sub",
            UnitType::Reach => "rch",
            UnitType::Hru => "hru",
            UnitType::Reservoir => "rsv",
            UnitType::Water => "wtr",
        }
    }

    pub fn output_file_name(self) -> String {
        format!("output.{}", self.file_extension())
    }

    /// (byte offset, width) of the unit id in a text output line.
    pub fn id_field(self) -> (usize, usize) {
        match self {
            UnitType::Hru => (4, 5),
            UnitType::Subbasin => (6, 4),
            UnitType::Reach => (5, 5),
            UnitType::Reservoir => (3, 11),
            UnitType::Water => (4, 5),
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitType::Subbasin => "SUB",
            UnitType::Reach => "RCH",
            UnitType::Hru => "HRU",
            UnitType::Reservoir => "RSV",
            UnitType::Water => "WATER",
        };
        f.write_str(name)
    }
}

// Output time step written by the model (IPRINT in file.cio)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputInterval {
    Daily,
    Monthly,
    Yearly,
}

impl OutputInterval {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(OutputInterval::Daily),
            1 => Some(OutputInterval::Monthly),
            2 => Some(OutputInterval::Yearly),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            OutputInterval::Daily => 0,
            OutputInterval::Monthly => 1,
            OutputInterval::Yearly => 2,
        }
    }

    /// Largest valid value of the text `MON` column for this interval.
    /// Larger values mark summary rows embedded in the time series.
    pub fn max_period(self) -> Option<i32> {
        match self {
            OutputInterval::Daily => Some(366),
            OutputInterval::Monthly => Some(12),
            OutputInterval::Yearly => None,
        }
    }
}

impl fmt::Display for OutputInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputInterval::Daily => "daily",
            OutputInterval::Monthly => "monthly",
            OutputInterval::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

// Ways of reading SWAT results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DataReadingMethod {
    /// Query the SWAT-SQLite result database per request.
    Sqlite,
    /// Load the whole text output as a generic whitespace-delimited table.
    TextTable,
    /// Load the whole text output with the fixed-record schema.
    TextRecord,
}

impl DataReadingMethod {
    pub const ALL: [DataReadingMethod; 3] = [
        DataReadingMethod::Sqlite,
        DataReadingMethod::TextTable,
        DataReadingMethod::TextRecord,
    ];
}

impl fmt::Display for DataReadingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataReadingMethod::Sqlite => "SQLite",
            DataReadingMethod::TextTable => "TextTable",
            DataReadingMethod::TextRecord => "TextRecord",
        };
        f.write_str(name)
    }
}

// Configuration structure for SQLite result database naming
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    pub year: String,
    pub month: String,
    pub day: String,
    pub basin_table: String,
    pub basin_name: String,
    pub basin_value: String,
    pub start_year_key: String,
    pub end_year_key: String,
    pub interval_key: String,
    pub hru_info: String,
    pub sub_info: String,
    pub rsv_info: String,
}

impl ColumnConfig {
    pub fn new() -> Self {
        ColumnConfig {
            year: "YR".to_string(),
            month: "MO".to_string(),
            day: "DA".to_string(),
            basin_table: "ave_annual_basin".to_string(),
            basin_name: "NAME".to_string(),
            basin_value: "VALUE".to_string(),
            start_year_key: "START_YEAR_OUTPUT".to_string(),
            end_year_key: "END_YEAR".to_string(),
            interval_key: "OUTPUT_INTERVAL".to_string(),
            hru_info: "hru_info".to_string(),
            sub_info: "sub_info".to_string(),
            rsv_info: "rsv_info".to_string(),
        }
    }

    /// Date columns selected for the given interval, in table order.
    pub fn date_columns(&self, interval: OutputInterval) -> Vec<&str> {
        match interval {
            OutputInterval::Yearly => vec![self.year.as_str()],
            OutputInterval::Monthly => vec![self.year.as_str(), self.month.as_str()],
            OutputInterval::Daily => vec![
                self.year.as_str(),
                self.month.as_str(),
                self.day.as_str(),
            ],
        }
    }

    pub fn table_name(unit: UnitType) -> &'static str {
        match unit {
            UnitType::Hru => "hru",
            UnitType::Reach => "rch",
            UnitType::Reservoir => "rsv",
            UnitType::Subbasin => "sub",
            UnitType::Water => "wtr",
        }
    }

    // Reservoir ids live in `res`, not in a column named after the table.
    pub fn id_column(unit: UnitType) -> &'static str {
        match unit {
            UnitType::Hru => "hru",
            UnitType::Reach => "rch",
            UnitType::Reservoir => "res",
            UnitType::Subbasin => "sub",
            UnitType::Water => "wtr",
        }
    }

    pub fn database_name(interval: OutputInterval) -> &'static str {
        match interval {
            OutputInterval::Daily => "result_627_daily.db3",
            OutputInterval::Monthly => "result_627_monthly.db3",
            OutputInterval::Yearly => "result_627_yearly.db3",
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Whether the harness queries the full simulation at once or year by year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    AllYears,
    EachYear,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::AllYears => f.write_str("all_year"),
            QueryMode::EachYear => f.write_str("each_year"),
        }
    }
}

/// Caps on the performance grid. The number of extractions per method is at most
/// `max_ids * max_columns * max_years`.
#[derive(Debug, Clone, Copy)]
pub struct HarnessLimits {
    pub max_ids: u32,
    pub max_columns: usize,
    pub max_years: i32,
}

impl Default for HarnessLimits {
    fn default() -> Self {
        HarnessLimits {
            max_ids: 10,
            max_columns: 20,
            max_years: 10,
        }
    }
}
