use clap::{Parser, Subcommand};
use std::path::PathBuf;

use swat_extract::config::{DataReadingMethod, UnitType};
use swat_extract::extract::YearRange;

/// Extract, validate and benchmark SWAT model results
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// TxtInOut folder with file.cio, the output files and the result databases
    pub txtinout: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Time every reading method over subbasin, reach and HRU output
    Bench {
        /// Query one year at a time instead of the whole simulation
        #[arg(long)]
        each_year: bool,

        /// Folder receiving extract_test/
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Compare the result database with the text output
    Validate {
        /// Compare whole columns row by row instead of per-id series joined on date
        #[arg(long)]
        reconcile: bool,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Print one extracted series as CSV
    Extract {
        #[arg(short, long, value_enum)]
        unit: UnitType,

        /// SQLite column name or text label
        #[arg(short, long)]
        column: String,

        /// Unit id, all units when omitted
        #[arg(short, long)]
        id: Option<u32>,

        #[arg(long, conflicts_with_all = ["from", "to"])]
        year: Option<i32>,

        #[arg(long)]
        from: Option<i32>,

        #[arg(long)]
        to: Option<i32>,

        #[arg(short, long, value_enum, default_value_t = DataReadingMethod::Sqlite)]
        method: DataReadingMethod,

        /// Add a reconstructed calendar date column
        #[arg(long)]
        calendar: bool,

        /// Round values to the precision of the text output
        #[arg(long)]
        adjust_accuracy: bool,
    },
}

pub fn get_args() -> Args {
    Args::parse()
}

/// Year selection of the extract command. Open ends run to the simulation bounds.
pub fn year_range(year: Option<i32>, from: Option<i32>, to: Option<i32>) -> YearRange {
    match (year, from, to) {
        (Some(year), _, _) => YearRange::Single(year),
        (None, None, None) => YearRange::All,
        (None, from, to) => YearRange::Span {
            start: from.unwrap_or(i32::MIN),
            end: to.unwrap_or(i32::MAX),
        },
    }
}
