//! Extraction of SWAT model results from text output files and SWAT-SQLite
//! result databases, with cross-backend validation and timing.

pub mod accuracy;
pub mod cached;
pub mod catalog;
pub mod config;
pub mod dates;
pub mod error;
pub mod extract;
pub mod harness;
pub mod io;
pub mod settings;
pub mod sqlite;
pub mod validation;

pub use error::{ExtractError, Result};
pub use extract::{ExtractRequest, ExtractTiming, Extractor, YearRange};
