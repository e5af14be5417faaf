//! Line parsers for SWAT text output files.
//!
//! Two strategies are supported. [`RecordSchema`] is a declarative table of
//! fixed-offset fields (name, offset, width, converter) with one generic parser
//! for every unit type; empty value fields read as zero. [`TabularLayout`] treats
//! the value region as a whitespace-delimited table and takes the key fields
//! from their fixed slices.

use std::path::Path;

use crate::catalog;
use crate::config::UnitType;
use crate::error::{ExtractError, Result};

/// Number of header lines at the top of every output file.
pub const HEADER_LINES: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Kept as text and ignored by the extractors.
    Text,
    /// Integer; a float-formatted integer such as `10.0` is truncated.
    Int,
    /// Float; an empty field reads as 0.
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Label,
    Id,
    Period,
    Area,
    /// Output variable at this catalog index.
    Value(usize),
    Trailer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub role: FieldRole,
    pub converter: Converter,
}

/// A parsed output line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub id: u32,
    pub period: i32,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct RecordSchema {
    unit: UnitType,
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    fn builder(unit: UnitType) -> SchemaBuilder {
        SchemaBuilder {
            unit,
            offset: 0,
            fields: Vec::new(),
        }
    }

    pub fn for_unit(unit: UnitType) -> Result<Self> {
        let unsupported = ExtractError::UnsupportedUnit {
            backend: "Fixed-record parser",
            unit,
        };
        let Some(names) = catalog::sqlite_columns(unit) else {
            return Err(unsupported);
        };

        let schema = match unit {
            UnitType::Hru => Self::builder(unit)
                .field("LULC", 4, FieldRole::Label, Converter::Text)
                .field("HRU", 5, FieldRole::Id, Converter::Int)
                .field("HRUGIS", 10, FieldRole::Label, Converter::Text)
                .field("SUB", 5, FieldRole::Label, Converter::Int)
                .field("MGT", 5, FieldRole::Label, Converter::Int)
                .field("MON", 5, FieldRole::Period, Converter::Int)
                .field("AREAkm2", 10, FieldRole::Area, Converter::Float)
                .values(names, |i| if i == 66 || i == 67 { 11 } else { 10 })
                .build(),
            UnitType::Subbasin => Self::builder(unit)
                .field("NOUSE", 6, FieldRole::Label, Converter::Text)
                .field("SUB", 4, FieldRole::Id, Converter::Int)
                .field("GIS", 10, FieldRole::Label, Converter::Text)
                .field("MON", 4, FieldRole::Period, Converter::Int)
                .field("AREAkm2", 10, FieldRole::Area, Converter::Float)
                .values(names, |i| if i == 18 { 11 } else { 10 })
                .field("SUB2", 6, FieldRole::Trailer, Converter::Text)
                .build(),
            UnitType::Reach => Self::builder(unit)
                .field("NOUSE", 5, FieldRole::Label, Converter::Text)
                .field("RCH", 5, FieldRole::Id, Converter::Int)
                .field("GIS", 9, FieldRole::Label, Converter::Text)
                .field("MON", 6, FieldRole::Period, Converter::Int)
                .field("AREAkm2", 12, FieldRole::Area, Converter::Float)
                .values(names, |_| 12)
                .field("RCH2", 6, FieldRole::Trailer, Converter::Text)
                .build(),
            UnitType::Reservoir => Self::builder(unit)
                .field("NOUSE", 3, FieldRole::Label, Converter::Text)
                .field("RSV", 11, FieldRole::Id, Converter::Int)
                .field("MON", 5, FieldRole::Period, Converter::Int)
                .values(names, |_| 12)
                .field("YEAR", 5, FieldRole::Trailer, Converter::Text)
                .build(),
            UnitType::Water => return Err(unsupported),
        };
        Ok(schema)
    }

    pub fn unit(&self) -> UnitType {
        self.unit
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, role: FieldRole) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.role == role)
    }

    pub fn value_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f.role, FieldRole::Value(_)))
            .count()
    }

    pub fn parse_line(&self, line: &str, path: &Path, line_no: usize) -> Result<ParsedRecord> {
        let mut id = None;
        let mut period = None;
        let mut values = vec![0.0; self.value_count()];

        for field in &self.fields {
            let raw = slice(line, field.offset, field.width);
            match (field.role, field.converter) {
                (FieldRole::Id, _) => id = Some(parse_int(raw, field.name, path, line_no)?),
                (FieldRole::Period, _) => {
                    period = Some(parse_int(raw, field.name, path, line_no)?)
                }
                (FieldRole::Value(index), Converter::Float) => {
                    values[index] = parse_float(raw, field.name, path, line_no)?
                }
                _ => {}
            }
        }

        match (id, period) {
            (Some(id), Some(period)) => Ok(ParsedRecord {
                id: to_id(id, path, line_no)?,
                period: period as i32,
                values,
            }),
            _ => Err(format_error(path, line_no, "record has no id or period field")),
        }
    }
}

struct SchemaBuilder {
    unit: UnitType,
    offset: usize,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    fn field(mut self, name: &'static str, width: usize, role: FieldRole, converter: Converter) -> Self {
        self.fields.push(FieldSpec {
            name,
            offset: self.offset,
            width,
            role,
            converter,
        });
        self.offset += width;
        self
    }

    fn values(mut self, names: &'static [&'static str], width: impl Fn(usize) -> usize) -> Self {
        for (index, name) in names.iter().enumerate() {
            self = self.field(*name, width(index), FieldRole::Value(index), Converter::Float);
        }
        self
    }

    fn build(self) -> RecordSchema {
        RecordSchema {
            unit: self.unit,
            fields: self.fields,
        }
    }
}

/// Whitespace-delimited view of the value region of an output line.
///
/// The id and MON fields are read from their fixed slices: label and id touch
/// once ids fill their width (`BIGSUB1000`, `AGRL10000`), so only the values
/// after the key fields are split on whitespace.
#[derive(Debug, Clone, Copy)]
pub struct TabularLayout {
    pub unit: UnitType,
    pub id_field: (usize, usize),
    pub period_field: (usize, usize),
    pub values_offset: usize,
    pub value_count: usize,
}

impl TabularLayout {
    pub fn for_unit(unit: UnitType) -> Result<Self> {
        let schema = RecordSchema::for_unit(unit).map_err(|_| ExtractError::UnsupportedUnit {
            backend: "Tabular parser",
            unit,
        })?;
        let span = |role| {
            schema
                .field(role)
                .map(|f| (f.offset, f.width))
                .ok_or(ExtractError::UnsupportedUnit {
                    backend: "Tabular parser",
                    unit,
                })
        };
        let id_field = span(FieldRole::Id)?;
        let period_field = span(FieldRole::Period)?;
        let (values_offset, _) = span(FieldRole::Value(0))?;

        Ok(TabularLayout {
            unit,
            id_field,
            period_field,
            values_offset,
            value_count: schema.value_count(),
        })
    }

    pub fn parse_line(&self, line: &str, path: &Path, line_no: usize) -> Result<ParsedRecord> {
        let (offset, width) = self.id_field;
        let id = parse_int(slice(line, offset, width), "id", path, line_no)?;
        let (offset, width) = self.period_field;
        let period = parse_int(slice(line, offset, width), "MON", path, line_no)?;

        let region = line.get(self.values_offset.min(line.len())..).unwrap_or("");
        let tokens: Vec<&str> = region.split_whitespace().collect();
        if tokens.len() < self.value_count {
            return Err(format_error(
                path,
                line_no,
                &format!(
                    "expected at least {} values, found {}",
                    self.value_count,
                    tokens.len()
                ),
            ));
        }

        let values = tokens[..self.value_count]
            .iter()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| format_error(path, line_no, &format!("invalid number '{t}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ParsedRecord {
            id: to_id(id, path, line_no)?,
            period: period as i32,
            values,
        })
    }
}

// Closed set of line parsers used by the whole-table cache
#[derive(Debug, Clone)]
pub enum LineParser {
    Record(RecordSchema),
    Tabular(TabularLayout),
}

impl LineParser {
    pub fn parse_line(&self, line: &str, path: &Path, line_no: usize) -> Result<ParsedRecord> {
        match self {
            LineParser::Record(schema) => schema.parse_line(line, path, line_no),
            LineParser::Tabular(layout) => layout.parse_line(line, path, line_no),
        }
    }
}

/// Byte slice of a fixed-width field, clamped to the line length.
pub fn slice(line: &str, offset: usize, width: usize) -> &str {
    let len = line.len();
    line.get(offset.min(len)..(offset + width).min(len))
        .unwrap_or("")
}

fn parse_int(raw: &str, name: &str, path: &Path, line_no: usize) -> Result<i64> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|v| v.trunc() as i64))
        .ok_or_else(|| format_error(path, line_no, &format!("invalid {name} '{trimmed}'")))
}

fn parse_float(raw: &str, name: &str, path: &Path, line_no: usize) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| format_error(path, line_no, &format!("invalid {name} '{trimmed}'")))
}

fn to_id(id: i64, path: &Path, line_no: usize) -> Result<u32> {
    u32::try_from(id).map_err(|_| format_error(path, line_no, &format!("invalid id {id}")))
}

fn format_error(path: &Path, line: usize, reason: &str) -> ExtractError {
    ExtractError::Format {
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    }
}
