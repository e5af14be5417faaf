//! Trim database values to the precision SWAT wrote to its text files.
//!
//! Text output goes through Fortran edit descriptors, so a value read back from
//! `output.hru` only keeps three decimals (f10.3) or a few significant digits
//! (e10.3, e10.5, e12.4). Values stored in SQLite keep full precision. Passing them
//! through the same notation makes both backends comparable value by value.
//!
//! Subbasin: f10.3 for the first 18 variables on monthly/yearly output (e10.3 on
//! daily), then one e10.5 and e10.3 for the rest.
//! HRU: f10.3 for the first 66 variables, two e10.5, eight e10.3, f10.3 for the rest.
//! Reach and reservoir: e12.4 throughout.

use crate::catalog;
use crate::config::{OutputInterval, UnitType};
use crate::error::{ExtractError, Result};
use crate::io::results::ResultTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// f10.3
    Decimal3,
    /// e10.3, three significant digits
    Scientific3,
    /// e12.4, four significant digits
    Scientific4,
    /// e10.5, five significant digits
    Scientific5,
}

impl Notation {
    pub fn format(self, value: f64) -> String {
        match self {
            Notation::Decimal3 => format!("{value:.3}"),
            Notation::Scientific3 => format!("{value:.2e}"),
            Notation::Scientific4 => format!("{value:.3e}"),
            Notation::Scientific5 => format!("{value:.4e}"),
        }
    }

    /// Round-trip `value` through the notation.
    pub fn normalize(self, value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        self.format(value).parse().unwrap_or(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AccuracyNormalizer {
    interval: OutputInterval,
}

impl AccuracyNormalizer {
    pub fn new(interval: OutputInterval) -> Self {
        AccuracyNormalizer { interval }
    }

    pub fn notation(&self, unit: UnitType, column: &str) -> Result<Notation> {
        let index = match unit {
            UnitType::Water => {
                return Err(ExtractError::UnsupportedUnit {
                    backend: "Accuracy normalizer",
                    unit,
                });
            }
            _ => catalog::resolve(unit, column)?.index,
        };

        let notation = match unit {
            UnitType::Subbasin => match index {
                0..=17 if self.interval == OutputInterval::Daily => Notation::Scientific3,
                0..=17 => Notation::Decimal3,
                18 => Notation::Scientific5,
                _ => Notation::Scientific3,
            },
            UnitType::Hru => match index {
                0..=65 => Notation::Decimal3,
                66..=67 => Notation::Scientific5,
                68..=75 => Notation::Scientific3,
                _ => Notation::Decimal3,
            },
            _ => Notation::Scientific4,
        };
        Ok(notation)
    }

    pub fn normalize(&self, unit: UnitType, column: &str, value: f64) -> Result<f64> {
        Ok(self.notation(unit, column)?.normalize(value))
    }

    pub fn apply(&self, table: &mut ResultTable) -> Result<()> {
        let notation = self.notation(table.unit, &table.column)?;
        for row in &mut table.rows {
            row.value = notation.normalize(row.value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hru_breakpoints() {
        let n = AccuracyNormalizer::new(OutputInterval::Monthly);
        assert_eq!(n.notation(UnitType::Hru, "ETmm").unwrap(), Notation::Decimal3);
        assert_eq!(n.notation(UnitType::Hru, "YLDt_ha").unwrap(), Notation::Decimal3);
        assert_eq!(n.notation(UnitType::Hru, "BACTPct").unwrap(), Notation::Scientific5);
        assert_eq!(n.notation(UnitType::Hru, "BACTLPct").unwrap(), Notation::Scientific5);
        assert_eq!(n.notation(UnitType::Hru, "WTAB_CLIm").unwrap(), Notation::Scientific3);
        assert_eq!(n.notation(UnitType::Hru, "LNO3kg_ha").unwrap(), Notation::Scientific3);
        assert_eq!(n.notation(UnitType::Hru, "GW_Q_Dmm").unwrap(), Notation::Decimal3);
    }

    #[test]
    fn subbasin_depends_on_interval() {
        let monthly = AccuracyNormalizer::new(OutputInterval::Monthly);
        let daily = AccuracyNormalizer::new(OutputInterval::Daily);
        assert_eq!(monthly.notation(UnitType::Subbasin, "ETmm").unwrap(), Notation::Decimal3);
        assert_eq!(daily.notation(UnitType::Subbasin, "ETmm").unwrap(), Notation::Scientific3);
        assert_eq!(
            monthly.notation(UnitType::Subbasin, "CHOLAmic_L").unwrap(),
            Notation::Scientific5
        );
        assert_eq!(
            monthly.notation(UnitType::Subbasin, "TNO3kg_ha").unwrap(),
            Notation::Scientific3
        );
    }

    #[test]
    fn reach_and_reservoir_use_e12_4() {
        let n = AccuracyNormalizer::new(OutputInterval::Yearly);
        assert_eq!(n.notation(UnitType::Reach, "FLOW_OUTcms").unwrap(), Notation::Scientific4);
        assert_eq!(n.notation(UnitType::Reservoir, "VOLUMEm3").unwrap(), Notation::Scientific4);
    }

    #[test]
    fn round_trip_trims_precision() {
        assert_eq!(Notation::Decimal3.normalize(12.345678), 12.346);
        assert_eq!(Notation::Scientific3.normalize(123456.0), 123000.0);
        assert_eq!(Notation::Scientific4.normalize(0.000123456), 0.0001235);
        assert_eq!(Notation::Scientific5.normalize(98765.4321), 98765.0);
    }

    #[test]
    fn water_is_rejected() {
        let n = AccuracyNormalizer::new(OutputInterval::Daily);
        assert!(matches!(
            n.normalize(UnitType::Water, "ETmm", 1.0),
            Err(ExtractError::UnsupportedUnit { .. })
        ));
    }
}
