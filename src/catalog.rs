//! Column catalog for SWAT output.
//!
//! Every unit type has two parallel column lists: the fixed-width labels printed in
//! the text output files (padded to the field width, units embedded) and the
//! identifiers used by the SWAT-SQLite result tables. Position N in one list is the
//! same variable as position N in the other.

use crate::config::UnitType;
use crate::error::{ExtractError, Result};

const HRU_TEXT: [&str; 78] = [
    "  PRECIPmm", " SNOFALLmm", " SNOMELTmm", "     IRRmm",
    "     PETmm", "      ETmm", " SW_INITmm", "  SW_ENDmm",
    "    PERCmm", " GW_RCHGmm", " DA_RCHGmm", "   REVAPmm",
    "  SA_IRRmm", "  DA_IRRmm", "   SA_STmm", "   DA_STmm",
    "SURQ_GENmm", "SURQ_CNTmm", "   TLOSSmm", " LATQGENmm",
    "    GW_Qmm", "    WYLDmm", "   DAILYCN", " TMP_AVdgC",
    " TMP_MXdgC", " TMP_MNdgC", "SOL_TMPdgC", "SOLARMJ/m2",
    "  SYLDt/ha", "  USLEt/ha", "N_APPkg/ha", "P_APPkg/ha",
    "NAUTOkg/ha", "PAUTOkg/ha", " NGRZkg/ha", " PGRZkg/ha",
    "NCFRTkg/ha", "PCFRTkg/ha", "NRAINkg/ha", " NFIXkg/ha",
    " F-MNkg/ha", " A-MNkg/ha", " A-SNkg/ha", " F-MPkg/ha",
    "AO-LPkg/ha", " L-APkg/ha", " A-SPkg/ha", " DNITkg/ha",
    "  NUPkg/ha", "  PUPkg/ha", " ORGNkg/ha", " ORGPkg/ha",
    " SEDPkg/ha", "NSURQkg/ha", "NLATQkg/ha", " NO3Lkg/ha",
    "NO3GWkg/ha", " SOLPkg/ha", " P_GWkg/ha", "    W_STRS",
    "  TMP_STRS", "    N_STRS", "    P_STRS", "  BIOMt/ha",
    "       LAI", "   YLDt/ha", "   BACTPct", "  BACTLPct",
    " WTAB CLIm", " WTAB SOLm", "     SNOmm", " CMUPkg/ha",
    "CMTOTkg/ha", "   QTILEmm", " TNO3kg/ha", " LNO3kg/ha",
    "  GW_Q_Dmm", " LATQCNTmm",
];

const SUB_TEXT: [&str; 22] = [
    "  PRECIPmm", " SNOMELTmm", "     PETmm", "      ETmm",
    "      SWmm", "    PERCmm", "    SURQmm", "    GW_Qmm",
    "    WYLDmm", "  SYLDt/ha", " ORGNkg/ha", " ORGPkg/ha",
    "NSURQkg/ha", " SOLPkg/ha", " SEDPkg/ha", " LAT Q(mm)",
    "LATNO3kg/h", "GWNO3kg/ha", "CHOLAmic/L", "CBODU mg/L",
    " DOXQ mg/L", " TNO3kg/ha",
];

const RCH_TEXT: [&str; 46] = [
    "  FLOW_INcms", " FLOW_OUTcms", "     EVAPcms",
    "    TLOSScms", "  SED_INtons", " SED_OUTtons",
    "SEDCONCmg/kg", "   ORGN_INkg", "  ORGN_OUTkg",
    "   ORGP_INkg", "  ORGP_OUTkg", "    NO3_INkg",
    "   NO3_OUTkg", "    NH4_INkg", "   NH4_OUTkg",
    "    NO2_INkg", "   NO2_OUTkg", "   MINP_INkg",
    "  MINP_OUTkg", "   CHLA_INkg", "  CHLA_OUTkg",
    "   CBOD_INkg", "  CBOD_OUTkg", "  DISOX_INkg",
    " DISOX_OUTkg", " SOLPST_INmg", "SOLPST_OUTmg",
    " SORPST_INmg", "SORPST_OUTmg", "  REACTPSTmg",
    "    VOLPSTmg", "  SETTLPSTmg", "RESUSP_PSTmg",
    "DIFFUSEPSTmg", "REACBEDPSTmg", "   BURYPSTmg",
    "   BED_PSTmg", " BACTP_OUTct", "BACTLP_OUTct",
    "  CMETAL#1kg", "  CMETAL#2kg", "  CMETAL#3kg",
    "     TOT Nkg", "     TOT Pkg", " NO3ConcMg/l",
    "    WTMPdegc",
];

const RSV_TEXT: [&str; 41] = [
    "    VOLUMEm3", "  FLOW_INcms", " FLOW_OUTcms",
    "    PRECIPm3", "      EVAPm3", "   SEEPAGEm3",
    "  SED_INtons", " SED_OUTtons", " SED_CONCppm",
    "   ORGN_INkg", "  ORGN_OUTkg", " RES_ORGNppm",
    "   ORGP_INkg", "  ORGP_OUTkg", " RES_ORGPppm",
    "    NO3_INkg", "   NO3_OUTkg", "  RES_NO3ppm",
    "    NO2_INkg", "   NO2_OUTkg", "  RES_NO2ppm",
    "    NH3_INkg", "   NH3_OUTkg", "  RES_NH3ppm",
    "   MINP_INkg", "  MINP_OUTkg", " RES_MINPppm",
    "   CHLA_INkg", "  CHLA_OUTkg", "SECCHIDEPTHm",
    "   PEST_INmg", "  REACTPSTmg", "    VOLPSTmg",
    "  SETTLPSTmg", "RESUSP_PSTmg", "DIFFUSEPSTmg",
    "REACBEDPSTmg", "   BURYPSTmg", "  PEST_OUTmg",
    "PSTCNCWmg/m3", "PSTCNCBmg/m3",
];

const HRU_SQLITE: [&str; 78] = [
    "PRECIPmm", "SNOFALLmm", "SNOMELTmm", "IRRmm",
    "PETmm", "ETmm", "SW_INITmm", "SW_ENDmm",
    "PERCmm", "GW_RCHGmm", "DA_RCHGmm", "REVAPmm",
    "SA_IRRmm", "DA_IRRmm", "SA_STmm", "DA_STmm",
    "SURQ_GENmm", "SURQ_CNTmm", "TLOSSmm", "LATQGENmm",
    "GW_Qmm", "WYLDmm", "DAILYCN", "TMP_AVdgC",
    "TMP_MXdgC", "TMP_MNdgC", "SOL_TMPdgC", "SOLARMJ_m2",
    "SYLDt_ha", "USLEt_ha", "N_APPkg_ha", "P_APPkg_ha",
    "NAUTOkg_ha", "PAUTOkg_ha", "NGRZkg_ha", "PGRZkg_ha",
    "NCFRTkg_ha", "PCFRTkg_ha", "NRAINkg_ha", "NFIXkg_ha",
    "F_MNkg_ha", "A_MNkg_ha", "A_SNkg_ha", "F_MPkg_ha",
    "AO_LPkg_ha", "L_APkg_ha", "A_SPkg_ha", "DNITkg_ha",
    "NUPkg_ha", "PUPkg_ha", "ORGNkg_ha", "ORGPkg_ha",
    "SEDPkg_ha", "NSURQkg_ha", "NLATQkg_ha", "NO3Lkg_ha",
    "NO3GWkg_ha", "SOLPkg_ha", "P_GWkg_ha", "W_STRS",
    "TMP_STRS", "N_STRS", "P_STRS", "BIOMt_ha",
    "LAI", "YLDt_ha", "BACTPct", "BACTLPct",
    "WTAB_CLIm", "WTAB_SOLm", "SNOmm", "CMUPkg_ha",
    "CMTOTkg_ha", "QTILEmm", "TNO3kg_ha", "LNO3kg_ha",
    "GW_Q_Dmm", "LATQCNTmm",
];

const SUB_SQLITE: [&str; 22] = [
    "PRECIPmm", "SNOMELTmm", "PETmm", "ETmm",
    "SWmm", "PERCmm", "SURQmm", "GW_Qmm",
    "WYLDmm", "SYLDt_ha", "ORGNkg_ha", "ORGPkg_ha",
    "NSURQkg_ha", "SOLPkg_ha", "SEDPkg_ha", "LAT_Q_mm",
    "LATNO3kg_h", "GWNO3kg_ha", "CHOLAmic_L", "CBODU_mg_L",
    "DOXQ_mg_L", "TNO3kg_ha",
];

const RCH_SQLITE: [&str; 46] = [
    "FLOW_INcms", "FLOW_OUTcms", "EVAPcms",
    "TLOSScms", "SED_INtons", "SED_OUTtons",
    "SEDCONCmg_kg", "ORGN_INkg", "ORGN_OUTkg",
    "ORGP_INkg", "ORGP_OUTkg", "NO3_INkg",
    "NO3_OUTkg", "NH4_INkg", "NH4_OUTkg",
    "NO2_INkg", "NO2_OUTkg", "MINP_INkg",
    "MINP_OUTkg", "CHLA_INkg", "CHLA_OUTkg",
    "CBOD_INkg", "CBOD_OUTkg", "DISOX_INkg",
    "DISOX_OUTkg", "SOLPST_INmg", "SOLPST_OUTmg",
    "SORPST_INmg", "SORPST_OUTmg", "REACTPSTmg",
    "VOLPSTmg", "SETTLPSTmg", "RESUSP_PSTmg",
    "DIFFUSEPSTmg", "REACBEDPSTmg", "BURYPSTmg",
    "BED_PSTmg", "BACTP_OUTct", "BACTLP_OUTct",
    "CMETAL_1kg", "CMETAL_2kg", "CMETAL_3kg",
    "TOT_Nkg", "TOT_Pkg", "NO3ConcMg_l",
    "WTMPdegc",
];

const RSV_SQLITE: [&str; 41] = [
    "VOLUMEm3", "FLOW_INcms", "FLOW_OUTcms",
    "PRECIPm3", "EVAPm3", "SEEPAGEm3",
    "SED_INtons", "SED_OUTtons", "SED_CONCppm",
    "ORGN_INkg", "ORGN_OUTkg", "RES_ORGNppm",
    "ORGP_INkg", "ORGP_OUTkg", "RES_ORGPppm",
    "NO3_INkg", "NO3_OUTkg", "RES_NO3ppm",
    "NO2_INkg", "NO2_OUTkg", "RES_NO2ppm",
    "NH3_INkg", "NH3_OUTkg", "RES_NH3ppm",
    "MINP_INkg", "MINP_OUTkg", "RES_MINPppm",
    "CHLA_INkg", "CHLA_OUTkg", "SECCHIDEPTHm",
    "PEST_INmg", "REACTPSTmg", "VOLPSTmg",
    "SETTLPSTmg", "RESUSP_PSTmg", "DIFFUSEPSTmg",
    "REACBEDPSTmg", "BURYPSTmg", "PEST_OUTmg",
    "PSTCNCWmg_m3", "PSTCNCBmg_m3",
];

/// A column resolved against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub unit: UnitType,
    pub index: usize,
    pub text: &'static str,
    pub sqlite: &'static str,
}

impl ColumnDescriptor {
    /// Text label without the fixed-width padding.
    pub fn label(&self) -> &'static str {
        self.text.trim()
    }
}

pub fn text_columns(unit: UnitType) -> Option<&'static [&'static str]> {
    match unit {
        UnitType::Hru => Some(&HRU_TEXT),
        UnitType::Subbasin => Some(&SUB_TEXT),
        UnitType::Reach => Some(&RCH_TEXT),
        UnitType::Reservoir => Some(&RSV_TEXT),
        UnitType::Water => None,
    }
}

pub fn sqlite_columns(unit: UnitType) -> Option<&'static [&'static str]> {
    match unit {
        UnitType::Hru => Some(&HRU_SQLITE),
        UnitType::Subbasin => Some(&SUB_SQLITE),
        UnitType::Reach => Some(&RCH_SQLITE),
        UnitType::Reservoir => Some(&RSV_SQLITE),
        UnitType::Water => None,
    }
}

fn both_columns(unit: UnitType) -> Result<(&'static [&'static str], &'static [&'static str])> {
    match (text_columns(unit), sqlite_columns(unit)) {
        (Some(text), Some(sqlite)) => Ok((text, sqlite)),
        _ => Err(ExtractError::UnsupportedUnit {
            backend: "Column catalog",
            unit,
        }),
    }
}

pub fn column_count(unit: UnitType) -> usize {
    sqlite_columns(unit).map_or(0, |cols| cols.len())
}

pub fn descriptor(unit: UnitType, index: usize) -> Option<ColumnDescriptor> {
    let (text, sqlite) = both_columns(unit).ok()?;
    Some(ColumnDescriptor {
        unit,
        index,
        text: text.get(index).copied()?,
        sqlite: sqlite.get(index).copied()?,
    })
}

/// Look up a column by its SQLite identifier or by its text label (padding ignored).
pub fn resolve(unit: UnitType, name: &str) -> Result<ColumnDescriptor> {
    let (text, sqlite) = both_columns(unit)?;
    let wanted = name.trim();
    let index = sqlite
        .iter()
        .position(|c| *c == wanted)
        .or_else(|| text.iter().position(|c| c.trim() == wanted))
        .ok_or_else(|| ExtractError::UnknownColumn {
            unit,
            column: name.to_string(),
        })?;
    Ok(ColumnDescriptor {
        unit,
        index,
        text: text[index],
        sqlite: sqlite[index],
    })
}

/// Position of a SQLite column name within the unit's list.
pub fn sqlite_index(unit: UnitType, column: &str) -> Result<usize> {
    let (_, sqlite) = both_columns(unit)?;
    sqlite
        .iter()
        .position(|c| *c == column.trim())
        .ok_or_else(|| ExtractError::UnknownColumn {
            unit,
            column: column.to_string(),
        })
}

pub fn sqlite_to_text(unit: UnitType, column: &str) -> Result<&'static str> {
    let (text, _) = both_columns(unit)?;
    Ok(text[sqlite_index(unit, column)?])
}

pub fn text_to_sqlite(unit: UnitType, label: &str) -> Result<&'static str> {
    let (text, sqlite) = both_columns(unit)?;
    let index = text
        .iter()
        .position(|c| c.trim() == label.trim())
        .ok_or_else(|| ExtractError::UnknownColumn {
            unit,
            column: label.to_string(),
        })?;
    Ok(sqlite[index])
}
