//! Sampling times, analytes and display units
//!
//! Thresholds are fixed in one canonical unit per analyte (mg/dL for glucose,
//! µUI/mL for insulin). The alternative units here are display labels only:
//! values are never converted, the label just follows the user's lab sheet.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound for a sampling time, in minutes
pub const MAX_TIME_MINUTES: u16 = 480;

/// Offset in minutes from the start of the test (0 = basal sample)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(pub u16);

impl TimePoint {
    pub const BASAL: TimePoint = TimePoint(0);
    pub const ONE_HOUR: TimePoint = TimePoint(60);
    pub const TWO_HOURS: TimePoint = TimePoint(120);

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Clamp into the supported [0, 480] minute window
    pub fn clamped(minutes: i64) -> Self {
        TimePoint(minutes.clamp(0, MAX_TIME_MINUTES as i64) as u16)
    }

    /// Short label used in tables and charts: "Basal" or "60'"
    pub fn label(self) -> String {
        if self.0 == 0 {
            "Basal".to_string()
        } else {
            format!("{}'", self.0)
        }
    }

    /// Longer label used on the data entry form
    pub fn entry_label(self) -> String {
        if self.0 == 0 {
            "Basal (T0)".to_string()
        } else {
            format!("T{}' ({} min)", self.0, self.0)
        }
    }
}

impl From<u16> for TimePoint {
    fn from(value: u16) -> Self {
        TimePoint(value)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two measured series of a tolerance test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Analyte {
    Glycemia,
    Insulin,
}

impl Analyte {
    pub fn label(self) -> &'static str {
        match self {
            Analyte::Glycemia => "Glycemia",
            Analyte::Insulin => "Insulinemia",
        }
    }

    /// Section heading used by tables and the PDF
    pub fn curve_title(self) -> &'static str {
        match self {
            Analyte::Glycemia => "GLYCEMIC CURVE",
            Analyte::Insulin => "INSULIN CURVE",
        }
    }

    /// Unit the diagnostic thresholds are expressed in
    pub fn canonical_unit(self) -> &'static str {
        match self {
            Analyte::Glycemia => GlycemiaUnit::MgDl.label(),
            Analyte::Insulin => InsulinUnit::MicroUnitsPerMl.label(),
        }
    }
}

/// Display unit for glucose values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GlycemiaUnit {
    #[serde(rename = "mg/dL")]
    #[default]
    MgDl,
    #[serde(rename = "mmol/L")]
    MmolL,
}

impl GlycemiaUnit {
    pub fn label(self) -> &'static str {
        match self {
            GlycemiaUnit::MgDl => "mg/dL",
            GlycemiaUnit::MmolL => "mmol/L",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mg/dl" | "mgdl" => Some(GlycemiaUnit::MgDl),
            "mmol/l" | "mmoll" => Some(GlycemiaUnit::MmolL),
            _ => None,
        }
    }

    pub fn all() -> [GlycemiaUnit; 2] {
        [GlycemiaUnit::MgDl, GlycemiaUnit::MmolL]
    }
}

/// Display unit for insulin values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InsulinUnit {
    #[serde(rename = "µUI/mL")]
    #[default]
    MicroUnitsPerMl,
    #[serde(rename = "pmol/L")]
    PmolL,
}

impl InsulinUnit {
    pub fn label(self) -> &'static str {
        match self {
            InsulinUnit::MicroUnitsPerMl => "µUI/mL",
            InsulinUnit::PmolL => "pmol/L",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "µui/ml" | "uui/ml" | "uiu/ml" | "µiu/ml" => Some(InsulinUnit::MicroUnitsPerMl),
            "pmol/l" | "pmoll" => Some(InsulinUnit::PmolL),
            _ => None,
        }
    }

    pub fn all() -> [InsulinUnit; 2] {
        [InsulinUnit::MicroUnitsPerMl, InsulinUnit::PmolL]
    }
}

/// Format a measured value without trailing zeros ("105", "12.5")
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
