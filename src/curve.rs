//! Curve configuration: sampling times, presets and test mode flags

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::reference::{ResolvedRanges, SeriesKind};
use crate::units::TimePoint;

/// Number of points a custom curve may have
pub const MIN_CUSTOM_POINTS: usize = 2;
pub const MAX_CUSTOM_POINTS: usize = 10;

/// Insulin times used when combined mode is switched on with nothing to copy
pub const DEFAULT_INSULIN_TIMES: [u16; 5] = [0, 30, 60, 90, 120];

/// A named sampling schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub times: &'static [u16],
    pub pregnant: bool,
    pub custom: bool,
}

impl Preset {
    pub fn times(&self) -> Vec<TimePoint> {
        self.times.iter().map(|&t| TimePoint(t)).collect()
    }

    pub fn points_label(&self) -> String {
        if self.custom {
            "? points".to_string()
        } else {
            format!("{} points", self.times.len())
        }
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        id: "glyc3",
        name: "Glycemic curve, 3 points",
        description: "Standard OGTT 75g (basal, 60', 120')",
        times: &[0, 60, 120],
        pregnant: false,
        custom: false,
    },
    Preset {
        id: "glyc4",
        name: "Glycemic curve, 4 points",
        description: "Basal, 30', 60', 120'",
        times: &[0, 30, 60, 120],
        pregnant: false,
        custom: false,
    },
    Preset {
        id: "glyc5",
        name: "Glycemic curve, 5 points",
        description: "Basal, 30', 60', 90', 120'",
        times: &[0, 30, 60, 90, 120],
        pregnant: false,
        custom: false,
    },
    Preset {
        id: "glyc6",
        name: "Glycemic curve, 6 points",
        description: "Basal, 30', 60', 90', 120', 180'",
        times: &[0, 30, 60, 90, 120, 180],
        pregnant: false,
        custom: false,
    },
    Preset {
        id: "glyc_preg",
        name: "Glycemic curve, pregnancy",
        description: "OGTT 75g, IADPSG / ADA 2026 criteria",
        times: &[0, 60, 120],
        pregnant: true,
        custom: false,
    },
    Preset {
        id: "custom",
        name: "Custom curve",
        description: "Choose number of points and times",
        times: &[],
        pregnant: false,
        custom: true,
    },
];

pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Parse a comma separated list of minutes into a custom schedule.
///
/// Non-numeric tokens are dropped, values are clamped to [0, 480], then
/// sorted and deduplicated. The result must hold 2 to 10 points.
pub fn parse_times(input: &str) -> Result<Vec<TimePoint>, ReportError> {
    let mut times: Vec<TimePoint> = input
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .map(TimePoint::clamped)
        .collect();
    times.sort_unstable();
    times.dedup();

    if times.len() < MIN_CUSTOM_POINTS || times.len() > MAX_CUSTOM_POINTS {
        return Err(ReportError::InvalidTimes(format!(
            "expected {} to {} distinct times, got {}",
            MIN_CUSTOM_POINTS,
            MAX_CUSTOM_POINTS,
            times.len()
        )));
    }
    Ok(times)
}

/// "0, 30, 60" rendering of a time list, as accepted by [`parse_times`]
pub fn format_times(times: &[TimePoint]) -> String {
    times.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

/// Which sampling times are in use and which criteria apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveConfig {
    pub glyc_times: Vec<TimePoint>,
    pub ins_times: Vec<TimePoint>,
    pub is_pregnant: bool,
    pub is_combined: bool,
}

impl CurveConfig {
    /// Apply a preset: glycemic times come from the preset, insulin times
    /// follow them in combined mode. A pregnancy preset switches pregnancy on.
    pub fn apply_preset(&mut self, preset: &Preset) {
        if preset.pregnant {
            self.is_pregnant = true;
        }
        self.glyc_times = preset.times();
        self.ins_times = if self.is_combined { self.glyc_times.clone() } else { Vec::new() };
        debug!("Applied preset {}: glycemic {:?}, insulin {:?}", preset.id, self.glyc_times, self.ins_times);
    }

    pub fn apply_preset_id(&mut self, id: &str) -> Result<&'static Preset, ReportError> {
        let preset = find_preset(id).ok_or_else(|| ReportError::UnknownPreset(id.to_string()))?;
        self.apply_preset(preset);
        Ok(preset)
    }

    /// Apply the free-text time fields. Blank fields leave the current list alone.
    pub fn apply_time_inputs(&mut self, glyc_input: &str, ins_input: &str) -> Result<(), ReportError> {
        if !glyc_input.trim().is_empty() {
            self.glyc_times = parse_times(glyc_input)?;
        }
        if !ins_input.trim().is_empty() {
            self.ins_times = parse_times(ins_input)?;
        }
        self.validate()
    }

    /// Turning combined mode on copies the glycemic schedule (or a default)
    /// when no insulin times exist; turning it off clears them.
    pub fn set_combined(&mut self, combined: bool) {
        self.is_combined = combined;
        if combined && self.ins_times.is_empty() {
            self.ins_times = if self.glyc_times.is_empty() {
                DEFAULT_INSULIN_TIMES.iter().map(|&t| TimePoint(t)).collect()
            } else {
                self.glyc_times.clone()
            };
        }
        if !combined {
            self.ins_times.clear();
        }
    }

    /// Pregnancy mode only changes which table the glycemic side reads;
    /// chosen times are kept.
    pub fn set_pregnant(&mut self, pregnant: bool) {
        self.is_pregnant = pregnant;
    }

    pub fn glycemic_series(&self) -> SeriesKind {
        if self.is_pregnant {
            SeriesKind::PregnantGlycemic
        } else {
            SeriesKind::GeneralGlycemic
        }
    }

    pub fn resolve_glycemic(&self) -> ResolvedRanges {
        ResolvedRanges::resolve(self.glycemic_series().series(), &self.glyc_times)
    }

    pub fn resolve_insulin(&self) -> ResolvedRanges {
        ResolvedRanges::resolve(SeriesKind::Insulin.series(), &self.ins_times)
    }

    pub fn has_glycemia(&self) -> bool {
        !self.glyc_times.is_empty()
    }

    pub fn has_insulin(&self) -> bool {
        !self.ins_times.is_empty()
    }

    /// At least one schedule, each strictly increasing
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.glyc_times.is_empty() && self.ins_times.is_empty() {
            return Err(ReportError::EmptyCurve);
        }
        for (label, times) in [("glycemic", &self.glyc_times), ("insulin", &self.ins_times)] {
            if !times.windows(2).all(|w| w[0] < w[1]) {
                return Err(ReportError::InvalidTimes(format!(
                    "{} times must be strictly increasing",
                    label
                )));
            }
        }
        Ok(())
    }
}
