//! Mutable editing session owned by the GUI
//!
//! The core functions are pure; this type holds the state a user edits
//! (configuration, raw text inputs, range overrides) and hands fresh
//! snapshots to them after every change.

use log::{debug, info};

use crate::classify::{status_rows, MeasurementSeries, StatusRow};
use crate::curve::{find_preset, CurveConfig, Preset};
use crate::diagnosis::{DiagnosticEngine, EvaluationOptions, Finding};
use crate::error::ReportError;
use crate::reference::{ReferenceRange, ResolvedRanges};
use crate::report::{ConfigSnapshot, PatientInfo, ReportRecord, ReportResults, DEFAULT_GLUCOSE_LOAD};
use crate::units::{Analyte, GlycemiaUnit, InsulinUnit, TimePoint};

#[derive(Debug, Clone)]
pub struct Session {
    pub patient: PatientInfo,
    pub glucose_load: u32,
    pub glyc_unit: GlycemiaUnit,
    pub ins_unit: InsulinUnit,
    pub options: EvaluationOptions,
    pub methodology: String,
    pub notes: String,
    preset_id: Option<String>,
    curve: CurveConfig,
    glyc_inputs: Vec<String>,
    ins_inputs: Vec<String>,
    glyc_ranges: ResolvedRanges,
    ins_ranges: ResolvedRanges,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            patient: PatientInfo::default(),
            glucose_load: DEFAULT_GLUCOSE_LOAD,
            glyc_unit: GlycemiaUnit::default(),
            ins_unit: InsulinUnit::default(),
            options: EvaluationOptions::default(),
            methodology: String::new(),
            notes: String::new(),
            preset_id: None,
            curve: CurveConfig::default(),
            glyc_inputs: Vec::new(),
            ins_inputs: Vec::new(),
            glyc_ranges: ResolvedRanges::default(),
            ins_ranges: ResolvedRanges::default(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn curve(&self) -> &CurveConfig {
        &self.curve
    }

    pub fn preset(&self) -> Option<&'static Preset> {
        self.preset_id.as_deref().and_then(find_preset)
    }

    pub fn preset_name(&self) -> String {
        self.preset()
            .map(|p| p.name.to_string())
            .unwrap_or_else(|| "Custom curve".to_string())
    }

    pub fn select_preset(&mut self, id: &str) -> Result<&'static Preset, ReportError> {
        let mut curve = self.curve.clone();
        let preset = curve.apply_preset_id(id)?;
        self.preset_id = Some(preset.id.to_string());
        self.replace_curve(curve);
        Ok(preset)
    }

    pub fn set_combined(&mut self, combined: bool) {
        let mut curve = self.curve.clone();
        curve.set_combined(combined);
        self.replace_curve(curve);
    }

    /// Swap the glycemic reference table, keeping times and values
    pub fn set_pregnant(&mut self, pregnant: bool) {
        self.curve.set_pregnant(pregnant);
        self.glyc_ranges = self.curve.resolve_glycemic();
    }

    pub fn apply_time_inputs(&mut self, glyc_input: &str, ins_input: &str) -> Result<(), ReportError> {
        let mut curve = self.curve.clone();
        curve.apply_time_inputs(glyc_input, ins_input)?;
        if !glyc_input.trim().is_empty() {
            self.preset_id = find_preset("custom").map(|p| p.id.to_string());
        }
        self.replace_curve(curve);
        Ok(())
    }

    /// Install a new configuration. Entered values follow their time point;
    /// ranges are re-resolved, dropping any override.
    fn replace_curve(&mut self, curve: CurveConfig) {
        self.glyc_inputs = realign(&self.curve.glyc_times, &curve.glyc_times, &self.glyc_inputs);
        self.ins_inputs = realign(&self.curve.ins_times, &curve.ins_times, &self.ins_inputs);
        self.curve = curve;
        self.reset_ranges();
    }

    pub fn reset_ranges(&mut self) {
        self.glyc_ranges = self.curve.resolve_glycemic();
        self.ins_ranges = self.curve.resolve_insulin();
        debug!(
            "Resolved ranges: {} glycemic, {} insulin",
            self.glyc_ranges.len(),
            self.ins_ranges.len()
        );
    }

    /// Override one resolved range. Returns false when the range is
    /// invalid or the time is not sampled.
    pub fn override_range(&mut self, analyte: Analyte, time: TimePoint, range: ReferenceRange) -> bool {
        match analyte {
            Analyte::Glycemia => self.glyc_ranges.set_override(time, range),
            Analyte::Insulin => self.ins_ranges.set_override(time, range),
        }
    }

    pub fn times(&self, analyte: Analyte) -> &[TimePoint] {
        match analyte {
            Analyte::Glycemia => &self.curve.glyc_times,
            Analyte::Insulin => &self.curve.ins_times,
        }
    }

    pub fn ranges(&self, analyte: Analyte) -> &ResolvedRanges {
        match analyte {
            Analyte::Glycemia => &self.glyc_ranges,
            Analyte::Insulin => &self.ins_ranges,
        }
    }

    pub fn inputs(&self, analyte: Analyte) -> &[String] {
        match analyte {
            Analyte::Glycemia => &self.glyc_inputs,
            Analyte::Insulin => &self.ins_inputs,
        }
    }

    pub fn inputs_mut(&mut self, analyte: Analyte) -> &mut Vec<String> {
        match analyte {
            Analyte::Glycemia => &mut self.glyc_inputs,
            Analyte::Insulin => &mut self.ins_inputs,
        }
    }

    pub fn values(&self, analyte: Analyte) -> MeasurementSeries {
        MeasurementSeries::from_inputs(self.inputs(analyte))
    }

    pub fn status_rows(&self, analyte: Analyte) -> Vec<StatusRow> {
        status_rows(self.times(analyte), &self.values(analyte), self.ranges(analyte))
    }

    pub fn findings(&self) -> Vec<Finding> {
        DiagnosticEngine::default().with_options(self.options).evaluate(
            &self.curve,
            &self.values(Analyte::Glycemia),
            &self.values(Analyte::Insulin),
            &self.glyc_ranges,
            &self.ins_ranges,
        )
    }

    /// Snapshot the session into an archivable record (id and timestamp
    /// are assigned by the archive)
    pub fn to_record(&self) -> Result<ReportRecord, ReportError> {
        self.curve.validate()?;
        Ok(ReportRecord {
            id: String::new(),
            created_at: String::new(),
            patient: self.patient.clone(),
            config: ConfigSnapshot {
                preset_id: self.preset_id.clone(),
                preset_name: self.preset_name(),
                curve: self.curve.clone(),
                glucose_load: self.glucose_load,
                glyc_unit: self.glyc_unit,
                ins_unit: self.ins_unit,
            },
            results: ReportResults {
                glyc_values: self.values(Analyte::Glycemia),
                ins_values: self.values(Analyte::Insulin),
                glyc_ranges: self.glyc_ranges.clone(),
                ins_ranges: self.ins_ranges.clone(),
            },
            options: self.options,
            methodology: self.methodology.clone(),
            notes: self.notes.clone(),
        })
    }

    /// Restore an archived record, including its frozen ranges
    pub fn load_record(&mut self, record: &ReportRecord) {
        let config = &record.config;
        self.patient = record.patient.clone();
        self.preset_id = config.preset_id.clone();
        self.curve = config.curve.clone();
        self.glucose_load = config.glucose_load;
        self.glyc_unit = config.glyc_unit;
        self.ins_unit = config.ins_unit;
        self.options = record.options;
        self.methodology = record.methodology.clone();
        self.notes = record.notes.clone();
        self.glyc_inputs = to_inputs(&record.results.glyc_values, self.curve.glyc_times.len());
        self.ins_inputs = to_inputs(&record.results.ins_values, self.curve.ins_times.len());
        self.glyc_ranges = record.results.glyc_ranges.clone();
        self.ins_ranges = record.results.ins_ranges.clone();
        info!("Loaded report {} ({})", record.id, record.patient.full_name());
    }
}

/// Carry entered text over to a new time list by matching time points
fn realign(old_times: &[TimePoint], new_times: &[TimePoint], inputs: &[String]) -> Vec<String> {
    new_times
        .iter()
        .map(|t| {
            old_times
                .iter()
                .position(|o| o == t)
                .and_then(|idx| inputs.get(idx).cloned())
                .unwrap_or_default()
        })
        .collect()
}

fn to_inputs(values: &MeasurementSeries, len: usize) -> Vec<String> {
    (0..len)
        .map(|idx| values.get(idx).map(crate::units::format_value).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ValueStatus;
    use crate::diagnosis::{Criterion, Severity};

    #[test]
    fn test_preset_sizes_inputs() {
        let mut session = Session::new();
        session.select_preset("glyc5").unwrap();
        assert_eq!(session.inputs(Analyte::Glycemia).len(), 5);
        assert_eq!(session.ranges(Analyte::Glycemia).len(), 5);
        assert!(session.inputs(Analyte::Insulin).is_empty());
        assert_eq!(session.preset_name(), "Glycemic curve, 5 points");
    }

    #[test]
    fn test_inputs_follow_time_points() {
        let mut session = Session::new();
        session.select_preset("glyc5").unwrap();
        session.inputs_mut(Analyte::Glycemia)[2] = "140".to_string();
        session.inputs_mut(Analyte::Glycemia)[4] = "120".to_string();
        session.select_preset("glyc3").unwrap();
        assert_eq!(session.inputs(Analyte::Glycemia), &["", "140", "120"]);
    }

    #[test]
    fn test_override_and_reset() {
        let mut session = Session::new();
        session.select_preset("glyc3").unwrap();
        session.inputs_mut(Analyte::Glycemia)[0] = "105".to_string();
        assert_eq!(session.status_rows(Analyte::Glycemia)[0].status, Some(ValueStatus::Above));

        assert!(session.override_range(Analyte::Glycemia, TimePoint(0), ReferenceRange::new(70.0, 110.0)));
        assert_eq!(session.status_rows(Analyte::Glycemia)[0].status, Some(ValueStatus::Within));
        assert!(!session.override_range(Analyte::Glycemia, TimePoint(0), ReferenceRange::new(120.0, 110.0)));

        session.reset_ranges();
        assert_eq!(session.status_rows(Analyte::Glycemia)[0].status, Some(ValueStatus::Above));
    }

    #[test]
    fn test_pregnancy_swaps_ranges() {
        let mut session = Session::new();
        session.select_preset("glyc3").unwrap();
        session.set_pregnant(true);
        assert_eq!(
            session.ranges(Analyte::Glycemia).get(TimePoint(0)),
            Some(ReferenceRange::new(60.0, 91.0))
        );
        session.inputs_mut(Analyte::Glycemia)[0] = "95".to_string();
        let findings = session.findings();
        assert_eq!(findings[0].source, Criterion::GestationalDiabetes);
        assert_eq!(findings[0].severity, Severity::Danger);
    }

    #[test]
    fn test_custom_times_switch_preset() {
        let mut session = Session::new();
        session.select_preset("glyc3").unwrap();
        session.apply_time_inputs("0, 45, 90", "").unwrap();
        assert_eq!(session.preset().map(|p| p.id), Some("custom"));
        assert_eq!(session.ranges(Analyte::Glycemia).len(), 3);
        assert!(session.apply_time_inputs("10", "").is_err());
        assert_eq!(session.times(Analyte::Glycemia), &[TimePoint(0), TimePoint(45), TimePoint(90)]);
    }

    #[test]
    fn test_record_round_trip() {
        let mut session = Session::new();
        session.select_preset("glyc3").unwrap();
        session.set_combined(true);
        session.patient.surname = "Bianchi".to_string();
        session.inputs_mut(Analyte::Glycemia)[0] = "92,5".to_string();
        session.inputs_mut(Analyte::Insulin)[1] = "80".to_string();
        session.override_range(Analyte::Insulin, TimePoint(60), ReferenceRange::new(25.0, 100.0));

        let record = session.to_record().unwrap();
        assert_eq!(record.results.glyc_values.get(0), Some(92.5));
        assert_eq!(record.results.glyc_values.get(1), None);

        let mut restored = Session::new();
        restored.load_record(&record);
        assert_eq!(restored.inputs(Analyte::Glycemia), &["92.5", "", ""]);
        assert_eq!(
            restored.ranges(Analyte::Insulin).get(TimePoint(60)),
            Some(ReferenceRange::new(25.0, 100.0))
        );
        assert_eq!(restored.to_record().unwrap(), record);
    }

    #[test]
    fn test_empty_session_cannot_be_archived() {
        assert!(matches!(Session::new().to_record(), Err(ReportError::EmptyCurve)));
    }
}
