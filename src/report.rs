//! Archived report records and the rendered report view
//!
//! A [`ReportRecord`] holds everything needed to re-render a past report:
//! patient data, the curve configuration, the raw values and the reference
//! ranges as they were when the report was saved. Ranges are never
//! re-interpolated from a record.

use serde::{Deserialize, Serialize};

use crate::classify::{status_rows, MeasurementSeries, StatusRow};
use crate::curve::CurveConfig;
use crate::diagnosis::{overall_severity, DiagnosticEngine, EvaluationOptions, Finding, Severity};
use crate::error::ReportError;
use crate::reference::ResolvedRanges;
use crate::units::{GlycemiaUnit, InsulinUnit, TimePoint, MAX_TIME_MINUTES};

/// Standard oral glucose load in grams
pub const DEFAULT_GLUCOSE_LOAD: u32 = 75;

pub const SOURCE_ADA_2026: &str = "American Diabetes Association. Standards of Care in Diabetes 2026. \
     Diagnosis and Classification of Diabetes. Diabetes Care 2026;49(Suppl 1):S27. doi:10.2337/dc26-S002";
pub const SOURCE_IDF_2024: &str = "International Diabetes Federation. Position Statement on the 1-hour \
     post-load plasma glucose for the diagnosis of intermediate hyperglycaemia and type 2 diabetes. \
     Diabetes Research and Clinical Practice, March 2024 (presented at ATTD, Florence)";
pub const SOURCE_IADPSG: &str = "International Association of Diabetes and Pregnancy Study Groups \
     Consensus Panel. Recommendations on the diagnosis and classification of hyperglycemia in pregnancy. \
     Diabetes Care 2010;33(3):676-682";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    #[default]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

/// Patient and request data printed on the report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientInfo {
    pub surname: String,
    pub name: String,
    pub birth_date: String,
    pub sex: Sex,
    pub fiscal_code: String,
    pub exam_date: String,
    pub physician: String,
    pub accession: String,
}

impl PatientInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.surname.trim(), self.name.trim()).trim().to_string()
    }

    /// Key used to count distinct patients in the archive
    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.surname.trim().to_lowercase(),
            self.name.trim().to_lowercase(),
            self.fiscal_code.trim().to_lowercase()
        )
    }
}

/// Curve configuration as it was when the report was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub preset_id: Option<String>,
    #[serde(default)]
    pub preset_name: String,
    #[serde(flatten)]
    pub curve: CurveConfig,
    #[serde(default = "default_glucose_load")]
    pub glucose_load: u32,
    #[serde(default)]
    pub glyc_unit: GlycemiaUnit,
    #[serde(default)]
    pub ins_unit: InsulinUnit,
}

fn default_glucose_load() -> u32 {
    DEFAULT_GLUCOSE_LOAD
}

/// Measured values with the reference ranges frozen at save time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportResults {
    pub glyc_values: MeasurementSeries,
    pub ins_values: MeasurementSeries,
    pub glyc_ranges: ResolvedRanges,
    pub ins_ranges: ResolvedRanges,
}

/// One archived report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub patient: PatientInfo,
    pub config: ConfigSnapshot,
    #[serde(default)]
    pub results: ReportResults,
    #[serde(default)]
    pub options: EvaluationOptions,
    #[serde(default)]
    pub methodology: String,
    #[serde(default)]
    pub notes: String,
}

impl ReportRecord {
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let record: ReportRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Check that values and frozen ranges line up with the time lists,
    /// times stay within the sampling window and every range has min <= max
    pub fn validate(&self) -> Result<(), ReportError> {
        let curve = &self.config.curve;
        curve.validate()?;

        let checks = [
            ("glycemic", &curve.glyc_times, &self.results.glyc_values, &self.results.glyc_ranges),
            ("insulin", &curve.ins_times, &self.results.ins_values, &self.results.ins_ranges),
        ];
        for (label, times, values, ranges) in checks {
            if values.len() > times.len() {
                return Err(ReportError::InvalidArchive(format!(
                    "{} values ({}) exceed sampling times ({})",
                    label,
                    values.len(),
                    times.len()
                )));
            }
            if !ranges.matches_times(times) {
                return Err(ReportError::InvalidArchive(format!(
                    "{} reference ranges do not match the sampling times",
                    label
                )));
            }
            if let Some(time) = times.iter().find(|t| t.minutes() > MAX_TIME_MINUTES) {
                return Err(ReportError::InvalidArchive(format!(
                    "{} sampling time {} exceeds {} minutes",
                    label, time, MAX_TIME_MINUTES
                )));
            }
            if let Some(entry) = ranges.entries().iter().find(|e| !e.range.is_valid()) {
                return Err(ReportError::InvalidArchive(format!(
                    "{} reference range at {} is invalid ({} - {})",
                    label,
                    entry.time.label(),
                    entry.range.min,
                    entry.range.max
                )));
            }
        }
        Ok(())
    }

    /// Build the report view with the default engine
    pub fn report(&self) -> Report {
        let engine = DiagnosticEngine::default().with_options(self.options);
        Report::build(self, &engine)
    }
}

/// Everything a renderer needs, derived from one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub glycemic_rows: Vec<StatusRow>,
    pub insulin_rows: Vec<StatusRow>,
    pub findings: Vec<Finding>,
    pub severity: Severity,
    pub sources: Vec<&'static str>,
}

impl Report {
    pub fn build(record: &ReportRecord, engine: &DiagnosticEngine) -> Self {
        let curve = &record.config.curve;
        let results = &record.results;

        let findings = engine.evaluate(
            curve,
            &results.glyc_values,
            &results.ins_values,
            &results.glyc_ranges,
            &results.ins_ranges,
        );

        Self {
            glycemic_rows: status_rows(&curve.glyc_times, &results.glyc_values, &results.glyc_ranges),
            insulin_rows: status_rows(&curve.ins_times, &results.ins_values, &results.ins_ranges),
            severity: overall_severity(&findings),
            sources: sources_for(curve),
            findings,
        }
    }
}

/// Bibliography for the glycemic criteria that apply to this curve
pub fn sources_for(curve: &CurveConfig) -> Vec<&'static str> {
    if !curve.has_glycemia() {
        return Vec::new();
    }
    if curve.is_pregnant {
        return vec![SOURCE_ADA_2026, SOURCE_IADPSG];
    }
    let mut sources = vec![SOURCE_ADA_2026];
    if curve.glyc_times.contains(&TimePoint::ONE_HOUR) {
        sources.push(SOURCE_IDF_2024);
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ValueStatus;
    use crate::diagnosis::Criterion;
    use crate::reference::ReferenceRange;

    fn sample_record() -> ReportRecord {
        let mut curve = CurveConfig::default();
        curve.apply_preset_id("glyc3").unwrap();
        curve.set_combined(true);
        ReportRecord {
            id: "abc".to_string(),
            created_at: "2026-03-01T10:00:00Z".to_string(),
            patient: PatientInfo {
                surname: "Rossi".to_string(),
                name: "Anna".to_string(),
                ..Default::default()
            },
            results: ReportResults {
                glyc_values: MeasurementSeries(vec![Some(105.0), Some(160.0), Some(150.0)]),
                ins_values: MeasurementSeries(vec![Some(10.0), Some(95.0), Some(15.0)]),
                glyc_ranges: curve.resolve_glycemic(),
                ins_ranges: curve.resolve_insulin(),
            },
            config: ConfigSnapshot {
                preset_id: Some("glyc3".to_string()),
                preset_name: "Glycemic curve, 3 points".to_string(),
                curve,
                glucose_load: DEFAULT_GLUCOSE_LOAD,
                glyc_unit: GlycemiaUnit::MgDl,
                ins_unit: InsulinUnit::MicroUnitsPerMl,
            },
            options: EvaluationOptions::default(),
            methodology: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_report_view() {
        let report = sample_record().report();
        assert_eq!(report.glycemic_rows.len(), 3);
        assert_eq!(report.glycemic_rows[0].status, Some(ValueStatus::Above));
        assert_eq!(report.severity, Severity::Warning);
        assert_eq!(report.findings.last().unwrap().source, Criterion::InsulinPeakTiming);
        assert_eq!(report.sources, vec![SOURCE_ADA_2026, SOURCE_IDF_2024]);
    }

    #[test]
    fn test_json_keeps_frozen_ranges() {
        let mut record = sample_record();
        assert!(record.results.glyc_ranges.set_override(TimePoint(0), ReferenceRange::new(70.0, 110.0)));
        let json = serde_json::to_string(&record).unwrap();
        let restored = ReportRecord::from_json(&json).unwrap();
        assert_eq!(restored, record);
        assert_eq!(restored.report().glycemic_rows[0].status, Some(ValueStatus::Within));
    }

    #[test]
    fn test_config_snapshot_is_flat() {
        let json = serde_json::to_value(&sample_record().config).unwrap();
        assert_eq!(json["glyc_times"], serde_json::json!([0, 60, 120]));
        assert_eq!(json["is_combined"], serde_json::json!(true));
        assert_eq!(json["glyc_unit"], serde_json::json!("mg/dL"));
    }

    #[test]
    fn test_validate_rejects_mismatched_ranges() {
        let mut record = sample_record();
        record.results.glyc_ranges = ResolvedRanges::default();
        assert!(matches!(record.validate(), Err(ReportError::InvalidArchive(_))));

        let mut record = sample_record();
        record.results.glyc_values.0.push(Some(1.0));
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_range_and_out_of_window_time() {
        let mut record = sample_record();
        let mut entries = record.results.glyc_ranges.entries().to_vec();
        entries[0].range = ReferenceRange::new(120.0, 80.0);
        record.results.glyc_ranges = ResolvedRanges::from_entries(entries);
        assert!(matches!(record.validate(), Err(ReportError::InvalidArchive(_))));

        let mut json = serde_json::to_value(sample_record()).unwrap();
        json["config"]["glyc_times"] = serde_json::json!([0, 60, 9999]);
        json["results"]["glyc_ranges"][2]["time"] = serde_json::json!(9999);
        let err = ReportRecord::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, ReportError::InvalidArchive(_)));
    }

    #[test]
    fn test_sources_for_pregnancy() {
        let mut curve = CurveConfig::default();
        curve.apply_preset_id("glyc_preg").unwrap();
        assert_eq!(sources_for(&curve), vec![SOURCE_ADA_2026, SOURCE_IADPSG]);
        assert!(sources_for(&CurveConfig::default()).is_empty());
    }

    #[test]
    fn test_patient_identity() {
        let patient = PatientInfo {
            surname: " Rossi".to_string(),
            name: "ANNA".to_string(),
            fiscal_code: "RSSNNA80A41H501X".to_string(),
            ..Default::default()
        };
        assert_eq!(patient.full_name(), "Rossi ANNA");
        assert_eq!(patient.identity_key(), "rossi|anna|rssnna80a41h501x");
    }
}
