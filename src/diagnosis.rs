//! Diagnostic interpretation of a tolerance curve
//!
//! Glycemic criteria:
//! - non-pregnant: ADA Standards of Care 2026 (fasting, 2-hour) and the IDF
//!   2024 position statement on 1-hour plasma glucose
//! - pregnant: IADPSG thresholds as confirmed by ADA 2026, where a single
//!   altered value is diagnostic for gestational diabetes
//!
//! Insulin criteria follow the SIE/AACE consensus and Kraft peak patterns.
//!
//! The engine is a pure function of its inputs: no state is kept between
//! calls and findings are emitted in a fixed order (glycemic before insulin,
//! fasting before 1-hour before 2-hour).

use log::debug;
use serde::{Deserialize, Serialize};

use crate::classify::MeasurementSeries;
use crate::curve::CurveConfig;
use crate::reference::ResolvedRanges;
use crate::units::{format_value, Analyte, TimePoint};

/// Clinical weight of a finding. Ordering: Normal < Warning < Danger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Warning,
    Danger,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Normal => "Normal",
            Severity::Warning => "Warning",
            Severity::Danger => "Danger",
        }
    }

    /// Prefix shown in front of the finding text
    pub fn prefix(self) -> &'static str {
        match self {
            Severity::Normal => "OK",
            Severity::Warning => "NOTE",
            Severity::Danger => "ATTENTION",
        }
    }
}

/// Rule that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    GestationalDiabetes,
    FastingGlucose,
    FastingHypoglycemia,
    OneHourGlucose,
    TwoHourGlucose,
    ReactiveHypoglycemia,
    GlycemicSummary,
    FastingHyperinsulinemia,
    FastingHypoinsulinemia,
    InsufficientInsulinResponse,
    InsulinPeakTiming,
    ExcessiveInsulinPeak,
}

impl Criterion {
    /// Stable identifier, used in CLI output and archived JSON
    pub fn id(self) -> &'static str {
        match self {
            Criterion::GestationalDiabetes => "gdm-iadpsg",
            Criterion::FastingGlucose => "fasting-glucose",
            Criterion::FastingHypoglycemia => "fasting-hypoglycemia",
            Criterion::OneHourGlucose => "one-hour-glucose",
            Criterion::TwoHourGlucose => "two-hour-glucose",
            Criterion::ReactiveHypoglycemia => "reactive-hypoglycemia",
            Criterion::GlycemicSummary => "glycemic-summary",
            Criterion::FastingHyperinsulinemia => "fasting-hyperinsulinemia",
            Criterion::FastingHypoinsulinemia => "fasting-hypoinsulinemia",
            Criterion::InsufficientInsulinResponse => "insufficient-insulin-response",
            Criterion::InsulinPeakTiming => "insulin-peak-timing",
            Criterion::ExcessiveInsulinPeak => "excessive-insulin-peak",
        }
    }

    pub fn analyte(self) -> Analyte {
        match self {
            Criterion::GestationalDiabetes
            | Criterion::FastingGlucose
            | Criterion::FastingHypoglycemia
            | Criterion::OneHourGlucose
            | Criterion::TwoHourGlucose
            | Criterion::ReactiveHypoglycemia
            | Criterion::GlycemicSummary => Analyte::Glycemia,
            _ => Analyte::Insulin,
        }
    }
}

/// One classified clinical statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    pub source: Criterion,
}

impl Finding {
    fn new(severity: Severity, source: Criterion, message: String) -> Self {
        Self { severity, message, source }
    }
}

/// Highest severity among the findings; an empty list is Normal
pub fn overall_severity(findings: &[Finding]) -> Severity {
    findings.iter().map(|f| f.severity).max().unwrap_or(Severity::Normal)
}

/// Versioned threshold table. Glucose values in mg/dL, insulin in µUI/mL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdTable {
    pub version: &'static str,
    pub fasting_ifg: f64,
    pub fasting_diabetes: f64,
    pub one_hour_ih: f64,
    pub one_hour_diabetes: f64,
    pub two_hour_igt: f64,
    pub two_hour_diabetes: f64,
    pub gdm_fasting: f64,
    pub gdm_one_hour: f64,
    pub gdm_two_hour: f64,
    pub reactive_hypoglycemia: f64,
    pub insulin_fasting_high: f64,
    pub insulin_min_peak: f64,
    pub insulin_excessive_peak: f64,
    pub insulin_slow_return_ratio: f64,
    pub insulin_normal_peak_by: TimePoint,
    pub insulin_delayed_peak_by: TimePoint,
}

impl ThresholdTable {
    pub const ADA_2026_IDF_2024: ThresholdTable = ThresholdTable {
        version: "ADA 2026 / IDF 2024 / IADPSG",
        fasting_ifg: 100.0,
        fasting_diabetes: 126.0,
        one_hour_ih: 155.0,
        one_hour_diabetes: 209.0,
        two_hour_igt: 140.0,
        two_hour_diabetes: 200.0,
        gdm_fasting: 92.0,
        gdm_one_hour: 180.0,
        gdm_two_hour: 153.0,
        reactive_hypoglycemia: 55.0,
        insulin_fasting_high: 25.0,
        insulin_min_peak: 20.0,
        insulin_excessive_peak: 150.0,
        insulin_slow_return_ratio: 3.0,
        insulin_normal_peak_by: TimePoint(60),
        insulin_delayed_peak_by: TimePoint(120),
    };
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::ADA_2026_IDF_2024
    }
}

/// Optional rules on top of the standard criteria
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOptions {
    /// Flag fasting/reactive hypoglycemia and fasting hypoinsulinemia
    pub hypoglycemia_screening: bool,
}

/// Evaluates the fixed rule set against one curve snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticEngine {
    thresholds: ThresholdTable,
    options: EvaluationOptions,
}

impl DiagnosticEngine {
    pub fn new(thresholds: ThresholdTable) -> Self {
        Self { thresholds, options: EvaluationOptions::default() }
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Evaluate every applicable rule and return the findings in display order
    pub fn evaluate(
        &self,
        config: &CurveConfig,
        glyc_values: &MeasurementSeries,
        ins_values: &MeasurementSeries,
        glyc_ranges: &ResolvedRanges,
        ins_ranges: &ResolvedRanges,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        if config.has_glycemia() && glyc_values.has_values() {
            let points = GlycemicPoints::new(&config.glyc_times, glyc_values);
            if config.is_pregnant {
                self.evaluate_gestational(&points, &mut findings);
            } else {
                self.evaluate_glycemic(&points, glyc_ranges, &mut findings);
            }
        }

        if config.has_insulin() {
            self.evaluate_insulin(&config.ins_times, ins_values, ins_ranges, &mut findings);
        }

        debug!(
            "Evaluated curve ({}): {} findings, overall {:?}",
            self.thresholds.version,
            findings.len(),
            overall_severity(&findings)
        );
        findings
    }

    fn evaluate_gestational(&self, points: &GlycemicPoints, findings: &mut Vec<Finding>) {
        let t = &self.thresholds;
        let checks = [
            (points.basal, t.gdm_fasting, "baseline"),
            (points.one_hour, t.gdm_one_hour, "60'"),
            (points.two_hours, t.gdm_two_hour, "120'"),
        ];

        if checks.iter().all(|(value, _, _)| value.is_none()) {
            return;
        }

        let exceeded: Vec<String> = checks
            .iter()
            .filter(|(value, threshold, _)| value.map(|v| v >= *threshold).unwrap_or(false))
            .map(|(_, threshold, label)| format!("{} ≥{} mg/dL", label, format_value(*threshold)))
            .collect();

        if exceeded.is_empty() {
            findings.push(Finding::new(
                Severity::Normal,
                Criterion::GestationalDiabetes,
                format!(
                    "Gestational diabetes screening negative (IADPSG / ADA 2026): all values are below \
                     the 75g OGTT diagnostic limits in pregnancy (baseline <{}, 60' <{}, 120' <{} mg/dL).",
                    format_value(t.gdm_fasting),
                    format_value(t.gdm_one_hour),
                    format_value(t.gdm_two_hour)
                ),
            ));
        } else {
            findings.push(Finding::new(
                Severity::Danger,
                Criterion::GestationalDiabetes,
                format!(
                    "Gestational diabetes (IADPSG / ADA 2026): at least one value meets the diagnostic \
                     limits ({}). A single altered value on a 75g OGTT is sufficient for the diagnosis. \
                     Referral for diabetology/endocrinology assessment is recommended.",
                    exceeded.join("; ")
                ),
            ));
        }
    }

    fn evaluate_glycemic(&self, points: &GlycemicPoints, ranges: &ResolvedRanges, findings: &mut Vec<Finding>) {
        let t = &self.thresholds;
        let start = findings.len();

        if let Some(v0) = points.basal {
            if v0 >= t.fasting_diabetes {
                findings.push(Finding::new(
                    Severity::Danger,
                    Criterion::FastingGlucose,
                    format!(
                        "Fasting glucose {} mg/dL (≥{} mg/dL): diabetes range (ADA 2026). \
                         Diagnostic confirmation is required.",
                        format_value(v0),
                        format_value(t.fasting_diabetes)
                    ),
                ));
            } else if v0 >= t.fasting_ifg {
                findings.push(Finding::new(
                    Severity::Warning,
                    Criterion::FastingGlucose,
                    format!(
                        "Fasting glucose {} mg/dL: impaired fasting glucose (IFG, {}-{} mg/dL), \
                         a prediabetic condition (ADA 2026).",
                        format_value(v0),
                        format_value(t.fasting_ifg),
                        format_value(t.fasting_diabetes - 1.0)
                    ),
                ));
            } else if self.options.hypoglycemia_screening {
                if let Some(range) = ranges.get(TimePoint::BASAL) {
                    if v0 < range.min {
                        findings.push(Finding::new(
                            Severity::Warning,
                            Criterion::FastingHypoglycemia,
                            format!(
                                "Fasting hypoglycemia: {} mg/dL (<{} mg/dL). Consider prolonged fasting, \
                                 endogenous hyperinsulinism, adrenal insufficiency or liver disease.",
                                format_value(v0),
                                format_value(range.min)
                            ),
                        ));
                    }
                }
            }
        }

        if let Some(v60) = points.one_hour {
            if v60 >= t.one_hour_diabetes {
                findings.push(Finding::new(
                    Severity::Danger,
                    Criterion::OneHourGlucose,
                    format!(
                        "1-hour glucose {} mg/dL (≥{} mg/dL): indicative of type 2 diabetes \
                         by the IDF 2024 1-hour plasma glucose criterion.",
                        format_value(v60),
                        format_value(t.one_hour_diabetes)
                    ),
                ));
            } else if v60 >= t.one_hour_ih {
                findings.push(Finding::new(
                    Severity::Warning,
                    Criterion::OneHourGlucose,
                    format!(
                        "1-hour glucose {} mg/dL (≥{} mg/dL): intermediate hyperglycemia (IH, IDF 2024). \
                         Increased risk of progression to type 2 diabetes; lifestyle changes recommended.",
                        format_value(v60),
                        format_value(t.one_hour_ih)
                    ),
                ));
            }
        }

        if let Some(v120) = points.two_hours {
            if v120 >= t.two_hour_diabetes {
                findings.push(Finding::new(
                    Severity::Danger,
                    Criterion::TwoHourGlucose,
                    format!(
                        "2-hour glucose {} mg/dL (≥{} mg/dL): diabetes range (ADA 2026). \
                         Diagnostic confirmation is recommended.",
                        format_value(v120),
                        format_value(t.two_hour_diabetes)
                    ),
                ));
            } else if v120 >= t.two_hour_igt {
                findings.push(Finding::new(
                    Severity::Warning,
                    Criterion::TwoHourGlucose,
                    format!(
                        "2-hour glucose {} mg/dL: impaired glucose tolerance (IGT, {}-{} mg/dL), \
                         a prediabetic condition (ADA 2026).",
                        format_value(v120),
                        format_value(t.two_hour_igt),
                        format_value(t.two_hour_diabetes - 1.0)
                    ),
                ));
            } else {
                findings.push(Finding::new(
                    Severity::Normal,
                    Criterion::TwoHourGlucose,
                    format!(
                        "2-hour glucose {} mg/dL (<{} mg/dL): normal glucose tolerance (ADA 2026).",
                        format_value(v120),
                        format_value(t.two_hour_igt)
                    ),
                ));
            }

            if self.options.hypoglycemia_screening && v120 < t.reactive_hypoglycemia {
                findings.push(Finding::new(
                    Severity::Warning,
                    Criterion::ReactiveHypoglycemia,
                    format!(
                        "Reactive hypoglycemia at 120': {} mg/dL (<{} mg/dL). \
                         Correlate with symptoms.",
                        format_value(v120),
                        format_value(t.reactive_hypoglycemia)
                    ),
                ));
            }
        }

        if findings.len() == start {
            let message = if points.basal.is_none() && points.one_hour.is_none() && points.two_hours.is_none() {
                "Values within reference ranges for evaluated times.".to_string()
            } else {
                "Normal glucose tolerance: all evaluated values are within normal limits \
                 (ADA 2026, IDF 2024)."
                    .to_string()
            };
            findings.push(Finding::new(Severity::Normal, Criterion::GlycemicSummary, message));
        }
    }

    fn evaluate_insulin(
        &self,
        times: &[TimePoint],
        values: &MeasurementSeries,
        ranges: &ResolvedRanges,
        findings: &mut Vec<Finding>,
    ) {
        let t = &self.thresholds;
        let present: Vec<(TimePoint, f64)> = values.present(times).collect();
        if !present.iter().any(|(_, v)| *v != 0.0) {
            return;
        }

        let baseline = values.value_at(times, TimePoint::BASAL);
        let v120 = values.value_at(times, TimePoint::TWO_HOURS);

        // first occurrence wins on ties
        let (peak_time, peak) = present
            .iter()
            .copied()
            .fold(present[0], |best, cur| if cur.1 > best.1 { cur } else { best });

        if let Some(b) = baseline {
            if b > t.insulin_fasting_high {
                findings.push(Finding::new(
                    Severity::Warning,
                    Criterion::FastingHyperinsulinemia,
                    format!(
                        "Fasting hyperinsulinemia: {} µUI/mL (>{} µUI/mL), suggestive of insulin resistance.",
                        format_value(b),
                        format_value(t.insulin_fasting_high)
                    ),
                ));
            }

            if self.options.hypoglycemia_screening && b > 0.0 {
                if let Some(range) = ranges.get(TimePoint::BASAL) {
                    if b < range.min {
                        findings.push(Finding::new(
                            Severity::Warning,
                            Criterion::FastingHypoinsulinemia,
                            format!(
                                "Fasting hypoinsulinemia: {} µUI/mL (<{} µUI/mL). Possible reduced beta-cell \
                                 reserve; C-peptide and anti-GAD/anti-IA2 antibodies are recommended.",
                                format_value(b),
                                format_value(range.min)
                            ),
                        ));
                    }
                }
            }
        }

        if peak < t.insulin_min_peak && present.len() >= 2 {
            findings.push(Finding::new(
                Severity::Danger,
                Criterion::InsufficientInsulinResponse,
                format!(
                    "Insufficient insulin response: maximum peak {} µUI/mL (<{}). Markedly reduced \
                     beta-cell response; C-peptide and anti-GAD antibodies are recommended.",
                    format_value(peak),
                    format_value(t.insulin_min_peak)
                ),
            ));
        }

        if peak_time <= t.insulin_normal_peak_by {
            if self.slow_return(baseline, v120) {
                findings.push(Finding::new(
                    Severity::Warning,
                    Criterion::InsulinPeakTiming,
                    format!(
                        "Insulin peak at {} ({} µUI/mL) within physiological timing, but slow return to \
                         baseline: 120' value {} µUI/mL is above {}× baseline. Possible compensatory \
                         hyperinsulinism.",
                        peak_time.label(),
                        format_value(peak),
                        v120.map(format_value).unwrap_or_default(),
                        format_value(t.insulin_slow_return_ratio)
                    ),
                ));
            } else {
                findings.push(Finding::new(
                    Severity::Normal,
                    Criterion::InsulinPeakTiming,
                    format!(
                        "Physiological insulin pattern: peak at {} ({} µUI/mL) with adequate return \
                         towards baseline.",
                        peak_time.label(),
                        format_value(peak)
                    ),
                ));
            }
        } else if peak_time <= t.insulin_delayed_peak_by {
            findings.push(Finding::new(
                Severity::Warning,
                Criterion::InsulinPeakTiming,
                format!(
                    "Delayed insulin peak at {} ({} µUI/mL): the physiological peak is expected within \
                     30-60'. Possible insulin resistance or reduced early beta-cell response.",
                    peak_time.label(),
                    format_value(peak)
                ),
            ));
        } else {
            findings.push(Finding::new(
                Severity::Danger,
                Criterion::InsulinPeakTiming,
                format!(
                    "Markedly delayed insulin peak at {} ({} µUI/mL): pathological pattern (Kraft \
                     pattern IV), suggestive of significant insulin resistance and beta-cell dysfunction.",
                    peak_time.label(),
                    format_value(peak)
                ),
            ));
        }

        if peak > t.insulin_excessive_peak {
            findings.push(Finding::new(
                Severity::Warning,
                Criterion::ExcessiveInsulinPeak,
                format!(
                    "Reactive hyperinsulinism: peak {} µUI/mL (>{}). Excessive compensatory insulin \
                     response, index of marked peripheral insulin resistance.",
                    format_value(peak),
                    format_value(t.insulin_excessive_peak)
                ),
            ));
        }
    }

    /// 120' insulin above ratio × baseline. Needs a measured baseline and a
    /// 120' value; a baseline of exactly zero (undetectable) never triggers.
    fn slow_return(&self, baseline: Option<f64>, v120: Option<f64>) -> bool {
        match (baseline, v120) {
            (Some(b), Some(v)) if b > 0.0 => v > self.thresholds.insulin_slow_return_ratio * b,
            _ => false,
        }
    }
}

/// Measured glycemia at the three diagnostic times, when present
struct GlycemicPoints {
    basal: Option<f64>,
    one_hour: Option<f64>,
    two_hours: Option<f64>,
}

impl GlycemicPoints {
    fn new(times: &[TimePoint], values: &MeasurementSeries) -> Self {
        Self {
            basal: values.value_at(times, TimePoint::BASAL),
            one_hour: values.value_at(times, TimePoint::ONE_HOUR),
            two_hours: values.value_at(times, TimePoint::TWO_HOURS),
        }
    }
}

/// Evaluate with the current threshold table and no optional rules
pub fn evaluate(
    config: &CurveConfig,
    glyc_values: &MeasurementSeries,
    ins_values: &MeasurementSeries,
    glyc_ranges: &ResolvedRanges,
    ins_ranges: &ResolvedRanges,
) -> Vec<Finding> {
    DiagnosticEngine::default().evaluate(config, glyc_values, ins_values, glyc_ranges, ins_ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(times: &[u16]) -> Vec<TimePoint> {
        times.iter().map(|&t| TimePoint(t)).collect()
    }

    fn values(vals: &[f64]) -> MeasurementSeries {
        MeasurementSeries(vals.iter().map(|&v| Some(v)).collect())
    }

    fn glycemic(times: &[u16], vals: &[f64], pregnant: bool) -> Vec<Finding> {
        let config = CurveConfig {
            glyc_times: tp(times),
            is_pregnant: pregnant,
            ..Default::default()
        };
        evaluate(
            &config,
            &values(vals),
            &MeasurementSeries::default(),
            &config.resolve_glycemic(),
            &ResolvedRanges::default(),
        )
    }

    fn insulin(times: &[u16], vals: &[f64]) -> Vec<Finding> {
        let config = CurveConfig {
            ins_times: tp(times),
            is_combined: true,
            ..Default::default()
        };
        evaluate(
            &config,
            &MeasurementSeries::default(),
            &values(vals),
            &ResolvedRanges::default(),
            &config.resolve_insulin(),
        )
    }

    fn sources(findings: &[Finding]) -> Vec<(Criterion, Severity)> {
        findings.iter().map(|f| (f.source, f.severity)).collect()
    }

    #[test]
    fn test_impaired_fasting_and_tolerance() {
        let findings = glycemic(&[0, 60, 120], &[105.0, 160.0, 150.0], false);
        assert_eq!(
            sources(&findings),
            vec![
                (Criterion::FastingGlucose, Severity::Warning),
                (Criterion::OneHourGlucose, Severity::Warning),
                (Criterion::TwoHourGlucose, Severity::Warning),
            ]
        );
        assert!(findings[0].message.contains("impaired fasting glucose"));
        assert!(findings[2].message.contains("impaired glucose tolerance"));
    }

    #[test]
    fn test_diabetes_range_values() {
        let findings = glycemic(&[0, 60, 120], &[130.0, 215.0, 205.0], false);
        assert!(findings.iter().all(|f| f.severity == Severity::Danger));
        assert_eq!(findings.len(), 3);
        assert_eq!(overall_severity(&findings), Severity::Danger);
    }

    #[test]
    fn test_threshold_boundaries() {
        let findings = glycemic(&[0, 60, 120], &[126.0, 209.0, 200.0], false);
        assert!(findings.iter().all(|f| f.severity == Severity::Danger));

        let findings = glycemic(&[0, 60, 120], &[99.0, 154.0, 139.0], false);
        assert_eq!(sources(&findings), vec![(Criterion::TwoHourGlucose, Severity::Normal)]);
    }

    #[test]
    fn test_normal_fasting_is_silent() {
        let findings = glycemic(&[0, 60, 120], &[90.0, 120.0, 110.0], false);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].source, Criterion::TwoHourGlucose);
        assert_eq!(findings[0].severity, Severity::Normal);
    }

    #[test]
    fn test_summary_without_diagnostic_times() {
        let findings = glycemic(&[30, 90, 180], &[150.0, 130.0, 100.0], false);
        assert_eq!(sources(&findings), vec![(Criterion::GlycemicSummary, Severity::Normal)]);
        assert!(findings[0].message.contains("within reference ranges"));
    }

    #[test]
    fn test_summary_when_only_normal_fasting() {
        let findings = glycemic(&[0, 30], &[85.0, 140.0], false);
        assert_eq!(sources(&findings), vec![(Criterion::GlycemicSummary, Severity::Normal)]);
    }

    #[test]
    fn test_missing_value_is_not_zero() {
        let config = CurveConfig { glyc_times: tp(&[0, 60, 120]), ..Default::default() };
        let series = MeasurementSeries(vec![None, Some(170.0), None]);
        let findings = evaluate(
            &config,
            &series,
            &MeasurementSeries::default(),
            &config.resolve_glycemic(),
            &ResolvedRanges::default(),
        );
        assert_eq!(sources(&findings), vec![(Criterion::OneHourGlucose, Severity::Warning)]);
    }

    #[test]
    fn test_gestational_single_value_fires() {
        let findings = glycemic(&[0, 60, 120], &[95.0, 170.0, 140.0], true);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Danger);
        assert_eq!(findings[0].source, Criterion::GestationalDiabetes);
        assert!(findings[0].message.contains("baseline ≥92 mg/dL"));
        assert!(!findings[0].message.contains("60' ≥180"));
    }

    #[test]
    fn test_gestational_lists_every_exceeded_threshold() {
        let findings = glycemic(&[0, 60, 120], &[92.0, 180.0, 153.0], true);
        assert_eq!(findings.len(), 1);
        let msg = &findings[0].message;
        assert!(msg.contains("baseline ≥92 mg/dL"));
        assert!(msg.contains("60' ≥180 mg/dL"));
        assert!(msg.contains("120' ≥153 mg/dL"));
    }

    #[test]
    fn test_gestational_negative_and_skipped_times() {
        let findings = glycemic(&[0, 60, 120], &[85.0, 170.0, 150.0], true);
        assert_eq!(sources(&findings), vec![(Criterion::GestationalDiabetes, Severity::Normal)]);

        // 90' is not a GDM time, even with a high value
        let findings = glycemic(&[30, 90], &[200.0, 200.0], true);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_insulin_physiological_pattern() {
        let findings = insulin(&[0, 30, 60, 90, 120], &[10.0, 80.0, 95.0, 40.0, 15.0]);
        assert_eq!(sources(&findings), vec![(Criterion::InsulinPeakTiming, Severity::Normal)]);
        assert!(findings[0].message.contains("Physiological"));
    }

    #[test]
    fn test_insulin_markedly_delayed_and_excessive() {
        let findings = insulin(&[0, 60, 120, 150, 180], &[12.0, 60.0, 120.0, 200.0, 90.0]);
        assert_eq!(
            sources(&findings),
            vec![
                (Criterion::InsulinPeakTiming, Severity::Danger),
                (Criterion::ExcessiveInsulinPeak, Severity::Warning),
            ]
        );
        assert!(findings[0].message.contains("Markedly delayed"));
        assert!(findings[1].message.contains("Reactive hyperinsulinism"));
    }

    #[test]
    fn test_insulin_delayed_peak() {
        let findings = insulin(&[0, 30, 60, 90, 120], &[8.0, 30.0, 50.0, 70.0, 40.0]);
        assert_eq!(sources(&findings), vec![(Criterion::InsulinPeakTiming, Severity::Warning)]);
    }

    #[test]
    fn test_insulin_slow_return() {
        let findings = insulin(&[0, 30, 60, 120], &[10.0, 90.0, 70.0, 31.0]);
        assert_eq!(sources(&findings), vec![(Criterion::InsulinPeakTiming, Severity::Warning)]);
        assert!(findings[0].message.contains("slow return"));
    }

    #[test]
    fn test_insulin_zero_baseline_never_slow_return() {
        let findings = insulin(&[0, 30, 60, 120], &[0.0, 90.0, 70.0, 31.0]);
        assert_eq!(sources(&findings), vec![(Criterion::InsulinPeakTiming, Severity::Normal)]);
    }

    #[test]
    fn test_insulin_missing_baseline() {
        let config = CurveConfig { ins_times: tp(&[0, 30, 60, 120]), ..Default::default() };
        let series = MeasurementSeries(vec![None, Some(90.0), Some(70.0), Some(60.0)]);
        let findings = evaluate(
            &config,
            &MeasurementSeries::default(),
            &series,
            &ResolvedRanges::default(),
            &config.resolve_insulin(),
        );
        assert_eq!(sources(&findings), vec![(Criterion::InsulinPeakTiming, Severity::Normal)]);
    }

    #[test]
    fn test_insulin_fasting_and_insufficient_response() {
        let findings = insulin(&[0, 60, 120], &[26.0, 30.0, 20.0]);
        assert_eq!(findings[0].source, Criterion::FastingHyperinsulinemia);

        let findings = insulin(&[0, 60, 120], &[3.0, 15.0, 8.0]);
        assert_eq!(
            sources(&findings),
            vec![
                (Criterion::InsufficientInsulinResponse, Severity::Danger),
                (Criterion::InsulinPeakTiming, Severity::Normal),
            ]
        );
    }

    #[test]
    fn test_insulin_single_point_not_insufficient() {
        let findings = insulin(&[0], &[5.0]);
        assert_eq!(sources(&findings), vec![(Criterion::InsulinPeakTiming, Severity::Normal)]);
    }

    #[test]
    fn test_insulin_all_zero_skipped() {
        assert!(insulin(&[0, 60, 120], &[0.0, 0.0, 0.0]).is_empty());
    }

    #[test]
    fn test_peak_tie_uses_first_occurrence() {
        let findings = insulin(&[0, 60, 150], &[10.0, 80.0, 80.0]);
        assert_eq!(sources(&findings), vec![(Criterion::InsulinPeakTiming, Severity::Normal)]);
    }

    #[test]
    fn test_glycemic_before_insulin() {
        let config = CurveConfig {
            glyc_times: tp(&[0, 60, 120]),
            ins_times: tp(&[0, 60, 120]),
            is_combined: true,
            ..Default::default()
        };
        let findings = evaluate(
            &config,
            &values(&[110.0, 150.0, 130.0]),
            &values(&[30.0, 90.0, 40.0]),
            &config.resolve_glycemic(),
            &config.resolve_insulin(),
        );
        let analytes: Vec<Analyte> = findings.iter().map(|f| f.source.analyte()).collect();
        assert_eq!(
            analytes,
            vec![Analyte::Glycemia, Analyte::Glycemia, Analyte::Insulin, Analyte::Insulin]
        );
    }

    #[test]
    fn test_insulin_rules_run_in_pregnancy() {
        let mut config = CurveConfig::default();
        config.apply_preset_id("glyc_preg").unwrap();
        config.set_combined(true);
        assert!(config.is_pregnant);
        let findings = evaluate(
            &config,
            &values(&[85.0, 150.0, 140.0]),
            &values(&[10.0, 60.0, 200.0]),
            &config.resolve_glycemic(),
            &config.resolve_insulin(),
        );
        assert_eq!(
            sources(&findings),
            vec![
                (Criterion::GestationalDiabetes, Severity::Normal),
                (Criterion::InsulinPeakTiming, Severity::Warning),
                (Criterion::ExcessiveInsulinPeak, Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let first = glycemic(&[0, 60, 120], &[105.0, 160.0, 150.0], false);
        let second = glycemic(&[0, 60, 120], &[105.0, 160.0, 150.0], false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_hypoglycemia_screening_is_opt_in() {
        let config = CurveConfig { glyc_times: tp(&[0, 60, 120]), ..Default::default() };
        let series = values(&[50.0, 110.0, 50.0]);
        let ranges = config.resolve_glycemic();
        let empty = MeasurementSeries::default();
        let none = ResolvedRanges::default();

        let plain = evaluate(&config, &series, &empty, &ranges, &none);
        assert_eq!(sources(&plain), vec![(Criterion::TwoHourGlucose, Severity::Normal)]);

        let engine = DiagnosticEngine::default()
            .with_options(EvaluationOptions { hypoglycemia_screening: true });
        let screened = engine.evaluate(&config, &series, &empty, &ranges, &none);
        assert_eq!(
            sources(&screened),
            vec![
                (Criterion::FastingHypoglycemia, Severity::Warning),
                (Criterion::TwoHourGlucose, Severity::Normal),
                (Criterion::ReactiveHypoglycemia, Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_pregnancy_screening_covers_insulin_only() {
        let mut config = CurveConfig::default();
        config.apply_preset_id("glyc_preg").unwrap();
        config.set_combined(true);
        let engine = DiagnosticEngine::default()
            .with_options(EvaluationOptions { hypoglycemia_screening: true });
        let findings = engine.evaluate(
            &config,
            &values(&[50.0, 100.0, 50.0]),
            &values(&[1.5, 30.0, 20.0]),
            &config.resolve_glycemic(),
            &config.resolve_insulin(),
        );
        let found = sources(&findings);
        assert_eq!(found[0], (Criterion::GestationalDiabetes, Severity::Normal));
        assert!(found.contains(&(Criterion::FastingHypoinsulinemia, Severity::Warning)));
        assert!(!found.iter().any(|(c, _)| matches!(
            c,
            Criterion::FastingHypoglycemia | Criterion::ReactiveHypoglycemia
        )));
    }

    #[test]
    fn test_custom_threshold_table() {
        let strict = ThresholdTable { fasting_ifg: 95.0, ..ThresholdTable::ADA_2026_IDF_2024 };
        let config = CurveConfig { glyc_times: tp(&[0, 120]), ..Default::default() };
        let findings = DiagnosticEngine::new(strict).evaluate(
            &config,
            &values(&[97.0, 100.0]),
            &MeasurementSeries::default(),
            &config.resolve_glycemic(),
            &ResolvedRanges::default(),
        );
        assert_eq!(findings[0].source, Criterion::FastingGlucose);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_overall_severity() {
        assert_eq!(overall_severity(&[]), Severity::Normal);
        let findings = insulin(&[0, 30, 60, 90, 120], &[8.0, 30.0, 50.0, 70.0, 40.0]);
        assert_eq!(overall_severity(&findings), Severity::Warning);
    }
}
