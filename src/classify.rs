//! Per-point comparison of measured values against their reference range

use serde::{Deserialize, Serialize};

use crate::reference::{ReferenceRange, ResolvedRanges};
use crate::units::TimePoint;

/// Position of a measured value relative to its reference range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueStatus {
    Below,
    Within,
    Above,
}

impl ValueStatus {
    pub fn label(self) -> &'static str {
        match self {
            ValueStatus::Below => "Low",
            ValueStatus::Within => "Normal",
            ValueStatus::Above => "High",
        }
    }

    /// Status text with a direction arrow, used in result tables
    pub fn table_label(self) -> &'static str {
        match self {
            ValueStatus::Below => "↓ Below",
            ValueStatus::Within => "Normal",
            ValueStatus::Above => "↑ Above",
        }
    }
}

/// Classify a present numeric value. `Within` iff `min <= value <= max`.
pub fn classify(value: f64, range: &ReferenceRange) -> ValueStatus {
    if value < range.min {
        ValueStatus::Below
    } else if value > range.max {
        ValueStatus::Above
    } else {
        ValueStatus::Within
    }
}

/// Classify a possibly missing value. Missing and NaN values stay unclassified.
pub fn classify_reading(value: Option<f64>, range: &ReferenceRange) -> Option<ValueStatus> {
    match value {
        Some(v) if v.is_finite() => Some(classify(v, range)),
        _ => None,
    }
}

/// Parse one data-entry field. Empty, non-numeric and non-finite input is
/// "no measurement", never zero.
pub fn parse_measurement(input: &str) -> Option<f64> {
    let trimmed = input.trim().replace(',', ".");
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Values for one analyte, index-aligned with the curve's sampling times
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementSeries(pub Vec<Option<f64>>);

impl MeasurementSeries {
    pub fn empty(len: usize) -> Self {
        MeasurementSeries(vec![None; len])
    }

    pub fn from_inputs<S: AsRef<str>>(inputs: &[S]) -> Self {
        MeasurementSeries(inputs.iter().map(|s| parse_measurement(s.as_ref())).collect())
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.0.get(idx).copied().flatten().filter(|v| v.is_finite())
    }

    /// Value measured at `time`, if that time is sampled and a value was entered
    pub fn value_at(&self, times: &[TimePoint], time: TimePoint) -> Option<f64> {
        times.iter().position(|t| *t == time).and_then(|idx| self.get(idx))
    }

    /// (time, value) pairs for the entries that hold a measurement
    pub fn present<'a>(&'a self, times: &'a [TimePoint]) -> impl Iterator<Item = (TimePoint, f64)> + 'a {
        times.iter().enumerate().filter_map(move |(idx, t)| self.get(idx).map(|v| (*t, v)))
    }

    pub fn has_values(&self) -> bool {
        self.0.iter().any(|v| v.map(|x| x.is_finite()).unwrap_or(false))
    }

    /// Resize to match a new time list, keeping values by position
    pub fn resize(&mut self, len: usize) {
        self.0.resize(len, None);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One row of a result table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub time: TimePoint,
    pub value: Option<f64>,
    pub range: Option<ReferenceRange>,
    pub status: Option<ValueStatus>,
}

/// Rows for every sampling time, recomputed from the (value, range) pairs
pub fn status_rows(times: &[TimePoint], values: &MeasurementSeries, ranges: &ResolvedRanges) -> Vec<StatusRow> {
    times
        .iter()
        .enumerate()
        .map(|(idx, &time)| {
            let value = values.get(idx);
            let range = ranges.get(time);
            let status = range.as_ref().and_then(|r| classify_reading(value, r));
            StatusRow { time, value, range, status }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::SeriesKind;

    #[test]
    fn test_classify_buckets() {
        let range = ReferenceRange::new(60.0, 99.0);
        assert_eq!(classify(59.9, &range), ValueStatus::Below);
        assert_eq!(classify(60.0, &range), ValueStatus::Within);
        assert_eq!(classify(99.0, &range), ValueStatus::Within);
        assert_eq!(classify(99.1, &range), ValueStatus::Above);
    }

    #[test]
    fn test_classify_totality() {
        let range = ReferenceRange::new(20.0, 120.0);
        for tenths in -100..2000 {
            let value = tenths as f64 / 10.0;
            let within = range.min <= value && value <= range.max;
            assert_eq!(classify(value, &range) == ValueStatus::Within, within);
        }
    }

    #[test]
    fn test_missing_values_unclassified() {
        let range = ReferenceRange::new(60.0, 99.0);
        assert_eq!(classify_reading(None, &range), None);
        assert_eq!(classify_reading(Some(f64::NAN), &range), None);
        assert_eq!(classify_reading(Some(0.0), &range), Some(ValueStatus::Below));
    }

    #[test]
    fn test_parse_measurement() {
        assert_eq!(parse_measurement(" 105 "), Some(105.0));
        assert_eq!(parse_measurement("7,8"), Some(7.8));
        assert_eq!(parse_measurement(""), None);
        assert_eq!(parse_measurement("abc"), None);
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement("inf"), None);
    }

    #[test]
    fn test_series_lookup_by_time() {
        let times = [TimePoint(0), TimePoint(60), TimePoint(120)];
        let series = MeasurementSeries::from_inputs(&["95", "", "140"]);
        assert_eq!(series.value_at(&times, TimePoint(0)), Some(95.0));
        assert_eq!(series.value_at(&times, TimePoint(60)), None);
        assert_eq!(series.value_at(&times, TimePoint(90)), None);
        let present: Vec<_> = series.present(&times).collect();
        assert_eq!(present, vec![(TimePoint(0), 95.0), (TimePoint(120), 140.0)]);
    }

    #[test]
    fn test_status_rows_skip_missing() {
        let times = vec![TimePoint(0), TimePoint(60)];
        let ranges = ResolvedRanges::resolve(SeriesKind::GeneralGlycemic.series(), &times);
        let values = MeasurementSeries(vec![Some(110.0), None]);
        let rows = status_rows(&times, &values, &ranges);
        assert_eq!(rows[0].status, Some(ValueStatus::Above));
        assert_eq!(rows[1].status, None);
        assert_eq!(rows[1].range, Some(ReferenceRange::new(100.0, 154.0)));
    }
}
