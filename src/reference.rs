//! Reference ranges and interpolation at arbitrary sampling times
//!
//! Canonical tables:
//! - glycemia (OGTT 75g, mg/dL): ADA Standards of Care 2026 for basal and
//!   120', IDF 2024 1-hour plasma glucose for 60', literature ranges elsewhere
//! - pregnancy (mg/dL): IADPSG thresholds confirmed by ADA 2026
//! - insulin (µUI/mL): SIE/AACE consensus, Kraft pattern literature

use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::units::TimePoint;

/// Inclusive reference interval for one sampling time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

impl ReferenceRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// "60 - 99 mg/dL"
    pub fn format(&self, unit: &str) -> String {
        format!(
            "{} - {} {}",
            crate::units::format_value(self.min),
            crate::units::format_value(self.max),
            unit
        )
    }
}

/// Which canonical table a curve is read against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesKind {
    GeneralGlycemic,
    PregnantGlycemic,
    Insulin,
}

impl SeriesKind {
    pub fn series(self) -> &'static ReferenceSeries {
        match self {
            SeriesKind::GeneralGlycemic => &GENERAL_GLYCEMIC,
            SeriesKind::PregnantGlycemic => &PREGNANT_GLYCEMIC,
            SeriesKind::Insulin => &INSULIN,
        }
    }
}

/// Ordered (time, range) table with strictly increasing times
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSeries {
    name: &'static str,
    points: Vec<(TimePoint, ReferenceRange)>,
}

static GENERAL_GLYCEMIC: LazyLock<ReferenceSeries> = LazyLock::new(|| {
    ReferenceSeries::new(
        "general-adult-glycemic",
        vec![
            (TimePoint(0), ReferenceRange::new(60.0, 99.0)),    // normal fasting <100
            (TimePoint(30), ReferenceRange::new(100.0, 170.0)), // early peak
            (TimePoint(60), ReferenceRange::new(100.0, 154.0)), // >=155 intermediate hyperglycemia
            (TimePoint(90), ReferenceRange::new(80.0, 139.0)),
            (TimePoint(120), ReferenceRange::new(60.0, 139.0)), // <140 normal tolerance
            (TimePoint(150), ReferenceRange::new(60.0, 119.0)),
            (TimePoint(180), ReferenceRange::new(60.0, 109.0)),
            (TimePoint(240), ReferenceRange::new(60.0, 104.0)),
            (TimePoint(300), ReferenceRange::new(60.0, 99.0)),
        ],
    )
});

static PREGNANT_GLYCEMIC: LazyLock<ReferenceSeries> = LazyLock::new(|| {
    ReferenceSeries::new(
        "pregnant-glycemic",
        vec![
            (TimePoint(0), ReferenceRange::new(60.0, 91.0)), // >=92 GDM
            (TimePoint(30), ReferenceRange::new(80.0, 160.0)),
            (TimePoint(60), ReferenceRange::new(80.0, 179.0)), // >=180 GDM
            (TimePoint(90), ReferenceRange::new(70.0, 155.0)),
            (TimePoint(120), ReferenceRange::new(60.0, 152.0)), // >=153 GDM
            (TimePoint(150), ReferenceRange::new(60.0, 119.0)),
            (TimePoint(180), ReferenceRange::new(60.0, 109.0)),
        ],
    )
});

static INSULIN: LazyLock<ReferenceSeries> = LazyLock::new(|| {
    ReferenceSeries::new(
        "insulin",
        vec![
            (TimePoint(0), ReferenceRange::new(2.0, 25.0)), // fasting hyperinsulinemia >25
            (TimePoint(30), ReferenceRange::new(20.0, 120.0)),
            (TimePoint(60), ReferenceRange::new(20.0, 120.0)), // peak expected within 30-60'
            (TimePoint(90), ReferenceRange::new(15.0, 80.0)),
            (TimePoint(120), ReferenceRange::new(5.0, 50.0)),
            (TimePoint(150), ReferenceRange::new(3.0, 35.0)),
            (TimePoint(180), ReferenceRange::new(2.0, 25.0)),
            (TimePoint(240), ReferenceRange::new(2.0, 20.0)),
            (TimePoint(300), ReferenceRange::new(2.0, 15.0)),
        ],
    )
});

impl ReferenceSeries {
    /// Build a series. Panics on an empty table, unsorted or duplicated times,
    /// or an inverted range: reference tables are static data, so any of these
    /// is a programming error.
    pub fn new(name: &'static str, points: Vec<(TimePoint, ReferenceRange)>) -> Self {
        assert!(!points.is_empty(), "reference series '{}' has no points", name);
        assert!(
            points.windows(2).all(|w| w[0].0 < w[1].0),
            "reference series '{}' times must be strictly increasing",
            name
        );
        assert!(
            points.iter().all(|(_, r)| r.is_valid()),
            "reference series '{}' has an inverted range",
            name
        );
        Self { name, points }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn canonical_times(&self) -> Vec<TimePoint> {
        self.points.iter().map(|(t, _)| *t).collect()
    }

    pub fn points(&self) -> &[(TimePoint, ReferenceRange)] {
        &self.points
    }

    /// Range at `t`: exact canonical match, boundary clamp outside the table,
    /// otherwise linear interpolation of min and max rounded half-up.
    pub fn range_at(&self, t: TimePoint) -> ReferenceRange {
        if let Ok(idx) = self.points.binary_search_by_key(&t, |(time, _)| *time) {
            return self.points[idx].1;
        }

        let (first_time, first_range) = self.points[0];
        let (last_time, last_range) = self.points[self.points.len() - 1];
        if t <= first_time {
            return first_range;
        }
        if t >= last_time {
            return last_range;
        }

        // first index whose time is past t; exact matches were handled above
        let hi_idx = self.points.partition_point(|(time, _)| *time < t);
        let (lo_time, lo) = self.points[hi_idx - 1];
        let (hi_time, hi) = self.points[hi_idx];

        let ratio = (t.0 - lo_time.0) as f64 / (hi_time.0 - lo_time.0) as f64;
        let range = ReferenceRange {
            min: round_half_up(lo.min + ratio * (hi.min - lo.min)),
            max: round_half_up(lo.max + ratio * (hi.max - lo.max)),
        };
        debug!(
            "Interpolated {} at {}' between {}' and {}': {}-{}",
            self.name, t, lo_time, hi_time, range.min, range.max
        );
        range
    }
}

/// Free-function form of [`ReferenceSeries::range_at`]
pub fn range_at(series: &ReferenceSeries, t: TimePoint) -> ReferenceRange {
    series.range_at(t)
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// One resolved entry: a sampling time and the range in use for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub time: TimePoint,
    #[serde(flatten)]
    pub range: ReferenceRange,
}

/// Ranges for exactly the sampling times of one curve, in curve order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedRanges(Vec<ResolvedEntry>);

impl ResolvedRanges {
    /// Interpolate `series` at every time in `times`
    pub fn resolve(series: &ReferenceSeries, times: &[TimePoint]) -> Self {
        ResolvedRanges(
            times
                .iter()
                .map(|&time| ResolvedEntry { time, range: series.range_at(time) })
                .collect(),
        )
    }

    pub fn from_entries(entries: Vec<ResolvedEntry>) -> Self {
        ResolvedRanges(entries)
    }

    pub fn get(&self, time: TimePoint) -> Option<ReferenceRange> {
        self.0.iter().find(|e| e.time == time).map(|e| e.range)
    }

    /// Replace the range for one time. Rejects unknown times and inverted ranges.
    pub fn set_override(&mut self, time: TimePoint, range: ReferenceRange) -> bool {
        if !range.is_valid() {
            return false;
        }
        match self.0.iter_mut().find(|e| e.time == time) {
            Some(entry) => {
                entry.range = range;
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.0
    }

    pub fn times(&self) -> Vec<TimePoint> {
        self.0.iter().map(|e| e.time).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when there is exactly one entry per time, in the same order
    pub fn matches_times(&self, times: &[TimePoint]) -> bool {
        self.0.len() == times.len() && self.0.iter().zip(times).all(|(e, t)| e.time == *t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising_series() -> ReferenceSeries {
        ReferenceSeries::new(
            "rising",
            vec![
                (TimePoint(0), ReferenceRange::new(10.0, 20.0)),
                (TimePoint(10), ReferenceRange::new(20.0, 40.0)),
                (TimePoint(40), ReferenceRange::new(50.0, 100.0)),
            ],
        )
    }

    #[test]
    fn test_exact_match_returns_stored_range() {
        for kind in [SeriesKind::GeneralGlycemic, SeriesKind::PregnantGlycemic, SeriesKind::Insulin] {
            let series = kind.series();
            for (time, range) in series.points() {
                assert_eq!(series.range_at(*time), *range);
            }
        }
    }

    #[test]
    fn test_clamping_outside_table() {
        let series = SeriesKind::PregnantGlycemic.series();
        assert_eq!(series.range_at(TimePoint(240)), ReferenceRange::new(60.0, 109.0));
        assert_eq!(series.range_at(TimePoint(480)), ReferenceRange::new(60.0, 109.0));

        let shifted = ReferenceSeries::new(
            "shifted",
            vec![
                (TimePoint(30), ReferenceRange::new(5.0, 9.0)),
                (TimePoint(60), ReferenceRange::new(7.0, 11.0)),
            ],
        );
        assert_eq!(shifted.range_at(TimePoint(0)), ReferenceRange::new(5.0, 9.0));
    }

    #[test]
    fn test_interpolation_between_points() {
        let series = SeriesKind::GeneralGlycemic.series();
        // 45' sits halfway between 30' (100-170) and 60' (100-154)
        assert_eq!(series.range_at(TimePoint(45)), ReferenceRange::new(100.0, 162.0));
        // 15' between 0' (60-99) and 30' (100-170): 80 and 134.5 -> 135
        assert_eq!(series.range_at(TimePoint(15)), ReferenceRange::new(80.0, 135.0));
    }

    #[test]
    fn test_interpolation_monotonic_between_brackets() {
        let series = rising_series();
        for t in 11..40 {
            let r = series.range_at(TimePoint(t));
            assert!(r.min >= 20.0 && r.min <= 50.0, "min out of bracket at {}", t);
            assert!(r.max >= 40.0 && r.max <= 100.0, "max out of bracket at {}", t);
        }
        assert_eq!(series.range_at(TimePoint(25)), ReferenceRange::new(35.0, 70.0));
    }

    #[test]
    fn test_single_point_series() {
        let series = ReferenceSeries::new("one", vec![(TimePoint(60), ReferenceRange::new(1.0, 2.0))]);
        assert_eq!(series.range_at(TimePoint(0)), ReferenceRange::new(1.0, 2.0));
        assert_eq!(series.range_at(TimePoint(300)), ReferenceRange::new(1.0, 2.0));
    }

    #[test]
    #[should_panic]
    fn test_empty_series_panics() {
        let _ = ReferenceSeries::new("empty", Vec::new());
    }

    #[test]
    #[should_panic]
    fn test_unsorted_series_panics() {
        let _ = ReferenceSeries::new(
            "unsorted",
            vec![
                (TimePoint(60), ReferenceRange::new(1.0, 2.0)),
                (TimePoint(30), ReferenceRange::new(1.0, 2.0)),
            ],
        );
    }

    #[test]
    fn test_resolve_one_entry_per_time() {
        let times = [TimePoint(0), TimePoint(45), TimePoint(120), TimePoint(400)];
        let resolved = ResolvedRanges::resolve(SeriesKind::Insulin.series(), &times);
        assert!(resolved.matches_times(&times));
        assert_eq!(resolved.get(TimePoint(400)), Some(ReferenceRange::new(2.0, 15.0)));
        assert_eq!(resolved.get(TimePoint(45)), Some(ReferenceRange::new(20.0, 120.0)));
        assert_eq!(resolved.get(TimePoint(30)), None);
    }

    #[test]
    fn test_override_rejects_inverted_range() {
        let times = [TimePoint(0), TimePoint(60)];
        let mut resolved = ResolvedRanges::resolve(SeriesKind::GeneralGlycemic.series(), &times);
        assert!(!resolved.set_override(TimePoint(0), ReferenceRange::new(120.0, 80.0)));
        assert_eq!(resolved.get(TimePoint(0)), Some(ReferenceRange::new(60.0, 99.0)));
        assert!(resolved.set_override(TimePoint(0), ReferenceRange::new(70.0, 105.0)));
        assert_eq!(resolved.get(TimePoint(0)), Some(ReferenceRange::new(70.0, 105.0)));
        assert!(!resolved.set_override(TimePoint(90), ReferenceRange::new(1.0, 2.0)));
        // the canonical table is untouched by overrides
        assert_eq!(
            SeriesKind::GeneralGlycemic.series().range_at(TimePoint(0)),
            ReferenceRange::new(60.0, 99.0)
        );
    }

    #[test]
    fn test_resolved_json_shape() {
        let resolved = ResolvedRanges::resolve(SeriesKind::Insulin.series(), &[TimePoint(0)]);
        let json = serde_json::to_string(&resolved).unwrap();
        assert_eq!(json, r#"[{"time":0,"min":2.0,"max":25.0}]"#);
        let back: ResolvedRanges = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resolved);
    }
}
