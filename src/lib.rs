//! Glucose/insulin tolerance test reporting
//!
//! Reference ranges are interpolated for the sampling times in use
//! ([`reference`]), each measured value is classified against its range
//! ([`classify`]) and the curve is interpreted against published diagnostic
//! thresholds ([`diagnosis`]). The remaining modules archive, render and
//! edit reports around that core.

pub mod classify;
pub mod config;
pub mod curve;
pub mod diagnosis;
pub mod error;
pub mod export;
pub mod gui;
pub mod reference;
pub mod report;
pub mod session;
pub mod storage;
pub mod units;

pub use classify::{classify, MeasurementSeries, ValueStatus};
pub use curve::CurveConfig;
pub use diagnosis::{evaluate, Finding, Severity};
pub use error::ReportError;
pub use reference::{range_at, ReferenceRange, ReferenceSeries, ResolvedRanges};
