// src/services/macro_trend.rs
use crate::models::{CliTrend, MacroReading, Severity, TrendLabel};

/// Structural neutral line of an amplitude-adjusted composite leading indicator.
pub const CLI_NEUTRAL_LINE: f64 = 100.0;

/// Classify three consecutive readings, most recent first.
pub fn classify_cli_trend(curr: f64, prev: f64, pprev: f64) -> CliTrend {
    let diff_now = curr - prev;
    let diff_prev = prev - pprev;

    let (label, severity) = if curr <= CLI_NEUTRAL_LINE {
        if diff_now > 0.0 {
            if diff_now > diff_prev {
                (TrendLabel::RecoveryAccelerating, Severity::StrongPositive)
            } else {
                (TrendLabel::RecoveryDecelerating, Severity::MildPositive)
            }
        } else if diff_now > diff_prev {
            (TrendLabel::ContractionEasing, Severity::MildCaution)
        } else {
            (TrendLabel::ContractionDeepening, Severity::StrongNegative)
        }
    } else if diff_now > 0.0 {
        if diff_now > diff_prev {
            (TrendLabel::ExpansionAccelerating, Severity::Overheating)
        } else {
            (TrendLabel::ExpansionDecelerating, Severity::MildCaution)
        }
    } else if diff_now < diff_prev {
        (TrendLabel::SlowdownAccelerating, Severity::Negative)
    } else {
        (TrendLabel::MildCorrection, Severity::Neutral)
    };

    CliTrend { label, severity }
}

/// `(curr, prev, pprev)` from a series stored oldest first. Non-finite
/// readings are skipped; `None` if fewer than three remain.
pub fn latest_three(readings: &[MacroReading]) -> Option<(f64, f64, f64)> {
    let mut usable = readings.iter().rev().map(|r| r.value).filter(|v| v.is_finite());
    Some((usable.next()?, usable.next()?, usable.next()?))
}

/// Latest usable value of a series.
pub fn latest_value(readings: &[MacroReading]) -> Option<f64> {
    readings.iter().rev().map(|r| r.value).find(|v| v.is_finite())
}
