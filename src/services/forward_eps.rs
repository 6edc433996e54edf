// src/services/forward_eps.rs
use chrono::{Datelike, NaiveDate};

use crate::models::{ForwardPoint, ForwardTrendSeries, QuarterEpsMap, QuarterKey};

/// Number of month-end anchors in a series, the newest one included.
pub const WINDOW_MONTHS: usize = 13;
/// Forward months looked up per anchor.
pub const FORWARD_MONTHS: u32 = 12;
/// Anchors with fewer resolved forward months get the 0 sentinel.
pub const MIN_COVERED_MONTHS: u8 = 6;

/// Last day of the given month.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// `(year, month)` shifted by a signed number of months.
fn shift_month(year: i32, month: u32, offset: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + offset;
    (index.div_euclid(12), (index.rem_euclid(12) + 1) as u32)
}

/// The latest month-end on or before `today`.
pub fn last_month_end(today: NaiveDate) -> Option<NaiveDate> {
    let this_month = month_end(today.year(), today.month())?;
    if this_month == today {
        return Some(today);
    }
    let (year, month) = shift_month(today.year(), today.month(), -1);
    month_end(year, month)
}

/// The 13 month-end anchors ending at `today`, oldest first.
pub fn anchor_dates(today: NaiveDate) -> Vec<NaiveDate> {
    let Some(latest) = last_month_end(today) else {
        return Vec::new();
    };
    (0..WINDOW_MONTHS as i32)
        .rev()
        .filter_map(|back| {
            let (year, month) = shift_month(latest.year(), latest.month(), -back);
            month_end(year, month)
        })
        .collect()
}

/// Rolling 12M forward EPS for one anchor: `(value, months_covered)`.
fn forward_eps_at(map: &QuarterEpsMap, anchor: NaiveDate) -> (f64, u8) {
    let mut sum = 0.0;
    let mut covered: u8 = 0;

    for offset in 1..=FORWARD_MONTHS {
        let (year, month) = shift_month(anchor.year(), anchor.month(), offset as i32);
        let eps = QuarterKey::from_month(year, month).and_then(|key| map.get(&key));
        if let Some(eps) = eps {
            sum += eps / 3.0;
            covered += 1;
        }
    }

    if covered >= MIN_COVERED_MONTHS {
        (sum * (FORWARD_MONTHS as f64 / covered as f64), covered)
    } else {
        (0.0, covered)
    }
}

/// Monthly series of 12M forward EPS at month-ends, oldest first.
///
/// An empty map gives an empty series; anything else gives exactly
/// [`WINDOW_MONTHS`] points.
pub fn forward_eps_series(map: &QuarterEpsMap, today: NaiveDate) -> ForwardTrendSeries {
    if map.is_empty() {
        return ForwardTrendSeries::default();
    }

    let points = anchor_dates(today)
        .into_iter()
        .map(|month_end| {
            let (value, months_covered) = forward_eps_at(map, month_end);
            ForwardPoint {
                month_end,
                value,
                months_covered,
            }
        })
        .collect();

    ForwardTrendSeries { points }
}
