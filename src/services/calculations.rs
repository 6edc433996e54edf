// src/services/calculations.rs
use crate::models::{ForwardTrendSeries, Momentum, TradeSignal};

/// Percent change from `base` to `value`, measured against `|base|`.
/// `None` when the base is zero.
fn percent_change(base: f64, value: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some((value - base) / base.abs() * 100.0)
    }
}

/// Growth, acceleration and trade signal from the three newest forward EPS values.
pub fn calculate_momentum(fwd: f64, prev: f64, pprev: f64) -> Momentum {
    let growth_now = percent_change(prev, fwd);
    let growth_prev = percent_change(pprev, prev);
    let acceleration = growth_now.unwrap_or(0.0) - growth_prev.unwrap_or(0.0);

    let signal = if fwd > prev {
        if acceleration > 0.0 {
            TradeSignal::AggressiveBuy
        } else {
            TradeSignal::Cautious
        }
    } else {
        TradeSignal::SellOrHold
    };

    Momentum {
        forward_eps: fwd,
        growth_now,
        growth_prev,
        acceleration,
        signal,
    }
}

/// Momentum for the newest end of a series; `None` below two points.
pub fn series_momentum(series: &ForwardTrendSeries) -> Option<Momentum> {
    let (fwd, prev, pprev) = series.last_three_values()?;
    Some(calculate_momentum(fwd, prev, pprev))
}

pub fn format_growth(growth: Option<f64>) -> String {
    match growth {
        Some(g) => format!("{:+.2}%", g),
        None => "n/a".to_string(),
    }
}

pub fn format_acceleration(acceleration: f64) -> String {
    format!("{:+.2}%p", acceleration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn slowing_growth_is_cautious() {
        let m = calculate_momentum(110.0, 100.0, 90.0);
        assert_relative_eq!(m.growth_now.unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(m.growth_prev.unwrap(), 11.111111, epsilon = 1e-5);
        assert_relative_eq!(m.acceleration, -1.111111, epsilon = 1e-5);
        assert_eq!(m.signal, TradeSignal::Cautious);
    }

    #[test]
    fn accelerating_growth_is_aggressive_buy() {
        let m = calculate_momentum(120.0, 100.0, 95.0);
        assert!(m.acceleration > 0.0);
        assert_eq!(m.signal, TradeSignal::AggressiveBuy);
    }

    #[test]
    fn flat_or_falling_is_sell_or_hold() {
        assert_eq!(calculate_momentum(100.0, 100.0, 90.0).signal, TradeSignal::SellOrHold);
        assert_eq!(calculate_momentum(90.0, 100.0, 80.0).signal, TradeSignal::SellOrHold);
    }

    #[test]
    fn zero_base_is_unknown_growth() {
        let m = calculate_momentum(10.0, 0.0, 0.0);
        assert_eq!(m.growth_now, None);
        assert_eq!(m.growth_prev, None);
        assert_eq!(m.acceleration, 0.0);
        assert_eq!(m.signal, TradeSignal::Cautious);
    }

    #[test]
    fn negative_base_uses_absolute_value() {
        let m = calculate_momentum(-5.0, -10.0, -10.0);
        assert_relative_eq!(m.growth_now.unwrap(), 50.0, epsilon = 1e-9);
        assert_eq!(m.signal, TradeSignal::AggressiveBuy);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_growth(Some(10.0)), "+10.00%");
        assert_eq!(format_growth(None), "n/a");
        assert_eq!(format_acceleration(-1.111), "-1.11%p");
    }
}
