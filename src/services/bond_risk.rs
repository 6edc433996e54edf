// src/services/bond_risk.rs
use crate::models::BondRisk;

/// High-yield OAS (percent) at or above which an inverted curve reads as crisis.
pub const HIGH_YIELD_STRESS_LEVEL: f64 = 6.0;

/// Bond-market risk from the 10Y-2Y spread and the high-yield spread.
/// Missing readings count as 0.
pub fn assess_bond_risk(yield_spread: Option<f64>, high_yield_spread: Option<f64>) -> BondRisk {
    let curve = yield_spread.unwrap_or(0.0);
    let high_yield = high_yield_spread.unwrap_or(0.0);

    if curve < 0.0 && high_yield >= HIGH_YIELD_STRESS_LEVEL {
        BondRisk::FinancialCrisis
    } else if curve < 0.0 {
        BondRisk::RecessionWarning
    } else {
        BondRisk::Stable
    }
}
