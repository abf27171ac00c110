use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    UsEquity,
    Debt,
    Gold,
    Reits,
    Crypto,
    Cash,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

/// Expected compound annual growth in percent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CagrRange {
    pub min: f64,
    pub max: f64,
}

impl CagrRange {
    /// Midpoint as a fraction, ready to use as a growth rate.
    pub fn midpoint_rate(self) -> f64 {
        (self.min + self.max) / 200.0
    }
}

impl AssetClass {
    pub fn expected_cagr(self) -> CagrRange {
        let (min, max) = match self {
            AssetClass::Equity => (12.0, 15.0),
            AssetClass::UsEquity => (10.0, 12.0),
            AssetClass::Debt => (6.0, 7.0),
            AssetClass::Gold => (8.0, 10.0),
            AssetClass::Reits => (8.0, 10.0),
            AssetClass::Crypto => (15.0, 25.0),
            AssetClass::Cash => (3.0, 4.0),
        };
        CagrRange { min, max }
    }
}

/// Percentage weight per asset class.
pub type Allocation = BTreeMap<AssetClass, f64>;

/// Blended CAGR of an allocation, rounded to one decimal place.
pub fn weighted_cagr(allocation: &Allocation) -> CagrRange {
    let (min, max) = allocation
        .iter()
        .fold((0.0, 0.0), |(min, max), (class, pct)| {
            let range = class.expected_cagr();
            let weight = pct / 100.0;
            (min + weight * range.min, max + weight * range.max)
        });
    CagrRange {
        min: round_one_decimal(min),
        max: round_one_decimal(max),
    }
}

pub fn validate_allocation(allocation: &Allocation) -> bool {
    let total: f64 = allocation.values().sum();
    (total - 100.0).abs() < 1e-9
}

pub fn infer_risk_profile(allocation: &Allocation) -> RiskProfile {
    let weight = |class: AssetClass| allocation.get(&class).copied().unwrap_or(0.0);
    let high_risk = weight(AssetClass::Equity) + weight(AssetClass::UsEquity) + weight(AssetClass::Crypto);
    if high_risk >= 60.0 {
        RiskProfile::Aggressive
    } else if high_risk >= 35.0 {
        RiskProfile::Moderate
    } else {
        RiskProfile::Conservative
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
