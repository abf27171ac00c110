use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{FinancialSnapshot, sanitize_amount};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthBreakdown {
    pub liquid_assets: f64,
    pub illiquid_assets: f64,
    pub liabilities: f64,
    pub net_worth: f64,
    pub liquid_net_worth: f64,
}

fn sum_amounts(values: &BTreeMap<String, f64>) -> f64 {
    values.values().copied().map(sanitize_amount).sum()
}

/// Assets minus liabilities. Illiquid holdings (real estate, retirement
/// funds, jewellery) only count when `include_illiquid` is set.
pub fn net_worth(snapshot: &FinancialSnapshot, include_illiquid: bool) -> f64 {
    let mut assets = sum_amounts(&snapshot.liquid_assets);
    if include_illiquid {
        assets += sum_amounts(&snapshot.illiquid_assets);
    }
    assets - sum_amounts(&snapshot.liabilities)
}

pub fn total_net_worth(snapshot: &FinancialSnapshot) -> f64 {
    net_worth(snapshot, true)
}

pub fn liquid_net_worth(snapshot: &FinancialSnapshot) -> f64 {
    net_worth(snapshot, false)
}

pub fn net_worth_breakdown(snapshot: &FinancialSnapshot) -> NetWorthBreakdown {
    let liquid_assets = sum_amounts(&snapshot.liquid_assets);
    let illiquid_assets = sum_amounts(&snapshot.illiquid_assets);
    let liabilities = sum_amounts(&snapshot.liabilities);
    NetWorthBreakdown {
        liquid_assets,
        illiquid_assets,
        liabilities,
        net_worth: liquid_assets + illiquid_assets - liabilities,
        liquid_net_worth: liquid_assets - liabilities,
    }
}
