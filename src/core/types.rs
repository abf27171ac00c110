use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

use super::error::{ProjectionError, Result, check_amount, check_rate};

/// Planning horizon used when neither a retirement age nor a retirement goal
/// is available.
pub const DEFAULT_YEARS_TO_RETIREMENT: u32 = 30;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum GoalTerm {
    #[serde(rename = "Short-Term")]
    ShortTerm,
    #[serde(rename = "Mid-Term")]
    MidTerm,
    #[serde(rename = "Long-Term")]
    LongTerm,
    #[serde(other)]
    Other,
}

impl GoalTerm {
    /// Annual return assumed when planning a SIP for a goal of this term.
    pub fn sip_growth_rate(self) -> f64 {
        match self {
            GoalTerm::ShortTerm => 0.06,
            GoalTerm::MidTerm => 0.09,
            GoalTerm::LongTerm => 0.11,
            GoalTerm::Other => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Goal {
    pub name: String,
    #[serde(alias = "amount", deserialize_with = "lenient_amount")]
    pub target_amount: f64,
    #[serde(alias = "years", alias = "timeYears", deserialize_with = "lenient_horizon")]
    pub horizon_years: Option<u32>,
    #[serde(alias = "goalType")]
    pub term: Option<GoalTerm>,
}

impl Goal {
    fn looks_like_retirement(&self) -> bool {
        let name = self.name.to_lowercase();
        name.contains("retire") || name.contains("fire") || self.term == Some(GoalTerm::LongTerm)
    }
}

/// Point-in-time view of a person's finances, as handed over by the data
/// loading layer. Amounts are in currency units; partially-filled records
/// deserialize with missing or malformed amounts read as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialSnapshot {
    #[serde(deserialize_with = "lenient_age")]
    pub age: u32,
    #[serde(alias = "monthlySalary", deserialize_with = "lenient_amount")]
    pub monthly_income: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub monthly_expenses: f64,
    #[serde(deserialize_with = "lenient_amount_map")]
    pub liquid_assets: BTreeMap<String, f64>,
    #[serde(deserialize_with = "lenient_amount_map")]
    pub illiquid_assets: BTreeMap<String, f64>,
    #[serde(deserialize_with = "lenient_amount_map")]
    pub liabilities: BTreeMap<String, f64>,
    pub goals: Vec<Goal>,
}

impl FinancialSnapshot {
    /// Monthly savings available for investing, never negative.
    pub fn monthly_savings(&self) -> f64 {
        (sanitize_amount(self.monthly_income) - sanitize_amount(self.monthly_expenses)).max(0.0)
    }

    pub fn annual_expenses(&self) -> f64 {
        sanitize_amount(self.monthly_expenses) * 12.0
    }

    pub fn has_expense_data(&self) -> bool {
        sanitize_amount(self.monthly_expenses) > 0.0
    }

    /// First goal that reads as a retirement goal.
    pub fn retirement_goal(&self) -> Option<&Goal> {
        self.goals.iter().find(|g| g.looks_like_retirement())
    }

    /// Years until retirement: an explicit retirement age wins, then the
    /// retirement goal's horizon, then [`DEFAULT_YEARS_TO_RETIREMENT`].
    /// A retirement age already passed yields 0.
    pub fn years_to_retirement(&self, retirement_age: Option<u32>) -> u32 {
        match retirement_age {
            Some(retirement_age) => retirement_age.saturating_sub(self.age),
            None => self
                .retirement_goal()
                .and_then(|g| g.horizon_years)
                .unwrap_or(DEFAULT_YEARS_TO_RETIREMENT),
        }
    }
}

/// Negative, NaN and infinite amounts count as zero.
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioConfig {
    /// Annual inflation as a fraction.
    pub inflation_rate: f64,
    /// `None` infers the horizon from the snapshot's retirement goal.
    pub retirement_age: Option<u32>,
    pub conservative_growth_rate: f64,
    /// Annual contribution step-up for Premium NEW FIRE, as a fraction.
    pub step_up_rate: f64,
    pub coast_age: u32,
    pub expected_cagr: f64,
    /// Monthly SIP for Premium NEW FIRE; defaults to the snapshot's savings.
    pub monthly_sip: Option<f64>,
    /// Net worth basis for Coast, Conservative and Premium NEW FIRE.
    pub include_illiquid: bool,
    pub max_years: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            inflation_rate: 0.06,
            retirement_age: Some(60),
            conservative_growth_rate: 0.05,
            step_up_rate: 0.10,
            coast_age: 40,
            expected_cagr: 0.12,
            monthly_sip: None,
            include_illiquid: false,
            max_years: 100,
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        check_rate("inflation_rate", self.inflation_rate)?;
        check_rate("conservative_growth_rate", self.conservative_growth_rate)?;
        check_rate("expected_cagr", self.expected_cagr)?;
        check_rate("step_up_rate", self.step_up_rate)?;
        if self.step_up_rate < 0.0 {
            return Err(ProjectionError::InvalidRate {
                name: "step_up_rate",
                value: self.step_up_rate,
            });
        }
        if let Some(sip) = self.monthly_sip {
            check_amount("monthly_sip", sip)?;
        }
        if self.max_years == 0 {
            return Err(ProjectionError::NonPositiveIterationCap);
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    Basic,
    Lean,
    Fat,
    Coast,
    Conservative,
    PremiumNew,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 6] = [
        ScenarioKind::Basic,
        ScenarioKind::Lean,
        ScenarioKind::Fat,
        ScenarioKind::Coast,
        ScenarioKind::Conservative,
        ScenarioKind::PremiumNew,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScenarioKind::Basic => "Basic FIRE",
            ScenarioKind::Lean => "Lean FIRE",
            ScenarioKind::Fat => "Fat FIRE",
            ScenarioKind::Coast => "Coast FIRE",
            ScenarioKind::Conservative => "Conservative FIRE",
            ScenarioKind::PremiumNew => "Premium NEW FIRE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub kind: ScenarioKind,
    pub target_corpus: f64,
    pub current_corpus: f64,
    pub gap: f64,
    pub years_to_achieve: u32,
    pub age_at_achievement: u32,
    pub achievable_within_horizon: bool,
    /// No expense data yet: targets are zero and nothing was simulated.
    pub insufficient_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fire_target_at_retirement: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_contribution_required: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_track: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_achieve_before_target_age: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_corpus_at_retirement: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_before_retirement: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_monthly_sip: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_up_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_growth_rate: Option<f64>,
}

impl ScenarioResult {
    pub(crate) fn new(kind: ScenarioKind, age: u32, target_corpus: f64, current_corpus: f64) -> Self {
        Self {
            kind,
            target_corpus,
            current_corpus,
            gap: (target_corpus - current_corpus).max(0.0),
            years_to_achieve: 0,
            age_at_achievement: age,
            achievable_within_horizon: true,
            insufficient_data: false,
            target_age: None,
            fire_target_at_retirement: None,
            monthly_contribution_required: None,
            on_track: None,
            can_achieve_before_target_age: None,
            projected_corpus_at_retirement: None,
            shortfall: None,
            years_before_retirement: None,
            initial_monthly_sip: None,
            step_up_percentage: None,
            expected_growth_rate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub results: Vec<ScenarioResult>,
    /// Index into `results` of the earliest achievable scenario.
    pub fastest_index: Option<usize>,
}

impl ScenarioComparison {
    pub fn get(&self, kind: ScenarioKind) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.kind == kind)
    }

    pub fn fastest(&self) -> Option<&ScenarioResult> {
        self.fastest_index.map(|idx| &self.results[idx])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub net_worth: f64,
    pub liquid_net_worth: f64,
    pub basic_fire_number: f64,
    pub new_fire_number: f64,
    pub years_to_retirement: u32,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub monthly_savings: f64,
    /// `(income - expenses) / income`; negative when spending exceeds income.
    pub savings_rate: f64,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSipPlan {
    pub name: String,
    pub term: Option<GoalTerm>,
    pub target_amount: f64,
    pub horizon_years: Option<u32>,
    /// Annual growth assumed for the goal, as a fraction.
    pub annual_rate: f64,
    /// Rounded to two decimals.
    pub monthly_sip: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub year: u32,
    pub corpus: f64,
    pub target: f64,
}

struct LenientAmount;

impl<'de> Visitor<'de> for LenientAmount {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an amount")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<f64, E> {
        Ok(v.trim().parse::<f64>().unwrap_or(0.0))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<f64, E> {
        Ok(0.0)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<f64, E> {
        Ok(0.0)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<f64, E> {
        Ok(0.0)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<f64, D::Error> {
        d.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<f64, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(0.0)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<f64, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(0.0)
    }
}

#[derive(Deserialize)]
struct LenientValue(#[serde(deserialize_with = "lenient_amount")] f64);

fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    d.deserialize_any(LenientAmount)
}

fn lenient_age<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    let age = lenient_amount(d)?;
    Ok(if age.is_finite() && age > 0.0 {
        age.min(u32::MAX as f64) as u32
    } else {
        0
    })
}

fn lenient_horizon<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u32>, D::Error> {
    let years = lenient_amount(d)?.round();
    Ok((years.is_finite() && years >= 1.0).then(|| years.min(u32::MAX as f64) as u32))
}

fn lenient_amount_map<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<BTreeMap<String, f64>, D::Error> {
    let raw = Option::<BTreeMap<String, LenientValue>>::deserialize(d)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, LenientValue(v))| (k, v))
        .collect())
}
