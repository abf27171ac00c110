use super::error::Result;
use super::networth::{liquid_net_worth, net_worth, total_net_worth};
use super::projection::{
    SimulationOutcome, SimulationParams, discount_value, future_value, project_forward,
    projection_path, simulate,
};
use super::solver::{
    ContributionPlan, annual_to_monthly_rate, contribution_plan, required_monthly_contribution,
};
use super::types::{
    FinancialMetrics, FinancialSnapshot, GoalSipPlan, GoalTerm, ProjectionPoint,
    ScenarioComparison, ScenarioConfig, ScenarioKind, ScenarioResult, sanitize_amount,
};

/// 4% safe withdrawal rate expressed as a multiple of annual expenses.
pub const SAFE_WITHDRAWAL_MULTIPLE: f64 = 25.0;
pub const LEAN_FIRE_MULTIPLIER: f64 = 0.8;
pub const FAT_FIRE_MULTIPLIER: f64 = 2.0;
const PROJECTION_TRACE_MAX_YEARS: u32 = 30;
const GOAL_MAX_HORIZON_YEARS: u32 = 100;

#[derive(Debug, Clone, Copy)]
struct Horizon {
    age: u32,
    years_to_retirement: u32,
    retirement_age: u32,
}

impl Horizon {
    /// Years to retirement never exceed the simulation cap.
    fn resolve(snapshot: &FinancialSnapshot, config: &ScenarioConfig) -> Self {
        let years_to_retirement = snapshot
            .years_to_retirement(config.retirement_age)
            .min(config.max_years);
        Self {
            age: snapshot.age,
            years_to_retirement,
            retirement_age: snapshot.age.saturating_add(years_to_retirement),
        }
    }
}

fn as_years(years: u32) -> i32 {
    i32::try_from(years).unwrap_or(i32::MAX)
}

fn as_months(years: u32) -> i32 {
    as_years(years).saturating_mul(12)
}

/// Expenses × 12 × 25 in today's money.
pub fn basic_fire_number(snapshot: &FinancialSnapshot) -> f64 {
    snapshot.annual_expenses() * SAFE_WITHDRAWAL_MULTIPLE
}

/// FIRE number with annual expenses inflated to the retirement horizon.
pub fn new_fire_number(snapshot: &FinancialSnapshot, config: &ScenarioConfig) -> Result<f64> {
    let horizon = Horizon::resolve(snapshot, config);
    fire_target_at_retirement(snapshot, config, horizon.years_to_retirement)
}

fn fire_target_at_retirement(
    snapshot: &FinancialSnapshot,
    config: &ScenarioConfig,
    years_to_retirement: u32,
) -> Result<f64> {
    let annual_expenses = snapshot.annual_expenses();
    if !annual_expenses.is_finite() {
        return Ok(f64::INFINITY);
    }
    let annual_expenses = future_value(
        annual_expenses,
        config.inflation_rate,
        as_years(years_to_retirement),
    )?;
    Ok(annual_expenses * SAFE_WITHDRAWAL_MULTIPLE)
}

fn insufficient_data(kind: ScenarioKind, age: u32, current_corpus: f64) -> ScenarioResult {
    tracing::debug!(scenario = kind.label(), "no expense data, skipping projection");
    let current_corpus = if current_corpus.is_finite() {
        current_corpus
    } else {
        0.0
    };
    let mut result = ScenarioResult::new(kind, age, 0.0, current_corpus);
    result.gap = 0.0;
    result.achievable_within_horizon = false;
    result.insufficient_data = true;
    result
}

/// Amounts too large to project (overflowed targets, absurd balances) are
/// treated like missing data.
fn out_of_range(amounts: &[f64]) -> bool {
    amounts.iter().any(|v| !v.is_finite())
}

fn record_outcome(result: &mut ScenarioResult, age: u32, outcome: SimulationOutcome) {
    result.years_to_achieve = outcome.periods_elapsed;
    result.age_at_achievement = age.saturating_add(outcome.periods_elapsed);
    result.achievable_within_horizon = outcome.reached_target;
}

fn record_plan(result: &mut ScenarioResult, plan: ContributionPlan) {
    result.monthly_contribution_required = Some(plan.monthly);
    result.on_track = Some(plan.on_track);
}

fn years_to_target(
    current: f64,
    annual_contribution: f64,
    growth_rate: f64,
    target: f64,
    config: &ScenarioConfig,
) -> Result<SimulationOutcome> {
    simulate(
        SimulationParams::new(current, annual_contribution, growth_rate, target)
            .with_max_periods(config.max_years),
    )
}

pub fn basic_fire(snapshot: &FinancialSnapshot, config: &ScenarioConfig) -> Result<ScenarioResult> {
    todays_money_scenario(ScenarioKind::Basic, 1.0, snapshot, config)
}

pub fn lean_fire(snapshot: &FinancialSnapshot, config: &ScenarioConfig) -> Result<ScenarioResult> {
    todays_money_scenario(ScenarioKind::Lean, LEAN_FIRE_MULTIPLIER, snapshot, config)
}

pub fn fat_fire(snapshot: &FinancialSnapshot, config: &ScenarioConfig) -> Result<ScenarioResult> {
    todays_money_scenario(ScenarioKind::Fat, FAT_FIRE_MULTIPLIER, snapshot, config)
}

fn todays_money_scenario(
    kind: ScenarioKind,
    multiplier: f64,
    snapshot: &FinancialSnapshot,
    config: &ScenarioConfig,
) -> Result<ScenarioResult> {
    config.validate()?;
    let current = total_net_worth(snapshot);
    if !snapshot.has_expense_data() {
        return Ok(insufficient_data(kind, snapshot.age, current));
    }

    let target = basic_fire_number(snapshot) * multiplier;
    let annual_savings = snapshot.monthly_savings() * 12.0;
    if out_of_range(&[target, current, annual_savings]) {
        return Ok(insufficient_data(kind, snapshot.age, current));
    }

    let mut result = ScenarioResult::new(kind, snapshot.age, target, current);
    let outcome = years_to_target(
        current,
        annual_savings,
        config.conservative_growth_rate,
        target,
        config,
    )?;
    record_outcome(&mut result, snapshot.age, outcome);
    result.expected_growth_rate = Some(config.conservative_growth_rate);
    Ok(result)
}

/// Corpus needed by the coast age so that compounding alone reaches the
/// inflation-adjusted FIRE number at retirement. A coast age outside
/// `[age, retirement age]` is pulled back into that range.
pub fn coast_fire(snapshot: &FinancialSnapshot, config: &ScenarioConfig) -> Result<ScenarioResult> {
    config.validate()?;
    let horizon = Horizon::resolve(snapshot, config);
    let current = net_worth(snapshot, config.include_illiquid);
    if !snapshot.has_expense_data() {
        return Ok(insufficient_data(ScenarioKind::Coast, horizon.age, current));
    }

    let growth = config.conservative_growth_rate;
    let coast_age = config.coast_age.clamp(horizon.age, horizon.retirement_age);
    let fire_target = fire_target_at_retirement(snapshot, config, horizon.years_to_retirement)?;
    let annual_savings = snapshot.monthly_savings() * 12.0;
    if out_of_range(&[fire_target, current, annual_savings]) {
        return Ok(insufficient_data(ScenarioKind::Coast, horizon.age, current));
    }
    let target = discount_value(
        fire_target,
        growth,
        as_years(horizon.retirement_age - coast_age),
    )?;

    let mut result = ScenarioResult::new(ScenarioKind::Coast, horizon.age, target, current);
    let outcome = years_to_target(current, annual_savings, growth, target, config)?;
    record_outcome(&mut result, horizon.age, outcome);
    record_plan(
        &mut result,
        contribution_plan(
            current,
            target,
            annual_to_monthly_rate(growth),
            as_months(coast_age - horizon.age),
        ),
    );
    result.target_age = Some(coast_age);
    result.fire_target_at_retirement = Some(fire_target);
    result.can_achieve_before_target_age =
        Some(outcome.reached_target && result.age_at_achievement <= coast_age);
    result.expected_growth_rate = Some(growth);
    Ok(result)
}

/// Projects today's savings forward at the conservative rate until the
/// retirement age and checks the result against the inflation-adjusted
/// FIRE number.
pub fn conservative_fire(
    snapshot: &FinancialSnapshot,
    config: &ScenarioConfig,
) -> Result<ScenarioResult> {
    config.validate()?;
    let horizon = Horizon::resolve(snapshot, config);
    let current = net_worth(snapshot, config.include_illiquid);
    if !snapshot.has_expense_data() {
        return Ok(insufficient_data(ScenarioKind::Conservative, horizon.age, current));
    }

    let growth = config.conservative_growth_rate;
    let annual_savings = snapshot.monthly_savings() * 12.0;
    let target = fire_target_at_retirement(snapshot, config, horizon.years_to_retirement)?;
    if out_of_range(&[target, current, annual_savings]) {
        return Ok(insufficient_data(ScenarioKind::Conservative, horizon.age, current));
    }
    let projected = project_forward(
        current,
        annual_savings,
        growth,
        horizon.years_to_retirement,
        0.0,
    )?;

    let mut result = ScenarioResult::new(ScenarioKind::Conservative, horizon.age, target, current);
    let outcome = years_to_target(current, annual_savings, growth, target, config)?;
    record_outcome(&mut result, horizon.age, outcome);
    record_plan(
        &mut result,
        contribution_plan(
            current,
            target,
            annual_to_monthly_rate(growth),
            as_months(horizon.years_to_retirement),
        ),
    );
    result.target_age = Some(horizon.retirement_age);
    result.projected_corpus_at_retirement = Some(projected);
    result.shortfall = Some((target - projected).max(0.0));
    result.can_achieve_before_target_age = Some(projected >= target);
    result.expected_growth_rate = Some(growth);
    Ok(result)
}

/// Step-up SIP at the expected portfolio CAGR: how soon the FIRE number is
/// reached and how many years that leaves before the retirement age.
pub fn premium_new_fire(
    snapshot: &FinancialSnapshot,
    config: &ScenarioConfig,
) -> Result<ScenarioResult> {
    config.validate()?;
    let horizon = Horizon::resolve(snapshot, config);
    let current = net_worth(snapshot, config.include_illiquid);
    if !snapshot.has_expense_data() {
        return Ok(insufficient_data(ScenarioKind::PremiumNew, horizon.age, current));
    }

    let target = fire_target_at_retirement(snapshot, config, horizon.years_to_retirement)?;
    let monthly_sip = config
        .monthly_sip
        .map(sanitize_amount)
        .unwrap_or_else(|| snapshot.monthly_savings());
    if out_of_range(&[target, current, monthly_sip * 12.0]) {
        return Ok(insufficient_data(ScenarioKind::PremiumNew, horizon.age, current));
    }
    let outcome = simulate(
        SimulationParams::new(current, monthly_sip * 12.0, config.expected_cagr, target)
            .with_max_periods(config.max_years)
            .with_step_up(config.step_up_rate),
    )?;

    let mut result = ScenarioResult::new(ScenarioKind::PremiumNew, horizon.age, target, current);
    record_outcome(&mut result, horizon.age, outcome);
    result.target_age = Some(horizon.retirement_age);
    result.years_before_retirement =
        Some(i64::from(horizon.retirement_age) - i64::from(result.age_at_achievement));
    result.can_achieve_before_target_age =
        Some(outcome.reached_target && result.age_at_achievement < horizon.retirement_age);
    result.initial_monthly_sip = Some(monthly_sip);
    result.step_up_percentage = Some(config.step_up_rate * 100.0);
    result.expected_growth_rate = Some(config.expected_cagr);
    Ok(result)
}

pub fn run_scenario(
    kind: ScenarioKind,
    snapshot: &FinancialSnapshot,
    config: &ScenarioConfig,
) -> Result<ScenarioResult> {
    match kind {
        ScenarioKind::Basic => basic_fire(snapshot, config),
        ScenarioKind::Lean => lean_fire(snapshot, config),
        ScenarioKind::Fat => fat_fire(snapshot, config),
        ScenarioKind::Coast => coast_fire(snapshot, config),
        ScenarioKind::Conservative => conservative_fire(snapshot, config),
        ScenarioKind::PremiumNew => premium_new_fire(snapshot, config),
    }
}

/// Runs every scenario and picks the earliest achievable one: fewest years,
/// then the smaller target corpus, then declaration order.
///
/// Each scenario is timed against its own target, so "fastest" is not a
/// like-for-like race. Lean never finishes after Basic, and Coast only has to
/// reach the discounted coast number. Callers wanting the earliest full FIRE
/// date should read the Basic, Conservative or Premium NEW results directly.
pub fn compare_scenarios(
    snapshot: &FinancialSnapshot,
    config: &ScenarioConfig,
) -> Result<ScenarioComparison> {
    config.validate()?;
    let results = ScenarioKind::ALL
        .iter()
        .map(|&kind| run_scenario(kind, snapshot, config))
        .collect::<Result<Vec<_>>>()?;
    let fastest_index = fastest_achievable(&results);
    Ok(ScenarioComparison {
        results,
        fastest_index,
    })
}

fn fastest_achievable(results: &[ScenarioResult]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.achievable_within_horizon && !r.insufficient_data)
        .min_by(|(_, a), (_, b)| {
            a.years_to_achieve
                .cmp(&b.years_to_achieve)
                .then_with(|| a.target_corpus.total_cmp(&b.target_corpus))
        })
        .map(|(idx, _)| idx)
}

pub fn financial_metrics(
    snapshot: &FinancialSnapshot,
    config: &ScenarioConfig,
) -> Result<FinancialMetrics> {
    config.validate()?;
    let monthly_income = sanitize_amount(snapshot.monthly_income);
    let monthly_expenses = sanitize_amount(snapshot.monthly_expenses);
    let savings_rate = if monthly_income > 0.0 {
        (monthly_income - monthly_expenses) / monthly_income
    } else {
        0.0
    };

    Ok(FinancialMetrics {
        net_worth: total_net_worth(snapshot),
        liquid_net_worth: liquid_net_worth(snapshot),
        basic_fire_number: basic_fire_number(snapshot),
        new_fire_number: new_fire_number(snapshot, config)?,
        years_to_retirement: Horizon::resolve(snapshot, config).years_to_retirement,
        monthly_income,
        monthly_expenses,
        monthly_savings: snapshot.monthly_savings(),
        savings_rate,
        age: snapshot.age,
    })
}

/// Year-by-year corpus against the inflation-adjusted FIRE number, growing
/// full net worth at the conservative rate. Capped at 30 years.
pub fn run_projection_trace(
    snapshot: &FinancialSnapshot,
    config: &ScenarioConfig,
) -> Result<Vec<ProjectionPoint>> {
    config.validate()?;
    let horizon = Horizon::resolve(snapshot, config);
    let target = fire_target_at_retirement(snapshot, config, horizon.years_to_retirement)?;
    let current = total_net_worth(snapshot);
    let annual_savings = snapshot.monthly_savings() * 12.0;
    if out_of_range(&[current, annual_savings]) {
        tracing::debug!("snapshot amounts out of range, no projection trace");
        return Ok(Vec::new());
    }
    let years = horizon.years_to_retirement.min(PROJECTION_TRACE_MAX_YEARS);
    let path = projection_path(
        current,
        annual_savings,
        config.conservative_growth_rate,
        years,
        0.0,
    )?;

    Ok(path
        .into_iter()
        .zip(0..)
        .map(|(corpus, year)| ProjectionPoint {
            year,
            corpus,
            target,
        })
        .collect())
}

/// Monthly SIP that funds each goal from nothing by its deadline, growing at
/// the rate its term implies. A goal without a horizon is due now, and
/// horizons beyond a century are cut to one.
pub fn goal_sip_plan(snapshot: &FinancialSnapshot) -> Vec<GoalSipPlan> {
    snapshot
        .goals
        .iter()
        .map(|goal| {
            let target_amount = sanitize_amount(goal.target_amount);
            let annual_rate = goal.term.map_or(0.0, GoalTerm::sip_growth_rate);
            let months = goal
                .horizon_years
                .map_or(0, |years| as_months(years.min(GOAL_MAX_HORIZON_YEARS)));
            let monthly_sip = required_monthly_contribution(
                0.0,
                target_amount,
                annual_to_monthly_rate(annual_rate),
                months,
            );
            GoalSipPlan {
                name: goal.name.clone(),
                term: goal.term,
                target_amount,
                horizon_years: goal.horizon_years,
                annual_rate,
                monthly_sip: round_to_cents(monthly_sip.max(0.0)),
            }
        })
        .collect()
}

fn round_to_cents(value: f64) -> f64 {
    let cents = value * 100.0;
    if cents.is_finite() {
        cents.round() / 100.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ProjectionError;
    use crate::core::types::{Goal, GoalTerm};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use std::collections::BTreeMap;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn amounts(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn salaried_thirty_year_old() -> FinancialSnapshot {
        FinancialSnapshot {
            age: 30,
            monthly_income: 100_000.0,
            monthly_expenses: 50_000.0,
            ..FinancialSnapshot::default()
        }
    }

    #[test]
    fn lean_and_fat_are_fixed_multiples_of_basic() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.liquid_assets = amounts(&[("equity", 1_250_000.0)]);
        let config = ScenarioConfig::default();

        let basic = basic_fire(&snapshot, &config).expect("basic");
        let lean = lean_fire(&snapshot, &config).expect("lean");
        let fat = fat_fire(&snapshot, &config).expect("fat");

        assert_eq!(basic.target_corpus, 15_000_000.0);
        assert_eq!(lean.target_corpus, 0.8 * basic.target_corpus);
        assert_eq!(fat.target_corpus, 2.0 * basic.target_corpus);
        assert!(lean.years_to_achieve <= basic.years_to_achieve);
        assert!(basic.years_to_achieve <= fat.years_to_achieve);
    }

    #[test]
    fn basic_fire_uses_full_net_worth_without_inflation() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.liquid_assets = amounts(&[("cash", 500_000.0)]);
        snapshot.illiquid_assets = amounts(&[("realEstate", 3_000_000.0)]);
        snapshot.liabilities = amounts(&[("homeLoan", 1_000_000.0)]);
        let config = ScenarioConfig {
            inflation_rate: 0.12,
            ..ScenarioConfig::default()
        };

        let basic = basic_fire(&snapshot, &config).expect("basic");
        assert_eq!(basic.target_corpus, 50_000.0 * 12.0 * 25.0);
        assert_eq!(basic.current_corpus, 2_500_000.0);
        assert_eq!(basic.gap, 12_500_000.0);
        assert_eq!(basic.age_at_achievement, 30 + basic.years_to_achieve);
    }

    #[test]
    fn conservative_fire_matches_closed_form_example() {
        let snapshot = salaried_thirty_year_old();
        let config = ScenarioConfig::default();

        let result = conservative_fire(&snapshot, &config).expect("conservative");
        let expected_target = 50_000.0 * 12.0 * 1.06_f64.powi(30) * 25.0;
        assert_close(result.target_corpus, expected_target, 1e-6);

        let annuity = 600_000.0 * (1.05_f64.powi(30) - 1.0) / 0.05;
        let projected = result.projected_corpus_at_retirement.expect("projection");
        assert_close(projected, annuity, 1e-3);
        assert_eq!(result.can_achieve_before_target_age, Some(annuity >= expected_target));
        assert_eq!(result.can_achieve_before_target_age, Some(false));
        assert_close(result.shortfall.expect("shortfall"), expected_target - annuity, 1e-3);

        assert_eq!(result.years_to_achieve, 44);
        assert_eq!(result.age_at_achievement, 74);
        assert!(result.achievable_within_horizon);
        assert_eq!(result.target_age, Some(60));
        assert!(result.monthly_contribution_required.expect("pmt") > 50_000.0);
        assert_eq!(result.on_track, Some(false));
    }

    #[test]
    fn past_retirement_age_clamps_horizon_to_zero() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.age = 65;
        let config = ScenarioConfig::default();

        let result = conservative_fire(&snapshot, &config).expect("conservative");
        assert_eq!(result.target_corpus, 50_000.0 * 12.0 * 25.0);
        assert_eq!(result.target_age, Some(65));
        assert_eq!(result.projected_corpus_at_retirement, Some(0.0));

        let metrics = financial_metrics(&snapshot, &config).expect("metrics");
        assert_eq!(metrics.years_to_retirement, 0);
        assert_eq!(metrics.new_fire_number, metrics.basic_fire_number);

        let premium = premium_new_fire(&snapshot, &config).expect("premium");
        assert_eq!(premium.target_corpus, 50_000.0 * 12.0 * 25.0);
        assert_eq!(premium.can_achieve_before_target_age, Some(false));
    }

    #[test]
    fn coast_fire_discounts_target_back_to_coast_age() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.liquid_assets = amounts(&[("equity", 2_000_000.0)]);
        snapshot.illiquid_assets = amounts(&[("realEstate", 9_000_000.0)]);
        let config = ScenarioConfig::default();

        let result = coast_fire(&snapshot, &config).expect("coast");
        let fire_target = 600_000.0 * 1.06_f64.powi(30) * 25.0;
        assert_close(
            result.fire_target_at_retirement.expect("fire target"),
            fire_target,
            1e-6,
        );
        assert_close(result.target_corpus, fire_target / 1.05_f64.powi(20), 1e-6);
        assert_eq!(result.current_corpus, 2_000_000.0);
        assert_eq!(result.target_age, Some(40));
        assert!(result.monthly_contribution_required.expect("pmt") > 0.0);

        let with_property = coast_fire(
            &snapshot,
            &ScenarioConfig {
                include_illiquid: true,
                ..config
            },
        )
        .expect("coast");
        assert_eq!(with_property.current_corpus, 11_000_000.0);
        assert!(with_property.years_to_achieve <= result.years_to_achieve);
    }

    #[test]
    fn coast_age_in_the_past_coasts_from_today() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.age = 45;
        let result = coast_fire(&snapshot, &ScenarioConfig::default()).expect("coast");
        let fire_target = 600_000.0 * 1.06_f64.powi(15) * 25.0;
        assert_eq!(result.target_age, Some(45));
        assert_close(result.target_corpus, fire_target / 1.05_f64.powi(15), 1e-6);
        // Collapsed horizon: the whole gap is due at once.
        assert_close(
            result.monthly_contribution_required.expect("pmt"),
            result.gap,
            1e-6,
        );
    }

    #[test]
    fn premium_step_up_reaches_fire_sooner() {
        let snapshot = salaried_thirty_year_old();
        let config = ScenarioConfig {
            monthly_sip: Some(50_000.0),
            ..ScenarioConfig::default()
        };

        let stepped = premium_new_fire(&snapshot, &config).expect("premium");
        assert_eq!(stepped.years_to_achieve, 20);
        assert_eq!(stepped.age_at_achievement, 50);
        assert_eq!(stepped.years_before_retirement, Some(10));
        assert_eq!(stepped.can_achieve_before_target_age, Some(true));
        assert_close(stepped.step_up_percentage.expect("step-up"), 10.0, 1e-12);
        assert_eq!(stepped.initial_monthly_sip, Some(50_000.0));

        let flat = premium_new_fire(
            &snapshot,
            &ScenarioConfig {
                step_up_rate: 0.0,
                ..config
            },
        )
        .expect("premium");
        assert_eq!(flat.years_to_achieve, 26);
        assert_eq!(flat.years_before_retirement, Some(4));
    }

    #[test]
    fn premium_reports_years_past_retirement_as_negative() {
        let snapshot = salaried_thirty_year_old();
        let config = ScenarioConfig {
            monthly_sip: Some(10_000.0),
            step_up_rate: 0.0,
            expected_cagr: 0.08,
            ..ScenarioConfig::default()
        };
        let result = premium_new_fire(&snapshot, &config).expect("premium");
        assert!(result.age_at_achievement > 60);
        assert_eq!(
            result.years_before_retirement,
            Some(60 - i64::from(result.age_at_achievement))
        );
        assert_eq!(result.can_achieve_before_target_age, Some(false));
    }

    #[test]
    fn zero_expenses_yield_insufficient_data_everywhere() {
        let snapshot = FinancialSnapshot {
            age: 28,
            monthly_income: 80_000.0,
            liquid_assets: amounts(&[("cash", 100_000.0)]),
            ..FinancialSnapshot::default()
        };
        let comparison =
            compare_scenarios(&snapshot, &ScenarioConfig::default()).expect("comparison");

        assert_eq!(comparison.results.len(), ScenarioKind::ALL.len());
        for result in &comparison.results {
            assert!(result.insufficient_data, "{:?}", result.kind);
            assert_eq!(result.target_corpus, 0.0);
            assert_eq!(result.gap, 0.0);
            assert_eq!(result.years_to_achieve, 0);
        }
        assert_eq!(comparison.fastest_index, None);
    }

    #[test]
    fn zero_savings_and_zero_growth_hit_the_cap() {
        let snapshot = FinancialSnapshot {
            age: 30,
            monthly_income: 50_000.0,
            monthly_expenses: 50_000.0,
            ..FinancialSnapshot::default()
        };
        let config = ScenarioConfig {
            conservative_growth_rate: 0.0,
            max_years: 100,
            ..ScenarioConfig::default()
        };

        let basic = basic_fire(&snapshot, &config).expect("basic");
        assert_eq!(basic.years_to_achieve, 100);
        assert!(!basic.achievable_within_horizon);

        let conservative = conservative_fire(&snapshot, &config).expect("conservative");
        assert_eq!(conservative.years_to_achieve, 100);
        assert_eq!(conservative.shortfall, Some(conservative.target_corpus));
    }

    #[test]
    fn retirement_goal_sets_horizon_when_age_is_not_configured() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.goals = vec![
            Goal {
                name: "Car upgrade".to_string(),
                target_amount: 1_500_000.0,
                horizon_years: Some(4),
                term: Some(GoalTerm::ShortTerm),
            },
            Goal {
                name: "Retirement".to_string(),
                target_amount: 0.0,
                horizon_years: Some(20),
                term: Some(GoalTerm::LongTerm),
            },
        ];
        let config = ScenarioConfig {
            retirement_age: None,
            ..ScenarioConfig::default()
        };

        let result = conservative_fire(&snapshot, &config).expect("conservative");
        assert_eq!(result.target_age, Some(50));
        assert_close(
            result.target_corpus,
            600_000.0 * 1.06_f64.powi(20) * 25.0,
            1e-6,
        );
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let snapshot = salaried_thirty_year_old();
        let config = ScenarioConfig {
            max_years: 0,
            ..ScenarioConfig::default()
        };
        assert_eq!(
            compare_scenarios(&snapshot, &config),
            Err(ProjectionError::NonPositiveIterationCap)
        );

        let config = ScenarioConfig {
            expected_cagr: f64::NAN,
            ..ScenarioConfig::default()
        };
        assert!(premium_new_fire(&snapshot, &config).is_err());
    }

    #[test]
    fn fastest_scenario_breaks_ties_on_target_then_order() {
        let mut a = ScenarioResult::new(ScenarioKind::Basic, 30, 100.0, 0.0);
        a.years_to_achieve = 10;
        let mut b = ScenarioResult::new(ScenarioKind::Lean, 30, 80.0, 0.0);
        b.years_to_achieve = 10;
        let mut c = ScenarioResult::new(ScenarioKind::Coast, 30, 80.0, 0.0);
        c.years_to_achieve = 10;
        let mut unreachable = ScenarioResult::new(ScenarioKind::Fat, 30, 1.0, 0.0);
        unreachable.years_to_achieve = 1;
        unreachable.achievable_within_horizon = false;

        assert_eq!(fastest_achievable(&[a.clone(), b.clone(), c.clone()]), Some(1));
        assert_eq!(fastest_achievable(&[a.clone(), c, b]), Some(1));
        assert_eq!(fastest_achievable(&[unreachable.clone(), a]), Some(1));
        assert_eq!(fastest_achievable(&[unreachable]), None);
    }

    #[test]
    fn comparison_exposes_each_scenario_once() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.liquid_assets = amounts(&[("equity", 3_000_000.0)]);
        let comparison =
            compare_scenarios(&snapshot, &ScenarioConfig::default()).expect("comparison");
        for kind in ScenarioKind::ALL {
            assert_eq!(comparison.get(kind).map(|r| r.kind), Some(kind));
        }
        let fastest = comparison.fastest().expect("something is achievable");
        assert!(fastest.achievable_within_horizon);
        assert!(
            comparison
                .results
                .iter()
                .filter(|r| r.achievable_within_horizon)
                .all(|r| r.years_to_achieve >= fastest.years_to_achieve)
        );
    }

    #[test]
    fn fastest_never_picks_basic_or_fat_over_an_achievable_lean() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.liquid_assets = amounts(&[("equity", 3_000_000.0)]);
        let comparison =
            compare_scenarios(&snapshot, &ScenarioConfig::default()).expect("comparison");
        let lean = comparison.get(ScenarioKind::Lean).expect("lean");
        assert!(lean.achievable_within_horizon);

        let fastest = comparison.fastest().expect("fastest");
        assert_ne!(fastest.kind, ScenarioKind::Basic);
        assert_ne!(fastest.kind, ScenarioKind::Fat);
        assert!(fastest.years_to_achieve <= lean.years_to_achieve);
    }

    #[test]
    fn oversized_goal_horizon_is_cut_to_the_iteration_cap() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.goals = vec![Goal {
            name: "Retirement".to_string(),
            target_amount: 0.0,
            horizon_years: Some(20_000),
            term: Some(GoalTerm::LongTerm),
        }];
        let config = ScenarioConfig {
            retirement_age: None,
            ..ScenarioConfig::default()
        };

        let comparison = compare_scenarios(&snapshot, &config).expect("comparison");
        let conservative = comparison
            .get(ScenarioKind::Conservative)
            .expect("conservative");
        assert_eq!(conservative.target_age, Some(130));
        assert!(conservative.target_corpus.is_finite());
        assert_close(
            conservative.target_corpus,
            600_000.0 * 1.06_f64.powi(100) * 25.0,
            1e-3,
        );

        let metrics = financial_metrics(&snapshot, &config).expect("metrics");
        assert_eq!(metrics.years_to_retirement, 100);
        assert!(run_projection_trace(&snapshot, &config).is_ok());
    }

    #[test]
    fn overflowing_amounts_degrade_to_insufficient_data() {
        let huge_expenses = FinancialSnapshot {
            age: 30,
            monthly_expenses: 1e307,
            ..FinancialSnapshot::default()
        };
        let huge_balances = FinancialSnapshot {
            age: 30,
            monthly_income: 100_000.0,
            monthly_expenses: 50_000.0,
            liquid_assets: amounts(&[("equity", 1e308), ("debt", 1e308)]),
            ..FinancialSnapshot::default()
        };
        let config = ScenarioConfig::default();

        for snapshot in [&huge_expenses, &huge_balances] {
            let comparison = compare_scenarios(snapshot, &config).expect("comparison");
            for result in &comparison.results {
                assert!(result.insufficient_data, "{:?}", result.kind);
                assert_eq!(result.target_corpus, 0.0);
                assert_eq!(result.current_corpus, 0.0);
            }
            assert_eq!(comparison.fastest_index, None);
            assert!(financial_metrics(snapshot, &config).is_ok());
            assert!(run_projection_trace(snapshot, &config).is_ok());
        }

        assert!(basic_fire(&huge_expenses, &config).expect("basic").insufficient_data);
        assert!(run_projection_trace(&huge_balances, &config)
            .expect("trace")
            .is_empty());
    }

    #[test]
    fn goal_sip_plan_uses_term_rates() {
        let snapshot = FinancialSnapshot {
            goals: vec![
                Goal {
                    name: "House".to_string(),
                    target_amount: 1_000_000.0,
                    horizon_years: Some(10),
                    term: Some(GoalTerm::LongTerm),
                },
                Goal {
                    name: "Car".to_string(),
                    target_amount: 500_000.0,
                    horizon_years: Some(3),
                    term: Some(GoalTerm::ShortTerm),
                },
                Goal {
                    name: "Sabbatical".to_string(),
                    target_amount: 120_000.0,
                    horizon_years: Some(1),
                    term: None,
                },
                Goal {
                    name: "Wedding".to_string(),
                    target_amount: 300_000.0,
                    horizon_years: None,
                    term: Some(GoalTerm::MidTerm),
                },
            ],
            ..FinancialSnapshot::default()
        };

        let plan = goal_sip_plan(&snapshot);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0].name, "House");
        assert_close(plan[0].annual_rate, 0.11, 1e-12);
        assert_close(plan[0].monthly_sip, 4_608.33, 1e-9);
        assert_close(plan[1].monthly_sip, 12_710.97, 1e-9);
        assert_eq!(plan[2].annual_rate, 0.0);
        assert_close(plan[2].monthly_sip, 10_000.0, 1e-9);
        assert_close(plan[3].annual_rate, 0.09, 1e-12);
        assert_close(plan[3].monthly_sip, 300_000.0, 1e-9);
    }

    #[test]
    fn goal_sip_plan_survives_absurd_goals() {
        let snapshot = FinancialSnapshot {
            goals: vec![Goal {
                name: "Forever".to_string(),
                target_amount: -50.0,
                horizon_years: Some(u32::MAX),
                term: Some(GoalTerm::LongTerm),
            }],
            ..FinancialSnapshot::default()
        };
        let plan = goal_sip_plan(&snapshot);
        assert_eq!(plan[0].target_amount, 0.0);
        assert_eq!(plan[0].monthly_sip, 0.0);
    }

    #[test]
    fn metrics_report_negative_savings_rate() {
        let snapshot = FinancialSnapshot {
            age: 40,
            monthly_income: 40_000.0,
            monthly_expenses: 50_000.0,
            liquid_assets: amounts(&[("cash", 300_000.0)]),
            illiquid_assets: amounts(&[("gold", 200_000.0)]),
            ..FinancialSnapshot::default()
        };
        let metrics = financial_metrics(&snapshot, &ScenarioConfig::default()).expect("metrics");
        assert_close(metrics.savings_rate, -0.25, 1e-12);
        assert_eq!(metrics.monthly_savings, 0.0);
        assert_eq!(metrics.net_worth, 500_000.0);
        assert_eq!(metrics.liquid_net_worth, 300_000.0);
        assert_eq!(metrics.years_to_retirement, 20);
        assert_eq!(metrics.basic_fire_number, 15_000_000.0);
    }

    #[test]
    fn projection_trace_is_capped_at_thirty_years() {
        let mut snapshot = salaried_thirty_year_old();
        snapshot.age = 22;
        let trace = run_projection_trace(&snapshot, &ScenarioConfig::default()).expect("trace");
        assert_eq!(trace.len(), 31);
        assert_eq!(trace[0].year, 0);
        assert_eq!(trace[0].corpus, 0.0);
        assert_eq!(trace[1].corpus, 600_000.0);
        assert_eq!(trace[30].year, 30);
        assert!(trace.iter().all(|p| p.target == trace[0].target));

        snapshot.age = 55;
        let short = run_projection_trace(&snapshot, &ScenarioConfig::default()).expect("trace");
        assert_eq!(short.len(), 6);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn multipliers_hold_for_any_expense_level(
            expenses in 1.0f64..1_000_000.0,
            income in 0.0f64..2_000_000.0,
            age in 18u32..80,
        ) {
            let snapshot = FinancialSnapshot {
                age,
                monthly_income: income,
                monthly_expenses: expenses,
                ..FinancialSnapshot::default()
            };
            let config = ScenarioConfig::default();
            let basic = basic_fire(&snapshot, &config).expect("basic");
            let lean = lean_fire(&snapshot, &config).expect("lean");
            let fat = fat_fire(&snapshot, &config).expect("fat");
            prop_assert_eq!(lean.target_corpus, 0.8 * basic.target_corpus);
            prop_assert_eq!(fat.target_corpus, 2.0 * basic.target_corpus);
            prop_assert!(basic.years_to_achieve <= config.max_years);
        }

        #[test]
        fn more_liquid_assets_never_delay_conservative_fire(
            cash in 0.0f64..20_000_000.0,
            extra in 0.0f64..20_000_000.0,
            expenses in 10_000.0f64..200_000.0,
            income in 0.0f64..400_000.0,
        ) {
            let base = FinancialSnapshot {
                age: 30,
                monthly_income: income,
                monthly_expenses: expenses,
                liquid_assets: amounts(&[("cash", cash)]),
                ..FinancialSnapshot::default()
            };
            let richer = FinancialSnapshot {
                liquid_assets: amounts(&[("cash", cash + extra)]),
                ..base.clone()
            };
            let config = ScenarioConfig::default();
            let lower = conservative_fire(&base, &config).expect("conservative");
            let higher = conservative_fire(&richer, &config).expect("conservative");
            prop_assert!(higher.years_to_achieve <= lower.years_to_achieve);
            prop_assert!(higher.shortfall <= lower.shortfall);
        }
    }
}
