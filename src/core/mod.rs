mod allocation;
mod engine;
mod error;
mod milestones;
mod networth;
mod projection;
mod solver;
mod types;

pub use allocation::{
    Allocation, AssetClass, CagrRange, RiskProfile, infer_risk_profile, validate_allocation,
    weighted_cagr,
};
pub use engine::{
    FAT_FIRE_MULTIPLIER, LEAN_FIRE_MULTIPLIER, SAFE_WITHDRAWAL_MULTIPLE, basic_fire,
    basic_fire_number, coast_fire, compare_scenarios, conservative_fire, fat_fire,
    financial_metrics, goal_sip_plan, lean_fire, new_fire_number, premium_new_fire,
    run_projection_trace, run_scenario,
};
pub use error::{ProjectionError, Result};
pub use milestones::{
    JourneyFacts, Milestone, MilestoneState, MilestoneStatus, derive_milestone_state,
};
pub use networth::{
    NetWorthBreakdown, liquid_net_worth, net_worth, net_worth_breakdown, total_net_worth,
};
pub use projection::{
    DEFAULT_MAX_PERIODS, SimulationOutcome, SimulationParams, discount_value, future_value,
    project_forward, projection_path, simulate,
};
pub use solver::{
    ContributionPlan, annual_to_monthly_rate, contribution_plan, required_monthly_contribution,
};
pub use types::{
    DEFAULT_YEARS_TO_RETIREMENT, FinancialMetrics, FinancialSnapshot, Goal, GoalSipPlan, GoalTerm,
    ProjectionPoint, ScenarioComparison, ScenarioConfig, ScenarioKind, ScenarioResult,
    sanitize_amount,
};
