use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use crate::core::{
    Allocation, CagrRange, FinancialMetrics, FinancialSnapshot, GoalSipPlan, JourneyFacts,
    MilestoneState, NetWorthBreakdown, ProjectionPoint, RiskProfile, ScenarioComparison,
    ScenarioConfig, ScenarioKind, compare_scenarios, derive_milestone_state, financial_metrics,
    goal_sip_plan, infer_risk_profile, net_worth_breakdown, run_projection_trace,
    validate_allocation, weighted_cagr,
};

#[derive(Parser, Debug)]
#[command(
    name = "fireplan",
    about = "FIRE projection engine (Basic, Lean, Fat, Coast, Conservative and Premium NEW FIRE)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, env = "FIRE_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Run every scenario for a snapshot file and print the report as JSON.
    Scenarios(ScenarioArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScenarioArgs {
    #[arg(long, help = "Path to a financial snapshot JSON file")]
    snapshot: Option<PathBuf>,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(long, default_value_t = 60, help = "Target retirement age")]
    retirement_age: u32,
    #[arg(
        long,
        default_value_t = false,
        help = "Ignore --retirement-age and take the horizon from the snapshot's retirement goal"
    )]
    infer_retirement_age: bool,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Growth rate for Coast and Conservative FIRE in percent"
    )]
    conservative_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Annual SIP step-up for Premium NEW FIRE in percent"
    )]
    step_up_rate: f64,
    #[arg(long, default_value_t = 40, help = "Age to stop contributing for Coast FIRE")]
    coast_age: u32,
    #[arg(
        long,
        default_value_t = 12.0,
        help = "Expected portfolio CAGR for Premium NEW FIRE in percent"
    )]
    expected_cagr: f64,
    #[arg(
        long,
        help = "Starting monthly SIP for Premium NEW FIRE; defaults to monthly savings"
    )]
    monthly_sip: Option<f64>,
    #[arg(
        long,
        default_value_t = false,
        help = "Count illiquid assets towards Coast, Conservative and Premium NEW FIRE"
    )]
    include_illiquid: bool,
    #[arg(
        long,
        default_value_t = 100,
        help = "Give up on a scenario after this many simulated years"
    )]
    max_years: u32,
}

/// Query/body keys accepted by `/api/scenarios`. Rates are percentages.
/// The flat snapshot keys exist for GET requests, which cannot carry maps;
/// they override whatever a nested `snapshot` holds.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScenarioPayload {
    snapshot: Option<FinancialSnapshot>,
    allocation: Option<Allocation>,

    age: Option<u32>,
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,
    liquid_total: Option<f64>,
    illiquid_total: Option<f64>,
    liabilities_total: Option<f64>,

    inflation_rate: Option<f64>,
    retirement_age: Option<u32>,
    infer_retirement_age: Option<bool>,
    conservative_growth_rate: Option<f64>,
    step_up_rate: Option<f64>,
    coast_age: Option<u32>,
    expected_cagr: Option<f64>,
    monthly_sip: Option<f64>,
    include_illiquid: Option<bool>,
    max_years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MilestonePayload {
    snapshot: Option<FinancialSnapshot>,
    facts: JourneyFacts,
}

#[derive(Debug)]
struct ScenarioRequest {
    snapshot: FinancialSnapshot,
    config: ScenarioConfig,
    allocation: Option<AllocationSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocationSummary {
    cagr: CagrRange,
    risk_profile: RiskProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResponse {
    config: ScenarioConfig,
    fastest: Option<ScenarioKind>,
    comparison: ScenarioComparison,
    metrics: FinancialMetrics,
    net_worth: NetWorthBreakdown,
    projection: Vec<ProjectionPoint>,
    goal_sips: Vec<GoalSipPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allocation: Option<AllocationSummary>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_config(args: &ScenarioArgs) -> Result<ScenarioConfig, String> {
    for (name, rate) in [
        ("--inflation-rate", args.inflation_rate),
        ("--conservative-growth-rate", args.conservative_growth_rate),
        ("--expected-cagr", args.expected_cagr),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(format!("{name} must be > -100"));
        }
    }

    if !args.step_up_rate.is_finite() || args.step_up_rate < 0.0 {
        return Err("--step-up-rate must be >= 0".to_string());
    }

    if let Some(sip) = args.monthly_sip {
        if !sip.is_finite() || sip < 0.0 {
            return Err("--monthly-sip must be >= 0".to_string());
        }
    }

    if args.max_years == 0 {
        return Err("--max-years must be > 0".to_string());
    }

    Ok(ScenarioConfig {
        inflation_rate: args.inflation_rate / 100.0,
        retirement_age: if args.infer_retirement_age {
            None
        } else {
            Some(args.retirement_age)
        },
        conservative_growth_rate: args.conservative_growth_rate / 100.0,
        step_up_rate: args.step_up_rate / 100.0,
        coast_age: args.coast_age,
        expected_cagr: args.expected_cagr / 100.0,
        monthly_sip: args.monthly_sip,
        include_illiquid: args.include_illiquid,
        max_years: args.max_years,
    })
}

fn default_args_for_api() -> ScenarioArgs {
    let defaults = ScenarioConfig::default();
    ScenarioArgs {
        snapshot: None,
        inflation_rate: defaults.inflation_rate * 100.0,
        retirement_age: defaults.retirement_age.unwrap_or(60),
        infer_retirement_age: defaults.retirement_age.is_none(),
        conservative_growth_rate: defaults.conservative_growth_rate * 100.0,
        step_up_rate: defaults.step_up_rate * 100.0,
        coast_age: defaults.coast_age,
        expected_cagr: defaults.expected_cagr * 100.0,
        monthly_sip: defaults.monthly_sip,
        include_illiquid: defaults.include_illiquid,
        max_years: defaults.max_years,
    }
}

fn summarize_allocation(allocation: &Allocation) -> Result<AllocationSummary, String> {
    if !validate_allocation(allocation) {
        return Err("allocation weights must add up to 100".to_string());
    }
    Ok(AllocationSummary {
        cagr: weighted_cagr(allocation),
        risk_profile: infer_risk_profile(allocation),
    })
}

fn apply_total(amounts: &mut BTreeMap<String, f64>, total: Option<f64>) {
    if let Some(v) = total {
        amounts.clear();
        amounts.insert("total".to_string(), v);
    }
}

#[cfg(test)]
fn scenario_request_from_json(json: &str) -> Result<ScenarioRequest, String> {
    let payload = serde_json::from_str::<ScenarioPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    scenario_request_from_payload(payload)
}

fn scenario_request_from_payload(payload: ScenarioPayload) -> Result<ScenarioRequest, String> {
    let mut args = default_args_for_api();
    let mut snapshot = payload.snapshot.unwrap_or_default();

    if let Some(v) = payload.age {
        snapshot.age = v;
    }
    if let Some(v) = payload.monthly_income {
        snapshot.monthly_income = v;
    }
    if let Some(v) = payload.monthly_expenses {
        snapshot.monthly_expenses = v;
    }
    apply_total(&mut snapshot.liquid_assets, payload.liquid_total);
    apply_total(&mut snapshot.illiquid_assets, payload.illiquid_total);
    apply_total(&mut snapshot.liabilities, payload.liabilities_total);

    let allocation = payload
        .allocation
        .as_ref()
        .map(summarize_allocation)
        .transpose()?;

    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.retirement_age {
        args.retirement_age = v;
        args.infer_retirement_age = false;
    }
    if let Some(v) = payload.infer_retirement_age {
        args.infer_retirement_age = v;
    }
    if let Some(v) = payload.conservative_growth_rate {
        args.conservative_growth_rate = v;
    }
    if let Some(v) = payload.step_up_rate {
        args.step_up_rate = v;
    }
    if let Some(v) = payload.coast_age {
        args.coast_age = v;
    }
    // An allocation only stands in for the CAGR when none was given.
    match (payload.expected_cagr, allocation) {
        (Some(v), _) => args.expected_cagr = v,
        (None, Some(summary)) => args.expected_cagr = summary.cagr.midpoint_rate() * 100.0,
        (None, None) => {}
    }
    if let Some(v) = payload.monthly_sip {
        args.monthly_sip = Some(v);
    }
    if let Some(v) = payload.include_illiquid {
        args.include_illiquid = v;
    }
    if let Some(v) = payload.max_years {
        args.max_years = v;
    }

    Ok(ScenarioRequest {
        snapshot,
        config: build_config(&args)?,
        allocation,
    })
}

fn build_scenario_response(request: &ScenarioRequest) -> Result<ScenarioResponse, String> {
    let snapshot = &request.snapshot;
    let config = &request.config;
    let comparison = compare_scenarios(snapshot, config).map_err(|e| e.to_string())?;
    let metrics = financial_metrics(snapshot, config).map_err(|e| e.to_string())?;
    let projection = run_projection_trace(snapshot, config).map_err(|e| e.to_string())?;

    Ok(ScenarioResponse {
        config: *config,
        fastest: comparison.fastest().map(|r| r.kind),
        comparison,
        metrics,
        net_worth: net_worth_breakdown(snapshot),
        projection,
        goal_sips: goal_sip_plan(snapshot),
        allocation: request.allocation,
    })
}

fn build_milestone_response(payload: MilestonePayload) -> MilestoneState {
    let facts = match &payload.snapshot {
        Some(snapshot) => payload.facts.or_snapshot(snapshot),
        None => payload.facts,
    };
    derive_milestone_state(&facts)
}

/// Runs the `scenarios` subcommand and returns the pretty-printed report.
pub fn scenarios_report(args: ScenarioArgs) -> Result<String, String> {
    let snapshot = match &args.snapshot {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            serde_json::from_str::<FinancialSnapshot>(&raw)
                .map_err(|e| format!("invalid snapshot in {}: {e}", path.display()))?
        }
        None => return Err("--snapshot is required".to_string()),
    };
    let request = ScenarioRequest {
        snapshot,
        config: build_config(&args)?,
        allocation: None,
    };
    let response = build_scenario_response(&request)?;
    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let app = Router::new()
        .route(
            "/api/scenarios",
            get(scenarios_get_handler).post(scenarios_post_handler),
        )
        .route("/api/milestones", post(milestones_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("FIRE HTTP API listening on http://{addr}");
    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn scenarios_get_handler(Query(payload): Query<ScenarioPayload>) -> Response {
    scenarios_handler_impl(payload).await
}

async fn scenarios_post_handler(Json(payload): Json<ScenarioPayload>) -> Response {
    scenarios_handler_impl(payload).await
}

async fn scenarios_handler_impl(payload: ScenarioPayload) -> Response {
    let request = match scenario_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            tracing::warn!(error = %msg, "rejected scenario request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match build_scenario_response(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn milestones_handler(Json(payload): Json<MilestonePayload>) -> Response {
    json_response(StatusCode::OK, build_milestone_response(payload))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
