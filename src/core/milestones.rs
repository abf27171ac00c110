use serde::{Deserialize, Serialize};

use super::types::FinancialSnapshot;

/// Completion facts gathered by the host. `None` means the fact could not be
/// resolved (missing record, failed fetch) and counts as not done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JourneyFacts {
    pub has_financial_data: Option<bool>,
    pub has_net_worth: Option<bool>,
    pub has_fire_calculation: Option<bool>,
    pub has_tax_plan: Option<bool>,
    pub has_risk_assessment: Option<bool>,
    pub has_portfolio_holdings: Option<bool>,
    pub has_asset_allocation: Option<bool>,
    pub has_goals: Option<bool>,
    pub has_financial_plan: Option<bool>,
    pub has_consultation: Option<bool>,
    pub has_automated_sip: Option<bool>,
    pub has_active_monitoring: Option<bool>,
    pub has_achieved_freedom: Option<bool>,
}

impl JourneyFacts {
    /// Facts that can be read straight off a snapshot. Any asset counts as a
    /// net worth record; an empty liabilities map reads as "no debt".
    pub fn from_snapshot(snapshot: &FinancialSnapshot) -> Self {
        let has_assets = !snapshot.liquid_assets.is_empty() || !snapshot.illiquid_assets.is_empty();
        let has_financial_data = has_assets
            || !snapshot.liabilities.is_empty()
            || snapshot.monthly_income > 0.0
            || snapshot.monthly_expenses > 0.0;
        Self {
            has_financial_data: Some(has_financial_data),
            has_net_worth: Some(has_assets),
            has_goals: Some(!snapshot.goals.is_empty()),
            ..Self::default()
        }
    }

    /// Fills facts this set left unresolved with the snapshot-derived ones.
    pub fn or_snapshot(self, snapshot: &FinancialSnapshot) -> Self {
        let derived = Self::from_snapshot(snapshot);
        Self {
            has_financial_data: self.has_financial_data.or(derived.has_financial_data),
            has_net_worth: self.has_net_worth.or(derived.has_net_worth),
            has_goals: self.has_goals.or(derived.has_goals),
            ..self
        }
    }
}

fn known(fact: Option<bool>) -> bool {
    fact.unwrap_or(false)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Milestone {
    KnowYourReality,
    DiscoverFireNumber,
    MasterTaxPlanning,
    FinancialHealthCheck,
    DesignPortfolio,
    SetGoals,
    BuildFinancialPlan,
    ExpertConsultation,
    AutomateSuccess,
    PortfolioMonitoring,
    FinancialFreedom,
}

impl Milestone {
    pub const ALL: [Milestone; 11] = [
        Milestone::KnowYourReality,
        Milestone::DiscoverFireNumber,
        Milestone::MasterTaxPlanning,
        Milestone::FinancialHealthCheck,
        Milestone::DesignPortfolio,
        Milestone::SetGoals,
        Milestone::BuildFinancialPlan,
        Milestone::ExpertConsultation,
        Milestone::AutomateSuccess,
        Milestone::PortfolioMonitoring,
        Milestone::FinancialFreedom,
    ];

    /// 1-based position in the journey.
    pub fn id(self) -> u8 {
        self as u8 + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            Milestone::KnowYourReality => "Know Your Reality",
            Milestone::DiscoverFireNumber => "Discover Your FIRE Number",
            Milestone::MasterTaxPlanning => "Master Tax Planning",
            Milestone::FinancialHealthCheck => "Financial Health Check",
            Milestone::DesignPortfolio => "Design Your Portfolio",
            Milestone::SetGoals => "Set Financial Goals",
            Milestone::BuildFinancialPlan => "Build Your Financial Plan",
            Milestone::ExpertConsultation => "Book Expert Consultation",
            Milestone::AutomateSuccess => "Automate Success",
            Milestone::PortfolioMonitoring => "Portfolio Monitoring",
            Milestone::FinancialFreedom => "Financial Freedom",
        }
    }

    fn is_complete(self, facts: &JourneyFacts) -> bool {
        match self {
            Milestone::KnowYourReality => known(facts.has_net_worth),
            Milestone::DiscoverFireNumber => known(facts.has_fire_calculation),
            Milestone::MasterTaxPlanning => known(facts.has_tax_plan),
            Milestone::FinancialHealthCheck => {
                known(facts.has_risk_assessment) || known(facts.has_portfolio_holdings)
            }
            Milestone::DesignPortfolio => {
                known(facts.has_risk_assessment) && known(facts.has_asset_allocation)
            }
            Milestone::SetGoals => known(facts.has_goals),
            Milestone::BuildFinancialPlan => {
                known(facts.has_financial_plan) && known(facts.has_goals)
            }
            Milestone::ExpertConsultation => known(facts.has_consultation),
            Milestone::AutomateSuccess => known(facts.has_automated_sip),
            Milestone::PortfolioMonitoring => known(facts.has_active_monitoring),
            Milestone::FinancialFreedom => known(facts.has_achieved_freedom),
        }
    }

    /// Progress shown for an incomplete milestone.
    fn partial_progress(self, facts: &JourneyFacts) -> u8 {
        let half_done = match self {
            Milestone::KnowYourReality => known(facts.has_financial_data),
            Milestone::DesignPortfolio => known(facts.has_asset_allocation),
            Milestone::BuildFinancialPlan => known(facts.has_goals),
            Milestone::PortfolioMonitoring => known(facts.has_portfolio_holdings),
            _ => false,
        };
        if half_done { 50 } else { 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneStatus {
    pub id: u8,
    pub milestone: Milestone,
    pub title: &'static str,
    pub completed: bool,
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneState {
    /// Id of the first incomplete milestone, or the last one when all are done.
    pub current_milestone: u8,
    pub completed: Vec<u8>,
    pub progress_percent: f64,
    pub milestones: Vec<MilestoneStatus>,
}

pub fn derive_milestone_state(facts: &JourneyFacts) -> MilestoneState {
    let milestones = Milestone::ALL
        .iter()
        .map(|&milestone| {
            let completed = milestone.is_complete(facts);
            MilestoneStatus {
                id: milestone.id(),
                milestone,
                title: milestone.title(),
                completed,
                progress: if completed {
                    100
                } else {
                    milestone.partial_progress(facts)
                },
            }
        })
        .collect::<Vec<_>>();

    let completed = milestones
        .iter()
        .filter(|m| m.completed)
        .map(|m| m.id)
        .collect::<Vec<_>>();
    let current_milestone = milestones
        .iter()
        .find(|m| !m.completed)
        .map(|m| m.id)
        .unwrap_or_else(|| Milestone::FinancialFreedom.id());
    let progress_percent = completed.len() as f64 / milestones.len() as f64 * 100.0;

    MilestoneState {
        current_milestone,
        completed,
        progress_percent,
        milestones,
    }
}
