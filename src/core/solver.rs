use serde::Serialize;

const RATE_EPSILON: f64 = 1e-12;

/// Nominal monthly rate for an annual fraction, the way SIP calculators
/// quote it.
pub fn annual_to_monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 12.0
}

/// Monthly contribution that grows `present_corpus` into `target_corpus`
/// over `months` months at `monthly_rate`, contributions made at the end of
/// each month:
///
/// `PMT = (target − present × (1+r)^n) × r / ((1+r)^n − 1)`
///
/// A collapsed horizon (`months <= 0`) or a zero rate falls back to spreading
/// the remaining gap evenly. The result is negative when the present corpus
/// already outgrows the target on its own.
pub fn required_monthly_contribution(
    present_corpus: f64,
    target_corpus: f64,
    monthly_rate: f64,
    months: i32,
) -> f64 {
    let remaining = (target_corpus - present_corpus).max(0.0);
    if months <= 0 {
        return remaining;
    }
    if monthly_rate.abs() <= RATE_EPSILON {
        return remaining / months as f64;
    }

    let growth = (1.0 + monthly_rate).powi(months);
    let denominator = growth - 1.0;
    if denominator.abs() <= RATE_EPSILON {
        return remaining / months as f64;
    }
    (target_corpus - present_corpus * growth) * monthly_rate / denominator
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionPlan {
    /// Solver output before clamping; negative means surplus.
    pub raw_monthly: f64,
    /// What to show as "save this much per month".
    pub monthly: f64,
    pub on_track: bool,
}

/// [`required_monthly_contribution`] prepared for display: a negative
/// requirement is reported as zero with `on_track` set.
pub fn contribution_plan(
    present_corpus: f64,
    target_corpus: f64,
    monthly_rate: f64,
    months: i32,
) -> ContributionPlan {
    let raw_monthly =
        required_monthly_contribution(present_corpus, target_corpus, monthly_rate, months);
    ContributionPlan {
        raw_monthly,
        monthly: raw_monthly.max(0.0),
        on_track: raw_monthly <= 0.0,
    }
}
