use serde::Serialize;

use super::error::{ProjectionError, Result, check_amount, check_rate};

/// Hard ceiling on simulated periods when the caller does not pick one.
pub const DEFAULT_MAX_PERIODS: u32 = 100;

/// `present × (1 + annual_rate)^years`. Rates are fractions (0.06 for 6%).
pub fn future_value(present: f64, annual_rate: f64, years: i32) -> Result<f64> {
    check_horizon(years)?;
    check_rate("annual_rate", annual_rate)?;
    check_amount("present", present)?;
    Ok(present * (1.0 + annual_rate).powi(years))
}

/// Inverse of [`future_value`]: what is needed today to grow into `future`.
pub fn discount_value(future: f64, annual_rate: f64, years: i32) -> Result<f64> {
    check_horizon(years)?;
    check_rate("annual_rate", annual_rate)?;
    check_amount("future", future)?;
    Ok(future / (1.0 + annual_rate).powi(years))
}

fn check_horizon(years: i32) -> Result<()> {
    if years < 0 {
        return Err(ProjectionError::NegativeYears(years));
    }
    Ok(())
}

/// Inputs for [`simulate`]. Periods are whatever unit the rates and
/// contribution are expressed in: years with annual figures, months with
/// monthly ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub starting_corpus: f64,
    pub contribution: f64,
    pub growth_rate: f64,
    pub target: f64,
    pub max_periods: u32,
    pub step_up_rate: f64,
}

impl SimulationParams {
    pub fn new(starting_corpus: f64, contribution: f64, growth_rate: f64, target: f64) -> Self {
        Self {
            starting_corpus,
            contribution,
            growth_rate,
            target,
            max_periods: DEFAULT_MAX_PERIODS,
            step_up_rate: 0.0,
        }
    }

    pub fn with_max_periods(self, max_periods: u32) -> Self {
        Self {
            max_periods,
            ..self
        }
    }

    pub fn with_step_up(self, step_up_rate: f64) -> Self {
        Self {
            step_up_rate,
            ..self
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_periods == 0 {
            return Err(ProjectionError::NonPositiveIterationCap);
        }
        check_rate("growth_rate", self.growth_rate)?;
        check_rate("step_up_rate", self.step_up_rate)?;
        check_amount("starting_corpus", self.starting_corpus)?;
        check_amount("contribution", self.contribution)?;
        check_amount("target", self.target)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    pub periods_elapsed: u32,
    pub final_corpus: f64,
    /// False when the cap was hit first: not achievable within the horizon.
    pub reached_target: bool,
}

impl From<SimulationOutcome> for (u32, f64) {
    fn from(outcome: SimulationOutcome) -> Self {
        (outcome.periods_elapsed, outcome.final_corpus)
    }
}

/// Endless sequence of end-of-period corpus values. Growth is applied first,
/// then the period's contribution; step-up lifts the next period's
/// contribution.
#[derive(Debug, Clone, Copy)]
struct CorpusPath {
    corpus: f64,
    contribution: f64,
    growth_rate: f64,
    step_up_rate: f64,
}

impl CorpusPath {
    fn new(starting_corpus: f64, contribution: f64, growth_rate: f64, step_up_rate: f64) -> Self {
        Self {
            corpus: starting_corpus,
            contribution,
            growth_rate,
            step_up_rate,
        }
    }
}

impl Iterator for CorpusPath {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.corpus = self.corpus * (1.0 + self.growth_rate) + self.contribution;
        if self.step_up_rate > 0.0 {
            self.contribution *= 1.0 + self.step_up_rate;
        }
        Some(self.corpus)
    }
}

/// Compounds the corpus period by period until it reaches the target or the
/// cap is hit. A corpus already at target returns immediately with zero
/// periods.
pub fn simulate(params: SimulationParams) -> Result<SimulationOutcome> {
    params.validate()?;

    let mut outcome = SimulationOutcome {
        periods_elapsed: 0,
        final_corpus: params.starting_corpus,
        reached_target: params.starting_corpus >= params.target,
    };
    if outcome.reached_target {
        return Ok(outcome);
    }

    let path = CorpusPath::new(
        params.starting_corpus,
        params.contribution,
        params.growth_rate,
        params.step_up_rate,
    );
    for corpus in path.take(params.max_periods as usize) {
        outcome.periods_elapsed += 1;
        outcome.final_corpus = corpus;
        if corpus >= params.target {
            outcome.reached_target = true;
            break;
        }
    }

    if !outcome.reached_target {
        tracing::debug!(
            max_periods = params.max_periods,
            target = params.target,
            final_corpus = outcome.final_corpus,
            "target not reached within iteration cap"
        );
    }
    Ok(outcome)
}

/// Corpus after exactly `periods` periods, target-free.
pub fn project_forward(
    starting_corpus: f64,
    contribution: f64,
    growth_rate: f64,
    periods: u32,
    step_up_rate: f64,
) -> Result<f64> {
    check_path_inputs(starting_corpus, contribution, growth_rate, step_up_rate)?;
    Ok(
        CorpusPath::new(starting_corpus, contribution, growth_rate, step_up_rate)
            .take(periods as usize)
            .last()
            .unwrap_or(starting_corpus),
    )
}

/// Corpus at the start (index 0) and the end of each of `periods` periods.
pub fn projection_path(
    starting_corpus: f64,
    contribution: f64,
    growth_rate: f64,
    periods: u32,
    step_up_rate: f64,
) -> Result<Vec<f64>> {
    check_path_inputs(starting_corpus, contribution, growth_rate, step_up_rate)?;
    let mut path = Vec::with_capacity(periods as usize + 1);
    path.push(starting_corpus);
    path.extend(
        CorpusPath::new(starting_corpus, contribution, growth_rate, step_up_rate)
            .take(periods as usize),
    );
    Ok(path)
}

fn check_path_inputs(
    starting_corpus: f64,
    contribution: f64,
    growth_rate: f64,
    step_up_rate: f64,
) -> Result<()> {
    check_rate("growth_rate", growth_rate)?;
    check_rate("step_up_rate", step_up_rate)?;
    check_amount("starting_corpus", starting_corpus)?;
    check_amount("contribution", contribution)
}
