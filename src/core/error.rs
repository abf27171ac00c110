use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Invalid parameters handed to the projection core.
///
/// Incomplete user data never ends up here: it degrades to zero-valued
/// results instead. Only parameters that make a calculation meaningless are
/// rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("years must be >= 0, got {0}")]
    NegativeYears(i32),

    #[error("iteration cap must be > 0")]
    NonPositiveIterationCap,

    #[error("{name} must be a finite rate above -100%, got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("{name} must be a finite amount, got {value}")]
    NonFiniteAmount { name: &'static str, value: f64 },
}

pub(crate) fn check_rate(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= -1.0 {
        return Err(ProjectionError::InvalidRate { name, value });
    }
    Ok(())
}

pub(crate) fn check_amount(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ProjectionError::NonFiniteAmount { name, value });
    }
    Ok(())
}
