// =============================================================================
// Run Options
// =============================================================================
//
// Per-call configuration for the dispatcher. Every routine reads only the
// fields that apply to it; the rest are ignored.
//
// =============================================================================

use crate::error::{HypotestError, Result};
use crate::inference::Alternative;
use crate::routines::correlation::KendallVariant;

/// Fully specified reference distribution for the one-sample KS test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceDistribution {
    Normal { mean: f64, std_dev: f64 },
    Uniform { low: f64, high: f64 },
    Exponential { rate: f64 },
}

impl Default for ReferenceDistribution {
    fn default() -> Self {
        ReferenceDistribution::Normal { mean: 0.0, std_dev: 1.0 }
    }
}

impl ReferenceDistribution {
    /// Build from a distribution name and its parameters.
    ///
    /// Names: `norm` (mean, std_dev), `uniform` (low, high), `expon` (rate).
    /// Missing parameters take the standard values (0/1, 0/1, 1).
    pub fn from_parts(name: &str, params: &[f64]) -> Result<Self> {
        let param = |i: usize, default: f64| params.get(i).copied().unwrap_or(default);
        let (expected, dist) = match name.trim().to_lowercase().as_str() {
            "norm" | "normal" => (
                2,
                ReferenceDistribution::Normal { mean: param(0, 0.0), std_dev: param(1, 1.0) },
            ),
            "uniform" => (
                2,
                ReferenceDistribution::Uniform { low: param(0, 0.0), high: param(1, 1.0) },
            ),
            "expon" | "exponential" => (1, ReferenceDistribution::Exponential { rate: param(0, 1.0) }),
            other => {
                return Err(HypotestError::InvalidOption(format!(
                    "Unknown reference distribution '{}'. Use 'norm', 'uniform', or 'expon'.",
                    other
                )))
            }
        };
        if params.len() > expected {
            return Err(HypotestError::InvalidOption(format!(
                "'{}' takes at most {} parameter(s), got {}",
                name,
                expected,
                params.len()
            )));
        }
        dist.validate()?;
        Ok(dist)
    }

    pub fn validate(&self) -> Result<()> {
        let ok = match *self {
            ReferenceDistribution::Normal { mean, std_dev } => {
                mean.is_finite() && std_dev.is_finite() && std_dev > 0.0
            }
            ReferenceDistribution::Uniform { low, high } => {
                low.is_finite() && high.is_finite() && low < high
            }
            ReferenceDistribution::Exponential { rate } => rate.is_finite() && rate > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(HypotestError::InvalidOption(format!(
                "Invalid reference distribution parameters: {:?}",
                self
            )))
        }
    }
}

/// Configuration for a single test run.
///
/// # Example
/// ```
/// use hypotest_core::{Alternative, RunOptions};
///
/// let options = RunOptions {
///     alpha: 0.01,
///     alternative: Alternative::Greater,
///     ..Default::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Significance level, in (0, 1). Also sets confidence intervals to 1 − alpha.
    pub alpha: f64,
    pub alternative: Alternative,
    /// Pooled (true) or Welch (false) two-sample t-test.
    pub equal_var: bool,
    /// Hypothesized mean for the one-sample t-test.
    pub popmean: f64,
    /// Expected frequencies for chi-square goodness of fit, in sorted
    /// category order. Uniform when `None`.
    pub expected: Option<Vec<f64>>,
    /// Reference distribution for the one-sample KS test.
    pub reference: ReferenceDistribution,
    /// Yates continuity correction for 2x2 contingency tables. Also applied
    /// to the χ² behind Cramér's V.
    pub correction: bool,
    /// tau-b or tau-c for Kendall's tau.
    pub kendall_variant: KendallVariant,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            alternative: Alternative::TwoSided,
            equal_var: true,
            popmean: 0.0,
            expected: None,
            reference: ReferenceDistribution::default(),
            correction: true,
            kendall_variant: KendallVariant::C,
        }
    }
}

impl RunOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(HypotestError::InvalidOption(format!(
                "alpha must lie strictly between 0 and 1, got {}",
                self.alpha
            )));
        }
        if !self.popmean.is_finite() {
            return Err(HypotestError::InvalidOption(format!(
                "popmean must be finite, got {}",
                self.popmean
            )));
        }
        if let Some(expected) = &self.expected {
            if expected.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(HypotestError::InvalidOption(
                    "expected frequencies must be positive and finite".to_string(),
                ));
            }
        }
        self.reference.validate()
    }
}
