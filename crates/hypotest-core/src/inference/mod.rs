// =============================================================================
// Statistical Inference Helpers
// =============================================================================
//
// Shared building blocks for the routines and for result reporting:
//   - Alternative hypotheses and p-values for each direction
//   - Confidence intervals from z and t critical values
//   - Significance stars and APA-style number formatting
//
// READING P-VALUES:
// -----------------
// Symmetric statistics (z, t) go through pvalue_z / pvalue_t, which pick the
// tail from the Alternative. Statistics that only reject in the upper tail
// (χ², F, H) use the survival function directly.
//
// =============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use crate::error::HypotestError;

// =============================================================================
// Alternative Hypothesis
// =============================================================================

/// Direction of the alternative hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    #[default]
    TwoSided,
    Less,
    Greater,
}

impl Alternative {
    pub fn as_str(self) -> &'static str {
        match self {
            Alternative::TwoSided => "two-sided",
            Alternative::Less => "less",
            Alternative::Greater => "greater",
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alternative {
    type Err = HypotestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "two-sided" | "two-tailed" => Ok(Alternative::TwoSided),
            "less" => Ok(Alternative::Less),
            "greater" => Ok(Alternative::Greater),
            other => Err(HypotestError::InvalidOption(format!(
                "Unknown alternative '{}'. Use 'two-sided', 'less', or 'greater'.",
                other
            ))),
        }
    }
}

// =============================================================================
// P-Value Calculation
// =============================================================================

fn standard_normal() -> Normal {
    Normal::standard()
}

/// Calculate the p-value of a z-statistic.
///
/// # Arguments
/// * `z` - The z-statistic
/// * `alternative` - Direction of the alternative hypothesis
///
/// # Returns
/// Probability of a statistic at least this extreme under H0, or NaN for a
/// non-finite `z`.
pub fn pvalue_z(z: f64, alternative: Alternative) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    let normal = standard_normal();
    match alternative {
        // 2 · P(Z > |z|), computed from the upper tail to keep precision
        Alternative::TwoSided => (2.0 * normal.sf(z.abs())).min(1.0),
        Alternative::Less => normal.cdf(z),
        Alternative::Greater => normal.sf(z),
    }
}

/// Calculate the p-value of a t-statistic with `df` degrees of freedom.
///
/// Falls back to the normal distribution for very large `df`.
pub fn pvalue_t(t: f64, df: f64, alternative: Alternative) -> f64 {
    if t.is_nan() || !(df > 0.0) {
        return f64::NAN;
    }

    if df > 1000.0 {
        return pvalue_z(t, alternative);
    }

    let t_dist = match StudentsT::new(0.0, 1.0, df) {
        Ok(d) => d,
        Err(_) => return f64::NAN,
    };

    match alternative {
        Alternative::TwoSided => (2.0 * t_dist.sf(t.abs())).min(1.0),
        Alternative::Less => t_dist.cdf(t),
        Alternative::Greater => t_dist.sf(t),
    }
}

/// Upper-tail p-value of a χ² statistic.
pub fn pvalue_chi2(statistic: f64, df: f64) -> f64 {
    if statistic.is_nan() || !(df > 0.0) {
        return f64::NAN;
    }
    match ChiSquared::new(df) {
        Ok(d) => d.sf(statistic.max(0.0)),
        Err(_) => f64::NAN,
    }
}

/// Upper-tail p-value of an F statistic.
pub fn pvalue_f(statistic: f64, df1: f64, df2: f64) -> f64 {
    if statistic.is_nan() || !(df1 > 0.0) || !(df2 > 0.0) {
        return f64::NAN;
    }
    match FisherSnedecor::new(df1, df2) {
        Ok(d) => d.sf(statistic.max(0.0)),
        Err(_) => f64::NAN,
    }
}

// =============================================================================
// Confidence Intervals
// =============================================================================

/// Two-sided confidence interval using the z-distribution.
///
/// # Arguments
/// * `estimate` - Point estimate
/// * `std_error` - Standard error of the estimate
/// * `confidence` - Confidence level (e.g., 0.95 for 95% CI)
///
/// # Returns
/// (lower_bound, upper_bound), or NaNs for a non-positive standard error.
pub fn confidence_interval_z(estimate: f64, std_error: f64, confidence: f64) -> (f64, f64) {
    if !estimate.is_finite() || !std_error.is_finite() || std_error <= 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let alpha = 1.0 - confidence;
    let z_critical = standard_normal().inverse_cdf(1.0 - alpha / 2.0);

    let margin = z_critical * std_error;
    (estimate - margin, estimate + margin)
}

/// Two-sided confidence interval using the t-distribution.
///
/// # Arguments
/// * `estimate` - Point estimate
/// * `std_error` - Standard error of the estimate
/// * `df` - Degrees of freedom
/// * `confidence` - Confidence level (e.g., 0.95 for 95% CI)
pub fn confidence_interval_t(
    estimate: f64,
    std_error: f64,
    df: f64,
    confidence: f64,
) -> (f64, f64) {
    if !estimate.is_finite() || !std_error.is_finite() || std_error <= 0.0 || df <= 0.0 {
        return (f64::NAN, f64::NAN);
    }

    if df > 1000.0 {
        return confidence_interval_z(estimate, std_error, confidence);
    }

    let t_dist = match StudentsT::new(0.0, 1.0, df) {
        Ok(d) => d,
        Err(_) => return (f64::NAN, f64::NAN),
    };

    let alpha = 1.0 - confidence;
    let t_critical = t_dist.inverse_cdf(1.0 - alpha / 2.0);

    let margin = t_critical * std_error;
    (estimate - margin, estimate + margin)
}

// =============================================================================
// Significance Stars & APA Formatting
// =============================================================================

/// Get significance stars for a p-value.
///
/// - "***" : p < 0.001
/// - "**"  : p < 0.01
/// - "*"   : p < 0.05
/// - "."   : p < 0.1
/// - ""    : p >= 0.1
pub fn significance_stars(pvalue: f64) -> &'static str {
    if pvalue < 0.001 {
        "***"
    } else if pvalue < 0.01 {
        "**"
    } else if pvalue < 0.05 {
        "*"
    } else if pvalue < 0.1 {
        "."
    } else {
        ""
    }
}

/// Format a number with `decimals` places and no leading zero (`0.25` → `.25`).
pub fn format_apa_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{}", value);
    }
    let text = format!("{:.*}", decimals, value);
    if let Some(rest) = text.strip_prefix("0.") {
        format!(".{}", rest)
    } else if let Some(rest) = text.strip_prefix("-0.") {
        format!("-.{}", rest)
    } else {
        text
    }
}

/// Format a p-value for an APA report line: `p<.001` or `p=.xxx`.
pub fn format_apa_pvalue(pvalue: f64) -> String {
    if pvalue < 0.001 {
        "p<.001".to_string()
    } else {
        format!("p={}", format_apa_number(pvalue, 3))
    }
}

// =============================================================================
// Tests
// =============================================================================
