// =============================================================================
// Correlation Tests
// =============================================================================
//
// Pearson, Spearman, Kendall's tau (b or c) and point-biserial correlation,
// each with a test of H0: no association.
//
// Pearson and Spearman share the t-test on r:
//
//     t = r · √((n − 2) / (1 − r²)),   df = n − 2
//
// Kendall's tau uses a normal approximation to the null distribution of
// (concordant − discordant), with the variance corrected for ties. Both
// variants share that p-value; they differ only in how the statistic is
// normalized:
//
//     tau-b = (C − D) / √((P − Tx)(P − Ty))
//     tau-c = 2(C − D) / (n² (m − 1) / m),   m = min(levels of x, levels of y)
//
// =============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::HypotestError;
use crate::inference::{confidence_interval_z, pvalue_t, pvalue_z, Alternative};

use super::ranks::rank_average;
use super::{check_non_empty, check_same_length, mean, Dof, RoutineError, RoutineOutput};

fn check_pairs(x: &[f64], y: &[f64], minimum: usize) -> Result<(), RoutineError> {
    check_same_length(x, y)?;
    check_non_empty(x, "x")?;
    if x.len() < minimum {
        return Err(RoutineError::Degenerate(format!(
            "need at least {} paired observations, got {}",
            minimum,
            x.len()
        )));
    }
    Ok(())
}

/// Pearson's r, clamped to [-1, 1]. Fails on constant input.
fn pearson_r(x: &[f64], y: &[f64]) -> Result<f64, RoutineError> {
    let mx = mean(x);
    let my = mean(y);

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(RoutineError::Degenerate(
            "correlation is undefined for constant input".to_string(),
        ));
    }

    Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// t-test of r with `n - 2` degrees of freedom.
///
/// A perfect correlation has an infinite t; its p-value is taken directly.
fn correlation_pvalue(r: f64, n: usize, alternative: Alternative) -> f64 {
    let df = n as f64 - 2.0;
    let one_minus_r2 = 1.0 - r * r;

    if one_minus_r2 <= 0.0 {
        return match alternative {
            Alternative::TwoSided => 0.0,
            Alternative::Greater => if r > 0.0 { 0.0 } else { 1.0 },
            Alternative::Less => if r < 0.0 { 0.0 } else { 1.0 },
        };
    }

    let t = r * (df / one_minus_r2).sqrt();
    pvalue_t(t, df, alternative)
}

/// Pearson correlation coefficient.
///
/// # Arguments
/// * `x`, `y` - Paired observations (same length, n ≥ 3)
/// * `alternative` - Direction of the alternative hypothesis
/// * `confidence` - Level of the Fisher-z confidence interval for r
///
/// # Returns
/// r, its p-value, df = n − 2 and, when n > 3 and |r| < 1, a confidence interval.
pub fn pearsonr(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
    confidence: f64,
) -> Result<RoutineOutput, RoutineError> {
    check_pairs(x, y, 3)?;
    let n = x.len();
    let r = pearson_r(x, y)?;
    let pvalue = correlation_pvalue(r, n, alternative);

    let mut output = RoutineOutput::new(r, pvalue).with_dof(Dof::One(n as f64 - 2.0));

    if n > 3 && r.abs() < 1.0 {
        // Fisher transformation: atanh(r) is approximately normal with se 1/√(n − 3)
        let se = 1.0 / (n as f64 - 3.0).sqrt();
        let (lo, hi) = confidence_interval_z(r.atanh(), se, confidence);
        output = output.with_interval((lo.tanh(), hi.tanh()), confidence);
    }

    Ok(output)
}

/// Spearman rank correlation: Pearson's r on average ranks.
pub fn spearmanr(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
) -> Result<RoutineOutput, RoutineError> {
    check_pairs(x, y, 3)?;
    let n = x.len();
    let rho = pearson_r(&rank_average(x), &rank_average(y))?;
    let pvalue = correlation_pvalue(rho, n, alternative);

    Ok(RoutineOutput::new(rho, pvalue).with_dof(Dof::One(n as f64 - 2.0)))
}

/// Normalization of Kendall's tau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KendallVariant {
    /// Adjusted for ties; suited to square tables.
    B,
    /// Stuart's tau-c, for rectangular tables.
    #[default]
    C,
}

impl KendallVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            KendallVariant::B => "b",
            KendallVariant::C => "c",
        }
    }
}

impl fmt::Display for KendallVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KendallVariant {
    type Err = HypotestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "b" | "tau-b" => Ok(KendallVariant::B),
            "c" | "tau-c" => Ok(KendallVariant::C),
            other => Err(HypotestError::InvalidOption(format!(
                "Unknown Kendall variant '{}'. Use 'b' or 'c'.",
                other
            ))),
        }
    }
}

/// Kendall's tau with a tie-corrected normal approximation.
///
/// # Arguments
/// * `x`, `y` - Paired observations (same length, n ≥ 3)
/// * `variant` - tau-b or tau-c normalization of the statistic
/// * `alternative` - Direction of the alternative hypothesis
///
/// # Returns
/// tau, its p-value, and the z score of (C − D) as auxiliary `z`.
pub fn kendalltau(
    x: &[f64],
    y: &[f64],
    variant: KendallVariant,
    alternative: Alternative,
) -> Result<RoutineOutput, RoutineError> {
    check_pairs(x, y, 3)?;
    let n = x.len();

    let mut concordant = 0.0_f64;
    let mut discordant = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let s = (x[i] - x[j]) * (y[i] - y[j]);
            if s > 0.0 {
                concordant += 1.0;
            } else if s < 0.0 {
                discordant += 1.0;
            }
        }
    }

    let x_ties = TieSums::of(x);
    let y_ties = TieSums::of(y);

    let n_f = n as f64;
    let total_pairs = n_f * (n_f - 1.0) / 2.0;
    let denom = ((total_pairs - x_ties.pairs) * (total_pairs - y_ties.pairs)).sqrt();
    if denom == 0.0 {
        return Err(RoutineError::Degenerate(
            "correlation is undefined for constant input".to_string(),
        ));
    }

    let tau = match variant {
        KendallVariant::B => (concordant - discordant) / denom,
        KendallVariant::C => {
            let levels = x_ties.levels.min(y_ties.levels) as f64;
            2.0 * (concordant - discordant) / (n_f * n_f * (levels - 1.0) / levels)
        }
    }
    .clamp(-1.0, 1.0);

    let m = n_f * (n_f - 1.0);
    let var = (m * (2.0 * n_f + 5.0) - x_ties.spread - y_ties.spread) / 18.0
        + (2.0 * x_ties.pairs * y_ties.pairs) / m
        + x_ties.skew * y_ties.skew / (9.0 * m * (n_f - 2.0));
    let z = (concordant - discordant) / var.sqrt();

    Ok(RoutineOutput::new(tau, pvalue_z(z, alternative)).with_aux("z", z))
}

/// Tie sums used by the tau variance.
struct TieSums {
    /// Number of distinct values
    levels: usize,
    /// Σ t(t − 1)/2
    pairs: f64,
    /// Σ t(t − 1)(t − 2)
    skew: f64,
    /// Σ t(t − 1)(2t + 5)
    spread: f64,
}

impl TieSums {
    fn of(values: &[f64]) -> Self {
        let (_, ties) = super::ranks::rank_with_ties(values);
        let tied: usize = ties.iter().sum();
        let mut sums = TieSums {
            levels: values.len() - tied + ties.len(),
            pairs: 0.0,
            skew: 0.0,
            spread: 0.0,
        };
        for t in ties {
            let t = t as f64;
            sums.pairs += t * (t - 1.0) / 2.0;
            sums.skew += t * (t - 1.0) * (t - 2.0);
            sums.spread += t * (t - 1.0) * (2.0 * t + 5.0);
        }
        sums
    }
}

/// Point-biserial correlation between a 0/1 variable and a continuous one.
pub fn pointbiserialr(
    dichotomous: &[f64],
    continuous: &[f64],
    alternative: Alternative,
    confidence: f64,
) -> Result<RoutineOutput, RoutineError> {
    pearsonr(dichotomous, continuous, alternative, confidence)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const X: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
    const Y: [f64; 10] = [2.1, 3.9, 6.2, 7.8, 10.1, 12.2, 13.8, 16.1, 18.0, 20.2];

    #[test]
    fn test_pearson_perfect_linear() {
        let y: Vec<f64> = X.iter().map(|v| 3.0 * v + 1.0).collect();
        let out = pearsonr(&X, &y, Alternative::TwoSided, 0.95).unwrap();
        assert_abs_diff_eq!(out.statistic, 1.0, epsilon = 1e-12);
        assert_eq!(out.pvalue, 0.0);
        assert!(out.confidence_interval.is_none());
    }

    #[test]
    fn test_pearson_strong_positive() {
        let out = pearsonr(&X, &Y, Alternative::TwoSided, 0.95).unwrap();
        assert!(out.statistic > 0.99);
        assert!(out.pvalue < 1e-6);
        assert_eq!(out.dof, Some(Dof::One(8.0)));
        let ci = out.confidence_interval.unwrap();
        assert!(ci.low < out.statistic && out.statistic < ci.high);
        assert!(ci.high <= 1.0);
        assert_abs_diff_eq!(ci.level, 0.95, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_known_value() {
        // r = 0.8 for this textbook set; t = 0.8·√3/0.6 = 2.3094, df 3
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let out = pearsonr(&x, &y, Alternative::TwoSided, 0.95).unwrap();
        assert_abs_diff_eq!(out.statistic, 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(out.pvalue, 0.104, epsilon = 1e-3);
    }

    #[test]
    fn test_pearson_one_sided() {
        let negative: Vec<f64> = Y.iter().map(|v| -v).collect();
        let less = pearsonr(&X, &negative, Alternative::Less, 0.95).unwrap();
        let greater = pearsonr(&X, &negative, Alternative::Greater, 0.95).unwrap();
        assert!(less.pvalue < 1e-6);
        assert!(greater.pvalue > 0.99);
    }

    #[test]
    fn test_pearson_constant_input() {
        let y = [5.0; 10];
        assert!(matches!(
            pearsonr(&X, &y, Alternative::TwoSided, 0.95),
            Err(RoutineError::Degenerate(_))
        ));
    }

    #[test]
    fn test_pearson_length_mismatch() {
        assert!(matches!(
            pearsonr(&X, &Y[..5], Alternative::TwoSided, 0.95),
            Err(RoutineError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_pearson_empty() {
        assert!(matches!(
            pearsonr(&[], &[], Alternative::TwoSided, 0.95),
            Err(RoutineError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_spearman_monotonic() {
        // Monotonic but non-linear
        let y: Vec<f64> = X.iter().map(|v| v.powi(3)).collect();
        let out = spearmanr(&X, &y, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(out.statistic, 1.0, epsilon = 1e-12);
        assert_eq!(out.pvalue, 0.0);
    }

    #[test]
    fn test_spearman_with_ties() {
        let x = [1.0, 2.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 2.0, 4.0, 5.0];
        let out = spearmanr(&x, &y, Alternative::TwoSided).unwrap();
        // ranks x: 1, 2.5, 2.5, 4, 5; ranks y: 1, 3, 2, 4, 5
        assert_abs_diff_eq!(out.statistic, 0.9746794, epsilon = 1e-6);
    }

    #[test]
    fn test_kendall_perfect() {
        let out = kendalltau(&X, &Y, KendallVariant::B, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(out.statistic, 1.0, epsilon = 1e-12);
        assert!(out.pvalue < 0.001);
    }

    #[test]
    fn test_kendall_known_value() {
        // 8 concordant, 2 discordant pairs: tau = 0.6
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let out = kendalltau(&x, &y, KendallVariant::B, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(out.statistic, 0.6, epsilon = 1e-12);
        // var = 5·4·15/18 = 16.667, z = 6/4.0825 = 1.4697
        assert_abs_diff_eq!(out.auxiliary["z"], 1.4697, epsilon = 1e-4);
        assert_abs_diff_eq!(out.pvalue, 0.1416, epsilon = 1e-3);
    }

    #[test]
    fn test_kendall_with_ties_bounded() {
        let x = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        let y = [1.0, 2.0, 2.0, 3.0, 3.0, 4.0];
        let out = kendalltau(&x, &y, KendallVariant::B, Alternative::TwoSided).unwrap();
        assert!(out.statistic > 0.0 && out.statistic <= 1.0);
        assert!(out.pvalue > 0.0 && out.pvalue <= 1.0);
    }

    #[test]
    fn test_kendall_variants_with_ties() {
        // 10 concordant, 0 discordant; x has 3 ties of 2, y has 2
        let x = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        let y = [1.0, 2.0, 2.0, 3.0, 3.0, 4.0];
        let b = kendalltau(&x, &y, KendallVariant::B, Alternative::TwoSided).unwrap();
        let c = kendalltau(&x, &y, KendallVariant::C, Alternative::TwoSided).unwrap();
        // 10 / √(12 · 13)
        assert_abs_diff_eq!(b.statistic, 0.8006408, epsilon = 1e-6);
        // 2 · 10 / (36 · 2/3), m = 3 levels
        assert_abs_diff_eq!(c.statistic, 20.0 / 24.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.pvalue, c.pvalue, epsilon = 1e-15);
    }

    #[test]
    fn test_kendall_variants_agree_without_ties() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let c = kendalltau(&x, &y, KendallVariant::C, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(c.statistic, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_kendall_variant_parsing() {
        assert_eq!("B".parse::<KendallVariant>().unwrap(), KendallVariant::B);
        assert_eq!("tau-c".parse::<KendallVariant>().unwrap(), KendallVariant::C);
        assert_eq!(KendallVariant::default(), KendallVariant::C);
        assert!("a".parse::<KendallVariant>().is_err());
    }

    #[test]
    fn test_point_biserial_matches_pearson() {
        let group = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let score = [2.0, 3.0, 2.5, 6.0, 7.0, 6.5];
        let pb = pointbiserialr(&group, &score, Alternative::TwoSided, 0.95).unwrap();
        let pr = pearsonr(&group, &score, Alternative::TwoSided, 0.95).unwrap();
        assert_abs_diff_eq!(pb.statistic, pr.statistic, epsilon = 1e-12);
        assert!(pb.statistic > 0.9);
    }
}
