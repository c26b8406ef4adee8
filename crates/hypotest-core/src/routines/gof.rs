// =============================================================================
// Goodness-of-Fit Tests
// =============================================================================
//
// Normality:
//   - anderson:    Anderson-Darling A² against a normal with estimated
//                  mean and standard deviation
//   - shapiro:     Shapiro-Wilk W, Royston's approximation (3 ≤ n ≤ 5000)
//   - jarque_bera: skewness and excess kurtosis, JB ~ χ²(2)
//
// Distribution comparison:
//   - kstest:   one sample against a fully specified reference distribution
//   - ks_2samp: two samples against each other
//
// Frequencies:
//   - chisquare: observed category counts against expected counts
//
// KOLMOGOROV P-VALUES:
// --------------------
// Both KS tests use the asymptotic Kolmogorov distribution with Stephens'
// small-sample adjustment:
//
//     λ = (√n + 0.12 + 0.11/√n) · D
//     Q(λ) = 2 Σ_{k≥1} (−1)^{k−1} exp(−2k²λ²)
//
// where n is the sample size (or n₁n₂/(n₁+n₂) for two samples). One-sided
// tests use the Smirnov limit exp(−2nD²).
//
// =============================================================================

use std::collections::BTreeMap;
use std::f64::consts::PI;

use statrs::distribution::{ContinuousCDF, Exp, Normal, Uniform};

use crate::dispatch::ReferenceDistribution;
use crate::inference::{pvalue_chi2, Alternative};

use super::{check_non_empty, mean, sample_variance, Dof, RoutineError, RoutineOutput};

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

fn check_min_len(values: &[f64], minimum: usize) -> Result<(), RoutineError> {
    check_non_empty(values, "x")?;
    if values.len() < minimum {
        return Err(RoutineError::Degenerate(format!(
            "x needs at least {} observations, got {}",
            minimum,
            values.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Kolmogorov-Smirnov
// =============================================================================

/// Upper tail of the Kolmogorov distribution.
fn kolmogorov_sf(lambda: f64) -> f64 {
    // Q(λ) is 1 to double precision below this point and the series
    // converges too slowly to be useful there.
    if lambda < 0.2 {
        return 1.0;
    }

    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100 {
        let k = k as f64;
        let term = (-2.0 * k * k * lambda * lambda).exp();
        sum += sign * term;
        if term < 1e-16 {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

fn ks_pvalue(d: f64, n: f64, alternative: Alternative) -> f64 {
    match alternative {
        Alternative::TwoSided => {
            let root = n.sqrt();
            kolmogorov_sf((root + 0.12 + 0.11 / root) * d)
        }
        _ => (-2.0 * n * d * d).exp().clamp(0.0, 1.0),
    }
}

fn reference_cdf(
    reference: &ReferenceDistribution,
    values: &[f64],
) -> Result<Vec<f64>, RoutineError> {
    let invalid = |e: &dyn std::fmt::Display| {
        RoutineError::InvalidValue(format!("invalid reference distribution: {}", e))
    };

    Ok(match *reference {
        ReferenceDistribution::Normal { mean, std_dev } => {
            let d = Normal::new(mean, std_dev).map_err(|e| invalid(&e))?;
            values.iter().map(|&v| d.cdf(v)).collect()
        }
        ReferenceDistribution::Uniform { low, high } => {
            let d = Uniform::new(low, high).map_err(|e| invalid(&e))?;
            values.iter().map(|&v| d.cdf(v)).collect()
        }
        ReferenceDistribution::Exponential { rate } => {
            let d = Exp::new(rate).map_err(|e| invalid(&e))?;
            values.iter().map(|&v| d.cdf(v)).collect()
        }
    })
}

/// One-sample Kolmogorov-Smirnov test against `reference`.
///
/// The statistic is D for a two-sided test, D+ for `Greater` and D− for
/// `Less`. Both one-sided distances are reported as auxiliaries.
pub fn kstest(
    x: &[f64],
    reference: &ReferenceDistribution,
    alternative: Alternative,
) -> Result<RoutineOutput, RoutineError> {
    check_non_empty(x, "x")?;
    let x = sorted(x);
    let n = x.len() as f64;
    let cdf = reference_cdf(reference, &x)?;

    let mut d_plus = 0.0_f64;
    let mut d_minus = 0.0_f64;
    for (i, f) in cdf.iter().enumerate() {
        d_plus = d_plus.max((i + 1) as f64 / n - f);
        d_minus = d_minus.max(f - i as f64 / n);
    }

    let d = match alternative {
        Alternative::TwoSided => d_plus.max(d_minus),
        Alternative::Greater => d_plus,
        Alternative::Less => d_minus,
    };

    Ok(RoutineOutput::new(d, ks_pvalue(d, n, alternative))
        .with_aux("d_plus", d_plus)
        .with_aux("d_minus", d_minus))
}

/// Number of values in sorted `s` that are ≤ `v`.
fn count_le(s: &[f64], v: f64) -> f64 {
    s.partition_point(|a| *a <= v) as f64
}

/// Two-sample Kolmogorov-Smirnov test.
///
/// D+ is the largest amount by which the empirical CDF of x exceeds that of y.
pub fn ks_2samp(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
) -> Result<RoutineOutput, RoutineError> {
    check_non_empty(x, "x")?;
    check_non_empty(y, "y")?;
    let x = sorted(x);
    let y = sorted(y);
    let (n1, n2) = (x.len() as f64, y.len() as f64);

    let mut d_plus = 0.0_f64;
    let mut d_minus = 0.0_f64;
    for &v in x.iter().chain(&y) {
        let diff = count_le(&x, v) / n1 - count_le(&y, v) / n2;
        d_plus = d_plus.max(diff);
        d_minus = d_minus.max(-diff);
    }

    let d = match alternative {
        Alternative::TwoSided => d_plus.max(d_minus),
        Alternative::Greater => d_plus,
        Alternative::Less => d_minus,
    };
    let effective_n = n1 * n2 / (n1 + n2);

    Ok(RoutineOutput::new(d, ks_pvalue(d, effective_n, alternative))
        .with_aux("d_plus", d_plus)
        .with_aux("d_minus", d_minus))
}

// =============================================================================
// Anderson-Darling
// =============================================================================

/// Critical values of the adjusted statistic at 15%, 10%, 5%, 2.5% and 1%.
const ANDERSON_CRITICAL: [(&str, f64); 5] = [
    ("critical_15", 0.576),
    ("critical_10", 0.656),
    ("critical_5", 0.787),
    ("critical_2_5", 0.918),
    ("critical_1", 1.092),
];

/// Anderson-Darling test for normality.
///
/// The statistic is A². Auxiliaries carry the small-sample adjusted
/// `a2_star` and the critical values for A² at n.
pub fn anderson(x: &[f64]) -> Result<RoutineOutput, RoutineError> {
    check_min_len(x, 2)?;
    let x = sorted(x);
    let n = x.len() as f64;
    let m = mean(&x);
    let s = sample_variance(&x).sqrt();
    if s == 0.0 {
        return Err(RoutineError::Degenerate("x has zero variance".to_string()));
    }

    let normal = Normal::standard();
    let z: Vec<f64> = x.iter().map(|v| (v - m) / s).collect();
    let sum: f64 = (0..x.len())
        .map(|i| {
            let log_cdf = normal.cdf(z[i]).max(f64::MIN_POSITIVE).ln();
            let log_sf = normal.sf(z[x.len() - 1 - i]).max(f64::MIN_POSITIVE).ln();
            (2.0 * i as f64 + 1.0) * (log_cdf + log_sf)
        })
        .sum();
    let a2 = -n - sum / n;

    let a2_star = a2 * (1.0 + 0.75 / n + 2.25 / (n * n));
    let pvalue = anderson_pvalue(a2_star);

    let scale = 1.0 + 4.0 / n - 25.0 / (n * n);
    let mut output = RoutineOutput::new(a2, pvalue).with_aux("a2_star", a2_star);
    for (key, value) in ANDERSON_CRITICAL {
        output = output.with_aux(key, (value / scale * 1000.0).round() / 1000.0);
    }
    Ok(output)
}

/// D'Agostino & Stephens approximation for the adjusted A².
fn anderson_pvalue(a: f64) -> f64 {
    let p = if a >= 0.6 {
        (1.2937 - 5.709 * a + 0.0186 * a * a).exp()
    } else if a >= 0.34 {
        (0.9177 - 4.279 * a - 1.38 * a * a).exp()
    } else if a >= 0.2 {
        1.0 - (-8.318 + 42.796 * a - 59.938 * a * a).exp()
    } else {
        1.0 - (-13.436 + 101.14 * a - 223.73 * a * a).exp()
    };
    p.clamp(0.0, 1.0)
}

// =============================================================================
// Shapiro-Wilk
// =============================================================================

fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Shapiro-Wilk test for normality (Royston 1995).
pub fn shapiro(x: &[f64]) -> Result<RoutineOutput, RoutineError> {
    check_min_len(x, 3)?;
    if x.len() > 5000 {
        return Err(RoutineError::InvalidValue(format!(
            "Shapiro-Wilk supports at most 5000 observations, got {}",
            x.len()
        )));
    }

    let x = sorted(x);
    let n = x.len();
    let nf = n as f64;
    let ssq = super::sum_sq_dev(&x);
    if ssq == 0.0 || x[n - 1] - x[0] <= 0.0 {
        return Err(RoutineError::Degenerate("x has zero variance".to_string()));
    }

    let a = shapiro_coefficients(n);
    let numerator: f64 = a.iter().zip(&x).map(|(a, v)| a * v).sum();
    let w = (numerator * numerator / ssq).min(1.0);

    Ok(RoutineOutput::new(w, shapiro_pvalue(w, nf)))
}

/// Royston's approximation of the Shapiro-Wilk coefficients, ascending
/// (antisymmetric: a[i] = −a[n−1−i]).
fn shapiro_coefficients(n: usize) -> Vec<f64> {
    let mut a = vec![0.0; n];
    if n == 3 {
        a[0] = -std::f64::consts::FRAC_1_SQRT_2;
        a[2] = std::f64::consts::FRAC_1_SQRT_2;
        return a;
    }

    let normal = Normal::standard();
    let nf = n as f64;
    let m: Vec<f64> = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let mm: f64 = m.iter().map(|v| v * v).sum();
    let u = 1.0 / nf.sqrt();

    let c1 = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
    let c2 = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];

    let last = m[n - 1] / mm.sqrt() + poly(&c1, u);
    if n > 5 {
        let second = m[n - 2] / mm.sqrt() + poly(&c2, u);
        let phi = (mm - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
            / (1.0 - 2.0 * last.powi(2) - 2.0 * second.powi(2));
        for i in 2..n - 2 {
            a[i] = m[i] / phi.sqrt();
        }
        a[0] = -last;
        a[1] = -second;
        a[n - 2] = second;
        a[n - 1] = last;
    } else {
        let phi = (mm - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * last.powi(2));
        for i in 1..n - 1 {
            a[i] = m[i] / phi.sqrt();
        }
        a[0] = -last;
        a[n - 1] = last;
    }
    a
}

fn shapiro_pvalue(w: f64, n: f64) -> f64 {
    if n == 3.0 {
        // Exact for n = 3
        let p = 6.0 / PI * (w.sqrt().asin() - (0.75_f64).sqrt().asin());
        return p.clamp(0.0, 1.0);
    }

    let y = (1.0 - w).ln();
    let normal = Normal::standard();

    let z = if n <= 11.0 {
        let gamma = poly(&[-2.273, 0.459], n);
        if y >= gamma {
            return 0.0;
        }
        let mu = poly(&[0.5440, -0.39978, 0.025054, -6.714e-4], n);
        let sigma = poly(&[1.3822, -0.77857, 0.062767, -0.0020322], n).exp();
        (-(gamma - y).ln() - mu) / sigma
    } else {
        let ln_n = n.ln();
        let mu = poly(&[-1.5861, -0.31082, -0.083751, 0.0038915], ln_n);
        let sigma = poly(&[-0.4803, -0.082676, 0.0030302], ln_n).exp();
        (y - mu) / sigma
    };

    normal.sf(z).clamp(0.0, 1.0)
}

// =============================================================================
// Jarque-Bera
// =============================================================================

/// Jarque-Bera test from sample skewness and excess kurtosis.
pub fn jarque_bera(x: &[f64]) -> Result<RoutineOutput, RoutineError> {
    check_min_len(x, 2)?;
    let n = x.len() as f64;
    let m = mean(x);

    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in x {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    if m2 == 0.0 {
        return Err(RoutineError::Degenerate("x has zero variance".to_string()));
    }

    let skewness = m3 / m2.powf(1.5);
    let kurtosis = m4 / (m2 * m2) - 3.0;
    let jb = n / 6.0 * (skewness * skewness + kurtosis * kurtosis / 4.0);

    Ok(RoutineOutput::new(jb, pvalue_chi2(jb, 2.0))
        .with_dof(Dof::One(2.0))
        .with_aux("skewness", skewness)
        .with_aux("kurtosis", kurtosis))
}

// =============================================================================
// Chi-Square Goodness of Fit
// =============================================================================

/// Chi-square goodness-of-fit test on category counts.
///
/// # Arguments
/// * `labels` - One label per observation
/// * `expected` - Expected frequencies in sorted category order; rescaled to
///   the observed total. Uniform when `None`.
pub fn chisquare(labels: &[String], expected: Option<&[f64]>) -> Result<RoutineOutput, RoutineError> {
    if labels.is_empty() {
        return Err(RoutineError::EmptyInput("x has no observations".to_string()));
    }

    let mut counts: BTreeMap<&str, f64> = BTreeMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_insert(0.0) += 1.0;
    }
    let observed: Vec<f64> = counts.into_values().collect();
    let k = observed.len();
    if k < 2 {
        return Err(RoutineError::Degenerate(
            "need at least two categories".to_string(),
        ));
    }
    let total = labels.len() as f64;

    let expected: Vec<f64> = match expected {
        None => vec![total / k as f64; k],
        Some(e) => {
            if e.len() != k {
                return Err(RoutineError::DimensionMismatch(format!(
                    "{} expected frequencies for {} observed categories",
                    e.len(),
                    k
                )));
            }
            if e.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(RoutineError::InvalidValue(
                    "expected frequencies must be positive and finite".to_string(),
                ));
            }
            let scale = total / e.iter().sum::<f64>();
            e.iter().map(|v| v * scale).collect()
        }
    };

    let statistic: f64 = observed
        .iter()
        .zip(&expected)
        .map(|(o, e)| (o - e) * (o - e) / e)
        .sum();
    let df = k as f64 - 1.0;

    Ok(RoutineOutput::new(statistic, pvalue_chi2(statistic, df)).with_dof(Dof::One(df)))
}

// =============================================================================
// Tests
// =============================================================================
