// =============================================================================
// Tests of Independence
// =============================================================================
//
// Both tests start from a contingency table of two nominal variables. Rows
// are the levels of x and columns the levels of y, each in sorted order.
//
// chi2_contingency compares observed cells with the counts expected under
// independence (row total × column total / N). For a 2x2 table the Yates
// continuity correction moves each observed cell up to 0.5 towards its
// expected count before the statistic is computed.
//
// fisher_exact conditions on both margins of a 2x2 table, which makes the
// top-left cell hypergeometric. The p-value sums the exact probabilities of
// tables at least as extreme as the observed one.
//
// =============================================================================

use ndarray::Array2;
use statrs::function::factorial::ln_factorial;

use crate::inference::{pvalue_chi2, Alternative};

use super::{Dof, RoutineError, RoutineOutput};

/// Contingency table of `x` (rows) against `y` (columns).
pub fn crosstab(x: &[String], y: &[String]) -> Result<Array2<f64>, RoutineError> {
    if x.len() != y.len() {
        return Err(RoutineError::DimensionMismatch(format!(
            "x has {} observations but y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(RoutineError::EmptyInput("no observations".to_string()));
    }

    let rows = levels(x);
    let cols = levels(y);
    let mut table = Array2::<f64>::zeros((rows.len(), cols.len()));
    for (a, b) in x.iter().zip(y) {
        // Levels were built from these same values, so both searches succeed
        if let (Ok(i), Ok(j)) = (rows.binary_search(&a.as_str()), cols.binary_search(&b.as_str())) {
            table[[i, j]] += 1.0;
        }
    }
    Ok(table)
}

fn levels(values: &[String]) -> Vec<&str> {
    let mut levels: Vec<&str> = values.iter().map(String::as_str).collect();
    levels.sort_unstable();
    levels.dedup();
    levels
}

/// Chi-square test of independence.
///
/// # Arguments
/// * `correction` - Apply the Yates correction when the table has one degree
///   of freedom
///
/// # Returns
/// χ², p-value, dof = (r − 1)(c − 1), Cramér's V from the reported χ²
/// (corrected when the correction applied) and its dof min(r, c) − 1 as
/// `cramers_v_dof`.
pub fn chi2_contingency(
    x: &[String],
    y: &[String],
    correction: bool,
) -> Result<RoutineOutput, RoutineError> {
    let observed = crosstab(x, y)?;
    let (r, c) = observed.dim();
    if r < 2 || c < 2 {
        return Err(RoutineError::Degenerate(format!(
            "contingency table must be at least 2x2, got {}x{}",
            r, c
        )));
    }

    let total = observed.sum();
    let row_sums = observed.sum_axis(ndarray::Axis(1));
    let col_sums = observed.sum_axis(ndarray::Axis(0));
    let expected = Array2::from_shape_fn((r, c), |(i, j)| row_sums[i] * col_sums[j] / total);

    let dof = ((r - 1) * (c - 1)) as f64;

    let chi2 = |obs: &Array2<f64>| -> f64 {
        obs.iter()
            .zip(expected.iter())
            .map(|(o, e)| (o - e) * (o - e) / e)
            .sum()
    };

    let uncorrected = chi2(&observed);
    let statistic = if correction && dof == 1.0 {
        let adjusted = Array2::from_shape_fn((r, c), |(i, j)| {
            let o = observed[[i, j]];
            let diff = expected[[i, j]] - o;
            o + diff.signum() * diff.abs().min(0.5)
        });
        chi2(&adjusted)
    } else {
        uncorrected
    };

    let min_dim = (r.min(c) - 1) as f64;
    let cramers_v = (statistic / (total * min_dim)).sqrt();

    Ok(RoutineOutput::new(statistic, pvalue_chi2(statistic, dof))
        .with_dof(Dof::One(dof))
        .with_aux("cramers_v", cramers_v)
        .with_aux("cramers_v_dof", min_dim))
}

// =============================================================================
// Fisher's Exact Test
// =============================================================================

/// ln C(n, k)
fn ln_choose(n: u64, k: u64) -> f64 {
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

/// Fisher's exact test on the 2x2 table of `x` against `y`.
///
/// The statistic is the sample odds ratio (a·d)/(b·c). `Greater` tests for
/// an odds ratio above one.
pub fn fisher_exact(
    x: &[String],
    y: &[String],
    alternative: Alternative,
) -> Result<RoutineOutput, RoutineError> {
    let table = crosstab(x, y)?;
    if table.dim() != (2, 2) {
        let (r, c) = table.dim();
        return Err(RoutineError::InvalidValue(format!(
            "Fisher's exact test needs two levels in each variable, got a {}x{} table",
            r, c
        )));
    }

    let cell = |i: usize, j: usize| table[[i, j]] as u64;
    let (a, b, c, d) = (cell(0, 0), cell(0, 1), cell(1, 0), cell(1, 1));

    let odds_ratio = if b * c == 0 {
        if a * d == 0 {
            f64::NAN
        } else {
            f64::INFINITY
        }
    } else {
        (a * d) as f64 / (b * c) as f64
    };

    // Top-left cell given both margins
    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;
    let n = row1 + row2;
    let lo = col1.saturating_sub(row2);
    let hi = row1.min(col1);

    let ln_total = ln_choose(n, col1);
    let pmf = |k: u64| (ln_choose(row1, k) + ln_choose(row2, col1 - k) - ln_total).exp();

    let pvalue = match alternative {
        Alternative::Less => (lo..=a).map(pmf).sum::<f64>(),
        Alternative::Greater => (a..=hi).map(pmf).sum::<f64>(),
        Alternative::TwoSided => {
            let observed = pmf(a);
            // Relative tolerance so tables tied with the observed one count
            (lo..=hi)
                .map(pmf)
                .filter(|p| *p <= observed * (1.0 + 1e-7))
                .sum::<f64>()
        }
    };

    Ok(RoutineOutput::new(odds_ratio, pvalue.clamp(0.0, 1.0)).with_aux("odds_ratio", odds_ratio))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Expand a table given as (x level, y level, count) into two label vectors.
    fn expand(cells: &[(&str, &str, usize)]) -> (Vec<String>, Vec<String>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for (a, b, count) in cells {
            for _ in 0..*count {
                x.push(a.to_string());
                y.push(b.to_string());
            }
        }
        (x, y)
    }

    #[test]
    fn test_crosstab_sorted_levels() {
        let (x, y) = expand(&[("b", "v", 2), ("a", "u", 1), ("a", "v", 3)]);
        let table = crosstab(&x, &y).unwrap();
        assert_eq!(table, ndarray::array![[1.0, 3.0], [0.0, 2.0]]);
    }

    #[test]
    fn test_fisher_two_sided_known_value() {
        let (x, y) = expand(&[("a", "u", 3), ("a", "v", 1), ("b", "u", 1), ("b", "v", 3)]);
        let out = fisher_exact(&x, &y, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(out.statistic, 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.pvalue, 34.0 / 70.0, epsilon = 1e-10);
        assert_abs_diff_eq!(out.pvalue, 0.486, epsilon = 1e-3);
    }

    #[test]
    fn test_fisher_one_sided() {
        let (x, y) = expand(&[("a", "u", 3), ("a", "v", 1), ("b", "u", 1), ("b", "v", 3)]);
        let greater = fisher_exact(&x, &y, Alternative::Greater).unwrap();
        let less = fisher_exact(&x, &y, Alternative::Less).unwrap();
        assert_abs_diff_eq!(greater.pvalue, 17.0 / 70.0, epsilon = 1e-10);
        assert_abs_diff_eq!(less.pvalue, 69.0 / 70.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fisher_zero_cell() {
        let (x, y) = expand(&[("a", "u", 5), ("b", "u", 1), ("b", "v", 5)]);
        let out = fisher_exact(&x, &y, Alternative::TwoSided).unwrap();
        assert!(out.statistic.is_infinite());
        assert!(out.pvalue < 0.05);
    }

    #[test]
    fn test_fisher_requires_2x2() {
        let (x, y) = expand(&[("a", "u", 1), ("b", "v", 1), ("c", "u", 1)]);
        assert!(matches!(
            fisher_exact(&x, &y, Alternative::TwoSided),
            Err(RoutineError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_chi2_contingency_yates() {
        let (x, y) = expand(&[("a", "u", 10), ("a", "v", 20), ("b", "u", 30), ("b", "v", 40)]);
        let out = chi2_contingency(&x, &y, true).unwrap();
        assert_abs_diff_eq!(out.statistic, 0.4464286, epsilon = 1e-6);
        assert_abs_diff_eq!(out.pvalue, 0.5040359, epsilon = 1e-6);
        assert_eq!(out.dof, Some(Dof::One(1.0)));
        // V follows the corrected χ²: √(0.4464286 / 100)
        assert_abs_diff_eq!(out.auxiliary["cramers_v"], 0.0668153, epsilon = 1e-6);
        assert_eq!(out.auxiliary["cramers_v_dof"], 1.0);

        let raw = chi2_contingency(&x, &y, false).unwrap();
        assert_abs_diff_eq!(raw.statistic, 0.7936508, epsilon = 1e-6);
        assert_abs_diff_eq!(raw.auxiliary["cramers_v"], 0.0890871, epsilon = 1e-6);
    }

    #[test]
    fn test_chi2_contingency_3x2() {
        let (x, y) = expand(&[
            ("a", "u", 10),
            ("a", "v", 5),
            ("b", "u", 5),
            ("b", "v", 10),
            ("c", "u", 8),
            ("c", "v", 8),
        ]);
        // No correction beyond one degree of freedom
        let out = chi2_contingency(&x, &y, true).unwrap();
        assert_abs_diff_eq!(out.statistic, 10.0 / 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(out.pvalue, 0.1888756, epsilon = 1e-6);
        assert_eq!(out.dof, Some(Dof::One(2.0)));
        // √((10/3) / (46 · 1))
        let v = (10.0 / 3.0 / 46.0_f64).sqrt();
        assert_abs_diff_eq!(out.auxiliary["cramers_v"], v, epsilon = 1e-12);
        assert_eq!(out.auxiliary["cramers_v_dof"], 1.0);
    }

    #[test]
    fn test_chi2_contingency_single_level() {
        let (x, y) = expand(&[("a", "u", 3), ("a", "v", 2)]);
        assert!(matches!(
            chi2_contingency(&x, &y, true),
            Err(RoutineError::Degenerate(_))
        ));
    }

    #[test]
    fn test_crosstab_length_mismatch() {
        let x = vec!["a".to_string()];
        let y = vec!["u".to_string(), "v".to_string()];
        assert!(matches!(
            crosstab(&x, &y),
            Err(RoutineError::DimensionMismatch(_))
        ));
    }
}
