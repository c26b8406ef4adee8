// =============================================================================
// Tests of Central Tendency
// =============================================================================
//
// Parametric:
//   - ttest_1samp: mean against a hypothesized value
//   - ttest_ind:   two independent means (pooled or Welch)
//   - ttest_rel:   paired means
//   - f_oneway:    one-way ANOVA across k groups
//
// Rank-based:
//   - mannwhitneyu: two independent samples
//   - wilcoxon:     paired signed-rank
//   - kruskal:      k groups
//
// The rank tests use normal (or χ²) approximations with tie corrections
// rather than exact null distributions.
//
// =============================================================================

use crate::inference::{
    confidence_interval_t, pvalue_chi2, pvalue_f, pvalue_t, pvalue_z, Alternative,
};

use super::ranks::{rank_with_ties, tie_sum_cubed};
use super::{
    check_non_empty, check_same_length, mean, sample_variance, sum_sq_dev, Dof, RoutineError,
    RoutineOutput,
};

fn check_min_len(values: &[f64], name: &str, minimum: usize) -> Result<(), RoutineError> {
    check_non_empty(values, name)?;
    if values.len() < minimum {
        return Err(RoutineError::Degenerate(format!(
            "{} needs at least {} observations, got {}",
            name,
            minimum,
            values.len()
        )));
    }
    Ok(())
}

fn check_groups(groups: &[Vec<f64>]) -> Result<(), RoutineError> {
    if groups.iter().all(|g| g.is_empty()) {
        return Err(RoutineError::EmptyInput("no observations".to_string()));
    }
    if groups.len() < 2 {
        return Err(RoutineError::Degenerate(format!(
            "need at least two groups, got {}",
            groups.len()
        )));
    }
    Ok(())
}

// =============================================================================
// t-Tests
// =============================================================================

/// One-sample t-test of H0: mean = `popmean`.
///
/// The confidence interval is for the mean itself.
pub fn ttest_1samp(
    x: &[f64],
    popmean: f64,
    alternative: Alternative,
    confidence: f64,
) -> Result<RoutineOutput, RoutineError> {
    check_min_len(x, "x", 2)?;
    let n = x.len() as f64;
    let m = mean(x);
    let se = (sample_variance(x) / n).sqrt();
    if se == 0.0 {
        return Err(RoutineError::Degenerate("x has zero variance".to_string()));
    }

    let df = n - 1.0;
    let t = (m - popmean) / se;

    Ok(RoutineOutput::new(t, pvalue_t(t, df, alternative))
        .with_dof(Dof::One(df))
        .with_interval(confidence_interval_t(m, se, df, confidence), confidence)
        .with_aux("mean", m))
}

/// Two-sample t-test for independent samples.
///
/// # Arguments
/// * `equal_var` - Pool the variances (Student) or not (Welch–Satterthwaite df)
///
/// The confidence interval is for mean(x) − mean(y).
pub fn ttest_ind(
    x: &[f64],
    y: &[f64],
    equal_var: bool,
    alternative: Alternative,
    confidence: f64,
) -> Result<RoutineOutput, RoutineError> {
    check_min_len(x, "x", 2)?;
    check_min_len(y, "y", 2)?;

    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let (vx, vy) = (sample_variance(x), sample_variance(y));
    let diff = mean(x) - mean(y);

    let (se, df) = if equal_var {
        let df = nx + ny - 2.0;
        let pooled = ((nx - 1.0) * vx + (ny - 1.0) * vy) / df;
        ((pooled * (1.0 / nx + 1.0 / ny)).sqrt(), df)
    } else {
        let (ax, ay) = (vx / nx, vy / ny);
        let df = (ax + ay).powi(2) / (ax * ax / (nx - 1.0) + ay * ay / (ny - 1.0));
        ((ax + ay).sqrt(), df)
    };

    if se == 0.0 {
        return Err(RoutineError::Degenerate(
            "both samples have zero variance".to_string(),
        ));
    }

    let t = diff / se;

    Ok(RoutineOutput::new(t, pvalue_t(t, df, alternative))
        .with_dof(Dof::One(df))
        .with_interval(confidence_interval_t(diff, se, df, confidence), confidence)
        .with_aux("mean_difference", diff))
}

/// Paired t-test: a one-sample test on x − y against zero.
pub fn ttest_rel(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
    confidence: f64,
) -> Result<RoutineOutput, RoutineError> {
    check_same_length(x, y)?;
    let diffs: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    let mut output = ttest_1samp(&diffs, 0.0, alternative, confidence)?;
    if let Some(m) = output.auxiliary.remove("mean") {
        output.auxiliary.insert("mean_difference", m);
    }
    Ok(output)
}

// =============================================================================
// Rank Tests
// =============================================================================

/// Mann-Whitney U test.
///
/// The statistic is U for x. The p-value uses the normal approximation with
/// tie correction and a 0.5 continuity correction.
pub fn mannwhitneyu(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
) -> Result<RoutineOutput, RoutineError> {
    check_non_empty(x, "x")?;
    check_non_empty(y, "y")?;

    let (n1, n2) = (x.len() as f64, y.len() as f64);
    let combined: Vec<f64> = x.iter().chain(y).copied().collect();
    let (ranks, ties) = rank_with_ties(&combined);

    let r1: f64 = ranks[..x.len()].iter().sum();
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;

    let n = n1 + n2;
    let mu = n1 * n2 / 2.0;
    let sigma = (n1 * n2 / 12.0 * ((n + 1.0) - tie_sum_cubed(&ties) / (n * (n - 1.0)))).sqrt();
    if !(sigma > 0.0) {
        return Err(RoutineError::Degenerate(
            "all observations are tied".to_string(),
        ));
    }

    let u = match alternative {
        Alternative::Greater => u1,
        Alternative::Less => u2,
        Alternative::TwoSided => u1.max(u2),
    };
    let z = (u - mu - 0.5) / sigma;
    let one_tail = pvalue_z(z, Alternative::Greater);
    let pvalue = match alternative {
        Alternative::TwoSided => (2.0 * one_tail).min(1.0),
        _ => one_tail,
    };

    Ok(RoutineOutput::new(u1, pvalue.clamp(0.0, 1.0)).with_aux("z", z))
}

/// Wilcoxon signed-rank test on paired samples.
///
/// Zero differences are dropped. The statistic is min(T+, T−) for a
/// two-sided test and T+ otherwise.
pub fn wilcoxon(
    x: &[f64],
    y: &[f64],
    alternative: Alternative,
) -> Result<RoutineOutput, RoutineError> {
    check_same_length(x, y)?;
    check_non_empty(x, "x")?;

    let diffs: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(a, b)| a - b)
        .filter(|d| *d != 0.0)
        .collect();
    if diffs.is_empty() {
        return Err(RoutineError::Degenerate(
            "all paired differences are zero".to_string(),
        ));
    }

    let abs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let (ranks, ties) = rank_with_ties(&abs);

    let mut r_plus = 0.0;
    let mut r_minus = 0.0;
    for (d, r) in diffs.iter().zip(&ranks) {
        if *d > 0.0 {
            r_plus += r;
        } else {
            r_minus += r;
        }
    }

    let statistic = match alternative {
        Alternative::TwoSided => r_plus.min(r_minus),
        _ => r_plus,
    };

    let n = diffs.len() as f64;
    let expected = n * (n + 1.0) / 4.0;
    let var = (n * (n + 1.0) * (2.0 * n + 1.0) - 0.5 * tie_sum_cubed(&ties)) / 24.0;
    let z = (statistic - expected) / var.sqrt();

    Ok(RoutineOutput::new(statistic, pvalue_z(z, alternative)).with_aux("z", z))
}

/// Kruskal-Wallis H test across groups, tie-corrected, H ~ χ²(k − 1).
pub fn kruskal(groups: &[Vec<f64>]) -> Result<RoutineOutput, RoutineError> {
    check_groups(groups)?;

    let combined: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = combined.len() as f64;
    let (ranks, ties) = rank_with_ties(&combined);

    let mut h = 0.0;
    let mut offset = 0;
    for group in groups {
        let rank_sum: f64 = ranks[offset..offset + group.len()].iter().sum();
        h += rank_sum * rank_sum / group.len() as f64;
        offset += group.len();
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let correction = 1.0 - tie_sum_cubed(&ties) / (n * n * n - n);
    if !(correction > 0.0) {
        return Err(RoutineError::Degenerate(
            "all observations are tied".to_string(),
        ));
    }
    h /= correction;

    let df = groups.len() as f64 - 1.0;
    Ok(RoutineOutput::new(h, pvalue_chi2(h, df)).with_dof(Dof::One(df)))
}

// =============================================================================
// One-Way ANOVA
// =============================================================================

/// One-way ANOVA F test with dof (k − 1, N − k).
pub fn f_oneway(groups: &[Vec<f64>]) -> Result<RoutineOutput, RoutineError> {
    check_groups(groups)?;

    let k = groups.len() as f64;
    let all: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = all.len() as f64;
    if n <= k {
        return Err(RoutineError::Degenerate(format!(
            "need more observations ({}) than groups ({})",
            n, k
        )));
    }

    let grand = mean(&all);
    let between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand).powi(2))
        .sum();
    let within: f64 = groups.iter().map(|g| sum_sq_dev(g)).sum();

    let (df1, df2) = (k - 1.0, n - k);
    if within == 0.0 {
        return Err(RoutineError::Degenerate(
            "within-group variance is zero".to_string(),
        ));
    }
    let f = (between / df1) / (within / df2);

    Ok(RoutineOutput::new(f, pvalue_f(f, df1, df2)).with_dof(Dof::Two(df1, df2)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn seq(from: i32, to: i32) -> Vec<f64> {
        (from..=to).map(f64::from).collect()
    }

    #[test]
    fn test_ttest_1samp_known_value() {
        let x = [5.1, 4.9, 5.6, 5.8, 6.0, 5.5, 5.3];
        let out = ttest_1samp(&x, 5.0, Alternative::TwoSided, 0.95).unwrap();
        assert_abs_diff_eq!(out.statistic, 3.1278, epsilon = 1e-3);
        assert_abs_diff_eq!(out.pvalue, 0.02038, epsilon = 1e-4);
        assert_eq!(out.dof, Some(Dof::One(6.0)));
        let ci = out.confidence_interval.unwrap();
        assert!(ci.low > 5.0 && ci.high > out.auxiliary["mean"]);
    }

    #[test]
    fn test_ttest_1samp_zero_variance() {
        assert!(matches!(
            ttest_1samp(&[2.0, 2.0, 2.0], 0.0, Alternative::TwoSided, 0.95),
            Err(RoutineError::Degenerate(_))
        ));
    }

    #[test]
    fn test_ttest_ind_separated_groups() {
        let x = seq(1, 10);
        let y = seq(11, 20);
        let out = ttest_ind(&x, &y, true, Alternative::TwoSided, 0.95).unwrap();
        assert!(out.statistic < 0.0);
        assert!(out.pvalue < 0.001);
        assert_eq!(out.dof, Some(Dof::One(18.0)));
        let ci = out.confidence_interval.unwrap();
        assert!(ci.high < 0.0);
        assert_abs_diff_eq!(out.auxiliary["mean_difference"], -10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ttest_ind_welch_df() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let pooled = ttest_ind(&x, &y, true, Alternative::TwoSided, 0.95).unwrap();
        let welch = ttest_ind(&x, &y, false, Alternative::TwoSided, 0.95).unwrap();
        match welch.dof {
            Some(Dof::One(df)) => assert!(df < 8.0),
            other => panic!("unexpected dof {:?}", other),
        }
        assert!(pooled.statistic != welch.statistic);
    }

    #[test]
    fn test_ttest_rel_matches_one_sample_on_differences() {
        let x = [10.0, 12.0, 9.0, 14.0, 11.0];
        let y = [9.0, 10.5, 9.5, 12.0, 10.0];
        let paired = ttest_rel(&x, &y, Alternative::Greater, 0.95).unwrap();
        let diffs: Vec<f64> = x.iter().zip(&y).map(|(a, b)| a - b).collect();
        let one = ttest_1samp(&diffs, 0.0, Alternative::Greater, 0.95).unwrap();
        assert_abs_diff_eq!(paired.statistic, one.statistic, epsilon = 1e-12);
        assert_abs_diff_eq!(paired.pvalue, one.pvalue, epsilon = 1e-12);
        assert!(paired.auxiliary.contains_key("mean_difference"));
    }

    #[test]
    fn test_ttest_rel_length_mismatch() {
        assert!(matches!(
            ttest_rel(&[1.0, 2.0], &[1.0], Alternative::TwoSided, 0.95),
            Err(RoutineError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_mannwhitneyu_separated() {
        let out = mannwhitneyu(&seq(1, 10), &seq(11, 20), Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(out.statistic, 0.0, epsilon = 1e-12);
        // z = (100 − 50 − 0.5)/√175
        assert_abs_diff_eq!(out.auxiliary["z"], 3.7418, epsilon = 1e-4);
        assert!(out.pvalue < 0.001);
    }

    #[test]
    fn test_mannwhitneyu_one_sided() {
        let less = mannwhitneyu(&seq(1, 10), &seq(11, 20), Alternative::Less).unwrap();
        let greater = mannwhitneyu(&seq(1, 10), &seq(11, 20), Alternative::Greater).unwrap();
        assert!(less.pvalue < 0.001);
        assert!(greater.pvalue > 0.99);
    }

    #[test]
    fn test_mannwhitneyu_all_tied() {
        assert!(matches!(
            mannwhitneyu(&[1.0, 1.0], &[1.0, 1.0], Alternative::TwoSided),
            Err(RoutineError::Degenerate(_))
        ));
    }

    #[test]
    fn test_wilcoxon_all_positive() {
        let x = seq(2, 11);
        let y: Vec<f64> = (0..10).map(|i| 1.0 - i as f64 * 0.5 + (i * i) as f64 * 0.01).collect();
        let out = wilcoxon(&x, &y, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(out.statistic, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.pvalue, 0.005062, epsilon = 1e-5);

        let greater = wilcoxon(&x, &y, Alternative::Greater).unwrap();
        assert_abs_diff_eq!(greater.statistic, 55.0, epsilon = 1e-12);
        assert!(greater.pvalue < 0.01);
    }

    #[test]
    fn test_wilcoxon_drops_zero_differences() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 2.0, 1.0, 1.0];
        let out = wilcoxon(&x, &y, Alternative::Greater).unwrap();
        // Only differences 2 and 3 remain
        assert_abs_diff_eq!(out.statistic, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wilcoxon_all_zero() {
        assert!(matches!(
            wilcoxon(&[1.0, 2.0], &[1.0, 2.0], Alternative::TwoSided),
            Err(RoutineError::Degenerate(_))
        ));
    }

    #[test]
    fn test_kruskal_known_value() {
        let groups = vec![seq(1, 3), seq(4, 6), seq(7, 9)];
        let out = kruskal(&groups).unwrap();
        assert_abs_diff_eq!(out.statistic, 7.2, epsilon = 1e-10);
        assert_abs_diff_eq!(out.pvalue, (-3.6f64).exp(), epsilon = 1e-8);
        assert_eq!(out.dof, Some(Dof::One(2.0)));
    }

    #[test]
    fn test_kruskal_single_group() {
        assert!(matches!(
            kruskal(&[seq(1, 5)]),
            Err(RoutineError::Degenerate(_))
        ));
    }

    #[test]
    fn test_f_oneway_known_value() {
        let groups = vec![seq(1, 3), seq(4, 6), seq(7, 9)];
        let out = f_oneway(&groups).unwrap();
        assert_abs_diff_eq!(out.statistic, 27.0, epsilon = 1e-10);
        assert_eq!(out.dof, Some(Dof::Two(2.0, 6.0)));
        assert_abs_diff_eq!(out.pvalue, 0.001, epsilon = 1e-4);
    }

    #[test]
    fn test_f_oneway_zero_within() {
        let groups = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        assert!(matches!(
            f_oneway(&groups),
            Err(RoutineError::Degenerate(_))
        ));
    }
}
