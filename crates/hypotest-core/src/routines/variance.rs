// =============================================================================
// Tests of Equal Variance
// =============================================================================
//
// Levene's test here is the median-centred variant (Brown–Forsythe): a
// one-way ANOVA on |x − median(group)|. It is robust to non-normal data.
//
// Bartlett's test compares the pooled log-variance with the group
// log-variances. It is more powerful under normality and sensitive to
// departures from it.
//
// =============================================================================

use crate::inference::pvalue_chi2;

use super::centrality::f_oneway;
use super::{median, sample_variance, Dof, RoutineError, RoutineOutput};

/// Levene's test (median-centred), W ~ F(k − 1, N − k).
pub fn levene(groups: &[Vec<f64>]) -> Result<RoutineOutput, RoutineError> {
    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            if g.is_empty() {
                return Vec::new();
            }
            let centre = median(g);
            g.iter().map(|v| (v - centre).abs()).collect()
        })
        .collect();

    f_oneway(&deviations)
}

/// Bartlett's test, T ~ χ²(k − 1). Every group needs two observations and
/// non-zero variance.
pub fn bartlett(groups: &[Vec<f64>]) -> Result<RoutineOutput, RoutineError> {
    if groups.iter().all(|g| g.is_empty()) {
        return Err(RoutineError::EmptyInput("no observations".to_string()));
    }
    if groups.len() < 2 {
        return Err(RoutineError::Degenerate(format!(
            "need at least two groups, got {}",
            groups.len()
        )));
    }

    let mut dfs = Vec::with_capacity(groups.len());
    let mut variances = Vec::with_capacity(groups.len());
    for (i, g) in groups.iter().enumerate() {
        if g.len() < 2 {
            return Err(RoutineError::Degenerate(format!(
                "group {} needs at least 2 observations, got {}",
                i + 1,
                g.len()
            )));
        }
        let v = sample_variance(g);
        if v <= 0.0 {
            return Err(RoutineError::Degenerate(format!(
                "group {} has zero variance",
                i + 1
            )));
        }
        dfs.push(g.len() as f64 - 1.0);
        variances.push(v);
    }

    let k = groups.len() as f64;
    let total_df: f64 = dfs.iter().sum();
    let pooled = dfs.iter().zip(&variances).map(|(d, v)| d * v).sum::<f64>() / total_df;

    let numerator = total_df * pooled.ln()
        - dfs.iter().zip(&variances).map(|(d, v)| d * v.ln()).sum::<f64>();
    let denominator =
        1.0 + (dfs.iter().map(|d| 1.0 / d).sum::<f64>() - 1.0 / total_df) / (3.0 * (k - 1.0));
    let statistic = numerator / denominator;

    let df = k - 1.0;
    Ok(RoutineOutput::new(statistic, pvalue_chi2(statistic, df)).with_dof(Dof::One(df)))
}
