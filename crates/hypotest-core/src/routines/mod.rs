// =============================================================================
// Statistical Routines
// =============================================================================
//
// The computational layer behind the catalog. Each catalog entry names its
// routine through `backing_function_reference`; that name deserializes into
// the closed `Routine` enum below, so an unknown routine is a load error
// rather than a runtime surprise.
//
// STRUCTURE:
// ----------
//   - correlation:  pearsonr, spearmanr, kendalltau, pointbiserialr
//   - centrality:   t-tests, Mann-Whitney U, Wilcoxon, Kruskal-Wallis, ANOVA
//   - variance:     Levene (median-centred), Bartlett
//   - gof:          Anderson-Darling, Shapiro-Wilk, KS, Jarque-Bera, χ² GOF
//   - independence: χ² contingency, Fisher's exact
//   - ranks:        shared ranking helpers
//
// Every routine is a plain function over slices returning
// `Result<RoutineOutput, RoutineError>`. `Routine::invoke` is the only place
// that knows how samples and run options map onto those arguments.
//
// =============================================================================

pub mod centrality;
pub mod correlation;
pub mod gof;
pub mod independence;
pub mod ranks;
pub mod variance;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dispatch::{RunOptions, Sample};
use crate::error::{HypotestError, RoutineError};

// =============================================================================
// Routine Identifier
// =============================================================================

/// One variant per backing statistical function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Routine {
    #[serde(rename = "anderson")]
    Anderson,
    #[serde(rename = "f_oneway")]
    FOneway,
    #[serde(rename = "bartlett")]
    Bartlett,
    #[serde(rename = "fisher_exact")]
    FisherExact,
    #[serde(rename = "jarque_bera")]
    JarqueBera,
    #[serde(rename = "kendalltau")]
    KendallTau,
    #[serde(rename = "ks_2samp")]
    Ks2Samp,
    #[serde(rename = "kstest")]
    KsTest,
    #[serde(rename = "kruskal")]
    Kruskal,
    #[serde(rename = "levene")]
    Levene,
    #[serde(rename = "mannwhitneyu")]
    MannWhitneyU,
    #[serde(rename = "pointbiserialr")]
    PointBiserialR,
    #[serde(rename = "pearsonr")]
    PearsonR,
    #[serde(rename = "shapiro")]
    Shapiro,
    #[serde(rename = "spearmanr")]
    SpearmanR,
    #[serde(rename = "ttest_1samp")]
    TTest1Samp,
    #[serde(rename = "ttest_ind")]
    TTestInd,
    #[serde(rename = "ttest_rel")]
    TTestRel,
    #[serde(rename = "wilcoxon")]
    Wilcoxon,
    #[serde(rename = "chisquare")]
    ChiSquare,
    #[serde(rename = "chi2_contingency")]
    Chi2Contingency,
}

impl Routine {
    pub const ALL: [Routine; 21] = [
        Routine::Anderson,
        Routine::FOneway,
        Routine::Bartlett,
        Routine::FisherExact,
        Routine::JarqueBera,
        Routine::KendallTau,
        Routine::Ks2Samp,
        Routine::KsTest,
        Routine::Kruskal,
        Routine::Levene,
        Routine::MannWhitneyU,
        Routine::PointBiserialR,
        Routine::PearsonR,
        Routine::Shapiro,
        Routine::SpearmanR,
        Routine::TTest1Samp,
        Routine::TTestInd,
        Routine::TTestRel,
        Routine::Wilcoxon,
        Routine::ChiSquare,
        Routine::Chi2Contingency,
    ];

    /// The reference name used in catalog files.
    pub fn as_str(self) -> &'static str {
        match self {
            Routine::Anderson => "anderson",
            Routine::FOneway => "f_oneway",
            Routine::Bartlett => "bartlett",
            Routine::FisherExact => "fisher_exact",
            Routine::JarqueBera => "jarque_bera",
            Routine::KendallTau => "kendalltau",
            Routine::Ks2Samp => "ks_2samp",
            Routine::KsTest => "kstest",
            Routine::Kruskal => "kruskal",
            Routine::Levene => "levene",
            Routine::MannWhitneyU => "mannwhitneyu",
            Routine::PointBiserialR => "pointbiserialr",
            Routine::PearsonR => "pearsonr",
            Routine::Shapiro => "shapiro",
            Routine::SpearmanR => "spearmanr",
            Routine::TTest1Samp => "ttest_1samp",
            Routine::TTestInd => "ttest_ind",
            Routine::TTestRel => "ttest_rel",
            Routine::Wilcoxon => "wilcoxon",
            Routine::ChiSquare => "chisquare",
            Routine::Chi2Contingency => "chi2_contingency",
        }
    }

    /// Routines whose statistic is a correlation coefficient in [-1, 1].
    pub fn is_correlation(self) -> bool {
        matches!(
            self,
            Routine::PearsonR | Routine::SpearmanR | Routine::KendallTau | Routine::PointBiserialR
        )
    }

    /// Run the routine on `samples`.
    ///
    /// Sample 0 is x, sample 1 is y. Grouped routines (f_oneway, bartlett,
    /// kruskal, levene) read values from x and group labels from y.
    pub fn invoke(
        self,
        samples: &[Sample],
        options: &RunOptions,
    ) -> Result<RoutineOutput, RoutineError> {
        let confidence = 1.0 - options.alpha;
        let alternative = options.alternative;

        match self {
            // Correlation
            Routine::PearsonR => correlation::pearsonr(
                &numeric_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                alternative,
                confidence,
            ),
            Routine::SpearmanR => correlation::spearmanr(
                &numeric_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                alternative,
            ),
            Routine::KendallTau => correlation::kendalltau(
                &numeric_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                options.kendall_variant,
                alternative,
            ),
            Routine::PointBiserialR => correlation::pointbiserialr(
                &dichotomous_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                alternative,
                confidence,
            ),

            // Centrality
            Routine::TTest1Samp => centrality::ttest_1samp(
                &numeric_at(samples, 0)?,
                options.popmean,
                alternative,
                confidence,
            ),
            Routine::TTestInd => centrality::ttest_ind(
                &numeric_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                options.equal_var,
                alternative,
                confidence,
            ),
            Routine::TTestRel => centrality::ttest_rel(
                &numeric_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                alternative,
                confidence,
            ),
            Routine::MannWhitneyU => centrality::mannwhitneyu(
                &numeric_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                alternative,
            ),
            Routine::Wilcoxon => centrality::wilcoxon(
                &numeric_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                alternative,
            ),
            Routine::Kruskal => centrality::kruskal(&grouped(samples)?),
            Routine::FOneway => centrality::f_oneway(&grouped(samples)?),

            // Variance
            Routine::Levene => variance::levene(&grouped(samples)?),
            Routine::Bartlett => variance::bartlett(&grouped(samples)?),

            // Goodness of fit
            Routine::Anderson => gof::anderson(&numeric_at(samples, 0)?),
            Routine::Shapiro => gof::shapiro(&numeric_at(samples, 0)?),
            Routine::JarqueBera => gof::jarque_bera(&numeric_at(samples, 0)?),
            Routine::KsTest => {
                gof::kstest(&numeric_at(samples, 0)?, &options.reference, alternative)
            }
            Routine::Ks2Samp => gof::ks_2samp(
                &numeric_at(samples, 0)?,
                &numeric_at(samples, 1)?,
                alternative,
            ),
            Routine::ChiSquare => {
                gof::chisquare(&labels_at(samples, 0)?, options.expected.as_deref())
            }

            // Independence
            Routine::Chi2Contingency => independence::chi2_contingency(
                &labels_at(samples, 0)?,
                &labels_at(samples, 1)?,
                options.correction,
            ),
            Routine::FisherExact => independence::fisher_exact(
                &labels_at(samples, 0)?,
                &labels_at(samples, 1)?,
                alternative,
            ),
        }
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Routine {
    type Err = HypotestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Routine::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| HypotestError::InvalidOption(format!("Unknown routine '{}'", s)))
    }
}

// =============================================================================
// Routine Output
// =============================================================================

/// Degrees of freedom of the reference distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dof {
    One(f64),
    /// Numerator and denominator degrees of freedom (F tests).
    Two(f64, f64),
}

/// Two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
    /// Confidence level, e.g. 0.95.
    pub level: f64,
}

/// What a routine computed. Returned to callers unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineOutput {
    pub statistic: f64,
    pub pvalue: f64,
    pub dof: Option<Dof>,
    pub confidence_interval: Option<ConfidenceInterval>,
    /// Extra named numbers (odds ratio, z, critical values, ...).
    pub auxiliary: BTreeMap<&'static str, f64>,
}

impl RoutineOutput {
    pub fn new(statistic: f64, pvalue: f64) -> Self {
        Self {
            statistic,
            pvalue,
            dof: None,
            confidence_interval: None,
            auxiliary: BTreeMap::new(),
        }
    }

    pub fn with_dof(mut self, dof: Dof) -> Self {
        self.dof = Some(dof);
        self
    }

    /// Attach a confidence interval, skipping it when either bound is undefined.
    pub fn with_interval(mut self, (low, high): (f64, f64), level: f64) -> Self {
        if low.is_finite() && high.is_finite() {
            self.confidence_interval = Some(ConfidenceInterval { low, high, level });
        }
        self
    }

    pub fn with_aux(mut self, key: &'static str, value: f64) -> Self {
        self.auxiliary.insert(key, value);
        self
    }
}

// =============================================================================
// Input Helpers
// =============================================================================

const POSITIONS: [&str; 2] = ["x", "y"];

fn position(index: usize) -> &'static str {
    POSITIONS.get(index).copied().unwrap_or("sample")
}

fn sample_at(samples: &[Sample], index: usize) -> Result<&Sample, RoutineError> {
    samples.get(index).ok_or_else(|| {
        RoutineError::DimensionMismatch(format!(
            "missing {} sample ({} supplied)",
            position(index),
            samples.len()
        ))
    })
}

fn numeric_at(samples: &[Sample], index: usize) -> Result<Cow<'_, [f64]>, RoutineError> {
    let values = sample_at(samples, index)?.numeric().ok_or_else(|| {
        RoutineError::InvalidValue(format!("{} must be numeric", position(index)))
    })?;
    check_finite(&values, position(index))?;
    Ok(values)
}

fn labels_at(samples: &[Sample], index: usize) -> Result<Vec<String>, RoutineError> {
    let sample = sample_at(samples, index)?;
    if let Some(values) = sample.numeric() {
        check_finite(&values, position(index))?;
    }
    Ok(sample.labels())
}

/// Two-level variable coded as 0.0 / 1.0. Levels are ordered numerically
/// for numeric input and lexically for categorical input.
fn dichotomous_at(samples: &[Sample], index: usize) -> Result<Vec<f64>, RoutineError> {
    let sample = sample_at(samples, index)?;
    let name = position(index);

    match sample.numeric() {
        Some(values) => {
            check_finite(&values, name)?;
            let mut levels: Vec<f64> = values.to_vec();
            levels.sort_by(f64::total_cmp);
            levels.dedup();
            if levels.len() != 2 {
                return Err(RoutineError::InvalidValue(format!(
                    "{} must take exactly two distinct values, found {}",
                    name,
                    levels.len()
                )));
            }
            Ok(values.iter().map(|&v| if v == levels[0] { 0.0 } else { 1.0 }).collect())
        }
        None => {
            let labels = sample.labels();
            let mut levels: Vec<&str> = labels.iter().map(String::as_str).collect();
            levels.sort_unstable();
            levels.dedup();
            if levels.len() != 2 {
                return Err(RoutineError::InvalidValue(format!(
                    "{} must have exactly two levels, found {}",
                    name,
                    levels.len()
                )));
            }
            let low = levels[0];
            Ok(labels.iter().map(|l| if l == low { 0.0 } else { 1.0 }).collect())
        }
    }
}

/// Values of x split by the labels in y, groups in sorted label order.
fn grouped(samples: &[Sample]) -> Result<Vec<Vec<f64>>, RoutineError> {
    let values = numeric_at(samples, 0)?;
    let labels = labels_at(samples, 1)?;
    group_by_label(&values, &labels)
}

pub(crate) fn group_by_label(
    values: &[f64],
    labels: &[String],
) -> Result<Vec<Vec<f64>>, RoutineError> {
    if values.len() != labels.len() {
        return Err(RoutineError::DimensionMismatch(format!(
            "values have {} observations but labels have {}",
            values.len(),
            labels.len()
        )));
    }
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (value, label) in values.iter().zip(labels) {
        groups.entry(label.as_str()).or_default().push(*value);
    }
    Ok(groups.into_values().collect())
}

pub(crate) fn check_finite(values: &[f64], name: &str) -> Result<(), RoutineError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(RoutineError::InvalidValue(format!(
            "{} contains NaN or infinite values",
            name
        )))
    }
}

pub(crate) fn check_non_empty(values: &[f64], name: &str) -> Result<(), RoutineError> {
    if values.is_empty() {
        Err(RoutineError::EmptyInput(format!("{} has no observations", name)))
    } else {
        Ok(())
    }
}

pub(crate) fn check_same_length(x: &[f64], y: &[f64]) -> Result<(), RoutineError> {
    if x.len() != y.len() {
        Err(RoutineError::DimensionMismatch(format!(
            "x has {} observations but y has {}",
            x.len(),
            y.len()
        )))
    } else {
        Ok(())
    }
}

// =============================================================================
// Moments
// =============================================================================

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
pub(crate) fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum()
}

/// Sample variance with `n - 1` in the denominator.
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    sum_sq_dev(values) / (values.len() as f64 - 1.0)
}

pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

// =============================================================================
// Tests
// =============================================================================
