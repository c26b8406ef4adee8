// =============================================================================
// Test Results
// =============================================================================
//
// A TestResult is the routine's output, untouched, plus provenance: the
// descriptor that was resolved, the alpha the caller asked for, and an
// optional note when the sample was smaller than the test's declared
// minimum.
//
// =============================================================================

use std::fmt;

use crate::catalog::TestDescriptor;
use crate::inference::{format_apa_number, format_apa_pvalue, significance_stars};
use crate::routines::{ConfidenceInterval, Dof, Routine, RoutineOutput};

/// Non-fatal note: the smallest sample was below the declared minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSizeAdvisory {
    pub required: usize,
    pub actual: usize,
}

impl fmt::Display for SampleSizeAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sample size {} is below the recommended minimum of {}",
            self.actual, self.required
        )
    }
}

/// Outcome of a dispatched test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub descriptor: TestDescriptor,
    pub output: RoutineOutput,
    pub alpha: f64,
    pub advisory: Option<SampleSizeAdvisory>,
}

impl TestResult {
    pub fn code(&self) -> &str {
        &self.descriptor.code
    }

    pub fn statistic(&self) -> f64 {
        self.output.statistic
    }

    pub fn pvalue(&self) -> f64 {
        self.output.pvalue
    }

    pub fn dof(&self) -> Option<Dof> {
        self.output.dof
    }

    pub fn confidence_interval(&self) -> Option<ConfidenceInterval> {
        self.output.confidence_interval
    }

    /// Whether H0 is rejected at the result's alpha.
    pub fn is_significant(&self) -> bool {
        self.output.pvalue < self.alpha
    }

    pub fn stars(&self) -> &'static str {
        significance_stars(self.output.pvalue)
    }

    /// One-line APA-style summary, e.g. `t(18)=-7.39, p<.001`.
    pub fn report(&self) -> String {
        let dof = match self.output.dof {
            Some(Dof::One(df)) => format!("({})", format_dof(df)),
            Some(Dof::Two(df1, df2)) => format!("({}, {})", format_dof(df1), format_dof(df2)),
            None => String::new(),
        };
        format!(
            "{}{}={}, {}",
            self.descriptor.statistic_name,
            dof,
            format_apa_number(self.output.statistic, 2),
            format_apa_pvalue(self.output.pvalue)
        )
    }

    /// Strength wording for association measures, `None` for other tests.
    ///
    /// Correlations get a strength and direction (Kendall's tau on its own
    /// weak/moderate/strong scale). The χ² test of independence is described
    /// by the size of Cramér's V for its table.
    pub fn interpretation(&self) -> Option<String> {
        let routine = self.descriptor.backing_function_reference;
        let value = self.output.statistic;
        match routine {
            Routine::Chi2Contingency => {
                let v = *self.output.auxiliary.get("cramers_v")?;
                let dof = *self.output.auxiliary.get("cramers_v_dof")?;
                Some(format!("{} association", cramers_v_strength(v, dof)))
            }
            Routine::KendallTau => Some(format!(
                "{} {} correlation",
                kendall_strength(value),
                direction(value)
            )),
            r if r.is_correlation() => {
                let strength = match value.abs() {
                    a if a >= 0.9 => "very high",
                    a if a >= 0.7 => "high",
                    a if a >= 0.5 => "moderate",
                    a if a >= 0.3 => "low",
                    _ => return Some("negligible correlation".to_string()),
                };
                Some(format!("{} {} correlation", strength, direction(value)))
            }
            _ => None,
        }
    }
}

/// Cramér's V cut-offs for small, moderate and large effects, indexed by
/// dof = min(r, c) − 1. Tables beyond five dof use the last row.
const CRAMERS_V_BANDS: [[f64; 3]; 5] = [
    [0.1, 0.3, 0.5],
    [0.07, 0.21, 0.35],
    [0.06, 0.17, 0.29],
    [0.05, 0.15, 0.25],
    [0.04, 0.13, 0.22],
];

fn cramers_v_strength(v: f64, dof: f64) -> &'static str {
    let row = (dof.clamp(1.0, CRAMERS_V_BANDS.len() as f64) as usize) - 1;
    let [small, moderate, large] = CRAMERS_V_BANDS[row];
    match v {
        v if v > large => "large",
        v if v > moderate => "moderate",
        v if v > small => "small",
        _ => "negligible",
    }
}

fn kendall_strength(tau: f64) -> &'static str {
    match tau.abs() {
        a if a > 0.5 => "strong",
        a if a > 0.3 => "moderate",
        _ => "weak",
    }
}

fn direction(value: f64) -> &'static str {
    if value < 0.0 {
        "negative"
    } else {
        "positive"
    }
}

fn format_dof(df: f64) -> String {
    if df.fract() == 0.0 {
        format!("{:.0}", df)
    } else {
        format!("{:.2}", df)
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.descriptor.name, self.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn result(code: &str, output: RoutineOutput) -> TestResult {
        let descriptor = Catalog::builtin().unwrap().lookup(code).unwrap().clone();
        TestResult { descriptor, output, alpha: 0.05, advisory: None }
    }

    #[test]
    fn test_report_small_pvalue() {
        let r = result("t2", RoutineOutput::new(-7.3855, 0.0000008).with_dof(Dof::One(18.0)));
        assert_eq!(r.report(), "t(18)=-7.39, p<.001");
        assert!(r.is_significant());
        assert_eq!(r.stars(), "***");
    }

    #[test]
    fn test_report_two_dof() {
        let r = result("anova1", RoutineOutput::new(2.5, 0.1234).with_dof(Dof::Two(2.0, 27.0)));
        assert_eq!(r.report(), "F(2, 27)=2.50, p=.123");
        assert!(!r.is_significant());
    }

    #[test]
    fn test_report_without_dof() {
        let r = result("mannwhitneyu", RoutineOutput::new(12.0, 0.0456));
        assert_eq!(r.report(), "U=12.00, p=.046");
    }

    #[test]
    fn test_report_fractional_dof_and_leading_zero() {
        let r = result("pearson", RoutineOutput::new(0.456, 0.2).with_dof(Dof::One(7.5)));
        assert_eq!(r.report(), "r(7.50)=.46, p=.200");
    }

    #[test]
    fn test_interpretation() {
        let strong = result("pearson", RoutineOutput::new(-0.95, 0.001));
        assert_eq!(strong.interpretation().as_deref(), Some("very high negative correlation"));
        let moderate = result("spearman", RoutineOutput::new(0.55, 0.01));
        assert_eq!(moderate.interpretation().as_deref(), Some("moderate positive correlation"));
        let weak = result("pearson", RoutineOutput::new(0.1, 0.5));
        assert_eq!(weak.interpretation().as_deref(), Some("negligible correlation"));
        let low = result("pearson", RoutineOutput::new(0.45, 0.05));
        assert_eq!(low.interpretation().as_deref(), Some("low positive correlation"));
        let other = result("t1", RoutineOutput::new(0.95, 0.5));
        assert!(other.interpretation().is_none());
    }

    #[test]
    fn test_interpretation_kendall_scale() {
        let wording =
            |tau: f64| result("kendallstau", RoutineOutput::new(tau, 0.01)).interpretation();
        assert_eq!(wording(0.45).as_deref(), Some("moderate positive correlation"));
        assert_eq!(wording(0.3).as_deref(), Some("weak positive correlation"));
        assert_eq!(wording(0.5).as_deref(), Some("moderate positive correlation"));
        assert_eq!(wording(-0.6).as_deref(), Some("strong negative correlation"));
        assert_eq!(wording(0.1).as_deref(), Some("weak positive correlation"));
    }

    #[test]
    fn test_interpretation_cramers_v() {
        let wording = |v: f64, dof: f64| {
            let output = RoutineOutput::new(5.0, 0.02)
                .with_dof(Dof::One(dof))
                .with_aux("cramers_v", v)
                .with_aux("cramers_v_dof", dof);
            result("x2ind", output).interpretation()
        };
        // dof 1 cut-offs .1 / .3 / .5
        assert_eq!(wording(0.05, 1.0).as_deref(), Some("negligible association"));
        assert_eq!(wording(0.25, 1.0).as_deref(), Some("small association"));
        assert_eq!(wording(0.4, 1.0).as_deref(), Some("moderate association"));
        assert_eq!(wording(0.6, 1.0).as_deref(), Some("large association"));
        // dof 2 cut-offs .07 / .21 / .35
        assert_eq!(wording(0.25, 2.0).as_deref(), Some("moderate association"));
        assert_eq!(wording(0.36, 2.0).as_deref(), Some("large association"));
        // large tables share the dof 5 row
        assert_eq!(wording(0.25, 12.0).as_deref(), Some("large association"));
    }

    #[test]
    fn test_interpretation_cramers_v_missing() {
        let r = result("x2ind", RoutineOutput::new(5.0, 0.02));
        assert!(r.interpretation().is_none());
    }

    #[test]
    fn test_advisory_display() {
        let advisory = SampleSizeAdvisory { required: 25, actual: 10 };
        assert_eq!(
            advisory.to_string(),
            "sample size 10 is below the recommended minimum of 25"
        );
    }
}
