// =============================================================================
// Test Descriptors
// =============================================================================
//
// A TestDescriptor is the metadata for one hypothesis test: what it is
// called, what it assumes, what kind of data it accepts, and which routine
// actually computes it. Descriptors are plain data; they carry no behaviour
// beyond a few predicates used by catalog filtering and dispatch.
//
// =============================================================================

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HypotestError;
use crate::routines::Routine;

// =============================================================================
// Enumerations
// =============================================================================

/// How many samples a test consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisArity {
    Univariate,
    Bivariate,
}

impl AnalysisArity {
    /// Number of samples a call must supply.
    pub fn sample_count(self) -> usize {
        match self {
            AnalysisArity::Univariate => 1,
            AnalysisArity::Bivariate => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisArity::Univariate => "univariate",
            AnalysisArity::Bivariate => "bivariate",
        }
    }
}

impl fmt::Display for AnalysisArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisArity {
    type Err = HypotestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "univariate" => Ok(AnalysisArity::Univariate),
            "bivariate" => Ok(AnalysisArity::Bivariate),
            other => Err(HypotestError::InvalidOption(format!(
                "Unknown analysis arity '{}'. Use 'univariate' or 'bivariate'.",
                other
            ))),
        }
    }
}

/// Measurement level a test expects for one of its variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Continuous,
    Nominal,
    Dichotomous,
    Numeric,
    #[serde(rename = "not applicable")]
    NotApplicable,
}

impl VariableType {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableType::Continuous => "continuous",
            VariableType::Nominal => "nominal",
            VariableType::Dichotomous => "dichotomous",
            VariableType::Numeric => "numeric",
            VariableType::NotApplicable => "not applicable",
        }
    }

    /// Whether a numeric sample satisfies this type.
    pub fn accepts_numeric(self) -> bool {
        !matches!(self, VariableType::Nominal)
    }

    /// Whether a categorical sample satisfies this type.
    pub fn accepts_categorical(self) -> bool {
        matches!(
            self,
            VariableType::Nominal | VariableType::Dichotomous | VariableType::NotApplicable
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = HypotestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "continuous" => Ok(VariableType::Continuous),
            "nominal" => Ok(VariableType::Nominal),
            "dichotomous" => Ok(VariableType::Dichotomous),
            "numeric" => Ok(VariableType::Numeric),
            "not applicable" | "na" | "n/a" => Ok(VariableType::NotApplicable),
            other => Err(HypotestError::InvalidOption(format!(
                "Unknown variable type '{}'. Use 'continuous', 'nominal', 'dichotomous', \
                 'numeric', or 'not applicable'.",
                other
            ))),
        }
    }
}

/// Development maturity of a catalog entry. Not consulted at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Done,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Done => "done",
        }
    }
}

// =============================================================================
// Minimum Sample Size
// =============================================================================

/// Smallest sample a test's results are considered reliable for.
///
/// Serialized as a positive integer, or as the string `"not applicable"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMinSampleSize", into = "RawMinSampleSize")]
pub enum MinSampleSize {
    Required(NonZeroUsize),
    NotApplicable,
}

impl MinSampleSize {
    /// The declared minimum, if any.
    pub fn get(self) -> Option<usize> {
        match self {
            MinSampleSize::Required(n) => Some(n.get()),
            MinSampleSize::NotApplicable => None,
        }
    }

    /// True when `n` observations meet the declared minimum (or none is declared).
    pub fn is_satisfied_by(self, n: usize) -> bool {
        self.get().map_or(true, |min| n >= min)
    }
}

const NOT_APPLICABLE: &str = "not applicable";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawMinSampleSize {
    Count(i64),
    Text(String),
}

impl TryFrom<RawMinSampleSize> for MinSampleSize {
    type Error = String;

    fn try_from(raw: RawMinSampleSize) -> Result<Self, Self::Error> {
        match raw {
            RawMinSampleSize::Count(n) => usize::try_from(n)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(MinSampleSize::Required)
                .ok_or_else(|| format!("min_sample_size must be a positive integer, got {}", n)),
            RawMinSampleSize::Text(s) if s.trim().eq_ignore_ascii_case(NOT_APPLICABLE) => {
                Ok(MinSampleSize::NotApplicable)
            }
            RawMinSampleSize::Text(s) => Err(format!(
                "min_sample_size must be a positive integer or \"{}\", got \"{}\"",
                NOT_APPLICABLE, s
            )),
        }
    }
}

impl From<MinSampleSize> for RawMinSampleSize {
    fn from(value: MinSampleSize) -> Self {
        match value {
            MinSampleSize::Required(n) => RawMinSampleSize::Count(n.get() as i64),
            MinSampleSize::NotApplicable => RawMinSampleSize::Text(NOT_APPLICABLE.to_string()),
        }
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Metadata describing one statistical test.
///
/// The `code` is the catalog key. It is filled in from the table name when the
/// catalog is loaded and is not written back into the table on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestDescriptor {
    #[serde(skip)]
    pub code: String,
    pub name: String,
    pub statistic_name: String,
    pub hypothesis_category: String,
    pub null_hypothesis: String,
    pub analysis_arity: AnalysisArity,
    pub assumes_normality: bool,
    pub assumes_homoscedasticity: bool,
    pub is_parametric: bool,
    pub supports_small_samples: bool,
    pub min_sample_size: MinSampleSize,
    pub x_variable_type: VariableType,
    pub y_variable_type: VariableType,
    pub backing_function_reference: Routine,
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

impl TestDescriptor {
    /// Declared variable type for sample `index` (0 = x, 1 = y).
    pub fn variable_type(&self, index: usize) -> VariableType {
        match index {
            0 => self.x_variable_type,
            1 => self.y_variable_type,
            _ => VariableType::NotApplicable,
        }
    }

    /// Whether `n` observations meet the declared minimum sample size.
    pub fn accepts_sample_size(&self, n: usize) -> bool {
        self.min_sample_size.is_satisfied_by(n)
    }

    /// Consistency checks that serde alone cannot express.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.code.trim().is_empty() {
            return Err("test code must not be empty".to_string());
        }
        if self.analysis_arity == AnalysisArity::Univariate
            && self.y_variable_type != VariableType::NotApplicable
        {
            return Err(format!(
                "'{}' is univariate but declares y_variable_type = \"{}\"",
                self.code, self.y_variable_type
            ));
        }
        if self.x_variable_type == VariableType::NotApplicable {
            return Err(format!("'{}' must declare an x_variable_type", self.code));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Holder {
        min: MinSampleSize,
    }

    #[test]
    fn test_min_sample_size_integer() {
        let h: Holder = toml::from_str("min = 25").unwrap();
        assert_eq!(h.min.get(), Some(25));
        assert!(h.min.is_satisfied_by(25));
        assert!(!h.min.is_satisfied_by(24));
    }

    #[test]
    fn test_min_sample_size_not_applicable() {
        let h: Holder = toml::from_str("min = \"not applicable\"").unwrap();
        assert_eq!(h.min, MinSampleSize::NotApplicable);
        assert!(h.min.is_satisfied_by(0));
    }

    #[test]
    fn test_min_sample_size_rejects_zero_and_negative() {
        assert!(toml::from_str::<Holder>("min = 0").is_err());
        assert!(toml::from_str::<Holder>("min = -3").is_err());
        assert!(toml::from_str::<Holder>("min = \"lots\"").is_err());
    }

    #[test]
    fn test_min_sample_size_serializes_back() {
        let text = toml::to_string(&Holder { min: MinSampleSize::NotApplicable }).unwrap();
        assert!(text.contains("not applicable"));
        let text = toml::to_string(&Holder {
            min: MinSampleSize::Required(NonZeroUsize::new(8).unwrap()),
        })
        .unwrap();
        assert_eq!(text.trim(), "min = 8");
    }

    #[test]
    fn test_variable_type_parsing() {
        assert_eq!("Nominal".parse::<VariableType>().unwrap(), VariableType::Nominal);
        assert_eq!(
            "not_applicable".parse::<VariableType>().unwrap(),
            VariableType::NotApplicable
        );
        assert!("ordinal".parse::<VariableType>().is_err());
    }

    #[test]
    fn test_variable_type_acceptance() {
        assert!(VariableType::Continuous.accepts_numeric());
        assert!(!VariableType::Continuous.accepts_categorical());
        assert!(VariableType::Nominal.accepts_categorical());
        assert!(!VariableType::Nominal.accepts_numeric());
        assert!(VariableType::Dichotomous.accepts_numeric());
        assert!(VariableType::Dichotomous.accepts_categorical());
    }

    #[test]
    fn test_arity_sample_count() {
        assert_eq!(AnalysisArity::Univariate.sample_count(), 1);
        assert_eq!(AnalysisArity::Bivariate.sample_count(), 2);
        assert_eq!("BIVARIATE".parse::<AnalysisArity>().unwrap(), AnalysisArity::Bivariate);
    }
}
