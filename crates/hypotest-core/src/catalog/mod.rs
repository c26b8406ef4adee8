// =============================================================================
// Test Catalog
// =============================================================================
//
// The catalog is a small, read-only table of TestDescriptors keyed by test
// code. It is loaded once and never mutated afterwards.
//
// SOURCE FORMAT
// -------------
// TOML, one table per test code:
//
//     [pearson]
//     name = "Pearson Correlation Coefficient"
//     analysis_arity = "bivariate"
//     min_sample_size = 25
//     backing_function_reference = "pearsonr"
//     ...
//
// Table keys are the addressing mechanism, so they are unique by construction
// and their order in the file is irrelevant. Loading and re-serializing
// preserves every field.
//
// LOOKUP
// ------
// With roughly twenty entries there is nothing to index: lookup is a map get
// and listing is a predicate scan over the entries in code order.
//
// =============================================================================

mod descriptor;

pub use descriptor::{AnalysisArity, MinSampleSize, Status, TestDescriptor, VariableType};

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::OnceCell;

use crate::error::{HypotestError, Result};

/// The catalog shipped with the crate.
const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.toml");

static BUILTIN: OnceCell<Catalog> = OnceCell::new();

/// Immutable table of test descriptors keyed by code.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<String, TestDescriptor>,
}

impl Catalog {
    /// The built-in catalog, parsed on first use and shared for the rest of
    /// the process.
    pub fn builtin() -> Result<&'static Catalog> {
        BUILTIN.get_or_try_init(|| Catalog::from_toml_str(BUILTIN_CATALOG))
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, TestDescriptor> =
            toml::from_str(text).map_err(|e| HypotestError::Catalog(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for (code, mut descriptor) in raw {
            descriptor.code = code.clone();
            descriptor.validate().map_err(HypotestError::Catalog)?;
            entries.insert(code, descriptor);
        }

        log::debug!("Loaded test catalog with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Read and parse a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Reading test catalog from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to the TOML source format.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(&self.entries).map_err(|e| HypotestError::Catalog(e.to_string()))
    }

    /// Resolve a test code to its descriptor.
    pub fn lookup(&self, code: &str) -> Result<&TestDescriptor> {
        self.entries
            .get(code)
            .ok_or_else(|| HypotestError::NotFound(code.to_string()))
    }

    /// Descriptors matching every constraint in `filter`, ordered by code.
    pub fn list(&self, filter: &CatalogFilter) -> Vec<&TestDescriptor> {
        self.entries.values().filter(|d| filter.matches(d)).collect()
    }

    /// All descriptors, ordered by code.
    pub fn iter(&self) -> impl Iterator<Item = &TestDescriptor> {
        self.entries.values()
    }

    /// All test codes, in order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Predicate over descriptors. Unset fields match everything.
///
/// ```
/// use hypotest_core::{Catalog, CatalogFilter, VariableType};
///
/// let catalog = Catalog::builtin().unwrap();
/// let nominal = catalog.list(&CatalogFilter::new().x_type(VariableType::Nominal));
/// assert!(nominal.iter().any(|d| d.code == "fisher"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub arity: Option<AnalysisArity>,
    pub x_type: Option<VariableType>,
    pub y_type: Option<VariableType>,
    /// Keep only tests whose minimum sample size is met by this many observations.
    pub sample_size: Option<usize>,
    pub parametric: Option<bool>,
    pub status: Option<Status>,
    /// Case-insensitive match on `hypothesis_category`.
    pub category: Option<String>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arity(mut self, arity: AnalysisArity) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn x_type(mut self, x_type: VariableType) -> Self {
        self.x_type = Some(x_type);
        self
    }

    pub fn y_type(mut self, y_type: VariableType) -> Self {
        self.y_type = Some(y_type);
        self
    }

    pub fn sample_size(mut self, n: usize) -> Self {
        self.sample_size = Some(n);
        self
    }

    pub fn parametric(mut self, parametric: bool) -> Self {
        self.parametric = Some(parametric);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Whether `descriptor` satisfies every set constraint.
    pub fn matches(&self, descriptor: &TestDescriptor) -> bool {
        self.arity.map_or(true, |a| descriptor.analysis_arity == a)
            && self.x_type.map_or(true, |t| descriptor.x_variable_type == t)
            && self.y_type.map_or(true, |t| descriptor.y_variable_type == t)
            && self.sample_size.map_or(true, |n| descriptor.accepts_sample_size(n))
            && self.parametric.map_or(true, |p| descriptor.is_parametric == p)
            && self.status.map_or(true, |s| descriptor.status == s)
            && self
                .category
                .as_deref()
                .map_or(true, |c| descriptor.hypothesis_category.eq_ignore_ascii_case(c))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::Routine;

    const SMALL: &str = r#"
        [t1]
        name = "One-Sample t-Test"
        statistic_name = "t"
        hypothesis_category = "centrality"
        null_hypothesis = "The population mean equals the hypothesized value."
        analysis_arity = "univariate"
        assumes_normality = true
        assumes_homoscedasticity = false
        is_parametric = true
        supports_small_samples = true
        min_sample_size = "not applicable"
        x_variable_type = "continuous"
        y_variable_type = "not applicable"
        backing_function_reference = "ttest_1samp"
        status = "done"

        [x2gof]
        name = "Chi-Square Goodness of Fit Test"
        statistic_name = "X²"
        hypothesis_category = "goodness of fit"
        null_hypothesis = "Observed frequencies match expected frequencies."
        analysis_arity = "univariate"
        assumes_normality = false
        assumes_homoscedasticity = false
        is_parametric = false
        supports_small_samples = false
        min_sample_size = 5
        x_variable_type = "nominal"
        y_variable_type = "not applicable"
        backing_function_reference = "chisquare"
        status = "pending"
        description = "Frequencies of a single nominal variable."
    "#;

    #[test]
    fn test_builtin_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 21);
        assert!(!catalog.is_empty());
        // Same instance on every call
        assert!(std::ptr::eq(catalog, Catalog::builtin().unwrap()));
    }

    #[test]
    fn test_code_filled_from_key() {
        let catalog = Catalog::from_toml_str(SMALL).unwrap();
        let d = catalog.lookup("x2gof").unwrap();
        assert_eq!(d.code, "x2gof");
        assert_eq!(d.backing_function_reference, Routine::ChiSquare);
        assert_eq!(d.min_sample_size.get(), Some(5));
        assert_eq!(d.description.as_deref(), Some("Frequencies of a single nominal variable."));
        assert_eq!(catalog.codes().collect::<Vec<_>>(), vec!["t1", "x2gof"]);
    }

    #[test]
    fn test_lookup_missing() {
        let catalog = Catalog::from_toml_str(SMALL).unwrap();
        let err = catalog.lookup("nope").unwrap_err();
        assert!(matches!(err, HypotestError::NotFound(ref c) if c == "nope"));
    }

    #[test]
    fn test_roundtrip() {
        let catalog = Catalog::from_toml_str(SMALL).unwrap();
        let text = catalog.to_toml_string().unwrap();
        let reloaded = Catalog::from_toml_str(&text).unwrap();
        assert_eq!(catalog, reloaded);
    }

    #[test]
    fn test_unknown_routine_rejected() {
        let text = SMALL.replace("\"ttest_1samp\"", "\"ttest_magic\"");
        assert!(matches!(
            Catalog::from_toml_str(&text),
            Err(HypotestError::Catalog(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let text = SMALL.replace("status = \"done\"", "status = \"done\"\ncolour = \"red\"");
        assert!(Catalog::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_univariate_with_y_type_rejected() {
        let text = SMALL.replacen(
            "y_variable_type = \"not applicable\"",
            "y_variable_type = \"continuous\"",
            1,
        );
        let err = Catalog::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("univariate"));
    }

    #[test]
    fn test_filter_by_sample_size() {
        let catalog = Catalog::from_toml_str(SMALL).unwrap();
        let small = catalog.list(&CatalogFilter::new().sample_size(3));
        assert_eq!(small.len(), 1);
        assert_eq!(small[0].code, "t1");
        assert_eq!(catalog.list(&CatalogFilter::new().sample_size(5)).len(), 2);
    }

    #[test]
    fn test_filter_combined() {
        let catalog = Catalog::from_toml_str(SMALL).unwrap();
        let hits = catalog.list(
            &CatalogFilter::new()
                .arity(AnalysisArity::Univariate)
                .parametric(false)
                .status(Status::Pending)
                .category("Goodness of Fit"),
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "x2gof");
        assert!(catalog
            .list(&CatalogFilter::new().arity(AnalysisArity::Bivariate))
            .is_empty());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Catalog::from_path("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, HypotestError::Io(_)));
    }
}
