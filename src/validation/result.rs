//! Accumulating the outcome of validation checks.

use std::fmt;
use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use log::debug;
use crate::uri;


//------------ ValidationLocation --------------------------------------------

/// The place an object under validation was found.
///
/// This is usually the URI of the object but can be any label.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ValidationLocation(String);

impl ValidationLocation {
    pub fn new(name: impl Into<String>) -> Self {
        ValidationLocation(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<'a> From<&'a str> for ValidationLocation {
    fn from(name: &'a str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ValidationLocation {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl<'a> From<&'a uri::Rsync> for ValidationLocation {
    fn from(uri: &'a uri::Rsync) -> Self {
        Self::new(uri.as_str())
    }
}

impl fmt::Display for ValidationLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}


//------------ ValidationStatus ----------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValidationStatus {
    Passed,
    Warning,
    Error,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ValidationStatus::Passed => "passed",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Error => "error",
        })
    }
}


//------------ ValidationCheck -----------------------------------------------

/// The outcome of a single check.
///
/// The key identifies the check, see the [`checks`] module for all keys.
/// The parameters provide details for a message.
///
/// [`checks`]: super::checks
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ValidationCheck {
    status: ValidationStatus,
    key: String,
    params: Vec<String>,
}

impl ValidationCheck {
    pub fn new(
        status: ValidationStatus, key: &str, params: &[&dyn fmt::Display]
    ) -> Self {
        ValidationCheck {
            status,
            key: key.into(),
            params: params.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.status)?;
        if !self.params.is_empty() {
            write!(f, ": {}", self.params.join(", "))?;
        }
        Ok(())
    }
}


//------------ ValidationMetric ----------------------------------------------

/// A named value recorded during validation.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ValidationMetric {
    name: String,
    value: String,
    time: DateTime<Utc>,
}

impl ValidationMetric {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }
}


//------------ LocationChecks ------------------------------------------------

/// All checks and metrics recorded for one location.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
struct LocationChecks {
    errors: Vec<ValidationCheck>,
    warnings: Vec<ValidationCheck>,
    passed: Vec<ValidationCheck>,
    metrics: Vec<ValidationMetric>,
}

impl LocationChecks {
    fn push(&mut self, check: ValidationCheck, store_passing: bool) {
        match check.status {
            ValidationStatus::Error => self.errors.push(check),
            ValidationStatus::Warning => self.warnings.push(check),
            ValidationStatus::Passed => {
                if store_passing {
                    self.passed.push(check)
                }
            }
        }
    }
}


//------------ ValidationResult ----------------------------------------------

/// The collected outcome of validating one or more objects.
///
/// Checks are recorded for the current location which can be changed via
/// [`set_location`][Self::set_location]. For each location, errors,
/// warnings and passed checks are kept separately in the order they were
/// recorded.
///
/// The `reject_*` methods record a check as passed if the condition has
/// the good polarity and as an error otherwise. The `warn_*` methods do the
/// same but record a warning instead of an error. All of them return
/// whether the check passed so callers can skip dependent checks.
///
/// Storing passed checks can be switched off to save memory when
/// validating large repositories. Errors and warnings are always kept.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ValidationResult {
    results: BTreeMap<ValidationLocation, LocationChecks>,
    current: ValidationLocation,
    store_passing: bool,
}

impl ValidationResult {
    /// Creates a new result with the given current location.
    pub fn with_location(location: impl Into<ValidationLocation>) -> Self {
        let mut res = ValidationResult {
            results: BTreeMap::new(),
            current: location.into(),
            store_passing: true,
        };
        res.results.entry(res.current.clone()).or_default();
        res
    }

    /// Sets whether passed checks should be stored.
    pub fn set_store_passing_checks(&mut self, store: bool) -> &mut Self {
        self.store_passing = store;
        self
    }

    /// Changes the current location.
    pub fn set_location(
        &mut self, location: impl Into<ValidationLocation>
    ) -> &mut Self {
        self.current = location.into();
        self.results.entry(self.current.clone()).or_default();
        self
    }

    pub fn current_location(&self) -> &ValidationLocation {
        &self.current
    }

    fn record(
        &mut self,
        status: ValidationStatus,
        key: &str,
        params: &[&dyn fmt::Display],
    ) {
        if status == ValidationStatus::Error {
            debug!("{}: check {} failed", self.current, key);
        }
        let check = ValidationCheck::new(status, key, params);
        let store_passing = self.store_passing;
        self.results.entry(
            self.current.clone()
        ).or_default().push(check, store_passing);
    }
}

/// # Recording Checks
///
impl ValidationResult {
    pub fn pass(&mut self, key: &str, params: &[&dyn fmt::Display]) {
        self.record(ValidationStatus::Passed, key, params)
    }

    pub fn warn(&mut self, key: &str, params: &[&dyn fmt::Display]) {
        self.record(ValidationStatus::Warning, key, params)
    }

    pub fn error(&mut self, key: &str, params: &[&dyn fmt::Display]) {
        self.record(ValidationStatus::Error, key, params)
    }

    /// Records an error for a location other than the current one.
    pub fn reject_for_location(
        &mut self,
        location: impl Into<ValidationLocation>,
        key: &str,
        params: &[&dyn fmt::Display],
    ) {
        let before = self.current.clone();
        self.set_location(location);
        self.error(key, params);
        self.current = before;
    }

    /// Records a warning for a location other than the current one.
    pub fn warn_for_location(
        &mut self,
        location: impl Into<ValidationLocation>,
        key: &str,
        params: &[&dyn fmt::Display],
    ) {
        let before = self.current.clone();
        self.set_location(location);
        self.warn(key, params);
        self.current = before;
    }

    pub fn reject_if_false(
        &mut self, condition: bool, key: &str, params: &[&dyn fmt::Display]
    ) -> bool {
        if condition {
            self.pass(key, params)
        }
        else {
            self.error(key, params)
        }
        condition
    }

    pub fn reject_if_true(
        &mut self, condition: bool, key: &str, params: &[&dyn fmt::Display]
    ) -> bool {
        self.reject_if_false(!condition, key, params)
    }

    /// Rejects if the value is missing.
    ///
    /// Returns whether the value is present.
    pub fn reject_if_none<T>(
        &mut self,
        value: Option<&T>,
        key: &str,
        params: &[&dyn fmt::Display],
    ) -> bool {
        self.reject_if_false(value.is_some(), key, params)
    }

    /// Rejects if the value is present.
    ///
    /// Returns whether the value is missing.
    pub fn reject_if_some<T>(
        &mut self,
        value: Option<&T>,
        key: &str,
        params: &[&dyn fmt::Display],
    ) -> bool {
        self.reject_if_false(value.is_none(), key, params)
    }

    pub fn warn_if_false(
        &mut self, condition: bool, key: &str, params: &[&dyn fmt::Display]
    ) -> bool {
        if condition {
            self.pass(key, params)
        }
        else {
            self.warn(key, params)
        }
        condition
    }

    pub fn warn_if_true(
        &mut self, condition: bool, key: &str, params: &[&dyn fmt::Display]
    ) -> bool {
        self.warn_if_false(!condition, key, params)
    }

    pub fn warn_if_none<T>(
        &mut self,
        value: Option<&T>,
        key: &str,
        params: &[&dyn fmt::Display],
    ) -> bool {
        self.warn_if_false(value.is_some(), key, params)
    }

    pub fn warn_if_some<T>(
        &mut self,
        value: Option<&T>,
        key: &str,
        params: &[&dyn fmt::Display],
    ) -> bool {
        self.warn_if_false(value.is_none(), key, params)
    }

    /// Records a metric for the current location.
    pub fn add_metric(&mut self, name: impl Into<String>, value: impl ToString) {
        let metric = ValidationMetric {
            name: name.into(),
            value: value.to_string(),
            time: Utc::now(),
        };
        self.results.entry(
            self.current.clone()
        ).or_default().metrics.push(metric)
    }

    /// Merges all checks and metrics of another result into this one.
    ///
    /// Passed checks are only taken over if this result stores them.
    pub fn add_all(&mut self, other: &ValidationResult) {
        let store_passing = self.store_passing;
        for (location, checks) in &other.results {
            let target = self.results.entry(location.clone()).or_default();
            target.errors.extend(checks.errors.iter().cloned());
            target.warnings.extend(checks.warnings.iter().cloned());
            if store_passing {
                target.passed.extend(checks.passed.iter().cloned());
            }
            target.metrics.extend(checks.metrics.iter().cloned());
        }
    }
}

/// # Queries
///
impl ValidationResult {
    /// Returns whether no errors were recorded at any location.
    pub fn is_success(&self) -> bool {
        !self.has_failures()
    }

    pub fn has_failures(&self) -> bool {
        self.results.values().any(|checks| !checks.errors.is_empty())
    }

    pub fn has_warnings(&self) -> bool {
        self.results.values().any(|checks| !checks.warnings.is_empty())
    }

    pub fn has_no_failures_or_warnings(&self) -> bool {
        !self.has_failures() && !self.has_warnings()
    }

    pub fn has_failure_for_location(
        &self, location: &ValidationLocation
    ) -> bool {
        !self.failures(location).is_empty()
    }

    pub fn has_failure_for_current_location(&self) -> bool {
        self.has_failure_for_location(&self.current)
    }

    /// Returns all locations checks have been recorded for.
    pub fn validated_locations(
        &self
    ) -> impl Iterator<Item = &ValidationLocation> {
        self.results.keys()
    }

    pub fn failures(&self, location: &ValidationLocation) -> &[ValidationCheck] {
        match self.results.get(location) {
            Some(checks) => &checks.errors,
            None => &[]
        }
    }

    pub fn warnings(&self, location: &ValidationLocation) -> &[ValidationCheck] {
        match self.results.get(location) {
            Some(checks) => &checks.warnings,
            None => &[]
        }
    }

    pub fn failures_for_current_location(&self) -> &[ValidationCheck] {
        self.failures(&self.current)
    }

    pub fn failures_for_all_locations(&self) -> Vec<&ValidationCheck> {
        self.results.values().flat_map(|checks| &checks.errors).collect()
    }

    pub fn warnings_for_all_locations(&self) -> Vec<&ValidationCheck> {
        self.results.values().flat_map(|checks| &checks.warnings).collect()
    }

    /// Returns errors, warnings and passed checks for a location.
    pub fn all_checks_for_location(
        &self, location: &ValidationLocation
    ) -> Vec<&ValidationCheck> {
        match self.results.get(location) {
            Some(checks) => {
                checks.errors.iter()
                    .chain(checks.warnings.iter())
                    .chain(checks.passed.iter())
                    .collect()
            }
            None => Vec::new()
        }
    }

    pub fn all_checks_for_current_location(&self) -> Vec<&ValidationCheck> {
        self.all_checks_for_location(&self.current)
    }

    /// Returns the first check with the given key for a location.
    pub fn result(
        &self, location: &ValidationLocation, key: &str
    ) -> Option<&ValidationCheck> {
        self.all_checks_for_location(location).into_iter().find(|check| {
            check.key == key
        })
    }

    pub fn result_for_current_location(
        &self, key: &str
    ) -> Option<&ValidationCheck> {
        self.result(&self.current, key)
    }

    pub fn metrics(&self, location: &ValidationLocation) -> &[ValidationMetric] {
        match self.results.get(location) {
            Some(checks) => &checks.metrics,
            None => &[]
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    const KEY: &str = "test.check";

    #[test]
    fn reject_and_warn() {
        let mut result = ValidationResult::with_location("foo");
        assert!(result.reject_if_false(true, KEY, &[]));
        assert!(!result.reject_if_true(true, "other", &[&"param"]));
        assert!(result.warn_if_none(Some(&1), "third", &[]));
        assert!(!result.warn_if_some(Some(&1), "fourth", &[]));

        let loc = ValidationLocation::from("foo");
        assert!(result.has_failures());
        assert!(result.has_warnings());
        assert!(result.has_failure_for_location(&loc));
        assert_eq!(result.failures(&loc).len(), 1);
        assert_eq!(result.failures(&loc)[0].key(), "other");
        assert_eq!(result.failures(&loc)[0].params(), &["param".to_string()]);
        assert_eq!(result.warnings(&loc).len(), 1);
        assert_eq!(result.all_checks_for_location(&loc).len(), 4);
        assert_eq!(
            result.result(&loc, KEY).unwrap().status(),
            ValidationStatus::Passed
        );
        assert!(result.result(&loc, "unknown").is_none());
    }

    #[test]
    fn locations() {
        let mut result = ValidationResult::with_location("foo");
        result.pass(KEY, &[]);
        result.set_location("bar");
        result.reject_for_location("baz", KEY, &[&5]);
        assert_eq!(result.current_location().as_str(), "bar");
        assert!(!result.has_failure_for_current_location());
        assert!(result.has_failure_for_location(&"baz".into()));
        assert!(!result.has_failure_for_location(&"foo".into()));
        assert!(!result.has_failure_for_location(&"unknown".into()));
        assert_eq!(result.validated_locations().count(), 3);
        assert_eq!(result.failures_for_all_locations().len(), 1);
    }

    #[test]
    fn passed_checks_can_be_suppressed() {
        let mut result = ValidationResult::with_location("foo");
        result.set_store_passing_checks(false);
        result.pass(KEY, &[]);
        result.warn(KEY, &[]);
        assert_eq!(result.all_checks_for_current_location().len(), 1);

        let mut other = ValidationResult::with_location("bar");
        other.pass(KEY, &[]);
        other.error(KEY, &[]);
        other.warn(KEY, &[]);
        result.add_all(&other);
        let bar = ValidationLocation::from("bar");
        assert_eq!(result.all_checks_for_location(&bar).len(), 2);
        assert!(result.has_failure_for_location(&bar));
        assert!(!result.is_success());
    }

    #[test]
    fn add_all_keeps_everything() {
        let mut result = ValidationResult::with_location("foo");
        result.pass(KEY, &[]);
        let mut other = ValidationResult::with_location("foo");
        other.pass("other", &[]);
        other.add_metric("size", 12);
        result.add_all(&other);
        assert_eq!(result.all_checks_for_current_location().len(), 2);
        assert_eq!(result.metrics(&"foo".into())[0].value(), "12");
        assert!(result.is_success());
    }

    #[test]
    fn metrics() {
        let before = Utc::now();
        let mut result = ValidationResult::with_location("foo");
        result.add_metric("a", "1");
        result.add_metric("b", "2");
        let metrics = result.metrics(&"foo".into());
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].name(), "a");
        assert_eq!(metrics[1].name(), "b");
        assert!(metrics[0].time() >= before);
        assert!(result.metrics(&"bar".into()).is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_result() {
        let mut result = ValidationResult::with_location("foo");
        result.error(KEY, &[&"AS1"]);
        let json = serde_json::to_string(&result).unwrap();
        let back: ValidationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.failures(&"foo".into()), result.failures(&"foo".into())
        );
    }
}
