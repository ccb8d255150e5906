//! Configuration of the validation.

use chrono::{DateTime, Duration, Utc};
use super::result::ValidationResult;


//------------ Overclaim -----------------------------------------------------

/// What to do if a certificate claims resources its issuer doesn’t have.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Overclaim {
    /// The certificate is rejected.
    Reject,

    /// A warning is recorded and the excess resources are dropped.
    Warn,
}

impl Default for Overclaim {
    fn default() -> Self {
        Overclaim::Reject
    }
}


//------------ ValidationOptions ---------------------------------------------

/// Options for validating certificates, CRLs and manifests.
///
/// The staleness options only concern the next update time of CRLs and
/// manifests. The validity of certificates, including the EE certificate
/// of a manifest, is never extended by a grace period.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationOptions {
    strict: bool,
    crl_max_stale: Duration,
    manifest_max_stale: Duration,
    overclaim: Overclaim,
}

impl ValidationOptions {
    /// Strict checking of stale objects without a grace period.
    pub fn strict() -> Self {
        ValidationOptions {
            strict: true,
            .. Default::default()
        }
    }

    /// Stale objects and overclaiming only result in warnings.
    pub fn lenient() -> Self {
        ValidationOptions {
            strict: false,
            overclaim: Overclaim::Warn,
            .. Default::default()
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_crl_max_stale(mut self, period: Duration) -> Self {
        self.crl_max_stale = period;
        self
    }

    pub fn with_manifest_max_stale(mut self, period: Duration) -> Self {
        self.manifest_max_stale = period;
        self
    }

    pub fn with_overclaim(mut self, overclaim: Overclaim) -> Self {
        self.overclaim = overclaim;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn crl_max_stale(&self) -> Duration {
        self.crl_max_stale
    }

    pub fn manifest_max_stale(&self) -> Duration {
        self.manifest_max_stale
    }

    pub fn overclaim(&self) -> Overclaim {
        self.overclaim
    }

    /// Checks the next update time of a CRL.
    pub fn check_crl_next_update(
        &self,
        next_update: DateTime<Utc>,
        now: DateTime<Utc>,
        key: &str,
        result: &mut ValidationResult,
    ) -> bool {
        self.check_next_update(next_update, now, self.crl_max_stale, key, result)
    }

    /// Checks the next update time of a manifest.
    pub fn check_manifest_next_update(
        &self,
        next_update: DateTime<Utc>,
        now: DateTime<Utc>,
        key: &str,
        result: &mut ValidationResult,
    ) -> bool {
        self.check_next_update(
            next_update, now, self.manifest_max_stale, key, result
        )
    }

    /// Records the staleness check for a next update time.
    ///
    /// Past the next update, this is a warning unless the options are
    /// strict and the grace period is over, in which case it is an error.
    /// Returns whether there was no error.
    fn check_next_update(
        &self,
        next_update: DateTime<Utc>,
        now: DateTime<Utc>,
        grace: Duration,
        key: &str,
        result: &mut ValidationResult,
    ) -> bool {
        if now <= next_update {
            result.pass(key, &[&next_update]);
            true
        }
        else if self.strict && now > next_update + grace {
            result.error(key, &[&next_update]);
            false
        }
        else {
            result.warn(key, &[&next_update]);
            true
        }
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            strict: false,
            crl_max_stale: Duration::zero(),
            manifest_max_stale: Duration::zero(),
            overclaim: Overclaim::Reject,
        }
    }
}


//============ Tests =========================================================
