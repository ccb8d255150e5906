//! Validation of RPKI objects.
//!
//! Validating an object records a number of checks into a
//! [`ValidationResult`]. Each check has one of the keys defined in
//! [`checks`] and either passed, produced a warning, or failed. An object
//! is acceptable if none of its checks failed.
//!
//! Checks that only need the object itself happen while parsing it. Checks
//! that also need the issuer are done by the
//! [`ParentChildValidator`][chain::ParentChildValidator] using the
//! [`ValidationContext`] of the issuing CA.

pub use self::chain::{
    validate_child, validate_root, validate_signed_object, CrlLocator,
    ParentChildValidator, Revocation,
};
pub use self::context::ValidationContext;
pub use self::options::{Overclaim, ValidationOptions};
pub use self::result::{
    ValidationCheck, ValidationLocation, ValidationMetric, ValidationResult,
    ValidationStatus,
};

pub mod chain;
pub mod checks;
pub mod context;
pub mod options;
pub mod result;
