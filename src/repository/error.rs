//! Error handling for the `repository` module.
//!
//! Validation outcomes are not errors in this sense. They are recorded as
//! checks in a [`ValidationResult`]. The types here cover the misuse of
//! parsers and the failure to build objects.
//!
//! [`ValidationResult`]: crate::validation::ValidationResult

use std::{error, fmt};
use crate::resources::ResourceExtensionError;


//------------ IllegalState --------------------------------------------------

/// An object was requested from a parser that has recorded an error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IllegalState {
    what: &'static str,
}

impl IllegalState {
    pub(crate) fn new(what: &'static str) -> Self {
        IllegalState { what }
    }
}

impl fmt::Display for IllegalState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} failed validation", self.what)
    }
}

impl error::Error for IllegalState { }


//------------ BuildError ----------------------------------------------------

/// Building a certificate or signed object failed.
#[derive(Clone, Debug)]
pub enum BuildError {
    /// The resources given for a certificate are invalid.
    Resources(ResourceExtensionError),

    /// A mandatory field hasn’t been provided.
    MissingField(&'static str),

    /// A field has a value that cannot be used.
    InvalidField(&'static str),

    /// The signer failed.
    Signing(String),

    /// The assembled object could not be decoded again.
    Encoding(String),
}

impl BuildError {
    pub(crate) fn signing(err: impl fmt::Display) -> Self {
        BuildError::Signing(err.to_string())
    }
}

impl From<ResourceExtensionError> for BuildError {
    fn from(err: ResourceExtensionError) -> Self {
        BuildError::Resources(err)
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BuildError::Resources(ref err) => {
                write!(f, "invalid resources: {}", err)
            }
            BuildError::MissingField(field) => {
                write!(f, "missing {}", field)
            }
            BuildError::InvalidField(field) => {
                write!(f, "invalid {}", field)
            }
            BuildError::Signing(ref err) => {
                write!(f, "signing failed: {}", err)
            }
            BuildError::Encoding(ref err) => {
                write!(f, "produced invalid encoding: {}", err)
            }
        }
    }
}

impl error::Error for BuildError { }
