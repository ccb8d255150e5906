//! Processing the content of RPKI repositories.
//!
//! This module contains types and procedures to parse and verify as well as
//! create all the objects that can appear in an RPKI repository.
//!
//! Certificates are parsed by the [`CertParser`][parser::CertParser] which
//! checks them against the RPKI certificate profile and produces a
//! [`Certificate`]. Signed objects are parsed by a
//! [`SignedObjectParser`][sigobj::SignedObjectParser] for the respective
//! content type. Each object type has a builder for creating new objects.

#![cfg(feature = "repository")]

//--- Re-exports
//
pub use self::aspa::Aspa;
pub use self::cert::Cert;
pub use self::crl::Crl;
pub use self::gbr::Ghostbusters;
pub use self::manifest::Manifest;
pub use self::rescert::{Certificate, ResourceCert, RouterCert};
pub use self::roa::Roa;


//--- Modules
//
pub mod aspa;
pub mod builder;
pub mod cert;
pub mod crl;
pub mod error;
pub mod gbr;
pub mod manifest;
pub mod parser;
pub mod rescert;
pub mod roa;
pub mod sigobj;
pub mod x509;

#[cfg(test)]
pub(crate) mod test;
