//! Validation and construction of RPKI objects.
//!
//! The _Resource Public Key Infrastructure_ (RPKI) is an application of
//! PKI to Internet routing security. It allows holders of IP address
//! prefixes and AS numbers to publish cryptographically signed statements
//! about their use in BGP.
//!
//! This crate contains the parsers and validators for RPKI resource and
//! router certificates, CRLs, and the signed objects defined so far:
//! manifests, ROAs, ASPAs and Ghostbusters records. For each of them,
//! there is also a builder that creates conforming objects.
//!
//! Parsing never fails with an error for invalid input. Instead, all
//! checks made along the way are recorded in a
//! [`ValidationResult`][validation::ValidationResult] which can be
//! inspected afterwards.
//!
//! The crate has the following features:
//!
//! * `repository`: the object model. Enabled by default.
//! * `softkeys`: an OpenSSL based signer that keeps keys in memory.
//! * `serde`: serialization of resources and validation results.

#[cfg(feature = "repository")] pub mod crypto;
#[cfg(feature = "repository")] pub mod oid;
#[cfg(feature = "repository")] pub mod repository;
#[cfg(feature = "repository")] pub mod resources;
#[cfg(feature = "repository")] pub mod uri;
#[cfg(feature = "repository")] pub mod validation;
