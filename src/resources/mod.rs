//! Handling of IP and AS resources.
//!
//! The types in this module implement the certificate extensions defined in
//! [RFC 3779] for including IP address and autonomous system resources in
//! certificates in the restricted form specified by [RFC 6487] for use in
//! RPKI.
//!
//! Resources of all three types, AS numbers, IPv4 and IPv6 addresses, are
//! collected in a [`ResourceSet`] which provides the set algebra needed
//! for validating chains of certificates. The [`ResourceExtension`] adds
//! the information which of the types are inherited from the issuer and
//! implements encoding and decoding of the two certificate extensions.
//!
//! [RFC 3779]: https://tools.ietf.org/html/rfc3779
//! [RFC 6487]: https://tools.ietf.org/html/rfc6487

pub use self::asres::{AsBlock, AsBlocks, AsRange, Asn};
pub use self::ext::{
    InheritedTypes, ResourceExtension, ResourceExtensionError
};
pub use self::ipres::{
    Addr, AddressFamily, AddressRange, IpBlock, IpBlocks, Prefix
};
pub use self::set::{FromStrError, ResourceSet, ResourceType};

pub mod asres;
pub mod ext;
pub mod ipres;
pub mod set;
mod chain;
