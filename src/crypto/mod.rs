//! Signature, key and digest handling.
//!
//! The actual cryptography is left to _ring_ for verification and, behind
//! the `softkeys` feature, OpenSSL for key generation and signing. This
//! module provides the types to represent keys, algorithms and signatures
//! in RPKI objects.

pub use self::digest::{Digest, DigestAlgorithm};
pub use self::keys::{
    KeyIdentifier, PublicKey, PublicKeyFormat, SignatureVerificationError,
};
pub use self::signature::{Signature, SignatureAlgorithm, SigningAlgorithm};
pub use self::signer::{KeyError, Signer, SigningError};

pub mod digest;
pub mod keys;
pub mod signature;
pub mod signer;
#[cfg(feature = "softkeys")] pub mod softsigner;
