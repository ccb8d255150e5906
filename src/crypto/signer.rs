//! A generic interface to a signer.

use std::{error, fmt};
use super::keys::{PublicKey, PublicKeyFormat};
use super::signature::{Signature, SigningAlgorithm};


//------------ Signer --------------------------------------------------------

/// A type that allows creating signatures.
///
/// Keys are kept by the signer and referred to through a key identifier
/// of the signer’s choosing. Builders only ever see the public key.
pub trait Signer {
    /// The type used for identifying keys.
    type KeyId;

    /// An operational error happened in the signer.
    type Error: fmt::Debug + fmt::Display;

    /// Creates a new key and returns an identifier.
    fn create_key(
        &self,
        algorithm: PublicKeyFormat
    ) -> Result<Self::KeyId, Self::Error>;

    /// Returns the public key information for the given key.
    fn get_key_info(
        &self,
        key: &Self::KeyId
    ) -> Result<PublicKey, KeyError<Self::Error>>;

    /// Destroys a key.
    fn destroy_key(
        &self,
        key: &Self::KeyId
    ) -> Result<(), KeyError<Self::Error>>;

    /// Signs data.
    fn sign<D: AsRef<[u8]> + ?Sized>(
        &self,
        key: &Self::KeyId,
        algorithm: SigningAlgorithm,
        data: &D
    ) -> Result<Signature, SigningError<Self::Error>>;

    /// Signs data using a one time use keypair.
    ///
    /// Returns both the signature and the public key of the key pair,
    /// but will not store this key pair.
    fn sign_one_off<D: AsRef<[u8]> + ?Sized>(
        &self,
        algorithm: SigningAlgorithm,
        data: &D
    ) -> Result<(Signature, PublicKey), Self::Error>;

    /// Creates random data.
    ///
    /// The method fills the provided bytes slice with random data.
    fn rand(&self, target: &mut [u8]) -> Result<(), Self::Error>;
}


//------------ KeyError ------------------------------------------------------

#[derive(Clone, Debug)]
pub enum KeyError<S> {
    /// A key with the given key ID doesn’t exist.
    KeyNotFound,

    /// An error happened during signing.
    Signer(S)
}

impl<S> From<S> for KeyError<S> {
    fn from(err: S) -> Self {
        KeyError::Signer(err)
    }
}

impl<S: fmt::Display> fmt::Display for KeyError<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            KeyError::KeyNotFound => write!(f, "key not found"),
            KeyError::Signer(ref s) => s.fmt(f)
        }
    }
}

impl<S: fmt::Debug + fmt::Display> error::Error for KeyError<S> { }


//------------ SigningError --------------------------------------------------

#[derive(Clone, Debug)]
pub enum SigningError<S> {
    /// A key with the given key ID doesn’t exist.
    KeyNotFound,

    /// The key cannot be used with the algorithm.
    IncompatibleKey,

    /// An error happened during signing.
    Signer(S)
}

impl<S> From<S> for SigningError<S> {
    fn from(err: S) -> Self {
        SigningError::Signer(err)
    }
}

impl<S> From<KeyError<S>> for SigningError<S> {
    fn from(err: KeyError<S>) -> Self {
        match err {
            KeyError::KeyNotFound => SigningError::KeyNotFound,
            KeyError::Signer(err) => SigningError::Signer(err)
        }
    }
}

impl<S: fmt::Display> fmt::Display for SigningError<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SigningError::KeyNotFound => write!(f, "key not found"),
            SigningError::IncompatibleKey => {
                write!(f, "key not compatible with algorithm")
            }
            SigningError::Signer(ref s) => s.fmt(f)
        }
    }
}

impl<S: fmt::Debug + fmt::Display> error::Error for SigningError<S> { }


//============ Tests =========================================================
