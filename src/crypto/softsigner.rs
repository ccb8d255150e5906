//! A signer atop the OpenSSL library.
//!
//! Because this adds a dependency to openssl libs this is disabled by
//! default and only available with the `softkeys` feature. It keeps all
//! keys in memory which is fine for tests and for issuing from software
//! keys but not much else.

use std::io;
use std::sync::{Arc, RwLock};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use ring::rand;
use ring::rand::SecureRandom;
use super::keys::{PublicKey, PublicKeyFormat};
use super::signature::{Signature, SigningAlgorithm};
use super::signer::{KeyError, Signer, SigningError};


//------------ OpenSslSigner -------------------------------------------------

/// An OpenSSL based signer.
///
/// Keeps the keys in memory.
pub struct OpenSslSigner {
    keys: RwLock<Vec<Option<Arc<KeyPair>>>>,
    rng: rand::SystemRandom,
}

impl OpenSslSigner {
    pub fn new() -> OpenSslSigner {
        OpenSslSigner {
            keys: Default::default(),
            rng: rand::SystemRandom::new(),
        }
    }

    fn insert_key(&self, key: KeyPair) -> Result<KeyId, io::Error> {
        let mut keys = self.keys.write().map_err(|_| poisoned())?;
        let res = keys.len();
        keys.push(Some(key.into()));
        Ok(KeyId(res))
    }

    fn get_key(&self, id: KeyId) -> Result<Arc<KeyPair>, KeyError<io::Error>> {
        let keys = self.keys.read().map_err(|_| poisoned())?;
        keys.get(id.0).and_then(|key| {
            key.as_ref().cloned()
        }).ok_or(KeyError::KeyNotFound)
    }

    fn delete_key(&self, key: KeyId) -> Result<(), KeyError<io::Error>> {
        let mut keys = self.keys.write().map_err(|_| poisoned())?;
        match keys.get_mut(key.0) {
            Some(key) if key.is_some() => {
                *key = None;
                Ok(())
            }
            _ => Err(KeyError::KeyNotFound)
        }
    }
}

impl Signer for OpenSslSigner {
    type KeyId = KeyId;
    type Error = io::Error;

    fn create_key(
        &self, algorithm: PublicKeyFormat
    ) -> Result<Self::KeyId, Self::Error> {
        self.insert_key(KeyPair::new(algorithm)?)
    }

    fn get_key_info(
        &self,
        id: &Self::KeyId
    ) -> Result<PublicKey, KeyError<Self::Error>> {
        self.get_key(*id)?.get_key_info().map_err(KeyError::Signer)
    }

    fn destroy_key(
        &self, key: &Self::KeyId
    ) -> Result<(), KeyError<Self::Error>> {
        self.delete_key(*key)
    }

    fn sign<D: AsRef<[u8]> + ?Sized>(
        &self,
        key: &Self::KeyId,
        algorithm: SigningAlgorithm,
        data: &D
    ) -> Result<Signature, SigningError<Self::Error>> {
        let key = self.get_key(*key)?;
        if key.format != algorithm.public_key_format() {
            return Err(SigningError::IncompatibleKey)
        }
        key.sign(algorithm, data.as_ref()).map_err(Into::into)
    }

    fn sign_one_off<D: AsRef<[u8]> + ?Sized>(
        &self,
        algorithm: SigningAlgorithm,
        data: &D
    ) -> Result<(Signature, PublicKey), Self::Error> {
        let key = KeyPair::new(algorithm.public_key_format())?;
        let info = key.get_key_info()?;
        let sig = key.sign(algorithm, data.as_ref())?;
        Ok((sig, info))
    }

    fn rand(&self, target: &mut [u8]) -> Result<(), Self::Error> {
        self.rng.fill(target).map_err(|_|
            io::Error::new(io::ErrorKind::Other, "rng error")
        )
    }
}

impl Default for OpenSslSigner {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "key store lock poisoned")
}


//------------ KeyId ---------------------------------------------------------

/// This signer’s key identifier.
//
//  We wrap this in a newtype so that people won’t start mucking about with
//  the integers.
#[derive(Clone, Copy, Debug)]
pub struct KeyId(usize);


//------------ KeyPair -------------------------------------------------------

/// A key pair kept by the signer.
struct KeyPair {
    pkey: PKey<Private>,
    format: PublicKeyFormat,
}

impl KeyPair {
    fn new(format: PublicKeyFormat) -> Result<Self, io::Error> {
        let pkey = match format {
            PublicKeyFormat::Rsa => {
                PKey::from_rsa(Rsa::generate(2048)?)?
            }
            PublicKeyFormat::EcdsaP256 => {
                let group = EcGroup::from_curve_name(
                    Nid::X9_62_PRIME256V1
                )?;
                PKey::from_ec_key(EcKey::generate(&group)?)?
            }
            PublicKeyFormat::Unsupported => {
                return Err(io::Error::new(
                    io::ErrorKind::Other, "invalid algorithm"
                ))
            }
        };
        Ok(KeyPair { pkey, format })
    }

    fn get_key_info(&self) -> Result<PublicKey, io::Error> {
        let der = self.pkey.public_key_to_der()?;
        PublicKey::decode(der.as_slice()).map_err(|err| {
            io::Error::new(io::ErrorKind::Other, err.to_string())
        })
    }

    fn sign(
        &self,
        algorithm: SigningAlgorithm,
        data: &[u8]
    ) -> Result<Signature, io::Error> {
        let mut signer = ::openssl::sign::Signer::new(
            MessageDigest::sha256(), &self.pkey
        )?;
        signer.update(data)?;
        Ok(Signature::new(algorithm, signer.sign_to_vec()?.into()))
    }
}


//============ Tests =========================================================
