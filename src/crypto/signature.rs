//! Signature algorithms and operations.

use std::fmt;
use bcder::{decode, encode};
use bcder::{Oid, Tag};
use bcder::decode::DecodeError;
use bcder::encode::PrimitiveContent;
use bytes::Bytes;
use crate::oid;
use super::keys::PublicKeyFormat;


//------------ SigningAlgorithm ----------------------------------------------

/// The algorithms that can be used for creating signatures.
///
/// RPKI allows RSA PKCS #1 v1.5 with SHA-256 per [RFC 7935]. BGPsec router
/// keys additionally use ECDSA with curve P-256 and SHA-256 per
/// [RFC 8608].
///
/// [RFC 7935]: https://tools.ietf.org/html/rfc7935
/// [RFC 8608]: https://tools.ietf.org/html/rfc8608
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SigningAlgorithm {
    RsaSha256,
    EcdsaP256Sha256,
}

impl SigningAlgorithm {
    /// Returns the public key format needed for this algorithm.
    pub fn public_key_format(self) -> PublicKeyFormat {
        match self {
            SigningAlgorithm::RsaSha256 => PublicKeyFormat::Rsa,
            SigningAlgorithm::EcdsaP256Sha256 => PublicKeyFormat::EcdsaP256,
        }
    }

    /// Returns the algorithm matching a key format.
    pub fn for_key_format(format: PublicKeyFormat) -> Option<Self> {
        match format {
            PublicKeyFormat::Rsa => Some(SigningAlgorithm::RsaSha256),
            PublicKeyFormat::EcdsaP256 => {
                Some(SigningAlgorithm::EcdsaP256Sha256)
            }
            PublicKeyFormat::Unsupported => None,
        }
    }

    /// Provides an encoder for the identifier used in X.509 objects.
    ///
    /// This is `sha256WithRSAEncryption` with NULL parameters for RSA and
    /// `ecdsa-with-SHA256` without parameters for ECDSA.
    pub fn x509_encode(self) -> impl encode::Values {
        match self {
            SigningAlgorithm::RsaSha256 => {
                encode::Choice2::One(encode::sequence((
                    oid::SHA256_WITH_RSA_ENCRYPTION.encode(),
                    ().encode(),
                )))
            }
            SigningAlgorithm::EcdsaP256Sha256 => {
                encode::Choice2::Two(encode::sequence(
                    oid::ECDSA_WITH_SHA256.encode()
                ))
            }
        }
    }

    /// Provides an encoder for the identifier used in signed objects.
    ///
    /// [RFC 6488] requires `rsaEncryption` here.
    ///
    /// [RFC 6488]: https://tools.ietf.org/html/rfc6488
    pub fn cms_encode(self) -> impl encode::Values {
        match self {
            SigningAlgorithm::RsaSha256 => {
                encode::Choice2::One(encode::sequence((
                    oid::RSA_ENCRYPTION.encode(),
                    ().encode(),
                )))
            }
            SigningAlgorithm::EcdsaP256Sha256 => {
                encode::Choice2::Two(encode::sequence(
                    oid::ECDSA_WITH_SHA256.encode()
                ))
            }
        }
    }
}


//------------ SignatureAlgorithm --------------------------------------------

/// A signature algorithm identifier as found in an object.
///
/// Decoding accepts any algorithm so that the profile checks can report on
/// it. The object identifier is kept together with whether a parameters
/// field was present.
///
/// ```txt
/// AlgorithmIdentifier          ::= SEQUENCE {
///      algorithm                   OBJECT IDENTIFIER,
///      parameters                  ANY DEFINED BY algorithm OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureAlgorithm {
    oid: Oid<Bytes>,
    has_parameter: bool,
}

impl SignatureAlgorithm {
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let oid = Oid::take_from(cons)?;
            let has_parameter = cons.take_opt_primitive_if(
                Tag::NULL, |_| Ok(())
            )?.is_some();
            cons.skip_all()?;
            Ok(SignatureAlgorithm { oid, has_parameter })
        })
    }

    pub fn oid(&self) -> &Oid<Bytes> {
        &self.oid
    }

    pub fn has_parameter(&self) -> bool {
        self.has_parameter
    }

    /// Returns the signing algorithm if used in an X.509 object.
    pub fn x509_signing_algorithm(&self) -> Option<SigningAlgorithm> {
        if self.oid == oid::SHA256_WITH_RSA_ENCRYPTION {
            Some(SigningAlgorithm::RsaSha256)
        }
        else if self.oid == oid::ECDSA_WITH_SHA256 {
            Some(SigningAlgorithm::EcdsaP256Sha256)
        }
        else {
            None
        }
    }

    /// Returns the signing algorithm if used in a signed object.
    ///
    /// Both `rsaEncryption` and `sha256WithRSAEncryption` are accepted
    /// here.
    pub fn cms_signing_algorithm(&self) -> Option<SigningAlgorithm> {
        if
            self.oid == oid::RSA_ENCRYPTION
            || self.oid == oid::SHA256_WITH_RSA_ENCRYPTION
        {
            Some(SigningAlgorithm::RsaSha256)
        }
        else {
            None
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.oid)
    }
}


//------------ Signature -----------------------------------------------------

/// A signature value together with the algorithm used to create it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    algorithm: SigningAlgorithm,
    value: Bytes
}

impl Signature {
    pub fn new(algorithm: SigningAlgorithm, value: Bytes) -> Self {
        Signature { algorithm, value }
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn unwrap(self) -> (SigningAlgorithm, Bytes) {
        (self.algorithm, self.value)
    }
}


//============ Tests =========================================================
