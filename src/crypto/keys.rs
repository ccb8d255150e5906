//! Types and parameters of keys.

use std::{error, fmt, io};
use std::convert::TryFrom;
use std::str::FromStr;
use bcder::{decode, encode};
use bcder::{BitString, Captured, Mode, OctetString, Oid, Tag, Unsigned};
use bcder::decode::{DecodeError, IntoSource, Source};
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use ring::{digest, signature};
use crate::oid;
use crate::repository::x509::Name;
use super::signature::{Signature, SigningAlgorithm};


//------------ PublicKeyFormat -----------------------------------------------

/// The formats of public keys found in RPKI certificates.
///
/// Resource certificates must use RSA keys as defined in [RFC 7935] while
/// BGPsec router certificates use ECDSA keys on the P-256 curve as defined
/// in [RFC 8608]. Any other key is kept as `Unsupported` so that profile
/// validation can complain about it.
///
/// [RFC 7935]: https://tools.ietf.org/html/rfc7935
/// [RFC 8608]: https://tools.ietf.org/html/rfc8608
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PublicKeyFormat {
    /// An RSA public key.
    Rsa,

    /// An ECDSA public key for the P-256 elliptic curve.
    EcdsaP256,

    /// Any other algorithm or an EC key on a different curve.
    Unsupported,
}

impl PublicKeyFormat {
    /// Returns whether the format is acceptable for resource certificates.
    pub fn allow_rpki_cert(self) -> bool {
        matches!(self, PublicKeyFormat::Rsa)
    }

    /// Returns whether the format is acceptable for router certificates.
    pub fn allow_router_cert(self) -> bool {
        matches!(self, PublicKeyFormat::Rsa | PublicKeyFormat::EcdsaP256)
    }
}


impl fmt::Display for PublicKeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            PublicKeyFormat::Rsa => "RSA",
            PublicKeyFormat::EcdsaP256 => "ECDSA P-256",
            PublicKeyFormat::Unsupported => "unsupported",
        })
    }
}


/// # ASN.1 Algorithm Identifiers
///
/// ```txt
/// AlgorithmIdentifier ::= SEQUENCE {
///      algorithm          OBJECT IDENTIFIER,
///      parameters         ANY DEFINED BY algorithm OPTIONAL }
/// ```
///
/// For RSA keys, the identifier is `rsaEncryption` with absent or NULL
/// parameters. For ECDSA keys, it is `id-ecPublicKey` and the parameter
/// must be exactly the named curve `secp256r1`.
impl PublicKeyFormat {
    /// Takes an algorithm identifier from the beginning of a value.
    ///
    /// Unknown algorithms are not an error but result in `Unsupported`.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let alg = Oid::take_from(cons)?;
            if alg == oid::RSA_ENCRYPTION {
                cons.take_opt_null()?;
                if cons.capture_all()?.as_slice().is_empty() {
                    Ok(PublicKeyFormat::Rsa)
                }
                else {
                    Ok(PublicKeyFormat::Unsupported)
                }
            }
            else if alg == oid::EC_PUBLIC_KEY {
                let params = cons.capture_all()?;
                if params.as_slice() == secp256r1_param().as_slice() {
                    Ok(PublicKeyFormat::EcdsaP256)
                }
                else {
                    Ok(PublicKeyFormat::Unsupported)
                }
            }
            else {
                cons.skip_all()?;
                Ok(PublicKeyFormat::Unsupported)
            }
        })
    }

    /// Provides an encoder for the algorithm identifier.
    ///
    /// Unsupported keys are encoded with an empty identifier. They can only
    /// appear in decoded data which is never re-encoded.
    pub fn encode(self) -> impl encode::Values {
        match self {
            PublicKeyFormat::Rsa => {
                encode::Choice3::One(
                    encode::sequence((
                        oid::RSA_ENCRYPTION.encode(),
                        ().encode(),
                    ))
                )
            }
            PublicKeyFormat::EcdsaP256 => {
                encode::Choice3::Two(
                    encode::sequence((
                        oid::EC_PUBLIC_KEY.encode(),
                        oid::SECP256R1.encode(),
                    ))
                )
            }
            PublicKeyFormat::Unsupported => {
                encode::Choice3::Three(encode::sequence(encode::Nothing))
            }
        }
    }
}

fn secp256r1_param() -> Captured {
    oid::SECP256R1.encode().to_captured(Mode::Der)
}


//------------ PublicKey -----------------------------------------------------

/// A public key as found in a *subjectPublicKeyInfo* structure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey {
    algorithm: PublicKeyFormat,
    bits: BitString,
}

impl PublicKey {
    /// Returns the algorithm of this public key.
    pub fn algorithm(&self) -> PublicKeyFormat {
        self.algorithm
    }

    /// Returns the bits of this public key.
    pub fn bits(&self) -> Bytes {
        self.bits.octet_bytes()
    }

    /// Returns whether the key is acceptable for resource certificates.
    pub fn allow_rpki_cert(&self) -> bool {
        self.algorithm.allow_rpki_cert()
    }

    /// Returns whether the key is acceptable for BGPsec router certificates.
    pub fn allow_router_cert(&self) -> bool {
        self.algorithm.allow_router_cert()
    }

    /// Returns the size of the modulus of an RSA key in bits.
    ///
    /// Returns `None` if this isn’t an RSA key or the key bits are not a
    /// correctly encoded `RSAPublicKey`.
    pub fn rsa_modulus_bits(&self) -> Option<usize> {
        if self.algorithm != PublicKeyFormat::Rsa {
            return None
        }
        let modulus = Mode::Der.decode(self.bits(), |cons| {
            cons.take_sequence(|cons| {
                let modulus = Unsigned::take_from(cons)?;
                let _exponent = Unsigned::take_from(cons)?;
                Ok(modulus)
            })
        }).ok()?;
        let modulus: &[u8] = modulus.as_ref();
        let start = modulus.iter().position(|&octet| octet != 0)?;
        let modulus = &modulus[start..];
        Some(
            modulus.len() * 8 - modulus[0].leading_zeros() as usize
        )
    }

    /// Returns a key identifier for this key.
    ///
    /// The identifier is the SHA-1 hash of the key’s bits.
    pub fn key_identifier(&self) -> KeyIdentifier {
        let digest = digest::digest(
            &digest::SHA1_FOR_LEGACY_USE_ONLY, self.bits().as_ref()
        );
        let mut res = [0u8; 20];
        res.copy_from_slice(digest.as_ref());
        KeyIdentifier(res)
    }

    /// Verifies a signature using this public key.
    pub fn verify(
        &self, message: &[u8], signature: &Signature
    ) -> Result<(), SignatureVerificationError> {
        let alg: &dyn signature::VerificationAlgorithm = match (
            self.algorithm, signature.algorithm()
        ) {
            (PublicKeyFormat::Rsa, SigningAlgorithm::RsaSha256) => {
                &signature::RSA_PKCS1_2048_8192_SHA256
            }
            (PublicKeyFormat::EcdsaP256, SigningAlgorithm::EcdsaP256Sha256) => {
                &signature::ECDSA_P256_SHA256_ASN1
            }
            _ => return Err(SignatureVerificationError::Algorithm)
        };
        signature::UnparsedPublicKey::new(
            alg, self.bits()
        ).verify(
            message, signature.value().as_ref()
        ).map_err(|_| SignatureVerificationError::Mismatch)
    }
}


/// # As `SubjectPublicKeyInfo`
///
/// ```txt
/// SubjectPublicKeyInfo  ::=  SEQUENCE  {
///      algorithm            AlgorithmIdentifier,
///      subjectPublicKey     BIT STRING  }
/// ```
impl PublicKey {
    pub fn decode<S: IntoSource>(
        source: S
    ) -> Result<Self, DecodeError<<S::Source as Source>::Error>> {
        Mode::Der.decode(source, Self::take_from)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            Ok(PublicKey {
                algorithm: PublicKeyFormat::take_from(cons)?,
                bits: BitString::take_from(cons)?
            })
        })
    }

    pub fn encode_ref(&self) -> impl encode::Values + '_ {
        encode::sequence((
            self.algorithm.encode(),
            self.bits.encode_ref()
        ))
    }

    /// Returns a name with the hex-encoded key bits as the common name.
    ///
    /// This is one of the options for subject names in RPKI certificates
    /// suggested by section 8 of [RFC 6487].
    ///
    /// [RFC 6487]: https://tools.ietf.org/html/rfc6487
    pub fn to_subject_name(&self) -> Name {
        Name::from_captured(
            encode::sequence(
                encode::set(
                    encode::sequence((
                        oid::AT_COMMON_NAME.encode(),
                        PublicKeyCn(self).encode(),
                    ))
                )
            ).to_captured(Mode::Der)
        )
    }

    /// Returns the encoded *subjectPublicKeyInfo*.
    pub fn to_info_bytes(&self) -> Bytes {
        self.encode_ref().to_captured(Mode::Der).into_bytes()
    }
}


//------------ PublicKeyCn ---------------------------------------------------

/// Value encoder for a public key as a common name.
///
/// The common name is the key identifier in hex digits which is what most
/// RPKI CAs use.
#[derive(Clone, Debug)]
struct PublicKeyCn<'a>(&'a PublicKey);

impl PrimitiveContent for PublicKeyCn<'_> {
    const TAG: Tag = Tag::PRINTABLE_STRING;

    fn encoded_len(&self, _mode: Mode) -> usize {
        40
    }

    fn write_encoded<W: io::Write>(
        &self,
        _mode: Mode,
        target: &mut W
    ) -> Result<(), io::Error> {
        write!(target, "{}", self.0.key_identifier())
    }
}


//------------ KeyIdentifier -------------------------------------------------

/// A key identifier.
///
/// This is the SHA-1 hash over the public key’s bits.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyIdentifier([u8; 20]);

impl KeyIdentifier {
    /// Returns an octet slice of the key identifer’s value.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Takes an encoded key identifier from a constructed value.
    ///
    /// ```text
    /// KeyIdentifier ::= OCTET STRING
    /// ```
    ///
    /// The content of the octet string needs to be a SHA-1 hash, so it must
    /// be exactly 20 octets long.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_value_if(Tag::OCTET_STRING, Self::from_content)
    }

    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_value_if(Tag::OCTET_STRING, Self::from_content)
    }

    /// Parses an encoded key identifer from encoded content.
    pub fn from_content<S: decode::Source>(
        content: &mut decode::Content<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let octets = OctetString::from_content(content)?;
        Self::try_from(octets.to_bytes().as_ref()).map_err(|_| {
            content.content_err("invalid key identifier")
        })
    }
}


//--- TryFrom and FromStr

impl<'a> TryFrom<&'a [u8]> for KeyIdentifier {
    type Error = KeyIdentifierError;

    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        if value.len() != 20 {
            return Err(KeyIdentifierError)
        }
        let mut res = [0u8; 20];
        res.copy_from_slice(value);
        Ok(KeyIdentifier(res))
    }
}

impl FromStr for KeyIdentifier {
    type Err = KeyIdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.len() != 40 || !value.is_ascii() {
            return Err(KeyIdentifierError)
        }
        let mut res = [0u8; 20];
        for (idx, ch) in value.as_bytes().chunks(2).enumerate() {
            let ch = std::str::from_utf8(ch).map_err(|_| KeyIdentifierError)?;
            res[idx] = u8::from_str_radix(ch, 16).map_err(|_| {
                KeyIdentifierError
            })?;
        }
        Ok(KeyIdentifier(res))
    }
}


//--- AsRef

impl AsRef<[u8]> for KeyIdentifier {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}


//--- Display and Debug

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for octet in &self.0 {
            write!(f, "{:02X}", octet)?
        }
        Ok(())
    }
}

impl fmt::Debug for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "KeyIdentifier({})", self)
    }
}


//--- PrimitiveContent

impl PrimitiveContent for KeyIdentifier {
    const TAG: Tag = Tag::OCTET_STRING;

    fn encoded_len(&self, _mode: Mode) -> usize {
        20
    }

    fn write_encoded<W: io::Write>(
        &self,
        _mode: Mode,
        target: &mut W
    ) -> Result<(), io::Error> {
        target.write_all(&self.0)
    }
}


//--- Deserialize and Serialize

#[cfg(feature = "serde")]
impl serde::Serialize for KeyIdentifier {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for KeyIdentifier {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D
    ) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        KeyIdentifier::from_str(&s).map_err(serde::de::Error::custom)
    }
}


//------------ KeyIdentifierError --------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyIdentifierError;

impl fmt::Display for KeyIdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid key identifier")
    }
}

impl error::Error for KeyIdentifierError { }


//------------ SignatureVerificationError ------------------------------------

/// An error happened while verifying a signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureVerificationError {
    /// The key cannot be used with the signature’s algorithm.
    Algorithm,

    /// The signature does not match the data.
    Mismatch,
}

impl fmt::Display for SignatureVerificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            SignatureVerificationError::Algorithm => {
                "key does not match signature algorithm"
            }
            SignatureVerificationError::Mismatch => {
                "signature verification failed"
            }
        })
    }
}

impl error::Error for SignatureVerificationError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_identifier_from_str() {
        let ki = KeyIdentifier::from_str(
            "0123456789ABCDEF0123456789abcdef01234567"
        ).unwrap();
        assert_eq!(ki.as_slice()[0], 0x01);
        assert_eq!(ki.as_slice()[19], 0x67);
        assert_eq!(
            ki.to_string(),
            "0123456789ABCDEF0123456789ABCDEF01234567"
        );
        assert!(KeyIdentifier::from_str("0123").is_err());
        assert!(KeyIdentifier::try_from(&[0u8; 19][..]).is_err());
    }

    #[test]
    fn unsupported_key_format() {
        // SEQUENCE { SEQUENCE { OID 1.2.3 }, BIT STRING 00 01 }
        let der = b"\x30\x0a\x30\x04\x06\x02\x2a\x03\x03\x02\x00\x01";
        let key = PublicKey::decode(der.as_ref()).unwrap();
        assert_eq!(key.algorithm(), PublicKeyFormat::Unsupported);
        assert!(!key.allow_rpki_cert());
        assert!(key.rsa_modulus_bits().is_none());
    }

    #[test]
    fn ec_key_on_other_curve_is_unsupported() {
        // SEQUENCE {
        //   SEQUENCE { ecPublicKey, secp384r1 }, BIT STRING 00 04
        // }
        let der = b"\x30\x17\
            \x30\x10\
              \x06\x07\x2a\x86\x48\xce\x3d\x02\x01\
              \x06\x05\x2b\x81\x04\x00\x22\
            \x03\x03\x00\x04\x00";
        let key = PublicKey::decode(der.as_ref()).unwrap();
        assert_eq!(key.algorithm(), PublicKeyFormat::Unsupported);
    }
}

#[cfg(all(test, feature = "softkeys"))]
mod signer_test {
    use crate::crypto::signer::Signer;
    use crate::crypto::softsigner::OpenSslSigner;
    use super::*;

    #[test]
    fn rsa_key_size_and_verify() {
        let signer = OpenSslSigner::new();
        let key = signer.create_key(PublicKeyFormat::Rsa).unwrap();
        let info = signer.get_key_info(&key).unwrap();
        assert_eq!(info.algorithm(), PublicKeyFormat::Rsa);
        assert_eq!(info.rsa_modulus_bits(), Some(2048));
        let sig = signer.sign(
            &key, SigningAlgorithm::RsaSha256, b"foobar"
        ).unwrap();
        info.verify(b"foobar", &sig).unwrap();
        assert_eq!(
            info.verify(b"barfoo", &sig),
            Err(SignatureVerificationError::Mismatch)
        );
        assert_eq!(
            PublicKey::decode(info.to_info_bytes().as_ref()).unwrap(),
            info
        );
    }

    #[test]
    fn ecdsa_key_verify() {
        let signer = OpenSslSigner::new();
        let key = signer.create_key(PublicKeyFormat::EcdsaP256).unwrap();
        let info = signer.get_key_info(&key).unwrap();
        assert_eq!(info.algorithm(), PublicKeyFormat::EcdsaP256);
        assert!(info.allow_router_cert());
        assert!(!info.allow_rpki_cert());
        let sig = signer.sign(
            &key, SigningAlgorithm::EcdsaP256Sha256, b"foobar"
        ).unwrap();
        info.verify(b"foobar", &sig).unwrap();
    }
}
