//! Infrastructure for tests.
//!
//! The [`DummySigner`] allows building objects without any real
//! cryptography. Its signatures never verify, so anything that checks
//! signatures needs the `softkeys` feature and the OpenSSL signer.

use std::convert::{Infallible, TryFrom};
use std::str::FromStr;
use bcder::encode;
use bcder::{BitString, Mode, OctetString, Tag};
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use chrono::Duration;
use crate::{oid, uri};
use crate::crypto::{
    KeyError, KeyIdentifier, PublicKey, PublicKeyFormat, Signature, Signer,
    SigningAlgorithm, SigningError,
};
use super::builder::{CertBuilder, CertKind};
use super::cert::Cert;
use super::x509::{Name, Serial, Time, Validity};

pub mod cert;


//------------ DummySigner ---------------------------------------------------

/// A signer with a single fixed key and fixed signatures.
#[derive(Clone, Copy, Debug, Default)]
pub struct DummySigner;

impl Signer for DummySigner {
    type KeyId = ();
    type Error = Infallible;

    fn create_key(
        &self, _algorithm: PublicKeyFormat
    ) -> Result<Self::KeyId, Self::Error> {
        Ok(())
    }

    fn get_key_info(
        &self, _key: &Self::KeyId
    ) -> Result<PublicKey, KeyError<Self::Error>> {
        Ok(dummy_key())
    }

    fn destroy_key(
        &self, _key: &Self::KeyId
    ) -> Result<(), KeyError<Self::Error>> {
        Ok(())
    }

    fn sign<D: AsRef<[u8]> + ?Sized>(
        &self,
        _key: &Self::KeyId,
        algorithm: SigningAlgorithm,
        _data: &D
    ) -> Result<Signature, SigningError<Self::Error>> {
        Ok(Signature::new(algorithm, Bytes::from_static(&[0x5A; 256])))
    }

    fn sign_one_off<D: AsRef<[u8]> + ?Sized>(
        &self,
        algorithm: SigningAlgorithm,
        _data: &D
    ) -> Result<(Signature, PublicKey), Self::Error> {
        Ok((
            Signature::new(algorithm, Bytes::from_static(&[0x5A; 256])),
            dummy_key()
        ))
    }

    fn rand(&self, target: &mut [u8]) -> Result<(), Self::Error> {
        target.iter_mut().enumerate().for_each(|(i, octet)| {
            *octet = i as u8
        });
        Ok(())
    }
}

/// Returns the key of the dummy signer.
///
/// This is an RSA key with a 2048 bit modulus that isn’t a real key.
pub fn dummy_key() -> PublicKey {
    let mut modulus = vec![0u8; 257];
    modulus[1] = 0xC0;
    modulus[256] = 0x01;
    let rsa_key = encode::sequence((
        OctetString::encode_slice_as(modulus, Tag::INTEGER),
        OctetString::encode_slice_as(b"\x01\x00\x01", Tag::INTEGER),
    )).to_captured(Mode::Der);
    let info = encode::sequence((
        encode::sequence((oid::RSA_ENCRYPTION.encode(), ().encode())),
        BitString::encode_slice(rsa_key.as_slice(), 0),
    )).to_captured(Mode::Der);
    PublicKey::decode(info.as_slice()).unwrap()
}


//------------ Builders ------------------------------------------------------

pub const TA_CER: &str = "rsync://example.com/repo/ta.cer";
pub const TA_CRL: &str = "rsync://example.com/repo/ta.crl";
pub const CA_CRL: &str = "rsync://example.com/repo/ca/ca.crl";

pub fn rsync(uri: &str) -> uri::Rsync {
    uri::Rsync::from_str(uri).unwrap()
}

/// Returns a validity that started yesterday and lasts a year.
pub fn test_validity() -> Validity {
    let now = Time::from_timestamp(Time::now().timestamp()).unwrap();
    Validity::new(now - Duration::days(1), now + Duration::days(365))
}

/// Returns a builder for a trust anchor certificate without resources.
pub fn ta_builder(key: PublicKey) -> CertBuilder {
    CertBuilder::new_ta(Serial::from(1), test_validity(), key)
        .with_ca_repository(rsync("rsync://example.com/repo/"))
        .with_rpki_manifest(rsync("rsync://example.com/repo/ta.mft"))
}

/// Returns a builder for a CA certificate issued by `issuer`.
pub fn ca_builder_for(issuer: &Cert, key: PublicKey) -> CertBuilder {
    issued_builder(CertKind::Ca, issuer, key, TA_CRL)
        .with_ca_issuer(rsync(TA_CER))
        .with_ca_repository(rsync("rsync://example.com/repo/ca/"))
        .with_rpki_manifest(rsync("rsync://example.com/repo/ca/ca.mft"))
}

/// Returns a builder for an EE certificate issued by `issuer`.
pub fn ee_builder_for(issuer: &Cert, key: PublicKey) -> CertBuilder {
    issued_builder(CertKind::Ee, issuer, key, CA_CRL)
        .with_signed_object(rsync("rsync://example.com/repo/ca/object.roa"))
}

fn issued_builder(
    kind: CertKind, issuer: &Cert, key: PublicKey, crl: &str
) -> CertBuilder {
    let builder = CertBuilder::new(
        kind, Serial::from(2), issuer.subject().clone(), test_validity(), key
    ).with_crl_uri(rsync(crl));
    match issuer.subject_key_identifier() {
        Some(key_id) => builder.with_authority_key_identifier(key_id),
        None => builder
    }
}

/// Returns a CA certificate builder using the dummy signer’s key.
///
/// The issuer is a made up trust anchor.
pub fn ca_builder(signer: &DummySigner) -> CertBuilder {
    dummy_issued(CertKind::Ca, signer, TA_CRL)
        .with_ca_issuer(rsync(TA_CER))
        .with_ca_repository(rsync("rsync://example.com/repo/ca/"))
        .with_rpki_manifest(rsync("rsync://example.com/repo/ca/ca.mft"))
}

/// Returns an EE certificate builder using the dummy signer’s key.
pub fn ee_builder(signer: &DummySigner) -> CertBuilder {
    dummy_issued(CertKind::Ee, signer, CA_CRL)
        .with_signed_object(rsync("rsync://example.com/repo/ca/object.roa"))
}

fn dummy_issued(
    kind: CertKind, signer: &DummySigner, crl: &str
) -> CertBuilder {
    CertBuilder::new(
        kind, Serial::from(2), Name::from_common_name("test-ta"),
        test_validity(), signer.get_key_info(&()).unwrap(),
    ).with_authority_key_identifier(
        KeyIdentifier::try_from(&[0x11u8; 20][..]).unwrap()
    ).with_crl_uri(rsync(crl))
}
