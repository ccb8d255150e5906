//! Certificate Revocation Lists for RPKI.
//!
//! Much like for certificates, RPKI reuses X.509 for its certificate
//! revocation lists (CRLs), limiting the values that are allowed in the
//! various fields. The RPKI CRL profile is defined in [RFC 6487] based on
//! the Internet PKI profile defined in [RFC 5280].
//!
//! This module provides the CRL itself via the type [`Crl`] and a
//! [`CrlBuilder`] for creating new CRLs.
//!
//! [RFC 5280]: https://tools.ietf.org/html/rfc5280
//! [RFC 6487]: https://tools.ietf.org/html/rfc6487

use std::collections::HashSet;
use std::convert::Infallible;
use bcder::{decode, encode};
use bcder::{Captured, Mode, OctetString, Oid, Tag};
use bcder::decode::DecodeError;
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use log::debug;
use crate::oid;
use crate::crypto::{
    KeyIdentifier, PublicKey, SignatureAlgorithm, SignatureVerificationError,
    Signer, SigningAlgorithm,
};
use crate::validation::{ValidationOptions, ValidationResult};
use crate::validation::checks::{
    CRL_AKI_MISMATCH, CRL_NEXT_UPDATE_BEFORE_NOW, CRL_PARSED,
    CRL_SIGNATURE_VALID,
};
use super::cert::Cert;
use super::error::BuildError;
use super::x509::{encode_extension, Name, Serial, SignedData, Time};


//------------ Crl -----------------------------------------------------------

/// An RPKI certificate revocation list.
///
/// ```txt
/// TBSCertList  ::=  SEQUENCE  {
///     version                 Version OPTIONAL,
///                                  -- if present, MUST be v2
///     signature               AlgorithmIdentifier,
///     issuer                  Name,
///     thisUpdate              Time,
///     nextUpdate              Time OPTIONAL,
///     revokedCertificates     SEQUENCE OF SEQUENCE  {
///          userCertificate         CertificateSerialNumber,
///          revocationDate          Time,
///          crlEntryExtensions      Extensions OPTIONAL
///     }  OPTIONAL,
///     crlExtensions           [0]  EXPLICIT Extensions OPTIONAL }
/// ```
///
/// RFC 6487 makes the next update time and the CRL number mandatory and
/// forbids entry extensions. Of the CRL extensions only the authority key
/// identifier and the CRL number are allowed.
#[derive(Clone, Debug)]
pub struct Crl {
    /// The complete encoding.
    bytes: Bytes,

    /// The outer structure of the CRL.
    signed_data: SignedData,

    /// The algorithm stated in the to-be-signed part.
    signature: SignatureAlgorithm,

    /// The name of the issuer.
    ///
    /// This isn’t really used in RPKI at all.
    issuer: Name,

    this_update: Time,
    next_update: Time,

    /// The revoked serial numbers and their revocation times.
    revoked: Vec<(Serial, Time)>,

    /// The revoked serial numbers for quick lookup.
    serials: HashSet<Serial>,

    authority_key_identifier: Option<KeyIdentifier>,
    crl_number: Serial,
}

/// # Decoding
///
impl Crl {
    /// Decodes a complete CRL.
    pub fn decode(bytes: Bytes) -> Result<Self, DecodeError<Infallible>> {
        Mode::Der.decode(bytes.clone(), |cons| {
            cons.take_sequence(|cons| {
                let signed_data = SignedData::from_constructed(cons)?;
                signed_data.data().clone().decode(|cons| {
                    Self::take_tbs(bytes.clone(), signed_data.clone(), cons)
                }).map_err(DecodeError::convert)
            })
        })
    }

    /// Decodes a CRL recording the outcome into `result`.
    ///
    /// Returns `None` and records a `CRL_PARSED` error if the CRL cannot
    /// be decoded.
    pub fn parse(bytes: Bytes, result: &mut ValidationResult) -> Option<Self> {
        match Self::decode(bytes) {
            Ok(crl) => {
                result.pass(CRL_PARSED, &[]);
                Some(crl)
            }
            Err(err) => {
                debug!(
                    "{}: failed to decode CRL: {}",
                    result.current_location(), err
                );
                result.error(CRL_PARSED, &[&err]);
                None
            }
        }
    }

    fn take_tbs<S: decode::Source>(
        bytes: Bytes,
        signed_data: SignedData,
        cons: &mut decode::Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            cons.skip_u8_if(1)?; // v2 => 1
            let signature = SignatureAlgorithm::take_from(cons)?;
            let issuer = Name::take_from(cons)?;
            let this_update = Time::take_from(cons)?;
            let next_update = Time::take_from(cons)?;
            let mut revoked = Vec::new();
            cons.take_opt_sequence(|cons| {
                while let Some(entry) = cons.take_opt_sequence(|cons| {
                    // crlEntryExtensions are forbidden by RFC 6487.
                    Ok((Serial::take_from(cons)?, Time::take_from(cons)?))
                })? {
                    revoked.push(entry)
                }
                Ok(())
            })?;
            let (authority_key_identifier, crl_number) =
                cons.take_constructed_if(Tag::CTX_0, take_extensions)?;
            let serials = revoked.iter().map(|entry| entry.0).collect();
            Ok(Crl {
                bytes, signed_data, signature, issuer, this_update,
                next_update, revoked, serials, authority_key_identifier,
                crl_number,
            })
        })
    }
}

/// # Data Access
///
impl Crl {
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn signature_algorithm(&self) -> &SignatureAlgorithm {
        self.signed_data.algorithm()
    }

    /// Returns the signature algorithm given in the signed part.
    pub fn tbs_signature_algorithm(&self) -> &SignatureAlgorithm {
        &self.signature
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn this_update(&self) -> Time {
        self.this_update
    }

    pub fn next_update(&self) -> Time {
        self.next_update
    }

    pub fn authority_key_identifier(&self) -> Option<KeyIdentifier> {
        self.authority_key_identifier
    }

    pub fn crl_number(&self) -> Serial {
        self.crl_number
    }

    /// Returns the revoked serial numbers with their revocation times.
    pub fn revoked(&self) -> &[(Serial, Time)] {
        &self.revoked
    }

    /// Returns whether the given serial number is on this revocation list.
    pub fn contains(&self, serial: Serial) -> bool {
        self.serials.contains(&serial)
    }
}

/// # Validation
///
impl Crl {
    /// Verifies that the CRL was signed by the given key.
    pub fn verify_signature(
        &self, issuer_key: &PublicKey
    ) -> Result<(), SignatureVerificationError> {
        self.signed_data.verify_signature(issuer_key)
    }

    /// Validates the CRL against the certificate of its issuer.
    ///
    /// Checks the signature, that the authority key identifier matches the
    /// issuer’s subject key identifier, and whether the CRL is stale. All
    /// checks are recorded into `result`. Returns whether none of them
    /// failed.
    pub fn validate(
        &self,
        issuer: &Cert,
        options: &ValidationOptions,
        now: Time,
        result: &mut ValidationResult,
    ) -> bool {
        let mut ok = match self.verify_signature(issuer.public_key()) {
            Ok(()) => {
                result.pass(CRL_SIGNATURE_VALID, &[]);
                true
            }
            Err(err) => {
                result.error(CRL_SIGNATURE_VALID, &[&err]);
                false
            }
        };
        if let Some(aki) = self.authority_key_identifier {
            ok &= result.reject_if_false(
                Some(aki) == issuer.subject_key_identifier(),
                CRL_AKI_MISMATCH, &[&aki]
            );
        }
        ok &= options.check_crl_next_update(
            self.next_update.into_datetime(), now.into_datetime(),
            CRL_NEXT_UPDATE_BEFORE_NOW, result
        );
        ok
    }
}

impl PartialEq for Crl {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Crl { }


/// Takes the CRL extensions.
///
/// Returns the authority key identifier and the CRL number. Any other
/// extension is an error.
fn take_extensions<S: decode::Source>(
    cons: &mut decode::Constructed<S>
) -> Result<(Option<KeyIdentifier>, Serial), DecodeError<S::Error>> {
    cons.take_sequence(|cons| {
        let mut authority_key_identifier = None;
        let mut crl_number = None;
        while let Some(()) = cons.take_opt_sequence(|cons| {
            let id = Oid::take_from(cons)?;
            let _critical = cons.take_opt_bool()?;
            let value = OctetString::take_from(cons)?;
            if id == oid::CE_AUTHORITY_KEY_IDENTIFIER {
                if authority_key_identifier.is_some() {
                    return Err(cons.content_err("duplicate extension"))
                }
                authority_key_identifier = Some(
                    Mode::Der.decode(value.into_bytes(), |cons| {
                        cons.take_sequence(|cons| {
                            cons.take_value_if(
                                Tag::CTX_0, KeyIdentifier::from_content
                            )
                        })
                    }).map_err(|err| {
                        cons.content_err(err.to_string())
                    })?
                );
            }
            else if id == oid::CE_CRL_NUMBER {
                if crl_number.is_some() {
                    return Err(cons.content_err("duplicate extension"))
                }
                crl_number = Some(
                    Mode::Der.decode(
                        value.into_bytes(), Serial::take_from
                    ).map_err(|err| cons.content_err(err.to_string()))?
                );
            }
            else {
                return Err(cons.content_err("unexpected CRL extension"))
            }
            Ok(())
        })? { }
        let crl_number = crl_number.ok_or_else(|| {
            cons.content_err("missing CRL number")
        })?;
        Ok((authority_key_identifier, crl_number))
    })
}


//------------ CrlBuilder ----------------------------------------------------

/// A builder for CRLs.
///
/// The authority key identifier is taken from the key used for signing.
#[derive(Clone, Debug)]
pub struct CrlBuilder {
    issuer: Name,
    this_update: Time,
    next_update: Time,
    crl_number: Serial,
    revoked: Vec<(Serial, Time)>,
}

impl CrlBuilder {
    pub fn new(
        issuer: Name,
        this_update: Time,
        next_update: Time,
        crl_number: Serial,
    ) -> Self {
        CrlBuilder {
            issuer, this_update, next_update, crl_number,
            revoked: Vec::new(),
        }
    }

    /// Adds a revoked certificate.
    pub fn with_revoked(mut self, serial: Serial, date: Time) -> Self {
        self.revoked.push((serial, date));
        self
    }

    pub fn build<S: Signer>(
        self,
        signer: &S,
        key: &S::KeyId,
    ) -> Result<Crl, BuildError> {
        let public_key = signer.get_key_info(key).map_err(
            BuildError::signing
        )?;
        let algorithm = SigningAlgorithm::for_key_format(
            public_key.algorithm()
        ).ok_or(BuildError::InvalidField("issuer key"))?;
        let tbs = self.encode_tbs(algorithm, public_key.key_identifier());
        let signature = signer.sign(
            key, algorithm, tbs.as_slice()
        ).map_err(BuildError::signing)?;
        Crl::decode(
            SignedData::encode_signed(&tbs, &signature)
        ).map_err(|err| BuildError::Encoding(err.to_string()))
    }

    fn encode_tbs(
        &self, algorithm: SigningAlgorithm, key_id: KeyIdentifier
    ) -> Captured {
        encode::sequence((
            1u8.encode(),
            algorithm.x509_encode(),
            self.issuer.encode_ref(),
            self.this_update.encode_varied(),
            self.next_update.encode_varied(),
            if self.revoked.is_empty() {
                None
            }
            else {
                Some(encode::sequence(
                    encode::slice(&self.revoked, |&(serial, date)| {
                        encode::sequence((
                            serial.encode(), date.encode_varied()
                        ))
                    })
                ))
            },
            encode::sequence_as(Tag::CTX_0, encode::sequence((
                encode_extension(
                    &oid::CE_AUTHORITY_KEY_IDENTIFIER, false,
                    encode::sequence(key_id.encode_as(Tag::CTX_0))
                ),
                encode_extension(
                    &oid::CE_CRL_NUMBER, false, self.crl_number.encode()
                ),
            ))),
        )).to_captured(Mode::Der)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::convert::TryFrom;
    use chrono::Duration;
    use crate::repository::test::{ca_builder, DummySigner};
    use crate::repository::test::cert::{DerData, TbsBuilder};
    use crate::validation::ValidationStatus;
    use super::*;

    fn builder() -> CrlBuilder {
        let now = Time::from_timestamp(Time::now().timestamp()).unwrap();
        CrlBuilder::new(
            Name::from_common_name("test-ca"),
            now - Duration::hours(1), now + Duration::hours(23),
            Serial::from(7u64),
        )
    }

    #[test]
    fn build_and_decode() {
        let signer = DummySigner;
        let revoked_at = Time::utc(2021, 3, 1, 12, 0, 0).unwrap();
        let crl = builder()
            .with_revoked(Serial::from(12u64), revoked_at)
            .with_revoked(Serial::from(0x8000u64), revoked_at)
            .build(&signer, &()).unwrap();

        let decoded = Crl::decode(crl.to_bytes()).unwrap();
        assert_eq!(decoded, crl);
        assert_eq!(decoded.crl_number(), Serial::from(7u64));
        assert_eq!(decoded.issuer(), &Name::from_common_name("test-ca"));
        assert_eq!(
            decoded.authority_key_identifier(),
            Some(signer.get_key_info(&()).unwrap().key_identifier())
        );
        assert_eq!(decoded.revoked().len(), 2);
        assert_eq!(decoded.revoked()[0].1, revoked_at);
        assert!(decoded.contains(Serial::from(12u64)));
        assert!(decoded.contains(Serial::from(0x8000u64)));
        assert!(!decoded.contains(Serial::from(13u64)));
        assert!(decoded.this_update() < decoded.next_update());
    }

    #[test]
    fn empty_list() {
        let crl = builder().build(&DummySigner, &()).unwrap();
        assert!(crl.revoked().is_empty());
        assert!(!crl.contains(Serial::from(1u64)));
    }

    #[test]
    fn garbage() {
        let mut result = ValidationResult::with_location("garbage.crl");
        assert!(Crl::parse(Bytes::from_static(b"\x30\x03\x02"), &mut result)
            .is_none()
        );
        assert_eq!(
            result.result_for_current_location(CRL_PARSED).unwrap().status(),
            ValidationStatus::Error
        );
    }

    #[test]
    fn validate_checks() {
        let signer = DummySigner;
        let issuer = ca_builder(&signer).with_resources(
            "AS64496".parse().unwrap()
        ).build(&signer, &()).unwrap();
        let crl = builder().build(&signer, &()).unwrap();

        // The dummy signature never verifies but the other checks run.
        let mut result = ValidationResult::with_location("ca.crl");
        assert!(!crl.validate(
            &issuer, &ValidationOptions::default(), Time::now(), &mut result
        ));
        let status = |result: &ValidationResult, key| {
            result.result_for_current_location(key).map(|c| c.status())
        };
        assert_eq!(
            status(&result, CRL_SIGNATURE_VALID),
            Some(ValidationStatus::Error)
        );
        assert_eq!(
            status(&result, CRL_AKI_MISMATCH), Some(ValidationStatus::Passed)
        );
        assert_eq!(
            status(&result, CRL_NEXT_UPDATE_BEFORE_NOW),
            Some(ValidationStatus::Passed)
        );

        // Stale by two days: strict without grace fails, grace warns.
        let later = Time::now() + Duration::days(2);
        let mut result = ValidationResult::with_location("ca.crl");
        crl.validate(
            &issuer, &ValidationOptions::strict(), later, &mut result
        );
        assert_eq!(
            status(&result, CRL_NEXT_UPDATE_BEFORE_NOW),
            Some(ValidationStatus::Error)
        );
        let mut result = ValidationResult::with_location("ca.crl");
        crl.validate(
            &issuer,
            &ValidationOptions::strict().with_crl_max_stale(
                Duration::days(7)
            ),
            later, &mut result
        );
        assert_eq!(
            status(&result, CRL_NEXT_UPDATE_BEFORE_NOW),
            Some(ValidationStatus::Warning)
        );
    }

    #[test]
    fn aki_mismatch() {
        let signer = DummySigner;
        let crl = builder().build(&signer, &()).unwrap();
        let other = Cert::decode(TbsBuilder::ca().extension(
            &oid::CE_SUBJECT_KEY_IDENTIFIER, false,
            DerData::encode(
                KeyIdentifier::try_from(&[0x22u8; 20][..]).unwrap().encode()
            )
        ).sign()).unwrap();
        let mut result = ValidationResult::with_location("ca.crl");
        crl.validate(
            &other, &ValidationOptions::default(), Time::now(), &mut result
        );
        assert_eq!(
            result.result_for_current_location(CRL_AKI_MISMATCH)
                .map(|c| c.status()),
            Some(ValidationStatus::Error)
        );
    }
}
