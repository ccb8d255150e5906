//! Profile validation of hand-crafted certificates.
//!
//! The certificates are assembled from raw extension values so that they
//! can violate the profile in ways the certificate builder never would.

use std::io;
use bcder::{encode, ConstOid, Mode, OctetString, Tag};
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use crate::oid;
use crate::crypto::{PublicKey, SigningAlgorithm};
use crate::repository::cert::KeyUsage;
use crate::repository::parser::CertParser;
use crate::repository::x509::{Name, Serial};
use crate::validation::{ValidationResult, ValidationStatus};
use crate::validation::checks::*;
use super::{dummy_key, test_validity};


//------------ DerData -------------------------------------------------------

/// Some encoded data.
#[derive(Clone, Debug)]
pub struct DerData(Bytes);

impl DerData {
    pub fn encode(values: impl encode::Values) -> Self {
        DerData(values.to_captured(Mode::Der).into_bytes())
    }

    pub fn sequence(values: &[DerData]) -> Self {
        Self::encode(encode::sequence(encode::iter(values.iter())))
    }
}

impl encode::Values for DerData {
    fn encoded_len(&self, _mode: Mode) -> usize {
        self.0.len()
    }

    fn write_encoded<W: io::Write>(
        &self, _mode: Mode, target: &mut W
    ) -> Result<(), io::Error> {
        target.write_all(self.0.as_ref())
    }
}


//------------ TbsBuilder ----------------------------------------------------

/// Assembles the to-be-signed part of a certificate.
#[derive(Clone, Debug)]
pub struct TbsBuilder {
    algorithm: DerData,
    issuer: Name,
    subject: Name,
    public_key: PublicKey,
    extensions: Vec<(&'static ConstOid, bool, DerData)>,
}

impl TbsBuilder {
    /// Creates a builder for a conforming CA certificate.
    pub fn ca() -> Self {
        let key = dummy_key();
        TbsBuilder {
            algorithm: DerData::encode(
                SigningAlgorithm::RsaSha256.x509_encode()
            ),
            issuer: Name::from_common_name("test-ta"),
            subject: Name::from_common_name("test-ca"),
            extensions: Vec::new(),
            public_key: key.clone(),
        }
        .extension(&oid::CE_BASIC_CONSTRAINTS, true,
            DerData::encode(encode::sequence(true.encode()))
        )
        .extension(&oid::CE_SUBJECT_KEY_IDENTIFIER, false,
            DerData::encode(key.key_identifier().encode())
        )
        .extension(&oid::CE_AUTHORITY_KEY_IDENTIFIER, false,
            DerData::encode(encode::sequence(
                OctetString::encode_slice_as([0x11u8; 20], Tag::CTX_0)
            ))
        )
        .key_usage(true, KeyUsage::CA)
        .crl_uris(&["rsync://example.com/repo/ta.crl"])
        .subject_info_access(&[
            (&oid::AD_CA_REPOSITORY, "rsync://example.com/repo/ca/"),
            (&oid::AD_RPKI_MANIFEST, "rsync://example.com/repo/ca/ca.mft"),
        ])
        .policies(&[DerData::encode(encode::sequence(
            oid::CP_IPADDR_ASNUMBER.encode()
        ))])
        .extension(&oid::PE_AUTONOMOUS_SYS_IDS, true,
            as_ids(0, 4_294_967_295)
        )
    }

    /// Creates a builder for a conforming EE certificate.
    pub fn ee() -> Self {
        Self::ca()
            .without(&oid::CE_BASIC_CONSTRAINTS)
            .key_usage(true, KeyUsage::EE)
            .subject_info_access(&[(
                &oid::AD_SIGNED_OBJECT,
                "rsync://example.com/repo/ca/object.roa"
            )])
    }

    /// Creates a builder for a conforming router certificate.
    pub fn router() -> Self {
        Self::ee()
            .without(&oid::PE_SUBJECT_INFO_ACCESS)
            .extension(&oid::CE_EXTENDED_KEY_USAGE, false,
                DerData::encode(encode::sequence(
                    oid::KP_BGPSEC_ROUTER.encode()
                ))
            )
            .extension(&oid::PE_AUTONOMOUS_SYS_IDS, true,
                as_ids(64496, 64496)
            )
    }

    /// Adds or replaces an extension.
    pub fn extension(
        mut self, id: &'static ConstOid, critical: bool, value: DerData
    ) -> Self {
        self = self.without(id);
        self.extensions.push((id, critical, value));
        self
    }

    pub fn without(mut self, id: &'static ConstOid) -> Self {
        self.extensions.retain(|item| item.0.as_ref() != id.as_ref());
        self
    }

    pub fn algorithm(mut self, algorithm: DerData) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn issuer(mut self, issuer: Name) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn subject(mut self, subject: Name) -> Self {
        self.subject = subject;
        self
    }

    pub fn key_usage(self, critical: bool, usage: KeyUsage) -> Self {
        let (bits, unused) = usage.to_bit_string();
        self.extension(&oid::CE_KEY_USAGE, critical,
            DerData::encode(bcder::BitString::encode_slice(bits, unused))
        )
    }

    pub fn crl_uris(self, uris: &[&str]) -> Self {
        let names: Vec<_> = uris.iter().map(|uri| uri_name(uri)).collect();
        self.extension(&oid::CE_CRL_DISTRIBUTION_POINTS, false,
            DerData::encode(encode::sequence(
                encode::sequence(
                    encode::sequence_as(Tag::CTX_0,
                        encode::sequence_as(Tag::CTX_0, names)
                    )
                )
            ))
        )
    }

    pub fn subject_info_access(
        self, access: &[(&'static ConstOid, &str)]
    ) -> Self {
        self.subject_info_access_critical(false, access)
    }

    pub fn subject_info_access_critical(
        self, critical: bool, access: &[(&'static ConstOid, &str)]
    ) -> Self {
        let items: Vec<_> = access.iter().map(|(method, uri)| {
            DerData::encode(encode::sequence((
                method.encode(), uri_name(uri)
            )))
        }).collect();
        self.extension(&oid::PE_SUBJECT_INFO_ACCESS, critical,
            DerData::sequence(&items)
        )
    }

    pub fn policies(self, policies: &[DerData]) -> Self {
        self.extension(&oid::CE_CERTIFICATE_POLICIES, true,
            DerData::sequence(policies)
        )
    }

    /// Creates the complete certificate with a dummy signature.
    pub fn sign(self) -> Bytes {
        let extensions: Vec<_> = self.extensions.iter().map(
            |(id, critical, value)| {
                DerData::encode(encode::sequence((
                    id.encode(),
                    if *critical { Some(true.encode()) } else { None },
                    OctetString::encode_slice(value.0.clone()),
                )))
            }
        ).collect();
        let tbs = DerData::encode(encode::sequence((
            encode::sequence_as(Tag::CTX_0, 2u8.encode()),
            Serial::from(12u64).encode(),
            self.algorithm.clone(),
            self.issuer.encode_ref(),
            test_validity().encode(),
            self.subject.encode_ref(),
            self.public_key.encode_ref(),
            encode::sequence_as(Tag::CTX_3, DerData::sequence(&extensions)),
        )));
        DerData::encode(encode::sequence((
            tbs,
            self.algorithm,
            bcder::BitString::encode_slice([0x5Au8; 256], 0),
        ))).0
    }
}

fn uri_name(uri: &str) -> DerData {
    DerData::encode(
        OctetString::encode_slice_as(uri.as_bytes(), Tag::CTX_6)
    )
}

fn null() -> DerData {
    DerData(Bytes::from_static(b"\x05\x00"))
}

fn as_ids(min: u32, max: u32) -> DerData {
    DerData::encode(encode::sequence(
        encode::sequence_as(Tag::CTX_0,
            encode::sequence(
                encode::sequence((min.encode(), max.encode()))
            )
        )
    ))
}


//------------ Helpers -------------------------------------------------------

fn parse(cert: Bytes) -> ValidationResult {
    CertParser::parse("test.cer", cert).into_validation_result()
}

fn status(result: &ValidationResult, key: &str) -> Option<ValidationStatus> {
    result.result_for_current_location(key).map(|check| check.status())
}

fn assert_error(builder: TbsBuilder, key: &str) {
    let result = parse(builder.sign());
    assert_eq!(
        status(&result, key), Some(ValidationStatus::Error),
        "{:?}", result
    );
    assert!(result.has_failures());
}

fn assert_warning(builder: TbsBuilder, key: &str) {
    let result = parse(builder.sign());
    assert_eq!(
        status(&result, key), Some(ValidationStatus::Warning),
        "{:?}", result
    );
    assert!(result.is_success(), "{:?}", result);
}


//------------ Tests ---------------------------------------------------------

#[test]
fn conforming_certs() {
    let parser = CertParser::parse("ca.cer", TbsBuilder::ca().sign());
    assert!(parser.is_success(), "{:?}", parser.validation_result());
    assert!(parser.resource_certificate().unwrap().is_ca());

    let parser = CertParser::parse("ee.cer", TbsBuilder::ee().sign());
    assert!(parser.is_success(), "{:?}", parser.validation_result());
    assert!(parser.resource_certificate().unwrap().is_ee());

    let parser = CertParser::parse("router.cer", TbsBuilder::router().sign());
    assert!(parser.is_success(), "{:?}", parser.validation_result());
    assert!(parser.router_certificate().is_ok());
    assert!(parser.resource_certificate().is_err());
}

#[test]
fn signature_algorithm() {
    assert_error(
        TbsBuilder::ca().algorithm(
            DerData::encode(SigningAlgorithm::EcdsaP256Sha256.x509_encode())
        ),
        CERTIFICATE_SIGNATURE_ALGORITHM
    );
}

#[test]
fn names() {
    let double = Name::from_captured(
        encode::sequence((
            encode::set(encode::sequence((
                oid::AT_COMMON_NAME.encode(),
                OctetString::encode_slice_as(b"a", Tag::PRINTABLE_STRING),
            ))),
            encode::set(encode::sequence((
                oid::AT_COMMON_NAME.encode(),
                OctetString::encode_slice_as(b"b", Tag::PRINTABLE_STRING),
            ))),
        )).to_captured(Mode::Der)
    );
    assert_warning(TbsBuilder::ca().issuer(double.clone()), CERT_ISSUER_CORRECT);
    assert_warning(TbsBuilder::ca().subject(double), CERT_SUBJECT_CORRECT);
}

#[test]
fn key_identifiers() {
    assert_error(
        TbsBuilder::ca().without(&oid::CE_SUBJECT_KEY_IDENTIFIER),
        SKI_PRESENT
    );
}

#[test]
fn critical_extensions() {
    assert_error(
        TbsBuilder::ca().extension(
            &oid::CE_CRL_NUMBER, true, DerData::encode(12u8.encode())
        ),
        CRITICAL_EXT_SUPPORTED
    );
}

#[test]
fn key_usage() {
    assert_error(
        TbsBuilder::ca().without(&oid::CE_KEY_USAGE), KEY_USAGE_EXT_PRESENT
    );
    assert_error(
        TbsBuilder::ca().key_usage(false, KeyUsage::CA),
        KEY_USAGE_EXT_PRESENT
    );
    assert_error(
        TbsBuilder::ca().key_usage(true, KeyUsage::EE), KEY_USAGE_VALUE
    );
    assert_error(
        TbsBuilder::ee().key_usage(true, KeyUsage::CA), KEY_USAGE_VALUE
    );
    assert_warning(
        TbsBuilder::ca().key_usage(true, KeyUsage::default()),
        KEY_USAGE_VALUE
    );
}

#[test]
fn certificate_policies() {
    let policy = DerData::encode(encode::sequence(
        oid::CP_IPADDR_ASNUMBER.encode()
    ));
    let cert = TbsBuilder::ca().without(&oid::CE_CERTIFICATE_POLICIES);
    assert_error(cert.clone(), POLICY_EXT_CRITICAL);
    assert_error(cert, POLICY_EXT_VALUE);

    assert_error(
        TbsBuilder::ca().extension(
            &oid::CE_CERTIFICATE_POLICIES, false,
            DerData::sequence(&[policy.clone()])
        ),
        POLICY_EXT_CRITICAL
    );
    assert_error(
        TbsBuilder::ca().policies(&[policy.clone(), policy]),
        SINGLE_CERT_POLICY
    );
    assert_error(
        TbsBuilder::ca().policies(&[DerData::encode(encode::sequence(
            oid::QT_CPS.encode()
        ))]),
        POLICY_ID_VERSION
    );
    assert_error(
        TbsBuilder::ca().extension(
            &oid::CE_CERTIFICATE_POLICIES, true,
            DerData::encode(12u8.encode())
        ),
        POLICY_VALIDATION
    );

    // A user notice qualifier is tolerated.
    assert_warning(
        TbsBuilder::ca().policies(&[DerData::encode(encode::sequence((
            oid::CP_IPADDR_ASNUMBER.encode(),
            encode::sequence(encode::sequence((
                bcder::Oid(&[43, 6, 1, 5, 5, 7, 2, 2][..]).encode(),
                ().encode(),
            ))),
        )))]),
        POLICY_QUALIFIER
    );
}

#[test]
fn resources() {
    assert_error(
        TbsBuilder::ca().without(&oid::PE_AUTONOMOUS_SYS_IDS),
        RESOURCE_EXT_PRESENT
    );
    assert_error(
        TbsBuilder::ca().extension(
            &oid::PE_AUTONOMOUS_SYS_IDS, false, as_ids(1, 2)
        ),
        RESOURCE_EXT_CRITICAL
    );

    // A /7 prefix with a set padding bit is rejected as a single failure.
    let malformed = TbsBuilder::ca().extension(
        &oid::PE_IP_ADDR_BLOCK, true,
        DerData::encode(encode::sequence(encode::sequence((
            OctetString::encode_slice(b"\x00\x01"),
            encode::sequence(
                bcder::BitString::encode_slice(b"\x0B", 1)
            ),
        ))))
    );
    let result = parse(malformed.sign());
    assert_eq!(
        status(&result, RESOURCE_EXT_VALID), Some(ValidationStatus::Error)
    );
    assert_eq!(result.failures_for_current_location().len(), 1);

    // Inherited IPv4 and IPv6 with listed AS numbers.
    let inherit = |afi: &'static [u8]| {
        encode::sequence((OctetString::encode_slice(afi), null()))
    };
    let partial = TbsBuilder::ca().extension(
        &oid::PE_IP_ADDR_BLOCK, true,
        DerData::encode(encode::sequence((
            inherit(b"\x00\x01"), inherit(b"\x00\x02")
        )))
    );
    let result = parse(partial.sign());
    let failures = result.failures_for_current_location();
    assert_eq!(failures.len(), 1, "{:?}", result);
    assert_eq!(failures[0].key(), RESOURCE_EXT_VALID);
    assert_eq!(
        failures[0].params(), &["partial resource inheritance".to_string()]
    );

    // Inheriting both is fine.
    let inherited = TbsBuilder::ca().extension(
        &oid::PE_IP_ADDR_BLOCK, true,
        DerData::encode(encode::sequence((
            inherit(b"\x00\x01"), inherit(b"\x00\x02")
        )))
    ).extension(
        &oid::PE_AUTONOMOUS_SYS_IDS, true,
        DerData::encode(encode::sequence(
            encode::sequence_as(Tag::CTX_0, null())
        ))
    );
    assert!(parse(inherited.sign()).is_success());
}

#[test]
fn crl_distribution_points() {
    assert_error(
        TbsBuilder::ca().without(&oid::CE_CRL_DISTRIBUTION_POINTS),
        CRLDP_PRESENT
    );
    assert_error(
        TbsBuilder::ca().crl_uris(&[
            "rsync://example.com/repo/ta.crl",
            "rsync://example.org/repo/ta.crl",
        ]),
        CRLDP_NAME_IS_A_URI
    );
    assert_error(
        TbsBuilder::ca().crl_uris(&["https://example.com/repo/ta.crl"]),
        CRLDP_RSYNC_URI_PRESENT
    );

    // Self-signed certificates should omit the extension.
    let name = Name::from_common_name("test-ca");
    assert_warning(
        TbsBuilder::ca().issuer(name).without(
            &oid::CE_AUTHORITY_KEY_IDENTIFIER
        ),
        CRLDP_OMITTED
    );
}

#[test]
fn subject_info_access() {
    assert_error(
        TbsBuilder::ca().without(&oid::PE_SUBJECT_INFO_ACCESS), SIA_PRESENT
    );
    assert_error(
        TbsBuilder::ca().subject_info_access_critical(true, &[
            (&oid::AD_CA_REPOSITORY, "rsync://example.com/repo/ca/"),
            (&oid::AD_RPKI_MANIFEST, "rsync://example.com/repo/ca/ca.mft"),
        ]),
        SIA_NOT_CRITICAL
    );
    assert_error(
        TbsBuilder::ca().subject_info_access(&[
            (&oid::AD_CA_REPOSITORY, "rsync://example.com/repo/ca/"),
        ]),
        SIA_MANIFEST_URI_PRESENT
    );
    assert_error(
        TbsBuilder::ca().subject_info_access(&[
            (&oid::AD_CA_REPOSITORY, "https://example.com/repo/ca/"),
            (&oid::AD_RPKI_MANIFEST, "rsync://example.com/repo/ca/ca.mft"),
        ]),
        SIA_CA_REPOSITORY_URI_PRESENT
    );
    assert_error(
        TbsBuilder::ca().subject_info_access(&[
            (&oid::AD_CA_REPOSITORY, "rsync://example.com/repo/ca/"),
            (&oid::AD_RPKI_MANIFEST, "rsync://example.com/repo/ca/ca.mft"),
            (&oid::AD_RPKI_NOTIFY, "http://example.com/notification.xml"),
        ]),
        SIA_RRDP_NOTIFY_URI_HTTPS
    );
    assert_error(
        TbsBuilder::ee().subject_info_access(&[
            (&oid::AD_SIGNED_OBJECT, "rsync://example.com/repo/ca/a.roa"),
            (&oid::AD_SIGNED_OBJECT, "rsync://example.com/repo/ca/b.roa"),
        ]),
        SIA_SIGNED_OBJECT_URI_PRESENT
    );
    assert_error(
        TbsBuilder::ee().subject_info_access(&[
            (&oid::AD_SIGNED_OBJECT, "rsync://example.com/repo/ca/a.roa"),
            (&oid::AD_RPKI_MANIFEST, "rsync://example.com/repo/ca/ca.mft"),
        ]),
        SIA_ACCESS_METHODS_KNOWN
    );
}

#[test]
fn router_certs() {
    assert_error(
        TbsBuilder::router().extension(
            &oid::CE_EXTENDED_KEY_USAGE, true,
            DerData::encode(encode::sequence(
                oid::KP_BGPSEC_ROUTER.encode()
            ))
        ),
        BGPSEC_EXT_NOT_CRITICAL
    );
    assert_error(
        TbsBuilder::router().subject_info_access(&[(
            &oid::AD_SIGNED_OBJECT, "rsync://example.com/repo/ca/object.roa"
        )]),
        CERT_SIA_IS_PRESENT
    );
    assert_error(
        TbsBuilder::router().without(&oid::PE_AUTONOMOUS_SYS_IDS),
        AS_RESOURCE_PRESENT
    );
    assert_error(
        TbsBuilder::router().extension(
            &oid::PE_IP_ADDR_BLOCK, true,
            DerData::encode(encode::sequence(encode::sequence((
                OctetString::encode_slice(b"\x00\x01"),
                encode::sequence(
                    bcder::BitString::encode_slice(b"\x0A", 0)
                ),
            ))))
        ),
        IP_RESOURCE_PRESENT
    );

    // Forcing the router profile onto a resource certificate.
    let parser = CertParser::parse_router_cert(
        "ca.cer", TbsBuilder::ca().sign()
    );
    assert_eq!(
        status(parser.validation_result(), BGPSEC_EXT_PRESENT),
        Some(ValidationStatus::Error)
    );
}
