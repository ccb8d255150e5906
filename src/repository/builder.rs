//! Building certificates.
//!
//! A [`CertBuilder`] collects everything that goes into a resource or
//! router certificate and produces a signed certificate in one go. The
//! extensions it writes are exactly those the [parser] checks for, so
//! every certificate coming out of a builder passes profile validation.
//!
//! [parser]: super::parser

use bcder::encode;
use bcder::{BitString, Captured, Mode, Tag};
use bcder::encode::{PrimitiveContent, Values};
use crate::{oid, uri};
use crate::crypto::{KeyIdentifier, PublicKey, Signer, SigningAlgorithm};
use crate::resources::{
    InheritedTypes, ResourceExtension, ResourceSet, ResourceType,
};
use super::cert::{Cert, KeyUsage};
use super::error::BuildError;
use super::rescert::{Certificate, ResourceCert, RouterCert};
use super::x509::{encode_extension, Name, Serial, SignedData, Validity};


//------------ CertKind ------------------------------------------------------

/// The kind of certificate to build.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CertKind {
    /// A CA certificate, including trust anchor certificates.
    Ca,

    /// The EE certificate of a signed object.
    Ee,

    /// A BGPsec router certificate.
    Router,
}

impl CertKind {
    fn key_usage(self) -> KeyUsage {
        match self {
            CertKind::Ca => KeyUsage::CA,
            CertKind::Ee | CertKind::Router => KeyUsage::EE,
        }
    }
}


//------------ CertBuilder ---------------------------------------------------

/// A builder for certificates.
///
/// The builder is consumed when the certificate is built. Checks on the
/// collected data happen in [`build`][Self::build].
#[derive(Clone, Debug)]
pub struct CertBuilder {
    kind: CertKind,
    serial_number: Serial,
    issuer: Name,
    subject: Option<Name>,
    validity: Validity,
    public_key: PublicKey,
    authority_key_identifier: Option<KeyIdentifier>,
    crl_uri: Option<uri::Rsync>,
    ca_issuer: Option<uri::Rsync>,
    ca_repository: Option<uri::Rsync>,
    rpki_manifest: Option<uri::Rsync>,
    rpki_notify: Option<uri::Https>,
    signed_object: Option<uri::Rsync>,
    resources: ResourceSet,
    inherited: InheritedTypes,
}

impl CertBuilder {
    /// Creates a builder for a certificate issued by `issuer`.
    pub fn new(
        kind: CertKind,
        serial_number: Serial,
        issuer: Name,
        validity: Validity,
        public_key: PublicKey,
    ) -> Self {
        CertBuilder {
            kind,
            serial_number,
            issuer,
            subject: None,
            validity,
            public_key,
            authority_key_identifier: None,
            crl_uri: None,
            ca_issuer: None,
            ca_repository: None,
            rpki_manifest: None,
            rpki_notify: None,
            signed_object: None,
            resources: ResourceSet::empty(),
            inherited: InheritedTypes::empty(),
        }
    }

    /// Creates a builder for a self-signed trust anchor certificate.
    ///
    /// Issuer and subject are derived from the key and the authority key
    /// identifier is set to the key’s own identifier.
    pub fn new_ta(
        serial_number: Serial,
        validity: Validity,
        public_key: PublicKey,
    ) -> Self {
        let name = public_key.to_subject_name();
        let key_id = public_key.key_identifier();
        Self::new(CertKind::Ca, serial_number, name, validity, public_key)
            .with_authority_key_identifier(key_id)
    }

    pub fn kind(&self) -> CertKind {
        self.kind
    }

    /// Sets the subject name.
    ///
    /// If no subject is set, it is derived from the public key.
    pub fn with_subject(mut self, subject: Name) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_authority_key_identifier(
        mut self, key_id: KeyIdentifier
    ) -> Self {
        self.authority_key_identifier = Some(key_id);
        self
    }

    pub fn with_crl_uri(mut self, uri: uri::Rsync) -> Self {
        self.crl_uri = Some(uri);
        self
    }

    pub fn with_ca_issuer(mut self, uri: uri::Rsync) -> Self {
        self.ca_issuer = Some(uri);
        self
    }

    pub fn with_ca_repository(mut self, uri: uri::Rsync) -> Self {
        self.ca_repository = Some(uri);
        self
    }

    pub fn with_rpki_manifest(mut self, uri: uri::Rsync) -> Self {
        self.rpki_manifest = Some(uri);
        self
    }

    pub fn with_rpki_notify(mut self, uri: uri::Https) -> Self {
        self.rpki_notify = Some(uri);
        self
    }

    pub fn with_signed_object(mut self, uri: uri::Rsync) -> Self {
        self.signed_object = Some(uri);
        self
    }

    /// Sets the resources listed in the certificate.
    pub fn with_resources(mut self, resources: ResourceSet) -> Self {
        self.resources = resources;
        self
    }

    /// Marks a resource type as inherited from the issuer.
    pub fn with_inherited(mut self, resource_type: ResourceType) -> Self {
        self.inherited.insert(resource_type);
        self
    }

    /// Marks all resource types as inherited.
    pub fn with_inherit_all(mut self) -> Self {
        self.inherited = InheritedTypes::all();
        self
    }

    /// Builds and signs the certificate.
    ///
    /// The certificate is signed with the key `key` of `signer` which
    /// must be the issuer’s key.
    pub fn build<S: Signer>(
        self,
        signer: &S,
        key: &S::KeyId,
    ) -> Result<Certificate, BuildError> {
        let resources = ResourceExtension::new(
            self.resources.clone(), self.inherited
        )?;
        let subject = self.subject.clone().unwrap_or_else(|| {
            self.public_key.to_subject_name()
        });
        self.check_fields(&subject, &resources)?;
        let algorithm = SigningAlgorithm::for_key_format(
            signer.get_key_info(key).map_err(BuildError::signing)?
                .algorithm()
        ).ok_or(BuildError::InvalidField("issuer key"))?;
        let tbs = self.encode_tbs(algorithm, &subject, &resources);
        let signature = signer.sign(
            key, algorithm, tbs.as_slice()
        ).map_err(BuildError::signing)?;
        let cert = Cert::decode(
            SignedData::encode_signed(&tbs, &signature)
        ).map_err(|err| BuildError::Encoding(err.to_string()))?;
        Ok(match self.kind {
            CertKind::Router => RouterCert::new(cert, resources).into(),
            _ => ResourceCert::new(cert, resources).into(),
        })
    }

    fn check_fields(
        &self, subject: &Name, resources: &ResourceExtension
    ) -> Result<(), BuildError> {
        match self.kind {
            CertKind::Ca => {
                if self.ca_repository.is_none() {
                    return Err(BuildError::MissingField("CA repository"))
                }
                if self.rpki_manifest.is_none() {
                    return Err(BuildError::MissingField("manifest URI"))
                }
            }
            CertKind::Ee => {
                if self.signed_object.is_none() {
                    return Err(BuildError::MissingField("signed object URI"))
                }
            }
            CertKind::Router => {
                if resources.resources().contains_type(ResourceType::Ipv4)
                    || resources.resources().contains_type(ResourceType::Ipv6)
                    || resources.is_inherited(ResourceType::Ipv4)
                    || resources.is_inherited(ResourceType::Ipv6)
                {
                    return Err(BuildError::InvalidField("router resources"))
                }
            }
        }
        if !self.is_self_signed(subject) && self.crl_uri.is_none() {
            return Err(BuildError::MissingField("CRL URI"))
        }
        Ok(())
    }

    /// Returns whether the certificate will be self-signed.
    ///
    /// This mirrors [`Cert::is_self_signed`].
    fn is_self_signed(&self, subject: &Name) -> bool {
        self.issuer == *subject && self.authority_key_identifier.map(|aki| {
            aki == self.public_key.key_identifier()
        }).unwrap_or(true)
    }

    /// Encodes the to-be-signed part of the certificate.
    ///
    /// ```txt
    /// TBSCertificate  ::=  SEQUENCE  {
    ///     version         [0]  EXPLICIT Version DEFAULT v1,
    ///     serialNumber         CertificateSerialNumber,
    ///     signature            AlgorithmIdentifier,
    ///     issuer               Name,
    ///     validity             Validity,
    ///     subject              Name,
    ///     subjectPublicKeyInfo SubjectPublicKeyInfo,
    ///     extensions      [3]  EXPLICIT Extensions OPTIONAL }
    /// ```
    fn encode_tbs(
        &self,
        algorithm: SigningAlgorithm,
        subject: &Name,
        resources: &ResourceExtension,
    ) -> Captured {
        let (key_usage, unused) = self.kind.key_usage().to_bit_string();
        let ip_blocks = resources.encode_ip_blocks();
        let as_ids = resources.encode_as_ids();
        encode::sequence((
            encode::sequence_as(Tag::CTX_0, 2u8.encode()),
            self.serial_number.encode(),
            algorithm.x509_encode(),
            self.issuer.encode_ref(),
            self.validity.encode(),
            subject.encode_ref(),
            self.public_key.encode_ref(),
            encode::sequence_as(Tag::CTX_3, encode::sequence((
                (
                    self.encode_basic_constraints(),
                    encode_extension(
                        &oid::CE_SUBJECT_KEY_IDENTIFIER, false,
                        self.public_key.key_identifier().encode(),
                    ),
                    self.authority_key_identifier.map(|id| {
                        encode_extension(
                            &oid::CE_AUTHORITY_KEY_IDENTIFIER, false,
                            encode::sequence(id.encode_as(Tag::CTX_0))
                        )
                    }),
                    encode_extension(
                        &oid::CE_KEY_USAGE, true,
                        BitString::encode_slice(key_usage, unused)
                    ),
                ),
                self.encode_router_purpose(),
                self.encode_crl_distribution_points(),
                self.encode_authority_info_access(),
                self.encode_subject_info_access(),
                encode_extension(
                    &oid::CE_CERTIFICATE_POLICIES, true,
                    encode::sequence(encode::sequence(
                        oid::CP_IPADDR_ASNUMBER.encode()
                    ))
                ),
                ip_blocks.map(|blocks| {
                    encode_extension(&oid::PE_IP_ADDR_BLOCK, true, blocks)
                }),
                as_ids.map(|ids| {
                    encode_extension(&oid::PE_AUTONOMOUS_SYS_IDS, true, ids)
                }),
            )))
        )).to_captured(Mode::Der)
    }

    fn encode_basic_constraints(&self) -> Option<impl encode::Values> {
        if self.kind == CertKind::Ca {
            Some(encode_extension(
                &oid::CE_BASIC_CONSTRAINTS, true,
                encode::sequence(true.encode())
            ))
        }
        else {
            None
        }
    }

    fn encode_router_purpose(&self) -> Option<impl encode::Values> {
        if self.kind == CertKind::Router {
            Some(encode_extension(
                &oid::CE_EXTENDED_KEY_USAGE, false,
                encode::sequence(oid::KP_BGPSEC_ROUTER.encode())
            ))
        }
        else {
            None
        }
    }

    fn encode_crl_distribution_points(
        &self
    ) -> Option<impl encode::Values + '_> {
        self.crl_uri.as_ref().map(|uri| {
            encode_extension(
                &oid::CE_CRL_DISTRIBUTION_POINTS, false,
                encode::sequence( // CRLDistributionPoints
                    encode::sequence( // DistributionPoint
                        encode::sequence_as(Tag::CTX_0, // distributionPoint
                            encode::sequence_as(Tag::CTX_0, // fullName
                                uri.encode_general_name()
                            )
                        )
                    )
                )
            )
        })
    }

    fn encode_authority_info_access(
        &self
    ) -> Option<impl encode::Values + '_> {
        self.ca_issuer.as_ref().map(|uri| {
            encode_extension(
                &oid::PE_AUTHORITY_INFO_ACCESS, false,
                encode::sequence(
                    encode::sequence((
                        oid::AD_CA_ISSUERS.encode(),
                        uri.encode_general_name()
                    ))
                )
            )
        })
    }

    fn encode_subject_info_access(
        &self
    ) -> Option<impl encode::Values + '_> {
        if self.kind == CertKind::Router {
            return None
        }
        Some(encode_extension(
            &oid::PE_SUBJECT_INFO_ACCESS, false,
            encode::sequence((
                self.ca_repository.as_ref().map(|uri| {
                    encode::sequence((
                        oid::AD_CA_REPOSITORY.encode(),
                        uri.encode_general_name()
                    ))
                }),
                self.rpki_manifest.as_ref().map(|uri| {
                    encode::sequence((
                        oid::AD_RPKI_MANIFEST.encode(),
                        uri.encode_general_name()
                    ))
                }),
                self.signed_object.as_ref().map(|uri| {
                    encode::sequence((
                        oid::AD_SIGNED_OBJECT.encode(),
                        uri.encode_general_name()
                    ))
                }),
                self.rpki_notify.as_ref().map(|uri| {
                    encode::sequence((
                        oid::AD_RPKI_NOTIFY.encode(),
                        uri.encode_general_name()
                    ))
                }),
            ))
        ))
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use crate::resources::ResourceExtensionError;
    use crate::repository::parser::CertParser;
    use crate::repository::test::{
        ca_builder, ee_builder, rsync, test_validity, DummySigner,
    };
    use super::*;

    #[test]
    fn zero_resources_fail() {
        let signer = DummySigner;
        let builder = ca_builder(&signer);
        match builder.clone().build(&signer, &()) {
            Err(BuildError::Resources(ResourceExtensionError::Empty)) => { }
            other => panic!("unexpected result {:?}", other),
        }

        let cert = builder.with_inherited(ResourceType::Asn).build(
            &signer, &()
        ).unwrap();
        let cert = cert.into_resource_cert().unwrap();
        assert!(cert.is_inherited(ResourceType::Asn));
        assert!(!cert.is_inherited(ResourceType::Ipv4));
        assert!(cert.resources().is_empty());
    }

    #[test]
    fn inherited_and_listed_fail() {
        let signer = DummySigner;
        let res = ca_builder(&signer)
            .with_resources(ResourceSet::from_str("AS1-AS3").unwrap())
            .with_inherited(ResourceType::Asn)
            .build(&signer, &());
        assert!(matches!(
            res,
            Err(BuildError::Resources(
                ResourceExtensionError::Overlap(ResourceType::Asn)
            ))
        ));
    }

    #[test]
    fn missing_fields() {
        let signer = DummySigner;
        let key = signer.get_key_info(&()).unwrap();
        let res = CertBuilder::new(
            CertKind::Ca, Serial::from(12), Name::from_common_name("issuer"),
            test_validity(), key.clone(),
        ).with_inherit_all().build(&signer, &());
        assert!(matches!(res, Err(BuildError::MissingField(_))));

        let res = CertBuilder::new(
            CertKind::Router, Serial::from(12),
            Name::from_common_name("issuer"), test_validity(), key,
        ).with_crl_uri(
            rsync("rsync://example.com/repo/ca.crl")
        ).with_resources(
            ResourceSet::from_str("AS64496, 192.0.2.0/24").unwrap()
        ).build(&signer, &());
        assert!(matches!(res, Err(BuildError::InvalidField(_))));
    }

    #[test]
    fn built_certs_pass_profile() {
        let signer = DummySigner;
        let ca = ca_builder(&signer).with_resources(
            ResourceSet::from_str("AS64496-AS64511, 10.0.0.0/8").unwrap()
        ).build(&signer, &()).unwrap();
        let parser = CertParser::parse("ca.cer", ca.to_bytes());
        assert!(parser.is_success(), "{:?}", parser.validation_result());
        let parsed = parser.resource_certificate().unwrap();
        assert!(parsed.is_ca());
        assert_eq!(
            parsed.resources(),
            &ResourceSet::from_str("AS64496-AS64511, 10.0.0.0/8").unwrap()
        );
        assert_eq!(
            parsed.rpki_manifest(),
            Some(rsync("rsync://example.com/repo/ca/ca.mft"))
        );
        assert_eq!(
            parsed.crl_uri(), Some(rsync("rsync://example.com/repo/ta.crl"))
        );

        let ee = ee_builder(&signer).with_inherit_all().build(
            &signer, &()
        ).unwrap();
        let parser = CertParser::parse("ee.cer", ee.to_bytes());
        assert!(parser.is_success(), "{:?}", parser.validation_result());
        let parsed = parser.resource_certificate().unwrap();
        assert!(parsed.is_ee());
        assert!(parsed.inherited_types().is_all());
        assert_eq!(
            parsed.signed_object(),
            Some(rsync("rsync://example.com/repo/ca/object.roa"))
        );
    }

    #[test]
    fn built_router_cert_passes_profile() {
        let signer = DummySigner;
        let key = signer.get_key_info(&()).unwrap();
        let router = CertBuilder::new(
            CertKind::Router, Serial::from(7),
            Name::from_common_name("ca"), test_validity(), key,
        ).with_crl_uri(
            rsync("rsync://example.com/repo/ca.crl")
        ).with_resources(
            ResourceSet::from_str("AS64496").unwrap()
        ).build(&signer, &()).unwrap();
        assert!(router.is_router());

        let parser = CertParser::parse("router.cer", router.to_bytes());
        assert!(parser.is_success(), "{:?}", parser.validation_result());
        let parsed = parser.router_certificate().unwrap();
        assert_eq!(
            parsed.as_resources(),
            ResourceSet::from_str("AS64496").unwrap().asn()
        );
    }
}
