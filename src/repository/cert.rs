//! Generic X.509 certificates as used by RPKI.
//!
//! The certificates used in RPKI are defined in [RFC 6487] as a profile on
//! regular Internet PKI certificates defined in [RFC 5280]. The type
//! [`Cert`] in this module decodes the generic structure of such a
//! certificate without enforcing the profile. Profile validation happens
//! in the [parser] which reports every violation it finds into a
//! [`ValidationResult`]. For that to work, decoding here is deliberately
//! lenient: only a certificate that isn’t structurally an X.509 v3
//! certificate is rejected.
//!
//! The extensions that have dedicated checks of their own, namely the CRL
//! distribution points, certificate policies, and the two resource
//! extensions, are kept in their encoded form and decoded on request.
//!
//! [parser]: super::parser
//! [`ValidationResult`]: crate::validation::ValidationResult
//! [RFC 5280]: https://tools.ietf.org/html/rfc5280
//! [RFC 6487]: https://tools.ietf.org/html/rfc6487

use std::convert::Infallible;
use bcder::decode;
use bcder::{BitString, ConstOid, Mode, OctetString, Oid, Tag};
use bcder::decode::{Content, DecodeError};
use bytes::Bytes;
use crate::{oid, uri};
use crate::crypto::{
    KeyIdentifier, PublicKey, SignatureAlgorithm, SignatureVerificationError,
};
use super::x509::{Name, Serial, SignedData, Validity};


//------------ Cert ----------------------------------------------------------

/// A decoded X.509 certificate.
///
/// The certificate keeps its complete encoding. Two certificates are equal
/// if their encodings are.
///
/// ```txt
/// Certificate  ::=  SEQUENCE  {
///     tbsCertificate       TBSCertificate,
///     signatureAlgorithm   AlgorithmIdentifier,
///     signatureValue       BIT STRING  }
/// ```
#[derive(Clone, Debug)]
pub struct Cert {
    /// The complete encoding of the certificate.
    bytes: Bytes,

    /// The outer structure of the certificate.
    signed_data: SignedData,

    /// The actual data of the certificate.
    tbs: TbsCert,
}

/// # Decoding
///
impl Cert {
    /// Decodes a complete certificate.
    ///
    /// The certificate must be the only value in `bytes`.
    pub fn decode(bytes: Bytes) -> Result<Self, DecodeError<Infallible>> {
        let (signed_data, tbs) = Mode::Der.decode(
            bytes.clone(), |cons| {
                cons.take_sequence(|cons| {
                    let signed_data = SignedData::from_constructed(cons)?;
                    let tbs = signed_data.data().clone().decode(
                        TbsCert::take_from
                    ).map_err(DecodeError::convert)?;
                    Ok((signed_data, tbs))
                })
            }
        )?;
        Ok(Cert { bytes, signed_data, tbs })
    }

    /// Takes an encoded certificate from the beginning of a value.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let captured = cons.capture_one()?;
        Self::decode(captured.into_bytes()).map_err(DecodeError::convert)
    }

    /// Returns the complete encoding of the certificate.
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    /// Returns the signed data of the certificate’s outer structure.
    pub fn signed_data(&self) -> &SignedData {
        &self.signed_data
    }

    /// Verifies that the certificate was signed by the given key.
    pub fn verify_signature(
        &self, issuer_key: &PublicKey
    ) -> Result<(), SignatureVerificationError> {
        self.signed_data.verify_signature(issuer_key)
    }
}

/// # Fields
///
impl Cert {
    pub fn serial_number(&self) -> Serial {
        self.tbs.serial_number
    }

    /// Returns the signature algorithm of the outer structure.
    pub fn signature_algorithm(&self) -> &SignatureAlgorithm {
        self.signed_data.algorithm()
    }

    /// Returns the signature algorithm stated inside the signed data.
    pub fn tbs_signature_algorithm(&self) -> &SignatureAlgorithm {
        &self.tbs.signature
    }

    pub fn issuer(&self) -> &Name {
        &self.tbs.issuer
    }

    pub fn validity(&self) -> Validity {
        self.tbs.validity
    }

    pub fn subject(&self) -> &Name {
        &self.tbs.subject
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.tbs.subject_public_key_info
    }

    pub fn extensions(&self) -> &Extensions {
        &self.tbs.extensions
    }
}

/// # Extension Shortcuts
///
impl Cert {
    /// Returns the cA flag of the basic constraints extension.
    pub fn basic_ca(&self) -> Option<bool> {
        self.tbs.extensions.basic_ca
    }

    /// Returns whether the certificate is a CA certificate.
    pub fn is_ca(&self) -> bool {
        self.basic_ca() == Some(true)
    }

    /// Returns whether the certificate is self-signed.
    ///
    /// This is determined by the issuer and subject being equal and the
    /// authority key identifier, if present, being equal to the subject
    /// key identifier.
    pub fn is_self_signed(&self) -> bool {
        if self.issuer() != self.subject() {
            return false
        }
        match self.authority_key_identifier() {
            Some(aki) => Some(aki) == self.subject_key_identifier(),
            None => true
        }
    }

    /// Returns whether the certificate is a self-signed CA certificate.
    pub fn is_root(&self) -> bool {
        self.is_ca() && self.is_self_signed()
    }

    /// Returns whether this is a BGPsec router certificate.
    pub fn is_router(&self) -> bool {
        self.extended_key_usage().map(|eku| {
            eku.iter().any(|purpose| *purpose == oid::KP_BGPSEC_ROUTER)
        }).unwrap_or(false)
    }

    pub fn subject_key_identifier(&self) -> Option<KeyIdentifier> {
        self.tbs.extensions.subject_key_identifier
    }

    pub fn authority_key_identifier(&self) -> Option<KeyIdentifier> {
        self.tbs.extensions.authority_key_identifier
    }

    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.tbs.extensions.key_usage
    }

    pub fn extended_key_usage(&self) -> Option<&[Oid<Bytes>]> {
        self.tbs.extensions.extended_key_usage.as_deref()
    }

    pub fn authority_info_access(&self) -> Option<&[AccessDescription]> {
        self.tbs.extensions.authority_info_access.as_deref()
    }

    pub fn subject_info_access(&self) -> Option<&[AccessDescription]> {
        self.tbs.extensions.subject_info_access.as_deref()
    }

    /// Returns the rsync URI of the issuer’s certificate.
    pub fn ca_issuer(&self) -> Option<uri::Rsync> {
        find_rsync(self.authority_info_access(), &oid::AD_CA_ISSUERS)
    }

    pub fn ca_repository(&self) -> Option<uri::Rsync> {
        find_rsync(self.subject_info_access(), &oid::AD_CA_REPOSITORY)
    }

    pub fn rpki_manifest(&self) -> Option<uri::Rsync> {
        find_rsync(self.subject_info_access(), &oid::AD_RPKI_MANIFEST)
    }

    pub fn signed_object(&self) -> Option<uri::Rsync> {
        find_rsync(self.subject_info_access(), &oid::AD_SIGNED_OBJECT)
    }

    pub fn rpki_notify(&self) -> Option<uri::Https> {
        self.subject_info_access()?.iter().filter(|ad| {
            ad.method == oid::AD_RPKI_NOTIFY
        }).find_map(|ad| ad.location.as_ref()?.to_https())
    }

    /// Returns the decoded CRL distribution points extension.
    ///
    /// Returns `None` if the extension is missing and an error if it
    /// cannot be decoded.
    pub fn crl_distribution_points(
        &self
    ) -> Option<Result<CrlDistributionPoints, DecodeError<Infallible>>> {
        self.tbs.extensions.crl_distribution_points.as_ref().map(|bytes| {
            CrlDistributionPoints::decode(bytes.clone())
        })
    }

    /// Returns the first rsync URI of the CRL distribution points.
    pub fn crl_uri(&self) -> Option<uri::Rsync> {
        self.crl_distribution_points()?.ok()?.points.iter().flat_map(|dp| {
            dp.full_name.iter().flatten()
        }).find_map(|name| name.as_ref()?.to_rsync())
    }

    /// Returns the decoded certificate policies extension.
    pub fn certificate_policies(
        &self
    ) -> Option<Result<CertificatePolicies, DecodeError<Infallible>>> {
        self.tbs.extensions.certificate_policies.as_ref().map(|bytes| {
            CertificatePolicies::decode(bytes.clone())
        })
    }

    /// Returns the value of the IP address delegation extension.
    pub fn ip_resources(&self) -> Option<&[u8]> {
        self.tbs.extensions.ip_resources.as_deref()
    }

    /// Returns the value of the AS identifier delegation extension.
    pub fn as_resources(&self) -> Option<&[u8]> {
        self.tbs.extensions.as_resources.as_deref()
    }
}

impl PartialEq for Cert {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Cert { }

fn find_rsync(
    access: Option<&[AccessDescription]>,
    method: &ConstOid,
) -> Option<uri::Rsync> {
    access?.iter().filter(|ad| ad.method == *method).find_map(|ad| {
        ad.location.as_ref()?.to_rsync()
    })
}


//------------ TbsCert -------------------------------------------------------

/// The data of a certificate that is being signed.
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
///     issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
///     subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
///     extensions      [3]  EXPLICIT Extensions OPTIONAL }
/// ```
#[derive(Clone, Debug)]
struct TbsCert {
    serial_number: Serial,
    signature: SignatureAlgorithm,
    issuer: Name,
    validity: Validity,
    subject: Name,
    subject_public_key_info: PublicKey,
    extensions: Extensions,
}

impl TbsCert {
    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            // Only v3 certificates can have extensions. v3 is 2.
            cons.take_constructed_if(Tag::CTX_0, |c| c.skip_u8_if(2))?;
            let serial_number = Serial::take_from(cons)?;
            let signature = SignatureAlgorithm::take_from(cons)?;
            let issuer = Name::take_from(cons)?;
            let validity = Validity::take_from(cons)?;
            let subject = Name::take_from(cons)?;
            let subject_public_key_info = PublicKey::take_from(cons)?;
            cons.take_opt_value_if(Tag::CTX_1, skip_content)?;
            cons.take_opt_value_if(Tag::CTX_2, skip_content)?;
            let extensions = cons.take_opt_constructed_if(
                Tag::CTX_3, Extensions::take_from
            )?.unwrap_or_default();
            Ok(TbsCert {
                serial_number, signature, issuer, validity, subject,
                subject_public_key_info, extensions
            })
        })
    }
}


//------------ Extensions ----------------------------------------------------

/// The extensions of a certificate.
///
/// All extensions are recorded with their criticality. The values of
/// extensions unknown to RPKI are dropped.
///
/// ```txt
/// Extension  ::=  SEQUENCE  {
///     extnID      OBJECT IDENTIFIER,
///     critical    BOOLEAN DEFAULT FALSE,
///     extnValue   OCTET STRING }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Extensions {
    present: Vec<(Oid<Bytes>, bool)>,
    basic_ca: Option<bool>,
    subject_key_identifier: Option<KeyIdentifier>,
    authority_key_identifier: Option<KeyIdentifier>,
    key_usage: Option<KeyUsage>,
    extended_key_usage: Option<Vec<Oid<Bytes>>>,
    crl_distribution_points: Option<Bytes>,
    authority_info_access: Option<Vec<AccessDescription>>,
    subject_info_access: Option<Vec<AccessDescription>>,
    certificate_policies: Option<Bytes>,
    ip_resources: Option<Bytes>,
    as_resources: Option<Bytes>,
}

impl Extensions {
    /// Returns whether an extension is present and, if so, its criticality.
    pub fn criticality(&self, id: &ConstOid) -> Option<bool> {
        self.present.iter().find(|item| item.0 == *id).map(|item| item.1)
    }

    /// Returns whether an extension is present.
    pub fn contains(&self, id: &ConstOid) -> bool {
        self.criticality(id).is_some()
    }

    /// Returns whether an extension is present and marked critical.
    pub fn is_critical(&self, id: &ConstOid) -> bool {
        self.criticality(id) == Some(true)
    }

    /// Returns the object identifiers of all critical extensions.
    pub fn critical(&self) -> impl Iterator<Item = &Oid<Bytes>> + '_ {
        self.present.iter().filter(|item| item.1).map(|item| &item.0)
    }

    /// Returns the critical extensions not supported by RPKI.
    pub fn unsupported_critical(
        &self
    ) -> impl Iterator<Item = &Oid<Bytes>> + '_ {
        self.critical().filter(|id| !is_supported(id))
    }

    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let mut res = Extensions::default();
        cons.take_sequence(|cons| {
            while let Some(()) = cons.take_opt_sequence(|cons| {
                let id = Oid::take_from(cons)?;
                let critical = cons.take_opt_bool()?.unwrap_or(false);
                let value = OctetString::take_from(cons)?.into_bytes();
                if res.present.iter().any(|item| item.0 == id) {
                    return Err(cons.content_err("duplicate extension"))
                }
                res.take_value(&id, value).map_err(DecodeError::convert)?;
                res.present.push((id, critical));
                Ok(())
            })? { }
            Ok(())
        })?;
        Ok(res)
    }

    fn take_value(
        &mut self, id: &Oid<Bytes>, value: Bytes
    ) -> Result<(), DecodeError<Infallible>> {
        if *id == oid::CE_BASIC_CONSTRAINTS {
            self.basic_ca = Some(
                Mode::Der.decode(value, take_basic_constraints)?
            );
        }
        else if *id == oid::CE_SUBJECT_KEY_IDENTIFIER {
            self.subject_key_identifier = Some(
                Mode::Der.decode(value, KeyIdentifier::take_from)?
            );
        }
        else if *id == oid::CE_AUTHORITY_KEY_IDENTIFIER {
            self.authority_key_identifier = Some(
                Mode::Der.decode(value, take_authority_key_identifier)?
            );
        }
        else if *id == oid::CE_KEY_USAGE {
            self.key_usage = Some(
                Mode::Der.decode(value, KeyUsage::take_from)?
            );
        }
        else if *id == oid::CE_EXTENDED_KEY_USAGE {
            self.extended_key_usage = Some(
                Mode::Der.decode(value, take_extended_key_usage)?
            );
        }
        else if *id == oid::PE_AUTHORITY_INFO_ACCESS {
            self.authority_info_access = Some(
                Mode::Der.decode(value, AccessDescription::take_seq_from)?
            );
        }
        else if *id == oid::PE_SUBJECT_INFO_ACCESS {
            self.subject_info_access = Some(
                Mode::Der.decode(value, AccessDescription::take_seq_from)?
            );
        }
        else if *id == oid::CE_CRL_DISTRIBUTION_POINTS {
            self.crl_distribution_points = Some(value)
        }
        else if *id == oid::CE_CERTIFICATE_POLICIES {
            self.certificate_policies = Some(value)
        }
        else if *id == oid::PE_IP_ADDR_BLOCK {
            self.ip_resources = Some(value)
        }
        else if *id == oid::PE_AUTONOMOUS_SYS_IDS {
            self.as_resources = Some(value)
        }
        Ok(())
    }
}

fn is_supported(id: &Oid<Bytes>) -> bool {
    [
        &oid::CE_BASIC_CONSTRAINTS, &oid::CE_SUBJECT_KEY_IDENTIFIER,
        &oid::CE_AUTHORITY_KEY_IDENTIFIER, &oid::CE_KEY_USAGE,
        &oid::CE_EXTENDED_KEY_USAGE, &oid::CE_CRL_DISTRIBUTION_POINTS,
        &oid::PE_AUTHORITY_INFO_ACCESS, &oid::PE_SUBJECT_INFO_ACCESS,
        &oid::CE_CERTIFICATE_POLICIES, &oid::PE_IP_ADDR_BLOCK,
        &oid::PE_AUTONOMOUS_SYS_IDS,
    ].iter().any(|known| *id == **known)
}

/// Parses the Basic Constraints extension.
///
/// ```text
/// BasicConstraints        ::= SEQUENCE {
///     cA                      BOOLEAN DEFAULT FALSE,
///     pathLenConstraint       INTEGER (0..MAX) OPTIONAL
/// }
/// ```
fn take_basic_constraints<S: decode::Source>(
    cons: &mut decode::Constructed<S>,
) -> Result<bool, DecodeError<S::Error>> {
    cons.take_sequence(|cons| {
        let ca = cons.take_opt_bool()?.unwrap_or(false);
        cons.take_opt_u64()?;
        Ok(ca)
    })
}

/// Parses the Authority Key Identifier extension.
///
/// ```text
/// AuthorityKeyIdentifier ::= SEQUENCE {
///   keyIdentifier             [0] KeyIdentifier           OPTIONAL,
///   authorityCertIssuer       [1] GeneralNames            OPTIONAL,
///   authorityCertSerialNumber [2] CertificateSerialNumber OPTIONAL  }
/// ```
///
/// The keyIdentifier field is required. The others are skipped.
fn take_authority_key_identifier<S: decode::Source>(
    cons: &mut decode::Constructed<S>,
) -> Result<KeyIdentifier, DecodeError<S::Error>> {
    cons.take_sequence(|cons| {
        let res = cons.take_value_if(
            Tag::CTX_0, KeyIdentifier::from_content
        )?;
        cons.skip_all()?;
        Ok(res)
    })
}

/// Parses the Extended Key Usage extension.
///
/// ```text
/// ExtKeyUsageSyntax ::= SEQUENCE SIZE (1..MAX) OF KeyPurposeId
/// KeyPurposeId ::= OBJECT IDENTIFIER
/// ```
fn take_extended_key_usage<S: decode::Source>(
    cons: &mut decode::Constructed<S>,
) -> Result<Vec<Oid<Bytes>>, DecodeError<S::Error>> {
    cons.take_sequence(|cons| {
        let mut res = Vec::new();
        while let Some(id) = Oid::take_opt_from(cons)? {
            res.push(id)
        }
        if res.is_empty() {
            return Err(cons.content_err("empty Extended Key Usage"))
        }
        Ok(res)
    })
}

/// Skips over the content of a value of any type.
fn skip_content<S: decode::Source>(
    content: &mut Content<S>
) -> Result<(), DecodeError<S::Error>> {
    match *content {
        Content::Primitive(ref mut inner) => inner.skip_all(),
        Content::Constructed(ref mut inner) => inner.skip_all(),
    }
}

/// Takes a general name, returning it if it is a URI.
///
/// ```txt
/// GeneralName ::= CHOICE {
///     ...
///     uniformResourceIdentifier       [6]     IA5String,
///     ... }
/// ```
fn take_general_name<S: decode::Source>(
    cons: &mut decode::Constructed<S>
) -> Result<Option<Option<uri::GeneralUri>>, DecodeError<S::Error>> {
    if let Some(uri) = uri::GeneralUri::take_opt_from(cons)? {
        return Ok(Some(Some(uri)))
    }
    Ok(cons.take_opt_value(|_, content| skip_content(content))?.map(|_| None))
}


//------------ KeyUsage ------------------------------------------------------

/// The value of the Key Usage extension.
///
/// ```text
/// KeyUsage ::= BIT STRING {
///      digitalSignature        (0),
///      nonRepudiation          (1),
///      keyEncipherment         (2),
///      dataEncipherment        (3),
///      keyAgreement            (4),
///      keyCertSign             (5),
///      cRLSign                 (6),
///      encipherOnly            (7),
///      decipherOnly            (8) }
/// ```
///
/// RPKI CA certificates must have exactly keyCertSign and cRLSign set, EE
/// certificates exactly digitalSignature.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct KeyUsage(u16);

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: usize = 0;
    pub const KEY_CERT_SIGN: usize = 5;
    pub const CRL_SIGN: usize = 6;

    /// The key usage of a CA certificate.
    pub const CA: KeyUsage = KeyUsage(
        1 << Self::KEY_CERT_SIGN | 1 << Self::CRL_SIGN
    );

    /// The key usage of an EE certificate.
    pub const EE: KeyUsage = KeyUsage(1 << Self::DIGITAL_SIGNATURE);

    pub fn bit(self, bit: usize) -> bool {
        bit < 16 && self.0 & (1 << bit) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn digital_signature(self) -> bool {
        self.bit(Self::DIGITAL_SIGNATURE)
    }

    pub fn key_cert_sign(self) -> bool {
        self.bit(Self::KEY_CERT_SIGN)
    }

    pub fn crl_sign(self) -> bool {
        self.bit(Self::CRL_SIGN)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let bits = BitString::take_from(cons)?;
        Ok(KeyUsage(
            (0..9).filter(|&bit| bits.bit(bit)).fold(0, |res, bit| {
                res | 1 << bit
            })
        ))
    }

    /// Returns the content octets of the bit string.
    ///
    /// The first octet is the number of unused bits. Trailing zero bits
    /// are dropped as required by DER.
    pub fn to_bit_string(self) -> (Vec<u8>, u8) {
        let len = 16 - self.0.leading_zeros() as usize;
        let mut res = vec![0u8; (len + 7) / 8];
        for bit in (0..len).filter(|&bit| self.bit(bit)) {
            res[bit / 8] |= 0x80 >> (bit % 8);
        }
        let unused = (res.len() * 8 - len) as u8;
        (res, unused)
    }
}


//------------ AccessDescription ---------------------------------------------

/// An access description of an information access extension.
///
/// ```txt
/// AccessDescription  ::=  SEQUENCE {
///         accessMethod          OBJECT IDENTIFIER,
///         accessLocation        GeneralName  }
/// ```
///
/// Locations that aren’t URIs are recorded as `None`.
#[derive(Clone, Debug)]
pub struct AccessDescription {
    method: Oid<Bytes>,
    location: Option<uri::GeneralUri>,
}

impl AccessDescription {
    pub fn method(&self) -> &Oid<Bytes> {
        &self.method
    }

    pub fn location(&self) -> Option<&uri::GeneralUri> {
        self.location.as_ref()
    }

    fn take_seq_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Vec<Self>, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut res = Vec::new();
            while let Some(item) = cons.take_opt_sequence(|cons| {
                let method = Oid::take_from(cons)?;
                let location = take_general_name(cons)?.ok_or_else(|| {
                    cons.content_err("missing access location")
                })?;
                Ok(AccessDescription { method, location })
            })? {
                res.push(item)
            }
            Ok(res)
        })
    }
}


//------------ CrlDistributionPoints -----------------------------------------

/// The decoded CRL Distribution Points extension.
///
/// ```text
/// CRLDistributionPoints ::= SEQUENCE SIZE (1..MAX) OF DistributionPoint
///
/// DistributionPoint ::= SEQUENCE {
///    distributionPoint       [0]     DistributionPointName OPTIONAL,
///    reasons                 [1]     ReasonFlags OPTIONAL,
///    cRLIssuer               [2]     GeneralNames OPTIONAL }
///
/// DistributionPointName ::= CHOICE {
///    fullName                [0]     GeneralNames,
///    nameRelativeToCRLIssuer [1]     RelativeDistinguishedName }
/// ```
#[derive(Clone, Debug)]
pub struct CrlDistributionPoints {
    points: Vec<DistributionPoint>,
}

impl CrlDistributionPoints {
    pub fn decode(bytes: Bytes) -> Result<Self, DecodeError<Infallible>> {
        Mode::Der.decode(bytes, |cons| {
            cons.take_sequence(|cons| {
                let mut points = Vec::new();
                while let Some(point) = cons.take_opt_sequence(
                    DistributionPoint::from_constructed
                )? {
                    points.push(point)
                }
                Ok(CrlDistributionPoints { points })
            })
        })
    }

    pub fn points(&self) -> &[DistributionPoint] {
        &self.points
    }
}

/// A single distribution point.
#[derive(Clone, Debug)]
pub struct DistributionPoint {
    full_name: Option<Vec<Option<uri::GeneralUri>>>,
    has_relative_name: bool,
    has_reasons: bool,
    has_crl_issuer: bool,
}

impl DistributionPoint {
    /// Returns the general names of the full name choice.
    ///
    /// Names that aren’t URIs are `None`.
    pub fn full_name(&self) -> Option<&[Option<uri::GeneralUri>]> {
        self.full_name.as_deref()
    }

    pub fn has_relative_name(&self) -> bool {
        self.has_relative_name
    }

    pub fn has_reasons(&self) -> bool {
        self.has_reasons
    }

    pub fn has_crl_issuer(&self) -> bool {
        self.has_crl_issuer
    }

    fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let mut full_name = None;
        let mut has_relative_name = false;
        cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
            full_name = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                let mut names = Vec::new();
                while let Some(name) = take_general_name(cons)? {
                    names.push(name)
                }
                Ok(names)
            })?;
            if full_name.is_none() {
                cons.take_constructed_if(Tag::CTX_1, |cons| cons.skip_all())?;
                has_relative_name = true;
            }
            Ok(())
        })?;
        let has_reasons = cons.take_opt_value_if(
            Tag::CTX_1, skip_content
        )?.is_some();
        let has_crl_issuer = cons.take_opt_value_if(
            Tag::CTX_2, skip_content
        )?.is_some();
        Ok(DistributionPoint {
            full_name, has_relative_name, has_reasons, has_crl_issuer
        })
    }
}


//------------ CertificatePolicies -------------------------------------------

/// The decoded Certificate Policies extension.
///
/// ```text
/// certificatePolicies ::= SEQUENCE SIZE (1..MAX) OF PolicyInformation
///
/// PolicyInformation ::= SEQUENCE {
///     policyIdentifier   CertPolicyId,
///     policyQualifiers   SEQUENCE SIZE (1..MAX) OF
///                             PolicyQualifierInfo OPTIONAL }
///
/// PolicyQualifierInfo ::= SEQUENCE {
///     policyQualifierId  PolicyQualifierId,
///     qualifier          ANY DEFINED BY policyQualifierId }
/// ```
#[derive(Clone, Debug)]
pub struct CertificatePolicies {
    policies: Vec<PolicyInformation>,
}

impl CertificatePolicies {
    pub fn decode(bytes: Bytes) -> Result<Self, DecodeError<Infallible>> {
        Mode::Der.decode(bytes, |cons| {
            cons.take_sequence(|cons| {
                let mut policies = Vec::new();
                while let Some(policy) = cons.take_opt_sequence(
                    PolicyInformation::from_constructed
                )? {
                    policies.push(policy)
                }
                Ok(CertificatePolicies { policies })
            })
        })
    }

    pub fn policies(&self) -> &[PolicyInformation] {
        &self.policies
    }
}

#[derive(Clone, Debug)]
pub struct PolicyInformation {
    id: Oid<Bytes>,
    qualifiers: Vec<Oid<Bytes>>,
}

impl PolicyInformation {
    pub fn id(&self) -> &Oid<Bytes> {
        &self.id
    }

    /// Returns the identifiers of the policy qualifiers.
    pub fn qualifiers(&self) -> &[Oid<Bytes>] {
        &self.qualifiers
    }

    fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let id = Oid::take_from(cons)?;
        let mut qualifiers = Vec::new();
        cons.take_opt_sequence(|cons| {
            while let Some(qualifier) = cons.take_opt_sequence(|cons| {
                let id = Oid::take_from(cons)?;
                cons.skip_all()?;
                Ok(id)
            })? {
                qualifiers.push(qualifier)
            }
            Ok(())
        })?;
        Ok(PolicyInformation { id, qualifiers })
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use bcder::encode;
    use bcder::encode::{PrimitiveContent, Values};
    use super::*;

    #[test]
    fn garbage_fails() {
        assert!(Cert::decode(Bytes::from_static(&[0x01, 0x03, 0x23])).is_err());
        assert!(Cert::decode(Bytes::new()).is_err());
    }

    #[test]
    fn key_usage_bits() {
        assert_eq!(KeyUsage::CA.to_bit_string(), (vec![0x06], 1));
        assert_eq!(KeyUsage::EE.to_bit_string(), (vec![0x80], 7));
        assert_eq!(KeyUsage::default().to_bit_string(), (vec![], 0));
        assert!(KeyUsage::CA.key_cert_sign());
        assert!(KeyUsage::CA.crl_sign());
        assert!(!KeyUsage::CA.digital_signature());

        let decoded = Mode::Der.decode(
            Bytes::from_static(b"\x03\x02\x01\x06"), KeyUsage::take_from
        ).unwrap();
        assert_eq!(decoded, KeyUsage::CA);
        let decoded = Mode::Der.decode(
            Bytes::from_static(b"\x03\x02\x07\x80"), KeyUsage::take_from
        ).unwrap();
        assert_eq!(decoded, KeyUsage::EE);
    }

    #[test]
    fn crl_distribution_points() {
        let uri = uri::Rsync::from_str("rsync://example.com/ca/ca.crl");
        let uri = uri.unwrap();
        let encoded = encode::sequence(
            encode::sequence(
                encode::sequence_as(Tag::CTX_0,
                    encode::sequence_as(Tag::CTX_0,
                        uri.encode_general_name()
                    )
                )
            )
        ).to_captured(Mode::Der).into_bytes();
        let points = CrlDistributionPoints::decode(encoded).unwrap();
        assert_eq!(points.points().len(), 1);
        let point = &points.points()[0];
        assert!(!point.has_reasons());
        assert!(!point.has_crl_issuer());
        assert!(!point.has_relative_name());
        let names = point.full_name().unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].as_ref().unwrap().to_rsync(), Some(uri));
    }

    #[test]
    fn certificate_policies() {
        let encoded = encode::sequence(
            encode::sequence((
                oid::CP_IPADDR_ASNUMBER.encode(),
                encode::sequence(
                    encode::sequence((
                        oid::QT_CPS.encode(),
                        OctetString::encode_slice_as(
                            b"https://example.com/cps", Tag::IA5_STRING
                        ),
                    ))
                )
            ))
        ).to_captured(Mode::Der).into_bytes();
        let policies = CertificatePolicies::decode(encoded).unwrap();
        assert_eq!(policies.policies().len(), 1);
        let policy = &policies.policies()[0];
        assert_eq!(*policy.id(), oid::CP_IPADDR_ASNUMBER);
        assert_eq!(policy.qualifiers().len(), 1);
        assert_eq!(policy.qualifiers()[0], oid::QT_CPS);
    }

}
