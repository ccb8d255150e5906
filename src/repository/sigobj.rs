//! Signed objects.
//!
//! All RPKI objects other than certificates and CRLs are published as CMS
//! signed data as profiled by [RFC 6488] on top of [RFC 5652]. This module
//! implements the common part: the [`SignedObjectParser`] decodes the CMS
//! structure and checks it against the profile while the actual content is
//! handled by a type implementing [`SignedObjectContent`]. The
//! [`SignedObjectBuilder`] creates new objects including their EE
//! certificate.
//!
//! [RFC 5652]: https://tools.ietf.org/html/rfc5652
//! [RFC 6488]: https://tools.ietf.org/html/rfc6488

use bcder::{decode, encode};
use bcder::{Captured, ConstOid, Mode, OctetString, Oid, Tag};
use std::hash;
use std::convert::{Infallible, TryFrom};
use bcder::decode::{BytesSource, DecodeError};
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use log::debug;
use crate::{oid, uri};
use crate::crypto::{
    DigestAlgorithm, KeyIdentifier, Signature, SignatureAlgorithm, Signer,
    SigningAlgorithm,
};
use crate::resources::{InheritedTypes, ResourceSet, ResourceType};
use crate::validation::{
    ValidationLocation, ValidationOptions, ValidationResult,
};
use crate::validation::checks::*;
use super::builder::{CertBuilder, CertKind};
use super::cert::Cert;
use super::error::{BuildError, IllegalState};
use super::parser::{validate_cert, Profile};
use super::rescert::ResourceCert;
use super::x509::{Name, Serial, Time, Validity};


//------------ SignedObjectContent -------------------------------------------

/// The content of a specific type of signed object.
pub trait SignedObjectContent: Sized {
    /// The object identifier of the content type.
    const CONTENT_TYPE: ConstOid;

    /// The key of the check for the content type.
    const CONTENT_TYPE_CHECK: &'static str;

    /// Whether the content is something other than a single encoded value.
    ///
    /// Such content is handed to `decode_content` as is.
    const RAW_CONTENT: bool = false;

    /// Decodes the content.
    ///
    /// Unless `RAW_CONTENT` is set, the content is a single encoded value.
    /// Problems are recorded into `result`. Returns `None` if the content
    /// couldn’t be decoded.
    fn decode_content(
        content: Bytes, result: &mut ValidationResult
    ) -> Option<Self>;

    /// Checks the content against the object’s EE certificate.
    fn check_certificate(
        &self, _cert: &ResourceCert, _result: &mut ValidationResult
    ) { }

    /// Returns the encoded content.
    fn encode_content(&self) -> Bytes;
}


//------------ SignedObject --------------------------------------------------

/// A signed object that has passed validation.
///
/// Two objects are equal if their encodings are identical.
#[derive(Clone, Debug)]
pub struct SignedObject<C> {
    /// The complete encoding.
    bytes: Bytes,

    /// The decoded content.
    content: C,

    /// The EE certificate.
    cert: ResourceCert,

    /// The signing time if either of the signing time attributes is present.
    signing_time: Option<Time>,
}

impl<C> SignedObject<C> {
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn into_content(self) -> C {
        self.content
    }

    /// Returns the EE certificate the object was signed with.
    pub fn cert(&self) -> &ResourceCert {
        &self.cert
    }

    pub fn signing_time(&self) -> Option<Time> {
        self.signing_time
    }
}


//--- PartialEq and Eq

impl<C> PartialEq for SignedObject<C> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<C> Eq for SignedObject<C> { }


//--- Hash

impl<C> hash::Hash for SignedObject<C> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state)
    }
}


//------------ SignedObjectParser --------------------------------------------

/// A parser for signed objects.
///
/// Like the [certificate parser][super::parser::CertParser], the parser
/// records all its checks into a validation result and only provides the
/// object if none of them has failed.
#[derive(Clone, Debug)]
pub struct SignedObjectParser<C> {
    result: ValidationResult,
    object: Option<SignedObject<C>>,
}

impl<C: SignedObjectContent + Clone> SignedObjectParser<C> {
    /// Parses an object tolerating BER encoding of the CMS structure.
    pub fn parse(
        location: impl Into<ValidationLocation>,
        bytes: Bytes,
    ) -> Self {
        Self::parse_with_result(
            ValidationResult::with_location(location), bytes, false
        )
    }

    /// Parses an object with the strictness given by `options`.
    ///
    /// In strict mode, the CMS structure must be DER encoded.
    pub fn parse_with_options(
        location: impl Into<ValidationLocation>,
        bytes: Bytes,
        options: &ValidationOptions,
    ) -> Self {
        Self::parse_with_result(
            ValidationResult::with_location(location), bytes,
            options.is_strict()
        )
    }

    /// Parses an object recording into an existing result.
    ///
    /// All checks are recorded for the result’s current location.
    pub fn parse_with_result(
        mut result: ValidationResult, bytes: Bytes, strict: bool
    ) -> Self {
        let mode = if strict { Mode::Der } else { Mode::Ber };
        let object = match mode.decode(bytes.clone(), SignedData::take_from) {
            Ok(data) => {
                result.pass(CMS_DATA_PARSING, &[]);
                validate_signed_data(data, bytes, &mut result)
            }
            Err(err) => {
                debug!(
                    "{}: failed to decode signed object: {}",
                    result.current_location(), err
                );
                result.error(CMS_DATA_PARSING, &[&err]);
                None
            }
        };
        SignedObjectParser { result, object }
    }

    pub fn validation_result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn into_validation_result(self) -> ValidationResult {
        self.result
    }

    pub fn is_success(&self) -> bool {
        !self.result.has_failures()
    }

    /// Returns the validated object.
    ///
    /// Returns an error if any check has failed.
    pub fn signed_object(&self) -> Result<SignedObject<C>, IllegalState> {
        if !self.is_success() {
            return Err(IllegalState::new("signed object"))
        }
        self.object.clone().ok_or_else(|| IllegalState::new("signed object"))
    }
}


//------------ Validation ----------------------------------------------------

fn validate_signed_data<C: SignedObjectContent>(
    data: SignedData,
    bytes: Bytes,
    result: &mut ValidationResult,
) -> Option<SignedObject<C>> {
    let failed_before = result.failures_for_current_location().len();

    result.reject_if_false(
        data.content_type == C::CONTENT_TYPE, C::CONTENT_TYPE_CHECK,
        &[&data.content_type]
    );
    let content = decode_content::<C>(data.content.as_ref(), result);
    result.reject_if_false(
        data.outer_content_type == oid::SIGNED_DATA, CMS_CONTENT_TYPE,
        &[&data.outer_content_type]
    );
    result.reject_if_false(
        data.version == 3, CMS_SIGNED_DATA_VERSION, &[&data.version]
    );
    result.reject_if_false(
        data.digest_algorithms.len() == 1
            && DigestAlgorithm::is_oid(&data.digest_algorithms[0]),
        CMS_SIGNED_DATA_DIGEST_ALGORITHM, &[]
    );
    let cert = check_certificates(&data, result);
    result.reject_if_false(data.crl_count == 0, CMS_NO_CRL_ALLOWED, &[]);
    let signing_time = check_signer_info(&data, cert.as_ref(), result);

    let (content, cert) = match (content, cert) {
        (Some(content), Some(cert)) => (content, cert),
        _ => return None,
    };
    content.check_certificate(&cert, result);
    if result.failures_for_current_location().len() > failed_before {
        return None
    }
    Some(SignedObject { bytes, content, cert, signing_time })
}

/// Decodes the encapsulated content.
///
/// The content must be exactly one value.
fn decode_content<C: SignedObjectContent>(
    content: Option<&Bytes>,
    result: &mut ValidationResult,
) -> Option<C> {
    let content = match content {
        Some(content) => content.clone(),
        None => {
            result.error(DECODE_CONTENT, &[&"missing content"]);
            return None
        }
    };
    if C::RAW_CONTENT {
        let res = C::decode_content(content, result);
        result.reject_if_none(res.as_ref(), DECODE_CONTENT, &[]);
        return res
    }
    let (first, trailing) = match Mode::Der.decode(content, |cons| {
        let first = cons.capture_one()?;
        let trailing = cons.capture_all()?;
        Ok((first, trailing))
    }) {
        Ok(res) => res,
        Err(err) => {
            result.error(DECODE_CONTENT, &[&err]);
            return None
        }
    };
    result.reject_if_false(
        trailing.as_slice().is_empty(), ONLY_ONE_SIGNED_OBJECT, &[]
    );
    let res = C::decode_content(first.into_bytes(), result);
    result.reject_if_none(res.as_ref(), DECODE_CONTENT, &[]);
    res
}

/// Checks the embedded certificates.
///
/// Returns the EE certificate if it passed the resource certificate
/// profile.
fn check_certificates(
    data: &SignedData, result: &mut ValidationResult
) -> Option<ResourceCert> {
    result.pass(GET_CERTS_AND_CRLS, &[]);
    if !result.reject_if_false(
        data.certificates.len() == 1, ONLY_ONE_EE_CERT_ALLOWED,
        &[&data.certificates.len()]
    ) {
        return None
    }
    let cert = match Cert::decode(data.certificates[0].clone()) {
        Ok(cert) => {
            result.pass(CERT_IS_X509CERT, &[]);
            cert
        }
        Err(err) => {
            result.error(CERT_IS_X509CERT, &[&err]);
            return None
        }
    };
    result.reject_if_true(cert.is_ca(), CERT_IS_EE_CERT, &[]);
    result.reject_if_none(
        cert.subject_key_identifier().as_ref(), CERT_HAS_SKI, &[]
    );
    validate_cert(cert, Profile::Resource, result)?.into_resource_cert()
}

/// Checks the signer info.
///
/// Returns the signing time if there is one.
fn check_signer_info(
    data: &SignedData,
    cert: Option<&ResourceCert>,
    result: &mut ValidationResult,
) -> Option<Time> {
    if !result.reject_if_false(
        !data.signer_infos.is_empty(), GET_SIGNER_INFO, &[]
    ) {
        return None
    }
    if !result.reject_if_false(
        data.signer_infos.len() == 1, ONLY_ONE_SIGNER,
        &[&data.signer_infos.len()]
    ) {
        return None
    }
    let info = &data.signer_infos[0];
    result.reject_if_false(
        info.version == 3, CMS_SIGNER_INFO_VERSION, &[&info.version]
    );
    result.reject_if_false(
        DigestAlgorithm::is_oid(&info.digest_algorithm),
        CMS_SIGNER_INFO_DIGEST_ALGORITHM, &[&info.digest_algorithm]
    );
    result.reject_if_false(
        info.signature_algorithm.cms_signing_algorithm().is_some(),
        ENCRYPTION_ALGORITHM, &[&info.signature_algorithm]
    );
    result.reject_if_none(info.sid.as_ref(), CMS_SIGNER_INFO_SKI, &[]);
    result.reject_if_true(
        info.has_unsigned_attrs, UNSIGNED_ATTRS_OMITTED, &[]
    );
    if let Some(cert) = cert {
        result.reject_if_false(
            info.sid.is_some() && info.sid == cert.subject_key_identifier(),
            SIGNER_ID_MATCH, &[]
        );
    }
    let attrs = match info.signed_attrs {
        Some(ref attrs) => {
            result.pass(SIGNED_ATTRS_PRESENT, &[]);
            attrs
        }
        None => {
            result.error(SIGNED_ATTRS_PRESENT, &[]);
            return None
        }
    };
    let values = attrs.check(&data.content_type, result)?;
    if let Some(cert) = cert {
        verify_signature(data, info, attrs, &values, cert, result);
    }
    values.signing_time
}

/// Verifies the message digest and the signature.
fn verify_signature(
    data: &SignedData,
    info: &SignerInfo,
    attrs: &SignedAttrs,
    values: &AttrValues,
    cert: &ResourceCert,
    result: &mut ValidationResult,
) {
    let content: &[u8] = match data.content {
        Some(ref content) => content.as_ref(),
        None => b"",
    };
    let digest = DigestAlgorithm::default().digest(content);
    if digest.as_ref() != values.message_digest.as_ref() {
        result.error(SIGNATURE_VERIFICATION, &[&"message digest mismatch"]);
        return
    }
    let algorithm = match info.signature_algorithm.cms_signing_algorithm() {
        Some(algorithm) => algorithm,
        None => {
            result.error(
                SIGNATURE_VERIFICATION, &[&info.signature_algorithm]
            );
            return
        }
    };
    match cert.public_key().verify(
        attrs.encode_verify().as_slice(),
        &Signature::new(algorithm, info.signature.clone())
    ) {
        Ok(()) => result.pass(SIGNATURE_VERIFICATION, &[]),
        Err(err) => result.error(SIGNATURE_VERIFICATION, &[&err]),
    }
}


//------------ SignedData ----------------------------------------------------

/// The decoded but unchecked CMS structure.
///
/// ```txt
/// ContentInfo ::= SEQUENCE {
///     contentType ContentType,
///     content [0] EXPLICIT ANY DEFINED BY contentType }
///
/// SignedData ::= SEQUENCE {
///     version CMSVersion,
///     digestAlgorithms DigestAlgorithmIdentifiers,
///     encapContentInfo EncapsulatedContentInfo,
///     certificates [0] IMPLICIT CertificateSet OPTIONAL,
///     crls [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///     signerInfos SignerInfos }
///
/// EncapsulatedContentInfo ::= SEQUENCE {
///     eContentType ContentType,
///     eContent [0] EXPLICIT OCTET STRING OPTIONAL }
/// ```
///
/// Anything the profile restricts is kept so that the checks can report on
/// it.
#[derive(Clone, Debug)]
struct SignedData {
    outer_content_type: Oid<Bytes>,
    version: u64,
    digest_algorithms: Vec<Oid<Bytes>>,
    content_type: Oid<Bytes>,
    content: Option<Bytes>,
    certificates: Vec<Bytes>,
    crl_count: usize,
    signer_infos: Vec<SignerInfo>,
}

impl SignedData {
    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let outer_content_type = Oid::take_from(cons)?;
            cons.take_constructed_if(Tag::CTX_0, |cons| {
                cons.take_sequence(|cons| {
                    let version = cons.take_u64()?;
                    let digest_algorithms =
                        DigestAlgorithm::take_oid_set_from(cons)?;
                    let (content_type, content) = cons.take_sequence(|cons| {
                        Ok((
                            Oid::take_from(cons)?,
                            cons.take_opt_constructed_if(
                                Tag::CTX_0, OctetString::take_from
                            )?.map(OctetString::into_bytes),
                        ))
                    })?;
                    let certificates = cons.take_opt_constructed_if(
                        Tag::CTX_0, |cons| {
                            let mut res = Vec::new();
                            take_values(cons, &mut res)?;
                            Ok(res)
                        }
                    )?.unwrap_or_default();
                    let mut crls = Vec::new();
                    cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
                        take_values(cons, &mut crls)
                    })?;
                    let signer_infos = cons.take_set(|cons| {
                        let mut res = Vec::new();
                        while let Some(info) = cons.take_opt_sequence(
                            SignerInfo::from_constructed
                        )? {
                            res.push(info)
                        }
                        Ok(res)
                    })?;
                    Ok(SignedData {
                        outer_content_type, version, digest_algorithms,
                        content_type, content, certificates,
                        crl_count: crls.len(),
                        signer_infos,
                    })
                })
            })
        })
    }
}

/// Takes all remaining values of a constructed value.
///
/// The complete encoding of each value is appended to `target`.
fn take_values<S: decode::Source>(
    cons: &mut decode::Constructed<S>,
    target: &mut Vec<Bytes>,
) -> Result<(), DecodeError<S::Error>> {
    let all = cons.capture_all()?;
    let mut rest = all.into_bytes();
    while !rest.is_empty() {
        let value = Mode::Ber.decode(rest.clone(), |cons| {
            let value = cons.capture_one()?;
            cons.skip_all()?;
            Ok(value)
        }).map_err(|err| cons.content_err(err))?;
        let value = value.into_bytes();
        rest = rest.slice(value.len()..);
        target.push(value);
    }
    Ok(())
}


//------------ SignerInfo ----------------------------------------------------

/// A decoded but unchecked signer info.
///
/// ```txt
/// SignerInfo ::= SEQUENCE {
///     version CMSVersion,
///     sid SignerIdentifier,
///     digestAlgorithm DigestAlgorithmIdentifier,
///     signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///     signatureAlgorithm SignatureAlgorithmIdentifier,
///     signature SignatureValue,
///     unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL }
///
/// SignerIdentifier ::= CHOICE {
///     issuerAndSerialNumber IssuerAndSerialNumber,
///     subjectKeyIdentifier [0] SubjectKeyIdentifier }
/// ```
#[derive(Clone, Debug)]
struct SignerInfo {
    version: u64,

    /// The subject key identifier if this form of identifier is used.
    sid: Option<KeyIdentifier>,

    digest_algorithm: Oid<Bytes>,
    signed_attrs: Option<SignedAttrs>,
    signature_algorithm: SignatureAlgorithm,
    signature: Bytes,
    has_unsigned_attrs: bool,
}

impl SignerInfo {
    fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let version = cons.take_u64()?;
        let sid = cons.take_opt_value_if(
            Tag::CTX_0, KeyIdentifier::from_content
        )?;
        if sid.is_none() {
            cons.take_sequence(|cons| cons.skip_all())?;
        }
        let digest_algorithm = DigestAlgorithm::take_oid_from(cons)?;
        let signed_attrs = cons.take_opt_constructed_if(
            Tag::CTX_0, SignedAttrs::take_content_from
        )?;
        let signature_algorithm = SignatureAlgorithm::take_from(cons)?;
        let signature = OctetString::take_from(cons)?.into_bytes();
        let has_unsigned_attrs = cons.take_opt_constructed_if(
            Tag::CTX_1, |cons| cons.skip_all()
        )?.is_some();
        Ok(SignerInfo {
            version, sid, digest_algorithm, signed_attrs,
            signature_algorithm, signature, has_unsigned_attrs,
        })
    }
}


//------------ SignedAttrs ---------------------------------------------------

/// The signed attributes of a signer info.
///
/// The signature is calculated over the DER encoding of the attributes
/// with the tag for SET OF rather than the implicit tag used in the
/// signer info. We therefore keep the raw content of the attributes in
/// addition to the decoded attributes.
#[derive(Clone, Debug)]
struct SignedAttrs {
    raw: Captured,
    attrs: Vec<Attribute>,
}

/// A single attribute.
///
/// ```txt
/// Attribute ::= SEQUENCE {
///     attrType OBJECT IDENTIFIER,
///     attrValues SET OF AttributeValue }
/// ```
#[derive(Clone, Debug)]
struct Attribute {
    id: Oid<Bytes>,
    values: Vec<Bytes>,
}

/// The values of the signed attributes that passed the checks.
#[derive(Clone, Debug)]
struct AttrValues {
    message_digest: Bytes,
    signing_time: Option<Time>,
}

impl SignedAttrs {
    fn take_content_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let raw = cons.capture_all()?;
        let attrs = raw.clone().decode(|cons| {
            let mut attrs = Vec::new();
            while let Some(attr) = cons.take_opt_sequence(|cons| {
                let id = Oid::take_from(cons)?;
                let mut values = Vec::new();
                cons.take_set(|cons| take_values(cons, &mut values))?;
                Ok(Attribute { id, values })
            })? {
                attrs.push(attr)
            }
            Ok(attrs)
        }).map_err(|err| cons.content_err(err))?;
        Ok(SignedAttrs { raw, attrs })
    }

    /// Checks the attributes.
    ///
    /// Only the content type, message digest, signing time, and binary
    /// signing time attributes are allowed, each at most once and with
    /// exactly one value. The first two are required.
    fn check(
        &self,
        content_type: &Oid<Bytes>,
        result: &mut ValidationResult,
    ) -> Option<AttrValues> {
        let mut correct = true;
        let mut content_type_attr = None;
        let mut message_digest = None;
        let mut signing_time = None;
        let mut binary_signing_time = None;
        for attr in &self.attrs {
            let value = match attr.values.as_slice() {
                [value] => value.clone(),
                _ => {
                    correct = false;
                    continue
                }
            };
            let ok = if attr.id == oid::CONTENT_TYPE {
                take_once(&mut content_type_attr, value, Oid::take_from)
            }
            else if attr.id == oid::MESSAGE_DIGEST {
                take_once(&mut message_digest, value, |cons| {
                    OctetString::take_from(cons).map(OctetString::into_bytes)
                })
            }
            else if attr.id == oid::SIGNING_TIME {
                take_once(&mut signing_time, value, Time::take_from)
            }
            else if attr.id == oid::AA_BINARY_SIGNING_TIME {
                take_once(&mut binary_signing_time, value, |cons| {
                    let secs = cons.take_u64()?;
                    i64::try_from(secs).ok().and_then(Time::from_timestamp)
                        .ok_or_else(|| {
                            cons.content_err("invalid binary signing time")
                        })
                })
            }
            else {
                false
            };
            correct &= ok;
        }
        result.reject_if_false(correct, SIGNED_ATTRS_CORRECT, &[]);
        if result.reject_if_none(
            content_type_attr.as_ref(), CONTENT_TYPE_ATTR_PRESENT, &[]
        ) {
            result.reject_if_false(
                content_type_attr.as_ref() == Some(content_type),
                CONTENT_TYPE_VALUE, &[content_type]
            );
        }
        result.reject_if_none(
            message_digest.as_ref(), MSG_DIGEST_ATTR_PRESENT, &[]
        );
        if let (Some(signing), Some(binary)) = (
            signing_time, binary_signing_time
        ) {
            result.reject_if_false(
                signing == binary, SIGNING_TIME_MUST_EQUAL_BINARY_SIGNING_TIME,
                &[&signing, &binary]
            );
        }
        Some(AttrValues {
            message_digest: message_digest?,
            signing_time: signing_time.or(binary_signing_time),
        })
    }

    /// Returns the message the signature is calculated over.
    fn encode_verify(&self) -> Captured {
        encode::set(&self.raw).to_captured(Mode::Der)
    }
}

/// Decodes an attribute value unless the attribute was seen before.
///
/// Returns whether decoding succeeded.
fn take_once<T, F>(target: &mut Option<T>, value: Bytes, op: F) -> bool
where
    F: FnOnce(
        &mut decode::Constructed<BytesSource>
    ) -> Result<T, DecodeError<Infallible>>
{
    if target.is_some() {
        return false
    }
    match Mode::Der.decode(value, op) {
        Ok(value) => {
            *target = Some(value);
            true
        }
        Err(_) => false
    }
}


//------------ SignedObjectBuilder -------------------------------------------

/// A builder for signed objects.
///
/// The builder creates the EE certificate with a one-off key which is used
/// to sign the object and then forgotten. The certificate is signed with
/// the issuer’s key.
#[derive(Clone, Debug)]
pub struct SignedObjectBuilder {
    serial_number: Serial,
    validity: Validity,
    issuer: Name,
    crl_uri: uri::Rsync,
    ca_issuer: uri::Rsync,
    signed_object: uri::Rsync,
    resources: ResourceSet,
    inherited: InheritedTypes,

    /// The signing time attribute. Defaults to the current time.
    signing_time: Option<Time>,

    /// The binary signing time attribute. Defaults to none.
    binary_signing_time: Option<Time>,
}

impl SignedObjectBuilder {
    pub fn new(
        serial_number: Serial,
        validity: Validity,
        issuer: Name,
        crl_uri: uri::Rsync,
        ca_issuer: uri::Rsync,
        signed_object: uri::Rsync,
    ) -> Self {
        SignedObjectBuilder {
            serial_number, validity, issuer, crl_uri, ca_issuer,
            signed_object,
            resources: ResourceSet::empty(),
            inherited: InheritedTypes::empty(),
            signing_time: Some(Time::now()),
            binary_signing_time: None,
        }
    }

    pub fn with_resources(mut self, resources: ResourceSet) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_inherited(mut self, resource_type: ResourceType) -> Self {
        self.inherited.insert(resource_type);
        self
    }

    pub fn with_inherit_all(mut self) -> Self {
        self.inherited = InheritedTypes::all();
        self
    }

    pub fn with_signing_time(mut self, time: Option<Time>) -> Self {
        self.signing_time = time;
        self
    }

    pub fn with_binary_signing_time(mut self, time: Option<Time>) -> Self {
        self.binary_signing_time = time;
        self
    }

    /// Builds the object.
    ///
    /// The EE certificate is signed with `issuer_key`.
    pub fn build<C: SignedObjectContent, S: Signer>(
        self,
        content: C,
        signer: &S,
        issuer_key: &S::KeyId,
    ) -> Result<SignedObject<C>, BuildError> {
        let issuer_info = signer.get_key_info(issuer_key).map_err(
            BuildError::signing
        )?;
        let encoded = content.encode_content();
        let digest = DigestAlgorithm::default().digest(encoded.as_ref());

        let mut attrs = vec![
            encode_attribute(&oid::CONTENT_TYPE, C::CONTENT_TYPE.encode()),
            encode_attribute(
                &oid::MESSAGE_DIGEST,
                OctetString::encode_slice(digest.as_ref())
            ),
        ];
        if let Some(time) = self.signing_time {
            attrs.push(
                encode_attribute(&oid::SIGNING_TIME, time.encode_varied())
            );
        }
        if let Some(time) = self.binary_signing_time {
            attrs.push(encode_attribute(
                &oid::AA_BINARY_SIGNING_TIME,
                (time.timestamp().max(0) as u64).encode()
            ));
        }
        let attrs = encode_signed_attrs(attrs);
        let (signature, ee_key) = signer.sign_one_off(
            SigningAlgorithm::RsaSha256,
            encode::set(&attrs).to_captured(Mode::Der).as_slice()
        ).map_err(BuildError::signing)?;
        let sid = ee_key.key_identifier();

        let mut cert = CertBuilder::new(
            CertKind::Ee, self.serial_number, self.issuer, self.validity,
            ee_key,
        )
        .with_authority_key_identifier(issuer_info.key_identifier())
        .with_crl_uri(self.crl_uri)
        .with_ca_issuer(self.ca_issuer)
        .with_signed_object(self.signed_object)
        .with_resources(self.resources);
        for resource_type in self.inherited.iter() {
            cert = cert.with_inherited(resource_type);
        }
        let cert = cert.build(signer, issuer_key)?.into_resource_cert()
            .ok_or(BuildError::InvalidField("EE certificate"))?;

        let bytes = encode_signed_data(
            &C::CONTENT_TYPE, &encoded, cert.cert(), &attrs, sid, &signature
        )?;
        Ok(SignedObject {
            bytes, content, cert,
            signing_time: self.signing_time.or(self.binary_signing_time),
        })
    }
}

/// Returns the encoding of a single attribute.
fn encode_attribute(
    id: &'static ConstOid, value: impl encode::Values
) -> Captured {
    encode::sequence((
        id.encode(),
        encode::set(value),
    )).to_captured(Mode::Der)
}

/// Returns the content of the signed attributes in DER order.
///
/// DER requires the elements of a SET OF to be sorted by their encoding.
fn encode_signed_attrs(mut attrs: Vec<Captured>) -> Captured {
    attrs.sort_by(|left, right| left.as_slice().cmp(right.as_slice()));
    let mut res = Captured::builder(Mode::Der);
    for attr in attrs {
        res.extend(attr)
    }
    res.freeze()
}

/// Returns the complete encoding of a signed object.
fn encode_signed_data(
    content_type: &ConstOid,
    content: &Bytes,
    cert: &Cert,
    signed_attrs: &Captured,
    sid: KeyIdentifier,
    signature: &Signature,
) -> Result<Bytes, BuildError> {
    let cert = Mode::Der.decode(cert.to_bytes(), |cons| {
        cons.capture_one()
    }).map_err(|err| BuildError::Encoding(err.to_string()))?;
    let res = encode::sequence((
        oid::SIGNED_DATA.encode(),
        encode::sequence_as(Tag::CTX_0, encode::sequence((
            3u8.encode(),
            DigestAlgorithm::default().encode_set(),
            encode::sequence((
                content_type.encode(),
                encode::sequence_as(Tag::CTX_0,
                    OctetString::encode_slice(content.as_ref())
                ),
            )),
            encode::sequence_as(Tag::CTX_0, &cert),
            encode::set(encode::sequence((
                3u8.encode(),
                sid.encode_as(Tag::CTX_0),
                DigestAlgorithm::default().encode(),
                encode::sequence_as(Tag::CTX_0, signed_attrs),
                signature.algorithm().cms_encode(),
                OctetString::encode_slice(signature.value().as_ref()),
            ))),
        ))),
    )).to_captured(Mode::Der).into_bytes();
    Ok(res)
}


//============ Tests =========================================================
