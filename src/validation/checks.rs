//! The keys of all validation checks.
//!
//! Each check recorded in a [`ValidationResult`] carries one of these keys.
//! Downstream tools use the keys to look up messages, so their values must
//! never change.
//!
//! [`ValidationResult`]: super::ValidationResult


//------------ Certificate Chains --------------------------------------------

pub const ISSUER_IS_CA: &str = "cert.issuer.is.ca";
pub const SIGNATURE_VALID: &str = "cert.signature";
pub const NOT_VALID_BEFORE: &str = "cert.not.valid.before";
pub const NOT_VALID_AFTER: &str = "cert.not.valid.after";

/// The resources of a certificate are covered by its issuer.
///
/// The parameter of a failed check is the set of excess resources.
pub const RESOURCE_RANGE: &str = "cert.resource.range.is.valid";

pub const ROOT_INHERITS_RESOURCES: &str = "cert.root.resource.uses.inherit";
pub const PREV_SUBJECT_EQ_ISSUER: &str = "cert.issuer.eq.prev.subject";
pub const KEY_USAGE_EXT_PRESENT: &str = "cert.key.usage.extension.present";
pub const KEY_CERT_SIGN: &str = "cert.key.cert.sign";
pub const CRL_SIGN: &str = "cert.crl.sign";
pub const DIG_SIGN: &str = "cert.dig.sign";
pub const AKI_PRESENT: &str = "cert.aki.present";
pub const PREV_SKI_EQ_AKI: &str = "cert.aki.eq.prev.ski";
pub const CERT_NOT_REVOKED: &str = "cert.not.revoked";


//------------ Certificates --------------------------------------------------

pub const CERTIFICATE_PARSED: &str = "cert.parsed";
pub const CERTIFICATE_SIGNATURE_ALGORITHM: &str = "cert.signature.algorithm";
pub const PUBLIC_KEY_CERT_ALGORITHM: &str = "cert.public.key.algorithm";
pub const PUBLIC_KEY_CERT_SIZE: &str = "cert.public.key.size";
pub const SKI_PRESENT: &str = "cert.ski.present";
pub const CERT_ISSUER_CORRECT: &str = "cert.issuer.correct";
pub const CERT_SUBJECT_CORRECT: &str = "cert.subject.correct";
pub const CRITICAL_EXT_PRESENT: &str = "cert.critical.exts.present";
pub const CRITICAL_EXT_SUPPORTED: &str = "cert.critical.exts.supported";
pub const KEY_USAGE_VALUE: &str = "cert.key.usage.value";

pub const CRLDP_PRESENT: &str = "cert.crldp.present";
pub const CRLDP_OMITTED: &str = "cert.crldp.omitted";
pub const CRLDP_EXTENSION_PARSED: &str = "cert.crldp.ext.parsed";
pub const CRLDP_ISSUER_OMITTED: &str = "cert.crldp.issuer.omitted";
pub const CRLDP_REASONS_OMITTED: &str = "cert.crldp.reasons.omitted";
pub const CRLDP_TYPE_FULL_NAME: &str = "cert.crldp.type.full.name";
pub const CRLDP_NAME_IS_A_URI: &str = "cert.crldp.name.is.a.uri";
pub const CRLDP_RSYNC_URI_PRESENT: &str = "cert.crldp.rsync.uri.present";

pub const POLICY_EXT_CRITICAL: &str = "cert.policy.ext.critical";
pub const POLICY_EXT_VALUE: &str = "cert.policy.ext.value";
pub const SINGLE_CERT_POLICY: &str = "cert.single.cert.policy";
pub const POLICY_QUALIFIER: &str = "cert.policy.qualifier.present";
pub const POLICY_ID_PRESENT: &str = "cert.policy.id.present";
pub const POLICY_ID_VERSION: &str = "cert.policy.id.version";
pub const POLICY_VALIDATION: &str = "cert.policy.validation";

pub const RESOURCE_EXT_PRESENT: &str = "cert.resource.ext.present";
pub const RESOURCE_EXT_NOT_PRESENT: &str = "cert.resource.ext.not.present";
pub const RESOURCE_EXT_CRITICAL: &str = "cert.resource.ext.critical";
pub const RESOURCE_EXT_VALID: &str = "cert.resource.ext.valid";
pub const IP_RESOURCE_PRESENT: &str = "cert.ip.resource.present";
pub const AS_RESOURCE_PRESENT: &str = "cert.as.resource.present";
pub const AS_OR_IP_RESOURCE_PRESENT: &str = "cert.as.or.ip.resource.present";

pub const SIA_PRESENT: &str = "cert.sia.ext.present";
pub const SIA_NOT_CRITICAL: &str = "cert.sia.ext.not.critical";
pub const SIA_CA_REPOSITORY_URI_PRESENT: &str =
    "cert.sia.ca.repository.uri.present";
pub const SIA_MANIFEST_URI_PRESENT: &str = "cert.sia.manifest.uri.present";
pub const SIA_RRDP_NOTIFY_URI_HTTPS: &str = "cert.sia.rrdp.notify.uri.https";
pub const SIA_SIGNED_OBJECT_URI_PRESENT: &str =
    "cert.sia.signed.object.uri.present";
pub const SIA_ACCESS_METHODS_KNOWN: &str = "cert.sia.access.methods.known";
pub const CERT_SIA_IS_PRESENT: &str = "cert.sia.present";
pub const BGPSEC_EXT_PRESENT: &str = "cert.bgpsec.ext.present";
pub const BGPSEC_EXT_NOT_CRITICAL: &str = "cert.bgpsec.ext.not.critical";


//------------ CRLs ----------------------------------------------------------

pub const CRL_PARSED: &str = "crl.parsed";
pub const CRL_SIGNATURE_VALID: &str = "cert.crl.signature";
pub const CRL_REQUIRED: &str = "crl.required";
pub const CRL_NEXT_UPDATE_BEFORE_NOW: &str = "crl.next.update.before.now";
pub const CRL_AKI_MISMATCH: &str = "crl.aki.mismatch";


//------------ Signed Objects ------------------------------------------------

pub const CMS_DATA_PARSING: &str = "cms.signed.data.parsing";
pub const CMS_SIGNED_DATA_VERSION: &str = "cms.signed.data.version";
pub const CMS_SIGNED_DATA_DIGEST_ALGORITHM: &str =
    "cms.signed.data.digest.algorithm";
pub const CMS_CONTENT_TYPE: &str = "cms.content.type";
pub const DECODE_CONTENT: &str = "cms.decode.content";
pub const ONLY_ONE_SIGNED_OBJECT: &str = "cms.only.one.signed.object";
pub const GET_CERTS_AND_CRLS: &str = "cms.get.certs.and.crls";
pub const ONLY_ONE_EE_CERT_ALLOWED: &str = "cms.only.one.ee.cert";
pub const CERT_IS_X509CERT: &str = "cms.cert.is.x509";
pub const CERT_IS_EE_CERT: &str = "cms.cert.is.ee.cert";
pub const CERT_HAS_SKI: &str = "cms.cert.has.ski";
pub const CMS_NO_CRL_ALLOWED: &str = "cms.no.crl.allowed";
pub const GET_SIGNER_INFO: &str = "cms.signature.signer.info";
pub const ONLY_ONE_SIGNER: &str = "cms.signature.has.one.signer";
pub const CMS_SIGNER_INFO_VERSION: &str = "cms.signer.info.version";
pub const CMS_SIGNER_INFO_DIGEST_ALGORITHM: &str =
    "cms.signer.info.digest.algorithm";
pub const CMS_SIGNER_INFO_SKI: &str = "cms.signer.info.ski";
pub const ENCRYPTION_ALGORITHM: &str = "cms.encryption.algorithm";
pub const SIGNED_ATTRS_PRESENT: &str = "cms.signed.attrs.present";
pub const SIGNED_ATTRS_CORRECT: &str = "cms.signed.attrs.correct";
pub const CONTENT_TYPE_ATTR_PRESENT: &str = "cms.content.type.attr.present";
pub const CONTENT_TYPE_VALUE: &str = "cms.content.type.value";
pub const MSG_DIGEST_ATTR_PRESENT: &str = "cms.msg.digest.attr.present";
pub const SIGNING_TIME_MUST_EQUAL_BINARY_SIGNING_TIME: &str =
    "cms.signing.time.eq.binary.signing.time";
pub const SIGNER_ID_MATCH: &str = "cms.signer.id.match.cert";
pub const SIGNATURE_VERIFICATION: &str = "cms.signature";
pub const UNSIGNED_ATTRS_OMITTED: &str = "cms.unsigned.attrs.omitted";


//------------ ROAs ----------------------------------------------------------

pub const ROA_CONTENT_TYPE: &str = "roa.content.type";
pub const ROA_CONTENT_STRUCTURE: &str = "roa.content.structure";
pub const ROA_RESOURCES: &str = "roa.resources";
pub const ROA_PREFIX_LIST: &str = "roa.prefix.list.not.empty";
pub const PREFIX_LENGTH: &str = "roa.prefix.length";


//------------ Manifests -----------------------------------------------------

pub const MANIFEST_CONTENT_TYPE: &str = "mf.content.type";
pub const MANIFEST_CONTENT_STRUCTURE: &str = "mf.content.structure";
pub const MANIFEST_TIME_FORMAT: &str = "mf.time.format";
pub const MANIFEST_FILE_HASH_ALGORITHM: &str = "mf.file.hash.algorithm";
pub const MANIFEST_DECODE_FILELIST: &str = "mf.decode.filelist";
pub const MANIFEST_RESOURCE_INHERIT: &str = "mf.resource.inherit";
pub const MANIFEST_PAST_NEXT_UPDATE_TIME: &str = "mf.past.next.update";


//------------ ASPA ----------------------------------------------------------

pub const ASPA_CONTENT_TYPE: &str = "aspa.content.type";
pub const ASPA_CONTENT_STRUCTURE: &str = "aspa.content.structure";
pub const ASPA_VERSION: &str = "aspa.version";
pub const ASPA_CUSTOMER_ASN_CERTIFIED: &str = "aspa.customer.asn.certified";
pub const ASPA_CUSTOMER_ASN_NOT_IN_PROVIDER_ASNS: &str =
    "aspa.customer.asn.not.in.provider.asns";
pub const ASPA_PROVIDER_AS_SET_VALID: &str = "aspa.provider.as.set.valid";


//------------ Ghostbusters Records ------------------------------------------

pub const GHOSTBUSTERS_RECORD_CONTENT_TYPE: &str =
    "ghostbusters.record.content.type";
pub const GHOSTBUSTERS_RECORD_SINGLE_VCARD: &str =
    "ghostbusters.record.single.vcard";
pub const GHOSTBUSTERS_RECORD_VCARD_VERSION: &str =
    "ghostbusters.record.vcard.version";
pub const GHOSTBUSTERS_RECORD_FN_PRESENT: &str =
    "ghostbusters.record.fn.present";
pub const GHOSTBUSTERS_RECORD_ADR_TEL_OR_EMAIL_PRESENT: &str =
    "ghostbusters.record.adr.tel.or.email.present";
