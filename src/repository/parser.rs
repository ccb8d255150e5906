//! Parsing and profile validation of certificates.
//!
//! A [`CertParser`] decodes a certificate and runs all the checks of the
//! RPKI certificate profile defined in [RFC 6487] for resource
//! certificates and [RFC 8209] for BGPsec router certificates. Every check
//! is recorded in a [`ValidationResult`]. Checks that don’t depend on each
//! other are all run, so a single pass reports all problems of a
//! certificate.
//!
//! Which profile to use is determined from the certificate itself unless
//! one of the explicit constructors is used: a certificate with the BGPsec
//! router key purpose is a router certificate, everything else is a
//! resource certificate.
//!
//! [RFC 6487]: https://tools.ietf.org/html/rfc6487
//! [RFC 8209]: https://tools.ietf.org/html/rfc8209

use bcder::ConstOid;
use bytes::Bytes;
use log::debug;
use crate::oid;
use crate::crypto::PublicKeyFormat;
use crate::resources::{ResourceExtension, ResourceExtensionError};
use crate::validation::{ValidationLocation, ValidationResult};
use crate::validation::checks::*;
use super::cert::{AccessDescription, Cert, KeyUsage};
use super::error::IllegalState;
use super::rescert::{Certificate, ResourceCert, RouterCert};


//------------ Profile -------------------------------------------------------

/// The certificate profile to validate against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Profile {
    /// Resource certificates for CAs and signed objects.
    Resource,

    /// BGPsec router certificates.
    Router,
}

impl Profile {
    /// Returns the profile for a certificate.
    pub fn for_cert(cert: &Cert) -> Self {
        if cert.is_router() {
            Profile::Router
        }
        else {
            Profile::Resource
        }
    }
}


//------------ CertParser ----------------------------------------------------

/// A parser for certificates.
///
/// The parser owns the validation result it records its checks into. The
/// certificate can only be retrieved if none of the checks failed.
#[derive(Clone, Debug)]
pub struct CertParser {
    result: ValidationResult,
    certificate: Option<Certificate>,
}

impl CertParser {
    /// Parses a certificate choosing the profile from its content.
    pub fn parse(
        location: impl Into<ValidationLocation>,
        bytes: Bytes,
    ) -> Self {
        Self::parse_with_result(
            ValidationResult::with_location(location), bytes, None
        )
    }

    /// Parses a resource certificate.
    pub fn parse_resource_cert(
        location: impl Into<ValidationLocation>,
        bytes: Bytes,
    ) -> Self {
        Self::parse_with_result(
            ValidationResult::with_location(location), bytes,
            Some(Profile::Resource)
        )
    }

    /// Parses a router certificate.
    pub fn parse_router_cert(
        location: impl Into<ValidationLocation>,
        bytes: Bytes,
    ) -> Self {
        Self::parse_with_result(
            ValidationResult::with_location(location), bytes,
            Some(Profile::Router)
        )
    }

    /// Parses a certificate recording into an existing result.
    ///
    /// The checks are recorded for the result’s current location. If
    /// `profile` is `None`, it is determined from the certificate.
    pub fn parse_with_result(
        mut result: ValidationResult,
        bytes: Bytes,
        profile: Option<Profile>,
    ) -> Self {
        let certificate = match Cert::decode(bytes) {
            Ok(cert) => {
                result.pass(CERTIFICATE_PARSED, &[]);
                let profile = profile.unwrap_or_else(|| {
                    Profile::for_cert(&cert)
                });
                validate_cert(cert, profile, &mut result)
            }
            Err(err) => {
                debug!(
                    "{}: failed to decode certificate: {}",
                    result.current_location(), err
                );
                result.error(CERTIFICATE_PARSED, &[]);
                None
            }
        };
        CertParser { result, certificate }
    }

    pub fn validation_result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn into_validation_result(self) -> ValidationResult {
        self.result
    }

    /// Returns whether no check has failed.
    pub fn is_success(&self) -> bool {
        !self.result.has_failures()
    }

    /// Returns the validated certificate.
    ///
    /// Returns an error if any check has failed.
    pub fn certificate(&self) -> Result<Certificate, IllegalState> {
        if !self.is_success() {
            return Err(IllegalState::new("certificate"))
        }
        self.certificate.clone().ok_or_else(|| {
            IllegalState::new("certificate")
        })
    }

    /// Returns the validated certificate if it is a resource certificate.
    pub fn resource_certificate(&self) -> Result<ResourceCert, IllegalState> {
        self.certificate()?.into_resource_cert().ok_or_else(|| {
            IllegalState::new("resource certificate")
        })
    }

    /// Returns the validated certificate if it is a router certificate.
    pub fn router_certificate(&self) -> Result<RouterCert, IllegalState> {
        self.certificate()?.into_router_cert().ok_or_else(|| {
            IllegalState::new("router certificate")
        })
    }
}


//------------ Validation ----------------------------------------------------

/// Validates a decoded certificate against a profile.
///
/// All checks are recorded into `result` for its current location. Returns
/// the certificate if no check recorded for that location failed.
pub fn validate_cert(
    cert: Cert,
    profile: Profile,
    result: &mut ValidationResult,
) -> Option<Certificate> {
    let failed_before = result.failures_for_current_location().len();
    check_signature_algorithm(&cert, profile, result);
    check_public_key(&cert, profile, result);
    result.reject_if_none(
        cert.subject_key_identifier().as_ref(), SKI_PRESENT, &[]
    );
    check_critical_extensions(&cert, result);
    let resources = match profile {
        Profile::Resource => check_resource_cert(&cert, result),
        Profile::Router => check_router_cert(&cert, result),
    };
    if result.failures_for_current_location().len() > failed_before {
        return None
    }
    let resources = resources?;
    Some(match profile {
        Profile::Resource => ResourceCert::new(cert, resources).into(),
        Profile::Router => RouterCert::new(cert, resources).into(),
    })
}

fn check_signature_algorithm(
    cert: &Cert, profile: Profile, result: &mut ValidationResult
) {
    let algorithm = cert.signature_algorithm();
    let allowed = match profile {
        Profile::Resource => {
            *algorithm.oid() == oid::SHA256_WITH_RSA_ENCRYPTION
        }
        Profile::Router => algorithm.x509_signing_algorithm().is_some(),
    };
    result.reject_if_false(
        allowed && algorithm == cert.tbs_signature_algorithm(),
        CERTIFICATE_SIGNATURE_ALGORITHM, &[algorithm]
    );
}

fn check_public_key(
    cert: &Cert, profile: Profile, result: &mut ValidationResult
) {
    let key = cert.public_key();
    let allowed = match profile {
        Profile::Resource => key.allow_rpki_cert(),
        Profile::Router => key.allow_router_cert(),
    };
    result.reject_if_false(
        allowed, PUBLIC_KEY_CERT_ALGORITHM, &[&key.algorithm()]
    );
    if key.algorithm() == PublicKeyFormat::Rsa {
        let bits = key.rsa_modulus_bits().unwrap_or(0);
        result.warn_if_false(bits == 2048, PUBLIC_KEY_CERT_SIZE, &[&bits]);
    }
}

fn check_critical_extensions(cert: &Cert, result: &mut ValidationResult) {
    let unsupported: Vec<_> = cert.extensions().unsupported_critical().map(
        ToString::to_string
    ).collect();
    result.reject_if_false(
        unsupported.is_empty(), CRITICAL_EXT_SUPPORTED,
        &[&unsupported.join(", ")]
    );
}


//--- Resource Certificates

fn check_resource_cert(
    cert: &Cert, result: &mut ValidationResult
) -> Option<ResourceExtension> {
    result.warn_if_false(
        cert.issuer().is_rpki_conformant(), CERT_ISSUER_CORRECT,
        &[cert.issuer()]
    );
    result.warn_if_false(
        cert.subject().is_rpki_conformant(), CERT_SUBJECT_CORRECT,
        &[cert.subject()]
    );
    check_key_usage(cert, result);
    check_certificate_policies(cert, result);
    let resources = check_resource_extensions(cert, result);
    check_crl_distribution_points(cert, result);
    check_subject_info_access(cert, result);
    resources
}

fn check_key_usage(cert: &Cert, result: &mut ValidationResult) {
    let key_usage = match cert.key_usage() {
        Some(key_usage) => key_usage,
        None => {
            result.error(KEY_USAGE_EXT_PRESENT, &[]);
            return
        }
    };
    result.reject_if_false(
        cert.extensions().is_critical(&oid::CE_KEY_USAGE),
        KEY_USAGE_EXT_PRESENT, &[]
    );
    if key_usage.is_empty() {
        result.warn(KEY_USAGE_VALUE, &[]);
        return
    }
    let expected = if cert.is_ca() { KeyUsage::CA } else { KeyUsage::EE };
    result.reject_if_false(key_usage == expected, KEY_USAGE_VALUE, &[]);
}

fn check_certificate_policies(cert: &Cert, result: &mut ValidationResult) {
    if !result.reject_if_false(
        cert.extensions().critical().next().is_some(),
        CRITICAL_EXT_PRESENT, &[]
    ) {
        return
    }
    result.reject_if_false(
        cert.extensions().is_critical(&oid::CE_CERTIFICATE_POLICIES),
        POLICY_EXT_CRITICAL, &[]
    );
    let policies = match cert.certificate_policies() {
        Some(Ok(policies)) => {
            result.pass(POLICY_EXT_VALUE, &[]);
            result.pass(POLICY_VALIDATION, &[]);
            policies
        }
        Some(Err(err)) => {
            result.pass(POLICY_EXT_VALUE, &[]);
            result.error(POLICY_VALIDATION, &[&err]);
            return
        }
        None => {
            result.error(POLICY_EXT_VALUE, &[]);
            return
        }
    };
    if !result.reject_if_false(
        policies.policies().len() == 1, SINGLE_CERT_POLICY, &[]
    ) {
        return
    }
    let policy = &policies.policies()[0];
    result.pass(POLICY_ID_PRESENT, &[]);
    result.reject_if_false(
        *policy.id() == oid::CP_IPADDR_ASNUMBER, POLICY_ID_VERSION,
        &[policy.id()]
    );
    let qualifiers = policy.qualifiers();
    result.warn_if_false(
        qualifiers.len() <= 1 && qualifiers.iter().all(|id| *id == oid::QT_CPS),
        POLICY_QUALIFIER, &[]
    );
}

fn check_resource_extensions(
    cert: &Cert, result: &mut ValidationResult
) -> Option<ResourceExtension> {
    let ip = cert.ip_resources();
    let asn = cert.as_resources();
    if !result.reject_if_false(
        ip.is_some() || asn.is_some(), RESOURCE_EXT_PRESENT, &[]
    ) {
        return None
    }
    let extensions = cert.extensions();
    result.reject_if_false(
        (ip.is_none() || extensions.is_critical(&oid::PE_IP_ADDR_BLOCK))
        && (
            asn.is_none()
            || extensions.is_critical(&oid::PE_AUTONOMOUS_SYS_IDS)
        ),
        RESOURCE_EXT_CRITICAL, &[]
    );
    decode_resources(ip, asn, result)
}

fn decode_resources(
    ip: Option<&[u8]>,
    asn: Option<&[u8]>,
    result: &mut ValidationResult,
) -> Option<ResourceExtension> {
    match ResourceExtension::decode(ip, asn) {
        Ok(resources) => {
            result.pass(RESOURCE_EXT_VALID, &[]);
            result.pass(AS_OR_IP_RESOURCE_PRESENT, &[]);
            Some(resources)
        }
        Err(ResourceExtensionError::Empty) => {
            result.pass(RESOURCE_EXT_VALID, &[]);
            result.error(AS_OR_IP_RESOURCE_PRESENT, &[]);
            None
        }
        Err(err) => {
            result.error(RESOURCE_EXT_VALID, &[&err]);
            None
        }
    }
}

fn check_crl_distribution_points(cert: &Cert, result: &mut ValidationResult) {
    let points = cert.crl_distribution_points();
    if cert.is_self_signed() {
        result.warn_if_some(points.as_ref(), CRLDP_OMITTED, &[]);
        return
    }
    let points = match points {
        Some(Ok(points)) => {
            result.pass(CRLDP_PRESENT, &[]);
            points
        }
        Some(Err(err)) => {
            result.pass(CRLDP_PRESENT, &[]);
            result.error(CRLDP_EXTENSION_PARSED, &[&err]);
            return
        }
        None => {
            result.error(CRLDP_PRESENT, &[]);
            return
        }
    };
    if !result.reject_if_false(
        points.points().len() == 1, CRLDP_EXTENSION_PARSED, &[]
    ) {
        return
    }
    let point = &points.points()[0];
    result.reject_if_false(!point.has_crl_issuer(), CRLDP_ISSUER_OMITTED, &[]);
    result.reject_if_false(!point.has_reasons(), CRLDP_REASONS_OMITTED, &[]);
    let names = match point.full_name() {
        Some(names) => {
            result.pass(CRLDP_TYPE_FULL_NAME, &[]);
            names
        }
        None => {
            result.error(CRLDP_TYPE_FULL_NAME, &[]);
            return
        }
    };
    let uri = match names {
        [Some(uri)] => {
            result.pass(CRLDP_NAME_IS_A_URI, &[]);
            uri
        }
        _ => {
            result.error(CRLDP_NAME_IS_A_URI, &[]);
            return
        }
    };
    result.reject_if_false(uri.is_rsync(), CRLDP_RSYNC_URI_PRESENT, &[uri]);
}

fn check_subject_info_access(cert: &Cert, result: &mut ValidationResult) {
    let sia = match cert.subject_info_access() {
        Some(sia) => {
            result.pass(SIA_PRESENT, &[]);
            sia
        }
        None => {
            result.error(SIA_PRESENT, &[]);
            return
        }
    };
    result.reject_if_true(
        cert.extensions().is_critical(&oid::PE_SUBJECT_INFO_ACCESS),
        SIA_NOT_CRITICAL, &[]
    );
    if cert.is_ca() {
        result.reject_if_false(
            has_rsync(sia, &oid::AD_CA_REPOSITORY),
            SIA_CA_REPOSITORY_URI_PRESENT, &[]
        );
        result.reject_if_false(
            has_rsync(sia, &oid::AD_RPKI_MANIFEST),
            SIA_MANIFEST_URI_PRESENT, &[]
        );
        let mut notify = sia.iter().filter(|ad| {
            *ad.method() == oid::AD_RPKI_NOTIFY
        }).peekable();
        if notify.peek().is_some() {
            let https = notify.all(|ad| {
                ad.location().map(|uri| uri.is_https()).unwrap_or(false)
            });
            result.reject_if_false(https, SIA_RRDP_NOTIFY_URI_HTTPS, &[]);
        }
    }
    else {
        let signed_objects = sia.iter().filter(|ad| {
            *ad.method() == oid::AD_SIGNED_OBJECT
                && ad.location().map(|uri| uri.is_rsync()).unwrap_or(false)
        }).count();
        result.reject_if_false(
            signed_objects == 1, SIA_SIGNED_OBJECT_URI_PRESENT, &[]
        );
        let unknown: Vec<_> = sia.iter().filter(|ad| {
            *ad.method() != oid::AD_SIGNED_OBJECT
        }).map(|ad| ad.method().to_string()).collect();
        result.reject_if_false(
            unknown.is_empty(), SIA_ACCESS_METHODS_KNOWN,
            &[&unknown.join(", ")]
        );
    }
}

fn has_rsync(sia: &[AccessDescription], method: &ConstOid) -> bool {
    sia.iter().any(|ad| {
        *ad.method() == *method
            && ad.location().map(|uri| uri.is_rsync()).unwrap_or(false)
    })
}


//--- Router Certificates

fn check_router_cert(
    cert: &Cert, result: &mut ValidationResult
) -> Option<ResourceExtension> {
    if result.reject_if_false(cert.is_router(), BGPSEC_EXT_PRESENT, &[]) {
        result.reject_if_true(
            cert.extensions().is_critical(&oid::CE_EXTENDED_KEY_USAGE),
            BGPSEC_EXT_NOT_CRITICAL, &[]
        );
    }
    result.reject_if_some(
        cert.subject_info_access().as_ref(), CERT_SIA_IS_PRESENT, &[]
    );
    result.reject_if_some(
        cert.ip_resources().as_ref(), IP_RESOURCE_PRESENT, &[]
    );
    let asn = cert.as_resources();
    if !result.reject_if_none(asn.as_ref(), AS_RESOURCE_PRESENT, &[]) {
        return None
    }
    result.reject_if_false(
        cert.extensions().is_critical(&oid::PE_AUTONOMOUS_SYS_IDS),
        RESOURCE_EXT_CRITICAL, &[]
    );
    decode_resources(None, asn, result)
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::validation::ValidationStatus;

    #[test]
    fn garbage_reports_only_parse_failure() {
        let parser = CertParser::parse(
            "garbage.cer", Bytes::from_static(&[0x01, 0x03, 0x23])
        );
        assert!(!parser.is_success());
        let result = parser.validation_result();
        let checks = result.all_checks_for_location(
            &ValidationLocation::new("garbage.cer")
        );
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].key(), CERTIFICATE_PARSED);
        assert_eq!(checks[0].status(), ValidationStatus::Error);
        assert!(parser.certificate().is_err());
    }
}
