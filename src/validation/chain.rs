//! Validating certificates against their issuer.
//!
//! The [`ParentChildValidator`] performs all checks that need both a
//! certificate and the certificate of its issuer: the signature, validity,
//! name and key identifier continuity, key usage, revocation, and resource
//! containment. The checks that only need the certificate itself are done
//! when parsing it.

use log::{info, warn};
use crate::repository::cert::KeyUsage;
use crate::repository::crl::Crl;
use crate::repository::rescert::{Certificate, ResourceCert};
use crate::repository::sigobj::{SignedObject, SignedObjectContent};
use crate::repository::x509::Time;
use crate::resources::ResourceSet;
use crate::uri;
use super::checks::*;
use super::context::ValidationContext;
use super::options::{Overclaim, ValidationOptions};
use super::result::{ValidationLocation, ValidationResult};


//------------ CrlLocator ----------------------------------------------------

/// A type that can find the CRL for a certificate.
///
/// Implementations are provided by whatever keeps the repository content.
/// Problems finding or validating the CRL should be recorded in `result`
/// rather than being returned.
pub trait CrlLocator {
    fn get_crl(
        &self,
        uri: &uri::Rsync,
        context: &ValidationContext,
        result: &mut ValidationResult,
    ) -> Option<Crl>;
}


//------------ Revocation ----------------------------------------------------

/// The revocation status of a certificate determined during validation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Revocation {
    /// The certificate is not on its issuer’s CRL.
    NotRevoked,

    /// The certificate is on its issuer’s CRL.
    Revoked,

    /// There was no usable CRL to check.
    Unknown,
}

impl Revocation {
    pub fn is_revoked(self) -> bool {
        matches!(self, Revocation::Revoked)
    }
}


//------------ ParentChildValidator ------------------------------------------

/// Validates certificates against an issuing certificate.
///
/// All checks are independent of each other and are recorded for the
/// location of the certificate. Whether the certificate is acceptable is
/// determined by the absence of errors for that location.
#[derive(Clone, Debug)]
pub struct ParentChildValidator<'a> {
    options: &'a ValidationOptions,
    issuer: &'a ResourceCert,

    /// The effective resources of the issuer.
    resources: &'a ResourceSet,

    /// The CRL of the issuer.
    ///
    /// This can only be missing for a self-signed certificate.
    crl: Option<&'a Crl>,

    now: Time,
}

impl<'a> ParentChildValidator<'a> {
    pub fn new(
        options: &'a ValidationOptions,
        issuer: &'a ResourceCert,
        resources: &'a ResourceSet,
        crl: Option<&'a Crl>,
    ) -> Self {
        ParentChildValidator {
            options, issuer, resources, crl,
            now: Time::now(),
        }
    }

    /// Changes the time used for checking validity.
    pub fn at(mut self, now: Time) -> Self {
        self.now = now;
        self
    }

    /// Validates `cert` found at `location`.
    ///
    /// Returns the revocation status of the certificate. Under the lenient
    /// overclaim policy, the excess resources are only warned about and
    /// have to be removed by the caller, which
    /// [`ValidationContext::create_child_context`] does.
    pub fn validate(
        &self,
        location: impl Into<ValidationLocation>,
        cert: &Certificate,
        result: &mut ValidationResult,
    ) -> Revocation {
        result.set_location(location);
        self.verify_signature(cert, result);
        self.verify_validity(cert, result);
        let revocation = self.verify_crl(cert, result);
        self.verify_issuer(cert, result);
        self.verify_key_usage(cert, result);
        self.verify_authority_key_identifier(cert, result);
        self.verify_resources(cert, result);
        revocation
    }

    fn verify_signature(
        &self, cert: &Certificate, result: &mut ValidationResult
    ) {
        result.reject_if_false(self.issuer.is_ca(), ISSUER_IS_CA, &[]);
        match cert.cert().verify_signature(self.issuer.public_key()) {
            Ok(()) => result.pass(SIGNATURE_VALID, &[]),
            Err(err) => result.error(SIGNATURE_VALID, &[&err]),
        }
    }

    /// Checks the validity period.
    ///
    /// There is no grace period here. Those only apply to CRLs and
    /// manifests.
    fn verify_validity(
        &self, cert: &Certificate, result: &mut ValidationResult
    ) {
        let validity = cert.cert().validity();
        result.reject_if_true(
            self.now < validity.not_before(), NOT_VALID_BEFORE,
            &[&validity.not_before()]
        );
        result.reject_if_true(
            self.now > validity.not_after(), NOT_VALID_AFTER,
            &[&validity.not_after()]
        );
    }

    fn verify_crl(
        &self, cert: &Certificate, result: &mut ValidationResult
    ) -> Revocation {
        // A self-signed certificate has no CRL to be on.
        if cert.cert().is_root() {
            return Revocation::NotRevoked
        }
        let crl = match self.crl {
            Some(crl) => crl,
            None => {
                result.error(CRL_REQUIRED, &[]);
                return Revocation::Unknown
            }
        };
        let signed = match crl.verify_signature(self.issuer.public_key()) {
            Ok(()) => {
                result.pass(CRL_SIGNATURE_VALID, &[]);
                true
            }
            Err(err) => {
                result.error(CRL_SIGNATURE_VALID, &[&err]);
                false
            }
        };
        let serial = cert.cert().serial_number();
        if !result.reject_if_true(
            crl.contains(serial), CERT_NOT_REVOKED, &[&serial]
        ) {
            info!(
                "{}: certificate with serial {} is revoked",
                result.current_location(), serial
            );
        }
        if !signed {
            Revocation::Unknown
        }
        else if crl.contains(serial) {
            Revocation::Revoked
        }
        else {
            Revocation::NotRevoked
        }
    }

    fn verify_issuer(
        &self, cert: &Certificate, result: &mut ValidationResult
    ) {
        result.reject_if_false(
            self.issuer.subject() == cert.cert().issuer(),
            PREV_SUBJECT_EQ_ISSUER, &[]
        );
    }

    fn verify_key_usage(
        &self, cert: &Certificate, result: &mut ValidationResult
    ) {
        let key_usage = match cert.cert().key_usage() {
            Some(key_usage) => {
                result.pass(KEY_USAGE_EXT_PRESENT, &[]);
                key_usage
            }
            None => {
                result.error(KEY_USAGE_EXT_PRESENT, &[]);
                return
            }
        };
        let (required, expected) = if cert.cert().is_ca() {
            (
                result.reject_if_false(
                    key_usage.key_cert_sign(), KEY_CERT_SIGN, &[]
                ) & result.reject_if_false(
                    key_usage.crl_sign(), CRL_SIGN, &[]
                ),
                KeyUsage::CA
            )
        }
        else {
            (
                result.reject_if_false(
                    key_usage.digital_signature(), DIG_SIGN, &[]
                ),
                KeyUsage::EE
            )
        };
        // Only report surplus bits if the required ones are there.
        if required {
            result.reject_if_false(
                key_usage == expected, KEY_USAGE_VALUE, &[]
            );
        }
    }

    fn verify_authority_key_identifier(
        &self, cert: &Certificate, result: &mut ValidationResult
    ) {
        // A self-signed certificate needn’t have an AKI.
        if cert.cert().is_root() {
            return
        }
        let ski = self.issuer.subject_key_identifier();
        let aki = cert.cert().authority_key_identifier();
        if !result.reject_if_none(ski.as_ref(), SKI_PRESENT, &[])
            || !result.reject_if_none(aki.as_ref(), AKI_PRESENT, &[])
        {
            return
        }
        result.reject_if_false(ski == aki, PREV_SKI_EQ_AKI, &[]);
    }

    fn verify_resources(
        &self, cert: &Certificate, result: &mut ValidationResult
    ) {
        let claimed = match *cert {
            Certificate::Resource(ref cert) => {
                if cert.is_root() && !result.reject_if_false(
                    cert.inherited_types().is_empty(),
                    ROOT_INHERITS_RESOURCES, &[]
                ) {
                    return
                }
                cert.derive_resources(self.resources)
            }
            Certificate::Router(ref cert) => {
                ResourceSet::new(
                    cert.as_resources().clone(),
                    Default::default(), Default::default()
                )
            }
        };
        let excess = claimed.difference(self.resources);
        if excess.is_empty() {
            result.pass(RESOURCE_RANGE, &[]);
            return
        }
        match self.options.overclaim() {
            Overclaim::Reject => result.error(RESOURCE_RANGE, &[&excess]),
            Overclaim::Warn => {
                warn!(
                    "{}: certificate overclaims resources {}",
                    result.current_location(), excess
                );
                result.warn(RESOURCE_RANGE, &[&excess])
            }
        }
    }
}


//------------ Convenience Functions -----------------------------------------

/// Validates a trust anchor certificate against itself.
///
/// Returns whether the certificate passed all checks.
pub fn validate_root(
    options: &ValidationOptions,
    location: impl Into<ValidationLocation>,
    cert: &ResourceCert,
    result: &mut ValidationResult,
) -> bool {
    let location = location.into();
    ParentChildValidator::new(
        options, cert, cert.resources(), None
    ).validate(location.clone(), &Certificate::from(cert.clone()), result);
    !result.has_failure_for_location(&location)
}

/// Validates a certificate issued under `context`.
///
/// The CRL is located via the certificate’s CRL distribution point. If
/// there is none or the locator can’t find it, the `CRL_REQUIRED` check
/// fails.
pub fn validate_child<L: CrlLocator>(
    options: &ValidationOptions,
    context: &ValidationContext,
    locator: &L,
    location: impl Into<ValidationLocation>,
    cert: &Certificate,
    result: &mut ValidationResult,
) -> Revocation {
    let location = location.into();
    let crl = locate_crl(context, locator, &location, cert, result);
    let resources = context.resources();
    ParentChildValidator::new(
        options, context.cert(), &resources, crl.as_ref()
    ).validate(location, cert, result)
}

/// Validates the EE certificate of a signed object issued under `context`.
///
/// The object itself has already been checked when it was parsed.
pub fn validate_signed_object<C: SignedObjectContent, L: CrlLocator>(
    options: &ValidationOptions,
    context: &ValidationContext,
    locator: &L,
    location: impl Into<ValidationLocation>,
    object: &SignedObject<C>,
    result: &mut ValidationResult,
) -> Revocation {
    validate_child(
        options, context, locator, location,
        &Certificate::from(object.cert().clone()), result
    )
}

fn locate_crl<L: CrlLocator>(
    context: &ValidationContext,
    locator: &L,
    location: &ValidationLocation,
    cert: &Certificate,
    result: &mut ValidationResult,
) -> Option<Crl> {
    let uri = cert.cert().crl_uri()?;
    let crl = locator.get_crl(&uri, context, result);
    // The locator may have moved the current location.
    result.set_location(location.clone());
    crl
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use bcder::BitString;
    use crate::crypto::Signer;
    use crate::oid;
    use crate::repository::cert::Cert;
    use crate::repository::crl::CrlBuilder;
    use crate::repository::test::cert::{DerData, TbsBuilder};
    use crate::repository::test::{
        ca_builder, ee_builder, ta_builder, DummySigner,
    };
    use crate::resources::ResourceExtension;
    use crate::validation::ValidationStatus;
    use chrono::Duration;
    use super::*;

    fn status(result: &ValidationResult, key: &str) -> ValidationStatus {
        result.result_for_current_location(key).unwrap().status()
    }

    #[test]
    fn missing_crl() {
        let signer = DummySigner;
        let issuer = ca_builder(&signer)
            .with_resources("AS64496".parse().unwrap())
            .build(&signer, &()).unwrap().into_resource_cert().unwrap();
        let ee = ee_builder(&signer)
            .with_inherit_all()
            .build(&signer, &()).unwrap();
        let resources = issuer.resources().clone();
        let options = ValidationOptions::default();
        let mut result = ValidationResult::with_location("test");
        let revocation = ParentChildValidator::new(
            &options, &issuer, &resources, None
        ).validate("ee.cer", &ee, &mut result);
        assert_eq!(revocation, Revocation::Unknown);
        assert_eq!(status(&result, CRL_REQUIRED), ValidationStatus::Error);
        // Dummy signatures never verify.
        assert_eq!(status(&result, SIGNATURE_VALID), ValidationStatus::Error);
        assert_eq!(status(&result, RESOURCE_RANGE), ValidationStatus::Passed);
        assert_eq!(status(&result, DIG_SIGN), ValidationStatus::Passed);
        assert_eq!(result.current_location().as_str(), "ee.cer");
    }

    #[test]
    fn surplus_key_usage() {
        let signer = DummySigner;
        let issuer = ca_builder(&signer)
            .with_resources("AS0-AS4294967295".parse().unwrap())
            .build(&signer, &()).unwrap().into_resource_cert().unwrap();
        // keyCertSign and cRLSign plus digitalSignature.
        let cert = Cert::decode(
            TbsBuilder::ca().extension(
                &oid::CE_KEY_USAGE, true,
                DerData::encode(BitString::encode_slice([0x86u8], 1))
            ).sign()
        ).unwrap();
        let resources = ResourceExtension::decode(
            cert.ip_resources(), cert.as_resources()
        ).unwrap();
        let cert = Certificate::from(ResourceCert::new(cert, resources));
        assert!(cert.cert().is_ca());

        let options = ValidationOptions::default();
        let mut result = ValidationResult::with_location("test");
        ParentChildValidator::new(
            &options, &issuer, issuer.resources(), None
        ).validate("ca.cer", &cert, &mut result);
        assert_eq!(status(&result, KEY_CERT_SIGN), ValidationStatus::Passed);
        assert_eq!(status(&result, CRL_SIGN), ValidationStatus::Passed);
        assert_eq!(status(&result, KEY_USAGE_VALUE), ValidationStatus::Error);
    }

    #[test]
    fn root_skips_crl() {
        let signer = DummySigner;
        let ta = ta_builder(signer.get_key_info(&()).unwrap())
            .with_resources("AS64496".parse().unwrap())
            .build(&signer, &()).unwrap().into_resource_cert().unwrap();
        assert!(ta.cert().is_root());
        let now = Time::now();
        let crl = CrlBuilder::new(
            ta.subject().clone(), now - Duration::hours(1),
            now + Duration::hours(1), 1u64.into()
        ).with_revoked(ta.serial_number(), now).build(&signer, &()).unwrap();

        let options = ValidationOptions::default();
        let mut result = ValidationResult::with_location("test");
        let revocation = ParentChildValidator::new(
            &options, &ta, ta.resources(), Some(&crl)
        ).validate("ta.cer", &ta.clone().into(), &mut result);
        assert_eq!(revocation, Revocation::NotRevoked);
        for key in &[CRL_REQUIRED, CRL_SIGNATURE_VALID, CERT_NOT_REVOKED] {
            assert!(result.result_for_current_location(key).is_none());
        }
    }

    #[test]
    fn overclaim_policy() {
        let signer = DummySigner;
        let issuer = ca_builder(&signer)
            .with_resources("AS64496, 192.0.2.0/24".parse().unwrap())
            .build(&signer, &()).unwrap().into_resource_cert().unwrap();
        let child = ca_builder(&signer)
            .with_resources("AS64496, 192.0.2.0/23".parse().unwrap())
            .build(&signer, &()).unwrap();
        let resources = issuer.resources().clone();

        for (options, expected) in [
            (ValidationOptions::strict(), ValidationStatus::Error),
            (ValidationOptions::lenient(), ValidationStatus::Warning),
        ].iter() {
            let mut result = ValidationResult::with_location("test");
            ParentChildValidator::new(
                options, &issuer, &resources, None
            ).validate("child.cer", &child, &mut result);
            let checks: Vec<_> = result.all_checks_for_current_location()
                .into_iter().filter(|check| check.key() == RESOURCE_RANGE)
                .collect();
            assert_eq!(checks.len(), 1);
            assert_eq!(checks[0].status(), *expected);
            assert_eq!(checks[0].params(), &["192.0.3.0/24".to_string()]);
        }
    }
}
