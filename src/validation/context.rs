//! The context for validating objects issued by a CA.

use crate::crypto::KeyIdentifier;
use crate::repository::rescert::ResourceCert;
use crate::resources::ResourceSet;
use crate::uri;
use super::result::ValidationLocation;


//------------ ValidationContext ---------------------------------------------

/// Everything needed to validate objects issued by a CA certificate.
///
/// The context holds the issuing certificate, where it was found, and its
/// effective resources. When descending into a child CA, a new context is
/// created via [`create_child_context`][Self::create_child_context] which
/// resolves inherited resources against the resources of this context.
///
/// Resources that the certificate claims but its issuer doesn’t have are
/// kept as the overclaiming set. They are removed from the effective
/// resources.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationContext {
    /// The location of the certificate.
    location: ValidationLocation,

    cert: ResourceCert,

    /// The resources of the certificate with inheritance resolved.
    resources: ResourceSet,

    /// Resources claimed without being held by the issuer.
    overclaiming: ResourceSet,

    /// The subject names from the trust anchor down to the certificate.
    subject_chain: Vec<String>,
}

impl ValidationContext {
    /// Creates the context for a trust anchor certificate.
    ///
    /// A trust anchor can’t inherit anything, so its effective resources
    /// are exactly the resources it states.
    pub fn new_root(
        location: impl Into<ValidationLocation>, cert: ResourceCert
    ) -> Self {
        ValidationContext {
            location: location.into(),
            resources: cert.resources().clone(),
            overclaiming: ResourceSet::empty(),
            subject_chain: vec![cert.subject().to_string()],
            cert,
        }
    }

    /// Creates the context for a CA certificate issued under this context.
    ///
    /// Inherited resource types are taken from the effective resources of
    /// this context. Anything the child claims beyond those becomes its
    /// overclaiming set.
    pub fn create_child_context(
        &self, location: impl Into<ValidationLocation>, cert: ResourceCert
    ) -> Self {
        let parent = self.resources();
        let resources = cert.derive_resources(&parent);
        let overclaiming = resources.difference(&parent);
        let mut subject_chain = self.subject_chain.clone();
        subject_chain.push(cert.subject().to_string());
        ValidationContext {
            location: location.into(),
            cert, resources, overclaiming, subject_chain,
        }
    }

    pub fn location(&self) -> &ValidationLocation {
        &self.location
    }

    pub fn cert(&self) -> &ResourceCert {
        &self.cert
    }

    /// Returns the effective resources.
    pub fn resources(&self) -> ResourceSet {
        self.resources.difference(&self.overclaiming)
    }

    /// Returns the resources removed because of overclaiming.
    pub fn overclaiming(&self) -> &ResourceSet {
        &self.overclaiming
    }

    /// Removes additional resources from the effective resources.
    pub fn add_overclaiming(&mut self, resources: &ResourceSet) {
        self.overclaiming = self.overclaiming.union(resources);
    }

    pub fn subject_chain(&self) -> &[String] {
        &self.subject_chain
    }

    pub fn subject_key_identifier(&self) -> Option<KeyIdentifier> {
        self.cert.subject_key_identifier()
    }

    pub fn manifest_uri(&self) -> Option<uri::Rsync> {
        self.cert.rpki_manifest()
    }

    pub fn repository_uri(&self) -> Option<uri::Rsync> {
        self.cert.ca_repository()
    }

    pub fn rpki_notify_uri(&self) -> Option<uri::Https> {
        self.cert.rpki_notify()
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use crate::repository::test::{ca_builder, DummySigner};
    use crate::resources::ResourceType;
    use super::*;

    fn cert(builder: crate::repository::builder::CertBuilder) -> ResourceCert {
        builder.build(&DummySigner, &()).unwrap().into_resource_cert().unwrap()
    }

    #[test]
    fn inheritance_two_levels_deep() {
        let signer = DummySigner;
        let root = cert(ca_builder(&signer).with_resources(
            "AS64496-AS64511, 192.0.2.0/24, 2001:db8::/32".parse().unwrap()
        ));
        let child = cert(
            ca_builder(&signer)
                .with_resources(
                    "AS64496-AS64500, 192.0.2.0/25".parse().unwrap()
                )
                .with_inherited(ResourceType::Ipv6)
        );
        let grandchild = cert(ca_builder(&signer).with_inherit_all());

        let root = ValidationContext::new_root("root.cer", root);
        let child = root.create_child_context("child.cer", child);
        assert_eq!(
            child.resources(),
            "AS64496-AS64500, 192.0.2.0/25, 2001:db8::/32".parse().unwrap()
        );
        let grandchild = child.create_child_context("grand.cer", grandchild);
        assert_eq!(grandchild.resources(), child.resources());
        assert_eq!(grandchild.subject_chain().len(), 3);
        assert!(grandchild.overclaiming().is_empty());
        assert_eq!(grandchild.location().as_str(), "grand.cer");
    }

    #[test]
    fn single_ipv6_address() {
        let signer = DummySigner;
        let root = cert(ca_builder(&signer).with_resources(
            "AS64496, 2001:db8::1/128".parse().unwrap()
        ));
        let child = cert(ca_builder(&signer).with_inherit_all());
        let root = ValidationContext::new_root("root.cer", root);
        assert_eq!(
            root.resources(),
            "AS64496, 2001:db8::1/128".parse().unwrap()
        );
        let child = root.create_child_context("child.cer", child);
        assert_eq!(child.resources(), root.resources());
        assert!(child.overclaiming().is_empty());
    }

    #[test]
    fn overclaiming_is_removed() {
        let signer = DummySigner;
        let root = cert(ca_builder(&signer).with_resources(
            "AS64496, 192.0.2.0/24".parse().unwrap()
        ));
        let child = cert(ca_builder(&signer).with_resources(
            "AS64496, 192.0.2.0/23".parse().unwrap()
        ));
        let root = ValidationContext::new_root("root.cer", root);
        let mut child = root.create_child_context("child.cer", child);
        assert_eq!(
            child.overclaiming(),
            &"192.0.3.0/24".parse::<ResourceSet>().unwrap()
        );
        assert_eq!(
            child.resources(),
            "AS64496, 192.0.2.0/24".parse().unwrap()
        );

        child.add_overclaiming(&"AS64496".parse().unwrap());
        assert_eq!(child.resources(), "192.0.2.0/24".parse().unwrap());
    }
}
