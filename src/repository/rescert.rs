//! Validated certificates.
//!
//! The types in this module can only be created by the [parser] or the
//! [builders] and therefore represent certificates that have passed the
//! profile checks. Chain validation still needs to happen separately.
//!
//! [parser]: super::parser
//! [builders]: super::builder

use std::ops;
use bytes::Bytes;
use crate::resources::{
    AsBlocks, InheritedTypes, ResourceExtension, ResourceSet, ResourceType,
};
use super::cert::Cert;


//------------ Certificate ---------------------------------------------------

/// A certificate that has passed profile validation.
///
/// Resource certificates are used for CAs and for the EE certificates of
/// signed objects. Router certificates are EE certificates for BGPsec
/// routers and are recognised by the BGPsec router key purpose.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Certificate {
    Resource(ResourceCert),
    Router(RouterCert),
}

impl Certificate {
    pub fn cert(&self) -> &Cert {
        match *self {
            Certificate::Resource(ref cert) => cert.cert(),
            Certificate::Router(ref cert) => cert.cert(),
        }
    }

    /// Returns the resource extension of either variant.
    pub fn resource_extension(&self) -> &ResourceExtension {
        match *self {
            Certificate::Resource(ref cert) => cert.resource_extension(),
            Certificate::Router(ref cert) => cert.resource_extension(),
        }
    }

    pub fn is_router(&self) -> bool {
        matches!(*self, Certificate::Router(_))
    }

    pub fn as_resource_cert(&self) -> Option<&ResourceCert> {
        match *self {
            Certificate::Resource(ref cert) => Some(cert),
            Certificate::Router(_) => None,
        }
    }

    pub fn as_router_cert(&self) -> Option<&RouterCert> {
        match *self {
            Certificate::Resource(_) => None,
            Certificate::Router(ref cert) => Some(cert),
        }
    }

    pub fn into_resource_cert(self) -> Option<ResourceCert> {
        match self {
            Certificate::Resource(cert) => Some(cert),
            Certificate::Router(_) => None,
        }
    }

    pub fn into_router_cert(self) -> Option<RouterCert> {
        match self {
            Certificate::Resource(_) => None,
            Certificate::Router(cert) => Some(cert),
        }
    }
}

impl From<ResourceCert> for Certificate {
    fn from(cert: ResourceCert) -> Self {
        Certificate::Resource(cert)
    }
}

impl From<RouterCert> for Certificate {
    fn from(cert: RouterCert) -> Self {
        Certificate::Router(cert)
    }
}

impl ops::Deref for Certificate {
    type Target = Cert;

    fn deref(&self) -> &Cert {
        self.cert()
    }
}


//------------ ResourceCert --------------------------------------------------

/// A resource certificate.
///
/// This can be a trust anchor, a CA certificate, or the EE certificate of
/// a signed object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceCert {
    cert: Cert,
    resources: ResourceExtension,
}

impl ResourceCert {
    pub(crate) fn new(cert: Cert, resources: ResourceExtension) -> Self {
        ResourceCert { cert, resources }
    }

    pub fn cert(&self) -> &Cert {
        &self.cert
    }

    pub fn into_cert(self) -> Cert {
        self.cert
    }

    pub fn to_bytes(&self) -> Bytes {
        self.cert.to_bytes()
    }

    pub fn resource_extension(&self) -> &ResourceExtension {
        &self.resources
    }

    /// Returns the resources explicitly listed in the certificate.
    pub fn resources(&self) -> &ResourceSet {
        self.resources.resources()
    }

    pub fn inherited_types(&self) -> InheritedTypes {
        self.resources.inherited()
    }

    pub fn is_inherited(&self, resource_type: ResourceType) -> bool {
        self.resources.is_inherited(resource_type)
    }

    /// Returns whether any resource type is inherited.
    pub fn is_resource_set_inherited(&self) -> bool {
        !self.resources.inherited().is_empty()
    }

    /// Returns the effective resources given the issuer’s resources.
    pub fn derive_resources(&self, parent: &ResourceSet) -> ResourceSet {
        self.resources.derive_resources(parent)
    }

    /// Returns whether this is an EE certificate.
    pub fn is_ee(&self) -> bool {
        !self.cert.is_ca()
    }
}

impl ops::Deref for ResourceCert {
    type Target = Cert;

    fn deref(&self) -> &Cert {
        &self.cert
    }
}

impl AsRef<Cert> for ResourceCert {
    fn as_ref(&self) -> &Cert {
        &self.cert
    }
}


//------------ RouterCert ----------------------------------------------------

/// A BGPsec router certificate.
///
/// Router certificates only ever carry AS numbers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouterCert {
    cert: Cert,
    resources: ResourceExtension,
}

impl RouterCert {
    pub(crate) fn new(cert: Cert, resources: ResourceExtension) -> Self {
        RouterCert { cert, resources }
    }

    pub fn cert(&self) -> &Cert {
        &self.cert
    }

    pub fn into_cert(self) -> Cert {
        self.cert
    }

    pub fn to_bytes(&self) -> Bytes {
        self.cert.to_bytes()
    }

    pub fn resource_extension(&self) -> &ResourceExtension {
        &self.resources
    }

    /// Returns the AS numbers listed in the certificate.
    pub fn as_resources(&self) -> &AsBlocks {
        self.resources.resources().asn()
    }
}

impl ops::Deref for RouterCert {
    type Target = Cert;

    fn deref(&self) -> &Cert {
        &self.cert
    }
}

impl AsRef<Cert> for RouterCert {
    fn as_ref(&self) -> &Cert {
        &self.cert
    }
}
