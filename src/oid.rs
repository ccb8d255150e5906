//! The object identifiers used in this crate.
//!
//! All object identifiers appearing in certificates, CRLs and signed objects
//! are collected here as constants. They are grouped by what they identify
//! rather than by the document defining them.

use bcder::{ConstOid, Oid};


//------------ Algorithms ----------------------------------------------------

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `id-sha256`
///
/// Identifies the SHA-256 one-way hash function.
pub const SHA256: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 1]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `rsaEncryption`
///
/// Identifies an RSA public key. Signed objects also use it as the
/// signature algorithm.
pub const RSA_ENCRYPTION: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 1, 1]);

/// [RFC 4055](https://tools.ietf.org/html/rfc4055) `sha256WithRSAEncryption`
///
/// Identifies the PKCS #1 version 1.5 signature algorithm with SHA-256.
pub const SHA256_WITH_RSA_ENCRYPTION: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 1, 11]);

/// [RFC 5480](https://tools.ietf.org/html/rfc5480) `id-ecPublicKey`
pub const EC_PUBLIC_KEY: ConstOid = Oid(&[42, 134, 72, 206, 61, 2, 1]);

/// [RFC 5480](https://tools.ietf.org/html/rfc5480) `secp256r1`
///
/// The named curve P-256.
pub const SECP256R1: ConstOid = Oid(&[42, 134, 72, 206, 61, 3, 1, 7]);

/// [RFC 5758](https://tools.ietf.org/html/rfc5758) `ecdsa-with-SHA256`
pub const ECDSA_WITH_SHA256: ConstOid
    = Oid(&[42, 134, 72, 206, 61, 4, 3, 2]);


//------------ Name Attributes -----------------------------------------------

pub const AT_COMMON_NAME: ConstOid = Oid(&[85, 4, 3]);
pub const AT_SERIAL_NUMBER: ConstOid = Oid(&[85, 4, 5]);


//------------ Certificate and CRL Extensions --------------------------------

pub const CE_SUBJECT_KEY_IDENTIFIER: ConstOid = Oid(&[85, 29, 14]);
pub const CE_KEY_USAGE: ConstOid = Oid(&[85, 29, 15]);
pub const CE_BASIC_CONSTRAINTS: ConstOid = Oid(&[85, 29, 19]);
pub const CE_CRL_NUMBER: ConstOid = Oid(&[85, 29, 20]);
pub const CE_CRL_DISTRIBUTION_POINTS: ConstOid = Oid(&[85, 29, 31]);
pub const CE_CERTIFICATE_POLICIES: ConstOid = Oid(&[85, 29, 32]);
pub const CE_AUTHORITY_KEY_IDENTIFIER: ConstOid = Oid(&[85, 29, 35]);
pub const CE_EXTENDED_KEY_USAGE: ConstOid = Oid(&[85, 29, 37]);

pub const PE_AUTHORITY_INFO_ACCESS: ConstOid
    = Oid(&[43, 6, 1, 5, 5, 7, 1, 1]);

/// [RFC 3779](https://tools.ietf.org/html/rfc3779) `id-pe-ipAddrBlocks`
pub const PE_IP_ADDR_BLOCK: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 1, 7]);

/// [RFC 3779](https://tools.ietf.org/html/rfc3779) `id-pe-autonomousSysIds`
pub const PE_AUTONOMOUS_SYS_IDS: ConstOid
    = Oid(&[43, 6, 1, 5, 5, 7, 1, 8]);

pub const PE_SUBJECT_INFO_ACCESS: ConstOid
    = Oid(&[43, 6, 1, 5, 5, 7, 1, 11]);


//------------ Policies and Key Purposes -------------------------------------

/// [RFC 6484](https://tools.ietf.org/html/rfc6484) `id-cp-ipAddr-asNumber`
///
/// The one certificate policy allowed in resource certificates.
pub const CP_IPADDR_ASNUMBER: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 14, 2]);

/// [RFC 5280](https://tools.ietf.org/html/rfc5280) `id-qt-cps`
pub const QT_CPS: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 2, 1]);

/// [RFC 8209](https://tools.ietf.org/html/rfc8209) `id-kp-bgpsec-router`
pub const KP_BGPSEC_ROUTER: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 3, 30]);


//------------ Access Methods ------------------------------------------------

pub const AD_CA_ISSUERS: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 48, 2]);
pub const AD_CA_REPOSITORY: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 48, 5]);
pub const AD_RPKI_MANIFEST: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 48, 10]);
pub const AD_SIGNED_OBJECT: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 48, 11]);
pub const AD_RPKI_NOTIFY: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 48, 13]);


//------------ CMS -----------------------------------------------------------

pub const SIGNED_DATA: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 2]);
pub const CONTENT_TYPE: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 3]);
pub const MESSAGE_DIGEST: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 4]);
pub const SIGNING_TIME: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 5]);

/// [RFC 6019](https://tools.ietf.org/html/rfc6019) `id-aa-binarySigningTime`
pub const AA_BINARY_SIGNING_TIME: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 46]);


//------------ Signed Object Content Types -----------------------------------

/// [RFC 9582](https://tools.ietf.org/html/rfc9582) `id-ct-routeOriginAuthz`
pub const ROUTE_ORIGIN_AUTHZ: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 1, 24]);

/// [RFC 9286](https://tools.ietf.org/html/rfc9286) `id-ct-rpkiManifest`
pub const CT_RPKI_MANIFEST: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 1, 26]);

/// [RFC 6493](https://tools.ietf.org/html/rfc6493) `id-ct-rpkiGhostbusters`
pub const CT_RPKI_GHOSTBUSTERS: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 1, 35]);

/// `id-ct-ASPA` from the ASPA profile draft.
pub const CT_ASPA: ConstOid
    = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 1, 49]);
