//! Route Origin Authorizations.
//!
//! A ROA states which AS is allowed to originate routes for a set of IP
//! prefixes. It is defined in [RFC 9582].
//!
//! [RFC 9582]: https://tools.ietf.org/html/rfc9582

use std::fmt;
use bcder::{decode, encode};
use bcder::{ConstOid, Mode, Tag};
use bcder::decode::DecodeError;
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use crate::oid;
use crate::crypto::Signer;
use crate::resources::{
    AddressFamily, AsBlocks, Asn, IpBlocks, Prefix, ResourceSet, ResourceType,
};
use crate::validation::ValidationResult;
use crate::validation::checks::*;
use super::error::BuildError;
use super::rescert::ResourceCert;
use super::sigobj::{
    SignedObject, SignedObjectBuilder, SignedObjectContent, SignedObjectParser
};


//------------ Roa -----------------------------------------------------------

pub type Roa = SignedObject<RoaContent>;

pub type RoaParser = SignedObjectParser<RoaContent>;


//------------ RoaContent ----------------------------------------------------

/// The content of a ROA.
///
/// ```txt
/// RouteOriginAttestation ::= SEQUENCE {
///     version [0]          INTEGER DEFAULT 0,
///     asID                 ASID,
///     ipAddrBlocks         SEQUENCE (SIZE(1..2)) OF ROAIPAddressFamily }
///
/// ROAIPAddressFamily ::= SEQUENCE {
///     addressFamily        OCTET STRING (SIZE(2)),
///     addresses            SEQUENCE (SIZE(1..MAX)) OF ROAIPAddress }
///
/// ROAIPAddress ::= SEQUENCE {
///     address              IPAddress,
///     maxLength            INTEGER OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoaContent {
    as_id: Asn,
    v4: Vec<RoaIpAddress>,
    v6: Vec<RoaIpAddress>,
}

impl RoaContent {
    pub fn as_id(&self) -> Asn {
        self.as_id
    }

    pub fn v4_addrs(&self) -> &[RoaIpAddress] {
        &self.v4
    }

    pub fn v6_addrs(&self) -> &[RoaIpAddress] {
        &self.v6
    }

    /// Returns an iterator over all addresses with their family.
    pub fn iter(
        &self
    ) -> impl Iterator<Item = (AddressFamily, RoaIpAddress)> + '_ {
        self.v4.iter().map(|addr| (AddressFamily::Ipv4, *addr)).chain(
            self.v6.iter().map(|addr| (AddressFamily::Ipv6, *addr))
        )
    }

    /// Returns the resources covered by the prefixes.
    pub fn to_resources(&self) -> ResourceSet {
        ResourceSet::new(
            AsBlocks::empty(),
            self.v4.iter().map(|addr| addr.prefix).collect::<IpBlocks>(),
            self.v6.iter().map(|addr| addr.prefix).collect::<IpBlocks>(),
        )
    }

    fn addrs(&self, family: AddressFamily) -> &[RoaIpAddress] {
        match family {
            AddressFamily::Ipv4 => &self.v4,
            AddressFamily::Ipv6 => &self.v6,
        }
    }

    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                if cons.take_u8()? != 0 {
                    return Err(cons.content_err("invalid ROA version"))
                }
                Ok(())
            })?;
            let as_id = Asn::take_from(cons)?;
            let mut v4 = None;
            let mut v6 = None;
            cons.take_sequence(|cons| {
                while let Some(()) = cons.take_opt_sequence(|cons| {
                    let family = AddressFamily::take_from(cons)?;
                    let target = match family {
                        AddressFamily::Ipv4 => &mut v4,
                        AddressFamily::Ipv6 => &mut v6,
                    };
                    if target.is_some() {
                        return Err(cons.content_err(
                            "duplicate address family in ROA"
                        ))
                    }
                    let mut addrs = Vec::new();
                    cons.take_sequence(|cons| {
                        while let Some(addr) = RoaIpAddress::take_opt_from(
                            cons, family
                        )? {
                            addrs.push(addr)
                        }
                        Ok(())
                    })?;
                    *target = Some(addrs);
                    Ok(())
                })? { }
                Ok(())
            })?;
            Ok(RoaContent {
                as_id,
                v4: v4.unwrap_or_default(),
                v6: v6.unwrap_or_default(),
            })
        })
    }

    fn encode_family(
        &self, family: AddressFamily
    ) -> Option<impl encode::Values + '_> {
        let addrs = self.addrs(family);
        if addrs.is_empty() {
            return None
        }
        Some(encode::sequence((
            family.encode(),
            encode::sequence(encode::slice(addrs, |addr| addr.encode())),
        )))
    }
}


//--- SignedObjectContent

impl SignedObjectContent for RoaContent {
    const CONTENT_TYPE: ConstOid = oid::ROUTE_ORIGIN_AUTHZ;
    const CONTENT_TYPE_CHECK: &'static str = ROA_CONTENT_TYPE;

    fn decode_content(
        content: Bytes, result: &mut ValidationResult
    ) -> Option<Self> {
        let content = match Mode::Der.decode(content, Self::take_from) {
            Ok(content) => {
                result.pass(ROA_CONTENT_STRUCTURE, &[]);
                content
            }
            Err(err) => {
                result.error(ROA_CONTENT_STRUCTURE, &[&err]);
                return None
            }
        };
        let mut ok = result.reject_if_false(
            !content.v4.is_empty() || !content.v6.is_empty(),
            ROA_PREFIX_LIST, &[]
        );
        for (family, addr) in content.iter() {
            ok &= result.reject_if_false(
                addr.is_valid_max_length(family), PREFIX_LENGTH,
                &[&addr.display(family)]
            );
        }
        if ok {
            Some(content)
        }
        else {
            None
        }
    }

    /// Checks that the EE certificate covers all prefixes.
    ///
    /// The certificate must not inherit its IP resources.
    fn check_certificate(
        &self, cert: &ResourceCert, result: &mut ValidationResult
    ) {
        if cert.is_inherited(ResourceType::Ipv4)
            || cert.is_inherited(ResourceType::Ipv6)
        {
            result.error(ROA_RESOURCES, &[&"inherited IP resources"]);
            return
        }
        let excess = self.to_resources().difference(cert.resources());
        result.reject_if_false(excess.is_empty(), ROA_RESOURCES, &[&excess]);
    }

    fn encode_content(&self) -> Bytes {
        encode::sequence((
            self.as_id.encode(),
            encode::sequence((
                self.encode_family(AddressFamily::Ipv4),
                self.encode_family(AddressFamily::Ipv6),
            )),
        )).to_captured(Mode::Der).into_bytes()
    }
}


//------------ RoaIpAddress --------------------------------------------------

/// A prefix with an optional maximum length.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RoaIpAddress {
    prefix: Prefix,
    max_length: Option<u8>,
}

impl RoaIpAddress {
    pub fn new(prefix: Prefix, max_length: Option<u8>) -> Self {
        RoaIpAddress { prefix, max_length }
    }

    pub fn prefix(self) -> Prefix {
        self.prefix
    }

    pub fn max_length(self) -> Option<u8> {
        self.max_length
    }

    /// Returns the maximum length with the prefix length as the default.
    pub fn effective_max_length(self) -> u8 {
        self.max_length.unwrap_or_else(|| self.prefix.addr_len())
    }

    /// Returns whether the maximum length fits prefix and family.
    pub fn is_valid_max_length(self, family: AddressFamily) -> bool {
        match self.max_length {
            Some(max) => {
                max >= self.prefix.addr_len() && max <= family.max_addr_len()
            }
            None => true
        }
    }

    pub fn display(self, family: AddressFamily) -> impl fmt::Display {
        DisplayAddress(family, self)
    }

    fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        family: AddressFamily,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            Ok(RoaIpAddress {
                prefix: Prefix::take_from_with_family(cons, family)?,
                max_length: cons.take_opt_u8()?,
            })
        })
    }

    fn encode(&self) -> impl encode::Values {
        encode::sequence((
            self.prefix.encode(),
            self.max_length.map(|len| len.encode()),
        ))
    }
}

struct DisplayAddress(AddressFamily, RoaIpAddress);

impl fmt::Display for DisplayAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.1.prefix.display(self.0))?;
        if let Some(max) = self.1.max_length {
            write!(f, "-{}", max)?;
        }
        Ok(())
    }
}


//------------ RoaBuilder ----------------------------------------------------

/// A builder for ROAs.
#[derive(Clone, Debug)]
pub struct RoaBuilder {
    content: RoaContent,
}

impl RoaBuilder {
    pub fn new(as_id: Asn) -> Self {
        RoaBuilder {
            content: RoaContent {
                as_id, v4: Vec::new(), v6: Vec::new(),
            }
        }
    }

    pub fn with_v4(mut self, prefix: Prefix, max_length: Option<u8>) -> Self {
        self.content.v4.push(RoaIpAddress::new(prefix, max_length));
        self
    }

    pub fn with_v6(mut self, prefix: Prefix, max_length: Option<u8>) -> Self {
        self.content.v6.push(RoaIpAddress::new(prefix, max_length));
        self
    }

    /// Checks the fields and returns the content.
    pub fn into_content(self) -> Result<RoaContent, BuildError> {
        if self.content.v4.is_empty() && self.content.v6.is_empty() {
            return Err(BuildError::MissingField("prefixes"))
        }
        if !self.content.iter().all(|(family, addr)| {
            addr.is_valid_max_length(family)
        }) {
            return Err(BuildError::InvalidField("max length"))
        }
        Ok(self.content)
    }

    /// Builds the signed ROA.
    ///
    /// The EE certificate holds exactly the resources of the prefixes.
    pub fn build<S: Signer>(
        self,
        object: SignedObjectBuilder,
        signer: &S,
        issuer_key: &S::KeyId,
    ) -> Result<Roa, BuildError> {
        let content = self.into_content()?;
        object.with_resources(content.to_resources()).build(
            content, signer, issuer_key
        )
    }
}


//============ Tests =========================================================
