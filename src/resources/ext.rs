//! The RFC 3779 resource extensions.
//!
//! A resource certificate describes its resources through two extensions,
//! one for IP address blocks and one for AS identifiers. For each address
//! family and for AS numbers, the extension either lists the resources or
//! states that they are inherited from the issuer. The type
//! [`ResourceExtension`] combines both extensions into a resource set and
//! the set of inherited resource types.

use std::{error, fmt};
use std::iter::FromIterator;
use bcder::{decode, encode};
use bcder::{Captured, Mode, Tag};
use bcder::decode::DecodeError;
use bcder::encode::{PrimitiveContent, Values};
use super::asres::AsBlocks;
use super::ipres::{AddressFamily, IpBlocks};
use super::set::{ResourceSet, ResourceType};


//------------ InheritedTypes ------------------------------------------------

/// The set of resource types inherited from the issuer.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct InheritedTypes(u8);

impl InheritedTypes {
    pub fn empty() -> Self {
        InheritedTypes(0)
    }

    pub fn all() -> Self {
        ResourceType::ALL.iter().copied().collect()
    }

    fn bit(resource_type: ResourceType) -> u8 {
        match resource_type {
            ResourceType::Asn => 0x01,
            ResourceType::Ipv4 => 0x02,
            ResourceType::Ipv6 => 0x04,
        }
    }

    pub fn insert(&mut self, resource_type: ResourceType) {
        self.0 |= Self::bit(resource_type)
    }

    pub fn with(mut self, resource_type: ResourceType) -> Self {
        self.insert(resource_type);
        self
    }

    pub fn contains(self, resource_type: ResourceType) -> bool {
        self.0 & Self::bit(resource_type) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_all(self) -> bool {
        self == Self::all()
    }

    pub fn iter(self) -> impl Iterator<Item = ResourceType> {
        ResourceType::ALL.iter().copied().filter(move |t| self.contains(*t))
    }
}

impl FromIterator<ResourceType> for InheritedTypes {
    fn from_iter<I: IntoIterator<Item = ResourceType>>(iter: I) -> Self {
        let mut res = Self::empty();
        iter.into_iter().for_each(|t| res.insert(t));
        res
    }
}

impl fmt::Debug for InheritedTypes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}


//------------ ResourceExtension ---------------------------------------------

/// The resources of a certificate and which types it inherits.
///
/// A resource type is never both inherited and present in the resource
/// set, and a certificate always has resources of some kind, i.e., the
/// resource set and the inherited types are not both empty.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceExtension {
    resources: ResourceSet,
    inherited: InheritedTypes,
}

impl ResourceExtension {
    pub fn new(
        resources: ResourceSet,
        inherited: InheritedTypes,
    ) -> Result<Self, ResourceExtensionError> {
        if resources.is_empty() && inherited.is_empty() {
            return Err(ResourceExtensionError::Empty)
        }
        if let Some(t) = inherited.iter().find(|t| {
            resources.contains_type(*t)
        }) {
            return Err(ResourceExtensionError::Overlap(t))
        }
        let res = ResourceExtension { resources, inherited };
        if res.has_ip_extension() && res.has_as_extension()
            && res.ip_inherited() != res.is_inherited(ResourceType::Asn)
        {
            return Err(ResourceExtensionError::PartialInheritance)
        }
        Ok(res)
    }

    /// Creates an extension that inherits everything from the issuer.
    pub fn inherit_all() -> Self {
        ResourceExtension {
            resources: ResourceSet::empty(),
            inherited: InheritedTypes::all(),
        }
    }

    /// Returns the resources explicitly listed.
    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    pub fn inherited(&self) -> InheritedTypes {
        self.inherited
    }

    pub fn is_inherited(&self, resource_type: ResourceType) -> bool {
        self.inherited.contains(resource_type)
    }

    /// Returns whether the IP address blocks extension is present.
    fn has_ip_extension(&self) -> bool {
        [ResourceType::Ipv4, ResourceType::Ipv6].iter().any(|t| {
            self.is_inherited(*t) || self.resources.contains_type(*t)
        })
    }

    /// Returns whether the AS identifiers extension is present.
    fn has_as_extension(&self) -> bool {
        self.is_inherited(ResourceType::Asn)
            || self.resources.contains_type(ResourceType::Asn)
    }

    /// Returns whether the IP address blocks only contain inherit markers.
    fn ip_inherited(&self) -> bool {
        !self.resources.contains_type(ResourceType::Ipv4)
            && !self.resources.contains_type(ResourceType::Ipv6)
            && (
                self.is_inherited(ResourceType::Ipv4)
                || self.is_inherited(ResourceType::Ipv6)
            )
    }

    /// Returns the effective resources given the issuer’s resources.
    ///
    /// Listed resources are taken as is. For each inherited type, the
    /// issuer’s resources of that type are added.
    pub fn derive_resources(&self, parent: &ResourceSet) -> ResourceSet {
        if self.inherited.is_empty() {
            self.resources.clone()
        }
        else if self.inherited.is_all() {
            parent.clone()
        }
        else {
            self.inherited.iter().fold(self.resources.clone(), |res, t| {
                res.union(&parent.of_type(t))
            })
        }
    }
}


/// # Decoding
///
/// ```txt
/// IPAddrBlocks        ::= SEQUENCE OF IPAddressFamily
///
/// IPAddressFamily     ::= SEQUENCE {    -- AFI & optional SAFI --
///    addressFamily        OCTET STRING (SIZE (2..3)),
///    ipAddressChoice      IPAddressChoice }
///
/// IPAddressChoice     ::= CHOICE {
///    inherit              NULL, -- inherit from issuer --
///    addressesOrRanges    SEQUENCE OF IPAddressOrRange }
///
/// ASIdentifiers       ::= SEQUENCE {
///     asnum               [0] EXPLICIT ASIdentifierChoice OPTIONAL,
///     rdi                 [1] EXPLICIT ASIdentifierChoice OPTIONAL}
///
/// ASIdentifierChoice  ::= CHOICE {
///    inherit              NULL, -- inherit from issuer --
///    asIdsOrRanges        SEQUENCE OF ASIdOrRange }
/// ```
///
/// [RFC 6487] forbids the SAFI and the routing domain identifiers. We
/// tolerate an empty `rdi` sequence.
///
/// [RFC 6487]: https://tools.ietf.org/html/rfc6487
impl ResourceExtension {
    /// Decodes the values of the two extensions.
    ///
    /// Both arguments are the content of the extension’s `extnValue`
    /// octet string, if the extension is present.
    pub fn decode(
        ip_blocks: Option<&[u8]>,
        as_ids: Option<&[u8]>,
    ) -> Result<Self, ResourceExtensionError> {
        let mut asn = AsBlocks::empty();
        let mut v4 = IpBlocks::empty();
        let mut v6 = IpBlocks::empty();
        let mut inherited = InheritedTypes::empty();

        if let Some(ip_blocks) = ip_blocks {
            let (v4_choice, v6_choice) = Mode::Der.decode(
                ip_blocks, take_ip_families
            ).map_err(ResourceExtensionError::malformed)?;
            match v4_choice {
                Some(Choice::Inherit) => inherited.insert(ResourceType::Ipv4),
                Some(Choice::Blocks(blocks)) => v4 = blocks,
                None => { }
            }
            match v6_choice {
                Some(Choice::Inherit) => inherited.insert(ResourceType::Ipv6),
                Some(Choice::Blocks(blocks)) => v6 = blocks,
                None => { }
            }
        }
        if let Some(as_ids) = as_ids {
            match Mode::Der.decode(
                as_ids, take_as_identifiers
            ).map_err(ResourceExtensionError::malformed)? {
                Some(Choice::Inherit) => inherited.insert(ResourceType::Asn),
                Some(Choice::Blocks(blocks)) => asn = blocks,
                None => { }
            }
        }
        Self::new(ResourceSet::new(asn, v4, v6), inherited)
    }
}

fn take_ip_families<S: decode::Source>(
    cons: &mut decode::Constructed<S>
) -> Result<
    (Option<Choice<IpBlocks>>, Option<Choice<IpBlocks>>),
    DecodeError<S::Error>
> {
    cons.take_sequence(|cons| {
        let mut v4 = None;
        let mut v6 = None;
        while let Some((family, choice)) = cons.take_opt_sequence(|cons| {
            let family = AddressFamily::take_from(cons)?;
            let choice = cons.take_value(|tag, content| {
                if tag == Tag::NULL {
                    content.to_null()?;
                    Ok(Choice::Inherit)
                }
                else if tag == Tag::SEQUENCE {
                    IpBlocks::parse_content_with_family(
                        content, family
                    ).map(Choice::Blocks)
                }
                else {
                    Err(content.content_err("invalid IP address choice"))
                }
            })?;
            Ok((family, choice))
        })? {
            let target = match family {
                AddressFamily::Ipv4 => &mut v4,
                AddressFamily::Ipv6 => &mut v6,
            };
            if target.is_some() {
                return Err(cons.content_err("duplicate address family"))
            }
            *target = Some(choice);
        }
        Ok((v4, v6))
    })
}

fn take_as_identifiers<S: decode::Source>(
    cons: &mut decode::Constructed<S>
) -> Result<Option<Choice<AsBlocks>>, DecodeError<S::Error>> {
    cons.take_sequence(|cons| {
        let asnum = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
            cons.take_value(|tag, content| {
                if tag == Tag::NULL {
                    content.to_null()?;
                    Ok(Choice::Inherit)
                }
                else if tag == Tag::SEQUENCE {
                    AsBlocks::parse_content(content).map(Choice::Blocks)
                }
                else {
                    Err(content.content_err("invalid AS identifier choice"))
                }
            })
        })?;
        let rdi = cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
            cons.take_opt_sequence(|cons| cons.capture_all())
        })?;
        match rdi {
            None => { }
            Some(Some(ref content)) if content.as_slice().is_empty() => { }
            Some(_) => {
                return Err(cons.content_err(
                    "routing domain identifiers not allowed"
                ))
            }
        }
        Ok(asnum)
    })
}


/// # Encoding
///
impl ResourceExtension {
    /// Returns the value of the IP address blocks extension.
    ///
    /// Returns `None` if the extension should be omitted since neither
    /// family has resources or is inherited.
    pub fn encode_ip_blocks(&self) -> Option<Captured> {
        let v4 = self.ip_choice(AddressFamily::Ipv4);
        let v6 = self.ip_choice(AddressFamily::Ipv6);
        if v4.is_none() && v6.is_none() {
            return None
        }
        Some(encode::sequence((
            v4.map(|choice| encode_ip_family(AddressFamily::Ipv4, choice)),
            v6.map(|choice| encode_ip_family(AddressFamily::Ipv6, choice)),
        )).to_captured(Mode::Der))
    }

    /// Returns the value of the AS identifiers extension.
    ///
    /// Returns `None` if the extension should be omitted.
    pub fn encode_as_ids(&self) -> Option<Captured> {
        let choice = if self.is_inherited(ResourceType::Asn) {
            Choice::Inherit
        }
        else if !self.resources.asn().is_empty() {
            Choice::Blocks(self.resources.asn())
        }
        else {
            return None
        };
        Some(encode::sequence(
            encode::sequence_as(Tag::CTX_0,
                match choice {
                    Choice::Inherit => encode::Choice2::One(().encode()),
                    Choice::Blocks(blocks) => {
                        encode::Choice2::Two(blocks.encode_ref())
                    }
                }
            )
        ).to_captured(Mode::Der))
    }

    fn ip_choice(&self, family: AddressFamily) -> Option<Choice<&IpBlocks>> {
        let resource_type = match family {
            AddressFamily::Ipv4 => ResourceType::Ipv4,
            AddressFamily::Ipv6 => ResourceType::Ipv6,
        };
        if self.is_inherited(resource_type) {
            Some(Choice::Inherit)
        }
        else if !self.resources.ip(family).is_empty() {
            Some(Choice::Blocks(self.resources.ip(family)))
        }
        else {
            None
        }
    }
}

fn encode_ip_family(
    family: AddressFamily,
    choice: Choice<&IpBlocks>,
) -> impl encode::Values + '_ {
    encode::sequence((
        family.encode(),
        match choice {
            Choice::Inherit => encode::Choice2::One(().encode()),
            Choice::Blocks(blocks) => encode::Choice2::Two(blocks.encode_ref())
        }
    ))
}


//------------ Choice --------------------------------------------------------

/// Either inherit or the listed resources.
#[derive(Clone, Copy, Debug)]
enum Choice<T> {
    Inherit,
    Blocks(T),
}


//------------ ResourceExtensionError ----------------------------------------

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceExtensionError {
    /// The extensions could not be decoded.
    Malformed(String),

    /// There are neither resources nor inherited types.
    Empty,

    /// The resource type is inherited but also listed.
    Overlap(ResourceType),

    /// Only one of IP addresses and AS numbers is inherited.
    PartialInheritance,
}

impl ResourceExtensionError {
    fn malformed(err: impl fmt::Display) -> Self {
        ResourceExtensionError::Malformed(err.to_string())
    }
}

impl fmt::Display for ResourceExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ResourceExtensionError::Malformed(ref err) => {
                write!(f, "malformed resource extension: {}", err)
            }
            ResourceExtensionError::Empty => {
                f.write_str("empty resource extension")
            }
            ResourceExtensionError::Overlap(t) => {
                write!(f, "{} resources both inherited and listed", t)
            }
            ResourceExtensionError::PartialInheritance => {
                f.write_str("partial resource inheritance")
            }
        }
    }
}

impl error::Error for ResourceExtensionError { }


//============ Tests =========================================================
