//! Sets of resources of all types.

use std::{error, fmt};
use std::str::FromStr;
use super::asres::{self, AsBlocks};
use super::ipres::{self, AddressFamily, IpBlocks};


//------------ ResourceType --------------------------------------------------

/// The types of resources that can be held by a certificate.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ResourceType {
    Asn,
    Ipv4,
    Ipv6,
}

impl ResourceType {
    /// All resource types in their canonical order.
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Asn, ResourceType::Ipv4, ResourceType::Ipv6
    ];
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ResourceType::Asn => "ASN",
            ResourceType::Ipv4 => "IPv4",
            ResourceType::Ipv6 => "IPv6",
        })
    }
}


//------------ ResourceSet ---------------------------------------------------

/// An immutable set of AS numbers, IPv4 and IPv6 addresses.
///
/// The textual representation lists AS blocks first, then IPv4 blocks and
/// then IPv6 blocks, all separated by commas, e.g.,
/// `AS1-AS3, 10.0.0.0/8, 2001:db8::/32`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourceSet {
    asn: AsBlocks,
    v4: IpBlocks,
    v6: IpBlocks,
}

impl ResourceSet {
    pub fn new(asn: AsBlocks, v4: IpBlocks, v6: IpBlocks) -> Self {
        ResourceSet { asn, v4, v6 }
    }

    /// Creates an empty resource set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a set holding all resources of the given type.
    pub fn all_of_type(resource_type: ResourceType) -> Self {
        let mut res = Self::empty();
        match resource_type {
            ResourceType::Asn => res.asn = AsBlocks::all(),
            ResourceType::Ipv4 => res.v4 = IpBlocks::all(),
            ResourceType::Ipv6 => res.v6 = IpBlocks::all(),
        }
        res
    }

    /// Creates a set holding all resources of all types.
    pub fn all() -> Self {
        ResourceSet {
            asn: AsBlocks::all(),
            v4: IpBlocks::all(),
            v6: IpBlocks::all(),
        }
    }

    pub fn asn(&self) -> &AsBlocks {
        &self.asn
    }

    pub fn v4(&self) -> &IpBlocks {
        &self.v4
    }

    pub fn v6(&self) -> &IpBlocks {
        &self.v6
    }

    /// Returns the IP blocks for the given address family.
    pub fn ip(&self, family: AddressFamily) -> &IpBlocks {
        match family {
            AddressFamily::Ipv4 => &self.v4,
            AddressFamily::Ipv6 => &self.v6,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.asn.is_empty() && self.v4.is_empty() && self.v6.is_empty()
    }

    /// Returns whether the set holds any resources of the given type.
    pub fn contains_type(&self, resource_type: ResourceType) -> bool {
        match resource_type {
            ResourceType::Asn => !self.asn.is_empty(),
            ResourceType::Ipv4 => !self.v4.is_empty(),
            ResourceType::Ipv6 => !self.v6.is_empty(),
        }
    }

    /// Returns a set with only the resources of the given type.
    pub fn of_type(&self, resource_type: ResourceType) -> Self {
        self.intersection(&Self::all_of_type(resource_type))
    }

    /// Returns whether all of `other` is contained in `self`.
    pub fn contains(&self, other: &Self) -> bool {
        self.asn.contains(&other.asn)
            && self.v4.contains(&other.v4)
            && self.v6.contains(&other.v6)
    }

    pub fn union(&self, other: &Self) -> Self {
        ResourceSet {
            asn: self.asn.union(&other.asn),
            v4: self.v4.union(&other.v4),
            v6: self.v6.union(&other.v6),
        }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        ResourceSet {
            asn: self.asn.intersection(&other.asn),
            v4: self.v4.intersection(&other.v4),
            v6: self.v6.intersection(&other.v6),
        }
    }

    /// Returns the resources of `self` that are not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        ResourceSet {
            asn: self.asn.difference(&other.asn),
            v4: self.v4.difference(&other.v4),
            v6: self.v6.difference(&other.v6),
        }
    }
}


//--- FromStr

impl FromStr for ResourceSet {
    type Err = FromStrError;

    /// Parses a comma separated list of resources.
    ///
    /// Each item is classified by its look: items starting with `AS` or
    /// consisting of digits only are AS numbers, items containing a colon
    /// are IPv6 and everything else is IPv4.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut asn = Vec::new();
        let mut v4 = Vec::new();
        let mut v6 = Vec::new();
        for item in s.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue
            }
            if is_asn_item(item) {
                asn.push(asres::AsBlock::from_str(item)?)
            }
            else if item.contains(':') {
                v6.push(ipres::IpBlock::from_str_family(
                    item, AddressFamily::Ipv6
                )?)
            }
            else {
                v4.push(ipres::IpBlock::from_str_family(
                    item, AddressFamily::Ipv4
                )?)
            }
        }
        Ok(ResourceSet {
            asn: asn.into_iter().collect(),
            v4: v4.into_iter().collect(),
            v6: v6.into_iter().collect(),
        })
    }
}

fn is_asn_item(item: &str) -> bool {
    (item.len() > 2 && item[..2].eq_ignore_ascii_case("as"))
        || item.bytes().all(|ch| ch.is_ascii_digit() || ch == b'-')
}


//--- Display

impl fmt::Display for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter| {
            if first {
                first = false;
                Ok(())
            }
            else {
                f.write_str(", ")
            }
        };
        if !self.asn.is_empty() {
            sep(f)?;
            write!(f, "{}", self.asn)?;
        }
        if !self.v4.is_empty() {
            sep(f)?;
            write!(f, "{}", self.v4.display(AddressFamily::Ipv4))?;
        }
        if !self.v6.is_empty() {
            sep(f)?;
            write!(f, "{}", self.v6.display(AddressFamily::Ipv6))?;
        }
        Ok(())
    }
}


//--- Serialize and Deserialize

#[cfg(feature = "serde")]
impl serde::Serialize for ResourceSet {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ResourceSet {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D
    ) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        ResourceSet::from_str(&s).map_err(serde::de::Error::custom)
    }
}


//------------ FromStrError --------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FromStrError {
    Asn(asres::FromStrError),
    Ip(ipres::FromStrError),
}

impl From<asres::FromStrError> for FromStrError {
    fn from(err: asres::FromStrError) -> Self {
        FromStrError::Asn(err)
    }
}

impl From<ipres::FromStrError> for FromStrError {
    fn from(err: ipres::FromStrError) -> Self {
        FromStrError::Ip(err)
    }
}

impl fmt::Display for FromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FromStrError::Asn(ref err) => fmt::Display::fmt(err, f),
            FromStrError::Ip(ref err) => fmt::Display::fmt(err, f),
        }
    }
}

impl error::Error for FromStrError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn set(s: &str) -> ResourceSet {
        ResourceSet::from_str(s).unwrap()
    }

    #[test]
    fn from_str_and_display() {
        let res = set("2001:db8::/32, AS3, 10.0.0.0/8, AS1-AS2");
        assert_eq!(res.to_string(), "AS1-AS3, 10.0.0.0/8, 2001:db8::/32");
        assert_eq!(set("").to_string(), "");
        assert!(set("").is_empty());
        assert_eq!(set("64496").to_string(), "AS64496");
        assert!(ResourceSet::from_str("10.0.0.0/33").is_err());
        assert!(ResourceSet::from_str("ASx").is_err());
    }

    #[test]
    fn set_algebra() {
        let parent = set("AS1-AS10, 10.0.0.0/8, 2001:db8::/32");
        let child = set("AS5, 10.1.0.0/16, 11.0.0.0/8");
        assert!(!parent.contains(&child));
        assert_eq!(child.difference(&parent), set("11.0.0.0/8"));
        assert_eq!(child.intersection(&parent), set("AS5, 10.1.0.0/16"));
        assert!(parent.union(&child).contains(&child));
        assert!(parent.contains(&set("")));
    }

    #[test]
    fn types() {
        let res = set("AS1, 2001:db8::/32");
        assert!(res.contains_type(ResourceType::Asn));
        assert!(!res.contains_type(ResourceType::Ipv4));
        assert!(res.contains_type(ResourceType::Ipv6));
        assert_eq!(res.of_type(ResourceType::Ipv6), set("2001:db8::/32"));
        assert!(
            ResourceSet::all_of_type(ResourceType::Ipv4)
                .contains(&set("0.0.0.0/0"))
        );
        assert!(ResourceSet::all().contains(&res));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_string() {
        let res = set("AS1, 10.0.0.0/8");
        let json = serde_json::to_string(&res).unwrap();
        assert_eq!(json, "\"AS1, 10.0.0.0/8\"");
        assert_eq!(
            serde_json::from_str::<ResourceSet>(&json).unwrap(), res
        );
    }
}
