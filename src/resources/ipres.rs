//! IP address resources.
//!
//! The types herein are defined in [RFC 3779] for use with certificates in
//! general. [RFC 6487] restricts them for RPKI: only IPv4 and IPv6 without
//! a subsequent address family identifier are allowed.
//!
//! Addresses of both families are kept in a 128 bit integer. IPv4
//! addresses live in the upper 32 bits. The largest address of an IPv4
//! block has all the lower 96 bits set so that counting prefix lengths and
//! moving to the next address works the same way for both families.
//!
//! [RFC 3779]: https://tools.ietf.org/html/rfc3779
//! [RFC 6487]: https://tools.ietf.org/html/rfc6487

use std::{error, fmt, io};
use std::iter::FromIterator;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use bcder::{decode, encode};
use bcder::{BitString, Mode, OctetString, Tag};
use bcder::decode::DecodeError;
use bcder::encode::PrimitiveContent;
use super::chain::{Block, Chain};


//------------ AddressFamily -------------------------------------------------

/// The address family of IP resources.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AddressFamily {
    /// IPv4, encoded as the octets `0x00 0x01`.
    Ipv4,

    /// IPv6, encoded as the octets `0x00 0x02`.
    Ipv6
}

impl AddressFamily {
    /// Takes an address family identifier from the beginning of a value.
    ///
    /// A subsequent address family identifier is not allowed.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let octets = OctetString::take_from(cons)?.into_bytes();
        match octets.as_ref() {
            [0, 1] => Ok(AddressFamily::Ipv4),
            [0, 2] => Ok(AddressFamily::Ipv6),
            [0, 1, _] | [0, 2, _] => {
                Err(cons.content_err("SAFI not supported"))
            }
            _ => Err(cons.content_err("invalid address family"))
        }
    }

    pub fn encode(self) -> impl encode::Values {
        OctetString::encode_slice(
            match self {
                AddressFamily::Ipv4 => b"\x00\x01",
                AddressFamily::Ipv6 => b"\x00\x02",
            }
        )
    }

    /// Returns the maximum prefix length for this family.
    pub fn max_addr_len(self) -> u8 {
        match self {
            AddressFamily::Ipv4 => 32,
            AddressFamily::Ipv6 => 128
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            AddressFamily::Ipv4 => "IPv4",
            AddressFamily::Ipv6 => "IPv6",
        })
    }
}


//------------ Addr ----------------------------------------------------------

/// An address of either family.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Addr(u128);

impl Addr {
    pub const fn from_bits(bits: u128) -> Self {
        Addr(bits)
    }

    pub fn from_v4(addr: Ipv4Addr) -> Self {
        Addr(u128::from(u32::from(addr)) << 96)
    }

    pub fn from_v6(addr: Ipv6Addr) -> Self {
        Addr(u128::from(addr))
    }

    pub fn to_bits(self) -> u128 {
        self.0
    }

    /// Converts the address value into an IPv4 address.
    ///
    /// The lower twelve bytes are ignored.
    pub fn to_v4(self) -> Ipv4Addr {
        ((self.0 >> 96) as u32).into()
    }

    pub fn to_v6(self) -> Ipv6Addr {
        self.0.into()
    }

    pub fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Returns an address with all but the first `prefix_len` bits cleared.
    pub fn to_min(self, prefix_len: u8) -> Self {
        if prefix_len >= 128 {
            self
        }
        else {
            Addr(self.0 & !(!0 >> u32::from(prefix_len)))
        }
    }

    /// Returns an address with all but the first `prefix_len` bits set.
    pub fn to_max(self, prefix_len: u8) -> Self {
        if prefix_len >= 128 {
            self
        }
        else {
            Addr(self.0 | (!0 >> u32::from(prefix_len)))
        }
    }

    /// Parses an address of the given family.
    pub fn from_str_family(
        s: &str, family: AddressFamily
    ) -> Result<Self, FromStrError> {
        match family {
            AddressFamily::Ipv4 => {
                Ipv4Addr::from_str(s.trim()).map(Addr::from_v4)
            }
            AddressFamily::Ipv6 => {
                Ipv6Addr::from_str(s.trim()).map(Addr::from_v6)
            }
        }.map_err(|_| FromStrError::BadAddress)
    }

    fn fmt_family(
        self, family: AddressFamily, f: &mut fmt::Formatter
    ) -> fmt::Result {
        match family {
            AddressFamily::Ipv4 => fmt::Display::fmt(&self.to_v4(), f),
            AddressFamily::Ipv6 => fmt::Display::fmt(&self.to_v6(), f),
        }
    }
}


//------------ Prefix --------------------------------------------------------

/// An IP address prefix.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Prefix {
    /// The address of the prefix with all unused bits cleared.
    addr: Addr,

    /// The length of the prefix, never more than 128.
    len: u8,
}

impl Prefix {
    /// Creates a new prefix from an address and a length.
    ///
    /// Bits beyond the length are cleared and a length above 128 is
    /// truncated.
    pub fn new(addr: Addr, len: u8) -> Self {
        let len = len.min(128);
        Prefix { addr: addr.to_min(len), len }
    }

    pub fn addr(self) -> Addr {
        self.addr
    }

    pub fn addr_len(self) -> u8 {
        self.len
    }

    /// The smallest address covered by the prefix.
    pub fn min(self) -> Addr {
        self.addr
    }

    /// The largest address covered by the prefix.
    pub fn max(self) -> Addr {
        self.addr.to_max(self.len)
    }

    /// Parses a prefix in `addr/len` notation for the given family.
    pub fn from_str_family(
        s: &str, family: AddressFamily
    ) -> Result<Self, FromStrError> {
        let pos = s.find('/').ok_or(FromStrError::MissingLength)?;
        let addr = Addr::from_str_family(&s[..pos], family)?;
        let len = u8::from_str(s[pos + 1..].trim()).map_err(|_| {
            FromStrError::BadLength
        })?;
        if len > family.max_addr_len() {
            return Err(FromStrError::BadLength)
        }
        if addr.to_min(len) != addr {
            return Err(FromStrError::HostBitsSet)
        }
        Ok(Prefix::new(addr, len))
    }

    /// Returns a value that displays the prefix for the given family.
    pub fn display(self, family: AddressFamily) -> impl fmt::Display {
        DisplayFamily(family, self)
    }

    fn fmt_family(
        self, family: AddressFamily, f: &mut fmt::Formatter
    ) -> fmt::Result {
        self.addr.fmt_family(family, f)?;
        write!(f, "/{}", self.len)
    }
}

/// # Decoding and Encoding
///
/// ```txt
/// IPAddress          ::= BIT STRING
/// ```
///
/// Only the leading bits of the address are present. The bits are packed
/// into the shortest possible octet sequence with the unused bits of the
/// last octet required to be zero.
impl Prefix {
    /// Takes a prefix of the given family from the beginning of a value.
    pub fn take_from_with_family<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        family: AddressFamily,
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_value_if(Tag::BIT_STRING, |content| {
            Self::parse_content_with_family(content, family)
        })
    }

    /// Parses the content of a BIT STRING as a prefix.
    pub fn parse_content_with_family<S: decode::Source>(
        content: &mut decode::Content<S>,
        family: AddressFamily,
    ) -> Result<Self, DecodeError<S::Error>> {
        let bits = BitString::from_content(content)?;
        Self::from_bit_string(&bits, family).map_err(|msg| {
            content.content_err(msg)
        })
    }

    fn from_bit_string(
        bits: &BitString, family: AddressFamily
    ) -> Result<Self, &'static str> {
        let octets = bits.octet_bytes();
        let unused = bits.unused();
        if octets.len() > 16 {
            return Err("invalid address prefix")
        }
        let len = octets.len() * 8 - usize::from(unused);
        if len > usize::from(family.max_addr_len()) {
            return Err("prefix too long for address family")
        }
        if let Some(last) = octets.last() {
            if last & ((1u8 << unused) - 1) != 0 {
                return Err("non-zero padding bits in address prefix")
            }
        }
        let mut addr = [0u8; 16];
        addr[..octets.len()].copy_from_slice(octets.as_ref());
        Ok(Prefix::new(Addr(u128::from_be_bytes(addr)), len as u8))
    }

    /// Returns the number of octets needed for the address bits.
    fn octet_len(self) -> usize {
        (usize::from(self.len) + 7) / 8
    }
}


//--- PrimitiveContent

impl PrimitiveContent for Prefix {
    const TAG: Tag = Tag::BIT_STRING;

    fn encoded_len(&self, _: Mode) -> usize {
        self.octet_len() + 1
    }

    fn write_encoded<W: io::Write>(
        &self,
        _: Mode,
        target: &mut W
    ) -> Result<(), io::Error> {
        // The address has all bits past the length cleared, so the padding
        // is zero already.
        let unused = (self.octet_len() * 8 - usize::from(self.len)) as u8;
        target.write_all(&[unused])?;
        target.write_all(&self.addr.to_bytes()[..self.octet_len()])
    }
}


//------------ IpBlock -------------------------------------------------------

/// A block of consecutive addresses.
///
/// A block that covers exactly one prefix is always kept as the `Prefix`
/// variant so that it is encoded in its minimal form.
#[derive(Clone, Copy, Debug)]
pub enum IpBlock {
    Prefix(Prefix),
    Range(AddressRange),
}

impl IpBlock {
    /// Creates a block from the smallest and largest address.
    ///
    /// If the two addresses swapped, they are swapped back.
    pub fn from_bounds(min: Addr, max: Addr) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let diff = min.0 ^ max.0;
        let len = diff.leading_zeros();
        let is_prefix = min.0 & diff == 0 && (
            len == 0 || len == 128 || diff == !0 >> len
        );
        if is_prefix {
            IpBlock::Prefix(Prefix::new(min, len as u8))
        }
        else {
            IpBlock::Range(AddressRange { min, max })
        }
    }

    pub fn min(&self) -> Addr {
        match *self {
            IpBlock::Prefix(prefix) => prefix.min(),
            IpBlock::Range(range) => range.min,
        }
    }

    pub fn max(&self) -> Addr {
        match *self {
            IpBlock::Prefix(prefix) => prefix.max(),
            IpBlock::Range(range) => range.max,
        }
    }

    /// Parses a block of the given family.
    ///
    /// Accepted are a prefix in `addr/len` notation, a range in
    /// `addr-addr` notation, and a single address.
    pub fn from_str_family(
        s: &str, family: AddressFamily
    ) -> Result<Self, FromStrError> {
        if s.contains('/') {
            Prefix::from_str_family(s, family).map(IpBlock::Prefix)
        }
        else if let Some(pos) = s.find('-') {
            let min = Addr::from_str_family(&s[..pos], family)?;
            let max = Addr::from_str_family(&s[pos + 1..], family)?;
            let max = max.to_max(family.max_addr_len());
            if min > max {
                return Err(FromStrError::BadRange)
            }
            Ok(IpBlock::from_bounds(min, max))
        }
        else {
            let addr = Addr::from_str_family(s, family)?;
            Ok(IpBlock::Prefix(Prefix::new(addr, family.max_addr_len())))
        }
    }

    pub fn display(self, family: AddressFamily) -> impl fmt::Display {
        DisplayFamily(family, self)
    }

    fn fmt_family(
        self, family: AddressFamily, f: &mut fmt::Formatter
    ) -> fmt::Result {
        match self {
            IpBlock::Prefix(prefix) => prefix.fmt_family(family, f),
            IpBlock::Range(range) => {
                range.min.fmt_family(family, f)?;
                f.write_str("-")?;
                range.max.fmt_family(family, f)
            }
        }
    }
}

/// # Decoding and Encoding
///
/// ```txt
/// IPAddressOrRange   ::= CHOICE {
///     addressPrefix      IPAddress,
///     addressRange       IPAddressRange }
///
/// IPAddressRange     ::= SEQUENCE {
///     min                IPAddress,
///     max                IPAddress }
/// ```
impl IpBlock {
    pub fn take_opt_from_with_family<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        family: AddressFamily,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_value(|tag, content| {
            if tag == Tag::BIT_STRING {
                Prefix::parse_content_with_family(content, family)
                    .map(IpBlock::Prefix)
            }
            else if tag == Tag::SEQUENCE {
                let cons = content.as_constructed()?;
                let min = Prefix::take_from_with_family(cons, family)?;
                let max = Prefix::take_from_with_family(cons, family)?;
                if min.min() > max.max() {
                    return Err(cons.content_err("invalid address range"))
                }
                Ok(IpBlock::from_bounds(min.min(), max.max()))
            }
            else {
                Err(content.content_err("invalid IP resources"))
            }
        })
    }

    pub fn encode(self) -> impl encode::Values {
        match self {
            IpBlock::Prefix(prefix) => encode::Choice2::One(prefix.encode()),
            IpBlock::Range(range) => {
                encode::Choice2::Two(encode::sequence((
                    range.min_to_prefix().encode(),
                    range.max_to_prefix().encode(),
                )))
            }
        }
    }
}


//--- From

impl From<Prefix> for IpBlock {
    fn from(prefix: Prefix) -> Self {
        IpBlock::Prefix(prefix)
    }
}


//--- PartialEq and Eq

impl PartialEq for IpBlock {
    fn eq(&self, other: &Self) -> bool {
        self.min() == other.min() && self.max() == other.max()
    }
}

impl Eq for IpBlock { }


//--- Block

impl Block for IpBlock {
    type Item = Addr;

    fn new(min: Addr, max: Addr) -> Self {
        IpBlock::from_bounds(min, max)
    }

    fn min(&self) -> Addr {
        IpBlock::min(self)
    }

    fn max(&self) -> Addr {
        IpBlock::max(self)
    }

    fn next(item: Addr) -> Option<Addr> {
        item.0.checked_add(1).map(Addr)
    }

    fn previous(item: Addr) -> Option<Addr> {
        item.0.checked_sub(1).map(Addr)
    }
}


//------------ AddressRange --------------------------------------------------

/// A range of addresses that isn’t a prefix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AddressRange {
    min: Addr,
    max: Addr,
}

impl AddressRange {
    pub fn min(self) -> Addr {
        self.min
    }

    pub fn max(self) -> Addr {
        self.max
    }

    /// The prefix for the minimum address with all trailing zeros dropped.
    fn min_to_prefix(self) -> Prefix {
        Prefix::new(self.min, 128 - self.min.0.trailing_zeros() as u8)
    }

    /// The prefix for the maximum address with all trailing ones dropped.
    fn max_to_prefix(self) -> Prefix {
        Prefix::new(self.max, 128 - (!self.max.0).trailing_zeros() as u8)
    }
}


//------------ IpBlocks ------------------------------------------------------

/// A normalized set of addresses of one family.
///
/// The family itself is not part of the value and has to be supplied
/// whenever it matters.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IpBlocks(Chain<IpBlock>);

impl IpBlocks {
    pub fn empty() -> Self {
        IpBlocks(Chain::empty())
    }

    /// Creates blocks covering the complete address space.
    ///
    /// Because of the way addresses are kept, this is the same value for
    /// both families.
    pub fn all() -> Self {
        IpBlocks(Chain::single(IpBlock::Prefix(Prefix::new(Addr(0), 0))))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpBlock> {
        self.0.iter()
    }

    /// Returns whether all of `other` is part of `self`.
    pub fn contains(&self, other: &Self) -> bool {
        other.0.is_encompassed(&self.0)
    }

    /// Returns whether the prefix is covered by the blocks.
    pub fn contains_prefix(&self, prefix: Prefix) -> bool {
        Chain::single(IpBlock::Prefix(prefix)).is_encompassed(&self.0)
    }

    pub fn intersection(&self, other: &Self) -> Self {
        IpBlocks(self.0.intersection(&other.0))
    }

    pub fn union(&self, other: &Self) -> Self {
        IpBlocks(self.0.union(&other.0))
    }

    pub fn difference(&self, other: &Self) -> Self {
        IpBlocks(self.0.difference(&other.0))
    }

    /// Parses a comma separated list of blocks of the given family.
    pub fn from_str_family(
        s: &str, family: AddressFamily
    ) -> Result<Self, FromStrError> {
        let mut blocks = Vec::new();
        for item in s.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue
            }
            blocks.push(IpBlock::from_str_family(item, family)?);
        }
        Ok(blocks.into_iter().collect())
    }

    pub fn display(&self, family: AddressFamily) -> impl fmt::Display + '_ {
        DisplayFamily(family, self)
    }

    fn fmt_family(
        &self, family: AddressFamily, f: &mut fmt::Formatter
    ) -> fmt::Result {
        let mut first = true;
        for block in self.iter() {
            if first {
                first = false;
            }
            else {
                f.write_str(", ")?;
            }
            block.fmt_family(family, f)?;
        }
        Ok(())
    }
}

/// # Decoding and Encoding
///
/// ```txt
/// addressesOrRanges  ::= SEQUENCE OF IPAddressOrRange
/// ```
impl IpBlocks {
    pub fn parse_content_with_family<S: decode::Source>(
        content: &mut decode::Content<S>,
        family: AddressFamily,
    ) -> Result<Self, DecodeError<S::Error>> {
        let cons = content.as_constructed()?;
        let mut blocks = Vec::new();
        while let Some(block) = IpBlock::take_opt_from_with_family(
            cons, family
        )? {
            blocks.push(block)
        }
        Ok(blocks.into_iter().collect())
    }

    pub fn encode_ref(&self) -> impl encode::Values + '_ {
        encode::sequence(
            encode::slice(self.0.as_slice(), |block| block.encode())
        )
    }
}


//--- FromIterator

impl FromIterator<IpBlock> for IpBlocks {
    fn from_iter<I: IntoIterator<Item = IpBlock>>(iter: I) -> Self {
        IpBlocks(Chain::from_iter(iter))
    }
}

impl FromIterator<Prefix> for IpBlocks {
    fn from_iter<I: IntoIterator<Item = Prefix>>(iter: I) -> Self {
        iter.into_iter().map(IpBlock::Prefix).collect()
    }
}


//------------ DisplayFamily -------------------------------------------------

/// Helper for displaying values that need to know their address family.
struct DisplayFamily<T>(AddressFamily, T);

impl fmt::Display for DisplayFamily<Prefix> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.1.fmt_family(self.0, f)
    }
}

impl fmt::Display for DisplayFamily<IpBlock> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.1.fmt_family(self.0, f)
    }
}

impl<'a> fmt::Display for DisplayFamily<&'a IpBlocks> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.1.fmt_family(self.0, f)
    }
}


//------------ FromStrError --------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FromStrError {
    BadAddress,
    MissingLength,
    BadLength,
    HostBitsSet,
    BadRange,
}

impl fmt::Display for FromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            FromStrError::BadAddress => "invalid address",
            FromStrError::MissingLength => "missing prefix length",
            FromStrError::BadLength => "invalid prefix length",
            FromStrError::HostBitsSet => "host bits set in prefix",
            FromStrError::BadRange => "invalid address range",
        })
    }
}

impl error::Error for FromStrError { }


//============ Tests =========================================================
