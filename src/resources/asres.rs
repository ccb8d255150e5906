//! Autonomous System number resources.
//!
//! The types herein are defined in [RFC 3779] for use with certificates in
//! general. [RFC 6487] restricts them for RPKI: routing domain identifiers
//! must not be used and only the `asnum` choice may carry resources.
//!
//! [RFC 3779]: https://tools.ietf.org/html/rfc3779
//! [RFC 6487]: https://tools.ietf.org/html/rfc6487

use std::{error, fmt};
use std::iter::FromIterator;
use std::str::FromStr;
use bcder::{decode, encode};
use bcder::Tag;
use bcder::decode::DecodeError;
use bcder::encode::PrimitiveContent;
use super::chain::{Block, Chain};


//------------ Asn -----------------------------------------------------------

/// An AS number (ASN).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Asn(u32);

impl Asn {
    pub const MIN: Asn = Asn(u32::MIN);
    pub const MAX: Asn = Asn(u32::MAX);

    pub fn from_u32(value: u32) -> Self {
        Asn(value)
    }

    pub fn into_u32(self) -> u32 {
        self.0
    }

    /// Takes an AS number from the beginning of an encoded value.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_u32().map(Asn)
    }

    /// Parses the content of an AS number value.
    pub fn parse_content<S: decode::Source>(
        content: &mut decode::Content<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        content.to_u32().map(Asn)
    }

    pub fn encode(self) -> impl encode::Values {
        self.0.encode()
    }
}


//--- From and FromStr

impl From<u32> for Asn {
    fn from(id: u32) -> Self {
        Asn(id)
    }
}

impl From<Asn> for u32 {
    fn from(id: Asn) -> Self {
        id.0
    }
}

impl FromStr for Asn {
    type Err = FromStrError;

    /// Parses an AS number with or without the `AS` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = if s.len() > 2 && s[..2].eq_ignore_ascii_case("as") {
            &s[2..]
        }
        else {
            s
        };
        u32::from_str(s).map(Asn).map_err(|_| FromStrError::BadAsn)
    }
}


//--- Display

impl fmt::Display for Asn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AS{}", self.0)
    }
}


//------------ AsBlock -------------------------------------------------------

/// A block of consecutive AS numbers.
///
/// A block covering a single number is always kept as the `Id` variant so
/// that it is encoded in its minimal form.
#[derive(Clone, Copy, Debug)]
pub enum AsBlock {
    /// The block is a single AS number.
    Id(Asn),

    /// The block is a range of AS numbers.
    Range(AsRange),
}

impl AsBlock {
    /// Creates a block from its bounds.
    ///
    /// If `min` is larger than `max`, the two are swapped.
    pub fn from_bounds(min: Asn, max: Asn) -> Self {
        if min == max {
            AsBlock::Id(min)
        }
        else if min < max {
            AsBlock::Range(AsRange { min, max })
        }
        else {
            AsBlock::Range(AsRange { min: max, max: min })
        }
    }

    /// The smallest AS number that is part of this block.
    pub fn min(&self) -> Asn {
        match *self {
            AsBlock::Id(id) => id,
            AsBlock::Range(ref range) => range.min,
        }
    }

    /// The largest AS number that is still part of this block.
    pub fn max(&self) -> Asn {
        match *self {
            AsBlock::Id(id) => id,
            AsBlock::Range(ref range) => range.max,
        }
    }
}

/// # Decoding and Encoding
///
/// ```txt
/// ASIdOrRange        ::= CHOICE {
///     id                 ASId,
///     range              ASRange }
///
/// ASRange            ::= SEQUENCE {
///     min                ASId,
///     max                ASId }
/// ```
impl AsBlock {
    /// Takes an optional AS block from the beginning of an encoded value.
    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_value(|tag, content| {
            if tag == Tag::INTEGER {
                Asn::parse_content(content).map(AsBlock::Id)
            }
            else if tag == Tag::SEQUENCE {
                let cons = content.as_constructed()?;
                let min = Asn::take_from(cons)?;
                let max = Asn::take_from(cons)?;
                if min > max {
                    return Err(cons.content_err("invalid AS range"))
                }
                Ok(AsBlock::from_bounds(min, max))
            }
            else {
                Err(content.content_err("invalid AS resources"))
            }
        })
    }

    pub fn encode(self) -> impl encode::Values {
        match self {
            AsBlock::Id(id) => encode::Choice2::One(id.encode()),
            AsBlock::Range(range) => {
                encode::Choice2::Two(encode::sequence((
                    range.min.encode(),
                    range.max.encode(),
                )))
            }
        }
    }
}


//--- From and FromStr

impl From<Asn> for AsBlock {
    fn from(id: Asn) -> Self {
        AsBlock::Id(id)
    }
}

impl From<(Asn, Asn)> for AsBlock {
    fn from((min, max): (Asn, Asn)) -> Self {
        AsBlock::from_bounds(min, max)
    }
}

impl FromStr for AsBlock {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.find('-') {
            None => Ok(AsBlock::Id(Asn::from_str(s)?)),
            Some(pos) => {
                let min = Asn::from_str(&s[..pos])?;
                let max = Asn::from_str(&s[pos + 1..])?;
                if min > max {
                    Err(FromStrError::BadRange)
                }
                else {
                    Ok(AsBlock::from_bounds(min, max))
                }
            }
        }
    }
}


//--- PartialEq and Eq

impl PartialEq for AsBlock {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent(other)
    }
}

impl Eq for AsBlock { }

impl AsBlock {
    fn is_equivalent(&self, other: &Self) -> bool {
        self.min() == other.min() && self.max() == other.max()
    }
}


//--- Block

impl Block for AsBlock {
    type Item = Asn;

    fn new(min: Asn, max: Asn) -> Self {
        AsBlock::from_bounds(min, max)
    }

    fn min(&self) -> Asn {
        AsBlock::min(self)
    }

    fn max(&self) -> Asn {
        AsBlock::max(self)
    }

    fn next(item: Asn) -> Option<Asn> {
        item.0.checked_add(1).map(Asn)
    }

    fn previous(item: Asn) -> Option<Asn> {
        item.0.checked_sub(1).map(Asn)
    }
}


//--- Display

impl fmt::Display for AsBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AsBlock::Id(id) => fmt::Display::fmt(&id, f),
            AsBlock::Range(ref range) => fmt::Display::fmt(range, f),
        }
    }
}


//------------ AsRange -------------------------------------------------------

/// A range of AS numbers spanning more than one number.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AsRange {
    min: Asn,
    max: Asn,
}

impl AsRange {
    pub fn min(self) -> Asn {
        self.min
    }

    pub fn max(self) -> Asn {
        self.max
    }
}

impl fmt::Display for AsRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}


//------------ AsBlocks ------------------------------------------------------

/// A normalized set of AS numbers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AsBlocks(Chain<AsBlock>);

impl AsBlocks {
    /// Creates empty AS blocks.
    pub fn empty() -> Self {
        AsBlocks(Chain::empty())
    }

    /// Creates AS blocks covering all AS numbers.
    pub fn all() -> Self {
        AsBlocks(Chain::single(AsBlock::from_bounds(Asn::MIN, Asn::MAX)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AsBlock> {
        self.0.iter()
    }

    /// Returns whether the AS number is part of the blocks.
    pub fn contains_asn(&self, asn: Asn) -> bool {
        self.0.contains_item(asn)
    }

    /// Returns whether all of `other` is part of `self`.
    pub fn contains(&self, other: &Self) -> bool {
        other.0.is_encompassed(&self.0)
    }

    pub fn intersection(&self, other: &Self) -> Self {
        AsBlocks(self.0.intersection(&other.0))
    }

    pub fn union(&self, other: &Self) -> Self {
        AsBlocks(self.0.union(&other.0))
    }

    pub fn difference(&self, other: &Self) -> Self {
        AsBlocks(self.0.difference(&other.0))
    }
}

/// # Decoding and Encoding
///
/// ```txt
/// asIdsOrRanges      ::= SEQUENCE OF ASIdOrRange
/// ```
impl AsBlocks {
    /// Parses the content of a sequence of AS blocks.
    pub fn parse_content<S: decode::Source>(
        content: &mut decode::Content<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let cons = content.as_constructed()?;
        let mut blocks = Vec::new();
        while let Some(block) = AsBlock::take_opt_from(cons)? {
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

impl FromIterator<AsBlock> for AsBlocks {
    fn from_iter<I: IntoIterator<Item = AsBlock>>(iter: I) -> Self {
        AsBlocks(Chain::from_iter(iter))
    }
}

impl FromIterator<Asn> for AsBlocks {
    fn from_iter<I: IntoIterator<Item = Asn>>(iter: I) -> Self {
        iter.into_iter().map(AsBlock::Id).collect()
    }
}


//--- FromStr

impl FromStr for AsBlocks {
    type Err = FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut blocks = Vec::new();
        for item in s.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue
            }
            blocks.push(AsBlock::from_str(item)?);
        }
        Ok(blocks.into_iter().collect())
    }
}


//--- Display

impl fmt::Display for AsBlocks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut iter = self.iter();
        if let Some(el) = iter.next() {
            fmt::Display::fmt(el, f)?;
        }
        for el in iter {
            write!(f, ", {}", el)?;
        }
        Ok(())
    }
}


//------------ FromStrError --------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FromStrError {
    BadAsn,
    BadRange,
}

impl fmt::Display for FromStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            FromStrError::BadAsn => "bad AS number, expected format AS#",
            FromStrError::BadRange => "bad AS range, expected format AS#-AS#",
        })
    }
}

impl error::Error for FromStrError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use bcder::Mode;
    use bcder::encode::Values;
    use super::*;

    #[test]
    fn asn_from_str() {
        assert_eq!(Asn::from_str("AS64496"), Ok(Asn(64496)));
        assert_eq!(Asn::from_str("as64496"), Ok(Asn(64496)));
        assert_eq!(Asn::from_str("64496"), Ok(Asn(64496)));
        assert_eq!(Asn::from_str("AS"), Err(FromStrError::BadAsn));
        assert_eq!(Asn::from_str("AS4294967296"), Err(FromStrError::BadAsn));
    }

    #[test]
    fn blocks_from_str_and_display() {
        let blocks = AsBlocks::from_str("AS3, AS1-AS2, AS10-AS20").unwrap();
        assert_eq!(blocks.to_string(), "AS1-AS3, AS10-AS20");
        assert!(blocks.contains_asn(Asn(15)));
        assert!(!blocks.contains_asn(Asn(9)));
        assert_eq!(
            AsBlocks::from_str("AS5-AS3"), Err(FromStrError::BadRange)
        );
    }

    #[test]
    fn set_operations() {
        let outer = AsBlocks::from_str("AS1-AS100").unwrap();
        let inner = AsBlocks::from_str("AS5, AS50-AS60").unwrap();
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert_eq!(
            outer.difference(&inner).to_string(),
            "AS1-AS4, AS6-AS49, AS61-AS100"
        );
        assert_eq!(
            inner.intersection(&AsBlocks::from_str("AS55-AS70").unwrap())
                .to_string(),
            "AS55-AS60"
        );
        assert_eq!(
            inner.union(&AsBlocks::from_str("AS6").unwrap()).to_string(),
            "AS5-AS6, AS50-AS60"
        );
    }

    #[test]
    fn encode_minimal() {
        let blocks = AsBlocks::from_str("AS1, AS3-AS4").unwrap();
        assert_eq!(
            blocks.encode_ref().to_captured(Mode::Der).as_slice(),
            b"\x30\x0b\x02\x01\x01\x30\x06\x02\x01\x03\x02\x01\x04".as_ref()
        );
        let decoded = Mode::Der.decode(
            b"\x30\x0b\x02\x01\x01\x30\x06\x02\x01\x03\x02\x01\x04".as_ref(),
            |cons| cons.take_value_if(Tag::SEQUENCE, AsBlocks::parse_content)
        ).unwrap();
        assert_eq!(decoded, blocks);
    }

    #[test]
    fn reversed_range_is_malformed() {
        assert!(Mode::Der.decode(
            b"\x30\x08\x30\x06\x02\x01\x04\x02\x01\x03".as_ref(),
            |cons| cons.take_value_if(Tag::SEQUENCE, AsBlocks::parse_content)
        ).is_err());
    }
}
