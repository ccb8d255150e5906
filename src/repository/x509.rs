//! Types common to all things X.509.

use std::{error, fmt, io, ops, str};
use std::str::FromStr;
use bcder::{decode, encode};
use bcder::{
    BitString, Captured, ConstOid, Mode, OctetString, Oid, Tag, Unsigned,
};
use bcder::decode::{ContentError, DecodeError, Source};
use bcder::encode::{PrimitiveContent, Values};
use bcder::string::PrintableString;
use bytes::Bytes;
use chrono::{
    Datelike, DateTime, Duration, SecondsFormat, Timelike, TimeZone, Utc
};
use crate::oid;
use crate::crypto::{
    PublicKey, Signature, SignatureAlgorithm, SignatureVerificationError,
    Signer,
};


//------------ Functions -----------------------------------------------------

/// Returns an encoder for a single certificate or CRL extension.
pub fn encode_extension<V: encode::Values>(
    oid: &'static ConstOid,
    critical: bool,
    content: V
) -> impl encode::Values {
    encode::sequence((
        oid.encode(),
        if critical {
            Some(critical.encode())
        }
        else {
            None
        },
        OctetString::encode_wrapped(Mode::Der, content)
    ))
}


//------------ Name ----------------------------------------------------------

/// An X.500 distinguished name.
///
/// The name is kept in its encoded form. Two names are equal if their
/// encodings are.
#[derive(Clone, Debug)]
pub struct Name(Captured);

impl Name {
    pub(crate) fn from_captured(captured: Captured) -> Self {
        Name(captured)
    }

    /// Creates a name consisting of a single common name.
    ///
    /// The common name is encoded as a PrintableString if possible and as
    /// a UTF8String otherwise.
    pub fn from_common_name(cn: &str) -> Self {
        let tag = if PrintableString::from_str(cn).is_ok() {
            Tag::PRINTABLE_STRING
        }
        else {
            Tag::UTF8_STRING
        };
        Name(
            encode::sequence(
                encode::set(
                    encode::sequence((
                        oid::AT_COMMON_NAME.encode(),
                        OctetString::encode_slice_as(cn.as_bytes(), tag),
                    ))
                )
            ).to_captured(Mode::Der)
        )
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.capture(|cons| {
            cons.take_sequence(|cons| { // RDNSequence
                while let Some(()) = cons.take_opt_set(|cons| {
                    let mut empty = true;
                    while let Some(()) = cons.take_opt_sequence(|cons| {
                        empty = false;
                        Oid::skip_in(cons)?;
                        if cons.skip_one()?.is_none() {
                            return Err(cons.content_err(
                                "missing attribute value in name"
                            ))
                        }
                        Ok(())
                    })? { }
                    if empty {
                        return Err(cons.content_err(
                            "empty relative distinguished name"
                        ));
                    }
                    Ok(())
                })? { }
                Ok(())
            })
        }).map(Name)
    }

    pub fn encode_ref(&self) -> impl encode::Values + '_ {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Returns all attributes of the name in order.
    ///
    /// String values are converted lossily. Values of other types are
    /// returned as their hex-encoded content.
    pub fn attributes(&self) -> Vec<NameAttribute> {
        self.0.clone().decode(|cons| {
            let mut res = Vec::new();
            cons.take_sequence(|cons| {
                while let Some(()) = cons.take_opt_set(|cons| {
                    while let Some(attr) = cons.take_opt_sequence(|cons| {
                        NameAttribute::take_content_from(cons)
                    })? {
                        res.push(attr)
                    }
                    Ok(())
                })? { }
                Ok(())
            })?;
            Ok(res)
        }).unwrap_or_default()
    }

    /// Returns the value of the first common name attribute.
    pub fn common_name(&self) -> Option<String> {
        self.attributes().into_iter().find(|attr| {
            attr.oid == oid::AT_COMMON_NAME
        }).map(|attr| attr.value)
    }

    /// Returns whether the name follows the restrictions for RPKI.
    ///
    /// [RFC 6487] requires exactly one common name attribute which should
    /// be a PrintableString. UTF8String is tolerated. An optional serial
    /// number attribute must be a PrintableString. Any other attribute is
    /// not allowed.
    ///
    /// [RFC 6487]: https://tools.ietf.org/html/rfc6487
    pub fn is_rpki_conformant(&self) -> bool {
        let attrs = self.attributes();
        if attrs.is_empty() {
            return false
        }
        let mut cn = 0;
        let mut sn = 0;
        for attr in &attrs {
            if attr.oid == oid::AT_COMMON_NAME {
                if
                    attr.tag != Tag::PRINTABLE_STRING
                    && attr.tag != Tag::UTF8_STRING
                {
                    return false
                }
                cn += 1;
            }
            else if attr.oid == oid::AT_SERIAL_NUMBER {
                if attr.tag != Tag::PRINTABLE_STRING {
                    return false
                }
                sn += 1;
            }
            else {
                return false
            }
        }
        cn == 1 && sn <= 1
    }
}


//--- PartialEq and Eq

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for Name {}


//--- Display

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for attr in self.attributes() {
            if first {
                first = false
            }
            else {
                f.write_str(", ")?;
            }
            if attr.oid == oid::AT_COMMON_NAME {
                f.write_str("CN=")?;
            }
            else if attr.oid == oid::AT_SERIAL_NUMBER {
                f.write_str("SERIALNUMBER=")?;
            }
            else {
                write!(f, "{}=", attr.oid)?;
            }
            f.write_str(&attr.value)?;
        }
        Ok(())
    }
}


//------------ NameAttribute -------------------------------------------------

/// A single attribute of a distinguished name.
#[derive(Clone, Debug)]
pub struct NameAttribute {
    oid: Oid<Bytes>,
    tag: Tag,
    value: String,
}

impl NameAttribute {
    pub fn oid(&self) -> &Oid<Bytes> {
        &self.oid
    }

    /// Returns the tag of the attribute value.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn take_content_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let oid = Oid::take_from(cons)?;
        let (tag, value) = cons.take_value(|tag, content| {
            let value = match *content {
                decode::Content::Primitive(ref mut prim) => {
                    let bytes = prim.take_all()?;
                    if is_string_tag(tag) {
                        String::from_utf8_lossy(bytes.as_ref()).into_owned()
                    }
                    else {
                        hex(bytes.as_ref())
                    }
                }
                decode::Content::Constructed(ref mut cons) => {
                    hex(cons.capture_all()?.as_slice())
                }
            };
            Ok((tag, value))
        })?;
        Ok(NameAttribute { oid, tag, value })
    }
}

fn is_string_tag(tag: Tag) -> bool {
    tag == Tag::PRINTABLE_STRING || tag == Tag::UTF8_STRING
        || tag == Tag::IA5_STRING || tag == Tag::TELETEX_STRING
        || tag == Tag::BMP_STRING || tag == Tag::UNIVERSAL_STRING
}

fn hex(data: &[u8]) -> String {
    let mut res = String::with_capacity(data.len() * 2 + 1);
    res.push('#');
    for ch in data {
        res.push_str(&format!("{:02x}", ch));
    }
    res
}


//------------ Serial --------------------------------------------------------

/// A certificate serial number.
///
/// RFC 5280 limits serial numbers to 20 octets. We keep them left padded
/// in an array of that size.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Serial([u8; 20]);

impl Serial {
    /// Creates a serial number from the octets of an unsigned integer.
    pub fn from_slice(s: &[u8]) -> Result<Self, SerialError> {
        if s.is_empty() {
            return Err(SerialError)
        }

        // Skip the leading zero that keeps the integer unsigned.
        let s = match s.iter().position(|&ch| ch != 0) {
            Some(start) => &s[start..],
            None => return Ok(Serial::default()),
        };
        if s.len() > 20 || (s.len() == 20 && s[0] & 0x80 != 0) {
            return Err(SerialError)
        }
        let mut res = [0u8; 20];
        res[20 - s.len()..].copy_from_slice(s);
        Ok(Serial(res))
    }

    /// Creates a random new serial number.
    pub fn random<S: Signer>(signer: &S) -> Result<Self, S::Error> {
        let mut res = [0u8; 20];
        signer.rand(&mut res)?;
        res[0] &= 0x7F;
        Ok(Serial(res))
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let value = Unsigned::take_from(cons)?;
        Self::from_slice(value.as_ref()).map_err(|err| cons.content_err(err))
    }

    /// Returns the octets of the serial without leading zeros.
    pub fn as_slice(&self) -> &[u8] {
        match self.0.iter().position(|&ch| ch != 0) {
            Some(start) => &self.0[start..],
            None => &self.0[19..],
        }
    }

    /// Returns the index of the first octet to encode.
    fn start(&self) -> usize {
        let start = 20 - self.as_slice().len();
        if self.0[start] & 0x80 != 0 {
            start - 1
        }
        else {
            start
        }
    }
}

impl From<u64> for Serial {
    fn from(value: u64) -> Self {
        let mut res = [0u8; 20];
        res[12..].copy_from_slice(&value.to_be_bytes());
        Serial(res)
    }
}

impl PrimitiveContent for Serial {
    const TAG: Tag = Tag::INTEGER;

    fn encoded_len(&self, _mode: Mode) -> usize {
        20 - self.start()
    }

    fn write_encoded<W: io::Write>(
        &self,
        _mode: Mode,
        target: &mut W
    ) -> Result<(), io::Error> {
        target.write_all(&self.0[self.start()..])
    }
}

impl fmt::Display for Serial {
    /// Formats the serial as a decimal number.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut value = self.0;
        let mut digits = Vec::new();
        loop {
            let mut rem = 0u16;
            for octet in value.iter_mut() {
                let cur = (rem << 8) | u16::from(*octet);
                *octet = (cur / 10) as u8;
                rem = cur % 10;
            }
            digits.push(b'0' + rem as u8);
            if value.iter().all(|&octet| octet == 0) {
                break
            }
        }
        digits.reverse();
        f.write_str(
            str::from_utf8(&digits).map_err(|_| fmt::Error)?
        )
    }
}

impl fmt::Debug for Serial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Serial({})", self)
    }
}


//------------ SignedData ----------------------------------------------------

/// Data signed by a signature as used by certificates and CRLs.
///
/// ```txt
/// Certificate  ::=  SEQUENCE  {
///      tbsCertificate       TBSCertificate,
///      signatureAlgorithm   AlgorithmIdentifier,
///      signatureValue       BIT STRING  }
/// ```
///
/// The algorithm is kept as found so that profile validation can report
/// on unexpected algorithms.
#[derive(Clone, Debug)]
pub struct SignedData {
    data: Captured,
    algorithm: SignatureAlgorithm,
    value: Bytes,
}

impl SignedData {
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(Self::from_constructed)
    }

    pub fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        Ok(SignedData {
            data: cons.capture_one()?,
            algorithm: SignatureAlgorithm::take_from(cons)?,
            value: BitString::take_from(cons)?.octet_bytes(),
        })
    }

    /// Returns the encoded signed data, the _to-be-signed_ part.
    pub fn data(&self) -> &Captured {
        &self.data
    }

    /// Returns the signature algorithm of the outer structure.
    pub fn algorithm(&self) -> &SignatureAlgorithm {
        &self.algorithm
    }

    pub fn signature_value(&self) -> &Bytes {
        &self.value
    }

    /// Verifies the signature with the given public key.
    pub fn verify_signature(
        &self,
        public_key: &PublicKey
    ) -> Result<(), SignatureVerificationError> {
        let algorithm = self.algorithm.x509_signing_algorithm().ok_or(
            SignatureVerificationError::Algorithm
        )?;
        public_key.verify(
            self.data.as_ref(),
            &Signature::new(algorithm, self.value.clone())
        )
    }

    /// Returns the encoding of signed data from its parts.
    pub fn encode_signed(data: &Captured, signature: &Signature) -> Bytes {
        encode::sequence((
            data,
            signature.algorithm().x509_encode(),
            BitString::encode_slice(signature.value().as_ref(), 0),
        )).to_captured(Mode::Der).into_bytes()
    }
}


//------------ Time ----------------------------------------------------------

/// A point in time as used by certificates, CRLs and signed objects.
///
/// Values are limited to second precision.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time(DateTime<Utc>);

impl Time {
    pub fn new(dt: DateTime<Utc>) -> Self {
        Time(dt)
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Creates a time from its components in UTC.
    ///
    /// Returns `None` if the components don’t describe a valid time.
    pub fn utc(
        year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec).single().map(
            Time
        )
    }

    /// Creates a time from seconds since the Unix epoch.
    pub fn from_timestamp(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Time)
    }

    pub fn into_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Takes a time value in either format.
    ///
    /// ```txt
    /// Time ::= CHOICE {
    ///      utcTime        UTCTime,
    ///      generalTime    GeneralizedTime }
    /// ```
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        Self::take_with_format_from(cons).map(|(time, _)| time)
    }

    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(res) = cons.take_opt_primitive_if(
            Tag::UTC_TIME, take_utc_time
        )? {
            return Ok(Some(res))
        }
        cons.take_opt_primitive_if(Tag::GENERALIZED_TIME, take_general_time)
    }

    /// Takes a time value and reports which format was used.
    pub fn take_with_format_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<(Self, TimeFormat), DecodeError<S::Error>> {
        cons.take_primitive(|tag, prim| {
            if tag == Tag::UTC_TIME {
                take_utc_time(prim).map(|res| (res, TimeFormat::Utc))
            }
            else if tag == Tag::GENERALIZED_TIME {
                take_general_time(prim).map(|res| {
                    (res, TimeFormat::Generalized)
                })
            }
            else {
                Err(prim.content_err("expected time value"))
            }
        })
    }

    pub fn encode_utc_time(self) -> impl encode::Values {
        UtcTime(self).encode()
    }

    pub fn encode_generalized_time(self) -> impl encode::Values {
        GeneralizedTime(self).encode()
    }

    /// Encodes the time in the format RFC 5280 requires for its year.
    ///
    /// This is UTCTime for years 1950 through 2049 and GeneralizedTime
    /// otherwise.
    pub fn encode_varied(self) -> impl encode::Values {
        if self.year() < 1950 || self.year() > 2049 {
            (None, Some(self.encode_generalized_time()))
        }
        else {
            (Some(self.encode_utc_time()), None)
        }
    }
}

fn take_utc_time<S: decode::Source>(
    prim: &mut decode::Primitive<S>
) -> Result<Time, DecodeError<S::Error>> {
    // RFC 5280 requires the format YYMMDDHHMMSSZ
    let year = read_digits(prim, 2)? as i32;
    let year = if year >= 50 { year + 1900 } else { year + 2000 };
    take_rest_of_time(prim, year)
}

fn take_general_time<S: decode::Source>(
    prim: &mut decode::Primitive<S>
) -> Result<Time, DecodeError<S::Error>> {
    // RFC 5280 requires the format YYYYMMDDHHMMSSZ
    let year = read_digits(prim, 4)? as i32;
    take_rest_of_time(prim, year)
}

fn take_rest_of_time<S: decode::Source>(
    prim: &mut decode::Primitive<S>,
    year: i32,
) -> Result<Time, DecodeError<S::Error>> {
    let month = read_digits(prim, 2)?;
    let day = read_digits(prim, 2)?;
    let hour = read_digits(prim, 2)?;
    let minute = read_digits(prim, 2)?;
    let second = read_digits(prim, 2)?;
    if prim.take_u8()? != b'Z' {
        return Err(prim.content_err("malformed time value"))
    }
    Time::utc(year, month, day, hour, minute, second).ok_or_else(|| {
        prim.content_err("invalid time value")
    })
}

fn read_digits<S: decode::Source>(
    prim: &mut decode::Primitive<S>,
    count: usize,
) -> Result<u32, DecodeError<S::Error>> {
    let mut res = 0;
    for _ in 0..count {
        let ch = prim.take_u8()?;
        if !ch.is_ascii_digit() {
            return Err(prim.content_err("malformed time value"))
        }
        res = res * 10 + u32::from(ch - b'0');
    }
    Ok(res)
}


//--- Deref, From

impl ops::Deref for Time {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(time: DateTime<Utc>) -> Self {
        Time(time)
    }
}

impl From<Time> for DateTime<Utc> {
    fn from(time: Time) -> Self {
        time.0
    }
}


//--- Add and Sub

impl ops::Add<Duration> for Time {
    type Output = Self;

    fn add(self, duration: Duration) -> Self::Output {
        Time(self.0 + duration)
    }
}

impl ops::Sub<Duration> for Time {
    type Output = Self;

    fn sub(self, duration: Duration) -> Self::Output {
        Time(self.0 - duration)
    }
}


//--- Display

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}


//------------ TimeFormat ----------------------------------------------------

/// The encoding used for a time value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeFormat {
    Utc,
    Generalized,
}


//------------ UtcTime and GeneralizedTime -----------------------------------

struct UtcTime(Time);

impl PrimitiveContent for UtcTime {
    const TAG: Tag = Tag::UTC_TIME;

    fn encoded_len(&self, _: Mode) -> usize {
        13 // yyMMddhhmmssZ
    }

    fn write_encoded<W: io::Write>(
        &self, _: Mode, target: &mut W
    ) -> Result<(), io::Error> {
        write!(
            target, "{:02}{:02}{:02}{:02}{:02}{:02}Z",
            self.0.year() % 100, self.0.month(), self.0.day(),
            self.0.hour(), self.0.minute(), self.0.second()
        )
    }
}

struct GeneralizedTime(Time);

impl PrimitiveContent for GeneralizedTime {
    const TAG: Tag = Tag::GENERALIZED_TIME;

    fn encoded_len(&self, _: Mode) -> usize {
        15 // yyyyMMddhhmmssZ
    }

    fn write_encoded<W: io::Write>(
        &self, _: Mode, target: &mut W
    ) -> Result<(), io::Error> {
        write!(
            target, "{:04}{:02}{:02}{:02}{:02}{:02}Z",
            self.0.year(), self.0.month(), self.0.day(),
            self.0.hour(), self.0.minute(), self.0.second()
        )
    }
}


//------------ Validity ------------------------------------------------------

/// The validity period of a certificate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Validity {
    not_before: Time,
    not_after: Time,
}

impl Validity {
    pub fn new(not_before: Time, not_after: Time) -> Self {
        Validity { not_before, not_after }
    }

    /// Creates a validity starting now and lasting for the given duration.
    ///
    /// The start is truncated to full seconds.
    pub fn from_duration(duration: Duration) -> Self {
        let now = Time::now();
        let now = Time::from_timestamp(now.timestamp()).unwrap_or(now);
        Validity::new(now, now + duration)
    }

    pub fn not_before(self) -> Time {
        self.not_before
    }

    pub fn not_after(self) -> Time {
        self.not_after
    }

    /// Returns whether `now` is within the validity period.
    pub fn is_valid_at(self, now: Time) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            Ok(Validity::new(
                Time::take_from(cons)?,
                Time::take_from(cons)?,
            ))
        })
    }

    pub fn encode(self) -> impl encode::Values {
        encode::sequence((
            self.not_before.encode_varied(),
            self.not_after.encode_varied(),
        ))
    }
}


//------------ SerialError ---------------------------------------------------

/// A serial number was empty or too large.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SerialError;

impl From<SerialError> for ContentError {
    fn from(_: SerialError) -> ContentError {
        ContentError::from_static("invalid serial number")
    }
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid serial number")
    }
}

impl error::Error for SerialError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn decode_time(data: &[u8]) -> Result<(Time, TimeFormat), ()> {
        Mode::Der.decode(data, Time::take_with_format_from).map_err(|_| ())
    }

    #[test]
    fn time_formats() {
        let (time, format) = decode_time(b"\x17\x0d080901224329Z").unwrap();
        assert_eq!(time, Time::utc(2008, 9, 1, 22, 43, 29).unwrap());
        assert_eq!(format, TimeFormat::Utc);

        let (time, format) = decode_time(
            b"\x18\x0f20080901224329Z"
        ).unwrap();
        assert_eq!(time, Time::utc(2008, 9, 1, 22, 43, 29).unwrap());
        assert_eq!(format, TimeFormat::Generalized);

        // Years before 50 are in the 21st century, after in the 20th.
        let (time, _) = decode_time(b"\x17\x0d500101000000Z").unwrap();
        assert_eq!(time.year(), 1950);
        let (time, _) = decode_time(b"\x17\x0d490101000000Z").unwrap();
        assert_eq!(time.year(), 2049);

        assert!(decode_time(b"\x17\x0d080901224329+").is_err());
        assert!(decode_time(b"\x17\x0d081301224329Z").is_err());
        assert!(decode_time(b"\x04\x0d080901224329Z").is_err());
    }

    #[test]
    fn time_encode_varied() {
        let time = Time::utc(2008, 9, 1, 22, 43, 29).unwrap();
        assert_eq!(
            time.encode_varied().to_captured(Mode::Der).as_slice(),
            b"\x17\x0d080901224329Z".as_ref()
        );
        let time = Time::utc(2050, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            time.encode_varied().to_captured(Mode::Der).as_slice(),
            b"\x18\x0f20500101000000Z".as_ref()
        );
        assert_eq!(
            format!("{}", Time::utc(2008, 9, 2, 6, 43, 29).unwrap()),
            "2008-09-02T06:43:29Z"
        );
    }

    #[test]
    fn serial() {
        assert_eq!(format!("{}", Serial::from(0)), "0");
        assert_eq!(format!("{}", Serial::from(68)), "68");
        assert_eq!(
            format!("{}", Serial::from(u64::MAX)), "18446744073709551615"
        );

        // The high bit requires a leading zero octet.
        let serial = Serial::from(0x80);
        assert_eq!(
            serial.encode().to_captured(Mode::Der).as_slice(),
            b"\x02\x02\x00\x80".as_ref()
        );
        assert_eq!(
            Mode::Der.decode(
                b"\x02\x02\x00\x80".as_ref(), Serial::take_from
            ).unwrap(),
            serial
        );
        assert!(Serial::from_slice(&[]).is_err());
        assert!(Serial::from_slice(&[0xFF; 20]).is_err());
        assert!(Serial::from_slice(&[0x7F; 20]).is_ok());
    }

    #[test]
    fn name() {
        let name = Name::from_common_name("ta-key");
        assert!(name.is_rpki_conformant());
        assert_eq!(name.common_name().unwrap(), "ta-key");
        assert_eq!(format!("{}", name), "CN=ta-key");
        assert_eq!(name.attributes()[0].tag(), Tag::PRINTABLE_STRING);

        // Underscore is not in the PrintableString character set.
        let name = Name::from_common_name("ta_key");
        assert_eq!(name.attributes()[0].tag(), Tag::UTF8_STRING);
        assert!(name.is_rpki_conformant());

        let decoded = Mode::Der.decode(
            name.as_slice(), Name::take_from
        ).unwrap();
        assert_eq!(decoded, name);

        // Two common names.
        let double = Name::from_captured(
            encode::sequence((
                encode::set(encode::sequence((
                    oid::AT_COMMON_NAME.encode(),
                    OctetString::encode_slice_as(
                        b"a".as_ref(), Tag::PRINTABLE_STRING
                    ),
                ))),
                encode::set(encode::sequence((
                    oid::AT_COMMON_NAME.encode(),
                    OctetString::encode_slice_as(
                        b"b".as_ref(), Tag::PRINTABLE_STRING
                    ),
                ))),
            )).to_captured(Mode::Der)
        );
        assert!(!double.is_rpki_conformant());
        assert_eq!(format!("{}", double), "CN=a, CN=b");
    }

    #[test]
    fn validity() {
        let validity = Validity::new(
            Time::utc(2020, 1, 1, 0, 0, 0).unwrap(),
            Time::utc(2021, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(validity.is_valid_at(Time::utc(2020, 6, 1, 0, 0, 0).unwrap()));
        assert!(!validity.is_valid_at(Time::utc(2019, 6, 1, 0, 0, 0).unwrap()));
        assert!(!validity.is_valid_at(Time::utc(2021, 6, 1, 0, 0, 0).unwrap()));
        let encoded = validity.encode().to_captured(Mode::Der);
        assert_eq!(
            Mode::Der.decode(encoded.as_slice(), Validity::take_from).unwrap(),
            validity
        );
    }
}
