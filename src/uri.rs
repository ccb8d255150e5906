//! URIs appearing in RPKI objects.
//!
//! Certificates refer to other objects through rsync URIs and, for the RRDP
//! notification file, HTTPS URIs. Both are kept in their encoded form which
//! is checked for the right scheme and structure when parsed.

use std::{error, fmt, str};
use std::str::FromStr;
use bcder::{decode, encode};
use bcder::{OctetString, Tag};
use bcder::decode::DecodeError;
use bcder::string::Ia5String;
use bytes::Bytes;


//------------ Rsync ---------------------------------------------------------

/// An rsync URI.
///
/// This implements a simplified form of the rsync URI defined in RFC 5781.
/// Only absolute URIs that include an authority and a module are allowed.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Rsync {
    /// The full URI.
    bytes: Bytes,

    /// The end of the module part, including the trailing slash.
    module_end: usize,
}

impl Rsync {
    pub fn from_string(s: String) -> Result<Self, Error> {
        Self::from_bytes(Bytes::from(s))
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, Error> {
        Self::from_bytes(Bytes::copy_from_slice(slice))
    }

    pub fn from_bytes(bytes: Bytes) -> Result<Self, Error> {
        check_uri_ascii(&bytes)?;
        if !starts_with_ignore_case(&bytes, b"rsync://") {
            return Err(Error::BadScheme)
        }
        let rest = &bytes[8..];
        let authority = match rest.iter().position(|&ch| ch == b'/') {
            Some(0) | None => return Err(Error::BadUri),
            Some(pos) => pos,
        };
        let module = match rest[authority + 1..].iter().position(|&ch| {
            ch == b'/'
        }) {
            Some(0) => return Err(Error::BadUri),
            Some(pos) => pos + 1,
            None if rest.len() > authority + 1 => rest.len() - authority - 1,
            None => return Err(Error::BadUri),
        };
        let module_end = (8 + authority + 1 + module + 1).min(bytes.len());
        Ok(Rsync { bytes, module_end })
    }

    /// Returns the authority, i.e., the host name and port.
    pub fn authority(&self) -> &str {
        let s = self.as_str();
        let rest = &s[8..];
        match rest.find('/') {
            Some(pos) => &rest[..pos],
            None => rest
        }
    }

    /// Returns the module URI, i.e., everything up to the module slash.
    pub fn module(&self) -> &str {
        &self.as_str()[..self.module_end]
    }

    /// Returns the path within the module.
    pub fn path(&self) -> &str {
        &self.as_str()[self.module_end..]
    }

    pub fn as_str(&self) -> &str {
        // Construction has checked that all octets are ASCII.
        str::from_utf8(self.bytes.as_ref()).unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    /// Returns whether the URI ends in the given file extension.
    pub fn ends_with(&self, extension: &str) -> bool {
        self.bytes.ends_with(extension.as_bytes())
    }

    /// Returns a new URI with `path` appended to this one.
    pub fn join(&self, path: &[u8]) -> Result<Self, Error> {
        let mut res = Vec::with_capacity(self.bytes.len() + path.len() + 1);
        res.extend_from_slice(self.bytes.as_ref());
        if !res.ends_with(b"/") {
            res.push(b'/');
        }
        res.extend_from_slice(path);
        Self::from_bytes(res.into())
    }

    /// Returns the URI of the directory containing the object.
    pub fn parent(&self) -> Option<Self> {
        let path = self.path().trim_end_matches('/');
        if path.is_empty() {
            return None
        }
        let end = match path.rfind('/') {
            Some(pos) => self.module_end + pos + 1,
            None => self.module_end,
        };
        Some(Rsync {
            bytes: self.bytes.slice(..end),
            module_end: self.module_end,
        })
    }

    /// Returns an encoder for the URI as a `GeneralName`.
    pub fn encode_general_name(&self) -> impl encode::Values + '_ {
        OctetString::encode_slice_as(self.as_slice(), Tag::CTX_6)
    }
}


//--- FromStr

impl FromStr for Rsync {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(s.as_bytes())
    }
}


//--- Display and Debug

impl fmt::Display for Rsync {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Rsync {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Rsync({})", self)
    }
}


//------------ Https ---------------------------------------------------------

/// An HTTPS URI.
///
/// Only the scheme and the presence of an authority are checked.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Https(Bytes);

impl Https {
    pub fn from_string(s: String) -> Result<Self, Error> {
        Self::from_bytes(Bytes::from(s))
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, Error> {
        Self::from_bytes(Bytes::copy_from_slice(slice))
    }

    pub fn from_bytes(bytes: Bytes) -> Result<Self, Error> {
        check_uri_ascii(&bytes)?;
        if !starts_with_ignore_case(&bytes, b"https://") {
            return Err(Error::BadScheme)
        }
        match bytes.get(8) {
            None | Some(b'/') => Err(Error::BadUri),
            Some(_) => Ok(Https(bytes))
        }
    }

    pub fn as_str(&self) -> &str {
        str::from_utf8(self.0.as_ref()).unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn encode_general_name(&self) -> impl encode::Values + '_ {
        OctetString::encode_slice_as(self.as_slice(), Tag::CTX_6)
    }
}

impl FromStr for Https {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(s.as_bytes())
    }
}

impl fmt::Display for Https {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Https {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Https({})", self)
    }
}


//------------ GeneralUri ----------------------------------------------------

/// A URI taken from a `GeneralName` that hasn’t been classified yet.
///
/// Access descriptions and distribution points may contain URIs of any
/// scheme. Checking which ones are acceptable is up to the profile
/// validation, so decoding keeps whatever was found.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GeneralUri(Bytes);

impl GeneralUri {
    pub fn new(bytes: Bytes) -> Self {
        GeneralUri(bytes)
    }

    /// Takes a `uniformResourceIdentifier` general name from a value.
    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_value_if(Tag::CTX_6, |content| {
            Ia5String::from_content(content).map(|s| {
                GeneralUri(s.into_bytes())
            })
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn to_rsync(&self) -> Option<Rsync> {
        Rsync::from_bytes(self.0.clone()).ok()
    }

    pub fn to_https(&self) -> Option<Https> {
        Https::from_bytes(self.0.clone()).ok()
    }

    pub fn is_rsync(&self) -> bool {
        starts_with_ignore_case(&self.0, b"rsync://")
    }

    pub fn is_https(&self) -> bool {
        starts_with_ignore_case(&self.0, b"https://")
    }

    pub fn encode_general_name(&self) -> impl encode::Values + '_ {
        OctetString::encode_slice_as(self.as_slice(), Tag::CTX_6)
    }
}

impl From<&Rsync> for GeneralUri {
    fn from(uri: &Rsync) -> Self {
        GeneralUri(uri.bytes.clone())
    }
}

impl From<&Https> for GeneralUri {
    fn from(uri: &Https) -> Self {
        GeneralUri(uri.0.clone())
    }
}

impl fmt::Display for GeneralUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.0.as_ref()))
    }
}


//------------ Helper Functions ----------------------------------------------

/// Checks that the URI only contains allowed ASCII characters.
fn check_uri_ascii(slice: &[u8]) -> Result<(), Error> {
    for &ch in slice {
        if
            ch <= b' ' || ch >= 0x7F || ch == b'"' || ch == b'<'
            || ch == b'>' || ch == b'\\' || ch == b'^' || ch == b'`'
            || ch == b'{' || ch == b'|' || ch == b'}'
        {
            return Err(Error::NotAscii)
        }
    }
    Ok(())
}

fn starts_with_ignore_case(slice: &[u8], prefix: &[u8]) -> bool {
    slice.len() >= prefix.len()
        && slice[..prefix.len()].eq_ignore_ascii_case(prefix)
}


//------------ Error ---------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    NotAscii,
    BadUri,
    BadScheme,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Error::NotAscii => "invalid characters",
            Error::BadUri => "bad URI",
            Error::BadScheme => "bad URI scheme",
        })
    }
}

impl error::Error for Error { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rsync_parts() {
        let uri = Rsync::from_str(
            "rsync://host.example/module/some/file.cer"
        ).unwrap();
        assert_eq!(uri.authority(), "host.example");
        assert_eq!(uri.module(), "rsync://host.example/module/");
        assert_eq!(uri.path(), "some/file.cer");
        assert!(uri.ends_with(".cer"));
        assert_eq!(
            uri.parent().unwrap().as_str(),
            "rsync://host.example/module/some/"
        );
    }

    #[test]
    fn rsync_module_only() {
        let uri = Rsync::from_str("rsync://host/module").unwrap();
        assert_eq!(uri.path(), "");
        assert!(uri.parent().is_none());
        assert_eq!(
            uri.join(b"ta.cer").unwrap().as_str(),
            "rsync://host/module/ta.cer"
        );
    }

    #[test]
    fn rsync_rejects() {
        assert_eq!(
            Rsync::from_str("http://host/module/").unwrap_err(),
            Error::BadScheme
        );
        assert_eq!(
            Rsync::from_str("rsync:///module/").unwrap_err(),
            Error::BadUri
        );
        assert_eq!(
            Rsync::from_str("rsync://host/").unwrap_err(),
            Error::BadUri
        );
        assert_eq!(
            Rsync::from_str("rsync://host/mod ule/").unwrap_err(),
            Error::NotAscii
        );
    }

    #[test]
    fn https() {
        assert!(Https::from_str("https://rrdp.example/notify.xml").is_ok());
        assert_eq!(
            Https::from_str("http://rrdp.example/notify.xml").unwrap_err(),
            Error::BadScheme
        );
        assert_eq!(Https::from_str("https://").unwrap_err(), Error::BadUri);
    }
}
