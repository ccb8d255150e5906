//! Ghostbusters records.
//!
//! A Ghostbusters record provides contact information for the operator of
//! a CA in the form of a vCard. It is defined in [RFC 6493]. Unlike other
//! signed objects, the content is not an encoded value but the text of the
//! vCard itself.
//!
//! [RFC 6493]: https://tools.ietf.org/html/rfc6493

use bcder::ConstOid;
use bytes::Bytes;
use crate::oid;
use crate::crypto::Signer;
use crate::validation::ValidationResult;
use crate::validation::checks::*;
use super::error::BuildError;
use super::sigobj::{
    SignedObject, SignedObjectBuilder, SignedObjectContent, SignedObjectParser
};


//------------ Ghostbusters --------------------------------------------------

pub type Ghostbusters = SignedObject<GhostbustersContent>;

pub type GhostbustersParser = SignedObjectParser<GhostbustersContent>;


//------------ GhostbustersContent -------------------------------------------

/// The content of a Ghostbusters record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GhostbustersContent {
    /// The text of the vCard.
    vcard: String,

    /// The properties of the vCard in order of appearance.
    properties: Vec<Property>,
}

impl GhostbustersContent {
    pub fn vcard(&self) -> &str {
        &self.vcard
    }

    /// Returns the value of the FN property.
    pub fn full_name(&self) -> Option<&str> {
        self.value("FN")
    }

    pub fn org(&self) -> Option<&str> {
        self.value("ORG")
    }

    pub fn email(&self) -> Option<&str> {
        self.value("EMAIL")
    }

    pub fn tel(&self) -> Option<&str> {
        self.value("TEL")
    }

    pub fn adr(&self) -> Option<&str> {
        self.value("ADR")
    }

    /// Returns the value of the first property with the given name.
    fn value(&self, name: &str) -> Option<&str> {
        self.properties.iter().find(|prop| prop.name == name).map(|prop| {
            prop.value.as_str()
        })
    }

    fn has(&self, name: &str) -> bool {
        self.value(name).is_some()
    }
}


//--- SignedObjectContent

impl SignedObjectContent for GhostbustersContent {
    const CONTENT_TYPE: ConstOid = oid::CT_RPKI_GHOSTBUSTERS;
    const CONTENT_TYPE_CHECK: &'static str = GHOSTBUSTERS_RECORD_CONTENT_TYPE;
    const RAW_CONTENT: bool = true;

    fn decode_content(
        content: Bytes, result: &mut ValidationResult
    ) -> Option<Self> {
        let vcard = match String::from_utf8(content.to_vec()) {
            Ok(vcard) if vcard.is_ascii() => vcard,
            _ => {
                result.error(
                    GHOSTBUSTERS_RECORD_SINGLE_VCARD, &[&"not ASCII"]
                );
                return None
            }
        };
        let properties = match parse_vcard(&vcard) {
            Some(properties) => {
                result.pass(GHOSTBUSTERS_RECORD_SINGLE_VCARD, &[]);
                properties
            }
            None => {
                result.error(GHOSTBUSTERS_RECORD_SINGLE_VCARD, &[]);
                return None
            }
        };
        let content = GhostbustersContent { vcard, properties };
        let mut ok = result.reject_if_false(
            content.value("VERSION") == Some("4.0"),
            GHOSTBUSTERS_RECORD_VCARD_VERSION, &[]
        );
        ok &= result.reject_if_false(
            content.has("FN"), GHOSTBUSTERS_RECORD_FN_PRESENT, &[]
        );
        ok &= result.reject_if_false(
            content.has("ADR") || content.has("TEL") || content.has("EMAIL"),
            GHOSTBUSTERS_RECORD_ADR_TEL_OR_EMAIL_PRESENT, &[]
        );
        if ok {
            Some(content)
        }
        else {
            None
        }
    }

    fn encode_content(&self) -> Bytes {
        Bytes::copy_from_slice(self.vcard.as_bytes())
    }
}


//------------ Property ------------------------------------------------------

/// A single vCard property.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Property {
    /// The property name in upper case without any parameters.
    name: String,

    value: String,
}

/// Parses the text of a single vCard.
///
/// Returns the properties between `BEGIN:VCARD` and `END:VCARD` or `None`
/// if the text isn’t exactly one vCard.
fn parse_vcard(text: &str) -> Option<Vec<Property>> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        // Folded lines continue with a single space or tab.
        if line.starts_with(' ') || line.starts_with('\t') {
            lines.last_mut()?.push_str(&line[1..]);
        }
        else if !line.is_empty() {
            lines.push(line.into())
        }
    }
    let mut lines = lines.into_iter();
    if !lines.next()?.eq_ignore_ascii_case("BEGIN:VCARD") {
        return None
    }
    let mut properties = Vec::new();
    for line in &mut lines {
        if line.eq_ignore_ascii_case("END:VCARD") {
            // Nothing may follow.
            return match lines.next() {
                Some(_) => None,
                None => Some(properties)
            }
        }
        let (name, value) = line.split_once(':')?;
        let name = name.split(';').next().unwrap_or(name);
        if name.is_empty() || name.eq_ignore_ascii_case("BEGIN") {
            return None
        }
        properties.push(Property {
            name: name.to_ascii_uppercase(),
            value: value.into(),
        })
    }
    None
}


//------------ GhostbustersBuilder -------------------------------------------

/// A builder for Ghostbusters records.
///
/// The builder assembles a version 4.0 vCard from the given properties.
#[derive(Clone, Debug)]
pub struct GhostbustersBuilder {
    full_name: String,
    org: Option<String>,
    adr: Option<String>,
    tel: Option<String>,
    email: Option<String>,
}

impl GhostbustersBuilder {
    pub fn new(full_name: impl Into<String>) -> Self {
        GhostbustersBuilder {
            full_name: full_name.into(),
            org: None, adr: None, tel: None, email: None,
        }
    }

    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    /// Adds an address in its structured vCard form.
    pub fn with_adr(mut self, adr: impl Into<String>) -> Self {
        self.adr = Some(adr.into());
        self
    }

    /// Adds a telephone number as a URI such as `tel:+1-555-0100`.
    pub fn with_tel(mut self, tel: impl Into<String>) -> Self {
        self.tel = Some(tel.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Checks the fields and returns the content.
    pub fn into_content(self) -> Result<GhostbustersContent, BuildError> {
        if self.full_name.is_empty() {
            return Err(BuildError::MissingField("full name"))
        }
        if self.adr.is_none() && self.tel.is_none() && self.email.is_none() {
            return Err(BuildError::MissingField("address, phone, or email"))
        }
        let mut vcard = String::from("BEGIN:VCARD\r\nVERSION:4.0\r\n");
        let props = [
            ("FN", Some(&self.full_name)),
            ("ORG", self.org.as_ref()),
            ("ADR", self.adr.as_ref()),
            ("TEL", self.tel.as_ref()),
            ("EMAIL", self.email.as_ref()),
        ];
        for (name, value) in props.iter() {
            if let Some(value) = value {
                if !value.is_ascii() || value.contains(&['\r', '\n'][..]) {
                    return Err(BuildError::InvalidField(*name))
                }
                vcard.push_str(name);
                vcard.push(':');
                vcard.push_str(value);
                vcard.push_str("\r\n");
            }
        }
        vcard.push_str("END:VCARD\r\n");
        let properties = parse_vcard(&vcard).ok_or(
            BuildError::InvalidField("vCard")
        )?;
        Ok(GhostbustersContent { vcard, properties })
    }

    /// Builds the signed record.
    ///
    /// The EE certificate inherits all resources.
    pub fn build<S: Signer>(
        self,
        object: SignedObjectBuilder,
        signer: &S,
        issuer_key: &S::KeyId,
    ) -> Result<Ghostbusters, BuildError> {
        let content = self.into_content()?;
        object.with_inherit_all().build(content, signer, issuer_key)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use crate::validation::ValidationStatus;
    use super::*;

    const VCARD: &str = "BEGIN:VCARD\r\n\
        VERSION:4.0\r\n\
        FN:Human's Name\r\n\
        ORG:Organization Name\r\n\
        ADR;TYPE=WORK:;;42 Twisty Passage;Deep Cavern;WA;98666;U.S.A.\r\n\
        TEL;TYPE=VOICE,TEXT,WORK;VALUE=uri:tel:+1-666-555-1212\r\n\
        TEL;TYPE=FAX,WORK;VALUE=uri:tel:+1-666-555-1213\r\n\
        EMAIL:human@example.com\r\n\
        END:VCARD\r\n";

    fn decode(text: &str) -> (Option<GhostbustersContent>, ValidationResult) {
        let mut result = ValidationResult::with_location("test.gbr");
        let res = GhostbustersContent::decode_content(
            Bytes::copy_from_slice(text.as_bytes()), &mut result
        );
        (res, result)
    }

    fn status(
        result: &ValidationResult, key: &str
    ) -> Option<ValidationStatus> {
        result.result_for_current_location(key).map(|check| check.status())
    }

    #[test]
    fn decode_example() {
        let (content, result) = decode(VCARD);
        assert!(!result.has_failures());
        let content = content.unwrap();
        assert_eq!(content.full_name(), Some("Human's Name"));
        assert_eq!(content.org(), Some("Organization Name"));
        assert_eq!(content.tel(), Some("tel:+1-666-555-1212"));
        assert_eq!(content.email(), Some("human@example.com"));
        assert_eq!(content.vcard(), VCARD);
    }

    #[test]
    fn folded_lines() {
        let (content, _) = decode(
            "BEGIN:VCARD\nVERSION:4.0\nFN:Human's\n  Name\n\
             EMAIL:a@b\nEND:VCARD\n"
        );
        assert_eq!(content.unwrap().full_name(), Some("Human's Name"));
    }

    #[test]
    fn single_vcard() {
        for text in &[
            "",
            "VERSION:4.0\r\nFN:x\r\nEMAIL:a@b\r\nEND:VCARD\r\n",
            "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:x\r\nEMAIL:a@b\r\n",
            "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:x\r\nEMAIL:a@b\r\nEND:VCARD\r\n\
             BEGIN:VCARD\r\nVERSION:4.0\r\nFN:y\r\nEMAIL:a@b\r\nEND:VCARD\r\n",
            "BEGIN:VCARD\r\nBEGIN:VCARD\r\nVERSION:4.0\r\nEND:VCARD\r\n",
            "BEGIN:VCARD\r\nbroken\r\nEND:VCARD\r\n",
        ] {
            let (content, result) = decode(text);
            assert!(content.is_none(), "{}", text);
            assert_eq!(
                status(&result, GHOSTBUSTERS_RECORD_SINGLE_VCARD),
                Some(ValidationStatus::Error),
                "{}", text
            );
        }
    }

    #[test]
    fn required_properties() {
        let (content, result) = decode(
            "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:x\r\nEMAIL:a@b\r\nEND:VCARD\r\n"
        );
        assert!(content.is_none());
        assert_eq!(
            status(&result, GHOSTBUSTERS_RECORD_VCARD_VERSION),
            Some(ValidationStatus::Error)
        );

        let (content, result) = decode(
            "BEGIN:VCARD\r\nVERSION:4.0\r\nEMAIL:a@b\r\nEND:VCARD\r\n"
        );
        assert!(content.is_none());
        assert_eq!(
            status(&result, GHOSTBUSTERS_RECORD_FN_PRESENT),
            Some(ValidationStatus::Error)
        );

        let (content, result) = decode(
            "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:x\r\nORG:y\r\nEND:VCARD\r\n"
        );
        assert!(content.is_none());
        assert_eq!(
            status(&result, GHOSTBUSTERS_RECORD_ADR_TEL_OR_EMAIL_PRESENT),
            Some(ValidationStatus::Error)
        );
    }

    #[test]
    fn builder() {
        let content = GhostbustersBuilder::new("Human's Name")
            .with_org("Organization Name")
            .with_email("human@example.com")
            .into_content().unwrap();
        let (decoded, result) = decode(content.vcard());
        assert!(!result.has_failures());
        assert_eq!(decoded, Some(content));

        assert!(
            GhostbustersBuilder::new("Human's Name").into_content().is_err()
        );
        assert!(
            GhostbustersBuilder::new("Human's Name")
                .with_email("a@b\r\nFN:other")
                .into_content().is_err()
        );
    }
}
