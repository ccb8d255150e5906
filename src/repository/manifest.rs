//! RPKI manifests.
//!
//! Manifests list all the files a CA publishes in its repository together
//! with a hash over their content. They are defined in [RFC 9286]. The
//! type [`Manifest`] is a signed object with [`ManifestContent`] as its
//! content.
//!
//! [RFC 9286]: https://tools.ietf.org/html/rfc9286

use std::collections::HashSet;
use bcder::{decode, encode};
use bcder::{BitString, Captured, ConstOid, Mode, OctetString, Oid, Tag};
use bcder::decode::DecodeError;
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use crate::{oid, uri};
use crate::crypto::{DigestAlgorithm, Signer};
use crate::validation::{ValidationOptions, ValidationResult};
use crate::validation::checks::*;
use super::error::BuildError;
use super::rescert::ResourceCert;
use super::sigobj::{
    SignedObject, SignedObjectBuilder, SignedObjectContent, SignedObjectParser
};
use super::x509::{Serial, Time, TimeFormat};


//------------ Manifest ------------------------------------------------------

/// A manifest.
pub type Manifest = SignedObject<ManifestContent>;

/// A parser for manifests.
pub type ManifestParser = SignedObjectParser<ManifestContent>;


//------------ ManifestContent -----------------------------------------------

/// The content of a manifest.
///
/// ```txt
/// Manifest ::= SEQUENCE {
///     version     [0] INTEGER DEFAULT 0,
///     manifestNumber  INTEGER (0..MAX),
///     thisUpdate      GeneralizedTime,
///     nextUpdate      GeneralizedTime,
///     fileHashAlg     OBJECT IDENTIFIER,
///     fileList        SEQUENCE SIZE (0..MAX) OF FileAndHash }
///
/// FileAndHash ::= SEQUENCE {
///     file            IA5String,
///     hash            BIT STRING }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManifestContent {
    /// The number of this manifest.
    ///
    /// Manifest numbers are at most 20 octets long just like certificate
    /// serial numbers.
    number: Serial,

    this_update: Time,
    next_update: Time,

    /// The list of files.
    files: Vec<FileAndHash>,
}

impl ManifestContent {
    pub fn number(&self) -> Serial {
        self.number
    }

    pub fn this_update(&self) -> Time {
        self.this_update
    }

    pub fn next_update(&self) -> Time {
        self.next_update
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileAndHash> {
        self.files.iter()
    }

    /// Returns an iterator over the URIs and hashes of the listed files.
    ///
    /// The file names are relative to `base` which should be the
    /// directory the manifest is published in.
    pub fn iter_uris<'a>(
        &'a self, base: &'a uri::Rsync
    ) -> impl Iterator<Item = Result<(uri::Rsync, &'a Bytes), uri::Error>> {
        self.files.iter().map(move |item| {
            base.join(item.file.as_bytes()).map(|uri| (uri, &item.hash))
        })
    }

    pub fn contains_file(&self, file: &str) -> bool {
        self.get(file).is_some()
    }

    /// Returns the hash listed for the given file.
    pub fn get_hash(&self, file: &str) -> Option<&Bytes> {
        self.get(file).map(FileAndHash::hash)
    }

    /// Checks that the content of a file matches the listed hash.
    ///
    /// Returns `false` if the file is not listed at all.
    pub fn verify_file_hash(&self, file: &str, content: &[u8]) -> bool {
        self.get(file).map(|item| item.verify(content)).unwrap_or(false)
    }

    fn get(&self, file: &str) -> Option<&FileAndHash> {
        self.files.iter().find(|item| item.file == file)
    }

    /// Checks whether the manifest has gone past its next update time.
    ///
    /// Records the check and returns whether the manifest can still be
    /// used.
    pub fn check_next_update(
        &self,
        options: &ValidationOptions,
        now: Time,
        result: &mut ValidationResult,
    ) -> bool {
        options.check_manifest_next_update(
            self.next_update.into_datetime(), now.into_datetime(),
            MANIFEST_PAST_NEXT_UPDATE_TIME, result
        )
    }
}


//--- SignedObjectContent

impl SignedObjectContent for ManifestContent {
    const CONTENT_TYPE: ConstOid = oid::CT_RPKI_MANIFEST;
    const CONTENT_TYPE_CHECK: &'static str = MANIFEST_CONTENT_TYPE;

    fn decode_content(
        content: Bytes, result: &mut ValidationResult
    ) -> Option<Self> {
        let raw = match Mode::Der.decode(content, RawManifest::take_from) {
            Ok(raw) => raw,
            Err(err) => {
                result.error(MANIFEST_CONTENT_STRUCTURE, &[&err]);
                return None
            }
        };
        let mut ok = result.reject_if_false(
            raw.version == 0, MANIFEST_CONTENT_STRUCTURE, &[&raw.version]
        );
        ok &= result.reject_if_false(
            raw.this_update.1 == TimeFormat::Generalized
                && raw.next_update.1 == TimeFormat::Generalized
                && raw.this_update.0 < raw.next_update.0,
            MANIFEST_TIME_FORMAT, &[&raw.this_update.0, &raw.next_update.0]
        );
        ok &= result.reject_if_false(
            raw.file_hash_alg == oid::SHA256,
            MANIFEST_FILE_HASH_ALGORITHM, &[&raw.file_hash_alg]
        );
        let files = match decode_file_list(raw.file_list) {
            Ok(files) => {
                result.pass(MANIFEST_DECODE_FILELIST, &[]);
                files
            }
            Err(err) => {
                result.error(MANIFEST_DECODE_FILELIST, &[&err]);
                return None
            }
        };
        if !ok {
            return None
        }
        Some(ManifestContent {
            number: raw.number,
            this_update: raw.this_update.0,
            next_update: raw.next_update.0,
            files,
        })
    }

    fn check_certificate(
        &self, cert: &ResourceCert, result: &mut ValidationResult
    ) {
        result.reject_if_false(
            cert.inherited_types().is_all(), MANIFEST_RESOURCE_INHERIT, &[]
        );
    }

    fn encode_content(&self) -> Bytes {
        encode::sequence((
            self.number.encode(),
            self.this_update.encode_generalized_time(),
            self.next_update.encode_generalized_time(),
            oid::SHA256.encode(),
            encode::sequence(
                encode::slice(&self.files, FileAndHash::encode)
            ),
        )).to_captured(Mode::Der).into_bytes()
    }
}


//------------ RawManifest ---------------------------------------------------

/// The manifest content before it has been checked.
struct RawManifest {
    version: u64,
    number: Serial,
    this_update: (Time, TimeFormat),
    next_update: (Time, TimeFormat),
    file_hash_alg: Oid<Bytes>,
    file_list: Captured,
}

impl RawManifest {
    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = cons.take_opt_constructed_if(
                Tag::CTX_0, |cons| cons.take_u64()
            )?.unwrap_or(0);
            Ok(RawManifest {
                version,
                number: Serial::take_from(cons)?,
                this_update: Time::take_with_format_from(cons)?,
                next_update: Time::take_with_format_from(cons)?,
                file_hash_alg: Oid::take_from(cons)?,
                file_list: cons.take_sequence(|cons| cons.capture_all())?,
            })
        })
    }
}

/// Decodes the entries of the file list.
fn decode_file_list(
    list: Captured
) -> Result<Vec<FileAndHash>, DecodeError<std::convert::Infallible>> {
    list.decode(|cons| {
        let mut res = Vec::new();
        let mut seen = HashSet::new();
        while let Some(item) = FileAndHash::take_opt_from(cons)? {
            if !seen.insert(item.file.clone()) {
                return Err(cons.content_err("duplicate file in manifest"))
            }
            res.push(item)
        }
        Ok(res)
    })
}


//------------ FileAndHash ---------------------------------------------------

/// An entry in the file list of a manifest.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileAndHash {
    /// The name of the file.
    file: String,

    /// The SHA-256 hash over the file’s content.
    hash: Bytes,
}

impl FileAndHash {
    /// Creates an entry from the file name and its content.
    pub fn from_content(file: impl Into<String>, content: &[u8]) -> Self {
        FileAndHash {
            file: file.into(),
            hash: Bytes::copy_from_slice(
                DigestAlgorithm::default().digest(content).as_ref()
            ),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn hash(&self) -> &Bytes {
        &self.hash
    }

    /// Returns whether `content` has the hash of this entry.
    pub fn verify(&self, content: &[u8]) -> bool {
        DigestAlgorithm::default().digest(content).as_ref() == self.hash
    }

    fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let file = cons.take_value_if(
                Tag::IA5_STRING, OctetString::from_content
            )?.into_bytes();
            let file = match String::from_utf8(file.to_vec()) {
                Ok(file) if is_valid_file_name(&file) => file,
                _ => return Err(cons.content_err("invalid file name"))
            };
            let hash = BitString::take_from(cons)?;
            let hash = match hash.octet_slice() {
                Some(hash) if hash.len() == 32 => Bytes::copy_from_slice(hash),
                _ => return Err(cons.content_err("invalid file hash"))
            };
            Ok(FileAndHash { file, hash })
        })
    }

    fn encode(&self) -> impl encode::Values {
        encode::sequence((
            OctetString::encode_slice_as(
                Bytes::copy_from_slice(self.file.as_bytes()), Tag::IA5_STRING
            ),
            BitString::encode_slice(self.hash.clone(), 0),
        ))
    }
}

/// Returns whether a file name can appear on a manifest.
///
/// A name has to stay within the publication point, so it must not be
/// empty, contain a slash or control characters, or be `.` or `..`.
fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.bytes().all(|ch| ch != b'/' && !ch.is_ascii_control())
}


//------------ ManifestBuilder -----------------------------------------------

/// A builder for manifests.
#[derive(Clone, Debug)]
pub struct ManifestBuilder {
    number: Serial,
    this_update: Time,
    next_update: Time,
    files: Vec<FileAndHash>,
}

impl ManifestBuilder {
    pub fn new(number: Serial, this_update: Time, next_update: Time) -> Self {
        ManifestBuilder {
            number, this_update, next_update,
            files: Vec::new(),
        }
    }

    /// Adds a file given its content.
    pub fn with_file(mut self, file: impl Into<String>, content: &[u8]) -> Self {
        self.files.push(FileAndHash::from_content(file, content));
        self
    }

    /// Adds a file with an already calculated hash.
    pub fn with_file_hash(
        mut self, file: impl Into<String>, hash: Bytes
    ) -> Self {
        self.files.push(FileAndHash { file: file.into(), hash });
        self
    }

    /// Checks the fields and returns the content.
    pub fn into_content(self) -> Result<ManifestContent, BuildError> {
        if self.this_update >= self.next_update {
            return Err(BuildError::InvalidField("next update"))
        }
        let mut seen = HashSet::new();
        for item in &self.files {
            if !is_valid_file_name(&item.file) || !seen.insert(&item.file) {
                return Err(BuildError::InvalidField("file name"))
            }
            if item.hash.len() != DigestAlgorithm::default().digest_len() {
                return Err(BuildError::InvalidField("file hash"))
            }
        }
        Ok(ManifestContent {
            number: self.number,
            this_update: self.this_update,
            next_update: self.next_update,
            files: self.files,
        })
    }

    /// Builds the signed manifest.
    ///
    /// The EE certificate always inherits all resources.
    pub fn build<S: Signer>(
        self,
        object: SignedObjectBuilder,
        signer: &S,
        issuer_key: &S::KeyId,
    ) -> Result<Manifest, BuildError> {
        let content = self.into_content()?;
        object.with_inherit_all().build(content, signer, issuer_key)
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use chrono::Duration;
    use crate::repository::test::{ee_builder, DummySigner};
    use crate::validation::ValidationStatus;
    use super::*;

    fn time(secs: i64) -> Time {
        Time::from_timestamp(secs).unwrap()
    }

    fn content() -> ManifestContent {
        ManifestBuilder::new(
            Serial::from(68u64), time(1_220_308_000), time(1_220_337_000)
        ).with_file("foo1", b"foo").with_file("BaR", b"bar")
        .into_content().unwrap()
    }

    fn decode(content: Bytes) -> (Option<ManifestContent>, ValidationResult) {
        let mut result = ValidationResult::with_location("test.mft");
        let res = ManifestContent::decode_content(
            content, &mut result
        );
        (res, result)
    }

    fn status(result: &ValidationResult, key: &str) -> Option<ValidationStatus> {
        result.result_for_current_location(key).map(|check| check.status())
    }

    #[test]
    fn decode_built_content() {
        let content = content();
        let (decoded, result) = decode(content.encode_content());
        assert_eq!(decoded, Some(content));
        assert!(!result.has_failures());
        let decoded = decoded.unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(decoded.contains_file("foo1"));
        assert!(!decoded.contains_file("abracadabra"));
        assert!(decoded.verify_file_hash("BaR", b"bar"));
        assert!(!decoded.verify_file_hash("BaR", b"baz"));
        assert!(!decoded.verify_file_hash("abracadabra", b"bar"));
    }

    #[test]
    fn iter_uris() {
        let content = content();
        let base = crate::repository::test::rsync(
            "rsync://example.com/repo/ca/"
        );
        let uris = content.iter_uris(&base).map(|item| {
            item.unwrap().0.to_string()
        }).collect::<Vec<_>>();
        assert_eq!(uris, vec![
            "rsync://example.com/repo/ca/foo1",
            "rsync://example.com/repo/ca/BaR",
        ]);
    }

    fn encode_raw(
        version: Option<u8>,
        this_update: impl encode::Values,
        hash_alg: &'static ConstOid,
        files: impl encode::Values,
    ) -> Bytes {
        encode::sequence((
            version.map(|v| encode::sequence_as(Tag::CTX_0, v.encode())),
            68u8.encode(),
            this_update,
            time(1_220_337_000).encode_generalized_time(),
            hash_alg.encode(),
            encode::sequence(files),
        )).to_captured(Mode::Der).into_bytes()
    }

    fn file(name: &'static [u8], hash: &'static [u8]) -> impl encode::Values {
        encode::sequence((
            OctetString::encode_slice_as(name, Tag::IA5_STRING),
            BitString::encode_slice(hash, 0),
        ))
    }

    #[test]
    fn explicit_version() {
        let (res, result) = decode(encode_raw(
            Some(0), time(1_220_308_000).encode_generalized_time(),
            &oid::SHA256, file(b"a.roa", &[1; 32])
        ));
        assert!(res.is_some());
        assert!(!result.has_failures());

        let (res, result) = decode(encode_raw(
            Some(1), time(1_220_308_000).encode_generalized_time(),
            &oid::SHA256, file(b"a.roa", &[1; 32])
        ));
        assert!(res.is_none());
        assert_eq!(
            status(&result, MANIFEST_CONTENT_STRUCTURE),
            Some(ValidationStatus::Error)
        );
    }

    #[test]
    fn time_format() {
        let (res, result) = decode(encode_raw(
            None, time(1_220_308_000).encode_utc_time(),
            &oid::SHA256, file(b"a.roa", &[1; 32])
        ));
        assert!(res.is_none());
        assert_eq!(
            status(&result, MANIFEST_TIME_FORMAT),
            Some(ValidationStatus::Error)
        );
        assert_eq!(
            status(&result, MANIFEST_DECODE_FILELIST),
            Some(ValidationStatus::Passed)
        );

        // This update after next update.
        let (res, result) = decode(encode_raw(
            None, time(1_220_400_000).encode_generalized_time(),
            &oid::SHA256, file(b"a.roa", &[1; 32])
        ));
        assert!(res.is_none());
        assert_eq!(
            status(&result, MANIFEST_TIME_FORMAT),
            Some(ValidationStatus::Error)
        );
    }

    #[test]
    fn file_hash_algorithm() {
        let (res, result) = decode(encode_raw(
            None, time(1_220_308_000).encode_generalized_time(),
            &oid::SHA256_WITH_RSA_ENCRYPTION, file(b"a.roa", &[1; 32])
        ));
        assert!(res.is_none());
        assert_eq!(
            status(&result, MANIFEST_FILE_HASH_ALGORITHM),
            Some(ValidationStatus::Error)
        );
    }

    #[test]
    fn file_list() {
        for files in vec![
            encode_raw(
                None, time(1_220_308_000).encode_generalized_time(),
                &oid::SHA256, file(b"a.roa", &[1; 20])
            ),
            encode_raw(
                None, time(1_220_308_000).encode_generalized_time(),
                &oid::SHA256, file(b"../a.roa", &[1; 32])
            ),
            encode_raw(
                None, time(1_220_308_000).encode_generalized_time(),
                &oid::SHA256,
                (file(b"a.roa", &[1; 32]), file(b"a.roa", &[2; 32]))
            ),
        ] {
            let (res, result) = decode(files);
            assert!(res.is_none());
            assert_eq!(
                status(&result, MANIFEST_DECODE_FILELIST),
                Some(ValidationStatus::Error)
            );
        }
    }

    #[test]
    fn file_names() {
        assert!(is_valid_file_name("foo1.roa"));
        assert!(is_valid_file_name("foo1"));
        assert!(is_valid_file_name("BaR"));
        assert!(is_valid_file_name(".roa"));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name(".."));
        assert!(!is_valid_file_name("dir/foo.roa"));
        assert!(!is_valid_file_name("foo\nbar"));
        assert!(ManifestBuilder::new(
            Serial::from(1u64), time(1_220_308_000), time(1_220_337_000)
        ).with_file("../ca.cer", b"foo").into_content().is_err());
    }

    #[test]
    fn builder_rejects_invalid_fields() {
        assert!(ManifestBuilder::new(
            Serial::from(1u64), time(1_220_337_000), time(1_220_308_000)
        ).into_content().is_err());
        assert!(ManifestBuilder::new(
            Serial::from(1u64), time(1_220_308_000), time(1_220_337_000)
        ).with_file("a.roa", b"a").with_file("a.roa", b"b")
        .into_content().is_err());
        assert!(ManifestBuilder::new(
            Serial::from(1u64), time(1_220_308_000), time(1_220_337_000)
        ).with_file_hash("a.roa", Bytes::from_static(b"short"))
        .into_content().is_err());
    }

    #[test]
    fn resource_inherit() {
        let signer = DummySigner;
        let content = content();

        let cert = ee_builder(&signer).with_inherit_all()
            .build(&signer, &()).unwrap().into_resource_cert().unwrap();
        let mut result = ValidationResult::with_location("test.mft");
        content.check_certificate(&cert, &mut result);
        assert_eq!(
            status(&result, MANIFEST_RESOURCE_INHERIT),
            Some(ValidationStatus::Passed)
        );

        let cert = ee_builder(&signer)
            .with_resources("AS64496".parse().unwrap())
            .build(&signer, &()).unwrap().into_resource_cert().unwrap();
        let mut result = ValidationResult::with_location("test.mft");
        content.check_certificate(&cert, &mut result);
        assert_eq!(
            status(&result, MANIFEST_RESOURCE_INHERIT),
            Some(ValidationStatus::Error)
        );
    }

    #[test]
    fn next_update() {
        let content = content();
        let next = content.next_update();

        let mut result = ValidationResult::with_location("test.mft");
        assert!(content.check_next_update(
            &ValidationOptions::strict(), next - Duration::hours(1),
            &mut result
        ));
        assert_eq!(
            status(&result, MANIFEST_PAST_NEXT_UPDATE_TIME),
            Some(ValidationStatus::Passed)
        );

        let mut result = ValidationResult::with_location("test.mft");
        assert!(!content.check_next_update(
            &ValidationOptions::strict(), next + Duration::hours(1),
            &mut result
        ));
        assert_eq!(
            status(&result, MANIFEST_PAST_NEXT_UPDATE_TIME),
            Some(ValidationStatus::Error)
        );

        let mut result = ValidationResult::with_location("test.mft");
        assert!(content.check_next_update(
            &ValidationOptions::strict().with_manifest_max_stale(
                Duration::days(1)
            ),
            next + Duration::hours(1),
            &mut result
        ));
        assert_eq!(
            status(&result, MANIFEST_PAST_NEXT_UPDATE_TIME),
            Some(ValidationStatus::Warning)
        );

        let mut result = ValidationResult::with_location("test.mft");
        assert!(content.check_next_update(
            &ValidationOptions::lenient(), next + Duration::days(30),
            &mut result
        ));
        assert_eq!(
            status(&result, MANIFEST_PAST_NEXT_UPDATE_TIME),
            Some(ValidationStatus::Warning)
        );
    }
}
