//! Digest algorithm and operations.

use bcder::{decode, encode};
use bcder::Oid;
use bcder::decode::DecodeError;
use bcder::encode::PrimitiveContent;
use bytes::Bytes;
use ring::digest;
use crate::oid;

// Re-export the things from ring for actual digest generation.
pub use ring::digest::Digest;


//------------ DigestAlgorithm -----------------------------------------------

/// The digest algorithms used by RPKI.
///
/// [RFC 7935] limits the digest algorithms to exactly one, SHA-256, so this
/// type is zero-sized. Digest algorithm identifiers found in objects are
/// returned as plain object identifiers by [`take_oid_from`] so that the
/// validation can report on unexpected algorithms rather than failing to
/// decode.
///
/// [`take_oid_from`]: #method.take_oid_from
/// [RFC 7935]: https://tools.ietf.org/html/rfc7935
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DigestAlgorithm(());

/// # Creating Digest Values
///
impl DigestAlgorithm {
    /// Returns the digest of `data` using this algorithm.
    pub fn digest(self, data: &[u8]) -> Digest {
        digest::digest(&digest::SHA256, data)
    }

    /// Returns a digest context for multi-step calculation of the digest.
    pub fn start(self) -> digest::Context {
        digest::Context::new(&digest::SHA256)
    }

    /// Returns the length of a digest value in octets.
    pub fn digest_len(self) -> usize {
        32
    }
}


/// # ASN.1 Values
///
/// ```txt
/// DigestAlgorithmIdentifiers ::= SET OF DigestAlgorithmIdentifier
/// DigestAlgorithmIdentifier  ::= AlgorithmIdentifier
/// AlgorithmIdentifier        ::= SEQUENCE {
///      algorithm                 OBJECT IDENTIFIER,
///      parameters                ANY DEFINED BY algorithm OPTIONAL }
/// ```
impl DigestAlgorithm {
    /// Takes a digest algorithm identifier and returns its OID.
    ///
    /// Any parameters are skipped.
    pub fn take_oid_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Oid<Bytes>, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let res = Oid::take_from(cons)?;
            cons.skip_all()?;
            Ok(res)
        })
    }

    /// Takes a set of digest algorithm identifiers and returns their OIDs.
    pub fn take_oid_set_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Vec<Oid<Bytes>>, DecodeError<S::Error>> {
        cons.take_set(|cons| {
            let mut res = Vec::new();
            while let Some(oid) = cons.take_opt_sequence(|cons| {
                let res = Oid::take_from(cons)?;
                cons.skip_all()?;
                Ok(res)
            })? {
                res.push(oid)
            }
            Ok(res)
        })
    }

    /// Returns whether the given OID identifies this algorithm.
    pub fn is_oid(oid: &Oid<Bytes>) -> bool {
        *oid == oid::SHA256
    }

    /// Provides an encoder for a single algorithm identifier.
    pub fn encode(self) -> impl encode::Values {
        encode::sequence((
            oid::SHA256.encode(),
            ().encode(),
        ))
    }

    /// Provides an encoder for an identifier as the sole value of a set.
    pub fn encode_set(self) -> impl encode::Values {
        encode::set(
            self.encode()
        )
    }

    /// Provides an encoder for just the object identifier of this algorithm.
    pub fn encode_oid(self) -> impl encode::Values {
        oid::SHA256.encode()
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use bcder::{ConstOid, Mode};
    use bcder::encode::Values;
    use super::*;

    const SHA1: ConstOid = Oid(&[43, 14, 3, 2, 26]);

    #[test]
    fn take_oid_with_and_without_null() {
        let with_null = DigestAlgorithm::default().encode().to_captured(
            Mode::Der
        );
        let oid = Mode::Der.decode(
            with_null.as_slice(), DigestAlgorithm::take_oid_from
        ).unwrap();
        assert!(DigestAlgorithm::is_oid(&oid));

        let without = encode::sequence(oid::SHA256.encode()).to_captured(
            Mode::Der
        );
        let oid = Mode::Der.decode(
            without.as_slice(), DigestAlgorithm::take_oid_from
        ).unwrap();
        assert!(DigestAlgorithm::is_oid(&oid));
    }

    #[test]
    fn other_digest_is_not_sha256() {
        let sha1 = encode::sequence(SHA1.encode()).to_captured(Mode::Der);
        let oid = Mode::Der.decode(
            sha1.as_slice(), DigestAlgorithm::take_oid_from
        ).unwrap();
        assert!(!DigestAlgorithm::is_oid(&oid));
    }

    #[test]
    fn digest_len() {
        let alg = DigestAlgorithm::default();
        assert_eq!(alg.digest(b"foo").as_ref().len(), alg.digest_len());
    }
}
