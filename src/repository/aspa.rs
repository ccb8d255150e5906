//! Autonomous System Provider Authorization.
//!
//! An ASPA lists the ASes a customer AS uses as its upstream providers.
//! See [draft-ietf-sidrops-aspa-profile] for the details.
//!
//! [draft-ietf-sidrops-aspa-profile]: https://datatracker.ietf.org/doc/draft-ietf-sidrops-aspa-profile/

use bcder::{decode, encode};
use bcder::{ConstOid, Mode, Tag};
use bcder::decode::DecodeError;
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use crate::oid;
use crate::crypto::Signer;
use crate::resources::{AsBlocks, Asn, IpBlocks, ResourceSet, ResourceType};
use crate::validation::ValidationResult;
use crate::validation::checks::*;
use super::error::BuildError;
use super::rescert::ResourceCert;
use super::sigobj::{
    SignedObject, SignedObjectBuilder, SignedObjectContent, SignedObjectParser
};


//------------ Aspa ----------------------------------------------------------

pub type Aspa = SignedObject<AspaContent>;

pub type AspaParser = SignedObjectParser<AspaContent>;


//------------ AspaContent ---------------------------------------------------

/// The content of an ASPA.
///
/// ```txt
/// ASProviderAttestation ::= SEQUENCE {
///     version [0]   INTEGER DEFAULT 0,
///     customerASID  ASID,
///     providers     ProviderASSet }
///
/// ProviderASSet ::= SEQUENCE (SIZE(1..MAX)) OF ASID
/// ```
///
/// The version must be present and be 1.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AspaContent {
    customer: Asn,

    /// The provider ASes in strictly ascending order.
    providers: Vec<Asn>,
}

impl AspaContent {
    /// The only supported version.
    pub const VERSION: u8 = 1;

    pub fn customer(&self) -> Asn {
        self.customer
    }

    pub fn providers(&self) -> &[Asn] {
        &self.providers
    }

    /// Returns the resources the EE certificate needs to hold.
    pub fn to_resources(&self) -> ResourceSet {
        ResourceSet::new(
            Some(self.customer).into_iter().collect::<AsBlocks>(),
            IpBlocks::empty(), IpBlocks::empty(),
        )
    }
}


//--- SignedObjectContent

impl SignedObjectContent for AspaContent {
    const CONTENT_TYPE: ConstOid = oid::CT_ASPA;
    const CONTENT_TYPE_CHECK: &'static str = ASPA_CONTENT_TYPE;

    fn decode_content(
        content: Bytes, result: &mut ValidationResult
    ) -> Option<Self> {
        let raw = match Mode::Der.decode(content, RawAspa::take_from) {
            Ok(raw) => {
                result.pass(ASPA_CONTENT_STRUCTURE, &[]);
                raw
            }
            Err(err) => {
                result.error(ASPA_CONTENT_STRUCTURE, &[&err]);
                return None
            }
        };
        let mut ok = match raw.version {
            Some(version) => result.reject_if_false(
                version == u64::from(Self::VERSION), ASPA_VERSION, &[&version]
            ),
            None => {
                result.error(ASPA_VERSION, &[&"0 [missing]"]);
                false
            }
        };
        ok &= result.reject_if_false(
            !raw.providers.is_empty()
                && raw.providers.windows(2).all(|pair| pair[0] < pair[1]),
            ASPA_PROVIDER_AS_SET_VALID, &[]
        );
        ok &= result.reject_if_true(
            raw.providers.contains(&raw.customer),
            ASPA_CUSTOMER_ASN_NOT_IN_PROVIDER_ASNS, &[&raw.customer]
        );
        if !ok {
            return None
        }
        Some(AspaContent {
            customer: raw.customer,
            providers: raw.providers,
        })
    }

    fn check_certificate(
        &self, cert: &ResourceCert, result: &mut ValidationResult
    ) {
        result.reject_if_false(
            !cert.is_inherited(ResourceType::Asn)
                && cert.resources().asn().contains_asn(self.customer),
            ASPA_CUSTOMER_ASN_CERTIFIED, &[&self.customer]
        );
    }

    fn encode_content(&self) -> Bytes {
        encode::sequence((
            encode::sequence_as(Tag::CTX_0, Self::VERSION.encode()),
            self.customer.encode(),
            encode::sequence(
                encode::slice(&self.providers, |asn| asn.encode())
            ),
        )).to_captured(Mode::Der).into_bytes()
    }
}


//------------ RawAspa -------------------------------------------------------

/// The ASPA content before it has been checked.
struct RawAspa {
    version: Option<u64>,
    customer: Asn,
    providers: Vec<Asn>,
}

impl RawAspa {
    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = cons.take_opt_constructed_if(
                Tag::CTX_0, |cons| cons.take_u64()
            )?;
            let customer = Asn::take_from(cons)?;
            let providers = cons.take_sequence(|cons| {
                let mut res = Vec::new();
                while let Some(asn) = cons.take_opt_u32()? {
                    res.push(Asn::from_u32(asn))
                }
                Ok(res)
            })?;
            Ok(RawAspa { version, customer, providers })
        })
    }
}


//------------ AspaBuilder ---------------------------------------------------

/// A builder for ASPAs.
#[derive(Clone, Debug)]
pub struct AspaBuilder {
    customer: Asn,
    providers: Vec<Asn>,
}

impl AspaBuilder {
    pub fn new(customer: Asn) -> Self {
        AspaBuilder { customer, providers: Vec::new() }
    }

    /// Adds a provider.
    ///
    /// Providers can be added in any order.
    pub fn with_provider(mut self, provider: Asn) -> Self {
        self.providers.push(provider);
        self
    }

    /// Checks the fields and returns the content.
    pub fn into_content(mut self) -> Result<AspaContent, BuildError> {
        self.providers.sort();
        self.providers.dedup();
        if self.providers.is_empty() {
            return Err(BuildError::MissingField("providers"))
        }
        if self.providers.contains(&self.customer) {
            return Err(BuildError::InvalidField("providers"))
        }
        Ok(AspaContent {
            customer: self.customer,
            providers: self.providers,
        })
    }

    /// Builds the signed ASPA.
    ///
    /// The EE certificate holds exactly the customer AS.
    pub fn build<S: Signer>(
        self,
        object: SignedObjectBuilder,
        signer: &S,
        issuer_key: &S::KeyId,
    ) -> Result<Aspa, BuildError> {
        let content = self.into_content()?;
        object.with_resources(content.to_resources()).build(
            content, signer, issuer_key
        )
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use crate::repository::test::{ee_builder, DummySigner};
    use crate::validation::ValidationStatus;
    use super::*;

    fn decode(content: Bytes) -> (Option<AspaContent>, ValidationResult) {
        let mut result = ValidationResult::with_location("test.asa");
        let res = AspaContent::decode_content(content, &mut result);
        (res, result)
    }

    fn encode_raw(
        version: Option<u8>, customer: u32, providers: &[u32]
    ) -> Bytes {
        encode::sequence((
            version.map(|v| encode::sequence_as(Tag::CTX_0, v.encode())),
            customer.encode(),
            encode::sequence(encode::slice(providers, |asn| (*asn).encode())),
        )).to_captured(Mode::Der).into_bytes()
    }

    fn status(result: &ValidationResult, key: &str) -> Option<ValidationStatus> {
        result.result_for_current_location(key).map(|check| check.status())
    }

    #[test]
    fn decode_built_content() {
        let content = AspaBuilder::new(64496.into())
            .with_provider(64511.into())
            .with_provider(64500.into())
            .with_provider(64511.into())
            .into_content().unwrap();
        assert_eq!(
            content.providers(), &[Asn::from_u32(64500), Asn::from_u32(64511)]
        );
        let (decoded, result) = decode(content.encode_content());
        assert!(!result.has_failures());
        assert_eq!(decoded, Some(content));
    }

    #[test]
    fn version() {
        let (decoded, result) = decode(encode_raw(None, 64496, &[64500]));
        assert!(decoded.is_none());
        assert_eq!(status(&result, ASPA_VERSION), Some(ValidationStatus::Error));

        let (decoded, result) = decode(encode_raw(Some(0), 64496, &[64500]));
        assert!(decoded.is_none());
        assert_eq!(status(&result, ASPA_VERSION), Some(ValidationStatus::Error));

        let (decoded, result) = decode(encode_raw(Some(1), 64496, &[64500]));
        assert!(decoded.is_some());
        assert_eq!(status(&result, ASPA_VERSION), Some(ValidationStatus::Passed));
    }

    #[test]
    fn provider_set() {
        let sets: [&[u32]; 3] = [&[], &[64510, 64500], &[64500, 64500]];
        for providers in sets.iter() {
            let (decoded, result) = decode(
                encode_raw(Some(1), 64496, providers)
            );
            assert!(decoded.is_none());
            assert_eq!(
                status(&result, ASPA_PROVIDER_AS_SET_VALID),
                Some(ValidationStatus::Error)
            );
        }
    }

    #[test]
    fn customer_in_providers() {
        let (decoded, result) = decode(
            encode_raw(Some(1), 64500, &[64496, 64500])
        );
        assert!(decoded.is_none());
        assert_eq!(
            status(&result, ASPA_CUSTOMER_ASN_NOT_IN_PROVIDER_ASNS),
            Some(ValidationStatus::Error)
        );
        assert!(
            AspaBuilder::new(64500.into()).with_provider(64500.into())
                .into_content().is_err()
        );
    }

    #[test]
    fn malformed() {
        let (decoded, result) = decode(Bytes::from_static(b"\x30\x00"));
        assert!(decoded.is_none());
        assert_eq!(
            status(&result, ASPA_CONTENT_STRUCTURE),
            Some(ValidationStatus::Error)
        );
    }

    #[test]
    fn customer_certified() {
        let signer = DummySigner;
        let content = AspaBuilder::new(64496.into())
            .with_provider(64500.into())
            .into_content().unwrap();

        let cert = ee_builder(&signer)
            .with_resources("AS64496".parse().unwrap())
            .build(&signer, &()).unwrap().into_resource_cert().unwrap();
        let mut result = ValidationResult::with_location("test.asa");
        content.check_certificate(&cert, &mut result);
        assert_eq!(
            status(&result, ASPA_CUSTOMER_ASN_CERTIFIED),
            Some(ValidationStatus::Passed)
        );

        let cert = ee_builder(&signer)
            .with_resources("AS64497".parse().unwrap())
            .build(&signer, &()).unwrap().into_resource_cert().unwrap();
        let mut result = ValidationResult::with_location("test.asa");
        content.check_certificate(&cert, &mut result);
        assert_eq!(
            status(&result, ASPA_CUSTOMER_ASN_CERTIFIED),
            Some(ValidationStatus::Error)
        );
    }
}
