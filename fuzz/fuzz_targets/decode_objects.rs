#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use rpki_core::repository::aspa::AspaParser;
use rpki_core::repository::gbr::GhostbustersParser;
use rpki_core::repository::manifest::ManifestParser;
use rpki_core::repository::parser::CertParser;
use rpki_core::repository::roa::RoaParser;
use rpki_core::repository::Crl;
use rpki_core::validation::ValidationResult;

fuzz_target!(|data: &[u8]| {
    let (which, data) = match data.split_first() {
        Some((first, data)) => (*first, Bytes::copy_from_slice(data)),
        None => return,
    };

    match which % 6 {
        0 => { let _ = CertParser::parse("fuzz.cer", data); },
        1 => {
            let mut result = ValidationResult::with_location("fuzz.crl");
            let _ = Crl::parse(data, &mut result);
        },
        2 => { let _ = ManifestParser::parse("fuzz.mft", data); },
        3 => { let _ = RoaParser::parse("fuzz.roa", data); },
        4 => { let _ = AspaParser::parse("fuzz.asa", data); },
        5 => { let _ = GhostbustersParser::parse("fuzz.gbr", data); },
        _ => unreachable!(),
    }
});
