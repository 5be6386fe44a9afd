#![no_main]

use libfuzzer_sys::fuzz_target;
use zune_psd_layers::{LayerAndMaskInfo, PsdVersion};

fuzz_target!(|data: &[u8]| {
    if let Some((first, rest)) = data.split_first()
    {
        let version = if first & 1 == 0 { PsdVersion::Psd } else { PsdVersion::Psb };

        let Ok(section) = LayerAndMaskInfo::decode(rest, version) else {
            return;
        };
        // values written by us always decode and encode to the same bytes
        let Ok(encoded) = section.encode(version) else {
            return;
        };
        let decoded = LayerAndMaskInfo::decode(&encoded, version)
            .expect("Failed to decode an encoded section!");
        let reencoded = decoded
            .encode(version)
            .expect("Failed to encode a decoded section!");

        assert!(
            encoded == reencoded,
            "Re-encoding produced different bytes!"
        );
    }
});
