#![no_main]

use libfuzzer_sys::fuzz_target;
use zune_psd_layers::{LayerAndMaskInfo, PsdVersion};

fuzz_target!(|data: &[u8]| {
    if let Some((first, rest)) = data.split_first()
    {
        let version = if first & 1 == 0 { PsdVersion::Psd } else { PsdVersion::Psb };

        if let Ok(section) = LayerAndMaskInfo::decode(rest, version)
        {
            let _ = section.encode(version);
        }
    }
});
