/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Additional layer information
//!
//! Tagged extension blocks found at the end of each layer record and
//! at the end of the layer and mask section. There are dozens of keys,
//! the payloads are kept raw so unknown keys survive a round trip.
//! A few common ones have typed accessors.
use alloc::string::String;
use alloc::vec::Vec;

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};
use zune_core::log::trace;

use crate::constants::{is_large_block_key, SIGNATURE_8B64, SIGNATURE_8BIM};
use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::stream::{
    check_length, read_key, read_length, read_vec, round_up, skip_bytes, write_length, write_zeros
};
use crate::traits::{DecodeBlock, EncodeBlock};
use crate::version::PsdVersion;

/// Signature an additional layer information block starts with
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Signature {
    #[default]
    Bim,
    B64
}

impl Signature {
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Signature> {
        match bytes {
            SIGNATURE_8BIM => Some(Signature::Bim),
            SIGNATURE_8B64 => Some(Signature::B64),
            _ => None
        }
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        match self {
            Signature::Bim => SIGNATURE_8BIM,
            Signature::B64 => SIGNATURE_8B64
        }
    }
}

/// Alignment of an additional layer information payload,
/// decided by where the block lives
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BlockPadding {
    /// Inside a layer record, payloads are padded to an even size
    #[default]
    Layer,
    /// At the end of the layer and mask section, payloads are
    /// padded to a multiple of four
    Section
}

impl BlockPadding {
    pub const fn alignment(self) -> u64 {
        match self {
            BlockPadding::Layer => 2,
            BlockPadding::Section => 4
        }
    }
}

/// Kind of a section divider (`lsct`) block, used to express layer groups
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SectionDivider {
    Other,
    OpenFolder,
    ClosedFolder,
    /// Hidden layer closing a group
    BoundingSectionDivider
}

impl SectionDivider {
    pub const fn from_int(int: u32) -> Option<SectionDivider> {
        match int {
            0 => Some(SectionDivider::Other),
            1 => Some(SectionDivider::OpenFolder),
            2 => Some(SectionDivider::ClosedFolder),
            3 => Some(SectionDivider::BoundingSectionDivider),
            _ => None
        }
    }
}

/// A single additional layer information block
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct AdditionalLayerInfo {
    pub signature: Signature,
    /// Four character key telling what the payload is
    pub key:       [u8; 4],
    /// Payload without the trailing padding
    pub data:      Vec<u8>
}

impl AdditionalLayerInfo {
    /// Create a block with the common `8BIM` signature
    pub fn new(key: [u8; 4], data: Vec<u8>) -> AdditionalLayerInfo {
        AdditionalLayerInfo {
            signature: Signature::Bim,
            key,
            data
        }
    }

    /// Create a `luni` block holding `name` as UTF-16
    pub fn unicode_name(name: &str) -> AdditionalLayerInfo {
        let units: Vec<u16> = name.encode_utf16().collect();
        let mut data = Vec::with_capacity(4 + units.len() * 2);

        data.extend_from_slice(&(units.len() as u32).to_be_bytes());
        for unit in units {
            data.extend_from_slice(&unit.to_be_bytes());
        }
        AdditionalLayerInfo::new(*b"luni", data)
    }

    /// Whether the length field is 8 bytes wide for this block
    fn has_wide_length(&self, version: PsdVersion) -> bool {
        version.is_large() && is_large_block_key(&self.key)
    }

    /// Check the payload size fits the block's length field
    pub(crate) fn validate(&self, version: PsdVersion) -> Result<(), LayerEncodeErrors> {
        check_length(self.data.len() as u64, self.has_wide_length(version))
    }

    /// Decode the UTF-16 layer name of a `luni` block
    pub fn as_unicode_name(&self) -> Option<String> {
        if &self.key != b"luni" {
            return None;
        }
        let count = u32::from_be_bytes(self.data.get(0..4)?.try_into().ok()?) as usize;
        let units = self.data.get(4..count.checked_mul(2)?.checked_add(4)?)?;

        let name = char::decode_utf16(
            units
                .chunks_exact(2)
                .map(|unit| u16::from_be_bytes([unit[0], unit[1]]))
        )
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();

        Some(name)
    }

    /// Kind of group boundary of a `lsct` block
    pub fn as_section_divider(&self) -> Option<SectionDivider> {
        if &self.key != b"lsct" {
            return None;
        }
        let kind = u32::from_be_bytes(self.data.get(0..4)?.try_into().ok()?);
        SectionDivider::from_int(kind)
    }

    /// Fill opacity of an `iOpa` block
    pub fn as_fill_opacity(&self) -> Option<u8> {
        if &self.key != b"iOpa" {
            return None;
        }
        self.data.first().copied()
    }

    /// Layer id of a `lyid` block
    pub fn as_layer_id(&self) -> Option<u32> {
        if &self.key != b"lyid" {
            return None;
        }
        Some(u32::from_be_bytes(self.data.get(0..4)?.try_into().ok()?))
    }
}

impl DecodeBlock for AdditionalLayerInfo {
    type Hint = BlockPadding;

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, version: PsdVersion, padding: BlockPadding
    ) -> Result<Self, LayerDecodeErrors> {
        let raw_signature = read_key(stream)?;
        let signature = Signature::from_bytes(raw_signature)
            .ok_or(LayerDecodeErrors::UnknownSignature(raw_signature))?;

        let key = read_key(stream)?;
        let length = read_length(stream, version.is_large() && is_large_block_key(&key))?;

        trace!(
            "Additional layer info {:?}: {length} bytes",
            core::str::from_utf8(&key).unwrap_or("????")
        );

        let data = read_vec(stream, length)?;

        skip_bytes(stream, round_up(length, padding.alignment()) - length)?;

        Ok(AdditionalLayerInfo {
            signature,
            key,
            data
        })
    }
}

impl EncodeBlock for AdditionalLayerInfo {
    type Scope = BlockPadding;

    fn length(&self, _: PsdVersion, _: BlockPadding) -> u64 {
        self.data.len() as u64
    }

    fn total_length(&self, version: PsdVersion, padding: BlockPadding) -> u64 {
        let length_field = if self.has_wide_length(version) { 8 } else { 4 };

        4 + 4 + length_field + round_up(self.length(version, padding), padding.alignment())
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, padding: BlockPadding
    ) -> Result<(), LayerEncodeErrors> {
        let length = self.length(version, padding);

        stream.write_const_bytes(&self.signature.to_bytes())?;
        stream.write_const_bytes(&self.key)?;
        write_length(stream, length, self.has_wide_length(version))?;
        stream.write_all(&self.data)?;

        write_zeros(stream, round_up(length, padding.alignment()) - length)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use zune_core::bytestream::{ZCursor, ZReader, ZWriter};

    use crate::additional::{AdditionalLayerInfo, BlockPadding, SectionDivider, Signature};
    use crate::errors::LayerDecodeErrors;
    use crate::traits::{DecodeBlock, EncodeBlock};
    use crate::version::PsdVersion;

    fn encode(info: &AdditionalLayerInfo, version: PsdVersion, padding: BlockPadding) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = ZWriter::new(&mut out);
        info.write(&mut writer, version, padding).unwrap();
        assert_eq!(
            writer.bytes_written() as u64,
            info.total_length(version, padding)
        );
        out
    }

    #[test]
    fn large_keys_use_wide_lengths_in_psb() {
        let layr = AdditionalLayerInfo::new(*b"Layr", vec![1, 2, 3, 4]);

        let psb = encode(&layr, PsdVersion::Psb, BlockPadding::Layer);
        assert_eq!(psb.len(), 8 + 8 + 4);
        assert_eq!(&psb[8..16], &4_u64.to_be_bytes());

        let psd = encode(&layr, PsdVersion::Psd, BlockPadding::Layer);
        assert_eq!(psd.len(), 8 + 4 + 4);
        assert_eq!(&psd[8..12], &4_u32.to_be_bytes());

        let tysh = AdditionalLayerInfo::new(*b"TySh", vec![1, 2, 3, 4]);
        let psb = encode(&tysh, PsdVersion::Psb, BlockPadding::Layer);
        assert_eq!(psb.len(), 8 + 4 + 4);
    }

    #[test]
    fn padding_depends_on_scope() {
        let info = AdditionalLayerInfo {
            signature: Signature::B64,
            key:       *b"abcd",
            data:      vec![7; 5]
        };

        let layer = encode(&info, PsdVersion::Psd, BlockPadding::Layer);
        assert_eq!(layer.len(), 12 + 6);
        assert_eq!(&layer[..4], b"8B64");

        let section = encode(&info, PsdVersion::Psd, BlockPadding::Section);
        assert_eq!(section.len(), 12 + 8);
        assert_eq!(&section[17..], &[0, 0, 0]);

        let mut reader = ZReader::new(ZCursor::new(&section));
        let decoded = AdditionalLayerInfo::read(&mut reader, PsdVersion::Psd, BlockPadding::Section)
            .unwrap();
        assert_eq!(decoded, info);
        assert_eq!(reader.position().unwrap(), section.len() as u64);
    }

    #[test]
    fn unknown_signature_is_rejected() {
        let bytes = *b"ABCDluni\0\0\0\0";
        let mut reader = ZReader::new(ZCursor::new(&bytes));

        let err = AdditionalLayerInfo::read(&mut reader, PsdVersion::Psd, BlockPadding::Layer)
            .unwrap_err();
        assert!(matches!(err, LayerDecodeErrors::UnknownSignature(sig) if &sig == b"ABCD"));
    }

    #[test]
    fn typed_views() {
        let name = AdditionalLayerInfo::unicode_name("Ebene 1 ✓");
        assert_eq!(name.as_unicode_name().as_deref(), Some("Ebene 1 ✓"));
        assert_eq!(name.as_fill_opacity(), None);

        let divider = AdditionalLayerInfo::new(*b"lsct", 3_u32.to_be_bytes().to_vec());
        assert_eq!(
            divider.as_section_divider(),
            Some(SectionDivider::BoundingSectionDivider)
        );

        let fill = AdditionalLayerInfo::new(*b"iOpa", vec![128, 0, 0, 0]);
        assert_eq!(fill.as_fill_opacity(), Some(128));

        let id = AdditionalLayerInfo::new(*b"lyid", 42_u32.to_be_bytes().to_vec());
        assert_eq!(id.as_layer_id(), Some(42));

        // truncated payloads do not panic
        let broken = AdditionalLayerInfo::new(*b"luni", vec![0, 0, 0, 9, 0]);
        assert_eq!(broken.as_unicode_name(), None);
    }
}
