/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The layer and mask information section
use alloc::vec::Vec;

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZCursor, ZReader, ZWriter};
use zune_core::log::{trace, warn};

use crate::additional::{AdditionalLayerInfo, BlockPadding};
use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::global_mask::GlobalLayerMaskInfo;
use crate::layer_info::LayerInfo;
use crate::stream::{block_end, position, read_length, skip_to, write_length};
use crate::traits::{DecodeBlock, EncodeBlock};
use crate::version::PsdVersion;

/// Signature, key and the narrowest length field
const MIN_BLOCK_HEADER: u64 = 4 + 4 + 4;

/// Layer and mask information of a document
///
/// # Example
/// ```
/// use zune_psd_layers::{LayerAndMaskInfo, PsdVersion};
///
/// let section = LayerAndMaskInfo::default();
/// let bytes = section.encode(PsdVersion::Psd).unwrap();
/// let decoded = LayerAndMaskInfo::decode(&bytes, PsdVersion::Psd).unwrap();
/// assert_eq!(decoded, section);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerAndMaskInfo {
    pub layer_info:             LayerInfo,
    pub global_layer_mask_info: GlobalLayerMaskInfo,
    /// Document wide additional layer information, e.g. `Lr16` layers
    /// of 16 bit documents
    pub additional_layer_info:  Vec<AdditionalLayerInfo>
}

impl LayerAndMaskInfo {
    /// Decode a section from `bytes`, which must start at the
    /// section's length field
    pub fn decode(bytes: &[u8], version: PsdVersion) -> Result<LayerAndMaskInfo, LayerDecodeErrors> {
        let mut stream = ZReader::new(ZCursor::new(bytes));
        LayerAndMaskInfo::read(&mut stream, version, ())
    }

    /// Encode the section, length field included
    pub fn encode(&self, version: PsdVersion) -> Result<Vec<u8>, LayerEncodeErrors> {
        let size = usize::try_from(self.total_length(version, ()))
            .map_err(|_| LayerEncodeErrors::Generic("Section too large for this platform"))?;

        let mut out = Vec::with_capacity(size);
        let mut stream = ZWriter::new(&mut out);

        self.write(&mut stream, version, ())?;

        Ok(out)
    }

    /// Find a document wide additional layer information block
    pub fn find_additional_info(&self, key: &[u8; 4]) -> Option<&AdditionalLayerInfo> {
        self.additional_layer_info
            .iter()
            .find(|info| &info.key == key)
    }
}

impl DecodeBlock for LayerAndMaskInfo {
    type Hint = ();

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, version: PsdVersion, _: ()
    ) -> Result<Self, LayerDecodeErrors> {
        let length = read_length(stream, version.is_large())?;

        if length == 0 {
            return Ok(LayerAndMaskInfo::default());
        }
        let end = block_end(stream, length)?;

        trace!("Layer and mask information: {length} bytes, version {version:?}");

        let layer_info = LayerInfo::read(stream, version, ())?;

        let global_layer_mask_info = if end.saturating_sub(position(stream)?) >= 4 {
            GlobalLayerMaskInfo::read(stream, version, ())?
        } else {
            warn!("Layer and mask section ends before the global layer mask");
            GlobalLayerMaskInfo::default()
        };

        let mut additional_layer_info = Vec::new();

        while end.saturating_sub(position(stream)?) >= MIN_BLOCK_HEADER {
            additional_layer_info.push(AdditionalLayerInfo::read(
                stream,
                version,
                BlockPadding::Section
            )?);
        }
        skip_to(stream, end, "layer and mask information")?;

        Ok(LayerAndMaskInfo {
            layer_info,
            global_layer_mask_info,
            additional_layer_info
        })
    }
}

impl EncodeBlock for LayerAndMaskInfo {
    type Scope = ();

    fn length(&self, version: PsdVersion, _: ()) -> u64 {
        self.layer_info.total_length(version, ())
            + self.global_layer_mask_info.total_length(version, ())
            + self
                .additional_layer_info
                .iter()
                .map(|info| info.total_length(version, BlockPadding::Section))
                .sum::<u64>()
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        version.length_field_size() + self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, scope: ()
    ) -> Result<(), LayerEncodeErrors> {
        self.layer_info.validate(version)?;

        for info in &self.additional_layer_info {
            info.validate(version)?;
        }

        if self.global_layer_mask_info.opacity > 100 {
            return Err(LayerEncodeErrors::InvalidOpacity(
                self.global_layer_mask_info.opacity
            ));
        }

        write_length(stream, self.length(version, scope), version.is_large())?;

        self.layer_info.write(stream, version, ())?;
        self.global_layer_mask_info.write(stream, version, ())?;

        for info in &self.additional_layer_info {
            info.write(stream, version, BlockPadding::Section)?;
        }
        Ok(())
    }
}
