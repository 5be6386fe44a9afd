/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};
use zune_core::log::trace;

use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::stream::{block_end, position, skip_to, write_zeros};
use crate::traits::{DecodeBlock, EncodeBlock};
use crate::version::PsdVersion;

/// Size of the fields we know about, padded with zeros on write
const GLOBAL_MASK_LENGTH: u64 = 16;

/// Document wide mask overlay settings.
///
/// Older writers store only a prefix of the fields, fields missing
/// from the block keep their default values.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GlobalLayerMaskInfo {
    pub overlay_color_space: u16,
    pub color_components:    [u16; 4],
    /// Between 0 (transparent) and 100 (opaque)
    pub opacity:             u16,
    /// See the `KIND_*` constants
    pub kind:                u8
}

impl Default for GlobalLayerMaskInfo {
    fn default() -> Self {
        GlobalLayerMaskInfo {
            overlay_color_space: 0,
            color_components:    [0; 4],
            opacity:             100,
            kind:                0
        }
    }
}

impl GlobalLayerMaskInfo {
    pub const KIND_COLOR_SELECTED: u8 = 0;
    pub const KIND_COLOR_PROTECTED: u8 = 1;
    /// Use the value stored per layer
    pub const KIND_PER_LAYER: u8 = 128;

    pub fn new(
        overlay_color_space: u16, color_components: [u16; 4], opacity: u16, kind: u8
    ) -> Result<GlobalLayerMaskInfo, LayerEncodeErrors> {
        if opacity > 100 {
            return Err(LayerEncodeErrors::InvalidOpacity(opacity));
        }
        Ok(GlobalLayerMaskInfo {
            overlay_color_space,
            color_components,
            opacity,
            kind
        })
    }
}

/// Whether a field of `size` bytes still fits before `end`
fn has_room<T: ZByteReaderTrait>(
    stream: &mut ZReader<T>, end: u64, size: u64
) -> Result<bool, LayerDecodeErrors> {
    Ok(position(stream)?.saturating_add(size) <= end)
}

impl DecodeBlock for GlobalLayerMaskInfo {
    type Hint = ();

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, _: PsdVersion, _: ()
    ) -> Result<Self, LayerDecodeErrors> {
        let length = u64::from(stream.get_u32_be_err()?);
        let mut info = GlobalLayerMaskInfo::default();

        if length == 0 {
            return Ok(info);
        }
        let end = block_end(stream, length)?;

        trace!("Global layer mask info: {length} bytes");

        if has_room(stream, end, 2)? {
            info.overlay_color_space = stream.get_u16_be_err()?;

            if has_room(stream, end, 8)? {
                for component in info.color_components.iter_mut() {
                    *component = stream.get_u16_be_err()?;
                }

                if has_room(stream, end, 2)? {
                    info.opacity = stream.get_u16_be_err()?;

                    if has_room(stream, end, 1)? {
                        info.kind = stream.read_u8_err()?;
                    }
                }
            }
        }
        skip_to(stream, end, "global layer mask info")?;

        Ok(info)
    }
}

impl EncodeBlock for GlobalLayerMaskInfo {
    type Scope = ();

    fn length(&self, _: PsdVersion, _: ()) -> u64 {
        GLOBAL_MASK_LENGTH
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        4 + self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, _: PsdVersion, _: ()
    ) -> Result<(), LayerEncodeErrors> {
        if self.opacity > 100 {
            return Err(LayerEncodeErrors::InvalidOpacity(self.opacity));
        }
        stream.write_u32_be_err(GLOBAL_MASK_LENGTH as u32)?;
        stream.write_u16_be_err(self.overlay_color_space)?;

        for component in self.color_components {
            stream.write_u16_be_err(component)?;
        }
        stream.write_u16_be_err(self.opacity)?;
        stream.write_u8_err(self.kind)?;
        // filler
        write_zeros(stream, 3)
    }
}
