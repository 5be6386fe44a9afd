/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Layer mask and adjustment layer data
//!
//! The record comes in three shapes, told apart by its length
//! - `0`: the layer has no mask
//! - `20`: rectangle, default color and flags followed by two padding bytes
//! - anything larger: optional mask parameters followed by the "real" user mask
use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};
use zune_core::log::trace;

use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::rect::Rect;
use crate::stream::{block_end, position, read_bool, read_f64, skip_to, write_bool, write_f64};
use crate::traits::{DecodeBlock, EncodeBlock};
use crate::version::PsdVersion;

/// Position is relative to the layer
pub const MASK_POSITION_RELATIVE: u8 = 1 << 0;
/// Layer mask is disabled
pub const MASK_DISABLED: u8 = 1 << 1;
/// Invert layer mask when blending (obsolete)
pub const MASK_INVERT: u8 = 1 << 2;
/// The user mask came from rendering other data
pub const MASK_FROM_RENDERING: u8 = 1 << 3;
/// The user and/or vector masks have parameters applied to them
pub const MASK_HAS_PARAMETERS: u8 = 1 << 4;

const USER_MASK_DENSITY: u8 = 1 << 0;
const USER_MASK_FEATHER: u8 = 1 << 1;
const VECTOR_MASK_DENSITY: u8 = 1 << 2;
const VECTOR_MASK_FEATHER: u8 = 1 << 3;

/// Payload size of the short form, including its two padding bytes
const SHORT_FORM_LENGTH: u64 = 20;
/// rectangle + default color + flags
const MASK_HEADER_LENGTH: u64 = Rect::SIZE + 1 + 1;

/// Mask flags byte, see the `MASK_*` constants.
///
/// [`MASK_HAS_PARAMETERS`] is never stored here, it is written
/// when the mask carries parameters and dropped when reading.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct MaskFlags(u8);

impl MaskFlags {
    pub const fn from_bits(bits: u8) -> MaskFlags {
        MaskFlags(bits & !MASK_HAS_PARAMETERS)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub fn set(&mut self, flag: u8, value: bool) {
        let flag = flag & !MASK_HAS_PARAMETERS;

        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Density and feather applied to the user and vector masks,
/// each one is optional
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct MaskParameters {
    pub user_mask_density:   Option<u8>,
    pub user_mask_feather:   Option<f64>,
    pub vector_mask_density: Option<u8>,
    pub vector_mask_feather: Option<f64>
}

impl MaskParameters {
    /// Bitmask of which parameters are present
    fn presence(&self) -> u8 {
        let mut flags = 0;

        if self.user_mask_density.is_some() {
            flags |= USER_MASK_DENSITY;
        }
        if self.user_mask_feather.is_some() {
            flags |= USER_MASK_FEATHER;
        }
        if self.vector_mask_density.is_some() {
            flags |= VECTOR_MASK_DENSITY;
        }
        if self.vector_mask_feather.is_some() {
            flags |= VECTOR_MASK_FEATHER;
        }
        flags
    }

    pub fn is_empty(&self) -> bool {
        self.presence() == 0
    }

    /// Presence byte and the values, nothing at all when empty
    fn length(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let densities = [self.user_mask_density, self.vector_mask_density];
        let feathers = [self.user_mask_feather, self.vector_mask_feather];

        1 + densities.iter().flatten().count() as u64
            + 8 * feathers.iter().flatten().count() as u64
    }

    fn read<T: ZByteReaderTrait>(stream: &mut ZReader<T>) -> Result<MaskParameters, LayerDecodeErrors> {
        let presence = stream.read_u8_err()?;
        let mut parameters = MaskParameters::default();

        if presence & USER_MASK_DENSITY != 0 {
            parameters.user_mask_density = Some(stream.read_u8_err()?);
        }
        if presence & USER_MASK_FEATHER != 0 {
            parameters.user_mask_feather = Some(read_f64(stream)?);
        }
        if presence & VECTOR_MASK_DENSITY != 0 {
            parameters.vector_mask_density = Some(stream.read_u8_err()?);
        }
        if presence & VECTOR_MASK_FEATHER != 0 {
            parameters.vector_mask_feather = Some(read_f64(stream)?);
        }
        Ok(parameters)
    }

    fn write<T: ZByteWriterTrait>(&self, stream: &mut ZWriter<T>) -> Result<(), LayerEncodeErrors> {
        if self.is_empty() {
            return Ok(());
        }
        stream.write_u8_err(self.presence())?;

        if let Some(density) = self.user_mask_density {
            stream.write_u8_err(density)?;
        }
        if let Some(feather) = self.user_mask_feather {
            write_f64(stream, feather)?;
        }
        if let Some(density) = self.vector_mask_density {
            stream.write_u8_err(density)?;
        }
        if let Some(feather) = self.vector_mask_feather {
            write_f64(stream, feather)?;
        }
        Ok(())
    }
}

/// The real user mask, stored only by the long form of the mask record
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct RealUserMask {
    pub flags:            u8,
    pub background_color: bool,
    pub rect:             Rect
}

impl RealUserMask {
    const SIZE: u64 = 1 + 1 + Rect::SIZE;

    fn read<T: ZByteReaderTrait>(stream: &mut ZReader<T>) -> Result<RealUserMask, LayerDecodeErrors> {
        Ok(RealUserMask {
            flags:            stream.read_u8_err()?,
            background_color: read_bool(stream)?,
            rect:             Rect::read(stream)?
        })
    }

    fn write<T: ZByteWriterTrait>(&self, stream: &mut ZWriter<T>) -> Result<(), LayerEncodeErrors> {
        stream.write_u8_err(self.flags)?;
        write_bool(stream, self.background_color)?;
        self.rect.write(stream)
    }
}

/// What the long form of the mask record adds to the short one
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct MaskExtension {
    pub parameters: MaskParameters,
    pub real:       RealUserMask
}

/// Layer mask information of a single layer record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerMask {
    pub rect:          Rect,
    pub default_color: bool,
    pub flags:         MaskFlags,
    /// `None` when the record uses the short 20 byte form
    pub extension:     Option<MaskExtension>
}

impl LayerMask {
    /// Whether this mask is written as the short, 20 byte record
    pub fn is_short_form(&self) -> bool {
        self.extension.is_none()
    }

    pub const fn is_disabled(&self) -> bool {
        self.flags.contains(MASK_DISABLED)
    }

    pub const fn is_position_relative(&self) -> bool {
        self.flags.contains(MASK_POSITION_RELATIVE)
    }

    pub fn parameters(&self) -> Option<&MaskParameters> {
        self.extension.as_ref().map(|extension| &extension.parameters)
    }

    pub fn real(&self) -> Option<&RealUserMask> {
        self.extension.as_ref().map(|extension| &extension.real)
    }

    /// Flags byte as written, bit 4 is set iff parameters follow
    fn written_flags(&self) -> u8 {
        match &self.extension {
            Some(extension) if !extension.parameters.is_empty() => {
                self.flags.bits() | MASK_HAS_PARAMETERS
            }
            _ => self.flags.bits()
        }
    }
}

impl EncodeBlock for LayerMask {
    type Scope = ();

    fn length(&self, _: PsdVersion, _: ()) -> u64 {
        match &self.extension {
            None => SHORT_FORM_LENGTH,
            Some(extension) => {
                MASK_HEADER_LENGTH + extension.parameters.length() + RealUserMask::SIZE
            }
        }
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        4 + self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, scope: ()
    ) -> Result<(), LayerEncodeErrors> {
        // at most 18 + 19 + 18 bytes, always fits
        stream.write_u32_be_err(self.length(version, scope) as u32)?;
        self.rect.write(stream)?;
        write_bool(stream, self.default_color)?;
        stream.write_u8_err(self.written_flags())?;

        match &self.extension {
            None => {
                stream.write_u16_be_err(0)?;
                Ok(())
            }
            Some(extension) => {
                extension.parameters.write(stream)?;
                extension.real.write(stream)
            }
        }
    }
}

/// The mask record as stored in a layer record, a zero length
/// record means the layer has no mask
impl DecodeBlock for Option<LayerMask> {
    type Hint = ();

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, _: PsdVersion, _: ()
    ) -> Result<Self, LayerDecodeErrors> {
        let length = u64::from(stream.get_u32_be_err()?);

        if length == 0 {
            return Ok(None);
        }
        let start = position(stream)?;
        let end = block_end(stream, length)?;

        trace!("Layer mask: {length} bytes at offset {start}");

        let rect = Rect::read(stream)?;
        let default_color = read_bool(stream)?;
        let raw_flags = stream.read_u8_err()?;

        let extension = if length == SHORT_FORM_LENGTH {
            None
        } else {
            let parameters = if raw_flags & MASK_HAS_PARAMETERS != 0 {
                MaskParameters::read(stream)?
            } else {
                MaskParameters::default()
            };
            Some(MaskExtension {
                parameters,
                real: RealUserMask::read(stream)?
            })
        };

        skip_to(stream, end, "layer mask")?;

        Ok(Some(LayerMask {
            rect,
            default_color,
            flags: MaskFlags::from_bits(raw_flags),
            extension
        }))
    }
}

impl EncodeBlock for Option<LayerMask> {
    type Scope = ();

    fn length(&self, version: PsdVersion, scope: ()) -> u64 {
        self.as_ref().map_or(0, |mask| mask.length(version, scope))
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        4 + self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, scope: ()
    ) -> Result<(), LayerEncodeErrors> {
        match self {
            Some(mask) => mask.write(stream, version, scope),
            None => {
                stream.write_u32_be_err(0)?;
                Ok(())
            }
        }
    }
}
