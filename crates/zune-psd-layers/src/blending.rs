/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Layer blending ranges, the "Blend If" sliders
use alloc::vec::Vec;

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};
use zune_core::log::{trace, warn};

use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::stream::{block_end, position, skip_to};
use crate::traits::{DecodeBlock, EncodeBlock};
use crate::version::PsdVersion;

/// Thresholds of a single blend if slider
///
/// Each end of the slider can be split in two, `black0..black1`
/// and `white0..white1` are the ranges over which the blend fades.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct BlendingRange {
    pub black0: u8,
    pub black1: u8,
    pub white0: u8,
    pub white1: u8
}

impl BlendingRange {
    /// A slider that lets every tone through
    pub const FULL: BlendingRange = BlendingRange {
        black0: 0,
        black1: 0,
        white0: 255,
        white1: 255
    };
}

impl DecodeBlock for BlendingRange {
    type Hint = ();

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, _: PsdVersion, _: ()
    ) -> Result<Self, LayerDecodeErrors> {
        let [black0, black1, white0, white1] = stream.read_fixed_bytes_or_error::<4>()?;

        Ok(BlendingRange {
            black0,
            black1,
            white0,
            white1
        })
    }
}

impl EncodeBlock for BlendingRange {
    type Scope = ();

    fn length(&self, _: PsdVersion, _: ()) -> u64 {
        4
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, _: PsdVersion, _: ()
    ) -> Result<(), LayerEncodeErrors> {
        stream.write_const_bytes(&[self.black0, self.black1, self.white0, self.white1])?;
        Ok(())
    }
}

/// Source and destination ranges of one channel
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct BlendingRangePair {
    pub source: BlendingRange,
    pub dest:   BlendingRange
}

impl BlendingRangePair {
    pub const FULL: BlendingRangePair = BlendingRangePair {
        source: BlendingRange::FULL,
        dest:   BlendingRange::FULL
    };
    const SIZE: u64 = 8;
}

impl DecodeBlock for BlendingRangePair {
    type Hint = ();

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, version: PsdVersion, _: ()
    ) -> Result<Self, LayerDecodeErrors> {
        Ok(BlendingRangePair {
            source: BlendingRange::read(stream, version, ())?,
            dest:   BlendingRange::read(stream, version, ())?
        })
    }
}

impl EncodeBlock for BlendingRangePair {
    type Scope = ();

    fn length(&self, version: PsdVersion, scope: ()) -> u64 {
        self.source.total_length(version, scope) + self.dest.total_length(version, scope)
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, scope: ()
    ) -> Result<(), LayerEncodeErrors> {
        self.source.write(stream, version, scope)?;
        self.dest.write(stream, version, scope)
    }
}

/// Blending ranges of a layer
///
/// A layer without blending ranges has `None` in its record,
/// stored as a zero length block.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BlendingRanges {
    pub composite_gray_blend: BlendingRangePair,
    /// One pair per channel of the layer
    pub channels:             Vec<BlendingRangePair>
}

impl Default for BlendingRanges {
    fn default() -> Self {
        BlendingRanges::with_channels(0)
    }
}

impl BlendingRanges {
    /// Ranges that let everything through for a layer with `num_channels` channels
    pub fn with_channels(num_channels: usize) -> BlendingRanges {
        BlendingRanges {
            composite_gray_blend: BlendingRangePair::FULL,
            channels:             alloc::vec![BlendingRangePair::FULL; num_channels]
        }
    }
}

impl EncodeBlock for BlendingRanges {
    type Scope = ();

    fn length(&self, _: PsdVersion, _: ()) -> u64 {
        BlendingRangePair::SIZE * (1 + self.channels.len() as u64)
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        4 + self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, scope: ()
    ) -> Result<(), LayerEncodeErrors> {
        let length = self.length(version, scope);
        let length = u32::try_from(length).map_err(|_| LayerEncodeErrors::LengthOverflow(length))?;

        stream.write_u32_be_err(length)?;
        self.composite_gray_blend.write(stream, version, scope)?;

        for channel in &self.channels {
            channel.write(stream, version, scope)?;
        }
        Ok(())
    }
}

/// The blending ranges block of a layer record, a zero length
/// block means the layer has none
impl DecodeBlock for Option<BlendingRanges> {
    /// Number of channels the owning layer record declared
    type Hint = usize;

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, version: PsdVersion, num_channels: usize
    ) -> Result<Self, LayerDecodeErrors> {
        let length = u64::from(stream.get_u32_be_err()?);

        if length == 0 {
            return Ok(None);
        }
        let end = block_end(stream, length)?;

        trace!("Blending ranges: {length} bytes");

        let composite_gray_blend = BlendingRangePair::read(stream, version, ())?;

        // the channel count comes from the block size, not from the record
        let mut channels = Vec::new();

        while end.saturating_sub(position(stream)?) >= BlendingRangePair::SIZE {
            channels.push(BlendingRangePair::read(stream, version, ())?);
        }
        if channels.len() != num_channels {
            warn!(
                "Blending ranges hold {} channels but the layer has {num_channels}",
                channels.len()
            );
        }
        skip_to(stream, end, "blending ranges")?;

        Ok(Some(BlendingRanges {
            composite_gray_blend,
            channels
        }))
    }
}

impl EncodeBlock for Option<BlendingRanges> {
    type Scope = ();

    fn length(&self, version: PsdVersion, scope: ()) -> u64 {
        self.as_ref().map_or(0, |ranges| ranges.length(version, scope))
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        4 + self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, scope: ()
    ) -> Result<(), LayerEncodeErrors> {
        match self {
            Some(ranges) => ranges.write(stream, version, scope),
            None => {
                stream.write_u32_be_err(0)?;
                Ok(())
            }
        }
    }
}
