/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Layer records
//!
//! A record describes one layer: its bounds, channels, blending and
//! extra data. The channel pixels of all layers are stored after all
//! records, so decoding is split in two stages, [`LayerRecordHeader::read`]
//! for the record itself and [`LayerRecordHeader::read_channel_data`] once
//! the stream reaches the pixel data.
use alloc::string::String;
use alloc::vec::Vec;

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};
use zune_core::log::trace;

use crate::additional::{AdditionalLayerInfo, BlockPadding, SectionDivider};
use crate::blending::BlendingRanges;
use crate::channel::ChannelImageData;
use crate::constants::{BlendMode, SIGNATURE_8BIM};
use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::mask::LayerMask;
use crate::rect::Rect;
use crate::stream::{
    block_end, check_length, pascal_string_length, position, read_bool, read_i16, read_key,
    read_length, read_pascal_string, skip_bytes, skip_to, write_i16, write_length,
    write_pascal_string
};
use crate::traits::{DecodeBlock, EncodeBlock};
use crate::version::PsdVersion;

/// Layer names are padded to a multiple of four bytes
const NAME_ALIGNMENT: u64 = 4;
/// Longest name a pascal string can hold
pub const MAX_NAME_LENGTH: usize = 255;

/// Layer flags as stored in the record
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct LayerFlags(pub u8);

impl LayerFlags {
    pub const TRANSPARENCY_PROTECTED: u8 = 1 << 0;
    pub const HIDDEN: u8 = 1 << 1;
    pub const OBSOLETE: u8 = 1 << 2;
    /// Set by Photoshop 5.0 and later, tells whether bit 4 carries information
    pub const BIT_4_USEFUL: u8 = 1 << 3;
    /// Pixel data is irrelevant to the appearance of the document
    pub const PIXEL_DATA_IRRELEVANT: u8 = 1 << 4;

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub fn set(&mut self, flag: u8, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    pub const fn is_visible(self) -> bool {
        !self.contains(Self::HIDDEN)
    }
}

/// A single layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    pub rect:            Rect,
    /// Channel ids, index aligned with `channel_data`
    pub channel_ids:     Vec<i16>,
    /// Raw blend mode key, see [`BlendMode`] for the known ones
    pub blend_mode_key:  [u8; 4],
    pub opacity:         u8,
    pub clipping:        bool,
    pub flags:           LayerFlags,
    pub mask:            Option<LayerMask>,
    pub blending_ranges: Option<BlendingRanges>,
    /// Legacy layer name, at most 255 bytes.
    ///
    /// The full name lives in the `luni` extra block
    pub name:            Vec<u8>,
    pub additional_info: Vec<AdditionalLayerInfo>,
    pub channel_data:    Vec<ChannelImageData>
}

impl Default for LayerRecord {
    fn default() -> Self {
        LayerRecord {
            rect:            Rect::default(),
            channel_ids:     Vec::new(),
            blend_mode_key:  BlendMode::Normal.to_key(),
            opacity:         255,
            clipping:        false,
            flags:           LayerFlags::default(),
            mask:            None,
            blending_ranges: None,
            name:            Vec::new(),
            additional_info: Vec::new(),
            channel_data:    Vec::new()
        }
    }
}

impl LayerRecord {
    /// Create an empty, fully opaque layer with the normal blend mode
    pub fn new(rect: Rect) -> LayerRecord {
        LayerRecord {
            rect,
            ..LayerRecord::default()
        }
    }

    /// Add a channel, keeping ids and data aligned
    pub fn push_channel(&mut self, id: i16, data: ChannelImageData) {
        self.channel_ids.push(id);
        self.channel_data.push(data);
    }

    pub fn blend_mode(&self) -> Option<BlendMode> {
        BlendMode::from_key(self.blend_mode_key)
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode_key = mode.to_key();
    }

    pub fn is_visible(&self) -> bool {
        self.flags.is_visible()
    }

    /// Set the legacy name, failing if it cannot be stored
    pub fn set_name(&mut self, name: &[u8]) -> Result<(), LayerEncodeErrors> {
        if name.len() > MAX_NAME_LENGTH {
            return Err(LayerEncodeErrors::NameTooLong(name.len()));
        }
        self.name = name.to_vec();
        Ok(())
    }

    /// Unicode name from the `luni` block, falling back to
    /// the legacy name
    pub fn unicode_name(&self) -> String {
        self.additional_info
            .iter()
            .find_map(AdditionalLayerInfo::as_unicode_name)
            .unwrap_or_else(|| String::from_utf8_lossy(&self.name).into_owned())
    }

    pub fn section_divider(&self) -> Option<SectionDivider> {
        self.additional_info
            .iter()
            .find_map(AdditionalLayerInfo::as_section_divider)
    }

    pub fn fill_opacity(&self) -> Option<u8> {
        self.additional_info
            .iter()
            .find_map(AdditionalLayerInfo::as_fill_opacity)
    }

    pub fn layer_id(&self) -> Option<u32> {
        self.additional_info
            .iter()
            .find_map(AdditionalLayerInfo::as_layer_id)
    }

    /// Check the record can be written, done before anything is emitted
    pub(crate) fn validate(&self, version: PsdVersion) -> Result<(), LayerEncodeErrors> {
        if self.channel_ids.len() != self.channel_data.len() {
            return Err(LayerEncodeErrors::ChannelCountMismatch {
                ids:  self.channel_ids.len(),
                data: self.channel_data.len()
            });
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(LayerEncodeErrors::NameTooLong(self.name.len()));
        }
        if self.channel_ids.len() > usize::from(u16::MAX) {
            return Err(LayerEncodeErrors::Generic("Too many channels in layer"));
        }
        for channel in &self.channel_data {
            check_length(channel.total_length(version, ()), version.is_large())?;
        }
        for info in &self.additional_info {
            info.validate(version)?;
        }
        // the extra data length field is 4 bytes in both versions
        check_length(self.extra_length(version), false)
    }

    /// Size of the extra data: mask, blending ranges, name and additional info
    fn extra_length(&self, version: PsdVersion) -> u64 {
        self.mask.total_length(version, ())
            + self.blending_ranges.total_length(version, ())
            + pascal_string_length(self.name.len(), NAME_ALIGNMENT)
            + self
                .additional_info
                .iter()
                .map(|info| info.total_length(version, BlockPadding::Layer))
                .sum::<u64>()
    }

    /// Number of bytes the channel data of this layer takes
    pub fn channel_data_length(&self, version: PsdVersion) -> u64 {
        self.channel_data
            .iter()
            .map(|channel| channel.total_length(version, ()))
            .sum()
    }

    /// Write the pixel data of every channel, in channel order
    pub fn write_channel_data<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion
    ) -> Result<(), LayerEncodeErrors> {
        for channel in &self.channel_data {
            channel.write(stream, version, ())?;
        }
        Ok(())
    }
}

/// Record part of a layer, everything but the channel pixels.
pub struct LayerRecordHeader {
    record:          LayerRecord,
    /// Declared size of each channel's data, including the compression tag
    channel_lengths: Vec<u64>
}

impl LayerRecordHeader {
    /// The decoded record, without channel data
    pub fn record(&self) -> &LayerRecord {
        &self.record
    }

    pub fn channel_lengths(&self) -> &[u64] {
        &self.channel_lengths
    }

    /// Sum of the declared channel lengths
    pub fn channel_data_length(&self) -> u64 {
        self.channel_lengths.iter().sum()
    }

    /// Decode a layer record, leaving the stream at the next record
    pub fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, version: PsdVersion
    ) -> Result<LayerRecordHeader, LayerDecodeErrors> {
        let rect = Rect::read(stream)?;

        let num_channels = usize::from(stream.get_u16_be_err()?);
        let mut channel_ids = Vec::with_capacity(num_channels);
        let mut channel_lengths = Vec::with_capacity(num_channels);

        for _ in 0..num_channels {
            channel_ids.push(read_i16(stream)?);
            channel_lengths.push(read_length(stream, version.is_large())?);
        }

        let signature = read_key(stream)?;

        if signature != SIGNATURE_8BIM {
            return Err(LayerDecodeErrors::WrongBlendSignature(signature));
        }

        let blend_mode_key = read_key(stream)?;
        let opacity = stream.read_u8_err()?;
        let clipping = read_bool(stream)?;
        let flags = LayerFlags(stream.read_u8_err()?);
        // filler
        skip_bytes(stream, 1)?;

        let extra_length = u64::from(stream.get_u32_be_err()?);
        let end = block_end(stream, extra_length)?;

        let mask = Option::<LayerMask>::read(stream, version, ())?;
        let blending_ranges = Option::<BlendingRanges>::read(stream, version, num_channels)?;
        let name = read_pascal_string(stream, NAME_ALIGNMENT)?;

        let mut additional_info = Vec::new();

        while position(stream)? < end {
            additional_info.push(AdditionalLayerInfo::read(
                stream,
                version,
                BlockPadding::Layer
            )?);
        }
        skip_to(stream, end, "layer record")?;

        trace!(
            "Layer record {:?}: {num_channels} channels, {} extra blocks",
            String::from_utf8_lossy(&name),
            additional_info.len()
        );

        Ok(LayerRecordHeader {
            record: LayerRecord {
                rect,
                channel_ids,
                blend_mode_key,
                opacity,
                clipping,
                flags,
                mask,
                blending_ranges,
                name,
                additional_info,
                channel_data: Vec::new()
            },
            channel_lengths
        })
    }

    /// Read the channel pixels this record declared and
    /// return the finished record
    pub fn read_channel_data<T: ZByteReaderTrait>(
        self, stream: &mut ZReader<T>, version: PsdVersion
    ) -> Result<LayerRecord, LayerDecodeErrors> {
        let LayerRecordHeader {
            mut record,
            channel_lengths
        } = self;

        let mut channel_data = Vec::with_capacity(channel_lengths.len());

        for length in channel_lengths {
            // the compression tag is part of the declared length
            let size = length
                .checked_sub(2)
                .ok_or(LayerDecodeErrors::ChannelLengthTooShort(length))?;

            channel_data.push(ChannelImageData::read(stream, version, size)?);
        }
        record.channel_data = channel_data;

        Ok(record)
    }
}

impl EncodeBlock for LayerRecord {
    type Scope = ();

    /// Size of the record, channel data is stored elsewhere
    /// and is not part of it
    fn length(&self, version: PsdVersion, _: ()) -> u64 {
        let channel_entry = 2 + version.length_field_size();

        Rect::SIZE
            + 2
            + channel_entry * self.channel_ids.len() as u64
            // signature, blend key, opacity, clipping, flags, filler
            + 4 + 4 + 1 + 1 + 1 + 1
            + 4
            + self.extra_length(version)
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, _: ()
    ) -> Result<(), LayerEncodeErrors> {
        self.validate(version)?;

        self.rect.write(stream)?;
        // validated above, fits
        stream.write_u16_be_err(self.channel_ids.len() as u16)?;

        for (id, channel) in self.channel_ids.iter().zip(self.channel_data.iter()) {
            write_i16(stream, *id)?;
            write_length(stream, channel.total_length(version, ()), version.is_large())?;
        }

        stream.write_const_bytes(&SIGNATURE_8BIM)?;
        stream.write_const_bytes(&self.blend_mode_key)?;
        stream.write_u8_err(self.opacity)?;
        stream.write_u8_err(u8::from(self.clipping))?;
        stream.write_u8_err(self.flags.bits())?;
        // filler
        stream.write_u8_err(0)?;

        write_length(stream, self.extra_length(version), false)?;

        self.mask.write(stream, version, ())?;
        self.blending_ranges.write(stream, version, ())?;
        write_pascal_string(stream, &self.name, NAME_ALIGNMENT)?;

        for info in &self.additional_info {
            info.write(stream, version, BlockPadding::Layer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use zune_core::bytestream::{ZCursor, ZReader, ZWriter};

    use crate::additional::AdditionalLayerInfo;
    use crate::blending::BlendingRanges;
    use crate::channel::ChannelImageData;
    use crate::constants::{BlendMode, Compression, CHANNEL_TRANSPARENCY};
    use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
    use crate::mask::{LayerMask, MaskExtension, MaskParameters};
    use crate::rect::Rect;
    use crate::record::{LayerFlags, LayerRecord, LayerRecordHeader};
    use crate::traits::EncodeBlock;
    use crate::version::PsdVersion;

    fn sample_layer() -> LayerRecord {
        let mut layer = LayerRecord::new(Rect::new(0, 0, 2, 3));
        layer.set_name(b"Background").unwrap();
        layer.set_blend_mode(BlendMode::Multiply);
        layer.opacity = 200;
        layer.clipping = true;
        layer.flags.set(LayerFlags::HIDDEN, true);
        layer.mask = Some(LayerMask {
            rect: Rect::new(0, 0, 2, 3),
            extension: Some(MaskExtension {
                parameters: MaskParameters {
                    user_mask_density: Some(100),
                    ..MaskParameters::default()
                },
                ..MaskExtension::default()
            }),
            ..LayerMask::default()
        });
        layer.blending_ranges = Some(BlendingRanges::with_channels(2));
        layer
            .additional_info
            .push(AdditionalLayerInfo::unicode_name("Background"));
        layer.push_channel(0, ChannelImageData::new(Compression::Raw, vec![1; 6]));
        layer.push_channel(
            CHANNEL_TRANSPARENCY,
            ChannelImageData::new(Compression::RLE, vec![2; 5])
        );
        layer
    }

    fn encode(layer: &LayerRecord, version: PsdVersion) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = ZWriter::new(&mut out);
        layer.write(&mut writer, version, ()).unwrap();
        assert_eq!(
            writer.bytes_written() as u64,
            layer.total_length(version, ())
        );
        layer.write_channel_data(&mut writer, version).unwrap();
        assert_eq!(
            writer.bytes_written() as u64,
            layer.total_length(version, ()) + layer.channel_data_length(version)
        );
        out
    }

    #[test]
    fn record_round_trips_in_both_versions() {
        let layer = sample_layer();

        for version in [PsdVersion::Psd, PsdVersion::Psb] {
            let bytes = encode(&layer, version);

            let mut reader = ZReader::new(ZCursor::new(&bytes));
            let header = LayerRecordHeader::read(&mut reader, version).unwrap();

            assert_eq!(
                reader.position().unwrap(),
                layer.total_length(version, ())
            );
            assert_eq!(header.channel_lengths(), &[8, 7]);
            assert!(header.record().channel_data.is_empty());

            let decoded = header.read_channel_data(&mut reader, version).unwrap();
            assert_eq!(decoded, layer);
            assert_eq!(reader.position().unwrap(), bytes.len() as u64);

            assert_eq!(decoded.blend_mode(), Some(BlendMode::Multiply));
            assert!(!decoded.is_visible());
            assert_eq!(decoded.unicode_name(), "Background");
        }
    }

    #[test]
    fn channel_lengths_widen_for_psb() {
        let layer = sample_layer();
        let psd = layer.total_length(PsdVersion::Psd, ());
        let psb = layer.total_length(PsdVersion::Psb, ());
        // two channels, four extra bytes each
        assert_eq!(psb - psd, 8);
    }

    #[test]
    fn mismatched_channels_write_nothing() {
        let mut layer = LayerRecord::new(Rect::default());
        layer.channel_ids = vec![0, 1, 2];
        layer.channel_data = vec![ChannelImageData::default(); 2];

        let mut out = Vec::new();
        let mut writer = ZWriter::new(&mut out);
        let err = layer.write(&mut writer, PsdVersion::Psd, ()).unwrap_err();

        assert!(matches!(
            err,
            LayerEncodeErrors::ChannelCountMismatch { ids: 3, data: 2 }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn long_names_are_rejected() {
        let mut layer = LayerRecord::default();
        assert!(layer.set_name(&[b'a'; 256]).is_err());

        layer.name = vec![b'a'; 300];
        let mut out = Vec::new();
        let mut writer = ZWriter::new(&mut out);
        let err = layer.write(&mut writer, PsdVersion::Psd, ()).unwrap_err();
        assert!(matches!(err, LayerEncodeErrors::NameTooLong(300)));
        assert!(out.is_empty());
    }

    #[test]
    fn bad_blend_signature_is_fatal() {
        let mut bytes = encode(&LayerRecord::default(), PsdVersion::Psd);
        // rectangle + channel count, no channels
        bytes[18..22].copy_from_slice(b"8BPS");

        let mut reader = ZReader::new(ZCursor::new(&bytes));
        let err = LayerRecordHeader::read(&mut reader, PsdVersion::Psd)
            .err()
            .unwrap();
        assert!(matches!(err, LayerDecodeErrors::WrongBlendSignature(sig) if &sig == b"8BPS"));
    }

    #[test]
    fn short_channel_length_is_rejected() {
        let mut layer = LayerRecord::default();
        layer.push_channel(0, ChannelImageData::default());
        let mut bytes = encode(&layer, PsdVersion::Psd);
        // the channel length follows the rectangle, count and id
        bytes[20..24].copy_from_slice(&1_u32.to_be_bytes());

        let mut reader = ZReader::new(ZCursor::new(&bytes));
        let header = LayerRecordHeader::read(&mut reader, PsdVersion::Psd).unwrap();
        let err = header
            .read_channel_data(&mut reader, PsdVersion::Psd)
            .unwrap_err();
        assert!(matches!(err, LayerDecodeErrors::ChannelLengthTooShort(1)));
    }

    #[test]
    fn truncated_name_padding_is_an_error() {
        let bytes = encode(&LayerRecord::default(), PsdVersion::Psd);
        // the record ends with an empty name, a length byte and three zeros
        let mut reader = ZReader::new(ZCursor::new(&bytes[..bytes.len() - 2]));
        let err = LayerRecordHeader::read(&mut reader, PsdVersion::Psd)
            .err()
            .unwrap();
        assert!(matches!(err, LayerDecodeErrors::IoErrors(_)));
    }

    #[test]
    fn lengths_are_validated_for_each_version() {
        let layer = sample_layer();
        assert!(layer.validate(PsdVersion::Psd).is_ok());
        assert!(layer.validate(PsdVersion::Psb).is_ok());

        let mut broken = sample_layer();
        broken.channel_data.pop();
        assert!(matches!(
            broken.validate(PsdVersion::Psb),
            Err(LayerEncodeErrors::ChannelCountMismatch { ids: 2, data: 1 })
        ));
    }
}
