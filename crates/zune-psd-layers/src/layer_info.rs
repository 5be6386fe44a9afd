/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Layer info, the list of layers of a document
//!
//! Layers are not stored one after the other. The block holds every
//! layer record first and only then the channel data of every layer,
//! in the same order, so both reading and writing go over the layers twice.
use alloc::vec::Vec;

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};
use zune_core::log::trace;

use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::record::{LayerRecord, LayerRecordHeader};
use crate::stream::{
    block_end, check_length, read_i16, read_length, round_up, skip_to, write_i16, write_length
};
use crate::traits::{DecodeBlock, EncodeBlock};
use crate::version::PsdVersion;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerInfo {
    /// Layers, bottom most first
    pub layers:            Vec<LayerRecord>,
    /// Whether the first alpha channel holds the transparency of the
    /// merged result, stored as a negative layer count
    pub use_alpha_channel: bool
}

impl LayerInfo {
    pub fn new(layers: Vec<LayerRecord>, use_alpha_channel: bool) -> LayerInfo {
        LayerInfo {
            layers,
            use_alpha_channel
        }
    }

    /// Size of the layer count, records and channel data, before
    /// rounding to an even size
    fn natural_length(&self, version: PsdVersion) -> u64 {
        2 + self
            .layers
            .iter()
            .map(|layer| layer.total_length(version, ()) + layer.channel_data_length(version))
            .sum::<u64>()
    }

    /// Check every layer can be written, done before anything is emitted
    pub(crate) fn validate(&self, version: PsdVersion) -> Result<(), LayerEncodeErrors> {
        self.layer_count()?;

        for layer in &self.layers {
            layer.validate(version)?;
        }
        check_length(self.length(version, ()), version.is_large())
    }

    fn layer_count(&self) -> Result<i16, LayerEncodeErrors> {
        let count = i16::try_from(self.layers.len())
            .map_err(|_| LayerEncodeErrors::Generic("Too many layers, at most 32767 can be stored"))?;

        Ok(if self.use_alpha_channel { -count } else { count })
    }
}

impl DecodeBlock for LayerInfo {
    type Hint = ();

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, version: PsdVersion, _: ()
    ) -> Result<Self, LayerDecodeErrors> {
        let length = read_length(stream, version.is_large())?;

        if length == 0 {
            return Ok(LayerInfo::default());
        }
        let end = block_end(stream, length)?;

        let count = read_i16(stream)?;
        let use_alpha_channel = count < 0;
        let num_layers = usize::from(count.unsigned_abs());

        trace!("Layer info: {length} bytes, {num_layers} layers");
        trace!("Use alpha channel: {use_alpha_channel}");

        let mut headers = Vec::with_capacity(num_layers);

        for _ in 0..num_layers {
            headers.push(LayerRecordHeader::read(stream, version)?);
        }

        let mut layers = Vec::with_capacity(num_layers);

        for header in headers {
            layers.push(header.read_channel_data(stream, version)?);
        }

        skip_to(stream, end, "layer info")?;

        Ok(LayerInfo {
            layers,
            use_alpha_channel
        })
    }
}

impl EncodeBlock for LayerInfo {
    type Scope = ();

    /// Declared length, rounded up to an even number of bytes.
    ///
    /// An empty layer list is stored as a zero length block
    fn length(&self, version: PsdVersion, _: ()) -> u64 {
        if self.layers.is_empty() {
            return 0;
        }
        round_up(self.natural_length(version), 2)
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        version.length_field_size() + self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, scope: ()
    ) -> Result<(), LayerEncodeErrors> {
        if self.layers.is_empty() {
            return write_length(stream, 0, version.is_large());
        }
        // fail before the length goes out
        self.validate(version)?;
        let count = self.layer_count()?;

        let length = self.length(version, scope);
        write_length(stream, length, version.is_large())?;
        write_i16(stream, count)?;

        for layer in &self.layers {
            layer.write(stream, version, ())?;
        }
        for layer in &self.layers {
            layer.write_channel_data(stream, version)?;
        }

        if length != self.natural_length(version) {
            stream.write_u8_err(0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use zune_core::bytestream::{ZCursor, ZReader, ZWriter};

    use crate::channel::ChannelImageData;
    use crate::constants::Compression;
    use crate::errors::LayerEncodeErrors;
    use crate::layer_info::LayerInfo;
    use crate::rect::Rect;
    use crate::record::{LayerRecord, LayerRecordHeader};
    use crate::stream::read_i16;
    use crate::traits::{DecodeBlock, EncodeBlock};
    use crate::version::PsdVersion;

    fn layer(fill: u8, sizes: &[usize]) -> LayerRecord {
        let mut layer = LayerRecord::new(Rect::new(0, 0, 1, 1));
        for (id, size) in sizes.iter().enumerate() {
            layer.push_channel(
                id as i16,
                ChannelImageData::new(Compression::Raw, vec![fill; *size])
            );
        }
        layer
    }

    fn encode(info: &LayerInfo, version: PsdVersion) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = ZWriter::new(&mut out);
        info.write(&mut writer, version, ()).unwrap();
        assert_eq!(
            writer.bytes_written() as u64,
            info.total_length(version, ())
        );
        out
    }

    #[test]
    fn empty_layer_info_is_only_a_length() {
        let info = LayerInfo::default();
        assert_eq!(encode(&info, PsdVersion::Psd), [0, 0, 0, 0]);
        assert_eq!(encode(&info, PsdVersion::Psb), [0; 8]);

        let bytes = [0_u8; 4];
        let mut reader = ZReader::new(ZCursor::new(&bytes));
        let decoded = LayerInfo::read(&mut reader, PsdVersion::Psd, ()).unwrap();
        assert_eq!(decoded, info);
        assert_eq!(reader.position().unwrap(), 4);
    }

    #[test]
    fn alpha_channel_is_a_negative_count() {
        let info = LayerInfo::new(vec![layer(1, &[2]), layer(2, &[2]), layer(3, &[2])], true);
        let bytes = encode(&info, PsdVersion::Psd);

        let mut reader = ZReader::new(ZCursor::new(&bytes[4..]));
        assert_eq!(read_i16(&mut reader).unwrap(), -3);

        let mut reader = ZReader::new(ZCursor::new(&bytes));
        let decoded = LayerInfo::read(&mut reader, PsdVersion::Psd, ()).unwrap();
        assert!(decoded.use_alpha_channel);
        assert_eq!(decoded.layers.len(), 3);
        assert_eq!(decoded, info);
    }

    #[test]
    fn odd_sizes_are_padded_to_even() {
        let info = LayerInfo::new(vec![layer(7, &[3])], false);

        for version in [PsdVersion::Psd, PsdVersion::Psb] {
            let bytes = encode(&info, version);
            let width = version.length_field_size() as usize;

            let declared = if version.is_large() {
                u64::from_be_bytes(bytes[..8].try_into().unwrap())
            } else {
                u64::from(u32::from_be_bytes(bytes[..4].try_into().unwrap()))
            };
            assert_eq!(declared % 2, 0);
            assert_eq!(declared as usize, bytes.len() - width);
            assert_eq!(bytes.last(), Some(&0));

            let mut reader = ZReader::new(ZCursor::new(&bytes));
            let decoded = LayerInfo::read(&mut reader, version, ()).unwrap();
            assert_eq!(decoded, info);
            assert_eq!(reader.position().unwrap(), bytes.len() as u64);
        }
    }

    #[test]
    fn headers_come_before_channel_data() {
        let first = layer(0xAA, &[4, 6]);
        let second = layer(0xBB, &[8]);
        let info = LayerInfo::new(vec![first.clone(), second.clone()], false);
        let bytes = encode(&info, PsdVersion::Psd);

        // walk the block by hand: count, both headers, then the pixels
        let mut reader = ZReader::new(ZCursor::new(&bytes[4..]));
        assert_eq!(read_i16(&mut reader).unwrap(), 2);

        let a = LayerRecordHeader::read(&mut reader, PsdVersion::Psd).unwrap();
        let b = LayerRecordHeader::read(&mut reader, PsdVersion::Psd).unwrap();

        let headers_end = 2 + first.total_length(PsdVersion::Psd, ())
            + second.total_length(PsdVersion::Psd, ());
        assert_eq!(reader.position().unwrap(), headers_end);

        assert_eq!(a.channel_data_length(), (2 + 4) + (2 + 6));
        assert_eq!(b.channel_data_length(), 2 + 8);

        let start = headers_end as usize + 4;
        // compression tag then the first layer's bytes
        assert_eq!(&bytes[start + 2..start + 6], &[0xAA; 4]);

        let decoded_a = a.read_channel_data(&mut reader, PsdVersion::Psd).unwrap();
        assert_eq!(reader.position().unwrap(), headers_end + 14);
        let decoded_b = b.read_channel_data(&mut reader, PsdVersion::Psd).unwrap();
        assert_eq!(reader.position().unwrap(), headers_end + 24);

        assert_eq!(decoded_a, first);
        assert_eq!(decoded_b, second);
    }

    #[test]
    fn invalid_layer_fails_before_writing() {
        let mut broken = layer(1, &[1]);
        broken.channel_ids.push(3);
        let info = LayerInfo::new(vec![layer(0, &[2]), broken], false);

        let mut out = Vec::new();
        let mut writer = ZWriter::new(&mut out);
        let err = info.write(&mut writer, PsdVersion::Psd, ()).unwrap_err();

        assert!(matches!(
            err,
            LayerEncodeErrors::ChannelCountMismatch { ids: 2, data: 1 }
        ));
        assert!(out.is_empty());
    }
}
