/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use alloc::vec::Vec;

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};

use crate::constants::Compression;
use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::stream::read_vec;
use crate::traits::{DecodeBlock, EncodeBlock};
use crate::version::PsdVersion;

/// Pixel data of a single layer channel.
///
/// The pixels are kept exactly as stored, i.e still compressed
/// with `compression`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct ChannelImageData {
    pub compression: Compression,
    pub data:        Vec<u8>
}

impl ChannelImageData {
    pub fn new(compression: Compression, data: Vec<u8>) -> ChannelImageData {
        ChannelImageData { compression, data }
    }
}

impl DecodeBlock for ChannelImageData {
    /// Payload size, the declared channel length minus
    /// the two byte compression tag
    type Hint = u64;

    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, _: PsdVersion, size: u64
    ) -> Result<Self, LayerDecodeErrors> {
        let method = stream.get_u16_be_err()?;
        let compression =
            Compression::from_int(method).ok_or(LayerDecodeErrors::UnknownCompression(method))?;

        Ok(ChannelImageData {
            compression,
            data: read_vec(stream, size)?
        })
    }
}

impl EncodeBlock for ChannelImageData {
    type Scope = ();

    fn length(&self, _: PsdVersion, _: ()) -> u64 {
        self.data.len() as u64
    }

    fn total_length(&self, version: PsdVersion, scope: ()) -> u64 {
        2 + self.length(version, scope)
    }

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, _: PsdVersion, _: ()
    ) -> Result<(), LayerEncodeErrors> {
        stream.write_u16_be_err(self.compression.to_int())?;
        stream.write_all(&self.data)?;
        Ok(())
    }
}
