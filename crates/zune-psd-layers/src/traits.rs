/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! Traits shared by every block of the layer and mask section
//!
//! Each block knows how to read itself, how many bytes it will
//! take and how to write itself. The sizes have to be known before
//! writing since lengths precede the payload they describe, so
//! [`total_length`](EncodeBlock::total_length) must always agree with
//! what [`write`](EncodeBlock::write) emits.

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};

use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::version::PsdVersion;

/// A block that can be decoded from a stream
pub trait DecodeBlock: Sized {
    /// Information the parent has to hand down for the block
    /// to be decoded, e.g the payload size of channel data
    type Hint: Copy;

    /// Decode the block starting at the current stream position
    fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>, version: PsdVersion, hint: Self::Hint
    ) -> Result<Self, LayerDecodeErrors>;
}

/// A block that can be encoded to a sink
pub trait EncodeBlock {
    /// Where the block lives, for blocks whose layout depends on it
    type Scope: Copy;

    /// Size of the payload, excluding the block's own length field
    fn length(&self, version: PsdVersion, scope: Self::Scope) -> u64;

    /// Number of bytes [`write`](Self::write) emits
    fn total_length(&self, version: PsdVersion, scope: Self::Scope) -> u64;

    fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>, version: PsdVersion, scope: Self::Scope
    ) -> Result<(), LayerEncodeErrors>;
}
