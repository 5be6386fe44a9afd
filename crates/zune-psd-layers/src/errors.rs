/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Errors possible when reading and writing the layer and mask section
use core::fmt::{Debug, Display, Formatter};

use zune_core::bytestream::ZByteIoError;

/// Errors that can occur when decoding the layer and mask section
pub enum LayerDecodeErrors {
    /// The blend mode signature of a layer record was not `8BIM`
    ///
    /// The argument is the signature found
    WrongBlendSignature([u8; 4]),
    /// An additional layer information block started with something
    /// other than `8BIM` or `8B64`
    UnknownSignature([u8; 4]),
    /// A channel declared a compression method we do not know
    UnknownCompression(u16),
    /// A channel declared less bytes than needed for its
    /// compression tag
    ChannelLengthTooShort(u64),
    /// A block consumed bytes past the end its parent declared
    BlockOverrun {
        /// Name of the block whose end was passed
        block:    &'static str,
        /// Absolute offset the block should have ended at
        end:      u64,
        /// Absolute offset the reader actually reached
        position: u64
    },
    /// A length cannot be represented on this platform
    TooLarge(u64),
    /// Generic message
    Generic(&'static str),
    /// Errors from the underlying stream, a truncated stream ends up here
    IoErrors(ZByteIoError)
}

impl Debug for LayerDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            LayerDecodeErrors::WrongBlendSignature(found) => {
                writeln!(
                    f,
                    "Invalid blend mode signature, expected `8BIM` but found {:?}",
                    found
                )
            }
            LayerDecodeErrors::UnknownSignature(found) => {
                writeln!(
                    f,
                    "Unknown additional layer information signature {:?}, expected `8BIM` or `8B64`",
                    found
                )
            }
            LayerDecodeErrors::UnknownCompression(method) => {
                writeln!(f, "Unknown channel compression method {method}")
            }
            LayerDecodeErrors::ChannelLengthTooShort(length) => {
                writeln!(
                    f,
                    "Channel data length {length} is too short to hold a compression tag"
                )
            }
            LayerDecodeErrors::BlockOverrun {
                block,
                end,
                position
            } => {
                writeln!(
                    f,
                    "Reading {block} went past its end, block ends at {end} but reader is at {position}"
                )
            }
            LayerDecodeErrors::TooLarge(length) => {
                writeln!(f, "Length {length} is too large for this platform")
            }
            LayerDecodeErrors::Generic(reason) => {
                writeln!(f, "{reason}")
            }
            LayerDecodeErrors::IoErrors(e) => {
                writeln!(f, "I/O error :{:?}", e)
            }
        }
    }
}

impl Display for LayerDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LayerDecodeErrors {}

impl From<&'static str> for LayerDecodeErrors {
    fn from(r: &'static str) -> Self {
        Self::Generic(r)
    }
}

impl From<ZByteIoError> for LayerDecodeErrors {
    fn from(r: ZByteIoError) -> Self {
        Self::IoErrors(r)
    }
}

/// Errors that can occur when encoding the layer and mask section
///
/// All of the validation errors are raised before
/// the offending block writes anything
pub enum LayerEncodeErrors {
    /// A layer record has a different number of channel ids
    /// and channel data entries
    ChannelCountMismatch {
        /// Number of channel ids
        ids:  usize,
        /// Number of channel data entries
        data: usize
    },
    /// Layer names are stored as pascal strings and can hold at most 255 bytes
    NameTooLong(usize),
    /// Global layer mask opacity has to be between 0 and 100
    InvalidOpacity(u16),
    /// A length does not fit the length field the format provides for it
    LengthOverflow(u64),
    /// Generic message
    Generic(&'static str),
    /// Errors from the underlying sink
    IoErrors(ZByteIoError)
}

impl Debug for LayerEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            LayerEncodeErrors::ChannelCountMismatch { ids, data } => {
                writeln!(
                    f,
                    "Mismatched number of channel ids ({ids}) and channel data ({data})"
                )
            }
            LayerEncodeErrors::NameTooLong(length) => {
                writeln!(
                    f,
                    "Layer name is {length} bytes long, at most 255 bytes can be stored"
                )
            }
            LayerEncodeErrors::InvalidOpacity(opacity) => {
                writeln!(
                    f,
                    "Invalid global layer mask opacity {opacity}, expected a value between 0 and 100"
                )
            }
            LayerEncodeErrors::LengthOverflow(length) => {
                writeln!(f, "Length {length} does not fit in its length field")
            }
            LayerEncodeErrors::Generic(reason) => {
                writeln!(f, "{reason}")
            }
            LayerEncodeErrors::IoErrors(e) => {
                writeln!(f, "I/O error {:?}", e)
            }
        }
    }
}

impl Display for LayerEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LayerEncodeErrors {}

impl From<&'static str> for LayerEncodeErrors {
    fn from(r: &'static str) -> Self {
        Self::Generic(r)
    }
}

impl From<ZByteIoError> for LayerEncodeErrors {
    fn from(r: ZByteIoError) -> Self {
        Self::IoErrors(r)
    }
}
