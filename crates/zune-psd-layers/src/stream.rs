/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Small big endian helpers on top of the zune bytestreams
//!
//! Everything in the layer section is big endian, the readers
//! here only add the signed and floating point variants plus the
//! length prefixed pieces the section is made of.
use alloc::vec::Vec;

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};
use zune_core::log::trace;

use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};

/// Largest chunk we allocate up front when reading opaque payloads,
/// larger payloads grow as bytes actually arrive
const READ_CHUNK: usize = 1 << 16;

/// Round `value` up to the next multiple of `multiple`
pub const fn round_up(value: u64, multiple: u64) -> u64 {
    if multiple <= 1 {
        return value;
    }
    match value % multiple {
        0 => value,
        rem => value + (multiple - rem)
    }
}

pub fn read_i16<T: ZByteReaderTrait>(stream: &mut ZReader<T>) -> Result<i16, LayerDecodeErrors> {
    Ok(stream.get_u16_be_err()? as i16)
}

pub fn read_i32<T: ZByteReaderTrait>(stream: &mut ZReader<T>) -> Result<i32, LayerDecodeErrors> {
    Ok(stream.get_u32_be_err()? as i32)
}

pub fn read_f64<T: ZByteReaderTrait>(stream: &mut ZReader<T>) -> Result<f64, LayerDecodeErrors> {
    Ok(f64::from_bits(stream.get_u64_be_err()?))
}

pub fn read_bool<T: ZByteReaderTrait>(stream: &mut ZReader<T>) -> Result<bool, LayerDecodeErrors> {
    Ok(stream.read_u8_err()? != 0)
}

pub fn read_key<T: ZByteReaderTrait>(
    stream: &mut ZReader<T>
) -> Result<[u8; 4], LayerDecodeErrors> {
    Ok(stream.read_fixed_bytes_or_error::<4>()?)
}

/// Read a length field that is 8 bytes wide when `wide` is set
/// and 4 bytes otherwise
pub fn read_length<T: ZByteReaderTrait>(
    stream: &mut ZReader<T>, wide: bool
) -> Result<u64, LayerDecodeErrors> {
    if wide {
        Ok(stream.get_u64_be_err()?)
    } else {
        Ok(u64::from(stream.get_u32_be_err()?))
    }
}

pub fn position<T: ZByteReaderTrait>(stream: &mut ZReader<T>) -> Result<u64, LayerDecodeErrors> {
    Ok(stream.position()?)
}

/// Absolute offset of the end of a block of `length` bytes starting now
pub fn block_end<T: ZByteReaderTrait>(
    stream: &mut ZReader<T>, length: u64
) -> Result<u64, LayerDecodeErrors> {
    position(stream)?
        .checked_add(length)
        .ok_or(LayerDecodeErrors::TooLarge(length))
}

/// Move forward to `end`, discarding whatever the block had left.
///
/// The stream never moves backwards, a reader that already went past
/// `end` means the block lied about its size.
pub fn skip_to<T: ZByteReaderTrait>(
    stream: &mut ZReader<T>, end: u64, block: &'static str
) -> Result<(), LayerDecodeErrors> {
    let current = position(stream)?;

    if current > end {
        return Err(LayerDecodeErrors::BlockOverrun {
            block,
            end,
            position: current
        });
    }
    if current < end {
        let remaining = end - current;
        trace!("{block}: skipping {remaining} unread bytes");
        skip_bytes(stream, remaining)?;
    }
    Ok(())
}

/// Discard `count` bytes, failing when the stream holds fewer.
///
/// `ZReader::skip` moves past the end of a cursor without complaint,
/// so the bytes are read and dropped instead.
pub fn skip_bytes<T: ZByteReaderTrait>(
    stream: &mut ZReader<T>, count: u64
) -> Result<(), LayerDecodeErrors> {
    let mut chunk = [0_u8; 512];
    let mut left = count;

    while left > 0 {
        let size = left.min(chunk.len() as u64) as usize;
        stream.read_exact_bytes(&mut chunk[..size])?;
        left -= size as u64;
    }
    Ok(())
}

/// Read exactly `length` opaque bytes
pub fn read_vec<T: ZByteReaderTrait>(
    stream: &mut ZReader<T>, length: u64
) -> Result<Vec<u8>, LayerDecodeErrors> {
    let length = usize::try_from(length).map_err(|_| LayerDecodeErrors::TooLarge(length))?;

    let mut out = Vec::with_capacity(length.min(READ_CHUNK));
    let mut chunk = [0_u8; 512];
    let mut left = length;

    while left > 0 {
        let size = left.min(chunk.len());
        stream.read_exact_bytes(&mut chunk[..size])?;
        out.extend_from_slice(&chunk[..size]);
        left -= size;
    }
    Ok(out)
}

/// Size of a pascal string holding `length` bytes, padded to `alignment`
pub const fn pascal_string_length(length: usize, alignment: u64) -> u64 {
    round_up(1 + length as u64, alignment)
}

/// Read a length prefixed string, discarding the padding that
/// brings it to `alignment`
pub fn read_pascal_string<T: ZByteReaderTrait>(
    stream: &mut ZReader<T>, alignment: u64
) -> Result<Vec<u8>, LayerDecodeErrors> {
    let length = stream.read_u8_err()?;
    let string = read_vec(stream, u64::from(length))?;

    let padding = pascal_string_length(usize::from(length), alignment) - 1 - u64::from(length);
    skip_bytes(stream, padding)?;

    Ok(string)
}

pub fn write_pascal_string<T: ZByteWriterTrait>(
    stream: &mut ZWriter<T>, string: &[u8], alignment: u64
) -> Result<(), LayerEncodeErrors> {
    let length =
        u8::try_from(string.len()).map_err(|_| LayerEncodeErrors::NameTooLong(string.len()))?;

    stream.write_u8_err(length)?;
    stream.write_all(string)?;

    let padding = pascal_string_length(string.len(), alignment) - 1 - string.len() as u64;
    write_zeros(stream, padding)
}

pub fn write_i16<T: ZByteWriterTrait>(
    stream: &mut ZWriter<T>, value: i16
) -> Result<(), LayerEncodeErrors> {
    stream.write_u16_be_err(value as u16)?;
    Ok(())
}

pub fn write_i32<T: ZByteWriterTrait>(
    stream: &mut ZWriter<T>, value: i32
) -> Result<(), LayerEncodeErrors> {
    stream.write_u32_be_err(value as u32)?;
    Ok(())
}

pub fn write_f64<T: ZByteWriterTrait>(
    stream: &mut ZWriter<T>, value: f64
) -> Result<(), LayerEncodeErrors> {
    stream.write_u64_be_err(value.to_bits())?;
    Ok(())
}

/// Booleans are stored as `255` for set and `0` for unset
pub fn write_bool<T: ZByteWriterTrait>(
    stream: &mut ZWriter<T>, value: bool
) -> Result<(), LayerEncodeErrors> {
    stream.write_u8_err(if value { 255 } else { 0 })?;
    Ok(())
}

/// Check that `length` fits a length field, 8 bytes wide when `wide`
/// is set and 4 otherwise
pub fn check_length(length: u64, wide: bool) -> Result<(), LayerEncodeErrors> {
    if !wide && length > u64::from(u32::MAX) {
        return Err(LayerEncodeErrors::LengthOverflow(length));
    }
    Ok(())
}

/// Write a length field, 8 bytes wide when `wide` is set, 4 otherwise
pub fn write_length<T: ZByteWriterTrait>(
    stream: &mut ZWriter<T>, length: u64, wide: bool
) -> Result<(), LayerEncodeErrors> {
    check_length(length, wide)?;

    if wide {
        stream.write_u64_be_err(length)?;
    } else {
        stream.write_u32_be_err(length as u32)?;
    }
    Ok(())
}

pub fn write_zeros<T: ZByteWriterTrait>(
    stream: &mut ZWriter<T>, count: u64
) -> Result<(), LayerEncodeErrors> {
    for _ in 0..count {
        stream.write_u8_err(0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use zune_core::bytestream::{ZCursor, ZReader, ZWriter};

    use crate::stream::{
        check_length, pascal_string_length, read_pascal_string, round_up, skip_bytes, skip_to,
        write_length, write_pascal_string
    };
    use crate::{LayerDecodeErrors, LayerEncodeErrors};

    #[test]
    fn round_up_to_multiples() {
        assert_eq!(round_up(0, 4), 0);
        assert_eq!(round_up(1, 4), 4);
        assert_eq!(round_up(4, 4), 4);
        assert_eq!(round_up(5, 2), 6);
        assert_eq!(round_up(7, 1), 7);
    }

    #[test]
    fn pascal_string_is_padded() {
        // 1 length byte + 5 bytes, padded to 8
        assert_eq!(pascal_string_length(5, 4), 8);
        // an empty name still takes 4 bytes
        assert_eq!(pascal_string_length(0, 4), 4);

        let mut out = Vec::new();
        let mut writer = ZWriter::new(&mut out);
        write_pascal_string(&mut writer, b"Layer", 4).unwrap();
        assert_eq!(writer.bytes_written(), 8);
        assert_eq!(out, vec![5, b'L', b'a', b'y', b'e', b'r', 0, 0]);

        let mut reader = ZReader::new(ZCursor::new(&out));
        let name = read_pascal_string(&mut reader, 4).unwrap();
        assert_eq!(name, b"Layer");
        assert_eq!(reader.position().unwrap(), 8);
    }

    #[test]
    fn skip_never_goes_backwards() {
        let data = [0_u8; 16];
        let mut reader = ZReader::new(ZCursor::new(&data));
        reader.skip(8).unwrap();

        skip_to(&mut reader, 12, "test").unwrap();
        assert_eq!(reader.position().unwrap(), 12);

        let err = skip_to(&mut reader, 4, "test").unwrap_err();
        assert!(matches!(err, LayerDecodeErrors::BlockOverrun { end: 4, .. }));
    }

    #[test]
    fn skipping_past_the_end_fails() {
        let data = [0_u8; 600];
        let mut reader = ZReader::new(ZCursor::new(&data));

        // more than one chunk
        skip_bytes(&mut reader, 590).unwrap();
        assert_eq!(reader.position().unwrap(), 590);

        let err = skip_bytes(&mut reader, 11).unwrap_err();
        assert!(matches!(err, LayerDecodeErrors::IoErrors(_)));

        let mut reader = ZReader::new(ZCursor::new(&data[..4]));
        let err = skip_to(&mut reader, 6, "test").unwrap_err();
        assert!(matches!(err, LayerDecodeErrors::IoErrors(_)));
    }

    #[test]
    fn pascal_string_padding_must_be_present() {
        // "Layer" wants two padding bytes, only one is there
        let data = [5, b'L', b'a', b'y', b'e', b'r', 0];
        let mut reader = ZReader::new(ZCursor::new(&data));

        let err = read_pascal_string(&mut reader, 4).unwrap_err();
        assert!(matches!(err, LayerDecodeErrors::IoErrors(_)));
    }

    #[test]
    fn narrow_lengths_are_checked() {
        let limit = u64::from(u32::MAX);

        assert!(check_length(limit, false).is_ok());
        assert!(check_length(limit + 1, true).is_ok());
        assert!(matches!(
            check_length(limit + 1, false),
            Err(LayerEncodeErrors::LengthOverflow(length)) if length == limit + 1
        ));

        let mut out = Vec::new();
        let mut writer = ZWriter::new(&mut out);
        assert!(write_length(&mut writer, limit + 1, false).is_err());
        assert!(out.is_empty());
    }
}
