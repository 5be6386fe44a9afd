/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use zune_core::bytestream::{ZByteReaderTrait, ZByteWriterTrait, ZReader, ZWriter};

use crate::errors::{LayerDecodeErrors, LayerEncodeErrors};
use crate::stream::{read_i32, write_i32};

/// A rectangle as stored in layer records and masks,
/// `top, left, bottom, right` in that order
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Rect {
    pub top:    i32,
    pub left:   i32,
    pub bottom: i32,
    pub right:  i32
}

impl Rect {
    pub const SIZE: u64 = 16;

    pub const fn new(top: i32, left: i32, bottom: i32, right: i32) -> Rect {
        Rect {
            top,
            left,
            bottom,
            right
        }
    }

    /// Width of the rectangle, zero for inverted rectangles
    pub const fn width(&self) -> u32 {
        if self.right > self.left {
            self.right.abs_diff(self.left)
        } else {
            0
        }
    }

    /// Height of the rectangle, zero for inverted rectangles
    pub const fn height(&self) -> u32 {
        if self.bottom > self.top {
            self.bottom.abs_diff(self.top)
        } else {
            0
        }
    }

    pub(crate) fn read<T: ZByteReaderTrait>(
        stream: &mut ZReader<T>
    ) -> Result<Rect, LayerDecodeErrors> {
        Ok(Rect {
            top:    read_i32(stream)?,
            left:   read_i32(stream)?,
            bottom: read_i32(stream)?,
            right:  read_i32(stream)?
        })
    }

    pub(crate) fn write<T: ZByteWriterTrait>(
        &self, stream: &mut ZWriter<T>
    ) -> Result<(), LayerEncodeErrors> {
        write_i32(stream, self.top)?;
        write_i32(stream, self.left)?;
        write_i32(stream, self.bottom)?;
        write_i32(stream, self.right)
    }
}
