/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![allow(clippy::upper_case_acronyms)]

/// Signature used by blend modes and most additional layer information blocks
pub const SIGNATURE_8BIM: [u8; 4] = *b"8BIM";
/// Alternative additional layer information signature written by some versions
pub const SIGNATURE_8B64: [u8; 4] = *b"8B64";

/// Additional layer information keys that use an 8 byte length
/// field in large (PSB) documents
pub const LARGE_BLOCK_KEYS: [[u8; 4]; 13] = [
    *b"LMsk", *b"Lr16", *b"Lr32", *b"Layr", *b"Mt16", *b"Mt32", *b"Mtrn", *b"Alph", *b"FMsk",
    *b"Ink2", *b"FEid", *b"FXid", *b"PxSD"
];

/// Check whether `key` may carry an 8 byte length field in a PSB file
pub fn is_large_block_key(key: &[u8; 4]) -> bool {
    LARGE_BLOCK_KEYS.contains(key)
}

/// Channel id of the transparency mask
pub const CHANNEL_TRANSPARENCY: i16 = -1;
/// Channel id of the user supplied layer mask
pub const CHANNEL_USER_MASK: i16 = -2;
/// Channel id of the real user supplied layer mask, present
/// when both a user mask and a vector mask exist
pub const CHANNEL_REAL_USER_MASK: i16 = -3;

/// Compression method of a single channel's image data
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Compression {
    #[default]
    Raw = 0,
    RLE = 1,
    Zip = 2,
    ZipPrediction = 3
}

impl Compression {
    pub const fn from_int(int: u16) -> Option<Compression> {
        match int {
            0 => Some(Self::Raw),
            1 => Some(Self::RLE),
            2 => Some(Self::Zip),
            3 => Some(Self::ZipPrediction),
            _ => None
        }
    }

    pub const fn to_int(self) -> u16 {
        self as u16
    }
}

/// Blend modes Photoshop knows about.
///
/// Layer records store the raw key, this is only a
/// convenience view over it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendMode {
    PassThrough,
    Normal,
    Dissolve,
    Darken,
    Multiply,
    ColorBurn,
    LinearBurn,
    DarkerColor,
    Lighten,
    Screen,
    ColorDodge,
    LinearDodge,
    LighterColor,
    Overlay,
    SoftLight,
    HardLight,
    VividLight,
    LinearLight,
    PinLight,
    HardMix,
    Difference,
    Exclusion,
    Subtract,
    Divide,
    Hue,
    Saturation,
    Color,
    Luminosity
}

const BLEND_MODE_KEYS: [(BlendMode, [u8; 4]); 28] = [
    (BlendMode::PassThrough, *b"pass"),
    (BlendMode::Normal, *b"norm"),
    (BlendMode::Dissolve, *b"diss"),
    (BlendMode::Darken, *b"dark"),
    (BlendMode::Multiply, *b"mul "),
    (BlendMode::ColorBurn, *b"idiv"),
    (BlendMode::LinearBurn, *b"lbrn"),
    (BlendMode::DarkerColor, *b"dkCl"),
    (BlendMode::Lighten, *b"lite"),
    (BlendMode::Screen, *b"scrn"),
    (BlendMode::ColorDodge, *b"div "),
    (BlendMode::LinearDodge, *b"lddg"),
    (BlendMode::LighterColor, *b"lgCl"),
    (BlendMode::Overlay, *b"over"),
    (BlendMode::SoftLight, *b"sLit"),
    (BlendMode::HardLight, *b"hLit"),
    (BlendMode::VividLight, *b"vLit"),
    (BlendMode::LinearLight, *b"lLit"),
    (BlendMode::PinLight, *b"pLit"),
    (BlendMode::HardMix, *b"hMix"),
    (BlendMode::Difference, *b"diff"),
    (BlendMode::Exclusion, *b"smud"),
    (BlendMode::Subtract, *b"fsub"),
    (BlendMode::Divide, *b"fdiv"),
    (BlendMode::Hue, *b"hue "),
    (BlendMode::Saturation, *b"sat "),
    (BlendMode::Color, *b"colr"),
    (BlendMode::Luminosity, *b"lum ")
];

impl BlendMode {
    /// Map a blend mode key as stored in a layer record, returning
    /// `None` for keys we do not recognise
    pub fn from_key(key: [u8; 4]) -> Option<BlendMode> {
        BLEND_MODE_KEYS
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(mode, _)| *mode)
    }

    pub fn to_key(self) -> [u8; 4] {
        // every variant has an entry
        BLEND_MODE_KEYS
            .iter()
            .find(|(mode, _)| *mode == self)
            .map_or(*b"norm", |(_, key)| *key)
    }
}
