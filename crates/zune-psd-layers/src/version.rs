/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

/// File format version, as stored in the document header.
///
/// The version decides how wide some of the length fields in the
/// layer and mask section are.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum PsdVersion {
    /// Photoshop document, `.psd`, version 1
    #[default]
    Psd,
    /// Photoshop large document format, `.psb`, version 2
    Psb
}

impl PsdVersion {
    pub const fn from_int(int: u16) -> Option<PsdVersion> {
        match int {
            1 => Some(PsdVersion::Psd),
            2 => Some(PsdVersion::Psb),
            _ => None
        }
    }

    pub const fn to_int(self) -> u16 {
        match self {
            PsdVersion::Psd => 1,
            PsdVersion::Psb => 2
        }
    }

    /// Whether this is the large document format
    pub const fn is_large(self) -> bool {
        matches!(self, PsdVersion::Psb)
    }

    /// Size in bytes of the version dependent length fields.
    ///
    /// These are the section lengths of the layer and mask information,
    /// the layer info length and the per channel data lengths of a layer record.
    pub const fn length_field_size(self) -> u64 {
        match self {
            PsdVersion::Psd => 4,
            PsdVersion::Psb => 8
        }
    }
}
