/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */
//! Reading and writing the layer and mask information section of Photoshop documents
//!
//! This crate decodes the section that holds the layers of a PSD (version 1)
//! or PSB (version 2) document into plain structs that can be inspected and edited,
//! and encodes them back to bytes.
//!
//! Channel pixels are kept as stored, compressed data is not decompressed and
//! unknown additional layer information blocks are carried along as raw bytes,
//! so a decode followed by an encode preserves what we do not understand.
//!
//! # Example
//! ```
//! use zune_psd_layers::{
//!     ChannelImageData, Compression, LayerAndMaskInfo, LayerRecord, PsdVersion, Rect
//! };
//!
//! let mut layer = LayerRecord::new(Rect::new(0, 0, 1, 2));
//! layer.set_name(b"Layer 1").unwrap();
//! layer.push_channel(0, ChannelImageData::new(Compression::Raw, vec![255, 0]));
//!
//! let mut section = LayerAndMaskInfo::default();
//! section.layer_info.layers.push(layer);
//!
//! let bytes = section.encode(PsdVersion::Psb).unwrap();
//! let decoded = LayerAndMaskInfo::decode(&bytes, PsdVersion::Psb).unwrap();
//!
//! assert_eq!(decoded.layer_info.layers[0].unicode_name(), "Layer 1");
//! ```
//!
//! # Features
//! - `std`: Enables `std::error::Error` for the error types
//! - `log`: Emits trace messages about the blocks being read via the `log` crate
//!
//! ## `no_std`
//! Disable the default features to use the crate in `no_std` environments,
//! `alloc` is still required
#![cfg_attr(not(feature = "std"), no_std)]
#![macro_use]
extern crate alloc;
extern crate core;

pub use additional::*;
pub use blending::*;
pub use channel::*;
pub use constants::*;
pub use errors::*;
pub use global_mask::*;
pub use layer_info::*;
pub use mask::*;
pub use rect::*;
pub use record::*;
pub use section::*;
pub use traits::*;
pub use version::*;
pub use zune_core;

mod additional;
mod blending;
mod channel;
mod constants;
mod errors;
mod global_mask;
mod layer_info;
mod mask;
mod rect;
mod record;
mod section;
mod stream;
mod traits;
mod version;
