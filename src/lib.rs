//! QOI - The "Quite OK Image" format for fast, lossless image compression.
//!
//! <https://qoiformat.org>
//!
//! A QOI file has a 14-byte header, followed by any number of data "chunks"
//! and an 8-byte end marker.
//!
//! ```rust
//! #[repr(C)]
//! struct QoiHeader {
//!     magic: [u8; 4], // magic bytes "qoif"
//!     width: u32,     // image width in pixels (BE)
//!     height: u32,    // image height in pixels (BE)
//!     channels: u8,   // 3 = RGB, 4 = RGBA
//!     colorspace: u8, // 0 = sRGB with linear alpha, 1 = all linear
//! }
//! ```
//!
//! Images are encoded top to bottom, left to right. The decoder and encoder
//! start with `{r: 0, g: 0, b: 0, a: 255}` as the previous pixel value. An
//! image is complete when all pixels specified by `width * height` have been
//! covered. Each pixel is encoded as one of:
//!  * a run of the previous pixel (`QOI_OP_RUN`)
//!  * an index into an array of previously seen pixels (`QOI_OP_INDEX`)
//!  * a small difference to the previous pixel (`QOI_OP_DIFF`, `QOI_OP_LUMA`)
//!  * a full RGB or RGBA literal (`QOI_OP_RGB`, `QOI_OP_RGBA`)
//!
//! A running `[RgbaPixel; 64]` table (zero-initialized) of previously seen
//! pixel values is maintained by the encoder and decoder. Each materialized
//! pixel is written into this table at the slot given by hashing its color.
//! When the encoder finds the current pixel already at its slot, it emits
//! `QOI_OP_INDEX` instead of a longer encoding.
//!
//! The hash function for the slot index is:
//! ```text
//! index = (r * 3 + g * 5 + b * 7 + a * 11) % 64
//! ```
//!
//! Each chunk starts with a 2- or 8-bit tag. The 8-bit tags (`QOI_OP_RGB`,
//! `QOI_OP_RGBA`) take precedence over the 2-bit tags; a decoder must check
//! for them first. The byte stream ends with seven `0x00` bytes followed by
//! a single `0x01` byte.
//!
//! ```text
//! .- QOI_OP_INDEX ----------.
//! |  7  6  5  4  3  2  1  0 |
//! |-------+-----------------|
//! |  0  0 |     index       |
//! `-------------------------`
//! .- QOI_OP_DIFF -----------.
//! |  7  6  5  4  3  2  1  0 |
//! |-------+-----+-----+-----|
//! |  0  1 |  dr |  dg |  db |
//! `-------------------------`
//! .- QOI_OP_LUMA -------------------------------------.
//! |         Byte[0]         |         Byte[1]         |
//! |-------+-----------------+-------------+-----------|
//! |  1  0 |  green diff     |   dr - dg   |  db - dg  |
//! `---------------------------------------------------`
//! .- QOI_OP_RUN ------------.
//! |  7  6  5  4  3  2  1  0 |
//! |-------+-----------------|
//! |  1  1 |       run       |
//! `-------------------------`
//! .- QOI_OP_RGB ------------------------------------------.
//! |         Byte[0]         | Byte[1] | Byte[2] | Byte[3] |
//! |-------------------------+---------+---------+---------|
//! |  1  1  1  1  1  1  1  0 |   red   |  green  |  blue   |
//! `-------------------------------------------------------`
//! .- QOI_OP_RGBA ---------------------------------------------------.
//! |         Byte[0]         | Byte[1] | Byte[2] | Byte[3] | Byte[4] |
//! |-------------------------+---------+---------+---------+---------|
//! |  1  1  1  1  1  1  1  1 |   red   |  green  |  blue   |  alpha  |
//! `-----------------------------------------------------------------`
//! ```
#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::{vec, vec::Vec};

use core::fmt::{self, Display};

mod decode;
mod encode;
mod hash;
mod header;
pub mod pixel;

pub use decode::{decode, decode_strict};
pub use encode::encode;
pub use header::{Channels, ColorSpace, Header};
pub use pixel::RgbaPixel;

const QOI_OP_INDEX: u8 = 0x00; /* 00xxxxxx */
const QOI_OP_DIFF: u8 = 0x40; /* 01xxxxxx */
const QOI_OP_LUMA: u8 = 0x80; /* 10xxxxxx */
const QOI_OP_RUN: u8 = 0xc0; /* 11xxxxxx */
const QOI_OP_RGB: u8 = 0xfe; /* 11111110 */
const QOI_OP_RGBA: u8 = 0xff; /* 11111111 */

const QOI_MAGIC: &[u8; 4] = b"qoif";
const QOI_HEADER_SIZE: usize = 14;
const TERMINATOR: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];
const QOI_PADDING: usize = TERMINATOR.len();

/// Errors that can occur while encoding an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncodeError {
    /// Width, height or channel count is invalid (zero dimension, or a
    /// channel count outside `{3, 4}`).
    InvalidArgument,

    /// The pixel buffer is shorter than `width * height * channels`.
    NotEnoughPixelData,

    /// The output buffer is too small to hold the header, opcode stream and
    /// terminator. Size it with [`Header::max_compressed_size`].
    OutputTooSmall,
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::InvalidArgument => f.write_str("invalid width, height or channel count"),
            EncodeError::NotEnoughPixelData => {
                f.write_str("pixel buffer is too small for the declared image dimensions")
            }
            EncodeError::OutputTooSmall => f.write_str("output buffer is too small to fit encoded image"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Errors that can occur while decoding an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeError {
    /// The header is missing, too short, has a bad magic value, or declares
    /// an unsupported channel count or a zero dimension.
    InvalidHeader,

    /// The opcode stream ended before `width * height` pixels were
    /// produced, or a multi-byte chunk ran past the end of the input.
    CorruptStream,

    /// The output buffer is too small to hold `width * height * channels`
    /// bytes. Size it with [`Header::decompressed_size`].
    OutputTooSmall,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidHeader => f.write_str("missing or invalid QOI header"),
            DecodeError::CorruptStream => f.write_str("opcode stream ended before the image was complete"),
            DecodeError::OutputTooSmall => f.write_str("output buffer is too small to fit decoded image"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

impl Header {
    /// Encode `pixels` into `output` using this header. Equivalent to the
    /// free function [`encode`] with `self` as the header argument.
    #[inline]
    pub fn encode(&self, pixels: &[u8], output: &mut [u8]) -> Result<usize, EncodeError> {
        encode(pixels, self, output)
    }

    /// Encode `pixels` into a freshly allocated `Vec`, sized exactly to the
    /// number of bytes written.
    #[cfg(feature = "alloc")]
    pub fn encode_alloc(&self, pixels: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut out = vec![0u8; self.max_compressed_size()];
        let n = self.encode(pixels, &mut out)?;
        out.truncate(n);
        Ok(out)
    }

    /// Decode a QOI byte stream into caller-owned `output`. Equivalent to
    /// the free function [`decode`].
    #[inline]
    pub fn decode_into(bytes: &[u8], output: &mut [u8]) -> Result<(Header, usize), DecodeError> {
        decode(bytes, output)
    }

    /// Decode a QOI byte stream into a freshly allocated `Vec`, sized
    /// exactly to the decoded raster.
    #[cfg(feature = "alloc")]
    pub fn decode_alloc(bytes: &[u8]) -> Result<(Header, Vec<u8>), DecodeError> {
        let header = Header::read(bytes)?;
        let mut out = vec![0u8; header.decompressed_size()];
        let (header, _) = Header::decode_into(bytes, &mut out)?;
        Ok((header, out))
    }
}
