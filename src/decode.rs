//! Opcode dispatch and pixel reconstruction.

use crate::hash::Table;
use crate::header::{Channels, Header};
use crate::pixel::{Delta, RgbaPixel};
use crate::{
    DecodeError, QOI_HEADER_SIZE, QOI_OP_DIFF, QOI_OP_INDEX, QOI_OP_LUMA, QOI_OP_RGB, QOI_OP_RGBA,
    QOI_OP_RUN, TERMINATOR,
};

/// Decode a full QOI byte stream (header included) into `output`. Returns
/// the parsed header and the number of raster bytes written.
pub fn decode(bytes: &[u8], output: &mut [u8]) -> Result<(Header, usize), DecodeError> {
    decode_impl(bytes, output, false)
}

/// As [`decode`], but additionally requires the trailing 8-byte terminator
/// to match exactly (`DecodeError::CorruptStream` otherwise). See spec.md §9
/// Open Questions: terminator validation is optional, this is the opt-in.
pub fn decode_strict(bytes: &[u8], output: &mut [u8]) -> Result<(Header, usize), DecodeError> {
    decode_impl(bytes, output, true)
}

fn decode_impl(
    bytes: &[u8],
    output: &mut [u8],
    verify_terminator: bool,
) -> Result<(Header, usize), DecodeError> {
    let header = Header::read(bytes)?;
    let body = &bytes[QOI_HEADER_SIZE..];

    let needed = header.decompressed_size();
    if output.len() < needed {
        return Err(DecodeError::OutputTooSmall);
    }
    let output = &mut output[..needed];

    let consumed = match header.channels {
        Channels::Rgb => decode_pixels::<3>(body, output)?,
        Channels::Rgba => decode_pixels::<4>(body, output)?,
    };

    if verify_terminator {
        let rest = &body[consumed..];
        if rest.len() < TERMINATOR.len() || &rest[..TERMINATOR.len()] != TERMINATOR {
            return Err(DecodeError::CorruptStream);
        }
    }

    Ok((header, needed))
}

/// Decode `output.len() / CHANNELS` pixels from `bytes` into `output`.
/// Returns the number of input bytes consumed (not including any bytes
/// after the last pixel, e.g. the terminator).
fn decode_pixels<const CHANNELS: usize>(
    bytes: &[u8],
    output: &mut [u8],
) -> Result<usize, DecodeError> {
    let mut table = Table::new();
    let mut prev = RgbaPixel::INITIAL;

    let mut pos = 0usize;
    let mut out = output.chunks_exact_mut(CHANNELS);

    while let Some(slot) = out.next() {
        let tag = *bytes.get(pos).ok_or(DecodeError::CorruptStream)?;

        let cur = if tag == QOI_OP_RGB {
            let rgb = bytes.get(pos + 1..pos + 4).ok_or(DecodeError::CorruptStream)?;
            pos += 4;
            RgbaPixel::new(rgb[0], rgb[1], rgb[2], prev.a)
        } else if tag == QOI_OP_RGBA {
            let rgba = bytes.get(pos + 1..pos + 5).ok_or(DecodeError::CorruptStream)?;
            pos += 5;
            RgbaPixel::new(rgba[0], rgba[1], rgba[2], rgba[3])
        } else if tag & 0xC0 == QOI_OP_RUN {
            // A run fills this pixel and `run_len - 1` further pixels with
            // `prev`, without touching the table or `prev` itself.
            let run_len = (tag & 0x3F) as usize + 1;
            pos += 1;
            write_pixel::<CHANNELS>(slot, prev);
            let mut filled = 1;
            while filled < run_len {
                match out.next() {
                    Some(next_slot) => write_pixel::<CHANNELS>(next_slot, prev),
                    None => break,
                }
                filled += 1;
            }
            continue;
        } else if tag & 0xC0 == QOI_OP_LUMA {
            let b1 = *bytes.get(pos + 1).ok_or(DecodeError::CorruptStream)?;
            pos += 2;
            let dg = (tag & 0x3F).wrapping_sub(32);
            let dr = ((b1 >> 4) & 0x0F).wrapping_sub(8).wrapping_add(dg);
            let db = (b1 & 0x0F).wrapping_sub(8).wrapping_add(dg);
            prev.apply(Delta { dr, dg, db })
        } else if tag & 0xC0 == QOI_OP_DIFF {
            pos += 1;
            let dr = ((tag >> 4) & 0x03).wrapping_sub(2);
            let dg = ((tag >> 2) & 0x03).wrapping_sub(2);
            let db = (tag & 0x03).wrapping_sub(2);
            prev.apply(Delta { dr, dg, db })
        } else {
            // tag & 0xC0 == QOI_OP_INDEX
            pos += 1;
            table.get((tag & 0x3F) as usize)
        };

        write_pixel::<CHANNELS>(slot, cur);
        table.insert(cur);
        prev = cur;
    }

    Ok(pos)
}

#[inline(always)]
fn write_pixel<const CHANNELS: usize>(slot: &mut [u8], pixel: RgbaPixel) {
    slot[0] = pixel.r;
    slot[1] = pixel.g;
    slot[2] = pixel.b;
    if CHANNELS == 4 {
        slot[3] = pixel.a;
    }
}
