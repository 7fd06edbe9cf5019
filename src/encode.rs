//! Per-pixel opcode selection and emission.

use crate::hash::Table;
use crate::header::{Channels, Header};
use crate::pixel::RgbaPixel;
use crate::{EncodeError, QOI_HEADER_SIZE, QOI_OP_INDEX, QOI_OP_RGB, QOI_OP_RGBA, QOI_OP_RUN, TERMINATOR};

/// Encode a raw `width * height * channels` pixel buffer into `output`,
/// writing the header, the opcode stream and the terminator. Returns the
/// number of bytes written.
pub fn encode(pixels: &[u8], header: &Header, output: &mut [u8]) -> Result<usize, EncodeError> {
    if !header.is_valid() {
        return Err(EncodeError::InvalidArgument);
    }

    let expected = header.decompressed_size();
    if pixels.len() < expected {
        return Err(EncodeError::NotEnoughPixelData);
    }
    let pixels = &pixels[..expected];

    header.write(output)?;

    let written = match header.channels {
        Channels::Rgb => encode_pixels::<3>(pixels, &mut output[QOI_HEADER_SIZE..])?,
        Channels::Rgba => encode_pixels::<4>(pixels, &mut output[QOI_HEADER_SIZE..])?,
    };

    Ok(QOI_HEADER_SIZE + written)
}

/// Encode a flat `CHANNELS`-byte-per-pixel buffer, returning the number of
/// bytes written after the header (i.e. opcode stream + terminator).
fn encode_pixels<const CHANNELS: usize>(
    pixels: &[u8],
    output: &mut [u8],
) -> Result<usize, EncodeError> {
    let mut table = Table::new();
    let mut prev = RgbaPixel::INITIAL;
    let mut run: u8 = 0;

    let mut chunks = pixels.chunks_exact(CHANNELS);
    let mut out_pos = 0usize;

    macro_rules! push {
        ($n:expr, $bytes:expr) => {{
            let n = $n;
            if output.len() < out_pos + n {
                return Err(EncodeError::OutputTooSmall);
            }
            output[out_pos..out_pos + n].copy_from_slice(&$bytes[..n]);
            out_pos += n;
        }};
    }

    while let Some(raw) = chunks.next() {
        let cur = read_pixel::<CHANNELS>(raw, prev.a);
        let is_last = chunks.len() == 0;

        if cur == prev {
            run += 1;
            if run == 62 || is_last {
                push!(1, [QOI_OP_RUN | (run - 1)]);
                run = 0;
            }
            continue;
        }

        if run > 0 {
            push!(1, [QOI_OP_RUN | (run - 1)]);
            run = 0;
        }

        if table.contains(cur) {
            push!(1, [QOI_OP_INDEX | cur.hash() as u8]);
        } else if cur.a == prev.a {
            let delta = cur.delta(&prev);
            if let Some(tag) = delta.diff() {
                push!(1, [tag]);
            } else if let Some(bytes) = delta.luma() {
                push!(2, bytes);
            } else {
                push!(4, [QOI_OP_RGB, cur.r, cur.g, cur.b]);
            }
        } else {
            push!(5, [QOI_OP_RGBA, cur.r, cur.g, cur.b, cur.a]);
        }

        table.insert(cur);
        prev = cur;
    }

    if output.len() < out_pos + TERMINATOR.len() {
        return Err(EncodeError::OutputTooSmall);
    }
    output[out_pos..out_pos + TERMINATOR.len()].copy_from_slice(&TERMINATOR);
    out_pos += TERMINATOR.len();

    Ok(out_pos)
}

#[inline(always)]
fn read_pixel<const CHANNELS: usize>(raw: &[u8], prev_a: u8) -> RgbaPixel {
    if CHANNELS == 4 {
        RgbaPixel::new(raw[0], raw[1], raw[2], raw[3])
    } else {
        RgbaPixel::new(raw[0], raw[1], raw[2], prev_a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ColorSpace;
    use crate::{decode, QOI_HEADER_SIZE as HDR};

    fn encode_rgb(pixels: &[u8], w: u32, h: u32) -> Vec<u8> {
        let header = Header::new(w, h, Channels::Rgb, ColorSpace::Srgb);
        let mut out = vec![0u8; header.max_compressed_size()];
        let n = encode(pixels, &header, &mut out).unwrap();
        out.truncate(n);
        out
    }

    fn encode_rgba(pixels: &[u8], w: u32, h: u32) -> Vec<u8> {
        let header = Header::new(w, h, Channels::Rgba, ColorSpace::Srgb);
        let mut out = vec![0u8; header.max_compressed_size()];
        let n = encode(pixels, &header, &mut out).unwrap();
        out.truncate(n);
        out
    }

    // S1: 1x1 black RGB pixel encodes as a single RUN(1) chunk.
    #[test]
    fn s1_single_black_pixel_is_run_one() {
        let encoded = encode_rgb(&[0, 0, 0], 1, 1);
        assert_eq!(&encoded[HDR..HDR + 1], &[0xC0]);
        assert_eq!(&encoded[encoded.len() - 8..], &TERMINATOR);
    }

    // S2: 3x1 solid RGBA color: literal RGBA then RUN(2).
    #[test]
    fn s2_solid_color_literal_then_run() {
        let pixels = [10, 20, 30, 40, 10, 20, 30, 40, 10, 20, 30, 40];
        let encoded = encode_rgba(&pixels, 3, 1);
        assert_eq!(&encoded[HDR..HDR + 5], &[0xFF, 0x0A, 0x14, 0x1E, 0x28]);
        assert_eq!(encoded[HDR + 5], 0xC1);
    }

    // S3: 2x1 RGB [0,0,0],[1,255,1]: RUN(1) then DIFF(3,1,3).
    #[test]
    fn s3_small_diff_after_run() {
        let pixels = [0, 0, 0, 1, 255, 1];
        let encoded = encode_rgb(&pixels, 2, 1);
        assert_eq!(encoded[HDR], 0xC0);
        assert_eq!(encoded[HDR + 1], 0x57);
    }

    // S4: 1x2 RGB (0,0,0) -> (8,40,12): LUMA out of range, falls to RGB literal.
    #[test]
    fn s4_luma_out_of_range_falls_back_to_rgb_literal() {
        let pixels = [0, 0, 0, 8, 40, 12];
        let encoded = encode_rgb(&pixels, 1, 2);
        // first pixel equals initial prev -> RUN(1), then literal RGB.
        assert_eq!(encoded[HDR], 0xC0);
        assert_eq!(&encoded[HDR + 1..HDR + 5], &[0xFE, 8, 40, 12]);
    }

    // S5: A, B, A -> third pixel is an INDEX hit on A's slot.
    #[test]
    fn s5_index_hit_on_repeat() {
        let a = RgbaPixel::new(5, 6, 7, 255);
        let b = RgbaPixel::new(200, 1, 9, 255);
        let pixels = [a.r, a.g, a.b, b.r, b.g, b.b, a.r, a.g, a.b];
        let encoded = encode_rgb(&pixels, 3, 1);
        let (_, decoded) = decode(&encoded, &mut vec![0u8; 9]).unwrap();
        assert_eq!(decoded, 9);
        // Last opcode byte before the terminator must be an INDEX tag for `a`.
        let last_op = encoded[encoded.len() - 8 - 1];
        assert_eq!(last_op & 0xC0, QOI_OP_INDEX);
        assert_eq!(last_op & 0x3F, a.hash() as u8);
    }

    // S6: 63 identical non-initial pixels -> literal, then RUN(62), RUN(1).
    #[test]
    fn s6_max_run_splits_at_62() {
        let mut pixels = Vec::new();
        for _ in 0..63 {
            pixels.extend_from_slice(&[9, 9, 9]);
        }
        let encoded = encode_rgb(&pixels, 63, 1);
        // first pixel differs from initial prev (0,0,0) -> literal RGB
        assert_eq!(&encoded[HDR..HDR + 4], &[0xFE, 9, 9, 9]);
        assert_eq!(encoded[HDR + 4], QOI_OP_RUN | 61); // RUN(62)
        assert_eq!(encoded[HDR + 5], QOI_OP_RUN | 0); // RUN(1)
    }

    #[test]
    fn never_two_consecutive_runs_without_cap_reason() {
        // 130 identical pixels after an initial literal: splits into RUN(62)
        // chunks at the cap boundary, then a final shorter RUN - legal
        // because each RUN(62) is flushed immediately at the cap rather than
        // re-opened.
        let mut pixels = vec![1, 2, 3];
        for _ in 0..130 {
            pixels.extend_from_slice(&[9, 9, 9]);
        }
        let encoded = encode_rgb(&pixels, 131, 1);
        let ops = &encoded[HDR + 4..encoded.len() - 8];
        assert_eq!(ops[0], QOI_OP_RUN | 61);
        assert_eq!(ops[1], QOI_OP_RUN | 61);
        assert_eq!(ops[2], QOI_OP_RUN | 5);
        assert_eq!(ops.len(), 3);
    }

    #[test]
    fn max_compressed_size_never_exceeded() {
        let mut pixels = Vec::new();
        for i in 0..64u32 {
            pixels.extend_from_slice(&[(i * 37) as u8, (i * 59) as u8, (i * 83) as u8, 255]);
        }
        let header = Header::new(8, 8, Channels::Rgba, ColorSpace::Srgb);
        let mut out = vec![0u8; header.max_compressed_size()];
        let n = encode(&pixels, &header, &mut out).unwrap();
        assert!(n <= header.max_compressed_size());
    }

    #[test]
    fn invalid_dimensions_fail() {
        let header = Header::new(0, 1, Channels::Rgb, ColorSpace::Srgb);
        let mut out = vec![0u8; 64];
        assert_eq!(encode(&[], &header, &mut out), Err(EncodeError::InvalidArgument));
    }
}
