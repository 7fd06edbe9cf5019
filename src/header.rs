//! The 14-byte fixed header: magic, dimensions, channel count, colorspace.

use crate::{DecodeError, EncodeError, QOI_HEADER_SIZE, QOI_MAGIC, QOI_PADDING};

/// Declared channel count. `Rgb` pixels carry no alpha byte on the wire;
/// `Rgba` pixels do.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Channels {
    Rgb = 3,
    Rgba = 4,
}

impl Channels {
    #[inline(always)]
    pub const fn count(self) -> usize {
        match self {
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }

    #[inline(always)]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Channels::Rgba)
    }

    #[inline(always)]
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            3 => Some(Channels::Rgb),
            4 => Some(Channels::Rgba),
            _ => None,
        }
    }
}

/// Informational colorspace tag. The codec never reads this value; it is
/// only parsed and round-tripped (spec.md §9 Open Questions).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorSpace {
    /// sRGB color channels, linear alpha.
    Srgb = 0,
    /// All channels linear.
    Linear = 1,
}

impl ColorSpace {
    #[inline(always)]
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ColorSpace::Srgb),
            1 => Some(ColorSpace::Linear),
            _ => None,
        }
    }
}

/// A parsed and validated QOI header.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub colorspace: ColorSpace,
}

impl Header {
    #[inline]
    pub const fn new(width: u32, height: u32, channels: Channels, colorspace: ColorSpace) -> Self {
        Header { width, height, channels, colorspace }
    }

    /// `magic == "qoif" && w > 0 && h > 0 && channels in {3, 4}`. Channels
    /// and colorspace are already typed as `Channels`/`ColorSpace`, so only
    /// the dimensions need checking here.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Raw byte length of the matching raster: `w * h * channels`.
    #[inline]
    pub fn decompressed_size(&self) -> usize {
        self.width as usize * self.height as usize * self.channels.count()
    }

    /// `w*h*(c+1) + 22`: the worst case where every pixel needs its own
    /// literal plus the 14-byte header and 8-byte terminator.
    #[inline]
    pub fn max_compressed_size(&self) -> usize {
        self.width as usize * self.height as usize * (self.channels.count() + 1)
            + QOI_HEADER_SIZE
            + QOI_PADDING
    }

    /// Parse and validate the 14-byte header from the front of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < QOI_HEADER_SIZE {
            return Err(DecodeError::InvalidHeader);
        }
        if &bytes[0..4] != QOI_MAGIC {
            return Err(DecodeError::InvalidHeader);
        }
        let width = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let height = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let channels = Channels::from_byte(bytes[12]).ok_or(DecodeError::InvalidHeader)?;
        // An unrecognized colorspace byte is not itself invalid per
        // spec.md §4.5 ("purely informational"); default to `Srgb` so a
        // forwards-compatible encoder's stream still decodes.
        let colorspace = ColorSpace::from_byte(bytes[13]).unwrap_or(ColorSpace::Srgb);

        let header = Header::new(width, height, channels, colorspace);
        if !header.is_valid() {
            return Err(DecodeError::InvalidHeader);
        }
        Ok(header)
    }

    /// Serialize the 14-byte header into the front of `out`.
    pub fn write(&self, out: &mut [u8]) -> Result<(), EncodeError> {
        if out.len() < QOI_HEADER_SIZE {
            return Err(EncodeError::OutputTooSmall);
        }
        out[0..4].copy_from_slice(QOI_MAGIC);
        out[4..8].copy_from_slice(&self.width.to_be_bytes());
        out[8..12].copy_from_slice(&self.height.to_be_bytes());
        out[12] = self.channels as u8;
        out[13] = self.colorspace as u8;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = Header::new(4, 3, Channels::Rgba, ColorSpace::Linear);
        let mut buf = [0u8; QOI_HEADER_SIZE];
        header.write(&mut buf).unwrap();
        let parsed = Header::read(&buf).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = [0u8; QOI_HEADER_SIZE];
        Header::new(1, 1, Channels::Rgb, ColorSpace::Srgb).write(&mut buf).unwrap();
        buf[0] = b'x';
        assert_eq!(Header::read(&buf), Err(DecodeError::InvalidHeader));
    }

    #[test]
    fn rejects_bad_channels() {
        let mut buf = [0u8; QOI_HEADER_SIZE];
        Header::new(1, 1, Channels::Rgb, ColorSpace::Srgb).write(&mut buf).unwrap();
        buf[12] = 5;
        assert_eq!(Header::read(&buf), Err(DecodeError::InvalidHeader));
    }

    #[test]
    fn rejects_zero_dimension() {
        let mut buf = [0u8; QOI_HEADER_SIZE];
        Header::new(0, 1, Channels::Rgb, ColorSpace::Srgb).write(&mut buf).unwrap();
        assert_eq!(Header::read(&buf), Err(DecodeError::InvalidHeader));
    }

    #[test]
    fn max_compressed_size_matches_formula() {
        let header = Header::new(10, 5, Channels::Rgba, ColorSpace::Srgb);
        assert_eq!(header.max_compressed_size(), 10 * 5 * 5 + 14 + 8);
    }
}
