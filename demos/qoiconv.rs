//! Minimal PNG <-> QOI round-trip demo. The `qoiconv` workspace member
//! covers the same ground with more format options; this is the teacher
//! crate's simpler companion example, kept alongside it.

use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use qoi_codec::{Channels, ColorSpace, Header};

fn main() -> Result<(), ()> {
    let mut args = std::env::args();

    if args.len() < 2 {
        eprintln!("Usage: qoiconv <input-path> [<output-path>]");
        eprintln!("Example: qoiconv images/foo.png images/foo.qoi");
        return Err(());
    }

    args.next();

    let input = PathBuf::from(args.next().unwrap());

    let decode = input.extension().map_or(false, |ext| ext == "qoi");

    let output = args.next().map(PathBuf::from).unwrap_or_else(|| {
        if decode {
            input.with_extension("png")
        } else {
            input.with_extension("qoi")
        }
    });

    if output.exists() {
        eprintln!("Output path '{}' already occupied", output.display());
        return Err(());
    }

    if decode {
        let bytes = std::fs::read(&input)
            .map_err(|err| eprintln!("Failed to read QOI file '{}'. {:#}", input.display(), err))?;

        let (header, pixels) = Header::decode_alloc(&bytes).map_err(|err| {
            eprintln!("Failed to decode QOI image '{}'. {}", input.display(), err)
        })?;

        let format = match output.extension() {
            Some(ext) => ImageFormat::from_extension(ext).ok_or_else(|| {
                eprintln!("Failed to pick output format from extension '{:?}'", ext);
            })?,
            None => {
                eprintln!("Failed to pick output format without extension");
                return Err(());
            }
        };

        match header.channels {
            Channels::Rgba => image::save_buffer_with_format(
                &output,
                &pixels,
                header.width,
                header.height,
                image::ColorType::Rgba8,
                format,
            ),
            Channels::Rgb => image::save_buffer_with_format(
                &output,
                &pixels,
                header.width,
                header.height,
                image::ColorType::Rgb8,
                format,
            ),
        }
        .map_err(|err| eprintln!("Failed to save decoded image into '{}'. {:#}", output.display(), err))?;
    } else {
        let image = image::open(&input)
            .map_err(|err| eprintln!("Failed to open input image '{}'. {:#}", input.display(), err))?;

        let (header, pixels): (Header, Vec<u8>) = match &image {
            DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgba16(_)
            | DynamicImage::ImageRgba8(_) => {
                let rgba = image.to_rgba8();
                let header = Header::new(rgba.width(), rgba.height(), Channels::Rgba, ColorSpace::Srgb);
                (header, rgba.into_raw())
            }
            _ => {
                let rgb = image.to_rgb8();
                let header = Header::new(rgb.width(), rgb.height(), Channels::Rgb, ColorSpace::Srgb);
                (header, rgb.into_raw())
            }
        };

        let encoded = header
            .encode_alloc(&pixels)
            .map_err(|err| eprintln!("Failed to encode QOI image '{}'. {}", input.display(), err))?;

        std::fs::write(&output, &encoded)
            .map_err(|err| eprintln!("Failed to write QOI image into output file {}. {:#}", output.display(), err))?;
    }

    Ok(())
}
