use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use log::{error, info};
use qoi_codec::{Channels, ColorSpace, Header};

enum Format {
    Qoi,
    Raw,
    Image(image::ImageFormat),
}

fn main() -> Result<(), ()> {
    env_logger::init();

    let mut args = std::env::args();

    if args.len() < 2 {
        eprintln!("Usage: qoiconv <input-path> [<output-path>]");
        eprintln!("Example: qoiconv images/foo.png images/foo.qoi");
        return Err(());
    }

    args.next();

    let input = PathBuf::from(args.next().unwrap());

    let input_format = match input.extension() {
        Some(ext) => match ext {
            _ if ext == "qoi" => Format::Qoi,
            _ if ext == "raw" => panic!("RAW is unsupported as input format"),
            _ => Format::Image(ImageFormat::from_extension(ext).ok_or_else(|| {
                error!("Failed to pick input format from extension '{:?}'", ext);
            })?),
        },
        None => {
            error!("Failed to pick input format without extension");
            return Err(());
        }
    };

    let output = args.next().map(PathBuf::from).unwrap_or_else(|| {
        if let Format::Qoi = input_format {
            input.with_extension("png")
        } else {
            input.with_extension("qoi")
        }
    });

    if output.exists() {
        error!("Output path '{}' already occupied", output.display());
        return Err(());
    }

    let output_format = match output.extension() {
        Some(ext) => match ext {
            _ if ext == "qoi" => Format::Qoi,
            _ if ext == "raw" => Format::Raw,
            _ => Format::Image(ImageFormat::from_extension(ext).ok_or_else(|| {
                error!("Failed to pick output format from extension '{:?}'", ext);
            })?),
        },
        None => {
            error!("Failed to pick output format without extension");
            return Err(());
        }
    };

    let bytes = std::fs::read(&input)
        .map_err(|err| error!("Failed to read '{}'. {}", input.display(), err))?;

    let dynamic_image = match input_format {
        Format::Qoi => {
            let (header, pixels) = Header::decode_alloc(&bytes)
                .map_err(|err| error!("Failed to decode QOI image '{}'. {}", input.display(), err))?;

            match header.channels {
                Channels::Rgba => image::DynamicImage::ImageRgba8(
                    image::RgbaImage::from_raw(header.width, header.height, pixels).unwrap(),
                ),
                Channels::Rgb => image::DynamicImage::ImageRgb8(
                    image::RgbImage::from_raw(header.width, header.height, pixels).unwrap(),
                ),
            }
        }
        Format::Raw => unreachable!(),
        Format::Image(format) => image::load_from_memory_with_format(&bytes, format)
            .map_err(|err| error!("Failed to open input image '{}'. {}", input.display(), err))?,
    };

    match output_format {
        Format::Qoi => {
            let (header, pixels): (Header, Vec<u8>) = match &dynamic_image {
                DynamicImage::ImageLuma16(_)
                | DynamicImage::ImageLuma8(_)
                | DynamicImage::ImageLumaA16(_)
                | DynamicImage::ImageLumaA8(_)
                | DynamicImage::ImageRgba16(_)
                | DynamicImage::ImageRgba8(_) => {
                    let rgba = dynamic_image.to_rgba8();
                    let header =
                        Header::new(rgba.width(), rgba.height(), Channels::Rgba, ColorSpace::Srgb);
                    (header, rgba.into_raw())
                }
                _ => {
                    let rgb = dynamic_image.to_rgb8();
                    let header =
                        Header::new(rgb.width(), rgb.height(), Channels::Rgb, ColorSpace::Srgb);
                    (header, rgb.into_raw())
                }
            };

            let encoded = header
                .encode_alloc(&pixels)
                .map_err(|err| error!("Failed to encode QOI image '{}'. {}", input.display(), err))?;

            info!(
                "encoded {}x{} ({:?}) -> {} bytes ({:.1}% of raw)",
                header.width,
                header.height,
                header.channels,
                encoded.len(),
                100.0 * encoded.len() as f64 / pixels.len() as f64
            );

            std::fs::write(&output, &encoded)
                .map_err(|err| error!("Failed to write '{}'. {}", output.display(), err))?;
        }

        Format::Raw => {
            std::fs::write(&output, dynamic_image.as_bytes())
                .map_err(|err| error!("Failed to write RAW image into '{}'. {}", output.display(), err))?;
        }

        Format::Image(format) => {
            dynamic_image
                .save_with_format(&output, format)
                .map_err(|err| error!("Failed to save image into '{}'. {}", output.display(), err))?;
        }
    }

    Ok(())
}
