//! Turns pure black pixels cyan, one file at a time.
//!
//! A pixel is pure black when its red, green and blue channels sum to zero,
//! whatever its alpha. Such pixels become `(0, 255, 255)` with the original
//! alpha; everything else is copied as is. Only non-premultiplied 8-bit RGBA
//! pixels are accepted.

use anyhow::Result;
use log::{debug, warn};

use crate::png::{Color, DecodedPng, NrgbaImage, Pixel};

pub const CYAN: Pixel = Pixel::new(0, 255, 255, 255);
pub const INPUT_EXTENSION: &str = ".png";
pub const OUTPUT_SUFFIX: &str = "-blue.png";

/// A pixel outside the NRGBA color model. The scan stops at the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Only NRGBA colors supported")]
pub struct UnsupportedColor {
    pub x: u32,
    pub y: u32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Recolored image written to this path.
    Written(String),
    NotPng,
    UnsupportedColor,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub written: Vec<String>,
    pub skipped: usize,
}

/// True when the final path element ends in exactly `.png`.
pub fn has_png_extension(arg: &str) -> bool {
    arg.ends_with(INPUT_EXTENSION)
}

/// `photo.png` becomes `photo-blue.png`, in the same directory.
pub fn output_path(arg: &str) -> String {
    let stem = arg.strip_suffix(INPUT_EXTENSION).unwrap_or(arg);
    format!("{}{}", stem, OUTPUT_SUFFIX)
}

pub fn recolor_pixel(pixel: Pixel) -> Pixel {
    let sum = pixel.red as u16 + pixel.green as u16 + pixel.blue as u16;
    if sum == 0 {
        Pixel { alpha: pixel.alpha, ..CYAN }
    } else {
        pixel
    }
}

/// Builds a new image with the same bounds as `image`, recoloring every
/// pixel. Fails on the first pixel that is not NRGBA.
pub fn recolor(image: &DecodedPng) -> std::result::Result<NrgbaImage, UnsupportedColor> {
    let bounds = image.bounds();
    let mut recolored = NrgbaImage::new(bounds);

    for x in bounds.min_x..bounds.max_x {
        for y in bounds.min_y..bounds.max_y {
            match image.at(x, y) {
                Color::Nrgba(pixel) => recolored.set(x, y, recolor_pixel(pixel)),
                color => return Err(UnsupportedColor { x, y, color }),
            }
        }
    }

    Ok(recolored)
}

/// Handles one command line argument.
///
/// Skipped inputs are reported through `Ok`; an `Err` means the file could not
/// be read or decoded, or the output could not be written.
pub fn process(arg: &str) -> Result<Outcome> {
    if !has_png_extension(arg) {
        warn!("{}: only PNGs allowed", arg);
        return Ok(Outcome::NotPng);
    }

    let image = DecodedPng::read_from_file(arg)?;

    let recolored = match recolor(&image) {
        Ok(recolored) => recolored,
        Err(unsupported) => {
            debug!("{}: pixel ({}, {}) is {:?}", arg, unsupported.x, unsupported.y, unsupported.color);
            warn!("{}: {}", arg, unsupported);
            return Ok(Outcome::UnsupportedColor);
        },
    };

    let output = output_path(arg);
    recolored.save(&output)?;
    Ok(Outcome::Written(output))
}

/// Processes `args` in order, stopping at the first fatal error.
pub fn run<I, S>(args: I) -> Result<Summary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut summary = Summary::default();
    for arg in args {
        match process(arg.as_ref())? {
            Outcome::Written(output) => summary.written.push(output),
            Outcome::NotPng | Outcome::UnsupportedColor => summary.skipped += 1,
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::png::{Bounds, ImageType, PngInfo, Pixels};

    fn decoded(width: u32, height: u32, colors: Vec<Color>) -> DecodedPng {
        DecodedPng {
            info: PngInfo {
                width,
                height,
                bit_depth: 8,
                color_type: 6,
                interlace: 0,
                image_type: ImageType::TruecolorAlpha,
            },
            pixels: Pixels::Direct(colors),
        }
    }

    #[test]
    fn extension_is_case_sensitive() {
        assert!(has_png_extension("photo.png"));
        assert!(has_png_extension("dir/sub/photo.png"));
        assert!(has_png_extension(".png"));
        assert!(!has_png_extension("photo.PNG"));
        assert!(!has_png_extension("photo.png.bak"));
        assert!(!has_png_extension("photo.jpg"));
        assert!(!has_png_extension("png"));
        assert!(!has_png_extension(""));
    }

    #[test]
    fn output_path_is_sibling() {
        assert_eq!(output_path("photo.png"), "photo-blue.png");
        assert_eq!(output_path("dir/sub/photo.png"), "dir/sub/photo-blue.png");
        assert_eq!(output_path("a.b.png"), "a.b-blue.png");
    }

    #[test]
    fn black_becomes_cyan_keeping_alpha() {
        assert_eq!(recolor_pixel(Pixel::new(0, 0, 0, 255)), Pixel::new(0, 255, 255, 255));
        assert_eq!(recolor_pixel(Pixel::new(0, 0, 0, 0)), Pixel::new(0, 255, 255, 0));
        assert_eq!(recolor_pixel(Pixel::new(0, 0, 0, 77)), Pixel::new(0, 255, 255, 77));
    }

    #[test]
    fn channel_sum_does_not_wrap() {
        let pixel = Pixel::new(128, 128, 0, 255);
        assert_eq!(recolor_pixel(pixel), pixel);
        let pixel = Pixel::new(255, 1, 0, 10);
        assert_eq!(recolor_pixel(pixel), pixel);
    }

    #[test]
    fn recolor_two_by_two() {
        // row-major storage: (0,0) (1,0) (0,1) (1,1)
        let img = decoded(2, 2, vec![
            Color::Nrgba(Pixel::new(0, 0, 0, 255)),
            Color::Nrgba(Pixel::new(10, 0, 0, 255)),
            Color::Nrgba(Pixel::new(0, 0, 0, 0)),
            Color::Nrgba(Pixel::new(50, 60, 70, 200)),
        ]);
        let out = recolor(&img).unwrap();
        assert_eq!(out.bounds, Bounds::from_size(2, 2));
        assert_eq!(out.get(0, 0), Pixel::new(0, 255, 255, 255));
        assert_eq!(out.get(1, 0), Pixel::new(10, 0, 0, 255));
        assert_eq!(out.get(0, 1), Pixel::new(0, 255, 255, 0));
        assert_eq!(out.get(1, 1), Pixel::new(50, 60, 70, 200));
    }

    #[test]
    fn recolor_stops_at_first_foreign_pixel() {
        let img = decoded(2, 1, vec![
            Color::Nrgba(Pixel::new(0, 0, 0, 255)),
            Color::Rgba(Pixel::new(0, 0, 0, 255)),
        ]);
        let err = recolor(&img).unwrap_err();
        assert_eq!((err.x, err.y), (1, 0));
        assert_eq!(err.color, Color::Rgba(Pixel::new(0, 0, 0, 255)));
        assert_eq!(err.to_string(), "Only NRGBA colors supported");

        let gray = decoded(1, 1, vec![Color::Gray(0)]);
        assert!(recolor(&gray).is_err());
    }

    #[test]
    fn non_png_argument_is_skipped_without_touching_disk() {
        assert_eq!(process("does/not/exist.jpg").unwrap(), Outcome::NotPng);
    }

    proptest! {
        #[test]
        fn recolor_rule(red: u8, green: u8, blue: u8, alpha: u8) {
            let pixel = Pixel::new(red, green, blue, alpha);
            let out = recolor_pixel(pixel);
            if red == 0 && green == 0 && blue == 0 {
                prop_assert_eq!(out, Pixel::new(0, 255, 255, alpha));
            } else {
                prop_assert_eq!(out, pixel);
            }
        }
    }
}
