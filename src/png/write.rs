use std::io::{BufWriter, Write};
use anyhow::Context;
use byteorder::{BigEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use log::debug;

use crate::png::chunk::write_chunk;
use crate::png::constants::*;
use crate::png::error::{PngError, Result};
use crate::png::optimization::choose_best_filter;
use crate::png::types::*;

impl NrgbaImage {
    /// Creates (or truncates) `path` and writes the image to it.
    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let file = std::fs::File::create(path).with_context(|| format!("Could not create file {}", path))?;
        let mut writer = BufWriter::new(file);
        self.encode(&mut writer).with_context(|| format!("Could not encode image {}", path))?;
        writer.flush().with_context(|| format!("Could not write file {}", path))?;
        debug!("wrote {}", path);
        Ok(())
    }

    /// Encodes as 8-bit truecolor when every pixel is opaque, 8-bit
    /// truecolor with alpha otherwise.
    pub fn encode(&self, writer: &mut impl Write) -> Result<()> {
        let width = self.bounds.width() as usize;
        let height = self.bounds.height() as usize;
        if width == 0 || height == 0 {
            return Err(PngError::Format("invalid image size"));
        }

        let (color_type, bytes_per_pixel) = if self.is_opaque() {
            (2u8, 3usize) // RGB
        } else {
            (6u8, 4usize) // RGBA
        };

        let image_data: Vec<u8> = if bytes_per_pixel == 4 {
            self.rgba.clone()
        } else {
            self.rgba.chunks_exact(4).flat_map(|pixel| [pixel[0], pixel[1], pixel[2]]).collect()
        };

        let row_bytes = width * bytes_per_pixel;
        let mut filtered = Vec::with_capacity(height * (1 + row_bytes));
        for row in 0..height {
            let row_start = row * row_bytes;
            let row_data = &image_data[row_start..row_start + row_bytes];

            let prev_row = if row == 0 {
                None
            } else {
                let prev_start = (row - 1) * row_bytes;
                Some(&image_data[prev_start..prev_start + row_bytes])
            };

            let (filter_type, filtered_row) = choose_best_filter(row_data, prev_row, bytes_per_pixel);
            filtered.push(filter_type);
            filtered.extend_from_slice(&filtered_row);
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&filtered)?;
        let compressed = encoder.finish()?;

        writer.write_all(&PNG_SIG)?;

        let mut ihdr_data = Vec::with_capacity(IHDR_LENGTH);
        ihdr_data.write_u32::<BigEndian>(self.bounds.width())?;
        ihdr_data.write_u32::<BigEndian>(self.bounds.height())?;
        ihdr_data.write_u8(8)?; // bit_depth
        ihdr_data.write_u8(color_type)?;
        ihdr_data.write_u8(0)?; // compression
        ihdr_data.write_u8(0)?; // filter
        ihdr_data.write_u8(0)?; // interlace
        write_chunk(writer, &IHDR, &ihdr_data)?;

        write_chunk(writer, &IDAT, &compressed)?;
        write_chunk(writer, &IEND, &[])?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(img: &NrgbaImage) -> Vec<u8> {
        let mut out = Vec::new();
        img.encode(&mut out).unwrap();
        out
    }

    fn gradient(width: u32, height: u32, alpha: impl Fn(u32, u32) -> u8) -> NrgbaImage {
        let mut img = NrgbaImage::new(Bounds::from_size(width, height));
        for y in 0..height {
            for x in 0..width {
                img.set(x, y, Pixel::new((x * 17) as u8, (y * 31) as u8, (x ^ y) as u8, alpha(x, y)));
            }
        }
        img
    }

    #[test]
    fn opaque_image_is_written_as_rgb() {
        let img = gradient(7, 5, |_, _| 255);
        let bytes = encode(&img);
        // color type lives at offset 8 (sig) + 8 (length, type) + 9
        assert_eq!(bytes[25], 2);

        let decoded = DecodedPng::decode(&bytes).unwrap();
        assert_eq!(decoded.bounds(), img.bounds);
        for y in 0..5 {
            for x in 0..7 {
                assert_eq!(decoded.at(x, y), Color::Rgba(img.get(x, y)));
            }
        }
    }

    #[test]
    fn translucent_image_keeps_exact_channels() {
        let img = gradient(6, 4, |x, y| (x * 40 + y) as u8);
        let bytes = encode(&img);
        assert_eq!(bytes[25], 6);

        let decoded = DecodedPng::decode(&bytes).unwrap();
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(decoded.at(x, y), Color::Nrgba(img.get(x, y)));
            }
        }
    }

    #[test]
    fn fully_transparent_pixels_keep_their_color() {
        let mut img = NrgbaImage::new(Bounds::from_size(1, 1));
        img.set(0, 0, Pixel::new(0, 255, 255, 0));
        let decoded = DecodedPng::decode(&encode(&img)).unwrap();
        assert_eq!(decoded.at(0, 0), Color::Nrgba(Pixel::new(0, 255, 255, 0)));
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = NrgbaImage::new(Bounds::from_size(0, 3));
        let mut out = Vec::new();
        assert!(matches!(img.encode(&mut out), Err(PngError::Format("invalid image size"))));
        assert!(out.is_empty());
    }
}
