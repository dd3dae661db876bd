use std::io::{self, Cursor, Read};
use anyhow::Context;
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use log::debug;

use crate::png::chunk::{parse_image_type, read_chunk};
use crate::png::constants::*;
use crate::png::error::{PngError, Result};
use crate::png::filter::unfilter_row;
use crate::png::interlace::passes;
use crate::png::types::*;

/// Which chunks have been seen so far, in the order the format requires them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Start,
    SeenIhdr,
    SeenPlte,
    SeenTrns,
    SeenIdat,
}

/// tRNS color key for gray and truecolor images, in raw sample values.
/// Images of 8 bits or less only match on the low byte of each key value.
#[derive(Debug, Clone, Copy)]
enum Transparency {
    Gray(u16),
    Rgb(u16, u16, u16),
}

struct Palette {
    colors: Vec<Color>,
    len: usize,
}

const CHUNK_ORDER: PngError = PngError::Format("chunk out of order");

impl DecodedPng {
    pub fn read_from_file(path: &str) -> anyhow::Result<DecodedPng> {
        let mut file = std::fs::File::open(path).with_context(|| format!("Could not open file {}", path))?;

        let mut bytes: Vec<u8> = Vec::new();
        file.read_to_end(&mut bytes).with_context(|| format!("Could not read file {}", path))?;
        drop(file);

        let image = DecodedPng::decode(&bytes).with_context(|| format!("Could not decode image {}", path))?;
        debug!(
            "decoded {}: {}x{}, color type {}, bit depth {}, interlace {}",
            path, image.info.width, image.info.height, image.info.color_type, image.info.bit_depth, image.info.interlace
        );
        Ok(image)
    }

    pub fn decode(bytes: &[u8]) -> Result<DecodedPng> {
        let mut cursor = Cursor::new(bytes);
        let mut signature = [0u8; 8];
        if cursor.read_exact(&mut signature).is_err() || signature != PNG_SIG {
            return Err(PngError::Format("not a PNG file"));
        }

        let mut stage = Stage::Start;
        let mut info: Option<PngInfo> = None;
        let mut palette: Option<Palette> = None;
        let mut transparency: Option<Transparency> = None;
        let mut idat_data: Vec<u8> = Vec::new();
        let mut in_idat_run = false;

        loop {
            let chunk = read_chunk(&mut cursor)?;
            let is_idat = chunk.chunk_type == IDAT;

            match (chunk.chunk_type, info.as_ref()) {
                (IHDR, None) => {
                    info = Some(parse_ihdr(&chunk.data)?);
                    stage = Stage::SeenIhdr;
                },
                (PLTE, Some(info)) => {
                    if stage != Stage::SeenIhdr {
                        return Err(CHUNK_ORDER);
                    }
                    palette = parse_plte(info, &chunk.data)?;
                    stage = Stage::SeenPlte;
                },
                (TRNS, Some(info)) => {
                    let allowed = if info.image_type == ImageType::IndexedColor {
                        stage == Stage::SeenPlte
                    } else {
                        stage == Stage::SeenIhdr || stage == Stage::SeenPlte
                    };
                    if !allowed {
                        return Err(CHUNK_ORDER);
                    }
                    transparency = parse_trns(info, &chunk.data, palette.as_mut())?;
                    stage = Stage::SeenTrns;
                },
                (IDAT, Some(info)) => {
                    if info.image_type == ImageType::IndexedColor && stage == Stage::SeenIhdr {
                        return Err(PngError::Format("missing palette"));
                    }
                    // Only the first run of consecutive IDAT chunks carries the image.
                    if stage < Stage::SeenIdat || in_idat_run {
                        idat_data.extend_from_slice(&chunk.data);
                    }
                    stage = Stage::SeenIdat;
                },
                (IEND, Some(info)) => {
                    if stage != Stage::SeenIdat {
                        return Err(CHUNK_ORDER);
                    }
                    let pixels = decode_pixels(info, &idat_data, palette, transparency)?;
                    return Ok(DecodedPng { info: info.clone(), pixels });
                },
                (IHDR | PLTE | TRNS | IDAT | IEND, _) => return Err(CHUNK_ORDER),
                _ => {
                    // ancillary chunks carry nothing this decoder uses
                },
            }

            in_idat_run = is_idat;
        }
    }
}

fn parse_ihdr(data: &[u8]) -> Result<PngInfo> {
    if data.len() != IHDR_LENGTH {
        return Err(PngError::Format("bad IHDR length"));
    }
    let mut data_cursor = Cursor::new(data);
    let width = data_cursor.read_u32::<BigEndian>()?;
    let height = data_cursor.read_u32::<BigEndian>()?;
    let bit_depth = data_cursor.read_u8()?;
    let color_type = data_cursor.read_u8()?;
    let compression = data_cursor.read_u8()?;
    let filter = data_cursor.read_u8()?;
    let interlace = data_cursor.read_u8()?;

    if compression != 0 {
        return Err(PngError::Unsupported("compression method".into()));
    }
    if filter != 0 {
        return Err(PngError::Unsupported("filter method".into()));
    }
    if interlace > 1 {
        return Err(PngError::Format("invalid interlace method"));
    }
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(PngError::Format("non-positive dimension"));
    }
    let fits = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(8))
        .is_some();
    if !fits {
        return Err(PngError::Unsupported("dimension overflow".into()));
    }

    let image_type = parse_image_type(color_type, bit_depth);
    if image_type == ImageType::Unknown {
        return Err(PngError::Unsupported(format!("bit depth {}, color type {}", bit_depth, color_type)));
    }

    Ok(PngInfo {
        width,
        height,
        bit_depth,
        color_type,
        interlace,
        image_type,
    })
}

/// Builds the palette of an indexed image, padded to 256 opaque black entries.
/// Truecolor images may carry a suggested palette, which is ignored.
fn parse_plte(info: &PngInfo, data: &[u8]) -> Result<Option<Palette>> {
    let entries = data.len() / 3;
    if data.len() % 3 != 0 || entries == 0 || entries > MAX_PALETTE_ENTRIES {
        return Err(PngError::Format("bad PLTE length"));
    }

    match info.image_type {
        ImageType::IndexedColor => {
            if entries > 1 << info.bit_depth {
                return Err(PngError::Format("bad PLTE length"));
            }
            let mut colors: Vec<Color> = data
                .chunks_exact(3)
                .map(|rgb| Color::Rgba(Pixel::new(rgb[0], rgb[1], rgb[2], 255)))
                .collect();
            colors.resize(MAX_PALETTE_ENTRIES, Color::Rgba(Pixel::new(0, 0, 0, 255)));
            Ok(Some(Palette { colors, len: entries }))
        },
        ImageType::Truecolor | ImageType::TruecolorAlpha => Ok(None),
        _ => Err(PngError::Format("PLTE, color type mismatch")),
    }
}

fn parse_trns(info: &PngInfo, data: &[u8], palette: Option<&mut Palette>) -> Result<Option<Transparency>> {
    let be16 = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);

    match info.image_type {
        ImageType::Grayscale => {
            if data.len() != 2 {
                return Err(PngError::Format("bad tRNS length"));
            }
            Ok(Some(Transparency::Gray(be16(0))))
        },
        ImageType::Truecolor => {
            if data.len() != 6 {
                return Err(PngError::Format("bad tRNS length"));
            }
            Ok(Some(Transparency::Rgb(be16(0), be16(2), be16(4))))
        },
        ImageType::IndexedColor => {
            let palette = palette.ok_or(PngError::Format("missing palette"))?;
            if data.len() > palette.len {
                return Err(PngError::Format("bad tRNS length"));
            }
            for (entry, &alpha) in palette.colors.iter_mut().zip(data) {
                if let Color::Rgba(pixel) = *entry {
                    *entry = Color::Nrgba(Pixel { alpha, ..pixel });
                }
            }
            Ok(None)
        },
        _ => Err(PngError::Format("tRNS, color type mismatch")),
    }
}

fn decode_pixels(
    info: &PngInfo,
    idat_data: &[u8],
    palette: Option<Palette>,
    transparency: Option<Transparency>,
) -> Result<Pixels> {
    let pass_sizes: Vec<(u32, u32)> = passes(info.interlace)
        .iter()
        .map(|pass| pass.dimensions(info.width, info.height))
        .collect();

    // 7.3 there is one filter byte per row
    let expected: usize = pass_sizes
        .iter()
        .filter(|&&(w, h)| w > 0 && h > 0)
        .try_fold(0usize, |total, &(w, h)| {
            (h as usize)
                .checked_mul(info.row_bytes(w as usize).checked_add(1)?)
                .and_then(|pass_bytes| total.checked_add(pass_bytes))
        })
        .ok_or_else(|| PngError::Unsupported("dimension overflow".into()))?;

    // one byte past the expected size is enough to tell there is too much
    let mut raw: Vec<u8> = Vec::new();
    ZlibDecoder::new(idat_data)
        .take(expected as u64 + 1)
        .read_to_end(&mut raw)
        .map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => PngError::Format("not enough pixel data"),
            _ => PngError::Format("corrupt zlib stream"),
        })?;
    if raw.len() < expected {
        return Err(PngError::Format("not enough pixel data"));
    }
    if raw.len() > expected {
        return Err(PngError::Format("too much pixel data"));
    }

    let width = info.width as usize;
    let count = width * info.height as usize;
    let mut pixels = match palette {
        Some(palette) if info.image_type == ImageType::IndexedColor => Pixels::Paletted {
            indices: vec![0; count],
            palette: palette.colors,
        },
        _ if info.image_type == ImageType::IndexedColor => return Err(PngError::Format("missing palette")),
        _ => Pixels::Direct(vec![Color::Gray(0); count]),
    };

    let stride = info.filter_stride();
    let mut offset = 0;
    for (pass, &(pass_width, pass_height)) in passes(info.interlace).iter().zip(&pass_sizes) {
        if pass_width == 0 || pass_height == 0 {
            continue;
        }
        let row_bytes = info.row_bytes(pass_width as usize);
        let mut prev = vec![0u8; row_bytes];
        let mut current = vec![0u8; row_bytes];

        for j in 0..pass_height {
            let filter_type = raw[offset];
            let source = &raw[offset + 1..offset + 1 + row_bytes];
            offset += 1 + row_bytes;

            unfilter_row(filter_type, stride, source, (j > 0).then_some(prev.as_slice()), &mut current)?;

            for i in 0..pass_width {
                let (x, y) = pass.position(i, j);
                let idx = y as usize * width + x as usize;
                match &mut pixels {
                    Pixels::Paletted { indices, .. } => {
                        indices[idx] = sample(&current, i as usize, info.bit_depth) as u8;
                    },
                    Pixels::Direct(colors) => {
                        colors[idx] = color_at(info, transparency, &current, i as usize);
                    },
                }
            }

            std::mem::swap(&mut prev, &mut current);
        }
    }

    Ok(pixels)
}

/// Sample number `index` of an unfiltered row, unscaled.
fn sample(row: &[u8], index: usize, bit_depth: u8) -> u16 {
    match bit_depth {
        16 => u16::from_be_bytes([row[index * 2], row[index * 2 + 1]]),
        8 => row[index] as u16,
        depth => {
            let depth = depth as usize;
            let bit = index * depth;
            let shift = 8 - depth - bit % 8;
            ((row[bit / 8] >> shift) & ((1u8 << depth) - 1)) as u16
        },
    }
}

/// Widens a 1, 2, 4 or 8-bit gray sample to the full 8-bit range.
fn scale_gray(value: u16, bit_depth: u8) -> u8 {
    (value * (255 / ((1u16 << bit_depth) - 1))) as u8
}

fn color_at(info: &PngInfo, transparency: Option<Transparency>, row: &[u8], i: usize) -> Color {
    let channels = info.image_type.channels();
    let s = |c: usize| sample(row, i * channels + c, info.bit_depth);
    let wide = info.bit_depth == 16;

    match info.image_type {
        ImageType::Grayscale if wide => {
            let y = s(0);
            match transparency {
                Some(Transparency::Gray(key)) => {
                    let alpha = if y == key { 0 } else { 0xffff };
                    Color::Nrgba64(Pixel16 { red: y, green: y, blue: y, alpha })
                },
                _ => Color::Gray16(y),
            }
        },
        ImageType::Grayscale => {
            let value = s(0);
            let y = scale_gray(value, info.bit_depth);
            match transparency {
                Some(Transparency::Gray(key)) => {
                    let alpha = if value == key & 0xff { 0 } else { 255 };
                    Color::Nrgba(Pixel::new(y, y, y, alpha))
                },
                _ => Color::Gray(y),
            }
        },
        ImageType::Truecolor if wide => {
            let (red, green, blue) = (s(0), s(1), s(2));
            match transparency {
                Some(Transparency::Rgb(r, g, b)) => {
                    let alpha = if (red, green, blue) == (r, g, b) { 0 } else { 0xffff };
                    Color::Nrgba64(Pixel16 { red, green, blue, alpha })
                },
                _ => Color::Rgba64(Pixel16 { red, green, blue, alpha: 0xffff }),
            }
        },
        ImageType::Truecolor => {
            let (red, green, blue) = (s(0), s(1), s(2));
            let pixel = Pixel::new(red as u8, green as u8, blue as u8, 255);
            match transparency {
                Some(Transparency::Rgb(r, g, b)) => {
                    let alpha = if (red, green, blue) == (r & 0xff, g & 0xff, b & 0xff) { 0 } else { 255 };
                    Color::Nrgba(Pixel { alpha, ..pixel })
                },
                _ => Color::Rgba(pixel),
            }
        },
        ImageType::GrayscaleAlpha if wide => {
            let y = s(0);
            Color::Nrgba64(Pixel16 { red: y, green: y, blue: y, alpha: s(1) })
        },
        ImageType::GrayscaleAlpha => {
            let y = s(0) as u8;
            Color::Nrgba(Pixel::new(y, y, y, s(1) as u8))
        },
        ImageType::TruecolorAlpha if wide => {
            Color::Nrgba64(Pixel16 { red: s(0), green: s(1), blue: s(2), alpha: s(3) })
        },
        ImageType::TruecolorAlpha => {
            Color::Nrgba(Pixel::new(s(0) as u8, s(1) as u8, s(2) as u8, s(3) as u8))
        },
        ImageType::IndexedColor | ImageType::Unknown => unreachable!("indexed pixels are stored as palette indices"),
    }
}
