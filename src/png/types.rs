#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Grayscale,
    Truecolor,
    IndexedColor,
    GrayscaleAlpha,
    TruecolorAlpha,
    Unknown,
}

impl ImageType {
    /// Samples per pixel, one for indexed images.
    pub fn channels(self) -> usize {
        match self {
            ImageType::Grayscale | ImageType::IndexedColor => 1,
            ImageType::GrayscaleAlpha => 2,
            ImageType::Truecolor => 3,
            ImageType::TruecolorAlpha => 4,
            ImageType::Unknown => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PngInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlace: u8,
    pub image_type: ImageType,
}

impl PngInfo {
    pub fn bits_per_pixel(&self) -> usize {
        self.image_type.channels() * self.bit_depth as usize
    }

    /// Distance in bytes to the corresponding byte of the previous pixel,
    /// as used by the Sub, Average and Paeth filters.
    pub fn filter_stride(&self) -> usize {
        self.bits_per_pixel().div_ceil(8).max(1)
    }

    /// Bytes in one row of `width` pixels, excluding the filter byte.
    pub fn row_bytes(&self, width: usize) -> usize {
        (width * self.bits_per_pixel()).div_ceil(8)
    }
}

/// Non-premultiplied 8-bit RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Pixel {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self { red, green, blue, alpha }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel16 {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub alpha: u16,
}

/// A pixel value tagged with the color model it was decoded in.
///
/// `Rgba` and `Rgba64` values are alpha-premultiplied. PNG only produces them
/// for opaque pixels, so the channel values match the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Gray(u8),
    Gray16(u16),
    Rgba(Pixel),
    Rgba64(Pixel16),
    Nrgba(Pixel),
    Nrgba64(Pixel16),
}

/// Pixel rectangle, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Bounds {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { min_x: 0, min_y: 0, max_x: width, max_y: height }
    }

    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..self.max_x).contains(&x) && (self.min_y..self.max_y).contains(&y)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y - self.min_y) as usize * self.width() as usize + (x - self.min_x) as usize
    }
}

#[derive(Debug, Clone)]
pub enum Pixels {
    Direct(Vec<Color>),
    /// Palette always holds 256 entries; indices past the PLTE entries read
    /// as opaque black.
    Paletted { indices: Vec<u8>, palette: Vec<Color> },
}

#[derive(Debug, Clone)]
pub struct DecodedPng {
    pub info: PngInfo,
    pub pixels: Pixels,
}

impl DecodedPng {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_size(self.info.width, self.info.height)
    }

    /// Color at `(x, y)`. Coordinates must lie inside [`Self::bounds`].
    pub fn at(&self, x: u32, y: u32) -> Color {
        debug_assert!(self.bounds().contains(x, y));
        let i = self.bounds().offset(x, y);
        match &self.pixels {
            Pixels::Direct(colors) => colors[i],
            Pixels::Paletted { indices, palette } => palette[indices[i] as usize],
        }
    }
}

/// Freshly allocated non-premultiplied RGBA grid, the recolor output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NrgbaImage {
    pub bounds: Bounds,
    pub rgba: Vec<u8>,
}

impl NrgbaImage {
    /// All pixels start as transparent black.
    pub fn new(bounds: Bounds) -> Self {
        let len = bounds.width() as usize * bounds.height() as usize * 4;
        Self { bounds, rgba: vec![0; len] }
    }

    pub fn get(&self, x: u32, y: u32) -> Pixel {
        let base = self.bounds.offset(x, y) * 4;
        Pixel {
            red: self.rgba[base],
            green: self.rgba[base + 1],
            blue: self.rgba[base + 2],
            alpha: self.rgba[base + 3],
        }
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) {
        let base = self.bounds.offset(x, y) * 4;
        self.rgba[base..base + 4].copy_from_slice(&[pixel.red, pixel.green, pixel.blue, pixel.alpha]);
    }

    pub fn is_opaque(&self) -> bool {
        self.rgba.chunks_exact(4).all(|pixel| pixel[3] == 255)
    }
}
