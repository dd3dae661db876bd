use crate::png::error::{PngError, Result};

pub const FILTER_NONE: u8 = 0;
pub const FILTER_SUB: u8 = 1;
pub const FILTER_UP: u8 = 2;
pub const FILTER_AVERAGE: u8 = 3;
pub const FILTER_PAETH: u8 = 4;

// Basically the opposite of unfilter_row https://www.w3.org/TR/png-3/#9Filters
pub fn apply_filter(filter_type: u8, bytes_per_pixel: usize, row: &[u8], prev_row: Option<&[u8]>) -> Vec<u8> {
    let prev = prev_row.unwrap_or(&[]);
    let left = |i: usize| if i >= bytes_per_pixel { row[i - bytes_per_pixel] } else { 0 };
    let up = |i: usize| if i < prev.len() { prev[i] } else { 0 };

    match filter_type {
        FILTER_NONE => {
            // Filt(x) = Orig(x)
            row.to_vec()
        },
        FILTER_SUB => {
            // Filt(x) = Orig(x) - Orig(a)
            (0..row.len()).map(|i| row[i].wrapping_sub(left(i))).collect()
        },
        FILTER_UP => {
            // Filt(x) = Orig(x) - Orig(b)
            (0..row.len()).map(|i| row[i].wrapping_sub(up(i))).collect()
        },
        FILTER_AVERAGE => {
            // Filt(x) = Orig(x) - floor((Orig(a) + Orig(b)) / 2)
            (0..row.len())
                .map(|i| {
                    let avg = ((left(i) as u16 + up(i) as u16) / 2) as u8;
                    row[i].wrapping_sub(avg)
                })
                .collect()
        },
        FILTER_PAETH => {
            // Filt(x) = Orig(x) - PaethPredictor(Orig(a), Orig(b), Orig(c))
            (0..row.len())
                .map(|i| {
                    let top_left = if i >= bytes_per_pixel && i < prev.len() { prev[i - bytes_per_pixel] } else { 0 };
                    row[i].wrapping_sub(paeth_predictor(left(i), up(i), top_left))
                })
                .collect()
        },
        _ => unreachable!("encoder only selects filter types 0 through 4"),
    }
}

/// Reverses the filter of one scanline into `dst`. `prev` is the already
/// reconstructed previous row of the same pass, `None` for the first row.
pub fn unfilter_row(filter_type: u8, bytes_per_pixel: usize, src: &[u8], prev: Option<&[u8]>, dst: &mut [u8]) -> Result<()> {
    let up = |i: usize| prev.map_or(0, |p| p[i]);

    match filter_type {
        FILTER_NONE => {
            dst.copy_from_slice(src);
        },
        FILTER_SUB => {
            for i in 0..src.len() {
                let left = if i >= bytes_per_pixel { dst[i - bytes_per_pixel] } else { 0 };
                dst[i] = src[i].wrapping_add(left);
            }
        },
        FILTER_UP => {
            // Recon(x) = Filt(x) + Recon(b)
            for i in 0..src.len() {
                dst[i] = src[i].wrapping_add(up(i));
            }
        },
        FILTER_AVERAGE => {
            // Recon(x) = Filt(x) + floor((Recon(a) + Recon(b)) / 2)
            for i in 0..src.len() {
                let left = if i >= bytes_per_pixel { dst[i - bytes_per_pixel] } else { 0 };
                let avg = ((left as u16 + up(i) as u16) / 2) as u8;
                dst[i] = src[i].wrapping_add(avg);
            }
        },
        FILTER_PAETH => {
            for i in 0..src.len() {
                let left = if i >= bytes_per_pixel { dst[i - bytes_per_pixel] } else { 0 };
                let top_left = if i >= bytes_per_pixel { up(i - bytes_per_pixel) } else { 0 };
                dst[i] = src[i].wrapping_add(paeth_predictor(left, up(i), top_left));
            }
        },
        _ => return Err(PngError::Format("bad filter type")),
    }

    Ok(())
}

fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    //convert to i32 since we may need negatives here for abs
    let a = a as i32;
    let b = b as i32;
    let c = c as i32;

    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}
