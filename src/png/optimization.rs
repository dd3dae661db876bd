use crate::png::filter::{apply_filter, FILTER_AVERAGE, FILTER_NONE, FILTER_PAETH, FILTER_SUB, FILTER_UP};

pub const FILTERS: [u8; 4] = [FILTER_SUB, FILTER_UP, FILTER_AVERAGE, FILTER_PAETH];

// small residuals near zero compress better, so the sum of their magnitudes is a cheap score
fn score_filtered_row(filtered: &[u8]) -> u64 {
    filtered.iter()
        .map(|&b| (b as i8 as i32).unsigned_abs() as u64)
        .sum()
}

/// Filters `row` with every filter type and keeps the lowest scoring result.
/// Ties keep the earlier filter, so None wins over an equally good Sub.
pub fn choose_best_filter(row: &[u8], prev: Option<&[u8]>, bytes_per_pixel: usize) -> (u8, Vec<u8>) {
    let mut best_filter = FILTER_NONE;
    let mut best_bytes = apply_filter(FILTER_NONE, bytes_per_pixel, row, prev);
    let mut best_score = score_filtered_row(&best_bytes);

    for f in FILTERS {
        let bytes = apply_filter(f, bytes_per_pixel, row, prev);
        let s = score_filtered_row(&bytes);
        if s < best_score {
            best_score = s;
            best_filter = f;
            best_bytes = bytes;
        }
    }

    (best_filter, best_bytes)
}
