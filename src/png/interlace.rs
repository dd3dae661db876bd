//! Adam7 pass geometry.
//!
//! An interlaced image is stored as seven reduced images. Pass `n` holds the
//! pixels at `(x_offset + i * x_step, y_offset + j * y_step)`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    pub x_offset: u32,
    pub y_offset: u32,
    pub x_step: u32,
    pub y_step: u32,
}

pub const ADAM7: [Pass; 7] = [
    Pass { x_offset: 0, y_offset: 0, x_step: 8, y_step: 8 },
    Pass { x_offset: 4, y_offset: 0, x_step: 8, y_step: 8 },
    Pass { x_offset: 0, y_offset: 4, x_step: 4, y_step: 8 },
    Pass { x_offset: 2, y_offset: 0, x_step: 4, y_step: 4 },
    Pass { x_offset: 0, y_offset: 2, x_step: 2, y_step: 4 },
    Pass { x_offset: 1, y_offset: 0, x_step: 2, y_step: 2 },
    Pass { x_offset: 0, y_offset: 1, x_step: 1, y_step: 2 },
];

/// The single pass of a non-interlaced image.
pub const FULL: Pass = Pass { x_offset: 0, y_offset: 0, x_step: 1, y_step: 1 };

impl Pass {
    /// Size of the reduced image this pass covers in a `width` x `height` image.
    pub fn dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let reduce = |full: u32, offset: u32, step: u32| {
            if full > offset { (full - offset).div_ceil(step) } else { 0 }
        };
        (
            reduce(width, self.x_offset, self.x_step),
            reduce(height, self.y_offset, self.y_step),
        )
    }

    /// Position in the full image of pixel `(i, j)` of the reduced image.
    pub fn position(&self, i: u32, j: u32) -> (u32, u32) {
        (self.x_offset + i * self.x_step, self.y_offset + j * self.y_step)
    }
}

pub fn passes(interlace: u8) -> &'static [Pass] {
    if interlace == 1 { &ADAM7 } else { std::slice::from_ref(&FULL) }
}
