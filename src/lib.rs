//! Recolors pure black pixels in PNG images to cyan.
//!
//! [`png`] is a small PNG codec that keeps track of the color model each
//! pixel was decoded in; [`recolor`] implements the per-file conversion and
//! the argument loop used by the `pngblue` binary.

pub mod png;
pub mod recolor;

pub use recolor::{process, run, Outcome, Summary};
