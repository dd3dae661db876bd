pub mod types;
pub mod constants;
pub mod error;
pub mod read;
pub mod write;
pub mod filter;
pub mod chunk;
pub mod interlace;
pub mod optimization;

pub use types::*;
pub use constants::*;
pub use error::PngError;
