// https://www.w3.org/TR/png-3/#5PNG-file-signature
pub const PNG_SIG: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

pub const IHDR: [u8; 4] = *b"IHDR";
pub const PLTE: [u8; 4] = *b"PLTE";
pub const TRNS: [u8; 4] = *b"tRNS";
pub const IDAT: [u8; 4] = *b"IDAT";
pub const IEND: [u8; 4] = *b"IEND";

pub const IHDR_LENGTH: usize = 13;
pub const MAX_CHUNK_LENGTH: u32 = 0x7fff_ffff;
pub const MAX_PALETTE_ENTRIES: usize = 256;
