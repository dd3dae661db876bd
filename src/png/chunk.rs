use std::io::{self, Read, Write};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use crate::png::constants::*;
use crate::png::error::{PngError, Result};
use crate::png::ImageType;

pub struct Chunk {
    pub chunk_type: [u8; 4],
    pub data: Vec<u8>,
}

fn crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

pub fn write_chunk(writer: &mut impl Write, chunk_type: &[u8; 4], data: &[u8]) -> Result<()> {
    let length = u32::try_from(data.len())
        .ok()
        .filter(|&length| length <= MAX_CHUNK_LENGTH)
        .ok_or(PngError::Format("chunk too large"))?;

    writer.write_u32::<BigEndian>(length)?;
    writer.write_all(chunk_type)?;
    writer.write_all(data)?;
    writer.write_u32::<BigEndian>(crc(chunk_type, data))?;

    Ok(())
}

/// Reads one chunk and verifies its CRC.
pub fn read_chunk(reader: &mut impl Read) -> Result<Chunk> {
    let length = reader.read_u32::<BigEndian>().map_err(eof)?;
    if length > MAX_CHUNK_LENGTH {
        return Err(PngError::Format("bad chunk length"));
    }

    let mut chunk_type = [0u8; 4];
    reader.read_exact(&mut chunk_type).map_err(eof)?;

    let mut data = Vec::new();
    reader.by_ref().take(length as u64).read_to_end(&mut data)?;
    if data.len() != length as usize {
        return Err(PngError::Format("unexpected EOF"));
    }

    let expected = reader.read_u32::<BigEndian>().map_err(eof)?;
    if crc(&chunk_type, &data) != expected {
        return Err(PngError::Format("invalid checksum"));
    }

    Ok(Chunk { chunk_type, data })
}

fn eof(e: io::Error) -> PngError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        PngError::Format("unexpected EOF")
    } else {
        PngError::Io(e)
    }
}

pub fn parse_image_type(color_type: u8, bit_depth: u8) -> ImageType {
    match (color_type, bit_depth) {
        (0, 1 | 2 | 4 | 8 | 16) => ImageType::Grayscale,
        (2, 8 | 16) => ImageType::Truecolor,
        (3, 1 | 2 | 4 | 8) => ImageType::IndexedColor,
        (4, 8 | 16) => ImageType::GrayscaleAlpha,
        (6, 8 | 16) => ImageType::TruecolorAlpha,
        _ => ImageType::Unknown,
    }
}
