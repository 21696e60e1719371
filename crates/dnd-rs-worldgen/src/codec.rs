//! Binary encoding of a [`World`] for the persistent cache.
//!
//! Layout (all integers little-endian), DEFLATE-compressed as a whole:
//!
//! ```text
//! [magic "DNDW"][version:u8]
//! [seed:i64][width:u32][height:u32]
//! [heightmap: f64 bits as u64 x W*H]
//! [biomes: u8 id x W*H]
//! [rivers: packed bits, LSB-first][roads: packed bits, LSB-first]
//! [location_count:u32] { [x:u32][y:u32][kind:u8][name_len:u16][name:utf8] }*
//! ```
//!
//! Heights are stored as raw bits so a decoded world is bit-identical.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::biome::Biome;
use crate::error::CodecError;
use crate::grid::Grid;
use crate::poi::PoiKind;
use crate::world::{Location, Locations, World};

const MAGIC: &[u8; 4] = b"DNDW";

/// Current world format version.
pub const FORMAT_VERSION: u8 = 1;

/// DEFLATE level used for cache blobs.
const COMPRESSION_LEVEL: u32 = 6;

/// Largest decompressed blob accepted, enough for a 4096x4096 world.
pub const MAX_RAW_LEN: usize = 4096 * 4096 * 10 + (1 << 20);

/// Encode and compress a world.
pub fn encode_world(world: &World) -> Result<Vec<u8>, CodecError> {
    let raw = encode_raw(world);
    if raw.len() > MAX_RAW_LEN {
        return Err(CodecError::Compress(format!(
            "encoded world is {} bytes, limit is {MAX_RAW_LEN}",
            raw.len()
        )));
    }
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    encoder
        .write_all(&raw)
        .map_err(|e| CodecError::Compress(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CodecError::Compress(e.to_string()))
}

/// Decompress and decode a world.
pub fn decode_world(data: &[u8]) -> Result<World, CodecError> {
    decode_raw(&inflate(data, MAX_RAW_LEN)?)
}

/// Decompress at most `limit` bytes; anything longer is rejected.
fn inflate(data: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
    let mut decoder = DeflateDecoder::new(data).take(limit as u64 + 1);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| CodecError::Decompress(e.to_string()))?;
    if raw.len() > limit {
        return Err(CodecError::Decompress(format!(
            "decompressed data exceeds {limit} bytes"
        )));
    }
    Ok(raw)
}

fn encode_raw(world: &World) -> Vec<u8> {
    let cells = world.width * world.height;
    let mut buf = BytesMut::with_capacity(21 + cells * 9 + cells.div_ceil(4));

    buf.put_slice(MAGIC);
    buf.put_u8(FORMAT_VERSION);
    buf.put_i64_le(world.seed);
    buf.put_u32_le(world.width as u32);
    buf.put_u32_le(world.height as u32);

    for &h in world.heightmap.cells() {
        buf.put_u64_le(h.to_bits());
    }
    for &b in world.biomes.cells() {
        buf.put_u8(b.id());
    }
    put_bits(&mut buf, world.rivers.cells());
    put_bits(&mut buf, world.roads.cells());

    buf.put_u32_le(world.locations.len() as u32);
    for loc in world.locations.iter() {
        buf.put_u32_le(loc.x as u32);
        buf.put_u32_le(loc.y as u32);
        buf.put_u8(loc.kind.id());
        let name = loc.name.as_bytes();
        let len = name.len().min(u16::MAX as usize);
        buf.put_u16_le(len as u16);
        buf.put_slice(&name[..len]);
    }

    buf.to_vec()
}

/// Pack booleans into bytes, 8 per byte, least significant bit first.
fn put_bits(buf: &mut BytesMut, bits: &[bool]) {
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (slot, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 1 << slot;
            }
        }
        buf.put_u8(byte);
    }
}

fn ensure(buf: &impl Buf, needed: usize) -> Result<(), CodecError> {
    if buf.remaining() < needed {
        return Err(CodecError::UnexpectedEof {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

fn get_bits(buf: &mut &[u8], count: usize) -> Result<Vec<bool>, CodecError> {
    let bytes = count.div_ceil(8);
    ensure(&*buf, bytes)?;
    let mut bits = Vec::with_capacity(count);
    for _ in 0..bytes {
        let byte = buf.get_u8();
        for slot in 0..8 {
            if bits.len() < count {
                bits.push(byte & (1 << slot) != 0);
            }
        }
    }
    Ok(bits)
}

fn decode_raw(data: &[u8]) -> Result<World, CodecError> {
    let mut buf = data;

    ensure(&buf, 5)?;
    if &buf[..4] != MAGIC {
        return Err(CodecError::BadMagic);
    }
    buf.advance(4);
    let version = buf.get_u8();
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    ensure(&buf, 16)?;
    let seed = buf.get_i64_le();
    let width_raw = buf.get_u32_le();
    let height_raw = buf.get_u32_le();
    let bad_dims = || CodecError::BadDimensions {
        width: width_raw,
        height: height_raw,
    };
    if width_raw == 0 || height_raw == 0 {
        return Err(bad_dims());
    }
    let (width, height) = (width_raw as usize, height_raw as usize);
    let cells = width.checked_mul(height).ok_or_else(bad_dims)?;

    // Check the fixed-size part up front so a corrupt header cannot trigger
    // a huge allocation.
    let grid_bytes = cells
        .checked_mul(9)
        .and_then(|n| n.checked_add(2 * cells.div_ceil(8)))
        .ok_or_else(bad_dims)?;
    ensure(&buf, grid_bytes)?;

    let heights: Vec<f64> = (0..cells).map(|_| f64::from_bits(buf.get_u64_le())).collect();
    let biome_cells = (0..cells)
        .map(|_| {
            let id = buf.get_u8();
            Biome::from_id(id).ok_or(CodecError::UnknownBiome(id))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let river_cells = get_bits(&mut buf, cells)?;
    let road_cells = get_bits(&mut buf, cells)?;

    ensure(&buf, 4)?;
    let count = buf.get_u32_le() as usize;
    let mut locations = Locations::new();
    for _ in 0..count {
        ensure(&buf, 11)?;
        let x = buf.get_u32_le();
        let y = buf.get_u32_le();
        let kind_id = buf.get_u8();
        let kind = PoiKind::from_id(kind_id).ok_or(CodecError::UnknownPoiKind(kind_id))?;
        let name_len = buf.get_u16_le() as usize;
        ensure(&buf, name_len)?;
        let name = std::str::from_utf8(&buf[..name_len])
            .map_err(|_| CodecError::InvalidUtf8)?
            .to_string();
        buf.advance(name_len);

        if x >= width_raw || y >= height_raw {
            return Err(CodecError::LocationOutOfBounds {
                x,
                y,
                width: width_raw,
                height: height_raw,
            });
        }
        locations.insert(Location {
            x: x as usize,
            y: y as usize,
            kind,
            name,
        });
    }

    if buf.has_remaining() {
        return Err(CodecError::TrailingBytes(buf.remaining()));
    }

    Ok(World {
        width,
        height,
        seed,
        heightmap: Grid::from_cells(width, height, heights).ok_or_else(bad_dims)?,
        biomes: Grid::from_cells(width, height, biome_cells).ok_or_else(bad_dims)?,
        rivers: Grid::from_cells(width, height, river_cells).ok_or_else(bad_dims)?,
        roads: Grid::from_cells(width, height, road_cells).ok_or_else(bad_dims)?,
        locations,
    })
}
