//! World generation error types.

use thiserror::Error;

/// Errors that make generation impossible.
///
/// Anything short of this degrades instead: sparser POIs, partial rivers or
/// roads. Those show up in the [`GenerationReport`](crate::generator::GenerationReport),
/// not here.
#[derive(Debug, Error)]
pub enum WorldGenError {
    #[error("world dimensions must be positive and fit in memory, got {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors decoding a persisted world blob.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unexpected end of data: need {needed} more bytes, have {remaining}")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid magic bytes")]
    BadMagic,

    #[error("unsupported world format version: {0}")]
    UnsupportedVersion(u8),

    #[error("unknown biome id: {0}")]
    UnknownBiome(u8),

    #[error("unknown POI type id: {0}")]
    UnknownPoiKind(u8),

    #[error("invalid UTF-8 in location name")]
    InvalidUtf8,

    #[error("inconsistent world dimensions: {width}x{height}")]
    BadDimensions { width: u32, height: u32 },

    #[error("location ({x}, {y}) outside {width}x{height} world")]
    LocationOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("{0} trailing bytes after world data")]
    TrailingBytes(usize),

    #[error("compression error: {0}")]
    Compress(String),

    #[error("decompression error: {0}")]
    Decompress(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("storage error: {0}")]
    Db(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
