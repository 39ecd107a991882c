//! Fixed-size tuning record.
//!
//! Layout (little-endian, 24 bytes):
//!
//! | offset | field        | type |
//! |--------|--------------|------|
//! | 0      | magic        | u32  |
//! | 4      | tolerance    | f32  |
//! | 8      | quad_buffer  | u32  |
//! | 12     | peak_buffer  | u32  |
//! | 16     | null_buffer  | u32  |
//! | 20     | checksum     | u32  |
//!
//! The checksum is the wrapping sum of bytes 0..20. Gain is not stored.

use crate::error::ConfigError;
use crate::tuning::TuningParams;

pub const RECORD_MAGIC: u32 = 0xB1A5_C0DE;
pub const RECORD_LEN: usize = 24;
const CHECKSUM_AT: usize = RECORD_LEN - 4;

/// Wrapping sum of all bytes.
pub fn checksum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)))
}

fn word(bytes: &[u8; RECORD_LEN], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

pub fn encode(params: &TuningParams) -> [u8; RECORD_LEN] {
    let mut out = [0u8; RECORD_LEN];
    out[0..4].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
    out[4..8].copy_from_slice(&params.tolerance_v().to_le_bytes());
    out[8..12].copy_from_slice(&params.quad_buffer().to_le_bytes());
    out[12..16].copy_from_slice(&params.peak_buffer().to_le_bytes());
    out[16..20].copy_from_slice(&params.null_buffer().to_le_bytes());
    let sum = checksum(&out[..CHECKSUM_AT]);
    out[CHECKSUM_AT..].copy_from_slice(&sum.to_le_bytes());
    out
}

/// Decode a stored record; `gain` is carried over from the boot defaults.
pub fn decode(bytes: &[u8; RECORD_LEN], gain: u32) -> Result<TuningParams, ConfigError> {
    if u32::from_le_bytes(word(bytes, 0)) != RECORD_MAGIC {
        return Err(ConfigError::NotFound);
    }
    let stored = u32::from_le_bytes(word(bytes, CHECKSUM_AT));
    if checksum(&bytes[..CHECKSUM_AT]) != stored {
        return Err(ConfigError::Corrupt("checksum mismatch"));
    }
    TuningParams::new(
        f32::from_le_bytes(word(bytes, 4)),
        gain,
        u32::from_le_bytes(word(bytes, 8)),
        u32::from_le_bytes(word(bytes, 12)),
        u32::from_le_bytes(word(bytes, 16)),
    )
    .map_err(|_| ConfigError::Corrupt("field out of range"))
}
