//! Compact, checksummed text encoding for answer windows.
//!
//! Layout before base-64:
//!
//! ```text
//! [2B checksum][2B bit count][1B 0x00][packed bits, MSB first, zero padded]
//! ```
//!
//! The checksum is the low 16 bits of a CRC-32 over everything after it,
//! XORed with a per-field key so that a blob copied from one field into the
//! other fails verification. It catches corruption and casual edits, nothing
//! more.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::error::{StudyError, StudyResult};
use crate::window::BoundedWindow;

/// Checksum key for the accuracy window blob.
pub const ACCURACY_KEY: u16 = 0x55AA;
/// Checksum key for the streak window blob.
pub const STREAK_KEY: u16 = 0xAA55;

const CHECKSUM_LEN: usize = 2;
const HEADER_LEN: usize = CHECKSUM_LEN + 2 + 1;
const MAX_BITS: usize = u16::MAX as usize;

fn checksum(data: &[u8], key: u16) -> u16 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    (crc.sum() & 0xFFFF) as u16 ^ key
}

/// Encode oldest-first outcomes. An empty sequence encodes to `""`.
///
/// The length field is 16 bits wide; longer input keeps its newest 65535
/// entries.
pub fn encode<I>(outcomes: I, key: u16) -> String
where
    I: IntoIterator<Item = bool>,
{
    let mut bits: Vec<bool> = outcomes.into_iter().collect();
    if bits.is_empty() {
        return String::new();
    }
    if bits.len() > MAX_BITS {
        bits.drain(..bits.len() - MAX_BITS);
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + bits.len().div_ceil(8));
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(&(bits.len() as u16).to_be_bytes());
    buf.push(0);
    for chunk in bits.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << (7 - i)));
        buf.push(byte);
    }

    let sum = checksum(&buf[CHECKSUM_LEN..], key);
    buf[..CHECKSUM_LEN].copy_from_slice(&sum.to_be_bytes());
    STANDARD.encode(&buf)
}

/// Decode and verify a blob, returning every stored outcome oldest-first.
pub fn decode_outcomes(blob: &str, key: u16) -> StudyResult<Vec<bool>> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = STANDARD
        .decode(blob)
        .map_err(|e| StudyError::Decode(format!("invalid base64: {e}")))?;
    if bytes.len() < HEADER_LEN {
        return Err(StudyError::Decode(format!(
            "blob is {} bytes, header needs {HEADER_LEN}",
            bytes.len()
        )));
    }

    let (head, body) = bytes.split_at(CHECKSUM_LEN);
    let stored = u16::from_be_bytes([head[0], head[1]]);
    let computed = checksum(body, key);
    if stored != computed {
        return Err(StudyError::Integrity { stored, computed });
    }

    // body[2] is the separator; it is covered by the checksum but not checked.
    let len = u16::from_be_bytes([body[0], body[1]]) as usize;
    let packed = &body[3..];
    if len > packed.len() * 8 {
        return Err(StudyError::Decode(format!(
            "blob claims {len} entries but carries {} bits",
            packed.len() * 8
        )));
    }

    Ok((0..len)
        .map(|i| packed[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect())
}

/// Decode a blob into a window of `capacity`, keeping the newest entries
/// when the blob holds more than fit.
pub fn decode(blob: &str, key: u16, capacity: usize) -> StudyResult<BoundedWindow> {
    let outcomes = decode_outcomes(blob, key)?;
    if outcomes.len() > capacity {
        debug!(
            stored = outcomes.len(),
            capacity, "window blob longer than capacity, dropping oldest entries"
        );
    }
    Ok(BoundedWindow::from_outcomes(outcomes, capacity))
}
