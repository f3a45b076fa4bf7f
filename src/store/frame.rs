//! Batch log framing
//!
//! Each committed batch is one frame:
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, includes length and checksum fields)
//! +------------------+
//! | Body             | (JSON array of batch ops)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over length + body)
//! +------------------+
//! ```

use crc32fast::Hasher;

use super::batch::BatchOp;
use super::errors::{StoreError, StoreResult};

const HEADER_LEN: usize = 4;
const CHECKSUM_LEN: usize = 4;
const MIN_FRAME_LEN: usize = HEADER_LEN + CHECKSUM_LEN;

/// Why a frame could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes remain than the frame needs; a torn final write
    Truncated,
    /// The bytes are present but wrong
    Corrupt(String),
}

/// CRC32 (IEEE) over `data`
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Encodes one batch as a frame.
pub fn encode(ops: &[BatchOp]) -> StoreResult<Vec<u8>> {
    let body = serde_json::to_vec(ops)
        .map_err(|e| StoreError::codec(format!("Failed to encode batch: {}", e)))?;

    let frame_len = u32::try_from(MIN_FRAME_LEN + body.len())
        .map_err(|_| StoreError::codec("Batch exceeds maximum frame size"))?;

    let mut frame = Vec::with_capacity(frame_len as usize);
    frame.extend_from_slice(&frame_len.to_le_bytes());
    frame.extend_from_slice(&body);
    let checksum = compute_checksum(&frame);
    frame.extend_from_slice(&checksum.to_le_bytes());
    Ok(frame)
}

/// Decodes the frame at the start of `data`.
///
/// Returns the operations and the number of bytes consumed.
pub fn decode(data: &[u8]) -> Result<(Vec<BatchOp>, usize), FrameError> {
    if data.len() < MIN_FRAME_LEN {
        return Err(FrameError::Truncated);
    }

    let frame_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if frame_len < MIN_FRAME_LEN {
        return Err(FrameError::Corrupt(format!("Invalid frame length: {}", frame_len)));
    }
    if data.len() < frame_len {
        return Err(FrameError::Truncated);
    }

    let checksum_at = frame_len - CHECKSUM_LEN;
    let stored = u32::from_le_bytes([
        data[checksum_at],
        data[checksum_at + 1],
        data[checksum_at + 2],
        data[checksum_at + 3],
    ]);
    let computed = compute_checksum(&data[..checksum_at]);
    if stored != computed {
        return Err(FrameError::Corrupt(format!(
            "Checksum mismatch: stored {:08x}, computed {:08x}",
            stored, computed
        )));
    }

    let ops: Vec<BatchOp> = serde_json::from_slice(&data[HEADER_LEN..checksum_at])
        .map_err(|e| FrameError::Corrupt(format!("Invalid batch body: {}", e)))?;

    Ok((ops, frame_len))
}
