//! Raw Register Dump Parser
//!
//! Parses raw sequences of PSG register writes.
//! Each frame is 16 bytes representing registers R0-R15; R14/R15 are the
//! I/O ports and are dropped.

use super::{FrameTable, RegisterFrame, NUM_REGISTERS};
use crate::{Result, StreamError};

/// Bytes per frame in a raw dump
pub const RAW_FRAME_SIZE: usize = 16;

/// Raw Register Dump Parser
pub struct RawParser;

impl RawParser {
    /// Parse raw register frames
    /// Expects data as a sequence of 16-byte register frames
    pub fn parse_frames(data: &[u8]) -> Result<FrameTable> {
        if data.len() % RAW_FRAME_SIZE != 0 {
            return Err(StreamError::parse(
                0,
                format!(
                    "data length {} is not a multiple of {RAW_FRAME_SIZE} (expected register frames)",
                    data.len()
                ),
            ));
        }

        let frames = data
            .chunks_exact(RAW_FRAME_SIZE)
            .map(|chunk| {
                let mut regs = [0u8; NUM_REGISTERS];
                regs.copy_from_slice(&chunk[..NUM_REGISTERS]);
                RegisterFrame(regs)
            })
            .collect();

        Ok(FrameTable::new(frames))
    }
}
