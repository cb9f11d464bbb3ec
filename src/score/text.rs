//! Text score parser
//!
//! ```text
//! # comments run to end of line
//! sample_rate 44100
//! frame_rate 50
//! clock_rate 2000000
//! is_ym 1
//! dc_filter_on 1
//! eqp_stereo_on 0
//! volume 0.7
//! pan_a 0.1
//! pan_b 0.5
//! pan_c 0.9
//! frame_data
//! 28 1 0 0 0 0 0 62 15 0 0 0 0 255
//! ```
//!
//! Every row after `frame_data` is one frame of 14 register values (16 are
//! accepted, the trailing port registers are ignored). A negative pan leaves
//! the chip's default in place.

use super::{FrameTable, PlaybackConfig, RegisterFrame, Score, NUM_REGISTERS};
use crate::chip::ChipMode;
use crate::{Result, StreamError};
use std::str::FromStr;

/// Maximum values accepted on a frame row
const MAX_ROW_VALUES: usize = 16;

/// Text score parser
pub struct TextParser;

impl TextParser {
    /// Parse a complete text score
    pub fn parse(input: &str) -> Result<Score> {
        let mut config = PlaybackConfig::default();
        let mut frames = Vec::new();
        let mut in_frames = false;

        for (index, raw_line) in input.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if in_frames {
                frames.push(Self::parse_frame(line, line_no)?);
                continue;
            }

            let mut parts = line.split_whitespace();
            let key = parts.next().unwrap_or("");
            if key == "frame_data" {
                in_frames = true;
                continue;
            }
            let value = parts
                .next()
                .ok_or_else(|| StreamError::parse(line_no, format!("missing value for '{key}'")))?;
            if parts.next().is_some() {
                return Err(StreamError::parse(
                    line_no,
                    format!("unexpected trailing data after '{key} {value}'"),
                ));
            }
            Self::apply_setting(&mut config, key, value, line_no)?;
        }

        if !in_frames {
            log::warn!("Score has no 'frame_data' section");
        }

        Ok(Score::new(config, FrameTable::new(frames)))
    }

    fn apply_setting(
        config: &mut PlaybackConfig,
        key: &str,
        value: &str,
        line: usize,
    ) -> Result<()> {
        match key {
            "sample_rate" => config.sample_rate = parse_value(key, value, line)?,
            "frame_rate" => config.frame_rate = parse_value(key, value, line)?,
            "clock_rate" => config.clock_rate = parse_value(key, value, line)?,
            "is_ym" => config.chip_mode = ChipMode::from_is_ym(parse_flag(key, value, line)?),
            "dc_filter_on" => config.dc_filter_on = parse_flag(key, value, line)?,
            "eqp_stereo_on" => config.stereo_eq_on = parse_flag(key, value, line)?,
            "volume" => config.master_volume = parse_value(key, value, line)?,
            "pan_a" | "pan_b" | "pan_c" => {
                let channel = usize::from(key.as_bytes()[4] - b'a');
                let pan: f32 = parse_value(key, value, line)?;
                config.pan[channel] = if pan < 0.0 { None } else { Some(pan) };
            }
            _ => {
                return Err(StreamError::parse(line, format!("unknown setting '{key}'")));
            }
        }
        Ok(())
    }

    fn parse_frame(line: &str, line_no: usize) -> Result<RegisterFrame> {
        let mut regs = [0u8; NUM_REGISTERS];
        let mut count = 0;
        for token in line.split_whitespace() {
            if count >= MAX_ROW_VALUES {
                return Err(StreamError::parse(
                    line_no,
                    format!("frame row has more than {MAX_ROW_VALUES} values"),
                ));
            }
            let value: u8 = token.parse().map_err(|_| {
                StreamError::parse(
                    line_no,
                    format!("register value '{token}' is not an integer in 0..=255"),
                )
            })?;
            if count < NUM_REGISTERS {
                regs[count] = value;
            }
            count += 1;
        }
        if count < NUM_REGISTERS {
            return Err(StreamError::parse(
                line_no,
                format!("frame row has {count} values, expected {NUM_REGISTERS}"),
            ));
        }
        Ok(RegisterFrame(regs))
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, line: usize) -> Result<T> {
    value
        .parse()
        .map_err(|_| StreamError::parse(line, format!("invalid value '{value}' for '{key}'")))
}

fn parse_flag(key: &str, value: &str, line: usize) -> Result<bool> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(StreamError::parse(
            line,
            format!("'{key}' expects 0 or 1, got '{value}'"),
        )),
    }
}
