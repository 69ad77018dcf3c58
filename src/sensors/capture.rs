//! Notification capture files.
//!
//! One notification per line: a format tag (`cp` for Cycling Power
//! Measurement, `ibd` for Indoor Bike Data) followed by the payload as hex,
//! optionally space separated. Blank lines and `#` comments are skipped.

use crate::sensors::types::FrameFormat;
use std::path::Path;
use thiserror::Error;

/// Errors reading a capture file.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to read capture: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: unknown format tag '{tag}'")]
    UnknownFormat { line: usize, tag: String },

    #[error("Line {line}: invalid hex payload: {source}")]
    InvalidHex {
        line: usize,
        #[source]
        source: hex::FromHexError,
    },
}

/// One captured notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub format: FrameFormat,
    pub data: Vec<u8>,
}

/// Parse one line. Returns `None` for blank and comment lines.
pub fn parse_capture_line(
    line: &str,
    line_no: usize,
) -> Result<Option<CapturedFrame>, CaptureError> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (tag, payload) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let format = match tag.to_ascii_lowercase().as_str() {
        "cp" => FrameFormat::CyclingPower,
        "ibd" => FrameFormat::IndoorBikeData,
        _ => {
            return Err(CaptureError::UnknownFormat {
                line: line_no,
                tag: tag.to_string(),
            })
        }
    };

    let digits: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let data = hex::decode(&digits).map_err(|source| CaptureError::InvalidHex {
        line: line_no,
        source,
    })?;

    Ok(Some(CapturedFrame { format, data }))
}

/// Read every frame from a capture file.
pub fn read_capture(path: &Path) -> Result<Vec<CapturedFrame>, CaptureError> {
    let content = std::fs::read_to_string(path)?;
    let mut frames = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if let Some(frame) = parse_capture_line(line, idx + 1)? {
            frames.push(frame);
        }
    }
    tracing::debug!("Read {} frames from {}", frames.len(), path.display());
    Ok(frames)
}
