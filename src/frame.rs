//! Binary request frames for the segmentation socket.
//!
//! A segment request is `u32` little-endian header length, the JSON
//! header, then the raw JPEG bytes. The depth model takes bare JPEG bytes
//! with no framing.

use serde::{Deserialize, Serialize};
use serde_json::{from_slice, to_vec};

use crate::error::{Error, Result};

/// Text message that stops the worker behind a session.
pub const SHUTDOWN_COMMAND: &str = "shutdown";

const LENGTH_PREFIX: usize = std::mem::size_of::<u32>();

fn default_threshold() -> f32 {
    0.5
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SegmentRequest {
    pub prompts: Vec<String>,
    #[serde(default = "default_threshold")]
    pub score_threshold: f32,
    #[serde(default = "default_threshold")]
    pub mask_threshold: f32,
}

impl SegmentRequest {
    pub fn new<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prompts: prompts.into_iter().map(Into::into).collect(),
            score_threshold: default_threshold(),
            mask_threshold: default_threshold(),
        }
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_mask_threshold(mut self, threshold: f32) -> Self {
        self.mask_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompts.is_empty() {
            return Err(Error::Frame("at least one prompt is required".into()));
        }
        for (name, value) in [
            ("score_threshold", self.score_threshold),
            ("mask_threshold", self.mask_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Frame(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

pub fn encode_segment_frame(request: &SegmentRequest, jpeg: &[u8]) -> Result<Vec<u8>> {
    request.validate()?;
    let header = to_vec(request)?;
    let length = u32::try_from(header.len())
        .map_err(|_| Error::Frame(format!("header too large: {} bytes", header.len())))?;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX + header.len() + jpeg.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&header);
    frame.extend_from_slice(jpeg);
    Ok(frame)
}

/// Splits a frame back into its request header and JPEG payload.
pub fn decode_segment_frame(frame: &[u8]) -> Result<(SegmentRequest, &[u8])> {
    if frame.len() < LENGTH_PREFIX {
        return Err(Error::Frame(format!(
            "frame of {} bytes is shorter than the length prefix",
            frame.len()
        )));
    }
    let (prefix, rest) = frame.split_at(LENGTH_PREFIX);
    let length = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    if rest.len() < length {
        return Err(Error::Frame(format!(
            "header declares {length} bytes, only {} available",
            rest.len()
        )));
    }
    let (header, jpeg) = rest.split_at(length);
    let request: SegmentRequest = from_slice(header)?;
    request.validate()?;
    Ok((request, jpeg))
}
