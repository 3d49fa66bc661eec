//! Client-side building blocks for a real-time segmentation service:
//! response models, request frames, and decoders for run-length masks and
//! depth maps.

pub mod api;
pub mod depth;
pub mod error;
pub mod frame;
pub mod mask;
pub mod models;
pub mod render;

pub use error::{Error, MaskError, Result};
pub use mask::{decode, decode_with_order, encode, DecodedMask, RunLengthMask, ScanOrder};
pub use models::{Detection, Instance, SegmentationResult};
