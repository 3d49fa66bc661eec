//! Metric depth maps from the depth model's 16-bit PNG payload.

use png::{BitDepth, ColorType, Decoder};

use crate::error::{Error, Result};

/// Dense row-major depth map in metres.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    height: usize,
    width: usize,
    values: Vec<f32>,
}

impl DepthMap {
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.values[row * self.width + col])
    }

    pub(crate) fn expect_dimensions(&self, height: usize, width: usize) -> Result<()> {
        if self.height != height || self.width != width {
            return Err(Error::DimensionMismatch {
                expected_height: height,
                expected_width: width,
                height: self.height,
                width: self.width,
            });
        }
        Ok(())
    }
}

/// Reverses the service's uint16 normalisation:
/// `v / 65535 * (depth_max - depth_min) + depth_min`.
pub fn decode_depth(png_bytes: &[u8], depth_min: f32, depth_max: f32) -> Result<DepthMap> {
    let decoder = Decoder::new(png_bytes);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    if info.color_type != ColorType::Grayscale || info.bit_depth != BitDepth::Sixteen {
        return Err(Error::UnsupportedImage(format!(
            "depth map must be 16-bit grayscale, got {:?} at {:?}",
            info.color_type, info.bit_depth
        )));
    }

    let (width, height) = (info.width as usize, info.height as usize);
    let bytes = &buf[..info.buffer_size()];
    let range = depth_max - depth_min;

    let mut values = Vec::with_capacity(width * height);
    for row in bytes.chunks_exact(info.line_size) {
        // PNG samples are big-endian
        values.extend(
            row[..width * 2]
                .chunks_exact(2)
                .map(|sample| {
                    let raw = u16::from_be_bytes([sample[0], sample[1]]);
                    raw as f32 / 65535.0 * range + depth_min
                }),
        );
    }

    Ok(DepthMap {
        height,
        width,
        values,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use png::Encoder;

    pub(crate) fn depth_png(width: u32, height: u32, samples: &[u16]) -> Vec<u8> {
        let data: Vec<u8> = samples.iter().flat_map(|v| v.to_be_bytes()).collect();
        let mut out = Vec::new();
        {
            let mut encoder = Encoder::new(&mut out, width, height);
            encoder.set_color(ColorType::Grayscale);
            encoder.set_depth(BitDepth::Sixteen);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&data).unwrap();
            writer.finish().unwrap();
        }
        out
    }

    #[test]
    fn scales_samples_into_range() {
        let png = depth_png(3, 1, &[0, 65535, 32768]);
        let map = decode_depth(&png, 0.5, 10.5).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 1);
        assert_eq!(map.get(0, 0), Some(0.5));
        assert!((map.get(0, 1).unwrap() - 10.5).abs() < 1e-4);
        assert!((map.get(0, 2).unwrap() - 5.5).abs() < 1e-3);
        assert_eq!(map.get(1, 0), None);
    }

    #[test]
    fn rejects_eight_bit_png() {
        let mut out = Vec::new();
        {
            let mut encoder = Encoder::new(&mut out, 1, 1);
            encoder.set_color(ColorType::Grayscale);
            encoder.set_depth(BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[7]).unwrap();
            writer.finish().unwrap();
        }
        assert!(matches!(
            decode_depth(&out, 0.0, 1.0),
            Err(Error::UnsupportedImage(_))
        ));
    }

    #[test]
    fn reports_dimension_mismatch() {
        let map = decode_depth(&depth_png(2, 2, &[0; 4]), 0.0, 1.0).unwrap();
        assert!(map.expect_dimensions(2, 2).is_ok());
        assert!(matches!(
            map.expect_dimensions(3, 2),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
