use serde::{Deserialize, Serialize};
use serde_json::from_str;
use serde_with::{
    base64::{Base64, Standard},
    formats::Padded,
    serde_as,
};

use crate::{
    depth::{decode_depth, DepthMap},
    error::{MaskError, Result},
    mask::{decode_with_order, DecodedMask, RunLengthMask, ScanOrder},
};

/// A single detected object with its box and encoded mask.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Instance {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
    pub mask_rle: Vec<i64>,
    pub mask_height: i64,
    pub mask_width: i64,
}

impl Instance {
    pub fn run_length_mask(&self) -> RunLengthMask<'_> {
        RunLengthMask::new(&self.mask_rle, self.mask_height, self.mask_width)
    }

    /// Decodes the mask on demand. Nothing is cached on the instance.
    pub fn decode_mask(&self) -> std::result::Result<DecodedMask, MaskError> {
        self.decode_mask_with_order(ScanOrder::RowMajor)
    }

    pub fn decode_mask_with_order(
        &self,
        order: ScanOrder,
    ) -> std::result::Result<DecodedMask, MaskError> {
        decode_with_order(&self.mask_rle, self.mask_height, self.mask_width, order)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Results for one text prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    pub prompt: String,
    pub instances: Vec<Instance>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SegmentationResult {
    pub results: Vec<Detection>,
    pub decode_ms: f64,
    pub vision_encode_ms: f64,
    pub text_encode_ms: f64,
    pub decode_segment_ms: f64,
}

impl SegmentationResult {
    pub fn detection(&self, prompt: &str) -> Option<&Detection> {
        self.results
            .iter()
            .find(|detection| detection.prompt == prompt)
    }

    pub fn instance_count(&self) -> usize {
        self.results
            .iter()
            .map(|detection| detection.instances.len())
            .sum()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelsResponse {
    pub cost_per_second_cents: f64,
    pub models: Vec<ModelInfo>,
}

/// Response of the depth model. The map travels as a 16-bit grayscale PNG
/// normalised over `depth_min..=depth_max`.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DepthResult {
    #[serde(rename = "depth_png_b64")]
    #[serde_as(as = "Base64<Standard, Padded>")]
    pub depth_png: Vec<u8>,
    pub depth_min: f32,
    pub depth_max: f32,
    pub height: usize,
    pub width: usize,
    pub decode_ms: f64,
    pub inference_ms: f64,
    pub encode_ms: f64,
}

impl DepthResult {
    /// Decodes the PNG into metric depth, checking it against the declared size.
    pub fn decode_depth(&self) -> Result<DepthMap> {
        let map = decode_depth(&self.depth_png, self.depth_min, self.depth_max)?;
        map.expect_dimensions(self.height, self.width)?;
        Ok(map)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub model: String,
    pub status: String,
    pub started_at: String,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub credits_used: Option<i64>,
}

pub fn parse_segmentation(text: &str) -> Result<SegmentationResult> {
    Ok(from_str(text)?)
}

pub fn parse_depth(text: &str) -> Result<DepthResult> {
    Ok(from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "results": [
            {
                "prompt": "person",
                "instances": [
                    {
                        "x1": 1.0, "y1": 0.0, "x2": 3.0, "y2": 1.0,
                        "confidence": 0.92,
                        "mask_rle": [1, 2, 3],
                        "mask_height": 2,
                        "mask_width": 3
                    }
                ]
            },
            { "prompt": "car", "instances": [] }
        ],
        "decode_ms": 1.5,
        "vision_encode_ms": 10.0,
        "text_encode_ms": 2.0,
        "decode_segment_ms": 4.25
    }"#;

    #[test]
    fn parses_segmentation_response() {
        let result = parse_segmentation(RESPONSE).unwrap();
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.instance_count(), 1);
        assert!(result.detection("car").unwrap().instances.is_empty());
        assert!(result.detection("dog").is_none());

        let instance = &result.detection("person").unwrap().instances[0];
        assert_eq!(instance.width(), 2.0);
        assert_eq!(instance.height(), 1.0);
        assert_eq!(
            instance.decode_mask().unwrap().to_rows(),
            vec![vec![false, true, true], vec![false, false, false]]
        );
    }

    #[test]
    fn decode_mask_surfaces_malformed_payload() {
        let mut result = parse_segmentation(RESPONSE).unwrap();
        let instance = &mut result.results[0].instances[0];
        instance.mask_rle = vec![1, 10];
        assert!(matches!(
            instance.decode_mask(),
            Err(MaskError::MalformedRunLength { .. })
        ));
    }

    #[test]
    fn run_length_view_decodes_like_instance() {
        let result = parse_segmentation(RESPONSE).unwrap();
        let instance = &result.results[0].instances[0];
        let view = instance.run_length_mask();
        assert_eq!(view.encoded, &[1, 2, 3]);
        assert_eq!(view.decode(), instance.decode_mask());
        assert_eq!(
            view.decode_with_order(ScanOrder::ColumnMajor),
            instance.decode_mask_with_order(ScanOrder::ColumnMajor)
        );
        // columns: [f, t], [t, f], [f, f]
        assert_eq!(
            view.decode_with_order(ScanOrder::ColumnMajor).unwrap().to_rows(),
            vec![vec![false, true, false], vec![true, false, false]]
        );
    }

    #[test]
    fn session_optional_fields_default_to_none() {
        let session: Session = from_str(
            r#"{"id": "s1", "model": "sam3", "status": "running", "started_at": "2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(session.ended_at, None);
        assert_eq!(session.credits_used, None);
    }

    #[test]
    fn parses_models_response() {
        let models: ModelsResponse = from_str(
            r#"{"cost_per_second_cents": 0.05, "models": [{"id": "sam3", "name": "SAM 3", "description": "segmentation"}]}"#,
        )
        .unwrap();
        assert_eq!(models.models[0].id, "sam3");
    }

    #[test]
    fn rejects_invalid_depth_base64() {
        let text = r#"{
            "depth_png_b64": "***",
            "depth_min": 0.0, "depth_max": 1.0,
            "height": 1, "width": 1,
            "decode_ms": 0.0, "inference_ms": 0.0, "encode_ms": 0.0
        }"#;
        assert!(parse_depth(text).is_err());
    }

    #[test]
    fn depth_result_round_trips_through_base64() {
        let result = DepthResult {
            depth_png: crate::depth::tests::depth_png(2, 1, &[0, 65535]),
            depth_min: 1.0,
            depth_max: 3.0,
            height: 1,
            width: 2,
            decode_ms: 0.1,
            inference_ms: 5.0,
            encode_ms: 0.2,
        };
        let text = serde_json::to_string(&result).unwrap();
        assert!(text.contains("depth_png_b64"));

        let parsed = parse_depth(&text).unwrap();
        let map = parsed.decode_depth().unwrap();
        assert_eq!(map.as_slice(), &[1.0, 3.0]);

        let mismatched = DepthResult { height: 2, ..parsed };
        assert!(mismatched.decode_depth().is_err());
    }
}
