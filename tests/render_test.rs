use std::fs::{read, File};

use tempfile::tempdir;
use vizion::{models::parse_segmentation, render::write_mask_png};

#[test]
fn writes_decoded_instance_mask_to_disk() {
    let result = parse_segmentation(
        r#"{
            "results": [{
                "prompt": "person",
                "instances": [{
                    "x1": 0.0, "y1": 0.0, "x2": 4.0, "y2": 2.0,
                    "confidence": 0.8,
                    "mask_rle": [0, 3, 5],
                    "mask_height": 2,
                    "mask_width": 4
                }]
            }],
            "decode_ms": 0.0,
            "vision_encode_ms": 0.0,
            "text_encode_ms": 0.0,
            "decode_segment_ms": 0.0
        }"#,
    )
    .unwrap();

    let mask = result.results[0].instances[0].decode_mask().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("person_0.png");
    write_mask_png(&mask, File::create(&path).unwrap()).unwrap();

    let bytes = read(&path).unwrap();
    let mut reader = png::Decoder::new(bytes.as_slice()).read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();

    assert_eq!((info.width, info.height), (4, 2));
    assert_eq!(
        &buf[..info.buffer_size()],
        &[255, 255, 255, 0, 0, 0, 0, 0]
    );
}
