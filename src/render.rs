use std::io::Write;

use png::{BitDepth, ColorType, Decoder, Encoder};

use crate::{
    error::{Error, Result},
    mask::DecodedMask,
};

fn png_dimension(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::UnsupportedImage(format!("dimension {value} too large")))
}

/// Writes `mask` as an 8-bit grayscale PNG, foreground at 255.
pub fn write_mask_png<W: Write>(mask: &DecodedMask, writer: W) -> Result<()> {
    let mut encoder = Encoder::new(
        writer,
        png_dimension(mask.width())?,
        png_dimension(mask.height())?,
    );
    encoder.set_color(ColorType::Grayscale);
    encoder.set_depth(BitDepth::Eight);

    let data: Vec<u8> = mask
        .as_slice()
        .iter()
        .map(|&pixel| if pixel { u8::MAX } else { 0 })
        .collect();

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    Ok(())
}

/// Blacks out every pixel of an 8-bit PNG that lies outside `mask`.
///
/// Alpha is cleared as well, so RGBA output is transparent outside the mask.
pub fn apply_mask(png_bytes: &[u8], mask: &DecodedMask) -> Result<Vec<u8>> {
    let decoder = Decoder::new(png_bytes);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    if info.bit_depth != BitDepth::Eight || info.color_type == ColorType::Indexed {
        return Err(Error::UnsupportedImage(format!(
            "expected an 8-bit non-indexed PNG, got {:?} at {:?}",
            info.color_type, info.bit_depth
        )));
    }

    let (width, height) = (info.width as usize, info.height as usize);
    if width != mask.width() || height != mask.height() {
        return Err(Error::DimensionMismatch {
            expected_height: mask.height(),
            expected_width: mask.width(),
            height,
            width,
        });
    }

    let samples = info.color_type.samples();
    let mut image = Vec::with_capacity(width * height * samples);
    for (line, keep) in buf[..info.buffer_size()]
        .chunks_exact(info.line_size)
        .zip(mask.rows())
    {
        for (pixel, &keep) in line[..width * samples].chunks_exact(samples).zip(keep) {
            if keep {
                image.extend_from_slice(pixel);
            } else {
                image.extend(std::iter::repeat(0).take(samples));
            }
        }
    }

    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, info.width, info.height);
        encoder.set_color(info.color_type);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image)?;
        writer.finish()?;
    }
    Ok(out)
}
