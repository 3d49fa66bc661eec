//! Run-length mask decoding.
//!
//! The service ships each instance mask as a list of run lengths that
//! alternate between background and foreground, starting with background.
//! A leading zero-length run therefore means the mask starts with a
//! foreground run.

use crate::error::MaskError;

/// Order in which the run lengths walk the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Row 0 left to right, then row 1, and so on.
    #[default]
    RowMajor,
    /// Column 0 top to bottom, then column 1, and so on.
    ColumnMajor,
}

/// Borrowed view over an encoded mask as received from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLengthMask<'a> {
    pub encoded: &'a [i64],
    pub height: i64,
    pub width: i64,
}

impl<'a> RunLengthMask<'a> {
    pub fn new(encoded: &'a [i64], height: i64, width: i64) -> Self {
        Self {
            encoded,
            height,
            width,
        }
    }

    pub fn decode(&self) -> Result<DecodedMask, MaskError> {
        decode(self.encoded, self.height, self.width)
    }

    pub fn decode_with_order(&self, order: ScanOrder) -> Result<DecodedMask, MaskError> {
        decode_with_order(self.encoded, self.height, self.width, order)
    }
}

/// Inclusive pixel bounds of the foreground of a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub row_min: usize,
    pub col_min: usize,
    pub row_max: usize,
    pub col_max: usize,
}

/// Dense row-major boolean grid, `true` marking foreground pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMask {
    height: usize,
    width: usize,
    pixels: Vec<bool>,
}

impl DecodedMask {
    /// Wraps an already dense row-major buffer.
    pub fn from_pixels(height: usize, width: usize, pixels: Vec<bool>) -> Result<Self, MaskError> {
        let invalid = || MaskError::InvalidDimensions {
            height: i64::try_from(height).unwrap_or(i64::MAX),
            width: i64::try_from(width).unwrap_or(i64::MAX),
        };
        if height == 0 || width == 0 {
            return Err(invalid());
        }
        let total = height.checked_mul(width).ok_or_else(invalid)?;
        if pixels.len() != total {
            return Err(MaskError::PixelCount {
                expected: total,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            height,
            width,
            pixels,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Flattened row-major pixels.
    pub fn as_slice(&self) -> &[bool] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<bool> {
        self.pixels
    }

    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.pixels[row * self.width + col])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks_exact(self.width)
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.rows().map(<[bool]>::to_vec).collect()
    }

    /// Number of foreground pixels.
    pub fn area(&self) -> usize {
        self.pixels.iter().filter(|&&pixel| pixel).count()
    }

    /// Tight bounds of the foreground, `None` for an empty mask.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        for (row, pixels) in self.rows().enumerate() {
            let first = pixels.iter().position(|&pixel| pixel);
            let last = pixels.iter().rposition(|&pixel| pixel);
            if let (Some(first), Some(last)) = (first, last) {
                bounds = Some(match bounds {
                    None => BoundingBox {
                        row_min: row,
                        col_min: first,
                        row_max: row,
                        col_max: last,
                    },
                    Some(b) => BoundingBox {
                        row_min: b.row_min,
                        col_min: b.col_min.min(first),
                        row_max: row,
                        col_max: b.col_max.max(last),
                    },
                });
            }
        }
        bounds
    }

    pub fn to_runs(&self) -> Vec<i64> {
        encode(self)
    }
}

fn checked_dimensions(height: i64, width: i64) -> Result<(usize, usize, usize), MaskError> {
    let invalid = MaskError::InvalidDimensions { height, width };
    if height <= 0 || width <= 0 {
        return Err(invalid);
    }
    let rows = usize::try_from(height).map_err(|_| invalid.clone())?;
    let cols = usize::try_from(width).map_err(|_| invalid.clone())?;
    let total = rows.checked_mul(cols).ok_or(invalid)?;
    Ok((rows, cols, total))
}

/// Expands row-major run lengths into a `height` x `width` grid.
pub fn decode(encoded: &[i64], height: i64, width: i64) -> Result<DecodedMask, MaskError> {
    decode_with_order(encoded, height, width, ScanOrder::RowMajor)
}

/// Expands run lengths that walk the grid in `order`.
///
/// The result is always stored row-major. The output buffer is allocated
/// once at `height * width` and a run that would write past it fails
/// before touching any pixel.
pub fn decode_with_order(
    encoded: &[i64],
    height: i64,
    width: i64,
    order: ScanOrder,
) -> Result<DecodedMask, MaskError> {
    let (rows, cols, total) = checked_dimensions(height, width)?;

    if let Some((index, &value)) = encoded.iter().enumerate().find(|(_, run)| **run < 0) {
        return Err(MaskError::InvalidRunLength { index, value });
    }

    let mut pixels = vec![false; total];
    let mut cursor = 0usize;
    let mut foreground = false;

    for &run in encoded {
        // non-negative, checked above
        let run = run as u64;
        if run > (total - cursor) as u64 {
            let covered = encoded
                .iter()
                .fold(0u64, |sum, &run| sum.saturating_add(run as u64));
            return Err(MaskError::MalformedRunLength {
                expected: total as u64,
                covered,
            });
        }
        let run = run as usize;

        if foreground {
            match order {
                ScanOrder::RowMajor => pixels[cursor..cursor + run].fill(true),
                ScanOrder::ColumnMajor => {
                    for index in cursor..cursor + run {
                        let (row, col) = (index % rows, index / rows);
                        pixels[row * cols + col] = true;
                    }
                }
            }
        }

        cursor += run;
        foreground = !foreground;
    }

    if cursor != total {
        return Err(MaskError::MalformedRunLength {
            expected: total as u64,
            covered: cursor as u64,
        });
    }

    Ok(DecodedMask {
        height: rows,
        width: cols,
        pixels,
    })
}

/// Canonical row-major run lengths of `mask`.
///
/// A mask whose first pixel is foreground starts with a zero-length run.
pub fn encode(mask: &DecodedMask) -> Vec<i64> {
    let mut runs = Vec::new();
    let mut current = false;
    let mut run = 0i64;
    for &pixel in &mask.pixels {
        if pixel != current {
            runs.push(run);
            run = 0;
            current = pixel;
        }
        run += 1;
    }
    runs.push(run);
    runs
}
