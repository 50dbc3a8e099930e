//! Undoing TIFF predictors on decoded blocks
//!
//! Both predictors work row by row. The horizontal predictor stores each
//! sample as the difference to the same band of the previous pixel. The
//! floating point predictor first splits every row into byte planes (most
//! significant plane first) and then byte-differences the result.

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::tiff::errors::{TiffError, TiffResult};

/// Reverses horizontal differencing (predictor 2) in place
///
/// # Arguments
/// * `block` - Decoded block, `rows * row_samples * bytes_per_sample` bytes
/// * `row_samples` - Samples per row (`block_width * samples_per_pixel`)
/// * `samples_per_pixel` - Distance between samples of the same band
/// * `bytes_per_sample` - 1, 2, 4 or 8
/// * `handler` - File byte order
pub fn undo_horizontal(
    block: &mut [u8],
    row_samples: usize,
    samples_per_pixel: usize,
    bytes_per_sample: usize,
    handler: &dyn ByteOrderHandler,
) -> TiffResult<()> {
    let row_bytes = row_samples * bytes_per_sample;
    if row_bytes == 0 {
        return Ok(());
    }

    for row in block.chunks_exact_mut(row_bytes) {
        for i in samples_per_pixel..row_samples {
            let cur = i * bytes_per_sample;
            let prev = (i - samples_per_pixel) * bytes_per_sample;
            match bytes_per_sample {
                1 => row[cur] = row[cur].wrapping_add(row[prev]),
                2 => {
                    let value = handler.u16_at(&row[cur..]).wrapping_add(handler.u16_at(&row[prev..]));
                    handler.put_u16(&mut row[cur..], value);
                },
                4 => {
                    let value = handler.u32_at(&row[cur..]).wrapping_add(handler.u32_at(&row[prev..]));
                    handler.put_u32(&mut row[cur..], value);
                },
                8 => {
                    let value = handler.u64_at(&row[cur..]).wrapping_add(handler.u64_at(&row[prev..]));
                    handler.put_u64(&mut row[cur..], value);
                },
                other => {
                    return Err(TiffError::UnsupportedLayout(
                        format!("horizontal predictor on {}-byte samples", other)));
                },
            }
        }
    }

    Ok(())
}

/// Reverses the floating point predictor (predictor 3) in place
///
/// The output is written in the file's byte order so it decodes with the
/// same handler as unpredicted data.
pub fn undo_floating_point(
    block: &mut [u8],
    row_samples: usize,
    samples_per_pixel: usize,
    bytes_per_sample: usize,
    byte_order: ByteOrder,
) -> TiffResult<()> {
    let row_bytes = row_samples * bytes_per_sample;
    if row_bytes == 0 {
        return Ok(());
    }

    let mut planes = vec![0u8; row_bytes];
    for row in block.chunks_exact_mut(row_bytes) {
        for i in samples_per_pixel..row_bytes {
            row[i] = row[i].wrapping_add(row[i - samples_per_pixel]);
        }

        planes.copy_from_slice(row);
        for sample in 0..row_samples {
            for byte in 0..bytes_per_sample {
                let plane = match byte_order {
                    ByteOrder::BigEndian => byte,
                    ByteOrder::LittleEndian => bytes_per_sample - byte - 1,
                };
                row[sample * bytes_per_sample + byte] = planes[plane * row_samples + sample];
            }
        }
    }

    Ok(())
}
