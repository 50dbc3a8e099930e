//! Tests for predictor reversal

extern crate std;

use crate::extractor::predictor::{undo_floating_point, undo_horizontal};
use crate::io::byte_order::{ByteOrder, LittleEndianHandler, BigEndianHandler, ByteOrderHandler};

#[test]
fn test_horizontal_u8_two_bands() {
    // Two bands: pixels (10, 200), (15, 190), (20, 180)
    let mut block = vec![10, 200, 5, 246, 5, 246];
    undo_horizontal(&mut block, 6, 2, 1, &LittleEndianHandler::new()).unwrap();
    std::assert_eq!(block, vec![10, 200, 15, 190, 20, 180]);
}

#[test]
fn test_horizontal_u16_big_endian() {
    let handler = BigEndianHandler::new();
    let mut block = Vec::new();
    for value in [1000u16, 24, 65535] {
        block.extend_from_slice(&value.to_be_bytes());
    }

    undo_horizontal(&mut block, 3, 1, 2, &handler).unwrap();
    std::assert_eq!(handler.u16_at(&block[0..]), 1000);
    std::assert_eq!(handler.u16_at(&block[2..]), 1024);
    // Wraps like the encoder did
    std::assert_eq!(handler.u16_at(&block[4..]), 1023);
}

#[test]
fn test_horizontal_restarts_each_row() {
    let mut block = vec![1, 1, 1, 5, 1, 1];
    undo_horizontal(&mut block, 3, 1, 1, &LittleEndianHandler::new()).unwrap();
    std::assert_eq!(block, vec![1, 2, 3, 5, 6, 7]);
}

/// Applies the floating point predictor the way an encoder would
fn encode_float_row(values: &[f32]) -> Vec<u8> {
    let n = values.len();
    let mut planes = vec![0u8; n * 4];
    for (i, value) in values.iter().enumerate() {
        let be = value.to_be_bytes();
        for byte in 0..4 {
            planes[byte * n + i] = be[byte];
        }
    }
    for i in (1..planes.len()).rev() {
        planes[i] = planes[i].wrapping_sub(planes[i - 1]);
    }
    planes
}

#[test]
fn test_floating_point_little_endian() {
    let values = [12.5f32, 13.25, -1.0, 0.0, 31.75];
    let mut block = encode_float_row(&values);
    block.extend(encode_float_row(&values));

    undo_floating_point(&mut block, values.len(), 1, 4, ByteOrder::LittleEndian).unwrap();

    let handler = LittleEndianHandler::new();
    for row in 0..2 {
        for (i, expected) in values.iter().enumerate() {
            std::assert_eq!(handler.f32_at(&block[(row * values.len() + i) * 4..]), *expected);
        }
    }
}

#[test]
fn test_floating_point_big_endian() {
    let values = [2.5f32, 7.0, 1e-3];
    let mut block = encode_float_row(&values);
    undo_floating_point(&mut block, values.len(), 1, 4, ByteOrder::BigEndian).unwrap();

    let handler = BigEndianHandler::new();
    for (i, expected) in values.iter().enumerate() {
        std::assert_eq!(handler.f32_at(&block[i * 4..]), *expected);
    }
}
