//! Byte order handling for TIFF files
//!
//! TIFF files declare their byte order in the first two bytes. Every
//! multi-byte value after that, whether it sits in a directory entry or
//! inside a decompressed pixel block, is decoded through a
//! [`ByteOrderHandler`] chosen once at open time.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::Result;
use std::marker::PhantomData;

use crate::io::seekable::SeekableReader;
use crate::tiff::errors::{TiffError, TiffResult};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the TIFF header
    pub fn detect(reader: &mut dyn SeekableReader) -> TiffResult<Self> {
        let marker = reader.read_u16::<LittleEndian>()?;
        match marker {
            0x4949 => Ok(ByteOrder::LittleEndian), // "II"
            0x4D4D => Ok(ByteOrder::BigEndian),    // "MM"
            _ => Err(TiffError::InvalidByteOrder(marker)),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler::new()),
            ByteOrder::BigEndian => Box::new(BigEndianHandler::new()),
        }
    }
}

/// Decodes multi-byte values in a fixed byte order
///
/// The `read_*` methods pull values from a seekable stream (directory
/// parsing); the `*_at` methods decode from the start of an in-memory slice
/// (tag payloads and pixel blocks). `put_*` writes back in the same order,
/// which the horizontal predictor needs when undoing differences in place.
pub trait ByteOrderHandler: Send + Sync {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;
    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64>;

    fn u16_at(&self, bytes: &[u8]) -> u16;
    fn u32_at(&self, bytes: &[u8]) -> u32;
    fn u64_at(&self, bytes: &[u8]) -> u64;
    fn i16_at(&self, bytes: &[u8]) -> i16;
    fn i32_at(&self, bytes: &[u8]) -> i32;
    fn i64_at(&self, bytes: &[u8]) -> i64;
    fn f32_at(&self, bytes: &[u8]) -> f32;
    fn f64_at(&self, bytes: &[u8]) -> f64;

    fn put_u16(&self, bytes: &mut [u8], value: u16);
    fn put_u32(&self, bytes: &mut [u8], value: u32);
    fn put_u64(&self, bytes: &mut [u8], value: u64);
}

/// Handler generic over a `byteorder` marker type
#[derive(Debug, Clone, Copy)]
pub struct EndianHandler<B> {
    order: PhantomData<B>,
}

impl<B> EndianHandler<B> {
    pub const fn new() -> Self {
        EndianHandler { order: PhantomData }
    }
}

/// Little-endian byte order handler
pub type LittleEndianHandler = EndianHandler<LittleEndian>;

/// Big-endian byte order handler
pub type BigEndianHandler = EndianHandler<BigEndian>;

impl<B> ByteOrderHandler for EndianHandler<B>
where
    B: byteorder::ByteOrder + Send + Sync,
{
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<B>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<B>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<B>()
    }

    fn u16_at(&self, bytes: &[u8]) -> u16 {
        B::read_u16(bytes)
    }

    fn u32_at(&self, bytes: &[u8]) -> u32 {
        B::read_u32(bytes)
    }

    fn u64_at(&self, bytes: &[u8]) -> u64 {
        B::read_u64(bytes)
    }

    fn i16_at(&self, bytes: &[u8]) -> i16 {
        B::read_i16(bytes)
    }

    fn i32_at(&self, bytes: &[u8]) -> i32 {
        B::read_i32(bytes)
    }

    fn i64_at(&self, bytes: &[u8]) -> i64 {
        B::read_i64(bytes)
    }

    fn f32_at(&self, bytes: &[u8]) -> f32 {
        B::read_f32(bytes)
    }

    fn f64_at(&self, bytes: &[u8]) -> f64 {
        B::read_f64(bytes)
    }

    fn put_u16(&self, bytes: &mut [u8], value: u16) {
        B::write_u16(bytes, value)
    }

    fn put_u32(&self, bytes: &mut [u8], value: u32) {
        B::write_u32(bytes, value)
    }

    fn put_u64(&self, bytes: &mut [u8], value: u64) {
        B::write_u64(bytes, value)
    }
}
