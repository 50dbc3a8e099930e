//! Sample type interpretation

use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::constants::sample_format;
use crate::tiff::errors::{TiffError, TiffResult};

/// Numeric interpretation of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Unsigned,
    Signed,
    Float,
}

impl SampleFormat {
    /// Maps the SampleFormat tag value
    pub fn from_code(code: u64) -> TiffResult<Self> {
        match code {
            sample_format::UNSIGNED => Ok(SampleFormat::Unsigned),
            sample_format::SIGNED => Ok(SampleFormat::Signed),
            sample_format::IEEEFP => Ok(SampleFormat::Float),
            other => Err(TiffError::UnsupportedLayout(format!("sample format {}", other))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::Unsigned => "unsigned integer",
            SampleFormat::Signed => "signed integer",
            SampleFormat::Float => "IEEE float",
        }
    }
}

/// Sample format plus bit depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleType {
    pub format: SampleFormat,
    pub bits: u16,
}

impl SampleType {
    /// Validates a format/depth combination
    pub fn new(format: SampleFormat, bits: u16) -> TiffResult<Self> {
        let valid = match format {
            SampleFormat::Unsigned | SampleFormat::Signed => matches!(bits, 8 | 16 | 32 | 64),
            SampleFormat::Float => matches!(bits, 32 | 64),
        };

        if !valid {
            return Err(TiffError::UnsupportedLayout(
                format!("{}-bit {} samples", bits, format.name())));
        }

        Ok(SampleType { format, bits })
    }

    /// Bytes occupied by one sample
    pub fn bytes(&self) -> usize {
        self.bits as usize / 8
    }

    /// Decodes the sample starting at `bytes[0]`
    pub fn decode(&self, bytes: &[u8], handler: &dyn ByteOrderHandler) -> f64 {
        match (self.format, self.bits) {
            (SampleFormat::Unsigned, 8) => bytes[0] as f64,
            (SampleFormat::Unsigned, 16) => handler.u16_at(bytes) as f64,
            (SampleFormat::Unsigned, 32) => handler.u32_at(bytes) as f64,
            (SampleFormat::Unsigned, _) => handler.u64_at(bytes) as f64,
            (SampleFormat::Signed, 8) => bytes[0] as i8 as f64,
            (SampleFormat::Signed, 16) => handler.i16_at(bytes) as f64,
            (SampleFormat::Signed, 32) => handler.i32_at(bytes) as f64,
            (SampleFormat::Signed, _) => handler.i64_at(bytes) as f64,
            (SampleFormat::Float, 32) => handler.f32_at(bytes) as f64,
            (SampleFormat::Float, _) => handler.f64_at(bytes),
        }
    }

    /// Largest value of an unsigned type, used to scale into 8 bits
    pub fn unsigned_max(&self) -> Option<f64> {
        match self.format {
            SampleFormat::Unsigned => Some(((1u128 << self.bits) - 1) as f64),
            _ => None,
        }
    }
}
