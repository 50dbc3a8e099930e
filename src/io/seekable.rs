//! Seekable reader trait
//!
//! Directory parsing and block extraction both jump around the file, so every
//! reader handed to the TIFF layer must support `Read + Seek`.

use std::io::{Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
