//! Low-level I/O helpers shared by the raster readers

pub mod seekable;
pub mod byte_order;
