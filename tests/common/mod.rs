//! Synthetic GeoTIFF files for the integration tests
//!
//! Writes little-endian, uncompressed, single-strip TIFFs with pixel scale,
//! tiepoint and a GeoKey directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

pub const ORIGIN_X: f64 = 500_000.0;
pub const ORIGIN_Y: f64 = 5_000_000.0;
pub const UTM_32N: u16 = 32632;

const ASCII: u16 = 2;
const SHORT: u16 = 3;
const LONG: u16 = 4;
const DOUBLE: u16 = 12;

pub enum Pixels {
    Rgb8(Vec<u8>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

pub struct GeoTiffFixture {
    pub width: u32,
    pub height: u32,
    pub pixels: Pixels,
    pub pixel_size: f64,
    pub epsg: Option<u16>,
    pub nodata: Option<String>,
}

impl GeoTiffFixture {
    /// Mid-grey RGB orthophoto
    pub fn rgb(width: u32, height: u32) -> Self {
        GeoTiffFixture {
            width,
            height,
            pixels: Pixels::Rgb8(vec![128; (width * height * 3) as usize]),
            pixel_size: 1.0,
            epsg: Some(UTM_32N),
            nodata: None,
        }
    }

    /// Canopy height model filled by `height(col, row)`
    pub fn heights(width: u32, height: u32, value: impl Fn(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for row in 0..height {
            for col in 0..width {
                data.push(value(col, row));
            }
        }
        GeoTiffFixture {
            width,
            height,
            pixels: Pixels::Float32(data),
            pixel_size: 1.0,
            epsg: Some(UTM_32N),
            nodata: None,
        }
    }

    /// 64-bit float canopy height model filled by `height(col, row)`
    pub fn heights_f64(width: u32, height: u32, value: impl Fn(u32, u32) -> f64) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for row in 0..height {
            for col in 0..width {
                data.push(value(col, row));
            }
        }
        GeoTiffFixture { pixels: Pixels::Float64(data), ..Self::heights(width, height, |_, _| 0.0) }
    }

    pub fn write(&self, path: &Path) -> PathBuf {
        fs::write(path, self.to_bytes()).unwrap();
        path.to_path_buf()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let (samples, bits, format, photometric, strip) = match &self.pixels {
            Pixels::Rgb8(data) => (3u16, 8u16, 1u16, 2u16, data.clone()),
            Pixels::Float32(data) => {
                let mut bytes = Vec::with_capacity(data.len() * 4);
                for value in data {
                    bytes.write_f32::<LittleEndian>(*value).unwrap();
                }
                (1, 32, 3, 1, bytes)
            },
            Pixels::Float64(data) => {
                let mut bytes = Vec::with_capacity(data.len() * 8);
                for value in data {
                    bytes.write_f64::<LittleEndian>(*value).unwrap();
                }
                (1, 64, 3, 1, bytes)
            },
        };

        let mut entries: Vec<(u16, u16, u32, Vec<u8>)> = vec![
            (256, LONG, 1, longs(&[self.width])),
            (257, LONG, 1, longs(&[self.height])),
            (258, SHORT, samples as u32, shorts(&vec![bits; samples as usize])),
            (259, SHORT, 1, shorts(&[1])),
            (262, SHORT, 1, shorts(&[photometric])),
            (273, LONG, 1, longs(&[8])),
            (277, SHORT, 1, shorts(&[samples])),
            (278, LONG, 1, longs(&[self.height])),
            (279, LONG, 1, longs(&[strip.len() as u32])),
            (284, SHORT, 1, shorts(&[1])),
            (339, SHORT, samples as u32, shorts(&vec![format; samples as usize])),
            (33550, DOUBLE, 3, doubles(&[self.pixel_size, self.pixel_size, 0.0])),
            (33922, DOUBLE, 6, doubles(&[0.0, 0.0, 0.0, ORIGIN_X, ORIGIN_Y, 0.0])),
        ];

        if let Some(epsg) = self.epsg {
            let (model_type, crs_key) = if epsg == 4326 { (2, 2048) } else { (1, 3072) };
            let keys = [1, 1, 0, 3, 1024, 0, 1, model_type, 1025, 0, 1, 1, crs_key, 0, 1, epsg];
            entries.push((34735, SHORT, keys.len() as u32, shorts(&keys)));
        }
        if let Some(nodata) = &self.nodata {
            let mut text = nodata.as_bytes().to_vec();
            text.push(0);
            entries.push((42113, ASCII, text.len() as u32, text));
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.write_u16::<LittleEndian>(42).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.extend_from_slice(&strip);

        let mut fields = Vec::new();
        for (tag, field_type, count, payload) in entries {
            if payload.len() > 4 {
                if out.len() % 2 == 1 {
                    out.push(0);
                }
                let offset = out.len() as u32;
                out.extend_from_slice(&payload);
                fields.push((tag, field_type, count, offset.to_le_bytes().to_vec()));
            } else {
                let mut inline = payload;
                inline.resize(4, 0);
                fields.push((tag, field_type, count, inline));
            }
        }

        if out.len() % 2 == 1 {
            out.push(0);
        }
        let ifd_offset = out.len() as u32;
        out[4..8].copy_from_slice(&ifd_offset.to_le_bytes());

        out.write_u16::<LittleEndian>(fields.len() as u16).unwrap();
        for (tag, field_type, count, value) in fields {
            out.write_u16::<LittleEndian>(tag).unwrap();
            out.write_u16::<LittleEndian>(field_type).unwrap();
            out.write_u32::<LittleEndian>(count).unwrap();
            out.extend_from_slice(&value);
        }
        out.write_u32::<LittleEndian>(0).unwrap();
        out
    }
}

fn shorts(values: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        out.write_u16::<LittleEndian>(*v).unwrap();
    }
    out
}

fn longs(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        out.write_u32::<LittleEndian>(*v).unwrap();
    }
    out
}

fn doubles(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        out.write_f64::<LittleEndian>(*v).unwrap();
    }
    out
}
