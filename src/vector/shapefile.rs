//! ESRI Shapefile geometry (`.shp`) and index (`.shx`) files
//!
//! Both files share a 100-byte header. The file code and lengths are
//! big-endian and counted in 16-bit words; the version, shape type,
//! bounding box and coordinates are little-endian.

use std::io::{self, Cursor, Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::coordinate::Point;

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_BYTES: usize = 100;

/// Shape type codes this module reads or writes
pub mod shape_types {
    pub const NULL: i32 = 0;
    pub const POINT: i32 = 1;
    pub const MULTIPOINT: i32 = 8;
}

/// Content length of a point record in words: type + x + y
const POINT_CONTENT_WORDS: i32 = 10;

fn write_header<W: Write>(out: &mut W, file_words: i32, shape_type: i32, bounds: (f64, f64, f64, f64)) -> io::Result<()> {
    out.write_i32::<BigEndian>(FILE_CODE)?;
    for _ in 0..5 {
        out.write_i32::<BigEndian>(0)?;
    }
    out.write_i32::<BigEndian>(file_words)?;
    out.write_i32::<LittleEndian>(VERSION)?;
    out.write_i32::<LittleEndian>(shape_type)?;

    let (min_x, min_y, max_x, max_y) = bounds;
    for value in [min_x, min_y, max_x, max_y, 0.0, 0.0, 0.0, 0.0] {
        out.write_f64::<LittleEndian>(value)?;
    }
    Ok(())
}

/// Length in words of a file holding `count` records of `record_words` each
///
/// Lengths are stored as `i32`, which caps a file near 4 GB; larger
/// outputs fail with [`io::ErrorKind::InvalidInput`].
pub(crate) fn file_words(count: usize, record_words: i32) -> io::Result<i32> {
    i32::try_from(count).ok()
        .and_then(|records| records.checked_mul(record_words))
        .and_then(|words| words.checked_add((HEADER_BYTES / 2) as i32))
        .ok_or_else(|| io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} records exceed the shapefile length limit", count),
        ))
}

/// Writes a point `.shp` file
pub fn write_points_shp<W: Write>(out: &mut W, points: &[Point], bounds: (f64, f64, f64, f64)) -> io::Result<()> {
    // Every record number and offset below fits once the total does
    let total_words = file_words(points.len(), 4 + POINT_CONTENT_WORDS)?;
    write_header(out, total_words, shape_types::POINT, bounds)?;

    for (number, point) in (1..).zip(points) {
        out.write_i32::<BigEndian>(number)?;
        out.write_i32::<BigEndian>(POINT_CONTENT_WORDS)?;
        out.write_i32::<LittleEndian>(shape_types::POINT)?;
        out.write_f64::<LittleEndian>(point.x)?;
        out.write_f64::<LittleEndian>(point.y)?;
    }
    Ok(())
}

/// Writes the `.shx` index matching [`write_points_shp`]
pub fn write_points_shx<W: Write>(out: &mut W, count: usize, bounds: (f64, f64, f64, f64)) -> io::Result<()> {
    let total_words = file_words(count, 4)?;
    // Offsets point into the .shp, so its length must fit too
    file_words(count, 4 + POINT_CONTENT_WORDS)?;
    write_header(out, total_words, shape_types::POINT, bounds)?;

    let mut offset_words = (HEADER_BYTES / 2) as i32;
    for _ in 0..count {
        out.write_i32::<BigEndian>(offset_words)?;
        out.write_i32::<BigEndian>(POINT_CONTENT_WORDS)?;
        offset_words += 4 + POINT_CONTENT_WORDS;
    }
    Ok(())
}

/// Geometry read back from a `.shp`
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFile {
    pub shape_type: i32,
    pub bounds: (f64, f64, f64, f64),
    /// Vertices of every record, in record order; null shapes are empty
    pub shapes: Vec<Vec<Point>>,
}

/// Parses point, multipoint and null records
pub fn read_shp(bytes: &[u8]) -> io::Result<ShapeFile> {
    if bytes.len() < HEADER_BYTES {
        return Err(invalid(format!("shapefile is {} bytes, shorter than its header", bytes.len())));
    }

    let mut cursor = Cursor::new(bytes);
    let code = cursor.read_i32::<BigEndian>()?;
    if code != FILE_CODE {
        return Err(invalid(format!("bad shapefile file code {}", code)));
    }
    cursor.set_position(24);
    let file_bytes = (cursor.read_i32::<BigEndian>()? as usize * 2).min(bytes.len());
    let _version = cursor.read_i32::<LittleEndian>()?;
    let shape_type = cursor.read_i32::<LittleEndian>()?;
    let bounds = (
        cursor.read_f64::<LittleEndian>()?,
        cursor.read_f64::<LittleEndian>()?,
        cursor.read_f64::<LittleEndian>()?,
        cursor.read_f64::<LittleEndian>()?,
    );

    let mut shapes = Vec::new();
    let mut position = HEADER_BYTES;
    while position + 8 <= file_bytes {
        cursor.set_position(position as u64);
        let _number = cursor.read_i32::<BigEndian>()?;
        let content_bytes = cursor.read_i32::<BigEndian>()? as usize * 2;
        let end = position + 8 + content_bytes;
        if end > bytes.len() {
            return Err(invalid(format!("record at byte {} runs past the end of the file", position)));
        }

        let mut content = Cursor::new(&bytes[position + 8..end]);
        shapes.push(read_shape(&mut content)?);
        position = end;
    }

    Ok(ShapeFile { shape_type, bounds, shapes })
}

fn read_shape<R: Read>(content: &mut R) -> io::Result<Vec<Point>> {
    let shape_type = content.read_i32::<LittleEndian>()?;
    match shape_type {
        shape_types::NULL => Ok(Vec::new()),
        shape_types::POINT => {
            let x = content.read_f64::<LittleEndian>()?;
            let y = content.read_f64::<LittleEndian>()?;
            Ok(vec![Point::new(x, y)])
        },
        shape_types::MULTIPOINT => {
            let mut bbox = [0u8; 32];
            content.read_exact(&mut bbox)?;
            let count = content.read_i32::<LittleEndian>()?.max(0) as usize;
            let mut points = Vec::with_capacity(count);
            for _ in 0..count {
                let x = content.read_f64::<LittleEndian>()?;
                let y = content.read_f64::<LittleEndian>()?;
                points.push(Point::new(x, y));
            }
            Ok(points)
        },
        other => Err(invalid(format!("unsupported shape type {}", other))),
    }
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
