//! dBase III attribute tables
//!
//! Only what a point shapefile needs: numeric and character fields, no
//! memo files, no deleted-record compaction on write.

use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::dataset::FieldValue;

const VERSION: u8 = 0x03;
/// Header date written as shapelib does, keeping output reproducible
const HEADER_DATE: [u8; 3] = [95, 7, 26];
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const FIELD_NAME_LEN: usize = 11;

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfField {
    pub name: String,
    /// 'N' numeric, 'C' character, 'F' float, 'L' logical, 'D' date
    pub kind: char,
    pub length: u8,
    pub decimals: u8,
}

impl DbfField {
    /// Integer column of the given width
    pub fn integer(name: &str, length: u8) -> Self {
        DbfField { name: name.to_string(), kind: 'N', length, decimals: 0 }
    }

    fn decode(&self, raw: &[u8]) -> FieldValue {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();

        match self.kind {
            'N' | 'F' if text.is_empty() || text.starts_with('*') => FieldValue::Null,
            'N' if self.decimals == 0 => text.parse::<i64>()
                .map(FieldValue::Integer)
                .unwrap_or_else(|_| FieldValue::Text(text.to_string())),
            'N' | 'F' => text.parse::<f64>()
                .map(FieldValue::Float)
                .unwrap_or_else(|_| FieldValue::Text(text.to_string())),
            _ => FieldValue::Text(text.to_string()),
        }
    }

    /// Fixed-width encoding of a value: numbers right-aligned, text left-aligned
    fn encode(&self, value: &FieldValue) -> io::Result<Vec<u8>> {
        let width = self.length as usize;
        let text = match value {
            FieldValue::Float(v) => format!("{:.*}", self.decimals as usize, v),
            other => other.to_string(),
        };

        if text.len() > width {
            return Err(io::Error::new(io::ErrorKind::InvalidInput,
                format!("value {:?} does not fit field {} of width {}", text, self.name, width)));
        }

        let padded = match self.kind {
            'N' | 'F' => format!("{:>width$}", text, width = width),
            _ => format!("{:<width$}", text, width = width),
        };
        Ok(padded.into_bytes())
    }
}

/// Table contents read back from a `.dbf`
#[derive(Debug, Clone, PartialEq)]
pub struct DbfTable {
    pub fields: Vec<DbfField>,
    pub records: Vec<Vec<FieldValue>>,
}

/// Serialises a table
///
/// # Arguments
/// * `fields` - Column definitions
/// * `records` - One value per column for every record
pub fn write_dbf<W: Write>(out: &mut W, fields: &[DbfField], records: &[Vec<FieldValue>]) -> io::Result<()> {
    let header_len = 32 + 32 * fields.len() + 1;
    let record_len = 1 + fields.iter().map(|f| f.length as usize).sum::<usize>();

    out.write_u8(VERSION)?;
    out.write_all(&HEADER_DATE)?;
    out.write_u32::<LittleEndian>(records.len() as u32)?;
    out.write_u16::<LittleEndian>(header_len as u16)?;
    out.write_u16::<LittleEndian>(record_len as u16)?;
    out.write_all(&[0u8; 20])?;

    for field in fields {
        let mut name = [0u8; FIELD_NAME_LEN];
        let bytes = field.name.as_bytes();
        let len = bytes.len().min(FIELD_NAME_LEN - 1);
        name[..len].copy_from_slice(&bytes[..len]);

        out.write_all(&name)?;
        out.write_u8(field.kind as u8)?;
        out.write_all(&[0u8; 4])?;
        out.write_u8(field.length)?;
        out.write_u8(field.decimals)?;
        out.write_all(&[0u8; 14])?;
    }
    out.write_u8(HEADER_TERMINATOR)?;

    for record in records {
        out.write_u8(b' ')?;
        for (field, value) in fields.iter().zip(record) {
            out.write_all(&field.encode(value)?)?;
        }
    }
    out.write_u8(END_OF_FILE)?;

    Ok(())
}

/// Parses a table; deleted records are skipped
pub fn read_dbf(bytes: &[u8]) -> io::Result<DbfTable> {
    let mut cursor = Cursor::new(bytes);

    let _version = cursor.read_u8()?;
    let mut date = [0u8; 3];
    cursor.read_exact(&mut date)?;
    let record_count = cursor.read_u32::<LittleEndian>()? as usize;
    let header_len = cursor.read_u16::<LittleEndian>()? as usize;
    let record_len = cursor.read_u16::<LittleEndian>()? as usize;

    if header_len < 33 || bytes.len() < header_len {
        return Err(invalid(format!("dBase header length {} out of range", header_len)));
    }

    let mut fields = Vec::new();
    let mut offset = 32;
    while offset + 32 <= header_len && bytes[offset] != HEADER_TERMINATOR {
        let descriptor = &bytes[offset..offset + 32];
        let name_end = descriptor[..FIELD_NAME_LEN].iter().position(|&b| b == 0).unwrap_or(FIELD_NAME_LEN);
        fields.push(DbfField {
            name: String::from_utf8_lossy(&descriptor[..name_end]).trim().to_string(),
            kind: descriptor[11] as char,
            length: descriptor[16],
            decimals: descriptor[17],
        });
        offset += 32;
    }

    let expected_len = 1 + fields.iter().map(|f| f.length as usize).sum::<usize>();
    if record_len != expected_len {
        return Err(invalid(format!("record length {} does not match fields ({})", record_len, expected_len)));
    }

    let mut records = Vec::with_capacity(record_count);
    for index in 0..record_count {
        let start = header_len + index * record_len;
        let raw = bytes.get(start..start + record_len)
            .ok_or_else(|| invalid(format!("record {} is truncated", index)))?;
        if raw[0] == b'*' {
            continue;
        }

        let mut column = 1;
        let mut values = Vec::with_capacity(fields.len());
        for field in &fields {
            let end = column + field.length as usize;
            values.push(field.decode(&raw[column..end]));
            column = end;
        }
        records.push(values);
    }

    Ok(DbfTable { fields, records })
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
