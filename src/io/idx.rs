//! IDX binary image files.
//!
//! Layout: a big-endian header of four `u32` values (magic number, record
//! count, rows, columns) followed by `count * rows * cols` unsigned bytes.
//! Each record is one `rows * cols` block, read as `f32` coordinates.
//!
//! Label files carry a two-value header (magic number, count) followed by
//! one unsigned byte per label.

use crate::data_format::{RecordCollection, RecordIdCounter};
use crate::error::{HashClustError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tracing::debug;

/// Magic number written by [`write_idx`].
pub const IDX_MAGIC: u32 = 2051;

/// Magic number written by [`write_labels`].
pub const IDX_LABEL_MAGIC: u32 = 2049;

/// IDX file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdxHeader {
    /// Magic number (not interpreted).
    pub magic: u32,
    /// Number of records.
    pub count: u32,
    /// Rows per record.
    pub rows: u32,
    /// Columns per record.
    pub cols: u32,
}

impl IdxHeader {
    /// Coordinates per record.
    pub fn dimensionality(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

fn truncated(e: std::io::Error) -> HashClustError {
    if e.kind() == ErrorKind::UnexpectedEof {
        HashClustError::parse("IDX file is truncated")
    } else {
        e.into()
    }
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(truncated)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read an IDX header.
pub fn read_header<R: Read>(reader: &mut R) -> Result<IdxHeader> {
    Ok(IdxHeader {
        magic: read_u32(reader)?,
        count: read_u32(reader)?,
        rows: read_u32(reader)?,
        cols: read_u32(reader)?,
    })
}

/// Read an IDX stream, drawing record identifiers from `counter`.
pub fn read_idx<R: Read>(reader: R, counter: &mut RecordIdCounter) -> Result<RecordCollection> {
    read_idx_with_header(reader, counter).map(|(_, collection)| collection)
}

/// Read an IDX stream and keep its header, which carries the image shape.
pub fn read_idx_with_header<R: Read>(
    mut reader: R,
    counter: &mut RecordIdCounter,
) -> Result<(IdxHeader, RecordCollection)> {
    let header = read_header(&mut reader)?;
    let dim = header.dimensionality();
    if dim == 0 {
        return Err(HashClustError::parse("IDX records have zero dimensions"));
    }

    let mut collection = RecordCollection::new(dim);
    let mut buf = vec![0u8; dim];
    for _ in 0..header.count {
        reader.read_exact(&mut buf).map_err(truncated)?;
        collection.push(buf.iter().map(|&b| b as f32).collect(), counter)?;
    }
    debug!(records = collection.len(), dim, "read IDX data");
    Ok((header, collection))
}

/// Load an IDX file, drawing record identifiers from `counter`.
pub fn load_idx(path: impl AsRef<Path>, counter: &mut RecordIdCounter) -> Result<RecordCollection> {
    let file = File::open(path)?;
    read_idx(BufReader::new(file), counter)
}

/// Load an IDX file together with its header.
pub fn load_idx_with_header(
    path: impl AsRef<Path>,
    counter: &mut RecordIdCounter,
) -> Result<(IdxHeader, RecordCollection)> {
    let file = File::open(path)?;
    read_idx_with_header(BufReader::new(file), counter)
}

/// Read an IDX label stream.
pub fn read_labels<R: Read>(mut reader: R) -> Result<Vec<u32>> {
    let _magic = read_u32(&mut reader)?;
    let count = read_u32(&mut reader)? as usize;
    let mut bytes = vec![0u8; count];
    reader.read_exact(&mut bytes).map_err(truncated)?;
    debug!(labels = count, "read IDX labels");
    Ok(bytes.into_iter().map(u32::from).collect())
}

/// Load an IDX label file.
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let file = File::open(path)?;
    read_labels(BufReader::new(file))
}

/// Write `labels` as an IDX label file. Labels must fit in a byte.
pub fn write_labels<W: Write>(writer: W, labels: &[u32]) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    let count = u32::try_from(labels.len())
        .map_err(|_| HashClustError::configuration("too many labels for an IDX file"))?;
    let bytes = labels
        .iter()
        .map(|&l| {
            u8::try_from(l).map_err(|_| HashClustError::configuration(format!("label {l} does not fit in a byte")))
        })
        .collect::<Result<Vec<u8>>>()?;
    writer.write_all(&IDX_LABEL_MAGIC.to_be_bytes())?;
    writer.write_all(&count.to_be_bytes())?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Write `collection` as IDX with one row per record.
///
/// Coordinates are rounded and clamped to `0..=255`.
pub fn write_idx<W: Write>(writer: W, collection: &RecordCollection) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    let count = u32::try_from(collection.len())
        .map_err(|_| HashClustError::configuration("too many records for an IDX file"))?;
    let cols = u32::try_from(collection.dimensionality())
        .map_err(|_| HashClustError::configuration("too many dimensions for an IDX file"))?;
    for value in [IDX_MAGIC, count, 1, cols] {
        writer.write_all(&value.to_be_bytes())?;
    }
    for record in collection {
        let bytes: Vec<u8> = record
            .coordinates()
            .iter()
            .map(|&x| x.round().clamp(0.0, 255.0) as u8)
            .collect();
        writer.write_all(&bytes)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn idx_bytes(count: u32, rows: u32, cols: u32, body: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in [IDX_MAGIC, count, rows, cols] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn test_read_idx() {
        let bytes = idx_bytes(2, 2, 2, &[0, 1, 2, 3, 255, 254, 253, 252]);
        let mut counter = RecordIdCounter::new();
        let collection = read_idx(&bytes[..], &mut counter).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.dimensionality(), 4);
        assert_eq!(collection.get(1).unwrap().coordinates(), &[255.0, 254.0, 253.0, 252.0]);
        assert_eq!(counter.peek(), 2);
    }

    #[test]
    fn test_truncated() {
        let bytes = idx_bytes(2, 1, 3, &[1, 2, 3, 4]);
        let err = read_idx(&bytes[..], &mut RecordIdCounter::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Parse);

        let err = read_idx(&bytes[..6], &mut RecordIdCounter::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Parse);
    }

    #[test]
    fn test_file_round_trip() {
        let collection = RecordCollection::from_vecs(vec![vec![0.0, 7.0, 300.0], vec![1.4, 2.6, -3.0]]).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        write_idx(file.reopen().unwrap(), &collection).unwrap();

        let loaded = load_idx(file.path(), &mut RecordIdCounter::new()).unwrap();
        assert_eq!(loaded.get(0).unwrap().coordinates(), &[0.0, 7.0, 255.0]);
        assert_eq!(loaded.get(1).unwrap().coordinates(), &[1.0, 3.0, 0.0]);
    }

    #[test]
    fn test_header_kept_with_records() {
        let bytes = idx_bytes(1, 2, 3, &[1, 2, 3, 4, 5, 6]);
        let (header, collection) = read_idx_with_header(&bytes[..], &mut RecordIdCounter::new()).unwrap();
        assert_eq!((header.rows, header.cols), (2, 3));
        assert_eq!(collection.dimensionality(), 6);
    }

    #[test]
    fn test_labels() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_labels(file.reopen().unwrap(), &[7, 0, 9, 255]).unwrap();
        assert_eq!(load_labels(file.path()).unwrap(), vec![7, 0, 9, 255]);

        let mut bytes = Vec::new();
        for v in [IDX_LABEL_MAGIC, 3] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(&[1, 2]);
        assert_eq!(read_labels(&bytes[..]).unwrap_err().code(), ErrorCode::Parse);

        let err = write_labels(Vec::new(), &[256]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Configuration);
    }
}
