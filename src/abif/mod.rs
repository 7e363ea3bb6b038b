//! ABIF (Applied Biosystems) container decoder.
//!
//! An ABIF file is a 128-byte header followed by a tag directory:
//!
//! ```text
//! offset  size  field
//!      0     4  magic "ABIF"
//!      4     2  version
//!      6    28  directory-summary record (same layout as every tag entry)
//!     34    94  reserved
//! ```
//!
//! Each 28-byte directory record is:
//!
//! ```text
//! name(4) number(u32) type(u16) elemsize(u16) count(u32) datasize(u32) offset(u32) handle(u32)
//! ```
//!
//! All integers are big-endian. When `datasize <= 4` the value lives in the
//! offset field itself, otherwise the offset points into the file.
//!
//! Entries are decoded lazily: [`AbifFile::get`] decodes an entry on first
//! access and caches the resulting [`TagValue`].

pub mod tags;
pub mod value;

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};
use thiserror::Error;

pub use value::{AbifDate, AbifTime, ElementType, TagValue};

/// File signature.
pub const ABIF_MAGIC: &[u8; 4] = b"ABIF";
/// Size of the fixed header.
pub const HEADER_LEN: usize = 128;
/// Size of one directory record.
pub const DIR_ENTRY_LEN: usize = 28;
/// Where the directory-summary record sits inside the header.
const HEADER_DIR_RECORD_OFFSET: usize = 6;

/// Errors that can occur while decoding an ABIF file.
#[derive(Error, Debug)]
pub enum AbifError {
    #[error("Not an ABIF file (expected magic \"ABIF\", found {found})")]
    Format { found: String },

    #[error("Read of {len} bytes at offset {offset} runs past the end of the file ({size} bytes)")]
    Bounds { offset: usize, len: usize, size: usize },

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ABIF operations.
pub type AbifResult<T> = Result<T, AbifError>;

/// Unique address of a directory entry: 4-character name plus numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey {
    pub name: String,
    pub number: u32,
}

impl TagKey {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.number)
    }
}

/// One decoded 28-byte directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub key: TagKey,
    pub type_code: u16,
    pub element_size: u16,
    pub element_count: u32,
    pub data_size: u32,
    /// The raw 4-byte offset field: either a file offset or the packed value.
    pub offset_field: [u8; 4],
    pub data_handle: u32,
}

impl DirectoryEntry {
    /// Decodes one record. Used for the header summary and every directory slot.
    fn decode(record: &[u8]) -> Self {
        let name = String::from_utf8_lossy(&record[0..4]).into_owned();
        let mut offset_field = [0u8; 4];
        offset_field.copy_from_slice(&record[20..24]);
        Self {
            key: TagKey::new(name, BigEndian::read_u32(&record[4..8])),
            type_code: BigEndian::read_u16(&record[8..10]),
            element_size: BigEndian::read_u16(&record[10..12]),
            element_count: BigEndian::read_u32(&record[12..16]),
            data_size: BigEndian::read_u32(&record[16..20]),
            offset_field,
            data_handle: BigEndian::read_u32(&record[24..28]),
        }
    }

    /// True when the value is packed into the offset field.
    pub fn is_inline(&self) -> bool {
        self.data_size <= 4
    }

    /// The offset field read as a big-endian file offset.
    pub fn data_offset(&self) -> u32 {
        BigEndian::read_u32(&self.offset_field)
    }

    pub fn element_type(&self) -> ElementType {
        ElementType::from_code(self.type_code)
    }
}

/// The validated file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u16,
    /// Directory summary: `element_count` is the number of entries and
    /// `data_offset()` is where the directory starts.
    pub directory: DirectoryEntry,
}

impl FileHeader {
    pub fn entry_count(&self) -> usize {
        self.directory.element_count as usize
    }

    pub fn directory_offset(&self) -> usize {
        self.directory.data_offset() as usize
    }
}

/// A decoded ABIF file: header, directory and lazily decoded values.
pub struct AbifFile {
    data: Vec<u8>,
    header: FileHeader,
    entries: Vec<DirectoryEntry>,
    index: HashMap<TagKey, usize>,
    cache: Vec<OnceCell<TagValue>>,
    warnings: RefCell<Vec<String>>,
}

impl fmt::Debug for AbifFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbifFile")
            .field("size", &self.data.len())
            .field("header", &self.header)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Returns `data[offset..offset + len]` or a bounds error.
fn checked_slice(data: &[u8], offset: usize, len: usize) -> AbifResult<&[u8]> {
    let end = offset.checked_add(len).filter(|&end| end <= data.len());
    match end {
        Some(end) => Ok(&data[offset..end]),
        None => Err(AbifError::Bounds {
            offset,
            len,
            size: data.len(),
        }),
    }
}

impl AbifFile {
    /// Reads and decodes the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> AbifResult<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Decodes the header and directory of an in-memory file.
    ///
    /// Fails with [`AbifError::Format`] when the magic does not match and with
    /// [`AbifError::Bounds`] when the header or directory is truncated.
    pub fn from_bytes(data: Vec<u8>) -> AbifResult<Self> {
        let magic = &data[..data.len().min(4)];
        if magic != ABIF_MAGIC {
            return Err(AbifError::Format {
                found: format!("{:?}", String::from_utf8_lossy(magic)),
            });
        }

        let version = BigEndian::read_u16(checked_slice(&data, 4, 2)?);
        let summary = checked_slice(&data, HEADER_DIR_RECORD_OFFSET, DIR_ENTRY_LEN)?;
        let header = FileHeader {
            version,
            directory: DirectoryEntry::decode(summary),
        };

        let count = header.entry_count();
        let dir_len = count.checked_mul(DIR_ENTRY_LEN).ok_or(AbifError::Bounds {
            offset: header.directory_offset(),
            len: usize::MAX,
            size: data.len(),
        })?;
        let directory = checked_slice(&data, header.directory_offset(), dir_len)?;

        let entries: Vec<DirectoryEntry> = directory
            .chunks_exact(DIR_ENTRY_LEN)
            .map(DirectoryEntry::decode)
            .collect();

        let mut warnings = Vec::new();
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.contains_key(&entry.key) {
                let msg = format!("Duplicate tag {} ignored", entry.key);
                warn!("{}", msg);
                warnings.push(msg);
                continue;
            }
            index.insert(entry.key.clone(), i);
        }

        debug!(
            "ABIF v{}: {} directory entries at offset {}",
            header.version,
            entries.len(),
            header.directory_offset()
        );

        let cache = entries.iter().map(|_| OnceCell::new()).collect();
        Ok(Self {
            data,
            header,
            entries,
            index,
            cache,
            warnings: RefCell::new(warnings),
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// All directory entries in file order.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn contains(&self, name: &str, number: u32) -> bool {
        self.index.contains_key(&TagKey::new(name, number))
    }

    pub fn entry(&self, name: &str, number: u32) -> Option<&DirectoryEntry> {
        self.index
            .get(&TagKey::new(name, number))
            .map(|&i| &self.entries[i])
    }

    /// Returns the decoded value for `(name, number)`, decoding it on first use.
    pub fn get(&self, name: &str, number: u32) -> AbifResult<Option<&TagValue>> {
        match self.index.get(&TagKey::new(name, number)) {
            Some(&i) => self.value_at(i).map(Some),
            None => Ok(None),
        }
    }

    /// Decoded value of the entry at directory position `i`.
    pub fn value_at(&self, i: usize) -> AbifResult<&TagValue> {
        let cell = &self.cache[i];
        if let Some(value) = cell.get() {
            return Ok(value);
        }
        let value = self.decode_entry(&self.entries[i])?;
        Ok(cell.get_or_init(|| value))
    }

    /// The bytes backing an entry, inline or at its file offset.
    pub fn entry_bytes<'a>(&'a self, entry: &'a DirectoryEntry) -> AbifResult<&'a [u8]> {
        let size = entry.data_size as usize;
        if entry.is_inline() {
            Ok(&entry.offset_field[..size])
        } else {
            checked_slice(&self.data, entry.data_offset() as usize, size)
        }
    }

    fn decode_entry(&self, entry: &DirectoryEntry) -> AbifResult<TagValue> {
        let bytes = self.entry_bytes(entry)?;
        let (value, warning) = value::decode(entry, bytes);
        if let Some(msg) = warning {
            warn!("{}", msg);
            self.warnings.borrow_mut().push(msg);
        }
        Ok(value)
    }

    /// Non-fatal problems recorded so far (duplicate keys, unknown types, ...).
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    pub(crate) fn push_warning(&self, msg: String) {
        warn!("{}", msg);
        self.warnings.borrow_mut().push(msg);
    }

    /// Total file size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &[u8; 4], number: u32, ty: u16, esize: u16, count: u32, size: u32, offset: [u8; 4]) -> Vec<u8> {
        let mut r = Vec::with_capacity(DIR_ENTRY_LEN);
        r.extend_from_slice(name);
        r.extend_from_slice(&number.to_be_bytes());
        r.extend_from_slice(&ty.to_be_bytes());
        r.extend_from_slice(&esize.to_be_bytes());
        r.extend_from_slice(&count.to_be_bytes());
        r.extend_from_slice(&size.to_be_bytes());
        r.extend_from_slice(&offset);
        r.extend_from_slice(&0u32.to_be_bytes());
        r
    }

    fn file_with(entries: &[Vec<u8>], payload: &[u8]) -> Vec<u8> {
        let dir_offset = (HEADER_LEN + payload.len()) as u32;
        let mut data = Vec::new();
        data.extend_from_slice(ABIF_MAGIC);
        data.extend_from_slice(&101u16.to_be_bytes());
        data.extend(record(
            b"tdir",
            1,
            1023,
            DIR_ENTRY_LEN as u16,
            entries.len() as u32,
            (entries.len() * DIR_ENTRY_LEN) as u32,
            dir_offset.to_be_bytes(),
        ));
        data.resize(HEADER_LEN, 0);
        data.extend_from_slice(payload);
        for e in entries {
            data.extend_from_slice(e);
        }
        data
    }

    #[test]
    fn test_bad_magic() {
        let err = AbifFile::from_bytes(b"GIF89a".to_vec()).unwrap_err();
        assert!(matches!(err, AbifError::Format { .. }));
        let err = AbifFile::from_bytes(Vec::new()).unwrap_err();
        assert!(matches!(err, AbifError::Format { .. }));
    }

    #[test]
    fn test_truncated_header() {
        let err = AbifFile::from_bytes(b"ABIF\x00\x65".to_vec()).unwrap_err();
        assert!(matches!(err, AbifError::Bounds { .. }));
    }

    #[test]
    fn test_header_summary_uses_record_layout() {
        let data = file_with(&[record(b"LANE", 1, 4, 2, 1, 2, [0, 7, 0, 0])], &[]);
        let file = AbifFile::from_bytes(data).unwrap();
        assert_eq!(file.header().version, 101);
        assert_eq!(file.header().directory.key, TagKey::new("tdir", 1));
        assert_eq!(file.header().entry_count(), 1);
        assert_eq!(file.header().directory_offset(), HEADER_LEN);
    }

    #[test]
    fn test_inline_value() {
        let data = file_with(&[record(b"LANE", 1, 4, 2, 1, 2, [0, 7, 0, 0])], &[]);
        let file = AbifFile::from_bytes(data).unwrap();
        assert!(file.entry("LANE", 1).unwrap().is_inline());
        assert_eq!(file.get("LANE", 1).unwrap(), Some(&TagValue::Shorts(vec![7])));
        assert_eq!(file.get("LANE", 2).unwrap(), None);
    }

    #[test]
    fn test_offset_value() {
        let payload = [0x00, 0x01, 0xFF, 0xFF, 0x80, 0x00];
        let data = file_with(
            &[record(b"DATA", 9, 4, 2, 3, 6, (HEADER_LEN as u32).to_be_bytes())],
            &payload,
        );
        let file = AbifFile::from_bytes(data).unwrap();
        assert!(!file.entry("DATA", 9).unwrap().is_inline());
        assert_eq!(
            file.get("DATA", 9).unwrap(),
            Some(&TagValue::Shorts(vec![1, -1, -32768]))
        );
    }

    #[test]
    fn test_offset_out_of_bounds() {
        let data = file_with(&[record(b"DATA", 9, 4, 2, 100, 200, 5000u32.to_be_bytes())], &[]);
        let file = AbifFile::from_bytes(data).unwrap();
        let err = file.get("DATA", 9).unwrap_err();
        assert!(matches!(err, AbifError::Bounds { offset: 5000, len: 200, .. }));
    }

    #[test]
    fn test_directory_out_of_bounds() {
        let mut data = file_with(&[], &[]);
        // Claim 3 entries at the end of the file.
        data[6 + 12..6 + 16].copy_from_slice(&3u32.to_be_bytes());
        let err = AbifFile::from_bytes(data).unwrap_err();
        assert!(matches!(err, AbifError::Bounds { .. }));
    }

    #[test]
    fn test_duplicate_key_warns() {
        let e = record(b"LANE", 1, 4, 2, 1, 2, [0, 7, 0, 0]);
        let data = file_with(&[e.clone(), e], &[]);
        let file = AbifFile::from_bytes(data).unwrap();
        assert_eq!(file.entries().len(), 2);
        assert_eq!(file.warnings().len(), 1);
    }

    #[test]
    fn test_tag_key_display() {
        assert_eq!(TagKey::new("DATA", 9).to_string(), "DATA_9");
    }
}
