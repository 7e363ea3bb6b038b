//! Typed values of ABIF directory entries.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

use super::DirectoryEntry;

/// Element type codes defined by the ABIF format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Byte,
    Char,
    Word,
    Short,
    Long,
    Float,
    Double,
    Date,
    Time,
    Bool,
    PString,
    CString,
    Unknown(u16),
}

impl ElementType {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => ElementType::Byte,
            2 => ElementType::Char,
            3 => ElementType::Word,
            4 => ElementType::Short,
            5 => ElementType::Long,
            7 => ElementType::Float,
            8 => ElementType::Double,
            10 => ElementType::Date,
            11 => ElementType::Time,
            13 => ElementType::Bool,
            18 => ElementType::PString,
            19 => ElementType::CString,
            other => ElementType::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            ElementType::Byte => 1,
            ElementType::Char => 2,
            ElementType::Word => 3,
            ElementType::Short => 4,
            ElementType::Long => 5,
            ElementType::Float => 7,
            ElementType::Double => 8,
            ElementType::Date => 10,
            ElementType::Time => 11,
            ElementType::Bool => 13,
            ElementType::PString => 18,
            ElementType::CString => 19,
            ElementType::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Byte => write!(f, "byte"),
            ElementType::Char => write!(f, "char"),
            ElementType::Word => write!(f, "word"),
            ElementType::Short => write!(f, "short"),
            ElementType::Long => write!(f, "long"),
            ElementType::Float => write!(f, "float"),
            ElementType::Double => write!(f, "double"),
            ElementType::Date => write!(f, "date"),
            ElementType::Time => write!(f, "time"),
            ElementType::Bool => write!(f, "bool"),
            ElementType::PString => write!(f, "pString"),
            ElementType::CString => write!(f, "cString"),
            ElementType::Unknown(code) => write!(f, "type{}", code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbifDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl fmt::Display for AbifDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbifTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl fmt::Display for AbifTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:02}",
            self.hour, self.minute, self.second, self.hundredths
        )
    }
}

/// A decoded directory value. One variant per element type, plus a raw
/// hex fallback for type codes the decoder does not understand.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Bytes(Vec<u8>),
    Chars(Vec<u8>),
    Words(Vec<u16>),
    Shorts(Vec<i16>),
    Longs(Vec<i32>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Bools(Vec<bool>),
    Date(AbifDate),
    Time(AbifTime),
    PString(String),
    CString(String),
    Raw { type_code: u16, hex: String },
}

impl TagValue {
    /// Text content of char arrays and strings.
    pub fn as_text(&self) -> Option<String> {
        match self {
            TagValue::Chars(bytes) | TagValue::Bytes(bytes) => {
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
            TagValue::PString(s) | TagValue::CString(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Raw bytes of byte and char arrays.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TagValue::Bytes(bytes) | TagValue::Chars(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Integer arrays widened to `i64`.
    pub fn to_integers(&self) -> Option<Vec<i64>> {
        match self {
            TagValue::Bytes(v) | TagValue::Chars(v) => Some(v.iter().map(|&x| x as i64).collect()),
            TagValue::Words(v) => Some(v.iter().map(|&x| x as i64).collect()),
            TagValue::Shorts(v) => Some(v.iter().map(|&x| x as i64).collect()),
            TagValue::Longs(v) => Some(v.iter().map(|&x| x as i64).collect()),
            _ => None,
        }
    }

    /// First element of a numeric array as `f64`.
    pub fn first_number(&self) -> Option<f64> {
        match self {
            TagValue::Floats(v) => v.first().map(|&x| x as f64),
            TagValue::Doubles(v) => v.first().copied(),
            other => other.to_integers().and_then(|v| v.first().map(|&x| x as f64)),
        }
    }
}

/// Short human-readable rendering, truncated for long arrays.
impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 8;

        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            write!(f, "[")?;
            for (i, item) in items.iter().take(PREVIEW).enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            if items.len() > PREVIEW {
                write!(f, ", ... ({} total)", items.len())?;
            }
            write!(f, "]")
        }

        match self {
            TagValue::Chars(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                if text.chars().count() > 40 {
                    let head: String = text.chars().take(40).collect();
                    write!(f, "\"{}...\" ({} chars)", head, bytes.len())
                } else {
                    write!(f, "\"{}\"", text)
                }
            }
            TagValue::Bytes(v) => list(f, v),
            TagValue::Words(v) => list(f, v),
            TagValue::Shorts(v) => list(f, v),
            TagValue::Longs(v) => list(f, v),
            TagValue::Floats(v) => list(f, v),
            TagValue::Doubles(v) => list(f, v),
            TagValue::Bools(v) => list(f, v),
            TagValue::Date(d) => write!(f, "{}", d),
            TagValue::Time(t) => write!(f, "{}", t),
            TagValue::PString(s) | TagValue::CString(s) => write!(f, "\"{}\"", s),
            TagValue::Raw { type_code, hex } => write!(f, "raw(type {}) 0x{}", type_code, hex),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Fixed-size big-endian array of at most `count` elements.
fn array<T>(bytes: &[u8], size: usize, count: usize, read: fn(&[u8]) -> T) -> Vec<T> {
    bytes.chunks_exact(size).take(count).map(read).collect()
}

fn raw(entry: &DirectoryEntry, bytes: &[u8]) -> TagValue {
    TagValue::Raw {
        type_code: entry.type_code,
        hex: hex(bytes),
    }
}

/// Decodes `bytes` according to the entry's element type.
///
/// Never fails: unknown or malformed values become [`TagValue::Raw`] and a
/// warning message is returned alongside.
pub(crate) fn decode(entry: &DirectoryEntry, bytes: &[u8]) -> (TagValue, Option<String>) {
    let count = entry.element_count as usize;
    let value = match entry.element_type() {
        ElementType::Byte => TagValue::Bytes(bytes.iter().take(count).copied().collect()),
        ElementType::Char => TagValue::Chars(bytes.iter().take(count).copied().collect()),
        ElementType::Word => TagValue::Words(array(bytes, 2, count, BigEndian::read_u16)),
        ElementType::Short => TagValue::Shorts(array(bytes, 2, count, BigEndian::read_i16)),
        ElementType::Long => TagValue::Longs(array(bytes, 4, count, BigEndian::read_i32)),
        ElementType::Float => TagValue::Floats(array(bytes, 4, count, BigEndian::read_f32)),
        ElementType::Double => TagValue::Doubles(array(bytes, 8, count, BigEndian::read_f64)),
        ElementType::Bool => TagValue::Bools(bytes.iter().take(count).map(|&b| b != 0).collect()),
        ElementType::Date => {
            if bytes.len() < 4 {
                let msg = format!("Tag {}: date value too short ({} bytes)", entry.key, bytes.len());
                return (raw(entry, bytes), Some(msg));
            }
            TagValue::Date(AbifDate {
                year: BigEndian::read_u16(&bytes[0..2]),
                month: bytes[2],
                day: bytes[3],
            })
        }
        ElementType::Time => {
            if bytes.len() < 4 {
                let msg = format!("Tag {}: time value too short ({} bytes)", entry.key, bytes.len());
                return (raw(entry, bytes), Some(msg));
            }
            TagValue::Time(AbifTime {
                hour: bytes[0],
                minute: bytes[1],
                second: bytes[2],
                hundredths: bytes[3],
            })
        }
        ElementType::PString => {
            let text = match bytes.split_first() {
                Some((&len, rest)) => &rest[..rest.len().min(len as usize)],
                None => &[][..],
            };
            TagValue::PString(String::from_utf8_lossy(text).into_owned())
        }
        ElementType::CString => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            TagValue::CString(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
        ElementType::Unknown(code) => {
            let msg = format!(
                "Tag {}: unknown element type {}, kept as raw bytes",
                entry.key, code
            );
            return (raw(entry, bytes), Some(msg));
        }
    };
    (value, None)
}
