//! Synthetic ABIF files for integration tests.

#![allow(dead_code)]

pub const HEADER_LEN: usize = 128;
pub const DIR_ENTRY_LEN: usize = 28;

struct Entry {
    name: [u8; 4],
    number: u32,
    type_code: u16,
    element_size: u16,
    count: u32,
    data: Vec<u8>,
    /// Overrides the computed offset (to produce out-of-range entries).
    offset: Option<u32>,
}

/// Builds an ABIF file entry by entry. Values of four bytes or less are
/// packed into the offset field; larger ones go after the header.
#[derive(Default)]
pub struct AbifBuilder {
    entries: Vec<Entry>,
}

fn tag(name: &str) -> [u8; 4] {
    let mut out = [b' '; 4];
    for (o, b) in out.iter_mut().zip(name.bytes()) {
        *o = b;
    }
    out
}

impl AbifBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, name: &str, number: u32, type_code: u16, element_size: u16, count: u32, data: Vec<u8>) -> Self {
        self.entries.push(Entry {
            name: tag(name),
            number,
            type_code,
            element_size,
            count,
            data,
            offset: None,
        });
        self
    }

    /// An entry whose declared data lies past the end of the file.
    pub fn dangling(mut self, name: &str, number: u32, type_code: u16, element_size: u16, count: u32) -> Self {
        let size = u32::from(element_size) * count;
        self.entries.push(Entry {
            name: tag(name),
            number,
            type_code,
            element_size,
            count,
            data: vec![0; size as usize],
            offset: Some(1_000_000),
        });
        self
    }

    pub fn bytes(self, name: &str, number: u32, values: &[u8]) -> Self {
        self.raw(name, number, 1, 1, values.len() as u32, values.to_vec())
    }

    pub fn chars(self, name: &str, number: u32, text: &[u8]) -> Self {
        self.raw(name, number, 2, 1, text.len() as u32, text.to_vec())
    }

    pub fn words(self, name: &str, number: u32, values: &[u16]) -> Self {
        let data = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.raw(name, number, 3, 2, values.len() as u32, data)
    }

    pub fn shorts(self, name: &str, number: u32, values: &[i16]) -> Self {
        let data = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.raw(name, number, 4, 2, values.len() as u32, data)
    }

    pub fn longs(self, name: &str, number: u32, values: &[i32]) -> Self {
        let data = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.raw(name, number, 5, 4, values.len() as u32, data)
    }

    pub fn floats(self, name: &str, number: u32, values: &[f32]) -> Self {
        let data = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.raw(name, number, 7, 4, values.len() as u32, data)
    }

    pub fn doubles(self, name: &str, number: u32, values: &[f64]) -> Self {
        let data = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.raw(name, number, 8, 8, values.len() as u32, data)
    }

    pub fn date(self, name: &str, number: u32, year: u16, month: u8, day: u8) -> Self {
        let mut data = year.to_be_bytes().to_vec();
        data.extend_from_slice(&[month, day]);
        self.raw(name, number, 10, 4, 1, data)
    }

    pub fn time(self, name: &str, number: u32, h: u8, m: u8, s: u8, hs: u8) -> Self {
        self.raw(name, number, 11, 4, 1, vec![h, m, s, hs])
    }

    pub fn bools(self, name: &str, number: u32, values: &[bool]) -> Self {
        let data = values.iter().map(|&b| u8::from(b)).collect();
        self.raw(name, number, 13, 1, values.len() as u32, data)
    }

    pub fn pstring(self, name: &str, number: u32, text: &str) -> Self {
        let mut data = vec![text.len() as u8];
        data.extend_from_slice(text.as_bytes());
        let len = data.len() as u32;
        self.raw(name, number, 18, 1, len, data)
    }

    pub fn cstring(self, name: &str, number: u32, text: &str) -> Self {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        let len = data.len() as u32;
        self.raw(name, number, 19, 1, len, data)
    }

    pub fn build(self) -> Vec<u8> {
        let mut payload = Vec::new();
        let mut offsets = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            if e.data.len() <= 4 && e.offset.is_none() {
                let mut packed = [0u8; 4];
                packed[..e.data.len()].copy_from_slice(&e.data);
                offsets.push(packed);
            } else if let Some(offset) = e.offset {
                offsets.push(offset.to_be_bytes());
            } else {
                offsets.push(((HEADER_LEN + payload.len()) as u32).to_be_bytes());
                payload.extend_from_slice(&e.data);
            }
        }

        let dir_offset = (HEADER_LEN + payload.len()) as u32;
        let mut data = Vec::new();
        data.extend_from_slice(b"ABIF");
        data.extend_from_slice(&101u16.to_be_bytes());
        data.extend(record(
            *b"tdir",
            1,
            1023,
            DIR_ENTRY_LEN as u16,
            self.entries.len() as u32,
            (self.entries.len() * DIR_ENTRY_LEN) as u32,
            dir_offset.to_be_bytes(),
        ));
        data.resize(HEADER_LEN, 0);
        data.extend_from_slice(&payload);
        for (e, offset) in self.entries.iter().zip(offsets) {
            data.extend(record(
                e.name,
                e.number,
                e.type_code,
                e.element_size,
                e.count,
                e.data.len() as u32,
                offset,
            ));
        }
        data
    }
}

fn record(name: [u8; 4], number: u32, ty: u16, esize: u16, count: u32, size: u32, offset: [u8; 4]) -> Vec<u8> {
    let mut r = Vec::with_capacity(DIR_ENTRY_LEN);
    r.extend_from_slice(&name);
    r.extend_from_slice(&number.to_be_bytes());
    r.extend_from_slice(&ty.to_be_bytes());
    r.extend_from_slice(&esize.to_be_bytes());
    r.extend_from_slice(&count.to_be_bytes());
    r.extend_from_slice(&size.to_be_bytes());
    r.extend_from_slice(&offset);
    r.extend_from_slice(&0u32.to_be_bytes());
    r
}

/// A small Sanger read: bases every 10 samples from sample 5, a Gaussian-ish
/// peak in the called channel under each base, instrument copies (number 2)
/// of calls, qualities and peaks.
pub fn sanger_builder(sequence: &str, quality: &[u8]) -> AbifBuilder {
    let n = sequence.len();
    let samples = n * 10 + 10;
    let peaks: Vec<i16> = (0..n).map(|i| (5 + i * 10) as i16).collect();
    let order = ['G', 'A', 'T', 'C'];

    let mut channels = vec![vec![0i16; samples]; 4];
    for (i, base) in sequence.chars().enumerate() {
        if let Some(ch) = order.iter().position(|&c| c == base) {
            let p = peaks[i] as usize;
            for (d, h) in [(0usize, 1000i16), (1, 600), (2, 200)] {
                channels[ch][p + d] = h;
                channels[ch][p - d] = h;
            }
        }
    }

    let mut builder = AbifBuilder::new()
        .chars("PBAS", 2, sequence.as_bytes())
        .chars("PCON", 2, quality)
        .shorts("PLOC", 2, &peaks)
        .chars("FWO_", 1, b"GATC")
        .pstring("SMPL", 1, "sample 42")
        .floats("SPAC", 1, &[10.0]);
    for (k, channel) in channels.iter().enumerate() {
        builder = builder.shorts("DATA", 9 + k as u32, channel);
    }
    builder
}

/// 30 bases with a low-quality head and tail.
pub const READ_SEQUENCE: &str = "NNACGTTGCAACGTACGTACGGATCCANNN";

pub fn read_quality() -> Vec<u8> {
    let mut q = vec![40u8; READ_SEQUENCE.len()];
    for i in [0, 1, 2, 27, 28, 29] {
        q[i] = 2;
    }
    q
}

pub fn sanger_read() -> Vec<u8> {
    sanger_builder(READ_SEQUENCE, &read_quality()).build()
}
