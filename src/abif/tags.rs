//! Well-known ABIF tags used by Sanger sequencers.
//!
//! Base calls, quality values and peak locations come in two copies: number 2
//! is what the instrument's base caller wrote, number 1 is the user-edited
//! copy. The edited copy wins when present.

use super::{AbifFile, AbifResult, TagValue};

pub const BASE_CALLS: &str = "PBAS";
pub const QUALITY: &str = "PCON";
pub const PEAK_LOCATIONS: &str = "PLOC";
pub const TRACE_DATA: &str = "DATA";
pub const FILTER_WHEEL_ORDER: &str = "FWO_";

/// DATA1..DATA4 hold the raw channels, DATA9..DATA12 the processed ones.
pub const RAW_TRACE_NUMBERS: [u32; 4] = [1, 2, 3, 4];
pub const PROCESSED_TRACE_NUMBERS: [u32; 4] = [9, 10, 11, 12];

/// Channel order used when FWO_1 is missing.
pub const DEFAULT_CHANNEL_ORDER: [char; 4] = ['G', 'A', 'T', 'C'];

/// Descriptive fields shown in the info overlay.
pub const METADATA_TAGS: [(&str, u32, &str); 10] = [
    ("SMPL", 1, "Sample"),
    ("RunN", 1, "Run"),
    ("MCHN", 1, "Instrument"),
    ("MODL", 1, "Model"),
    ("TUBE", 1, "Well"),
    ("DySN", 1, "Dye set"),
    ("CMNT", 1, "Comment"),
    ("RUND", 1, "Run date"),
    ("RUNT", 1, "Run time"),
    ("LANE", 1, "Lane"),
];

pub const PEAK_SPACING: (&str, u32) = ("SPAC", 1);

impl AbifFile {
    /// Edited copy (number 1) if present, otherwise the instrument copy (2).
    fn edited_or_called(&self, name: &str) -> AbifResult<Option<&TagValue>> {
        match self.get(name, 1)? {
            Some(value) => Ok(Some(value)),
            None => self.get(name, 2),
        }
    }

    /// Called bases. Empty when the file carries no base calls.
    pub fn base_calls(&self) -> AbifResult<String> {
        Ok(self
            .edited_or_called(BASE_CALLS)?
            .and_then(TagValue::as_text)
            .unwrap_or_default())
    }

    /// Per-base Phred quality values.
    pub fn quality_scores(&self) -> AbifResult<Vec<u8>> {
        Ok(self
            .edited_or_called(QUALITY)?
            .and_then(TagValue::as_bytes)
            .map(<[u8]>::to_vec)
            .unwrap_or_default())
    }

    /// Sample index of each called base. Negative values are clamped to 0.
    pub fn peak_locations(&self) -> AbifResult<Vec<usize>> {
        Ok(self
            .edited_or_called(PEAK_LOCATIONS)?
            .and_then(TagValue::to_integers)
            .map(|v| v.into_iter().map(|x| x.max(0) as usize).collect())
            .unwrap_or_default())
    }

    /// Trace channel `channel` (0..4), processed or raw.
    pub fn trace(&self, channel: usize, raw: bool) -> AbifResult<Vec<i32>> {
        let numbers = if raw {
            RAW_TRACE_NUMBERS
        } else {
            PROCESSED_TRACE_NUMBERS
        };
        let Some(&number) = numbers.get(channel) else {
            return Ok(Vec::new());
        };
        Ok(self
            .get(TRACE_DATA, number)?
            .and_then(TagValue::to_integers)
            .map(|v| v.into_iter().map(|x| x as i32).collect())
            .unwrap_or_default())
    }

    /// True when all four raw channels are present.
    pub fn has_raw_traces(&self) -> bool {
        RAW_TRACE_NUMBERS
            .iter()
            .all(|&n| self.contains(TRACE_DATA, n))
    }

    /// Nucleotide carried by each trace channel, G,A,T,C by default.
    pub fn channel_order(&self) -> AbifResult<[char; 4]> {
        let text = self
            .get(FILTER_WHEEL_ORDER, 1)?
            .and_then(TagValue::as_text)
            .unwrap_or_default();
        let letters: Vec<char> = text.chars().map(|c| c.to_ascii_uppercase()).collect();
        if letters.len() < 4 {
            if !text.is_empty() {
                self.push_warning(format!(
                    "Filter wheel order {:?} is too short, using GATC",
                    text
                ));
            }
            return Ok(DEFAULT_CHANNEL_ORDER);
        }
        Ok([letters[0], letters[1], letters[2], letters[3]])
    }

    /// Label/value pairs of the descriptive tags present in the file.
    pub fn metadata_fields(&self) -> AbifResult<Vec<(String, String)>> {
        let mut fields = Vec::new();
        for (name, number, label) in METADATA_TAGS {
            if let Some(value) = self.get(name, number)? {
                let text = match value.as_text() {
                    Some(text) => text,
                    None => match value.to_integers() {
                        Some(ints) if ints.len() == 1 => ints[0].to_string(),
                        _ => value.to_string(),
                    },
                };
                fields.push((label.to_string(), text.trim().to_string()));
            }
        }
        Ok(fields)
    }

    /// Average peak spacing in samples, if recorded.
    pub fn peak_spacing(&self) -> AbifResult<Option<f64>> {
        let (name, number) = PEAK_SPACING;
        Ok(self.get(name, number)?.and_then(TagValue::first_number))
    }
}
