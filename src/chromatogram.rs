//! Chromatogram data model.
//!
//! A [`Chromatogram`] holds the base calls, quality values and peak locations
//! of one read together with its four trace channels. The three per-base
//! arrays always have the same length and peak locations never decrease;
//! every mutation either keeps that true or is rejected without touching
//! the model.

use std::fmt;

use log::{info, warn};
use thiserror::Error;

use crate::abif::{AbifFile, AbifResult};

/// Stored for deleted or unknown bases.
pub const AMBIGUITY_CODE: char = 'N';

/// Letters accepted by [`Chromatogram::edit_base`].
const IUPAC_BASES: &str = "ACGTNRYSWKMBDHV";

/// A trace channel's nucleotide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
}

impl Nucleotide {
    pub const ALL: [Nucleotide; 4] = [Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::T];

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Nucleotide::A),
            'C' => Some(Nucleotide::C),
            'G' => Some(Nucleotide::G),
            'T' => Some(Nucleotide::T),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::T => 'T',
        }
    }
}

impl fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Errors returned by model mutations. The model is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid range {start}..{end} for a read of {len} bases")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Base {index} is out of range (read has {len} bases)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid base {0:?}")]
    InvalidBase(char),
}

/// Descriptive run information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Label/value pairs in display order.
    pub fields: Vec<(String, String)>,
    /// Average peak spacing in samples.
    pub peak_spacing: Option<f64>,
}

impl Metadata {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn sample_name(&self) -> Option<&str> {
        self.get("Sample")
    }
}

/// Four trace channels in file order.
pub type Channels = [Vec<i32>; 4];

/// Owned copy of the model handed to export and rendering collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromatogramSnapshot {
    pub sequence: String,
    pub quality_scores: Vec<u8>,
    pub peak_locations: Vec<usize>,
    pub traces: Vec<(Nucleotide, Vec<i32>)>,
    pub raw_traces: Option<Vec<(Nucleotide, Vec<i32>)>>,
    pub channel_order: [Nucleotide; 4],
    pub metadata: Metadata,
    pub revision: u64,
}

/// Result of a successful destructive trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimApplied {
    /// Number of bases kept.
    pub bases: usize,
    /// Sample index (in the old traces) where the new traces start.
    pub sample_offset: usize,
}

/// The chromatogram of one read.
#[derive(Debug, Clone)]
pub struct Chromatogram {
    sequence: String,
    quality: Vec<u8>,
    peaks: Vec<usize>,
    traces: Channels,
    raw_traces: Option<Channels>,
    channel_order: [Nucleotide; 4],
    metadata: Metadata,
    /// Calls as loaded (or as of the last trim); edits are diffs against this.
    called: Vec<u8>,
    revision: u64,
    warnings: Vec<String>,
}

impl Chromatogram {
    /// Decodes an ABIF file and assembles the model. Nothing is returned on
    /// a format error.
    pub fn load(bytes: Vec<u8>) -> AbifResult<Self> {
        let file = AbifFile::from_bytes(bytes)?;
        Self::from_abif(&file)
    }

    /// Assembles the model from a decoded file. Missing tags become empty data.
    pub fn from_abif(file: &AbifFile) -> AbifResult<Self> {
        let sequence = file.base_calls()?;
        let quality = file.quality_scores()?;
        let peaks = file.peak_locations()?;

        let mut traces: Channels = Default::default();
        for (channel, trace) in traces.iter_mut().enumerate() {
            *trace = file.trace(channel, false)?;
        }
        let raw_traces = if file.has_raw_traces() {
            let mut raw: Channels = Default::default();
            for (channel, trace) in raw.iter_mut().enumerate() {
                *trace = file.trace(channel, true)?;
            }
            Some(raw)
        } else {
            None
        };

        let order = file.channel_order()?;
        let metadata = Metadata {
            fields: file.metadata_fields()?,
            peak_spacing: file.peak_spacing()?,
        };

        let mut model = Self::assemble(&sequence, quality, peaks, traces, raw_traces, order);
        model.metadata = metadata;
        let mut warnings = file.warnings();
        warnings.append(&mut model.warnings);
        model.warnings = warnings;

        info!(
            "Loaded chromatogram: {} bases, {} samples, channels {}",
            model.len(),
            model.trace_len(),
            model.channel_order.iter().map(Nucleotide::as_char).collect::<String>()
        );
        Ok(model)
    }

    /// Builds a model from already decoded arrays, repairing inconsistencies.
    pub fn from_parts(
        sequence: &str,
        quality: Vec<u8>,
        peaks: Vec<usize>,
        traces: Channels,
        channel_order: [char; 4],
    ) -> Self {
        Self::assemble(sequence, quality, peaks, traces, None, channel_order)
    }

    /// Attaches raw channels to a model built with [`Chromatogram::from_parts`].
    pub fn with_raw_traces(mut self, raw: Channels) -> Self {
        self.raw_traces = Some(raw);
        self
    }

    fn assemble(
        sequence: &str,
        mut quality: Vec<u8>,
        mut peaks: Vec<usize>,
        traces: Channels,
        raw_traces: Option<Channels>,
        order: [char; 4],
    ) -> Self {
        let mut warnings = Vec::new();

        let mut sequence: String = sequence
            .chars()
            .map(|c| {
                let c = c.to_ascii_uppercase();
                if c.is_ascii_alphabetic() || c == '-' {
                    c
                } else {
                    AMBIGUITY_CODE
                }
            })
            .collect();

        if quality.is_empty() && !sequence.is_empty() {
            warnings.push("No quality values; using 0 for every base".to_string());
            quality = vec![0; sequence.len()];
        }

        let len = sequence.len().min(quality.len()).min(peaks.len());
        if sequence.len() != len || quality.len() != len || peaks.len() != len {
            warnings.push(format!(
                "Mismatched array lengths (bases {}, qualities {}, peaks {}); keeping {}",
                sequence.len(),
                quality.len(),
                peaks.len(),
                len
            ));
            sequence.truncate(len);
            quality.truncate(len);
            peaks.truncate(len);
        }

        if peaks.windows(2).any(|w| w[1] < w[0]) {
            warnings.push("Peak locations were not sorted; repaired".to_string());
            let mut max = 0;
            for p in peaks.iter_mut() {
                max = max.max(*p);
                *p = max;
            }
        }

        let channel_order = match (
            Nucleotide::from_char(order[0]),
            Nucleotide::from_char(order[1]),
            Nucleotide::from_char(order[2]),
            Nucleotide::from_char(order[3]),
        ) {
            (Some(a), Some(b), Some(c), Some(d))
                if a != b && a != c && a != d && b != c && b != d && c != d =>
            {
                [a, b, c, d]
            }
            _ => {
                warnings.push(format!(
                    "Unrecognised channel order {:?}; using GATC",
                    order.iter().collect::<String>()
                ));
                [Nucleotide::G, Nucleotide::A, Nucleotide::T, Nucleotide::C]
            }
        };

        for msg in &warnings {
            warn!("{}", msg);
        }

        Self {
            called: sequence.as_bytes().to_vec(),
            sequence,
            quality,
            peaks,
            traces,
            raw_traces,
            channel_order,
            metadata: Metadata::default(),
            revision: 0,
            warnings,
        }
    }

    /// Number of bases.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn quality_scores(&self) -> &[u8] {
        &self.quality
    }

    pub fn peak_locations(&self) -> &[usize] {
        &self.peaks
    }

    pub fn base_at(&self, index: usize) -> Option<char> {
        self.sequence.as_bytes().get(index).map(|&b| b as char)
    }

    pub fn channel_order(&self) -> [Nucleotide; 4] {
        self.channel_order
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Bumped by every load, edit and trim.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_raw_traces(&self) -> bool {
        self.raw_traces.is_some()
    }

    /// Trace of one nucleotide; empty when the channel is absent.
    pub fn trace(&self, base: Nucleotide, raw: bool) -> &[i32] {
        let channels = match (raw, &self.raw_traces) {
            (true, Some(raw)) => raw,
            _ => &self.traces,
        };
        self.channel_order
            .iter()
            .position(|&b| b == base)
            .map(|i| channels[i].as_slice())
            .unwrap_or(&[])
    }

    /// Number of samples in the longest processed channel.
    pub fn trace_len(&self) -> usize {
        self.traces.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Largest processed (or raw) signal value, for vertical scaling.
    pub fn max_signal(&self, raw: bool) -> i32 {
        Nucleotide::ALL
            .iter()
            .flat_map(|&b| self.trace(b, raw).iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// True when the base at `index` differs from the loaded call.
    pub fn is_modified(&self, index: usize) -> bool {
        matches!(
            (self.sequence.as_bytes().get(index), self.called.get(index)),
            (Some(a), Some(b)) if a != b
        )
    }

    pub fn has_edits(&self) -> bool {
        self.sequence.as_bytes() != self.called.as_slice()
    }

    /// Indices of edited bases.
    pub fn modified_positions(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.is_modified(i)).collect()
    }

    /// Replaces the base at `index`; `None` stores the ambiguity code.
    /// Returns the previous base.
    pub fn edit_base(&mut self, index: usize, new_base: Option<char>) -> Result<char, ModelError> {
        let len = self.len();
        if index >= len {
            return Err(ModelError::IndexOutOfRange { index, len });
        }
        let base = new_base.unwrap_or(AMBIGUITY_CODE).to_ascii_uppercase();
        if !IUPAC_BASES.contains(base) {
            return Err(ModelError::InvalidBase(base));
        }
        Ok(self.replace_at(index, base))
    }

    /// Puts back a base taken from this read (undo/redo). Any character a
    /// loaded read may hold is accepted, not only IUPAC letters.
    pub fn restore_base(&mut self, index: usize, base: char) -> Result<char, ModelError> {
        let len = self.len();
        if index >= len {
            return Err(ModelError::IndexOutOfRange { index, len });
        }
        if !base.is_ascii() {
            return Err(ModelError::InvalidBase(base));
        }
        Ok(self.replace_at(index, base))
    }

    fn replace_at(&mut self, index: usize, base: char) -> char {
        let old = self.sequence.as_bytes()[index] as char;
        let mut buf = [0u8; 4];
        self.sequence
            .replace_range(index..index + 1, base.encode_utf8(&mut buf));
        self.revision += 1;
        old
    }

    /// Destructively keeps bases `start..=end` and the matching stretch of
    /// trace, plus `padding` samples on each side.
    pub fn apply_trim(
        &mut self,
        start: usize,
        end: usize,
        padding: usize,
    ) -> Result<TrimApplied, ModelError> {
        let len = self.len();
        if start > end || end >= len {
            return Err(ModelError::InvalidRange { start, end, len });
        }

        let sample_start = self.peaks[start].saturating_sub(padding);
        let sample_end = self.peaks[end].saturating_add(padding + 1);
        let slice = |trace: &Vec<i32>| -> Vec<i32> {
            let lo = sample_start.min(trace.len());
            let hi = sample_end.min(trace.len());
            trace[lo..hi].to_vec()
        };

        let traces: Channels = [
            slice(&self.traces[0]),
            slice(&self.traces[1]),
            slice(&self.traces[2]),
            slice(&self.traces[3]),
        ];
        let raw_traces = self
            .raw_traces
            .as_ref()
            .map(|raw| [slice(&raw[0]), slice(&raw[1]), slice(&raw[2]), slice(&raw[3])]);
        let peaks: Vec<usize> = self.peaks[start..=end]
            .iter()
            .map(|&p| p - sample_start)
            .collect();

        self.sequence = self.sequence[start..=end].to_string();
        self.quality = self.quality[start..=end].to_vec();
        self.peaks = peaks;
        self.traces = traces;
        self.raw_traces = raw_traces;
        self.called = self.sequence.as_bytes().to_vec();
        self.revision += 1;

        info!(
            "Trimmed to bases {}..={} ({} bases, {} samples)",
            start,
            end,
            self.len(),
            self.trace_len()
        );
        Ok(TrimApplied {
            bases: self.len(),
            sample_offset: sample_start,
        })
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> ChromatogramSnapshot {
        let keyed = |channels: &Channels| -> Vec<(Nucleotide, Vec<i32>)> {
            self.channel_order
                .iter()
                .zip(channels.iter())
                .map(|(&b, t)| (b, t.clone()))
                .collect()
        };
        ChromatogramSnapshot {
            sequence: self.sequence.clone(),
            quality_scores: self.quality.clone(),
            peak_locations: self.peaks.clone(),
            traces: keyed(&self.traces),
            raw_traces: self.raw_traces.as_ref().map(keyed),
            channel_order: self.channel_order,
            metadata: self.metadata.clone(),
            revision: self.revision,
        }
    }

    /// Marks the model as freshly loaded at the given revision.
    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }
}
