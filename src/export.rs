//! Plain-text output for command line mode.
//!
//! Writers take any [`Write`] so the binary can target a file or stdout.

use std::io::{self, Write};

use crate::abif::AbifFile;
use crate::chromatogram::ChromatogramSnapshot;

/// Sequence line width for FASTA output.
pub const FASTA_LINE_WIDTH: usize = 60;
/// Offset added to Phred scores in FASTQ output.
const PHRED_OFFSET: u8 = 33;
/// Highest score FASTQ can carry in one printable character.
const MAX_FASTQ_SCORE: u8 = 93;

/// Writes one FASTA record, wrapping the sequence.
pub fn write_fasta<W: Write>(out: &mut W, id: &str, snapshot: &ChromatogramSnapshot) -> io::Result<()> {
    writeln!(out, ">{}", id)?;
    for chunk in snapshot.sequence.as_bytes().chunks(FASTA_LINE_WIDTH) {
        out.write_all(chunk)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Writes one FASTQ record with Phred+33 qualities.
pub fn write_fastq<W: Write>(out: &mut W, id: &str, snapshot: &ChromatogramSnapshot) -> io::Result<()> {
    let quality: String = snapshot
        .quality_scores
        .iter()
        .map(|&q| (q.min(MAX_FASTQ_SCORE) + PHRED_OFFSET) as char)
        .collect();
    writeln!(out, "@{}", id)?;
    writeln!(out, "{}", snapshot.sequence)?;
    writeln!(out, "+")?;
    writeln!(out, "{}", quality)
}

/// Writes the tag directory, one entry per line, with a value preview.
///
/// Entries whose data cannot be read are listed with the error instead.
pub fn write_tag_table<W: Write>(out: &mut W, file: &AbifFile) -> io::Result<()> {
    writeln!(
        out,
        "ABIF version {}, {} entries",
        file.header().version,
        file.entries().len()
    )?;
    writeln!(out, "{:<10} {:<8} {:>8} {:>10}  value", "tag", "type", "count", "bytes")?;
    for (i, entry) in file.entries().iter().enumerate() {
        let value = match file.value_at(i) {
            Ok(v) => v.to_string(),
            Err(e) => format!("<{}>", e),
        };
        writeln!(
            out,
            "{:<10} {:<8} {:>8} {:>10}  {}",
            entry.key.to_string(),
            entry.element_type().to_string(),
            entry.element_count,
            entry.data_size,
            value
        )?;
    }
    Ok(())
}
