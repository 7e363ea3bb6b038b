//! # TraceTUI - Terminal Chromatogram Viewer
//!
//! A terminal-based viewer and editor for Sanger sequencing chromatograms
//! stored in the ABIF (`.ab1`) format, using ratatui.
//!
//! ## Architecture
//!
//! Data flows bottom-up through clearly separated layers:
//! - `abif`: binary container decoding (header, tag directory, typed values)
//! - `chromatogram`: the read model (calls, qualities, peaks, traces) and its
//!   edit/trim mutations
//! - `trim`: windowed quality trimming and quality statistics
//! - `viewport`, `selection`, `search`, `history`: view state over the model
//! - `notify`: events published to listeners when the view state changes
//! - `model`: the application state tying the above together
//! - `event`, `ui`, `controller`: keyboard/mouse handling, rendering and the
//!   main loop
//! - `export`: FASTA/FASTQ and tag listing for command line mode

pub mod abif;
pub mod chromatogram;
pub mod config;
pub mod controller;
pub mod event;
pub mod export;
pub mod history;
pub mod model;
pub mod notify;
pub mod search;
pub mod selection;
pub mod trim;
pub mod ui;
pub mod viewport;
