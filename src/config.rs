//! Viewer settings.
//!
//! Every tunable lives here with its default; the binary overrides the
//! user-facing ones from command line arguments.

use std::time::Duration;

use crate::trim::{DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Window average that starts the kept region.
    pub upper_threshold: f64,
    /// Window average that ends the kept region.
    pub lower_threshold: f64,
    /// Samples kept on each side of the outermost peaks when trimming.
    pub trim_padding: usize,
    /// Columns per sample bounds.
    pub min_scale: f64,
    pub max_scale: f64,
    /// Column distance for resolving a base under the pointer.
    pub hover_threshold: f64,
    pub drag_threshold: f64,
    /// Width of the auto-scroll zones at the panel edges, in columns.
    pub auto_scroll_margin: f64,
    /// Columns scrolled per tick while auto-scrolling.
    pub auto_scroll_step: f64,
    /// Factor applied by one zoom key press.
    pub zoom_step: f64,
    pub history_capacity: usize,
    pub tick_rate: Duration,
    /// Use plain ASCII glyphs instead of block characters.
    pub ascii: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            upper_threshold: DEFAULT_UPPER_THRESHOLD,
            lower_threshold: DEFAULT_LOWER_THRESHOLD,
            trim_padding: 10,
            min_scale: 0.002,
            max_scale: 4.0,
            hover_threshold: 1.5,
            drag_threshold: 4.0,
            auto_scroll_margin: 3.0,
            auto_scroll_step: 4.0,
            zoom_step: 1.5,
            history_capacity: 100,
            tick_rate: Duration::from_millis(50),
            ascii: false,
        }
    }
}
