//! Application state for the chromatogram viewer.
//!
//! [`AppState`] is the single context object the front end works against: it
//! owns the loaded [`Chromatogram`] and the view state derived from it
//! (viewport, selection, search, edit history, cursor) and keeps them
//! consistent. Every operation runs to completion, including invalidation of
//! dependent view state, before the next input is handled.

use log::info;

use crate::abif::AbifResult;
use crate::chromatogram::{Chromatogram, ModelError};
use crate::config::ViewerConfig;
use crate::history::{EditCommand, EditHistory};
use crate::notify::{EventBus, LogListener, ViewEvent, ViewListener};
use crate::search::{SearchMatch, SearchState};
use crate::selection::{DragOutcome, Selection, SelectionEngine};
use crate::trim::{find_trim_points, quality_stats, QualityStats, TrimPoints};
use crate::viewport::{ScrollDirection, Viewport};

/// Application mode for handling different input states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Command input mode (after pressing ':')
    Command(String),
    /// Search input mode (after pressing '/')
    Search(String),
    /// Waiting for the replacement base (after pressing 'r')
    Replace,
}

/// Full-screen panels drawn over the traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
    Info,
}

/// The complete application state.
#[derive(Debug)]
pub struct AppState {
    /// The loaded read
    pub chromatogram: Chromatogram,
    /// Name shown in the title bar
    pub file_name: String,
    pub config: ViewerConfig,
    pub viewport: Viewport,
    pub selection: SelectionEngine,
    pub search: SearchState,
    pub history: EditHistory,
    /// Base under the keyboard cursor
    pub cursor: usize,
    /// Base under the mouse pointer
    pub hover: Option<usize>,
    /// Last pointer column while dragging, for edge auto-scroll
    pub drag_pointer: Option<f64>,
    pub mode: AppMode,
    pub overlay: Option<Overlay>,
    /// Draw raw instead of processed traces
    pub show_raw: bool,
    /// Trim points computed by `:trimpreview`, not yet applied
    pub trim_preview: Option<TrimPoints>,
    /// Whether the application should quit
    pub should_quit: bool,
    /// Status message to display
    pub status_message: Option<String>,
    events: EventBus,
}

impl AppState {
    /// Creates the state for a loaded chromatogram.
    pub fn new(chromatogram: Chromatogram, file_name: impl Into<String>, config: ViewerConfig) -> Self {
        let viewport = Viewport::new(
            config.min_scale,
            config.max_scale,
            config.hover_threshold,
            config.drag_threshold,
        );
        let history = EditHistory::new(config.history_capacity);
        let status_message = match chromatogram.warnings().len() {
            0 => None,
            1 => Some(format!("Warning: {}", chromatogram.warnings()[0])),
            n => Some(format!("{} warnings while loading (see log)", n)),
        };
        let mut events = EventBus::new();
        events.subscribe(Box::new(LogListener));

        Self {
            chromatogram,
            file_name: file_name.into(),
            config,
            viewport,
            selection: SelectionEngine::new(),
            search: SearchState::new(),
            history,
            cursor: 0,
            hover: None,
            drag_pointer: None,
            mode: AppMode::Normal,
            overlay: None,
            show_raw: false,
            trim_preview: None,
            should_quit: false,
            status_message,
            events,
        }
    }

    /// Registers a listener for view events.
    pub fn subscribe(&mut self, listener: Box<dyn ViewListener>) {
        self.events.subscribe(listener);
    }

    fn publish(&mut self, event: ViewEvent) {
        self.events.publish(event);
    }

    fn publish_snapshot(&mut self) {
        let revision = self.chromatogram.revision();
        self.publish(ViewEvent::SnapshotPublished { revision });
    }

    // ----- Model lifecycle -----

    /// Replaces the model with a newly decoded file. On error nothing changes.
    pub fn load(&mut self, bytes: Vec<u8>, file_name: impl Into<String>) -> AbifResult<()> {
        let mut chromatogram = Chromatogram::load(bytes)?;
        chromatogram.set_revision(self.chromatogram.revision() + 1);
        self.chromatogram = chromatogram;
        self.file_name = file_name.into();
        self.history.clear();
        self.invalidate_indices();
        self.status_message = match self.chromatogram.warnings().len() {
            0 => Some(format!("Loaded {}", self.file_name)),
            n => Some(format!("Loaded {} with {} warnings", self.file_name, n)),
        };
        for warning in self.chromatogram.warnings().to_vec() {
            self.publish(ViewEvent::Warning(warning));
        }
        self.publish_snapshot();
        Ok(())
    }

    /// Drops every piece of view state that holds base or sample indices.
    fn invalidate_indices(&mut self) {
        if self.selection.clear() {
            self.publish(ViewEvent::SelectionCleared);
        }
        self.search.clear();
        self.trim_preview = None;
        self.drag_pointer = None;
        self.hover = None;
        self.cursor = 0;
        self.viewport.reset(self.chromatogram.trace_len());
    }

    /// Updates the viewport size based on terminal dimensions.
    pub fn update_viewport_size(&mut self, width: usize) {
        if self.viewport.width() == 0.0 {
            self.viewport
                .fit_to_view(width as f64, self.chromatogram.trace_len());
        } else {
            self.viewport.resize(width as f64);
        }
    }

    // ----- Editing -----

    /// Replaces the base at `index` and records the edit for undo.
    pub fn edit_base(&mut self, index: usize, new_base: Option<char>) -> Result<(), ModelError> {
        let old_base = self.chromatogram.edit_base(index, new_base)?;
        let new_base = self.chromatogram.base_at(index).unwrap_or(old_base);
        self.history.push(EditCommand {
            index,
            old_base,
            new_base,
        });
        self.after_sequence_change();
        Ok(())
    }

    /// Edits the cursor base, reporting failures in the status bar.
    pub fn edit_at_cursor(&mut self, new_base: Option<char>) {
        let index = self.cursor;
        match self.edit_base(index, new_base) {
            Ok(()) => {
                self.status_message = Some(format!(
                    "Base {} set to {}",
                    index + 1,
                    self.chromatogram.base_at(index).unwrap_or('?')
                ));
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(command) = self.history.undo() else {
            self.status_message = Some("Already at oldest change".to_string());
            return false;
        };
        if let Err(e) = self.chromatogram.restore_base(command.index, command.old_base) {
            self.history.cancel_undo();
            self.status_message = Some(e.to_string());
            return false;
        }
        self.cursor = command.index;
        self.ensure_cursor_visible();
        self.after_sequence_change();
        self.status_message = Some(format!("Undo: base {} back to {}", command.index + 1, command.old_base));
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(command) = self.history.redo() else {
            self.status_message = Some("Already at newest change".to_string());
            return false;
        };
        if let Err(e) = self.chromatogram.restore_base(command.index, command.new_base) {
            self.history.cancel_redo();
            self.status_message = Some(e.to_string());
            return false;
        }
        self.cursor = command.index;
        self.ensure_cursor_visible();
        self.after_sequence_change();
        self.status_message = Some(format!("Redo: base {} set to {}", command.index + 1, command.new_base));
        true
    }

    /// Edits keep lengths, but the matches may have changed.
    fn after_sequence_change(&mut self) {
        if !self.search.pattern().is_empty() {
            let previous = self.search.current().map(|m| m.start);
            let pattern = self.search.pattern().to_string();
            self.search.search(self.chromatogram.sequence(), &pattern);
            if let Some(start) = previous {
                self.search.seek(start);
            }
            self.publish_search();
        }
        self.publish_snapshot();
    }

    // ----- Trimming -----

    /// Destructively keeps bases `start..=end`.
    pub fn apply_trim(&mut self, start: usize, end: usize) -> Result<(), ModelError> {
        self.chromatogram
            .apply_trim(start, end, self.config.trim_padding)?;
        self.history.clear();
        self.invalidate_indices();
        self.publish(ViewEvent::TrimApplied { start, end });
        self.publish_snapshot();
        self.status_message = Some(format!(
            "Trimmed to bases {}-{} ({} bases)",
            start + 1,
            end + 1,
            self.chromatogram.len()
        ));
        Ok(())
    }

    /// Trim points for the current read with the given thresholds.
    pub fn compute_trim(&self, upper: f64, lower: f64) -> Option<TrimPoints> {
        find_trim_points(self.chromatogram.quality_scores(), upper, lower)
    }

    /// Finds and applies quality trim points. Reads where no window reaches
    /// the upper threshold are left untouched.
    pub fn quality_trim(&mut self, upper: f64, lower: f64) {
        match self.compute_trim(upper, lower) {
            None => self.status_message = Some("Nothing to trim".to_string()),
            Some(points) if !points.passed => {
                self.status_message = Some(format!(
                    "No region reaches quality {}; read left untouched",
                    upper
                ));
            }
            Some(points) => {
                if let Err(e) = self.apply_trim(points.start, points.end) {
                    self.status_message = Some(e.to_string());
                }
            }
        }
    }

    /// Computes trim points without applying them and reports their statistics.
    pub fn preview_trim(&mut self, upper: f64, lower: f64) {
        let points = self.compute_trim(upper, lower);
        self.trim_preview = points.filter(|p| p.passed);
        self.status_message = Some(match points {
            Some(p) if p.passed => {
                let stats = quality_stats(self.chromatogram.quality_scores(), p.range());
                format!(
                    "Trim preview: keep {}-{} ({} of {} bases) {}",
                    p.start + 1,
                    p.end + 1,
                    p.len(),
                    self.chromatogram.len(),
                    stats.map(format_stats).unwrap_or_default()
                )
            }
            Some(_) => format!("No region reaches quality {}", upper),
            None => "Nothing to trim".to_string(),
        });
    }

    /// Quality statistics over the selection, or the whole read.
    pub fn range_stats(&self) -> Option<QualityStats> {
        let len = self.chromatogram.len();
        if len == 0 {
            return None;
        }
        let range = match self.selection.selection() {
            Some(s) => s.range(),
            None => 0..=len - 1,
        };
        quality_stats(self.chromatogram.quality_scores(), range)
    }

    // ----- Viewport -----

    pub fn set_zoom(&mut self, scale: f64) {
        self.viewport.set_zoom(scale);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_by(self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_by(1.0 / self.config.zoom_step);
    }

    pub fn fit_to_view(&mut self) {
        let width = self.viewport.width();
        self.viewport
            .fit_to_view(width, self.chromatogram.trace_len());
    }

    pub fn scroll(&mut self, pixels: f64) {
        self.viewport.scroll_by(pixels);
    }

    fn peak(&self, index: usize) -> Option<f64> {
        self.chromatogram
            .peak_locations()
            .get(index)
            .map(|&p| p as f64)
    }

    fn ensure_cursor_visible(&mut self) {
        if let Some(peak) = self.peak(self.cursor) {
            self.viewport.ensure_visible(peak);
        }
    }

    fn center_on_range(&mut self, start: usize, end: usize) {
        if let (Some(a), Some(b)) = (self.peak(start), self.peak(end)) {
            self.viewport.center_on((a + b) / 2.0);
        }
    }

    // ----- Cursor -----

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.ensure_cursor_visible();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor + 1 < self.chromatogram.len() {
            self.cursor += 1;
            self.ensure_cursor_visible();
        }
    }

    pub fn goto_first_base(&mut self) {
        self.cursor = 0;
        self.ensure_cursor_visible();
    }

    pub fn goto_last_base(&mut self) {
        self.cursor = self.chromatogram.len().saturating_sub(1);
        self.ensure_cursor_visible();
    }

    /// Moves to a 1-based base number.
    pub fn goto_base(&mut self, number: usize) {
        if number > 0 && number <= self.chromatogram.len() {
            self.cursor = number - 1;
            if let Some(peak) = self.peak(self.cursor) {
                self.viewport.center_on(peak);
            }
        } else {
            self.status_message = Some(format!("Invalid base: {}", number));
        }
    }

    // ----- Pointer -----

    /// Mouse moved without a button held.
    pub fn pointer_hover(&mut self, pixel: f64) {
        let base = self
            .viewport
            .nearest_base(pixel, self.chromatogram.peak_locations(), false);
        if base != self.hover {
            self.hover = base;
            self.publish(ViewEvent::BaseHovered(base));
        }
    }

    pub fn pointer_leave(&mut self) {
        if self.hover.take().is_some() {
            self.publish(ViewEvent::BaseHovered(None));
        }
    }

    pub fn pointer_down(&mut self, pixel: f64) {
        let base = self
            .viewport
            .nearest_base(pixel, self.chromatogram.peak_locations(), false);
        let had_selection = self.selection.selection().is_some();
        if let DragOutcome::Started(base) = self.selection.pointer_down(base) {
            self.drag_pointer = Some(pixel);
            self.hover = Some(base);
            if had_selection {
                self.publish(ViewEvent::SelectionCleared);
            }
        }
    }

    pub fn pointer_drag(&mut self, pixel: f64) {
        if !self.selection.is_dragging() {
            return;
        }
        self.drag_pointer = Some(pixel);
        self.resolve_drag(pixel);
    }

    fn resolve_drag(&mut self, pixel: f64) {
        let base = self
            .viewport
            .nearest_base(pixel, self.chromatogram.peak_locations(), true);
        if let DragOutcome::Preview(range) = self.selection.pointer_move(base) {
            self.hover = base;
            self.publish(ViewEvent::DragPreview {
                start: range.start,
                end: range.end,
            });
        }
    }

    pub fn pointer_up(&mut self, pixel: f64) {
        let base = self
            .viewport
            .nearest_base(pixel, self.chromatogram.peak_locations(), true);
        self.drag_pointer = None;
        match self.selection.pointer_up(base) {
            DragOutcome::Committed(selection) => {
                let subsequence = self.subsequence(selection);
                self.status_message = Some(format!(
                    "Selected {}-{} ({} bp)",
                    selection.start + 1,
                    selection.end + 1,
                    selection.len()
                ));
                self.publish(ViewEvent::SelectionChanged {
                    start: selection.start,
                    end: selection.end,
                    subsequence,
                });
            }
            DragOutcome::Clicked(index) => {
                self.cursor = index;
                self.publish(ViewEvent::BaseClicked(index));
            }
            _ => {}
        }
    }

    /// Scrolls while a drag sits in an edge zone. Returns true if it scrolled.
    pub fn auto_scroll_tick(&mut self) -> bool {
        let Some(pixel) = self.drag_pointer else {
            return false;
        };
        if !self.selection.is_dragging() {
            return false;
        }
        let step = match self
            .viewport
            .edge_zone(pixel, self.config.auto_scroll_margin)
        {
            Some(ScrollDirection::Left) => -self.config.auto_scroll_step,
            Some(ScrollDirection::Right) => self.config.auto_scroll_step,
            None => return false,
        };
        let before = self.viewport.scroll_offset();
        self.viewport.scroll_by(step);
        self.resolve_drag(pixel);
        self.viewport.scroll_offset() != before
    }

    // ----- Selection -----

    pub fn subsequence(&self, selection: Selection) -> String {
        self.chromatogram
            .sequence()
            .get(selection.range())
            .unwrap_or_default()
            .to_string()
    }

    pub fn selected_sequence(&self) -> Option<String> {
        self.selection.selection().map(|s| self.subsequence(s))
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.drag_pointer = None;
            self.publish(ViewEvent::SelectionCleared);
        }
    }

    // ----- Search -----

    fn publish_search(&mut self) {
        let matches = self.search.matches().len();
        let current = self.search.current_index();
        self.publish(ViewEvent::SearchUpdated { matches, current });
    }

    fn focus_match(&mut self, m: SearchMatch) {
        self.cursor = m.start;
        self.center_on_range(m.start, m.end);
    }

    /// Searches the base calls and jumps to the first match.
    pub fn search(&mut self, pattern: &str) -> usize {
        let count = self.search.search(self.chromatogram.sequence(), pattern);
        if let Some(m) = self.search.current() {
            self.focus_match(m);
            self.status_message = Some(format!("Match 1 of {} for \"{}\"", count, pattern));
        } else {
            self.status_message = Some(format!("Pattern not found: {}", pattern));
        }
        self.publish_search();
        count
    }

    pub fn find_next(&mut self) {
        self.step_match(true);
    }

    pub fn find_previous(&mut self) {
        self.step_match(false);
    }

    fn step_match(&mut self, forward: bool) {
        let found = if forward {
            self.search.next_match()
        } else {
            self.search.previous_match()
        };
        match found {
            Some(m) => {
                self.focus_match(m);
                let i = self.search.current_index().unwrap_or(0);
                self.status_message = Some(format!(
                    "Match {} of {}",
                    i + 1,
                    self.search.matches().len()
                ));
                self.publish_search();
            }
            None if self.search.pattern().is_empty() => {
                self.status_message = Some("No previous search".to_string());
            }
            None => {
                self.status_message = Some(format!("Pattern not found: {}", self.search.pattern()));
            }
        }
    }

    // ----- Modes -----

    /// Enters command mode.
    pub fn enter_command_mode(&mut self) {
        self.mode = AppMode::Command(String::new());
    }

    pub fn enter_search_mode(&mut self) {
        self.mode = AppMode::Search(String::new());
    }

    pub fn enter_replace_mode(&mut self) {
        if self.chromatogram.is_empty() {
            self.status_message = Some("No bases to edit".to_string());
        } else {
            self.mode = AppMode::Replace;
        }
    }

    /// Handles a character typed in command, search or replace mode.
    pub fn input_char(&mut self, c: char) {
        if self.mode == AppMode::Replace {
            self.mode = AppMode::Normal;
            self.edit_at_cursor(Some(c));
        } else if let AppMode::Command(buf) | AppMode::Search(buf) = &mut self.mode {
            buf.push(c);
        }
    }

    /// Handles backspace in command or search mode.
    pub fn input_backspace(&mut self) {
        let emptied = match &mut self.mode {
            AppMode::Command(buf) | AppMode::Search(buf) => {
                buf.pop();
                buf.is_empty()
            }
            _ => false,
        };
        if emptied {
            self.mode = AppMode::Normal;
        }
    }

    /// Cancels the current input mode.
    pub fn cancel_input(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Executes the command or search being typed.
    pub fn submit_input(&mut self) {
        match std::mem::take(&mut self.mode) {
            AppMode::Command(cmd) => self.execute_command(cmd.trim()),
            AppMode::Search(pattern) => {
                let pattern = pattern.trim().to_string();
                if !pattern.is_empty() {
                    self.search(&pattern);
                }
            }
            AppMode::Replace | AppMode::Normal => {}
        }
    }

    /// Executes a `:` command.
    pub fn execute_command(&mut self, cmd: &str) {
        let mut parts = cmd.split_whitespace();
        let name = parts.next().unwrap_or("");
        let args: Vec<f64> = parts.filter_map(|p| p.parse().ok()).collect();
        let (upper, lower) = match args.as_slice() {
            [upper, lower, ..] => (*upper, *lower),
            [upper] => (*upper, self.config.lower_threshold),
            [] => (self.config.upper_threshold, self.config.lower_threshold),
        };

        match name {
            "q" | "quit" => self.should_quit = true,
            "h" | "help" => self.overlay = Some(Overlay::Help),
            "info" => self.overlay = Some(Overlay::Info),
            "trim" => {
                info!("Quality trim requested (upper {}, lower {})", upper, lower);
                self.quality_trim(upper, lower);
            }
            "trimpreview" | "tp" => self.preview_trim(upper, lower),
            "stats" => {
                self.status_message = Some(match self.range_stats() {
                    Some(stats) => format_stats(stats),
                    None => "No quality values".to_string(),
                });
            }
            "fit" => self.fit_to_view(),
            "zoom" => match args.first() {
                Some(&scale) => self.set_zoom(scale),
                None => self.status_message = Some("Usage: :zoom <columns per sample>".to_string()),
            },
            "raw" => self.toggle_raw(),
            _ => {
                if let Ok(number) = name.parse::<usize>() {
                    self.goto_base(number);
                } else {
                    self.status_message = Some(format!("Unknown command: {}", cmd));
                }
            }
        }
    }

    pub fn toggle_raw(&mut self) {
        if self.chromatogram.has_raw_traces() {
            self.show_raw = !self.show_raw;
            self.status_message = Some(if self.show_raw { "Raw traces" } else { "Processed traces" }.to_string());
        } else {
            self.status_message = Some("No raw traces in this file".to_string());
        }
    }

    pub fn show_help(&mut self) {
        self.overlay = Some(Overlay::Help);
    }

    pub fn dismiss_overlay(&mut self) {
        self.overlay = None;
    }

    /// Esc in normal mode: drop the trim preview, then the selection.
    pub fn escape(&mut self) {
        if self.trim_preview.take().is_none() {
            self.clear_selection();
        }
    }
}

/// One-line rendering of quality statistics.
pub fn format_stats(stats: QualityStats) -> String {
    format!(
        "Q min {} max {} mean {:.1} median {:.1} over {} bases",
        stats.min, stats.max, stats.mean, stats.median, stats.count
    )
}
