//! TUI rendering module.
//!
//! Layout, top to bottom:
//! - trace panel: the four channels drawn on a braille canvas
//! - calls panel: base letters under their peaks and a quality bar row
//! - status bar with mode, messages and cursor/hover info
//!
//! Help and info panels are drawn over everything when requested.

pub mod glyphs;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, Clear, Paragraph,
    },
    Frame,
};

use crate::chromatogram::Nucleotide;
use crate::model::{format_stats, AppMode, AppState, Overlay};
use crate::viewport::Viewport;
use glyphs::Glyphs;

/// Height of the calls panel (bases + quality, with borders).
const CALLS_PANEL_HEIGHT: u16 = 4;
/// Height of the status bar.
const STATUS_BAR_HEIGHT: u16 = 1;
/// Canvas points per terminal column (braille cells are two dots wide).
const POINTS_PER_COLUMN: usize = 2;

/// Color scheme for nucleotides.
pub trait ColorScheme {
    fn get_color(&self, c: char) -> Color;
}

/// Usual chromatogram colors, with yellow standing in for black.
pub struct DnaColorScheme;

impl ColorScheme for DnaColorScheme {
    fn get_color(&self, c: char) -> Color {
        match c.to_ascii_uppercase() {
            'A' => Color::Green,
            'C' => Color::Blue,
            'G' => Color::Yellow,
            'T' => Color::Red,
            _ => Color::DarkGray,
        }
    }
}

fn main_layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(CALLS_PANEL_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

/// Inner area of the trace panel for a terminal of the given size.
///
/// The calls panel shares its horizontal extent, so one column mapping
/// serves both.
pub fn trace_area(terminal: Rect) -> Rect {
    let (traces, _, _) = main_layout(terminal);
    inner(traces)
}

/// Renders the complete UI.
pub fn render(frame: &mut Frame, state: &AppState) {
    let glyphs = glyphs::select(!state.config.ascii);
    let area = frame.area();
    let (traces_area, calls_area, status_area) = main_layout(area);

    render_traces(frame, state, traces_area, &glyphs);
    render_calls(frame, state, calls_area, &glyphs);
    render_status_bar(frame, state, status_area);

    match state.overlay {
        Some(Overlay::Help) => render_help(frame, area),
        Some(Overlay::Info) => render_info(frame, state, area),
        None => {}
    }
}

/// Polyline points for one channel in panel coordinates.
///
/// Zoomed in, every sample in view is a point. Zoomed out, each half column
/// keeps the maximum of the samples it covers so narrow peaks survive.
pub fn trace_points(trace: &[i32], viewport: &Viewport) -> Vec<(f64, f64)> {
    if trace.is_empty() || viewport.width() <= 0.0 {
        return Vec::new();
    }
    let (first, last) = viewport.visible_samples();
    let last_index = trace.len() - 1;

    if viewport.scale() * POINTS_PER_COLUMN as f64 >= 1.0 {
        let lo = (first.floor().max(0.0) as usize).min(last_index);
        let hi = (last.ceil().max(0.0) as usize).min(last_index);
        return (lo..=hi)
            .map(|i| (viewport.data_to_pixel(i as f64), f64::from(trace[i])))
            .collect();
    }

    let buckets = (viewport.width() as usize) * POINTS_PER_COLUMN;
    let step = 1.0 / POINTS_PER_COLUMN as f64;
    (0..buckets)
        .filter_map(|b| {
            let px = b as f64 * step;
            let lo = viewport.pixel_to_data(px).floor().max(0.0) as usize;
            let hi = (viewport.pixel_to_data(px + step).ceil().max(0.0) as usize).min(trace.len());
            trace
                .get(lo..hi.max(lo + 1).min(trace.len()))
                .and_then(|s| s.iter().max())
                .map(|&v| (px, f64::from(v)))
        })
        .collect()
}

/// Panel column of a sample, if it is on screen.
fn column_of(viewport: &Viewport, sample: usize, width: usize) -> Option<usize> {
    let px = viewport.data_to_pixel(sample as f64).round();
    (px >= 0.0 && (px as usize) < width).then_some(px as usize)
}

/// Range of bases whose peaks are on screen, as `(first, last_exclusive)`.
pub fn visible_bases(peaks: &[usize], viewport: &Viewport) -> (usize, usize) {
    let (first, last) = viewport.visible_samples();
    let start = peaks.partition_point(|&p| (p as f64) < first);
    let end = peaks.partition_point(|&p| (p as f64) <= last);
    (start, end.max(start))
}

fn render_traces(frame: &mut Frame, state: &AppState, area: Rect, glyphs: &Glyphs) {
    let model = &state.chromatogram;
    let viewport = &state.viewport;
    let raw = state.show_raw && model.has_raw_traces();
    let width = f64::from(inner(area).width);
    let max_signal = f64::from(model.max_signal(raw).max(1));
    let scheme = DnaColorScheme;

    let channels: Vec<(Color, Vec<(f64, f64)>)> = Nucleotide::ALL
        .iter()
        .map(|&b| {
            (
                scheme.get_color(b.as_char()),
                trace_points(model.trace(b, raw), viewport),
            )
        })
        .collect();

    let peaks = model.peak_locations();
    let mut markers: Vec<(f64, Color)> = Vec::new();
    if let Some(&p) = peaks.get(state.cursor) {
        markers.push((viewport.data_to_pixel(p as f64), Color::DarkGray));
    }
    if let Some(sel) = state.selection.highlighted() {
        for i in [sel.start, sel.end] {
            if let Some(&p) = peaks.get(i) {
                markers.push((viewport.data_to_pixel(p as f64), Color::White));
            }
        }
    }
    if let Some(trim) = state.trim_preview {
        for i in [trim.start, trim.end] {
            if let Some(&p) = peaks.get(i) {
                markers.push((viewport.data_to_pixel(p as f64), Color::Magenta));
            }
        }
    }

    let (first, last) = visible_bases(peaks, viewport);
    let mut title = format!(
        " {}{} [{}: bases {}-{}/{} | {:.3} col/sample] ",
        state.file_name,
        if model.has_edits() { " *" } else { "" },
        if raw { "raw" } else { "processed" },
        if last > first { first + 1 } else { 0 },
        last,
        model.len(),
        viewport.scale()
    );
    if viewport.scroll_offset() > 0.0 {
        title.insert_str(0, glyphs.more_left);
    }
    if viewport.data_to_pixel(model.trace_len() as f64) > width {
        title.push_str(glyphs.more_right);
    }

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, max_signal])
        .paint(move |ctx| {
            for &(x, color) in &markers {
                ctx.draw(&CanvasLine::new(x, 0.0, x, max_signal, color));
            }
            ctx.layer();
            for (color, points) in &channels {
                for w in points.windows(2) {
                    ctx.draw(&CanvasLine::new(w[0].0, w[0].1, w[1].0, w[1].1, *color));
                }
            }
        });
    frame.render_widget(canvas, area);
}

/// Priority of a base cell when several bases land in one column.
fn base_style(state: &AppState, index: usize, scheme: &DnaColorScheme, base: char) -> (u8, Style) {
    let color = scheme.get_color(base);
    let current = state.search.current();
    if index == state.cursor {
        (5, Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD))
    } else if current.is_some_and(|m| (m.start..=m.end).contains(&index)) {
        (4, Style::default().fg(Color::Black).bg(Color::LightYellow))
    } else if state.selection.highlighted().is_some_and(|s| s.contains(index)) {
        (3, Style::default().fg(Color::Black).bg(Color::Cyan))
    } else if state.search.covers(index) {
        (2, Style::default().fg(color).add_modifier(Modifier::UNDERLINED))
    } else if state.chromatogram.is_modified(index) {
        (2, Style::default().fg(color).bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    } else if state.trim_preview.is_some_and(|t| !t.range().contains(&index)) {
        (1, Style::default().fg(Color::DarkGray))
    } else {
        (1, Style::default().fg(color))
    }
}

fn render_calls(frame: &mut Frame, state: &AppState, area: Rect, glyphs: &Glyphs) {
    let model = &state.chromatogram;
    let width = inner(area).width as usize;
    let scheme = DnaColorScheme;

    let mut bases: Vec<Option<(u8, Span)>> = vec![None; width];
    let mut bars: Vec<Option<Span>> = vec![None; width];
    let (first, last) = visible_bases(model.peak_locations(), &state.viewport);

    for i in first..last {
        let Some(col) = column_of(&state.viewport, model.peak_locations()[i], width) else {
            continue;
        };
        let base = model.base_at(i).unwrap_or(' ');
        let (priority, style) = base_style(state, i, &scheme, base);
        if bases[col].as_ref().map_or(true, |(p, _)| priority > *p) {
            bases[col] = Some((priority, Span::styled(base.to_string(), style)));
            let q = model.quality_scores()[i];
            let color = if q >= 30 {
                Color::Green
            } else if q >= 20 {
                Color::Yellow
            } else {
                Color::Red
            };
            bars[col] = Some(Span::styled(glyphs.quality_bar(q), Style::default().fg(color)));
        }
    }

    let to_line = |cells: Vec<Option<Span<'static>>>| {
        Line::from(
            cells
                .into_iter()
                .map(|c| c.unwrap_or_else(|| Span::raw(" ")))
                .collect::<Vec<_>>(),
        )
    };
    let lines = vec![
        to_line(bases.into_iter().map(|c| c.map(|(_, s)| s)).collect()),
        to_line(bars),
    ];

    let title = match state.selection.selection() {
        Some(sel) => format!(" Calls [selected {}-{} ({} bp)] ", sel.start + 1, sel.end + 1, sel.len()),
        None => " Calls ".to_string(),
    };
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

/// Renders the status bar at the bottom.
fn render_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let (mode_str, input_str) = match &state.mode {
        AppMode::Normal => ("NORMAL", String::new()),
        AppMode::Command(cmd) => ("COMMAND", format!(":{}", cmd)),
        AppMode::Search(pattern) => ("SEARCH", format!("/{}", pattern)),
        AppMode::Replace => ("REPLACE", format!("base {} -> ?", state.cursor + 1)),
    };

    let model = &state.chromatogram;
    let focus = state.hover.unwrap_or(state.cursor);
    let position_info = match (model.base_at(focus), model.quality_scores().get(focus)) {
        (Some(base), Some(q)) => format!(
            "{}{} {}/{} Q{} | rev {} ",
            if state.hover.is_some() { "Hover " } else { "Base " },
            base,
            focus + 1,
            model.len(),
            q,
            model.revision()
        ),
        _ => "No bases ".to_string(),
    };

    let message = state.status_message.as_deref().unwrap_or("");
    let left_content = if input_str.is_empty() {
        format!(" {} | {} ", mode_str, message)
    } else {
        format!(" {} | {} ", mode_str, input_str)
    };

    let left_len = left_content.chars().count();
    let status_line = Line::from(vec![
        Span::styled(left_content, Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::styled(
            " ".repeat((area.width as usize).saturating_sub(left_len + position_info.len())),
            Style::default().bg(Color::Cyan),
        ),
        Span::styled(
            position_info,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    frame.render_widget(Paragraph::new(status_line), area);
}

/// Area of `percent_x` by `percent_y` centred in `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

const HELP_ENTRIES: &[(&str, &str)] = &[
    ("h / l, arrows", "previous / next base"),
    ("0 / $", "first / last base"),
    ("+ / - / =", "zoom in, zoom out, fit the whole trace"),
    ("PgUp / PgDn, wheel", "scroll"),
    ("mouse", "click a base to move the cursor, drag to select a range"),
    ("/ pattern", "search the calls (case-insensitive, overlapping)"),
    ("n / N", "next / previous match"),
    ("r<base>", "replace the cursor base with an IUPAC letter"),
    ("x", "replace the cursor base with N"),
    ("u / Ctrl+r", "undo / redo"),
    ("t", "toggle raw and processed traces"),
    ("Esc", "clear the trim preview, then the selection"),
    (":<n>", "go to base n"),
    (":trim [upper lower]", "quality-trim the read (defaults 24 and 15); cannot be undone"),
    (":trimpreview [upper lower]", "show the trim points without applying them"),
    (":stats", "quality statistics for the selection or the whole read"),
    (":info", "run information"),
    (":zoom <x>, :fit, :raw", "set columns per sample, fit, toggle raw"),
    (":q", "quit"),
];

/// Help text wrapped to `width` columns.
pub fn help_lines(width: usize) -> Vec<String> {
    let key_width = HELP_ENTRIES.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 2;
    let text_width = width.saturating_sub(key_width).max(10);
    let mut lines = Vec::new();
    for (keys, text) in HELP_ENTRIES {
        for (i, part) in textwrap::wrap(text, text_width).iter().enumerate() {
            let key = if i == 0 { *keys } else { "" };
            lines.push(format!("{:<key_width$}{}", key, part));
        }
    }
    lines
}

fn render_overlay(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let popup = centered_rect(80, 80, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .title_bottom(" any key to close ");
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let width = inner(centered_rect(80, 80, area)).width as usize;
    let lines = help_lines(width).into_iter().map(Line::from).collect();
    render_overlay(frame, area, " Help ", lines);
}

/// Label/value rows for the info panel.
pub fn info_rows(state: &AppState) -> Vec<(String, String)> {
    let model = &state.chromatogram;
    let mut rows: Vec<(String, String)> = vec![
        ("File".into(), state.file_name.clone()),
        ("Bases".into(), model.len().to_string()),
        ("Samples".into(), model.trace_len().to_string()),
        (
            "Channels".into(),
            model
                .channel_order()
                .iter()
                .map(Nucleotide::as_char)
                .collect(),
        ),
        (
            "Raw traces".into(),
            if model.has_raw_traces() { "yes" } else { "no" }.into(),
        ),
    ];
    rows.extend(model.metadata().fields.iter().cloned());
    if let Some(spacing) = model.metadata().peak_spacing {
        rows.push(("Peak spacing".into(), format!("{:.2}", spacing)));
    }
    if let Some(stats) = state.range_stats() {
        rows.push(("Quality".into(), format_stats(stats)));
    }
    rows.push(("Edited bases".into(), model.modified_positions().len().to_string()));
    rows.push(("Warnings".into(), model.warnings().len().to_string()));
    rows
}

fn render_info(frame: &mut Frame, state: &AppState, area: Rect) {
    let rows = info_rows(state);
    let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 2;
    let mut lines: Vec<Line> = rows
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(
                    format!("{:<label_width$}", label),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(value),
            ])
        })
        .collect();
    for warning in state.chromatogram.warnings() {
        lines.push(Line::from(Span::styled(
            format!("! {}", warning),
            Style::default().fg(Color::Yellow),
        )));
    }
    render_overlay(frame, area, " Info ", lines);
}
