//! Keyboard and mouse event handling.
//!
//! Keys follow Vim conventions:
//! - `h`/`l` or arrows: previous/next base
//! - `0` or `Home`: first base, `$` or `End`: last base
//! - `+`/`-`: zoom in/out around the centre, `=`: fit the whole trace
//! - `/`: search, `n`/`N`: next/previous match
//! - `r<base>`: replace the cursor base, `x`: delete it (stores `N`)
//! - `u`: undo, `Ctrl+r`: redo
//! - `t`: toggle raw/processed traces
//! - `Esc`: drop the trim preview or the selection
//! - `:`: enter command mode, `?`: help
//!
//! The left mouse button selects bases (click or drag), bare motion hovers
//! and the wheel scrolls horizontally.

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use std::time::Duration;

use crate::model::{AppMode, AppState};

/// Columns scrolled per wheel notch.
const WHEEL_STEP: f64 = 8.0;

/// Actions that can be triggered by user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action (input not recognized)
    None,
    /// Quit the application
    Quit,
    /// Move cursor to the previous base
    MoveLeft,
    /// Move cursor to the next base
    MoveRight,
    /// Go to first base (0 or Home)
    GotoFirstBase,
    /// Go to last base ($ or End)
    GotoLastBase,
    ZoomIn,
    ZoomOut,
    FitToView,
    ScrollLeft,
    ScrollRight,
    /// Enter command mode
    EnterCommandMode,
    /// Enter search mode
    EnterSearchMode,
    /// Wait for a replacement base
    EnterReplaceMode,
    /// Character typed in an input mode
    InputChar(char),
    /// Backspace in an input mode
    InputBackspace,
    /// Execute the current command or search
    SubmitInput,
    /// Leave the current input mode
    CancelInput,
    /// Find next match (n)
    FindNext,
    /// Find previous match (N)
    FindPrevious,
    /// Replace the cursor base with the ambiguity code
    DeleteBase,
    Undo,
    Redo,
    ToggleRaw,
    ShowHelp,
    /// Dismiss the help or info overlay
    DismissOverlay,
    /// Esc in normal mode
    Escape,
    /// Left button pressed at a trace panel column
    PointerDown(u16),
    /// Mouse moved with the left button held
    PointerDrag(u16),
    /// Left button released
    PointerUp(u16),
    /// Mouse moved over the trace panel with no button held
    Hover(u16),
    /// Mouse left the trace panel
    HoverLeave,
    /// Resize event (terminal resized)
    Resize(u16, u16),
    /// Periodic tick with no input
    Tick,
}

/// Polls for terminal events with a timeout.
///
/// Returns `None` if no event occurred within the timeout.
pub fn poll_event(timeout: Duration) -> Option<Event> {
    if event::poll(timeout).ok()? {
        event::read().ok()
    } else {
        None
    }
}

/// Converts a crossterm event to an Action based on current app mode.
///
/// `trace_area` is the inner area of the trace panel, used to turn mouse
/// positions into panel columns.
pub fn handle_event(event: Event, mode: &AppMode, overlay_shown: bool, trace_area: Rect) -> Action {
    match event {
        Event::Key(key_event) => handle_key_event(key_event, mode, overlay_shown),
        Event::Mouse(mouse_event) if !overlay_shown => handle_mouse_event(mouse_event, trace_area),
        Event::Resize(width, height) => Action::Resize(width, height),
        _ => Action::None,
    }
}

/// Handles a key event based on the current application mode.
fn handle_key_event(key: KeyEvent, mode: &AppMode, overlay_shown: bool) -> Action {
    // If an overlay is shown, any key dismisses it
    if overlay_shown {
        return Action::DismissOverlay;
    }

    match mode {
        AppMode::Normal => handle_normal_mode(key),
        AppMode::Command(_) | AppMode::Search(_) => handle_input_mode(key),
        AppMode::Replace => handle_replace_mode(key),
    }
}

/// Handles key events in normal mode.
fn handle_normal_mode(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            KeyCode::Char('r') => Action::Redo,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('h') | KeyCode::Left => Action::MoveLeft,
        KeyCode::Char('l') | KeyCode::Right => Action::MoveRight,
        KeyCode::Char('0') | KeyCode::Home => Action::GotoFirstBase,
        KeyCode::Char('$') | KeyCode::End => Action::GotoLastBase,
        KeyCode::PageUp => Action::ScrollLeft,
        KeyCode::PageDown => Action::ScrollRight,

        KeyCode::Char('+') => Action::ZoomIn,
        KeyCode::Char('-') => Action::ZoomOut,
        KeyCode::Char('=') => Action::FitToView,

        KeyCode::Char(':') => Action::EnterCommandMode,
        KeyCode::Char('/') => Action::EnterSearchMode,
        KeyCode::Char('n') => Action::FindNext,
        KeyCode::Char('N') => Action::FindPrevious,

        KeyCode::Char('r') => Action::EnterReplaceMode,
        KeyCode::Char('x') => Action::DeleteBase,
        KeyCode::Char('u') => Action::Undo,
        KeyCode::Char('t') => Action::ToggleRaw,
        KeyCode::Char('?') => Action::ShowHelp,
        KeyCode::Esc => Action::Escape,

        _ => Action::None,
    }
}

/// Handles key events in command and search mode.
fn handle_input_mode(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::SubmitInput,
        KeyCode::Esc => Action::CancelInput,
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Char(c) => Action::InputChar(c),
        _ => Action::None,
    }
}

/// Handles the key following `r`.
fn handle_replace_mode(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char(c) if c.is_ascii_alphabetic() => Action::InputChar(c),
        _ => Action::CancelInput,
    }
}

/// Handles mouse events over the trace panel.
fn handle_mouse_event(mouse: MouseEvent, trace_area: Rect) -> Action {
    let inside = mouse.column >= trace_area.x
        && mouse.column < trace_area.x + trace_area.width
        && mouse.row >= trace_area.y
        && mouse.row < trace_area.y + trace_area.height;
    // Drags keep reporting past the panel edges so auto-scroll can engage.
    let column = mouse
        .column
        .saturating_sub(trace_area.x)
        .min(trace_area.width.saturating_sub(1));

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if inside => Action::PointerDown(column),
        MouseEventKind::Drag(MouseButton::Left) => Action::PointerDrag(column),
        MouseEventKind::Up(MouseButton::Left) => Action::PointerUp(column),
        MouseEventKind::Moved if inside => Action::Hover(column),
        MouseEventKind::Moved => Action::HoverLeave,
        MouseEventKind::ScrollUp if mouse.modifiers.contains(KeyModifiers::CONTROL) => Action::ZoomIn,
        MouseEventKind::ScrollDown if mouse.modifiers.contains(KeyModifiers::CONTROL) => Action::ZoomOut,
        MouseEventKind::ScrollUp | MouseEventKind::ScrollLeft => Action::ScrollLeft,
        MouseEventKind::ScrollDown | MouseEventKind::ScrollRight => Action::ScrollRight,
        _ => Action::None,
    }
}

/// Applies an action to the application state.
///
/// Returns `true` if the application should continue, `false` if it should quit.
pub fn apply_action(state: &mut AppState, action: Action) -> bool {
    match action {
        Action::None => {}
        Action::Quit => {
            state.should_quit = true;
        }
        Action::MoveLeft => {
            state.move_left();
        }
        Action::MoveRight => {
            state.move_right();
        }
        Action::GotoFirstBase => {
            state.goto_first_base();
        }
        Action::GotoLastBase => {
            state.goto_last_base();
        }
        Action::ZoomIn => {
            state.zoom_in();
        }
        Action::ZoomOut => {
            state.zoom_out();
        }
        Action::FitToView => {
            state.fit_to_view();
        }
        Action::ScrollLeft => {
            state.scroll(-WHEEL_STEP);
        }
        Action::ScrollRight => {
            state.scroll(WHEEL_STEP);
        }
        Action::EnterCommandMode => {
            state.enter_command_mode();
        }
        Action::EnterSearchMode => {
            state.enter_search_mode();
        }
        Action::EnterReplaceMode => {
            state.enter_replace_mode();
        }
        Action::InputChar(c) => {
            state.input_char(c);
        }
        Action::InputBackspace => {
            state.input_backspace();
        }
        Action::SubmitInput => {
            state.submit_input();
        }
        Action::CancelInput => {
            state.cancel_input();
        }
        Action::FindNext => {
            state.find_next();
        }
        Action::FindPrevious => {
            state.find_previous();
        }
        Action::DeleteBase => {
            state.edit_at_cursor(None);
        }
        Action::Undo => {
            state.undo();
        }
        Action::Redo => {
            state.redo();
        }
        Action::ToggleRaw => {
            state.toggle_raw();
        }
        Action::ShowHelp => {
            state.show_help();
        }
        Action::DismissOverlay => {
            state.dismiss_overlay();
        }
        Action::Escape => {
            state.escape();
        }
        Action::PointerDown(x) => {
            state.pointer_down(f64::from(x));
        }
        Action::PointerDrag(x) => {
            state.pointer_drag(f64::from(x));
        }
        Action::PointerUp(x) => {
            state.pointer_up(f64::from(x));
        }
        Action::Hover(x) => {
            state.pointer_hover(f64::from(x));
        }
        Action::HoverLeave => {
            state.pointer_leave();
        }
        Action::Resize(_, _) => {
            // Resize is handled in the main loop with actual terminal dimensions
        }
        Action::Tick => {
            state.auto_scroll_tick();
        }
    }

    !state.should_quit
}
