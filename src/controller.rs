//! Application controller.
//!
//! This module orchestrates the main application loop:
//! - Terminal initialization and cleanup (raw mode, alternate screen, mouse capture)
//! - Event polling and handling
//! - Ticks that drive auto-scroll while a drag sits at a panel edge
//! - State updates and rendering

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use crate::event::{apply_action, handle_event, poll_event, Action};
use crate::model::AppState;
use crate::ui::{render, trace_area};

/// The main application controller.
pub struct App {
    /// Terminal backend
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state
    state: AppState,
    /// Event poll timeout, also the auto-scroll period
    tick_rate: Duration,
    /// Inner trace panel area for the current terminal size
    trace_area: Rect,
}

impl App {
    /// Creates a new application with the given state.
    pub fn new(state: AppState) -> Result<Self> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            tick_rate: state.config.tick_rate,
            state,
            trace_area: Rect::default(),
        })
    }

    /// Runs the main application loop.
    pub fn run(&mut self) -> Result<()> {
        // Initial viewport setup
        self.update_viewport_size()?;

        loop {
            // Render
            self.terminal.draw(|frame| {
                render(frame, &self.state);
            })?;

            let action = match poll_event(self.tick_rate) {
                Some(event) => handle_event(
                    event,
                    &self.state.mode,
                    self.state.overlay.is_some(),
                    self.trace_area,
                ),
                None => Action::Tick,
            };

            // Handle resize specially to update viewport
            if let Action::Resize(_, _) = action {
                self.update_viewport_size()?;
            }

            apply_action(&mut self.state, action);

            if self.state.should_quit {
                break;
            }
        }

        info!("Viewer closed at revision {}", self.state.chromatogram.revision());
        Ok(())
    }

    /// Updates the viewport size based on terminal dimensions.
    fn update_viewport_size(&mut self) -> Result<()> {
        let size = self.terminal.size()?;
        self.trace_area = trace_area(Rect::new(0, 0, size.width, size.height));
        self.state
            .update_viewport_size(self.trace_area.width as usize);
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Restore terminal
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Convenience function to run the viewer on a loaded state.
pub fn run_app(state: AppState) -> Result<()> {
    let mut app = App::new(state)?;
    app.run()
}
