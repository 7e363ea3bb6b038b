//! View events and the listeners that receive them.
//!
//! The application state publishes a [`ViewEvent`] whenever something a
//! front end may care about happens; listeners subscribe to the [`EventBus`]
//! instead of hooking callbacks onto the state directly.

use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// A new model state is available (load, edit, undo/redo, trim).
    SnapshotPublished { revision: u64 },
    /// The pointer is over a base, or over nothing.
    BaseHovered(Option<usize>),
    /// Pointer pressed and released on the same base.
    BaseClicked(usize),
    /// The live drag range changed; redraw the preview.
    DragPreview { start: usize, end: usize },
    SelectionChanged {
        start: usize,
        end: usize,
        subsequence: String,
    },
    SelectionCleared,
    SearchUpdated {
        matches: usize,
        current: Option<usize>,
    },
    TrimApplied { start: usize, end: usize },
    Warning(String),
}

/// Receives published events.
pub trait ViewListener {
    fn on_event(&mut self, event: &ViewEvent);
}

/// Forwards every event to the log at debug level.
pub struct LogListener;

impl ViewListener for LogListener {
    fn on_event(&mut self, event: &ViewEvent) {
        debug!("view event: {:?}", event);
    }
}

/// Synchronous fan-out to subscribed listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn ViewListener>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn ViewListener>) {
        self.listeners.push(listener);
    }

    pub fn publish(&mut self, event: ViewEvent) {
        for listener in self.listeners.iter_mut() {
            listener.on_event(&event);
        }
    }
}
