//! Bounded undo/redo stack of base edits.

use std::collections::VecDeque;

/// One reversible base replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditCommand {
    pub index: usize,
    pub old_base: char,
    pub new_base: char,
}

/// Undo and redo stacks. The oldest command is dropped once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo: VecDeque<EditCommand>,
    redo: Vec<EditCommand>,
    capacity: usize,
}

impl EditHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(capacity.min(1024)),
            redo: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records a freshly applied edit. Clears the redo stack.
    pub fn push(&mut self, command: EditCommand) {
        self.redo.clear();
        if self.undo.len() == self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(command);
    }

    /// Takes the last edit for reverting; the caller re-applies `old_base`.
    pub fn undo(&mut self) -> Option<EditCommand> {
        let command = self.undo.pop_back()?;
        self.redo.push(command);
        Some(command)
    }

    /// Takes the last undone edit; the caller re-applies `new_base`.
    pub fn redo(&mut self) -> Option<EditCommand> {
        let command = self.redo.pop()?;
        self.undo.push_back(command);
        Some(command)
    }

    /// Puts back a command taken by `undo` whose application failed.
    pub fn cancel_undo(&mut self) {
        if let Some(command) = self.redo.pop() {
            self.undo.push_back(command);
        }
    }

    /// Puts back a command taken by `redo` whose application failed.
    pub fn cancel_redo(&mut self) {
        if let Some(command) = self.undo.pop_back() {
            self.redo.push(command);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
