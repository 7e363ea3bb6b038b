//! Base-range selection and the pointer-drag state machine.
//!
//! ```text
//!  Idle --down on base--> Dragging --up, moved--> Idle (selection committed)
//!                            |
//!                            +----up, not moved--> Idle (single-base click)
//! ```

use std::ops::RangeInclusive;

/// Inclusive base range, always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Builds a selection from two endpoints in any order.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { anchor: usize, current: usize },
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing changed.
    Ignored,
    /// A drag began on this base; any previous selection was dropped.
    Started(usize),
    /// The live drag range changed.
    Preview(Selection),
    Committed(Selection),
    /// Released on the base it was pressed on.
    Clicked(usize),
}

/// Committed selection plus the in-progress drag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionEngine {
    selection: Option<Selection>,
    drag: DragState,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// The range to highlight: the live drag while dragging, else the selection.
    pub fn highlighted(&self) -> Option<Selection> {
        match self.drag {
            DragState::Dragging { anchor, current } => Some(Selection::new(anchor, current)),
            DragState::Idle => self.selection,
        }
    }

    /// Pointer pressed; `base` is the resolved base under it, if any.
    pub fn pointer_down(&mut self, base: Option<usize>) -> DragOutcome {
        match base {
            Some(base) => {
                self.selection = None;
                self.drag = DragState::Dragging {
                    anchor: base,
                    current: base,
                };
                DragOutcome::Started(base)
            }
            None => DragOutcome::Ignored,
        }
    }

    /// Pointer moved while possibly dragging.
    pub fn pointer_move(&mut self, base: Option<usize>) -> DragOutcome {
        match (self.drag, base) {
            (DragState::Dragging { anchor, current }, Some(base)) if base != current => {
                self.drag = DragState::Dragging {
                    anchor,
                    current: base,
                };
                DragOutcome::Preview(Selection::new(anchor, base))
            }
            _ => DragOutcome::Ignored,
        }
    }

    /// Pointer released; `base` is the base under it, if resolvable.
    pub fn pointer_up(&mut self, base: Option<usize>) -> DragOutcome {
        self.pointer_move(base);
        match std::mem::take(&mut self.drag) {
            DragState::Dragging { anchor, current } if anchor != current => {
                let selection = Selection::new(anchor, current);
                self.selection = Some(selection);
                DragOutcome::Committed(selection)
            }
            DragState::Dragging { anchor, .. } => DragOutcome::Clicked(anchor),
            DragState::Idle => DragOutcome::Ignored,
        }
    }

    /// Sets the selection directly (keyboard, search).
    pub fn select(&mut self, a: usize, b: usize) -> Selection {
        let selection = Selection::new(a, b);
        self.selection = Some(selection);
        selection
    }

    /// Drops the selection and any drag. Returns true if anything was cleared.
    pub fn clear(&mut self) -> bool {
        let had = self.selection.is_some() || self.is_dragging();
        self.selection = None;
        self.drag = DragState::Idle;
        had
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_normalized() {
        let s = Selection::new(15, 10);
        assert_eq!((s.start, s.end), (10, 15));
        assert_eq!(s.len(), 6);
        assert!(s.contains(10) && s.contains(15) && !s.contains(16));
    }

    #[test]
    fn test_click_is_not_selection() {
        let mut e = SelectionEngine::new();
        assert_eq!(e.pointer_down(Some(10)), DragOutcome::Started(10));
        assert_eq!(e.pointer_up(Some(10)), DragOutcome::Clicked(10));
        assert_eq!(e.selection(), None);
        assert!(!e.is_dragging());
    }

    #[test]
    fn test_drag_commits_selection() {
        let mut e = SelectionEngine::new();
        e.pointer_down(Some(10));
        assert_eq!(e.pointer_move(Some(15)), DragOutcome::Preview(Selection::new(10, 15)));
        assert_eq!(e.pointer_move(Some(15)), DragOutcome::Ignored);
        assert_eq!(e.pointer_up(None), DragOutcome::Committed(Selection::new(10, 15)));
        assert_eq!(e.selection(), Some(Selection { start: 10, end: 15 }));
    }

    #[test]
    fn test_backward_drag() {
        let mut e = SelectionEngine::new();
        e.pointer_down(Some(20));
        e.pointer_move(Some(4));
        assert_eq!(e.highlighted(), Some(Selection::new(4, 20)));
        assert_eq!(e.pointer_up(Some(4)), DragOutcome::Committed(Selection { start: 4, end: 20 }));
    }

    #[test]
    fn test_drag_back_to_anchor_is_click() {
        let mut e = SelectionEngine::new();
        e.pointer_down(Some(7));
        e.pointer_move(Some(9));
        e.pointer_move(Some(7));
        assert_eq!(e.pointer_up(None), DragOutcome::Clicked(7));
        assert_eq!(e.selection(), None);
    }

    #[test]
    fn test_down_clears_previous_selection() {
        let mut e = SelectionEngine::new();
        e.select(1, 3);
        e.pointer_down(Some(5));
        assert_eq!(e.selection(), None);
        // Down off any base leaves state alone.
        e.select(1, 3);
        assert_eq!(e.pointer_down(None), DragOutcome::Ignored);
        assert_eq!(e.selection(), Some(Selection::new(1, 3)));
    }

    #[test]
    fn test_up_without_down() {
        let mut e = SelectionEngine::new();
        assert_eq!(e.pointer_up(Some(3)), DragOutcome::Ignored);
        assert_eq!(e.pointer_move(Some(3)), DragOutcome::Ignored);
    }
}
