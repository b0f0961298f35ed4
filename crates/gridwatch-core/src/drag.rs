// ── Drag-reorder controller ──
//
// Explicit Idle -> Dragging -> Idle state machine over global slot
// indices. The input boundary (pointer/mouse handling) owns hit-testing
// and feeds this machine; the machine owns the legality rules: one drag
// at a time, mutation only on a release with a tracked destination.

/// Drag machine state. Indices are always global (page-spanning), so a
/// cross-page swap is identical to a same-page one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging {
        source: usize,
        target: Option<usize>,
    },
}

/// One-at-a-time drag tracker for tile reordering.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a drag from a global slot index. Returns `false` (and
    /// changes nothing) if a drag is already active — starting a second
    /// drag is not a defined input.
    pub fn begin(&mut self, source: usize) -> bool {
        if matches!(self.state, DragState::Dragging { .. }) {
            return false;
        }
        self.state = DragState::Dragging {
            source,
            target: None,
        };
        true
    }

    /// Update the candidate destination while dragging: the global index
    /// under the pointer, or `None` while over no tile. No-op when idle.
    pub fn hover(&mut self, target: Option<usize>) {
        if let DragState::Dragging { source, .. } = self.state {
            self.state = DragState::Dragging { source, target };
        }
    }

    /// Finish the drag. Returns the `(source, destination)` pair to swap
    /// when a destination was tracked; releasing outside any tile aborts
    /// with no mutation. Always returns to idle.
    pub fn release(&mut self) -> Option<(usize, usize)> {
        let result = match self.state {
            DragState::Dragging {
                source,
                target: Some(target),
            } => Some((source, target)),
            _ => None,
        };
        self.state = DragState::Idle;
        result
    }

    /// Abort without mutating, e.g. on pointer-cancel or focus loss.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Source index of the active drag, for render highlighting.
    pub fn source(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { source, .. } => Some(source),
            DragState::Idle => None,
        }
    }

    /// Tracked destination of the active drag, for render highlighting.
    pub fn target(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { target, .. } => target,
            DragState::Idle => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn full_drag_produces_swap_pair() {
        let mut drag = DragController::new();
        assert!(drag.begin(2));
        drag.hover(Some(5));
        drag.hover(Some(7));
        assert_eq!(drag.release(), Some((2, 7)));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn release_outside_any_tile_aborts() {
        let mut drag = DragController::new();
        drag.begin(3);
        drag.hover(Some(4));
        drag.hover(None);
        assert_eq!(drag.release(), None);
    }

    #[test]
    fn cancel_aborts_without_swap() {
        let mut drag = DragController::new();
        drag.begin(1);
        drag.hover(Some(2));
        drag.cancel();
        assert!(!drag.is_dragging());
        assert_eq!(drag.release(), None);
    }

    #[test]
    fn second_begin_is_rejected_while_active() {
        let mut drag = DragController::new();
        assert!(drag.begin(0));
        assert!(!drag.begin(9));
        assert_eq!(drag.source(), Some(0));
    }

    #[test]
    fn hover_when_idle_is_a_no_op() {
        let mut drag = DragController::new();
        drag.hover(Some(3));
        assert_eq!(drag.release(), None);
    }

    #[test]
    fn release_when_idle_is_none() {
        let mut drag = DragController::new();
        assert_eq!(drag.release(), None);
    }
}
