//! Cursor, multi-selection and the mouse drag engine.
//!
//! All indices here are log indices from the current projection (real or
//! synthetic). The drag engine itself works on logical row positions and
//! leaves the translation to the caller.

use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Selection of the log viewer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Cursor row
    pub selected_index: Option<i64>,
    /// Multi-selection
    pub selected_set: HashSet<i64>,
    /// Row whose detail panel is open
    pub expanded_index: Option<i64>,
}

impl SelectionState {
    pub fn has_multi_selection(&self) -> bool {
        !self.selected_set.is_empty()
    }

    /// Open the row's detail panel, or close it when already open. Opening
    /// one row closes any other.
    pub fn toggle_expansion(&mut self, log_index: i64) {
        if self.expanded_index == Some(log_index) {
            self.expanded_index = None;
        } else {
            self.expanded_index = Some(log_index);
        }
    }

    /// Drop the multi-selection and close the detail panel
    pub fn clear(&mut self) {
        self.selected_set.clear();
        self.expanded_index = None;
    }

    /// Rewrite every index through `remap`, dropping the ones that vanish
    pub fn remap(&mut self, remap: impl Fn(i64) -> Option<i64>) {
        self.selected_index = self.selected_index.and_then(&remap);
        self.expanded_index = self.expanded_index.and_then(&remap);
        self.selected_set = self.selected_set.iter().filter_map(|&i| remap(i)).collect();
    }
}

/// Where a press started
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DragOrigin {
    row: usize,
    column: u16,
    line: u16,
    last: (u16, u16),
    /// Sum of cell distances moved since the press
    travelled: u32,
    crossed: bool,
    /// Row the pointer was last over
    current: usize,
}

/// Result of releasing the mouse button
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// Press and release without crossing the threshold
    Click { row: usize },
    /// A drag finished; the last reported range stands
    Selected { rows: RangeInclusive<usize> },
    /// Release with no matching press
    Dismiss,
}

/// Turns mouse press, move and release into clicks and range selections
#[derive(Clone, Debug)]
pub struct DragTracker {
    origin: Option<DragOrigin>,
    threshold: u32,
}

impl DragTracker {
    /// `threshold` is the distance in cells a press must travel before it
    /// counts as a drag
    pub fn new(threshold: u16) -> Self {
        Self {
            origin: None,
            threshold: u32::from(threshold),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.origin.is_some_and(|o| o.crossed)
    }

    /// Record the press. Nothing is selected yet.
    pub fn press(&mut self, row: usize, column: u16, line: u16) {
        self.origin = Some(DragOrigin {
            row,
            column,
            line,
            last: (column, line),
            travelled: 0,
            crossed: false,
            current: row,
        });
    }

    /// Pointer moved with the button held. Returns the selected rows when the
    /// drag is active and the pointer entered a different row, or on the move
    /// that crosses the threshold.
    pub fn drag(&mut self, row: Option<usize>, column: u16, line: u16) -> Option<RangeInclusive<usize>> {
        let threshold = self.threshold;
        let origin = self.origin.as_mut()?;

        let (last_col, last_line) = origin.last;
        origin.travelled += u32::from(column.abs_diff(last_col)) + u32::from(line.abs_diff(last_line));
        origin.last = (column, line);

        let entered = row.is_some_and(|r| r != origin.current);
        if let Some(r) = row {
            origin.current = r;
        }

        if !origin.crossed {
            if origin.travelled < threshold.max(1) {
                return None;
            }
            origin.crossed = true;
        } else if !entered {
            return None;
        }

        Some(origin.row.min(origin.current)..=origin.row.max(origin.current))
    }

    /// Button released
    pub fn release(&mut self) -> DragOutcome {
        match self.origin.take() {
            None => DragOutcome::Dismiss,
            Some(origin) if !origin.crossed => DragOutcome::Click { row: origin.row },
            Some(origin) => DragOutcome::Selected {
                rows: origin.row.min(origin.current)..=origin.row.max(origin.current),
            },
        }
    }

    /// Screen position of the press, if one is in progress
    pub fn origin(&self) -> Option<(u16, u16)> {
        self.origin.map(|o| (o.column, o.line))
    }

    pub fn cancel(&mut self) {
        self.origin = None;
    }
}

impl Default for DragTracker {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_alone_selects_nothing() {
        let mut drag = DragTracker::new(2);
        drag.press(4, 10, 4);
        assert!(!drag.is_dragging());
        assert_eq!(drag.origin(), Some((10, 4)));
    }

    #[test]
    fn test_small_move_then_release_is_click() {
        let mut drag = DragTracker::new(3);
        drag.press(4, 10, 4);
        assert_eq!(drag.drag(Some(4), 11, 4), None);
        assert_eq!(drag.release(), DragOutcome::Click { row: 4 });
        assert_eq!(drag.origin(), None);
    }

    #[test]
    fn test_crossing_threshold_selects_closed_interval() {
        let mut drag = DragTracker::new(2);
        drag.press(4, 10, 4);
        assert_eq!(drag.drag(Some(5), 10, 5), None);
        assert_eq!(drag.drag(Some(6), 10, 6), Some(4..=6));
        assert!(drag.is_dragging());

        // upward past the origin flips the interval
        assert_eq!(drag.drag(Some(2), 10, 2), Some(2..=4));
        // same row again reports nothing new
        assert_eq!(drag.drag(Some(2), 11, 2), None);

        assert_eq!(drag.release(), DragOutcome::Selected { rows: 2..=4 });
    }

    #[test]
    fn test_distance_is_cumulative() {
        let mut drag = DragTracker::new(4);
        drag.press(0, 10, 0);
        // wiggle without leaving the row
        assert_eq!(drag.drag(Some(0), 12, 0), None);
        assert_eq!(drag.drag(Some(0), 10, 0), Some(0..=0));
    }

    #[test]
    fn test_release_without_press_dismisses() {
        let mut drag = DragTracker::default();
        assert_eq!(drag.release(), DragOutcome::Dismiss);
        assert_eq!(drag.drag(Some(1), 1, 1), None);
    }

    #[test]
    fn test_toggle_expansion_keeps_one_row() {
        let mut sel = SelectionState::default();
        sel.toggle_expansion(3);
        sel.toggle_expansion(-2);
        assert_eq!(sel.expanded_index, Some(-2));
        sel.toggle_expansion(-2);
        assert_eq!(sel.expanded_index, None);
    }

    #[test]
    fn test_remap_drops_missing() {
        let mut sel = SelectionState {
            selected_index: Some(1),
            selected_set: [1, 2, 3].into_iter().collect(),
            expanded_index: Some(3),
        };
        sel.remap(|i| (i != 3).then_some(i * 10));
        assert_eq!(sel.selected_index, Some(10));
        assert_eq!(sel.expanded_index, None);
        assert_eq!(sel.selected_set, [10, 20].into_iter().collect());
    }
}
