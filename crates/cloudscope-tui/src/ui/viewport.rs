//! Row geometry of the log list.
//!
//! The projection produces *logical* rows. The viewport shows one extra row
//! when a log is expanded: its detail panel sits directly below it, so every
//! logical row after the expanded one moves down by one viewport row.
//! Selection math stays in logical space; only scrolling and hit-testing go
//! through the mapping here.

use std::ops::Range;

use cloudscope_types::DisplayItem;

/// Row heights in terminal cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowHeights {
    pub plain: u16,
    pub detail: u16,
    pub header: u16,
}

impl Default for RowHeights {
    fn default() -> Self {
        Self {
            plain: 1,
            detail: 8,
            header: 1,
        }
    }
}

/// What occupies a viewport row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportRow {
    Logical(usize),
    /// Detail panel of the expanded logical row
    Detail(usize),
}

/// Where a scrolled-to row should land
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollAlign {
    /// Scroll as little as possible to make the row visible
    #[default]
    Auto,
    Start,
    Center,
    End,
}

/// Logical rows plus the optional detail row
#[derive(Clone, Copy)]
pub struct RowLayout<'a> {
    items: &'a [DisplayItem],
    expanded: Option<usize>,
    heights: RowHeights,
}

impl<'a> RowLayout<'a> {
    /// `expanded` is the logical row whose detail panel is open
    pub fn new(items: &'a [DisplayItem], expanded: Option<usize>, heights: RowHeights) -> Self {
        Self {
            items,
            expanded: expanded.filter(|&e| e < items.len()),
            heights,
        }
    }

    /// Number of viewport rows
    pub fn row_count(&self) -> usize {
        self.items.len() + usize::from(self.expanded.is_some())
    }

    /// Number of logical rows
    pub fn logical_count(&self) -> usize {
        self.items.len()
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn to_viewport(&self, logical: usize) -> usize {
        match self.expanded {
            Some(e) if logical > e => logical + 1,
            _ => logical,
        }
    }

    pub fn to_logical(&self, row: usize) -> Option<ViewportRow> {
        let mapped = match self.expanded {
            Some(e) if row == e + 1 => ViewportRow::Detail(e),
            Some(e) if row > e + 1 => ViewportRow::Logical(row - 1),
            _ => ViewportRow::Logical(row),
        };
        match mapped {
            ViewportRow::Logical(l) if l >= self.items.len() => None,
            other => Some(other),
        }
    }

    /// Height in cells of a viewport row
    pub fn height(&self, row: usize) -> u16 {
        let height = match self.to_logical(row) {
            Some(ViewportRow::Detail(_)) => self.heights.detail,
            Some(ViewportRow::Logical(l)) if self.items[l].is_header() => self.heights.header,
            Some(ViewportRow::Logical(_)) => self.heights.plain,
            None => 0,
        };
        height.max(1)
    }
}

/// Scroll position of the log list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    /// First viewport row shown
    pub offset: usize,
    /// Available height in cells
    pub height: u16,
}

impl Viewport {
    /// Viewport rows that fit from the current offset, each paired with the
    /// screen line it starts on. The last row may be cut off.
    pub fn visible_rows(&self, layout: &RowLayout<'_>) -> Vec<(usize, u16)> {
        let mut rows = Vec::new();
        let mut y: u16 = 0;
        let mut row = self.offset;
        while row < layout.row_count() && y < self.height {
            rows.push((row, y));
            y = y.saturating_add(layout.height(row));
            row += 1;
        }
        rows
    }

    /// Logical rows at least partly on screen
    pub fn visible_range(&self, layout: &RowLayout<'_>) -> Range<usize> {
        let rows = self.visible_rows(layout);
        let logical = |row: usize| match layout.to_logical(row) {
            Some(ViewportRow::Logical(l) | ViewportRow::Detail(l)) => Some(l),
            None => None,
        };
        match (rows.first(), rows.last()) {
            (Some(&(first, _)), Some(&(last, _))) => match (logical(first), logical(last)) {
                (Some(start), Some(end)) => start..end + 1,
                _ => 0..0,
            },
            _ => 0..0,
        }
    }

    /// Viewport row under a screen line relative to the top of the list
    pub fn row_at(&self, layout: &RowLayout<'_>, line: u16) -> Option<ViewportRow> {
        self.visible_rows(layout)
            .into_iter()
            .take_while(|&(_, y)| y <= line)
            .last()
            .and_then(|(row, _)| layout.to_logical(row))
    }

    /// Scroll so a logical row is visible
    pub fn scroll_to_row(&mut self, layout: &RowLayout<'_>, logical: usize, align: ScrollAlign) {
        if layout.logical_count() == 0 {
            self.offset = 0;
            return;
        }

        let logical = logical.min(layout.logical_count() - 1);
        let target = layout.to_viewport(logical);
        // keep the detail panel on screen together with its row
        let last = match layout.expanded() {
            Some(e) if e == logical => target + 1,
            _ => target,
        };

        self.offset = match align {
            ScrollAlign::Start => target,
            ScrollAlign::End => self.first_row_ending_at(layout, last),
            ScrollAlign::Center => {
                let above = self.height / 2;
                self.first_row_with_space(layout, target, above)
            }
            ScrollAlign::Auto => {
                if target < self.offset {
                    target
                } else if last >= self.first_hidden_row(layout) {
                    self.first_row_ending_at(layout, last).max(self.offset).min(target)
                } else {
                    self.offset
                }
            }
        };
        self.clamp(layout);
    }

    /// Keep the offset inside the content and avoid empty space at the bottom
    pub fn clamp(&mut self, layout: &RowLayout<'_>) {
        let count = layout.row_count();
        if count == 0 {
            self.offset = 0;
            return;
        }
        let max_offset = self.first_row_ending_at(layout, count - 1);
        self.offset = self.offset.min(max_offset);
    }

    /// First viewport row not fully visible
    fn first_hidden_row(&self, layout: &RowLayout<'_>) -> usize {
        let mut used: u16 = 0;
        let mut row = self.offset;
        while row < layout.row_count() {
            let next = used.saturating_add(layout.height(row));
            if next > self.height {
                break;
            }
            used = next;
            row += 1;
        }
        row
    }

    /// Smallest offset that still shows `last` fully at the bottom
    fn first_row_ending_at(&self, layout: &RowLayout<'_>, last: usize) -> usize {
        let mut used = layout.height(last);
        let mut first = last;
        while first > 0 {
            let next = used.saturating_add(layout.height(first - 1));
            if next > self.height {
                break;
            }
            used = next;
            first -= 1;
        }
        first
    }

    /// Offset leaving at most `space` cells above `target`
    fn first_row_with_space(&self, layout: &RowLayout<'_>, target: usize, space: u16) -> usize {
        let mut used: u16 = 0;
        let mut first = target;
        while first > 0 {
            let next = used.saturating_add(layout.height(first - 1));
            if next > space {
                break;
            }
            used = next;
            first -= 1;
        }
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudscope_types::{GroupSection, LogEvent, SectionKind};
    use std::sync::Arc;

    fn logs(n: usize) -> Vec<DisplayItem> {
        (0..n)
            .map(|i| DisplayItem::Log {
                log: Arc::new(LogEvent::new(i as i64, format!("line {i}"))),
                log_index: i as i64,
            })
            .collect()
    }

    fn header() -> DisplayItem {
        DisplayItem::Header {
            group: Arc::new(GroupSection::new("g", "g", Vec::new(), SectionKind::Stream)),
        }
    }

    const HEIGHTS: RowHeights = RowHeights {
        plain: 1,
        detail: 4,
        header: 2,
    };

    #[test]
    fn test_mapping_without_expansion_is_identity() {
        let items = logs(5);
        let layout = RowLayout::new(&items, None, HEIGHTS);
        assert_eq!(layout.row_count(), 5);
        for i in 0..5 {
            assert_eq!(layout.to_viewport(i), i);
            assert_eq!(layout.to_logical(i), Some(ViewportRow::Logical(i)));
        }
        assert_eq!(layout.to_logical(5), None);
    }

    #[test]
    fn test_rows_after_expanded_shift_by_one() {
        let items = logs(5);
        let layout = RowLayout::new(&items, Some(2), HEIGHTS);

        assert_eq!(layout.row_count(), 6);
        assert_eq!(layout.to_viewport(1), 1);
        assert_eq!(layout.to_viewport(2), 2);
        assert_eq!(layout.to_viewport(3), 4);
        assert_eq!(layout.to_viewport(4), 5);

        assert_eq!(layout.to_logical(3), Some(ViewportRow::Detail(2)));
        assert_eq!(layout.to_logical(4), Some(ViewportRow::Logical(3)));
        assert_eq!(layout.to_logical(5), Some(ViewportRow::Logical(4)));
        assert_eq!(layout.height(3), 4);
    }

    #[test]
    fn test_header_height() {
        let mut items = vec![header()];
        items.extend(logs(2));
        let layout = RowLayout::new(&items, None, HEIGHTS);
        assert_eq!(layout.height(0), 2);
        assert_eq!(layout.height(1), 1);
    }

    #[test]
    fn test_visible_range_reports_logical_rows() {
        let items = logs(20);
        let layout = RowLayout::new(&items, Some(1), HEIGHTS);
        let viewport = Viewport {
            offset: 0,
            height: 8,
        };
        // rows: 0 (1), 1 (1), detail (4), 2 (1), 3 (1) fill 8 cells
        assert_eq!(viewport.visible_range(&layout), 0..4);
        assert_eq!(viewport.row_at(&layout, 3), Some(ViewportRow::Detail(1)));
        assert_eq!(viewport.row_at(&layout, 6), Some(ViewportRow::Logical(2)));
    }

    #[test]
    fn test_scroll_to_row_auto_only_moves_when_needed() {
        let items = logs(50);
        let layout = RowLayout::new(&items, None, HEIGHTS);
        let mut viewport = Viewport {
            offset: 10,
            height: 10,
        };

        viewport.scroll_to_row(&layout, 12, ScrollAlign::Auto);
        assert_eq!(viewport.offset, 10);

        viewport.scroll_to_row(&layout, 25, ScrollAlign::Auto);
        assert_eq!(viewport.offset, 16);

        viewport.scroll_to_row(&layout, 3, ScrollAlign::Auto);
        assert_eq!(viewport.offset, 3);
    }

    #[test]
    fn test_scroll_to_row_accounts_for_detail_shift() {
        let items = logs(50);
        let layout = RowLayout::new(&items, Some(5), HEIGHTS);
        let mut viewport = Viewport {
            offset: 0,
            height: 10,
        };

        viewport.scroll_to_row(&layout, 20, ScrollAlign::Start);
        // logical 20 is viewport row 21
        assert_eq!(viewport.offset, 21);

        viewport.scroll_to_row(&layout, 5, ScrollAlign::Start);
        assert_eq!(viewport.offset, 5);
    }

    #[test]
    fn test_scroll_to_expanded_row_keeps_detail_visible() {
        let items = logs(50);
        let layout = RowLayout::new(&items, Some(30), HEIGHTS);
        let mut viewport = Viewport {
            offset: 0,
            height: 10,
        };

        viewport.scroll_to_row(&layout, 30, ScrollAlign::Auto);
        let rows: Vec<usize> = viewport
            .visible_rows(&layout)
            .into_iter()
            .map(|(row, _)| row)
            .collect();
        assert!(rows.contains(&30));
        assert!(rows.contains(&31));
        assert_eq!(viewport.offset, 25);
    }

    #[test]
    fn test_scroll_center_and_end() {
        let items = logs(50);
        let layout = RowLayout::new(&items, None, HEIGHTS);
        let mut viewport = Viewport {
            offset: 0,
            height: 10,
        };

        viewport.scroll_to_row(&layout, 20, ScrollAlign::Center);
        assert_eq!(viewport.offset, 15);

        viewport.scroll_to_row(&layout, 20, ScrollAlign::End);
        assert_eq!(viewport.offset, 11);
    }

    #[test]
    fn test_clamp_to_content() {
        let items = logs(5);
        let layout = RowLayout::new(&items, None, HEIGHTS);
        let mut viewport = Viewport {
            offset: 4,
            height: 10,
        };
        viewport.clamp(&layout);
        assert_eq!(viewport.offset, 0);
    }
}
