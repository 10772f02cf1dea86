use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout as RatatuiLayout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::AppState;
use crate::ui::components::{StatusBar, log_viewer_hints};
use crate::ui::{Theme, ViewportRow};
use cloudscope_logs::CompiledFilter;
use cloudscope_types::{DisplayItem, GroupSection, LogEvent, LogLevel};

/// Log viewer screen
pub struct LogViewerScreen;

/// Truncate to a display width, appending an ellipsis when cut
fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if max_width > 0 {
        out.push('…');
    }
    out
}

/// First line of a message, tabs expanded
fn single_line(message: &str) -> String {
    message.lines().next().unwrap_or("").replace('\t', "    ")
}

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, source: &str) {
        let area = frame.area();

        let ui = &state.ui_state;
        let show_filter_bar = ui.find.open || ui.active_filter.has_pattern() || ui.find.error.is_some();

        // Build constraints based on what's visible
        let mut constraints = vec![Constraint::Length(3)]; // Header always

        if ui.stats_visible {
            constraints.push(Constraint::Length(3)); // Stats bar
        }
        if show_filter_bar {
            constraints.push(Constraint::Length(3)); // Filter bar
        }
        constraints.push(Constraint::Min(1)); // Logs
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut idx = 0;

        Self::render_header(frame, chunks[idx], state, source);
        idx += 1;

        if state.ui_state.stats_visible {
            Self::render_stats_bar(frame, chunks[idx], state);
            idx += 1;
        }

        if show_filter_bar {
            Self::render_filter_bar(frame, chunks[idx], state);
            idx += 1;
        }

        Self::render_logs(frame, chunks[idx], state);
        idx += 1;

        Self::render_status_bar(frame, chunks[idx], state);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, source: &str) {
        let ui = &state.ui_state;
        let mut spans = vec![
            Span::styled("cloudscope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(source.to_string(), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(format!("{} events", state.store.len()), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!("group: {}", ui.grouping.label()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ];

        let hidden = ui.active_filter.disabled_levels();
        if !hidden.is_empty() {
            let mut levels: Vec<LogLevel> = hidden.iter().copied().collect();
            levels.sort();
            let names: Vec<&str> = levels.iter().map(|l| l.as_str()).collect();
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(format!("hidden: {}", names.join(" ")), Theme::text_dim()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let ui = &state.ui_state;
        let find = &ui.find;
        let mut spans = vec![];

        // Prompt
        if find.open {
            spans.push(Span::styled(
                " /",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(" Filter: ", Theme::text_dim()));
        }

        // Input or current filter pattern
        let pattern = if find.open {
            find.input.as_str()
        } else {
            ui.active_filter.pattern()
        };
        spans.push(Span::styled(pattern.to_string(), Theme::text_highlight()));

        // Cursor when active
        if find.open {
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        }

        // Error message
        if let Some(err) = &find.error {
            spans.push(Span::styled(" ", Theme::text()));
            spans.push(Span::styled(format!("⚠ {}", err), Style::default().fg(Color::Red)));
        }

        spans.push(Span::styled("  ", Theme::text()));
        let case_text = if ui.filter_case_insensitive {
            "[i] case-insensitive"
        } else {
            "[i] case-sensitive"
        };
        spans.push(Span::styled(case_text, Theme::text_dim()));
        if ui.grouping.is_grouped() {
            let group_text = if ui.group_filter {
                "  [w] whole groups"
            } else {
                "  [w] matching lines"
            };
            spans.push(Span::styled(group_text, Theme::text_dim()));
        }

        // Hints
        if find.open {
            spans.push(Span::styled("  [Enter] Apply  [Esc] Cancel", Theme::text_dim()));
        } else {
            spans.push(Span::styled("  [n] Clear  [/] Edit", Theme::text_dim()));
        }

        let filter_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if find.open {
                    Style::default().fg(Color::Yellow)
                } else if find.error.is_some() {
                    Style::default().fg(Color::Red)
                } else {
                    Theme::border()
                })
                .title(Span::styled(" Find ", Theme::title())),
        );

        frame.render_widget(filter_bar, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let projection = std::sync::Arc::clone(state.projection());

        let headers = projection.header_count();
        let rows = projection.log_count_in_view();
        let title = if headers > 0 {
            format!(" Logs ({rows} in {headers} groups) ")
        } else if state.ui_state.active_filter.is_empty() {
            format!(" Logs ({rows}) ")
        } else {
            format!(" Logs ({rows} matching) ")
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .title(Span::styled(title, Theme::title()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Last column is left to the scrollbar
        let list_area = Rect {
            width: inner.width.saturating_sub(1),
            ..inner
        };
        state.set_list_area(list_area);

        if projection.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "  No log lines match the current filter",
                Theme::text_dim(),
            )));
            frame.render_widget(empty, list_area);
            return;
        }

        let state = &*state;
        let layout = state.row_layout();
        let width = usize::from(list_area.width);
        let cursor = state.selection.selected_index;
        let show_stream = state.ui_state.grouping != cloudscope_types::GroupingMode::Stream;

        for (row, y) in state.viewport.visible_rows(&layout) {
            let height = layout.height(row).min(list_area.height.saturating_sub(y));
            let rect = Rect::new(list_area.x, list_area.y + y, list_area.width, height);

            match layout.to_logical(row) {
                Some(ViewportRow::Logical(logical)) => match &projection.items()[logical] {
                    DisplayItem::Header { group } => {
                        let collapsed = state.ui_state.collapsed.contains(&group.id);
                        let line = Self::header_line(group, collapsed, width);
                        frame.render_widget(Paragraph::new(line), rect);
                    }
                    DisplayItem::Log { log, log_index } => {
                        let mut row_style = Style::default();
                        if *log_index < 0 {
                            row_style = row_style.patch(Theme::synthetic_row());
                        }
                        if state.selection.selected_set.contains(log_index) {
                            row_style = row_style.patch(Theme::selected_row());
                        }
                        let is_cursor = cursor == Some(*log_index);
                        if is_cursor {
                            row_style = row_style.patch(Theme::cursor_row());
                        }
                        let line = Self::log_line(
                            log,
                            is_cursor,
                            show_stream,
                            &state.ui_state.active_filter,
                            width,
                        );
                        frame.render_widget(Paragraph::new(line).style(row_style), rect);
                    }
                },
                Some(ViewportRow::Detail(logical)) => {
                    if let Some(log) = projection.get(logical).and_then(DisplayItem::log) {
                        let panel = Paragraph::new(Self::detail_lines(log))
                            .style(Theme::detail_panel())
                            .wrap(Wrap { trim: false });
                        frame.render_widget(panel, rect);
                    }
                }
                None => {}
            }
        }

        // Render scrollbar
        let total_rows = layout.row_count();
        if total_rows > usize::from(list_area.height) {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_rows)
                .position(state.viewport.offset);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    /// Section header: fold marker then the summary
    fn header_line(group: &GroupSection, collapsed: bool, width: usize) -> Line<'static> {
        let marker = if collapsed { "▸ " } else { "▾ " };
        let style = if group.is_cold_start() {
            Theme::group_header_cold()
        } else {
            Theme::group_header()
        };

        let summary = truncate_to_width(&group.summary(), width.saturating_sub(2));
        let mut spans = vec![Span::styled(marker, style)];
        match group.invocation() {
            Some(detail) if detail.in_progress => {
                spans.push(Span::styled(summary, style.patch(Theme::group_in_progress())));
            }
            _ if group.metadata.has_error => {
                spans.push(Span::styled(summary, style.fg(Color::LightRed)));
            }
            _ => spans.push(Span::styled(summary, style)),
        }

        let used: usize = spans.iter().map(|s| s.content.width()).sum();
        spans.push(Span::styled(" ".repeat(width.saturating_sub(used)), style));
        Line::from(spans)
    }

    fn log_line(
        log: &LogEvent,
        is_cursor: bool,
        show_stream: bool,
        filter: &CompiledFilter,
        available_width: usize,
    ) -> Line<'static> {
        let mut spans = Vec::new();
        let mut prefix_width: usize = 0;

        spans.push(Span::styled(
            if is_cursor { "▌" } else { " " },
            Style::default().fg(Theme::PRIMARY),
        ));
        prefix_width += 1;

        // Time of day with milliseconds - 12 chars
        let time = log.formatted_time.get(11..).unwrap_or(&log.formatted_time);
        spans.push(Span::styled(format!("{time:<12}"), Theme::text_dim()));
        prefix_width += 12;

        if show_stream && log.stream_id.is_some() {
            let stream = log.short_stream_name();
            spans.push(Span::styled(
                format!(" {:>10}", truncate_to_width(stream, 10)),
                Style::default().fg(stream_color(stream)),
            ));
            prefix_width += 11;
        }

        // Log level (fixed width) - " XXX" = 4 chars
        spans.push(Span::styled(
            format!(" {:>3}", log.level.as_str()),
            Style::default()
                .fg(log.level.color())
                .add_modifier(Modifier::BOLD),
        ));
        prefix_width += 4;

        spans.push(Span::styled(" │ ", Theme::text_dim()));
        prefix_width += 3;

        let message_width = available_width.saturating_sub(prefix_width);
        let display_msg = truncate_to_width(&single_line(&log.message), message_width);
        let base_style = Theme::level_text(log.level);

        // Apply search highlighting if filter is active
        let mut last_end = 0;
        for (start, end) in filter.find_matches(&display_msg) {
            let (Some(before), Some(hit)) = (display_msg.get(last_end..start), display_msg.get(start..end)) else {
                continue;
            };
            if !before.is_empty() {
                spans.push(Span::styled(before.to_string(), base_style));
            }
            spans.push(Span::styled(hit.to_string(), Theme::match_highlight()));
            last_end = end;
        }
        if let Some(rest) = display_msg.get(last_end..)
            && !rest.is_empty()
        {
            spans.push(Span::styled(rest.to_string(), base_style));
        }

        Line::from(spans)
    }

    /// Detail panel of an expanded row: where it came from, then the full
    /// message or the structured payload
    fn detail_lines(log: &LogEvent) -> Vec<Line<'static>> {
        let label = Style::default().fg(Theme::FG_DIM);
        let mut lines = vec![Line::from(vec![
            Span::styled("  time ", label),
            Span::styled(log.formatted_time.clone(), Theme::text()),
            Span::styled("  level ", label),
            Span::styled(log.level.as_str(), Style::default().fg(log.level.color())),
            Span::styled("  stream ", label),
            Span::styled(log.stream_id.clone().unwrap_or_else(|| "-".to_string()), Theme::text()),
        ])];
        if let Some(event_id) = &log.event_id {
            lines.push(Line::from(vec![
                Span::styled("  event ", label),
                Span::styled(event_id.clone(), Theme::text_dim()),
            ]));
        }

        match &log.payload {
            Some(payload) => {
                let pretty = serde_json::to_string_pretty(&Value::Object(payload.clone()))
                    .unwrap_or_else(|_| log.message.clone());
                lines.extend(pretty.lines().map(json_line));
            }
            None => lines.extend(
                log.message
                    .lines()
                    .map(|l| Line::from(Span::styled(format!("  {l}"), Theme::text()))),
            ),
        }
        lines
    }

    fn render_stats_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let counts = state.store.level_counts();
        let hidden = state.ui_state.active_filter.disabled_levels();

        let mut spans = vec![Span::styled(" ", Theme::text())];
        for (digit, level) in ('1'..).zip(LogLevel::ALL) {
            let count = counts.get(level);
            let mut style = Style::default().fg(level.color()).add_modifier(Modifier::BOLD);
            if hidden.contains(&level) {
                style = Theme::text_dim().add_modifier(Modifier::CROSSED_OUT);
            }
            spans.push(Span::styled(format!("{digit}:{}", level.as_str()), style));
            spans.push(Span::styled(format!(" {count}  "), Theme::text()));
        }

        let projection = state.projection();
        let cache = state.memo.stats();
        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled(
            format!(
                "view {} rows · {} synthetic · cache {}/{}",
                projection.len(),
                projection.synthetic_count(),
                cache.hits,
                cache.hits + cache.misses
            ),
            Theme::text_dim(),
        ));

        let stats_widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Stats ", Theme::title())),
        );

        frame.render_widget(stats_widget, area);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let ui = &state.ui_state;
        let right = match &ui.status_message {
            Some(msg) => msg.clone(),
            None => {
                let selected = state.selection.selected_set.len();
                let position = state
                    .cursor_position()
                    .map(|p| format!("{}/{}", p + 1, state.projection().len()))
                    .unwrap_or_else(|| "-".to_string());
                if selected > 0 {
                    format!("{selected} selected │ {position}")
                } else {
                    position
                }
            }
        };

        let bar = StatusBar::new()
            .hints(log_viewer_hints(ui.grouping.is_grouped()))
            .right(right);
        frame.render_widget(bar, area);
    }
}

/// Color one line of pretty-printed JSON: keys, then values by type
fn json_line(line: &str) -> Line<'static> {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(indent_len);
    let mut spans = vec![Span::raw(format!("  {indent}"))];

    let (key, value) = match rest.split_once("\": ") {
        Some((key, value)) if key.starts_with('"') => (Some(format!("{key}\": ")), value),
        _ => (None, rest),
    };
    if let Some(key) = key {
        spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
    }

    let bare = value.trim_end_matches(',');
    let style = if bare.starts_with('"') {
        Style::default().fg(Color::Green)
    } else if bare == "true" || bare == "false" {
        Style::default().fg(Color::Magenta)
    } else if bare == "null" {
        Style::default().fg(Color::Red)
    } else if bare.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    spans.push(Span::styled(value.to_string(), style));
    Line::from(spans)
}

/// Get a consistent color for a stream name
fn stream_color(stream: &str) -> Color {
    let hash: u32 = stream
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_add(b as u32));

    let colors = [
        Color::Cyan,
        Color::Magenta,
        Color::Blue,
        Color::Yellow,
        Color::Green,
        Color::LightCyan,
        Color::LightMagenta,
    ];

    colors[(hash as usize) % colors.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        // wide characters count double
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_log_line_highlights_matches() {
        let log = LogEvent::new(0, "timeout after 3s").with_level(LogLevel::Error);
        let filter = CompiledFilter::new_case_insensitive("TIMEOUT").unwrap();
        let line = LogViewerScreen::log_line(&log, false, false, &filter, 80);

        let hit = line
            .spans
            .iter()
            .find(|s| s.style == Theme::match_highlight())
            .unwrap();
        assert_eq!(hit.content, "timeout");
        assert!(text(&line).ends_with("timeout after 3s"));
    }

    #[test]
    fn test_header_line_fills_width() {
        let section = GroupSection::new("stream:a", "a", Vec::new(), cloudscope_types::SectionKind::Stream);
        let line = LogViewerScreen::header_line(&section, true, 30);
        assert!(text(&line).starts_with("▸ a"));
        assert_eq!(text(&line).width(), 30);
    }

    #[test]
    fn test_json_line_colors_key_and_value() {
        let line = json_line("  \"count\": 3,");
        assert_eq!(line.spans[1].content, "\"count\": ");
        assert_eq!(line.spans[1].style.fg, Some(Color::Cyan));
        assert_eq!(line.spans[2].style.fg, Some(Color::Yellow));
    }

    #[test]
    fn test_single_line_takes_first_line() {
        assert_eq!(single_line("a\tb\nsecond"), "a    b");
    }
}
