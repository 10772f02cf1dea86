//! Flattening of sections and filtered logs into the row list a viewport
//! renders, plus the index that maps rows back to log events.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cloudscope_types::{ArcLogEvent, DisplayItem, GroupSection, GroupingMode, LogLevel};

use crate::filter::CompiledFilter;

/// Everything a projection depends on
#[derive(Clone, Copy)]
pub struct ProjectionInput<'a> {
    /// Logs that passed the active filter, in order
    pub filtered: &'a Arc<Vec<ArcLogEvent>>,
    pub mode: GroupingMode,
    /// Sections computed over all logs, not just the filtered ones
    pub sections: &'a [Arc<GroupSection>],
    /// Ids of sections shown as a header only
    pub collapsed: &'a HashSet<String>,
    pub disabled_levels: &'a HashSet<LogLevel>,
    /// When set with a non-empty pattern, a section with any matching member
    /// is shown whole, including members the filter removed
    pub group_filter: Option<&'a CompiledFilter>,
}

/// Row list plus the lookups that go with it
#[derive(Clone, Debug, Default)]
pub struct Projection {
    items: Vec<DisplayItem>,
    filtered: Arc<Vec<ArcLogEvent>>,
    /// Members shown only because their section matched, by negative index
    synthetic: HashMap<i64, ArcLogEvent>,
    /// Row position of every log index present in `items`
    positions: HashMap<i64, usize>,
    /// Log index of every event present in `items`, by event id
    event_index: HashMap<u64, i64>,
    header_count: usize,
}

impl Projection {
    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Row at a display position
    pub fn get(&self, position: usize) -> Option<&DisplayItem> {
        self.items.get(position)
    }

    /// The filtered sequence this projection was built from
    pub fn filtered(&self) -> &Arc<Vec<ArcLogEvent>> {
        &self.filtered
    }

    /// Event behind a log index, real or synthetic
    pub fn resolve(&self, log_index: i64) -> Option<&ArcLogEvent> {
        if log_index >= 0 {
            self.filtered.get(log_index as usize)
        } else {
            self.synthetic.get(&log_index)
        }
    }

    /// Display position of the row carrying a log index. `None` when the
    /// index is not on screen (collapsed, hidden by level, or unknown).
    pub fn position_of(&self, log_index: i64) -> Option<usize> {
        self.positions.get(&log_index).copied()
    }

    /// Log index currently assigned to an event, by event id
    pub fn index_of_event(&self, event_id: u64) -> Option<i64> {
        self.event_index.get(&event_id).copied()
    }

    /// Display position of a section header
    pub fn position_of_group(&self, group_id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.group().is_some_and(|g| g.id == group_id))
    }

    /// Log indices of all log rows, in display order
    pub fn log_indices(&self) -> Vec<i64> {
        self.items.iter().filter_map(DisplayItem::log_index).collect()
    }

    /// Number of log rows
    pub fn log_count_in_view(&self) -> usize {
        self.items.len() - self.header_count
    }

    pub fn header_count(&self) -> usize {
        self.header_count
    }

    /// Number of rows carrying a synthetic index
    pub fn synthetic_count(&self) -> usize {
        self.synthetic.len()
    }

    fn push_header(&mut self, group: &Arc<GroupSection>) {
        self.items.push(DisplayItem::Header {
            group: Arc::clone(group),
        });
        self.header_count += 1;
    }

    fn push_log(&mut self, log: &ArcLogEvent, log_index: i64) {
        self.positions.insert(log_index, self.items.len());
        self.event_index.insert(log.id, log_index);
        self.items.push(DisplayItem::Log {
            log: Arc::clone(log),
            log_index,
        });
    }
}

/// Build the row list.
///
/// Ungrouped, every filtered log is one row indexed by its position. Grouped,
/// each section contributes a header and, unless collapsed, its visible
/// members in member order. Synthetic indices count down from -1 and are only
/// minted for rows actually emitted.
pub fn compute_display_items(input: &ProjectionInput<'_>) -> Projection {
    let mut projection = Projection {
        filtered: Arc::clone(input.filtered),
        ..Default::default()
    };

    if !input.mode.is_grouped() {
        projection.items.reserve(input.filtered.len());
        for (idx, log) in input.filtered.iter().enumerate() {
            projection.push_log(log, idx as i64);
        }
        return projection;
    }

    let filtered_positions: HashMap<u64, usize> = input
        .filtered
        .iter()
        .enumerate()
        .map(|(idx, log)| (log.id, idx))
        .collect();

    let group_filter = input.group_filter.filter(|f| f.has_pattern());
    let mut next_synthetic: i64 = -1;

    for section in input.sections {
        let rescued = group_filter.is_some_and(|f| section.logs.iter().any(|l| f.matches_text(l)));

        let visible: Vec<(&ArcLogEvent, Option<usize>)> = section
            .logs
            .iter()
            .filter(|log| !input.disabled_levels.contains(&log.level))
            .map(|log| (log, filtered_positions.get(&log.id).copied()))
            .filter(|(_, position)| rescued || position.is_some())
            .collect();

        if visible.is_empty() {
            continue;
        }

        projection.push_header(section);
        if input.collapsed.contains(&section.id) {
            continue;
        }

        for (log, position) in visible {
            let log_index = match position {
                Some(idx) => idx as i64,
                None => {
                    let idx = next_synthetic;
                    next_synthetic -= 1;
                    projection.synthetic.insert(idx, Arc::clone(log));
                    idx
                }
            };
            projection.push_log(log, log_index);
        }
    }

    tracing::debug!(
        rows = projection.items.len(),
        headers = projection.header_count,
        synthetic = projection.synthetic.len(),
        "computed display items"
    );

    projection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{group_logs_by_invocation, group_logs_by_stream};
    use cloudscope_types::LogEvent;

    fn log(id: u64, timestamp: i64, stream: &str, message: &str, level: LogLevel) -> ArcLogEvent {
        let mut e = LogEvent::new(timestamp, message)
            .with_stream(stream)
            .with_level(level);
        e.id = id;
        Arc::new(e)
    }

    struct Fixture {
        all: Vec<ArcLogEvent>,
        collapsed: HashSet<String>,
        disabled: HashSet<LogLevel>,
    }

    impl Fixture {
        fn new(all: Vec<ArcLogEvent>) -> Self {
            Self {
                all,
                collapsed: HashSet::new(),
                disabled: HashSet::new(),
            }
        }

        fn project(
            &self,
            filtered: &Arc<Vec<ArcLogEvent>>,
            mode: GroupingMode,
            sections: &[Arc<GroupSection>],
            group_filter: Option<&CompiledFilter>,
        ) -> Projection {
            compute_display_items(&ProjectionInput {
                filtered,
                mode,
                sections,
                collapsed: &self.collapsed,
                disabled_levels: &self.disabled,
                group_filter,
            })
        }
    }

    fn two_streams() -> Vec<ArcLogEvent> {
        vec![
            log(1, 1, "a", "alpha one", LogLevel::Info),
            log(2, 2, "b", "beta one", LogLevel::Info),
            log(3, 3, "a", "alpha two", LogLevel::Debug),
            log(4, 4, "b", "beta two", LogLevel::Error),
        ]
    }

    #[test]
    fn test_ungrouped_uses_filtered_positions() {
        let fx = Fixture::new(two_streams());
        let filtered = Arc::new(vec![fx.all[1].clone(), fx.all[3].clone()]);
        let projection = fx.project(&filtered, GroupingMode::None, &[], None);

        assert_eq!(projection.len(), 2);
        assert_eq!(projection.header_count(), 0);
        assert_eq!(projection.items()[1].log_index(), Some(1));
        assert_eq!(projection.resolve(1).map(|l| l.id), Some(4));
        assert_eq!(projection.position_of(1), Some(1));
    }

    #[test]
    fn test_grouped_emits_headers_then_members() {
        let fx = Fixture::new(two_streams());
        let filtered = Arc::new(fx.all.clone());
        let sections = group_logs_by_stream(&fx.all);
        let projection = fx.project(&filtered, GroupingMode::Stream, &sections, None);

        let shape: Vec<Option<i64>> = projection.items().iter().map(|i| i.log_index()).collect();
        assert_eq!(shape, vec![None, Some(0), Some(2), None, Some(1), Some(3)]);
        assert_eq!(projection.header_count(), 2);
        assert_eq!(projection.log_count_in_view(), 4);
        assert_eq!(projection.log_indices(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_section_without_visible_members_is_omitted() {
        let fx = Fixture::new(two_streams());
        // only stream b survives the filter
        let filtered = Arc::new(vec![fx.all[1].clone(), fx.all[3].clone()]);
        let sections = group_logs_by_stream(&fx.all);
        let projection = fx.project(&filtered, GroupingMode::Stream, &sections, None);

        assert_eq!(projection.header_count(), 1);
        assert_eq!(projection.len(), 3);
        assert_eq!(projection.items()[0].group().map(|g| g.label.as_str()), Some("b"));
    }

    #[test]
    fn test_collapsed_group_yields_header_only() {
        let mut fx = Fixture::new(two_streams());
        fx.collapsed.insert("stream:a".to_string());
        let filtered = Arc::new(fx.all.clone());
        let sections = group_logs_by_stream(&fx.all);
        let projection = fx.project(&filtered, GroupingMode::Stream, &sections, None);

        let shape: Vec<bool> = projection.items().iter().map(|i| i.is_header()).collect();
        assert_eq!(shape, vec![true, true, false, false]);
        assert_eq!(projection.position_of(0), None);
        assert_eq!(projection.position_of_group("stream:a"), Some(0));
        assert_eq!(projection.position_of_group("stream:b"), Some(1));
    }

    #[test]
    fn test_disabled_level_keeps_header() {
        let mut fx = Fixture::new(vec![
            log(1, 1, "a", "noisy", LogLevel::Debug),
            log(2, 2, "a", "kept", LogLevel::Info),
        ]);
        fx.disabled.insert(LogLevel::Debug);
        let filtered = Arc::new(fx.all.clone());
        let sections = group_logs_by_stream(&fx.all);
        let projection = fx.project(&filtered, GroupingMode::Stream, &sections, None);

        assert_eq!(projection.len(), 2);
        assert!(projection.items()[0].is_header());
        assert_eq!(projection.items()[1].log().map(|l| l.id), Some(2));
    }

    #[test]
    fn test_group_survives_rescues_filtered_members() {
        let fx = Fixture::new(vec![
            log(1, 1, "s", "START RequestId: abc", LogLevel::System),
            log(2, 2, "s", "needle here", LogLevel::Info),
        ]);
        let filter = CompiledFilter::new("needle").unwrap();
        let filtered = filter.apply(&fx.all);
        assert_eq!(filtered.len(), 1);

        let sections = group_logs_by_invocation(&fx.all);
        let projection = fx.project(
            &filtered,
            GroupingMode::Invocation,
            &sections,
            Some(&filter),
        );

        assert_eq!(projection.len(), 3);
        assert!(projection.items()[0].is_header());
        // the START line was filtered out, so it carries a synthetic index
        assert_eq!(projection.items()[1].log_index(), Some(-1));
        assert_eq!(projection.items()[2].log_index(), Some(0));
        assert_eq!(projection.resolve(-1).map(|l| l.id), Some(1));
        assert_eq!(projection.synthetic_count(), 1);
    }

    #[test]
    fn test_group_survives_with_empty_text_is_off() {
        let fx = Fixture::new(two_streams());
        let filtered = Arc::new(vec![fx.all[0].clone()]);
        let sections = group_logs_by_stream(&fx.all);
        let empty = CompiledFilter::default();
        let projection = fx.project(&filtered, GroupingMode::Stream, &sections, Some(&empty));

        assert_eq!(projection.len(), 2);
        assert_eq!(projection.synthetic_count(), 0);
    }

    #[test]
    fn test_group_survives_respects_levels_and_collapse() {
        let mut fx = Fixture::new(vec![
            log(1, 1, "a", "needle", LogLevel::Info),
            log(2, 2, "a", "debug chatter", LogLevel::Debug),
            log(3, 3, "a", "other", LogLevel::Info),
            log(4, 4, "b", "needle again", LogLevel::Info),
            log(5, 5, "b", "more", LogLevel::Info),
        ]);
        fx.disabled.insert(LogLevel::Debug);
        fx.collapsed.insert("stream:b".to_string());

        let filter = CompiledFilter::new("needle").unwrap();
        let filtered = filter.apply(&fx.all);
        let sections = group_logs_by_stream(&fx.all);
        let projection = fx.project(&filtered, GroupingMode::Stream, &sections, Some(&filter));

        // a: header, needle (real), other (synthetic); b: header only
        assert_eq!(projection.len(), 4);
        assert_eq!(projection.items()[1].log_index(), Some(0));
        assert_eq!(projection.items()[2].log_index(), Some(-1));
        assert!(projection.items()[3].is_header());
        // no synthetic ids are minted for collapsed members
        assert_eq!(projection.synthetic_count(), 1);
    }

    #[test]
    fn test_synthetic_indices_unique_and_resolvable() {
        let all: Vec<ArcLogEvent> = (0..12)
            .map(|i| {
                let msg = if i % 4 == 0 { "match" } else { "other" };
                log(i + 1, i as i64, &format!("s{}", i % 3), msg, LogLevel::Info)
            })
            .collect();
        let fx = Fixture::new(all);
        let filter = CompiledFilter::new("match").unwrap();
        let filtered = filter.apply(&fx.all);
        let sections = group_logs_by_stream(&fx.all);
        let projection = fx.project(&filtered, GroupingMode::Stream, &sections, Some(&filter));

        let mut seen = HashSet::new();
        for (position, item) in projection.items().iter().enumerate() {
            let Some(idx) = item.log_index() else { continue };
            assert!(seen.insert(idx), "duplicate log index {idx}");
            assert_eq!(projection.position_of(idx), Some(position));
            let resolved = projection.resolve(idx).unwrap();
            assert!(Arc::ptr_eq(resolved, item.log().unwrap()));
            assert_eq!(projection.index_of_event(resolved.id), Some(idx));
        }
        assert!(projection.synthetic_count() > 0);
    }

    #[test]
    fn test_membership_is_by_identity_not_content() {
        // two distinct events with identical fields
        let fx = Fixture::new(vec![
            log(1, 1, "a", "same", LogLevel::Info),
            log(2, 1, "a", "same", LogLevel::Info),
        ]);
        let filtered = Arc::new(vec![fx.all[1].clone()]);
        let sections = group_logs_by_stream(&fx.all);
        let projection = fx.project(&filtered, GroupingMode::Stream, &sections, None);

        assert_eq!(projection.len(), 2);
        assert_eq!(projection.items()[1].log().map(|l| l.id), Some(2));
    }
}
