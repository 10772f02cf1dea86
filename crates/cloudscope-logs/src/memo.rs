//! Cache of the last filter, grouping and projection results.
//!
//! Large inputs are keyed by `Arc` pointer identity: the store hands out the
//! same snapshot until it is written, and every stage returns the same `Arc`
//! on a hit, so a change anywhere upstream invalidates everything below it.
//! Small inputs (mode, patterns, level and collapsed sets) compare by value.

use std::collections::HashSet;
use std::sync::Arc;

use cloudscope_types::{ArcLogEvent, GroupSection, GroupingMode, LogLevel};

use crate::filter::CompiledFilter;
use crate::grouping::group_logs;
use crate::projection::{Projection, ProjectionInput, compute_display_items};

type Logs = Arc<Vec<ArcLogEvent>>;
type Sections = Arc<Vec<Arc<GroupSection>>>;

#[derive(Clone, PartialEq, Eq)]
struct FilterKey {
    pattern: String,
    /// The same text compiles differently as a literal and as a regex
    literal: bool,
    case_insensitive: bool,
    disabled_levels: HashSet<LogLevel>,
}

impl From<&CompiledFilter> for FilterKey {
    fn from(filter: &CompiledFilter) -> Self {
        Self {
            pattern: filter.pattern().to_string(),
            literal: filter.is_literal(),
            case_insensitive: filter.is_case_insensitive(),
            disabled_levels: filter.disabled_levels().clone(),
        }
    }
}

struct FilterEntry {
    logs: Logs,
    key: FilterKey,
    value: Logs,
}

struct SectionsEntry {
    logs: Logs,
    mode: GroupingMode,
    value: Sections,
}

struct ProjectionEntry {
    filtered: Logs,
    sections: Sections,
    mode: GroupingMode,
    collapsed: HashSet<String>,
    disabled_levels: HashSet<LogLevel>,
    group_filter: Option<FilterKey>,
    value: Arc<Projection>,
}

/// Hit and miss counts of the projection stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoized pipeline: logs → filtered logs → sections → projection
#[derive(Default)]
pub struct ProjectionMemo {
    filtered: Option<FilterEntry>,
    sections: Option<SectionsEntry>,
    projection: Option<ProjectionEntry>,
    stats: MemoStats,
}

impl ProjectionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs passing the filter
    pub fn filtered(&mut self, logs: &Logs, filter: &CompiledFilter) -> Logs {
        let key = FilterKey::from(filter);
        if let Some(entry) = &self.filtered
            && Arc::ptr_eq(&entry.logs, logs)
            && entry.key == key
        {
            return Arc::clone(&entry.value);
        }

        let value = filter.apply(logs);
        self.filtered = Some(FilterEntry {
            logs: Arc::clone(logs),
            key,
            value: Arc::clone(&value),
        });
        value
    }

    /// Sections over all logs
    pub fn sections(&mut self, logs: &Logs, mode: GroupingMode) -> Sections {
        if let Some(entry) = &self.sections
            && Arc::ptr_eq(&entry.logs, logs)
            && entry.mode == mode
        {
            return Arc::clone(&entry.value);
        }

        let value = Arc::new(group_logs(mode, logs));
        self.sections = Some(SectionsEntry {
            logs: Arc::clone(logs),
            mode,
            value: Arc::clone(&value),
        });
        value
    }

    /// Full pipeline. `group_filter` enables the group-survives mode.
    pub fn project(
        &mut self,
        logs: &Logs,
        filter: &CompiledFilter,
        mode: GroupingMode,
        collapsed: &HashSet<String>,
        group_filter: Option<&CompiledFilter>,
    ) -> Arc<Projection> {
        let filtered = self.filtered(logs, filter);
        let sections = self.sections(logs, mode);
        let group_key = group_filter.filter(|f| f.has_pattern()).map(FilterKey::from);

        if let Some(entry) = &self.projection
            && Arc::ptr_eq(&entry.filtered, &filtered)
            && Arc::ptr_eq(&entry.sections, &sections)
            && entry.mode == mode
            && entry.collapsed == *collapsed
            && entry.disabled_levels == *filter.disabled_levels()
            && entry.group_filter == group_key
        {
            self.stats.hits += 1;
            return Arc::clone(&entry.value);
        }

        self.stats.misses += 1;
        let value = Arc::new(compute_display_items(&ProjectionInput {
            filtered: &filtered,
            mode,
            sections: &sections,
            collapsed,
            disabled_levels: filter.disabled_levels(),
            group_filter,
        }));

        self.projection = Some(ProjectionEntry {
            filtered,
            sections,
            mode,
            collapsed: collapsed.clone(),
            disabled_levels: filter.disabled_levels().clone(),
            group_filter: group_key,
            value: Arc::clone(&value),
        });
        value
    }

    /// Drop every cached stage
    pub fn invalidate(&mut self) {
        self.filtered = None;
        self.sections = None;
        self.projection = None;
    }

    pub fn stats(&self) -> MemoStats {
        self.stats
    }
}
