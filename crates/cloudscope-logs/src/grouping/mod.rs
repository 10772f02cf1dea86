//! Partitioning of an ordered log sequence into sections.
//!
//! Both groupers are pure functions of their input: any scan state is owned
//! by the call, and the output is rebuilt from scratch on every change.

mod invocation;
mod stream;

use std::sync::Arc;

use cloudscope_types::{ArcLogEvent, GroupSection, GroupingMode};

pub use invocation::{COLD_START_LABEL, UNGROUPED_ID, UNGROUPED_LABEL, group_logs_by_invocation};
pub use stream::{UNKNOWN_STREAM_LABEL, group_logs_by_stream};

/// Group logs according to the mode. `None` produces no sections.
pub fn group_logs(mode: GroupingMode, logs: &[ArcLogEvent]) -> Vec<Arc<GroupSection>> {
    match mode {
        GroupingMode::None => Vec::new(),
        GroupingMode::Stream => group_logs_by_stream(logs),
        GroupingMode::Invocation => group_logs_by_invocation(logs),
    }
}

/// Sort sections oldest-first. Each section carries the input position of
/// its first member, which breaks timestamp ties.
fn into_chronological(mut sections: Vec<(usize, GroupSection)>) -> Vec<Arc<GroupSection>> {
    sections.sort_by_key(|(first_seen, section)| (section.metadata.first_timestamp, *first_seen));
    sections
        .into_iter()
        .map(|(_, section)| Arc::new(section))
        .collect()
}
