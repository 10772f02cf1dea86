use std::collections::HashMap;
use std::sync::Arc;

use cloudscope_types::{ArcLogEvent, GroupSection, SectionKind};

/// Label of the bucket for events without a stream identity
pub const UNKNOWN_STREAM_LABEL: &str = "(unknown stream)";

/// One section per stream identity, members in input order, sections
/// oldest-first.
pub fn group_logs_by_stream(logs: &[ArcLogEvent]) -> Vec<Arc<GroupSection>> {
    let mut order: Vec<Option<&str>> = Vec::new();
    let mut buckets: HashMap<Option<&str>, (usize, Vec<ArcLogEvent>)> = HashMap::new();

    for (pos, log) in logs.iter().enumerate() {
        let key = log.stream_id.as_deref();
        buckets
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                (pos, Vec::new())
            })
            .1
            .push(log.clone());
    }

    let sections = order
        .into_iter()
        .filter_map(|key| {
            let (first_seen, members) = buckets.remove(&key)?;
            let (id, label) = match key {
                Some(stream) => (format!("stream:{stream}"), stream.to_string()),
                None => ("stream:unknown".to_string(), UNKNOWN_STREAM_LABEL.to_string()),
            };
            Some((
                first_seen,
                GroupSection::new(id, label, members, SectionKind::Stream),
            ))
        })
        .collect();

    let sections = super::into_chronological(sections);
    tracing::debug!(streams = sections.len(), logs = logs.len(), "grouped logs by stream");
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudscope_types::LogEvent;
    use std::collections::HashSet;

    fn log(id: u64, timestamp: i64, stream: Option<&str>) -> ArcLogEvent {
        let mut e = LogEvent::new(timestamp, format!("line {id}"));
        e.id = id;
        e.stream_id = stream.map(str::to_string);
        Arc::new(e)
    }

    #[test]
    fn test_empty_input() {
        assert!(group_logs_by_stream(&[]).is_empty());
    }

    #[test]
    fn test_partitions_without_overlap() {
        let logs = vec![
            log(1, 10, Some("a")),
            log(2, 11, Some("b")),
            log(3, 12, None),
            log(4, 13, Some("a")),
            log(5, 14, None),
        ];
        let sections = group_logs_by_stream(&logs);

        let total: usize = sections.iter().map(|s| s.metadata.log_count).sum();
        assert_eq!(total, logs.len());

        let mut seen = HashSet::new();
        for section in &sections {
            for member in &section.logs {
                assert!(seen.insert(member.id), "event {} in two sections", member.id);
            }
        }
        assert_eq!(seen.len(), logs.len());
    }

    #[test]
    fn test_missing_stream_collapses_to_unknown_bucket() {
        let logs = vec![log(1, 10, None), log(2, 20, Some("a")), log(3, 30, None)];
        let sections = group_logs_by_stream(&logs);

        let unknown = sections
            .iter()
            .find(|s| s.label == UNKNOWN_STREAM_LABEL)
            .unwrap();
        let ids: Vec<u64> = unknown.logs.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_sorted_by_first_timestamp() {
        // stream "late" is seen first but its earliest member is newer
        let logs = vec![
            log(1, 50, Some("late")),
            log(2, 20, Some("early")),
            log(3, 10, Some("late")),
            log(4, 30, Some("middle")),
        ];
        let sections = group_logs_by_stream(&logs);
        let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();

        // "late" has min timestamp 10, so it sorts first
        assert_eq!(labels, vec!["late", "early", "middle"]);
        assert_eq!(sections[0].metadata.first_timestamp, 10);
        assert_eq!(sections[0].metadata.last_timestamp, 50);
        // member order is input order, not time order
        let ids: Vec<u64> = sections[0].logs.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_ties_broken_by_first_seen() {
        let logs = vec![
            log(1, 10, Some("b")),
            log(2, 10, Some("a")),
            log(3, 10, Some("c")),
        ];
        let sections = group_logs_by_stream(&logs);
        let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
    }
}
