use std::collections::HashMap;
use std::sync::Arc;

use cloudscope_types::{ArcLogEvent, GroupSection, InvocationDetail, SectionKind};

use crate::markers::{self, Marker, ReportFields};

/// Id of the section collecting lines outside any invocation or init window
pub const UNGROUPED_ID: &str = "ungrouped";

pub const UNGROUPED_LABEL: &str = "Ungrouped logs";

pub const COLD_START_LABEL: &str = "Cold start (init)";

/// Figures kept from a REPORT line
#[derive(Clone, Copy, Default)]
struct Report {
    duration: f64,
    billed_duration: u64,
    memory_allocated: u64,
    memory_used: u64,
    init_duration: Option<f64>,
}

impl From<&ReportFields<'_>> for Report {
    fn from(fields: &ReportFields<'_>) -> Self {
        Self {
            duration: fields.duration,
            billed_duration: fields.billed_duration,
            memory_allocated: fields.memory_allocated,
            memory_used: fields.memory_used,
            init_duration: fields.init_duration,
        }
    }
}

/// Lines collected for one request id
struct Bucket<'a> {
    request_id: &'a str,
    first_seen: usize,
    logs: Vec<ArcLogEvent>,
    completed: bool,
    report: Option<Report>,
}

/// Per-stream state while scanning
#[derive(Default)]
struct ScanState {
    /// Bucket currently receiving plain lines
    active: Option<usize>,
    /// Lines seen outside any invocation, with their input positions
    pending: Vec<(usize, ArcLogEvent)>,
}

/// Single pass over the logs. All state lives here and is dropped with the
/// scanner, so concurrent calls never interfere.
struct InvocationScanner<'a> {
    streams: HashMap<Option<&'a str>, ScanState>,
    stream_order: Vec<Option<&'a str>>,
    buckets: Vec<Bucket<'a>>,
    bucket_index: HashMap<&'a str, usize>,
    init_sections: Vec<(usize, GroupSection)>,
    orphans: Vec<(usize, ArcLogEvent)>,
    init_seq: usize,
}

impl<'a> InvocationScanner<'a> {
    fn new() -> Self {
        Self {
            streams: HashMap::new(),
            stream_order: Vec::new(),
            buckets: Vec::new(),
            bucket_index: HashMap::new(),
            init_sections: Vec::new(),
            orphans: Vec::new(),
            init_seq: 0,
        }
    }

    fn state(&mut self, stream: Option<&'a str>) -> &mut ScanState {
        let order = &mut self.stream_order;
        self.streams.entry(stream).or_insert_with(|| {
            order.push(stream);
            ScanState::default()
        })
    }

    fn bucket_for(&mut self, request_id: &'a str, pos: usize) -> usize {
        if let Some(&idx) = self.bucket_index.get(request_id) {
            return idx;
        }
        let idx = self.buckets.len();
        self.buckets.push(Bucket {
            request_id,
            first_seen: pos,
            logs: Vec::new(),
            completed: false,
            report: None,
        });
        self.bucket_index.insert(request_id, idx);
        idx
    }

    fn scan(&mut self, pos: usize, log: &'a ArcLogEvent) {
        let stream = log.stream_id.as_deref();

        match markers::classify(&log.message) {
            Marker::Start { request_id } => {
                self.flush(stream);
                let idx = self.bucket_for(request_id, pos);
                // a retry reuses the request id: the new run starts unfinished
                let bucket = &mut self.buckets[idx];
                bucket.logs.push(log.clone());
                bucket.completed = false;
                bucket.report = None;
                self.state(stream).active = Some(idx);
            }
            Marker::End { request_id } => {
                let idx = self.bucket_for(request_id, pos);
                let bucket = &mut self.buckets[idx];
                bucket.logs.push(log.clone());
                bucket.completed = true;
                self.state(stream).active = None;
            }
            Marker::Report(fields) => {
                let idx = self.bucket_for(fields.request_id, pos);
                let bucket = &mut self.buckets[idx];
                bucket.logs.push(log.clone());
                bucket.completed = true;
                bucket.report = Some(Report::from(&fields));
                self.state(stream).active = None;
            }
            Marker::Plain => {
                let active = self.state(stream).active;
                match active {
                    Some(idx) => self.buckets[idx].logs.push(log.clone()),
                    None => self.state(stream).pending.push((pos, log.clone())),
                }
            }
        }
    }

    /// Turn a stream's pending lines into a cold-start section when any of
    /// them is an init marker, otherwise into orphans.
    fn flush(&mut self, stream: Option<&'a str>) {
        let pending = std::mem::take(&mut self.state(stream).pending);
        let Some(&(first_seen, _)) = pending.first() else {
            return;
        };

        if !pending.iter().any(|(_, log)| markers::is_init_marker(&log.message)) {
            self.orphans.extend(pending);
            return;
        }

        let init_duration = pending
            .iter()
            .find_map(|(_, log)| markers::init_duration(&log.message));
        let id = format!("init:{}:{}", stream.unwrap_or("unknown"), self.init_seq);
        self.init_seq += 1;

        let logs = pending.into_iter().map(|(_, log)| log).collect();
        self.init_sections.push((
            first_seen,
            GroupSection::new(id, COLD_START_LABEL, logs, SectionKind::Init { init_duration }),
        ));
    }

    fn finish(mut self) -> Vec<Arc<GroupSection>> {
        for stream in std::mem::take(&mut self.stream_order) {
            self.flush(stream);
        }

        let invocations = self.buckets.len();
        let cold_starts = self.init_sections.len();

        let mut sections: Vec<(usize, GroupSection)> = self
            .buckets
            .into_iter()
            .map(|bucket| {
                let report = bucket.report.unwrap_or_default();
                let has_report = bucket.report.is_some();
                let detail = InvocationDetail {
                    request_id: bucket.request_id.to_string(),
                    duration: has_report.then_some(report.duration),
                    billed_duration: has_report.then_some(report.billed_duration),
                    memory_used: has_report.then_some(report.memory_used),
                    memory_allocated: has_report.then_some(report.memory_allocated),
                    init_duration: report.init_duration,
                    in_progress: !bucket.completed,
                };
                (
                    bucket.first_seen,
                    GroupSection::new(
                        format!("invocation:{}", bucket.request_id),
                        bucket.request_id,
                        bucket.logs,
                        SectionKind::Invocation(detail),
                    ),
                )
            })
            .collect();

        sections.extend(self.init_sections);

        let orphan_count = self.orphans.len();
        if !self.orphans.is_empty() {
            let mut orphans = self.orphans;
            orphans.sort_by_key(|(pos, _)| *pos);
            let first_seen = orphans[0].0;
            let logs = orphans.into_iter().map(|(_, log)| log).collect();
            sections.push((
                first_seen,
                GroupSection::new(UNGROUPED_ID, UNGROUPED_LABEL, logs, SectionKind::Ungrouped),
            ));
        }

        tracing::debug!(
            invocations,
            cold_starts,
            orphans = orphan_count,
            "grouped logs by invocation"
        );

        super::into_chronological(sections)
    }
}

/// Reconstruct invocation lifecycles from START / END / REPORT markers.
///
/// Produces one section per request id, one per cold-start window, and at
/// most one section of orphaned lines, sorted oldest-first.
pub fn group_logs_by_invocation(logs: &[ArcLogEvent]) -> Vec<Arc<GroupSection>> {
    let mut scanner = InvocationScanner::new();
    for (pos, log) in logs.iter().enumerate() {
        scanner.scan(pos, log);
    }
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudscope_types::LogEvent;
    use std::collections::HashSet;

    fn log(id: u64, timestamp: i64, stream: &str, message: &str) -> ArcLogEvent {
        let mut e = LogEvent::new(timestamp, message).with_stream(stream);
        e.id = id;
        Arc::new(e)
    }

    const REPORT_ABC: &str = "REPORT RequestId: abc Duration: 45.67 ms Billed Duration: 46 ms Memory Size: 128 MB Max Memory Used: 64 MB";

    #[test]
    fn test_complete_invocation() {
        let logs = vec![
            log(1, 1, "s", "START RequestId: abc"),
            log(2, 2, "s", "hello"),
            log(3, 3, "s", "END RequestId: abc"),
            log(4, 4, "s", REPORT_ABC),
        ];
        let sections = group_logs_by_invocation(&logs);
        assert_eq!(sections.len(), 1);

        let section = &sections[0];
        assert_eq!(section.id, "invocation:abc");
        assert_eq!(section.metadata.log_count, 4);

        let detail = section.invocation().unwrap();
        assert_eq!(detail.duration, Some(45.67));
        assert_eq!(detail.billed_duration, Some(46));
        assert_eq!(detail.memory_allocated, Some(128));
        assert_eq!(detail.memory_used, Some(64));
        assert!(!detail.in_progress);
    }

    #[test]
    fn test_start_without_end_is_in_progress() {
        let logs = vec![
            log(1, 1, "s", "START RequestId: abc"),
            log(2, 2, "s", "working"),
        ];
        let sections = group_logs_by_invocation(&logs);
        assert_eq!(sections.len(), 1);

        let detail = sections[0].invocation().unwrap();
        assert!(detail.in_progress);
        assert_eq!(detail.duration, None);
        assert_eq!(sections[0].metadata.log_count, 2);
    }

    #[test]
    fn test_init_lines_before_start_become_cold_start() {
        let logs = vec![
            log(1, 1, "s", "INIT_START Runtime Version: nodejs:20"),
            log(2, 2, "s", "loading handler"),
            log(3, 3, "s", "INIT_REPORT Init Duration: 312.04 ms"),
            log(4, 4, "s", "START RequestId: abc"),
            log(5, 5, "s", "END RequestId: abc"),
        ];
        let sections = group_logs_by_invocation(&logs);
        assert_eq!(sections.len(), 2);

        assert!(sections[0].is_cold_start());
        assert_eq!(sections[0].label, COLD_START_LABEL);
        assert_eq!(sections[0].metadata.log_count, 3);
        assert_eq!(
            sections[0].metadata.kind,
            SectionKind::Init {
                init_duration: Some(312.04)
            }
        );
        assert_eq!(sections[1].id, "invocation:abc");
    }

    #[test]
    fn test_plain_lines_outside_invocations_are_ungrouped() {
        let logs = vec![
            log(1, 1, "s", "stray before"),
            log(2, 2, "s", "START RequestId: abc"),
            log(3, 3, "s", "END RequestId: abc"),
            log(4, 4, "s", "stray after"),
        ];
        let sections = group_logs_by_invocation(&logs);

        let ungrouped: Vec<_> = sections.iter().filter(|s| s.id == UNGROUPED_ID).collect();
        assert_eq!(ungrouped.len(), 1);
        let ids: Vec<u64> = ungrouped[0].logs.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(ungrouped[0].label, UNGROUPED_LABEL);
    }

    #[test]
    fn test_two_cold_starts_on_one_stream() {
        let logs = vec![
            log(1, 1, "s", "INIT_REPORT Init Duration: 210.50 ms"),
            log(2, 2, "s", "START RequestId: a"),
            log(3, 3, "s", "END RequestId: a"),
            log(4, 4, "s", "INIT_REPORT Init Duration: 98.25 ms"),
            log(5, 5, "s", "START RequestId: b"),
            log(6, 6, "s", "END RequestId: b"),
        ];
        let sections = group_logs_by_invocation(&logs);

        let inits: Vec<_> = sections.iter().filter(|s| s.is_cold_start()).collect();
        assert_eq!(inits.len(), 2);
        assert_ne!(inits[0].id, inits[1].id);
        assert_eq!(
            inits[0].metadata.kind,
            SectionKind::Init {
                init_duration: Some(210.50)
            }
        );
        assert_eq!(
            inits[1].metadata.kind,
            SectionKind::Init {
                init_duration: Some(98.25)
            }
        );
        assert_eq!(sections.len(), 4);
    }

    #[test]
    fn test_restarted_request_id_is_in_progress_again() {
        let logs = vec![
            log(1, 1, "s", "START RequestId: r"),
            log(2, 2, "s", "END RequestId: r"),
            log(3, 3, "s", "START RequestId: r"),
            log(4, 4, "s", "still running"),
        ];
        let sections = group_logs_by_invocation(&logs);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].metadata.log_count, 4);
        let detail = sections[0].invocation().unwrap();
        assert!(detail.in_progress);
        assert_eq!(detail.duration, None);
    }

    #[test]
    fn test_restart_drops_previous_report() {
        let logs = vec![
            log(1, 1, "s", "START RequestId: abc"),
            log(2, 2, "s", REPORT_ABC),
            log(3, 3, "s", "START RequestId: abc"),
        ];
        let sections = group_logs_by_invocation(&logs);
        let detail = sections[0].invocation().unwrap();
        assert!(detail.in_progress);
        assert_eq!(detail.billed_duration, None);
    }

    #[test]
    fn test_trailing_init_lines_flushed_at_end() {
        let logs = vec![
            log(1, 1, "a", "START RequestId: r"),
            log(2, 2, "a", "END RequestId: r"),
            log(3, 3, "b", "EXTENSION Name: agent State: Ready"),
        ];
        let sections = group_logs_by_invocation(&logs);
        assert_eq!(sections.len(), 2);
        assert!(sections[1].is_cold_start());
    }

    #[test]
    fn test_streams_scan_independently() {
        // stream b's plain line lands while a is active on stream a
        let logs = vec![
            log(1, 1, "a", "START RequestId: r1"),
            log(2, 2, "b", "from b"),
            log(3, 3, "a", "from a"),
            log(4, 4, "a", "END RequestId: r1"),
        ];
        let sections = group_logs_by_invocation(&logs);

        let r1 = sections.iter().find(|s| s.id == "invocation:r1").unwrap();
        let ids: Vec<u64> = r1.logs.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);

        let ungrouped = sections.iter().find(|s| s.id == UNGROUPED_ID).unwrap();
        assert_eq!(ungrouped.logs[0].id, 2);
    }

    #[test]
    fn test_end_without_start_opens_completed_bucket() {
        let logs = vec![
            log(1, 1, "s", "tail of earlier invocation"),
            log(2, 2, "s", REPORT_ABC),
        ];
        let sections = group_logs_by_invocation(&logs);

        let abc = sections.iter().find(|s| s.id == "invocation:abc").unwrap();
        let detail = abc.invocation().unwrap();
        assert!(!detail.in_progress);
        assert_eq!(detail.billed_duration, Some(46));
        assert_eq!(abc.metadata.log_count, 1);
    }

    #[test]
    fn test_malformed_report_is_plain_member() {
        let logs = vec![
            log(1, 1, "s", "START RequestId: abc"),
            log(2, 2, "s", "REPORT RequestId: abc Duration: soon"),
        ];
        let sections = group_logs_by_invocation(&logs);
        assert_eq!(sections.len(), 1);
        let detail = sections[0].invocation().unwrap();
        assert!(detail.in_progress);
        assert_eq!(sections[0].metadata.log_count, 2);
    }

    #[test]
    fn test_every_event_in_at_most_one_section_and_sorted() {
        let logs = vec![
            log(1, 5, "a", "INIT_START x"),
            log(2, 1, "b", "orphan"),
            log(3, 6, "a", "START RequestId: r1"),
            log(4, 7, "a", "inside"),
            log(5, 8, "a", "END RequestId: r1"),
            log(6, 3, "b", "START RequestId: r2"),
        ];
        let sections = group_logs_by_invocation(&logs);

        let mut seen = HashSet::new();
        for section in &sections {
            for member in &section.logs {
                assert!(seen.insert(member.id));
            }
        }
        assert_eq!(seen.len(), logs.len());

        let firsts: Vec<i64> = sections.iter().map(|s| s.metadata.first_timestamp).collect();
        let mut sorted = firsts.clone();
        sorted.sort();
        assert_eq!(firsts, sorted);
    }

    #[test]
    fn test_report_init_duration_is_kept() {
        let logs = vec![
            log(1, 1, "s", "START RequestId: r"),
            log(
                2,
                2,
                "s",
                "REPORT RequestId: r\tDuration: 2.50 ms\tBilled Duration: 3 ms\tMemory Size: 256 MB\tMax Memory Used: 80 MB\tInit Duration: 180.25 ms",
            ),
        ];
        let sections = group_logs_by_invocation(&logs);
        let detail = sections[0].invocation().unwrap();
        assert_eq!(detail.init_duration, Some(180.25));
    }
}
