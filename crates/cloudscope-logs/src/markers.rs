//! Recognition of runtime lifecycle lines (START / END / REPORT / INIT_*)

use std::sync::LazyLock;

use regex::Regex;

static START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^START RequestId:\s*(\S+)").expect("valid START pattern"));

static END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^END RequestId:\s*(\S+)").expect("valid END pattern"));

static REPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^REPORT RequestId:\s*(\S+)",
        r"\s+Duration:\s*([0-9]+(?:\.[0-9]+)?)\s*ms",
        r"[,\s]+Billed Duration:\s*([0-9]+)\s*ms",
        r"[,\s]+Memory Size:\s*([0-9]+)\s*MB",
        r"[,\s]+Max Memory Used:\s*([0-9]+)\s*MB",
        r"(?:[,\s]+Init Duration:\s*([0-9]+(?:\.[0-9]+)?)\s*ms)?",
    ))
    .expect("valid REPORT pattern")
});

static INIT_REPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"INIT_REPORT\b.*?Init Duration:\s*([0-9]+(?:\.[0-9]+)?)\s*ms")
        .expect("valid INIT_REPORT pattern")
});

/// Prefixes of lines emitted while an execution environment initializes
const INIT_PREFIXES: [&str; 5] = [
    "INIT_START",
    "INIT_REPORT",
    "INIT_RUNTIME_DONE",
    "EXTENSION",
    "TELEMETRY",
];

/// Figures parsed from a REPORT line
#[derive(Clone, Debug, PartialEq)]
pub struct ReportFields<'a> {
    pub request_id: &'a str,
    pub duration: f64,
    pub billed_duration: u64,
    pub memory_allocated: u64,
    pub memory_used: u64,
    pub init_duration: Option<f64>,
}

/// Classification of one message, in priority order START > END > REPORT
#[derive(Clone, Debug, PartialEq)]
pub enum Marker<'a> {
    Start { request_id: &'a str },
    End { request_id: &'a str },
    Report(ReportFields<'a>),
    Plain,
}

/// Classify a message. A REPORT line whose figures don't parse is `Plain`.
pub fn classify(message: &str) -> Marker<'_> {
    let line = message.trim_start();

    if let Some(caps) = START_RE.captures(line) {
        if let Some(id) = caps.get(1) {
            return Marker::Start {
                request_id: id.as_str(),
            };
        }
    }

    if let Some(caps) = END_RE.captures(line) {
        if let Some(id) = caps.get(1) {
            return Marker::End {
                request_id: id.as_str(),
            };
        }
    }

    if let Some(caps) = REPORT_RE.captures(line) {
        let parsed = (|| {
            Some(ReportFields {
                request_id: caps.get(1)?.as_str(),
                duration: caps.get(2)?.as_str().parse().ok()?,
                billed_duration: caps.get(3)?.as_str().parse().ok()?,
                memory_allocated: caps.get(4)?.as_str().parse().ok()?,
                memory_used: caps.get(5)?.as_str().parse().ok()?,
                init_duration: caps.get(6).and_then(|m| m.as_str().parse().ok()),
            })
        })();
        if let Some(fields) = parsed {
            return Marker::Report(fields);
        }
    }

    Marker::Plain
}

/// Whether a line belongs to an initialization (cold start) window.
/// Any line carrying an INIT_REPORT duration counts, wherever the marker sits.
pub fn is_init_marker(message: &str) -> bool {
    let line = message.trim_start();
    INIT_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) || INIT_REPORT_RE.is_match(line)
}

/// Init duration from an INIT_REPORT line
pub fn init_duration(message: &str) -> Option<f64> {
    INIT_REPORT_RE
        .captures(message)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Whether a line is emitted by the runtime rather than the function
pub fn is_lifecycle_line(message: &str) -> bool {
    !matches!(classify(message), Marker::Plain) || is_init_marker(message)
}
