//! Shared types for cloudscope
//!
//! This crate contains the data structures passed between the ingestion
//! store, the groupers, the display projector and the terminal front-end.

use ratatui::style::Color;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
    /// Runtime lifecycle lines (START, END, REPORT, INIT_*)
    System,
    Unknown,
}

impl LogLevel {
    /// Every level, in toggle order
    pub const ALL: [LogLevel; 8] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
        Self::System,
        Self::Unknown,
    ];

    /// Parse log level from common formats
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "trace" | "trc" | "trce" => Self::Trace,
            "debug" | "dbg" | "debg" => Self::Debug,
            "info" | "inf" | "information" => Self::Info,
            "warn" | "warning" | "wrn" => Self::Warn,
            "error" | "err" | "erro" => Self::Error,
            "fatal" | "panic" | "critical" | "crit" | "ftl" => Self::Fatal,
            "system" | "sys" => Self::System,
            _ => Self::Unknown,
        }
    }

    /// Whether a member at this level marks its group as failed
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::Fatal)
    }

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Trace => Color::DarkGray,
            Self::Debug => Color::Cyan,
            Self::Info => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
            Self::Fatal => Color::Magenta,
            Self::System => Color::Blue,
            Self::Unknown => Color::White,
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRC",
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warn => "WRN",
            Self::Error => "ERR",
            Self::Fatal => "FTL",
            Self::System => "SYS",
            Self::Unknown => "???",
        }
    }
}

/// A single log event.
///
/// Events are created once by the ingestion store and never mutated
/// afterwards. Everything downstream holds them through [`ArcLogEvent`], and
/// `id` is the identity used for membership tests: two events with equal
/// fields are still different events.
#[derive(Clone, Debug)]
pub struct LogEvent {
    /// Sequence number assigned at ingestion, unique per store
    pub id: u64,

    /// Milliseconds since the Unix epoch (may repeat)
    pub timestamp: i64,

    /// Raw message text
    pub message: String,

    /// Producing execution stream (log stream name), if known
    pub stream_id: Option<String>,

    /// Transport-assigned event id, if any
    pub event_id: Option<String>,

    /// Detected log level
    pub level: LogLevel,

    /// Parsed structured fields (if the message is a JSON object)
    pub payload: Option<serde_json::Map<String, Value>>,

    /// Precomputed display time
    pub formatted_time: String,
}

/// Shared handle to an immutable log event
pub type ArcLogEvent = Arc<LogEvent>;

impl LogEvent {
    /// Create a new event with minimal fields
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            timestamp,
            message: message.into(),
            stream_id: None,
            event_id: None,
            level: LogLevel::Unknown,
            payload: None,
            formatted_time: String::new(),
        }
    }

    pub fn with_stream(mut self, stream_id: impl Into<String>) -> Self {
        self.stream_id = Some(stream_id.into());
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Short stream name for the gutter.
    ///
    /// Lambda stream names look like `2024/01/15/[$LATEST]0f1e2d3c...`; the
    /// part after the version bracket identifies the execution environment.
    pub fn short_stream_name(&self) -> &str {
        match &self.stream_id {
            Some(stream) => match stream.rfind(']') {
                Some(pos) if pos + 1 < stream.len() => &stream[pos + 1..],
                _ => stream,
            },
            None => "-",
        }
    }

    /// Look up a payload field by dotted path (`http.clientIp`)
    pub fn payload_field(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.payload.as_ref()?.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

// ============================================================================
// Grouping Types
// ============================================================================

/// How the log viewer groups its rows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// Flat list
    #[default]
    None,
    /// One section per log stream
    Stream,
    /// One section per invocation, plus cold starts and orphans
    Invocation,
}

impl GroupingMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Stream => "stream",
            Self::Invocation => "invocation",
        }
    }

    /// Cycle to the next grouping mode
    pub fn next(&self) -> Self {
        match self {
            Self::None => Self::Stream,
            Self::Stream => Self::Invocation,
            Self::Invocation => Self::None,
        }
    }

    pub fn is_grouped(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl FromStr for GroupingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" | "flat" => Ok(Self::None),
            "stream" | "streams" => Ok(Self::Stream),
            "invocation" | "invocations" | "request" => Ok(Self::Invocation),
            other => Err(format!(
                "unknown grouping mode '{other}' (expected none, stream or invocation)"
            )),
        }
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Figures reconstructed for one invocation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvocationDetail {
    pub request_id: String,
    /// Milliseconds, from the REPORT line
    pub duration: Option<f64>,
    pub billed_duration: Option<u64>,
    /// Max memory used, MB
    pub memory_used: Option<u64>,
    /// Configured memory size, MB
    pub memory_allocated: Option<u64>,
    /// Present on REPORT lines of cold-started invocations
    pub init_duration: Option<f64>,
    /// No END or REPORT line was seen
    pub in_progress: bool,
}

/// Variant-specific part of a section
#[derive(Clone, Debug, PartialEq)]
pub enum SectionKind {
    Stream,
    Invocation(InvocationDetail),
    Init { init_duration: Option<f64> },
    Ungrouped,
}

/// Derived facts about a section
#[derive(Clone, Debug, PartialEq)]
pub struct GroupMetadata {
    pub log_count: usize,
    pub has_error: bool,
    /// Minimum over members, not the first member's timestamp
    pub first_timestamp: i64,
    /// Maximum over members
    pub last_timestamp: i64,
    pub kind: SectionKind,
}

/// A run of log events sharing an identity (stream, invocation, cold start)
#[derive(Clone, Debug)]
pub struct GroupSection {
    pub id: String,
    pub label: String,
    pub logs: Vec<ArcLogEvent>,
    pub metadata: GroupMetadata,
}

impl GroupSection {
    /// Build a section, deriving its metadata from the members
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        logs: Vec<ArcLogEvent>,
        kind: SectionKind,
    ) -> Self {
        let first_timestamp = logs.iter().map(|l| l.timestamp).min().unwrap_or(0);
        let last_timestamp = logs.iter().map(|l| l.timestamp).max().unwrap_or(0);
        let metadata = GroupMetadata {
            log_count: logs.len(),
            has_error: logs.iter().any(|l| l.level.is_error()),
            first_timestamp,
            last_timestamp,
            kind,
        };

        Self {
            id: id.into(),
            label: label.into(),
            logs,
            metadata,
        }
    }

    pub fn invocation(&self) -> Option<&InvocationDetail> {
        match &self.metadata.kind {
            SectionKind::Invocation(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn is_cold_start(&self) -> bool {
        matches!(self.metadata.kind, SectionKind::Init { .. })
    }

    /// Elapsed time between the earliest and latest member
    pub fn span_ms(&self) -> i64 {
        self.metadata.last_timestamp - self.metadata.first_timestamp
    }

    /// One-line header text
    pub fn summary(&self) -> String {
        let mut parts = vec![
            self.label.clone(),
            format!("{} logs", self.metadata.log_count),
        ];

        match &self.metadata.kind {
            SectionKind::Invocation(detail) => {
                if detail.in_progress {
                    parts.push("in progress".to_string());
                }
                if let Some(duration) = detail.duration {
                    parts.push(format!("{duration:.2} ms"));
                }
                if let Some(billed) = detail.billed_duration {
                    parts.push(format!("billed {billed} ms"));
                }
                if let (Some(used), Some(allocated)) = (detail.memory_used, detail.memory_allocated)
                {
                    parts.push(format!("{used}/{allocated} MB"));
                }
                if let Some(init) = detail.init_duration {
                    parts.push(format!("init {init:.2} ms"));
                }
            }
            SectionKind::Init {
                init_duration: Some(init),
            } => parts.push(format!("init {init:.2} ms")),
            _ => {}
        }

        if self.metadata.has_error {
            parts.push("errors".to_string());
        }

        parts.join(" · ")
    }
}

// ============================================================================
// Display Types
// ============================================================================

/// One row of the log viewer, position-for-position
#[derive(Clone, Debug)]
pub enum DisplayItem {
    /// Section header
    Header { group: Arc<GroupSection> },

    /// Log line. `log_index` is the position in the filtered sequence, or a
    /// negative synthetic id for a line shown only because its group matched.
    Log { log: ArcLogEvent, log_index: i64 },
}

impl DisplayItem {
    pub fn is_header(&self) -> bool {
        matches!(self, Self::Header { .. })
    }

    pub fn log_index(&self) -> Option<i64> {
        match self {
            Self::Log { log_index, .. } => Some(*log_index),
            Self::Header { .. } => None,
        }
    }

    pub fn log(&self) -> Option<&ArcLogEvent> {
        match self {
            Self::Log { log, .. } => Some(log),
            Self::Header { .. } => None,
        }
    }

    pub fn group(&self) -> Option<&Arc<GroupSection>> {
        match self {
            Self::Header { group } => Some(group),
            Self::Log { .. } => None,
        }
    }

    /// Whether this row stands in for a filtered-out group member
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Log { log_index, .. } if *log_index < 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: u64, timestamp: i64, level: LogLevel) -> ArcLogEvent {
        let mut e = LogEvent::new(timestamp, format!("line {id}")).with_level(level);
        e.id = id;
        Arc::new(e)
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!(LogLevel::from_str("WARNING"), LogLevel::Warn);
        assert_eq!(LogLevel::from_str(" err "), LogLevel::Error);
        assert_eq!(LogLevel::from_str("bogus"), LogLevel::Unknown);
        assert!(LogLevel::Fatal.is_error());
        assert!(!LogLevel::System.is_error());
    }

    #[test]
    fn test_section_metadata_uses_min_and_max() {
        let logs = vec![
            event(1, 300, LogLevel::Info),
            event(2, 100, LogLevel::Error),
            event(3, 200, LogLevel::Info),
        ];
        let section = GroupSection::new("s", "stream", logs, SectionKind::Stream);

        assert_eq!(section.metadata.log_count, 3);
        assert_eq!(section.metadata.first_timestamp, 100);
        assert_eq!(section.metadata.last_timestamp, 300);
        assert!(section.metadata.has_error);
        assert_eq!(section.span_ms(), 200);
    }

    #[test]
    fn test_invocation_summary() {
        let detail = InvocationDetail {
            request_id: "abc".to_string(),
            duration: Some(45.67),
            billed_duration: Some(46),
            memory_used: Some(64),
            memory_allocated: Some(128),
            init_duration: None,
            in_progress: false,
        };
        let section = GroupSection::new(
            "invocation-abc",
            "abc",
            vec![event(1, 1, LogLevel::System)],
            SectionKind::Invocation(detail),
        );

        assert_eq!(
            section.summary(),
            "abc · 1 logs · 45.67 ms · billed 46 ms · 64/128 MB"
        );
        assert_eq!(section.invocation().map(|d| d.billed_duration), Some(Some(46)));
    }

    #[test]
    fn test_grouping_mode_parse_and_cycle() {
        assert_eq!("Invocation".parse::<GroupingMode>(), Ok(GroupingMode::Invocation));
        assert!("sideways".parse::<GroupingMode>().is_err());
        assert_eq!(GroupingMode::Invocation.next(), GroupingMode::None);
        assert!(!GroupingMode::None.is_grouped());
    }

    #[test]
    fn test_short_stream_name() {
        let e = LogEvent::new(0, "x").with_stream("2024/01/15/[$LATEST]0f1e2d");
        assert_eq!(e.short_stream_name(), "0f1e2d");

        let plain = LogEvent::new(0, "x").with_stream("worker-1");
        assert_eq!(plain.short_stream_name(), "worker-1");
        assert_eq!(LogEvent::new(0, "x").short_stream_name(), "-");
    }

    #[test]
    fn test_payload_field_dotted_path() {
        let mut e = LogEvent::new(0, "x");
        let value: Value = serde_json::json!({"http": {"clientIp": "10.0.0.1"}, "requestId": "r1"});
        e.payload = value.as_object().cloned();

        assert_eq!(
            e.payload_field("http.clientIp").and_then(Value::as_str),
            Some("10.0.0.1")
        );
        assert_eq!(e.payload_field("requestId").and_then(Value::as_str), Some("r1"));
        assert!(e.payload_field("http.missing").is_none());
    }

    #[test]
    fn test_display_item_accessors() {
        let log = event(7, 10, LogLevel::Info);
        let real = DisplayItem::Log {
            log: log.clone(),
            log_index: 3,
        };
        let synthetic = DisplayItem::Log { log, log_index: -1 };

        assert_eq!(real.log_index(), Some(3));
        assert!(!real.is_synthetic());
        assert!(synthetic.is_synthetic());
        assert!(!synthetic.is_header());
    }
}
