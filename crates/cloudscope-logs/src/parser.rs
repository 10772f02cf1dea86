use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::markers;
use cloudscope_types::{LogEvent, LogLevel};

/// A log event as exported by the transport (CloudWatch `FilteredLogEvent`)
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogEvent {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "streamId", alias = "stream")]
    pub log_stream_name: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

/// Log parser for extracting structure from raw log events
pub struct LogParser;

impl LogParser {
    /// Parse a raw event into a LogEvent (id is assigned by the store)
    pub fn parse(raw: RawLogEvent) -> LogEvent {
        let mut event = LogEvent::new(raw.timestamp, raw.message);
        event.stream_id = raw.log_stream_name.filter(|s| !s.is_empty());
        event.event_id = raw.event_id;
        event.formatted_time = Self::format_time(raw.timestamp);

        if markers::is_lifecycle_line(&event.message) {
            event.level = LogLevel::System;
        } else if let Some((payload, level)) = Self::try_parse_json(&event.message) {
            event.payload = Some(payload);
            event.level = level;
        } else {
            event.level = Self::extract_level_from_text(&event.message);
        }

        event
    }

    /// Format epoch milliseconds for display (UTC, millisecond precision)
    pub fn format_time(timestamp: i64) -> String {
        DateTime::from_timestamp_millis(timestamp)
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_default()
    }

    /// Try to parse content as a JSON object and extract its level
    fn try_parse_json(content: &str) -> Option<(serde_json::Map<String, Value>, LogLevel)> {
        let trimmed = content.trim();
        if !trimmed.starts_with('{') {
            return None;
        }

        let value: Value = serde_json::from_str(trimmed).ok()?;
        let Value::Object(fields) = value else {
            return None;
        };

        let level = Self::extract_level_from_json(&fields);
        Some((fields, level))
    }

    /// Extract log level from JSON fields
    fn extract_level_from_json(fields: &serde_json::Map<String, Value>) -> LogLevel {
        let level_fields = [
            "level",
            "lvl",
            "severity",
            "log.level",
            "loglevel",
            "log_level",
            "Level",
            "LEVEL",
        ];

        for field in level_fields {
            if let Some(value) = fields.get(field) {
                match value {
                    Value::String(s) => return LogLevel::from_str(s),
                    Value::Number(n) => {
                        // pino/bunyan numeric levels
                        if let Some(num) = n.as_u64() {
                            return match num {
                                0..=10 => LogLevel::Trace,
                                11..=20 => LogLevel::Debug,
                                21..=30 => LogLevel::Info,
                                31..=40 => LogLevel::Warn,
                                41..=50 => LogLevel::Error,
                                _ => LogLevel::Fatal,
                            };
                        }
                    }
                    _ => {}
                }
            }
        }

        LogLevel::Unknown
    }

    /// Extract log level from plain text patterns
    fn extract_level_from_text(content: &str) -> LogLevel {
        // Lambda runtime text format: "<iso time>\t<request id>\t<LEVEL>\t<message>"
        let columns: Vec<&str> = content.splitn(4, '\t').collect();
        if columns.len() == 4 {
            let level = LogLevel::from_str(columns[2]);
            if level != LogLevel::Unknown {
                return level;
            }
        }

        let upper = content.to_uppercase();

        let bracket_patterns = [
            ("[FATAL]", LogLevel::Fatal),
            ("[PANIC]", LogLevel::Fatal),
            ("[CRITICAL]", LogLevel::Fatal),
            ("[ERROR]", LogLevel::Error),
            ("[ERR]", LogLevel::Error),
            ("[WARN]", LogLevel::Warn),
            ("[WARNING]", LogLevel::Warn),
            ("[INFO]", LogLevel::Info),
            ("[DEBUG]", LogLevel::Debug),
            ("[TRACE]", LogLevel::Trace),
        ];

        for (pattern, level) in bracket_patterns {
            if upper.contains(pattern) {
                return level;
            }
        }

        let colon_patterns = [
            ("FATAL:", LogLevel::Fatal),
            ("PANIC:", LogLevel::Fatal),
            ("ERROR:", LogLevel::Error),
            ("WARNING:", LogLevel::Warn),
            ("WARN:", LogLevel::Warn),
            ("INFO:", LogLevel::Info),
            ("DEBUG:", LogLevel::Debug),
            ("TRACE:", LogLevel::Trace),
        ];

        for (pattern, level) in colon_patterns {
            if upper.contains(pattern) {
                return level;
            }
        }

        let spaced_patterns = [
            (" FATAL ", LogLevel::Fatal),
            (" ERROR ", LogLevel::Error),
            (" WARN ", LogLevel::Warn),
            (" WARNING ", LogLevel::Warn),
            (" INFO ", LogLevel::Info),
            (" DEBUG ", LogLevel::Debug),
            (" TRACE ", LogLevel::Trace),
        ];

        for (pattern, level) in spaced_patterns {
            if upper.contains(pattern) {
                return level;
            }
        }

        let trimmed_upper = upper.trim_start();
        for (pattern, level) in [
            ("FATAL", LogLevel::Fatal),
            ("ERROR", LogLevel::Error),
            ("WARN", LogLevel::Warn),
            ("INFO", LogLevel::Info),
            ("DEBUG", LogLevel::Debug),
            ("TRACE", LogLevel::Trace),
        ] {
            if trimmed_upper.starts_with(pattern) {
                return level;
            }
        }

        LogLevel::Unknown
    }
}
