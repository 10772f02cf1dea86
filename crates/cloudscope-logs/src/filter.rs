use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::FilterError;
use cloudscope_types::{ArcLogEvent, LogEvent, LogLevel};

/// Prefix of field filters (`metadata.requestId:abc`)
const FIELD_PREFIX: &str = "metadata.";

#[derive(Clone)]
enum Matcher {
    /// Empty pattern, matches everything
    All,
    Regex(Regex),
    /// Plain substring, stored lowercased
    Literal(String),
    /// Payload field by dotted path equals a value
    Field { path: String, value: String },
}

/// Compiled filter for log events: a text matcher plus a set of hidden levels
#[derive(Clone)]
pub struct CompiledFilter {
    matcher: Matcher,

    /// Original pattern string
    pattern: String,

    /// Levels hidden from view
    disabled_levels: HashSet<LogLevel>,

    /// Case sensitivity
    case_insensitive: bool,
}

impl CompiledFilter {
    /// Create a case-sensitive filter from a pattern string
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        Self::compile(pattern, false)
    }

    /// Create a case-insensitive filter
    pub fn new_case_insensitive(pattern: &str) -> Result<Self, FilterError> {
        Self::compile(pattern, true)
    }

    /// Filter on exact text, no regex interpretation (find-by-selection)
    pub fn literal(text: &str) -> Self {
        let matcher = if text.is_empty() {
            Matcher::All
        } else {
            Matcher::Literal(text.to_lowercase())
        };

        Self {
            matcher,
            pattern: text.to_string(),
            disabled_levels: HashSet::new(),
            case_insensitive: true,
        }
    }

    /// Filter that only hides levels
    pub fn levels_only(disabled_levels: HashSet<LogLevel>) -> Self {
        Self::literal("").with_disabled_levels(disabled_levels)
    }

    fn compile(pattern: &str, case_insensitive: bool) -> Result<Self, FilterError> {
        let trimmed = pattern.trim();
        let matcher = if trimmed.is_empty() {
            Matcher::All
        } else if let Some(rest) = trimmed.strip_prefix(FIELD_PREFIX) {
            let (path, value) = rest
                .split_once(':')
                .filter(|(path, _)| !path.is_empty())
                .ok_or_else(|| FilterError::MissingFieldValue(trimmed.to_string()))?;
            Matcher::Field {
                path: path.trim().to_string(),
                value: value.trim().to_string(),
            }
        } else {
            Matcher::Regex(
                RegexBuilder::new(pattern)
                    .case_insensitive(case_insensitive)
                    .build()?,
            )
        };

        Ok(Self {
            matcher,
            pattern: pattern.to_string(),
            disabled_levels: HashSet::new(),
            case_insensitive,
        })
    }

    /// Set log levels to hide
    pub fn with_disabled_levels(mut self, levels: HashSet<LogLevel>) -> Self {
        self.disabled_levels = levels;
        self
    }

    /// Whether the event's level is not hidden
    pub fn passes_level(&self, event: &LogEvent) -> bool {
        !self.disabled_levels.contains(&event.level)
    }

    /// Whether the event matches the text part of the filter
    pub fn matches_text(&self, event: &LogEvent) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Regex(re) => re.is_match(&event.message),
            Matcher::Literal(needle) => event.message.to_lowercase().contains(needle.as_str()),
            Matcher::Field { path, value } => match field_lookup(event, path) {
                Some(found) => {
                    let found = value_text(found);
                    if self.case_insensitive {
                        found.eq_ignore_ascii_case(value)
                    } else {
                        found == *value
                    }
                }
                None => false,
            },
        }
    }

    /// Check if a log event passes both the level and the text filter
    pub fn matches(&self, event: &LogEvent) -> bool {
        self.passes_level(event) && self.matches_text(event)
    }

    /// Filtered subsequence. Returns the same `Arc`s, never copies, so
    /// identity-based membership downstream keeps working.
    pub fn apply(&self, logs: &[ArcLogEvent]) -> Arc<Vec<ArcLogEvent>> {
        Arc::new(logs.iter().filter(|e| self.matches(e)).cloned().collect())
    }

    /// Find all match positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.matcher {
            Matcher::Regex(re) => re
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| (m.start(), m.end()))
                .collect(),
            Matcher::Literal(needle) => {
                let lowered = text.to_lowercase();
                // lowercasing can change byte lengths; highlight only when it didn't
                if lowered.len() != text.len() {
                    return Vec::new();
                }
                lowered
                    .match_indices(needle.as_str())
                    .map(|(start, m)| (start, start + m.len()))
                    .collect()
            }
            Matcher::All | Matcher::Field { .. } => Vec::new(),
        }
    }

    /// Get the original pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn disabled_levels(&self) -> &HashSet<LogLevel> {
        &self.disabled_levels
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        matches!(self.matcher, Matcher::All) && self.disabled_levels.is_empty()
    }

    /// Check if filter has a text pattern
    pub fn has_pattern(&self) -> bool {
        !matches!(self.matcher, Matcher::All)
    }

    /// Check if filter is a `metadata.<field>:<value>` filter
    pub fn is_field_filter(&self) -> bool {
        matches!(self.matcher, Matcher::Field { .. })
    }

    /// Check if filter matches plain text rather than a regex
    pub fn is_literal(&self) -> bool {
        matches!(self.matcher, Matcher::Literal(_))
    }

    /// Check if filter is case insensitive
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl Default for CompiledFilter {
    fn default() -> Self {
        Self::literal("")
    }
}

impl std::fmt::Debug for CompiledFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFilter")
            .field("pattern", &self.pattern)
            .field("disabled_levels", &self.disabled_levels)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}

/// Payload lookup; quick-filter keys also probe their aliases
fn field_lookup<'a>(event: &'a LogEvent, path: &str) -> Option<&'a Value> {
    match QuickFilterField::from_key(path) {
        Some(field) => field.candidates().iter().find_map(|p| event.payload_field(p)),
        None => event.payload_field(path),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Payload fields offered as one-click filters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuickFilterField {
    RequestId,
    TraceId,
    ClientIp,
}

impl QuickFilterField {
    pub const ALL: [QuickFilterField; 3] = [Self::RequestId, Self::TraceId, Self::ClientIp];

    /// Field name used in the installed filter text
    pub fn key(&self) -> &'static str {
        match self {
            Self::RequestId => "requestId",
            Self::TraceId => "traceId",
            Self::ClientIp => "clientIp",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::RequestId => "Filter by request id",
            Self::TraceId => "Filter by trace id",
            Self::ClientIp => "Filter by client IP",
        }
    }

    /// Payload paths probed for a value, in order
    fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::RequestId => &["requestId", "request_id", "awsRequestId", "aws_request_id"],
            Self::TraceId => &["traceId", "trace_id", "xray_trace_id", "_X_AMZN_TRACE_ID"],
            Self::ClientIp => &["clientIp", "client_ip", "sourceIp", "ip", "http.clientIp"],
        }
    }

    /// Value of this field on an event, if present
    pub fn value_for(&self, event: &LogEvent) -> Option<String> {
        self.candidates()
            .iter()
            .find_map(|path| event.payload_field(path))
            .map(value_text)
            .filter(|v| !v.is_empty())
    }

    /// Filter text selecting events whose field equals `value`
    pub fn filter_text(&self, value: &str) -> String {
        format!("{FIELD_PREFIX}{}:{value}", self.key())
    }
}

/// Quick level presets, expressed as the set of levels to hide
pub struct FilterPresets;

impl FilterPresets {
    /// Hide everything but errors
    pub fn errors_only() -> HashSet<LogLevel> {
        LogLevel::ALL
            .into_iter()
            .filter(|l| !l.is_error())
            .collect()
    }

    /// Hide debug, trace and runtime lifecycle lines
    pub fn quiet() -> HashSet<LogLevel> {
        [LogLevel::Trace, LogLevel::Debug, LogLevel::System]
            .into_iter()
            .collect()
    }
}
