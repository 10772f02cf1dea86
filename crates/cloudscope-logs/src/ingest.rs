//! Reading exported log events from disk or stdin.
//!
//! Accepted shapes:
//! - a JSON array of events
//! - an object with an `events` array (`aws logs filter-log-events` output)
//! - JSON Lines, one event per line; lines that aren't JSON objects become
//!   plain messages stamped with the previous timestamp

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::IngestError;
use crate::parser::RawLogEvent;

#[derive(Deserialize)]
struct EventsEnvelope {
    events: Vec<RawLogEvent>,
}

/// Read all events from a file
pub fn load_file(path: &Path) -> Result<Vec<RawLogEvent>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let events = load_events(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), count = events.len(), "loaded log events");
    Ok(events)
}

/// Read all events from any reader
pub fn load_events<R: Read>(reader: R) -> Result<Vec<RawLogEvent>, IngestError> {
    let mut reader = BufReader::new(reader);
    let mut content = String::new();
    reader.read_to_string(&mut content)?;

    match content.trim_start().chars().next() {
        None => Ok(Vec::new()),
        Some('[') => Ok(serde_json::from_str(content.trim())?),
        Some('{') => match serde_json::from_str::<EventsEnvelope>(content.trim()) {
            Ok(envelope) => Ok(envelope.events),
            Err(_) => parse_lines(content.as_bytes()),
        },
        Some(_) => parse_lines(content.as_bytes()),
    }
}

fn parse_lines<R: BufRead>(reader: R) -> Result<Vec<RawLogEvent>, IngestError> {
    let mut events = Vec::new();
    let mut last_timestamp = 0;
    let mut skipped = 0usize;

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with('{') {
            match serde_json::from_str::<RawLogEvent>(trimmed) {
                Ok(event) if !event.message.is_empty() => {
                    last_timestamp = event.timestamp;
                    events.push(event);
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(line = line_number + 1, error = %e, "treating malformed JSON line as plain text");
                }
            }
        }

        events.push(RawLogEvent {
            timestamp: last_timestamp,
            message: line,
            ..Default::default()
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "some lines were not valid events");
    }

    Ok(events)
}
