//! Note journal entry model and its single-text-field layout.
//!
//! # Invariants
//! - Entries are stored newest first.
//! - Each entry is `<marker> <timestamp>\n<body>\n\n`; a body never
//!   contains a blank line, so the first blank line ends it.
//! - Text outside any entry is kept verbatim as an untimestamped entry.

use chrono::{DateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Leading marker of every journal entry header line.
pub const NOTE_ENTRY_MARKER: &str = "##";
/// `chrono` format used for entry header timestamps.
pub const NOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

static ENTRY_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^## (\d{4}-\d{2}-\d{2} \d{2}:\d{2})\s*$").expect("valid entry header regex")
});

/// One entry of a contact's note journal.
///
/// `timestamp` is the formatted header text; `None` marks free text that
/// predates the journal format (or was written by explicit edit mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub timestamp: Option<String>,
    pub body: String,
}

/// Formats one entry ready to be prepended to the note field.
///
/// Trailing whitespace and blank lines are removed from `text`, so the
/// body reads back as one entry.
pub fn compose_entry<Tz>(timestamp: &DateTime<Tz>, text: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let body: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect();
    format!(
        "{NOTE_ENTRY_MARKER} {}\n{}\n\n",
        timestamp.format(NOTE_TIMESTAMP_FORMAT),
        body.join("\n").trim_start()
    )
}

/// Splits a note field into entries, newest first.
pub fn parse_entries(note: &str) -> Vec<NoteEntry> {
    let mut entries = Vec::new();
    let mut timestamp: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in note.lines() {
        if let Some(caps) = ENTRY_HEADER_RE.captures(line) {
            push_entry(&mut entries, timestamp.take(), &mut body);
            timestamp = caps.get(1).map(|m| m.as_str().to_string());
        } else if line.trim().is_empty() && timestamp.is_some() {
            push_entry(&mut entries, timestamp.take(), &mut body);
        } else {
            body.push(line);
        }
    }
    push_entry(&mut entries, timestamp, &mut body);

    entries
}

fn push_entry(entries: &mut Vec<NoteEntry>, timestamp: Option<String>, body: &mut Vec<&str>) {
    let text = body.join("\n").trim().to_string();
    body.clear();
    if timestamp.is_some() || !text.is_empty() {
        entries.push(NoteEntry {
            timestamp,
            body: text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{compose_entry, parse_entries, NoteEntry};
    use chrono::{TimeZone, Utc};

    #[test]
    fn compose_uses_marker_timestamp_and_blank_line() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(compose_entry(&at, " hi \n"), "## 2024-03-09 07:05\nhi\n\n");
    }

    #[test]
    fn parse_keeps_legacy_text_as_untimestamped_entry() {
        let note = "## 2024-03-09 07:05\nsecond\n\n## 2024-03-08 10:00\nfirst\nline two\n\nold free text";
        let entries = parse_entries(note);
        assert_eq!(
            entries,
            vec![
                NoteEntry {
                    timestamp: Some("2024-03-09 07:05".to_string()),
                    body: "second".to_string(),
                },
                NoteEntry {
                    timestamp: Some("2024-03-08 10:00".to_string()),
                    body: "first\nline two".to_string(),
                },
                NoteEntry {
                    timestamp: None,
                    body: "old free text".to_string(),
                },
            ]
        );
    }

    #[test]
    fn compose_drops_blank_lines_inside_entry() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        let entry = compose_entry(&at, "first\n\n  \nsecond  ");
        assert_eq!(entry, "## 2024-03-09 07:05\nfirst\nsecond\n\n");
        assert_eq!(parse_entries(&entry).len(), 1);
    }

    #[test]
    fn legacy_text_keeps_its_blank_lines() {
        let entries = parse_entries("## 2024-03-09 07:05\nnew\n\nold\n\nolder");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].timestamp, None);
        assert_eq!(entries[1].body, "old\n\nolder");
    }

    #[test]
    fn parse_empty_note_has_no_entries() {
        assert!(parse_entries("").is_empty());
        assert!(parse_entries("\n\n").is_empty());
    }
}
