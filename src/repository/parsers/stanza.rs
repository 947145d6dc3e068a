// src/repository/parsers/stanza.rs

//! Lenient parser for `Packages` index text
//!
//! Stanzas are separated by empty lines and hold `Field: Value` lines.
//! A line holding only whitespace does not end a stanza. Extraction is
//! best-effort: lines that don't look like a field are skipped, and
//! stanzas without a non-empty `Package` field are dropped. Nothing here
//! returns an error.
//!
//! Each stanza is trimmed, so its first line may be indented. After that,
//! folded RFC 822 continuation lines (lines starting with a space or tab,
//! used for long descriptions) are not merged into the previous field.
//! They are skipped like any other non-field line, so only the first line
//! of a multi-line value is kept.

use super::PackageRecord;
use tracing::debug;

/// Counters describing what the parser threw away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Non-blank stanzas seen in the input
    pub stanzas: usize,
    /// Lines that did not match `Field: Value` (continuations included)
    pub ignored_lines: usize,
    /// Stanzas dropped for lacking a non-empty `Package` field
    pub discarded_stanzas: usize,
}

/// Parse index text into package records tagged with `repo_base_url`
pub fn parse(raw: &str, repo_base_url: &str) -> Vec<PackageRecord> {
    parse_with_stats(raw, repo_base_url).0
}

/// Like [`parse`], also reporting how much of the input was skipped
pub fn parse_with_stats(raw: &str, repo_base_url: &str) -> (Vec<PackageRecord>, ParseStats) {
    let mut records = Vec::new();
    let mut stats = ParseStats::default();
    let mut current: Option<PackageRecord> = None;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        // Only truly empty lines separate stanzas
        if line.is_empty() {
            if let Some(stanza) = current.take() {
                finish_stanza(stanza, &mut records, &mut stats);
            }
            continue;
        }

        // A stanza starts at its first non-blank line, with leading
        // whitespace trimmed; indentation only marks continuations after that
        let line = match current {
            Some(_) => line,
            None if line.trim().is_empty() => continue,
            None => line.trim_start(),
        };

        let stanza = current.get_or_insert_with(|| PackageRecord::new(repo_base_url));
        match split_field(line) {
            Some((name, value)) => stanza.set(name, value),
            None => stats.ignored_lines += 1,
        }
    }

    if let Some(stanza) = current.take() {
        finish_stanza(stanza, &mut records, &mut stats);
    }

    debug!(
        "Parsed {} records from {} stanzas ({} lines ignored, {} stanzas discarded)",
        records.len(),
        stats.stanzas,
        stats.ignored_lines,
        stats.discarded_stanzas
    );

    (records, stats)
}

fn finish_stanza(stanza: PackageRecord, records: &mut Vec<PackageRecord>, stats: &mut ParseStats) {
    stats.stanzas += 1;
    if stanza.get("Package").is_some_and(|p| !p.is_empty()) {
        records.push(stanza);
    } else {
        stats.discarded_stanzas += 1;
    }
}

/// Split `Name: value` into a trimmed name and value
///
/// Returns `None` for continuation lines and lines without a field name.
fn split_field(line: &str) -> Option<(&str, &str)> {
    if line.starts_with([' ', '\t']) {
        return None;
    }

    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some((name, value.trim()))
}
