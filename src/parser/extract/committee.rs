use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use super::{CaptureSet, Slot};
use crate::error::{excerpt, ExtractError};
use crate::parser::breaks::repair_glued_lines;
use crate::parser::normalize::RawBlock;
use crate::record::Schema;

static MEMBERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Members[ \t]*$").unwrap());
static HEARINGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Hearing Notices[ \t]*$").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());
/// Hearing entries are separated by three or more blank lines.
static ENTRY_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{4,}").unwrap());

pub const MEMBERS_MARKER: &str = "Members";
pub const HEARINGS_MARKER: &str = "Hearing Notices";
/// Joins the lines of one hearing entry.
pub const HEARING_LINE_SEP: &str = " - ";

/// Segments between matches of `re`, each with its byte offset in `text`.
/// Always at least one segment.
fn split_on<'t>(re: &Regex, text: &'t str) -> Vec<(usize, &'t str)> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push((last, &text[last..m.start()]));
        last = m.end();
    }
    out.push((last, &text[last..]));
    out
}

fn mismatch(marker: &'static str, segments: usize, expected: usize, text: &str) -> ExtractError {
    ExtractError::StructureMismatch {
        schema: Schema::Committee,
        marker,
        segments,
        expected,
        excerpt: excerpt(text),
    }
}

/// One string per hearing, in page order, its lines joined with
/// `HEARING_LINE_SEP`.
pub fn hearing_entries(segment: &str) -> Vec<String> {
    ENTRY_BREAK_RE
        .split(segment.trim())
        .map(|entry| {
            entry
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .join(HEARING_LINE_SEP)
        })
        .filter(|e| !e.is_empty())
        .collect()
}

/// Committee panels are split, not matched: an optional `Hearing Notices`
/// tail, then exactly one `Members` heading separating the roles roster
/// from the membership list. Spans index into the repaired text.
pub fn extract(block: &RawBlock, exceptions: &[String]) -> Result<CaptureSet, ExtractError> {
    let text = repair_glued_lines(block, exceptions);
    let mut captures = CaptureSet::empty(Schema::Committee);

    let parts = split_on(&HEARINGS_RE, &text);
    if parts.len() > 2 {
        return Err(mismatch(HEARINGS_MARKER, parts.len(), 2, &text));
    }
    let (_, body) = parts[0];
    if let Some(&(start, hearings)) = parts.get(1) {
        let entries = hearing_entries(hearings);
        if !entries.is_empty() {
            captures.set(Slot::Hearings, entries.join("\n"), start..start + hearings.len());
        }
    }

    let segments = split_on(&MEMBERS_RE, body);
    if segments.len() != 2 {
        return Err(mismatch(MEMBERS_MARKER, segments.len(), 2, body));
    }
    let (_, head) = segments[0];
    let (members_start, members) = segments[1];
    captures.set(Slot::Members, members, members_start..members_start + members.len());

    let paragraphs: Vec<(usize, &str)> = split_on(&BLANK_RUN_RE, head)
        .into_iter()
        .filter(|(_, p)| !p.trim().is_empty())
        .collect();
    if let Some((&(start, roles), preamble)) = paragraphs.split_last() {
        captures.set(Slot::Roles, roles, start..start + roles.len());
        if let (Some(first), Some(last)) = (preamble.first(), preamble.last()) {
            let header = preamble
                .iter()
                .flat_map(|(_, p)| p.lines())
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .join(" ");
            captures.set(Slot::Header, header, first.0..last.0 + last.1.len());
        }
    }

    Ok(captures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::normalize::normalize;

    fn block(s: &str) -> RawBlock {
        let mut w = Vec::new();
        normalize(s, "Notify", &mut w)
    }

    fn exceptions() -> Vec<String> {
        vec!["VanderMeer".to_string()]
    }

    #[test]
    fn fixture_segments() {
        let raw = std::fs::read_to_string("tests/fixtures/committee.txt").unwrap();
        let c = extract(&block(&raw), &exceptions()).unwrap();
        assert_eq!(
            c.get(Slot::Header),
            Some("Senate Committee on Health and Human Services Meeting room: 201 Southeast")
        );
        let roles = c.get(Slot::Roles).unwrap();
        assert!(roles.starts_with("Sen. Quill (Chair)"));
        assert!(roles.contains("Pat Lindqvist (608)"));
        assert!(c.get(Slot::Members).unwrap().contains(" Rep. Tennant (ex officio)"));
        assert_eq!(
            c.get(Slot::Hearings),
            Some("Tuesday, March 3, 2015 - 10:00 AM - 201 Southeast\nWednesday, April 1, 2015 - 1:00 PM - 411 South")
        );
    }

    #[test]
    fn two_members_headings_is_three_way_split() {
        let raw = std::fs::read_to_string("tests/fixtures/committee_two_members.txt").unwrap();
        let err = extract(&block(&raw), &[]).unwrap_err();
        match err {
            ExtractError::StructureMismatch {
                marker, segments, ..
            } => {
                assert_eq!(marker, MEMBERS_MARKER);
                assert_eq!(segments, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_members_heading() {
        let err = extract(&block("Sen. Quill (Chair)\nSen. Marsh\n"), &[]).unwrap_err();
        assert!(matches!(err, ExtractError::StructureMismatch { segments: 1, .. }));
    }

    #[test]
    fn repeated_hearing_notices_rejected() {
        let raw = "Sen. Quill (Chair)\n\nMembers\nSen. Marsh\n\nHearing Notices\nA\n\nHearing Notices\nB\n";
        let err = extract(&block(raw), &[]).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::StructureMismatch {
                marker: HEARINGS_MARKER,
                segments: 3,
                ..
            }
        ));
    }

    #[test]
    fn members_word_inside_a_line_is_not_a_heading() {
        let raw = "Sen. Quill (Chair)\n\nMembers\nSen. Marsh\nSen. Members Jr.\n";
        let c = extract(&block(raw), &[]).unwrap();
        assert!(c.get(Slot::Members).unwrap().contains("Sen. Members Jr."));
        assert!(c.get(Slot::Header).is_none());
        assert!(c.get(Slot::Hearings).is_none());
    }

    #[test]
    fn glued_heading_repaired_before_split() {
        let c = extract(&block("Sen. Quill (Chair)\n\nMembersSen. Marsh\n"), &[]).unwrap();
        assert_eq!(c.get(Slot::Members), Some("\nSen. Marsh\n"));
    }

    #[test]
    fn heading_glued_to_clerk_phone() {
        let raw = "Sen. Quill (Chair)\nCommittee Clerk Pat (608) 266-0000Members\nSen. Harlow\n";
        let c = extract(&block(raw), &[]).unwrap();
        assert_eq!(c.get(Slot::Roles), Some("Sen. Quill (Chair)\nCommittee Clerk Pat (608) 266-0000\n"));
        assert_eq!(c.get(Slot::Members), Some("\nSen. Harlow\n"));
    }

    #[test]
    fn hearing_lines_joined_blank_lines_dropped() {
        let entries = hearing_entries("\nMonday\n\n9:00 AM\n\n\n\nFriday\n2:00 PM\n");
        assert_eq!(entries, ["Monday - 9:00 AM", "Friday - 2:00 PM"]);
    }
}
