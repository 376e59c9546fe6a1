//! Legislator panel extraction.
//!
//! The panel is matched as a sequence of small anchored sub-matchers, each
//! applied at the cursor left by the previous one. Every byte of the block
//! must be consumed by the time the `end` matcher runs.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::{CaptureSet, Slot};
use crate::error::{excerpt, ExtractError};
use crate::parser::normalize::RawBlock;
use crate::record::Schema;

/// `Representative Mary Jo Smith`: title word, given names, surname.
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*\w+ ([^\n]+?) ([\w'.-]+)[ \t]*\n").unwrap());
/// Optional leadership line, then `Assembly District 31 (R - Clinton)`.
static SEAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A\s*(?:([^\n]+?)[ \t]*\n\s*)?(\w+) District (\d+) \(([A-Z]) - ([^)\n]+?)\)").unwrap()
});
/// Anything between the seat line and the office label is page chrome.
static MADISON_OFFICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[\s\S]*?Madison Office:\s*([^\n]+?)[ \t]*(?:\n|\z)").unwrap());
static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| labelled("Telephone"));
static FAX_RE: LazyLock<Regex> = LazyLock::new(|| labelled("Fax"));
static DISTRICT_PHONE_RE: LazyLock<Regex> = LazyLock::new(|| labelled("District Phone"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| labelled("Email"));
static DISTRICT_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| labelled("District Address"));
static VOTING_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| labelled("Voting Address"));
static STAFF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\A\s*Staff:([\s\S]*?)(?:\n\s*(?:Current Committees|Biography)[ \t]*(?:\n|\z)|\s*\z)",
    )
    .unwrap()
});
static COMMITTEES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A\s*Current Committees([\s\S]*?)(?:\n\s*Biography[ \t]*(?:\n|\z)|\s*\z)").unwrap()
});
static BIOGRAPHY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*Biography([\s\S]*?)\s*\z").unwrap());
static END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A\s*\z").unwrap());

/// `Label:` followed by a one-line value, on the same line or the next.
fn labelled(label: &str) -> Regex {
    Regex::new(&format!(r"\A\s*{}:\s*([^\n]+?)[ \t]*(?:\n|\z)", regex::escape(label))).unwrap()
}

struct SubMatcher {
    stage: &'static str,
    re: &'static LazyLock<Regex>,
    required: bool,
    /// Capture group → slot.
    slots: &'static [(usize, Slot)],
    /// The cursor moves to the end of this group. Section matchers stop
    /// before the next heading, which they only look at.
    advance_to: usize,
}

static MATCHERS: &[SubMatcher] = &[
    SubMatcher {
        stage: "name",
        re: &NAME_RE,
        required: true,
        slots: &[(1, Slot::FirstName), (2, Slot::LastName)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "seat",
        re: &SEAT_RE,
        required: true,
        slots: &[
            (1, Slot::Position),
            (2, Slot::Chamber),
            (3, Slot::District),
            (4, Slot::Party),
            (5, Slot::City),
        ],
        advance_to: 0,
    },
    SubMatcher {
        stage: "madison_office",
        re: &MADISON_OFFICE_RE,
        required: true,
        slots: &[(1, Slot::MadisonOffice)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "telephone",
        re: &TELEPHONE_RE,
        required: true,
        slots: &[(1, Slot::Telephone)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "fax",
        re: &FAX_RE,
        required: false,
        slots: &[(1, Slot::Fax)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "district_phone",
        re: &DISTRICT_PHONE_RE,
        required: false,
        slots: &[(1, Slot::DistrictPhone)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "email",
        re: &EMAIL_RE,
        required: true,
        slots: &[(1, Slot::Email)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "district_address",
        re: &DISTRICT_ADDRESS_RE,
        required: false,
        slots: &[(1, Slot::DistrictAddress)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "voting_address",
        re: &VOTING_ADDRESS_RE,
        required: false,
        slots: &[(1, Slot::VotingAddress)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "staff",
        re: &STAFF_RE,
        required: false,
        slots: &[(1, Slot::Staff)],
        advance_to: 1,
    },
    SubMatcher {
        stage: "committees",
        re: &COMMITTEES_RE,
        required: false,
        slots: &[(1, Slot::Committees)],
        advance_to: 1,
    },
    SubMatcher {
        stage: "biography",
        re: &BIOGRAPHY_RE,
        required: false,
        slots: &[(1, Slot::Biography)],
        advance_to: 0,
    },
    SubMatcher {
        stage: "end",
        re: &END_RE,
        required: true,
        slots: &[],
        advance_to: 0,
    },
];

pub fn extract(block: &RawBlock) -> Result<CaptureSet, ExtractError> {
    let text = block.as_str();
    let mut captures = CaptureSet::empty(Schema::Legislator);
    let mut pos = 0;

    for m in MATCHERS {
        let rest = &text[pos..];
        let Some(caps) = m.re.captures(rest) else {
            if m.required {
                return Err(ExtractError::NoPatternMatch {
                    schema: Schema::Legislator,
                    stage: m.stage,
                    excerpt: excerpt(rest),
                });
            }
            trace!(stage = m.stage, "optional section absent");
            continue;
        };

        for &(group, slot) in m.slots {
            if let Some(g) = caps.get(group) {
                captures.set(slot, g.as_str(), pos + g.start()..pos + g.end());
            }
        }
        let consumed = caps
            .get(m.advance_to)
            .or_else(|| caps.get(0))
            .map_or(0, |g| g.end());
        pos += consumed;
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

    const MINIMAL: &str = "\nSenator Alberta Quill\n\nSenate District 8 (R - River Hills)\n\nMadison Office:\n Room 317 EastState Capitol\nTelephone:\n (608) 266-5830\nEmail:\nSen.Quill@legis.wisconsin.gov\n";

    #[test]
    fn fixture_panel_fills_every_slot() {
        let raw = std::fs::read_to_string("tests/fixtures/legislator.txt").unwrap();
        let c = extract(&block(&raw)).unwrap();
        assert_eq!(c.get(Slot::FirstName), Some("Mary Jo"));
        assert_eq!(c.get(Slot::LastName), Some("Smith"));
        assert_eq!(c.get(Slot::Position), Some("Assistant Majority Leader"));
        assert_eq!(c.get(Slot::Chamber), Some("Assembly"));
        assert_eq!(c.get(Slot::District), Some("31"));
        assert_eq!(c.get(Slot::Party), Some("R"));
        assert_eq!(c.get(Slot::City), Some("Clinton"));
        assert_eq!(c.get(Slot::Fax), Some("(608) 282-3631"));
        assert_eq!(c.get(Slot::Email), Some("Rep.Smith@legis.wisconsin.gov"));
        assert!(c.get(Slot::VotingAddress).is_none());
        assert!(c.get(Slot::Staff).unwrap().contains("tj@legis.wisconsin.gov"));
        assert!(!c.get(Slot::Staff).unwrap().contains("Current Committees"));
        assert!(c.get(Slot::Committees).unwrap().contains("(Co-Chair)"));
        assert!(c.get(Slot::Biography).unwrap().contains("elected"));
    }

    #[test]
    fn optional_slots_absent() {
        let b = block(MINIMAL);
        let c = extract(&b).unwrap();
        assert_eq!(c.get(Slot::FirstName), Some("Alberta"));
        assert_eq!(c.get(Slot::Chamber), Some("Senate"));
        assert_eq!(c.get(Slot::City), Some("River Hills"));
        assert!(c.get(Slot::Position).is_none());
        assert!(c.get(Slot::Fax).is_none());
        assert!(c.get(Slot::Staff).is_none());
        assert!(c.get(Slot::Biography).is_none());
        assert_eq!(c.len(), 17);
    }

    #[test]
    fn spans_point_into_block() {
        let b = block(MINIMAL);
        let c = extract(&b).unwrap();
        let span = c.span(Slot::Telephone).unwrap();
        assert_eq!(&b[span], "(608) 266-5830");
    }

    #[test]
    fn missing_email_names_stage() {
        let raw = MINIMAL.replace("Email:\nSen.Quill@legis.wisconsin.gov\n", "");
        let err = extract(&block(&raw)).unwrap_err();
        match err {
            ExtractError::NoPatternMatch { stage, .. } => assert_eq!(stage, "email"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn trailing_text_rejected() {
        let raw = format!("{MINIMAL}Page footer text\n");
        let err = extract(&block(&raw)).unwrap_err();
        assert!(matches!(err, ExtractError::NoPatternMatch { stage: "end", .. }));
    }

    #[test]
    fn missing_seat_line_rejected() {
        let raw = "\nSenator Alberta Quill\n\nMadison Office:\n Room 317\nTelephone:\n 1\nEmail:\nx@y\n";
        let err = extract(&block(raw)).unwrap_err();
        assert!(matches!(err, ExtractError::NoPatternMatch { stage: "seat", .. }));
    }
}
