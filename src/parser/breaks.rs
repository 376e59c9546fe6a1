//! Line-break insertion for text whose line separators were lost upstream
//! ("State CapitolP.O. Box 8952Madison").

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Uppercase letter followed by a capitalized word: "POBox" → "PO|Box".
static UPPER_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])([A-Z][a-z])").unwrap());
/// Two lowercase letters, a digit, or an abbreviation period, then uppercase.
static LOWER_UPPER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]{2}|\d|[a-z]\.)([A-Z])").unwrap());
/// Capitalized (or parenthesized) word running straight into the next one:
/// "Darling (Chair)Sen." → "Darling (Chair)|Sen.".
static GLUED_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z(]\w+[a-z)2])([A-Z])").unwrap());
/// Section heading run onto the end of the previous line: "266-0000Members".
static GLUED_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(\S)((?:Members|Hearing Notices)[ \t]*)$").unwrap());
static GLUED_PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z])\(").unwrap());
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d)\(").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub const LINE_BREAK: &str = "\n";

/// Byte ranges covered by any exception name.
fn protected_ranges(text: &str, exceptions: &[String]) -> Vec<Range<usize>> {
    exceptions
        .iter()
        .filter(|name| !name.is_empty())
        .flat_map(|name| {
            text.match_indices(name.as_str())
                .map(|(start, m)| start..start + m.len())
        })
        .collect()
}

/// Insert `sep` between groups 1 and 2 of every match of `re`, except where
/// that point falls strictly inside an exception name.
fn insert_breaks(text: &str, re: &Regex, sep: &str, exceptions: &[String]) -> String {
    let protected = protected_ranges(text, exceptions);
    re.replace_all(text, |caps: &Captures| {
        let (Some(head), Some(tail)) = (caps.get(1), caps.get(2)) else {
            return caps[0].to_string();
        };
        let at = tail.start();
        if protected.iter().any(|r| r.start < at && at < r.end) {
            caps[0].to_string()
        } else {
            format!("{}{}{}", head.as_str(), sep, tail.as_str())
        }
    })
    .into_owned()
}

/// Break a single-line address into its physical lines.
///
/// `"Room 113 NorthState CapitolP.O. Box 8952Madison, WI 53708"` becomes
/// `"Room 113 North\nState Capitol\nP.O. Box 8952\nMadison, WI 53708"`.
pub fn break_address(text: &str, exceptions: &[String]) -> String {
    let flat = WHITESPACE_RE.replace_all(text.trim(), " ");
    let pass = insert_breaks(&flat, &UPPER_PAIR_RE, LINE_BREAK, exceptions);
    insert_breaks(&pass, &LOWER_UPPER_RE, LINE_BREAK, exceptions)
}

/// Separate phone numbers glued together: `"266-0000(888)"` → `"266-0000\n(888)"`.
pub fn break_phones(text: &str) -> String {
    PHONE_RE.replace_all(text, "${1}\n(").into_owned()
}

/// Restore line breaks lost between roster entries and before section
/// headings of a committee panel, and put a space before a parenthesis
/// glued to a word.
pub fn repair_glued_lines(text: &str, exceptions: &[String]) -> String {
    let headed = insert_breaks(text, &GLUED_HEADING_RE, LINE_BREAK, exceptions);
    let split = insert_breaks(&headed, &GLUED_WORD_RE, LINE_BREAK, exceptions);
    GLUED_PAREN_RE.replace_all(&split, "${1} (").into_owned()
}
