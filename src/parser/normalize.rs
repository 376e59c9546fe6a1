use std::collections::BTreeMap;
use std::ops::Deref;

use unicode_normalization::UnicodeNormalization;

use crate::diagnostics::{Report, Warning};

/// Normalized text for one subject. Only `normalize` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock(String);

impl RawBlock {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for RawBlock {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

/// Typographic punctuation with a fixed ASCII spelling. These are expected
/// in the source pages and are not reported.
fn typographic(c: char) -> Option<&'static str> {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => Some("'"),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => Some("\""),
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => Some("-"),
        '\u{2026}' => Some("..."),
        _ => None,
    }
}

/// Compatibility decomposition, keeping only the ASCII part ("é" → "e").
/// Empty when nothing ASCII survives.
fn transliterate(c: char) -> String {
    c.nfkd().filter(|d| d.is_ascii() && !d.is_ascii_control()).collect()
}

fn is_horizontal_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{0B}' | '\u{0C}')
}

/// Canonicalize one raw text block.
///
/// Output is pure ASCII with LF line breaks, single spaces, no trailing
/// spaces, and no leading `banner` token. Line structure is kept: blank
/// lines and a single leading space (indentation) survive, except after a
/// CR or CRLF break, where the indentation is dropped. Never fails;
/// characters that had to be transliterated or dropped are reported once
/// each as `Warning::Encoding`.
pub fn normalize(raw: &str, banner: &str, report: &mut impl Report) -> RawBlock {
    let mut substitutions: BTreeMap<char, (Option<String>, usize)> = BTreeMap::new();
    let mut mapped = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                // Indentation after a CR break is page layout, not a marker.
                while chars.next_if(|&c| c != '\r' && c != '\n' && c.is_whitespace()).is_some() {}
                mapped.push('\n');
            }
            c if c.is_ascii() => mapped.push(c),
            c => {
                if let Some(ascii) = typographic(c) {
                    mapped.push_str(ascii);
                } else if c.is_whitespace() {
                    mapped.push(' ');
                } else {
                    let ascii = transliterate(c);
                    mapped.push_str(&ascii);
                    let entry = substitutions
                        .entry(c)
                        .or_insert_with(|| ((!ascii.is_empty()).then_some(ascii), 0));
                    entry.1 += 1;
                }
            }
        }
    }

    for (ch, (replacement, count)) in substitutions {
        report.report(Warning::Encoding {
            ch,
            replacement,
            count,
        });
    }

    let collapsed = mapped
        .split('\n')
        .map(collapse_line)
        .collect::<Vec<_>>()
        .join("\n");

    RawBlock(strip_banner(&collapsed, banner).to_string())
}

fn collapse_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev_space = false;
    for ch in line.chars() {
        if is_horizontal_space(ch) {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Drop leading banner tokens ("Notify", possibly repeated). The token must
/// stand alone: "Notifying" is left alone.
fn strip_banner<'a>(text: &'a str, banner: &str) -> &'a str {
    if banner.is_empty() {
        return text;
    }
    let mut rest = text;
    loop {
        match rest.trim_start().strip_prefix(banner) {
            Some(after) if !after.starts_with(|c: char| c.is_alphanumeric()) => rest = after,
            _ => return rest,
        }
    }
}
