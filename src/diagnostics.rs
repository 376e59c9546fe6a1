use std::fmt;

use serde::Serialize;
use tracing::warn;

/// Non-fatal condition noticed while processing one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A non-ASCII character was transliterated (`replacement` is `Some`) or
    /// dropped (`None`) by the normalizer.
    Encoding {
        ch: char,
        replacement: Option<String>,
        count: usize,
    },
    /// A continuation line showed up before any role line.
    MissingRoleContext { line: String },
}

impl Warning {
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::Encoding { .. } => "encoding",
            Warning::MissingRoleContext { .. } => "missing_role_context",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Encoding {
                ch,
                replacement: Some(r),
                count,
            } => write!(f, "transliterated {:?} (U+{:04X}) to {:?} x{}", ch, *ch as u32, r, count),
            Warning::Encoding {
                ch,
                replacement: None,
                count,
            } => write!(f, "dropped {:?} (U+{:04X}) x{}", ch, *ch as u32, count),
            Warning::MissingRoleContext { line } => {
                write!(f, "no role before continuation line {:?}; dropped", line)
            }
        }
    }
}

/// Sink every pipeline stage writes its warnings to. Passed in by the
/// caller; stages only emit `trace`/`debug` events of their own.
pub trait Report {
    fn report(&mut self, warning: Warning);
}

/// Per-subject collector. Keeps warnings in arrival order and mirrors each
/// one to `tracing`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    subject: Option<String>,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_subject(subject: impl Into<String>) -> Self {
        Diagnostics {
            subject: Some(subject.into()),
            warnings: Vec::new(),
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

impl Report for Diagnostics {
    fn report(&mut self, warning: Warning) {
        warn!(
            subject = self.subject.as_deref().unwrap_or("-"),
            kind = warning.kind(),
            "{}",
            warning
        );
        self.warnings.push(warning);
    }
}

impl Report for Vec<Warning> {
    fn report(&mut self, warning: Warning) {
        self.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_order() {
        let mut d = Diagnostics::for_subject("Assembly Committee on Health");
        d.report(Warning::MissingRoleContext { line: "Sen. Smith".into() });
        d.report(Warning::Encoding {
            ch: 'é',
            replacement: Some("e".into()),
            count: 2,
        });
        assert_eq!(d.len(), 2);
        assert_eq!(d.warnings()[0].kind(), "missing_role_context");
        assert_eq!(d.warnings()[1].kind(), "encoding");
    }

    #[test]
    fn display_mentions_codepoint() {
        let w = Warning::Encoding {
            ch: '\u{2603}',
            replacement: None,
            count: 1,
        };
        assert!(w.to_string().contains("U+2603"));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let w = Warning::MissingRoleContext { line: "x".into() };
        let v = serde_json::to_value(&w).unwrap();
        assert_eq!(v["kind"], "missing_role_context");
        assert_eq!(v["line"], "x");
    }
}
