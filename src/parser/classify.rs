//! Per-line role classification for committee rosters.
//!
//! `classify` tags each line of a segment with a `Role` using the `MARKERS`
//! table; `Roster::step` folds tagged lines into role buckets. Both are pure:
//! the only side channel is the injected `Report`.

use serde::Serialize;

use crate::diagnostics::{Report, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Chair,
    CoChair,
    ViceChair,
    Clerk,
    CouncilStaff,
    Member,
    Other,
    /// No marker of its own; belongs to the previous role line.
    Continuation,
}

/// Which part of a committee panel a segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Officer roster above the `Members` heading.
    Roles,
    /// Membership list below it.
    Members,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Suffix(&'static str),
    Prefix(&'static str),
}

/// Tested in order; the first hit wins.
const MARKERS: &[(Marker, Role)] = &[
    (Marker::Suffix("(Chair)"), Role::Chair),
    (Marker::Suffix("(Co-Chair)"), Role::CoChair),
    (Marker::Suffix("(Vice-Chair)"), Role::ViceChair),
    (Marker::Prefix("Committee Clerk "), Role::Clerk),
    (Marker::Prefix("Legislative Council Staff "), Role::CouncilStaff),
];

impl Marker {
    /// The name left once the marker is removed, if the marker applies and
    /// leaves something behind.
    fn strip(self, line: &str) -> Option<&str> {
        let name = match self {
            Marker::Suffix(s) => line.strip_suffix(s)?,
            Marker::Prefix(p) => line.strip_prefix(p)?,
        };
        let name = name.trim();
        (!name.is_empty()).then_some(name)
    }
}

fn marked(line: &str) -> Option<(Role, &str)> {
    MARKERS
        .iter()
        .find_map(|&(marker, role)| marker.strip(line).map(|name| (role, name)))
}

/// Tag every non-blank line of `segment`. Indentation is read from the
/// normalized text, where a single leading space survives.
pub fn classify(segment: &str, kind: SegmentKind) -> Vec<ClassifiedLine> {
    segment
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let text = line.trim();
            let (role, text) = match (marked(text), kind) {
                (Some((role, name)), _) => (role, name),
                (None, SegmentKind::Roles) => (Role::Continuation, text),
                (None, SegmentKind::Members) if line.starts_with(char::is_whitespace) => {
                    (Role::Other, text)
                }
                (None, SegmentKind::Members) => (Role::Member, text),
            };
            ClassifiedLine {
                role,
                text: text.to_string(),
            }
        })
        .collect()
}

/// Role buckets for one committee, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub chair: Vec<String>,
    pub co_chair: Vec<String>,
    pub vice_chair: Vec<String>,
    pub clerk: Vec<String>,
    pub council_staff: Vec<String>,
    pub members: Vec<String>,
    pub other: Vec<String>,
    last: Option<Role>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, role: Role) -> Option<&mut Vec<String>> {
        match role {
            Role::Chair => Some(&mut self.chair),
            Role::CoChair => Some(&mut self.co_chair),
            Role::ViceChair => Some(&mut self.vice_chair),
            Role::Clerk => Some(&mut self.clerk),
            Role::CouncilStaff => Some(&mut self.council_staff),
            Role::Member => Some(&mut self.members),
            Role::Other => Some(&mut self.other),
            Role::Continuation => None,
        }
    }

    fn contains_anywhere(&self, name: &str) -> bool {
        [
            &self.chair,
            &self.co_chair,
            &self.vice_chair,
            &self.clerk,
            &self.council_staff,
            &self.members,
            &self.other,
        ]
        .iter()
        .any(|b| b.iter().any(|n| n == name))
    }

    fn push(&mut self, role: Role, name: &str) {
        if let Some(bucket) = self.bucket_mut(role) {
            if !bucket.iter().any(|n| n == name) {
                bucket.push(name.to_string());
            }
        }
    }

    /// Fold one classified line into the roster.
    pub fn step(mut self, line: &ClassifiedLine, report: &mut impl Report) -> Self {
        match line.role {
            Role::Continuation => match self.last {
                Some(role) => self.push(role, &line.text),
                None => report.report(Warning::MissingRoleContext {
                    line: line.text.clone(),
                }),
            },
            Role::Member | Role::Other => {
                if !self.contains_anywhere(&line.text) {
                    self.push(line.role, &line.text);
                }
            }
            role => {
                self.push(role, &line.text);
                self.last = Some(role);
            }
        }
        self
    }

    pub fn absorb(self, lines: &[ClassifiedLine], report: &mut impl Report) -> Self {
        lines.iter().fold(self, |roster, line| roster.step(line, report))
    }
}
