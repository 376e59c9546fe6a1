use thiserror::Error;

use crate::record::Schema;

/// How many characters of offending text a failure carries.
pub const EXCERPT_CHARS: usize = 80;

/// A subject-level extraction failure. The caller skips the subject; nothing
/// here aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("{schema}: no match at stage '{stage}' near {excerpt:?}")]
    NoPatternMatch {
        schema: Schema,
        stage: &'static str,
        excerpt: String,
    },

    #[error("{schema}: splitting on '{marker}' gave {segments} segments (expected {expected}) near {excerpt:?}")]
    StructureMismatch {
        schema: Schema,
        marker: &'static str,
        segments: usize,
        expected: usize,
        excerpt: String,
    },

    #[error("{schema}: block is {len} bytes, limit is {limit}")]
    Oversized {
        schema: Schema,
        len: usize,
        limit: usize,
    },
}

impl ExtractError {
    pub fn schema(&self) -> Schema {
        match self {
            ExtractError::NoPatternMatch { schema, .. }
            | ExtractError::StructureMismatch { schema, .. }
            | ExtractError::Oversized { schema, .. } => *schema,
        }
    }

    /// Short machine-friendly tag, used as the `kind` column in the store.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::NoPatternMatch { .. } => "no_pattern_match",
            ExtractError::StructureMismatch { .. } => "structure_mismatch",
            ExtractError::Oversized { .. } => "oversized",
        }
    }
}

/// First `EXCERPT_CHARS` characters of `text` with surrounding whitespace
/// removed.
pub fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
