use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::ExtractError;
use crate::parser;
use crate::record::{NormalizedRecord, Schema};

/// One input block and the name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SubjectResult {
    pub id: String,
    pub outcome: Result<NormalizedRecord, ExtractError>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub ok: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn merge(&mut self, other: Summary) {
        self.ok += other.ok;
        self.failed += other.failed;
        self.warnings += other.warnings;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ok, {} skipped, {} warnings",
            self.ok, self.failed, self.warnings
        )
    }
}

/// Results in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<SubjectResult>,
}

impl BatchReport {
    pub fn summary(&self) -> Summary {
        self.results.iter().fold(Summary::default(), |mut s, r| {
            match r.outcome {
                Ok(_) => s.ok += 1,
                Err(_) => s.failed += 1,
            }
            s.warnings += r.warnings.len();
            s
        })
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &NormalizedRecord)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|rec| (r.id.as_str(), rec)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ExtractError)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.id.as_str(), e)))
    }
}

pub fn process_one(subject: &Subject, schema: Schema, settings: &Settings) -> SubjectResult {
    let mut diagnostics = Diagnostics::for_subject(&subject.id);
    let outcome = parser::process(&subject.text, schema, settings, &mut diagnostics);
    match &outcome {
        Ok(_) => debug!(subject = %subject.id, "extracted"),
        Err(e) => warn!(subject = %subject.id, kind = e.kind(), "skipped: {}", e),
    }
    SubjectResult {
        id: subject.id.clone(),
        outcome,
        warnings: diagnostics.into_warnings(),
    }
}

/// Extract every subject. Subjects are independent, so they are spread
/// over the rayon pool.
pub fn run(subjects: &[Subject], schema: Schema, settings: &Settings) -> BatchReport {
    let results = subjects
        .par_iter()
        .map(|s| process_one(s, schema, settings))
        .collect();
    BatchReport { results }
}

/// Read `*.txt` files from `dir`, sorted by name. The file stem is the
/// subject id.
pub fn load_dir(dir: &Path, limit: Option<usize>) -> Result<Vec<Subject>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .map(|entry| {
            entry
                .map(|e| e.path())
                .with_context(|| format!("Failed to read an entry of {}", dir.display()))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|path| {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(Subject { id, text })
        })
        .collect()
}
