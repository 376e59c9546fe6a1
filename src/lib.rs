//! Extraction engine for Wisconsin legislature panels.
//!
//! Text blocks (already reduced from HTML elsewhere) for a legislator or a
//! committee go through normalize → extract → classify → assemble and come
//! out as fixed-arity records. Failures are returned as values so a batch
//! can skip a subject and carry on.

pub mod batch;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod feed;
pub mod parser;
pub mod record;

pub use config::Settings;
pub use diagnostics::{Diagnostics, Report, Warning};
pub use error::ExtractError;
pub use parser::{process_committee, process_legislator};
pub use record::{Field, NormalizedRecord, Schema};
