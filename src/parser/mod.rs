pub mod assemble;
pub mod breaks;
pub mod classify;
pub mod extract;
pub mod normalize;

use tracing::debug;

use crate::config::Settings;
use crate::diagnostics::Report;
use crate::error::ExtractError;
use crate::record::{NormalizedRecord, Schema};
use assemble::{CommitteeRecord, LegislatorRecord};
use classify::{classify, Roster, SegmentKind};
use extract::Slot;

/// Four-pass pipeline: raw text → normalized block → capture slots → role
/// buckets → legislator record.
pub fn process_legislator(
    raw: &str,
    settings: &Settings,
    report: &mut impl Report,
) -> Result<LegislatorRecord, ExtractError> {
    let block = normalize::normalize(raw, &settings.banner, report);
    let captures = extract::extract(&block, Schema::Legislator, settings)?;
    let record = assemble::assemble_legislator(&captures, settings);
    debug!(hid = %record.hid(), "legislator assembled");
    Ok(record)
}

/// Same pipeline for a committee panel. The roles segment is classified
/// before the members segment so members-side dedup sees the officers.
pub fn process_committee(
    raw: &str,
    settings: &Settings,
    report: &mut impl Report,
) -> Result<CommitteeRecord, ExtractError> {
    let block = normalize::normalize(raw, &settings.banner, report);
    let captures = extract::extract(&block, Schema::Committee, settings)?;

    let roles = classify(captures.get(Slot::Roles).unwrap_or_default(), SegmentKind::Roles);
    let members = classify(captures.get(Slot::Members).unwrap_or_default(), SegmentKind::Members);
    let roster = Roster::new().absorb(&roles, report).absorb(&members, report);

    Ok(assemble::assemble_committee(&captures, roster))
}

/// Schema-dispatched entry point returning the flat record.
pub fn process(
    raw: &str,
    schema: Schema,
    settings: &Settings,
    report: &mut impl Report,
) -> Result<NormalizedRecord, ExtractError> {
    match schema {
        Schema::Legislator => process_legislator(raw, settings, report).map(Into::into),
        Schema::Committee => process_committee(raw, settings, report).map(Into::into),
    }
}
