pub mod committee;
pub mod legislator;

use std::ops::Range;

use crate::config::Settings;
use crate::error::ExtractError;
use crate::parser::normalize::RawBlock;
use crate::record::Schema;

/// Named capture position. Each schema owns a fixed, ordered subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    FirstName,
    LastName,
    Position,
    Chamber,
    District,
    Party,
    City,
    MadisonOffice,
    Telephone,
    Fax,
    DistrictPhone,
    Email,
    DistrictAddress,
    VotingAddress,
    Staff,
    Committees,
    Biography,

    Header,
    Roles,
    Members,
    Hearings,
}

const LEGISLATOR_SLOTS: &[Slot] = &[
    Slot::FirstName,
    Slot::LastName,
    Slot::Position,
    Slot::Chamber,
    Slot::District,
    Slot::Party,
    Slot::City,
    Slot::MadisonOffice,
    Slot::Telephone,
    Slot::Fax,
    Slot::DistrictPhone,
    Slot::Email,
    Slot::DistrictAddress,
    Slot::VotingAddress,
    Slot::Staff,
    Slot::Committees,
    Slot::Biography,
];

const COMMITTEE_SLOTS: &[Slot] = &[Slot::Header, Slot::Roles, Slot::Members, Slot::Hearings];

impl Slot {
    pub fn for_schema(schema: Schema) -> &'static [Slot] {
        match schema {
            Schema::Legislator => LEGISLATOR_SLOTS,
            Schema::Committee => COMMITTEE_SLOTS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Slot::FirstName => "first_name",
            Slot::LastName => "last_name",
            Slot::Position => "position",
            Slot::Chamber => "chamber",
            Slot::District => "district",
            Slot::Party => "party",
            Slot::City => "city",
            Slot::MadisonOffice => "madison_office",
            Slot::Telephone => "telephone",
            Slot::Fax => "fax",
            Slot::DistrictPhone => "district_phone",
            Slot::Email => "email",
            Slot::DistrictAddress => "district_address",
            Slot::VotingAddress => "voting_address",
            Slot::Staff => "staff",
            Slot::Committees => "committees",
            Slot::Biography => "biography",
            Slot::Header => "header",
            Slot::Roles => "roles",
            Slot::Members => "members",
            Slot::Hearings => "hearings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Capture {
    slot: Slot,
    value: Option<String>,
    span: Option<Range<usize>>,
}

/// Extractor output: every slot of the schema, in schema order, filled or
/// `None`. Spans are byte ranges into the text the extractor matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSet {
    schema: Schema,
    captures: Vec<Capture>,
}

impl CaptureSet {
    pub fn empty(schema: Schema) -> Self {
        let captures = Slot::for_schema(schema)
            .iter()
            .map(|&slot| Capture {
                slot,
                value: None,
                span: None,
            })
            .collect();
        CaptureSet { schema, captures }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.captures
            .iter()
            .find(|c| c.slot == slot)
            .and_then(|c| c.value.as_deref())
    }

    pub fn span(&self, slot: Slot) -> Option<Range<usize>> {
        self.captures
            .iter()
            .find(|c| c.slot == slot)
            .and_then(|c| c.span.clone())
    }

    /// Slots in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, Option<&str>)> {
        self.captures.iter().map(|c| (c.slot, c.value.as_deref()))
    }

    /// Slots outside this schema are ignored.
    pub(crate) fn set(&mut self, slot: Slot, value: impl Into<String>, span: Range<usize>) {
        if let Some(c) = self.captures.iter_mut().find(|c| c.slot == slot) {
            c.value = Some(value.into());
            c.span = Some(span);
        }
    }
}

/// Split a normalized block into the schema's capture slots.
pub fn extract(block: &RawBlock, schema: Schema, settings: &Settings) -> Result<CaptureSet, ExtractError> {
    if block.len() > settings.max_block_len {
        return Err(ExtractError::Oversized {
            schema,
            len: block.len(),
            limit: settings.max_block_len,
        });
    }
    match schema {
        Schema::Legislator => legislator::extract(block),
        Schema::Committee => committee::extract(block, &settings.name_exceptions),
    }
}
