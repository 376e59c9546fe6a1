use itertools::Itertools;
use serde::Serialize;

use super::breaks::{break_address, break_phones};
use super::classify::Roster;
use super::extract::{CaptureSet, Slot};
use crate::config::Settings;
use crate::record::{NormalizedRecord, Schema};

/// Separates a staffer's name from an email tag that does not follow the
/// `first.last` convention.
pub const STAFF_TAG_SEP: char = ';';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegislatorRecord {
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    /// `Assembly` or `Senate`. Not a column of the flat record.
    pub chamber: String,
    pub district: String,
    pub party: String,
    pub city: String,
    pub madison_office: String,
    pub telephones: String,
    pub fax: Option<String>,
    pub district_phone: Option<String>,
    pub email: String,
    pub district_address: Option<String>,
    pub voting_address: Option<String>,
    pub staff: Vec<String>,
    pub positioned_committees: Vec<String>,
    pub committees: Vec<String>,
    pub biography: Option<String>,
}

impl LegislatorRecord {
    /// Seat id: chamber initial and district number, `A31` or `S8`.
    pub fn hid(&self) -> String {
        let initial = self.chamber.chars().next().map(|c| c.to_ascii_uppercase());
        initial.into_iter().chain(self.district.chars()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitteeRecord {
    pub header: Option<String>,
    pub chair: Vec<String>,
    pub co_chair: Vec<String>,
    pub vice_chair: Vec<String>,
    pub committee_clerk: Vec<String>,
    pub council_staff: Vec<String>,
    pub members: Vec<String>,
    pub other_members: Vec<String>,
    pub hearings: Vec<String>,
}

fn opt(c: &CaptureSet, slot: Slot) -> Option<String> {
    c.get(slot)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn req(c: &CaptureSet, slot: Slot) -> String {
    opt(c, slot).unwrap_or_default()
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Pair (name, email) lines. The email's local part is kept only when it
/// is not just the name with dots for spaces. A trailing unpaired line is
/// dropped.
pub fn staff_entries(text: &str) -> Vec<String> {
    non_blank_lines(text)
        .tuples()
        .map(|(name, email)| {
            let tag = email_tag(email);
            if tag.eq_ignore_ascii_case(&name.replace(' ', ".")) {
                name.to_string()
            } else {
                format!("{name}{STAFF_TAG_SEP}{tag}")
            }
        })
        .collect()
}

/// (positioned, plain). A committee line ending in `)` carries a role.
pub fn split_committees(text: &str) -> (Vec<String>, Vec<String>) {
    non_blank_lines(text)
        .map(String::from)
        .partition(|line| line.ends_with(')'))
}

pub fn email_tag(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

pub fn assemble_legislator(c: &CaptureSet, settings: &Settings) -> LegislatorRecord {
    let exceptions = &settings.name_exceptions;
    let address = |slot| opt(c, slot).map(|a| break_address(&a, exceptions));

    let email = req(c, Slot::Email);
    let email = if settings.split_email_tags {
        email_tag(&email).to_string()
    } else {
        email
    };
    let (positioned_committees, committees) = c
        .get(Slot::Committees)
        .map(split_committees)
        .unwrap_or_default();

    LegislatorRecord {
        first_name: req(c, Slot::FirstName),
        last_name: req(c, Slot::LastName),
        position: opt(c, Slot::Position),
        chamber: req(c, Slot::Chamber),
        district: req(c, Slot::District),
        party: req(c, Slot::Party),
        city: req(c, Slot::City),
        madison_office: break_address(&req(c, Slot::MadisonOffice), exceptions),
        telephones: break_phones(&req(c, Slot::Telephone)),
        fax: opt(c, Slot::Fax),
        district_phone: opt(c, Slot::DistrictPhone),
        email,
        district_address: address(Slot::DistrictAddress),
        voting_address: address(Slot::VotingAddress),
        staff: c.get(Slot::Staff).map(staff_entries).unwrap_or_default(),
        positioned_committees,
        committees,
        biography: opt(c, Slot::Biography),
    }
}

pub fn assemble_committee(c: &CaptureSet, roster: Roster) -> CommitteeRecord {
    CommitteeRecord {
        header: opt(c, Slot::Header),
        chair: roster.chair,
        co_chair: roster.co_chair,
        vice_chair: roster.vice_chair,
        committee_clerk: roster.clerk,
        council_staff: roster.council_staff,
        members: roster.members,
        other_members: roster.other,
        hearings: c
            .get(Slot::Hearings)
            .map(|h| non_blank_lines(h).map(String::from).collect())
            .unwrap_or_default(),
    }
}

impl From<LegislatorRecord> for NormalizedRecord {
    fn from(r: LegislatorRecord) -> Self {
        NormalizedRecord::new(
            Schema::Legislator,
            vec![
                Some(r.first_name).into(),
                Some(r.last_name).into(),
                r.position.into(),
                Some(r.district).into(),
                Some(r.party).into(),
                Some(r.city).into(),
                Some(r.madison_office).into(),
                Some(r.telephones).into(),
                r.fax.into(),
                r.district_phone.into(),
                Some(r.email).into(),
                r.district_address.into(),
                r.voting_address.into(),
                r.staff.into(),
                r.positioned_committees.into(),
                r.committees.into(),
                r.biography.into(),
            ],
        )
    }
}

impl From<CommitteeRecord> for NormalizedRecord {
    fn from(r: CommitteeRecord) -> Self {
        NormalizedRecord::new(
            Schema::Committee,
            vec![
                r.header.into(),
                r.chair.into(),
                r.co_chair.into(),
                r.vice_chair.into(),
                r.committee_clerk.into(),
                r.council_staff.into(),
                r.members.into(),
                r.other_members.into(),
                r.hearings.into(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;

    #[test]
    fn staff_tag_suppressed_when_conventional() {
        let staff = staff_entries("Mary Smith\nmary.smith@example.org\nTom Jones\ntj@example.org\n");
        assert_eq!(staff, ["Mary Smith", "Tom Jones;tj"]);
    }

    #[test]
    fn staff_unpaired_tail_dropped() {
        let staff = staff_entries("\nAnn Lee\nAnn.Lee@legis.wisconsin.gov\n\nBo Park\n");
        assert_eq!(staff, ["Ann Lee"]);
    }

    #[test]
    fn committees_routed_by_closing_paren() {
        let (positioned, plain) =
            split_committees("\nJoint Committee on Finance (Co-Chair)\nAssembly Committee on Health\n");
        assert_eq!(positioned, ["Joint Committee on Finance (Co-Chair)"]);
        assert_eq!(plain, ["Assembly Committee on Health"]);
    }

    #[test]
    fn email_tag_is_local_part() {
        assert_eq!(email_tag("Rep.Smith@legis.wisconsin.gov"), "Rep.Smith");
        assert_eq!(email_tag("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn empty_capture_set_gives_nulls() {
        let c = CaptureSet::empty(Schema::Committee);
        let rec: NormalizedRecord = assemble_committee(&c, Roster::new()).into();
        assert_eq!(rec.len(), 9);
        assert!(rec.fields().iter().all(Field::is_null));
    }

    #[test]
    fn legislator_email_split_is_opt_in() {
        let mut c = CaptureSet::empty(Schema::Legislator);
        c.set(Slot::Email, "Rep.Smith@legis.wisconsin.gov", 0..29);
        let kept = assemble_legislator(&c, &Settings::default());
        assert_eq!(kept.email, "Rep.Smith@legis.wisconsin.gov");
        let settings = Settings {
            split_email_tags: true,
            ..Settings::default()
        };
        assert_eq!(assemble_legislator(&c, &settings).email, "Rep.Smith");
    }

    #[test]
    fn hid_from_chamber_and_district() {
        let mut c = CaptureSet::empty(Schema::Legislator);
        c.set(Slot::Chamber, "Assembly", 0..8);
        c.set(Slot::District, "31", 18..20);
        assert_eq!(assemble_legislator(&c, &Settings::default()).hid(), "A31");
        c.set(Slot::Chamber, "Senate", 0..6);
        c.set(Slot::District, "8", 16..17);
        assert_eq!(assemble_legislator(&c, &Settings::default()).hid(), "S8");
    }

    #[test]
    fn legislator_flattens_to_seventeen_fields() {
        let c = CaptureSet::empty(Schema::Legislator);
        let rec: NormalizedRecord = assemble_legislator(&c, &Settings::default()).into();
        assert_eq!(rec.len(), 17);
        assert!(rec.get("staff").unwrap().is_null());
    }
}
