//! Committee listings from the legislature's RSS feeds.

use anyhow::{Context, Result};
use quick_xml::events::Event;
use serde::Serialize;
use tracing::{debug, info};

/// Which feed a committee came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CommitteeKind {
    Senate,
    Assembly,
    Joint,
    Other,
}

impl CommitteeKind {
    pub fn name(self) -> &'static str {
        match self {
            CommitteeKind::Senate => "Senate",
            CommitteeKind::Assembly => "Assembly",
            CommitteeKind::Joint => "Joint",
            CommitteeKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// What the store keeps per committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitteeMeta {
    pub name: String,
    pub kind: CommitteeKind,
    pub link: String,
}

/// Joint feeds also carry audit reports and meeting documents.
const JOINT_DESCRIPTION_NOISE: &str = "records";
const JOINT_TITLE_NOISE: &[&str] = &[
    "Presentation",
    "Report",
    "Proceedings",
    "Minutes",
    "Proposed",
    "Audio",
    "Agenda",
];

#[derive(Clone, Copy)]
enum ItemField {
    Title,
    Link,
    Description,
}

/// Parse an RSS document and return its `<item>` entries in order.
pub fn parse_items(xml: &str) -> Result<Vec<FeedItem>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut items = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut field: Option<ItemField> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => current = Some(FeedItem::default()),
                b"title" if current.is_some() => field = Some(ItemField::Title),
                b"link" if current.is_some() => field = Some(ItemField::Link),
                b"description" if current.is_some() => field = Some(ItemField::Description),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    push_text(item, f, &e.unescape()?);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    push_text(item, f, &String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"item" => {
                    if let Some(mut item) = current.take() {
                        item.title = item.title.trim().to_string();
                        item.link = item.link.trim().to_string();
                        item.description = item.description.trim().to_string();
                        items.push(item);
                    }
                    field = None;
                }
                b"title" | b"link" | b"description" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Malformed feed at byte {}", reader.buffer_position())
                })
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(items)
}

fn push_text(item: &mut FeedItem, field: ItemField, text: &str) {
    let target = match field {
        ItemField::Title => &mut item.title,
        ItemField::Link => &mut item.link,
        ItemField::Description => &mut item.description,
    };
    target.push_str(text);
}

/// Whether a feed item describes a committee. The description carries the
/// committee name, so an empty one is useless for every kind.
pub fn keep_item(item: &FeedItem, kind: CommitteeKind) -> bool {
    if item.description.is_empty() {
        return false;
    }
    if kind == CommitteeKind::Joint {
        if item.description.contains(JOINT_DESCRIPTION_NOISE) {
            return false;
        }
        if JOINT_TITLE_NOISE.iter().any(|w| item.title.contains(w)) {
            return false;
        }
    }
    true
}

pub fn committee_metadata(xml: &str, kind: CommitteeKind) -> Result<Vec<CommitteeMeta>> {
    let items = parse_items(xml)?;
    let total = items.len();
    let kept: Vec<CommitteeMeta> = items
        .into_iter()
        .filter(|item| {
            let keep = keep_item(item, kind);
            if !keep {
                debug!(title = %item.title, "feed item skipped");
            }
            keep
        })
        .map(|item| CommitteeMeta {
            name: item.description,
            kind,
            link: item.link,
        })
        .collect();
    info!("{} feed: {} of {} items are committees", kind.name(), kept.len(), total);
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/joint_feed.xml").unwrap()
    }

    #[test]
    fn parses_items_not_channel() {
        let items = parse_items(&fixture()).unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].description, "Joint Committee on Finance");
        assert_eq!(items[0].link, "https://docs.legis.wisconsin.gov/2015/committees/joint/jcf");
        assert_eq!(items[1].description, "Joint Committee for Review of Administrative Rules");
    }

    #[test]
    fn joint_filter() {
        let meta = committee_metadata(&fixture(), CommitteeKind::Joint).unwrap();
        let names: Vec<_> = meta.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Joint Committee on Finance",
                "Joint Committee for Review of Administrative Rules"
            ]
        );
    }

    #[test]
    fn other_kinds_only_drop_empty_descriptions() {
        let meta = committee_metadata(&fixture(), CommitteeKind::Senate).unwrap();
        assert_eq!(meta.len(), 5);
        assert!(meta.iter().all(|m| m.kind == CommitteeKind::Senate));
    }

    #[test]
    fn malformed_feed_is_an_error() {
        assert!(parse_items("<rss><channel><item><title>x</link></item>").is_err());
    }
}
