//! Tolerant line-oriented parser for plain-text ("txt"-style) IPTV
//! playlists.
//!
//! The format is informal and frequently malformed in the wild:
//!
//! ```text
//! 央视,#genre#
//! CCTV1,http://a/1#http://a/2
//! CCTV2,http://b/1
//! ```
//!
//! A group marker is any line containing `#genre#`; channel lines carry a
//! name and one or more `#`-joined URLs. Lines that fit neither shape are
//! skipped, never reported: the contract is a best-effort catalog from
//! whatever well-formed fragments exist.

use std::collections::HashMap;

use crate::alias::AliasResolver;
use crate::catalog::{Channel, ChannelGroup, ChannelGroupList, ChannelLine};

/// Group assigned to channel lines that appear before any group marker.
pub const FALLBACK_GROUP: &str = "Other";

const GROUP_MARKER: &str = "#genre#";

/// Playlists are split on ASCII and full-width commas alike.
const FIELD_SEPARATORS: [char; 2] = [',', '，'];

/// True iff `text` looks like a txt playlist this parser understands.
/// M3U documents are a different format, handled elsewhere.
pub fn is_supported(text: &str) -> bool {
    text.contains(GROUP_MARKER)
}

/// One channel line after the multi-URL split; discarded after grouping.
struct RawRecord {
    name: String,
    group_name: String,
    url: String,
}

/// Parses `text` into a grouped, deduplicated catalog. Never fails:
/// malformed lines are dropped and an empty result is legitimate.
pub fn parse(text: &str, resolver: &AliasResolver) -> ChannelGroupList {
    parse_with_fallback(text, resolver, FALLBACK_GROUP)
}

/// Like [`parse`], with a caller-supplied label for the ungrouped bucket
/// (hosts localize it; the default is [`FALLBACK_GROUP`]).
pub fn parse_with_fallback(
    text: &str,
    resolver: &AliasResolver,
    fallback_group: &str,
) -> ChannelGroupList {
    let mut records: Vec<RawRecord> = Vec::new();
    let mut current_group: Option<String> = None;

    for line in text.lines() {
        if line.trim().is_empty() || line.starts_with("//") {
            continue;
        }

        if line.contains(GROUP_MARKER) {
            // An empty field before the marker clears the group; subsequent
            // channels land in the fallback bucket.
            current_group = line
                .split(FIELD_SEPARATORS)
                .next()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned);
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let mut fields = line.split(FIELD_SEPARATORS);
        let name = match fields.next() {
            Some(field) => field.trim(),
            None => continue,
        };
        let urls = match fields.next() {
            Some(field) => field,
            None => continue, // fewer than two fields: malformed
        };

        let group_name = current_group.as_deref().unwrap_or(fallback_group);
        for url in urls.split('#') {
            records.push(RawRecord {
                name: name.to_owned(),
                group_name: group_name.to_owned(),
                url: url.trim().to_owned(),
            });
        }
    }

    assemble(records, resolver)
}

fn assemble(records: Vec<RawRecord>, resolver: &AliasResolver) -> ChannelGroupList {
    group_preserving_order(records, |record| &record.group_name)
        .into_iter()
        .map(|(group_name, records)| ChannelGroup {
            name: group_name,
            channels: group_preserving_order(records, |record| &record.name)
                .into_iter()
                .map(|(name, records)| build_channel(name, records, resolver))
                .collect(),
        })
        .collect()
}

fn build_channel(name: String, records: Vec<RawRecord>, resolver: &AliasResolver) -> Channel {
    let standard_name = resolver.standardize(&name);
    // Same raw field as standard_name today, but kept as its own lookup so a
    // future format can feed a distinct EPG name through here.
    let epg_source = records.first().map(|r| r.name.as_str()).unwrap_or(&name);
    let epg_name = resolver.standardize(epg_source);

    let mut seen = Vec::new();
    let mut lines = Vec::new();
    for record in records {
        if !seen.contains(&record.url) {
            seen.push(record.url.clone());
            lines.push(ChannelLine { url: record.url });
        }
    }

    Channel {
        name,
        standard_name,
        epg_name,
        lines,
    }
}

/// Buckets `items` by key, keys in first-occurrence order, items in input
/// order within each bucket.
fn group_preserving_order<T, F>(items: Vec<T>, key: F) -> Vec<(String, Vec<T>)>
where
    F: Fn(&T) -> &str,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item).to_owned();
        match index.get(&k) {
            Some(&i) => buckets[i].1.push(item),
            None => {
                index.insert(k.clone(), buckets.len());
                buckets.push((k, vec![item]));
            }
        }
    }
    buckets
}
