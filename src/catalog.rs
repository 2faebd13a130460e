use serde::{Deserialize, Serialize};

/// One playable source URL for a channel. Not to be confused with a text
/// line of the playlist document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLine {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Raw name, first-seen casing from the playlist.
    pub name: String,
    /// Canonical name used for cross-source matching.
    pub standard_name: String,
    /// Canonical name used for EPG lookup. Stored separately from
    /// `standard_name` even though today both come from the same raw field.
    pub epg_name: String,
    /// Deduplicated by URL, first-occurrence order.
    pub lines: Vec<ChannelLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub name: String,
    /// Channel names are unique within a group; first-occurrence order.
    pub channels: Vec<Channel>,
}

/// Groups in first-occurrence order of their name in the source text.
pub type ChannelGroupList = Vec<ChannelGroup>;
