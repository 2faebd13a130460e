//! Catalog-building core for plain-text IPTV playlists.
//!
//! Two pieces, composed by a caller that owns all I/O:
//!
//! - [`parser`] turns raw playlist text into a grouped, deduplicated
//!   [`catalog::ChannelGroupList`];
//! - [`alias`] canonicalizes channel names through a replaceable alias
//!   table with a bounded LRU cache.
//!
//! ```
//! use iptv_catalog::{alias::AliasResolver, parser};
//!
//! let resolver = AliasResolver::new();
//! let text = "央视,#genre#\nCCTV-1高清,http://a/1#http://a/2\n";
//! assert!(parser::is_supported(text));
//! let catalog = parser::parse(text, &resolver);
//! assert_eq!(catalog[0].channels[0].standard_name, "CCTV1");
//! ```
//!
//! Fetching playlist text, persisting the user alias table, and rendering
//! the catalog are the host application's business, not this crate's.

pub mod alias;
pub mod catalog;
pub mod errors;
pub mod parser;
