//! Channel name alias resolution.
//!
//! Observed channel names vary wildly across playlist sources ("CCTV-1高清",
//! "CCTV1综合", "央视一套" ...). This module maps them to one canonical name
//! using an alias table: a JSON object of canonical name -> known spellings,
//! with the reserved `"__suffix"` key listing suffixes to strip before
//! matching. Two tables are consulted: a user table that the host may
//! replace at runtime, and a bundled default table. Resolutions are memoized
//! in a bounded LRU cache that is cleared whenever the user table changes.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use once_cell::sync::Lazy;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::AliasTableError;

/// Reserved alias-table key whose value is the suffix-strip list.
pub const SUFFIX_KEY: &str = "__suffix";

/// Default upper bound on cached name resolutions.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

static DEFAULT_TABLE: Lazy<AliasTable> = Lazy::new(|| {
    AliasTable::from_json(include_str!("../assets/channel_name_alias.json"))
        .expect("bundled channel_name_alias.json is well-formed")
});

/// Alias table: canonical name -> known alternate spellings.
///
/// Entries keep the document order of the JSON source. Lookups are
/// first-match, so reordering entries can change which canonical name wins
/// for an ambiguous alias; `HashMap` is deliberately not used here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<(String, Vec<String>)>,
    suffixes: Vec<String>,
}

impl AliasTable {
    /// Parses a table from its JSON source, e.g.
    /// `{"CCTV1": ["CCTV-1"], "__suffix": ["高清"]}`.
    pub fn from_json(source: &str) -> Result<Self, AliasTableError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Appends an entry, keeping it behind all existing entries.
    pub fn insert(&mut self, canonical: impl Into<String>, aliases: Vec<String>) {
        self.entries.push((canonical.into(), aliases));
    }

    /// Appends a suffix to the strip list.
    pub fn add_suffix(&mut self, suffix: impl Into<String>) {
        self.suffixes.push(suffix.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.suffixes.is_empty()
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// First-match lookup: a key equal to `lowered` wins over an entry whose
    /// alias list contains it. `lowered` must already be lowercased.
    fn find(&self, lowered: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == lowered)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(_, aliases)| aliases.iter().any(|a| a.to_lowercase() == lowered))
            })
            .map(|(key, _)| key.as_str())
    }
}

impl<'de> Deserialize<'de> for AliasTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = AliasTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of canonical names to alias arrays")
            }

            fn visit_map<A>(self, mut map: A) -> Result<AliasTable, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut table = AliasTable::default();
                while let Some((key, values)) = map.next_entry::<String, Vec<String>>()? {
                    if key == SUFFIX_KEY {
                        table.suffixes = values;
                    } else {
                        table.entries.push((key, values));
                    }
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

impl Serialize for AliasTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let extra = usize::from(!self.suffixes.is_empty());
        let mut map = serializer.serialize_map(Some(self.entries.len() + extra))?;
        for (key, aliases) in &self.entries {
            map.serialize_entry(key, aliases)?;
        }
        if !self.suffixes.is_empty() {
            map.serialize_entry(SUFFIX_KEY, &self.suffixes)?;
        }
        map.end()
    }
}

/// Resolver tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Cached resolutions kept before LRU eviction kicks in.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

struct ResolverState {
    user_table: AliasTable,
    cache: LruCache<String, String>,
}

/// Maps raw channel names to canonical names.
///
/// `standardize` is synchronous and cheap after warm-up; `refresh` may run
/// concurrently from another thread. The user table and the cache live
/// behind one mutex so a `standardize` call sees either the fully-old or
/// the fully-new table, never a half-swapped view or a stale cache entry.
pub struct AliasResolver {
    default_table: AliasTable,
    state: Mutex<ResolverState>,
}

impl AliasResolver {
    /// Bundled default table, empty user table.
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self::with_tables(DEFAULT_TABLE.clone(), config)
    }

    /// Replaces the bundled default table; used by hosts that ship their own
    /// and by tests.
    pub fn with_tables(default_table: AliasTable, config: ResolverConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity.max(1))
            .expect("capacity clamped to at least 1");
        Self {
            default_table,
            state: Mutex::new(ResolverState {
                user_table: AliasTable::default(),
                cache: LruCache::new(capacity),
            }),
        }
    }

    /// Returns the canonical name for `name`, or `name` unchanged when no
    /// alias matches. Never fails.
    ///
    /// Match order: strip suffixes (user list first, then default list, each
    /// in document order), then search case-insensitively through user keys,
    /// user aliases, default keys, default aliases, first hit wins.
    pub fn standardize(&self, name: &str) -> String {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(hit) = state.cache.get(name) {
            return hit.clone();
        }

        let resolved = {
            let mut stripped = name;
            for suffix in state
                .user_table
                .suffixes()
                .iter()
                .chain(self.default_table.suffixes())
            {
                stripped = stripped.strip_suffix(suffix.as_str()).unwrap_or(stripped);
            }
            let lowered = stripped.trim().to_lowercase();

            state
                .user_table
                .find(&lowered)
                .or_else(|| self.default_table.find(&lowered))
                .map(str::to_owned)
                // No alias anywhere: the original, un-stripped name stands.
                .unwrap_or_else(|| name.to_owned())
        };

        state.cache.put(name.to_owned(), resolved.clone());
        if resolved != name {
            tracing::debug!("standardize({}): {} -> {}", state.cache.len(), name, resolved);
        }
        resolved
    }

    /// Replaces the user table from its JSON source, dropping every cached
    /// resolution. A malformed source degrades to an empty user table;
    /// resolution then falls back to the default table alone.
    pub fn refresh(&self, source: &str) {
        let table = AliasTable::from_json(source).unwrap_or_else(|err| {
            tracing::warn!("failed to parse user alias table: {}", err);
            AliasTable::default()
        });
        self.refresh_with(table);
    }

    /// Swaps in an already-built user table. Cache clear and table swap
    /// happen under one lock acquisition.
    pub fn refresh_with(&self, table: AliasTable) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.cache.clear();
        state.user_table = table;
    }

    pub fn user_table_is_empty(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.user_table.is_empty()
    }

    /// Number of cached resolutions, bounded by the configured capacity.
    pub fn cache_len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.cache.len()
    }
}

impl Default for AliasResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(user_json: &str, default_json: &str) -> AliasResolver {
        let default_table = AliasTable::from_json(default_json).unwrap();
        let resolver = AliasResolver::with_tables(default_table, ResolverConfig::default());
        resolver.refresh(user_json);
        resolver
    }

    #[test]
    fn test_suffix_strip_then_alias_match() {
        let resolver = resolver_with(
            r#"{"CCTV1": ["CCTV-1"], "__suffix": ["高清"]}"#,
            "{}",
        );
        assert_eq!(resolver.standardize("CCTV-1高清"), "CCTV1");
    }

    #[test]
    fn test_key_match_is_case_insensitive() {
        let resolver = resolver_with(r#"{"CCTV1": []}"#, "{}");
        assert_eq!(resolver.standardize("cctv1"), "CCTV1");
    }

    #[test]
    fn test_unresolved_name_passes_through_unstripped() {
        let resolver = resolver_with(r#"{"__suffix": ["高清"]}"#, "{}");
        // The suffix is stripped for matching only; with no alias hit the
        // original input comes back whole.
        assert_eq!(resolver.standardize("某地方台高清"), "某地方台高清");
    }

    #[test]
    fn test_standardize_is_idempotent_for_unresolved_names() {
        let resolver = resolver_with("{}", "{}");
        let once = resolver.standardize("Unknown Channel");
        assert_eq!(resolver.standardize(&once), once);
    }

    #[test]
    fn test_user_key_beats_default_alias() {
        let resolver = resolver_with(
            r#"{"UserCanon": []}"#,
            r#"{"DefaultCanon": ["usercanon"]}"#,
        );
        assert_eq!(resolver.standardize("USERCANON"), "UserCanon");
    }

    #[test]
    fn test_user_alias_beats_default_key() {
        let resolver = resolver_with(
            r#"{"UserCanon": ["shared"]}"#,
            r#"{"shared": []}"#,
        );
        assert_eq!(resolver.standardize("Shared"), "UserCanon");
    }

    #[test]
    fn test_key_tier_beats_alias_tier_within_one_table() {
        // "b" is both a key and an alias of "A"; the key tier is searched
        // across the whole table first.
        let resolver = resolver_with(r#"{"A": ["b"], "b": []}"#, "{}");
        assert_eq!(resolver.standardize("B"), "b");
    }

    #[test]
    fn test_first_entry_wins_for_ambiguous_alias() {
        let resolver = resolver_with(r#"{"First": ["x"], "Second": ["x"]}"#, "{}");
        assert_eq!(resolver.standardize("x"), "First");
    }

    #[test]
    fn test_user_suffixes_apply_before_default_suffixes() {
        let resolver = resolver_with(
            r#"{"Canon": ["name"], "__suffix": ["-u"]}"#,
            r#"{"__suffix": ["-d"]}"#,
        );
        // "-u" strips first, exposing "-d" as the new tail.
        assert_eq!(resolver.standardize("name-d-u"), "Canon");
    }

    #[test]
    fn test_refresh_invalidates_cache() {
        let resolver = resolver_with("{}", "{}");
        assert_eq!(resolver.standardize("CCTV-1"), "CCTV-1");
        assert_eq!(resolver.cache_len(), 1);

        resolver.refresh(r#"{"CCTV1": ["CCTV-1"]}"#);
        assert_eq!(resolver.cache_len(), 0);
        assert_eq!(resolver.standardize("CCTV-1"), "CCTV1");
    }

    #[test]
    fn test_malformed_user_table_degrades_to_default_only() {
        let resolver = resolver_with("not json at all", r#"{"CCTV1": ["CCTV-1"]}"#);
        assert!(resolver.user_table_is_empty());
        assert_eq!(resolver.standardize("CCTV-1"), "CCTV1");
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let default_table = AliasTable::default();
        let resolver =
            AliasResolver::with_tables(default_table, ResolverConfig { cache_capacity: 2 });
        resolver.standardize("a");
        resolver.standardize("b");
        resolver.standardize("c");
        assert_eq!(resolver.cache_len(), 2);
    }

    #[test]
    fn test_bundled_default_table_resolves_cctv() {
        let resolver = AliasResolver::new();
        assert_eq!(resolver.standardize("CCTV-1"), "CCTV1");
        assert_eq!(resolver.standardize("CCTV-1高清"), "CCTV1");
        assert_eq!(resolver.standardize("央视五套"), "CCTV5");
    }

    #[test]
    fn test_table_json_round_trip_keeps_order() {
        let table = AliasTable::from_json(
            r#"{"Z": ["z1"], "A": ["a1"], "__suffix": ["s"]}"#,
        )
        .unwrap();
        let json = serde_json::to_string(&table).unwrap();
        let reparsed = AliasTable::from_json(&json).unwrap();
        assert_eq!(table, reparsed);
    }

    #[test]
    fn test_from_json_reports_bad_source() {
        assert!(AliasTable::from_json("[1, 2, 3]").is_err());
    }
}
