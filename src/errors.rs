use thiserror::Error;

/// Errors from loading an alias table out of its JSON source.
///
/// The parser and resolver themselves never fail on bad data: malformed
/// playlist lines are dropped and a malformed user alias table degrades to
/// an empty one. This type only surfaces from [`AliasTable::from_json`]
/// for callers that load the source themselves and want the diagnostic.
///
/// [`AliasTable::from_json`]: crate::alias::AliasTable::from_json
#[derive(Debug, Error)]
pub enum AliasTableError {
    /// The source is not a JSON object mapping names to string arrays.
    #[error("alias table is not a JSON object of string arrays: {0}")]
    Json(#[from] serde_json::Error),
}
