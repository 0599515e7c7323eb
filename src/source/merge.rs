//! Precedence merge of flat sources.
//!
//! Sources are applied in order and later sources override earlier ones key
//! by key. A `None` value means "not specified": it never removes a value
//! contributed by an earlier source.

use super::{FlatConfig, SourceMap};
use tracing::debug;

/// Merge nullable sources in order, with later values taking precedence.
///
/// # Example
/// ```
/// use optionset::source::{SourceMap, merge_sources};
///
/// let base: SourceMap = [("a".to_string(), Some("1".to_string()))].into_iter().collect();
/// let overlay: SourceMap = [("a".to_string(), None)].into_iter().collect();
/// let merged = merge_sources([base, overlay]);
/// assert_eq!(merged["a"], "1");
/// ```
pub fn merge_sources<I, S>(sources: I) -> FlatConfig
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = (String, Option<String>)>,
{
    let mut merged = FlatConfig::new();
    let mut count = 0usize;
    for source in sources {
        count += 1;
        for (key, value) in source {
            if let Some(value) = value {
                merged.insert(key, value);
            }
        }
    }
    debug!(sources = count, keys = merged.len(), "Merged option sources");
    merged
}

/// Merge sources that carry no null markers.
///
/// Equivalent to folding [`merge_sources`] over the list.
pub fn merge_flat(sources: impl IntoIterator<Item = FlatConfig>) -> FlatConfig {
    merge_sources(sources.into_iter().map(to_source))
}

/// View a flat config as a nullable source.
pub fn to_source(flat: FlatConfig) -> SourceMap {
    flat.into_iter().map(|(k, v)| (k, Some(v))).collect()
}
