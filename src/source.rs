//! Retrieval source clustering.
//!
//! Collapses the leaf of a path- or URL-like source so that documents from
//! the same area share one `source` label value.

/// Cluster key for sources with no usable identifier.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Derive the cluster key for a retrieval source.
///
/// Drops the last `/`-separated segment when at least one segment remains
/// before it; single-segment inputs are returned unchanged. Trailing
/// slashes are ignored, and a `scheme://` prefix is kept intact so only the
/// part after it is clustered. Clustering is one level deep, not recursive.
///
/// ```rust
/// # use chat_analytics::cluster_source;
/// assert_eq!(cluster_source("example.com/services/s1"), "example.com/services");
/// assert_eq!(cluster_source("example.com"), "example.com");
/// assert_eq!(cluster_source(""), "unknown");
/// ```
pub fn cluster_source(source: &str) -> String {
    let source = source.trim_end_matches('/');
    if source.is_empty() {
        return UNKNOWN_SOURCE.to_string();
    }

    if let Some((scheme, rest)) = source.split_once("://") {
        if !scheme.is_empty() && !rest.is_empty() {
            return format!("{scheme}://{}", collapse_leaf(rest));
        }
    }

    collapse_leaf(source).to_string()
}

/// Cluster an optional source, mapping missing metadata to [`UNKNOWN_SOURCE`].
pub fn cluster_optional_source(source: Option<&str>) -> String {
    source.map_or_else(|| UNKNOWN_SOURCE.to_string(), cluster_source)
}

fn collapse_leaf(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((prefix, _)) if !prefix.is_empty() => prefix,
        _ => path,
    }
}
