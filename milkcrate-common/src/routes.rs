//! Route pattern matching for the first-match-wins dispatcher.
//!
//! Patterns are `/`-separated segments; `:name` captures one segment, except
//! in final position where it captures the remainder of the path. That
//! trailing greediness is what makes registration order matter: the general
//! `/artists/:artist_id/albums/:album_id` also matches `.../cover`, so the
//! literal cover route has to be registered first. The matcher itself does
//! no specificity ranking.
//!
//! Captured values are raw path segments, still percent-encoded. Decoding
//! (and rejecting empty ids) is the handler's job, so `/artists/` matches
//! with an empty `artist_id` rather than falling through to 404.

use std::collections::HashMap;

/// Named-segment captures from a matched pattern, keyed by parameter name.
pub type RouteParams = HashMap<String, String>;

/// Match a pattern against a request path. Returns captured parameters on
/// a match, `None` otherwise.
pub fn match_pattern(pattern: &str, path: &str) -> Option<RouteParams> {
    let pattern_segments: Vec<&str> = pattern.trim_start_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    let mut params = RouteParams::new();
    for (i, pattern_segment) in pattern_segments.iter().enumerate() {
        let is_last = i == pattern_segments.len() - 1;
        if let Some(name) = pattern_segment.strip_prefix(':') {
            if is_last {
                // Trailing parameter swallows the rest of the path.
                if path_segments.len() <= i {
                    return None;
                }
                params.insert(name.to_string(), path_segments[i..].join("/"));
                return Some(params);
            }
            let segment = path_segments.get(i)?;
            params.insert(name.to_string(), segment.to_string());
        } else {
            let segment = path_segments.get(i)?;
            if segment != pattern_segment {
                return None;
            }
        }
    }

    if path_segments.len() != pattern_segments.len() {
        return None;
    }
    Some(params)
}
