//! Fragment envelope protocol.
//!
//! Every HTML-capable route can answer in two modes: a full document, or a
//! JSON envelope carrying just the `<main>` content plus the head state the
//! client needs to reconcile (title, meta tags, critical styles). The client
//! asks for an envelope by sending the handshake header; the server checks
//! for an exact match, nothing is negotiated via `Accept`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Request header carrying the fragment handshake.
pub const FRAGMENT_HEADER_NAME: &str = "x-milkcrate-fragment";

/// The only value the server recognizes for the handshake header.
pub const FRAGMENT_HEADER_VALUE: &str = "navigation";

/// Element id of the single critical-styles `<style>` block the client
/// maintains in `<head>`.
pub const CRITICAL_STYLES_ID: &str = "fragment-critical-styles";

/// A head `<meta>` tag carried by the envelope. Identified by either
/// `property` (Open Graph) or `name`; the server always sends the complete
/// desired set, never a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
}

impl MetaTag {
    pub fn og(property: &str, content: impl Into<String>) -> Self {
        MetaTag {
            property: Some(property.to_string()),
            name: None,
            content: content.into(),
        }
    }

    pub fn named(name: &str, content: impl Into<String>) -> Self {
        MetaTag {
            property: None,
            name: Some(name.to_string()),
            content: content.into(),
        }
    }
}

/// The wire contract returned by every HTML-capable route when asked for a
/// fragment. `html` is main-content only, no outer document shell. `styles`,
/// if present, is at most one `<style>` wrapper (or bare CSS); producing
/// multiple style blocks is undefined behavior and the server never does it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentEnvelope {
    pub title: String,
    pub html: String,
    #[serde(default)]
    pub meta: Vec<MetaTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,
}

/// Check a request's handshake header value. Exact match only.
pub fn is_fragment_header(value: Option<&str>) -> bool {
    value == Some(FRAGMENT_HEADER_VALUE)
}

fn style_wrapper_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^\s*<style[^>]*>(.*)</style>\s*$").expect("style wrapper regex")
    })
}

/// Strip one outer `<style ...>` wrapper from an envelope's `styles` field,
/// tolerant of attributes on the opening tag. Bare CSS passes through as-is.
pub fn strip_style_wrapper(styles: &str) -> String {
    match style_wrapper_re().captures(styles) {
        Some(caps) => caps[1].to_string(),
        None => styles.to_string(),
    }
}
