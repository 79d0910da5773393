//! Pure decision logic for link activation and link accessibility.
//!
//! The host element forwards click/keydown events here as a plain struct;
//! the returned decision tells it whether to let the browser handle the
//! activation or to run a fragment navigation for an app-local path.

/// A link activation as seen by the host element, already resolved against
/// the document base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkActivation<'a> {
    /// Resolved target: either an absolute URL or an app-local path.
    pub href: &'a str,
    /// The document's origin, e.g. `https://music.example.com`.
    pub current_origin: &'a str,
    /// Any of ctrl/meta/shift/alt held.
    pub modifier: bool,
    /// Primary mouse button, or Enter/Space on the keyboard.
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationDecision {
    /// Do not intercept: modifier click (new tab etc.), non-primary button,
    /// or a target the fragment protocol does not cover.
    BrowserDefault,
    /// Intercept and fragment-navigate to this app-local path.
    Fragment(String),
}

/// Decide what to do with a link activation.
pub fn classify_activation(activation: &LinkActivation<'_>) -> ActivationDecision {
    if activation.modifier || !activation.primary {
        return ActivationDecision::BrowserDefault;
    }

    // App-local path already.
    if is_rooted_path(activation.href) {
        return ActivationDecision::Fragment(activation.href.to_string());
    }

    // Same-origin absolute URL whose remainder is a rooted path.
    if let Some(rest) = activation.href.strip_prefix(activation.current_origin) {
        if is_rooted_path(rest) {
            return ActivationDecision::Fragment(rest.to_string());
        }
    }

    ActivationDecision::BrowserDefault
}

/// A single-slash rooted path. `//host/x` is protocol-relative, so it is a
/// cross-origin URL, not an app-local path.
pub fn is_rooted_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//")
}

/// Accessibility attributes driven by the presence of `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAccessibility {
    pub role: Option<&'static str>,
    pub tabindex: &'static str,
}

/// With an `href` the element acts as a link (`role="link"`, focusable);
/// without one it drops out of the tab order.
pub fn link_accessibility(href: Option<&str>) -> LinkAccessibility {
    match href {
        Some(_) => LinkAccessibility {
            role: Some("link"),
            tabindex: "0",
        },
        None => LinkAccessibility {
            role: None,
            tabindex: "-1",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://music.example.com";

    fn activation(href: &'static str) -> LinkActivation<'static> {
        LinkActivation {
            href,
            current_origin: ORIGIN,
            modifier: false,
            primary: true,
        }
    }

    #[test]
    fn modifier_click_is_left_to_browser() {
        let mut a = activation("/artists/Pixies");
        a.modifier = true;
        assert_eq!(classify_activation(&a), ActivationDecision::BrowserDefault);
    }

    #[test]
    fn non_primary_button_is_left_to_browser() {
        let mut a = activation("/artists/Pixies");
        a.primary = false;
        assert_eq!(classify_activation(&a), ActivationDecision::BrowserDefault);
    }

    #[test]
    fn rooted_path_fragments() {
        assert_eq!(
            classify_activation(&activation("/artists/Pixies")),
            ActivationDecision::Fragment("/artists/Pixies".to_string())
        );
    }

    #[test]
    fn same_origin_absolute_url_fragments() {
        assert_eq!(
            classify_activation(&activation("https://music.example.com/artists/Pixies")),
            ActivationDecision::Fragment("/artists/Pixies".to_string())
        );
    }

    #[test]
    fn cross_origin_is_left_to_browser() {
        assert_eq!(
            classify_activation(&activation("https://elsewhere.example.com/x")),
            ActivationDecision::BrowserDefault
        );
    }

    #[test]
    fn origin_prefix_without_rooted_path_is_left_to_browser() {
        // "https://music.example.common" shares the origin as a string
        // prefix but is a different host.
        assert_eq!(
            classify_activation(&activation("https://music.example.common/x")),
            ActivationDecision::BrowserDefault
        );
    }

    #[test]
    fn protocol_relative_url_is_left_to_browser() {
        assert_eq!(
            classify_activation(&activation("//elsewhere.example.com/x")),
            ActivationDecision::BrowserDefault
        );
        assert_eq!(
            classify_activation(&activation("https://music.example.com//elsewhere.example.com/x")),
            ActivationDecision::BrowserDefault
        );
    }

    #[test]
    fn href_presence_toggles_accessibility() {
        assert_eq!(
            link_accessibility(Some("/x")),
            LinkAccessibility { role: Some("link"), tabindex: "0" }
        );
        assert_eq!(
            link_accessibility(None),
            LinkAccessibility { role: None, tabindex: "-1" }
        );
    }
}
