//! Shared wire types and pure logic used by both the server and the
//! navigation client: the fragment envelope protocol, the route pattern
//! matcher, and small HTML helpers. No I/O lives here.

pub mod fragment;
pub mod html;
pub mod routes;

pub use fragment::{
    is_fragment_header, strip_style_wrapper, FragmentEnvelope, MetaTag, CRITICAL_STYLES_ID,
    FRAGMENT_HEADER_NAME, FRAGMENT_HEADER_VALUE,
};
pub use routes::{match_pattern, RouteParams};
