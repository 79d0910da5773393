//! Fragment navigation client.
//!
//! The state machine behind milkcrate's client-side navigation: intercept
//! link activations, fetch fragment envelopes, apply them to the document,
//! and recover from popstate fetch failures with a bounded reload backoff.
//!
//! Everything here is platform-neutral. The DOM, fetch, timers, and the
//! persisted failure counter are injected as traits, so the controller runs
//! under any component model (custom element, wasm framework, tests) and
//! multiple independent instances never leak global state.

pub mod activation;
pub mod controller;

pub use activation::{
    classify_activation, is_rooted_path, link_accessibility, ActivationDecision, LinkActivation,
};
pub use controller::{
    DomError, DomSurface, FailureStore, FetchError, FragmentFetcher, NavController, NavState,
    TimerHost, TimerId, BASE_RELOAD_DELAY_MS, MAX_POPSTATE_ATTEMPTS,
};
