//! The navigation controller: a state machine over injected DOM, fetch,
//! timer, and failure-counter dependencies.
//!
//! Two entry points matter. `navigate` handles intercepted link activations:
//! fetch the envelope, apply it, push history state, and on any failure fall
//! back to a full browser navigation so the page is never left broken.
//! `handle_popstate` handles back/forward traffic, where falling back is not
//! an option (the browser already moved); instead failures escalate through
//! a persisted counter and exponentially backed-off full reloads, capped at
//! `MAX_POPSTATE_ATTEMPTS`, after which an inline error with a manual reload
//! link is the terminal state.
//!
//! Navigations are stamped with a sequence number; a fetch that resolves
//! after a newer navigation has started is ignored (ignore-stale policy,
//! no fetch aborting).

use async_trait::async_trait;
use milkcrate_common::fragment::{strip_style_wrapper, FragmentEnvelope, MetaTag};
use milkcrate_common::html;
use tracing::{debug, warn};

/// First popstate-failure reload fires after this delay; each subsequent
/// failure doubles it.
pub const BASE_RELOAD_DELAY_MS: u64 = 500;

/// Popstate failures are capped here; the 4th renders the inline error
/// instead of scheduling another reload, breaking any reload loop against
/// a persistently broken backend.
pub const MAX_POPSTATE_ATTEMPTS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed with status {0}")]
    Status(u16),
    #[error("response was not fragment JSON")]
    WrongContentType,
    #[error("could not parse fragment envelope: {0}")]
    Parse(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Fetches a fragment envelope for a URL, sending the handshake header.
/// The adapter owns content-type checking and JSON parsing; every failure
/// mode surfaces as a `FetchError`.
#[async_trait(?Send)]
pub trait FragmentFetcher {
    async fn fetch_fragment(&self, url: &str) -> Result<FragmentEnvelope, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The current document has no `<main>` anchor. Structural, not
    /// transient: never retried.
    #[error("document has no <main> element")]
    MissingMain,
}

/// Thin adapter over the live document. Implementations do the actual DOM
/// mutation; the controller only decides what to mutate and when.
pub trait DomSurface {
    /// Replace `<main>`'s content with the envelope HTML.
    fn swap_main(&mut self, html: &str) -> Result<(), DomError>;

    fn set_title(&mut self, title: &str);

    /// Reconcile head metas: remove every previously fragment-managed
    /// `og:*` meta first, then find-or-create each entry by its `property`
    /// or `name` selector and set its content. An empty set leaves the
    /// metas cleared.
    fn set_meta(&mut self, meta: &[MetaTag]);

    /// Maintain the single critical-styles `<style>` element (id
    /// `fragment-critical-styles`): `Some` sets its text (creating the
    /// element if absent), `None` removes it.
    fn set_critical_styles(&mut self, css: Option<&str>);

    /// Render the terminal inline error into `<main>`.
    fn render_error(&mut self, html: &str) -> Result<(), DomError>;

    fn push_state(&mut self, url: &str);

    /// Full browser navigation (`location.href = url`).
    fn navigate_full(&mut self, url: &str);
}

/// The popstate failure counter, persisted in session storage so it
/// survives the reloads it causes.
pub trait FailureStore {
    fn count(&self) -> u32;
    fn set_count(&mut self, count: u32);
    fn clear(&mut self);
}

pub type TimerId = u64;

/// Schedules the delayed full reloads used by popstate recovery.
pub trait TimerHost {
    fn schedule_reload(&mut self, delay_ms: u64) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Idle,
    Navigating,
    /// Terminal: the inline error is showing, recovery is manual.
    ErrorShown,
}

pub struct NavController<D, F, S, T>
where
    D: DomSurface,
    F: FragmentFetcher,
    S: FailureStore,
    T: TimerHost,
{
    dom: D,
    fetcher: F,
    failures: S,
    timers: T,
    state: NavState,
    started: bool,
    nav_seq: u64,
    /// Cancel handles for reloads scheduled by popstate failures, so the
    /// terminal error state can cancel them en masse.
    pending_reloads: Vec<TimerId>,
}

impl<D, F, S, T> NavController<D, F, S, T>
where
    D: DomSurface,
    F: FragmentFetcher,
    S: FailureStore,
    T: TimerHost,
{
    pub fn new(dom: D, fetcher: F, failures: S, timers: T) -> Self {
        NavController {
            dom,
            fetcher,
            failures,
            timers,
            state: NavState::Idle,
            started: false,
            nav_seq: 0,
            pending_reloads: Vec::new(),
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Mark the controller live. Returns `true` exactly once: the caller
    /// attaches the document-level popstate listener only on that first
    /// call, so repeated mounts never stack listeners.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    /// Reverse of `start`. Returns `true` if the popstate listener should
    /// be detached.
    pub fn stop(&mut self) -> bool {
        if !self.started {
            return false;
        }
        self.started = false;
        true
    }

    /// Intercepted link activation: fragment-navigate to `url`.
    pub async fn navigate(&mut self, url: &str) {
        let seq = self.begin_navigation();
        let result = self.fetcher.fetch_fragment(url).await;
        self.finish_link_navigation(seq, url, result);
    }

    /// Back/forward traversal landed on `url`. Cross-origin or non-rooted
    /// targets (including protocol-relative `//host/...` URLs) are not ours
    /// to handle.
    pub async fn handle_popstate(&mut self, url: &str) {
        if !crate::activation::is_rooted_path(url) {
            return;
        }
        let seq = self.begin_navigation();
        let result = self.fetcher.fetch_fragment(url).await;
        self.finish_popstate(seq, url, result);
    }

    fn begin_navigation(&mut self) -> u64 {
        self.state = NavState::Navigating;
        self.nav_seq += 1;
        self.nav_seq
    }

    fn is_stale(&self, seq: u64, url: &str) -> bool {
        if seq != self.nav_seq {
            debug!("dropping stale fragment resolution for {url}");
            return true;
        }
        false
    }

    fn finish_link_navigation(
        &mut self,
        seq: u64,
        url: &str,
        result: Result<FragmentEnvelope, FetchError>,
    ) {
        if self.is_stale(seq, url) {
            return;
        }
        match result {
            Ok(envelope) => match self.apply_envelope(&envelope) {
                Ok(()) => {
                    self.dom.push_state(url);
                    self.state = NavState::Idle;
                }
                Err(DomError::MissingMain) => {
                    warn!("no <main> anchor, falling back to full navigation for {url}");
                    self.dom.navigate_full(url);
                }
            },
            Err(err) => {
                warn!("fragment fetch for {url} failed ({err}), falling back to full navigation");
                self.dom.navigate_full(url);
            }
        }
    }

    fn finish_popstate(
        &mut self,
        seq: u64,
        url: &str,
        result: Result<FragmentEnvelope, FetchError>,
    ) {
        if self.is_stale(seq, url) {
            return;
        }
        match result {
            Ok(envelope) => {
                self.failures.clear();
                match self.apply_envelope(&envelope) {
                    // The browser already moved history: no push_state here.
                    Ok(()) => self.state = NavState::Idle,
                    Err(DomError::MissingMain) => {
                        warn!("no <main> anchor on popstate, falling back to full navigation");
                        self.dom.navigate_full(url);
                    }
                }
            }
            Err(err) => self.on_popstate_failure(url, err),
        }
    }

    fn apply_envelope(&mut self, envelope: &FragmentEnvelope) -> Result<(), DomError> {
        self.dom.swap_main(&envelope.html)?;
        self.dom.set_title(&envelope.title);
        self.dom.set_meta(&envelope.meta);
        match &envelope.styles {
            Some(styles) => {
                let css = strip_style_wrapper(styles);
                self.dom.set_critical_styles(Some(&css));
            }
            None => self.dom.set_critical_styles(None),
        }
        Ok(())
    }

    fn on_popstate_failure(&mut self, url: &str, err: FetchError) {
        let count = (self.failures.count() + 1).min(MAX_POPSTATE_ATTEMPTS);
        self.failures.set_count(count);
        warn!(
            "popstate fragment fetch for {url} failed (attempt {count}/{}): {err}",
            MAX_POPSTATE_ATTEMPTS
        );

        if count >= MAX_POPSTATE_ATTEMPTS {
            // Terminal: cancel every pending reload so none fires after the
            // error UI takes over, reset the counter, show the error.
            for id in self.pending_reloads.drain(..) {
                self.timers.cancel(id);
            }
            self.failures.clear();
            self.state = NavState::ErrorShown;
            if self.dom.render_error(&error_markup(url)).is_err() {
                self.dom.navigate_full(url);
            }
        } else {
            let delay = BASE_RELOAD_DELAY_MS * 2u64.pow(count - 1);
            let id = self.timers.schedule_reload(delay);
            self.pending_reloads.push(id);
        }
    }
}

fn error_markup(url: &str) -> String {
    format!(
        "<p class=\"nav-error\">Could not load this page. \
         <a href=\"{}\">Reload</a></p>",
        html::escape(url)
    )
}
