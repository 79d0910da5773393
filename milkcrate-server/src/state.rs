use std::sync::Arc;

use milkcrate_core::store::ObjectStore;

use crate::auth::AdminAuth;

/// Shared server state. The store is the only I/O dependency; everything
/// else is derived per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    /// Public base URL of the bucket, prefixed onto raw keys to form track
    /// and cover URLs.
    pub media_base: String,
    pub admin: AdminAuth,
}
