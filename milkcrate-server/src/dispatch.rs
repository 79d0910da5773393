//! First-match-wins route table.
//!
//! Routes are tried strictly in registration order. Because a trailing
//! `:param` captures the remainder of the path, more specific routes must
//! be registered before the general ones they overlap with. The table is
//! built in one place ([`route_table`]) so that ordering is auditable.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use milkcrate_common::routes::{match_pattern, RouteParams};
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::state::AppState;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;
pub type Handler = Arc<dyn Fn(AppState, RouteParams, Request) -> HandlerFuture + Send + Sync>;

struct Route {
    method: Method,
    pattern: String,
    handler: Handler,
}

/// Ordered route list. Cloning shares the underlying routes.
#[derive(Clone)]
pub struct RouteTable {
    routes: Arc<Vec<Route>>,
}

impl RouteTable {
    pub async fn dispatch(&self, state: AppState, req: Request) -> Response {
        let path = req.uri().path().to_string();
        for route in self.routes.iter() {
            if route.method != req.method() {
                continue;
            }
            if let Some(params) = match_pattern(&route.pattern, &path) {
                return (route.handler)(state, params, req).await;
            }
        }
        (StatusCode::NOT_FOUND, "not found").into_response()
    }
}

#[derive(Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<H, F>(mut self, method: Method, pattern: &str, handler: H) -> Self
    where
        H: Fn(AppState, RouteParams, Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            handler: Arc::new(move |state, params, req| Box::pin(handler(state, params, req))),
        });
        self
    }

    pub fn build(self) -> RouteTable {
        RouteTable {
            routes: Arc::new(self.routes),
        }
    }
}

/// The full route table in its required order. Specific routes first:
/// `/artists/:artist_id` would otherwise swallow every path under
/// `/artists/` because its trailing parameter is greedy.
pub fn route_table() -> RouteTable {
    RouteTableBuilder::new()
        .add(Method::GET, "/_json", handlers::root_export)
        .add(Method::GET, "/", handlers::home)
        .add(Method::POST, "/", handlers::upload)
        .add(Method::GET, "/admin", handlers::admin)
        .add(Method::GET, "/search", handlers::search_page)
        .add(Method::GET, "/schema/scoped-export.json", handlers::schema_doc)
        .add(
            Method::GET,
            "/artists/:artist_id/albums/:album_id/cover",
            handlers::album_cover,
        )
        .add(
            Method::GET,
            "/artists/:artist_id/albums/:album_id/_json",
            handlers::album_export,
        )
        .add(
            Method::GET,
            "/artists/:artist_id/albums/:album_id",
            handlers::album_page,
        )
        .add(Method::GET, "/artists/:artist_id/_json", handlers::artist_export)
        .add(Method::GET, "/artists/:artist_id", handlers::artist_page)
        .build()
}

/// Wrap the route table in an axum router. Everything goes through the
/// fallback so axum's own path matching never reorders dispatch.
pub fn build_router(state: AppState) -> axum::Router {
    let table = route_table();
    axum::Router::new()
        .fallback(move |req: Request<Body>| {
            let table = table.clone();
            let state = state.clone();
            async move { table.dispatch(state, req).await }
        })
        .layer(CorsLayer::permissive())
}
