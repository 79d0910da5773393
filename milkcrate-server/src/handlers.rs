//! Request handlers for the route table.

use std::collections::HashMap;

use axum::extract::Request;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Redirect, Response};
use chrono::{DateTime, Utc};
use milkcrate_common::fragment::{is_fragment_header, FragmentEnvelope, FRAGMENT_HEADER_NAME};
use milkcrate_common::routes::RouteParams;
use milkcrate_core::catalog::{self, Files};
use milkcrate_core::export::{self, ExportError, Scope};
use milkcrate_core::keys;
use milkcrate_core::store::StoreError;
use tracing::{error, info, warn};

use crate::auth::{check_basic_auth, AuthError};
use crate::render;
use crate::schema::SCOPED_EXPORT_SCHEMA;
use crate::state::AppState;

/// Uploads above this size are rejected outright.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

async fn load_catalog(state: &AppState) -> Result<Files, Response> {
    match state.store.list("").await {
        Ok(listing) => Ok(catalog::compile(&listing, &state.media_base)),
        Err(err) => {
            error!("listing bucket failed: {err}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "storage error").into_response())
        }
    }
}

fn query_map(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Respond with either the JSON fragment envelope or the full document,
/// depending on the navigation handshake header.
fn page_response(req: &Request, envelope: FragmentEnvelope) -> Response {
    if is_fragment_header(header_str(req.headers(), FRAGMENT_HEADER_NAME)) {
        Json(envelope).into_response()
    } else {
        (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            render::document(&envelope),
        )
            .into_response()
    }
}

fn httpdate(when: &DateTime<Utc>) -> String {
    when.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Serialize a scoped export with caching headers. An `If-None-Match`
/// containing the current ETag short-circuits to 304.
fn export_response(req: &Request, files: &Files, scope: &Scope) -> Response {
    let exported = match export::export(files, scope) {
        Ok(exported) => exported,
        Err(ExportError::MissingParam(name)) => {
            return (StatusCode::BAD_REQUEST, format!("missing {name}")).into_response();
        }
        Err(ExportError::NotFound) => {
            return (StatusCode::NOT_FOUND, "not found").into_response();
        }
    };
    let etag = export::etag(&exported);

    let mut builder = Response::builder()
        .header(header::ETAG, etag.as_str())
        .header(header::CACHE_CONTROL, "public, max-age=60");
    if let Some(when) = export::last_modified(files) {
        builder = builder.header(header::LAST_MODIFIED, httpdate(&when));
    }

    let revalidated = header_str(req.headers(), "if-none-match")
        .map(|value| value.split(',').any(|t| t.trim() == etag))
        .unwrap_or(false);
    if revalidated {
        return builder
            .status(StatusCode::NOT_MODIFIED)
            .body(axum::body::Body::empty())
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }

    match serde_json::to_vec(&exported) {
        Ok(body) => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(err) => {
            error!("serializing export failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "serialization error").into_response()
        }
    }
}

async fn scoped_export(state: AppState, req: Request, scope: Scope) -> Response {
    let files = match load_catalog(&state).await {
        Ok(files) => files,
        Err(response) => return response,
    };
    export_response(&req, &files, &scope)
}

pub async fn home(state: AppState, _params: RouteParams, req: Request) -> Response {
    if query_map(&req).get("format").map(String::as_str) == Some("json") {
        return scoped_export(state, req, Scope::Root).await;
    }
    let files = match load_catalog(&state).await {
        Ok(files) => files,
        Err(response) => return response,
    };
    let albums = catalog::albums_by_recency(&files);
    page_response(&req, render::home_envelope(&albums))
}

pub async fn root_export(state: AppState, _params: RouteParams, req: Request) -> Response {
    scoped_export(state, req, Scope::Root).await
}

pub async fn artist_export(state: AppState, params: RouteParams, req: Request) -> Response {
    let artist_id = keys::decode_segment(params.get("artist_id").map(String::as_str).unwrap_or(""));
    scoped_export(state, req, Scope::Artist { artist_id }).await
}

pub async fn album_export(state: AppState, params: RouteParams, req: Request) -> Response {
    let artist_id = keys::decode_segment(params.get("artist_id").map(String::as_str).unwrap_or(""));
    let album_id = keys::decode_segment(params.get("album_id").map(String::as_str).unwrap_or(""));
    scoped_export(state, req, Scope::Album { artist_id, album_id }).await
}

pub async fn artist_page(state: AppState, params: RouteParams, req: Request) -> Response {
    let artist = keys::decode_segment(params.get("artist_id").map(String::as_str).unwrap_or(""));
    if artist.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing artist id").into_response();
    }
    let files = match load_catalog(&state).await {
        Ok(files) => files,
        Err(response) => return response,
    };
    let Some(albums) = files.get(&artist) else {
        return (StatusCode::NOT_FOUND, "artist not found").into_response();
    };
    let albums: Vec<_> = albums.values().collect();
    page_response(&req, render::artist_envelope(&artist, &albums))
}

pub async fn album_page(state: AppState, params: RouteParams, req: Request) -> Response {
    let artist = keys::decode_segment(params.get("artist_id").map(String::as_str).unwrap_or(""));
    let album = keys::decode_segment(params.get("album_id").map(String::as_str).unwrap_or(""));
    if artist.is_empty() || album.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing artist or album id").into_response();
    }
    let files = match load_catalog(&state).await {
        Ok(files) => files,
        Err(response) => return response,
    };
    let id = format!("{artist}/{album}");
    let Some(album) = catalog::get_album(&files, &id) else {
        return (StatusCode::NOT_FOUND, "album not found").into_response();
    };
    page_response(&req, render::album_envelope(&artist, album))
}

pub async fn album_cover(state: AppState, params: RouteParams, _req: Request) -> Response {
    let artist = keys::decode_segment(params.get("artist_id").map(String::as_str).unwrap_or(""));
    let album = keys::decode_segment(params.get("album_id").map(String::as_str).unwrap_or(""));
    if artist.is_empty() || album.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing artist or album id").into_response();
    }
    let key = format!("{artist}/{album}/cover.jpeg");
    match state.store.get(&key).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            bytes,
        )
            .into_response(),
        Err(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "no cover art").into_response(),
        Err(err) => {
            error!("reading cover {key} failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "storage error").into_response()
        }
    }
}

pub async fn search_page(state: AppState, _params: RouteParams, req: Request) -> Response {
    let query = query_map(&req).remove("q").unwrap_or_default();
    let files = match load_catalog(&state).await {
        Ok(files) => files,
        Err(response) => return response,
    };
    let results = catalog::search(&files, &query);
    page_response(&req, render::search_envelope(&query, &results))
}

pub async fn schema_doc(_state: AppState, _params: RouteParams, _req: Request) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/schema+json"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        SCOPED_EXPORT_SCHEMA,
    )
        .into_response()
}

fn require_admin(state: &AppState, req: &Request) -> Result<(), Response> {
    match check_basic_auth(&state.admin, header_str(req.headers(), "authorization")) {
        Ok(()) => Ok(()),
        Err(AuthError::Misconfigured) => {
            error!("admin credentials not configured");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "admin credentials not configured")
                .into_response())
        }
        Err(AuthError::Unauthorized) => Err((
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, r#"Basic realm="milkcrate""#)],
            "unauthorized",
        )
            .into_response()),
    }
}

/// Admin login probe. A successful auth just bounces back to the library.
pub async fn admin(state: AppState, _params: RouteParams, req: Request) -> Response {
    if let Err(response) = require_admin(&state, &req) {
        return response;
    }
    Redirect::to("/").into_response()
}

/// Accept an upload keyed by the `x-milkcrate-key` header. The key must be
/// a valid track key or an album `cover.jpeg` key.
pub async fn upload(state: AppState, _params: RouteParams, req: Request) -> Response {
    if let Err(response) = require_admin(&state, &req) {
        return response;
    }
    let Some(key) = header_str(req.headers(), "x-milkcrate-key").map(str::to_string) else {
        return (StatusCode::BAD_REQUEST, "missing x-milkcrate-key header").into_response();
    };
    if !upload_key_is_valid(&key) {
        warn!("rejected upload with invalid key {key:?}");
        return (StatusCode::BAD_REQUEST, "invalid object key").into_response();
    }

    let body = match axum::body::to_bytes(req.into_body(), MAX_UPLOAD_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("reading upload body failed: {err}");
            return (StatusCode::PAYLOAD_TOO_LARGE, "upload too large").into_response();
        }
    };
    match state.store.put(&key, body.to_vec()).await {
        Ok(()) => {
            info!("stored {key}");
            (StatusCode::CREATED, "created").into_response()
        }
        Err(err) => {
            error!("storing {key} failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "storage error").into_response()
        }
    }
}

fn upload_key_is_valid(key: &str) -> bool {
    if keys::parse_key(key).is_ok() {
        return true;
    }
    // Album cover art: artist/album/cover.jpeg with non-empty segments.
    let mut segments = key.split('/');
    matches!(
        (segments.next(), segments.next(), segments.next(), segments.next()),
        (Some(artist), Some(album), Some("cover.jpeg"), None)
            if !artist.is_empty() && !album.is_empty()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_key_accepts_tracks_and_covers() {
        assert!(upload_key_is_valid("Pixies/Doolittle/04__Dead.flac"));
        assert!(upload_key_is_valid("Pixies/Doolittle/cover.jpeg"));
    }

    #[test]
    fn upload_key_rejects_other_shapes() {
        assert!(!upload_key_is_valid("Pixies/Doolittle/notes.txt"));
        assert!(!upload_key_is_valid("Pixies/cover.jpeg"));
        assert!(!upload_key_is_valid("/Doolittle/cover.jpeg"));
        assert!(!upload_key_is_valid("Pixies/Doolittle/cover.jpeg/extra"));
    }
}
