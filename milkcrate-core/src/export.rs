//! Scoped data exporter.
//!
//! Produces versioned, schema-stamped JSON views of the catalog at three
//! scope levels. The envelope is deterministic for a fixed catalog + scope
//! except for `compiled_at`, which is honest wall-clock time; the ETag
//! therefore hashes everything EXCEPT `compiled_at`, so two exports of an
//! unchanged catalog always validate against each other.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::catalog::{Album, Files, Track};

/// Pinned wire-format version of the export envelope.
pub const DATA_FORMAT_VERSION: &str = "1.0.0";

/// Export granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Root,
    Artist { artist_id: String },
    Album { artist_id: String, album_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExportError {
    /// A required scope id was empty. Callers map this to HTTP 400.
    #[error("missing required id: {0}")]
    MissingParam(&'static str),
    /// Artist or album absent from the catalog. Callers map this to 404.
    #[error("not found in catalog")]
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeInfo {
    pub level: String,
    #[serde(rename = "artistId", skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<String>,
    #[serde(rename = "albumId", skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackExport {
    pub url: String,
    pub title: String,
    #[serde(rename = "trackNum")]
    pub track_num: u32,
    #[serde(rename = "lastModified")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumExport {
    pub id: String,
    pub title: String,
    #[serde(rename = "coverArt")]
    pub cover_art: String,
    pub tracks: Vec<TrackExport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistExport {
    pub name: String,
    pub albums: Vec<AlbumExport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportData {
    pub artists: Vec<ArtistExport>,
    pub totals: Totals,
}

/// The scoped export envelope, `dataFormatVersion` pinned at "1.0.0".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedExport {
    #[serde(rename = "dataFormatVersion")]
    pub data_format_version: String,
    #[serde(rename = "compiledAt")]
    pub compiled_at: String,
    pub scope: ScopeInfo,
    pub data: ExportData,
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn track_export(track: &Track) -> TrackExport {
    TrackExport {
        url: track.url.clone(),
        title: track.title.clone(),
        track_num: track.track_num,
        last_modified: track.last_modified.map(iso),
    }
}

fn album_export(album: &Album) -> AlbumExport {
    AlbumExport {
        id: album.id.clone(),
        title: album.title.clone(),
        cover_art: album.cover_art.clone(),
        tracks: album.tracks.iter().map(track_export).collect(),
    }
}

fn artist_export(name: &str, albums: impl Iterator<Item = AlbumExport>) -> ArtistExport {
    ArtistExport {
        name: name.to_string(),
        albums: albums.collect(),
    }
}

fn totals_of(artists: &[ArtistExport]) -> Totals {
    Totals {
        artists: artists.len(),
        albums: artists.iter().map(|a| a.albums.len()).sum(),
        tracks: artists
            .iter()
            .flat_map(|a| &a.albums)
            .map(|a| a.tracks.len())
            .sum(),
    }
}

/// Export the catalog at the requested scope. Totals are recomputed over
/// the filtered view; `compiled_at` is the wall-clock time of this call.
pub fn export(files: &Files, scope: &Scope) -> Result<ScopedExport, ExportError> {
    let (scope_info, artists) = match scope {
        Scope::Root => {
            let artists: Vec<ArtistExport> = files
                .iter()
                .map(|(name, albums)| artist_export(name, albums.values().map(album_export)))
                .collect();
            (
                ScopeInfo {
                    level: "root".to_string(),
                    artist_id: None,
                    album_id: None,
                },
                artists,
            )
        }
        Scope::Artist { artist_id } => {
            if artist_id.is_empty() {
                return Err(ExportError::MissingParam("artistId"));
            }
            let albums = files.get(artist_id).ok_or(ExportError::NotFound)?;
            (
                ScopeInfo {
                    level: "artist".to_string(),
                    artist_id: Some(artist_id.clone()),
                    album_id: None,
                },
                vec![artist_export(artist_id, albums.values().map(album_export))],
            )
        }
        Scope::Album { artist_id, album_id } => {
            if artist_id.is_empty() {
                return Err(ExportError::MissingParam("artistId"));
            }
            if album_id.is_empty() {
                return Err(ExportError::MissingParam("albumId"));
            }
            let album = files
                .get(artist_id)
                .and_then(|albums| albums.get(album_id))
                .ok_or(ExportError::NotFound)?;
            (
                ScopeInfo {
                    level: "album".to_string(),
                    artist_id: Some(artist_id.clone()),
                    album_id: Some(album_id.clone()),
                },
                vec![artist_export(artist_id, std::iter::once(album_export(album)))],
            )
        }
    };

    let totals = totals_of(&artists);
    Ok(ScopedExport {
        data_format_version: DATA_FORMAT_VERSION.to_string(),
        compiled_at: iso(Utc::now()),
        scope: scope_info,
        data: ExportData { artists, totals },
    })
}

/// Strong ETag for an export: sha256 over version + scope + data, with
/// `compiled_at` deliberately excluded. Stable across repeated exports of
/// an unchanged catalog.
pub fn etag(export: &ScopedExport) -> String {
    let mut hasher = Sha256::new();
    hasher.update(export.data_format_version.as_bytes());
    hasher.update(serde_json::to_vec(&export.scope).expect("serialize export scope"));
    hasher.update(serde_json::to_vec(&export.data).expect("serialize export data"));
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// The catalog's newest track timestamp, for `Last-Modified`.
pub fn last_modified(files: &Files) -> Option<DateTime<Utc>> {
    files
        .values()
        .flat_map(|albums| albums.values())
        .flat_map(|album| &album.tracks)
        .filter_map(|track| track.last_modified)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::compile;
    use crate::store::ObjectEntry;
    use chrono::TimeZone;

    const BASE: &str = "https://bucket.example.com";

    fn listing() -> Vec<ObjectEntry> {
        vec![
            ObjectEntry {
                key: "The Beatles/Abbey Road/1__Come Together.mp3".to_string(),
                last_modified: Some(Utc.timestamp_opt(1_000, 0).unwrap()),
            },
            ObjectEntry {
                key: "The Beatles/Revolver/1__Taxman.mp3".to_string(),
                last_modified: Some(Utc.timestamp_opt(2_000, 0).unwrap()),
            },
            ObjectEntry {
                key: "Pixies/Doolittle/1__Debaser.mp3".to_string(),
                last_modified: Some(Utc.timestamp_opt(3_000, 0).unwrap()),
            },
        ]
    }

    #[test]
    fn root_scope_includes_all_artists_with_totals() {
        let files = compile(&listing(), BASE);
        let env = export(&files, &Scope::Root).unwrap();
        assert_eq!(env.data_format_version, "1.0.0");
        assert_eq!(env.scope.level, "root");
        assert_eq!(env.data.totals, Totals { artists: 2, albums: 3, tracks: 3 });
    }

    #[test]
    fn artist_scope_filters_and_recounts() {
        let files = compile(&listing(), BASE);
        let env = export(
            &files,
            &Scope::Artist { artist_id: "The Beatles".to_string() },
        )
        .unwrap();
        assert_eq!(env.scope.artist_id.as_deref(), Some("The Beatles"));
        assert_eq!(env.data.totals, Totals { artists: 1, albums: 2, tracks: 2 });
    }

    #[test]
    fn unknown_artist_is_not_found() {
        let files = compile(&listing(), BASE);
        let err = export(
            &files,
            &Scope::Artist { artist_id: "Nobody".to_string() },
        )
        .unwrap_err();
        assert_eq!(err, ExportError::NotFound);
    }

    #[test]
    fn album_scope_rejects_empty_ids() {
        let files = compile(&listing(), BASE);
        let err = export(
            &files,
            &Scope::Album { artist_id: "".to_string(), album_id: "Doolittle".to_string() },
        )
        .unwrap_err();
        assert_eq!(err, ExportError::MissingParam("artistId"));

        let err = export(
            &files,
            &Scope::Album { artist_id: "Pixies".to_string(), album_id: "".to_string() },
        )
        .unwrap_err();
        assert_eq!(err, ExportError::MissingParam("albumId"));
    }

    #[test]
    fn album_scope_exports_single_album() {
        let files = compile(&listing(), BASE);
        let env = export(
            &files,
            &Scope::Album {
                artist_id: "Pixies".to_string(),
                album_id: "Doolittle".to_string(),
            },
        )
        .unwrap();
        assert_eq!(env.data.totals, Totals { artists: 1, albums: 1, tracks: 1 });
        assert_eq!(env.data.artists[0].albums[0].id, "Pixies/Doolittle");
    }

    #[test]
    fn etag_is_stable_across_exports_of_unchanged_catalog() {
        let files = compile(&listing(), BASE);
        let first = export(&files, &Scope::Root).unwrap();
        let second = export(&files, &Scope::Root).unwrap();
        // compiled_at differs between the two; the validator must not.
        assert_eq!(etag(&first), etag(&second));
    }

    #[test]
    fn etag_changes_when_catalog_changes() {
        let files = compile(&listing(), BASE);
        let mut grown = listing();
        grown.push(ObjectEntry {
            key: "Pixies/Doolittle/2__Tame.mp3".to_string(),
            last_modified: None,
        });
        let files_grown = compile(&grown, BASE);

        let a = export(&files, &Scope::Root).unwrap();
        let b = export(&files_grown, &Scope::Root).unwrap();
        assert_ne!(etag(&a), etag(&b));
    }

    #[test]
    fn last_modified_is_newest_track_timestamp() {
        let files = compile(&listing(), BASE);
        assert_eq!(
            last_modified(&files),
            Some(Utc.timestamp_opt(3_000, 0).unwrap())
        );
        assert_eq!(last_modified(&Files::default()), None);
    }

    #[test]
    fn envelope_serializes_with_wire_field_names() {
        let files = compile(&listing(), BASE);
        let env = export(&files, &Scope::Root).unwrap();
        let json = serde_json::to_string(&env).unwrap();
        assert!(json.contains("\"dataFormatVersion\":\"1.0.0\""));
        assert!(json.contains("\"compiledAt\""));
        assert!(json.contains("\"trackNum\""));
        assert!(json.contains("\"coverArt\""));
        assert!(json.contains("\"lastModified\""));
    }
}
