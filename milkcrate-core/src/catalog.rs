//! Catalog compiler and derived queries.
//!
//! `compile` folds a flat bucket listing into the nested `Files` structure
//! (artist -> album -> Album). It is pure with respect to a given listing;
//! freshness and caching policy belong to the caller. The server recompiles
//! from a fresh listing per request that needs it.
//!
//! Artist and album maps are BTreeMaps so a fixed listing always produces
//! the same serialized export (the scoped exporter's ETag depends on that).
//! Track vectors keep listing encounter order and are never pre-sorted;
//! `remaining_tracks` relies on that order, while display-side consumers
//! sort by track number themselves.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::keys::parse_key;
use crate::store::ObjectEntry;

/// One playable track derived from an object key. Immutable once built;
/// lives for one compile cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Fully-qualified object URL (media base + raw key).
    pub url: String,
    /// Title including extension, percent-decoded.
    pub title: String,
    pub track_num: u32,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    /// Canonical composite id, always `"{artist}/{album}"`. Used everywhere:
    /// URLs, cache keys, search results.
    pub id: String,
    /// Raw album-name path segment, decoded.
    pub title: String,
    /// Conventional cover location: `{media_base}/{artist}/{album}/cover.jpeg`
    /// built from the raw key segments.
    pub cover_art: String,
    pub tracks: Vec<Track>,
}

/// The catalog: every `(artist, album)` pair with at least one valid track
/// appears exactly once; pairs with zero valid tracks never appear.
pub type Files = BTreeMap<String, BTreeMap<String, Album>>;

/// Fold a listing into a catalog. Malformed keys are silent skips (debug
/// logged); an empty listing yields an empty catalog.
pub fn compile(listing: &[ObjectEntry], media_base: &str) -> Files {
    let base = media_base.trim_end_matches('/');
    let mut files = Files::new();

    for entry in listing {
        let parsed = match parse_key(&entry.key) {
            Ok(parsed) => parsed,
            Err(reject) => {
                debug!("skipping key {:?}: {reject}", entry.key);
                continue;
            }
        };

        // parse_key guarantees three segments; keep the raw (encoded) artist
        // and album for URL building.
        let mut raw_segments = entry.key.splitn(3, '/');
        let raw_artist = raw_segments.next().unwrap_or_default();
        let raw_album = raw_segments.next().unwrap_or_default();

        let album = files
            .entry(parsed.artist.clone())
            .or_default()
            .entry(parsed.album.clone())
            .or_insert_with(|| Album {
                id: format!("{}/{}", parsed.artist, parsed.album),
                title: parsed.album.clone(),
                cover_art: format!("{base}/{raw_artist}/{raw_album}/cover.jpeg"),
                tracks: Vec::new(),
            });

        album.tracks.push(Track {
            url: format!("{base}/{}", entry.key),
            title: parsed.title,
            track_num: parsed.track_num,
            last_modified: entry.last_modified,
        });
    }

    files
}

/// Look up an album by its `"artist/album"` composite id, flattening all
/// albums first.
pub fn get_album<'a>(files: &'a Files, id: &str) -> Option<&'a Album> {
    files
        .values()
        .flat_map(|albums| albums.values())
        .find(|album| album.id == id)
}

/// Tracks strictly after the current one within its album, in the album's
/// stored array order (encounter order, NOT track-number order). Unknown
/// URL, or the last track, yields an empty list.
pub fn remaining_tracks<'a>(files: &'a Files, current_url: &str) -> Vec<&'a Track> {
    for albums in files.values() {
        for album in albums.values() {
            if let Some(pos) = album.tracks.iter().position(|t| t.url == current_url) {
                return album.tracks[pos + 1..].iter().collect();
            }
        }
    }
    Vec::new()
}

fn newest_track(album: &Album) -> Option<DateTime<Utc>> {
    album.tracks.iter().filter_map(|t| t.last_modified).max()
}

/// All albums sorted by their most-recently-modified track, newest first.
/// Albums with no timestamps sort last; ties keep their stable relative
/// order.
pub fn albums_by_recency(files: &Files) -> Vec<&Album> {
    let mut albums: Vec<&Album> = files.values().flat_map(|a| a.values()).collect();
    albums.sort_by(|a, b| newest_track(b).cmp(&newest_track(a)));
    albums
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SearchResults<'a> {
    pub artists: Vec<&'a str>,
    pub albums: Vec<&'a Album>,
    pub tracks: Vec<&'a Track>,
}

/// Substring search across artist, album, and track names.
///
/// Quirk, preserved for behavioral compatibility: only the indexed side is
/// lower-cased. The term is matched as-is, so "beatles" finds "The Beatles"
/// but "BEATLES" finds nothing.
pub fn search<'a>(files: &'a Files, term: &str) -> SearchResults<'a> {
    let mut results = SearchResults::default();
    for (artist, albums) in files {
        if artist.to_lowercase().contains(term) {
            results.artists.push(artist.as_str());
        }
        for album in albums.values() {
            if album.title.to_lowercase().contains(term) {
                results.albums.push(album);
            }
            for track in &album.tracks {
                if track.title.to_lowercase().contains(term) {
                    results.tracks.push(track);
                }
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BASE: &str = "https://bucket.example.com";

    fn entry(key: &str) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            last_modified: None,
        }
    }

    fn entry_at(key: &str, secs: i64) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            last_modified: Some(Utc.timestamp_opt(secs, 0).unwrap()),
        }
    }

    #[test]
    fn single_valid_key_round_trip() {
        let files = compile(&[entry("The Beatles/Abbey Road/3__Something.mp3")], BASE);
        assert_eq!(files.len(), 1);
        let albums = &files["The Beatles"];
        assert_eq!(albums.len(), 1);
        let album = &albums["Abbey Road"];
        assert_eq!(album.id, "The Beatles/Abbey Road");
        assert_eq!(album.title, "Abbey Road");
        assert_eq!(
            album.cover_art,
            "https://bucket.example.com/The Beatles/Abbey Road/cover.jpeg"
        );
        assert_eq!(album.tracks.len(), 1);
        assert_eq!(album.tracks[0].track_num, 3);
        assert_eq!(album.tracks[0].title, "Something.mp3");
        assert_eq!(
            album.tracks[0].url,
            "https://bucket.example.com/The Beatles/Abbey Road/3__Something.mp3"
        );
    }

    #[test]
    fn malformed_keys_contribute_nothing() {
        let listing = vec![
            entry("a/b/c/d__t.mp3"),
            entry("a//1__t.mp3"),
            entry("/b/1__t.mp3"),
            entry("a/b/noSeparator.mp3"),
            entry("a/b/0__t.mp3"),
            entry("a/b/x__t.mp3"),
            entry("good/album/1__ok.mp3"),
        ];
        let files = compile(&listing, BASE);
        assert_eq!(files.len(), 1);
        assert_eq!(files["good"]["album"].tracks.len(), 1);
    }

    #[test]
    fn empty_listing_compiles_to_empty_catalog() {
        assert!(compile(&[], BASE).is_empty());
    }

    #[test]
    fn compile_is_idempotent() {
        let listing = vec![
            entry_at("a/b/2__two.mp3", 100),
            entry_at("a/b/1__one.mp3", 200),
            entry("c/d/9__nine.mp3"),
        ];
        assert_eq!(compile(&listing, BASE), compile(&listing, BASE));
    }

    #[test]
    fn tracks_keep_encounter_order() {
        let listing = vec![
            entry("a/b/3__three.mp3"),
            entry("a/b/1__one.mp3"),
            entry("a/b/2__two.mp3"),
        ];
        let files = compile(&listing, BASE);
        let nums: Vec<u32> = files["a"]["b"].tracks.iter().map(|t| t.track_num).collect();
        assert_eq!(nums, vec![3, 1, 2]);
    }

    #[test]
    fn get_album_by_composite_id() {
        let files = compile(&[entry("a/b/1__t.mp3")], BASE);
        assert!(get_album(&files, "a/b").is_some());
        assert!(get_album(&files, "a/z").is_none());
    }

    #[test]
    fn remaining_tracks_follow_array_order() {
        let listing = vec![
            entry("a/b/1__one.mp3"),
            entry("a/b/2__two.mp3"),
            entry("a/b/3__three.mp3"),
        ];
        let files = compile(&listing, BASE);
        let first_url = format!("{BASE}/a/b/1__one.mp3");
        let rest = remaining_tracks(&files, &first_url);
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].title, "two.mp3");
        assert_eq!(rest[1].title, "three.mp3");

        let last_url = format!("{BASE}/a/b/3__three.mp3");
        assert!(remaining_tracks(&files, &last_url).is_empty());
        assert!(remaining_tracks(&files, "https://elsewhere/unknown").is_empty());
    }

    #[test]
    fn recency_sorts_by_newest_track_descending() {
        let listing = vec![
            entry_at("old/one/1__t.mp3", 1_000),
            entry_at("new/two/1__t.mp3", 5_000),
            entry_at("mid/three/1__t.mp3", 3_000),
            // an old album with one recent upload outranks "mid"
            entry_at("old/one/2__u.mp3", 4_000),
        ];
        let files = compile(&listing, BASE);
        let ordered: Vec<&str> = albums_by_recency(&files).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ordered, vec!["new/two", "old/one", "mid/three"]);
    }

    #[test]
    fn albums_without_timestamps_sort_last() {
        let listing = vec![
            entry("undated/x/1__t.mp3"),
            entry_at("dated/y/1__t.mp3", 10),
        ];
        let files = compile(&listing, BASE);
        let ordered: Vec<&str> = albums_by_recency(&files).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ordered, vec!["dated/y", "undated/x"]);
    }

    #[test]
    fn search_lowercases_indexed_side_only() {
        let files = compile(&[entry("The Beatles/Abbey Road/1__Come Together.mp3")], BASE);

        let hit = search(&files, "beatles");
        assert_eq!(hit.artists, vec!["The Beatles"]);

        // The term is NOT lower-cased: this asymmetry is load-bearing.
        let miss = search(&files, "BEATLES");
        assert!(miss.artists.is_empty());
        assert!(miss.albums.is_empty());
        assert!(miss.tracks.is_empty());
    }

    #[test]
    fn search_spans_albums_and_tracks() {
        let files = compile(
            &[
                entry("The Beatles/Abbey Road/1__Come Together.mp3"),
                entry("Pixies/Doolittle/4__Here Comes Your Man.mp3"),
            ],
            BASE,
        );
        let results = search(&files, "come");
        assert!(results.artists.is_empty());
        assert_eq!(results.tracks.len(), 2);
    }
}
