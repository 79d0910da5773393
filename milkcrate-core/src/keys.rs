//! Object key schema parser.
//!
//! Keys look like `{artist}/{album}/{trackNumber}__{title}.{ext}`. Parsing
//! is a total function: every malformed shape maps to a tagged rejection
//! that the catalog compiler turns into a silent skip. One bad key never
//! aborts processing of the rest of a listing.

use thiserror::Error;

/// The fields carried by a well-formed object key. Segments are
/// percent-decoded; the raw (encoded) form stays available on the original
/// key string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub artist: String,
    pub album: String,
    pub track_num: u32,
    /// Track title including the file extension (`"Come Together.mp3"`).
    pub title: String,
}

/// Why a key was rejected. Every skip condition is enumerated here so the
/// compiler's skip rules are testable in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyReject {
    /// Not exactly artist/album/filename. Nested "sub-folder" keys and
    /// bucket-root files drop entirely, never partially parse.
    #[error("key does not split into exactly artist/album/filename")]
    WrongDepth,
    #[error("artist segment is empty")]
    EmptyArtist,
    #[error("album segment is empty")]
    EmptyAlbum,
    /// No `__` separator in the filename. Directory-marker keys (trailing
    /// slash) land here via their empty filename segment.
    #[error("filename has no __ separator")]
    NoSeparator,
    /// Track-number text is not a positive integer. A literal `0` skips,
    /// it is never zero-filled.
    #[error("track number is not a positive integer")]
    BadTrackNumber,
}

/// Percent-decode one key segment. A malformed escape falls back to the raw
/// segment rather than failing the whole key.
pub fn decode_segment(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Parse an object key against the track schema.
pub fn parse_key(key: &str) -> Result<ParsedKey, KeyReject> {
    let segments: Vec<&str> = key.split('/').collect();
    if segments.len() != 3 {
        return Err(KeyReject::WrongDepth);
    }
    let (artist_raw, album_raw, filename) = (segments[0], segments[1], segments[2]);
    if artist_raw.is_empty() {
        return Err(KeyReject::EmptyArtist);
    }
    if album_raw.is_empty() {
        return Err(KeyReject::EmptyAlbum);
    }

    // Split on the FIRST `__`: in "1_2__Title" the track text is "1_2".
    let (track_text, title_raw) = filename.split_once("__").ok_or(KeyReject::NoSeparator)?;
    let track_num: u32 = track_text.parse().map_err(|_| KeyReject::BadTrackNumber)?;
    if track_num == 0 {
        return Err(KeyReject::BadTrackNumber);
    }

    Ok(ParsedKey {
        artist: decode_segment(artist_raw),
        album: decode_segment(album_raw),
        track_num,
        title: decode_segment(title_raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_key() {
        let parsed = parse_key("The Beatles/Abbey Road/1__Come Together.mp3").unwrap();
        assert_eq!(parsed.artist, "The Beatles");
        assert_eq!(parsed.album, "Abbey Road");
        assert_eq!(parsed.track_num, 1);
        assert_eq!(parsed.title, "Come Together.mp3");
    }

    #[test]
    fn rejects_nested_and_root_keys() {
        assert_eq!(parse_key("a/b/c/d__t.mp3"), Err(KeyReject::WrongDepth));
        assert_eq!(parse_key("loose__file.mp3"), Err(KeyReject::WrongDepth));
        assert_eq!(parse_key("a/1__t.mp3"), Err(KeyReject::WrongDepth));
    }

    #[test]
    fn rejects_empty_artist_and_album() {
        assert_eq!(parse_key("/b/1__t.mp3"), Err(KeyReject::EmptyArtist));
        assert_eq!(parse_key("a//1__t.mp3"), Err(KeyReject::EmptyAlbum));
    }

    #[test]
    fn rejects_filename_without_separator() {
        assert_eq!(parse_key("a/b/noSeparator.mp3"), Err(KeyReject::NoSeparator));
    }

    #[test]
    fn directory_marker_key_rejects_via_separator_check() {
        assert_eq!(parse_key("a/b/"), Err(KeyReject::NoSeparator));
    }

    #[test]
    fn rejects_zero_and_non_numeric_track_numbers() {
        assert_eq!(parse_key("a/b/0__t.mp3"), Err(KeyReject::BadTrackNumber));
        assert_eq!(parse_key("a/b/x__t.mp3"), Err(KeyReject::BadTrackNumber));
        assert_eq!(parse_key("a/b/-1__t.mp3"), Err(KeyReject::BadTrackNumber));
        assert_eq!(parse_key("a/b/__t.mp3"), Err(KeyReject::BadTrackNumber));
    }

    #[test]
    fn track_text_ends_at_first_double_underscore() {
        // "1_2" is the track text, and it is not a valid integer.
        assert_eq!(parse_key("a/b/1_2__Title.mp3"), Err(KeyReject::BadTrackNumber));
        // A title containing its own "__" survives intact.
        let parsed = parse_key("a/b/7__Weird__Name.mp3").unwrap();
        assert_eq!(parsed.track_num, 7);
        assert_eq!(parsed.title, "Weird__Name.mp3");
    }

    #[test]
    fn segments_percent_decode_independently() {
        let parsed = parse_key("The%20Beatles/Abbey%20Road/1__Come%20Together.mp3").unwrap();
        assert_eq!(parsed.artist, "The Beatles");
        assert_eq!(parsed.album, "Abbey Road");
        assert_eq!(parsed.title, "Come Together.mp3");
    }

    #[test]
    fn malformed_escape_falls_back_to_raw_segment() {
        let parsed = parse_key("Bad%ZZartist/Album/1__t.mp3").unwrap();
        assert_eq!(parsed.artist, "Bad%ZZartist");
        assert_eq!(parsed.album, "Album");
    }
}
