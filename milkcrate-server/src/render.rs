//! HTML rendering for pages and navigation fragments.
//!
//! Each page is produced as a [`FragmentEnvelope`] first; the full document
//! wraps the same envelope, so the `<main>` content of a full page load is
//! byte-identical to what a fragment navigation swaps in.

use milkcrate_common::fragment::{FragmentEnvelope, MetaTag, CRITICAL_STYLES_ID};
use milkcrate_common::html;
use milkcrate_core::catalog::{Album, SearchResults};

/// Above-the-fold styles shipped inline with every page.
pub const CRITICAL_CSS: &str = "\
body{margin:0;font-family:system-ui,sans-serif;background:#111;color:#eee}\
main{max-width:64rem;margin:0 auto;padding:1rem}\
a{color:#9cf}\
.tiles{display:grid;grid-template-columns:repeat(auto-fill,minmax(10rem,1fr));gap:1rem}\
.tile img{width:100%;aspect-ratio:1;object-fit:cover;background:#222}\
.tracks{list-style:none;padding:0}\
.tracks li{padding:0.5rem 0;border-bottom:1px solid #333}\
audio{width:100%}";

/// `/artists/{artist}/albums/{album}`, both segments percent-encoded.
pub fn album_href(album: &Album) -> String {
    match album.id.split_once('/') {
        Some((artist, name)) => format!(
            "/artists/{}/albums/{}",
            urlencoding::encode(artist),
            urlencoding::encode(name)
        ),
        None => format!("/artists/{}", urlencoding::encode(&album.id)),
    }
}

pub fn artist_href(artist: &str) -> String {
    format!("/artists/{}", urlencoding::encode(artist))
}

fn album_tile(album: &Album) -> String {
    let href = album_href(album);
    let artist = album.id.split_once('/').map(|(a, _)| a).unwrap_or("");
    format!(
        r#"<a class="tile" href="{href}"><img src="{cover}" alt="" loading="lazy"><div>{title}</div><div class="artist">{artist}</div></a>"#,
        href = html::escape(&href),
        cover = html::escape(&album.cover_art),
        title = html::escape(&album.title),
        artist = html::escape(artist),
    )
}

pub fn home_envelope(albums: &[&Album]) -> FragmentEnvelope {
    let tiles: String = albums.iter().map(|a| album_tile(a)).collect();
    FragmentEnvelope {
        title: "milkcrate".to_string(),
        html: format!(r#"<h1>milkcrate</h1><div class="tiles">{tiles}</div>"#),
        meta: vec![
            MetaTag::og("og:title", "milkcrate"),
            MetaTag::og("og:type", "website"),
        ],
        styles: Some(format!("<style>{CRITICAL_CSS}</style>")),
    }
}

pub fn artist_envelope(artist: &str, albums: &[&Album]) -> FragmentEnvelope {
    let tiles: String = albums.iter().map(|a| album_tile(a)).collect();
    FragmentEnvelope {
        title: format!("{artist} | milkcrate"),
        html: format!(
            r#"<h1>{name}</h1><div class="tiles">{tiles}</div>"#,
            name = html::escape(artist),
        ),
        meta: vec![
            MetaTag::og("og:title", artist),
            MetaTag::og("og:type", "profile"),
        ],
        styles: Some(format!("<style>{CRITICAL_CSS}</style>")),
    }
}

pub fn album_envelope(artist: &str, album: &Album) -> FragmentEnvelope {
    let mut tracks = album.tracks.clone();
    tracks.sort_by_key(|t| t.track_num);
    let rows: String = tracks
        .iter()
        .map(|t| {
            format!(
                r#"<li><span>{num}. {title}</span><audio controls preload="none" src="{url}"></audio></li>"#,
                num = t.track_num,
                title = html::escape(&t.title),
                url = html::escape(&t.url),
            )
        })
        .collect();
    FragmentEnvelope {
        title: format!("{} | milkcrate", album.title),
        html: format!(
            r#"<h1>{title}</h1><p><a href="{artist_href}">{artist}</a></p><img src="{cover}" alt=""><ul class="tracks">{rows}</ul>"#,
            title = html::escape(&album.title),
            artist_href = html::escape(&artist_href(artist)),
            artist = html::escape(artist),
            cover = html::escape(&album.cover_art),
        ),
        meta: vec![
            MetaTag::og("og:title", &album.title),
            MetaTag::og("og:type", "music.album"),
        ],
        styles: Some(format!("<style>{CRITICAL_CSS}</style>")),
    }
}

pub fn search_envelope(query: &str, results: &SearchResults<'_>) -> FragmentEnvelope {
    let heading = if query.is_empty() {
        "<h1>Search</h1>".to_string()
    } else {
        format!("<h1>Results for {}</h1>", html::escape(query))
    };
    let mut body = heading;
    if !results.artists.is_empty() {
        let items: String = results
            .artists
            .iter()
            .map(|a| {
                format!(
                    r#"<li><a href="{href}">{name}</a></li>"#,
                    href = html::escape(&artist_href(a)),
                    name = html::escape(a),
                )
            })
            .collect();
        body.push_str(&format!("<h2>Artists</h2><ul>{items}</ul>"));
    }
    if !results.albums.is_empty() {
        let tiles: String = results.albums.iter().map(|a| album_tile(a)).collect();
        body.push_str(&format!(r#"<h2>Albums</h2><div class="tiles">{tiles}</div>"#));
    }
    if !results.tracks.is_empty() {
        let rows: String = results
            .tracks
            .iter()
            .map(|t| {
                format!(
                    r#"<li><span>{title}</span><audio controls preload="none" src="{url}"></audio></li>"#,
                    title = html::escape(&t.title),
                    url = html::escape(&t.url),
                )
            })
            .collect();
        body.push_str(&format!(r#"<h2>Tracks</h2><ul class="tracks">{rows}</ul>"#));
    }
    FragmentEnvelope {
        title: "Search | milkcrate".to_string(),
        html: body,
        meta: vec![MetaTag::og("og:title", "Search")],
        styles: Some(format!("<style>{CRITICAL_CSS}</style>")),
    }
}

/// Build the full HTML document around an envelope. The `<main>` element
/// contains exactly `envelope.html`.
pub fn document(envelope: &FragmentEnvelope) -> String {
    let meta: String = envelope
        .meta
        .iter()
        .map(|tag| {
            let attr = match (&tag.property, &tag.name) {
                (Some(p), _) => format!(r#"property="{}""#, html::escape(p)),
                (None, Some(n)) => format!(r#"name="{}""#, html::escape(n)),
                (None, None) => String::new(),
            };
            format!(r#"<meta {attr} content="{}">"#, html::escape(&tag.content))
        })
        .collect();
    let styles = envelope
        .styles
        .as_deref()
        .map(milkcrate_common::fragment::strip_style_wrapper)
        .map(|css| format!(r#"<style id="{CRITICAL_STYLES_ID}">{css}</style>"#))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\
         <html lang=\"en\">\
         <head>\
         <meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title}</title>\
         {meta}{styles}\
         </head>\
         <body><main>{html}</main></body>\
         </html>",
        title = html::escape(&envelope.title),
        html = envelope.html,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(id: &str, title: &str) -> Album {
        Album {
            id: id.to_string(),
            title: title.to_string(),
            cover_art: format!("https://media.example.com/{id}/cover.jpeg"),
            tracks: Vec::new(),
        }
    }

    #[test]
    fn album_href_encodes_both_segments() {
        let a = album("AC DC/Back in Black", "Back in Black");
        assert_eq!(album_href(&a), "/artists/AC%20DC/albums/Back%20in%20Black");
    }

    #[test]
    fn document_main_contains_envelope_html_verbatim() {
        let env = home_envelope(&[]);
        let doc = document(&env);
        let start = doc.find("<main>").unwrap() + "<main>".len();
        let end = doc.find("</main>").unwrap();
        assert_eq!(&doc[start..end], env.html);
    }

    #[test]
    fn document_unwraps_style_envelope() {
        let env = home_envelope(&[]);
        let doc = document(&env);
        assert!(doc.contains(&format!(r#"<style id="{CRITICAL_STYLES_ID}">"#)));
        // The wrapper's bare <style> tag must not appear twice.
        assert_eq!(doc.matches("<style").count(), 1);
    }

    #[test]
    fn tiles_and_album_pages_render_the_cover_url() {
        let a = album("x/y", "Y");
        let home = home_envelope(&[&a]);
        assert!(home.html.contains(r#"<img src="https://media.example.com/x/y/cover.jpeg""#));

        let page = album_envelope("x", &a);
        assert!(page.html.contains(r#"<img src="https://media.example.com/x/y/cover.jpeg""#));
    }

    #[test]
    fn titles_escape_markup() {
        let a = album("x/y", "<b>loud</b>");
        let env = album_envelope("x", &a);
        assert!(env.html.contains("&lt;b&gt;loud&lt;/b&gt;"));
    }
}
