//! JSON Schema for the scoped export payload, served at
//! `/schema/scoped-export.json`.

pub const SCOPED_EXPORT_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "$id": "/schema/scoped-export.json",
  "title": "Scoped library export",
  "type": "object",
  "required": ["dataFormatVersion", "compiledAt", "scope", "data"],
  "properties": {
    "dataFormatVersion": { "const": "1.0.0" },
    "compiledAt": { "type": "string", "format": "date-time" },
    "scope": {
      "type": "object",
      "required": ["level"],
      "properties": {
        "level": { "enum": ["root", "artist", "album"] },
        "artistId": { "type": "string" },
        "albumId": { "type": "string" }
      }
    },
    "data": {
      "type": "object",
      "required": ["artists", "totals"],
      "properties": {
        "artists": {
          "type": "array",
          "items": { "$ref": "#/$defs/artist" }
        },
        "totals": {
          "type": "object",
          "required": ["artists", "albums", "tracks"],
          "properties": {
            "artists": { "type": "integer", "minimum": 0 },
            "albums": { "type": "integer", "minimum": 0 },
            "tracks": { "type": "integer", "minimum": 0 }
          }
        }
      }
    }
  },
  "$defs": {
    "artist": {
      "type": "object",
      "required": ["name", "albums"],
      "properties": {
        "name": { "type": "string" },
        "albums": {
          "type": "array",
          "items": { "$ref": "#/$defs/album" }
        }
      }
    },
    "album": {
      "type": "object",
      "required": ["id", "title", "coverArt", "tracks"],
      "properties": {
        "id": { "type": "string" },
        "title": { "type": "string" },
        "coverArt": { "type": "string" },
        "tracks": {
          "type": "array",
          "items": { "$ref": "#/$defs/track" }
        }
      }
    },
    "track": {
      "type": "object",
      "required": ["url", "title", "trackNum", "lastModified"],
      "properties": {
        "url": { "type": "string" },
        "title": { "type": "string" },
        "trackNum": { "type": "integer", "minimum": 1 },
        "lastModified": { "type": ["string", "null"], "format": "date-time" }
      }
    }
  }
}
"##;
