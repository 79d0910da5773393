//! milkcrate-server: the web front end over the S3-derived catalog.
//!
//! Every request that needs the catalog lists the bucket fresh and compiles;
//! there is no shared mutable cache in the server. Routing runs through an
//! ordered first-match-wins table dispatched from an axum fallback.

pub mod auth;
pub mod dispatch;
pub mod handlers;
pub mod render;
pub mod schema;
pub mod state;
