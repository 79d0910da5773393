use std::sync::Arc;

use clap::Parser;
use milkcrate_core::store::S3ObjectStore;
use milkcrate_server::auth::AdminAuth;
use milkcrate_server::dispatch::build_router;
use milkcrate_server::state::AppState;
use tracing::{error, info};

/// milkcrate server — serves an S3-backed audio library over HTTP.
#[derive(Parser)]
#[command(name = "milkcrate-server")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value = "8080", env = "MILKCRATE_PORT")]
    port: u16,

    /// Address to bind the server to.
    #[arg(long, default_value = "0.0.0.0", env = "MILKCRATE_BIND")]
    bind: String,

    /// S3 bucket holding the library.
    #[arg(long, env = "MILKCRATE_BUCKET")]
    bucket: String,

    /// S3 region.
    #[arg(long, default_value = "us-east-1", env = "MILKCRATE_REGION")]
    region: String,

    /// S3 endpoint (for S3-compatible services).
    #[arg(long, env = "MILKCRATE_ENDPOINT")]
    endpoint: Option<String>,

    /// S3 access key.
    #[arg(long, env = "MILKCRATE_ACCESS_KEY")]
    access_key: String,

    /// S3 secret key.
    #[arg(long, env = "MILKCRATE_SECRET_KEY")]
    secret_key: String,

    /// Public base URL of the bucket, used to build track and cover URLs.
    #[arg(long, env = "MILKCRATE_MEDIA_BASE")]
    media_base: String,

    /// Admin username for uploads. Admin routes return 500 until both
    /// admin values are set.
    #[arg(long, env = "MILKCRATE_ADMIN_USER")]
    admin_user: Option<String>,

    /// Admin password for uploads.
    #[arg(long, env = "MILKCRATE_ADMIN_PASSWORD")]
    admin_password: Option<String>,
}

fn configure_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    configure_logging();
    let args = Args::parse();

    info!("milkcrate-server starting");

    let store = S3ObjectStore::new(
        args.bucket.clone(),
        args.region.clone(),
        args.endpoint.clone(),
        args.access_key.clone(),
        args.secret_key.clone(),
    )
    .await
    .unwrap_or_else(|e| {
        error!("Failed to create S3 client: {e}");
        std::process::exit(1);
    });

    if args.admin_user.is_none() || args.admin_password.is_none() {
        info!("Admin credentials not set — uploads are disabled");
    }

    let state = AppState {
        store: Arc::new(store),
        media_base: args.media_base.trim_end_matches('/').to_string(),
        admin: AdminAuth {
            username: args.admin_user,
            password: args.admin_password,
        },
    };

    let app = build_router(state);
    let addr = format!("{}:{}", args.bind, args.port);

    info!("Binding to {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {addr}: {e}");
            std::process::exit(1);
        });

    info!("milkcrate-server listening on http://{addr}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
