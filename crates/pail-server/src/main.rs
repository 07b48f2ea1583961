use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use lloggs::LoggingArgs;
use tracing::{info, warn};

use pail_server::{
    ApiConfig, Config, MemoryStorage, S3Storage, StorageConfig, StorageOverrides, ToolTransport,
    ToolTransportConfig, api,
};

#[derive(Parser)]
#[command(name = "pail-server")]
#[command(about = "REST gateway for S3-compatible object stores")]
struct Args {
    /// Address to listen on
    #[arg(long, short, default_value = "127.0.0.1:8000")]
    listen: SocketAddr,

    /// Object store endpoint, host:port or URL [env: MINIO_ENDPOINT]
    #[arg(long)]
    endpoint: Option<String>,

    /// Access key [env: MINIO_ACCESS_KEY]
    #[arg(long)]
    access_key: Option<String>,

    /// Secret key [env: MINIO_SECRET_KEY]
    #[arg(long)]
    secret_key: Option<String>,

    /// Use TLS for an endpoint given without scheme [env: MINIO_SECURE]
    #[arg(long)]
    secure: Option<bool>,

    /// Signing region [env: MINIO_REGION]
    #[arg(long)]
    region: Option<String>,

    /// Seconds the health probe may take before the store counts as down
    #[arg(long, default_value_t = 3)]
    health_timeout: u64,

    /// Largest accepted request body in bytes; unlimited when unset
    #[arg(long)]
    max_upload: Option<usize>,

    /// Expose the routes as tools at /mcp
    #[arg(long)]
    mcp: bool,

    /// Transport for the tool endpoint (http or sse)
    #[arg(long, default_value_t = ToolTransport::Http)]
    mcp_transport: ToolTransport,

    /// Serve from an in-process store instead of the configured endpoint
    #[arg(long)]
    in_memory: bool,

    #[command(flatten)]
    logging: LoggingArgs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let _guard = args.logging.setup(|v| match v {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    })?;

    let config = Config {
        listen_addr: args.listen,
        storage: StorageConfig::resolve(StorageOverrides {
            endpoint: args.endpoint,
            access_key: args.access_key,
            secret_key: args.secret_key,
            secure: args.secure,
            region: args.region,
        }),
        health_timeout: Duration::from_secs(args.health_timeout),
        tools: args.mcp.then_some(ToolTransportConfig {
            enabled: true,
            transport: args.mcp_transport,
        }),
        max_upload: args.max_upload,
    };

    let api_config = ApiConfig {
        health_timeout: config.health_timeout,
        tools: config.tools,
        max_upload: config.max_upload,
    };

    // Build router
    let app = if args.in_memory {
        warn!("Serving from in-process storage; nothing is persisted");
        api::router(MemoryStorage::new(), &api_config)
    } else {
        info!(
            endpoint = %config.storage.endpoint_url(),
            access_key = %config.storage.access_key,
            region = %config.storage.region,
            "Using object store"
        );
        api::router(S3Storage::new(&config.storage), &api_config)
    };

    if let Some(tools) = config.tools {
        info!(transport = %tools.transport, "Tool endpoint mounted at {}", pail_server::mcp::MCP_PATH);
    }

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
