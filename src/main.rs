use clap::Parser;
use dotenvy::dotenv;
use img_api::config::UploadConfig;
use img_api::{ApiDoc, AppState, create_app};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

#[derive(Parser, Debug)]
#[command(author, version, about = "Raw image upload endpoint", long_about = None)]
struct Args {
    /// Address to listen on (overrides BIND_ADDR)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Directory uploaded images are written to (overrides UPLOAD_DIR)
    #[arg(short, long)]
    upload_dir: Option<PathBuf>,

    /// Maximum image size in bytes (overrides MAX_FILE_SIZE)
    #[arg(long)]
    max_file_size: Option<usize>,

    /// Print the OpenAPI document and exit
    #[arg(long)]
    print_openapi: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    if args.print_openapi {
        println!("{}", ApiDoc::openapi().to_pretty_json()?);
        return Ok(());
    }

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "img_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting image upload API...");

    let mut config = UploadConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = args.upload_dir {
        config.upload_dir = dir;
    }
    if let Some(max) = args.max_file_size {
        config.max_file_size = max;
    }

    if config.api_key.is_none() {
        error!("❌ API_KEY is not set. Refusing to start without a configured API key.");
        std::process::exit(1);
    }

    info!(
        "🛡️  Upload Config: Dir={}, Max Size={}MB, Types={}",
        config.upload_dir.display(),
        config.max_file_size / 1024 / 1024,
        config.allowed_mime_types.join(", ")
    );

    let addr = config.bind_addr;
    let state = AppState::new(config);

    // Best effort; every upload retries the creation
    if let Err(e) = state.store.ensure_dir().await {
        warn!(
            "⚠️  Could not prepare upload directory {}: {:?}",
            state.store.root().display(),
            e
        );
    }

    let app = create_app(state);

    info!("✅ Server ready at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
