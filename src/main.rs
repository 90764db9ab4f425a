//! ProdVision - production status dashboard backend

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prodvision::{
    api::{build_router, AppState},
    auth::seed_admin_password,
    config::{default_config_path, get_data_dir, load_config, AppConfig},
    db::init_database,
};

#[derive(Parser)]
#[command(name = "prodvision")]
#[command(author = "ProdVision Team")]
#[command(version = "0.1.0")]
#[command(about = "Production status dashboard: daily punctuality and quality entries with PRB/HIIM tracking")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Host to bind to (overrides the config file)
    #[arg(short = 'H', long, env = "PRODVISION_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "PRODVISION_PORT")]
    port: Option<u16>,

    /// Database path (defaults to <data dir>/prodvision/prodvision.db)
    #[arg(short, long, env = "PRODVISION_DATABASE")]
    database: Option<String>,

    /// Configuration file (defaults to <config dir>/prodvision/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the ProdVision server
    Serve,
    /// Initialize the database and the default admin password
    Init,
    /// Show configuration info
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "prodvision=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = cli.host.clone() {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(database) = cli.database.clone() {
        config.database.path = Some(database);
    }

    let db_path = config.database.get_path().to_string_lossy().to_string();

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing database at: {}", db_path);
            let pool = init_database(&db_path).await?;
            if seed_admin_password(&pool, &config.auth.default_admin_password, config.auth.password_cost).await? {
                println!("Default admin password stored; change it before going live.");
            }
            println!("Database initialized successfully!");
            return Ok(());
        }
        Some(Commands::Config) => {
            println!("ProdVision Configuration");
            println!("========================");
            println!(
                "Config file: {}",
                cli.config.unwrap_or_else(default_config_path).display()
            );
            println!("Data directory: {}", get_data_dir().display());
            println!("Database path: {}", db_path);
            println!("Server: {}:{}", config.server.host, config.server.port);
            println!("Session lifetime: {}s", config.auth.session_lifetime_secs);
            return Ok(());
        }
        _ => {}
    }

    run_server(config, &db_path).await
}

async fn run_server(config: AppConfig, db_path: &str) -> anyhow::Result<()> {
    // Initialize database
    tracing::info!("Initializing database at: {}", db_path);
    let pool = init_database(db_path).await?;
    seed_admin_password(&pool, &config.auth.default_admin_password, config.auth.password_cost).await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let cleanup_interval = config.auth.cleanup_interval();

    let state = AppState::new(pool, config);
    let cleanup = state.sessions.spawn_cleanup_task(cleanup_interval);

    let app = build_router(state);

    print_banner(&addr, db_path);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_banner(addr: &SocketAddr, db_path: &str) {
    println!();
    println!("  ProdVision v{}", env!("CARGO_PKG_VERSION"));
    println!("  Production status dashboard");
    println!();
    println!("  API:       http://{}/api", addr);
    println!("  Health:    http://{}/health", addr);
    println!("  Database:  {}", db_path);
    println!();
}
