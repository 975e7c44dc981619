//! `memory-mcp-server` — serves the JSON-RPC tool surface for
//! MCP-speaking clients. Shares `rest::router` with `memory-http-server`;
//! the two binaries exist to let an operator run the JSON-RPC surface and
//! the plain REST surface as separate processes on separate ports when
//! that's the deployment shape they want, while a single process can just
//! as well serve both since every route lives on one router either way.

use std::net::SocketAddr;
use std::time::Duration;

use memory_api::AppConfig;

const USAGE: &str = r#"memory-mcp-server — JSON-RPC tool surface for the memory service

USAGE:
    memory-mcp-server [OPTIONS]

OPTIONS:
    --config <path>       Load a TOML config overlay from <path>
    --skip-migrations     Do not run pending migrations on startup
    -h, --help            Print help
"#;

#[derive(Default)]
struct Args {
    config_path: Option<String>,
    skip_migrations: bool,
}

fn parse_args(argv: &[String]) -> Result<Args, String> {
    let mut args = Args::default();
    let mut i = 0;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" => {
                i += 1;
                args.config_path = Some(argv.get(i).ok_or("missing --config path")?.clone());
            }
            "--skip-migrations" => args.skip_migrations = true,
            "-h" | "--help" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            other => return Err(format!("unknown option: {other}")),
        }
        i += 1;
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv).map_err(|e| {
        eprintln!("error: {e}");
        eprint!("{USAGE}");
        e
    })?;

    let config = AppConfig::load(args.config_path.as_deref())?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.as_filter_str().into());
    if config.logging.debug_pretty {
        tracing_subscriber::fmt().pretty().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).with_target(true).init();
    }

    let state = memory_api::bootstrap::bootstrap(config.clone(), args.skip_migrations).await?;
    let app = memory_api::rest::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!(port = config.http_port, "starting memory-mcp-server, JSON-RPC surface at /api/v1/mcp");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// Waits for Ctrl+C, then gives in-flight requests up to 30s to drain
/// before a forced exit.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received, draining in-flight requests");
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        tracing::warn!("graceful shutdown deadline elapsed, forcing exit");
        std::process::exit(1);
    });
}
