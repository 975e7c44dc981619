//! `memory-http-server` — serves the REST surface for direct
//! HTTP clients and dashboards. Shares `rest::router` (and therefore
//! `/api/v1/mcp`) with `memory-mcp-server`; see that binary's module doc
//! for why the two exist as separate entry points over one router.

use std::net::SocketAddr;
use std::time::Duration;

use memory_api::AppConfig;

const USAGE: &str = r#"memory-http-server — REST surface for the memory service

USAGE:
    memory-http-server [OPTIONS]

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
    tracing::info!(port = config.http_port, "starting memory-http-server, REST surface at /api/v1");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received, draining in-flight requests");
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        tracing::warn!("graceful shutdown deadline elapsed, forcing exit");
        std::process::exit(1);
    });
}
