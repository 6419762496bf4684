use std::path::PathBuf;
use std::time::Duration;

use dash_web::config::{DEFAULT_PORT, Settings};
use dash_web::db::DEFAULT_QUERY_TIMEOUT;
use dash_web::diag::ServiceLogger;
use dash_web::layout::Layout;
use dash_web::service::Program;
use facet::Facet;
use figue as args;
use tracing::Dispatch;

#[derive(Facet, Debug)]
struct ServerCli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    #[facet(args::named, default)]
    port: Option<u16>,
    #[facet(args::named, default)]
    dsn: Option<String>,
    #[facet(args::named, default)]
    cert: Option<String>,
    #[facet(args::named, default)]
    key: Option<String>,
    #[facet(args::named, default)]
    debug: bool,
    #[facet(args::named, default)]
    query_timeout_ms: Option<u64>,
}

const PORT_ENV: &str = "DASH_PORT";
const DSN_ENV: &str = "DASH_DSN";
const QUERY_TIMEOUT_ENV: &str = "DASH_QUERY_TIMEOUT_MS";

const USAGE: &str = "usage: dash --dsn <DSN> [--port <PORT>] [--cert <FILE> --key <FILE>] \
                     [--debug] [--query-timeout-ms <MS>]";

fn main() {
    let cli = match parse_server_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let settings = match resolve_settings(cli) {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            eprintln!("missing required --dsn (or {DSN_ENV})");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to build tokio runtime: {err}");
            std::process::exit(1);
        }
    };
    runtime.block_on(async {
        if let Err(err) = run_server(settings).await {
            eprintln!("{err}");
            std::process::exit(1);
        }
    });
}

async fn run_server(settings: Settings) -> Result<(), String> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    let dispatch = Dispatch::new(subscriber);
    tracing::dispatcher::set_global_default(dispatch.clone())
        .map_err(|e| format!("failed to install tracing subscriber: {e}"))?;

    let logger = ServiceLogger::new(settings.service_display_name(), dispatch);
    let mut program = Program::new(settings, logger.clone());
    if let Err(err) = program.start(true).await {
        logger.error(format_args!("start failed: {err}"));
        return Err(err);
    }

    wait_for_shutdown_signal().await;
    program.stop().await;
    Ok(())
}

fn parse_server_cli() -> Result<ServerCli, String> {
    let figue_config = args::builder::<ServerCli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("dash")
                .description("Serves named SQL report templates as JSON endpoints")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();
    let cli = args::Driver::new(figue_config)
        .run()
        .into_result()
        .map_err(|e| e.to_string())?;
    Ok(cli.value)
}

/// Flags win over environment variables. `Ok(None)` means no DSN was given.
fn resolve_settings(cli: ServerCli) -> Result<Option<Settings>, String> {
    let Some(dsn) = cli
        .dsn
        .or_else(|| std::env::var(DSN_ENV).ok())
        .filter(|dsn| !dsn.trim().is_empty())
    else {
        return Ok(None);
    };

    let port = match cli.port {
        Some(port) => port,
        None => env_number(PORT_ENV)?.unwrap_or(DEFAULT_PORT),
    };
    let query_timeout = match cli.query_timeout_ms {
        Some(ms) => Duration::from_millis(ms),
        None => env_number::<u64>(QUERY_TIMEOUT_ENV)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_QUERY_TIMEOUT),
    };

    let mut settings = Settings::new(Layout::resolve()?, dsn);
    settings.port = port;
    settings.cert = cli.cert.map(PathBuf::from);
    settings.key = cli.key.map(PathBuf::from);
    settings.debug = cli.debug;
    settings.query_timeout = query_timeout;
    Ok(Some(settings))
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("invalid {name}={raw:?}: {e}")),
        Err(_) => Ok(None),
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
