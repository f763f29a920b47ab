//! Covenant Gateway - Entry point

use std::path::PathBuf;

use anyhow::Context;
use covenant_config::ConfigLoader;
use covenant_server::Server;
use covenant_telemetry::{init_logging, LogConfig};
use tracing::info;

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = std::env::var_os("COVENANT_CONFIG").map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("covenant-gateway {}", covenant_server::VERSION);
                    std::process::exit(0);
                }
                path if !path.starts_with('-') => {
                    config = Some(PathBuf::from(path));
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Covenant Gateway - contract-driven request authorization

USAGE:
    covenant-gateway [OPTIONS] [CONFIG]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    COVENANT_CONFIG                    Configuration file, if --config is absent
    COVENANT__SERVER__HTTP_ADDR        Bind address (default: 0.0.0.0:8080)
    COVENANT__MANIFEST__ROOT           Manifest directory
    COVENANT__LOGGING__LEVEL           Log filter directive (default: info)
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new()
        .with_defaults()
        .with_dotenv()
        .context("failed to load .env")?;
    if let Some(path) = &args.config {
        loader = loader
            .with_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    let config = loader
        .with_env_prefix("COVENANT")
        .load()
        .context("invalid configuration")?;

    init_logging(&LogConfig::from(&config.logging)).context("failed to initialize logging")?;
    info!(
        version = covenant_server::VERSION,
        addr = %config.server.http_addr,
        manifest = %config.manifest.root.display(),
        "starting covenant gateway"
    );

    Server::from_config(&config)
        .context("failed to build server")?
        .run()
        .await
        .context("server error")
}
