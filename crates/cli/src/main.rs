use clap::{Parser, Subcommand};
use lib::config::{load_config, resolve_port, resolve_tenants};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Multi-tenant chat callback relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Load the configuration, validate every tenant, and print a summary.
    Check {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the gateway (one callback endpoint per tenant).
    Serve {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Listen port (default from PORT env, config, or 4000)
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Check { config }) => {
            if let Err(e) = run_check(config) {
                log::error!("check failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_check(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, path) = load_config(config_path)?;
    let tenants = resolve_tenants(&config)?;
    println!("config: {}", path.display());
    println!("{} tenant(s):", tenants.len());
    for (name, tenant) in &tenants {
        println!("  /{}/callback  {:?}", name, tenant.behavior_type);
    }
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = load_config(config_path)?;
    log::info!("config loaded from {}", path.display());
    let tenants = resolve_tenants(&config)?;
    log::info!("loaded {} callback configuration(s)", tenants.len());
    config.server.port = port.unwrap_or_else(|| resolve_port(&config));
    lib::gateway::run_gateway(config, tenants).await
}
