use anyhow::Result;
use clap::Parser;
use keepup::commands;
use std::path::PathBuf;

/// keepup - keep host packages up to date
///
/// Checks the packages listed in the configuration file against the newest
/// published versions and installs the ones that are behind.
///
/// If the GITHUB_TOKEN environment variable is set, it is used for the
/// release API unless the configuration provides a token.
///
/// Examples:
///   keepup update            # Check and update every configured package
///   keepup update rg helm    # Only these packages
///   keepup install rg        # First install of a configured package
#[derive(Parser, Debug)]
#[command(author, version = env!("KEEPUP_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (also via KEEPUP_CONFIG)
    #[arg(
        long = "config",
        short = 'c',
        env = "KEEPUP_CONFIG",
        value_name = "PATH",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Check configured packages and update those that are behind
    Update(UpdateArgs),

    /// Install a configured package that is not installed yet
    Install(InstallArgs),
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Only check these packages
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Package name as configured
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = keepup::runtime::RealRuntime;

    match cli.command {
        Commands::Update(args) => {
            commands::update(runtime, cli.config, cli.api_url, &args.names).await?;
        }
        Commands::Install(args) => {
            commands::install(runtime, cli.config, cli.api_url, &args.name).await?
        }
    }
    Ok(())
}
