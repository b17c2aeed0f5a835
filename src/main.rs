use anyhow::Result;
use clap::Parser;
use modlink::commands::{self, ConfigOverrides, DEFAULT_PORT};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// modlink - toggle game mods by symlinking them into the extensions directory
///
/// Mods live as folders in a managed mods directory. Installing a mod creates
/// a symlink with the same name in the game's extensions directory;
/// uninstalling removes only that link.
///
/// On Windows, creating symlinks needs Developer Mode or an elevated prompt.
///
/// Examples:
///   modlink serve                  # Open the web UI on http://127.0.0.1:9480
///   modlink status                 # Show every mod and its state
///   modlink install MyMod          # Link mods/MyMod into the extensions directory
#[derive(Parser, Debug)]
#[command(author, version = env!("MODLINK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to <config dir>/modlink/config.json)
    #[arg(long = "config", env = "MODLINK_CONFIG", value_name = "PATH", global = true)]
    pub config_path: Option<PathBuf>,

    /// Managed mods directory (overrides the settings file)
    #[arg(long = "source", env = "MODLINK_SOURCE", value_name = "DIR", global = true)]
    pub source_root: Option<PathBuf>,

    /// Game extensions directory (overrides the settings file)
    #[arg(long = "target", env = "MODLINK_TARGET", value_name = "DIR", global = true)]
    pub target_root: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config_path.clone(),
            source_root: self.source_root.clone(),
            target_root: self.target_root.clone(),
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the web UI and JSON API
    Serve(ServeArgs),

    /// Show every mod found in either directory
    Status(StatusArgs),

    /// Link a mod into the extensions directory
    Install(NameArgs),

    /// Remove a mod's link from the extensions directory
    Uninstall(NameArgs),

    /// Remove a broken link from the extensions directory
    Cleanup(NameArgs),

    /// Delete a mod's folder from the mods directory
    Delete(NameArgs),

    /// Show the effective settings
    Config(ConfigArgs),

    /// Check whether symlinks can be created
    Privilege,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct NameArgs {
    /// Folder name of the mod
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Validate the directories and write them to the settings file
    #[arg(long)]
    pub save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = modlink::runtime::RealRuntime;
    let overrides = cli.overrides();

    match cli.command {
        Commands::Serve(args) => commands::serve(runtime, overrides, args.host, args.port).await?,
        Commands::Status(args) => commands::status(runtime, overrides, args.json)?,
        Commands::Install(args) => commands::install(runtime, overrides, &args.name)?,
        Commands::Uninstall(args) => commands::uninstall(runtime, overrides, &args.name)?,
        Commands::Cleanup(args) => commands::cleanup(runtime, overrides, &args.name)?,
        Commands::Delete(args) => commands::delete(runtime, overrides, &args.name)?,
        Commands::Config(args) => commands::config(runtime, overrides, args.save)?,
        Commands::Privilege => commands::privilege(runtime)?,
    }
    Ok(())
}
