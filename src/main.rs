use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use modfind::ModuleReference;
use modfind::finder::{self, ModuleFinder};

/// modfind - locate modules on a module path or in a runtime installation
///
/// Modules are looked up on the module path first, then in the installation
/// given with --home.
///
/// Examples:
///   modfind -p mods:lib list            # List every module on the path
///   modfind --home /opt/jdk find java.sql
///   modfind -p mods describe com.app    # Print the descriptor as JSON
#[derive(Parser, Debug)]
#[command(author, version = env!("MODFIND_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Module path, in the platform's path-list syntax (also via MODFIND_MODULE_PATH)
    #[arg(
        long = "module-path",
        short = 'p',
        env = "MODFIND_MODULE_PATH",
        value_name = "PATHS",
        global = true
    )]
    pub module_path: Option<OsString>,

    /// Root of a runtime installation (also via MODFIND_HOME)
    #[arg(long = "home", env = "MODFIND_HOME", value_name = "DIR", global = true)]
    pub home: Option<PathBuf>,

    /// Log discovery details to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List all modules that can be found
    List,

    /// Print where a module is located
    Find(NameArgs),

    /// Print the descriptor of a module as JSON
    Describe(NameArgs),
}

#[derive(clap::Args, Debug)]
pub struct NameArgs {
    /// The module name, e.g. "java.sql"
    #[arg(value_name = "NAME")]
    pub name: String,
}

fn build_finder(cli: &Cli) -> Result<Box<dyn ModuleFinder>> {
    let on_path = cli
        .module_path
        .as_ref()
        .map(|paths| finder::of(std::env::split_paths(paths)));
    let installed = match &cli.home {
        Some(home) => Some(
            finder::of_installed(home)
                .with_context(|| format!("Failed to open installation {}", home.display()))?,
        ),
        None => None,
    };

    let finder: Box<dyn ModuleFinder> = match (on_path, installed) {
        (Some(path), Some(installed)) => Box::new(finder::concat(path, installed)),
        (Some(path), None) => Box::new(path),
        (None, Some(installed)) => Box::new(installed),
        (None, None) => bail!("Nothing to search: pass --module-path or --home"),
    };
    Ok(finder)
}

fn location(module: &ModuleReference) -> String {
    module
        .location()
        .map(|url| url.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn lookup(finder: &mut dyn ModuleFinder, name: &str) -> Result<ModuleReference> {
    match finder.find(name)? {
        Some(module) => Ok(module),
        None => bail!("Module {} not found", name),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut finder = build_finder(&cli)?;

    match &cli.command {
        Commands::List => {
            for module in finder.find_all()? {
                println!(
                    "{} {}",
                    module.descriptor().to_name_and_version(),
                    location(&module)
                );
            }
        }
        Commands::Find(args) => {
            let module = lookup(finder.as_mut(), &args.name)?;
            println!("{}", location(&module));
        }
        Commands::Describe(args) => {
            let module = lookup(finder.as_mut(), &args.name)?;
            println!("{}", serde_json::to_string_pretty(module.descriptor())?);
        }
    }
    Ok(())
}
