/*!
 * psbridge CLI - version table and connection diagnostics
 */

use clap::{Parser, Subcommand};
use psbridge::{
    config::AutomationConfig,
    error::{Result, EXIT_SUCCESS},
    install, logging, version,
};

#[derive(Parser)]
#[command(name = "psbridge")]
#[command(version, about = "Inspect Photoshop versions and automation identifiers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the release label to identifier suffix table
    Versions {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the program identifier a version hint resolves to
    Progid {
        /// Object class, e.g. Application or BMPSaveOptions
        #[arg(value_name = "CLASS")]
        class: String,

        /// Release label (2024) or identifier suffix (180)
        #[arg(short = 'v', long = "version", value_name = "VERSION")]
        version: Option<String>,
    },

    /// List the versions registered on this machine, newest first
    Installed {
        /// Emit JSON instead of one version per line
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AutomationConfig::from_env();

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Versions { json } => print_versions(json),
        Commands::Progid { class, version } => {
            print_program_id(&config, &class, version.as_deref());
            Ok(())
        }
        Commands::Installed { json } => print_installed(&config, json),
    }
}

fn print_versions(json: bool) -> Result<()> {
    let table = version::table();
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("{:<6} {:<6}", "YEAR", "SUFFIX");
    for entry in &table {
        println!("{:<6} {:<6}", entry.year, entry.suffix);
    }
    Ok(())
}

fn print_program_id(config: &AutomationConfig, class: &str, hint: Option<&str>) {
    let suffix = config.version.as_deref().or(hint).map(version::normalize);
    println!(
        "{}",
        version::program_id(&config.vendor_root, class, suffix.as_deref())
    );
}

fn print_installed(config: &AutomationConfig, json: bool) -> Result<()> {
    let index = install::default_install_index(&config.registry_path);
    let keys = match index.installed_versions() {
        Ok(keys) => keys,
        Err(e) => {
            tracing::debug!("Unable to read installed versions: {}", e);
            Vec::new()
        }
    };
    let versions = install::version_prefixes(&keys);

    if json {
        let rows: Vec<serde_json::Value> = versions
            .iter()
            .map(|suffix| {
                serde_json::json!({
                    "suffix": suffix,
                    "year": version::year_for_suffix(suffix),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if versions.is_empty() {
        println!("No installed versions found");
    }
    for suffix in &versions {
        match version::year_for_suffix(suffix) {
            Some(year) => println!("{} ({})", suffix, year),
            None => println!("{}", suffix),
        }
    }
    Ok(())
}
