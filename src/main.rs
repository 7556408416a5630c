use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pandoc_probe::config::Config;
use pandoc_probe::{Pandoc, ProbeError, VersionReq};

mod logging;

/// Exit status when the installed pandoc does not satisfy `check`
const EXIT_UNSATISFIED: i32 = 1;

/// Exit status when pandoc could not be probed at all
const EXIT_PROBE_FAILED: i32 = 2;

#[derive(Parser)]
#[command(name = "pandoc-probe")]
#[command(about = "Detect the installed pandoc version")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path or command name of pandoc (default: `pandoc` on PATH)
    #[arg(short, long, global = true)]
    path: Option<String>,

    /// Give up after this many seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Exit non-zero unless the installed version satisfies a requirement
    Check {
        /// Version requirement, e.g. ">=2.11" or ">=2.11, <4"
        requirement: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;
    logging::init_logging(&config, cli.debug)?;

    // Reject a malformed requirement before spending a process on the probe
    let requirement = match &cli.command {
        Some(Commands::Check { requirement }) => Some(
            VersionReq::parse(requirement)
                .with_context(|| format!("Invalid version requirement '{}'", requirement))?,
        ),
        None => None,
    };

    let location = cli.path.or(config.pandoc.path.clone());
    let timeout = cli
        .timeout
        .map(std::time::Duration::from_secs)
        .or(config.pandoc.timeout());

    let probed = match timeout {
        Some(timeout) => Pandoc::new_with_timeout(location.as_deref(), timeout).await,
        None => Pandoc::new(location.as_deref()).await,
    };

    let pandoc = match probed {
        Ok(pandoc) => pandoc,
        Err(err) => {
            print_probe_error(&err);
            std::process::exit(EXIT_PROBE_FAILED);
        }
    };

    print_pandoc(&pandoc, cli.json)?;

    if let Some(requirement) = requirement {
        if !pandoc.satisfies(&requirement) {
            eprintln!(
                "pandoc {} does not satisfy '{}'",
                pandoc.version(),
                requirement
            );
            std::process::exit(EXIT_UNSATISFIED);
        }
        tracing::debug!(%requirement, version = %pandoc.version(), "requirement satisfied");
    }

    Ok(())
}

fn print_pandoc(pandoc: &Pandoc, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(pandoc).context("Failed to serialize result")?;
        println!("{}", out);
    } else {
        println!("{}", pandoc);
    }
    Ok(())
}

/// Print a helpful error message for probe failures
fn print_probe_error(err: &ProbeError) {
    eprintln!("Error: {}", err);

    match err {
        ProbeError::NotInstalled { .. } => {
            eprintln!();
            eprintln!("Install pandoc:");
            eprintln!("  macOS:         brew install pandoc");
            eprintln!("  Ubuntu/Debian: sudo apt install pandoc");
            eprintln!("  Fedora/RHEL:   sudo dnf install pandoc");
            eprintln!("  Windows:       winget install --source winget --exact --id JohnMacFarlane.Pandoc");
            eprintln!();
            eprintln!("or pass --path to point at an existing binary.");
        }
        ProbeError::Parse { .. } => {
            eprintln!();
            eprintln!("The first line of `--version` output is not a semantic version.");
            eprintln!("Check that --path points at pandoc.");
        }
        ProbeError::Timeout { .. } => {
            eprintln!();
            eprintln!("Try a larger --timeout.");
        }
        _ => {}
    }
}
