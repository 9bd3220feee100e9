use clap::{Parser, Subcommand};
use pressroom::{config, output, site};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[derive(Parser)]
#[command(name = "pressroom")]
#[command(about = "Static site builder for pages, dated posts and an RSS feed")]
#[command(long_about = "\
Static site builder for pages, dated posts and an RSS feed

Source structure:

  site/
  ├── config.toml                  # Optional settings (see gen-config)
  ├── index.md                     # Required home page
  ├── header.md                    # Required, spliced into every document
  ├── footer.md                    # Required
  ├── about.md                     # Page → about.html
  ├── style/style.css              # Required (.scss/.sass also accepted)
  ├── images/favicon.ico           # Optional, copied as is
  ├── posts/
  │   ├── 2024-01-05-hello.md      # Post → posts/hello.html, title \"Hello\"
  │   └── 2024-02-01-trip_Away.md  # Post → posts/trip.html, title \"Away\"
  └── notes/reading-list.md        # Page → reading-list.html

The header declares the feed with <rss-title>, <rss-description> and
<rss-link>. Pages may embed <archive count=\"5\" more=\"archive\"></archive>
to list recent posts.

Output goes to a sibling directory named after the source with a -built
suffix unless --output is given.")]
#[command(version)]
struct Cli {
    /// Log debug detail (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the output directory
    Build {
        /// Source directory
        source: PathBuf,
        /// Output directory (default: <source>-built next to the source)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Validate the source tree and list its posts without writing anything
    Check {
        /// Source directory
        source: PathBuf,
        /// Print the post registry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build { source, output } => {
            info!(source = %source.display(), "building");
            let report = site::build(
                &source,
                output.as_deref(),
                &site::NoStyleCompiler,
                chrono::Utc::now(),
            )?;
            output::print_build_output(&report);
        }
        Command::Check { source, json } => {
            let report = site::check(&source)?;
            debug!(posts = report.registry.len(), "source checked");
            if json {
                println!("{}", serde_json::to_string_pretty(&report.registry)?);
            } else {
                output::print_check_output(&report);
                println!("==> Source is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for summaries and JSON.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tfmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
