use clap::{Parser, Subcommand};
use sitesmith::{config, gallery, output, post, reading};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(about = "Maintenance tools for a hand-written static site")]
#[command(long_about = "\
Maintenance tools for a hand-written static site

Pages stay hand-edited HTML. Each tool rewrites only the parts it owns,
located by literal anchor text, and leaves every other byte alone.

Site layout (defaults, all configurable):

  site/
  ├── sitesmith.toml               # Optional config (see gen-config)
  ├── aiprojs.html                 # Gallery page
  ├── projdesc.md                  # '# name' + description per project
  ├── images/                      # Flat image directory
  │   ├── arss_1.png               # <project>_<n>[.<m>][_label].ext
  │   └── ulysquotC00001.png       # continuation series after the main one
  ├── wroteindex.html              # Post index, entries after the first <p>
  └── readindex.html               # Reading index ('in progress' section)

Run 'sitesmith gen-config' to print a documented sitesmith.toml.")]
#[command(version)]
struct Cli {
    /// Base directory that configured paths resolve against
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/sitesmith.toml, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the gallery page's project blocks and image manifest
    Gallery {
        /// Only update thumbnails and image counts, keep project blocks
        #[arg(long)]
        thumbs_only: bool,
        /// Fail when an anchor is missing instead of skipping the region
        #[arg(long)]
        strict: bool,
        /// Print the discovered projects and images as JSON, change nothing
        #[arg(long, conflicts_with_all = ["thumbs_only", "strict"])]
        json: bool,
    },
    /// Render a markdown post and link it from the indexes
    Post {
        /// Post source: title line, date line, markdown body
        file: PathBuf,
    },
    /// Sync the reading progress list into the reading index
    Reading {
        /// Year to file finished books under (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Print a stock sitesmith.toml with all options documented
    GenConfig,
}

impl Cli {
    fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::ERROR
        } else {
            Level::INFO
        }
    }
}

fn setup_logger(level: Level) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{
        Registry, filter::LevelFilter, fmt::layer, layer::SubscriberExt,
        util::SubscriberInitExt,
    };

    Registry::default()
        .with(LevelFilter::from(level))
        .with(
            layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}

fn current_year() -> i32 {
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .year()
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; usage errors fail with 1.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = setup_logger(cli.log_level()) {
        eprintln!("Error: cannot set up logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let root = cli.root.as_path();
    let load_config = || config::load_config(root, cli.config.as_deref());

    match &cli.command {
        Command::Gallery {
            thumbs_only,
            strict,
            json,
        } => {
            let site_config = load_config()?;
            if *json {
                let plan = gallery::plan(&site_config.gallery, root)?;
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                let options = gallery::GalleryOptions {
                    thumbs_only: *thumbs_only,
                    strict: *strict,
                };
                let report = gallery::update_gallery(&site_config.gallery, root, options)?;
                output::print_gallery_report(&report, root);
            }
        }
        Command::Post { file } => {
            let site_config = load_config()?;
            let report = post::publish(file, &site_config.post, root)?;
            output::print_publish_report(&report, root);
        }
        Command::Reading { year } => {
            let site_config = load_config()?;
            let year = year.unwrap_or_else(current_year);
            let report = reading::sync_reading(&site_config.reading, root, year)?;
            output::print_reading_report(&report, root);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
