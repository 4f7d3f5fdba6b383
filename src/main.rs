use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use works_index::query::{QueryEngine, ViewParams};
use works_index::{config, output};

#[derive(Parser)]
#[command(name = "works-index")]
#[command(about = "Index artist folders of images and JSON sidecars, and query them")]
#[command(long_about = "\
Index artist folders of images and JSON sidecars, and query them

Every numeric directory under the works root is one artist. Without any,
the root itself is treated as a single artist.

Works structure:

  works/
  ├── config.toml                # Optional settings (see gen-config)
  ├── 1001/                      # Artist (numeric name)
  │   ├── 88100_p0.jpg           # Page 0 of post 88100
  │   ├── 88100_p0.jpg.json      # Sidecar metadata for that file
  │   └── 88100_p1.jpg           # Page 1, no sidecar
  └── 1002/
      └── 9001.png

Post grouping (first match wins):
  9001 + sidecar id 900   → post 900, page 1
  88100_p1 / 88100-p1 / 88100_1 → post 88100, page 1
  anything else           → post = sidecar id or first number, page 0

Every query re-reads the folder, so results always reflect the disk.")]
#[command(version)]
struct Cli {
    /// Works root containing artist directories (or one artist's files)
    #[arg(long, env = "WORKS_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one view and print it as JSON
    Query(QueryArgs),
    /// Print an inventory of artists and their pictures
    Scan {
        /// List every picture under its artist
        #[arg(long)]
        items: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// View parameters, passed through unvalidated: the engine normalizes them.
#[derive(clap::Args)]
struct QueryArgs {
    /// Artist id, or "all"
    #[arg(long)]
    artist: Option<String>,

    /// Tag filter; repeatable and comma-separated
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Case-insensitive title substring
    #[arg(long)]
    title: Option<String>,

    /// Collapse multi-page posts (1/true/yes)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    group_by_post: Option<String>,

    /// Page number, starting at 1
    #[arg(long, allow_hyphen_values = true)]
    page: Option<String>,

    /// Page size: one of the configured sizes, or "all"
    #[arg(long, allow_hyphen_values = true)]
    per_page: Option<String>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Print a short summary to stderr as well
    #[arg(long)]
    summary: bool,
}

impl From<&QueryArgs> for ViewParams {
    fn from(args: &QueryArgs) -> Self {
        ViewParams {
            artist: args.artist.clone(),
            tags: args.tags.clone(),
            title: args.title.clone(),
            group_by_post: args.group_by_post.clone(),
            page: args.page.clone(),
            per_page: args.per_page.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Query(args) => {
            let engine = open_engine(cli.root)?;
            let view = engine.resolve_view(&ViewParams::from(&args));
            let json = if args.compact {
                serde_json::to_string(&view)?
            } else {
                serde_json::to_string_pretty(&view)?
            };
            println!("{}", json);
            if args.summary {
                for line in output::format_view_summary(&view) {
                    eprintln!("{}", line);
                }
            }
        }
        Command::Scan { items } => {
            let engine = open_engine(cli.root)?;
            println!("==> Scanning {}", engine.root().display());
            let index = engine.build_index();
            output::print_library(&index, items);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load config from the works root and build the engine.
fn open_engine(root: Option<PathBuf>) -> Result<QueryEngine, Box<dyn std::error::Error>> {
    let root = root.ok_or("a works root is required: pass --root or set WORKS_ROOT")?;
    let config = config::load_config(&root)?;
    tracing::info!(root = %root.display(), "using works root");
    Ok(QueryEngine::new(root, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_args(argv: &[&str]) -> QueryArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Query(args) => args,
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn negative_page_values_reach_the_engine() {
        let args = query_args(&["works-index", "query", "--page", "-2", "--per-page", "-20"]);
        let params = ViewParams::from(&args);
        assert_eq!(params.page.as_deref(), Some("-2"));
        assert_eq!(params.per_page.as_deref(), Some("-20"));
    }

    #[test]
    fn bare_group_by_post_means_true() {
        let args = query_args(&["works-index", "query", "--group-by-post", "--tag", "sea"]);
        assert_eq!(args.group_by_post.as_deref(), Some("true"));
        assert_eq!(args.tags, vec!["sea"]);
    }
}
