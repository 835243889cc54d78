use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use tvdb_favourites::{
    Config, ConfigError, FavouritesError, ProgressEvent, RefreshPolicy, default_cache_path,
    print_slugs, refresh_cache,
};

/// Cache your TheTVDB favourite series and movies locally
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file (defaults to settings.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache file (defaults to the configured or platform cache file)
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Show diagnostic logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch all favourites from TheTVDB and replace the cache
    Refresh {
        /// Skip favourites that cannot be fetched instead of aborting
        #[arg(long)]
        skip_failures: bool,
    },
    /// List the cached favourites
    List,
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Connecting => {
            println!("Connecting to TVDB...");
        }
        ProgressEvent::FavouritesFetched {
            series_count,
            movie_count,
        } => {
            println!(
                "Found {} favourite series and {} favourite movie(s)\n",
                series_count, movie_count
            );
        }
        ProgressEvent::FetchingSeries { id } => {
            print!("Fetching series {} ", id);
            io::stdout().flush().ok();
        }
        ProgressEvent::FetchingMovie { id } => {
            print!("Fetching movie {} ", id);
            io::stdout().flush().ok();
        }
        ProgressEvent::SeriesResolved { slug, .. } | ProgressEvent::MovieResolved { slug, .. } => {
            print!(" '{}' .......... ", slug);
            io::stdout().flush().ok();
        }
        ProgressEvent::SeriesDone { .. } | ProgressEvent::MovieDone { .. } => {
            println!(" Done");
        }
        ProgressEvent::ItemFailed { message, .. } => {
            println!(" Failed: {}", message);
        }
        ProgressEvent::CacheWritten { path, entry_count } => {
            println!("\nCached {} favourite(s) in {}", entry_count, path.display());
        }
    }
}

/// Prints how to set up the credentials
fn print_missing_credentials(path: &std::path::Path) {
    println!("Please add the following keys to {}:", path.display());
    println!("[tvdb]\napi_key='Your API key'\napi_pin='Your API pin'\n");
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn config_path(cli: &Cli) -> Result<PathBuf, ConfigError> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Config::default_path(),
    }
}

fn run_refresh(cli: &Cli, skip_failures: bool) -> Result<(), FavouritesError> {
    let config_path = config_path(cli)?;

    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(ConfigError::MissingCredentials { path }) => {
            print_missing_credentials(&path);
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(cache_file) = &cli.cache_file {
        config.cache_file = Some(cache_file.clone());
    }

    let policy = if skip_failures {
        RefreshPolicy::SkipFailures
    } else {
        RefreshPolicy::Strict
    };

    let report = refresh_cache(&config, policy, handle_progress_event)?;

    if !report.failures.is_empty() {
        eprintln!("\n{} favourite(s) could not be fetched:", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {} {}: {}", failure.kind, failure.id, failure.error);
        }
    }

    Ok(())
}

fn run_list(cli: &Cli) -> Result<(), FavouritesError> {
    let cache_file = match &cli.cache_file {
        Some(path) => path.clone(),
        None => {
            // A configured cache file wins over the platform default, but the
            // listing itself does not need credentials
            match Config::load_cache_file(&config_path(cli)?)? {
                Some(path) => path,
                None => default_cache_path()?,
            }
        }
    };

    print_slugs(Some(&cache_file))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Command::Refresh { skip_failures } => run_refresh(&cli, *skip_failures),
        Command::List => run_list(&cli),
    };

    if let Err(e) = result {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
