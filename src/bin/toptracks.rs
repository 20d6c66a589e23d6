//! Fetch an artist's top tracks, rank them by popularity and plot
//! duration and valence against popularity.
//!
//! Usage:
//!   toptracks [ARTIST] [--market CC] [--head N] [--no-plot] [-v]
//!   toptracks spotify:artist:4Z8W4fKeB5YxbusRsdQVPb --save-defaults
//!
//! Credentials come from --client-id/--client-secret, the CLIENT_ID and
//! CLIENT_SECRET environment variables (also read from a .env file), or
//! spotify_credentials.toml.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use toptracks::config::{self, Config, Credentials};
use toptracks::{aggregate, fetch_tracks, parse_artist_id, plot, report, SpotifyClient};

#[derive(Debug, Parser)]
#[command(version, about = "Rank an artist's top tracks and plot their audio features")]
struct Args {
    /// Artist as spotify:artist:<id>, open.spotify.com URL or bare id
    artist: Option<String>,

    /// Market (ISO country code) for the top-track list
    #[arg(long)]
    market: Option<String>,

    /// Number of table rows to print
    #[arg(long)]
    head: Option<usize>,

    /// Print the tables only, skip the plots
    #[arg(long)]
    no_plot: bool,

    #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Save the given artist/market/head/no-plot options as defaults and exit
    #[arg(long)]
    save_defaults: bool,

    /// Show the saved defaults and exit
    #[arg(long)]
    show_saved_defaults: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn cmdline_config(&self) -> Config {
        Config {
            artist: self.artist.clone(),
            market: self.market.clone(),
            head_rows: self.head,
            no_plot: self.no_plot.then_some(true),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args, config: &Config) -> toptracks::Result<()> {
    let artist_id = parse_artist_id(config.artist())?;
    let credentials = Credentials::resolve(args.client_id.clone(), args.client_secret.clone())?;

    let client = SpotifyClient::connect(&credentials, config.market())?;
    let records = aggregate(fetch_tracks(&client, &artist_id)?);
    info!("{} tracks aggregated", records.len());

    let mut stdout = io::stdout().lock();
    report::print_ranking(&mut stdout, &records)?;
    writeln!(stdout)?;
    report::print_head(&mut stdout, &records, config.head_rows())?;
    drop(stdout);

    if config.no_plot() {
        return Ok(());
    }
    if records.is_empty() {
        println!();
        println!("No tracks to plot.");
        return Ok(());
    }

    plot::show(&plot::duration_vs_popularity(&records))?;
    plot::show(&plot::valence_vs_popularity(&records))?;
    Ok(())
}

fn main() {
    // Before parsing so .env values reach the CLIENT_ID/CLIENT_SECRET args
    config::init_environment();
    let args = Args::parse();
    init_tracing(args.verbose);

    // Load saved defaults from config file if available
    let saved_config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring saved defaults: {}", e);
        Config::new()
    });

    if args.show_saved_defaults {
        match Config::get_config_path() {
            Ok(path) if path.exists() => saved_config.print("Saved defaults"),
            Ok(path) => {
                println!("No saved defaults file found at {:?}", path);
                println!("Use --save-defaults to create one.");
            }
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    if args.save_defaults {
        let mut config_to_save = saved_config.clone();
        config_to_save.merge(&args.cmdline_config());

        match config_to_save.save() {
            Ok(path) => {
                println!("Defaults saved to {:?}", path);
                println!();
                config_to_save.print("Saved configuration");
                return;
            }
            Err(e) => {
                eprintln!("Error saving defaults: {}", e);
                process::exit(1);
            }
        }
    }

    // Built-in defaults < saved defaults < command line
    let mut effective_config = saved_config;
    effective_config.merge(&args.cmdline_config());

    if let Err(e) = run(&args, &effective_config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
