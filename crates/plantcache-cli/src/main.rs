//! plantcache - a garden planting catalog in your terminal.
//!
//! Fetches the published plant catalog, caches it locally for offline
//! use, and prints the roster filtered by grow zone and ordered by the
//! curator's custom sort.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plantcache_core::{
    ApiClient, Config, Plant, PlantListViewModel, PlantRepository, PlantStore,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[derive(Debug, Default)]
struct CliArgs {
    zone: Option<i32>,
    watch: bool,
    base_url: Option<String>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--zone" | "-z" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--zone requires a number"))?;
                cli.zone = Some(value.parse().context("Invalid grow zone number")?);
            }
            "--watch" | "-w" => cli.watch = true,
            "--base-url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--base-url requires a URL"))?;
                cli.base_url = Some(value.clone());
            }
            "--help" | "-h" => cli.help = true,
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(cli)
}

fn print_usage() {
    eprintln!("Usage: plantcache [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -z, --zone <N>      Only show plants for grow zone N");
    eprintln!("  -w, --watch         Keep printing the roster as it changes");
    eprintln!("      --base-url <U>  Use catalog base URL U (persisted to config)");
    eprintln!("  -h, --help          Show this help");
}

/// Truncate a string to a maximum length, adding ellipsis if needed
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn print_roster(plants: &[Plant], store: &PlantStore) {
    if plants.is_empty() {
        println!("No plants cached (roster {})", store.age_display());
        return;
    }

    println!("{} plants (cached {})", plants.len(), store.age_display());
    for plant in plants {
        println!(
            "  {:<28} zone {:>2}  {}",
            truncate(&plant.name, 28),
            plant.grow_zone_number,
            plant.watering_summary()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(error) => {
            eprintln!("error: {}", error);
            print_usage();
            std::process::exit(2);
        }
    };
    if args.help {
        print_usage();
        return Ok(());
    }

    info!("plantcache starting");

    let mut config = Config::load()?;
    if let Some(base_url) = args.base_url {
        config.base_url = Some(base_url);
        config.save()?;
    }

    let client = match config.base_url {
        Some(ref url) => ApiClient::with_base_url(url.clone())?,
        None => ApiClient::new()?,
    };
    let store = Arc::new(PlantStore::open(config.cache_dir()?)?);
    let repository = Arc::new(PlantRepository::new(Arc::new(client), Arc::clone(&store)));
    let view_model = PlantListViewModel::new(repository);

    if let Some(zone) = args.zone.or(config.default_grow_zone) {
        view_model.set_grow_zone(zone);
    }

    run(&view_model, &store, args.watch).await?;

    info!("plantcache shutting down");
    Ok(())
}

/// Drive the view model's channels: print each roster snapshot in
/// watch mode, or wait for the initial refresh to settle and print the
/// final roster once.
async fn run(
    view_model: &PlantListViewModel<ApiClient>,
    store: &PlantStore,
    watch_mode: bool,
) -> Result<()> {
    let mut plants = view_model.plants();
    let mut spinner = view_model.spinner();
    let mut snack_bar = view_model.snack_bar();
    let mut refresh_seen = false;

    loop {
        tokio::select! {
            changed = spinner.changed() => {
                if changed.is_err() {
                    break;
                }
                let loading = *spinner.borrow_and_update();
                if loading {
                    refresh_seen = true;
                } else if !watch_mode && (refresh_seen || store.last_refreshed().is_some()) {
                    // Refresh settled (or had already settled before we
                    // subscribed): print and exit
                    break;
                }
            }
            changed = snack_bar.changed() => {
                if changed.is_err() {
                    break;
                }
                let message = snack_bar.borrow_and_update().clone();
                if let Some(message) = message {
                    eprintln!("error: {}", message);
                    view_model.on_snack_bar_shown();
                    if !watch_mode {
                        break;
                    }
                }
            }
            changed = plants.changed() => {
                if changed.is_err() {
                    break;
                }
                if watch_mode {
                    let snapshot = plants.borrow_and_update().clone();
                    print_roster(&snapshot, store);
                }
            }
        }
    }

    if !watch_mode {
        let snapshot = plants.borrow().clone();
        print_roster(&snapshot, store);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("plantcache")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args_zone_and_watch() {
        let cli = parse_args(&args(&["--zone", "9", "-w"])).unwrap();
        assert_eq!(cli.zone, Some(9));
        assert!(cli.watch);
        assert!(!cli.help);
    }

    #[test]
    fn test_parse_args_rejects_unknown_flags() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["--zone"])).is_err());
        assert!(parse_args(&args(&["--zone", "nine"])).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Fern", 10), "Fern");
        assert_eq!(truncate("Chrysanthemum morifolium", 10), "Chrysan...");
    }
}
