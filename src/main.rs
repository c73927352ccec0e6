use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use travelbook::api::AppState;
use travelbook::hotels::{HotelOffer, ResolvedOfferSet, StayHours};
use travelbook::{
    HotelSearchService, LocationQuery, SortOrder, TravelBookConfig, TravelBookError, VERSION,
    logging, web,
};

/// Hotel offer search over the Amadeus travel APIs
#[derive(Parser)]
#[command(name = "travelbook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print diagnostic output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search hotel offers in a city
    Search {
        /// City or locality name, e.g. "Delhi"
        #[arg(short, long)]
        location: String,

        /// Result order: price-asc, price-desc or popular
        #[arg(short, long)]
        sort: Option<SortOrder>,

        /// Also show the price of a short stay (3, 6, 12 or 24 hours)
        #[arg(long, value_parser = parse_stay_hours)]
        hours: Option<StayHours>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current state of a single offer
    Offer {
        /// Offer id as returned by a search
        #[arg(short, long)]
        id: String,
    },

    /// Run the JSON API server
    Serve {
        /// Listen port, overrides the configured one
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn parse_stay_hours(value: &str) -> std::result::Result<StayHours, String> {
    let hours: u32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of hours"))?;
    StayHours::try_from(hours).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TravelBookError>() {
                Some(err) => eprintln!("Error: {}", err.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = TravelBookConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    match cli.command {
        Some(Commands::Search {
            location,
            sort,
            hours,
            json,
        }) => {
            // Reject bad input before any credentials or network are involved
            let location = LocationQuery::new(location)?;
            let service = HotelSearchService::from_config(&config)?;

            if cli.verbose {
                eprintln!("Searching hotels in: {location}");
            }

            let mut offers = service.search(&location).await;
            if let Some(order) = sort {
                offers.sort_offers(order);
            }

            if json {
                let rendered = serde_json::to_string_pretty(&offers)
                    .context("Failed to serialize search result")?;
                println!("{rendered}");
            } else {
                print_search(&location, &offers, hours);
            }
        }
        Some(Commands::Offer { id }) => {
            let service = HotelSearchService::from_config(&config)?;
            match service.offer_details(&id).await? {
                Some(offer) => print_offer(&offer, None),
                None => bail!("Offer {} not found", id.trim()),
            }
        }
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.server.port);
            let service = HotelSearchService::from_config(&config)?;
            debug!(
                "Serving with batch concurrency {}",
                service.resolver().settings().max_concurrent_batches
            );
            web::run(
                port,
                AppState {
                    search: Arc::new(service),
                },
            )
            .await?;
        }
        None => print_overview(cli.config.as_deref(), cli.verbose, &config),
    }

    Ok(())
}

fn print_overview(config_path: Option<&Path>, verbose: bool, config: &TravelBookConfig) {
    println!("TravelBook v{VERSION}");
    println!("Hotel offer search over the Amadeus travel APIs");
    println!();

    if verbose {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(TravelBookConfig::resolve_config_path);
        println!("Using config from: {}", path.display());
        println!("Amadeus API: {}", config.amadeus.base_url);
        println!("Log level: {}", config.logging.level);
        println!(
            "Batch concurrency: {}",
            config.pipeline.max_concurrent_batches
        );
        println!();
    }

    if !config.amadeus.has_credentials() {
        println!("Amadeus credentials are not configured.");
        println!("Set AMADEUS_API_KEY and AMADEUS_API_SECRET, or add them to the [amadeus] section of");
        match TravelBookConfig::get_config_path() {
            Some(path) => println!("  {}", path.display()),
            None => println!("  config.toml"),
        }
        println!();
    }

    println!("Try: travelbook search --location Delhi");
    println!("Run 'travelbook --help' for all commands.");
}

fn print_search(location: &LocationQuery, result: &ResolvedOfferSet, hours: Option<StayHours>) {
    match result.city_code() {
        Some(city) => println!(
            "Hotels in {location} ({city}): {} offers from {} hotels",
            result.len(),
            result.hotel_count()
        ),
        None => println!("No hotels found for {location}"),
    }

    for issue in result.issues() {
        eprintln!("Warning: {issue}");
    }

    for offer in result.offers() {
        println!();
        print_offer(offer, hours);
    }
}

fn print_offer(offer: &HotelOffer, hours: Option<StayHours>) {
    let hotel = &offer.hotel;
    let stars = hotel
        .rating
        .map(|r| format!(" {}", "*".repeat(r.into())))
        .unwrap_or_default();
    println!("{}{} [{}]", hotel.name, stars, hotel.hotel_id);

    if let Some(address) = &hotel.address {
        println!("  {}", address.format_lines());
    }
    if !offer.available {
        println!("  Currently unavailable");
    }

    for room in &offer.offers {
        let category = room.room_category.as_deref().unwrap_or("Room");
        println!(
            "  {} {} to {} ({} nights): {} {}",
            category,
            room.check_in_date,
            room.check_out_date,
            room.nights(),
            room.price.total,
            room.price.currency
        );
        if let (Some(hours), Some(total)) = (hours, room.price.total_amount()) {
            println!(
                "    {} hour stay: {:.2} {}",
                hours.hours(),
                hours.price(total),
                room.price.currency
            );
        }
        println!("    offer id: {}", room.id);
    }
}
