use anyhow::{Context, Result};
use clap::Parser;
use listing_scout::models::{Category, Country, Furnishing, RentalPeriod, SortBy};
use listing_scout::sinks::Sink;
use listing_scout::{
    run_session, Cli, CsvFileSink, JsonFileSink, OutputFormat, PageFetcher, PaginationController,
    RequestDecorator, UploadStatus,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose {
        "listing_scout=debug,info"
    } else {
        "listing_scout=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_options() {
    println!("Countries:");
    for country in Country::ALL {
        println!("  {}: {}", country.code(), country.label());
        for location in country.locations() {
            println!("      {}: {}", location.id, location.name);
        }
    }

    println!("Categories:");
    for option in Category::ALL {
        println!("  {}: {}", option.code(), option.label());
    }
    println!("Furnishing:");
    for option in Furnishing::ALL {
        println!("  {}: {}", option.code(), option.label());
    }
    println!("Rental periods:");
    for option in RentalPeriod::ALL {
        println!("  {}: {}", option.code(), option.label());
    }
    println!("Sort orders:");
    for option in SortBy::ALL {
        println!("  {}: {}", option.code(), option.label());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine, settings can come from the environment or flags
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if cli.list_options {
        print_options();
        return Ok(());
    }

    init_logging(cli.verbose);

    let query = cli.query().context("Invalid search query")?;
    let config = cli.session_config().context("Invalid configuration")?;

    info!("🏠 Listing Scout");
    info!("==========================================");
    info!(
        "Searching {} location {} (category {}, furnishing {}, period {}, sort {})",
        query.country().label(),
        query.location(),
        query.category().label(),
        query.furnishing().label(),
        query.rental_period().label(),
        query.sort_by().label()
    );

    let decorator = match &cli.user_agents {
        Some(path) => RequestDecorator::from_file(path, config.relay.clone()),
        None => RequestDecorator::new(config.relay.clone()),
    };
    let fetcher = PageFetcher::from_config(&config, decorator)
        .context("Failed to create page fetcher")?;
    let controller = PaginationController::new(fetcher, &config);

    let sink: Box<dyn Sink> = match cli.format {
        OutputFormat::Json => Box::new(JsonFileSink::new(&cli.output_dir)),
        OutputFormat::Csv => Box::new(CsvFileSink::new(&cli.output_dir)),
    };

    let report = run_session(&controller, sink.as_ref(), &query).await;

    info!(
        "✅ {} records from {} pages, stopped on {}",
        report.record_count, report.page_count, report.terminal
    );
    match report.upload {
        UploadStatus::Uploaded => info!("💾 Output saved under {}", cli.output_dir.display()),
        UploadStatus::NothingToUpload => info!("Nothing to save"),
        UploadStatus::Failed(reason) => warn!("Records were fetched but not saved: {}", reason),
    }

    Ok(())
}
