//! Command-line front end for Barkeep whisky recommendations.
//!
//! Usage:
//!     barkeep recommend carrie --count 5
//!     barkeep analyze --file bar.json --format json
//!     barkeep catalog --region Scotland --max-price 80

use anyhow::{bail, Context, Result};
use barkeep_backend_baxus::{parse_bar, BaxusBackend, BaxusConfig, InventorySource};
use barkeep_catalog::CatalogHandle;
use barkeep_explain::explain_clauses;
use barkeep_model::{CatalogBottle, OwnedBottleEntry, Region};
use barkeep_recommend::{recommend, RecommendConfig, Recommendations};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "barkeep")]
#[command(about = "Recommend whisky bottles from a BAXUS bar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog dataset (JSON); defaults to the bundled catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// BAXUS API base URL
    #[arg(long, global = true, default_value = "https://services.baxus.co/api")]
    baxus_url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend bottles for a BAXUS user
    Recommend {
        /// BAXUS username
        username: String,

        /// Number of recommendations
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Recommend bottles for a bar stored in a local JSON file
    Analyze {
        /// Path to a bar export (array of entries or {"bar": [...]})
        #[arg(long)]
        file: PathBuf,

        /// Number of recommendations
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// List catalog bottles
    Catalog {
        /// Only bottles from this region
        #[arg(long)]
        region: Option<String>,

        /// Only bottles of this spirit type
        #[arg(long)]
        spirit: Option<String>,

        /// Minimum MSRP
        #[arg(long, default_value = "0")]
        min_price: f64,

        /// Maximum MSRP
        #[arg(long)]
        max_price: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("barkeep=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => CatalogHandle::load(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => CatalogHandle::shared().context("Failed to load bundled catalog")?,
    };
    tracing::debug!(bottles = catalog.len(), "Catalog ready");

    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Recommend {
            username,
            count,
            format,
        } => {
            let config = BaxusConfig {
                base_url: cli.baxus_url,
                ..Default::default()
            };
            let backend = BaxusBackend::new(config)?;
            run_recommend(&backend, &catalog, &username, count, format, &mut out).await?;
        }
        Commands::Analyze {
            file,
            count,
            format,
        } => {
            run_analyze(&catalog, &file, count, format, &mut out)?;
        }
        Commands::Catalog {
            region,
            spirit,
            min_price,
            max_price,
            format,
        } => {
            run_catalog(&catalog, region, spirit, min_price, max_price, format, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}

async fn run_recommend(
    backend: &impl InventorySource,
    catalog: &CatalogHandle,
    username: &str,
    count: usize,
    format: Format,
    out: &mut impl Write,
) -> Result<()> {
    let collection = backend
        .fetch_bar(username)
        .await
        .with_context(|| format!("Failed to fetch bar from {}", backend.name()))?;

    let Some(collection) = collection else {
        bail!("No bottle collection found for user '{}'", username);
    };
    if collection.is_empty() {
        tracing::info!(username, "Empty bar, recommending from the full catalog");
        if let Format::Text = format {
            writeln!(out, "{} has an empty bar; recommending from the full catalog.", username)?;
        }
    }

    report(catalog, &collection, count, format, out)
}

fn run_analyze(
    catalog: &CatalogHandle,
    file: &Path,
    count: usize,
    format: Format,
    out: &mut impl Write,
) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", file.display()))?;
    let collection = parse_bar(payload)?;
    tracing::info!(entries = collection.len(), file = %file.display(), "Loaded bar export");

    report(catalog, &collection, count, format, out)
}

fn report(
    catalog: &CatalogHandle,
    collection: &[OwnedBottleEntry],
    count: usize,
    format: Format,
    out: &mut impl Write,
) -> Result<()> {
    let config = RecommendConfig::default().with_count(count);
    let result = recommend(collection, catalog, &config);

    match format {
        Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?,
        Format::Text => print_recommendations(&result, collection, out)?,
    }

    Ok(())
}

fn print_recommendations(
    result: &Recommendations,
    collection: &[OwnedBottleEntry],
    out: &mut impl Write,
) -> std::io::Result<()> {
    let profile = &result.profile;

    writeln!(out, "Collection: {} bottles", profile.collection_size)?;
    if !profile.is_empty() {
        writeln!(
            out,
            "Average price: ${:.2} | Price ceiling: ${:.2}",
            profile.average_bottle_price, profile.price_ceiling
        )?;
        let regions: Vec<String> = profile
            .preferred_regions
            .iter()
            .map(|(region, share)| format!("{} {:.0}%", region, share))
            .collect();
        if !regions.is_empty() {
            writeln!(out, "Regions: {}", regions.join(", "))?;
        }
        let flavors: Vec<&str> = profile.top_flavors(3).iter().map(|f| f.name()).collect();
        if !flavors.is_empty() {
            writeln!(out, "Top flavors: {}", flavors.join(", "))?;
        }
    }
    writeln!(out, "---")?;

    if result.recommendations.is_empty() {
        writeln!(out, "No recommendations available in your price range.")?;
        return Ok(());
    }

    for (i, rec) in result.recommendations.iter().enumerate() {
        let bottle = &rec.bottle;
        writeln!(out, "\n{}. {} (ID: {})", i + 1, bottle.name, bottle.id)?;
        writeln!(
            out,
            "   {} | {} | {:.1}% ABV | ${:.2}",
            bottle.spirit_type, bottle.region, bottle.abv, bottle.msrp
        )?;
        writeln!(out, "   {}", rec.explanation)?;

        let labels: Vec<&str> = explain_clauses(bottle, profile, collection)
            .iter()
            .map(|c| c.label())
            .collect();
        writeln!(out, "   Signals: {:?}", labels)?;
    }

    writeln!(out, "\n---")?;
    writeln!(out, "Total: {} recommendations", result.recommendations.len())
}

fn run_catalog(
    catalog: &CatalogHandle,
    region: Option<String>,
    spirit: Option<String>,
    min_price: f64,
    max_price: Option<f64>,
    format: Format,
    out: &mut impl Write,
) -> Result<()> {
    let max_price = max_price.unwrap_or(f64::INFINITY);
    let region = region.as_deref().map(Region::from);

    // Narrow with the most selective lookup, then apply the rest
    let mut bottles: Vec<&CatalogBottle> = match (region, spirit.as_deref()) {
        (Some(region), _) => catalog.by_region(region),
        (None, Some(spirit)) => catalog.by_spirit_type(spirit),
        (None, None) => catalog.by_price_range(min_price, max_price),
    };
    if let Some(spirit) = spirit.as_deref() {
        bottles.retain(|b| b.spirit_type.eq_ignore_ascii_case(spirit));
    }
    bottles.retain(|b| b.msrp >= min_price && b.msrp <= max_price);

    match format {
        Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&bottles)?)?,
        Format::Text => {
            for bottle in &bottles {
                writeln!(
                    out,
                    "{:>6}  {:<45} {:<22} {:<9} ${:>7.2}  {:>5.1}",
                    bottle.id,
                    bottle.name,
                    bottle.spirit_type,
                    bottle.region,
                    bottle.msrp,
                    bottle.total_score
                )?;
            }
            writeln!(out, "---")?;
            writeln!(out, "Total: {} bottles", bottles.len())?;
        }
    }

    Ok(())
}
