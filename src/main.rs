use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reqwest::Client;
use std::{io, path::PathBuf, sync::Arc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;
use worlddash::{
    config::{Catalog, FetchParams, DEFAULT_BASE_URL},
    locale::{Locale, Translate},
    pipeline,
    source::DataSource,
    store, views,
};

#[derive(Parser, Debug)]
#[command(name = "worlddash", about = "World Bank indicators for seven countries")]
struct Cli {
    /// Directory holding one CSV per country.
    #[arg(long, env = "WORLDDASH_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, env = "WORLDDASH_LOCALE", default_value = "pt")]
    locale: String,

    #[arg(long, default_value = "locales")]
    locales_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// YAML file replacing the built-in indicator/country catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an overview of the loaded data (default).
    Summary,
    /// Download and rebuild the data directory even if it already has files.
    Fetch,
    /// Print filtered rows as CSV.
    Query {
        #[arg(long = "country")]
        countries: Vec<String>,
        #[arg(long = "year")]
        years: Vec<i32>,
        #[arg(long = "column", required = true)]
        columns: Vec<String>,
    },
    /// Print the data behind one chart as JSON.
    Chart {
        kind: ChartKind,
        #[arg(long = "country")]
        countries: Vec<String>,
        #[arg(long = "year")]
        years: Vec<i32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartKind {
    Bar,
    Line,
    Scatter,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(io::stderr)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cli = Cli::parse();
    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_yaml_file(path)?,
        None => Catalog::world_bank(),
    };
    let catalog = Arc::new(catalog);
    let params = FetchParams::default();
    let base = Url::parse(&cli.base_url)
        .with_context(|| format!("parsing base URL {}", cli.base_url))?;
    let locale = Locale::load(&cli.locales_dir, &cli.locale)?;

    // ─── 3) acquire when there is nothing on disk ────────────────────
    let forced = matches!(cli.command, Some(Command::Fetch));
    if forced || pipeline::needs_acquisition(&cli.data_dir)? {
        let client = Client::new();
        info!(dir = %cli.data_dir.display(), "fetching data");
        pipeline::acquire(&client, &base, Arc::clone(&catalog), &params, &cli.data_dir).await?;
    } else {
        info!(dir = %cli.data_dir.display(), "data files already exist; skipping download");
    }
    if forced {
        return Ok(());
    }

    // ─── 4) load the combined table ──────────────────────────────────
    let source = DataSource::new(store::load_data(
        &cli.data_dir,
        &catalog.countries,
        &locale,
    )?);

    // ─── 5) serve the request ────────────────────────────────────────
    match cli.command.unwrap_or(Command::Summary) {
        Command::Summary | Command::Fetch => print_summary(&source, &locale),
        Command::Query {
            countries,
            years,
            columns,
        } => {
            let table = source.filter(&countries, &years, &columns)?;
            store::write_table(io::stdout().lock(), &table)?;
        }
        Command::Chart {
            kind,
            countries,
            years,
        } => {
            let countries = if countries.is_empty() {
                source.unique_countries()
            } else {
                countries
            };
            let years = if years.is_empty() {
                source.default_years()
            } else {
                years
            };
            let view = match kind {
                ChartKind::Bar => views::bar_chart(&source, &countries, &years, &locale)?,
                ChartKind::Line => views::line_chart(&source, &countries, &years, &locale)?,
                ChartKind::Scatter => views::scatter_chart(&source, &countries, &years, &locale)?,
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

fn print_summary(source: &DataSource, locale: &Locale) {
    let data = source.data();
    let years = source.unique_years();
    println!("{}", locale.general("app_title"));
    println!(
        "{}: {}",
        locale.general("country"),
        source.unique_countries().join(", ")
    );
    if let (Some(first), Some(last)) = (years.first(), years.last()) {
        println!("{}: {}-{}", locale.general("years"), first, last);
    }
    println!("{} rows x {} columns", data.num_rows(), data.num_columns());
    for name in data.column_names() {
        println!("  {}", name);
    }
}
