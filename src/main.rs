use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vienna_rent_map::config::AppConfig;
use vienna_rent_map::data::DataStore;
use vienna_rent_map::{server, Dashboard, Event, EventEnvelope, Indicator, Session};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard API and static assets
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Load the dataset and boundaries and print a summary
    Check {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the map and line specifications for one selection as JSON
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long, value_name = "KEY")]
        indicator: Option<String>,
        #[arg(short, long = "district", value_name = "CODE")]
        districts: Vec<u32>,
    },
}

fn load_dashboard(config: &AppConfig) -> Result<Dashboard> {
    let store = DataStore::load(config)?;
    Dashboard::new(store, config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let app_config = AppConfig::load_from_file(&config)?;
            let dashboard = load_dashboard(&app_config)?;
            server::start_server(app_config, dashboard).await?;
        }
        Commands::Check { config } => {
            let app_config = AppConfig::load_from_file(&config)?;
            let dashboard = load_dashboard(&app_config)?;
            let store = dashboard.store();

            println!("rows:      {}", store.rows().len());
            println!("districts: {}", store.regions().len());
            println!("years:     {:?}", store.years());
            for indicator in Indicator::ALL {
                let present = store.rows().iter().filter(|r| r.value(indicator).is_some()).count();
                println!("{:<20} {}/{} values", indicator.key(), present, store.rows().len());
            }
        }
        Commands::Render {
            config,
            year,
            indicator,
            districts,
        } => {
            let app_config = AppConfig::load_from_file(&config)?;
            let dashboard = load_dashboard(&app_config)?;
            let mut session = Session::new(&dashboard);

            let mut events = Vec::new();
            if let Some(year) = year {
                events.push(Event::YearSelected { year });
            }
            if let Some(indicator) = indicator {
                events.push(Event::IndicatorSelected { indicator });
            }
            if !districts.is_empty() {
                events.push(Event::DistrictsSelected { districts });
            }
            for (seq, event) in (1..).zip(events) {
                session
                    .handle(&dashboard, EventEnvelope { seq, event })
                    .context("Invalid selection")?;
            }

            let view = session.view(&dashboard);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}
