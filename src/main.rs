use clap::{Parser, Subcommand};
use healthcheck::application::location::LocationProvider;
use healthcheck::config::AppConfig;
use healthcheck::domain::geo::Coordinate;
use healthcheck::domain::location::LocationRequest;
use healthcheck::domain::payment::{Amount, PaymentReference};
use healthcheck::domain::ports::PaymentIntentStore;
use healthcheck::error::CoreError;
use healthcheck::infrastructure::static_position::StaticPositionSource;
use healthcheck::interfaces::http;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "HEALTHCHECK_LISTEN", default_value = "127.0.0.1:8080")]
        listen: SocketAddr,
    },
    /// Print facilities near a position as JSON
    FindClinics {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Create a pending payment intent
    CreateIntent {
        #[arg(long)]
        user: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Print one payment intent
    ShowIntent {
        #[arg(long)]
        reference: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("healthcheck=info,tower_http=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Command::Serve { listen } => {
            let app = http::router(config.build_state().into_diagnostic()?);
            let listener = tokio::net::TcpListener::bind(listen)
                .await
                .into_diagnostic()?;
            info!(%listen, "HealthCheck API listening");
            axum::serve(listener, app).await.into_diagnostic()?;
        }
        Command::FindClinics { lat, lon } => {
            let fix = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon).into_diagnostic()?),
                _ => None,
            };
            let provider = LocationProvider::new(Box::new(StaticPositionSource::new(fix)));
            let center = provider
                .acquire(LocationRequest::default())
                .await
                .map_err(CoreError::from)
                .into_diagnostic()?;

            let discovery = config.build_discovery().into_diagnostic()?;
            let facilities = discovery.find_nearby(center).await.into_diagnostic()?;
            print_json(&facilities)?;
        }
        Command::CreateIntent { user, amount } => {
            let store = config.open_store().into_diagnostic()?;
            let amount = Amount::new(amount).into_diagnostic()?;
            let intent = store.create(&user, amount).await.into_diagnostic()?;
            print_json(&intent)?;
        }
        Command::ShowIntent { reference } => {
            let store = config.open_store().into_diagnostic()?;
            let reference = PaymentReference::from(reference);
            let intent = store
                .get_by_reference(&reference)
                .await
                .into_diagnostic()?
                .ok_or_else(|| CoreError::NotFound(reference.to_string()))
                .into_diagnostic()?;
            print_json(&intent)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;
    Ok(())
}
