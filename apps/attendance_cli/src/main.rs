use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Result;
use attendance_core::{
    AttendanceClient, AttendanceHandle, Attachment, CheckinForm, CheckoutForm, ClientError,
    HttpBackend,
};
use clap::{Parser, Subcommand};
use shared::domain::{Identity, TravelMode};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;
use render::{render_home, render_routes};

#[derive(Parser, Debug)]
#[command(about = "Field attendance check-in / check-out")]
struct Cli {
    /// Backend endpoint (overrides config and environment).
    #[arg(long)]
    backend_url: Option<String>,
    /// Salesperson name; blank means unknown.
    #[arg(long)]
    salesperson: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current check-in and what can be done next.
    Status,
    /// List today's routes.
    Routes,
    CheckIn {
        #[arg(long, default_value = "")]
        route: String,
        #[arg(long, default_value = "")]
        mode: String,
        #[arg(long, default_value = "")]
        bike_reading: String,
        #[arg(long)]
        bike_odo_image: Option<PathBuf>,
    },
    CheckOut {
        #[arg(long, default_value = "")]
        food_expense: String,
        #[arg(long, default_value = "")]
        auto_expense: String,
        #[arg(long, default_value = "")]
        bus_ticket_price: String,
        #[arg(long)]
        bus_ticket_image: Option<PathBuf>,
        #[arg(long, default_value = "")]
        bike_reading_out: String,
        #[arg(long)]
        bike_odo_image_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        settings.backend_url = Some(url);
    }
    if let Some(name) = cli.salesperson {
        settings.salesperson = name;
    }

    let endpoint = settings.backend_endpoint()?;
    let identity = Identity::new(&settings.salesperson);
    info!(
        endpoint = %endpoint,
        salesperson = %identity.display_name(),
        "starting attendance client"
    );
    let backend = HttpBackend::with_timeout(endpoint.as_str(), settings.request_timeout())?;
    let client = AttendanceClient::new(identity, Arc::new(backend));

    let outcome = run(&client, cli.command).await;
    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(client: &Arc<AttendanceClient>, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Status => {
            let result = client.refresh().await;
            print!("{}", render_home(&client.view().await));
            result.map(|_| ())
        }
        Command::Routes => {
            let result = client.load_routes().await;
            print!("{}", render_routes(&client.view().await.route_choices));
            result.map(|_| ())
        }
        Command::CheckIn {
            route,
            mode,
            bike_reading,
            bike_odo_image,
        } => {
            client.refresh().await?;
            let form = CheckinForm {
                route,
                mode: parse_mode(&mode),
                bike_reading,
                bike_odo_image: bike_odo_image.map(Attachment::from_path),
            };
            client.open_session(form).await?;
            println!("Check-In recorded");
            print!("{}", render_home(&client.view().await));
            Ok(())
        }
        Command::CheckOut {
            food_expense,
            auto_expense,
            bus_ticket_price,
            bus_ticket_image,
            bike_reading_out,
            bike_odo_image_out,
        } => {
            client.refresh().await?;
            let form = CheckoutForm {
                food_expense,
                auto_expense,
                bus_ticket_price,
                bus_ticket_image: bus_ticket_image.map(Attachment::from_path),
                bike_reading_out,
                bike_odo_image_out: bike_odo_image_out.map(Attachment::from_path),
            };
            client.close_session(form).await?;
            println!("Check-Out recorded");
            print!("{}", render_home(&client.view().await));
            Ok(())
        }
    }
}

/// Typed modes are matched without regard to case; anything else is passed through.
fn parse_mode(raw: &str) -> Option<TravelMode> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else if raw.eq_ignore_ascii_case(TravelMode::Bus.as_str()) {
        Some(TravelMode::Bus)
    } else if raw.eq_ignore_ascii_case(TravelMode::Bike.as_str()) {
        Some(TravelMode::Bike)
    } else {
        Some(TravelMode::from(raw))
    }
}
