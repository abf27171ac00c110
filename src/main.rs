use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use fireplan::api::{Cli, Command};

fn init_tracing() {
    let log_format = std::env::var("FIRE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so `scenarios` output stays pipeable.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    match Cli::parse().command {
        Command::Serve { port } => {
            if let Err(e) = fireplan::api::run_http_server(port).await {
                tracing::error!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Scenarios(args) => match fireplan::api::scenarios_report(args) {
            Ok(report) => println!("{report}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }
}
