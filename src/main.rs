use proclog::cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr so they never mix with passed-through output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();

    if let Err(e) = Cli::run().await {
        eprintln!("✗ Error: {:#}", e);
        std::process::exit(1);
    }
}
