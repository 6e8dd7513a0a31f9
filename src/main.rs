use jtimer::commands::Cli;
use jtimer::libs::messages::macros::is_debug_mode;
use jtimer::msg_error;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jtimer=debug"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    if is_debug_mode() {
        setup_logging();
    }

    match Cli::menu().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            msg_error!(e);
            ExitCode::FAILURE
        }
    }
}
