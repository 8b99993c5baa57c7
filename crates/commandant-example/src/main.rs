//! `greet` binary entry point.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match greet::app() {
        Ok(app) => app.run(),
        Err(err) => {
            tracing::error!(%err, "invalid command tree");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
