//! Menagerie
//!
//! Runs the embedded database walkthrough against `./TestDB`.

use menagerie::config::Config;
use menagerie::{build_info, demo};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("menagerie=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();

    let config = Config::default();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    demo::run(&config, &mut out)?;

    Ok(())
}
