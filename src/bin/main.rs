//! cluster-testdata binary entry point.

use cluster_testdata::telemetry::{self, LogSettings};
use cluster_testdata::{config, seeder, Options};
use std::process::ExitCode;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let options = match Options::parse_from_args(std::env::args_os()) {
        Ok(options) => options,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Logging is not up yet; report config problems on stderr directly.
    let config = match config::load(&options.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", options.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let settings = LogSettings::resolve(&options, config.loglevel.as_deref());
    if let Err(e) = telemetry::init(&settings) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    if let Some(level) = &config.loglevel {
        info!("Configuration over-ride for log level: {}", level);
    }

    // Failures are already logged at the seeding boundary.
    match seeder::run(&config, &options).await {
        Ok(report) => {
            info!(
                clusters = report.clusters.len(),
                servers = report.server_count(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
