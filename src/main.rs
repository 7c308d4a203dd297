use csave::cli::Cli;
use csave::commands;
use csave::config::AppConfig;
use csave::logger;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let args = Cli::parse_args();

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("csave: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging system
    if let Err(e) = logger::init(args.verbose, config.paths.log_file.as_deref()) {
        eprintln!("csave: cannot initialize logging: {}", e);
        std::process::exit(1);
    }

    debug!("CSave starting");

    match commands::backup::execute(config).await {
        Ok(()) => info!("Operation completed successfully"),
        Err(e) => {
            error!("Operation failed: {}", e);
            if !e.is_fatal_tape_error() {
                eprintln!("csave: {}", e);
            }
            std::process::exit(e.exit_code());
        }
    }
}
