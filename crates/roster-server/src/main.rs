use roster_server::{AppConfig, observability, server};

#[tokio::main]
async fn main() {
    // Load .env if present; it is optional for local development.
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    // Initialize tracing early so configuration errors are visible.
    observability::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {e}");
        std::process::exit(2);
    }
    observability::apply_logging_level(&config.logging.level);

    // Phase one: build and verify every singleton. A failed key-set
    // fetch must keep the service from serving at all.
    let state = match server::init(&config).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Startup failed: {e}");
            std::process::exit(2);
        }
    };

    // Phase two: bind and serve.
    if let Err(err) = server::run(&config, state).await {
        eprintln!("Server error: {err}");
    }
}
