use docassist::app;
use docassist::config::AppConfig;

/// Entry point for the document assistant front-end
///
/// Reads configuration from the environment, initializes logging, and runs
/// the web server until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = AppConfig::from_env();
    app::run(config).await
}
