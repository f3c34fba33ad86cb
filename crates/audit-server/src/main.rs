use audit_server::logging::init_logging;
use audit_server::{run_server, ServerConfig};
use clap::Parser;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();

    init_logging(config.debug, config.log_level.as_deref());

    log::info!("Starting marketing audit server on {}:{}", config.host, config.port);
    log::info!("LLM Configuration:");
    log::info!("  Base URL: {}", config.llm_base_url);
    log::info!("  Model: {}", config.model);

    if config.debug {
        log::debug!("Debug mode enabled");
        log::debug!("  Database: {:?}", config.database_path());
        log::debug!("  Request timeout: {:?}", config.request_timeout());
    }

    run_server(config).await
}
