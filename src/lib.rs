pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod error;
pub mod llm;
pub mod cli;

use agent::PortfolioAgent;
use cli::Args;
use config::{ AppConfig, CorsOrigins };
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::from_args(&args)?;

    info!("--- Core Configuration ---");
    info!("Server Address: {}", config.server.addr);
    info!("Chat Model: {}", config.llm.model);
    info!("Chat Base URL: {}", config.llm.base_url);
    info!("Upstream Timeout: {}s", config.upstream_timeout.as_secs());
    info!("Context Source: {}", args.context_path.as_deref().unwrap_or("built-in"));
    match &config.server.cors {
        CorsOrigins::Any => info!("CORS Origins: any"),
        CorsOrigins::List(list) => info!("CORS Origins: {:?}", list),
    }
    info!("TLS Enabled: {}", config.server.tls.is_some());
    info!("-------------------------");

    let chat_client = llm::chat::new_client(&config.llm)?;
    let agent = Arc::new(
        PortfolioAgent::new(chat_client, config.context.clone(), config.upstream_timeout)
    );
    let server = Server::new(config.server.clone(), agent);
    server.run().await?;

    Ok(())
}
