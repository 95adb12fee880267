pub mod agent;
pub mod models;
pub mod server;
pub mod llm;
pub mod cli;
pub mod dataset;

use agent::ChatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Dataset Path: {}", args.dataset_path);
    info!("Index Page Path: {}", args.index_path);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Max Tokens: {}", args.max_tokens);
    info!("Temperature: {}", args.temperature);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(ChatAgent::new(&args).await?);
    info!("Predefined conversations available: {}", agent.dataset().len());
    let server = Server::new(agent, args);
    server.run().await?;

    Ok(())
}
