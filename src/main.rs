use std::{path::PathBuf, sync::Arc};

use chat_relay::{
    chat::{client::OpenAIClient, engine::ChatEngine, store::MemoryStore},
    config::RelayConfig,
    relay::Relay,
    utils::log::Logger,
};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = RelayConfig::load(path)?;
    Logger::init(Logger::level(config.log_level.as_deref()));

    if config.llm.api_key.is_empty() {
        log::warn!("no API key configured, set OPENAI_KEY or llm.api_key in config.toml");
    }
    log::info!(
        "relaying to {} with model {}",
        config.llm.base_url,
        config.llm.model
    );

    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(OpenAIClient::new(&config.llm)?);
    let relay = Relay::new(ChatEngine::new(&config, store, client));

    relay
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
