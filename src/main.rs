use std::sync::Arc;

use anyhow::Context;
use chatbridge_lib::backends::{AssistantBackend, OpenAiCompatBackend};
use chatbridge_lib::config::load_config;
use chatbridge_lib::credential::CredentialStore;
use chatbridge_lib::logger::init_logging;
use chatbridge_lib::server::{run_server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_arg = std::env::args().nth(1);
    let config = load_config(config_arg.as_deref()).context("加载配置失败")?;

    init_logging(&config.log_level);
    tracing::info!(
        "[MAIN] chatbridge v{} 启动，上游: {}",
        env!("CARGO_PKG_VERSION"),
        config.upstream.base_url
    );

    let credentials = Arc::new(CredentialStore::new(config.token_file_path()));
    let backend: Arc<dyn AssistantBackend> = Arc::new(OpenAiCompatBackend::new(
        config.upstream.clone(),
        credentials.clone(),
    ));

    let state = AppState::new(config, backend, credentials)?;
    run_server(state).await?;
    Ok(())
}
