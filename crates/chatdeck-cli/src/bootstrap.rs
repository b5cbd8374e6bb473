use anyhow::{Context, Result};
use chatdeck_application::ChatStateCoordinator;
use chatdeck_core::BackendStatus;
use chatdeck_core::config::ChatConfig;
use chatdeck_infrastructure::{ConfigService, HttpSessionGateway};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a command needs.
pub struct App {
    pub config_service: ConfigService,
    pub config: ChatConfig,
    pub gateway: Arc<HttpSessionGateway>,
    pub coordinator: Arc<ChatStateCoordinator>,
}

pub fn build(config_path: Option<PathBuf>) -> Result<App> {
    let config_service = match config_path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let config = config_service.get_config();

    let gateway = Arc::new(
        HttpSessionGateway::from_config(&config).context("Failed to create session gateway")?,
    );
    let coordinator = ChatStateCoordinator::new(gateway.clone(), &config);
    // The backend owns model loading; the CLI assumes a serving backend.
    coordinator.set_backend_status(BackendStatus::Loaded);

    tracing::info!(
        "[Bootstrap] Backend {} (mode: {})",
        config.api_base_url,
        config.conversation_mode
    );

    Ok(App {
        config_service,
        config,
        gateway,
        coordinator,
    })
}
