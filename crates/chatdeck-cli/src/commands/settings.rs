use crate::bootstrap::App;
use anyhow::{Context, Result};
use chatdeck_core::SessionSettings;
use clap::Args;

#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    #[arg(long)]
    pub system_prompt: Option<String>,
    #[arg(long)]
    pub temperature: Option<f64>,
    #[arg(long)]
    pub top_p: Option<f64>,
    #[arg(long)]
    pub max_tokens: Option<u32>,
    #[arg(long)]
    pub repetition_penalty: Option<f64>,
    /// Also store the result as the new-chat defaults in config.toml
    #[arg(long)]
    pub save: bool,
}

impl SettingsArgs {
    /// Overlays the given flags on `base`.
    pub fn apply_to(&self, base: SessionSettings) -> SessionSettings {
        SessionSettings {
            system_prompt: self.system_prompt.clone().unwrap_or(base.system_prompt),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.unwrap_or(base.top_p),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            repetition_penalty: self.repetition_penalty.unwrap_or(base.repetition_penalty),
        }
    }
}

pub async fn apply(app: &App, args: SettingsArgs) -> Result<()> {
    let coordinator = &app.coordinator;
    let settings = args.apply_to(coordinator.new_chat_defaults());
    coordinator
        .set_new_chat_defaults(settings)
        .context("Rejected settings")?;

    let applied = coordinator
        .apply_settings()
        .await
        .context("Failed to apply settings")?;

    if args.save {
        let mut config = app.config.clone();
        config.new_chat_defaults = applied.clone();
        app.config_service
            .save_config(&config)
            .context("Failed to save config")?;
    }

    println!(
        "Applied: temperature={} top_p={} max_tokens={} repetition_penalty={}",
        applied.temperature, applied.top_p, applied.max_tokens, applied.repetition_penalty
    );
    println!("System prompt: {}", applied.system_prompt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_only_what_is_given() {
        let args = SettingsArgs {
            temperature: Some(0.1),
            max_tokens: Some(42),
            ..Default::default()
        };
        let base = SessionSettings::default();
        let merged = args.apply_to(base.clone());

        assert_eq!(merged.temperature, 0.1);
        assert_eq!(merged.max_tokens, 42);
        assert_eq!(merged.top_p, base.top_p);
        assert_eq!(merged.system_prompt, base.system_prompt);
    }
}
