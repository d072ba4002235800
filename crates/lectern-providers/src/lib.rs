//! # Lectern Providers
//!
//! Text-completion providers. The study flows only need an opaque
//! prompt-in/text-out function; there is no built-in network client.
//! `command` pipes prompts through any local CLI, wrapped in [`RetryProvider`].

pub mod command;
pub mod retry;

use lectern_core::config::ProviderConfig;
use lectern_core::error::{LecternError, Result};
use lectern_core::traits::Provider;

pub use command::CommandProvider;
pub use retry::RetryProvider;

/// Create a provider from configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    let base: Box<dyn Provider> = match config.kind.as_str() {
        "command" => Box::new(CommandProvider::from_config(config)?),
        other => {
            return Err(LecternError::Config(format!(
                "Unknown provider kind: {other}. Available: {}",
                available_providers().join(", ")
            )));
        }
    };

    if config.max_retries == 0 {
        Ok(base)
    } else {
        Ok(Box::new(RetryProvider::new(base, config.max_retries)))
    }
}

/// List all available provider kinds.
pub fn available_providers() -> Vec<&'static str> {
    vec!["command"]
}
