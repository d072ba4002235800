//! Text-completion provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// An opaque prompt-in, text-out completion function.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
