// Chat providers for the normal (non-crisis) conversation path and the
// daily self-care content
//
// Crisis handling never calls a provider.

use anyhow::Result;
use async_trait::async_trait;

pub mod factory;
pub mod gemini;
pub mod prompt;
pub mod self_care;

pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use self_care::{generate_self_care, SelfCareContent};

/// Trait for text generation backends
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a reply for a fully built prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// Model used for generation
    fn model(&self) -> &str;
}
