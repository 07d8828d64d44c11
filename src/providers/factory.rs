// Provider factory
//
// Creates the chat provider from configuration

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use super::gemini::GeminiProvider;
use super::ChatProvider;
use crate::config::ProviderSettings;
use crate::errors;

pub fn create_provider(settings: &ProviderSettings) -> Result<Arc<dyn ChatProvider>> {
    let Some(api_key) = settings.api_key.clone().filter(|k| !k.is_empty()) else {
        bail!(errors::api_key_missing_error());
    };

    let provider = GeminiProvider::new(api_key, Duration::from_secs(settings.timeout_secs))?
        .with_model(settings.model.clone())
        .with_base_url(settings.base_url.clone());

    Ok(Arc::new(provider))
}
