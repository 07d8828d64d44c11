// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{default_config_path, load_config};
pub use settings::{
    AuthSettings, ClassifierSettings, Config, EscalationConfig, MailSettings, ProviderSettings,
    ServerSettings, TokenEntry,
};
