mod loader;
mod validation;

pub use loader::{config_path, load_config, load_config_with, ConfigError};
pub use validation::validate;
