mod parsing;
mod settings;
mod types;

pub use types::{
    ConfigError, DatabaseSettings, Environment, ImportSettings, RuntimeSettings, Settings,
    TelemetrySettings,
};
