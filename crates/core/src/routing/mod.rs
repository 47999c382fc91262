//! Routing configuration and its hot-reload holder.

mod config_source;
mod routing_model;
mod routing_settings;

pub use config_source::{api_key_env_var, ConfigSource, InMemoryConfigSource, JsonFileConfigSource};
pub use routing_model::{PriorityTable, RoutingConfig};
pub use routing_settings::RoutingSettings;
