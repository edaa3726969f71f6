pub mod env;
pub mod loader;
pub mod schema;

pub use loader::{get_config_path, load_config, load_config_with_env, save_config};
pub use schema::{
    ChannelsConfig, Config, ExecToolConfig, GatewayConfig, QqConfig, ToolsConfig,
};
