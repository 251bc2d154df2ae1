pub mod cli;
pub mod config;
pub mod layers;

pub use cli::{Cli, Commands};
pub use config::ToolConfig;
pub use layers::LayerSource;
