#[cfg(feature = "cli")]
pub mod cli;
pub mod project;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliArgs;
pub use project::ProjectFile;
pub use toml_config::EngineConfig;
