//! Configuration loading from the environment or a TOML/JSON file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, load_from_source, probe_config_paths};
