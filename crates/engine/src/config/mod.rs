//! Resolver configuration.
//!
//! Handles parsing and validation of the resolver settings file
//! (`~/.config/intake/resolver.json` by default).

mod io;
mod model;

pub use io::{CONFIG_PATH_ENV, default_config_path, load_config, load_config_from_path};
pub use model::{ConfigError, ResolverConfig, validate_config};
