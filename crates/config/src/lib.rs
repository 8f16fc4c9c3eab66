//! Configuration: schema, file discovery and loading.
//!
//! Config lives in `igdm.{toml,yaml,yml,json}`, project-local first, then
//! `~/.config/igdm/`. String values may reference environment variables as
//! `${VAR}`; unresolvable references are left as-is.

pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config, set_config_dir},
    schema::IgdmConfig,
};
