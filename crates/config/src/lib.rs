//! Config discovery and schema: `memtune.{toml,yaml,yml,json}` with
//! `${ENV_VAR}` substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::MemtuneConfig,
};
