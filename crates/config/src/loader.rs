use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use {
    anyhow::Context,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::MemtuneConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["memtune.toml", "memtune.yaml", "memtune.yml", "memtune.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, config discovery only looks in
/// this directory (project-local and user-global paths are skipped).
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE.lock().unwrap() = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE.lock().unwrap() = None;
}

/// Load config from the given path (any supported format), substituting
/// `${ENV_VAR}` placeholders first.
pub fn load_config(path: &Path) -> anyhow::Result<MemtuneConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);

    match path.extension().and_then(|e| e.to_str()).unwrap_or("toml") {
        "toml" => Ok(toml::from_str(&raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(&raw)?),
        "json" => Ok(serde_json::from_str(&raw)?),
        other => anyhow::bail!("unsupported config format: {other}"),
    }
}

/// Discover and load config from standard locations: the override directory
/// when set, otherwise `./` and then `~/.config/memtune/`.
///
/// Falls back to `MemtuneConfig::default()` when no file is found or the
/// found file fails to parse.
pub fn discover_and_load() -> MemtuneConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return MemtuneConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    load_config(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
        MemtuneConfig::default()
    })
}

fn find_config_file() -> Option<PathBuf> {
    let override_dir = CONFIG_DIR_OVERRIDE.lock().unwrap().clone();
    let search_dirs = match override_dir {
        // Override set: search nowhere else, for isolation.
        Some(dir) => vec![dir],
        None => {
            let mut dirs = vec![PathBuf::from(".")];
            if let Some(base) = directories::BaseDirs::new() {
                dirs.push(base.home_dir().join(".config").join("memtune"));
            }
            dirs
        },
    };

    search_dirs
        .iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.exists())
}
