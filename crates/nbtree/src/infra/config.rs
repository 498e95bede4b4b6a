//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::unpack::{EmptyResultPolicy, WriteMode};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".nbtree/config.toml";

/// Name of the ignore list looked up next to the installed binary.
pub const IGNORE_FILE_NAME: &str = "nbtree.ignore";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pack: Pack,
    #[serde(default)]
    pub unpack: Unpack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Pack {
    /// Explicit ignore file. Relative paths resolve against the binary's directory.
    #[serde(default)]
    pub ignore_file: Option<PathBuf>,
    /// Names added to the ignore list inherited from lower layers.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Names removed from the ignore list inherited from lower layers.
    #[serde(default)]
    pub unignore: Vec<String>,
    #[serde(default)]
    pub include_root_name: bool,
}

impl Pack {
    /// Location of the ignore file, tied to the tool's installation rather than the caller's cwd.
    pub fn resolve_ignore_file(&self) -> Option<PathBuf> {
        let install_dir = match env::current_exe() {
            Ok(exe) => exe.parent().map(Path::to_path_buf),
            Err(err) => {
                tracing::warn!(error = %err, "cannot locate the nbtree executable");
                None
            }
        };
        self.resolve_ignore_file_in(install_dir.as_deref())
    }

    fn resolve_ignore_file_in(&self, install_dir: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = &self.ignore_file
            && path.is_absolute()
        {
            return Some(path.clone());
        }
        let Some(install_dir) = install_dir else {
            tracing::warn!("install directory unknown, skipping the ignore file");
            return None;
        };
        let name = self
            .ignore_file
            .as_deref()
            .unwrap_or(Path::new(IGNORE_FILE_NAME));
        Some(install_dir.join(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Unpack {
    #[serde(default)]
    write_mode: Option<WriteMode>,
    #[serde(default)]
    on_empty: Option<EmptyResultPolicy>,
}

impl Unpack {
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode.unwrap_or_default()
    }

    pub fn on_empty(&self) -> EmptyResultPolicy {
        self.on_empty.unwrap_or_default()
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    write_mode: Option<String>,
    ignore_file: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            write_mode: env::var("NBTREE_WRITE_MODE").ok(),
            ignore_file: env::var("NBTREE_IGNORE_FILE").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(write_mode: &str, ignore_file: &str) -> Self {
        Self {
            write_mode: Some(write_mode.to_owned()),
            ignore_file: Some(ignore_file.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading global config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            pack: merge_pack(self.pack, other.pack),
            unpack: merge_unpack(self.unpack, other.unpack),
        }
    }
}

fn merge_pack(base: Pack, overlay: Pack) -> Pack {
    let mut ignore: BTreeSet<String> = base.ignore.into_iter().collect();
    ignore.extend(overlay.ignore);
    for name in &overlay.unignore {
        ignore.remove(name);
    }

    Pack {
        ignore_file: overlay.ignore_file.or(base.ignore_file),
        ignore: ignore.into_iter().collect(),
        unignore: Vec::new(),
        include_root_name: overlay.include_root_name || base.include_root_name,
    }
}

fn merge_unpack(mut base: Unpack, overlay: Unpack) -> Unpack {
    if let Some(value) = overlay.write_mode {
        base.write_mode = Some(value);
    }
    if let Some(value) = overlay.on_empty {
        base.on_empty = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("nbtree/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(raw) = env.write_mode {
        match WriteMode::from_str(&raw) {
            Ok(mode) => config.unpack.write_mode = Some(mode),
            Err(err) => tracing::warn!(error = %err, "ignoring NBTREE_WRITE_MODE"),
        }
    }
    if let Some(ignore_file) = env.ignore_file {
        config.pack.ignore_file = Some(PathBuf::from(ignore_file));
    }
    config
}
