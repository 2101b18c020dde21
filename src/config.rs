//! Configuration loading for a2state
//!
//! The configuration file is optional. It lets a host point at tools living
//! outside the usual sbin directories or replace individual commands.
//!
//! # Location
//!
//! 1. `--config <FILE>` or `A2STATE_CONFIG`
//! 2. `A2STATE_CONFIG_DIR/config.toml`
//! 3. `XDG_CONFIG_HOME/a2state/config.toml`
//! 4. `~/.config/a2state/config.toml`
//!
//! An explicitly named file must exist. A missing default file means
//! built-in defaults.
//!
//! # Format
//!
//! ```toml
//! search_path = ["/opt/apache/sbin", "~/bin"]
//!
//! [tools]
//! query = "/usr/sbin/a2query"
//!
//! [tools.site]
//! enable = "a2ensite"
//! disable = "a2dissite"
//! ```

use a2kit::backend::search_dirs;
use a2kit::{CommandTable, ItemKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "A2STATE_CONFIG_DIR";

const FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directories searched for the tools before PATH
    #[serde(default)]
    pub search_path: Vec<String>,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Replacement for `a2query`
    #[serde(default)]
    pub query: Option<String>,

    #[serde(default)]
    pub module: Option<ToolPair>,

    #[serde(default)]
    pub config: Option<ToolPair>,

    #[serde(default)]
    pub site: Option<ToolPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolPair {
    #[serde(default)]
    pub enable: Option<String>,

    #[serde(default)]
    pub disable: Option<String>,
}

impl ToolsConfig {
    fn pair(&self, kind: ItemKind) -> Option<&ToolPair> {
        match kind {
            ItemKind::Module => self.module.as_ref(),
            ItemKind::Config => self.config.as_ref(),
            ItemKind::Site => self.site.as_ref(),
        }
    }
}

/// A loaded configuration and the file it came from, if any.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub config: Config,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid a2state configuration")
    }

    /// Read a configuration file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("In {}", path.display()))
    }

    /// Load the configuration named on the command line, or the default one.
    pub fn load(explicit: Option<&Path>) -> Result<Loaded> {
        if let Some(path) = explicit {
            let path = expand(&path.to_string_lossy());
            log::debug!("Using config file {}", path.display());
            return Ok(Loaded {
                config: Self::read(&path)?,
                path: Some(path),
            });
        }

        let path = default_path(|key| std::env::var(key).ok())?;
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Loaded::default());
        }
        log::debug!("Using config file {}", path.display());
        Ok(Loaded {
            config: Self::read(&path)?,
            path: Some(path),
        })
    }

    /// Extra search directories with `~` and variables expanded.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        self.search_path.iter().map(|dir| expand(dir)).collect()
    }

    /// Command table with overrides applied, before path resolution.
    pub fn unresolved_commands(&self) -> CommandTable {
        let mut table = CommandTable::default();
        if let Some(query) = &self.tools.query {
            table = table.with_query(expand(query));
        }
        for kind in ItemKind::ALL {
            let Some(pair) = self.tools.pair(kind) else {
                continue;
            };
            if let Some(enable) = &pair.enable {
                table = table.with_enable(kind, expand(enable));
            }
            if let Some(disable) = &pair.disable {
                table = table.with_disable(kind, expand(disable));
            }
        }
        table
    }

    /// Command table resolved against the search path, then PATH, then the
    /// sbin directories.
    pub fn command_table(&self) -> CommandTable {
        let dirs = search_dirs(&self.search_dirs(), std::env::var_os("PATH"));
        log::trace!("Tool search path: {dirs:?}");
        self.unresolved_commands().resolve_in(&dirs)
    }
}

/// Default config file location, reading the environment through `var`.
pub fn default_path<F>(var: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = var(ENV_CONFIG_DIR) {
        return Ok(expand(&dir).join(FILE_NAME));
    }
    if let Some(xdg) = var("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("a2state").join(FILE_NAME));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("a2state").join(FILE_NAME))
}

/// Expand `~` and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_path_config_dir_override() {
        let path = default_path(env(&[
            (ENV_CONFIG_DIR, "/etc/a2state"),
            ("XDG_CONFIG_HOME", "/xdg"),
        ]))
        .unwrap();
        assert_eq!(path, PathBuf::from("/etc/a2state/config.toml"));
    }

    #[test]
    fn test_default_path_xdg() {
        let path = default_path(env(&[("XDG_CONFIG_HOME", "/xdg")])).unwrap();
        assert_eq!(path, PathBuf::from("/xdg/a2state/config.toml"));
    }

    #[test]
    fn test_default_path_home() {
        let path = default_path(env(&[])).unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(path, home.join(".config").join("a2state").join("config.toml"));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.unresolved_commands(), CommandTable::default());
    }

    #[test]
    fn test_tool_overrides() {
        let config = Config::from_toml(
            r#"
search_path = ["/opt/apache/sbin"]

[tools]
query = "/opt/apache/sbin/a2query"

[tools.site]
disable = "/usr/local/bin/site-off"
"#,
        )
        .unwrap();

        let table = config.unresolved_commands();
        assert_eq!(table.query(), Path::new("/opt/apache/sbin/a2query"));
        assert_eq!(
            table.commands(ItemKind::Site).disable,
            PathBuf::from("/usr/local/bin/site-off")
        );
        assert_eq!(table.commands(ItemKind::Site).enable, PathBuf::from("a2ensite"));
        assert_eq!(config.search_dirs(), vec![PathBuf::from("/opt/apache/sbin")]);
    }

    #[test]
    fn test_search_path_tilde_is_expanded() {
        let config = Config::from_toml(r#"search_path = ["~/bin"]"#).unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(config.search_dirs(), vec![home.join("bin")]);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_toml("serach_path = []").is_err());
        assert!(Config::from_toml("[tools.vhost]\nenable = \"x\"").is_err());
        assert!(Config::from_toml("[tools.module]\nenabel = \"x\"").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a2.toml");
        fs::write(&path, "[tools]\nquery = \"/srv/a2query\"\n").unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.tools.query.as_deref(), Some("/srv/a2query"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("Could not read"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_table_prefers_search_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("a2enmod");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let config = Config {
            search_path: vec![dir.path().display().to_string()],
            ..Config::default()
        };
        let table = config.command_table();
        assert_eq!(table.commands(ItemKind::Module).enable, tool);
    }
}
