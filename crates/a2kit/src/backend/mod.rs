//! Backend abstraction for the Apache tool family.
//!
//! The [`Backend`] trait is the single point where external commands are
//! executed. It never interprets what a command means: a nonzero exit is
//! returned as a normal [`ToolOutput`], and only a failure to start the
//! process is an error.

pub mod a2;

use crate::error::{Error, Result};
use crate::types::{ItemKind, ToolOutput, Verb};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Backend trait for invoking the per-kind query/enable/disable commands.
///
/// This trait abstracts process execution, enabling:
/// - Real execution of `a2query`, `a2enmod`, `a2dissite`, ...
/// - In-memory fakes for testing the reconciler
pub trait Backend: Send + Sync {
    /// Run the command for `verb` on `kind` and capture its result.
    ///
    /// Spawns exactly one process. Returns `Error::Launch` only when the
    /// process could not be started.
    fn invoke(&self, kind: ItemKind, verb: Verb<'_>) -> Result<ToolOutput>;
}

/// Enable/disable command pair of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommands {
    /// Command enabling a name
    pub enable: PathBuf,
    /// Command disabling a name
    pub disable: PathBuf,
}

impl ToolCommands {
    fn new(enable: &str, disable: &str) -> Self {
        Self {
            enable: PathBuf::from(enable),
            disable: PathBuf::from(disable),
        }
    }
}

/// Directories searched after `PATH`, where the Debian tools usually live.
pub const SBIN_DIRS: &[&str] = &["/usr/local/sbin", "/usr/sbin", "/sbin"];

/// Static table mapping each kind to its three commands.
///
/// The table is built once and handed to the backend, so command lookup
/// never consults the process environment per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable {
    query: PathBuf,
    module: ToolCommands,
    config: ToolCommands,
    site: ToolCommands,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self {
            query: PathBuf::from("a2query"),
            module: ToolCommands::new("a2enmod", "a2dismod"),
            config: ToolCommands::new("a2enconf", "a2disconf"),
            site: ToolCommands::new("a2ensite", "a2dissite"),
        }
    }
}

impl CommandTable {
    /// Query command shared by every kind.
    pub fn query(&self) -> &Path {
        &self.query
    }

    /// Enable/disable pair for `kind`.
    pub fn commands(&self, kind: ItemKind) -> &ToolCommands {
        match kind {
            ItemKind::Module => &self.module,
            ItemKind::Config => &self.config,
            ItemKind::Site => &self.site,
        }
    }

    fn commands_mut(&mut self, kind: ItemKind) -> &mut ToolCommands {
        match kind {
            ItemKind::Module => &mut self.module,
            ItemKind::Config => &mut self.config,
            ItemKind::Site => &mut self.site,
        }
    }

    /// Program executed for `verb` on `kind`.
    pub fn program(&self, kind: ItemKind, verb: Verb<'_>) -> &Path {
        match verb {
            Verb::QueryAll | Verb::QueryOne(_) => &self.query,
            Verb::Enable(_) => &self.commands(kind).enable,
            Verb::Disable(_) => &self.commands(kind).disable,
        }
    }

    /// Replace the query command.
    pub fn with_query(mut self, path: impl Into<PathBuf>) -> Self {
        self.query = path.into();
        self
    }

    /// Replace the enable command of `kind`.
    pub fn with_enable(mut self, kind: ItemKind, path: impl Into<PathBuf>) -> Self {
        self.commands_mut(kind).enable = path.into();
        self
    }

    /// Replace the disable command of `kind`.
    pub fn with_disable(mut self, kind: ItemKind, path: impl Into<PathBuf>) -> Self {
        self.commands_mut(kind).disable = path.into();
        self
    }

    /// Every distinct command in the table with a short role label.
    pub fn entries(&self) -> Vec<(String, &Path)> {
        let mut entries = vec![("query".to_string(), self.query.as_path())];
        for kind in ItemKind::ALL {
            let commands = self.commands(kind);
            entries.push((format!("{kind} enable"), commands.enable.as_path()));
            entries.push((format!("{kind} disable"), commands.disable.as_path()));
        }
        entries
    }

    /// Resolve bare command names against `dirs`.
    ///
    /// Names that contain a path separator are kept as given. Names that
    /// cannot be found are kept bare so that spawning them reports a
    /// launch failure.
    pub fn resolve_in(&self, dirs: &[PathBuf]) -> Self {
        let mut resolved = self.clone();
        resolved.query = resolve_program(&self.query, dirs);
        for kind in ItemKind::ALL {
            let commands = resolved.commands_mut(kind);
            commands.enable = resolve_program(&commands.enable, dirs);
            commands.disable = resolve_program(&commands.disable, dirs);
        }
        resolved
    }

    /// Commands of the table that cannot be run.
    ///
    /// A bare name is one that resolution did not find, so it counts as
    /// missing without looking at the working directory.
    pub fn missing(&self) -> Vec<&Path> {
        let mut seen = BTreeSet::new();
        self.entries()
            .into_iter()
            .map(|(_, path)| path)
            .filter(|path| seen.insert(path.to_path_buf()))
            .filter(|path| !is_runnable(path))
            .collect()
    }
}

/// Whether `path` names an existing executable file.
fn is_runnable(path: &Path) -> bool {
    path.components().count() > 1 && which::which(path).is_ok()
}

/// Directories searched for commands: `extra`, then `path`, then [`SBIN_DIRS`].
pub fn search_dirs(extra: &[PathBuf], path: Option<OsString>) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = extra.to_vec();
    if let Some(path) = path {
        dirs.extend(std::env::split_paths(&path));
    }
    dirs.extend(SBIN_DIRS.iter().map(PathBuf::from));

    let mut seen = BTreeSet::new();
    dirs.retain(|dir| !dir.as_os_str().is_empty() && seen.insert(dir.clone()));
    dirs
}

fn resolve_program(program: &Path, dirs: &[PathBuf]) -> PathBuf {
    if program.components().count() != 1 {
        return program.to_path_buf();
    }
    let Ok(joined) = std::env::join_paths(dirs) else {
        return program.to_path_buf();
    };

    match which::which_in(program, Some(joined), Path::new(".")) {
        Ok(path) => {
            log::debug!("Resolved {} to {}", program.display(), path.display());
            path
        }
        Err(e) => {
            log::debug!("Could not resolve {}: {e}", program.display());
            program.to_path_buf()
        }
    }
}

/// Exit code of `a2query` for an enabled name.
pub const RC_ENABLED: i32 = 0;
/// Exit code of `a2query` for a name it does not know.
pub const RC_UNKNOWN: i32 = 1;
/// Exit code of `a2query` for a known name that is not enabled.
pub const RC_NOT_ENABLED: i32 = 32;
/// Exit code of `a2query` for a known name disabled by a maintainer script.
pub const RC_DISABLED: i32 = 33;

/// In-memory stand-in for the Apache tool family.
///
/// Mimics the exit-code and stderr conventions of `a2query` and the
/// enable/disable tools, and records every invocation.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    units: Arc<Mutex<BTreeMap<ItemKind, BTreeMap<String, bool>>>>,
    refusing: Arc<Mutex<BTreeSet<(ItemKind, String)>>>,
    calls: Arc<Mutex<Vec<String>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MockBackend {
    /// Create an empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known, enabled unit.
    pub fn with_enabled(self, kind: ItemKind, name: &str) -> Self {
        self.units
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .insert(name.to_string(), true);
        self
    }

    /// Register a known, disabled unit.
    pub fn with_disabled(self, kind: ItemKind, name: &str) -> Self {
        self.units
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .insert(name.to_string(), false);
        self
    }

    /// Make enable/disable of `name` exit nonzero.
    pub fn refusing(self, kind: ItemKind, name: &str) -> Self {
        self.refusing
            .lock()
            .unwrap()
            .insert((kind, name.to_string()));
        self
    }

    /// Make every invocation fail to launch.
    pub fn unavailable(self) -> Self {
        *self.unavailable.lock().unwrap() = true;
        self
    }

    /// Enabled names of `kind`.
    pub fn enabled(&self, kind: ItemKind) -> BTreeSet<String> {
        self.units
            .lock()
            .unwrap()
            .get(&kind)
            .map(|units| {
                units
                    .iter()
                    .filter(|(_, enabled)| **enabled)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every invocation so far, as `"<verb> <kind> [name]"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations that changed state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with("enable") || call.starts_with("disable"))
            .collect()
    }

    fn set(&self, kind: ItemKind, name: &str, enabled: bool, command: String) -> ToolOutput {
        if self
            .refusing
            .lock()
            .unwrap()
            .contains(&(kind, name.to_string()))
        {
            return ToolOutput::new(
                command,
                1,
                "",
                format!("ERROR: Could not change {} {name}\n", kind.label()),
            );
        }

        let mut units = self.units.lock().unwrap();
        match units.entry(kind).or_default().get_mut(name) {
            Some(state) => {
                *state = enabled;
                ToolOutput::new(command, 0, "", "")
            }
            None => ToolOutput::new(
                command,
                1,
                "",
                format!("ERROR: {} {name} does not exist!\n", kind.label()),
            ),
        }
    }
}

impl Backend for MockBackend {
    fn invoke(&self, kind: ItemKind, verb: Verb<'_>) -> Result<ToolOutput> {
        let record = match verb.target() {
            Some(name) => format!("{} {kind} {name}", verb_name(verb)),
            None => format!("{} {kind}", verb_name(verb)),
        };
        self.calls.lock().unwrap().push(record);

        let flag = kind.query_flag();
        if *self.unavailable.lock().unwrap() {
            return Err(Error::Launch {
                program: "a2query".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "No such file or directory",
                ),
            });
        }

        let output = match verb {
            Verb::QueryAll => {
                let stdout: String = self
                    .enabled(kind)
                    .iter()
                    .map(|name| format!("{name} (enabled by site administrator)\n"))
                    .collect();
                ToolOutput::new(format!("a2query {flag}"), RC_ENABLED, stdout, "")
            }
            Verb::QueryOne(name) => {
                let command = format!("a2query {flag} {name}");
                let state = self
                    .units
                    .lock()
                    .unwrap()
                    .get(&kind)
                    .and_then(|units| units.get(name).copied());
                match state {
                    Some(true) => ToolOutput::new(
                        command,
                        RC_ENABLED,
                        format!("{name} (enabled by site administrator)\n"),
                        "",
                    ),
                    Some(false) => ToolOutput::new(
                        command,
                        RC_NOT_ENABLED,
                        format!(
                            "No {} matches {name} (disabled by site administrator)\n",
                            kind.as_str()
                        ),
                        "",
                    ),
                    None => ToolOutput::new(
                        command,
                        RC_UNKNOWN,
                        "",
                        format!("No {} matches {name}\n", kind.as_str()),
                    ),
                }
            }
            Verb::Enable(name) => {
                let command = format!("a2en{} -q -f {name}", short_kind(kind));
                self.set(kind, name, true, command)
            }
            Verb::Disable(name) => {
                let command = format!("a2dis{} -q -f {name}", short_kind(kind));
                self.set(kind, name, false, command)
            }
        };
        Ok(output)
    }
}

fn verb_name(verb: Verb<'_>) -> &'static str {
    match verb {
        Verb::QueryAll => "query-all",
        Verb::QueryOne(_) => "query-one",
        Verb::Enable(_) => "enable",
        Verb::Disable(_) => "disable",
    }
}

fn short_kind(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Module => "mod",
        ItemKind::Config => "conf",
        ItemKind::Site => "site",
    }
}
