//! Core types for Apache unit reconciliation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Kind of toggleable Apache unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Loadable module (`a2enmod` / `a2dismod`)
    Module,
    /// Configuration snippet (`a2enconf` / `a2disconf`)
    Config,
    /// Virtual host (`a2ensite` / `a2dissite`)
    Site,
}

impl ItemKind {
    /// Every kind, in declaration order.
    pub const ALL: [ItemKind; 3] = [ItemKind::Module, ItemKind::Config, ItemKind::Site];

    /// Parameter value naming this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Module => "module",
            ItemKind::Config => "config",
            ItemKind::Site => "site",
        }
    }

    /// Human-readable name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Module => "module",
            ItemKind::Config => "configuration",
            ItemKind::Site => "site",
        }
    }

    /// Flag selecting this kind in `a2query`.
    pub fn query_flag(&self) -> &'static str {
        match self {
            ItemKind::Module => "-m",
            ItemKind::Config => "-c",
            ItemKind::Site => "-s",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "module" => Ok(ItemKind::Module),
            "config" => Ok(ItemKind::Config),
            "site" => Ok(ItemKind::Site),
            other => Err(Error::InvalidRequest(format!(
                "unknown item kind '{other}' (expected module, config or site)"
            ))),
        }
    }
}

/// Target state of the requested names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    /// Listed names are enabled
    Present,
    /// Listed names are disabled
    Absent,
    /// Listed names are enabled and every other name of the kind is disabled
    ExclusivePresent,
}

impl DesiredState {
    /// Parameter value naming this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            DesiredState::Present => "present",
            DesiredState::Absent => "absent",
            DesiredState::ExclusivePresent => "exclusive_present",
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesiredState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "present" => Ok(DesiredState::Present),
            "absent" => Ok(DesiredState::Absent),
            "exclusive_present" => Ok(DesiredState::ExclusivePresent),
            other => Err(Error::InvalidRequest(format!(
                "unknown state '{other}' (expected present, absent or exclusive_present)"
            ))),
        }
    }
}

/// Operation requested from the external tool family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb<'a> {
    /// List every enabled name of the kind
    QueryAll,
    /// Test whether a single name is a recognized unit
    QueryOne(&'a str),
    /// Enable a name
    Enable(&'a str),
    /// Disable a name
    Disable(&'a str),
}

impl Verb<'_> {
    /// Name the verb is applied to, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Verb::QueryAll => None,
            Verb::QueryOne(name) | Verb::Enable(name) | Verb::Disable(name) => Some(name),
        }
    }

    /// Whether the verb changes on-disk state.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Verb::Enable(_) | Verb::Disable(_))
    }
}

/// Captured result of one external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Command line as it was executed
    pub command: String,
    /// Exit code (`-1` when terminated by a signal)
    pub rc: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Build an output record.
    pub fn new(
        command: impl Into<String>,
        rc: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            rc,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.rc == 0
    }
}

/// A desired-state declaration for one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Kind of unit the names refer to
    pub kind: ItemKind,
    /// Names in processing order; empty means query only
    pub names: Vec<String>,
    /// Target state; ignored for query-only requests
    pub state: Option<DesiredState>,
}

impl Request {
    /// Create a request that drives `names` to `state`.
    pub fn new<I, S>(kind: ItemKind, names: I, state: DesiredState) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            names: names.into_iter().map(Into::into).collect(),
            state: Some(state),
        }
    }

    /// Create a query-only request.
    pub fn query(kind: ItemKind) -> Self {
        Self {
            kind,
            names: Vec::new(),
            state: None,
        }
    }

    /// Whether this request only reads the current state.
    pub fn is_query(&self) -> bool {
        self.names.is_empty()
    }

    /// Target state of a mutating request.
    pub fn desired_state(&self) -> Result<DesiredState> {
        self.state.ok_or_else(|| {
            Error::InvalidRequest("state is required when names are given".to_string())
        })
    }

    /// Check the request is well-formed.
    pub fn validate(&self) -> Result<()> {
        if self.is_query() {
            return Ok(());
        }
        self.desired_state()?;

        for name in &self.names {
            if name.trim().is_empty() {
                return Err(Error::InvalidRequest(format!(
                    "empty {} name",
                    self.kind.label()
                )));
            }
            // Would be parsed as an option by the enable/disable tools
            if name.starts_with('-') {
                return Err(Error::InvalidRequest(format!(
                    "invalid {} name '{name}'",
                    self.kind.label()
                )));
            }
        }
        Ok(())
    }

    /// Collapse repeated names, keeping the first occurrence.
    ///
    /// Returns one warning per dropped duplicate.
    pub fn dedup_names(&mut self) -> Vec<String> {
        let kind = self.kind;
        let mut seen = HashSet::new();
        let mut warnings = Vec::new();
        self.names.retain(|name| {
            if seen.insert(name.clone()) {
                true
            } else {
                warnings.push(format!(
                    "{} {name} was requested more than once",
                    kind.label()
                ));
                false
            }
        });
        warnings
    }
}

/// Snapshot of the enabled names of one kind, read once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentState {
    /// Kind the snapshot was taken for
    pub kind: ItemKind,
    /// Names enabled at query time
    pub enabled: BTreeSet<String>,
}

impl CurrentState {
    /// Create a snapshot.
    pub fn new<I, S>(kind: ItemKind, enabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            enabled: enabled.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` was enabled at query time.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }
}

/// Action taken for one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Name was enabled
    Enable,
    /// Name was disabled
    Disable,
    /// Name already satisfied the desired state
    #[serde(rename = "none")]
    Unchanged,
}

impl Action {
    /// Verb used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Enable => "enable",
            Action::Disable => "disable",
            Action::Unchanged => "none",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of reconciling a single name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Name the outcome refers to
    pub name: String,
    /// Action taken (or that would be taken in check mode)
    pub action: Action,
    /// Whether state changed (or would change in check mode)
    pub changed: bool,
    /// Output of the mutating command, when one ran
    pub output: Option<ToolOutput>,
}

impl OperationOutcome {
    /// Outcome for a name that already satisfied the desired state.
    pub fn unchanged(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: Action::Unchanged,
            changed: false,
            output: None,
        }
    }

    /// Outcome for a name that was (or would be) changed.
    pub fn changed(name: impl Into<String>, action: Action, output: Option<ToolOutput>) -> Self {
        Self {
            name: name.into(),
            action,
            changed: true,
            output,
        }
    }
}

/// Options controlling how a request is applied.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Report what would change without running enable/disable commands
    pub check_mode: bool,
}
