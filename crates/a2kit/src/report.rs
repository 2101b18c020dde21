//! Final result of an invocation.
//!
//! A [`Report`] serializes to the flat JSON object expected by task
//! runners: `changed` and `msg` always, the enumerated set under the kind's
//! own key for queries, and `rc`/`stdout`/`stderr` on failure.

use crate::error::{Error, ErrorCategory};
use crate::types::{
    Action, ApplyOptions, CurrentState, DesiredState, ItemKind, OperationOutcome, Request,
};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Enabled names returned by a query-only invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queried {
    /// Kind that was queried; names the JSON key
    pub kind: ItemKind,
    /// Enabled names, sorted
    pub names: Vec<String>,
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Whether any name changed (or would change in check mode)
    pub changed: bool,
    /// Whether the invocation failed
    pub failed: bool,
    /// Human-readable summary
    pub msg: String,
    /// Non-fatal notes about the request
    pub warnings: Vec<String>,
    /// Enabled set, for query-only invocations
    pub queried: Option<Queried>,
    /// Exit code of the command that caused a failure
    pub rc: Option<i32>,
    /// Standard output of the command that caused a failure
    pub stdout: Option<String>,
    /// Standard error of the command that caused a failure
    pub stderr: Option<String>,
    /// Category of the failure
    pub category: Option<ErrorCategory>,
}

impl Report {
    /// Failed report for an error raised before a request could be formed,
    /// such as unparseable parameters.
    pub fn from_error(error: &Error) -> Self {
        let output = error.output();
        Report {
            changed: false,
            failed: true,
            msg: error.to_string(),
            warnings: Vec::new(),
            queried: None,
            rc: output.map(|o| o.rc),
            stdout: output.map(|o| o.stdout.clone()),
            stderr: output.map(|o| o.stderr.clone()),
            category: Some(error.category()),
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("changed", &self.changed)?;
        if self.failed {
            map.serialize_entry("failed", &true)?;
        }
        map.serialize_entry("msg", &self.msg)?;
        if let Some(queried) = &self.queried {
            map.serialize_entry(queried.kind.as_str(), &queried.names)?;
        }
        if let Some(rc) = self.rc {
            map.serialize_entry("rc", &rc)?;
        }
        if let Some(stdout) = &self.stdout {
            map.serialize_entry("stdout", stdout)?;
        }
        if let Some(stderr) = &self.stderr {
            map.serialize_entry("stderr", stderr)?;
        }
        if !self.warnings.is_empty() {
            map.serialize_entry("warnings", &self.warnings)?;
        }
        map.end()
    }
}

/// Builds the [`Report`] for a request.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    kind: ItemKind,
    state: Option<DesiredState>,
    names: Vec<String>,
    check_mode: bool,
    warnings: Vec<String>,
}

impl ReportBuilder {
    /// Start a report for `request`.
    pub fn new(request: &Request, options: &ApplyOptions) -> Self {
        Self {
            kind: request.kind,
            state: request.state,
            names: request.names.clone(),
            check_mode: options.check_mode,
            warnings: Vec::new(),
        }
    }

    /// Attach warnings collected while preparing the request.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    /// Report for a query-only invocation.
    pub fn query(self, current: &CurrentState) -> Report {
        let names: Vec<String> = current.enabled.iter().cloned().collect();
        let plural = plural(self.kind);
        let msg = if names.is_empty() {
            format!("no {plural} enabled")
        } else {
            format!("{} {plural} enabled", names.len())
        };

        Report {
            changed: false,
            failed: false,
            msg,
            warnings: self.warnings,
            queried: Some(Queried {
                kind: self.kind,
                names,
            }),
            rc: None,
            stdout: None,
            stderr: None,
            category: None,
        }
    }

    /// Report for a completed reconciliation.
    pub fn success(self, outcomes: &[OperationOutcome]) -> Report {
        let changed = outcomes.iter().any(|o| o.changed);
        let msg = self.success_message(outcomes);

        Report {
            changed,
            failed: false,
            msg,
            warnings: self.warnings,
            queried: None,
            rc: None,
            stdout: None,
            stderr: None,
            category: None,
        }
    }

    /// Report for a request that failed with `error`.
    pub fn failure(self, error: &Error) -> Report {
        Report {
            warnings: self.warnings,
            ..Report::from_error(error)
        }
    }

    fn success_message(&self, outcomes: &[OperationOutcome]) -> String {
        let plural = plural(self.kind);
        let enabled = names_with(outcomes, Action::Enable);
        let disabled = names_with(outcomes, Action::Disable);

        let mut parts = Vec::new();
        if !enabled.is_empty() {
            parts.push(format!(
                "{} {plural}: {}",
                self.verb(Action::Enable),
                enabled.join(", ")
            ));
        }
        if !disabled.is_empty() {
            parts.push(format!(
                "{} {plural}: {}",
                self.verb(Action::Disable),
                disabled.join(", ")
            ));
        }
        if !parts.is_empty() {
            return parts.join("; ");
        }

        let names = self.names.join(", ");
        match self.state {
            Some(DesiredState::Absent) => format!("{plural} already disabled: {names}"),
            Some(DesiredState::ExclusivePresent) if self.names.is_empty() => {
                format!("no {plural} enabled")
            }
            Some(DesiredState::ExclusivePresent) => {
                format!("{plural} already exclusively enabled: {names}")
            }
            _ => format!("{plural} already enabled: {names}"),
        }
    }

    fn verb(&self, action: Action) -> String {
        if self.check_mode {
            format!("would {action}")
        } else {
            format!("{action}d")
        }
    }
}

fn plural(kind: ItemKind) -> String {
    format!("{}(s)", kind.label())
}

fn names_with(outcomes: &[OperationOutcome], action: Action) -> Vec<&str> {
    outcomes
        .iter()
        .filter(|o| o.action == action && o.changed)
        .map(|o| o.name.as_str())
        .collect()
}
