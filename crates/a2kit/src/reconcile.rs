//! Desired-state reconciliation.
//!
//! Names are processed in request order against a single snapshot of the
//! enabled set. The first unknown name or failing command aborts the whole
//! request; names after it are never touched. Names that already satisfy
//! the desired state through enabled-set membership cost no extra query.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::query::{Probe, StateQuery};
use crate::types::{
    Action, ApplyOptions, CurrentState, DesiredState, ItemKind, OperationOutcome, Request, Verb,
};
use std::collections::BTreeSet;

/// Computes and applies the enable/disable operations for a request.
pub struct Reconciler<'a> {
    backend: &'a dyn Backend,
    query: StateQuery<'a>,
    options: &'a ApplyOptions,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over `backend`.
    pub fn new(backend: &'a dyn Backend, options: &'a ApplyOptions) -> Self {
        Self {
            backend,
            query: StateQuery::new(backend),
            options,
        }
    }

    /// Drive the names of `request` to its desired state.
    ///
    /// Returns one outcome per processed name: requested names first, in
    /// request order, then the exclusive sweep in lexicographic order.
    /// With no names, `ExclusivePresent` disables everything enabled;
    /// routing empty requests to a pure query is the caller's job.
    pub fn reconcile(
        &self,
        request: &Request,
        current: &CurrentState,
    ) -> Result<Vec<OperationOutcome>> {
        let kind = request.kind;
        let mut outcomes = Vec::with_capacity(request.names.len());

        match request.desired_state()? {
            DesiredState::Present => {
                for name in &request.names {
                    outcomes.push(self.ensure_enabled(kind, name, current)?);
                }
            }
            DesiredState::Absent => {
                for name in &request.names {
                    outcomes.push(self.ensure_disabled(kind, name, current)?);
                }
            }
            DesiredState::ExclusivePresent => {
                for name in &request.names {
                    outcomes.push(self.ensure_enabled(kind, name, current)?);
                }
                for name in exclusive_sweep(&request.names, current) {
                    outcomes.push(self.apply(kind, name, Action::Disable)?);
                }
            }
        }

        Ok(outcomes)
    }

    fn ensure_enabled(
        &self,
        kind: ItemKind,
        name: &str,
        current: &CurrentState,
    ) -> Result<OperationOutcome> {
        if current.is_enabled(name) {
            return Ok(OperationOutcome::unchanged(name));
        }

        match self.query.probe(kind, name)? {
            Probe::Unknown(output) => Err(Error::UnknownItem {
                kind,
                name: name.to_string(),
                output,
            }),
            Probe::Enabled => {
                // Enabled after the snapshot was taken
                log::debug!("{kind} {name} became enabled since the snapshot");
                Ok(OperationOutcome::unchanged(name))
            }
            Probe::Disabled => self.apply(kind, name, Action::Enable),
        }
    }

    fn ensure_disabled(
        &self,
        kind: ItemKind,
        name: &str,
        current: &CurrentState,
    ) -> Result<OperationOutcome> {
        // Membership in the enabled set already proves the name is known
        if current.is_enabled(name) {
            return self.apply(kind, name, Action::Disable);
        }

        match self.query.probe(kind, name)? {
            Probe::Unknown(output) => Err(Error::UnknownItem {
                kind,
                name: name.to_string(),
                output,
            }),
            Probe::Disabled => Ok(OperationOutcome::unchanged(name)),
            Probe::Enabled => {
                log::debug!("{kind} {name} became enabled since the snapshot");
                self.apply(kind, name, Action::Disable)
            }
        }
    }

    /// Run (or in check mode, skip) the mutating command for `action`.
    fn apply(&self, kind: ItemKind, name: &str, action: Action) -> Result<OperationOutcome> {
        let verb = match action {
            Action::Enable => Verb::Enable(name),
            Action::Disable => Verb::Disable(name),
            Action::Unchanged => return Ok(OperationOutcome::unchanged(name)),
        };

        if self.options.check_mode {
            log::info!("Would {action} {kind} {name}");
            return Ok(OperationOutcome::changed(name, action, None));
        }

        let output = self.backend.invoke(kind, verb)?;
        if !output.success() {
            return Err(Error::ToolFailed {
                kind,
                name: name.to_string(),
                action,
                output,
            });
        }

        log::info!("{action}d {kind} {name}");
        Ok(OperationOutcome::changed(name, action, Some(output)))
    }
}

/// Names enabled in `current` but not requested, in lexicographic order.
pub fn exclusive_sweep<'c>(requested: &[String], current: &'c CurrentState) -> Vec<&'c str> {
    let requested: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
    current
        .enabled
        .iter()
        .map(String::as_str)
        .filter(|name| !requested.contains(name))
        .collect()
}
