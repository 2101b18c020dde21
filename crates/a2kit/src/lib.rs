//! # a2kit
//!
//! Reconcile the enabled/disabled state of Apache modules, configurations
//! and sites against a declared desired state.
//!
//! The actual changes are delegated to the Debian tool family
//! (`a2query`, `a2enmod`/`a2dismod`, `a2enconf`/`a2disconf`,
//! `a2ensite`/`a2dissite`). This crate decides which of them to run,
//! classifies their results and produces a single idempotent report.
//!
//! ## Example
//!
//! ```no_run
//! use a2kit::{ApplyOptions, Client, CommandTable, DesiredState, ItemKind, Request};
//!
//! let client = Client::new(CommandTable::default());
//!
//! let request = Request::new(ItemKind::Module, ["deflate", "alias"], DesiredState::Present);
//! let report = client.apply(&request, &ApplyOptions::default());
//! println!("changed: {}, {}", report.changed, report.msg);
//!
//! // An empty name list only reads the current state
//! let report = client.apply(&Request::query(ItemKind::Site), &ApplyOptions::default());
//! println!("{}", report.to_json().unwrap());
//! ```
//!
//! ## Exclusive state
//!
//! [`DesiredState::ExclusivePresent`] enables the listed names and disables
//! every other enabled name of the same kind.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod params;
pub mod query;
pub mod reconcile;
pub mod report;
pub mod types;

pub use backend::{Backend, CommandTable, MockBackend, a2::A2Backend};
pub use error::{Error, ErrorCategory, Result};
pub use params::Params;
pub use query::{Probe, StateQuery};
pub use reconcile::Reconciler;
pub use report::{Report, ReportBuilder};
pub use types::{
    Action, ApplyOptions, CurrentState, DesiredState, ItemKind, OperationOutcome, Request,
    ToolOutput, Verb,
};

/// High-level client tying query, reconciliation and reporting together.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client running the commands of `commands`.
    pub fn new(commands: CommandTable) -> Self {
        Self {
            backend: Box::new(A2Backend::new(commands)),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Read the enabled names of `kind`.
    pub fn enabled(&self, kind: ItemKind) -> Result<CurrentState> {
        StateQuery::new(self.backend.as_ref()).currently_enabled(kind)
    }

    /// Whether `name` is a recognized unit of `kind`.
    pub fn is_known(&self, kind: ItemKind, name: &str) -> Result<bool> {
        StateQuery::new(self.backend.as_ref()).is_known(kind, name)
    }

    /// Apply `request` and report the result.
    ///
    /// Never fails: every error is turned into a failed [`Report`].
    pub fn apply(&self, request: &Request, options: &ApplyOptions) -> Report {
        let mut request = request.clone();
        let builder = ReportBuilder::new(&request, options);

        if let Err(e) = request.validate() {
            return builder.failure(&e);
        }
        let warnings = request.dedup_names();
        for warning in &warnings {
            log::warn!("{warning}");
        }
        let builder = ReportBuilder::new(&request, options).with_warnings(warnings);

        let current = match self.enabled(request.kind) {
            Ok(current) => current,
            Err(e) => return builder.failure(&e),
        };

        if request.is_query() {
            return builder.query(&current);
        }

        match Reconciler::new(self.backend.as_ref(), options).reconcile(&request, &current) {
            Ok(outcomes) => builder.success(&outcomes),
            Err(e) => {
                log::debug!("Aborting {} request: {e}", request.kind);
                builder.failure(&e)
            }
        }
    }
}
