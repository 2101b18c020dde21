//! Current-state queries.
//!
//! All knowledge of the `a2query` output conventions lives here: how the
//! list of enabled names is printed, and which exit code/stderr pairs mean
//! "enabled", "known but disabled" or "no such unit".

use crate::backend::{Backend, RC_DISABLED, RC_ENABLED, RC_NOT_ENABLED, RC_UNKNOWN};
use crate::error::{Error, Result};
use crate::types::{CurrentState, ItemKind, ToolOutput, Verb};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// `a2query` message for a name that matches no unit, e.g. "No module matches foo".
static NO_MATCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bno \w+ matches\b").expect("valid regex"));

/// State of a single name as reported by the query tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Known and enabled
    Enabled,
    /// Known but not enabled
    Disabled,
    /// Not a unit of this kind; carries the query output
    Unknown(ToolOutput),
}

impl Probe {
    /// Whether the name is a recognized unit.
    pub fn is_known(&self) -> bool {
        !matches!(self, Probe::Unknown(_))
    }
}

/// Reads current state through a [`Backend`].
pub struct StateQuery<'a> {
    backend: &'a dyn Backend,
}

impl<'a> StateQuery<'a> {
    /// Create a query over `backend`.
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    /// Snapshot the enabled names of `kind`.
    pub fn currently_enabled(&self, kind: ItemKind) -> Result<CurrentState> {
        let output = self.backend.invoke(kind, Verb::QueryAll)?;

        let enabled = if output.success() {
            parse_enabled(&output.stdout)
        } else if output.stdout.trim().is_empty() && is_empty_listing(&output) {
            // a2query exits nonzero when nothing of the kind is enabled
            BTreeSet::new()
        } else {
            return Err(Error::QueryFailed { kind, output });
        };

        log::debug!("{} {kind}(s) enabled: {enabled:?}", enabled.len());
        Ok(CurrentState { kind, enabled })
    }

    /// Ask the query tool about one name.
    pub fn probe(&self, kind: ItemKind, name: &str) -> Result<Probe> {
        let output = self.backend.invoke(kind, Verb::QueryOne(name))?;
        classify(kind, output)
    }

    /// Whether `name` is a recognized unit of `kind`, enabled or not.
    pub fn is_known(&self, kind: ItemKind, name: &str) -> Result<bool> {
        Ok(self.probe(kind, name)?.is_known())
    }
}

/// Parse the listing printed by `a2query -m|-c|-s`.
///
/// Each line is `<name> (<reason>)`; only the name is kept.
pub fn parse_enabled(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(ToString::to_string)
        .collect()
}

fn is_empty_listing(output: &ToolOutput) -> bool {
    matches!(output.rc, RC_UNKNOWN | RC_NOT_ENABLED | RC_DISABLED)
        && (output.stderr.trim().is_empty() || NO_MATCH.is_match(&output.stderr))
}

/// Map a single-name query result to a [`Probe`].
///
/// Unrecognized combinations are errors rather than a guess at "known".
fn classify(kind: ItemKind, output: ToolOutput) -> Result<Probe> {
    match output.rc {
        RC_ENABLED => Ok(Probe::Enabled),
        RC_NOT_ENABLED | RC_DISABLED => Ok(Probe::Disabled),
        RC_UNKNOWN if output.stderr.trim().is_empty() || NO_MATCH.is_match(&output.stderr) => {
            Ok(Probe::Unknown(output))
        }
        _ => Err(Error::QueryFailed { kind, output }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    fn query_output(rc: i32, stdout: &str, stderr: &str) -> ToolOutput {
        ToolOutput::new("a2query -m ssl", rc, stdout, stderr)
    }

    #[test]
    fn test_parse_enabled() {
        let stdout = "alias (enabled by maintainer script)\n\
                      deflate (enabled by maintainer script)\n\
                      \n\
                      rewrite (enabled by site administrator)\n";
        let names = parse_enabled(stdout);
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["alias", "deflate", "rewrite"]
        );
    }

    #[test]
    fn test_parse_enabled_empty() {
        assert!(parse_enabled("").is_empty());
        assert!(parse_enabled("\n  \n").is_empty());
    }

    #[test]
    fn test_classify_exit_codes() {
        let enabled = classify(ItemKind::Module, query_output(0, "ssl (enabled)", "")).unwrap();
        assert_eq!(enabled, Probe::Enabled);

        for rc in [RC_NOT_ENABLED, RC_DISABLED] {
            let probe = classify(ItemKind::Module, query_output(rc, "", "")).unwrap();
            assert_eq!(probe, Probe::Disabled);
            assert!(probe.is_known());
        }
    }

    #[test]
    fn test_classify_unknown_requires_stderr_convention() {
        let unknown =
            classify(ItemKind::Module, query_output(1, "", "No module matches ssl\n")).unwrap();
        assert!(!unknown.is_known());

        let silent = classify(ItemKind::Module, query_output(1, "", "")).unwrap();
        assert!(!silent.is_known());

        let odd = classify(ItemKind::Module, query_output(1, "", "a2query: Permission denied"));
        assert!(matches!(odd, Err(Error::QueryFailed { .. })));
    }

    #[test]
    fn test_classify_unexpected_code_is_error() {
        let result = classify(ItemKind::Site, query_output(2, "", "usage: a2query"));
        let err = result.unwrap_err();
        assert!(err.is_infrastructure());
        assert_eq!(err.output().unwrap().rc, 2);
    }

    #[test]
    fn test_currently_enabled_via_mock() {
        let mock = MockBackend::new()
            .with_enabled(ItemKind::Site, "000-default")
            .with_enabled(ItemKind::Site, "blog")
            .with_disabled(ItemKind::Site, "shop");
        let state = StateQuery::new(&mock)
            .currently_enabled(ItemKind::Site)
            .unwrap();
        assert_eq!(state.kind, ItemKind::Site);
        assert!(state.is_enabled("blog"));
        assert!(!state.is_enabled("shop"));
        assert_eq!(state.enabled.len(), 2);
    }

    #[test]
    fn test_is_known_distinguishes_disabled_from_unknown() {
        let mock = MockBackend::new().with_disabled(ItemKind::Config, "charset");
        let query = StateQuery::new(&mock);
        assert!(query.is_known(ItemKind::Config, "charset").unwrap());
        assert!(!query.is_known(ItemKind::Config, "nope").unwrap());
    }

    #[test]
    fn test_empty_listing_with_nonzero_exit() {
        let output = ToolOutput::new("a2query -s", RC_NOT_ENABLED, "", "");
        assert!(is_empty_listing(&output));

        let garbage = ToolOutput::new("a2query -s", 2, "", "boom");
        assert!(!is_empty_listing(&garbage));
    }
}
