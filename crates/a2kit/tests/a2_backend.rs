//! Drives the real process backend against fake `a2*` shell scripts.
//!
//! Each test gets its own directory holding the fake tools and the
//! on-disk state they manipulate:
//! `<root>/state/<kind>/{available,enabled}/<name>`.
#![cfg(unix)]

use a2kit::{ApplyOptions, Client, CommandTable, DesiredState, ErrorCategory, ItemKind, Request};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Writing an executable while another test thread forks can make exec
/// fail with ETXTBSY, so fixtures are used one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

const A2QUERY: &str = r#"#!/bin/sh
root='@ROOT@'
case "$1" in
  -m) kind=module ;;
  -c) kind=config ;;
  -s) kind=site ;;
  *) echo "usage: a2query -m|-c|-s [name]" >&2; exit 2 ;;
esac
if [ -z "$2" ]; then
  for f in "$root/$kind/enabled"/*; do
    [ -e "$f" ] && echo "$(basename "$f") (enabled by site administrator)"
  done
  exit 0
fi
if [ -e "$root/$kind/enabled/$2" ]; then
  echo "$2 (enabled by site administrator)"
  exit 0
fi
if [ -e "$root/$kind/available/$2" ]; then
  echo "No $kind matches $2 (disabled by site administrator)"
  exit 32
fi
echo "No $kind matches $2" >&2
exit 1
"#;

const TOGGLE: &str = r#"#!/bin/sh
root='@ROOT@'
kind='@KIND@'
[ "$1" = "-q" ] && [ "$2" = "-f" ] || { echo "expected -q -f" >&2; exit 2; }
name="$3"
if [ ! -e "$root/$kind/available/$name" ]; then
  echo "ERROR: $kind $name does not exist!" >&2
  exit 1
fi
if [ -e "$root/$kind/refuse/$name" ]; then
  echo "ERROR: refusing to touch $name" >&2
  exit 1
fi
@ACTION@ "$root/$kind/enabled/$name"
echo "@VERB@ $name"
"#;

struct Fixture {
    dir: TempDir,
    _serial: MutexGuard<'static, ()>,
}

impl Fixture {
    fn new() -> Self {
        let serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self {
            dir,
            _serial: serial,
        };
        for kind in ItemKind::ALL {
            for sub in ["available", "enabled", "refuse"] {
                fs::create_dir_all(fixture.state().join(kind.as_str()).join(sub)).unwrap();
            }
        }

        fixture.script("a2query", &A2QUERY.replace("@ROOT@", &fixture.root()));
        for (kind, short) in [
            (ItemKind::Module, "mod"),
            (ItemKind::Config, "conf"),
            (ItemKind::Site, "site"),
        ] {
            let base = TOGGLE
                .replace("@ROOT@", &fixture.root())
                .replace("@KIND@", kind.as_str());
            fixture.script(
                &format!("a2en{short}"),
                &base.replace("@ACTION@", "touch").replace("@VERB@", "Enabling"),
            );
            fixture.script(
                &format!("a2dis{short}"),
                &base.replace("@ACTION@", "rm -f").replace("@VERB@", "Disabling"),
            );
        }
        fixture
    }

    fn state(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    fn root(&self) -> String {
        self.state().display().to_string()
    }

    fn bin(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    fn script(&self, name: &str, content: &str) {
        fs::create_dir_all(self.bin()).unwrap();
        let path = self.bin().join(name);
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn available(&self, kind: ItemKind, name: &str) -> &Self {
        touch(&self.state().join(kind.as_str()).join("available").join(name));
        self
    }

    fn enabled(&self, kind: ItemKind, name: &str) -> &Self {
        self.available(kind, name);
        touch(&self.state().join(kind.as_str()).join("enabled").join(name));
        self
    }

    fn refuse(&self, kind: ItemKind, name: &str) -> &Self {
        touch(&self.state().join(kind.as_str()).join("refuse").join(name));
        self
    }

    fn enabled_names(&self, kind: ItemKind) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.state().join(kind.as_str()).join("enabled"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn client(&self) -> Client {
        Client::new(CommandTable::default().resolve_in(&[self.bin()]))
    }
}

fn touch(path: &Path) {
    fs::write(path, "").unwrap();
}

fn apply(client: &Client, kind: ItemKind, names: &[&str], state: DesiredState) -> a2kit::Report {
    client.apply(
        &Request::new(kind, names.iter().copied(), state),
        &ApplyOptions::default(),
    )
}

#[test]
fn present_twice_is_idempotent() {
    let fixture = Fixture::new();
    fixture
        .available(ItemKind::Module, "deflate")
        .available(ItemKind::Module, "alias");
    let client = fixture.client();

    let first = apply(&client, ItemKind::Module, &["deflate", "alias"], DesiredState::Present);
    assert!(!first.failed, "{}", first.msg);
    assert!(first.changed);
    assert_eq!(first.msg, "enabled module(s): deflate, alias");

    let second = apply(&client, ItemKind::Module, &["deflate", "alias"], DesiredState::Present);
    assert!(!second.failed, "{}", second.msg);
    assert!(!second.changed);
    assert_eq!(fixture.enabled_names(ItemKind::Module), vec!["alias", "deflate"]);
}

#[test]
fn unknown_name_surfaces_query_output() {
    let fixture = Fixture::new();
    let report = apply(&fixture.client(), ItemKind::Config, &["ghost"], DesiredState::Present);

    assert!(report.failed);
    assert!(!report.changed);
    assert_eq!(report.category, Some(ErrorCategory::UnknownItem));
    assert_eq!(report.rc, Some(1));
    assert_eq!(report.stderr.as_deref(), Some("No config matches ghost\n"));
    assert!(fixture.enabled_names(ItemKind::Config).is_empty());
}

#[test]
fn exclusive_sites() {
    let fixture = Fixture::new();
    fixture
        .enabled(ItemKind::Site, "a")
        .enabled(ItemKind::Site, "b")
        .available(ItemKind::Site, "c");

    let report = apply(
        &fixture.client(),
        ItemKind::Site,
        &["b", "c"],
        DesiredState::ExclusivePresent,
    );
    assert!(!report.failed, "{}", report.msg);
    assert!(report.changed);
    assert_eq!(fixture.enabled_names(ItemKind::Site), vec!["b", "c"]);
}

#[test]
fn tool_failure_stops_the_batch() {
    let fixture = Fixture::new();
    fixture
        .available(ItemKind::Module, "php")
        .refuse(ItemKind::Module, "php")
        .available(ItemKind::Module, "ssl");

    let report = apply(&fixture.client(), ItemKind::Module, &["php", "ssl"], DesiredState::Present);
    assert!(report.failed);
    assert_eq!(report.category, Some(ErrorCategory::ToolFailure));
    assert_eq!(report.rc, Some(1));
    assert!(report.stderr.as_deref().unwrap().contains("refusing"));
    assert!(fixture.enabled_names(ItemKind::Module).is_empty());
}

#[test]
fn query_lists_enabled_names() {
    let fixture = Fixture::new();
    fixture
        .enabled(ItemKind::Module, "rewrite")
        .enabled(ItemKind::Module, "alias")
        .available(ItemKind::Module, "ssl");

    let report = fixture
        .client()
        .apply(&Request::query(ItemKind::Module), &ApplyOptions::default());
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["changed"], false);
    assert_eq!(json["module"], serde_json::json!(["alias", "rewrite"]));
}

#[test]
fn check_mode_leaves_disk_untouched() {
    let fixture = Fixture::new();
    fixture
        .enabled(ItemKind::Site, "old")
        .available(ItemKind::Site, "new");

    let report = fixture.client().apply(
        &Request::new(ItemKind::Site, ["new"], DesiredState::ExclusivePresent),
        &ApplyOptions { check_mode: true },
    );
    assert!(report.changed);
    assert_eq!(report.msg, "would enable site(s): new; would disable site(s): old");
    assert_eq!(fixture.enabled_names(ItemKind::Site), vec!["old"]);
}

#[test]
fn missing_tools_are_a_launch_failure() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let empty = tempfile::tempdir().unwrap();
    let table = CommandTable::default().with_query(empty.path().join("a2query"));
    let report =
        Client::new(table).apply(&Request::query(ItemKind::Site), &ApplyOptions::default());

    assert!(report.failed);
    assert_eq!(report.category, Some(ErrorCategory::Launch));
    assert!(report.msg.contains("a2query"));
}
