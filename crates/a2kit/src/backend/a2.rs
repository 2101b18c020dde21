//! Real backend running the Debian `a2query`/`a2en*`/`a2dis*` tools.

use crate::backend::{Backend, CommandTable};
use crate::error::{Error, Result};
use crate::types::{ItemKind, ToolOutput, Verb};
use std::path::Path;
use std::process::{Command, Stdio};

/// Backend that executes the commands of a [`CommandTable`].
pub struct A2Backend {
    commands: CommandTable,
}

impl A2Backend {
    /// Create a backend over an already-resolved command table.
    pub fn new(commands: CommandTable) -> Self {
        Self { commands }
    }

    /// The command table in use.
    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Run a program and capture its output.
    fn run(&self, program: &Path, args: &[&str]) -> Result<ToolOutput> {
        let command_line = render_command(program, args);
        log::debug!("Running {command_line}");

        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Launch {
                program: program.display().to_string(),
                source: e,
            })?;

        let rc = output.status.code().unwrap_or(-1);
        log::debug!("{command_line} exited with {rc}");

        Ok(ToolOutput {
            command: command_line,
            rc,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

impl Backend for A2Backend {
    fn invoke(&self, kind: ItemKind, verb: Verb<'_>) -> Result<ToolOutput> {
        let program = self.commands.program(kind, verb);
        let args = arguments(kind, verb);
        self.run(program, &args)
    }
}

/// Arguments passed for `verb` on `kind`.
fn arguments<'a>(kind: ItemKind, verb: Verb<'a>) -> Vec<&'a str> {
    match verb {
        Verb::QueryAll => vec![kind.query_flag()],
        Verb::QueryOne(name) => vec![kind.query_flag(), name],
        // quiet, and force so that essential modules can be disabled
        Verb::Enable(name) | Verb::Disable(name) => vec!["-q", "-f", name],
    }
}

fn render_command(program: &Path, args: &[&str]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
