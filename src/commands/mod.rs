pub mod apply;
pub mod doctor;
pub mod query;
pub mod run;

use a2kit::{Client, Report};
use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use crate::Context;
use crate::ui;

/// Exit status for unknown names, refused changes and bad requests
pub const EXIT_FAILED: u8 = 1;

/// Exit status when the tools could not be run or answered unexpectedly
pub const EXIT_INFRASTRUCTURE: u8 = 2;

/// Client for the command table described by the loaded configuration
pub fn client(ctx: &Context) -> Client {
    Client::new(ctx.config.config.command_table())
}

pub fn exit_status(report: &Report) -> u8 {
    if !report.failed {
        return 0;
    }
    match report.category {
        Some(category) if category.is_infrastructure() => EXIT_INFRASTRUCTURE,
        _ => EXIT_FAILED,
    }
}

/// Print `report` as JSON or for a human and derive the exit status.
pub fn finish(ctx: &Context, report: &Report, json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        render(ctx, report);
    }
    Ok(ExitCode::from(exit_status(report)))
}

fn render(ctx: &Context, report: &Report) {
    for warning in &report.warnings {
        ui::warning(warning);
    }

    if report.failed {
        ui::failure(&report.msg);
        if let Some(rc) = report.rc {
            eprintln!("  {} {rc}", "exit code:".dimmed());
        }
        if let Some(stderr) = &report.stderr {
            ui::tool_stream("stderr", stderr);
        }
        if ctx.verbose > 0
            && let Some(stdout) = &report.stdout
        {
            ui::tool_stream("stdout", stdout);
        }
        if let Some(category) = report.category {
            eprintln!("  {}", ui::advice(category.advice()));
        }
        return;
    }

    if let Some(queried) = &report.queried {
        if ctx.quiet {
            for name in &queried.names {
                println!("{name}");
            }
        } else {
            ui::listing(&report.msg, &queried.names);
        }
        return;
    }

    if report.changed {
        ui::changed(&report.msg);
    } else if !ctx.quiet {
        ui::unchanged(&report.msg);
    }
}
