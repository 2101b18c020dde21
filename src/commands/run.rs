//! Task-runner entry point: JSON parameters in, JSON result out.

use a2kit::{ApplyOptions, Params, Report};
use anyhow::{Context as _, Result};
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use crate::Context;
use crate::cli::RunArgs;
use crate::commands;

pub fn run(ctx: &Context, args: RunArgs) -> Result<ExitCode> {
    let input = read_params(&args.params)?;
    let options = ApplyOptions {
        check_mode: args.check,
    };
    let report = execute(&commands::client(ctx), &input, &options);
    commands::finish(ctx, &report, true)
}

fn read_params(source: &str) -> Result<String> {
    if source == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Could not read parameters from stdin")?;
        return Ok(input);
    }
    let path = crate::config::expand(source);
    fs::read_to_string(&path).with_context(|| format!("Could not read {}", path.display()))
}

/// Parse `input` and apply it; malformed parameters become a failed report.
fn execute(client: &a2kit::Client, input: &str, options: &ApplyOptions) -> Report {
    match Params::from_json(input).and_then(Params::into_request) {
        Ok(request) => client.apply(&request, options),
        Err(e) => {
            log::debug!("Rejecting parameters: {e}");
            Report::from_error(&e)
        }
    }
}
