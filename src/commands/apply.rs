use a2kit::{ApplyOptions, Request};
use anyhow::Result;
use std::process::ExitCode;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<ExitCode> {
    let request = Request {
        kind: args.item.into(),
        names: args.names,
        state: args.state.map(Into::into),
    };
    let options = ApplyOptions {
        check_mode: args.check,
    };
    log::debug!(
        "Applying {} {:?} -> {}",
        request.kind,
        request.names,
        request.state.map_or("query", |s| s.as_str())
    );

    let report = commands::client(ctx).apply(&request, &options);
    commands::finish(ctx, &report, args.json)
}
