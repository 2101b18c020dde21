use a2kit::{ApplyOptions, Request};
use anyhow::Result;
use std::process::ExitCode;

use crate::Context;
use crate::cli::QueryArgs;
use crate::commands;

pub fn run(ctx: &Context, args: QueryArgs) -> Result<ExitCode> {
    let request = Request::query(args.item.into());
    let report = commands::client(ctx).apply(&request, &ApplyOptions::default());
    commands::finish(ctx, &report, args.json)
}
