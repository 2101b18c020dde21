use a2kit::{Client, CommandTable, ItemKind};
use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use crate::Context;
use crate::commands;
use crate::ui;

struct Issue {
    category: &'static str,
    summary: String,
    detail: Option<String>,
    fix: Option<String>,
}

pub fn run(ctx: &Context) -> Result<ExitCode> {
    ui::section("a2state Health Check");

    let mut issues: Vec<Issue> = Vec::new();

    check_config(ctx);
    let table = ctx.config.config.command_table();
    check_commands(&table, &mut issues);
    check_queries(&table, &mut issues);

    println!();
    if issues.is_empty() {
        ui::changed("All Apache tools available");
        Ok(ExitCode::SUCCESS)
    } else {
        print_issue_summary(&issues);
        Ok(ExitCode::from(commands::EXIT_INFRASTRUCTURE))
    }
}

fn print_issue_summary(issues: &[Issue]) {
    let count = issues.len();
    let label = if count == 1 { "Issue" } else { "Issues" };
    ui::section(&format!("{count} {label} Found"));

    for (i, issue) in issues.iter().enumerate() {
        let num = i + 1;
        println!(
            "  {}  {} {}",
            format!("{num}.").bold(),
            issue.summary,
            format!("[{}]", issue.category).dimmed()
        );
        if let Some(detail) = &issue.detail {
            for line in detail.lines() {
                println!("      {}", line.dimmed());
            }
        }
        if let Some(fix) = &issue.fix {
            println!("      {}", ui::advice(fix));
        }
        println!();
    }
}

fn check_config(ctx: &Context) {
    ui::section("Configuration");
    match &ctx.config.path {
        Some(path) => ui::kv("file", &path.display().to_string()),
        None => ui::kv("file", "none (built-in defaults)"),
    }
    let extra = ctx.config.config.search_dirs();
    if !extra.is_empty() {
        let dirs: Vec<String> = extra.iter().map(|d| d.display().to_string()).collect();
        ui::kv("search path", &dirs.join(", "));
    }
}

fn check_commands(table: &CommandTable, issues: &mut Vec<Issue>) {
    ui::section("Tools");

    let missing = table.missing();
    for (role, path) in table.entries() {
        println!("{}", ui::tool_line(&role, path, !missing.contains(&path)));
    }

    for path in missing {
        issues.push(Issue {
            category: "Tools",
            summary: format!("{} was not found or is not executable", path.display()),
            detail: Some(
                "Searched the configured search_path, PATH and the sbin directories".into(),
            ),
            fix: Some(a2kit::ErrorCategory::Launch.advice().to_string()),
        });
    }
}

fn check_queries(table: &CommandTable, issues: &mut Vec<Issue>) {
    ui::section("Enabled Units");

    let client = Client::new(table.clone());
    for kind in ItemKind::ALL {
        match client.enabled(kind) {
            Ok(current) => ui::kv(kind.label(), &current.enabled.len().to_string()),
            Err(e) => {
                println!(
                    "  {} {} - {}",
                    "⚠".yellow(),
                    kind.label(),
                    "(query failed)".yellow()
                );
                issues.push(Issue {
                    category: "Enabled Units",
                    summary: format!("Could not list enabled {}s", kind.label()),
                    detail: Some(e.to_string()),
                    fix: Some(e.category().advice().to_string()),
                });
            }
        }
    }
}
