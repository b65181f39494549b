//! Development automation for the RCM client workspace.
//!
//! Run with: `cargo xtask <task>`

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context, Result};

mod features;

/// A named task and the one-line summary shown by `help`
struct Task {
    name: &'static str,
    about: &'static str,
    run: fn() -> Result<()>,
}

const TASKS: &[Task] = &[
    Task { name: "ci", about: "every check below, in order", run: ci },
    Task { name: "fmt", about: "rustfmt in check mode", run: fmt },
    Task { name: "clippy", about: "clippy on all targets and features", run: clippy },
    Task { name: "test", about: "workspace tests", run: test },
    Task { name: "test-features", about: "rcm-infra tests per feature set", run: features::test_feature_matrix },
    Task { name: "deny", about: "cargo-deny license and advisory check", run: deny },
    Task { name: "audit", about: "cargo-audit vulnerability scan", run: audit },
];

fn main() -> ExitCode {
    let Some(name) = env::args().nth(1).filter(|n| n != "help") else {
        print_help();
        return ExitCode::SUCCESS;
    };

    let Some(task) = TASKS.iter().find(|t| t.name == name) else {
        eprintln!("unknown task `{name}`\n");
        print_help();
        return ExitCode::FAILURE;
    };

    match (task.run)() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xtask {name} failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("usage: cargo xtask <task>\n\ntasks:");
    for task in TASKS {
        println!("    {:<14} {}", task.name, task.about);
    }
}

fn ci() -> Result<()> {
    let steps = TASKS.iter().filter(|t| t.name != "ci");
    let total = steps.clone().count();

    for (index, task) in steps.enumerate() {
        println!("\n==> [{}/{total}] {}", index + 1, task.name);
        (task.run)().with_context(|| format!("step `{}`", task.name))?;
    }

    println!("\nci: all checks passed");
    Ok(())
}

/// Run `cargo <args>` and fail unless it exits cleanly
fn cargo(args: &[&str]) -> Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("cannot spawn `cargo {}`", args.join(" ")))?;

    if !status.success() {
        bail!("`cargo {}` exited with {status}", args.join(" "));
    }
    Ok(())
}

fn require_plugin(plugin: &str) -> Result<()> {
    let installed = Command::new("cargo")
        .args([plugin, "--version"])
        .output()
        .is_ok_and(|out| out.status.success());

    if !installed {
        bail!("cargo-{plugin} is missing; install it with `cargo install cargo-{plugin}`");
    }
    Ok(())
}

fn fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(&["clippy", "--workspace", "--all-targets", "--all-features"])
}

fn test() -> Result<()> {
    cargo(&["test", "--workspace"])
}

fn deny() -> Result<()> {
    require_plugin("deny")?;
    cargo(&["deny", "check"])
}

fn audit() -> Result<()> {
    require_plugin("audit")?;
    cargo(&["audit"])
}
