// src/commands/install.rs

//! Local installation commands: fetch, activate, deactivate, start, stop,
//! purge and status

use super::short_version;
use anyhow::{Context, Result};
use mspm::{Client, ScriptOutput};
use std::io::Write;

/// Download and unpack a version
pub fn cmd_fetch(client: &Client, package: &str, designator: &str, activate: bool) -> Result<()> {
    let outcome = client
        .fetch(package, designator)
        .with_context(|| format!("Failed to fetch {} {}", package, designator))?;

    if outcome.downloaded {
        println!("Fetched {} {} into {}", package, short_version(&outcome.version), outcome.path.display());
    } else {
        println!("{} {} is already present", package, short_version(&outcome.version));
    }

    if activate {
        client.activate(package, &outcome.version)?;
        println!("Activated {} {}", package, short_version(&outcome.version));
    }
    Ok(())
}

/// Make a fetched version active
pub fn cmd_activate(client: &Client, package: &str, designator: &str) -> Result<()> {
    let version = client
        .activate(package, designator)
        .with_context(|| format!("Failed to activate {} {}", package, designator))?;
    println!("Activated {} {}", package, short_version(&version));
    Ok(())
}

/// Remove the active pointer
pub fn cmd_deactivate(client: &Client, package: &str, designator: &str) -> Result<()> {
    client
        .deactivate(package, designator)
        .with_context(|| format!("Failed to deactivate {} {}", package, designator))?;
    println!("Deactivated {}", package);
    Ok(())
}

fn report_script(package: &str, action: &str, output: Option<ScriptOutput>) -> Result<()> {
    let Some(output) = output else {
        println!("{} has no {} entry point", package, action);
        return Ok(());
    };

    std::io::stdout().write_all(&output.stdout)?;
    std::io::stderr().write_all(&output.stderr)?;

    if !output.success() {
        match output.code() {
            Some(code) => anyhow::bail!("{} {} exited with status {}", package, action, code),
            None => anyhow::bail!("{} {} was terminated by a signal", package, action),
        }
    }
    Ok(())
}

/// Run the start entry point
pub fn cmd_start(client: &Client, package: &str) -> Result<()> {
    let output = client.start(package)?;
    report_script(package, "start", output)
}

/// Run the stop entry point
pub fn cmd_stop(client: &Client, package: &str) -> Result<()> {
    let output = client.stop(package)?;
    report_script(package, "stop", output)
}

/// Delete inactive local versions
pub fn cmd_purge(client: &Client, package: &str, labels: &[String]) -> Result<()> {
    let report = client
        .purge(package, labels)
        .with_context(|| format!("Failed to purge {}", package))?;

    for version in &report.removed {
        println!("Removed {} {}", package, short_version(version));
    }
    if let Some(active) = &report.kept_active {
        println!("Kept active version {}", short_version(active));
    }
    for label in &report.unresolved {
        println!("Label '{}' is not set, skipped", label);
    }
    if report.removed.is_empty() {
        println!("Nothing to purge.");
    }
    Ok(())
}

/// Show local versions and the active one
pub fn cmd_status(client: &Client, package: &str) -> Result<()> {
    let installed = client.installed_versions(package)?;
    let active = client.active_version(package)?;

    if installed.is_empty() {
        println!("No local versions of {}.", package);
        return Ok(());
    }

    println!("{} ({} local versions):", package, installed.len());
    for version in &installed {
        let marker = if active.as_deref() == Some(version.as_str()) { "*" } else { " " };
        println!("  {} {}", marker, version);
    }
    if active.is_none() {
        println!("No version is active.");
    }
    Ok(())
}
