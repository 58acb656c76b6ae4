// src/commands/catalog.rs

//! Catalog CLI commands: upload, info, label, show

use super::short_version;
use anyhow::{Context, Result};
use mspm::protocol::{GetPackageRequest, PackageInformation, SetLabelRequest};
use mspm::Client;
use std::path::Path;
use tracing::info;

fn print_version(info: &PackageInformation) {
    let uploaded = info
        .uploaded_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    if info.labels.is_empty() {
        println!("  {}  {}", info.version, uploaded);
    } else {
        println!("  {}  {}  [{}]", info.version, uploaded, info.labels.join(", "));
    }
}

/// Upload a directory tree as a new version
pub fn cmd_upload(client: &Client, package: &str, dir: &Path, labels: &[String]) -> Result<()> {
    let uploaded = client
        .upload(package, dir)
        .with_context(|| format!("Failed to upload {} from {}", package, dir.display()))?;
    println!("Uploaded {} version {}", package, uploaded.version);

    if !labels.is_empty() {
        cmd_label(client, package, &uploaded.version, labels)?;
    }
    Ok(())
}

/// List every version of a package
pub fn cmd_info(client: &Client, package: &str) -> Result<()> {
    let mut versions = client.package_information(package)?;
    if versions.is_empty() {
        println!("No versions of {} in the catalog.", package);
        return Ok(());
    }

    versions.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
    println!("{} ({} versions):", package, versions.len());
    for version in &versions {
        print_version(version);
    }
    Ok(())
}

/// Point labels at a version
pub fn cmd_label(client: &Client, package: &str, designator: &str, labels: &[String]) -> Result<()> {
    let response = client.catalog().set_labels(&SetLabelRequest {
        package_name: package.to_string(),
        version: designator.to_string(),
        labels: labels.to_vec(),
    })?;

    for failure in &response.failed {
        eprintln!("Failed to set label '{}': {}", failure.label, failure.reason);
    }
    info!(
        "Labels on {} {}: {:?}",
        package,
        short_version(&response.package.version),
        response.package.labels
    );
    print_version(&response.package);

    if !response.failed.is_empty() {
        anyhow::bail!("{} of {} labels could not be set", response.failed.len(), labels.len());
    }
    Ok(())
}

/// Show the version a designator resolves to
pub fn cmd_show(client: &Client, package: &str, designator: &str) -> Result<()> {
    let response = client.catalog().get_package(&GetPackageRequest {
        package_name: package.to_string(),
        designator: designator.to_string(),
    })?;
    println!("{} {}:", package, designator);
    print_version(&response.package);
    Ok(())
}
