// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: package name
fn package_arg() -> Arg {
    Arg::new("package").required(true).help("Package name")
}

/// Common argument: version-id or label, defaulting to latest
fn designator_arg() -> Arg {
    Arg::new("designator")
        .default_value("latest")
        .help("Version-id or label")
}

fn build_cli() -> Command {
    Command::new("mspm")
        .version(env!("CARGO_PKG_VERSION"))
        .author("mspm Contributors")
        .about("Minimal software package manager with a content-addressed catalog")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .default_value("/etc/mspm/mspm.toml")
                .global(true)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(clap::ArgAction::SetTrue)
                .global(true)
                .help("Enable debug logging"),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .value_name("URL")
                .global(true)
                .help("Catalog server URL"),
        )
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("PATH")
                .global(true)
                .help("Install root"),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the catalog server")
                .arg(Arg::new("listen").long("listen").help("Address to listen on"))
                .arg(Arg::new("playground").long("playground").help("Staging area for uploads"))
                .arg(Arg::new("store").long("store").help("Durable archive store")),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a directory tree as a new version of a package")
                .arg(package_arg())
                .arg(Arg::new("dir").required(true).help("Directory holding the package tree"))
                .arg(
                    Arg::new("label")
                        .short('l')
                        .long("label")
                        .action(clap::ArgAction::Append)
                        .help("Labels to apply to the new version"),
                ),
        )
        .subcommand(
            Command::new("info")
                .about("List all versions of a package known to the catalog")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("label")
                .about("Point labels at a version")
                .arg(package_arg())
                .arg(Arg::new("designator").required(true).help("Version-id or existing label"))
                .arg(
                    Arg::new("labels")
                        .required(true)
                        .num_args(1..)
                        .help("Labels to set"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Show the version a designator resolves to")
                .arg(package_arg())
                .arg(designator_arg()),
        )
        .subcommand(
            Command::new("fetch")
                .about("Download and unpack a version into the install root")
                .arg(package_arg())
                .arg(designator_arg())
                .arg(
                    Arg::new("activate")
                        .long("activate")
                        .action(clap::ArgAction::SetTrue)
                        .help("Activate the version once fetched"),
                ),
        )
        .subcommand(
            Command::new("activate")
                .about("Make a fetched version the active one")
                .arg(package_arg())
                .arg(designator_arg()),
        )
        .subcommand(
            Command::new("deactivate")
                .about("Remove the active pointer of a package")
                .arg(package_arg())
                .arg(designator_arg()),
        )
        .subcommand(
            Command::new("start")
                .about("Run the start entry point of the active version")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("stop")
                .about("Run the stop entry point of the active version")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("purge")
                .about("Delete local versions that are not active")
                .arg(package_arg())
                .arg(
                    Arg::new("labels")
                        .num_args(0..)
                        .help("Only purge the versions these labels name"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Show local versions and the active one")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

/// Render the man page into `man/` at the crate root
fn write_man_page() -> Result<PathBuf, String> {
    let manifest_dir = env::var_os("CARGO_MANIFEST_DIR").ok_or("CARGO_MANIFEST_DIR not set")?;
    let man_path = PathBuf::from(manifest_dir).join("man").join("mspm.1");

    let mut page = Vec::new();
    Man::new(build_cli())
        .render(&mut page)
        .map_err(|e| format!("rendering man page: {}", e))?;

    if let Some(dir) = man_path.parent() {
        fs::create_dir_all(dir).map_err(|e| format!("creating {}: {}", dir.display(), e))?;
    }
    fs::write(&man_path, page).map_err(|e| format!("writing {}: {}", man_path.display(), e))?;
    Ok(man_path)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // a missing man page never fails the build
    if let Err(e) = write_man_page() {
        println!("cargo:warning=mspm man page not generated: {}", e);
    }
}
