use std::fs;
use std::io::{Seek, Write};
use std::path::Path;
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "assets_registrar_lambda";
const LAMBDA_BINARY: &str = "assets_registrar";
const DEFAULT_DIST_DIR: &str = "dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the catalog assets registrar workspace",
    long_about = "CI checks and Lambda packaging for the catalog assets registrar,\n\
                  which mirrors catalog asset metadata into a DynamoDB state store."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the unit and integration tests of both crates
    Test,
    /// Run CI checks
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the registrar binary and package it as a Lambda `bootstrap` zip
    LambdaPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory the zip is written to
        #[arg(long, env = "ASSETS_REGISTRAR_DIST_DIR", default_value = DEFAULT_DIST_DIR)]
        dist_dir: String,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Check plus a release build of the Lambda binary
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

/// Runs cargo in the workspace root and exits with its status on failure.
fn run_cargo(args: &[&str]) {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .unwrap_or_else(|error| fail(&format!("could not start cargo: {error}")));
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    exit(1);
}

fn package_lambda(target: &str, profile: BuildProfile, dist_dir: &Path) {
    if installed_targets().is_some_and(|installed| !target_listed(&installed, target)) {
        fail(&format!(
            "rust target `{target}` is not installed; run `rustup target add {target}`"
        ));
    }

    step("Build registrar lambda binary");
    let mut cargo_args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--bin",
        LAMBDA_BINARY,
        "--target",
        target,
    ];
    cargo_args.extend(profile.as_cargo_flag());
    run_cargo(&cargo_args);

    step("Package lambda zip artifact");
    let binary_path = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(LAMBDA_BINARY);
    let binary = fs::read(&binary_path).unwrap_or_else(|error| {
        fail(&format!(
            "could not read lambda binary at '{}': {error}",
            binary_path.display()
        ))
    });

    let zip_path = dist_dir.join(format!("{LAMBDA_BINARY}.zip"));
    let written = fs::create_dir_all(dist_dir)
        .and_then(|()| fs::File::create(&zip_path))
        .map_err(|error| error.to_string())
        .and_then(|file| write_bootstrap_zip(file, &binary));
    if let Err(error) = written {
        fail(&format!("could not write '{}': {error}", zip_path.display()));
    }

    eprintln!("\nPackaged {} ({} bytes)", zip_path.display(), binary.len());
}

/// Targets reported by rustup, or `None` when rustup is unavailable (the
/// cargo build then reports a missing target itself).
fn installed_targets() -> Option<String> {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

fn target_listed(installed: &str, target: &str) -> bool {
    installed.lines().any(|line| line.trim() == target)
}

/// The provided.al2023 runtime executes an archive entry named `bootstrap`.
fn write_bootstrap_zip<W: Write + Seek>(sink: W, binary: &[u8]) -> Result<(), String> {
    let mut zip = ZipWriter::new(sink);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .map_err(|error| error.to_string())?;
    zip.write_all(binary).map_err(|error| error.to_string())?;
    zip.finish().map_err(|error| error.to_string())?;
    Ok(())
}

// ── CI jobs ────────────────────────────────────────────────────────

fn run_tests() {
    step("Test assets_registrar_core");
    run_cargo(&["test", "-p", "assets_registrar_core"]);

    step("Test assets_registrar_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    run_tests();
}

fn ci_build() {
    step("Release build of the registrar binary");
    run_cargo(&["build", "-p", LAMBDA_PACKAGE, "--bin", LAMBDA_BINARY, "--release"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test => run_tests(),
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::All => {
                    ci_check();
                    ci_build();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::LambdaPackage {
            target,
            profile,
            dist_dir,
        } => {
            package_lambda(&target, profile, Path::new(&dist_dir));
        }
    }
}
