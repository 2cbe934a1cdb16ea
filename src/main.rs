use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use verpatch::config::{validate_config, Config, ConfigLoader, DEFAULT_CONFIG_FILE};
use verpatch::core::types::ErrorKind;
use verpatch::process::{launch_and_wait, open_process};
use verpatch::session::{PatchRequest, PatchSession};
use verpatch::supply::{resolve_versions, LegacyArgs, SystemRegistry, VersionSources};

#[derive(Parser)]
#[command(name = "verpatch", version)]
#[command(about = "Rewrite the version stamp of a running WeChat client")]
struct Args {
    /// Version the client currently reports, e.g. 3.9.6.33
    #[arg(short, long)]
    current: Option<String>,

    /// Version to report instead, e.g. 3.9.12.51
    #[arg(short, long)]
    target: Option<String>,

    /// Current version as an 8-digit raw hex value, e.g. 63090621
    #[arg(long, conflicts_with = "current")]
    default_hex: Option<String>,

    #[arg(long, env = "VERPATCH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the target process name
    #[arg(long)]
    process: Option<String>,

    /// Override the module path suffix
    #[arg(long)]
    module: Option<String>,

    /// Scan and validate, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Never start the client, only attach to a running one
    #[arg(long)]
    no_launch: bool,

    #[arg(short, long)]
    verbose: bool,

    /// Legacy c=<version> / t=<version> arguments
    #[arg(value_name = "c=VER|t=VER")]
    legacy: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::new(&args.config)
        .load_or_default()
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(process) = &args.process {
        config.target.process_name = process.clone();
    }
    if let Some(module) = &args.module {
        config.target.module_suffix = module.clone();
    }
    validate_config(&config)?;

    init_logging(&config, args.verbose);
    info!("verpatch v{}", verpatch::core::VERSION);

    let legacy = LegacyArgs::parse(&args.legacy)?;
    let sources = VersionSources {
        current: args.current.clone().or(legacy.current),
        default_hex: args.default_hex.clone(),
        target: args.target.clone().or(legacy.target),
        version_file: config.target.version_file.clone(),
    };
    let versions = resolve_versions(&sources, &SystemRegistry::new(config.registry.clone()))?;

    let process_name = &config.target.process_name;
    match &versions.install_path {
        Some(install_path) if config.launch.enabled && !args.no_launch => {
            launch_and_wait(
                &install_path.join(process_name),
                process_name,
                config.launch.launch_options(),
            )?;
        }
        _ => info!("not launching, attaching to a running {process_name}"),
    }

    let process = open_process(process_name)
        .with_context(|| format!("is {process_name} running?"))?;

    let request = PatchRequest {
        module_suffix: config.target.module_suffix.clone(),
        current: versions.current.clone(),
        target: versions.target.clone(),
        scan: config.scanner.scan_options(),
        verify_writes: true,
        dry_run: args.dry_run,
    };
    let report = PatchSession::new(process.as_ref(), request)
        .run()
        .map_err(|err| {
            let hint = failure_hint(err.kind());
            anyhow::Error::new(err).context(hint)
        })?;

    if args.dry_run {
        warn!("dry run, memory left untouched");
        println!(
            "would patch {} offset(s): {} -> {}",
            report.written, versions.current, versions.target
        );
    } else {
        println!(
            "patched {} offset(s): {} -> {}",
            report.written, versions.current, versions.target
        );
    }
    Ok(())
}

/// Operator-facing hint for a failed patch session
fn failure_hint(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ModuleNotFound => {
            "module not loaded yet; wait until the client has finished starting (or check --module)"
        }
        ErrorKind::OffsetsNotFound | ErrorKind::VersionMismatch | ErrorKind::MalformedVersion => {
            "check that the current version is correct"
        }
        ErrorKind::WriteProtected => "memory could not be written; try running elevated",
        ErrorKind::ProcessNotFound => "the client is no longer running",
        ErrorKind::UnreadableMemory => "target memory could not be read",
        ErrorKind::Other => "patching failed",
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    // RUST_LOG takes precedence over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!("verpatch={level}")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
