use crate::{
    backend::{Backend, BackendDiag, DummyBackend, WebDriverBackend},
    jobs::RunOutcome,
    runner::Runner,
    settings::Settings,
    util::{ensure_dir, find_in_path, now_rfc3339},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "site-snap")]
#[command(about = "Capture website screenshots and browser logs across viewport sizes")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config JSON. If omitted, uses ./site-snap.json if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Perform page captures from the configuration file with the requested
    /// interface(s).
    Capture {
        /// Interface engine(s) to perform browser tasks with. Repeatable.
        #[arg(long)]
        interface: Vec<InterfaceKind>,
        /// Override the configured output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Check each interface's driver availability.
    Doctor {
        #[arg(long)]
        interface: Vec<InterfaceKind>,
    },
    /// Print version information and discovered drivers.
    Version {},
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Dummy,
    Firefox,
    Chrome,
}

const DEFAULT_INTERFACE: InterfaceKind = InterfaceKind::Dummy;

pub fn dispatch(args: Args) -> Result<()> {
    match &args.cmd {
        Command::Version {} => version(),
        Command::Doctor { interface } => {
            let settings = load_settings(&args)?;
            let _guard = init_logging(&args, &settings)?;
            doctor(&settings, &selected_interfaces(interface))
        }
        Command::Capture {
            interface,
            output_dir,
        } => {
            let mut settings = load_settings(&args)?;
            if let Some(dir) = output_dir {
                settings.output_dir = dir.clone();
            }
            let _guard = init_logging(&args, &settings)?;
            capture(&settings, &selected_interfaces(interface))
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> PathBuf {
    if let Some(p) = user {
        return p.to_path_buf();
    }
    let default = PathBuf::from("site-snap.json");
    if default.exists() {
        default
    } else {
        PathBuf::from("site-snap.example.json")
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    let path = resolve_config_path(args.config.as_deref());
    Settings::load(&path).with_context(|| format!("loading configuration: {}", path.display()))
}

fn selected_interfaces(requested: &[InterfaceKind]) -> Vec<InterfaceKind> {
    if requested.is_empty() {
        warn!("no interface was chosen, using default 'dummy' interface");
        vec![DEFAULT_INTERFACE]
    } else {
        requested.to_vec()
    }
}

fn init_logging(args: &Args, settings: &Settings) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(settings.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).boxed();

    let (file_layer, guard) = if settings.logging.write_to_file {
        let path = if settings.logging.file_path.is_empty() {
            settings.output_dir.join("site-snap.log")
        } else {
            PathBuf::from(&settings.logging.file_path)
        };
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(&path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(false)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn capture(settings: &Settings, interfaces: &[InterfaceKind]) -> Result<()> {
    let started = now_rfc3339();
    let mut totals = RunOutcome::default();

    for kind in interfaces {
        let outcome = run_interface(settings, *kind)?;
        totals.extend(outcome);
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "started": started,
            "finished": now_rfc3339(),
            "built": totals.built,
            "error_logs": totals.error_logs,
        }))?
    );

    Ok(())
}

fn run_interface(settings: &Settings, kind: InterfaceKind) -> Result<RunOutcome> {
    let outcome = match kind {
        InterfaceKind::Dummy => {
            let runner = Runner::new(settings, DummyBackend::new(settings.headless));
            info!("running {} interface", runner.backend().label());
            runner.run(&settings.pages)?
        }
        InterfaceKind::Firefox => {
            let runner = Runner::new(settings, WebDriverBackend::firefox(settings));
            info!("running {} interface", runner.backend().label());
            runner.run(&settings.pages)?
        }
        InterfaceKind::Chrome => {
            let runner = Runner::new(settings, WebDriverBackend::chrome(settings));
            info!("running {} interface", runner.backend().label());
            runner.run(&settings.pages)?
        }
    };
    Ok(outcome)
}

fn doctor(settings: &Settings, interfaces: &[InterfaceKind]) -> Result<()> {
    let mut diags: Vec<BackendDiag> = Vec::new();
    for kind in interfaces {
        let diag = match kind {
            InterfaceKind::Dummy => DummyBackend::new(settings.headless).doctor()?,
            InterfaceKind::Firefox => WebDriverBackend::firefox(settings).doctor()?,
            InterfaceKind::Chrome => WebDriverBackend::chrome(settings).doctor()?,
        };
        diags.push(diag);
    }
    println!("{}", serde_json::to_string_pretty(&diags)?);
    Ok(())
}

fn version() -> Result<()> {
    println!("site-snap {}", env!("CARGO_PKG_VERSION"));
    for (family, binary) in [("firefox", "geckodriver"), ("chrome", "chromedriver")] {
        match find_in_path(binary) {
            Some(path) => println!("{family}: {binary} found at {}", path.display()),
            None => println!("{family}: {binary} not found on PATH"),
        }
    }
    Ok(())
}
