//! Convert Studio - headless entry point
//!
//! Lists the node catalog, checks pipeline documents and runs them with
//! simulated progress from the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use convert_studio::{
    config::{self, AppConfig, LoggingConfig},
    execution::{ExecutionEngine, ExecutionOrder, RunOutcome, StepResult},
    pipeline::PipelineEditor,
    registry::NodeRegistry,
    storage, StudioEvent,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the one in the app data directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available node kinds
    Specs {
        /// Only kinds whose name, description or tags match
        #[arg(short, long)]
        search: Option<String>,

        /// Only kinds with an input accepting this MIME type
        #[arg(short, long)]
        accepts: Option<String>,
    },

    /// Import a pipeline document and check it
    Validate { file: PathBuf },

    /// Import a pipeline document and execute it
    Run {
        file: PathBuf,

        /// Override the configured execution order
        #[arg(short, long, value_enum)]
        order: Option<OrderArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OrderArg {
    /// Node list order
    List,
    /// Topological order over connections
    Dependency,
}

impl From<OrderArg> for ExecutionOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::List => ExecutionOrder::List,
            OrderArg::Dependency => ExecutionOrder::Dependency,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(&config.logging)?;

    let registry = Arc::new(NodeRegistry::builtin());

    match cli.command {
        Command::Specs { search, accepts } => list_specs(&registry, search, accepts),
        Command::Validate { file } => validate(&file),
        Command::Run { file, order } => run(&config, registry, &file, order),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        return AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    Ok(match config::default_config_path() {
        Some(path) if path.exists() => AppConfig::load_or_default(path),
        _ => AppConfig::default(),
    })
}

fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match &logging.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path {} has no file name", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn list_specs(
    registry: &NodeRegistry,
    search: Option<String>,
    accepts: Option<String>,
) -> Result<()> {
    let mut specs = match &search {
        Some(term) => registry.search(term),
        None => registry.all().to_vec(),
    };
    if let Some(mime) = &accepts {
        let accepting = registry.accepting(mime);
        specs.retain(|spec| accepting.iter().any(|a| a.id == spec.id));
    }

    if specs.is_empty() {
        println!("No matching node kinds");
        return Ok(());
    }
    for spec in specs {
        println!(
            "{:<22} {:<10} {}",
            spec.id,
            spec.metadata.category.display_name(),
            spec.metadata.description
        );
    }
    Ok(())
}

fn read_pipeline(file: &Path) -> Result<convert_studio::Pipeline> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    storage::import_pipeline(&bytes).with_context(|| format!("Invalid pipeline {}", file.display()))
}

fn validate(file: &Path) -> Result<()> {
    let pipeline = read_pipeline(file)?;
    println!(
        "{}: '{}' is valid ({} nodes, {} connections)",
        file.display(),
        pipeline.name,
        pipeline.nodes.len(),
        pipeline.connections.len()
    );
    Ok(())
}

fn run(
    config: &AppConfig,
    registry: Arc<NodeRegistry>,
    file: &Path,
    order: Option<OrderArg>,
) -> Result<()> {
    let pipeline = read_pipeline(file)?;
    let mut editor = PipelineEditor::new(registry)
        .with_history_capacity(config.history.capacity)
        .with_parameter_policy(config.editor.parameter_policy);
    editor.load_pipeline(pipeline)?;

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let mut engine = ExecutionEngine::from_config(&config.execution).with_events(event_tx);
    if let Some(order) = order {
        engine = engine.with_order(order.into());
    }
    engine.execute(&mut editor)?;

    let tick = config.execution.tick_interval();
    let outcome = loop {
        let result = engine.step(&mut editor);
        for event in event_rx.try_iter() {
            print_event(&editor, &event);
        }
        match result {
            StepResult::Finished(outcome) => break outcome,
            StepResult::Idle => break RunOutcome::Cancelled,
            StepResult::Advanced => std::thread::sleep(tick),
        }
    };

    match outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Cancelled => anyhow::bail!("Run was cancelled"),
        RunOutcome::Failed { node_id, error } => {
            anyhow::bail!("Node {} failed: {}", node_id, error)
        }
    }
}

fn print_event(editor: &PipelineEditor, event: &StudioEvent) {
    let label = |id: &convert_studio::NodeId| {
        editor
            .pipeline()
            .node(id)
            .map(|n| format!("{} ({})", n.spec.name(), id))
            .unwrap_or_else(|| id.to_string())
    };
    match event {
        StudioEvent::ExecutionStarted { order } => println!("Running {} nodes", order.len()),
        StudioEvent::NodeProgress { node_id, progress } => {
            println!("  {:<48} {:>5.1}%", label(node_id), progress)
        }
        StudioEvent::NodeStatusChanged { node_id, status } => {
            println!("  {:<48} {}", label(node_id), status)
        }
        StudioEvent::NodeFailed { node_id, error } => {
            println!("  {:<48} error: {}", label(node_id), error)
        }
        StudioEvent::ExecutionFinished => println!("Done"),
        StudioEvent::ExecutionStopped => println!("Stopped"),
        _ => {}
    }
}
