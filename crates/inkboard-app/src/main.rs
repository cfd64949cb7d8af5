//! Command-line entry point.

use clap::{Parser, Subcommand};
use inkboard_app::commands::{self, ExportFormat};
use inkboard_app::{AppError, AppResult};
use inkboard_core::{ElementId, EngineConfig, FileStore};
use inkboard_render::EXPORT_SCALE;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "inkboard")]
#[command(about = "Manage, export and script inkboard whiteboards")]
struct Cli {
    /// Document directory (defaults to the platform data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty board and print its id
    New { name: String },
    /// List stored boards
    List,
    /// Print a summary of a board
    Info { id: String },
    /// Export a board, or some of its elements, to PNG or SVG
    Export {
        id: String,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Output format (inferred from the output extension by default)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
        /// Export only these element ids
        #[arg(long = "select")]
        select: Vec<ElementId>,
        /// Pixels per world unit for PNG output
        #[arg(long, default_value_t = EXPORT_SCALE)]
        scale: f64,
    },
    /// Replay a JSON input script against a board and save the result
    Replay {
        id: String,
        script: PathBuf,
        /// Run the script without saving
        #[arg(long)]
        dry_run: bool,
        /// Engine configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match pollster::block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let store = Arc::new(match &cli.store {
        Some(path) => FileStore::new(path)?,
        None => FileStore::default_location()?,
    });
    log::debug!("using store at {}", store.base_path().display());

    match cli.command {
        Command::New { name } => {
            let document = commands::create_board(store.as_ref(), &name).await?;
            println!("{}", document.id);
        }
        Command::List => {
            for summary in commands::list_boards(store.as_ref()).await? {
                println!("{}\t{}\t{} elements", summary.id, summary.name, summary.element_count);
            }
        }
        Command::Info { id } => {
            println!("{}", commands::board_info(store, &id).await?);
        }
        Command::Export { id, output, format, select, scale } => {
            let format = match format.or_else(|| ExportFormat::from_path(&output)) {
                Some(format) => format,
                None => return Err(AppError::UnknownFormat(output)),
            };
            let selection = (!select.is_empty()).then_some(select.as_slice());
            let bytes = commands::export_board(store, &id, format, selection, scale).await?;
            std::fs::write(&output, &bytes).map_err(|source| AppError::Io { path: output.clone(), source })?;
            println!("wrote {} bytes to {}", bytes.len(), output.display());
        }
        Command::Replay { id, script, dry_run, config } => {
            let config = match &config {
                Some(path) => commands::load_config(path)?,
                None => EngineConfig::default(),
            };
            let steps = commands::load_script(&script)?;
            let outcome = commands::replay_board(store, &id, &steps, config, dry_run).await?;
            println!(
                "{} steps ({} ignored), {} elements, {}",
                outcome.report.steps,
                outcome.report.ignored,
                outcome.element_count,
                if outcome.saved { "saved" } else { "not saved" }
            );
            if outcome.report.save_requested {
                log::info!("script requested a save");
            }
        }
    }
    Ok(())
}
