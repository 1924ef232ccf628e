use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cyberveli::configuration::config::Config;
use cyberveli::controller::Controller;
use cyberveli::error_handling::types::ControllerError;
use cyberveli::report::{format_size, status_label};
use log::{error, info};

#[derive(Parser)]
#[command(name = "cyberveli")]
#[command(version)]
#[command(about = "File analysis with a persistent, shared history")]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true, env = "CYBERVELI_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the history file
    #[arg(long, global = true)]
    storage_path: Option<PathBuf>,

    /// Classifier endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a file, submit it for analysis and print the report
    Analyze { file: PathBuf },
    /// List stored records, most recent first
    History,
    /// Print the report of one record
    Show { id: String },
    /// Rebuild the original file of a record without re-analyzing it
    Restore {
        id: String,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Delete one record
    Remove { id: String },
    /// Delete every record
    Clear,
    /// Run the local dashboard API
    Serve,
}

fn load_config(args: &Args) -> Result<Config, ControllerError> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    Ok(config.with_overrides(args.storage_path.clone(), args.endpoint.clone())?)
}

fn print_history(controller: &Controller) {
    let records = controller.history();
    if records.is_empty() {
        println!("No files analyzed yet");
        return;
    }
    for record in records {
        println!(
            "{}  {}  {:>12}  {}  {}",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            format_size(record.file_size_bytes),
            status_label(record.status),
            record.file_name
        );
    }
}

async fn run(args: Args) -> Result<(), ControllerError> {
    info!("Importing configuration");
    let config = load_config(&args)?;
    let controller = Controller::new(config)?;

    match args.command {
        Some(Command::Analyze { file }) => {
            let record = controller.analyze(&file).await?;
            print!("{}", cyberveli::render_report(&record));
        }
        Some(Command::History) => print_history(&controller),
        Some(Command::Show { id }) => print!("{}", controller.show(&id)?),
        Some(Command::Restore { id, output }) => {
            let written = controller.restore(&id, &output)?;
            println!("{}", written.display());
        }
        Some(Command::Remove { id }) => {
            if !controller.remove(&id)? {
                info!("No record with id {}", id);
            }
        }
        Some(Command::Clear) => controller.clear()?,
        Some(Command::Serve) => controller.serve().await?,
        None if controller.config.web.enabled => controller.serve().await?,
        None => print_history(&controller),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
