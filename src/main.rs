use clap::{Parser, Subcommand};
use sensu_handlers::cmd::{FilterArgs, HandleArgs, filter, handle};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decides whether the event on stdin should be handled. Exits 0 to
    /// handle it, 1 to drop it.
    Filter(FilterArgs),
    /// Delivers the event on stdin through a configured handler.
    Handle(HandleArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the status line Sensu records.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Filter(args) =>
            if !filter::execute(args).await? {
                std::process::exit(1);
            },
        Commands::Handle(args) => {
            // A broken handler must not fail the Sensu pipeline.
            if let Err(e) = handle::execute(args).await {
                tracing::error!(error = %e, "Event was not handled.");
                println!("not handled: {e}");
            }
        }
    }

    Ok(())
}
