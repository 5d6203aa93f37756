//! The `handle` subcommand.

use clap::Parser;
use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::{
    config::{AppConfig, HandlerLoader, HandlerLoaderError},
    handler::{EventHandler, HandleOutcome, HandlerError},
    http_client::HttpClientPool,
};

/// Errors that end a `handle` run.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the event from stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// `app.yaml` or the environment is invalid.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    /// The handlers file could not be loaded.
    #[error("Handler loading error: {0}")]
    HandlerLoading(#[from] HandlerLoaderError),
    /// No handler has the requested name.
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),
    /// The handler failed to build or to run.
    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Arguments of `sensu-handlers handle`.
#[derive(Parser, Debug)]
pub struct HandleArgs {
    /// Name of the handler in the handlers file.
    #[arg(long)]
    handler: String,
    /// Directory holding `app.yaml` and `handlers.yaml`.
    #[arg(short, long)]
    config_dir: Option<String>,
}

impl HandleArgs {
    /// Arguments for running `handler` from `config_dir`.
    pub fn new(handler: impl Into<String>, config_dir: Option<String>) -> Self {
        Self { handler: handler.into(), config_dir }
    }
}

/// Loads the named handler and runs `payload` through it.
pub async fn run(args: &HandleArgs, payload: &str) -> Result<HandleOutcome, Error> {
    let config = AppConfig::new(args.config_dir.as_deref())?;
    tracing::debug!(path = %config.handler_config_path.display(), "Configuration loaded.");

    let handler_config = HandlerLoader::new(config.handler_config_path.clone())
        .find(&args.handler)?
        .ok_or_else(|| Error::UnknownHandler(args.handler.clone()))?;

    let client_pool = HttpClientPool::new(config.http_base_config.clone());
    let handler = EventHandler::from_config(handler_config, &config, &client_pool).await?;

    Ok(handler.handle_payload(payload).await?)
}

/// Reads an event from stdin, handles it and prints the outcome.
pub async fn execute(args: HandleArgs) -> Result<(), Error> {
    let mut payload = String::new();
    tokio::io::stdin().read_to_string(&mut payload).await?;

    let outcome = run(&args, &payload).await?;
    println!("{}: {}", args.handler, outcome);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const HANDLERS: &str = r#"
handlers:
  - name: "console"
    stdout: {}
    teams:
      ops:
        channel: "ops-room"
"#;

    const EVENT: &str = r#"{
        "client": {"name": "web1"},
        "check": {"name": "load", "status": 2, "team": "ops", "interval": 60},
        "occurrences": 1
    }"#;

    fn config_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("handlers.yaml"), HANDLERS).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_run_dispatches_through_named_handler() {
        let dir = config_dir();
        let args = HandleArgs::new("console", Some(dir.path().to_string_lossy().into_owned()));

        let outcome = run(&args, EVENT).await.unwrap();
        let HandleOutcome::Dispatched(report) = outcome else {
            panic!("expected dispatch, got {outcome:?}");
        };
        assert_eq!(report.delivered, vec!["ops-room"]);
    }

    #[tokio::test]
    async fn test_run_unknown_handler() {
        let dir = config_dir();
        let args = HandleArgs::new("missing", Some(dir.path().to_string_lossy().into_owned()));

        let err = run(&args, EVENT).await.unwrap_err();
        assert!(matches!(err, Error::UnknownHandler(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_run_missing_handlers_file() {
        let dir = TempDir::new().unwrap();
        let args = HandleArgs::new("console", Some(dir.path().to_string_lossy().into_owned()));

        let err = run(&args, EVENT).await.unwrap_err();
        assert!(matches!(err, Error::HandlerLoading(_)));
    }
}
