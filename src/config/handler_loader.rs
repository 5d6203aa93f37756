//! Loads and validates handler configurations from `handlers.yaml` or a
//! `handlers.d/` directory.

use std::path::PathBuf;

use thiserror::Error;

use super::loader::{ConfigLoader, LoaderError};
use crate::{
    models::handler::{HandlerConfig, HandlerConfigError},
    notification::template::{TemplateService, TemplateServiceError},
};

/// Loads handler configurations from a file.
pub struct HandlerLoader {
    path: PathBuf,
}

/// Errors that can occur while loading handler configurations.
#[derive(Debug, Error)]
pub enum HandlerLoaderError {
    /// An error occurred during the loading process.
    #[error("Failed to load handler configuration: {0}")]
    Loader(#[from] LoaderError),

    /// A handler configuration is invalid.
    #[error("Invalid configuration for handler '{name}': {source}")]
    ValidationError {
        /// Handler name.
        name: String,
        /// What is wrong with it.
        #[source]
        source: HandlerConfigError,
    },

    /// The handler's `message` override does not parse or reads an unknown
    /// variable.
    #[error("Invalid message template for handler '{name}': {source}")]
    TemplateError {
        /// Handler name.
        name: String,
        /// Template error.
        #[source]
        source: TemplateServiceError,
    },

    /// Two handlers share a name.
    #[error("Duplicate handler name: {0}")]
    DuplicateName(String),
}

impl HandlerLoader {
    /// Creates a new `HandlerLoader` instance.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads and validates the handler configurations from the specified file.
    pub fn load(&self) -> Result<Vec<HandlerConfig>, HandlerLoaderError> {
        let loader = ConfigLoader::new(self.path.clone());
        let handlers: Vec<HandlerConfig> = loader.load("handlers")?;

        let templates = TemplateService::new();
        for (index, handler) in handlers.iter().enumerate() {
            handler.validate().map_err(|source| HandlerLoaderError::ValidationError {
                name: handler.name.clone(),
                source,
            })?;
            if let Some(message) = &handler.message {
                templates
                    .check(&message.title)
                    .and_then(|()| templates.check(&message.body))
                    .map_err(|source| HandlerLoaderError::TemplateError {
                        name: handler.name.clone(),
                        source,
                    })?;
            }
            if handlers[..index].iter().any(|other| other.name == handler.name) {
                return Err(HandlerLoaderError::DuplicateName(handler.name.clone()));
            }
        }

        tracing::debug!(path = %self.path.display(), count = handlers.len(), "Loaded handler configurations.");
        Ok(handlers)
    }

    /// Loads the handlers and returns the one with the given name, if any.
    pub fn find(&self, name: &str) -> Result<Option<HandlerConfig>, HandlerLoaderError> {
        Ok(self.load()?.into_iter().find(|handler| handler.name == name))
    }
}
