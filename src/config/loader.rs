//! Reads lists of configuration items from YAML or JSON sources.
//!
//! A source is either a single file or a `conf.d`-style directory. In the
//! directory case every `.yaml`, `.yml` and `.json` file is read in file name
//! order and the lists found under the requested key are concatenated, so a
//! configuration management tool can render one file per handler.

use std::{
    fs,
    path::{Path, PathBuf},
};

use config::{Config, File, FileFormat};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Reads configuration lists from a file or a directory of files.
pub struct ConfigLoader {
    path: PathBuf,
}

/// Errors raised while reading a configuration source.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The source could not be read.
    #[error("Failed to read {path}: {source}")]
    IoError {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid for its format, or lacks the key.
    #[error("Failed to parse {path}: {source}")]
    ParseError {
        /// File being parsed.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: config::ConfigError,
    },

    /// The file extension is not `.yaml`, `.yml` or `.json`.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),
}

impl ConfigLoader {
    /// Creates a loader for a file or directory at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns every item listed under `key`.
    ///
    /// For a single file the key must be present. Files inside a directory
    /// may omit it, which lets unrelated fragments share the directory.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, LoaderError> {
        if !self.path.is_dir() {
            return read_list(&self.path, key);
        }

        let mut items = Vec::new();
        for path in self.fragments()? {
            match read_list(&path, key) {
                Ok(found) => items.extend(found),
                Err(LoaderError::ParseError { source: config::ConfigError::NotFound(_), .. }) => {
                    tracing::debug!(path = %path.display(), key, "Fragment has no matching key.");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(items)
    }

    /// Lists the supported files of a directory source, sorted by name.
    fn fragments(&self) -> Result<Vec<PathBuf>, LoaderError> {
        let io_error = |source| LoaderError::IoError { path: self.path.clone(), source };

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && file_format(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn read_list<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Vec<T>, LoaderError> {
    let format = file_format(path).ok_or_else(|| LoaderError::UnsupportedFormat(path.to_path_buf()))?;
    let contents = fs::read_to_string(path)
        .map_err(|source| LoaderError::IoError { path: path.to_path_buf(), source })?;
    let parse_error = |source| LoaderError::ParseError { path: path.to_path_buf(), source };

    Config::builder()
        .add_source(File::from_str(&contents, format))
        .build()
        .and_then(|config| config.get(key))
        .map_err(parse_error)
}

/// Puppet renders JSON, humans tend to write YAML.
fn file_format(path: &Path) -> Option<FileFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => Some(FileFormat::Yaml),
        Some("json") => Some(FileFormat::Json),
        _ => None,
    }
}
