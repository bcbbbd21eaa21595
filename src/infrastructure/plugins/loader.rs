//! Plugin loader - Reads unit manifests from a directory

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::handlers::HandlerTable;
use super::manifest::{self, Manifest};
use crate::application::errors::LoadError;
use crate::domain::entities::{Unit, UnitKind};

/// Allow-listed plugin file names
pub const PLUGIN_FILE_PATTERN: &str = r"^[\w\s]+\.(ya?ml)$";

static PLUGIN_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PLUGIN_FILE_PATTERN).expect("plugin file pattern is valid"));

/// A unit read from a plugin file
#[derive(Debug, Clone)]
pub struct LoadedUnit {
    pub file_name: String,
    pub unit: Unit,
}

/// Turns a directory of manifests into validated units
pub struct UnitLoader {
    handlers: Arc<HandlerTable>,
    suppress_warnings: bool,
}

impl UnitLoader {
    pub fn new(handlers: Arc<HandlerTable>, suppress_warnings: bool) -> Self {
        Self {
            handlers,
            suppress_warnings,
        }
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    fn warn(&self, message: impl AsRef<str>) {
        if !self.suppress_warnings {
            tracing::warn!("{}", message.as_ref());
        }
    }

    /// Load every unit of `kind` in `dir`, in file-name order.
    ///
    /// Only a failure to read the directory itself is returned; problems with
    /// single files are logged and the file is skipped.
    pub async fn load_dir(&self, dir: &Path, kind: UnitKind) -> Result<Vec<LoadedUnit>, LoadError> {
        let dir = normalize_dir(dir);
        let files = self.candidate_files(&dir, kind).await?;

        tracing::info!("Reading {}s...", kind);

        let mut units = Vec::with_capacity(files.len());
        for file_name in files {
            match self.load_file(&dir, &file_name, kind).await {
                Ok(Some(unit)) => units.push(LoadedUnit { file_name, unit }),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Failed to load {} '{}'!", kind, file_name);
                    tracing::error!("{}", e);
                }
            }
        }

        Ok(units)
    }

    /// Regular files matching the allow-list, sorted by name
    async fn candidate_files(&self, dir: &Path, kind: UnitKind) -> Result<Vec<String>, LoadError> {
        let read_dir_err = |source| LoadError::ReadDir {
            dir: dir.to_path_buf(),
            source,
        };
        let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_err)?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
            let Ok(name) = entry.file_name().into_string() else {
                self.warn(format!("'{}' has a non UTF-8 name.", entry.path().display()));
                continue;
            };

            let is_file = match entry.file_type().await {
                Ok(file_type) => file_type.is_file(),
                Err(e) => {
                    tracing::warn!("Failed to read file type of '{}': {}", name, e);
                    continue;
                }
            };
            if !is_file {
                self.warn(format!("'{}' is not a file.", name));
                continue;
            }

            if self.is_valid_file_name(&name, kind) {
                files.push(name);
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn is_valid_file_name(&self, file_name: &str, kind: UnitKind) -> bool {
        if PLUGIN_FILE.is_match(file_name) {
            return true;
        }
        self.warn(format!("'{}' is not a valid manifest file for {}.", file_name, kind));
        false
    }

    async fn load_file(
        &self,
        dir: &Path,
        file_name: &str,
        kind: UnitKind,
    ) -> Result<Option<Unit>, LoadError> {
        let text = tokio::fs::read_to_string(dir.join(file_name))
            .await
            .map_err(|source| LoadError::Read {
                file: file_name.to_string(),
                source,
            })?;

        match manifest::parse(file_name, &text, kind, &self.handlers)? {
            Manifest::Unit(unit) => Ok(Some(unit)),
            Manifest::Empty => {
                self.warn(format!("'{}' does not describe a unit.", file_name));
                Ok(None)
            }
            Manifest::OtherKind(found) => {
                self.warn(format!(
                    "'{}' does not describe a {} (found {}).",
                    file_name,
                    kind,
                    found.as_deref().unwrap_or("no kind")
                ));
                Ok(None)
            }
        }
    }
}

fn normalize_dir(dir: &Path) -> PathBuf {
    if dir.is_absolute() || dir.starts_with(".") {
        dir.to_path_buf()
    } else {
        Path::new(".").join(dir)
    }
}
