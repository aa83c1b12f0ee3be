//! Document service
//!
//! Loads item documents (JSON array or TOML `[[items]]`) into an index and
//! renders item sequences back out.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{IndexedTree, Item};
use crate::infrastructure::traits::FileSystem;

/// On-disk document format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Top-level array of items
    #[default]
    Json,
    /// `[[items]]` tables
    Toml,
}

impl DocumentFormat {
    /// Format implied by the file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TomlDocument {
    #[serde(default)]
    items: Vec<Item>,
}

/// Service for reading and writing item documents.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
    default_format: DocumentFormat,
}

impl DocumentService {
    /// Create a new document service.
    ///
    /// `default_format` applies to files whose extension says nothing.
    pub fn new(fs: Arc<dyn FileSystem>, default_format: DocumentFormat) -> Self {
        Self { fs, default_format }
    }

    /// Explicit format wins, then the extension, then the configured default.
    pub fn format_for(&self, path: &Path, explicit: Option<DocumentFormat>) -> DocumentFormat {
        explicit
            .or_else(|| DocumentFormat::from_path(path))
            .unwrap_or(self.default_format)
    }

    /// Read `path` and build an index over its items.
    #[instrument(level = "debug", skip(self))]
    pub fn load(
        &self,
        path: &Path,
        explicit: Option<DocumentFormat>,
    ) -> ApplicationResult<IndexedTree<Item>> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("document not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }

        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        let format = self.format_for(path, explicit);
        let items = Self::parse(&content, format, path)?;
        debug!("load: {} items from {}", items.len(), path.display());

        Ok(IndexedTree::new(items))
    }

    /// Parse document text; `path` is only used in error messages.
    pub fn parse(content: &str, format: DocumentFormat, path: &Path) -> ApplicationResult<Vec<Item>> {
        let parse_err = |message: String| ApplicationError::Parse {
            path: path.to_path_buf(),
            message,
        };
        match format {
            DocumentFormat::Json => {
                serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))
            }
            DocumentFormat::Toml => toml::from_str::<TomlDocument>(content)
                .map(|doc| doc.items)
                .map_err(|e| parse_err(e.to_string())),
        }
    }

    /// Render items in `format`. `pretty` only affects JSON.
    pub fn render(items: &[Item], format: DocumentFormat, pretty: bool) -> ApplicationResult<String> {
        let render_err = |message: String| ApplicationError::Render { message };
        match format {
            DocumentFormat::Json if pretty => {
                serde_json::to_string_pretty(items).map_err(|e| render_err(e.to_string()))
            }
            DocumentFormat::Json => {
                serde_json::to_string(items).map_err(|e| render_err(e.to_string()))
            }
            DocumentFormat::Toml => {
                let doc = TomlDocument {
                    items: items.to_vec(),
                };
                toml::to_string_pretty(&doc).map_err(|e| render_err(e.to_string()))
            }
        }
    }
}
