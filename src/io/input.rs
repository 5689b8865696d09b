use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::SourceDocument;
use crate::rules::report::parse_report_date;
use crate::stages::ResourceTable;

/// Why a single document could not be turned into text
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported document type {mime} for {path:?}; OCR it to text first")]
    UnsupportedType { path: PathBuf, mime: String },

    #[error("{0:?} is not valid UTF-8 text")]
    NotUtf8(PathBuf),

    #[error("{0:?} contains no text")]
    Empty(PathBuf),

    #[error("Malformed document envelope {path:?}: {source}")]
    Envelope {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// OCR output saved as JSON alongside the upload's metadata
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentEnvelope {
    text: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    report_date: Option<String>,
}

/// MIME type implied by a file extension
pub fn detect_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "text" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Turn raw file bytes into a document, based on the detected MIME type
pub fn parse_document(path: &Path, bytes: Vec<u8>) -> Result<SourceDocument, InputError> {
    let mime = detect_mime(path);
    let source = path.display().to_string();

    let document = match mime {
        "text/plain" | "text/markdown" => {
            let text = String::from_utf8(bytes).map_err(|_| InputError::NotUtf8(path.into()))?;
            SourceDocument::new(source, text).with_mime_type(mime)
        }
        "application/json" => {
            let envelope: DocumentEnvelope =
                serde_json::from_slice(&bytes).map_err(|source| InputError::Envelope {
                    path: path.into(),
                    source,
                })?;
            let mut document = SourceDocument::new(source, envelope.text);
            if let Some(declared) = envelope.mime_type {
                document = document.with_mime_type(declared);
            }
            if let Some(raw) = envelope.report_date {
                match parse_report_date(&raw) {
                    Some(date) => document = document.with_report_date(date),
                    None => warn!("Ignoring unparseable report date {:?} in {:?}", raw, path),
                }
            }
            document
        }
        other => {
            return Err(InputError::UnsupportedType {
                path: path.into(),
                mime: other.to_string(),
            });
        }
    };

    if document.text.trim().is_empty() {
        return Err(InputError::Empty(path.into()));
    }
    Ok(document)
}

/// Load one document from disk
pub async fn load_document(path: &Path) -> Result<SourceDocument, InputError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| InputError::Read {
        path: path.into(),
        source,
    })?;
    parse_document(path, bytes)
}

/// Load every document, omitting the ones that fail
pub async fn load_documents(paths: &[PathBuf]) -> Vec<SourceDocument> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match load_document(path).await {
            Ok(document) => {
                debug!("Loaded {:?} ({} bytes of text)", path, document.text.len());
                documents.push(document);
            }
            Err(e) => warn!("Skipping document: {}", e),
        }
    }
    documents
}

/// Load a stage-to-resource table from a JSON object file
pub fn load_resource_table(path: &Path) -> Result<ResourceTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resource table: {:?}", path))?;
    serde_json::from_str(&content).context("Failed to parse resource table JSON")
}
