//! Crate-wide error type.

use thiserror::Error;

use crate::layout::LayoutError;
use crate::qr::CodeError;
use crate::workbook::WorkbookError;

/// Errors surfaced by a generation call.
///
/// Asset failures are deliberately absent: a missing image or font degrades to
/// a placeholder or the built-in font family instead of aborting the document.
#[derive(Debug, Error)]
pub enum Error {
    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("branded code rendering failed: {0}")]
    Code(#[from] CodeError),

    #[error("workbook generation failed: {0}")]
    Workbook(#[from] WorkbookError),

    #[error("PDF serialization failed: {0}")]
    Pdf(String),

    #[error("font could not be loaded: {0}")]
    Font(String),

    #[error("invalid configuration or input document: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
