//! Branded document generation: paginated PDF reports, QR business cards and
//! formula-driven XLSX workbooks built from plain data objects.
//!
//! The PDF side flows a stream of [`model::Block`] values through the
//! [`layout::LayoutEngine`] and serialises the resulting pages with `printpdf`.
//! The workbook side threads a row cursor through [`workbook::Sheet`] so that
//! every formula references the rows it was built against.

pub mod assets;
pub mod builder;
pub mod canvas;
pub mod color;
pub mod config;
pub mod elements;
pub mod error;
pub mod filename;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod qr;
pub mod reports;
pub mod text;
pub mod workbook;

pub use error::{Error, Result};
