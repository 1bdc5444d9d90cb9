//! PDF Core - Low-level PDF page composition
//!
//! This crate provides functionality for:
//! - Creating new PDF documents or opening existing ones
//! - Embedding TrueType fonts
//! - Embedding images (JPEG, PNG) from files or uploaded bytes
//! - Drawing text, lines and images through a scoped page canvas
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Color, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! let font = doc.add_font("nanum", &std::fs::read("fonts/NanumGothic.ttf")?)?;
//! let page = doc.add_page(595.28, 841.89)?;
//!
//! let mut canvas = doc.canvas(page)?;
//! canvas.begin_text()?;
//! canvas.set_font(font, 12.0)?;
//! canvas.new_line_at_offset(100.0, 700.0)?;
//! canvas.set_fill_color(Color::BLACK)?;
//! canvas.show_text("Hello, World!")?;
//! canvas.end_text()?;
//! canvas.close()?;
//!
//! doc.save("output.pdf")?;
//! ```

mod canvas;
mod document;
mod font;
mod image;
mod text;

pub use canvas::{Matrix, PageCanvas};
pub use document::{Color, PdfDocument};
pub use font::{FontData, FontRef};
pub use image::{FileImage, ImageRef, ImageSource, ImageXObject, UploadedImage};
pub use text::{normalize_line_breaks, split_lines};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Font subset error: {0}")]
    FontSubsetError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("{0} belongs to a different document")]
    ForeignResource(&'static str),

    #[error("Invalid canvas operation: {0}")]
    InvalidOperation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
