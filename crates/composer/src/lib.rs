//! Composer - proposal page layout on top of pdf-core
//!
//! This crate provides:
//! - Layout configuration (page geometry, margins, labels) loaded from JSON
//! - Stateless drawing operations: text blocks, lines, header/footer,
//!   section dividers, fitted images, section texts
//! - The proposal session: one landscape page per screenshot, serialized once
//!
//! # Example
//!
//! ```ignore
//! use composer::{compose_proposal, LayoutConfig, ProposalComments, ProposalFonts, ProposalPage};
//! use pdf_core::FileImage;
//!
//! let fonts = ProposalFonts::single("NanumGothic", std::fs::read("NanumGothic.ttf")?);
//! let pages = vec![ProposalPage::new(
//!     FileImage::new("screen.png"),
//!     ProposalComments::new(Some("Login screen".into()), None),
//! )];
//! let output = compose_proposal(&LayoutConfig::default(), &fonts, &pages)?;
//! std::fs::write("proposal.pdf", output.bytes)?;
//! ```

mod composer;
mod config;
pub mod layout;
mod proposal;

pub use composer::{PageComposer, SectionGeometry};
pub use config::{Labels, LayoutConfig};
pub use layout::ImagePlacement;
pub use proposal::{
    compose_proposal, FailedImage, FontSource, ProposalComments, ProposalFonts, ProposalOutput,
    ProposalPage,
};

use thiserror::Error;

/// Errors that can occur during composition
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid layout config: {0}")]
    InvalidConfig(String),
}

/// Result type for composer operations
pub type Result<T> = std::result::Result<T, ComposeError>;
