//! Proposal document session: one composed page per screenshot

use crate::{LayoutConfig, PageComposer, Result};
use pdf_core::{ImageSource, PdfDocument, PdfError};
use serde::{Deserialize, Serialize};

/// Text shown next to a screenshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalComments {
    /// Screen and feature description
    #[serde(default)]
    pub content: Option<String>,
    /// Requested modifications
    #[serde(default)]
    pub modification_requirements: Option<String>,
}

impl ProposalComments {
    pub fn new(content: Option<String>, modification_requirements: Option<String>) -> Self {
        Self {
            content,
            modification_requirements,
        }
    }

    /// The description, or `placeholder` when there is none
    pub fn content_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.content.as_deref().unwrap_or(placeholder)
    }

    /// The modification requests, or `placeholder` when there are none
    pub fn modification_requirements_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.modification_requirements
            .as_deref()
            .unwrap_or(placeholder)
    }
}

/// One screenshot and its comments
pub struct ProposalPage {
    pub image: Box<dyn ImageSource>,
    pub comments: ProposalComments,
}

impl ProposalPage {
    pub fn new<S: ImageSource + 'static>(image: S, comments: ProposalComments) -> Self {
        Self {
            image: Box::new(image),
            comments,
        }
    }
}

/// TrueType font bytes and the name they are embedded under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSource {
    pub name: String,
    pub data: Vec<u8>,
}

/// Fonts for section headings and for everything else
#[derive(Debug, Clone)]
pub struct ProposalFonts {
    pub heading: FontSource,
    pub body: FontSource,
}

impl ProposalFonts {
    /// Use one font for headings and body text
    pub fn single(name: &str, data: Vec<u8>) -> Self {
        let font = FontSource {
            name: name.to_string(),
            data,
        };
        Self {
            heading: font.clone(),
            body: font,
        }
    }
}

/// A page whose screenshot could not be drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedImage {
    /// Page number (1-indexed)
    pub page: usize,
    pub file_name: Option<String>,
    pub reason: String,
}

/// Finished proposal document
#[derive(Debug)]
pub struct ProposalOutput {
    /// Serialized PDF
    pub bytes: Vec<u8>,
    /// Screenshots left out; their pages still carry header, footer and texts
    pub failed_images: Vec<FailedImage>,
}

/// Compose a proposal PDF with one page per entry in `pages`
///
/// Pages are portrait A4-sized pages displayed rotated by 90°, drawn in
/// landscape coordinates. An image that cannot be read or decoded is logged
/// and reported in [`ProposalOutput::failed_images`]; any other error aborts.
pub fn compose_proposal(
    config: &LayoutConfig,
    fonts: &ProposalFonts,
    pages: &[ProposalPage],
) -> Result<ProposalOutput> {
    let composer = PageComposer::new(config.clone())?;
    let mut doc = PdfDocument::new();

    let body_font = doc.add_font(&fonts.body.name, &fonts.body.data)?;
    let heading_font = if fonts.heading == fonts.body {
        body_font
    } else {
        doc.add_font(&fonts.heading.name, &fonts.heading.data)?
    };

    let section_width = config.section_width();
    let section_height = config.section_height();
    let mut failed_images = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        let page_number = index + 1;
        let page_index = doc.add_page(config.page_height, config.page_width)?;
        doc.set_page_rotation(page_index, 90)?;

        let mut canvas = doc.canvas(page_index)?;
        let failure = composer.with_rotated_frame(
            &mut canvas,
            config.page_height,
            |canvas| -> pdf_core::Result<Option<FailedImage>> {
                composer.add_header(canvas, body_font, page_number)?;
                composer.add_footer(canvas, body_font)?;
                composer.add_section_dividers(canvas)?;

                let failure = match composer.place_image(
                    canvas,
                    page.image.as_ref(),
                    section_width,
                    section_height,
                ) {
                    Ok(_) => None,
                    Err(err @ (PdfError::ImageError(_) | PdfError::IoError(_))) => {
                        let file_name = page.image.file_name().map(str::to_string);
                        log::warn!(
                            "page {page_number}: skipping image {}: {err}",
                            file_name.as_deref().unwrap_or("<unnamed>")
                        );
                        Some(FailedImage {
                            page: page_number,
                            file_name,
                            reason: err.to_string(),
                        })
                    }
                    Err(err) => return Err(err),
                };

                composer.add_text_to_sections(
                    canvas,
                    heading_font,
                    body_font,
                    section_width,
                    config.page_height,
                    &page.comments,
                )?;
                Ok(failure)
            },
        )?;
        canvas.close()?;

        failed_images.extend(failure);
    }

    let bytes = doc.to_bytes()?;
    log::debug!(
        "composed proposal: {} pages, {} bytes, {} failed images",
        pages.len(),
        bytes.len(),
        failed_images.len()
    );

    Ok(ProposalOutput {
        bytes,
        failed_images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_comments_placeholders() {
        let comments = ProposalComments::default();
        assert_eq!(comments.content_or("none"), "none");
        assert_eq!(comments.modification_requirements_or("nothing"), "nothing");

        let comments = ProposalComments::new(Some("login".to_string()), Some(String::new()));
        assert_eq!(comments.content_or("none"), "login");
        assert_eq!(comments.modification_requirements_or("nothing"), "");
    }

    #[test]
    fn test_comments_deserialize() {
        let comments: ProposalComments =
            serde_json::from_str(r#"{ "modificationRequirements": "bigger button" }"#).unwrap();
        assert_eq!(
            comments,
            ProposalComments::new(None, Some("bigger button".to_string()))
        );
    }

    #[test]
    fn test_single_font() {
        let fonts = ProposalFonts::single("Nanum", vec![1, 2, 3]);
        assert_eq!(fonts.heading, fonts.body);
        assert_eq!(fonts.body.name, "Nanum");
    }

    #[test]
    fn test_compose_rejects_bad_font() {
        let fonts = ProposalFonts::single("Broken", vec![0; 16]);
        let result = compose_proposal(&LayoutConfig::default(), &fonts, &[]);
        assert!(matches!(
            result,
            Err(crate::ComposeError::Pdf(PdfError::FontParseError(_)))
        ));
    }
}
