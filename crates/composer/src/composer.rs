//! Drawing operations for proposal pages

use crate::layout::ImagePlacement;
use crate::{LayoutConfig, ProposalComments, Result};
use pdf_core::{split_lines, Color, FontRef, ImageRef, ImageSource, Matrix, PageCanvas, PdfError};

/// Leading as a multiple of the font size
const LINE_SPACING: f32 = 1.2;

const HEADER_FONT_SIZE: f32 = 12.0;
const FOOTER_FONT_SIZE: f32 = 15.0;
const HEADING_FONT_SIZE: f32 = 14.0;
const BODY_FONT_SIZE: f32 = 12.0;

/// Section boundaries computed for a page
#[derive(Debug, Clone, PartialEq)]
pub struct SectionGeometry {
    pub section_width: f32,
    pub section_height: f32,
    /// X coordinates between adjacent sections
    pub boundaries: Vec<f32>,
}

/// Lays out proposal page elements onto a canvas
///
/// The composer holds only its configuration. Every operation draws onto the
/// canvas it is given and keeps nothing afterwards.
#[derive(Debug, Clone)]
pub struct PageComposer {
    config: LayoutConfig,
}

impl PageComposer {
    /// Create a composer, validating the configuration
    pub fn new(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Draw a possibly multi-line text block with its first baseline at `(x, y)`
    ///
    /// `\r\n` and `\r` count as line breaks. Lines are spaced 1.2 × `font_size`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &self,
        canvas: &mut PageCanvas<'_>,
        font: FontRef,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        color: Color,
    ) -> pdf_core::Result<()> {
        canvas.begin_text()?;
        canvas.set_font(font, font_size)?;
        canvas.set_leading(font_size * LINE_SPACING)?;
        canvas.new_line_at_offset(x, y)?;
        canvas.set_fill_color(color)?;

        for line in split_lines(text) {
            canvas.show_text(&line)?;
            canvas.new_line()?;
        }

        canvas.end_text()
    }

    /// Stroke a straight line with the configured width
    pub fn draw_line(
        &self,
        canvas: &mut PageCanvas<'_>,
        color: Color,
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
    ) -> pdf_core::Result<()> {
        canvas.set_stroke_color(color)?;
        canvas.set_line_width(self.config.line_width)?;
        canvas.move_to(start_x, start_y)?;
        canvas.line_to(end_x, end_y)?;
        canvas.stroke()
    }

    /// Switch to landscape coordinates on a portrait page rotated by 90°
    ///
    /// Saves the graphics state, translates by `(page_height, 0)` and rotates
    /// by 90°. Must be paired with [`PageComposer::restore_coordinate_system`].
    pub fn reset_coordinate_system(
        &self,
        canvas: &mut PageCanvas<'_>,
        page_height: f32,
    ) -> pdf_core::Result<()> {
        canvas.save_state()?;
        canvas.transform(Matrix::translate(page_height, 0.0))?;
        canvas.transform(Matrix::rotate_degrees(90.0))
    }

    pub fn restore_coordinate_system(&self, canvas: &mut PageCanvas<'_>) -> pdf_core::Result<()> {
        canvas.restore_state()
    }

    /// Run `draw` in landscape coordinates, restoring the frame afterwards
    ///
    /// The frame is restored whether `draw` succeeds or not; an error from
    /// `draw` takes precedence over one from the restore.
    pub fn with_rotated_frame<'doc, T, E, F>(
        &self,
        canvas: &mut PageCanvas<'doc>,
        page_height: f32,
        draw: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut PageCanvas<'doc>) -> std::result::Result<T, E>,
        E: From<PdfError>,
    {
        self.reset_coordinate_system(canvas, page_height)?;
        let drawn = draw(canvas);
        let restored = self.restore_coordinate_system(canvas);

        let value = drawn?;
        restored?;
        Ok(value)
    }

    /// Title, page label and the divider under the header
    pub fn add_header(
        &self,
        canvas: &mut PageCanvas<'_>,
        font: FontRef,
        page_number: usize,
    ) -> pdf_core::Result<()> {
        let LayoutConfig {
            page_width,
            page_height,
            header_height,
            ref labels,
            ..
        } = self.config;

        self.draw_text(
            canvas,
            font,
            &labels.title,
            20.0,
            page_height - 20.0,
            HEADER_FONT_SIZE,
            Color::BLACK,
        )?;
        self.draw_text(
            canvas,
            font,
            &format!("{}{}", labels.page_prefix, page_number),
            page_width - 100.0,
            page_height - 30.0,
            HEADER_FONT_SIZE,
            Color::BLACK,
        )?;

        let y = page_height - header_height;
        self.draw_line(canvas, Color::GRAY, 0.0, y, page_width, y)
    }

    /// Copyright label and the divider above the footer
    pub fn add_footer(&self, canvas: &mut PageCanvas<'_>, font: FontRef) -> pdf_core::Result<()> {
        let config = &self.config;

        self.draw_text(
            canvas,
            font,
            &config.labels.copyright,
            config.page_width - 350.0,
            config.vertical_margin + 20.0,
            FOOTER_FONT_SIZE,
            Color::LIGHT_GRAY,
        )?;

        let y = config.footer_height;
        self.draw_line(canvas, Color::GRAY, 0.0, y, config.page_width, y)
    }

    /// Compute section geometry, drawing dividers when enabled
    pub fn add_section_dividers(
        &self,
        canvas: &mut PageCanvas<'_>,
    ) -> pdf_core::Result<SectionGeometry> {
        let config = &self.config;
        let section_width = config.section_width();
        let geometry = SectionGeometry {
            section_width,
            section_height: config.section_height(),
            boundaries: (1..config.section_count)
                .map(|i| i as f32 * section_width)
                .collect(),
        };

        if config.draw_section_dividers {
            let bottom = config.footer_height;
            let top = config.page_height - config.header_height;
            for &x in &geometry.boundaries {
                self.draw_line(canvas, Color::DARK_GRAY, x, bottom, x, top)?;
            }
        }

        Ok(geometry)
    }

    /// Decode an image into the canvas's document and draw it fitted into a section
    pub fn place_image<S: ImageSource + ?Sized>(
        &self,
        canvas: &mut PageCanvas<'_>,
        source: &S,
        section_width: f32,
        section_height: f32,
    ) -> pdf_core::Result<ImagePlacement> {
        let image = canvas.load_image(source)?;
        self.draw_fitted_image(canvas, image, section_width, section_height)
    }

    /// Draw an already decoded image fitted and centered in a section
    pub fn draw_fitted_image(
        &self,
        canvas: &mut PageCanvas<'_>,
        image: ImageRef,
        section_width: f32,
        section_height: f32,
    ) -> pdf_core::Result<ImagePlacement> {
        let placement =
            self.config
                .image_placement(image.width, image.height, section_width, section_height);
        log::debug!(
            "placing {}x{} image at ({}, {}) as {}x{}",
            image.width,
            image.height,
            placement.x,
            placement.y,
            placement.width,
            placement.height
        );

        canvas.draw_image(
            image,
            placement.x,
            placement.y,
            placement.width,
            placement.height,
        )?;
        Ok(placement)
    }

    /// Description in the center section, modification requests in the right one
    pub fn add_text_to_sections(
        &self,
        canvas: &mut PageCanvas<'_>,
        heading_font: FontRef,
        body_font: FontRef,
        section_width: f32,
        page_height: f32,
        comments: &ProposalComments,
    ) -> pdf_core::Result<()> {
        let labels = &self.config.labels;
        let columns = [
            (
                section_width + 20.0,
                &labels.description_heading,
                comments.content_or(&labels.no_description),
            ),
            (
                2.0 * section_width + 20.0,
                &labels.modification_heading,
                comments.modification_requirements_or(&labels.no_modification),
            ),
        ];

        for (x, heading, body) in columns {
            self.draw_text(
                canvas,
                heading_font,
                heading,
                x,
                page_height - 60.0,
                HEADING_FONT_SIZE,
                Color::BLACK,
            )?;
            self.draw_text(
                canvas,
                body_font,
                body,
                x,
                page_height - 80.0,
                BODY_FONT_SIZE,
                Color::BLACK,
            )?;
        }

        Ok(())
    }
}
