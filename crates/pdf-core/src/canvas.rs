//! Page canvas: a scoped content stream bound to one page

use crate::document::Color;
use crate::{FontRef, ImageRef, ImageSource, PdfDocument, PdfError, Result};

/// Affine transformation matrix `[a b c d e f]` in PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Translation by `(tx, ty)`
    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// Counter-clockwise rotation about the origin
    ///
    /// Quarter turns are exact so that rotated layouts keep integral coordinates.
    pub fn rotate_degrees(degrees: f32) -> Self {
        let (sin, cos) = match degrees.rem_euclid(360.0) {
            d if d == 0.0 => (0.0, 1.0),
            d if d == 90.0 => (1.0, 0.0),
            d if d == 180.0 => (0.0, -1.0),
            d if d == 270.0 => (-1.0, 0.0),
            d => d.to_radians().sin_cos(),
        };

        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self × other`: apply `self` first, then `other`
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Map a point through the matrix
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Format a number for a content stream: at most four decimals, no trailing zeros
pub(crate) fn num(value: f32) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn color_components(color: Color) -> String {
    let (r, g, b) = color.components();
    format!("{} {} {}", num(r), num(g), num(b))
}

/// Drawing surface for one page of one document
///
/// Operators are buffered and handed to the document exactly once, either by
/// [`PageCanvas::close`] or when the canvas is dropped. Dropping a canvas with
/// an open text block or unrestored graphics states closes them first so the
/// page content stays well formed.
pub struct PageCanvas<'a> {
    doc: &'a mut PdfDocument,
    page: usize,
    ops: Vec<u8>,
    ctm: Matrix,
    state_stack: Vec<Matrix>,
    in_text: bool,
    font: Option<FontRef>,
    flushed: bool,
}

impl<'a> PageCanvas<'a> {
    pub(crate) fn new(doc: &'a mut PdfDocument, page: usize) -> Self {
        Self {
            doc,
            page,
            ops: Vec::new(),
            ctm: Matrix::IDENTITY,
            state_stack: Vec::new(),
            in_text: false,
            font: None,
            flushed: false,
        }
    }

    /// Page number (1-indexed)
    pub fn page(&self) -> usize {
        self.page
    }

    /// Current transformation matrix relative to the page
    pub fn current_transform(&self) -> Matrix {
        self.ctm
    }

    /// Number of graphics states saved and not yet restored
    pub fn state_depth(&self) -> usize {
        self.state_stack.len()
    }

    /// Operators written so far and not yet flushed
    pub fn pending_operators(&self) -> &[u8] {
        &self.ops
    }

    /// Decode an image into the canvas's document
    pub fn load_image<S: ImageSource + ?Sized>(&mut self, source: &S) -> Result<ImageRef> {
        self.doc.load_image(source)
    }

    fn push(&mut self, line: String) {
        self.ops.extend_from_slice(line.as_bytes());
        self.ops.push(b'\n');
    }

    fn require_text(&self, operator: &str) -> Result<()> {
        if self.in_text {
            Ok(())
        } else {
            Err(PdfError::InvalidOperation(format!(
                "{operator} outside of a text block"
            )))
        }
    }

    fn require_no_text(&self, operator: &str) -> Result<()> {
        if self.in_text {
            Err(PdfError::InvalidOperation(format!(
                "{operator} inside a text block"
            )))
        } else {
            Ok(())
        }
    }

    fn require_finite(operator: &str, operands: &[f32]) -> Result<()> {
        match operands.iter().find(|value| !value.is_finite()) {
            Some(value) => Err(PdfError::InvalidOperation(format!(
                "{operator} operand must be finite, got {value}"
            ))),
            None => Ok(()),
        }
    }

    /// Save the graphics state (`q`)
    pub fn save_state(&mut self) -> Result<()> {
        self.require_no_text("q")?;
        self.state_stack.push(self.ctm);
        self.push("q".to_string());
        Ok(())
    }

    /// Restore the most recently saved graphics state (`Q`)
    pub fn restore_state(&mut self) -> Result<()> {
        self.require_no_text("Q")?;
        let ctm = self.state_stack.pop().ok_or_else(|| {
            PdfError::InvalidOperation("Q without a matching q".to_string())
        })?;
        self.ctm = ctm;
        self.push("Q".to_string());
        Ok(())
    }

    /// Concatenate a matrix to the current transformation (`cm`)
    pub fn transform(&mut self, matrix: Matrix) -> Result<()> {
        self.require_no_text("cm")?;
        Self::require_finite(
            "cm",
            &[matrix.a, matrix.b, matrix.c, matrix.d, matrix.e, matrix.f],
        )?;
        self.ctm = matrix.then(&self.ctm);
        self.push(format!(
            "{} {} {} {} {} {} cm",
            num(matrix.a),
            num(matrix.b),
            num(matrix.c),
            num(matrix.d),
            num(matrix.e),
            num(matrix.f)
        ));
        Ok(())
    }

    /// Set the stroking color (`RG`)
    pub fn set_stroke_color(&mut self, color: Color) -> Result<()> {
        self.push(format!("{} RG", color_components(color)));
        Ok(())
    }

    /// Set the non-stroking (fill and text) color (`rg`)
    pub fn set_fill_color(&mut self, color: Color) -> Result<()> {
        self.push(format!("{} rg", color_components(color)));
        Ok(())
    }

    /// Set the stroke line width (`w`)
    pub fn set_line_width(&mut self, width: f32) -> Result<()> {
        self.require_no_text("w")?;
        Self::require_finite("w", &[width])?;
        self.push(format!("{} w", num(width)));
        Ok(())
    }

    /// Begin a new subpath (`m`)
    pub fn move_to(&mut self, x: f32, y: f32) -> Result<()> {
        self.require_no_text("m")?;
        Self::require_finite("m", &[x, y])?;
        self.push(format!("{} {} m", num(x), num(y)));
        Ok(())
    }

    /// Append a straight segment to the current subpath (`l`)
    pub fn line_to(&mut self, x: f32, y: f32) -> Result<()> {
        self.require_no_text("l")?;
        Self::require_finite("l", &[x, y])?;
        self.push(format!("{} {} l", num(x), num(y)));
        Ok(())
    }

    /// Stroke the current path (`S`)
    pub fn stroke(&mut self) -> Result<()> {
        self.require_no_text("S")?;
        self.push("S".to_string());
        Ok(())
    }

    /// Begin a text object (`BT`)
    pub fn begin_text(&mut self) -> Result<()> {
        self.require_no_text("BT")?;
        self.in_text = true;
        self.push("BT".to_string());
        Ok(())
    }

    /// End the current text object (`ET`)
    pub fn end_text(&mut self) -> Result<()> {
        self.require_text("ET")?;
        self.in_text = false;
        self.push("ET".to_string());
        Ok(())
    }

    /// Select font and size (`Tf`)
    ///
    /// The font must have been registered with this canvas's document.
    pub fn set_font(&mut self, font: FontRef, size: f32) -> Result<()> {
        Self::require_finite("Tf", &[size])?;
        let name = self.doc.use_font(self.page, font)?;
        self.font = Some(font);
        self.push(format!("/{name} {} Tf", num(size)));
        Ok(())
    }

    /// Set the text leading used by `T*` (`TL`)
    pub fn set_leading(&mut self, leading: f32) -> Result<()> {
        Self::require_finite("TL", &[leading])?;
        self.push(format!("{} TL", num(leading)));
        Ok(())
    }

    /// Move to the start of the next line, offset from the start of the current one (`Td`)
    pub fn new_line_at_offset(&mut self, tx: f32, ty: f32) -> Result<()> {
        self.require_text("Td")?;
        Self::require_finite("Td", &[tx, ty])?;
        self.push(format!("{} {} Td", num(tx), num(ty)));
        Ok(())
    }

    /// Move to the start of the next line using the current leading (`T*`)
    pub fn new_line(&mut self) -> Result<()> {
        self.require_text("T*")?;
        self.push("T*".to_string());
        Ok(())
    }

    /// Show a string with the current font (`Tj`)
    pub fn show_text(&mut self, text: &str) -> Result<()> {
        self.require_text("Tj")?;
        let font = self
            .font
            .ok_or_else(|| PdfError::InvalidOperation("Tj before a font was set".to_string()))?;
        let hex = self.doc.encode_text(font, text)?;
        self.push(format!("{hex} Tj"));
        Ok(())
    }

    /// Draw an image scaled to `width × height` with its lower-left corner at `(x, y)`
    pub fn draw_image(
        &mut self,
        image: ImageRef,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<()> {
        self.require_no_text("Do")?;
        Self::require_finite("Do", &[x, y, width, height])?;
        let name = self.doc.use_image(self.page, image)?;
        self.push(format!(
            "q\n{} 0 0 {} {} {} cm\n/{name} Do\nQ",
            num(width),
            num(height),
            num(x),
            num(y)
        ));
        Ok(())
    }

    /// Finish drawing and hand the content to the document
    ///
    /// Fails if a text block is still open or a saved graphics state was not
    /// restored; the content is still flushed, balanced, when the canvas drops.
    pub fn close(mut self) -> Result<()> {
        if self.in_text {
            return Err(PdfError::InvalidOperation(
                "canvas closed inside a text block".to_string(),
            ));
        }
        if !self.state_stack.is_empty() {
            return Err(PdfError::InvalidOperation(format!(
                "canvas closed with {} unrestored graphics state(s)",
                self.state_stack.len()
            )));
        }

        self.flush();
        Ok(())
    }

    fn flush(&mut self) {
        if self.flushed {
            return;
        }
        self.flushed = true;

        let ops = std::mem::take(&mut self.ops);
        log::debug!("flushing {} content bytes to page {}", ops.len(), self.page);
        self.doc.buffer_content(self.page, &ops);
    }
}

impl Drop for PageCanvas<'_> {
    fn drop(&mut self) {
        if self.flushed {
            return;
        }

        if self.in_text || !self.state_stack.is_empty() {
            log::warn!(
                "page {} canvas dropped unbalanced (text block open: {}, saved states: {})",
                self.page,
                self.in_text,
                self.state_stack.len()
            );
        }
        if self.in_text {
            self.in_text = false;
            self.push("ET".to_string());
        }
        while self.state_stack.pop().is_some() {
            self.push("Q".to_string());
        }

        self.flush();
    }
}
