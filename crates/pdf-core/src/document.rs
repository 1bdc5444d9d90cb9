//! PDF Document wrapper

use crate::canvas::PageCanvas;
use crate::image::{ImageRef, ImageSource, ImageXObject};
use crate::{FontData, FontRef, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// RGB color with 0-255 channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const LIGHT_GRAY: Color = Color::rgb(192, 192, 192);
    pub const DARK_GRAY: Color = Color::rgb(64, 64, 64);

    /// Create a color from 0-255 channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to 0.0 - 1.0, as content stream operators expect
    pub fn components(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Embedded image object and its pixel size
#[derive(Debug, Clone)]
struct EmbeddedImage {
    object_id: ObjectId,
    width: u32,
    height: u32,
    /// Encoded source bytes, compared before a hash match is reused
    source: Vec<u8>,
}

/// Resource categories the document writes into page Resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Font,
    XObject,
}

impl ResourceKind {
    fn key(self) -> &'static [u8] {
        match self {
            ResourceKind::Font => b"Font",
            ResourceKind::XObject => b"XObject",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ResourceKind::Font => "F",
            ResourceKind::XObject => "Im",
        }
    }
}

/// PDF Document wrapper providing page composition
///
/// Fonts and images registered here are only usable with this document.
/// Drawing goes through [`PdfDocument::canvas`]; the document is finalized
/// once, by [`PdfDocument::save`] or [`PdfDocument::to_bytes`].
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Identifies handles issued by this document
    id: u64,
    /// Registered fonts, indexed by `FontRef::index`
    fonts: Vec<FontData>,
    /// Embedded images, indexed by `ImageRef::index`
    images: Vec<EmbeddedImage>,
    /// Image data hash -> indices of images with that hash
    image_hashes: HashMap<u64, Vec<usize>>,
    /// Page number -> font index -> resource name on that page
    page_fonts: BTreeMap<usize, BTreeMap<usize, String>>,
    /// Page number -> image index -> resource name on that page
    page_images: BTreeMap<usize, BTreeMap<usize, String>>,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
}

impl PdfDocument {
    /// Create an empty document with no pages
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.7");

        let pages_id = inner.new_object_id();
        inner.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Self::wrap(inner)
    }

    /// Open a PDF document from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("template.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::wrap(inner))
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::wrap(inner))
    }

    fn wrap(inner: Document) -> Self {
        Self {
            inner,
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            fonts: Vec::new(),
            images: Vec::new(),
            image_hashes: HashMap::new(),
            page_fonts: BTreeMap::new(),
            page_images: BTreeMap::new(),
            page_content_buffer: BTreeMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Append a blank page of the given size in points
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page(&mut self, width: f32, height: f32) -> Result<usize> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidOperation(format!(
                "page size must be positive, got {width}x{height}"
            )));
        }

        let pages_id = self.pages_root_id()?;
        let contents_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), Vec::new()));
        let page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(width.into()),
                Object::Real(height.into()),
            ],
            "Resources" => Dictionary::new(),
            "Contents" => contents_id,
        });

        let pages_dict = self
            .inner
            .get_object(pages_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;

        let mut kids = pages_dict
            .get(b"Kids")
            .and_then(Object::as_array)
            .map_err(|_| PdfError::ParseError("Pages object missing Kids array".to_string()))?
            .clone();
        kids.push(Object::Reference(page_id));

        let count = pages_dict
            .get(b"Count")
            .and_then(Object::as_i64)
            .map_err(|_| PdfError::ParseError("Pages object missing Count".to_string()))?;

        let mut new_pages_dict = pages_dict.clone();
        new_pages_dict.set("Kids", Object::Array(kids));
        new_pages_dict.set("Count", Object::Integer(count + 1));
        self.inner.objects.insert(pages_id, new_pages_dict.into());

        let page = self.page_count();
        log::debug!("added page {page} ({width}x{height})");
        Ok(page)
    }

    /// Set the page's display rotation (`/Rotate`), a multiple of 90 degrees
    pub fn set_page_rotation(&mut self, page: usize, degrees: i64) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(PdfError::InvalidOperation(format!(
                "page rotation must be a multiple of 90, got {degrees}"
            )));
        }

        let page_id = self.page_id(page)?;
        let mut page_dict = self.page_dict(page_id)?;
        page_dict.set("Rotate", Object::Integer(degrees.rem_euclid(360)));
        self.inner.objects.insert(page_id, page_dict.into());
        Ok(())
    }

    /// Get page width and height in points
    ///
    /// Reads the MediaBox (or CropBox), following the parent chain for
    /// inherited boxes. Pages without either are treated as A4.
    pub fn page_size(&self, page: usize) -> Result<(f32, f32)> {
        let page_id = self.page_id(page)?;
        let media_box = self.get_inherited_media_box(page_id)?;

        if media_box.len() < 4 {
            return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
        }

        let coord = |i: usize| {
            number(&media_box[i])
                .ok_or_else(|| PdfError::ParseError(format!("Invalid MediaBox entry {i}")))
        };
        Ok((coord(2)? - coord(0)?, coord(3)? - coord(1)?))
    }

    /// Register a TrueType font
    ///
    /// # Arguments
    /// * `name` - Font name written as the PDF BaseFont
    /// * `ttf_data` - TrueType font file bytes
    pub fn add_font(&mut self, name: &str, ttf_data: &[u8]) -> Result<FontRef> {
        let font = FontData::from_ttf(name, ttf_data)?;
        self.fonts.push(font);

        let font_ref = FontRef {
            document: self.id,
            index: self.fonts.len() - 1,
        };
        log::debug!(
            "registered font {name} as font #{} ({} bytes)",
            font_ref.index,
            ttf_data.len()
        );
        Ok(font_ref)
    }

    /// Decode an image and embed it in the document
    ///
    /// Identical image data is embedded once and shares one handle.
    pub fn load_image<S: ImageSource + ?Sized>(&mut self, source: &S) -> Result<ImageRef> {
        let name = source.file_name().unwrap_or("<unnamed>").to_string();
        let data = source.read_bytes()?;
        let data_hash = content_hash(&data);

        let existing = self.image_hashes.get(&data_hash).and_then(|indices| {
            indices
                .iter()
                .copied()
                .find(|&index| self.images[index].source.as_slice() == data.as_ref())
        });

        let index = match existing {
            Some(index) => index,
            None => {
                let xobject = ImageXObject::decode(&data)
                    .map_err(|e| PdfError::ImageError(format!("{name}: {e}")))?;
                let object_id = self.inner.add_object(xobject.to_pdf_stream());
                self.images.push(EmbeddedImage {
                    object_id,
                    width: xobject.width,
                    height: xobject.height,
                    source: data.into_owned(),
                });

                let index = self.images.len() - 1;
                self.image_hashes.entry(data_hash).or_default().push(index);
                log::debug!(
                    "embedded image {name} ({}x{}, {})",
                    xobject.width,
                    xobject.height,
                    xobject.filter
                );
                index
            }
        };

        let image = &self.images[index];
        Ok(ImageRef {
            document: self.id,
            index,
            width: image.width,
            height: image.height,
        })
    }

    /// Open a canvas on a page (1-indexed)
    pub fn canvas(&mut self, page: usize) -> Result<PageCanvas<'_>> {
        self.page_id(page)?;
        Ok(PageCanvas::new(self, page))
    }

    /// Content flushed to a page by its canvases and not yet saved
    pub fn buffered_content(&self, page: usize) -> &[u8] {
        self.page_content_buffer
            .get(&page)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(mut self, path: P) -> Result<()> {
        self.finalize()?;
        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        self.finalize()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Resource name of `font` on `page`, assigned on first use
    pub(crate) fn use_font(&mut self, page: usize, font: FontRef) -> Result<String> {
        self.check_font(font)?;
        if let Some(name) = self.page_fonts.get(&page).and_then(|fonts| fonts.get(&font.index)) {
            return Ok(name.clone());
        }

        let name = self.free_resource_name(page, ResourceKind::Font, font.index)?;
        self.page_fonts
            .entry(page)
            .or_default()
            .insert(font.index, name.clone());
        Ok(name)
    }

    /// Encode text for `Tj`, recording the glyphs the embedded subset needs
    pub(crate) fn encode_text(&mut self, font: FontRef, text: &str) -> Result<String> {
        self.check_font(font)?;
        Ok(self.fonts[font.index].encode_text(text))
    }

    /// Resource name of `image` on `page`, assigned on first use
    pub(crate) fn use_image(&mut self, page: usize, image: ImageRef) -> Result<String> {
        if image.document != self.id || image.index >= self.images.len() {
            return Err(PdfError::ForeignResource("image"));
        }
        if let Some(name) = self
            .page_images
            .get(&page)
            .and_then(|images| images.get(&image.index))
        {
            return Ok(name.clone());
        }

        let name = self.free_resource_name(page, ResourceKind::XObject, image.index)?;
        self.page_images
            .entry(page)
            .or_default()
            .insert(image.index, name.clone());
        Ok(name)
    }

    pub(crate) fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    fn check_font(&self, font: FontRef) -> Result<()> {
        if font.document != self.id || font.index >= self.fonts.len() {
            return Err(PdfError::ForeignResource("font"));
        }
        Ok(())
    }

    /// First name from `F{index+1}` / `Im{index+1}` upwards that the page
    /// neither has in its Resources nor has handed out already
    fn free_resource_name(&self, page: usize, kind: ResourceKind, index: usize) -> Result<String> {
        let page_id = self.page_id(page)?;
        let existing = self
            .page_resources(page_id)
            .get(kind.key())
            .map(|dict| self.resolve_dict(dict))
            .unwrap_or_default();
        let assigned = match kind {
            ResourceKind::Font => self.page_fonts.get(&page),
            ResourceKind::XObject => self.page_images.get(&page),
        };

        let mut number = index + 1;
        loop {
            let name = format!("{}{number}", kind.prefix());
            let taken = existing.has(name.as_bytes())
                || assigned.is_some_and(|names| names.values().any(|used| *used == name));
            if !taken {
                return Ok(name);
            }
            number += 1;
        }
    }

    /// Write buffered content, embed used fonts and wire page resources
    fn finalize(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);
        for (page, content) in &buffers {
            if !content.is_empty() {
                self.append_to_content_stream(*page, content)?;
            }
        }

        let used_fonts: BTreeSet<usize> = self
            .page_fonts
            .values()
            .flat_map(|fonts| fonts.keys())
            .copied()
            .collect();
        let mut font_ids = HashMap::new();
        for index in used_fonts {
            font_ids.insert(index, self.embed_font_object(index)?);
        }

        let page_fonts = std::mem::take(&mut self.page_fonts);
        for (page, fonts) in page_fonts {
            let entries = fonts
                .into_iter()
                .map(|(index, name)| (name, font_ids[&index]))
                .collect::<Vec<_>>();
            self.add_page_resources(page, ResourceKind::Font, &entries)?;
        }

        let page_images = std::mem::take(&mut self.page_images);
        for (page, images) in page_images {
            let entries = images
                .into_iter()
                .map(|(index, name)| (name, self.images[index].object_id))
                .collect::<Vec<_>>();
            self.add_page_resources(page, ResourceKind::XObject, &entries)?;
        }

        log::debug!(
            "finalized document: {} pages, {} fonts embedded, {} images",
            self.page_count(),
            font_ids.len(),
            self.images.len()
        );
        Ok(())
    }

    /// Embed a single font and return the Type0 font object ID
    fn embed_font_object(&mut self, index: usize) -> Result<ObjectId> {
        let font_objects = self.fonts[index].to_pdf_objects()?;

        let font_file_id = self.inner.add_object(font_objects.font_file_stream);

        let mut font_descriptor = font_objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = font_objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        if let Some(cid_to_gid_map) = font_objects.cid_to_gid_map {
            let map_id = self.inner.add_object(cid_to_gid_map);
            cid_font.set("CIDToGIDMap", Object::Reference(map_id));
        }
        let cid_font_id = self.inner.add_object(cid_font);

        let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);

        let mut type0_font = font_objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        Ok(self.inner.add_object(type0_font))
    }

    /// Merge named references into one category (`/Font`, `/XObject`) of a page's Resources
    ///
    /// Inherited Resources are copied onto the page first so they stay visible.
    fn add_page_resources(
        &mut self,
        page: usize,
        kind: ResourceKind,
        entries: &[(String, ObjectId)],
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let mut page_dict = self.page_dict(page_id)?;

        let mut resources = self.page_resources(page_id);
        let mut category_dict = resources
            .get(kind.key())
            .map(|dict| self.resolve_dict(dict))
            .unwrap_or_default();

        for (name, object_id) in entries {
            category_dict.set(name.as_bytes(), Object::Reference(*object_id));
        }

        resources.set(kind.key(), Object::Dictionary(category_dict));
        page_dict.set("Resources", Object::Dictionary(resources));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }

    /// Append content to a page's content stream
    ///
    /// Existing content is wrapped in `q`/`Q` so its graphics state cannot
    /// leak into the appended operators.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;
        let existing = self.inner.get_page_content(page_id).unwrap_or_default();

        let mut new_content = Vec::with_capacity(existing.len() + content.len() + 4);
        if !existing.is_empty() {
            new_content.extend_from_slice(b"q\n");
            new_content.extend_from_slice(&existing);
            new_content.extend_from_slice(b"\nQ\n");
        }
        new_content.extend_from_slice(content);

        let stream_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), new_content));

        let mut page_dict = self.page_dict(page_id)?;
        page_dict.set("Contents", Object::Reference(stream_id));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        if page == 0 {
            return Err(PdfError::InvalidPage(page, pages.len()));
        }
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<Dictionary> {
        self.inner
            .get_object(page_id)?
            .as_dict()
            .cloned()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))
    }

    /// Resources of a page, inherited from the page tree when the page has none
    fn page_resources(&self, page_id: ObjectId) -> Dictionary {
        let mut current_id = page_id;

        for _ in 0..10 {
            let Ok(dict) = self.inner.get_object(current_id).and_then(Object::as_dict) else {
                break;
            };
            if let Ok(resources) = dict.get(b"Resources") {
                return self.resolve_dict(resources);
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Dictionary::new()
    }

    /// Dictionary value, following one level of indirection
    fn resolve_dict(&self, object: &Object) -> Dictionary {
        match object {
            Object::Dictionary(dict) => dict.clone(),
            Object::Reference(id) => self
                .inner
                .get_object(*id)
                .and_then(Object::as_dict)
                .cloned()
                .unwrap_or_default(),
            _ => Dictionary::new(),
        }
    }

    fn pages_root_id(&self) -> Result<ObjectId> {
        let catalog_id = self
            .inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?;
        self.inner
            .get_object(catalog_id)?
            .as_dict()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))
    }

    /// Get MediaBox, following parent inheritance chain if needed
    fn get_inherited_media_box(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let mut current_id = page_id;

        // Parent chains deeper than this are treated as missing a box
        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
                return match media_box {
                    Object::Array(arr) => Ok(arr.clone()),
                    Object::Reference(ref_id) => self
                        .inner
                        .get_object(*ref_id)?
                        .as_array()
                        .cloned()
                        .map_err(|_| {
                            PdfError::ParseError("MediaBox reference is not an array".to_string())
                        }),
                    _ => Err(PdfError::ParseError("MediaBox is not an array".to_string())),
                };
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        // A4 portrait
        Ok(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(595.28),
            Object::Real(841.89),
        ])
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

fn content_hash(data: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}
