//! Font handling for PDF documents

use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::{BTreeSet, HashMap};
use subsetter::GlyphRemapper;

/// Handle to a font registered with a [`crate::PdfDocument`]
///
/// Handles are cheap to copy and only valid for the document that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontRef {
    pub(crate) document: u64,
    pub(crate) index: usize,
}

/// Font data structure for embedded fonts
///
/// Glyphs are renumbered in the order they are first drawn, so text can be
/// encoded immediately and the embedded font only carries the glyphs in use.
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier
    pub name: String,
    /// Raw TTF data
    pub ttf_data: Vec<u8>,
    /// Characters drawn with this font
    pub used_chars: BTreeSet<char>,
    /// Original glyph IDs in subset order; the position is the subset glyph ID
    glyph_order: Vec<u16>,
    /// Original glyph ID -> subset glyph ID
    glyph_map: HashMap<u16, u16>,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont Type2 dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream (subset TTF data)
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
    /// CID to glyph map, only needed when the font could not be subset
    pub cid_to_gid_map: Option<Stream>,
}

impl FontData {
    /// Create font data from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        ttf_parser::Face::parse(ttf_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{name}: {e}")))?;

        Ok(Self::new(name, ttf_data.to_vec()))
    }

    fn new(name: &str, ttf_data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            ttf_data,
            used_chars: BTreeSet::new(),
            glyph_order: vec![0],
            glyph_map: HashMap::from([(0, 0)]),
        }
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    /// Number of glyphs the embedded subset carries, including .notdef
    fn subset_glyph_count(&self) -> usize {
        self.glyph_order.len()
    }

    fn remap_glyph(&mut self, gid: u16) -> u16 {
        if let Some(&new_gid) = self.glyph_map.get(&gid) {
            return new_gid;
        }

        let new_gid = self.glyph_order.len() as u16;
        self.glyph_order.push(gid);
        self.glyph_map.insert(gid, new_gid);
        new_gid
    }

    /// Get font units per em
    pub fn units_per_em(&self) -> u16 {
        self.face()
            .map(|face| face.units_per_em())
            .unwrap_or(1000)
    }

    /// Get font ascender
    pub fn ascender(&self) -> i16 {
        self.face().map(|face| face.ascender()).unwrap_or(800)
    }

    /// Get font descender
    pub fn descender(&self) -> i16 {
        self.face().map(|face| face.descender()).unwrap_or(-200)
    }

    /// Encode text as a hex string for the PDF Tj operator
    ///
    /// Records the characters and assigns subset glyph IDs. Characters
    /// without a glyph are encoded as .notdef.
    pub fn encode_text(&mut self, text: &str) -> String {
        let gids: Vec<Option<u16>> = {
            let face = self.face();
            text.chars()
                .map(|c| {
                    face.as_ref()
                        .and_then(|face| face.glyph_index(c))
                        .map(|id| id.0)
                        .filter(|&id| id != 0)
                })
                .collect()
        };
        self.used_chars.extend(text.chars());

        let mut result = String::with_capacity(gids.len() * 4 + 2);
        result.push('<');
        for gid in gids {
            let new_gid = gid.map(|gid| self.remap_glyph(gid)).unwrap_or(0);
            result.push_str(&format!("{new_gid:04X}"));
        }
        result.push('>');
        result
    }

    /// Subset the font down to the glyphs drawn so far
    fn subset(&self) -> Result<Vec<u8>> {
        let mut remapper = GlyphRemapper::new();
        for &gid in &self.glyph_order {
            remapper.remap(gid);
        }

        subsetter::subset(&self.ttf_data, 0, &remapper)
            .map_err(|e| PdfError::FontSubsetError(format!("{}: {e:?}", self.name)))
    }

    /// Map from subset glyph IDs back to original glyph IDs
    fn cid_to_gid_stream(&self) -> Stream {
        let map: Vec<u8> = self
            .glyph_order
            .iter()
            .flat_map(|gid| gid.to_be_bytes())
            .collect();
        Stream::new(Dictionary::new(), map)
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// Cross-object references are left as placeholders and wired up by the
    /// document when the objects are added. Fonts the subsetter cannot handle
    /// are embedded whole, with a CIDToGIDMap stream translating glyph IDs.
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        let font_name = Object::Name(self.name.clone().into_bytes());

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(Dictionary::new(), tounicode_content.into_bytes());

        let (font_file, cid_to_gid_map) = match self.subset() {
            Ok(subset) => {
                log::debug!(
                    "subset font {}: {} glyphs, {} -> {} bytes",
                    self.name,
                    self.subset_glyph_count(),
                    self.ttf_data.len(),
                    subset.len()
                );
                (subset, None)
            }
            Err(err) => {
                log::warn!("{err}; embedding the full font");
                (self.ttf_data.clone(), Some(self.cid_to_gid_stream()))
            }
        };

        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![("Length1", (font_file.len() as i64).into())]),
            font_file,
        );

        let units_per_em = self.units_per_em() as i64;
        let ascender = self.ascender() as i64;
        let descender = self.descender() as i64;

        let font_bbox = vec![
            0.into(),
            descender.into(),
            units_per_em.into(),
            ascender.into(),
        ];

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", 4.into()), // Symbolic font
            ("FontBBox", font_bbox.into()),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascender.into()),
            ("Descent", descender.into()),
            ("CapHeight", ascender.into()),
            ("StemV", 80.into()),
            ("FontFile2", Object::Reference((0, 0))),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let cid_to_gid = match cid_to_gid_map {
            Some(_) => Object::Reference((0, 0)),
            None => "Identity".into(),
        };

        let cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("FontDescriptor", Object::Reference((0, 0))),
            ("CIDToGIDMap", cid_to_gid),
            ("W", self.generate_widths_array().into()),
            ("DW", 1000.into()),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
            ("DescendantFonts", vec![Object::Reference((0, 0))].into()),
            ("ToUnicode", Object::Reference((0, 0))),
        ]);

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
            cid_to_gid_map,
        })
    }

    /// Generate /W array for subset glyph widths: [cid1 [width1] cid2 [width2] ...]
    fn generate_widths_array(&self) -> Vec<Object> {
        let mut widths = Vec::new();
        let Some(face) = self.face() else {
            return widths;
        };

        let scale = 1000.0 / face.units_per_em() as f32;
        for (new_gid, &gid) in self.glyph_order.iter().enumerate() {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(1000);
            widths.push((new_gid as i64).into());
            widths.push(vec![((advance as f32 * scale).round() as i64).into()].into());
        }

        widths
    }

    /// Generate ToUnicode CMap stream content
    ///
    /// Characters drawn as .notdef have no entry.
    fn generate_tounicode_cmap(&self) -> String {
        let face = self.face();
        let mut entries: Vec<(u16, char)> = self
            .used_chars
            .iter()
            .filter_map(|&c| {
                let gid = face.as_ref()?.glyph_index(c)?.0;
                self.glyph_map.get(&gid).map(|&new_gid| (new_gid, c))
            })
            .filter(|&(new_gid, _)| new_gid != 0)
            .collect();
        entries.sort();

        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");
        cmap.push_str(&bfchar_sections(&entries));
        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

/// `beginbfchar` sections for (glyph ID, character) pairs
fn bfchar_sections(entries: &[(u16, char)]) -> String {
    let mut sections = String::new();

    // bfchar sections are limited to 100 entries
    for chunk in entries.chunks(100) {
        sections.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for &(gid, c) in chunk {
            let mut utf16 = [0u16; 2];
            let unicode: String = c
                .encode_utf16(&mut utf16)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            sections.push_str(&format!("<{gid:04X}> <{unicode}>\n"));
        }
        sections.push_str("endbfchar\n");
    }

    sections
}
