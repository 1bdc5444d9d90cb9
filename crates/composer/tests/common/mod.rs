//! Fixtures for composer tests
//!
//! A small TrueType font with glyphs for printable ASCII, test images, and
//! helpers that read shown text back out of a saved PDF through the
//! embedded ToUnicode maps.

#![allow(dead_code)]

use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;

/// First and last character the test font has glyphs for
const FIRST_CHAR: u16 = 0x20;
const LAST_CHAR: u16 = 0x7E;

fn put(out: &mut Vec<u8>, values: &[u16]) {
    for value in values {
        out.extend(value.to_be_bytes());
    }
}

/// TrueType font mapping U+0020..U+007E to glyphs 1..95, all 600 units wide
pub fn sans_ttf() -> Vec<u8> {
    let glyphs = LAST_CHAR - FIRST_CHAR + 2;

    // cmap: one format 4 subtable, a single delta-mapped segment
    let mut cmap = Vec::new();
    put(&mut cmap, &[0, 1, 3, 1]);
    cmap.extend(12u32.to_be_bytes());
    put(&mut cmap, &[4, 32, 0, 4, 4, 1, 0]);
    put(&mut cmap, &[LAST_CHAR, 0xFFFF, 0]);
    put(&mut cmap, &[FIRST_CHAR, 0xFFFF]);
    put(&mut cmap, &[1u16.wrapping_sub(FIRST_CHAR), 1]);
    put(&mut cmap, &[0, 0]);

    // glyf: only .notdef carries a (contourless) glyph record
    let mut glyf = Vec::new();
    put(&mut glyf, &[0; 6]);
    let mut loca = Vec::new();
    put(&mut loca, &[0]);
    put(&mut loca, &vec![6; glyphs as usize]);

    let mut head = Vec::new();
    head.extend(0x0001_0000u32.to_be_bytes());
    head.extend(0x0001_0000u32.to_be_bytes());
    head.extend(0u32.to_be_bytes());
    head.extend(0x5F0F_3CF5u32.to_be_bytes());
    put(&mut head, &[0, 2048]);
    head.extend([0u8; 16]);
    put(&mut head, &[0, (-400i16) as u16, 600, 1600, 0, 8, 2, 0, 0]);

    let mut hhea = Vec::new();
    hhea.extend(0x0001_0000u32.to_be_bytes());
    put(&mut hhea, &[1600, (-400i16) as u16, 0, 1229, 0, 0, 1229, 1, 0, 0]);
    hhea.extend([0u8; 10]);
    put(&mut hhea, &[glyphs]);

    let mut hmtx = Vec::new();
    for _ in 0..glyphs {
        put(&mut hmtx, &[1229, 0]);
    }

    let mut maxp = Vec::new();
    maxp.extend(0x0001_0000u32.to_be_bytes());
    put(&mut maxp, &[glyphs, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0]);

    let mut post = Vec::new();
    post.extend(0x0003_0000u32.to_be_bytes());
    post.extend([0u8; 28]);

    let tables: [(&[u8; 4], Vec<u8>); 8] = [
        (b"cmap", cmap),
        (b"glyf", glyf),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"loca", loca),
        (b"maxp", maxp),
        (b"post", post),
    ];

    let mut font = Vec::new();
    font.extend(0x0001_0000u32.to_be_bytes());
    put(&mut font, &[tables.len() as u16, 128, 3, 0]);

    let mut offset = 12 + 16 * tables.len();
    let mut data = Vec::new();
    for (tag, table) in &tables {
        font.extend_from_slice(*tag);
        font.extend(0u32.to_be_bytes());
        font.extend((offset as u32).to_be_bytes());
        font.extend((table.len() as u32).to_be_bytes());

        data.extend_from_slice(table);
        data.resize(data.len().next_multiple_of(4), 0);
        offset = 12 + 16 * tables.len() + data.len();
    }
    font.extend(data);
    font
}

/// A 4x3 PNG filled with `color`
pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(4, 3, image::Rgb(color));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// A gray JPEG of the given size
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::GrayImage::from_pixel(width, height, image::Luma([90]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageFormat::Jpeg).unwrap();
    bytes.into_inner()
}

/// Glyph code -> text, read from a ToUnicode CMap
fn parse_tounicode(cmap: &str) -> HashMap<u16, String> {
    let mut map = HashMap::new();
    let mut in_bfchar = false;

    for line in cmap.lines() {
        if line.ends_with("beginbfchar") {
            in_bfchar = true;
            continue;
        }
        if line == "endbfchar" {
            in_bfchar = false;
            continue;
        }
        if !in_bfchar {
            continue;
        }

        let mut parts = line.split_whitespace().map(|part| part.trim_matches(['<', '>']));
        let (Some(code), Some(unicode)) = (parts.next(), parts.next()) else {
            continue;
        };
        let units: Vec<u16> = (0..unicode.len())
            .step_by(4)
            .map(|i| u16::from_str_radix(&unicode[i..i + 4], 16).unwrap())
            .collect();
        let text = char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        map.insert(u16::from_str_radix(code, 16).unwrap(), text);
    }

    map
}

fn dict_entry<'a>(doc: &'a Document, dict: &'a lopdf::Dictionary, key: &[u8]) -> &'a Object {
    match dict.get(key).unwrap() {
        Object::Reference(id) => doc.get_object(*id).unwrap(),
        object => object,
    }
}

/// ToUnicode map of each font resource on a page, by resource name
fn page_font_maps(doc: &Document, page_id: ObjectId) -> HashMap<String, HashMap<u16, String>> {
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let resources = dict_entry(doc, page, b"Resources").as_dict().unwrap();
    let Ok(fonts) = resources.get(b"Font").and_then(Object::as_dict) else {
        return HashMap::new();
    };

    fonts
        .iter()
        .map(|(name, font)| {
            let font = doc
                .get_object(font.as_reference().unwrap())
                .unwrap()
                .as_dict()
                .unwrap();
            let cmap = dict_entry(doc, font, b"ToUnicode").as_stream().unwrap();
            (
                String::from_utf8_lossy(name).into_owned(),
                parse_tounicode(&String::from_utf8_lossy(&cmap.content)),
            )
        })
        .collect()
}

/// Every string a page shows with `Tj`, in content order
///
/// Glyphs without a ToUnicode entry (.notdef) come back as U+FFFD.
pub fn shown_text(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let maps = page_font_maps(doc, page_id);
    let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();

    let mut current_font = None;
    let mut shown = Vec::new();
    for line in content.lines() {
        if let Some(operands) = line.strip_suffix(" Tf") {
            let name = operands.split_whitespace().next().unwrap();
            current_font = Some(name.trim_start_matches('/').to_string());
        } else if let Some(hex) = line.strip_suffix(" Tj") {
            let map = &maps[current_font.as_ref().unwrap()];
            let hex = hex.trim_matches(['<', '>']);
            let text = (0..hex.len())
                .step_by(4)
                .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).unwrap())
                .map(|code| {
                    map.get(&code)
                        .cloned()
                        .unwrap_or_else(|| char::REPLACEMENT_CHARACTER.to_string())
                })
                .collect();
            shown.push(text);
        }
    }

    shown
}
