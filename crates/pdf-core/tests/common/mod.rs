//! Shared test fixtures
//!
//! Builds a tiny but valid TrueType font in memory so tests do not depend on
//! font files being installed.

#![allow(dead_code)]

/// Glyph advance for every glyph, in font units
pub const ADVANCE: u16 = 500;
/// Font units per em
pub const UNITS_PER_EM: u16 = 1000;

/// Glyph ID assigned to a printable ASCII character
pub fn glyph_for(c: char) -> u16 {
    c as u16 - 0x20 + 1
}

/// Minimal TrueType font covering printable ASCII (U+0020 - U+007E)
///
/// Tables: cmap (format 0), glyf, head, hhea, hmtx, loca, maxp, post.
/// Only .notdef has an outline record; every other glyph is empty.
pub fn minimal_ttf() -> Vec<u8> {
    let tables: [(&[u8; 4], Vec<u8>); 8] = [
        (b"cmap", cmap_table()),
        (b"glyf", glyf_table()),
        (b"head", head_table()),
        (b"hhea", hhea_table()),
        (b"hmtx", hmtx_table()),
        (b"loca", loca_table()),
        (b"maxp", maxp_table()),
        (b"post", post_table()),
    ];

    let header_len = 12 + 16 * tables.len();
    let mut directory = Vec::new();
    directory.extend(0x0001_0000u32.to_be_bytes());
    directory.extend((tables.len() as u16).to_be_bytes());
    directory.extend(128u16.to_be_bytes()); // searchRange
    directory.extend(3u16.to_be_bytes()); // entrySelector
    directory.extend(0u16.to_be_bytes()); // rangeShift

    let mut body = Vec::new();
    for (tag, data) in &tables {
        directory.extend_from_slice(*tag);
        directory.extend(0u32.to_be_bytes()); // checksum, not verified by parsers
        directory.extend(((header_len + body.len()) as u32).to_be_bytes());
        directory.extend((data.len() as u32).to_be_bytes());

        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
    }

    directory.extend(body);
    directory
}

fn glyph_count() -> u16 {
    glyph_for('~') + 1
}

fn cmap_table() -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(0u16.to_be_bytes()); // version
    table.extend(1u16.to_be_bytes()); // numTables
    table.extend(0u16.to_be_bytes()); // platform: Unicode
    table.extend(3u16.to_be_bytes()); // encoding: BMP
    table.extend(12u32.to_be_bytes()); // subtable offset

    table.extend(0u16.to_be_bytes()); // format 0
    table.extend(262u16.to_be_bytes()); // length
    table.extend(0u16.to_be_bytes()); // language
    for code in 0u16..256 {
        let gid = if (0x20..=0x7E).contains(&code) {
            glyph_for(char::from(code as u8)) as u8
        } else {
            0
        };
        table.push(gid);
    }
    table
}

fn head_table() -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(0x0001_0000u32.to_be_bytes()); // version
    table.extend(0x0001_0000u32.to_be_bytes()); // fontRevision
    table.extend(0u32.to_be_bytes()); // checksumAdjustment
    table.extend(0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    table.extend(0u16.to_be_bytes()); // flags
    table.extend(UNITS_PER_EM.to_be_bytes());
    table.extend(0u64.to_be_bytes()); // created
    table.extend(0u64.to_be_bytes()); // modified
    table.extend(0i16.to_be_bytes()); // xMin
    table.extend((-200i16).to_be_bytes()); // yMin
    table.extend((ADVANCE as i16).to_be_bytes()); // xMax
    table.extend(800i16.to_be_bytes()); // yMax
    table.extend(0u16.to_be_bytes()); // macStyle
    table.extend(8u16.to_be_bytes()); // lowestRecPPEM
    table.extend(2i16.to_be_bytes()); // fontDirectionHint
    table.extend(0i16.to_be_bytes()); // indexToLocFormat
    table.extend(0i16.to_be_bytes()); // glyphDataFormat
    table
}

fn hhea_table() -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(0x0001_0000u32.to_be_bytes()); // version
    table.extend(800i16.to_be_bytes()); // ascender
    table.extend((-200i16).to_be_bytes()); // descender
    table.extend(0i16.to_be_bytes()); // lineGap
    table.extend(ADVANCE.to_be_bytes()); // advanceWidthMax
    table.extend(0i16.to_be_bytes()); // minLeftSideBearing
    table.extend(0i16.to_be_bytes()); // minRightSideBearing
    table.extend((ADVANCE as i16).to_be_bytes()); // xMaxExtent
    table.extend(1i16.to_be_bytes()); // caretSlopeRise
    table.extend(0i16.to_be_bytes()); // caretSlopeRun
    table.extend(0i16.to_be_bytes()); // caretOffset
    table.extend([0u8; 8]); // reserved
    table.extend(0i16.to_be_bytes()); // metricDataFormat
    table.extend(glyph_count().to_be_bytes()); // numberOfHMetrics
    table
}

fn hmtx_table() -> Vec<u8> {
    let mut table = Vec::new();
    for _ in 0..glyph_count() {
        table.extend(ADVANCE.to_be_bytes());
        table.extend(0i16.to_be_bytes());
    }
    table
}

/// .notdef: a glyph header with no contours and no instructions
const NOTDEF_GLYPH_LEN: u16 = 12;

fn glyf_table() -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(0i16.to_be_bytes()); // numberOfContours
    table.extend(0i16.to_be_bytes()); // xMin
    table.extend(0i16.to_be_bytes()); // yMin
    table.extend(0i16.to_be_bytes()); // xMax
    table.extend(0i16.to_be_bytes()); // yMax
    table.extend(0u16.to_be_bytes()); // instructionLength
    table
}

fn loca_table() -> Vec<u8> {
    // Short format: offsets divided by two
    let mut table = Vec::new();
    table.extend(0u16.to_be_bytes());
    for _ in 0..glyph_count() {
        table.extend((NOTDEF_GLYPH_LEN / 2).to_be_bytes());
    }
    table
}

fn maxp_table() -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(0x0001_0000u32.to_be_bytes()); // version 1.0
    table.extend(glyph_count().to_be_bytes());
    table.extend(0u16.to_be_bytes()); // maxPoints
    table.extend(0u16.to_be_bytes()); // maxContours
    table.extend(0u16.to_be_bytes()); // maxCompositePoints
    table.extend(0u16.to_be_bytes()); // maxCompositeContours
    table.extend(2u16.to_be_bytes()); // maxZones
    table.extend([0u8; 18]); // twilight points through component depth
    table
}

fn post_table() -> Vec<u8> {
    let mut table = Vec::new();
    table.extend(0x0003_0000u32.to_be_bytes()); // version 3.0, no glyph names
    table.extend(0u32.to_be_bytes()); // italicAngle
    table.extend((-100i16).to_be_bytes()); // underlinePosition
    table.extend(50i16.to_be_bytes()); // underlineThickness
    table.extend([0u8; 20]); // isFixedPitch and memory hints
    table
}

/// Encode a 2x2 RGB PNG
pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(2, 2, image::Rgb(color));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

/// Encode an RGB JPEG of the given size
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    bytes.into_inner()
}
