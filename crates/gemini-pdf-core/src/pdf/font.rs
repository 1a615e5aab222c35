//! Overlay font handling.
//!
//! Translated text prefers a bundled TrueType file, embedded into the output
//! PDF as a composite font so Cyrillic renders correctly:
//! - **Type0 font**: the top-level font dictionary that references:
//!   - **CIDFont**: glyph metrics, referencing:
//!     - **FontDescriptor**: font metadata (flags, bounding box, etc.)
//!     - **FontFile2**: the embedded TrueType font program
//!   - **ToUnicode CMap**: maps glyph IDs back to Unicode for copy/paste
//!
//! When no bundled font is configured (or it fails to load), the builtin
//! Helvetica base font is used instead. Helvetica only encodes Latin-1
//! text, so lines outside that repertoire are render failures the painter
//! reports rather than paints.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use lopdf::{Document, Object, ObjectId, Stream};
use ttf_parser::Face;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Resource name under which the overlay font is registered on each page.
pub(crate) const FONT_RESOURCE: &str = "FTr";

/// Character ranges the embedded font prepares glyph widths for.
const GLYPH_RANGES: &[(u32, u32)] = &[
    (0x0020, 0x007E), // Basic Latin (ASCII printable)
    (0x00A0, 0x00FF), // Latin-1 Supplement
    (0x0100, 0x017F), // Latin Extended-A
    (0x0400, 0x04FF), // Cyrillic
    (0x2010, 0x203A), // Dashes, smart quotes, guillemets
    (0x20AC, 0x20AC), // Euro sign
];

/// Average character width of the builtin Helvetica as a fraction of the
/// font size. Layout estimate only.
const BUILTIN_CHAR_WIDTH_FACTOR: f32 = 0.55;

/// Font used for translated overlay text.
pub enum OverlayFont {
    /// Bundled TrueType file, embedded into the output document
    Embedded(EmbeddedFont),
    /// Builtin Helvetica base font (Latin-1 text only)
    Builtin,
}

impl OverlayFont {
    /// Load the configured bundled font, falling back to the builtin font
    /// when none is configured or the file cannot be parsed.
    pub fn load(font_file: Option<&Path>) -> Self {
        match font_file {
            Some(path) => match EmbeddedFont::from_file(path) {
                Ok(font) => {
                    info!("Using bundled font {}", path.display());
                    Self::Embedded(font)
                }
                Err(e) => {
                    warn!("{e}; falling back to builtin font");
                    Self::Builtin
                }
            },
            None => Self::Builtin,
        }
    }

    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    /// Width of a line of text in PDF points at the given font size.
    pub fn line_width(&self, text: &str, font_size: f32) -> f32 {
        match self {
            Self::Embedded(font) => font.string_width(text, font_size),
            #[allow(clippy::cast_precision_loss)]
            Self::Builtin => text.chars().count() as f32 * font_size * BUILTIN_CHAR_WIDTH_FACTOR,
        }
    }

    /// Encode a line as a `Tj` operand for the content stream, delimiters
    /// included. Returns `None` when this font cannot encode the line
    /// (builtin font outside Latin-1); the caller treats that as a render
    /// failure for the block.
    pub fn encode_line(&self, text: &str) -> Option<String> {
        match self {
            Self::Embedded(font) => Some(format!("<{}>", font.to_hex_glyphs(text))),
            Self::Builtin => encode_winansi_literal(text),
        }
    }

    /// Create this font's object graph in the document and return the font
    /// object to reference from page resources.
    pub fn add_to_document(&self, doc: &mut Document) -> ObjectId {
        match self {
            Self::Embedded(font) => font.embed(doc),
            Self::Builtin => doc.add_object(lopdf::Dictionary::from_iter([
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type1".to_vec())),
                ("BaseFont", Object::Name(b"Helvetica".to_vec())),
                ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            ])),
        }
    }
}

/// Encode text as a PDF literal string in WinAnsi encoding.
///
/// ASCII maps directly, Latin-1 Supplement maps to high bytes (emitted as
/// octal escapes); anything else is not encodable.
fn encode_winansi_literal(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{A0}'..='\u{FF}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => return None,
        }
    }
    out.push(')');
    Some(out)
}

/// A glyph's ID and advance width in font design units.
struct GlyphEntry {
    gid: u16,
    width: u16,
}

/// A runtime-loaded TrueType font prepared for embedding.
///
/// All metrics are captured at load time so no further parsing of the font
/// data is needed while painting.
pub struct EmbeddedFont {
    data: Vec<u8>,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    cap_height: i16,
    bbox: [i16; 4],
    glyphs: BTreeMap<char, GlyphEntry>,
    /// Advance used for characters without a prepared glyph
    notdef_width: u16,
}

impl EmbeddedFont {
    /// Read and parse a TrueType file, capturing the metrics and glyph
    /// widths for the prepared character ranges.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            Error::FontLoad(format!("Failed to read font {}: {}", path.display(), e))
        })?;

        let face = Face::parse(&data, 0).map_err(|e| {
            Error::FontLoad(format!("Failed to parse font {}: {}", path.display(), e))
        })?;

        let units_per_em = face.units_per_em();
        let ascent = face.ascender();
        let descent = face.descender();
        let cap_height = face.capital_height().unwrap_or_else(|| face.ascender());
        let gb = face.global_bounding_box();
        let bbox = [gb.x_min, gb.y_min, gb.x_max, gb.y_max];

        let mut glyphs = BTreeMap::new();
        for &(start, end) in GLYPH_RANGES {
            for codepoint in start..=end {
                let Some(c) = char::from_u32(codepoint) else {
                    continue;
                };
                let Some(gid) = face.glyph_index(c) else {
                    continue;
                };
                if gid.0 == 0 {
                    continue;
                }
                let width = face.glyph_hor_advance(gid).unwrap_or(0);
                glyphs.insert(c, GlyphEntry { gid: gid.0, width });
            }
        }

        let notdef_width = glyphs
            .get(&' ')
            .map_or(units_per_em / 2, |entry| entry.width);

        Ok(Self {
            data,
            units_per_em,
            ascent,
            descent,
            cap_height,
            bbox,
            glyphs,
            notdef_width,
        })
    }

    /// Width of a string in PDF points at the given font size.
    #[allow(clippy::cast_precision_loss)]
    pub fn string_width(&self, text: &str, font_size: f32) -> f32 {
        let total_units: u32 = text
            .chars()
            .map(|c| {
                u32::from(
                    self.glyphs
                        .get(&c)
                        .map_or(self.notdef_width, |entry| entry.width),
                )
            })
            .sum();
        total_units as f32 * font_size / f32::from(self.units_per_em)
    }

    /// Convert text to a hex string of glyph IDs for content streams.
    /// Characters without a prepared glyph map to .notdef (0).
    fn to_hex_glyphs(&self, text: &str) -> String {
        text.chars().fold(String::new(), |mut acc, c| {
            let gid = self.glyphs.get(&c).map_or(0, |entry| entry.gid);
            let _ = write!(acc, "{gid:04X}");
            acc
        })
    }

    /// Scale a font-unit width to PDF's 1000-unit text space.
    fn scale_width(&self, width: u16) -> i64 {
        (i64::from(width) * 1000) / i64::from(self.units_per_em)
    }

    /// Create the full composite font object graph in the document.
    fn embed(&self, doc: &mut Document) -> ObjectId {
        let font_file_id = self.create_font_file(doc);
        let font_descriptor_id = self.create_font_descriptor(doc, font_file_id);
        let cid_font_id = self.create_cid_font(doc, font_descriptor_id);
        let to_unicode_id = create_to_unicode_cmap(doc);

        doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("BaseFont", Object::Name(b"OverlayFont".to_vec())),
            ("Encoding", Object::Name(b"Identity-H".to_vec())),
            (
                "DescendantFonts",
                Object::Array(vec![Object::Reference(cid_font_id)]),
            ),
            ("ToUnicode", Object::Reference(to_unicode_id)),
        ]))
    }

    /// FontFile2 stream containing the raw TrueType data.
    #[allow(clippy::cast_possible_wrap)] // Font size always fits in i64
    fn create_font_file(&self, doc: &mut Document) -> ObjectId {
        let mut dict = lopdf::Dictionary::new();
        dict.set("Length1", Object::Integer(self.data.len() as i64));

        let stream = Stream::new(dict, self.data.clone()).with_compression(true);
        doc.add_object(Object::Stream(stream))
    }

    /// FontDescriptor dictionary with the captured metrics.
    fn create_font_descriptor(&self, doc: &mut Document, font_file_id: ObjectId) -> ObjectId {
        let dict = lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"FontDescriptor".to_vec())),
            ("FontName", Object::Name(b"OverlayFont".to_vec())),
            ("Flags", Object::Integer(32)), // Nonsymbolic
            (
                "FontBBox",
                Object::Array(vec![
                    Object::Integer(i64::from(self.bbox[0])),
                    Object::Integer(i64::from(self.bbox[1])),
                    Object::Integer(i64::from(self.bbox[2])),
                    Object::Integer(i64::from(self.bbox[3])),
                ]),
            ),
            ("ItalicAngle", Object::Integer(0)),
            ("Ascent", Object::Integer(i64::from(self.ascent))),
            ("Descent", Object::Integer(i64::from(self.descent))),
            ("CapHeight", Object::Integer(i64::from(self.cap_height))),
            ("StemV", Object::Integer(90)),
            ("FontFile2", Object::Reference(font_file_id)),
        ]);

        doc.add_object(Object::Dictionary(dict))
    }

    /// CIDFont dictionary with per-glyph width information.
    fn create_cid_font(&self, doc: &mut Document, font_descriptor_id: ObjectId) -> ObjectId {
        let widths_array = self.build_widths_array();
        let default_width = self.scale_width(self.notdef_width);

        let dict = lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
            ("BaseFont", Object::Name(b"OverlayFont".to_vec())),
            (
                "CIDSystemInfo",
                Object::Dictionary(lopdf::Dictionary::from_iter([
                    (
                        "Registry",
                        Object::String(b"Adobe".to_vec(), lopdf::StringFormat::Literal),
                    ),
                    (
                        "Ordering",
                        Object::String(b"Identity".to_vec(), lopdf::StringFormat::Literal),
                    ),
                    ("Supplement", Object::Integer(0)),
                ])),
            ),
            ("FontDescriptor", Object::Reference(font_descriptor_id)),
            ("DW", Object::Integer(default_width)),
            ("W", Object::Array(widths_array)),
            ("CIDToGIDMap", Object::Name(b"Identity".to_vec())),
        ]);

        doc.add_object(Object::Dictionary(dict))
    }

    /// Build the W (widths) array for the CIDFont.
    /// Format: `gid [w1 w2 ...]` for consecutive glyph IDs starting at gid.
    fn build_widths_array(&self) -> Vec<Object> {
        let mut gid_widths: BTreeMap<u16, i64> = BTreeMap::new();
        for entry in self.glyphs.values() {
            gid_widths.insert(entry.gid, self.scale_width(entry.width));
        }

        let mut result = Vec::new();
        let mut iter = gid_widths.iter().peekable();

        while let Some((&first_gid, &first_width)) = iter.next() {
            let mut widths = vec![Object::Integer(first_width)];
            let mut expected_next = first_gid + 1;

            while let Some(&(&gid, &width)) = iter.peek() {
                if gid == expected_next {
                    widths.push(Object::Integer(width));
                    expected_next += 1;
                    iter.next();
                } else {
                    break;
                }
            }

            result.push(Object::Integer(i64::from(first_gid)));
            result.push(Object::Array(widths));
        }

        result
    }
}

/// Identity ToUnicode CMap for text extraction/copy-paste support.
fn create_to_unicode_cmap(doc: &mut Document) -> ObjectId {
    let cmap = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo <<
  /Registry (Adobe)
  /Ordering (UCS)
  /Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0000> <FFFF> <0000>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    let stream = Stream::new(lopdf::Dictionary::new(), cmap.to_vec());
    doc.add_object(Object::Stream(stream))
}

/// Register the font under [`FONT_RESOURCE`] in a page's Resources.
///
/// Handles inline Resources dictionaries, indirect references, and
/// inheritance from parent Pages nodes, all of which occur in real PDFs.
pub(crate) fn attach_to_page(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<()> {
    let mut resources = resolve_resources(doc, page_id)?;

    let mut fonts = if let Ok(font_obj) = resources.get(b"Font") {
        resolve_dict_object(doc, font_obj).unwrap_or_else(lopdf::Dictionary::new)
    } else {
        lopdf::Dictionary::new()
    };

    fonts.set(FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    // Write back as an inline dict so our addition sticks even when the
    // original Resources was shared through a reference.
    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

    if let Object::Dictionary(page_dict) = page {
        page_dict.set("Resources", Object::Dictionary(resources));
    }

    Ok(())
}

/// Resolve the Resources dictionary for a page.
fn resolve_resources(doc: &Document, page_id: ObjectId) -> Result<lopdf::Dictionary> {
    let page = doc
        .get_object(page_id)
        .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

    if let Object::Dictionary(page_dict) = page {
        if let Ok(res_obj) = page_dict.get(b"Resources")
            && let Some(dict) = resolve_dict_object(doc, res_obj)
        {
            return Ok(dict);
        }

        if let Ok(parent_obj) = page_dict.get(b"Parent")
            && let Some(dict) = resolve_inherited_resources(doc, parent_obj, 10)
        {
            return Ok(dict);
        }
    }

    Ok(lopdf::Dictionary::new())
}

/// Resolve an object that should be a Dictionary (handles References).
fn resolve_dict_object(doc: &Document, obj: &Object) -> Option<lopdf::Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(ref_id) => {
            if let Ok(Object::Dictionary(d)) = doc.get_object(*ref_id) {
                Some(d.clone())
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Walk up the Pages tree to find inherited Resources.
///
/// Depth-limited to survive malformed PDFs with circular Parent references.
fn resolve_inherited_resources(
    doc: &Document,
    parent_obj: &Object,
    depth: usize,
) -> Option<lopdf::Dictionary> {
    if depth == 0 {
        return None;
    }

    let parent_id = match parent_obj {
        Object::Reference(id) => *id,
        _ => return None,
    };

    let parent = match doc.get_object(parent_id) {
        Ok(Object::Dictionary(d)) => d,
        _ => return None,
    };

    if let Ok(res_obj) = parent.get(b"Resources")
        && let Some(dict) = resolve_dict_object(doc, res_obj)
    {
        return Some(dict);
    }

    if let Ok(grandparent_obj) = parent.get(b"Parent") {
        return resolve_inherited_resources(doc, grandparent_obj, depth - 1);
    }

    None
}
