//! Content-stream interpretation: positioned glyphs and marked-content
//! spans for one page.
//!
//! Walks the text operators (`BT/ET`, `Tf`, `Td/TD/Tm/T*/TL`, `Tj/TJ/'/"`)
//! and the marked-content operators (`BMC/BDC/EMC`), producing an ordered
//! glyph list plus every identified span encountered, nested ones included.
//! Character advances are estimated from point size; no width tables are
//! consulted.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::{BBox, ContentSpan, Glyph};

use super::options::{ErrorMode, ParseOptions};
use super::resolve::resolve;

/// All content extracted from one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// 1-based page number.
    pub number: u32,
    /// Glyphs in original emission order (`Glyph::seq` matches the index).
    pub glyphs: Vec<Glyph>,
    /// Identified marked-content spans in scan order. Duplicate MCIDs are
    /// kept; the span index folds them with last-wins semantics.
    pub spans: Vec<ContentSpan>,
}

/// Extract glyphs and spans for every page of the document.
///
/// Pages are processed in parallel when `options.parallel` is set and
/// always returned in document page order, so downstream output does not
/// depend on indexing order. In lenient mode a failing page degrades to an
/// empty one.
pub fn extract_pages(doc: &LopdfDocument, options: &ParseOptions) -> Result<Vec<PageContent>> {
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();

    let run = |&(number, id): &(u32, ObjectId)| -> Result<PageContent> {
        match extract_page(doc, number, id) {
            Ok(content) => Ok(content),
            // Runaway reference chains fail the document even in lenient
            // mode.
            Err(e @ Error::ReferenceLoop(_)) => Err(e),
            Err(e) if options.error_mode == ErrorMode::Lenient => {
                log::warn!("failed to extract content from page {}: {}", number, e);
                Ok(PageContent {
                    number,
                    ..Default::default()
                })
            }
            Err(e) => Err(e),
        }
    };

    let mut contents = if options.parallel {
        pages.par_iter().map(run).collect::<Result<Vec<_>>>()?
    } else {
        pages.iter().map(run).collect::<Result<Vec<_>>>()?
    };
    contents.sort_by_key(|p| p.number);
    Ok(contents)
}

/// Extract glyphs and marked-content spans from a single page.
pub fn extract_page(
    doc: &LopdfDocument,
    number: u32,
    page_id: ObjectId,
) -> Result<PageContent> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let properties = page_properties(doc, page_id);
    let data = page_content_bytes(doc, page_id)?;
    let content = lopdf::content::Content::decode(&data)
        .map_err(|e| Error::PdfParse(format!("page {}: {}", number, e)))?;

    let mut interp = Interpreter::new(doc, number, &fonts, &properties);
    for op in &content.operations {
        interp.op(&op.operator, &op.operands)?;
    }
    Ok(interp.finish())
}

/// Raw (decompressed) content stream bytes for a page.
fn page_content_bytes(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()), // blank page
    };

    let stream_bytes = |s: &lopdf::Stream| -> Vec<u8> {
        s.decompressed_content()
            .unwrap_or_else(|_| s.content.clone())
    };

    match contents {
        Object::Reference(r) => {
            if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                return Ok(stream_bytes(s));
            }
            Err(Error::PdfParse("Invalid content stream".to_string()))
        }
        Object::Stream(s) => Ok(stream_bytes(s)),
        Object::Array(arr) => {
            let mut content = Vec::new();
            for obj in arr {
                if let Object::Reference(r) = obj {
                    if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                        content.extend_from_slice(&stream_bytes(s));
                        content.push(b' ');
                    }
                }
            }
            Ok(content)
        }
        _ => Err(Error::PdfParse("Invalid content stream".to_string())),
    }
}

/// Named property lists from the page resources (`/Properties`), used to
/// resolve `BDC` operands given by name instead of inline dictionary.
fn page_properties(doc: &LopdfDocument, page_id: ObjectId) -> BTreeMap<Vec<u8>, Dictionary> {
    let mut out = BTreeMap::new();
    let Ok(page_dict) = doc.get_dictionary(page_id) else {
        return out;
    };
    let Ok(res) = page_dict.get(b"Resources") else {
        return out;
    };
    let res_dict = match res {
        Object::Reference(r) => doc.get_dictionary(*r).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    };
    let Some(res_dict) = res_dict else { return out };
    let Ok(props) = res_dict.get(b"Properties") else {
        return out;
    };
    let props_dict = match props {
        Object::Reference(r) => doc.get_dictionary(*r).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    };
    let Some(props_dict) = props_dict else { return out };
    for (name, obj) in props_dict.iter() {
        let dict = match obj {
            Object::Reference(r) => doc.get_dictionary(*r).ok().cloned(),
            Object::Dictionary(d) => Some(d.clone()),
            _ => None,
        };
        if let Some(dict) = dict {
            out.insert(name.clone(), dict);
        }
    }
    out
}

/// One entry on the marked-content nesting stack.
struct MarkedState {
    /// Index into `spans` when the entry carries a registered MCID.
    span: Option<usize>,
    /// Artifact flag, inherited by everything nested inside.
    artifact: bool,
}

/// Text-cursor state for the simplified text matrix.
///
/// Tracks the line start separately so `Td`/`T*` move relative to the
/// current line, matching PDF text-object semantics for the common case of
/// untouched a/b/c/d components.
struct TextCursor {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    lx: f32,
    ly: f32,
    x: f32,
    y: f32,
    leading: f32,
}

impl Default for TextCursor {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            lx: 0.0,
            ly: 0.0,
            x: 0.0,
            y: 0.0,
            leading: 12.0,
        }
    }
}

impl TextCursor {
    fn set_matrix(&mut self, m: [f32; 6]) {
        let [a, b, c, d, e, f] = m;
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.lx = e;
        self.ly = f;
        self.x = e;
        self.y = f;
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.lx += tx * self.a + ty * self.c;
        self.ly += tx * self.b + ty * self.d;
        self.x = self.lx;
        self.y = self.ly;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.translate_line(0.0, -leading);
    }

    fn advance(&mut self, w: f32) {
        self.x += w * self.a;
        self.y += w * self.b;
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

struct Interpreter<'a> {
    doc: &'a LopdfDocument,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    properties: &'a BTreeMap<Vec<u8>, Dictionary>,
    number: u32,

    cursor: TextCursor,
    in_text: bool,
    font_name: Vec<u8>,
    base_font: String,
    font_size: f32,

    glyphs: Vec<Glyph>,
    spans: Vec<ContentSpan>,
    marked: Vec<MarkedState>,
}

impl<'a> Interpreter<'a> {
    fn new(
        doc: &'a LopdfDocument,
        number: u32,
        fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
        properties: &'a BTreeMap<Vec<u8>, Dictionary>,
    ) -> Self {
        Self {
            doc,
            fonts,
            properties,
            number,
            cursor: TextCursor::default(),
            in_text: false,
            font_name: Vec::new(),
            base_font: String::new(),
            font_size: 12.0,
            glyphs: Vec::new(),
            spans: Vec::new(),
            marked: Vec::new(),
        }
    }

    fn finish(self) -> PageContent {
        PageContent {
            number: self.number,
            glyphs: self.glyphs,
            spans: self.spans,
        }
    }

    fn op(&mut self, operator: &str, operands: &[Object]) -> Result<()> {
        match operator {
            "BT" => {
                self.in_text = true;
                self.cursor = TextCursor::default();
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Object::Name(name) = &operands[0] {
                        self.font_name = name.clone();
                        self.base_font = self.base_font_name(name);
                    }
                    self.font_size = get_number(&operands[1]).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(get_number) {
                    self.cursor.leading = l;
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    self.cursor.translate_line(tx, ty);
                }
            }
            "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    self.cursor.leading = -ty;
                    self.cursor.translate_line(tx, ty);
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let mut m = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                    for (slot, obj) in m.iter_mut().zip(operands) {
                        if let Some(n) = get_number(obj) {
                            *slot = n;
                        }
                    }
                    self.cursor.set_matrix(m);
                }
            }
            "T*" => self.cursor.next_line(),
            "Tj" => {
                if self.in_text {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let text = self.decode(bytes);
                        self.show_text(&text);
                    }
                }
            }
            "TJ" => {
                if self.in_text {
                    if let Some(Object::Array(arr)) = operands.first() {
                        for item in arr {
                            match item {
                                Object::String(bytes, _) => {
                                    let text = self.decode(bytes);
                                    self.show_text(&text);
                                }
                                Object::Integer(n) => {
                                    let adj = *n as f32;
                                    self.adjust(adj);
                                }
                                Object::Real(n) => self.adjust(*n),
                                _ => {}
                            }
                        }
                    }
                }
            }
            "'" | "\"" => {
                self.cursor.next_line();
                if self.in_text {
                    let text_idx = if operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = operands.get(text_idx) {
                        let text = self.decode(bytes);
                        self.show_text(&text);
                    }
                }
            }
            "BMC" => {
                let tag = operands.first().and_then(name_of);
                self.begin_marked(tag.as_deref(), None);
            }
            "BDC" => {
                let tag = operands.first().and_then(name_of);
                let props = self.operand_properties(operands.get(1))?;
                self.begin_marked(tag.as_deref(), props.as_ref());
            }
            "EMC" => {
                self.marked.pop();
            }
            _ => {}
        }
        Ok(())
    }

    /// Resolve a `BDC` properties operand: inline dictionary or a name
    /// looked up in the page resources.
    fn operand_properties(&self, operand: Option<&Object>) -> Result<Option<Dictionary>> {
        match operand {
            Some(Object::Dictionary(d)) => Ok(Some(d.clone())),
            Some(Object::Name(n)) => Ok(self.properties.get(n).cloned()),
            Some(obj @ Object::Reference(_)) => {
                match resolve(self.doc, obj)? {
                    Some(Object::Dictionary(d)) => Ok(Some(d.clone())),
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn begin_marked(&mut self, tag: Option<&str>, props: Option<&Dictionary>) {
        let inherited_artifact = self.marked.iter().any(|m| m.artifact);
        let artifact = inherited_artifact || tag == Some("Artifact");

        let mcid = props
            .and_then(|p| p.get(b"MCID").ok())
            .and_then(|o| o.as_i64().ok());

        // Every span with a non-negative identifier is registered,
        // regardless of nesting depth.
        let span = match mcid {
            Some(id) if id >= 0 => {
                let mut span = ContentSpan::new(id);
                span.artifact = artifact;
                span.actual_text = props
                    .and_then(|p| p.get(b"ActualText").ok())
                    .and_then(|o| match o {
                        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
                        _ => None,
                    });
                self.spans.push(span);
                Some(self.spans.len() - 1)
            }
            _ => None,
        };

        self.marked.push(MarkedState { span, artifact });
    }

    fn base_font_name(&self, resource_name: &[u8]) -> String {
        self.fonts
            .get(resource_name)
            .and_then(|f| f.get(b"BaseFont").ok())
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| String::from_utf8_lossy(resource_name).to_string())
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if let Some(font) = self.fonts.get(&self.font_name) {
            if let Ok(enc) = font.get_font_encoding(self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    /// TJ positioning adjustment, expressed in 1/1000 text-space units.
    fn adjust(&mut self, amount: f32) {
        let size = self.font_size * self.cursor.scale();
        self.cursor.advance(-amount / 1000.0 * size);
    }

    fn show_text(&mut self, text: &str) {
        let size = self.font_size * self.cursor.scale();
        for ch in text.chars() {
            let advance = char_advance(ch, size);
            if ch.is_whitespace() {
                self.cursor.advance(advance);
                continue;
            }

            let seq = self.glyphs.len() as u32;
            let glyph = Glyph {
                value: ch.to_string(),
                bbox: BBox::new(
                    self.cursor.x,
                    self.cursor.y - size * 0.2, // approximate descender
                    self.cursor.x + advance,
                    self.cursor.y + size * 0.8, // approximate ascender
                ),
                size,
                font: self.base_font.clone(),
                seq,
            };
            for state in &self.marked {
                if let Some(i) = state.span {
                    self.spans[i].glyphs.push(seq);
                }
            }
            self.glyphs.push(glyph);
            self.cursor.advance(advance);
        }
    }
}

/// Estimated advance width when no width table is available.
fn char_advance(ch: char, size: f32) -> f32 {
    if is_fullwidth(ch) {
        size
    } else {
        size * 0.5
    }
}

/// CJK ideographs and kana render at roughly full-em width.
fn is_fullwidth(ch: char) -> bool {
    let code = ch as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
        || (0xAC00..=0xD7AF).contains(&code)
}

fn name_of(obj: &Object) -> Option<String> {
    obj.as_name()
        .ok()
        .map(|n| String::from_utf8_lossy(n).to_string())
}

/// Helper to extract a number from a PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Simple text decoding fallback when no encoding is available.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM marker
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
