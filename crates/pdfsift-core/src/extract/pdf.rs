//! Content-stream line extraction with lopdf, falling back to pdf-extract

use super::decode::{decode_simple, ToUnicodeMap};
use super::{is_bold_font, LineExtractor, StyledLine};
use crate::error::{Result, SiftError};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Default page height (US Letter) when a page carries no MediaBox
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// Maximum baseline drift, in user-space units, for spans to share a line
const BASELINE_TOLERANCE: f32 = 2.0;

/// Font size used for lines recovered by the plain-text fallback
const FALLBACK_FONT_SIZE: f32 = 12.0;

/// TJ kerning (thousandths of an em) wide enough to read as a word gap
const KERNING_SPACE_THRESHOLD: f32 = -250.0;

/// Form XObjects nested deeper than this are not read
const MAX_FORM_DEPTH: usize = 8;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands.iter()) {
        *slot = number(obj)?;
    }
    (operands.len() >= N).then_some(out)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up a page attribute, following the `Parent` chain for inherited keys
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        let parent = dict.get(b"Parent").ok()?;
        dict = resolve(doc, parent)?.as_dict().ok()?;
    }
    None
}

fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn page_top(doc: &Document, page_id: ObjectId) -> f32 {
    inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .and_then(|arr| arr.get(3).and_then(|o| resolve(doc, o)).and_then(number))
        .unwrap_or(DEFAULT_PAGE_HEIGHT)
}

/// Font resource as seen by the text walker
#[derive(Debug, Clone, Default)]
struct FontInfo {
    base_font: String,
    to_unicode: Option<ToUnicodeMap>,
    composite: bool,
}

impl FontInfo {
    fn decode(&self, bytes: &[u8]) -> String {
        if let Some(ref map) = self.to_unicode {
            map.decode(bytes)
        } else if self.composite {
            // CID codes without a ToUnicode map cannot be read
            String::new()
        } else {
            decode_simple(bytes)
        }
    }
}

fn load_font(doc: &Document, dict: &Dictionary) -> FontInfo {
    let base_font = dict
        .get(b"BaseFont")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .unwrap_or_default();
    let composite = dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .map(|n| n == b"Type0")
        .unwrap_or(false);
    let to_unicode = dict
        .get(b"ToUnicode")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_stream().ok())
        .map(stream_bytes)
        .and_then(|bytes| ToUnicodeMap::parse(&bytes));

    FontInfo {
        base_font,
        to_unicode,
        composite,
    }
}

fn load_fonts(doc: &Document, resources: Option<&Dictionary>) -> HashMap<Vec<u8>, FontInfo> {
    let mut fonts = HashMap::new();
    let Some(font_dict) = resources
        .and_then(|r| r.get(b"Font").ok())
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
    else {
        return fonts;
    };

    for (name, obj) in font_dict.iter() {
        if let Some(dict) = resolve(doc, obj).and_then(|o| o.as_dict().ok()) {
            fonts.insert(name.clone(), load_font(doc, dict));
        }
    }
    fonts
}

/// Resolve a named Form XObject from a resource dictionary
fn form_xobject<'a>(doc: &'a Document, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<&'a Stream> {
    let stream = resources?
        .get(b"XObject")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())?
        .get(name)
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_stream().ok())?;
    let is_form = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .map(|n| n == b"Form")
        .unwrap_or(false);
    is_form.then_some(stream)
}

/// A run of text in one font on one baseline
#[derive(Debug)]
struct Span {
    text: String,
    font_size: f32,
    font_name: String,
}

/// Accumulates spans and seals them into lines when the baseline moves
struct LineBuilder {
    page: u32,
    page_top: f32,
    baseline: Option<f32>,
    spans: Vec<Span>,
    lines: Vec<StyledLine>,
}

impl LineBuilder {
    fn new(page: u32, page_top: f32) -> Self {
        Self {
            page,
            page_top,
            baseline: None,
            spans: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Add shown text; `word_gap` marks text placed by a positioning move
    fn push(&mut self, text: &str, baseline: f32, font_size: f32, font_name: &str, word_gap: bool) {
        if text.is_empty() {
            return;
        }
        if let Some(current) = self.baseline {
            if (current - baseline).abs() > BASELINE_TOLERANCE {
                self.seal();
            }
        }
        if self.baseline.is_none() {
            self.baseline = Some(baseline);
        }

        match self.spans.last_mut() {
            Some(span) if span.font_name == font_name && span.font_size == font_size => {
                if word_gap && !span.text.ends_with(' ') && !text.starts_with(' ') {
                    span.text.push(' ');
                }
                span.text.push_str(text);
            }
            _ => self.spans.push(Span {
                text: text.to_string(),
                font_size,
                font_name: font_name.to_string(),
            }),
        }
    }

    fn seal(&mut self) {
        let Some(baseline) = self.baseline.take() else {
            return;
        };
        let spans = std::mem::take(&mut self.spans);

        let text = spans
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return;
        }

        let font_size = spans.iter().map(|s| s.font_size).fold(0.0f32, f32::max);
        let is_bold = spans.iter().any(|s| is_bold_font(&s.font_name));

        let mut counts: Vec<(&str, usize)> = Vec::new();
        for span in &spans {
            match counts.iter_mut().find(|(name, _)| *name == span.font_name) {
                Some(entry) => entry.1 += 1,
                None => counts.push((span.font_name.as_str(), 1)),
            }
        }
        // max_by_key keeps the last maximum; scan in reverse so ties go to the first font
        let font_name = counts
            .iter()
            .rev()
            .max_by_key(|(_, count)| *count)
            .map(|(name, _)| name.to_string())
            .unwrap_or_default();

        self.lines.push(StyledLine {
            text,
            page: self.page,
            font_size,
            font_name,
            is_bold,
            y_coord: self.page_top - baseline,
        });
    }

    fn finish(mut self) -> Vec<StyledLine> {
        self.seal();
        self.lines
    }
}

/// Text-object state tracked while walking a content stream
struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    line_matrix: Matrix,
    text_matrix: Matrix,
    leading: f32,
    font: Vec<u8>,
    font_size: f32,
    /// Text position was set since the last shown text
    moved: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            line_matrix: IDENTITY,
            text_matrix: IDENTITY,
            leading: 0.0,
            font: Vec::new(),
            font_size: 0.0,
            moved: false,
        }
    }
}

impl TextState {
    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
        self.moved = true;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    /// Baseline y and rendered font size in user space
    fn placement(&self) -> (f32, f32) {
        let m = multiply(&self.text_matrix, &self.ctm);
        let scale = (m[2] * m[2] + m[3] * m[3]).sqrt();
        let size = (self.font_size * scale * 100.0).round() / 100.0;
        (m[5], size)
    }
}

/// Extracts styled lines by interpreting page content streams
#[derive(Debug, Clone, Default)]
pub struct PdfLineExtractor;

impl PdfLineExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_document(&self, doc: &Document) -> Vec<StyledLine> {
        let mut lines = Vec::new();
        for (page_number, page_id) in doc.get_pages() {
            let page_index = page_number.saturating_sub(1);
            match self.extract_page(doc, page_index, page_id) {
                Ok(page_lines) => lines.extend(page_lines),
                Err(e) => tracing::warn!("Skipping unreadable page {}: {}", page_number, e),
            }
        }
        lines
    }

    fn extract_page(&self, doc: &Document, page: u32, page_id: ObjectId) -> Result<Vec<StyledLine>> {
        let content = doc.get_page_content(page_id)?;
        let operations = Content::decode(&content)?.operations;
        let resources = inherited(doc, page_id, b"Resources").and_then(|o| o.as_dict().ok());

        let mut builder = LineBuilder::new(page, page_top(doc, page_id));
        let mut state = TextState::default();
        self.walk(doc, &operations, resources, &mut state, &mut builder, 0);
        Ok(builder.finish())
    }

    fn walk<'a>(
        &self,
        doc: &'a Document,
        operations: &[Operation],
        resources: Option<&'a Dictionary>,
        state: &mut TextState,
        builder: &mut LineBuilder,
        depth: usize,
    ) {
        let fonts = load_fonts(doc, resources);
        let unknown_font = FontInfo::default();

        for op in operations {
            let operands = op.operands.as_slice();
            let mut shown: Option<String> = None;
            let font = fonts.get(&state.font).unwrap_or(&unknown_font);

            match op.operator.as_str() {
                "q" => state.ctm_stack.push(state.ctm),
                "Q" => {
                    if let Some(ctm) = state.ctm_stack.pop() {
                        state.ctm = ctm;
                    }
                }
                "cm" => {
                    if let Some(m) = numbers::<6>(operands) {
                        state.ctm = multiply(&m, &state.ctm);
                    }
                }
                "BT" => {
                    state.line_matrix = IDENTITY;
                    state.text_matrix = IDENTITY;
                    state.moved = true;
                }
                "Tf" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        state.font = name.to_vec();
                    }
                    if let Some(size) = operands.get(1).and_then(number) {
                        state.font_size = size;
                    }
                }
                "TL" => {
                    if let Some([leading]) = numbers::<1>(operands) {
                        state.leading = leading;
                    }
                }
                "Tm" => {
                    if let Some(m) = numbers::<6>(operands) {
                        state.line_matrix = m;
                        state.text_matrix = m;
                        state.moved = true;
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        state.translate(tx, ty);
                    }
                }
                "TD" => {
                    if let Some([tx, ty]) = numbers::<2>(operands) {
                        state.leading = -ty;
                        state.translate(tx, ty);
                    }
                }
                "T*" => state.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        shown = Some(font.decode(bytes));
                    }
                }
                "'" => {
                    state.next_line();
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        shown = Some(font.decode(bytes));
                    }
                }
                "\"" => {
                    state.next_line();
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        shown = Some(font.decode(bytes));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let mut text = String::new();
                        for item in items {
                            match item {
                                Object::String(bytes, _) => text.push_str(&font.decode(bytes)),
                                other => {
                                    let wide_gap = number(other)
                                        .map(|k| k < KERNING_SPACE_THRESHOLD)
                                        .unwrap_or(false);
                                    if wide_gap && !text.ends_with(' ') {
                                        text.push(' ');
                                    }
                                }
                            }
                        }
                        shown = Some(text);
                    }
                }
                "Do" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.walk_form(doc, name, resources, state, builder, depth);
                    }
                }
                _ => {}
            }

            if let Some(text) = shown {
                let (baseline, size) = state.placement();
                builder.push(&text, baseline, size, &font.base_font, state.moved);
                state.moved = false;
            }
        }
    }

    /// Walk a Form XObject's content with its matrix applied to the CTM
    fn walk_form<'a>(
        &self,
        doc: &'a Document,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        state: &TextState,
        builder: &mut LineBuilder,
        depth: usize,
    ) {
        if depth >= MAX_FORM_DEPTH {
            tracing::debug!(
                "Skipping form {} nested {} deep",
                String::from_utf8_lossy(name),
                depth
            );
            return;
        }
        let Some(form) = form_xobject(doc, resources, name) else {
            return;
        };

        let operations = match Content::decode(&stream_bytes(form)) {
            Ok(content) => content.operations,
            Err(e) => {
                tracing::warn!("Skipping unreadable form {}: {}", String::from_utf8_lossy(name), e);
                return;
            }
        };
        let matrix = form
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .and_then(|values| numbers::<6>(values))
            .unwrap_or(IDENTITY);
        // Forms without their own resources use the invoking ones
        let form_resources = form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .or(resources);

        let mut form_state = TextState {
            ctm: multiply(&matrix, &state.ctm),
            ..TextState::default()
        };
        self.walk(doc, &operations, form_resources, &mut form_state, builder, depth + 1);
    }

    /// Recover unstyled lines from pdf-extract's plain text output
    fn extract_plain(&self, bytes: &[u8]) -> Result<Vec<StyledLine>> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| SiftError::Pdf(format!("Failed to extract text from PDF: {}", e)))?;

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
            .map(|(i, l)| {
                StyledLine::new(l, 0, FALLBACK_FONT_SIZE, (i as f32 + 1.0) * FALLBACK_FONT_SIZE)
            })
            .collect())
    }
}

impl LineExtractor for PdfLineExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<StyledLine>> {
        match Document::load_mem(bytes) {
            Ok(doc) => {
                let lines = self.extract_document(&doc);
                if !lines.is_empty() {
                    tracing::debug!("Extracted {} styled lines", lines.len());
                    return Ok(lines);
                }
                tracing::warn!("No text found in content streams, falling back to plain text");
            }
            Err(e) => {
                tracing::warn!("lopdf could not load document ({}), falling back to plain text", e);
            }
        }
        self.extract_plain(bytes)
    }
}
