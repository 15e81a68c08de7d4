//! Layout analysis: content stream → positioned spans → lines.
//!
//! Each visual line becomes one [`TextRun`] carrying the dominant font size
//! and style of its spans, which is all the heading inference downstream
//! looks at.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::TextRun;

/// A positioned fragment of text as drawn by a single show-text operator.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated advance width
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Base font name
    pub font_name: String,
}

impl TextSpan {
    /// Create a span, estimating its width from the character count.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let width = text.chars().count() as f32 * font_size * 0.5;
        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
        }
    }

    fn center(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Whether the span lies within a plausible page extent.
    fn is_on_page(&self) -> bool {
        let right = self.x + self.width;
        self.x.is_finite()
            && right.is_finite()
            && self.x.abs() <= MAX_PAGE_COORDINATE
            && right.abs() <= MAX_PAGE_COORDINATE
    }
}

/// Largest PDF page dimension in user-space units.
const MAX_PAGE_COORDINATE: f32 = 14_400.0;

/// Decode one page of `doc` into spans.
pub fn extract_page_spans(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<TextSpan>> {
    let fonts = doc
        .get_page_fonts(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;
    let content = page_content(doc, page_id)?;
    interpret_content(doc, &content, &fonts)
}

/// Concatenate the (decompressed) content streams of a page.
fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    // A page without /Contents is blank, not broken.
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()),
    };

    let refs: Vec<ObjectId> = match contents {
        Object::Reference(r) => vec![*r],
        Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
        _ => return Err(Error::PdfParse("Invalid content stream".to_string())),
    };

    let mut content = Vec::new();
    for r in refs {
        match doc.get_object(r) {
            Ok(Object::Stream(s)) => {
                let data = s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone());
                content.extend_from_slice(&data);
                content.push(b' ');
            }
            _ => return Err(Error::PdfParse(format!("Missing content stream {:?}", r))),
        }
    }
    Ok(content)
}

/// Text positioning state between BT and ET.
#[derive(Debug, Clone)]
struct TextState {
    matrix: [f32; 6],
    line_start: [f32; 6],
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        Self {
            matrix: identity,
            line_start: identity,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn set_matrix(&mut self, m: [f32; 6]) {
        self.matrix = m;
        self.line_start = m;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_start;
        let moved = [
            m[0],
            m[1],
            m[2],
            m[3],
            m[4] + tx * m[0] + ty * m[2],
            m[5] + tx * m[1] + ty * m[3],
        ];
        self.set_matrix(moved);
    }

    fn next_line(&mut self, default_leading: f32) {
        let leading = if self.leading > 0.0 {
            self.leading
        } else {
            default_leading
        };
        self.move_line(0.0, -leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.matrix[4], self.matrix[5])
    }

    fn scale(&self) -> f32 {
        let s = (self.matrix[2] * self.matrix[2] + self.matrix[3] * self.matrix[3]).sqrt();
        if s > 0.0 {
            s
        } else {
            1.0
        }
    }
}

/// Interpret content-stream operators into spans.
fn interpret_content(
    doc: &LopdfDocument,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
) -> Result<Vec<TextSpan>> {
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut state = TextState::default();
    let mut font_key: Vec<u8> = Vec::new();
    let mut font_name = String::new();
    let mut font_size: f32 = 12.0;
    let mut in_text = false;

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                in_text = true;
                state = TextState {
                    leading: state.leading,
                    ..TextState::default()
                };
            }
            "ET" => in_text = false,
            "Tf" if operands.len() >= 2 => {
                if let Object::Name(key) = &operands[0] {
                    font_key = key.clone();
                    font_name = fonts
                        .get(key)
                        .and_then(|f| f.get(b"BaseFont").ok())
                        .and_then(|o| o.as_name().ok())
                        .map(|n| String::from_utf8_lossy(n).to_string())
                        .unwrap_or_else(|| String::from_utf8_lossy(key).to_string());
                }
                font_size = number(&operands[1]).unwrap_or(12.0);
            }
            "TL" if !operands.is_empty() => {
                state.leading = number(&operands[0]).unwrap_or(0.0);
            }
            "Td" | "TD" if operands.len() >= 2 => {
                let tx = number(&operands[0]).unwrap_or(0.0);
                let ty = number(&operands[1]).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" if operands.len() >= 6 => {
                let mut m = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                for (slot, operand) in m.iter_mut().zip(operands.iter()) {
                    *slot = number(operand).unwrap_or(*slot);
                }
                state.set_matrix(m);
            }
            "T*" => state.next_line(font_size * 1.2),
            "Tj" | "TJ" | "'" | "\"" if in_text => {
                if op.operator == "'" || op.operator == "\"" {
                    state.next_line(font_size * 1.2);
                }
                let shown = match op.operator.as_str() {
                    "\"" => operands.get(2),
                    _ => operands.first(),
                };
                let text = shown
                    .map(|o| show_text(doc, fonts, &font_key, o))
                    .unwrap_or_default();
                if !text.trim().is_empty() {
                    let (x, y) = state.position();
                    spans.push(TextSpan::new(
                        text,
                        x,
                        y,
                        font_size * state.scale(),
                        font_name.clone(),
                    ));
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

/// Decode the operand of a show-text operator.
///
/// TJ arrays interleave strings with kerning adjustments in thousandths of
/// an em; an adjustment wider than a fifth of an em is treated as a word gap.
fn show_text(
    doc: &LopdfDocument,
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    font_key: &[u8],
    operand: &Object,
) -> String {
    const WORD_GAP: f32 = 200.0;

    let encoding = fonts
        .get(font_key)
        .and_then(|f| f.get_font_encoding(doc).ok());
    let decode = |bytes: &[u8]| match encoding {
        Some(ref enc) => LopdfDocument::decode_text(enc, bytes).unwrap_or_default(),
        None => super::backend::decode_text_simple(bytes),
    };

    match operand {
        Object::String(bytes, _) => decode(bytes),
        Object::Array(items) => {
            let mut combined = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => combined.push_str(&decode(bytes)),
                    other => {
                        let gap = number(other).map(|n| -n).unwrap_or(0.0);
                        if gap > WORD_GAP
                            && !combined.is_empty()
                            && !combined.ends_with(char::is_whitespace)
                            && !combined.chars().last().is_some_and(is_spaceless_script_char)
                        {
                            combined.push(' ');
                        }
                    }
                }
            }
            combined
        }
        _ => String::new(),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Scripts written without spaces between words.
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F // CJK symbols and punctuation
        | 0x3040..=0x30FF // Hiragana, Katakana
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0x20000..=0x2EBEF)
}

/// A vertical text column on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// Left boundary X coordinate
    pub left: f32,
    /// Right boundary X coordinate
    pub right: f32,
}

impl Column {
    fn holds(&self, span: &TextSpan) -> bool {
        let c = span.center();
        c >= self.left && c < self.right
    }
}

/// Find a two-column split by looking for an empty vertical gutter in the
/// middle of the page. Returns a single column when none qualifies.
pub fn detect_columns(spans: &[TextSpan]) -> Vec<Column> {
    const SLICE: f32 = 3.0;
    const MIN_GUTTER: f32 = 12.0;
    const MIN_COLUMN: f32 = 80.0;

    let whole = vec![Column {
        left: f32::MIN,
        right: f32::MAX,
    }];

    // Text placed far off the page does not take part in the split.
    let on_page: Vec<&TextSpan> = spans.iter().filter(|s| s.is_on_page()).collect();
    let min_x = on_page.iter().map(|s| s.x).fold(f32::MAX, f32::min);
    let max_x = on_page.iter().map(|s| s.x + s.width).fold(f32::MIN, f32::max);
    if on_page.len() < 4 || !(max_x - min_x).is_finite() || max_x - min_x < 250.0 {
        return whole;
    }

    let slices = ((max_x - min_x) / SLICE) as usize + 1;
    let mut occupied = vec![false; slices];
    for span in &on_page {
        let start = ((span.x - min_x) / SLICE) as usize;
        let end = (((span.x + span.width) - min_x) / SLICE) as usize;
        for slot in occupied.iter_mut().take(end.min(slices - 1) + 1).skip(start) {
            *slot = true;
        }
    }

    // Widest empty stretch within the middle 70% of the text extent.
    let (lo, hi) = (slices * 15 / 100, (slices * 85 / 100).min(slices - 1));
    let mut best: Option<(usize, usize)> = None;
    let mut run_start = None;
    for i in lo..=hi + 1 {
        let empty = i <= hi && !occupied[i];
        match (empty, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if best.map_or(true, |(_, len)| i - start > len) {
                    best = Some((start, i - start));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    let Some((start, len)) = best else {
        return whole;
    };
    if len as f32 * SLICE < MIN_GUTTER {
        return whole;
    }

    let gutter = min_x + (start as f32 + len as f32 / 2.0) * SLICE;
    if gutter - min_x < MIN_COLUMN || max_x - gutter < MIN_COLUMN {
        return whole;
    }

    let left_count = on_page.iter().filter(|s| s.center() < gutter).count();
    let right_count = on_page.len() - left_count;
    let min_spans = (on_page.len() / 10).max(2);
    if left_count < min_spans || right_count < min_spans {
        return whole;
    }

    log::debug!("two-column layout, gutter at x={:.1}", gutter);
    vec![
        Column {
            left: f32::MIN,
            right: gutter,
        },
        Column {
            left: gutter,
            right: f32::MAX,
        },
    ]
}

/// Group spans into lines and convert each line into a [`TextRun`].
///
/// Columns are read one after another, left to right; within a column
/// lines run top to bottom.
pub fn spans_to_runs(spans: Vec<TextSpan>) -> Vec<TextRun> {
    if spans.is_empty() {
        return Vec::new();
    }

    let columns = detect_columns(&spans);
    let mut per_column: Vec<Vec<TextSpan>> = vec![Vec::new(); columns.len()];
    for span in spans {
        let idx = columns.iter().position(|c| c.holds(&span)).unwrap_or(0);
        per_column[idx].push(span);
    }

    per_column
        .into_iter()
        .flat_map(group_lines)
        .map(line_to_run)
        .collect()
}

fn group_lines(mut spans: Vec<TextSpan>) -> Vec<Vec<TextSpan>> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    for span in spans {
        let tolerance = span.font_size * 0.3;
        match lines.last_mut() {
            Some(line) if (line[0].y - span.y).abs() <= tolerance => line.push(span),
            _ => lines.push(vec![span]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }
    lines
}

fn line_to_run(spans: Vec<TextSpan>) -> TextRun {
    let mut text = String::new();
    for (i, span) in spans.iter().enumerate() {
        if i > 0 {
            let prev = &spans[i - 1];
            let gap = span.x - (prev.x + prev.width);
            let spaced = text.ends_with(char::is_whitespace) || span.text.starts_with(' ');
            let cjk = prev.text.chars().last().is_some_and(is_spaceless_script_char)
                && span.text.chars().next().is_some_and(is_spaceless_script_char);
            if !spaced && !cjk && gap > span.font_size * 0.1 {
                text.push(' ');
            }
        }
        text.push_str(&span.text);
    }

    // Dominant size and face, weighted by character count.
    let mut weight_by_size: BTreeMap<i32, usize> = BTreeMap::new();
    let mut bold_chars = 0;
    let mut italic_chars = 0;
    let mut total = 0;
    for span in &spans {
        let n = span.text.chars().count();
        let styled = TextRun::new("", span.font_size, span.y).with_font(span.font_name.as_str());
        *weight_by_size
            .entry((span.font_size * 10.0).round() as i32)
            .or_insert(0) += n;
        if styled.bold {
            bold_chars += n;
        }
        if styled.italic {
            italic_chars += n;
        }
        total += n;
    }
    let dominant = weight_by_size
        .iter()
        .max_by_key(|(size, count)| (**count, **size))
        .map(|(size, _)| *size as f32 / 10.0)
        .unwrap_or(spans[0].font_size);
    let font_name = spans
        .iter()
        .max_by_key(|s| s.text.chars().count())
        .map(|s| s.font_name.clone())
        .unwrap_or_default();

    TextRun {
        text: text.trim().to_string(),
        font_size: dominant,
        bold: total > 0 && bold_chars * 2 > total,
        italic: total > 0 && italic_chars * 2 > total,
        font_name,
        x: spans[0].x,
        y: spans[0].y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32, size: f32, font: &str) -> TextSpan {
        TextSpan::new(text.to_string(), x, y, size, font.to_string())
    }

    #[test]
    fn test_spans_merge_into_lines() {
        let spans = vec![
            span("World", 140.0, 700.0, 12.0, "Helvetica"),
            span("Hello", 100.0, 700.5, 12.0, "Helvetica"),
            span("Next line", 100.0, 680.0, 12.0, "Helvetica"),
        ];
        let runs = spans_to_runs(spans);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello World");
        assert_eq!(runs[1].text, "Next line");
    }

    #[test]
    fn test_line_takes_dominant_style() {
        let spans = vec![
            span("1.", 72.0, 700.0, 12.0, "Helvetica"),
            span("Methodology overview", 90.0, 700.0, 16.0, "Helvetica-Bold"),
        ];
        let runs = spans_to_runs(spans);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].font_size, 16.0);
        assert!(runs[0].bold);
    }

    #[test]
    fn test_two_columns_read_in_order() {
        let mut spans = Vec::new();
        for i in 0..6 {
            let y = 700.0 - i as f32 * 14.0;
            spans.push(span("left column text", 50.0, y, 10.0, "Times"));
            spans.push(span("right column text", 330.0, y, 10.0, "Times"));
        }
        let columns = detect_columns(&spans);
        assert_eq!(columns.len(), 2);

        let runs = spans_to_runs(spans);
        assert_eq!(runs.len(), 12);
        assert!(runs[..6].iter().all(|r| r.text.starts_with("left")));
        assert!(runs[6..].iter().all(|r| r.text.starts_with("right")));
    }

    #[test]
    fn test_off_page_span_ignored_by_columns() {
        let mut spans: Vec<TextSpan> = (0..4)
            .map(|i| {
                let y = 700.0 - 14.0 * i as f32;
                span(&format!("line {}", i), 72.0, y, 10.0, "Helvetica")
            })
            .collect();
        spans.push(span("hidden", 1e30, 600.0, 10.0, "Helvetica"));
        spans.push(span("far", 1e9, 580.0, 10.0, "Helvetica"));
        spans.push(span("broken", f32::NAN, 560.0, 10.0, "Helvetica"));

        assert_eq!(detect_columns(&spans).len(), 1);
        let runs = spans_to_runs(spans);
        assert_eq!(runs.len(), 7);
        assert_eq!(runs[0].text, "line 0");
    }

    #[test]
    fn test_narrow_page_single_column() {
        let spans = vec![
            span("a", 10.0, 700.0, 10.0, "Times"),
            span("b", 60.0, 690.0, 10.0, "Times"),
        ];
        assert_eq!(detect_columns(&spans).len(), 1);
    }

    #[test]
    fn test_text_state_moves() {
        let mut state = TextState::default();
        state.move_line(72.0, 700.0);
        state.leading = 14.0;
        state.next_line(12.0);
        assert_eq!(state.position(), (72.0, 686.0));
    }
}
