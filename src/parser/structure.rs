//! Section inference over a page stream.
//!
//! Parsing makes two passes over a [`PageSource`]. The first pass only
//! feeds the font histogram; the second classifies each page's runs and
//! hands them to the [`SectionBuilder`]. Pages are dropped as soon as they
//! are consumed, so at most one decoded page is alive at a time.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::{Document, ParsedDocument, Section, TextRun};

use super::backend::PageSource;
use super::heading::{FontClusterStrategy, FontStatistics, HeadingStrategy};
use super::options::{ErrorMode, ParseOptions};

/// Infers the section structure of a document.
#[derive(Debug, Clone)]
pub struct StructuralParser<S = FontClusterStrategy> {
    options: ParseOptions,
    strategy: S,
}

impl StructuralParser {
    /// Create a parser using font-size clustering.
    pub fn new(options: ParseOptions) -> Self {
        let strategy = FontClusterStrategy::from_options(&options);
        Self { options, strategy }
    }
}

impl Default for StructuralParser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl<S: HeadingStrategy> StructuralParser<S> {
    /// Create a parser with a custom heading strategy.
    pub fn with_strategy(options: ParseOptions, strategy: S) -> Self {
        Self { options, strategy }
    }

    /// Parse options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a page source into sections.
    pub fn parse<P: PageSource + ?Sized>(&self, source: &P) -> Result<ParsedDocument> {
        let id = source.id();
        let page_count = source.page_count();
        if page_count == 0 {
            return Err(Error::EmptyDocument);
        }

        let mut skipped = BTreeSet::new();
        let mut stats = FontStatistics::new();
        for number in 1..=page_count {
            match source.read_page(number) {
                Ok(page) => stats.observe(&page.runs),
                Err(e) => {
                    self.tolerate(id, number, e)?;
                    skipped.insert(number);
                }
            }
        }
        if stats.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let levels = self.strategy.levels(&stats);
        let mut builder = SectionBuilder::new(&self.options);
        for number in (1..=page_count).filter(|n| !skipped.contains(n)) {
            let page = match source.read_page(number) {
                Ok(page) => page,
                Err(e) => {
                    self.tolerate(id, number, e)?;
                    continue;
                }
            };
            let classes = self.strategy.classify(&levels, &page.runs);
            builder.push_page(number, page.runs, &classes);
        }

        let parsed = builder.finish(id, source.title(), page_count);
        log::debug!(
            "{}: {} page(s), {} section(s)",
            id,
            page_count,
            parsed.sections.len()
        );
        Ok(parsed)
    }

    /// Parse an in-memory document.
    pub fn parse_document(&self, doc: &Document) -> Result<ParsedDocument> {
        self.parse(doc)
    }

    fn tolerate(&self, id: &str, number: u32, err: Error) -> Result<()> {
        match self.options.error_mode {
            ErrorMode::Strict => Err(err),
            ErrorMode::Lenient => {
                log::warn!("{}: skipping page {}: {}", id, number, err);
                Ok(())
            }
        }
    }
}

/// One non-blank run as kept between passes.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    page: u32,
    level: Option<u8>,
    font_size: f32,
    /// Vertical distance from the previous line of the same page
    gap: Option<f32>,
    /// Starts a new paragraph
    breaks: bool,
}

impl Line {
    /// Whether this line continues a heading that wrapped onto it.
    ///
    /// Headings are spaced by their own size, not by the body leading.
    fn continues_heading(&self, previous: &Line) -> bool {
        let size = self.font_size.max(previous.font_size);
        self.level.is_some()
            && self.level == previous.level
            && self.page == previous.page
            && self
                .gap
                .is_some_and(|gap| gap > 0.0 && gap <= size * HEADING_LEADING_RATIO)
    }
}

/// Largest line pitch, relative to the font size, inside one heading.
const HEADING_LEADING_RATIO: f32 = 1.5;

/// A section before bodies and parents are resolved.
#[derive(Debug)]
struct Draft {
    heading: String,
    level: u8,
    page: u32,
    synthetic: bool,
    /// Line range owned by this section, heading lines included
    start: usize,
    end: usize,
    /// Leading lines of the range that form the heading
    heading_lines: usize,
}

/// Accumulates classified runs page by page and assembles sections.
#[derive(Debug)]
pub struct SectionBuilder {
    paragraph_gap_ratio: f32,
    max_heading_density: f32,
    lines: Vec<Line>,
}

impl SectionBuilder {
    /// Create an empty builder.
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            paragraph_gap_ratio: options.paragraph_gap_ratio,
            max_heading_density: options.max_heading_density,
            lines: Vec::new(),
        }
    }

    /// Append the runs of one page with their heading levels.
    pub fn push_page(&mut self, page: u32, runs: Vec<TextRun>, levels: &[Option<u8>]) {
        let leading = typical_leading(&runs);
        let mut prev_y: Option<f32> = None;

        for (run, level) in runs.into_iter().zip(levels.iter().copied()) {
            if run.is_blank() {
                continue;
            }
            let gap = prev_y.map(|y| y - run.y);
            let breaks = match gap {
                None => true,
                Some(gap) => {
                    gap <= 0.0 || leading.is_some_and(|l| gap > l * self.paragraph_gap_ratio)
                }
            };
            prev_y = Some(run.y);
            self.lines.push(Line {
                text: run.text.trim().to_string(),
                page,
                level,
                font_size: run.font_size,
                gap,
                breaks,
            });
        }
    }

    /// Number of runs accumulated so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Resolve sections. `title` is the metadata title, if any.
    pub fn finish(self, id: &str, title: Option<String>, page_count: u32) -> ParsedDocument {
        let heading_lines = self.lines.iter().filter(|l| l.level.is_some()).count();

        let drafts = if heading_lines == 0 {
            log::debug!("{}: no headings found, one section per page", id);
            page_drafts(&self.lines)
        } else {
            let mut drafts = heading_drafts(&self.lines, title.as_deref());
            let density = heading_lines as f32 / self.lines.len() as f32;
            if density > self.max_heading_density {
                log::debug!(
                    "{}: heading density {:.2} is ambiguous, flattening levels",
                    id,
                    density
                );
                drafts.iter_mut().for_each(|d| d.level = 1);
            }
            drafts
        };

        let sections = assemble(id, &self.lines, &drafts);
        let title = title
            .or_else(|| {
                sections
                    .iter()
                    .find(|s| !s.synthetic && s.level == 1)
                    .map(|s| s.heading.clone())
            })
            .unwrap_or_else(|| id.to_string());

        ParsedDocument {
            id: id.to_string(),
            title,
            page_count,
            sections,
        }
    }
}

/// Lower median of the positive line-to-line gaps on a page.
fn typical_leading(runs: &[TextRun]) -> Option<f32> {
    let ys: Vec<f32> = runs.iter().filter(|r| !r.is_blank()).map(|r| r.y).collect();
    let mut gaps: Vec<f32> = ys
        .windows(2)
        .map(|w| w[0] - w[1])
        .filter(|&g| g > 0.0)
        .collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_by(f32::total_cmp);
    Some(gaps[(gaps.len() - 1) / 2])
}

/// One synthetic section per page, titled by its first line.
fn page_drafts(lines: &[Line]) -> Vec<Draft> {
    let mut drafts: Vec<Draft> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        match drafts.last_mut() {
            Some(d) if d.page == line.page => d.end = i + 1,
            _ => drafts.push(Draft {
                heading: line.text.clone(),
                level: 1,
                page: line.page,
                synthetic: true,
                start: i,
                end: i + 1,
                heading_lines: 1,
            }),
        }
    }
    drafts
}

/// Sections anchored on classified headings.
fn heading_drafts(lines: &[Line], title: Option<&str>) -> Vec<Draft> {
    let mut drafts: Vec<Draft> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        if let Some(level) = line.level {
            // Wrapped heading lines
            let mut j = i + 1;
            while j < lines.len() && lines[j].continues_heading(&lines[j - 1]) {
                j += 1;
            }
            let heading = lines[i..j]
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            drafts.push(Draft {
                heading,
                level,
                page: line.page,
                synthetic: false,
                start: i,
                end: j,
                heading_lines: j - i,
            });
            i = j;
            continue;
        }

        match drafts.last_mut() {
            Some(d) => d.end = i + 1,
            None => {
                // Content before the first heading
                let (heading, heading_lines) = match title {
                    Some(t) => (t.to_string(), 0),
                    None => (line.text.clone(), 1),
                };
                drafts.push(Draft {
                    heading,
                    level: 1,
                    page: line.page,
                    synthetic: true,
                    start: i,
                    end: i + 1,
                    heading_lines,
                });
            }
        }
        i += 1;
    }
    drafts
}

/// Paragraphs of a line slice, lines joined by newlines.
fn paragraphs(lines: &[Line]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        match out.last_mut() {
            Some(p) if i > 0 && !line.breaks => {
                p.push('\n');
                p.push_str(&line.text);
            }
            _ => out.push(line.text.clone()),
        }
    }
    out
}

fn assemble(id: &str, lines: &[Line], drafts: &[Draft]) -> Vec<Section> {
    let own: Vec<Vec<String>> = drafts
        .iter()
        .map(|d| paragraphs(&lines[d.start + d.heading_lines..d.end]))
        .collect();

    let mut stack: Vec<usize> = Vec::new();
    let mut sections = Vec::with_capacity(drafts.len());

    for (k, draft) in drafts.iter().enumerate() {
        let parent = if draft.synthetic {
            None
        } else {
            while stack
                .last()
                .is_some_and(|&p| drafts[p].level >= draft.level)
            {
                stack.pop();
            }
            let parent = stack.last().copied();
            stack.push(k);
            parent
        };

        let mut body = own[k].clone();
        if !draft.synthetic {
            for (m, nested) in drafts.iter().enumerate().skip(k + 1) {
                if nested.synthetic || nested.level <= draft.level {
                    break;
                }
                body.push(nested.heading.clone());
                body.extend(own[m].iter().cloned());
            }
        }

        let end_page = lines[draft.start..draft.end]
            .last()
            .map_or(draft.page, |l| l.page);

        sections.push(Section {
            document_id: id.to_string(),
            index: k,
            heading: draft.heading.clone(),
            level: draft.level,
            page: draft.page,
            end_page,
            body: body.join("\n\n"),
            parent,
            runs: draft.start..draft.end,
            synthetic: draft.synthetic,
        });
    }
    sections
}
