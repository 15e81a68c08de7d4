//! Heading inference from font statistics.
//!
//! Heading levels are relative to the document: the body size is the most
//! common size (by character count), and only sizes noticeably larger than
//! it can carry a heading. Those candidate sizes are grouped into at most
//! `max_levels` clusters, largest first.

use std::collections::BTreeMap;

use crate::model::TextRun;
use crate::text::is_marker_only;

use super::options::ParseOptions;

/// Font sizes are bucketed to half points.
fn bucket(size: f32) -> u32 {
    (size * 2.0).round().max(0.0) as u32
}

fn bucket_size(bucket: u32) -> f32 {
    bucket as f32 / 2.0
}

/// Character-weighted histogram of run font sizes over a whole document.
#[derive(Debug, Clone, Default)]
pub struct FontStatistics {
    histogram: BTreeMap<u32, usize>,
    runs: usize,
}

impl FontStatistics {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the runs of one page.
    pub fn observe(&mut self, runs: &[TextRun]) {
        for run in runs.iter().filter(|r| !r.is_blank()) {
            *self.histogram.entry(bucket(run.font_size)).or_default() += run.char_len();
            self.runs += 1;
        }
    }

    /// Most common size by character count. Ties go to the smaller size.
    pub fn body_size(&self) -> Option<f32> {
        let mut best: Option<(u32, usize)> = None;
        for (&b, &chars) in &self.histogram {
            if best.map_or(true, |(_, c)| chars > c) {
                best = Some((b, chars));
            }
        }
        best.map(|(b, _)| bucket_size(b))
    }

    /// Observed sizes with their character counts, ascending.
    pub fn sizes(&self) -> impl Iterator<Item = (f32, usize)> + '_ {
        self.histogram.iter().map(|(&b, &c)| (bucket_size(b), c))
    }

    /// Number of non-blank runs observed.
    pub fn run_count(&self) -> usize {
        self.runs
    }

    /// Total characters observed.
    pub fn total_chars(&self) -> usize {
        self.histogram.values().sum()
    }

    /// Whether no text has been observed.
    pub fn is_empty(&self) -> bool {
        self.total_chars() == 0
    }
}

/// A contiguous range of font sizes mapped to one heading level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeCluster {
    pub min: f32,
    pub max: f32,
    pub level: u8,
}

impl SizeCluster {
    fn contains(&self, size: f32) -> bool {
        let size = bucket_size(bucket(size));
        size >= self.min && size <= self.max
    }
}

/// Heading size clusters of a document, level 1 first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeLevels {
    pub body_size: f32,
    pub clusters: Vec<SizeCluster>,
}

impl SizeLevels {
    /// Heading level for a font size, if it falls in a cluster.
    pub fn level_for(&self, size: f32) -> Option<u8> {
        self.clusters
            .iter()
            .find(|c| c.contains(size))
            .map(|c| c.level)
    }

    /// Whether no heading size was found.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Decides which runs are headings and at which level.
pub trait HeadingStrategy: Send + Sync {
    /// Derive heading size levels from whole-document statistics.
    fn levels(&self, stats: &FontStatistics) -> SizeLevels;

    /// Classify the runs of one page. The result has one entry per run.
    fn classify(&self, levels: &SizeLevels, runs: &[TextRun]) -> Vec<Option<u8>>;
}

/// Default strategy: relative font-size clustering plus isolation and
/// weight cues.
#[derive(Debug, Clone)]
pub struct FontClusterStrategy {
    max_levels: u8,
    min_heading_ratio: f32,
    cluster_gap_ratio: f32,
    max_heading_words: usize,
    max_heading_chars: usize,
}

/// Lines in a same-size block this long are paragraph text.
const PARAGRAPH_BLOCK_LINES: usize = 3;

impl FontClusterStrategy {
    /// Build a strategy from parse options.
    pub fn from_options(options: &ParseOptions) -> Self {
        Self {
            max_levels: options.max_levels.max(1),
            min_heading_ratio: options.min_heading_ratio,
            cluster_gap_ratio: options.cluster_gap_ratio,
            max_heading_words: options.max_heading_words,
            max_heading_chars: options.max_heading_chars,
        }
    }

    fn is_short(&self, run: &TextRun) -> bool {
        run.word_count() <= self.max_heading_words && run.char_len() <= self.max_heading_chars
    }
}

impl Default for FontClusterStrategy {
    fn default() -> Self {
        Self::from_options(&ParseOptions::default())
    }
}

impl HeadingStrategy for FontClusterStrategy {
    fn levels(&self, stats: &FontStatistics) -> SizeLevels {
        let Some(body) = stats.body_size() else {
            return SizeLevels::default();
        };
        let threshold = body * self.min_heading_ratio;
        let gap = body * self.cluster_gap_ratio;

        let mut candidates: Vec<f32> = stats
            .sizes()
            .map(|(size, _)| size)
            .filter(|&size| size >= threshold)
            .collect();
        candidates.sort_by(|a, b| b.total_cmp(a));

        let mut clusters: Vec<SizeCluster> = Vec::new();
        for size in candidates {
            let extends_last = clusters
                .last()
                .is_some_and(|last| last.min - size <= gap || last.level >= self.max_levels);
            if let (true, Some(last)) = (extends_last, clusters.last_mut()) {
                last.min = size;
                continue;
            }
            let level = clusters.len() as u8 + 1;
            clusters.push(SizeCluster {
                min: size,
                max: size,
                level,
            });
        }

        log::debug!(
            "body size {:.1}pt, {} heading level(s): {:?}",
            body,
            clusters.len(),
            clusters
                .iter()
                .map(|c| (c.min, c.max))
                .collect::<Vec<_>>()
        );
        SizeLevels {
            body_size: body,
            clusters,
        }
    }

    fn classify(&self, levels: &SizeLevels, runs: &[TextRun]) -> Vec<Option<u8>> {
        if levels.is_empty() {
            return vec![None; runs.len()];
        }
        let in_block = same_size_blocks(runs);

        runs.iter()
            .zip(in_block)
            .map(|(run, in_block)| {
                if run.is_blank() || is_marker_only(&run.text) {
                    return None;
                }
                let level = levels.level_for(run.font_size)?;
                let isolated = self.is_short(run) && !in_block;
                (isolated || run.bold).then_some(level)
            })
            .collect()
    }
}

/// For each run, whether it belongs to a run of at least
/// `PARAGRAPH_BLOCK_LINES` consecutive lines with the same size.
fn same_size_blocks(runs: &[TextRun]) -> Vec<bool> {
    let mut flags = vec![false; runs.len()];
    let mut start = 0;
    while start < runs.len() {
        let size = bucket(runs[start].font_size);
        let mut end = start + 1;
        while end < runs.len() && bucket(runs[end].font_size) == size {
            end += 1;
        }
        if end - start >= PARAGRAPH_BLOCK_LINES {
            flags[start..end].iter_mut().for_each(|f| *f = true);
        }
        start = end;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_for(runs: &[TextRun]) -> FontStatistics {
        let mut stats = FontStatistics::new();
        stats.observe(runs);
        stats
    }

    fn body(text: &str) -> TextRun {
        TextRun::new(text, 10.0, 0.0)
    }

    #[test]
    fn test_body_size_is_character_mode() {
        let stats = stats_for(&[
            TextRun::new("Short big", 24.0, 0.0),
            body("A much longer line of ordinary body text."),
            TextRun::new("10.2 rounds to 10", 10.2, 0.0),
        ]);
        assert_eq!(stats.body_size(), Some(10.0));
        assert_eq!(stats.run_count(), 3);
    }

    #[test]
    fn test_empty_statistics() {
        let stats = stats_for(&[body("   ")]);
        assert!(stats.is_empty());
        assert_eq!(stats.body_size(), None);
        assert!(FontClusterStrategy::default().levels(&stats).is_empty());
    }

    #[test]
    fn test_levels_are_relative_to_body() {
        // Body at 20pt: 18pt text is smaller than body, never a heading.
        let stats = stats_for(&[
            TextRun::new("Title", 30.0, 0.0),
            TextRun::new("Small print", 18.0, 0.0),
            TextRun::new("Body text that dominates the page by length", 20.0, 0.0),
        ]);
        let levels = FontClusterStrategy::default().levels(&stats);
        assert_eq!(levels.body_size, 20.0);
        assert_eq!(levels.level_for(30.0), Some(1));
        assert_eq!(levels.level_for(18.0), None);
        assert_eq!(levels.level_for(20.0), None);
    }

    #[test]
    fn test_close_sizes_share_a_cluster() {
        let stats = stats_for(&[
            TextRun::new("A", 18.0, 0.0),
            TextRun::new("B", 17.5, 0.0),
            TextRun::new("C", 14.0, 0.0),
            body("Plenty of body text to make ten points the mode"),
        ]);
        let levels = FontClusterStrategy::default().levels(&stats);
        assert_eq!(levels.level_for(18.0), Some(1));
        assert_eq!(levels.level_for(17.5), Some(1));
        assert_eq!(levels.level_for(14.0), Some(2));
    }

    #[test]
    fn test_extra_clusters_fold_into_last_level() {
        let stats = stats_for(&[
            TextRun::new("A", 30.0, 0.0),
            TextRun::new("B", 24.0, 0.0),
            TextRun::new("C", 18.0, 0.0),
            TextRun::new("D", 14.0, 0.0),
            body("Plenty of body text to make ten points the mode"),
        ]);
        let levels = FontClusterStrategy::default().levels(&stats);
        assert_eq!(levels.clusters.len(), 3);
        assert_eq!(levels.level_for(18.0), Some(3));
        assert_eq!(levels.level_for(14.0), Some(3));
    }

    #[test]
    fn test_classify_isolation_and_bold() {
        let levels = SizeLevels {
            body_size: 10.0,
            clusters: vec![SizeCluster {
                min: 14.0,
                max: 14.0,
                level: 1,
            }],
        };
        let long = "word ".repeat(20);
        let runs = vec![
            TextRun::new("Introduction", 14.0, 0.0),
            body("plain body"),
            TextRun::new(long.clone(), 14.0, 0.0),
            TextRun::bold(long, 14.0, 0.0),
            TextRun::new("3.1", 14.0, 0.0),
        ];
        let classes = FontClusterStrategy::default().classify(&levels, &runs);
        assert_eq!(classes, vec![Some(1), None, None, Some(1), None]);
    }

    #[test]
    fn test_classify_rejects_large_paragraph_blocks() {
        let levels = SizeLevels {
            body_size: 10.0,
            clusters: vec![SizeCluster {
                min: 14.0,
                max: 14.0,
                level: 1,
            }],
        };
        let runs = vec![
            TextRun::new("Pull quote line one", 14.0, 0.0),
            TextRun::new("pull quote line two", 14.0, 0.0),
            TextRun::new("pull quote line three", 14.0, 0.0),
        ];
        let classes = FontClusterStrategy::default().classify(&levels, &runs);
        assert!(classes.iter().all(Option::is_none));
    }
}
