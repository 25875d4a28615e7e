//! Section-aware line diffing.
//!
//! The diff walk keeps a section cursor: unchanged and added headings move it,
//! removed lines never do, and every changed line is attributed to the section
//! the cursor points at when the line is emitted.

mod classifier;

use similar::{Algorithm, ChangeTag, TextDiff};

use crate::types::change::{ChangeRecord, GENERAL_SECTION};

pub use classifier::{LineClassifier, MarkdownClassifier};

/// Computes classified line changes between a baseline and an edited copy
pub struct DiffEngine {
    classifier: Box<dyn LineClassifier>,
}

impl std::fmt::Debug for DiffEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffEngine").finish_non_exhaustive()
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffEngine {
    /// Engine using the Markdown classifier
    pub fn new() -> Self {
        Self::with_classifier(Box::new(MarkdownClassifier::new()))
    }

    pub fn with_classifier(classifier: Box<dyn LineClassifier>) -> Self {
        Self { classifier }
    }

    /// Diff `original` against `edited`, one record per added or removed line.
    ///
    /// `line_number` is the count of unchanged lines seen before the change.
    /// It orders records stably but is not a position in either document.
    pub fn diff(&self, original: &str, edited: &str) -> Vec<ChangeRecord> {
        let old_lines: Vec<&str> = original.lines().collect();
        let new_lines: Vec<&str> = edited.lines().collect();

        let text_diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_slices(&old_lines[..], &new_lines[..]);

        let mut changes = Vec::new();
        let mut section: Option<String> = None;
        let mut line_number = 0usize;

        for change in text_diff.iter_all_changes() {
            let line: &str = change.value();
            match change.tag() {
                ChangeTag::Equal => {
                    if let Some(heading) = self.classifier.heading_text(line) {
                        section = Some(heading);
                    }
                    line_number += 1;
                }
                ChangeTag::Insert => {
                    if let Some(heading) = self.classifier.heading_text(line) {
                        section = Some(heading);
                    }
                    changes.push(ChangeRecord::addition(
                        current_section(&section),
                        line,
                        line_number,
                        self.classifier.shape(line),
                    ));
                }
                ChangeTag::Delete => {
                    changes.push(ChangeRecord::deletion(
                        current_section(&section),
                        line,
                        line_number,
                        self.classifier.shape(line),
                    ));
                }
            }
        }

        changes
    }
}

fn current_section(section: &Option<String>) -> &str {
    section.as_deref().unwrap_or(GENERAL_SECTION)
}
