use regex::Regex;

use crate::types::change::LineShape;

/// Recognises section headings and structural line shapes.
///
/// `DiffEngine` only sees lines through this trait, so a different markup
/// flavour can be supported without touching the diff walk.
pub trait LineClassifier {
    /// Heading text if `line` opens a new section
    fn heading_text(&self, line: &str) -> Option<String>;

    /// Structural shape of a changed line
    fn shape(&self, line: &str) -> LineShape;
}

/// Pattern-based classifier for Markdown documents
#[derive(Debug, Clone)]
pub struct MarkdownClassifier {
    heading: Regex,
    table_row: Regex,
    bullet: Regex,
    numbered: Regex,
    url: Regex,
}

impl MarkdownClassifier {
    pub fn new() -> Self {
        Self {
            heading: Regex::new(r"^#+\s").expect("heading pattern"),
            table_row: Regex::new(r"^\|.*\|").expect("table pattern"),
            bullet: Regex::new(r"^-\s").expect("bullet pattern"),
            numbered: Regex::new(r"^\d+\.").expect("numbered pattern"),
            url: Regex::new(r"https?://\S+").expect("url pattern"),
        }
    }
}

impl Default for MarkdownClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier for MarkdownClassifier {
    fn heading_text(&self, line: &str) -> Option<String> {
        if !self.heading.is_match(line) {
            return None;
        }
        Some(line.trim_start_matches('#').trim().to_string())
    }

    fn shape(&self, line: &str) -> LineShape {
        // Order matters: a table row containing a URL is still a table row
        if self.table_row.is_match(line) {
            LineShape::Table
        } else if self.bullet.is_match(line) {
            LineShape::ListItem
        } else if self.numbered.is_match(line) {
            LineShape::NumberedList
        } else if line.starts_with('#') {
            LineShape::Heading
        } else if line.starts_with("```") {
            LineShape::CodeBlock
        } else if line.starts_with("**") {
            LineShape::Emphasis
        } else if self.url.is_match(line) {
            LineShape::Link
        } else {
            LineShape::Text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_text() {
        let c = MarkdownClassifier::new();
        assert_eq!(c.heading_text("## Business Objectives"), Some("Business Objectives".into()));
        assert_eq!(c.heading_text("#   Spaced  "), Some("Spaced".into()));
        assert_eq!(c.heading_text("#NoSpace"), None);
        assert_eq!(c.heading_text("text # not heading"), None);
    }

    #[test]
    fn test_shapes() {
        let c = MarkdownClassifier::new();
        let cases = [
            ("| a | b |", LineShape::Table),
            ("| https://x.io | b |", LineShape::Table),
            ("- bullet", LineShape::ListItem),
            ("12. step", LineShape::NumberedList),
            ("## Heading", LineShape::Heading),
            ("#tag", LineShape::Heading),
            ("```rust", LineShape::CodeBlock),
            ("**Bold** lead", LineShape::Emphasis),
            ("see https://example.com/docs", LineShape::Link),
            ("plain prose", LineShape::Text),
            ("-nospace", LineShape::Text),
            ("", LineShape::Text),
        ];
        for (line, expected) in cases {
            assert_eq!(c.shape(line), expected, "line {:?}", line);
        }
    }
}
