use serde::{Deserialize, Serialize};

/// Section name used for changes that appear before any heading
pub const GENERAL_SECTION: &str = "General";

/// Direction of a changed line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Addition,
    Deletion,
    Modification,
}

/// Structural shape of a line of markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineShape {
    Heading,
    ListItem,
    NumberedList,
    Table,
    CodeBlock,
    Emphasis,
    Link,
    Text,
}

/// One changed line, attributed to the section it appeared under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub section: String,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_line: Option<String>,
    /// Ordering key only; not the line's true position in either document
    pub line_number: usize,
    pub shape: LineShape,
}

impl ChangeRecord {
    pub fn addition(section: &str, line: &str, line_number: usize, shape: LineShape) -> Self {
        Self {
            section: section.to_string(),
            kind: ChangeKind::Addition,
            original_line: None,
            updated_line: Some(line.to_string()),
            line_number,
            shape,
        }
    }

    pub fn deletion(section: &str, line: &str, line_number: usize, shape: LineShape) -> Self {
        Self {
            section: section.to_string(),
            kind: ChangeKind::Deletion,
            original_line: Some(line.to_string()),
            updated_line: None,
            line_number,
            shape,
        }
    }

    /// The text this change is about: the new line if any, else the old one
    pub fn text(&self) -> &str {
        self.updated_line
            .as_deref()
            .or(self.original_line.as_deref())
            .unwrap_or("")
    }
}
