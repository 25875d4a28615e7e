use serde::{Deserialize, Serialize};

/// Section tag used for workflow-step suggestions
pub const WORKFLOW_SECTION: &str = "workflows";

/// Which structured store a suggestion targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateTarget {
    /// Customer-context data (business goals, requirements, stakeholders)
    Context,
    /// Program/workflow configuration
    Program,
}

impl UpdateTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateTarget::Context => "context",
            UpdateTarget::Program => "program",
        }
    }
}

/// What happened to a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Add,
    Remove,
    Modify,
}

/// A workflow step touched by the edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub content: String,
    pub action: StepAction,
}

/// Payload of a suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestedUpdate {
    /// Lines added to and removed from a section
    Generic {
        additions: Vec<String>,
        deletions: Vec<String>,
        net_change: i64,
    },
    /// Steps of a workflow that were added, removed or reworded
    Workflow { modified_steps: Vec<WorkflowStep> },
}

/// A proposed mutation to a structured store, derived from one section's changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub section: String,
    pub suggested_update: SuggestedUpdate,
    /// Always within [0, 1]
    pub confidence: f64,
}

impl Suggestion {
    /// Confidence as a whole percentage, for display
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

/// Suggestions split by destination store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub context_updates: Vec<Suggestion>,
    pub program_updates: Vec<Suggestion>,
}

impl SuggestionSet {
    pub fn is_empty(&self) -> bool {
        self.context_updates.is_empty() && self.program_updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.context_updates.len() + self.program_updates.len()
    }

    /// All suggestions with their target, context updates first
    pub fn iter(&self) -> impl Iterator<Item = (UpdateTarget, &Suggestion)> {
        self.context_updates
            .iter()
            .map(|s| (UpdateTarget::Context, s))
            .chain(self.program_updates.iter().map(|s| (UpdateTarget::Program, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(section: &str, confidence: f64) -> Suggestion {
        Suggestion {
            section: section.to_string(),
            suggested_update: SuggestedUpdate::Generic {
                additions: vec!["x".to_string()],
                deletions: vec![],
                net_change: 1,
            },
            confidence,
        }
    }

    #[test]
    fn test_iter_orders_context_first() {
        let set = SuggestionSet {
            context_updates: vec![generic("Requirements", 1.0)],
            program_updates: vec![generic("API", 0.5)],
        };
        let targets: Vec<_> = set.iter().map(|(t, s)| (t, s.section.as_str())).collect();
        assert_eq!(
            targets,
            vec![(UpdateTarget::Context, "Requirements"), (UpdateTarget::Program, "API")]
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_confidence_percent_rounds() {
        assert_eq!(generic("A", 0.666).confidence_percent(), 67);
        assert_eq!(generic("A", 1.0).confidence_percent(), 100);
    }

    #[test]
    fn test_payload_is_tagged() {
        let json = serde_json::to_value(&generic("A", 1.0).suggested_update).unwrap();
        assert_eq!(json["type"], "generic");
        assert_eq!(json["net_change"], 1);
    }
}
