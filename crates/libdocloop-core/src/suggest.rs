//! Turns classified changes into scored update suggestions.

use crate::types::change::{ChangeKind, ChangeRecord, LineShape};
use crate::types::suggestion::{
    StepAction, SuggestedUpdate, Suggestion, SuggestionSet, WorkflowStep, WORKFLOW_SECTION,
};

/// Section keywords that route a change group to the customer-context store
pub const CONTEXT_KEYWORDS: &[&str] = &["Business", "Objectives", "Requirements", "Stakeholders"];

/// Section keywords that route a change group to the program-config store
pub const PROGRAM_KEYWORDS: &[&str] = &["Performance", "API", "Compliance", "Integration"];

/// Section keywords that produce a workflow-step suggestion
pub const WORKFLOW_KEYWORDS: &[&str] = &["Workflow", "Implementation"];

/// Markers that make a non-numbered line count as a workflow step
const STEP_MARKERS: &[&str] = &["Required", "Optional"];

const ADDITION_WEIGHT: f64 = 0.8;
const RETENTION_WEIGHT: f64 = 0.2;

/// Groups changes by section and routes each group to its target store.
///
/// Stateless: the same input always produces the same output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuggestionGenerator;

impl SuggestionGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn suggest(&self, changes: &[ChangeRecord]) -> SuggestionSet {
        let mut set = SuggestionSet::default();

        for (section, group) in group_by_section(changes) {
            let confidence = confidence(&group);

            if contains_any(section, CONTEXT_KEYWORDS) {
                set.context_updates.push(Suggestion {
                    section: section.to_string(),
                    suggested_update: generic_update(&group),
                    confidence,
                });
            }

            if contains_any(section, PROGRAM_KEYWORDS) {
                set.program_updates.push(Suggestion {
                    section: section.to_string(),
                    suggested_update: generic_update(&group),
                    confidence,
                });
            }

            if contains_any(section, WORKFLOW_KEYWORDS) {
                let steps = workflow_steps(&group);
                if !steps.is_empty() {
                    set.program_updates.push(Suggestion {
                        section: WORKFLOW_SECTION.to_string(),
                        suggested_update: SuggestedUpdate::Workflow {
                            modified_steps: steps,
                        },
                        confidence,
                    });
                }
            }
        }

        set
    }
}

/// Partition changes by section, keeping sections in first-seen order
fn group_by_section(changes: &[ChangeRecord]) -> Vec<(&str, Vec<&ChangeRecord>)> {
    let mut groups: Vec<(&str, Vec<&ChangeRecord>)> = Vec::new();
    for change in changes {
        match groups.iter_mut().find(|(section, _)| *section == change.section) {
            Some((_, group)) => group.push(change),
            None => groups.push((change.section.as_str(), vec![change])),
        }
    }
    groups
}

fn contains_any(section: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| section.contains(k))
}

/// `(additions * 0.8 + (total - deletions) * 0.2) / total`, clamped to [0, 1]
pub fn confidence(group: &[&ChangeRecord]) -> f64 {
    let total = group.len();
    if total == 0 {
        return 0.0;
    }
    let additions = count_kind(group, ChangeKind::Addition);
    let deletions = count_kind(group, ChangeKind::Deletion);
    let score = (additions as f64 * ADDITION_WEIGHT
        + (total - deletions) as f64 * RETENTION_WEIGHT)
        / total as f64;
    score.clamp(0.0, 1.0)
}

fn count_kind(group: &[&ChangeRecord], kind: ChangeKind) -> usize {
    group.iter().filter(|c| c.kind == kind).count()
}

fn generic_update(group: &[&ChangeRecord]) -> SuggestedUpdate {
    let additions: Vec<String> = group
        .iter()
        .filter(|c| c.kind == ChangeKind::Addition)
        .filter_map(|c| c.updated_line.clone())
        .collect();
    let deletions: Vec<String> = group
        .iter()
        .filter(|c| c.kind == ChangeKind::Deletion)
        .filter_map(|c| c.original_line.clone())
        .collect();
    let net_change = additions.len() as i64 - deletions.len() as i64;
    SuggestedUpdate::Generic {
        additions,
        deletions,
        net_change,
    }
}

fn workflow_steps(group: &[&ChangeRecord]) -> Vec<WorkflowStep> {
    group
        .iter()
        .filter(|c| {
            c.shape == LineShape::NumberedList || STEP_MARKERS.iter().any(|m| c.text().contains(m))
        })
        .map(|c| WorkflowStep {
            content: c.text().to_string(),
            action: match c.kind {
                ChangeKind::Addition => StepAction::Add,
                ChangeKind::Deletion => StepAction::Remove,
                ChangeKind::Modification => StepAction::Modify,
            },
        })
        .collect()
}
