//! Feedback analysis and iteration workflow for generated documents.
//!
//! A generated document is tracked as an immutable baseline, the customer edits
//! a copy, and the edits are diffed, classified by section and shape, and turned
//! into confidence-scored updates for the customer-context and program-config
//! stores. Sessions tie several iterations of this loop to one document.

pub mod apply;
pub mod backend;
pub mod config;
pub mod diff;
pub mod error;
pub mod hash;
pub mod regenerate;
pub mod report;
pub mod session;
pub mod store;
pub mod suggest;
pub mod types;
pub mod vcs;

pub use apply::{
    AppliedSummary, ApplyEngine, ApplyStatus, StoreWriter, StoreWriters, WriterError,
};
pub use backend::{FsBackend, MemoryBackend, StorageBackend};
pub use config::{load_config, save_config, Config};
pub use diff::{DiffEngine, LineClassifier, MarkdownClassifier};
pub use error::DocloopError;
pub use regenerate::{CommandGenerator, DocumentGenerator, RegenerationTrigger};
pub use session::{
    ProcessOptions, ProcessOutcome, RegenerationOutcome, SessionFilter, SessionManager,
};
pub use store::VersionStore;
pub use suggest::SuggestionGenerator;
pub use types::change::{ChangeKind, ChangeRecord, LineShape};
pub use types::report::{ChangeSummary, FeedbackReport};
pub use types::session::{FeedbackSession, SessionStatus};
pub use types::suggestion::{
    StepAction, SuggestedUpdate, Suggestion, SuggestionSet, UpdateTarget, WorkflowStep,
};
pub use types::version::{Metadata, VersionRecord, VersionStatus};
pub use vcs::{AdvisoryError, VersionControl};
