use std::sync::Arc;

use crate::backend::{read_json, write_json, StorageBackend};
use crate::error::DocloopError;
use crate::types::report::FeedbackReport;

const REPORTS_PREFIX: &str = "reports";

/// Audit copies of every feedback report under `reports/`
#[derive(Clone)]
pub struct ReportStore {
    backend: Arc<dyn StorageBackend>,
}

impl ReportStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn save(&self, report: &FeedbackReport) -> Result<(), DocloopError> {
        write_json(self.backend.as_ref(), &report_key(&report.report_id), report)
    }

    pub fn load(&self, report_id: &str) -> Result<FeedbackReport, DocloopError> {
        read_json(self.backend.as_ref(), &report_key(report_id))?
            .ok_or_else(|| DocloopError::NotFound(format!("report '{}' not found", report_id)))
    }
}

fn report_key(report_id: &str) -> String {
    format!("{}/{}.json", REPORTS_PREFIX, report_id)
}
