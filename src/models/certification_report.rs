use crate::error::{Error, Result};
use crate::models::certification_issue_report::CertificationIssueReport;
use serde::Serialize;
use validator::Validate;

/// What the proctor declares about one candidate when closing a session.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct CertificationReport {
    pub certification_course_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[validate(length(max = 500))]
    pub examiner_comment: Option<String>,
    #[validate(required)]
    pub has_seen_end_test_screen: Option<bool>,
    pub certification_issue_reports: Vec<CertificationIssueReport>,
}

impl CertificationReport {
    pub fn validate_for_finalization(&self) -> Result<()> {
        self.validate().map_err(|e| {
            Error::InvalidCertificationReportForFinalization(format!(
                "certification course {}: {}",
                self.certification_course_id, e
            ))
        })
    }
}
