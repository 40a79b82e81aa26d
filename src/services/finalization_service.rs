use crate::error::{Error, Result};
use crate::models::certification_report::CertificationReport;
use crate::models::events::SessionFinalized;
use crate::models::session::FinalizeSession;
use crate::repositories::{
    CertificationAssessmentRepository, CertificationIssueReportRepository, CertificationReportRepository,
    SessionRepository,
};
use crate::services::neutralization_service::auto_neutralize;
use crate::utils::time::now;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct FinalizationService {
    session_repository: Arc<dyn SessionRepository>,
    certification_report_repository: Arc<dyn CertificationReportRepository>,
    certification_issue_report_repository: Arc<dyn CertificationIssueReportRepository>,
    certification_assessment_repository: Arc<dyn CertificationAssessmentRepository>,
}

impl FinalizationService {
    pub fn new(
        session_repository: Arc<dyn SessionRepository>,
        certification_report_repository: Arc<dyn CertificationReportRepository>,
        certification_issue_report_repository: Arc<dyn CertificationIssueReportRepository>,
        certification_assessment_repository: Arc<dyn CertificationAssessmentRepository>,
    ) -> Self {
        Self {
            session_repository,
            certification_report_repository,
            certification_issue_report_repository,
            certification_assessment_repository,
        }
    }

    /// Closes a session once and for all. `finalized_at` is only written after
    /// every report has been neutralized and finalized.
    pub async fn finalize_session(
        &self,
        session_id: i64,
        examiner_global_comment: Option<String>,
        certification_reports: Vec<CertificationReport>,
    ) -> Result<SessionFinalized> {
        if self.session_repository.is_finalized(session_id).await? {
            return Err(Error::SessionAlreadyFinalized);
        }

        for report in &certification_reports {
            report.validate_for_finalization()?;
        }

        info!(session_id, reports = certification_reports.len(), "Finalizing session");

        try_join_all(
            certification_reports
                .iter()
                .map(|report| self.auto_neutralize_challenges(report.certification_course_id)),
        )
        .await?;

        self.certification_report_repository
            .finalize_all(&certification_reports)
            .await?;

        let has_examiner_global_comment = examiner_global_comment
            .as_deref()
            .map_or(false, |c| !c.is_empty());
        let finalized_session = self
            .session_repository
            .finalize(FinalizeSession {
                id: session_id,
                examiner_global_comment,
                finalized_at: now(),
            })
            .await?;

        let finalized_at = finalized_session.finalized_at.ok_or_else(|| {
            Error::Internal(format!("session {} was not marked as finalized", session_id))
        })?;

        info!(session_id, %finalized_at, "Session finalized");
        Ok(SessionFinalized {
            session_id,
            finalized_at,
            has_examiner_global_comment,
            certification_center_name: finalized_session.certification_center,
            session_date: finalized_session.date,
            session_time: finalized_session.time,
        })
    }

    async fn auto_neutralize_challenges(&self, certification_course_id: i64) -> Result<()> {
        let issue_reports = self
            .certification_issue_report_repository
            .find_by_certification_course_id(certification_course_id)
            .await?;
        if issue_reports.is_empty() {
            return Ok(());
        }

        let mut assessment = self
            .certification_assessment_repository
            .get_by_certification_course_id(certification_course_id)
            .await?;
        let neutralized = auto_neutralize(&issue_reports, &mut assessment);
        debug!(certification_course_id, ?neutralized, "Auto-neutralization applied");

        self.certification_assessment_repository.save(&assessment).await
    }
}
